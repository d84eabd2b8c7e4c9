use csv::{StringRecord, Trim};
use readings_client::MeterKind;
use time::Date;
use uuid::Uuid;

use crate::{
    classify,
    parse::{extract_identifier, parse_date, parse_decimal, strip_quotes},
    pipeline::{Envelope, ImportError, Row, RowDiagnostic, RowStream, SkipReason, Source},
};

const CUSTOMER_MARKER: &str = "kunde";
const METER_MARKER: &str = "zählernummer";
const DATE_COLUMN: &str = "Datum";
const VALUE_COLUMN: &str = "Zählerstand";
const REQUIRED_FIELDS: usize = 2;

/// Metadata shared by every data row of one series file.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesContext {
    pub customer_id: Uuid,
    pub meter_id: String,
    pub kind: MeterKind,
}

/// One data row of a series file, before the customer is resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRow {
    pub context: SeriesContext,
    pub date_of_reading: Option<Date>,
    /// `None` when the value was present but not a number.
    pub meter_count: Option<f64>,
    pub comment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Preamble,
    Data,
}

#[derive(Debug, Default)]
struct Preamble {
    customer_id: Option<Uuid>,
    meter_id: Option<String>,
    // Raw preamble text, used to guess the meter kind.
    content: String,
}

impl Preamble {
    /// Feed one preamble line. Returns `true` when the line is the data header.
    fn accept(&mut self, record: &StringRecord) -> Result<bool, ImportError> {
        let key = strip_quotes(record.get(0).unwrap_or("")).trim().to_lowercase();
        let value = record.get(1);

        self.content.push_str(&record.iter().collect::<Vec<_>>().join(";"));
        self.content.push('\n');

        match (key.as_str(), value) {
            (CUSTOMER_MARKER, Some(v)) => {
                if !strip_quotes(v).trim().is_empty() {
                    self.customer_id = Some(extract_identifier(v)?);
                }
            }
            (METER_MARKER, Some(v)) => {
                let meter_id = strip_quotes(v).trim();
                if !meter_id.is_empty() {
                    self.meter_id = Some(meter_id.to_string());
                }
            }
            _ => return Ok(is_data_header(record)),
        }
        Ok(false)
    }

    /// Leave the preamble, either at the data header or at end of input.
    fn finish(self, file_name: Option<&str>) -> Result<SeriesContext, ImportError> {
        let kind = classify::meter_kind(file_name, &self.content);
        match (self.customer_id, self.meter_id) {
            (Some(customer_id), Some(meter_id)) => Ok(SeriesContext {
                customer_id,
                meter_id,
                kind,
            }),
            (None, Some(_)) => Err(ImportError::IncompletePreamble { missing: "customer id" }),
            (Some(_), None) => Err(ImportError::IncompletePreamble { missing: "meter id" }),
            (None, None) => Err(ImportError::IncompletePreamble {
                missing: "customer id and meter id",
            }),
        }
    }
}

fn is_data_header(record: &StringRecord) -> bool {
    record.iter().any(|f| f.contains(DATE_COLUMN)) && record.iter().any(|f| f.contains(VALUE_COLUMN))
}

// Only cells with no text at all; `"";""` is still a row.
fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(str::is_empty)
}

fn data_row(record: &StringRecord, context: &SeriesContext) -> Result<SeriesRow, SkipReason> {
    if record.len() < REQUIRED_FIELDS {
        return Err(SkipReason::TooFewFields {
            found: record.len(),
            required: REQUIRED_FIELDS,
        });
    }

    let cell = |idx: usize| strip_quotes(record.get(idx).unwrap_or("")).trim();
    let (date_text, value_text) = (cell(0), cell(1));

    // An empty value means "no row"; an unparsable one is kept as `None`.
    if date_text.is_empty() {
        return Err(SkipReason::EmptyDate);
    }
    if value_text.is_empty() {
        return Err(SkipReason::EmptyValue);
    }

    Ok(SeriesRow {
        context: context.clone(),
        date_of_reading: parse_date(date_text),
        meter_count: parse_decimal(value_text),
        comment: cell(2).to_string(),
    })
}

/// Semicolon-separated reading series exported by meter-reading tools.
///
/// ```text
/// "Kunde";"ec617965-88b4-4721-8158-ee36c38e4db3";
/// "Zählernummer";"Xr-2018-2312456ab";
/// ;;
/// "Datum";"Zählerstand";"Kommentar"
/// "01.02.2024";"2345,6";""
/// ```
///
/// The preamble must name both the customer and the meter, otherwise the
/// file yields a soft [`ImportError::IncompletePreamble`] and no rows.
pub struct ReadingSeriesSource {
    text: String,
    file_name: Option<String>,
}

impl ReadingSeriesSource {
    pub fn new<T: Into<String>>(text: T) -> Self {
        Self {
            text: text.into(),
            file_name: None,
        }
    }

    /// Use the file name as the primary hint for the meter kind.
    pub fn with_file_name<N: Into<String>>(mut self, name: N) -> Self {
        self.file_name = Some(name.into());
        self
    }
}

#[async_trait::async_trait]
impl Source for ReadingSeriesSource {
    type Record = SeriesRow;

    async fn stream(&self) -> RowStream<SeriesRow> {
        let text = self.text.clone();
        let file_name = self.file_name.clone();
        let s = async_stream::try_stream! {
            let mut rdr = csv::ReaderBuilder::new()
                .delimiter(b';')
                .has_headers(false)
                .flexible(true)
                .quoting(false)
                .trim(Trim::All)
                .from_reader(text.as_bytes());

            let mut state = ScanState::Preamble;
            let mut preamble = Preamble::default();
            let mut context: Option<SeriesContext> = None;

            for result in rdr.records() {
                let record = result?;
                if is_blank(&record) {
                    continue;
                }

                match state {
                    ScanState::Preamble => {
                        if preamble.accept(&record)? {
                            let ctx = std::mem::take(&mut preamble).finish(file_name.as_deref())?;
                            tracing::debug!(customer = %ctx.customer_id, meter = %ctx.meter_id, kind = %ctx.kind, "series preamble parsed");
                            context = Some(ctx);
                            state = ScanState::Data;
                        }
                    }
                    ScanState::Data => {
                        let Some(ctx) = context.as_ref() else { continue };
                        let line = record.position().map(|p| p.line()).unwrap_or_default();
                        match data_row(&record, ctx) {
                            Ok(row) => yield Row::Record(Envelope { payload: row, line }),
                            Err(reason) => yield Row::Skipped(RowDiagnostic { line, reason }),
                        }
                    }
                }
            }

            // End of input counts as the end of the preamble too.
            if state == ScanState::Preamble {
                preamble.finish(file_name.as_deref())?;
            }
        };

        Box::pin(s)
    }
}
