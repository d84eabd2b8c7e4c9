use csv::{StringRecord, Trim};
use readings_client::Customer;

use crate::{
    parse::{extract_identifier, map_gender, parse_date},
    pipeline::{Envelope, ImportError, Row, RowDiagnostic, RowStream, SkipReason, Source},
};

const REQUIRED_FIELDS: usize = 4;

/// Comma-separated customer roster.
///
/// The first line is a header and is never validated. Columns, by position:
/// - id (UUID; blank lets the store assign one)
/// - salutation (`Herr`, `Frau`, `Divers`, anything else maps to unknown)
/// - first name
/// - last name
/// - birth date (optional, `dd.MM.yyyy`)
///
/// Fields are split on every comma; quotes carry no meaning in this dialect.
pub struct CustomerRosterSource {
    text: String,
}

impl CustomerRosterSource {
    pub fn new<T: Into<String>>(text: T) -> Self {
        Self { text: text.into() }
    }
}

fn record_to_customer(record: &StringRecord) -> Result<Customer, ImportError> {
    let field = |idx: usize| record.get(idx).unwrap_or("");

    let id = match field(0) {
        "" => None,
        raw => Some(extract_identifier(raw)?),
    };

    Ok(Customer {
        id,
        first_name: field(2).to_string(),
        last_name: field(3).to_string(),
        birth_date: parse_date(field(4)),
        gender: map_gender(field(1)),
    })
}

#[async_trait::async_trait]
impl Source for CustomerRosterSource {
    type Record = Customer;

    async fn stream(&self) -> RowStream<Customer> {
        let text = self.text.clone();
        let s = async_stream::try_stream! {
            let mut rdr = csv::ReaderBuilder::new()
                .has_headers(true)
                .flexible(true)
                .quoting(false)
                .trim(Trim::All)
                .from_reader(text.as_bytes());

            for result in rdr.records() {
                let record = result?;
                let line = record.position().map(|p| p.line()).unwrap_or_default();

                // Trailing empty fields do not count towards the minimum.
                let used = record.iter().collect::<Vec<_>>().iter().rposition(|f| !f.is_empty()).map_or(0, |i| i + 1);

                // Whitespace-only lines.
                if used == 0 {
                    continue;
                }

                if used < REQUIRED_FIELDS {
                    yield Row::Skipped(RowDiagnostic {
                        line,
                        reason: SkipReason::TooFewFields {
                            found: used,
                            required: REQUIRED_FIELDS,
                        },
                    });
                    continue;
                }

                let customer = record_to_customer(&record)?;
                yield Row::Record(Envelope { payload: customer, line });
            }
        };

        Box::pin(s)
    }
}
