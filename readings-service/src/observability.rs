use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` directives are honoured on
/// top of the service default.
pub fn init_tracing() {
    let filter = EnvFilter::from_default_env().add_directive(default_directive());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn default_directive() -> tracing_subscriber::filter::Directive {
    "readings_service=info"
        .parse()
        .unwrap_or_else(|_| tracing_subscriber::filter::LevelFilter::INFO.into())
}
