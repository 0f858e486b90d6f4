use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, reload};

pub type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// ## Summary
/// Installs the global subscriber at `debug` and bridges `log` records into it.
///
/// Output goes to stderr; stdout carries command results only.
///
/// ## Errors
/// Returns an error if a global subscriber or logger is already installed.
pub fn init() -> anyhow::Result<FilterHandle> {
    let (filter_layer, filter_handle) = reload::Layer::new(EnvFilter::new("debug"));

    let subscriber = tracing_subscriber::registry().with(filter_layer).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true),
    );
    tracing::subscriber::set_global_default(subscriber)?;
    tracing_log::LogTracer::init()?;

    Ok(filter_handle)
}

/// Narrows the filter to the configured directive, keeping `debug` if it does not parse.
pub fn apply_level(handle: &FilterHandle, level: &str) {
    if let Ok(filter) = EnvFilter::try_new(level) {
        if let Err(e) = handle.modify(|current| *current = filter) {
            tracing::warn!(error = %e, "Failed to update log filter from config");
        }
    } else {
        tracing::warn!(level = %level, "Invalid log level in config, keeping debug");
    }
}
