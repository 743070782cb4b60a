//! Logging setup for apex-inference binaries and benchmarks
//!
//! Library code only emits `tracing` events; installing a subscriber is up to the executable.

use tracing::Level;

/// Initialize the tracing subscriber at INFO level
///
/// Format: `[LEVEL YYYY-MM-DD HH:MM:SS module]` for INFO/WARN/ERROR
///         `[LEVEL YYYY-MM-DD HH:MM:SS file:line]` for DEBUG/TRACE
///
/// # Example
/// ```no_run
/// use apex_inference::init_logger;
///
/// init_logger();
/// tracing::info!("Eliminating pose graph");
/// ```
///
/// # Environment Variables
/// `RUST_LOG` overrides the default level:
/// ```bash
/// RUST_LOG=debug cargo run --bin eliminate_graph
/// RUST_LOG=apex_inference::inference=debug cargo run --bin eliminate_graph
/// ```
pub fn init_logger() {
    init_logger_with_level(Level::INFO)
}

/// Initialize the tracing subscriber with a custom default level
///
/// A second call is ignored rather than panicking, so tests and benches can call it freely.
///
/// # Example
/// ```no_run
/// use apex_inference::init_logger_with_level;
/// use tracing::Level;
///
/// init_logger_with_level(Level::DEBUG);
/// tracing::debug!("Per-step elimination traces enabled");
/// ```
pub fn init_logger_with_level(default_level: Level) {
    let result = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .event_format(BracketFormatter)
        .try_init();
    if result.is_err() {
        tracing::debug!("Logger already initialized");
    }
}

/// `[LEVEL timestamp location] message`
struct BracketFormatter;

impl BracketFormatter {
    fn level_tag(level: Level) -> &'static str {
        match level {
            Level::ERROR => "\x1b[31mERROR\x1b[0m",
            Level::WARN => "\x1b[33mWARN\x1b[0m",
            Level::INFO => "\x1b[32mINFO\x1b[0m",
            Level::DEBUG => "\x1b[34mDEBUG\x1b[0m",
            Level::TRACE => "\x1b[35mTRACE\x1b[0m",
        }
    }

    /// `file:line` for DEBUG/TRACE, the module target otherwise.
    fn location(metadata: &tracing::Metadata<'_>) -> String {
        let verbose = *metadata.level() == Level::DEBUG || *metadata.level() == Level::TRACE;
        match (verbose, metadata.file()) {
            (true, Some(file)) => {
                let filename = file.rsplit('/').next().unwrap_or(file);
                match metadata.line() {
                    Some(line) => format!("{}:{}", filename, line),
                    None => filename.to_string(),
                }
            }
            _ => metadata.target().to_string(),
        }
    }
}

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for BracketFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        write!(
            writer,
            "[{} {} {}] ",
            Self::level_tag(*metadata.level()),
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            Self::location(metadata)
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
