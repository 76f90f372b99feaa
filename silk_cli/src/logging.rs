use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Environment variable that replaces `--log-level` with a full filter,
/// e.g. `RUST_LOG=silk_core=trace`.
pub const LOG_ENV: &str = "RUST_LOG";

/// Crates whose events follow `--log-level`. Everything else stays at `warn`.
const SILK_TARGETS: [&str; 3] = ["silk2wav", "silk_core", "silk_decoders"];

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Filter directives for `level` when no override is set:
/// `warn,silk2wav=<level>,silk_core=<level>,silk_decoders=<level>`.
fn default_directives(level: LogLevel) -> String {
    let level = level.as_filter();
    let mut directives = String::from("warn");
    for target in SILK_TARGETS {
        directives.push_str(&format!(",{target}={level}"));
    }
    directives
}

/// Build the filter from an override string, falling back to `level` when
/// the override is absent or does not parse.
fn build_filter(level: LogLevel, override_directives: Option<&str>) -> EnvFilter {
    if let Some(directives) = override_directives.filter(|d| !d.trim().is_empty()) {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return filter,
            Err(err) => eprintln!("ignoring {LOG_ENV}={directives:?}: {err}"),
        }
    }
    EnvFilter::new(default_directives(level))
}

/// Install the stderr subscriber. Stdout stays clean for `-` outputs.
///
/// `RUST_LOG`, when set, takes precedence over `level`.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let env = std::env::var(LOG_ENV).ok();
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(build_filter(level, env.as_deref()))
        .with_ansi(false)
        .with_target(false);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}
