//! # Logger
//!
//! Installs the global `tracing` subscriber for knobs applications.
//!
//! * Console output is written to stderr, leaving stdout to the application.
//! * File output uses a non-blocking rolling appender; keep the returned [`Logger`] alive
//!   until shutdown so buffered lines are flushed.
//! * Every output shares one [`LogFormat`] and one filter. The filter defaults to the
//!   configured level and honours `RUST_LOG`, unless [`LoggerBuilder::env_filter`] sets
//!   explicit directives.
//!
//! ## Example
//!
//! ```rust
//! # use knobs_logger::{LevelFilter, LogFormat, Logger};
//!
//! let _logger = Logger::builder()
//!     .name("knobs-demo")
//!     .level(LevelFilter::DEBUG)
//!     .format(LogFormat::Pretty)
//!     .init()
//!     .unwrap();
//! ```

mod error;

pub use crate::error::{LoggerError, LoggerErrorExt};
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use private::Sealed;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::Subscriber;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_MAX_FILES: usize = 7;
const LOG_FILE_SUFFIX: &str = "log";

/// Line format shared by every output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(LoggerError::invalid(format!(
                "Unknown log format '{other}', expect one of compact, pretty, json"
            ))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        })
    }
}

/// Rolling file destination. Files are named `<logger name>.<date>.log`.
#[derive(Debug, Clone)]
pub struct FileOutput {
    dir: PathBuf,
    rotation: Rotation,
    max_files: usize,
}

impl FileOutput {
    /// Daily rotation into `dir`, keeping the last seven files.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), rotation: Rotation::DAILY, max_files: DEFAULT_MAX_FILES }
    }

    #[must_use]
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    #[must_use]
    pub const fn max_files(mut self, max: usize) -> Self {
        self.max_files = max;
        self
    }

    fn open(&self, name: &str) -> Result<(NonBlocking, WorkerGuard), LoggerError> {
        if self.max_files == 0 {
            return Err(LoggerError::invalid("max_files must be greater than zero"));
        }

        fs::create_dir_all(&self.dir)
            .context(format!("Failed to create {}", self.dir.display()))?;

        let appender = RollingFileAppender::builder()
            .rotation(self.rotation.clone())
            .filename_prefix(name)
            .filename_suffix(LOG_FILE_SUFFIX)
            .max_log_files(self.max_files)
            .build(&self.dir)?;

        Ok(tracing_appender::non_blocking(appender))
    }
}

#[derive(Debug)]
struct LoggerConfig {
    console: bool,
    level: LevelFilter,
    format: LogFormat,
    env_filter: Option<String>,
    file: Option<FileOutput>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            console: true,
            level: LevelFilter::INFO,
            format: LogFormat::default(),
            env_filter: None,
            file: None,
        }
    }
}

impl LoggerConfig {
    fn filter(&self) -> Result<EnvFilter, LoggerError> {
        let builder = EnvFilter::builder().with_default_directive(self.level.into());
        match &self.env_filter {
            Some(directives) => builder.parse(directives).map_err(|e| {
                LoggerError::invalid(format!("Invalid env filter '{directives}': {e}"))
            }),
            None => Ok(builder.from_env_lossy()),
        }
    }
}

#[derive(Debug)]
pub struct NoName;
#[derive(Debug)]
pub struct WithName(String);

mod private {
    pub trait Sealed {}
}
impl Sealed for NoName {}
impl Sealed for WithName {}

/// Configures the global subscriber. A name is mandatory before [`LoggerBuilder::init`].
#[derive(Debug)]
pub struct LoggerBuilder<N: Sealed = NoName> {
    config: LoggerConfig,
    name: N,
}

impl LoggerBuilder<NoName> {
    /// Names the logger; the name also prefixes rolling log files.
    pub fn name(self, name: impl Into<String>) -> LoggerBuilder<WithName> {
        LoggerBuilder { config: self.config, name: WithName(name.into()) }
    }
}

impl<N: Sealed> LoggerBuilder<N> {
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.config.level = level;
        self
    }

    /// Explicit filter directives (e.g. `knobs=trace,knobs_loader=info`). `RUST_LOG` is
    /// ignored when set.
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn env_filter(mut self, directives: impl Into<String>) -> Self {
        self.config.env_filter = Some(directives.into());
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn console(mut self, enabled: bool) -> Self {
        self.config.console = enabled;
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub const fn format(mut self, format: LogFormat) -> Self {
        self.config.format = format;
        self
    }

    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn file(mut self, output: FileOutput) -> Self {
        self.config.file = Some(output);
        self
    }
}

impl LoggerBuilder<WithName> {
    /// Installs the global subscriber.
    ///
    /// # Errors
    /// * [`LoggerError::InvalidConfiguration`] for a blank name, a bad filter, zero retained
    ///   files, or when neither console nor file output is enabled.
    /// * [`LoggerError::Io`] / [`LoggerError::Appender`] if the log directory is unusable.
    /// * [`LoggerError::Subscriber`] if a global subscriber is already installed.
    pub fn init(self) -> Result<Logger, LoggerError> {
        let Self { config, name: WithName(name) } = self;

        if name.trim().is_empty() {
            return Err(LoggerError::invalid("Logger name cannot be empty"));
        }
        if !config.console && config.file.is_none() {
            return Err(LoggerError::invalid("No output enabled, expect console or file logging"));
        }

        let filter = config.filter()?;
        let mut layers = Vec::new();

        if config.console {
            layers.push(format_layer(config.format, std::io::stderr, true));
        }

        let guard = match &config.file {
            Some(output) => {
                let (writer, guard) = output.open(&name)?;
                layers.push(format_layer(config.format, writer, false));
                Some(guard)
            },
            None => None,
        };

        tracing_subscriber::registry().with(filter).with(layers).try_init()?;
        tracing::debug!(logger = %name, format = %config.format, "Logging initialized");

        Ok(Logger { name, guard })
    }
}

fn format_layer<S, W>(
    format: LogFormat,
    writer: W,
    ansi: bool,
) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer().with_writer(writer);
    match format {
        LogFormat::Compact => layer.with_ansi(ansi).compact().boxed(),
        LogFormat::Pretty => layer.with_ansi(ansi).pretty().boxed(),
        LogFormat::Json => layer.with_ansi(false).json().boxed(),
    }
}

/// Handle to the installed logging system.
///
/// Holds the file worker guard, if any. Dropping it flushes and stops file output.
#[must_use = "Dropping this handle will stop background logging threads."]
#[derive(Debug)]
pub struct Logger {
    name: String,
    guard: Option<WorkerGuard>,
}

impl Logger {
    #[must_use = "The builder must be configured before it can be used to initialize the logger."]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder { config: LoggerConfig::default(), name: NoName }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn writes_to_file(&self) -> bool {
        self.guard.is_some()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if self.guard.is_some() {
            tracing::info!(logger = %self.name, "Logging system shutting down, flushing buffers...");
        }
    }
}
