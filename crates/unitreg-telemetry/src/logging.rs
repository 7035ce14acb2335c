//! Subscriber configuration and installation.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::{TelemetryError, TelemetryResult};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Prefix of the daily log files written for [`LogTarget::File`].
const LOG_FILE_PREFIX: &str = "unitreg.log";

/// How each event is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, indented fields.
    Pretty,
    /// One short line per event.
    #[default]
    Compact,
    /// One JSON object per line.
    Json,
    /// One line per event with every span field.
    Full,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            "full" => Ok(Self::Full),
            _ => Err(TelemetryError::UnknownFormat {
                format: s.to_owned(),
            }),
        }
    }
}

/// Where events are written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    /// Standard output.
    Stdout,
    /// Standard error, so command output on stdout stays clean.
    #[default]
    Stderr,
    /// Daily-rotated files in this directory.
    File(PathBuf),
}

/// Everything needed to install the subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Base filter, e.g. `"info"` or `"warn,unitreg_core=debug"`.
    pub level: String,
    /// Event rendering.
    pub format: LogFormat,
    /// Output destination.
    pub target: LogTarget,
    /// Extra `target=level` directives layered over `level`.
    pub directives: Vec<String>,
    /// Prefix events with a timestamp.
    pub timestamps: bool,
    /// Emit ANSI colors. Always off for file targets.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::default(),
            target: LogTarget::default(),
            directives: Vec::new(),
            timestamps: true,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Defaults with the given base filter.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Self::default()
        }
    }

    /// Set the event format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Write daily-rotated log files under `directory`.
    #[must_use]
    pub fn with_file_logging(mut self, directory: impl Into<PathBuf>) -> Self {
        self.target = LogTarget::File(directory.into());
        self.ansi = false;
        self
    }

    /// Add one `target=level` directive.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Add several `target=level` directives.
    #[must_use]
    pub fn with_directives<I, S>(mut self, directives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.directives
            .extend(directives.into_iter().map(Into::into));
        self
    }

    /// Drop timestamps from every event.
    #[must_use]
    pub fn without_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    fn filter(&self) -> TelemetryResult<EnvFilter> {
        let invalid = |directive: &str| {
            let directive = directive.to_owned();
            move |source| TelemetryError::InvalidFilter { directive, source }
        };

        let mut filter = EnvFilter::try_new(&self.level).map_err(invalid(self.level.as_str()))?;
        for directive in &self.directives {
            filter = filter.add_directive(directive.parse().map_err(invalid(directive.as_str()))?);
        }
        Ok(filter)
    }

    fn layer<W>(&self, writer: W) -> BoxedLayer
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let layer = fmt::layer().with_writer(writer).with_ansi(self.ansi);

        match (self.format, self.timestamps) {
            (LogFormat::Json, true) => layer.json().boxed(),
            (LogFormat::Json, false) => layer.json().without_time().boxed(),
            (LogFormat::Pretty, true) => layer.pretty().boxed(),
            (LogFormat::Pretty, false) => layer.pretty().without_time().boxed(),
            (LogFormat::Compact, true) => layer.compact().boxed(),
            (LogFormat::Compact, false) => layer.compact().without_time().boxed(),
            (LogFormat::Full, true) => layer.boxed(),
            (LogFormat::Full, false) => layer.without_time().boxed(),
        }
    }
}

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Returns [`TelemetryError::InvalidFilter`] for a bad level or directive,
/// [`TelemetryError::LogDirectory`] if a file target cannot be created, and
/// [`TelemetryError::AlreadyInitialized`] if a subscriber is already set.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.filter()?;

    let layer = match &config.target {
        LogTarget::Stdout => config.layer(std::io::stdout),
        LogTarget::Stderr => config.layer(std::io::stderr),
        LogTarget::File(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| TelemetryError::LogDirectory {
                path: dir.clone(),
                source,
            })?;
            config.layer(RollingFileAppender::new(
                Rotation::DAILY,
                dir,
                LOG_FILE_PREFIX,
            ))
        },
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(TelemetryError::AlreadyInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_log_compact_to_stderr() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.target, LogTarget::Stderr);
        assert!(config.timestamps && config.ansi);
    }

    #[test]
    fn test_builders_accumulate_directives() {
        let config = LogConfig::new("warn")
            .with_format(LogFormat::Json)
            .with_directive("unitreg_core=trace")
            .with_directives(["walkdir=error"]);
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.directives, vec!["unitreg_core=trace", "walkdir=error"]);
    }

    #[test]
    fn test_file_logging_turns_off_ansi() {
        let config = LogConfig::new("info").with_file_logging("/var/log/unitreg");
        assert_eq!(
            config.target,
            LogTarget::File(PathBuf::from("/var/log/unitreg"))
        );
        assert!(!config.ansi);
    }

    #[test]
    fn test_format_names_are_case_insensitive() {
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!(matches!(
            "xml".parse::<LogFormat>(),
            Err(TelemetryError::UnknownFormat { ref format }) if format == "xml"
        ));
    }

    #[test]
    fn test_partial_json_config_fills_defaults() {
        let config: LogConfig = serde_json::from_str(r#"{"level":"debug"}"#).unwrap();
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.timestamps);
    }

    #[test]
    fn test_filter_accepts_level_and_directives() {
        let config = LogConfig::new("debug").with_directive("unitreg_core=trace");
        assert!(config.filter().is_ok());
    }

    #[test]
    fn test_filter_names_bad_directive() {
        let config = LogConfig::new("debug").with_directive("[unclosed=info");
        match config.filter() {
            Err(TelemetryError::InvalidFilter { directive, .. }) => {
                assert_eq!(directive, "[unclosed=info");
            },
            other => panic!("expected InvalidFilter, got {other:?}"),
        }
    }

    #[test]
    fn test_file_target_reports_uncreatable_directory() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let config = LogConfig::new("info").with_file_logging(blocker.join("logs"));
        assert!(matches!(
            setup_logging(&config),
            Err(TelemetryError::LogDirectory { .. })
        ));
    }

    /// Writer that appends into a shared buffer.
    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn emit_through(config: &LogConfig) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let layer = config
            .layer(move || writer.clone())
            .with_filter(config.filter().unwrap());
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(namespace = "exploits", id = "scanner", "Loaded unit");
            tracing::debug!("filtered out");
        });
        captured.text()
    }

    #[test]
    fn test_every_format_writes_filtered_events() {
        for format in [
            LogFormat::Pretty,
            LogFormat::Compact,
            LogFormat::Json,
            LogFormat::Full,
        ] {
            let config = LogConfig::new("info")
                .with_format(format)
                .without_timestamps();
            let out = emit_through(&LogConfig { ansi: false, ..config });
            assert!(out.contains("Loaded unit"), "{format:?}: {out}");
            assert!(out.contains("scanner"), "{format:?}: {out}");
            assert!(!out.contains("filtered out"), "{format:?}: {out}");
        }
    }

    #[test]
    fn test_json_format_emits_one_object_per_event() {
        let config = LogConfig {
            ansi: false,
            ..LogConfig::new("info").with_format(LogFormat::Json)
        };
        let out = emit_through(&config);
        let line = out.lines().next().unwrap();
        let event: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(event["fields"]["message"], "Loaded unit");
        assert_eq!(event["fields"]["id"], "scanner");
        assert_eq!(event["level"], "INFO");
    }
}
