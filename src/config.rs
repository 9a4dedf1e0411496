//! Configuration for the aggregation pipelines.
//!
//! Bucket labels, thresholds, the output path separator and rounding
//! precision all live in [`StatsConfig`], which is passed explicitly to
//! every aggregator. [`AppConfig`] adds the logging section and is what the
//! command line loads from a TOML file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Length of the "less than two days" bucket, in days.
pub const TWO_DAYS: i64 = 2;

/// Length of the "less than a week" bucket, in days.
pub const WEEK: i64 = 7;

/// Labels of the five online-duration buckets, in ascending threshold order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketLabels {
    pub less_two_days: String,
    pub less_week: String,
    pub less_month: String,
    pub less_six_months: String,
    pub greater_six_months: String,
}

impl Default for BucketLabels {
    fn default() -> Self {
        Self {
            less_two_days: "<2days".into(),
            less_week: "<week".into(),
            less_month: "<month".into(),
            less_six_months: "<6months".into(),
            greater_six_months: ">6months".into(),
        }
    }
}

impl BucketLabels {
    /// Labels in bucket order.
    pub fn ordered(&self) -> [&str; 5] {
        [
            &self.less_two_days,
            &self.less_week,
            &self.less_month,
            &self.less_six_months,
            &self.greater_six_months,
        ]
    }
}

/// Labels of the age report: five recency buckets plus four summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgeLabels {
    #[serde(flatten)]
    pub buckets: BucketLabels,
    pub max: String,
    pub min: String,
    pub mean: String,
    pub median: String,
}

impl Default for AgeLabels {
    fn default() -> Self {
        Self {
            buckets: BucketLabels::default(),
            max: "age_max".into(),
            min: "age_min".into(),
            mean: "age_average".into(),
            median: "age_median".into(),
        }
    }
}

impl AgeLabels {
    /// All nine labels in report order.
    pub fn ordered(&self) -> [&str; 9] {
        let [a, b, c, d, e] = self.buckets.ordered();
        [a, b, c, d, e, &self.max, &self.min, &self.mean, &self.median]
    }
}

/// Constants shared by both pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Length of a "month" in days.
    pub month_days: i64,
    /// Length of "six months" in days.
    pub six_months_days: i64,
    /// Separator that triggers the nested output branch of the online report.
    pub path_separator: char,
    /// Decimal digits kept in online fractions.
    pub fraction_precision: u32,
    /// Decimal digits kept in age statistics.
    pub age_precision: u32,
    /// Write the zero placeholder document when the output path is nested.
    pub nested_output_placeholder: bool,
    /// Escape non-ASCII characters in written reports.
    pub ensure_ascii: bool,
    /// Online-duration bucket labels.
    pub labels: BucketLabels,
    /// Age report labels.
    pub age_labels: AgeLabels,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            month_days: 30,
            six_months_days: 180,
            path_separator: '/',
            fraction_precision: 2,
            age_precision: 2,
            nested_output_placeholder: true,
            ensure_ascii: true,
            labels: BucketLabels::default(),
            age_labels: AgeLabels::default(),
        }
    }
}

impl StatsConfig {
    /// The four finite bucket thresholds in days, ascending.
    pub fn thresholds_days(&self) -> [i64; 4] {
        [TWO_DAYS, WEEK, self.month_days, self.six_months_days]
    }

    /// Check that thresholds ascend strictly and labels are distinct.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let thresholds = self.thresholds_days();
        if thresholds.windows(2).any(|w| matches!(w, [a, b] if a >= b)) {
            return Err(ConfigError::Invalid(format!(
                "bucket thresholds must ascend strictly, got {:?} days",
                thresholds
            )));
        }

        let labels = self.labels.ordered();
        if has_duplicates(&labels) {
            return Err(ConfigError::Invalid(format!(
                "online bucket labels must be distinct, got {:?}",
                labels
            )));
        }

        let age_labels = self.age_labels.ordered();
        if has_duplicates(&age_labels) {
            return Err(ConfigError::Invalid(format!(
                "age labels must be distinct, got {:?}",
                age_labels
            )));
        }

        Ok(())
    }
}

fn has_duplicates(labels: &[&str]) -> bool {
    labels
        .iter()
        .enumerate()
        .any(|(i, label)| labels.iter().skip(i + 1).any(|other| other == label))
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging settings used by the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (e.g. "info" or "user_stats=debug").
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// "stderr", "stdout", or a file path to append to.
    pub output: String,
    /// Use ANSI colours when writing to a terminal.
    pub color: bool,
    /// Include timestamps.
    pub timestamps: bool,
    /// Include the event target.
    pub target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: LogFormat::Text,
            output: "stderr".into(),
            color: true,
            timestamps: true,
            target: false,
        }
    }
}

/// Configuration file contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub stats: StatsConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().display().to_string(), e))?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.stats.validate()?;
        Ok(config)
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    Io(String, #[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() -> anyhow::Result<()> {
        let config = AppConfig::from_toml("")?;
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.stats.thresholds_days(), [2, 7, 30, 180]);
        assert_eq!(config.stats.path_separator, '/');
        Ok(())
    }

    #[test]
    fn test_parse_config() -> anyhow::Result<()> {
        let toml = r#"
[stats]
month_days = 31
six_months_days = 182
path_separator = "\\"
fraction_precision = 3

[stats.labels]
less_two_days = "fresh"

[stats.age_labels]
median = "p50"
less_week = "week"

[logging]
level = "debug"
format = "json"
output = "stdout"
"#;
        let config = AppConfig::from_toml(toml)?;
        assert_eq!(config.stats.month_days, 31);
        assert_eq!(config.stats.six_months_days, 182);
        assert_eq!(config.stats.path_separator, '\\');
        assert_eq!(config.stats.fraction_precision, 3);
        assert_eq!(config.stats.age_precision, 2);
        assert_eq!(config.stats.labels.less_two_days, "fresh");
        assert_eq!(config.stats.labels.less_week, "<week");
        assert_eq!(config.stats.age_labels.median, "p50");
        assert_eq!(config.stats.age_labels.buckets.less_week, "week");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.output, "stdout");
        Ok(())
    }

    #[test]
    fn test_thresholds_must_ascend() {
        let result = AppConfig::from_toml("[stats]\nmonth_days = 200\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = AppConfig::from_toml("[stats]\nmonth_days = 7\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        let toml = "[stats.labels]\nless_week = \"<2days\"\n";
        assert!(matches!(
            AppConfig::from_toml(toml),
            Err(ConfigError::Invalid(_))
        ));

        let toml = "[stats.age_labels]\nmax = \"<week\"\n";
        assert!(matches!(
            AppConfig::from_toml(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_unknown_format_is_parse_error() {
        let result = AppConfig::from_toml("[logging]\nformat = \"xml\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_toml_roundtrip_of_defaults() -> anyhow::Result<()> {
        let rendered = AppConfig::default().to_toml()?;
        assert!(rendered.contains("month_days = 30"));
        assert_eq!(AppConfig::from_toml(&rendered)?, AppConfig::default());
        Ok(())
    }
}
