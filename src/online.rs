//! Online-duration and geographic distribution report.
//!
//! Every user with both a `registered` and a `last_login` date falls into
//! exactly one of five duration buckets; every user with a `region` adds
//! to that region's count. Both tallies are divided by the total number of
//! users, so users lacking the fields lower every fraction.
//!
//! ```ignore
//! use user_stats::{StatsConfig, process_data};
//!
//! let report = process_data("users.json", "report.json", &StatsConfig::default())?;
//! ```

use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use indexmap::IndexMap;
use serde::ser::{Serialize, Serializer};

use crate::config::StatsConfig;
use crate::error::Result;
use crate::logging::{debug, info, trace, warn};
use crate::output::{JsonLayout, write_json_file};
use crate::record::{UserCollection, parse_calendar_date};
use crate::rounding::round_half_even_decimal;

/// Field holding the registration date.
pub const REGISTERED: &str = "registered";

/// Field holding the last activity date.
pub const LAST_LOGIN: &str = "last_login";

/// Field holding the user's region.
pub const REGION: &str = "region";

/// Number of online-duration buckets.
pub const BUCKETS: usize = 5;

/// Classifies elapsed durations into the five online buckets.
///
/// Thresholds are strict upper bounds tested in ascending order; the last
/// bucket is unbounded.
#[derive(Debug, Clone)]
pub struct DurationBucketer {
    thresholds: [TimeDelta; BUCKETS - 1],
}

impl DurationBucketer {
    /// Build the bucketer from the configured thresholds.
    pub fn new(config: &StatsConfig) -> Self {
        Self {
            thresholds: config
                .thresholds_days()
                .map(|days| TimeDelta::try_days(days).unwrap_or(TimeDelta::MAX)),
        }
    }

    /// Index of the first bucket whose bound exceeds `elapsed`.
    ///
    /// Zero and negative durations land in bucket 0.
    pub fn classify(&self, elapsed: TimeDelta) -> usize {
        self.thresholds
            .iter()
            .position(|bound| elapsed < *bound)
            .unwrap_or(BUCKETS - 1)
    }

    /// Classify `elapsed` and count it.
    pub fn record(&self, counts: &mut BucketCounts, elapsed: TimeDelta) {
        counts.increment(self.classify(elapsed));
    }
}

/// Per-bucket user counts, in bucket order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketCounts([u64; BUCKETS]);

impl BucketCounts {
    /// Count one more user in `bucket`. Out-of-range indices are ignored.
    pub fn increment(&mut self, bucket: usize) {
        if let Some(count) = self.0.get_mut(bucket) {
            *count += 1;
        }
    }

    /// Count for `bucket`, zero when out of range.
    pub fn get(&self, bucket: usize) -> u64 {
        self.0.get(bucket).copied().unwrap_or(0)
    }

    /// Users counted across all buckets.
    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    /// Counts keyed by the configured labels, every label present.
    pub fn labeled(&self, config: &StatsConfig) -> IndexMap<String, u64> {
        config
            .labels
            .ordered()
            .into_iter()
            .zip(self.0)
            .map(|(label, count)| (label.to_string(), count))
            .collect()
    }
}

/// Count users per online-duration bucket.
///
/// Field names are matched case-insensitively. Users missing either date
/// are skipped; a malformed date aborts the whole aggregation.
pub fn online_counts(users: &UserCollection, config: &StatsConfig) -> Result<BucketCounts> {
    let bucketer = DurationBucketer::new(config);
    let mut counts = BucketCounts::default();

    for (id, user) in users {
        let user = user.lowercased();
        let (Some(registered), Some(last_login)) = (user.truthy(REGISTERED), user.truthy(LAST_LOGIN))
        else {
            trace!(user = %id, "skipping user without registration or login date");
            continue;
        };
        let registered = parse_calendar_date(REGISTERED, registered)?;
        let last_login = parse_calendar_date(LAST_LOGIN, last_login)?;
        bucketer.record(&mut counts, last_login - registered);
    }

    Ok(counts)
}

/// Count users per region, in first-seen order.
///
/// The `region` field is matched exactly; empty or missing regions are not
/// counted. Non-string regions are keyed by their JSON text.
pub fn geo_counts(users: &UserCollection) -> IndexMap<String, u64> {
    let mut regions = IndexMap::new();
    for user in users.values() {
        let Some(region) = user.truthy(REGION) else {
            continue;
        };
        let key = match region.as_str() {
            Some(name) => name.to_string(),
            None => region.to_string(),
        };
        *regions.entry(key).or_insert(0) += 1;
    }
    regions
}

/// One side of the online report: fractions, or the `0` placeholder used
/// when there was no input.
#[derive(Debug, Clone, PartialEq)]
pub enum Distribution {
    Fractions(IndexMap<String, f64>),
    Unavailable,
}

impl Distribution {
    /// The fractions, if computed.
    pub fn fractions(&self) -> Option<&IndexMap<String, f64>> {
        match self {
            Distribution::Fractions(fractions) => Some(fractions),
            Distribution::Unavailable => None,
        }
    }

    /// Fraction for `label`, if computed and present.
    pub fn get(&self, label: &str) -> Option<f64> {
        self.fractions().and_then(|f| f.get(label).copied())
    }
}

impl Serialize for Distribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Distribution::Fractions(fractions) => fractions.serialize(serializer),
            Distribution::Unavailable => serializer.serialize_u8(0),
        }
    }
}

/// The online report document.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct OnlineReport {
    pub geo_distribution: Distribution,
    pub online_stats: Distribution,
}

impl OnlineReport {
    /// The document written when there is nothing to report.
    pub fn unavailable() -> Self {
        Self {
            geo_distribution: Distribution::Unavailable,
            online_stats: Distribution::Unavailable,
        }
    }

    /// Returns `true` for the placeholder document.
    pub fn is_unavailable(&self) -> bool {
        self.geo_distribution == Distribution::Unavailable
            && self.online_stats == Distribution::Unavailable
    }
}

/// Divide counts by `total` and round them.
///
/// With no users at all every online fraction is `0.0` and the geo map is
/// empty.
pub fn normalize(
    online: &BucketCounts,
    geo: &IndexMap<String, u64>,
    total: usize,
    config: &StatsConfig,
) -> OnlineReport {
    let fraction = |count: u64| {
        if total == 0 {
            0.0
        } else {
            round_half_even_decimal(count as f64 / total as f64, config.fraction_precision)
        }
    };

    let geo_distribution = geo
        .iter()
        .map(|(region, count)| (region.clone(), fraction(*count)))
        .collect();
    let online_stats = online
        .labeled(config)
        .into_iter()
        .map(|(label, count)| (label, fraction(count)))
        .collect();

    OnlineReport {
        geo_distribution: Distribution::Fractions(geo_distribution),
        online_stats: Distribution::Fractions(online_stats),
    }
}

/// Build the online report for an in-memory collection.
pub fn aggregate_online(users: &UserCollection, config: &StatsConfig) -> Result<OnlineReport> {
    let online = online_counts(users, config)?;
    let geo = geo_counts(users);
    if users.is_empty() {
        warn!("empty user collection, reporting zero fractions");
    }
    info!(
        users = users.len(),
        dated = online.total(),
        regions = geo.len(),
        "online stats aggregated"
    );
    Ok(normalize(&online, &geo, users.len(), config))
}

/// Read users from `input`, aggregate, and write the report to `output`.
///
/// A missing input file is not an error: the `0` placeholder document is
/// written instead. Returns the document that was written.
pub fn process_data(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &StatsConfig,
) -> Result<OnlineReport> {
    let input = input.as_ref();
    let report = if input.exists() {
        debug!(path = %input.display(), "reading user collection");
        let users = crate::record::load_collection(input)?;
        aggregate_online(&users, config)?
    } else {
        debug!(path = %input.display(), "input missing, writing placeholder report");
        OnlineReport::unavailable()
    };
    write_online_report(output.as_ref(), report, config)
}

/// Write `report` to `output`, honouring the nested-path placeholder rule.
///
/// When `output` contains the configured separator and
/// `nested_output_placeholder` is set, the parent directories are created
/// and the placeholder document is written in place of `report`.
pub fn write_online_report(
    output: &Path,
    report: OnlineReport,
    config: &StatsConfig,
) -> Result<OnlineReport> {
    let written = match split_nested(output, config.path_separator) {
        Some((dir, file)) => {
            std::fs::create_dir_all(&dir)?;
            let target = dir.join(file);
            if config.nested_output_placeholder {
                warn!(path = %target.display(), "nested output path, writing placeholder report");
                write_report_file(&target, OnlineReport::unavailable(), config)?
            } else {
                write_report_file(&target, report, config)?
            }
        }
        None => write_report_file(output, report, config)?,
    };
    Ok(written)
}

fn write_report_file(path: &Path, report: OnlineReport, config: &StatsConfig) -> Result<OnlineReport> {
    write_json_file(path, &report, JsonLayout::Indented, config.ensure_ascii)?;
    info!(path = %path.display(), "online report written");
    Ok(report)
}

/// Split `path` at the last `separator` into directory and file name.
///
/// A separator in first position means the root directory.
fn split_nested(path: &Path, separator: char) -> Option<(PathBuf, String)> {
    let text = path.to_string_lossy();
    let idx = text.rfind(separator)?;
    let (dir, rest) = text.split_at(idx);
    let file = rest.get(separator.len_utf8()..).unwrap_or_default();
    let dir = if dir.is_empty() {
        PathBuf::from(separator.to_string())
    } else {
        PathBuf::from(dir)
    };
    Some((dir, file.to_string()))
}
