//! Age statistics by login recency.
//!
//! Users are grouped by time since their last login relative to a
//! reference instant. The groups overlap: "less than a week" is contained
//! in "less than a month". For each group the mean age is reported, along
//! with the global min, max, mean and median age. Undefined results become
//! zero.

use std::path::Path;

use chrono::{Local, NaiveDateTime, TimeDelta};
use indexmap::IndexMap;
use serde::Serialize;

use crate::config::StatsConfig;
use crate::error::{Error, Result};
use crate::logging::{debug, info, trace};
use crate::output::{JsonLayout, write_json_file};
use crate::record::{UserCollection, UserRecord, load_collection, parse_timestamp};
use crate::rounding::round_half_even_scaled;
use crate::summary::{Summary, mean};

/// Field holding the last activity timestamp.
pub const LAST_LOGIN: &str = "last_login";

/// Field holding the user's age.
pub const AGE: &str = "age";

/// The two fields the age report reads from a record.
///
/// Lookups are exact-case. `null` and empty strings count as missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AgeSample {
    pub last_login: Option<NaiveDateTime>,
    pub age: Option<f64>,
}

impl AgeSample {
    /// Decode the sample from `record`.
    pub fn from_record(record: &UserRecord) -> Result<Self> {
        let last_login = match record.present(LAST_LOGIN) {
            Some(value) if value.as_str().is_some_and(str::is_empty) => None,
            Some(value) => Some(parse_timestamp(LAST_LOGIN, value)?),
            None => None,
        };
        let age = match record.present(AGE) {
            Some(value) => Some(value.as_f64().ok_or_else(|| {
                Error::invalid_field(AGE, format!("expected a number, got {}", value))
            })?),
            None => None,
        };
        Ok(Self { last_login, age })
    }

    /// Time between the last login and `now`, if the login is known.
    pub fn since_login(&self, now: NaiveDateTime) -> Option<TimeDelta> {
        self.last_login.map(|login| now - login)
    }
}

/// Membership test for one recency bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recency {
    Within(TimeDelta),
    Beyond(TimeDelta),
}

impl Recency {
    fn contains(self, elapsed: TimeDelta) -> bool {
        match self {
            Recency::Within(bound) => elapsed < bound,
            Recency::Beyond(bound) => elapsed > bound,
        }
    }
}

fn recency_buckets(config: &StatsConfig) -> [Recency; 5] {
    let [two_days, week, month, six_months] = config
        .thresholds_days()
        .map(|days| TimeDelta::try_days(days).unwrap_or(TimeDelta::MAX));
    [
        Recency::Within(two_days),
        Recency::Within(week),
        Recency::Within(month),
        Recency::Within(six_months),
        Recency::Beyond(six_months),
    ]
}

/// The flat nine-entry age report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AgeReport(IndexMap<String, f64>);

impl AgeReport {
    /// Value for `label`.
    pub fn get(&self, label: &str) -> Option<f64> {
        self.0.get(label).copied()
    }

    /// Entries in report order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(label, value)| (label.as_str(), *value))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the report has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Build the age report for an in-memory collection.
pub fn aggregate_ages(
    users: &UserCollection,
    now: NaiveDateTime,
    config: &StatsConfig,
) -> Result<AgeReport> {
    let samples = users
        .iter()
        .map(|(id, user)| {
            let sample = AgeSample::from_record(user)?;
            trace!(user = %id, ?sample, "decoded age sample");
            Ok(sample)
        })
        .collect::<Result<Vec<_>>>()?;

    let [m0, m1, m2, m3, m4] = recency_buckets(config).map(|bucket| {
        let ages: Vec<f64> = samples
            .iter()
            .filter(|s| s.since_login(now).is_some_and(|elapsed| bucket.contains(elapsed)))
            .filter_map(|s| s.age)
            .collect();
        mean(&ages)
    });

    let ages: Vec<f64> = samples.iter().filter_map(|s| s.age).collect();
    let summary = Summary::of(&ages);

    let labels = &config.age_labels;
    let [b0, b1, b2, b3, b4] = labels.buckets.ordered();
    let entries = [
        (b0, m0),
        (b1, m1),
        (b2, m2),
        (b3, m3),
        (b4, m4),
        (labels.max.as_str(), summary.map(|s| s.max)),
        (labels.min.as_str(), summary.map(|s| s.min)),
        (labels.mean.as_str(), summary.map(|s| s.mean)),
        (labels.median.as_str(), summary.map(|s| s.median)),
    ];

    let report = entries
        .into_iter()
        .map(|(label, value)| {
            let value = value.filter(|v| !v.is_nan()).unwrap_or(0.0);
            (label.to_string(), round_half_even_scaled(value, config.age_precision))
        })
        .collect();

    info!(
        users = users.len(),
        with_age = ages.len(),
        "age stats aggregated"
    );
    Ok(AgeReport(report))
}

/// Read users from `input`, aggregate against `now` (current local time
/// when `None`), and write the compact report to `output`.
///
/// Unlike the online report a missing input file is an error.
pub fn aggregate_users_stats(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    now: Option<NaiveDateTime>,
    config: &StatsConfig,
) -> Result<AgeReport> {
    let now = now.unwrap_or_else(|| Local::now().naive_local());
    debug!(path = %input.as_ref().display(), %now, "reading user collection");

    let users = load_collection(input)?;
    let report = aggregate_ages(&users, now, config)?;

    write_json_file(output.as_ref(), &report, JsonLayout::Compact, config.ensure_ascii)?;
    info!(path = %output.as_ref().display(), "age report written");
    Ok(report)
}
