//! Aggregate statistics over keyed user records.
//!
//! The input is a JSON object mapping user identifiers to attribute
//! objects. Two independent reports are built from it:
//!
//! - [`online`] - fraction of users per online-duration bucket (time from
//!   `registered` to `last_login`) and per `region`.
//! - [`ages`] - mean age per login-recency bucket plus global min, max,
//!   mean and median age.
//!
//! # Quick Start
//!
//! ```ignore
//! use user_stats::prelude::*;
//!
//! let config = StatsConfig::default();
//!
//! // Online-duration and geo report, written indented
//! let online = process_data("users.json", "online.json", &config)?;
//!
//! // Age report against a fixed reference instant
//! let ages = aggregate_users_stats("users.json", "ages.json", None, &config)?;
//! ```
//!
//! # Modules
//!
//! - [`record`] - Collection decoding and field parsing
//! - [`config`] - Labels, thresholds and other injectable constants
//! - [`online`] - Online-duration and geo report
//! - [`ages`] - Age statistics report
//! - [`summary`] - Min, max, mean and median over samples
//! - [`rounding`] - The two decimal rounding rules
//! - [`output`] - JSON report writing
//!
//! # Feature Flags
//!
//! - `logging` - Enable library-level tracing (consumers provide their own subscriber)
//! - `cli` - Enable the `user-stats` binary and subscriber setup (default)

pub mod ages;
pub mod config;
mod error;
mod logging;
pub mod online;
pub mod output;
pub mod prelude;
pub mod record;
pub mod rounding;
#[cfg(feature = "cli")]
pub mod subscriber;
pub mod summary;

pub use error::{Error, Result};

pub use ages::{AgeReport, AgeSample, aggregate_ages, aggregate_users_stats};
pub use config::{
    AgeLabels, AppConfig, BucketLabels, ConfigError, LogFormat, LoggingConfig, StatsConfig,
};
pub use online::{
    BucketCounts, Distribution, DurationBucketer, OnlineReport, aggregate_online, geo_counts,
    normalize, online_counts, process_data,
};
pub use record::{UserCollection, UserRecord, load_collection, parse_collection};
