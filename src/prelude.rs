//! Convenient re-exports for common usage patterns.
//!
//! ```ignore
//! use user_stats::prelude::*;
//!
//! let users = load_collection("users.json")?;
//! let report = aggregate_online(&users, &StatsConfig::default())?;
//! ```

// Unified error handling
pub use crate::error::{Error, Result};

// Configuration
pub use crate::config::{AppConfig, StatsConfig};

// Input
pub use crate::record::{UserCollection, UserRecord, load_collection, parse_collection};

// Online-duration and geo report
pub use crate::online::{Distribution, OnlineReport, aggregate_online, process_data};

// Age report
pub use crate::ages::{AgeReport, aggregate_ages, aggregate_users_stats};
