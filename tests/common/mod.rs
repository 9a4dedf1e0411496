//! Common test utilities and fixtures.
//!
//! Shared user collections and a scratch workspace so the integration
//! tests can read and write real files.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use user_stats::StatsConfig;

// =============================================================================
// User Collections
// =============================================================================

/// One user, online for zero days, in region "NY".
pub const SINGLE_USER: &str = r#"{
    "u1": {"registered": "2020-01-01", "last_login": "2020-01-01", "region": "NY"}
}"#;

/// Users spread across every online bucket, with mixed-case keys and
/// some missing fields.
pub const MIXED_USERS: &str = r#"{
    "alice": {"registered": "2021-03-01", "last_login": "2021-03-02", "region": "Moscow"},
    "bob": {"Registered": "2021-03-01", "Last_Login": "2021-03-05", "region": "Tver"},
    "carol": {"registered": "2021-03-01", "last_login": "2021-03-20", "Region": "Kazan"},
    "dave": {"registered": "2021-03-01", "last_login": "2021-05-01", "region": "Moscow"},
    "erin": {"registered": "2020-01-01", "last_login": "2021-03-01"},
    "frank": {"region": "Tver"},
    "grace": {"registered": "", "last_login": "2021-03-01", "region": ""},
    "heidi": {}
}"#;

/// Users with ages and login timestamps, relative to [`AGES_NOW`].
pub const AGE_USERS: &str = r#"{
    "a": {"last_login": "2023-05-31T12:00:00", "age": 21},
    "b": {"last_login": "2023-05-29T12:00:00", "age": 34},
    "c": {"last_login": "2023-05-15T12:00:00", "age": 45},
    "d": {"last_login": "2023-01-10T12:00:00", "age": 52},
    "e": {"last_login": "2020-07-01T08:30:00", "age": 67},
    "f": {"last_login": null, "age": 29},
    "g": {"last_login": "2023-05-31T18:00:00"}
}"#;

/// Reference instant used with [`AGE_USERS`].
pub const AGES_NOW: &str = "2023-06-01T12:00:00";

// =============================================================================
// Workspace
// =============================================================================

/// A scratch directory holding input and output files.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    /// Root of the scratch directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `name` inside the workspace.
    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write `contents` to `name` and return its path.
    pub fn write(&self, name: &str, contents: &str) -> anyhow::Result<PathBuf> {
        let path = self.file(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// Read `name` back as text.
    pub fn read(&self, name: &str) -> anyhow::Result<String> {
        Ok(std::fs::read_to_string(self.file(name))?)
    }

    /// Read `name` back as JSON.
    pub fn read_json(&self, name: &str) -> anyhow::Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.read(name)?)?)
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Default configuration that writes the computed report even when the
/// output path has directories in it.
///
/// Workspace paths are absolute, so the nested-output placeholder would
/// otherwise replace every report.
pub fn direct_output() -> StatsConfig {
    StatsConfig {
        nested_output_placeholder: false,
        ..StatsConfig::default()
    }
}
