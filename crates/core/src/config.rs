//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into
//! services, keeping environment reads out of request handling.

use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    db_path: PathBuf,
    public_base_url: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`. A trailing slash on the public base URL is
    /// dropped so joined resource URLs stay well-formed.
    pub fn new(db_path: PathBuf, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self {
            db_path,
            public_base_url,
        }
    }

    /// Path of the SQLite database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Absolute URL prefix used for bundle entry `fullUrl`s and `Location`
    /// headers, without a trailing slash.
    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let cfg = CoreConfig::new(PathBuf::from("emr.db"), "http://localhost:3000/");
        assert_eq!(cfg.public_base_url(), "http://localhost:3000");
    }
}
