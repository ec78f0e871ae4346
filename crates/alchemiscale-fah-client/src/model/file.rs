// File listing model types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::timestamp;

/// A file stored by the work server
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileData {
    /// File path relative to the project, job or gen directory
    pub path: String,
    /// The file size in bytes
    pub size: u64,
    #[serde(with = "timestamp")]
    pub modified: DateTime<Utc>,
}

impl FileData {
    pub fn has_extension(&self, ext: &str) -> bool {
        let ext = ext.trim_start_matches('.');
        std::path::Path::new(&self.path)
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case(ext))
    }
}
