//! Export artifact and object key types

use chrono::NaiveDate;
use std::path::PathBuf;

/// Date format used for the date partition of object keys
pub const FOLDER_DATE_FORMAT: &str = "%Y-%m-%d";

/// A CSV file left behind by the scraper in the export directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub path: PathBuf,
    pub file_name: String,
    /// Line count including the header
    pub rows: u64,
}

impl ExportArtifact {
    /// Number of data rows, i.e. lines minus the header
    pub fn data_rows(&self) -> u64 {
        self.rows.saturating_sub(1)
    }
}

/// Location of an uploaded export: `s3://<bucket>/<folder>/<date>/<file>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectKey {
    bucket: String,
    key: String,
}

impl ObjectKey {
    /// Builds the date-partitioned key for `file_name`
    ///
    /// Leading and trailing slashes on `folder` are ignored and empty
    /// segments are left out, so an empty folder yields `<date>/<file>`.
    pub fn new(bucket: impl Into<String>, folder: &str, date: NaiveDate, file_name: &str) -> Self {
        let date = date.format(FOLDER_DATE_FORMAT).to_string();
        let key = [folder.trim_matches('/'), date.as_str(), file_name]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("/");

        Self {
            bucket: bucket.into(),
            key,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Key inside the bucket
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 3).unwrap()
    }

    #[test]
    fn test_object_key_layout() {
        let key = ObjectKey::new("staffing-data", "staffing/dienstplan", date(), "plan.csv");
        assert_eq!(key.bucket(), "staffing-data");
        assert_eq!(key.key(), "staffing/dienstplan/2025-11-03/plan.csv");
        assert_eq!(
            key.to_string(),
            "s3://staffing-data/staffing/dienstplan/2025-11-03/plan.csv"
        );
    }

    #[test]
    fn test_object_key_strips_folder_slashes() {
        let key = ObjectKey::new("b", "/einchecken/", date(), "tagesplan.csv");
        assert_eq!(key.key(), "einchecken/2025-11-03/tagesplan.csv");
    }

    #[test]
    fn test_object_key_without_folder() {
        let key = ObjectKey::new("b", "", date(), "plan.csv");
        assert_eq!(key.key(), "2025-11-03/plan.csv");
    }

    #[test]
    fn test_data_rows_excludes_header() {
        let artifact = ExportArtifact {
            path: PathBuf::from("exports/plan.csv"),
            file_name: "plan.csv".to_string(),
            rows: 12,
        };
        assert_eq!(artifact.data_rows(), 11);

        let empty = ExportArtifact { rows: 0, ..artifact };
        assert_eq!(empty.data_rows(), 0);
    }
}
