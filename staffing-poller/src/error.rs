//! Errors of a single scrape run
//!
//! The `Display` text of these errors is what the hub shows for a failed run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    /// The scraper process could not be started
    #[error("failed to start scraper '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The scraper ran but did not exit cleanly
    #[error("scraper exited with {}", exit_description(.code))]
    ScraperFailed { code: Option<i32> },

    /// The export directory could not be read
    #[error("export directory {}: {source}", .dir.display())]
    ExportDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scraper finished without leaving a CSV behind
    #[error("no new CSV found in {}", .0.display())]
    NoExport(PathBuf),

    /// The claimed run carried an unusable folder date
    #[error("invalid folder date '{0}', expected YYYY-MM-DD")]
    InvalidFolderDate(String),

    /// Object storage rejected the export
    #[error("upload to {key} failed: {message}")]
    Upload { key: String, message: String },
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_shown_to_hub() {
        assert_eq!(
            RunError::ScraperFailed { code: Some(2) }.to_string(),
            "scraper exited with status 2"
        );
        assert_eq!(
            RunError::ScraperFailed { code: None }.to_string(),
            "scraper exited with no status (terminated by signal)"
        );
        assert_eq!(
            RunError::NoExport(PathBuf::from("exports")).to_string(),
            "no new CSV found in exports"
        );
        assert_eq!(
            RunError::Upload {
                key: "s3://b/k.csv".to_string(),
                message: "AccessDenied".to_string()
            }
            .to_string(),
            "upload to s3://b/k.csv failed: AccessDenied"
        );
    }
}
