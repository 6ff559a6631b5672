//! Poller configuration
//!
//! Every setting can be given as a command-line flag or through the
//! environment variable named in its `env` attribute. The raw arguments are
//! turned into validated, immutable config structs once at startup and passed
//! explicitly from there on.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Args;
use staffing_core::domain::export::FOLDER_DATE_FORMAT;
use std::path::PathBuf;
use std::time::Duration;

/// Scraper invocation used by the claim/poll loop (arguments after the interpreter)
pub const DEFAULT_SCRAPER_COMMAND: &str = "-m src.main schicht-bestaetigen --headless true";

/// Scraper invocation used by the previous-day export
pub const DEFAULT_DAILY_COMMAND: &str = "-m src.main tagesplan-vortag --headless true";

pub const DEFAULT_REGION: &str = "eu-central-1";

/// Date format the scheduling portal uses (`TT.MM.JJJJ`)
pub const PORTAL_DATE_FORMAT: &str = "%d.%m.%Y";

// =============================================================================
// Command-line / environment arguments
// =============================================================================

/// Connection to the staffing hub
#[derive(Debug, Clone, Args)]
pub struct HubArgs {
    /// Base URL of the staffing hub API
    #[arg(long, env = "STAFFING_API_BASE")]
    pub api_base: Option<String>,

    /// Shared secret for the scraper endpoints (fallback: STAFFING_SCRAPER_SECRET)
    #[arg(long, env = "STAFFING_RUN_SECRET", hide_env_values = true)]
    pub secret: Option<String>,
}

/// How the external scraper is started
#[derive(Debug, Clone, Args)]
pub struct ScraperArgs {
    /// Interpreter the scraper command is passed to
    #[arg(long, env = "SCRAPER_PYTHON_CMD", default_value = "python")]
    pub python: String,

    /// Directory the scraper writes its CSV exports into
    #[arg(long, env = "SCRAPER_EXPORT_DIR", default_value = "exports")]
    pub export_dir: PathBuf,

    /// Working directory for the scraper process
    #[arg(long, env = "SCRAPER_WORKING_DIR")]
    pub working_dir: Option<PathBuf>,
}

/// Arguments of the claim/poll loop
#[derive(Debug, Clone, Args)]
pub struct PollArgs {
    #[command(flatten)]
    pub hub: HubArgs,

    #[command(flatten)]
    pub scraper: ScraperArgs,

    /// Scraper arguments, split shell-style
    #[arg(long, env = "SCRAPER_COMMAND", default_value = DEFAULT_SCRAPER_COMMAND)]
    pub scraper_command: String,

    /// Target bucket; uploads are skipped when unset (fallback: STAFFING_S3_BUCKET)
    #[arg(long, env = "STAFFING_BUCKET")]
    pub bucket: Option<String>,

    /// Key prefix inside the bucket
    #[arg(long, env = "STAFFING_PLAN_FOLDER", default_value = "staffing/dienstplan")]
    pub folder: String,

    /// S3 region (fallback: AWS_DEFAULT_REGION, then eu-central-1)
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Fixed date partition (YYYY-MM-DD) instead of today
    #[arg(long, env = "STAFFING_FOLDER_DATE", value_parser = parse_folder_date)]
    pub folder_date: Option<NaiveDate>,

    /// Seconds to wait after a poll that found no run
    #[arg(long, env = "SCRAPER_POLL_INTERVAL", default_value = "60", value_parser = parse_seconds)]
    pub poll_interval: Duration,

    /// Seconds to wait after a processed run before claiming again
    #[arg(long, env = "SCRAPER_RUN_COOLDOWN", default_value = "5", value_parser = parse_seconds)]
    pub run_cooldown: Duration,

    /// Seconds to wait after the hub rejected the secret
    #[arg(long, env = "SCRAPER_FORBIDDEN_BACKOFF", default_value = "120", value_parser = parse_seconds)]
    pub forbidden_backoff: Duration,

    /// Identifier sent with claims (default: random)
    #[arg(long, env = "SCRAPER_POLLER_ID")]
    pub poller_id: Option<String>,
}

/// Arguments of the single-shot previous-day export
#[derive(Debug, Clone, Args)]
pub struct DailyExportArgs {
    #[command(flatten)]
    pub scraper: ScraperArgs,

    /// Scraper arguments, split shell-style; day selection flags are appended
    #[arg(long, env = "CHECKIN_SCRAPER_COMMAND", default_value = DEFAULT_DAILY_COMMAND)]
    pub scraper_command: String,

    /// Target bucket; the upload is skipped when unset
    #[arg(long, env = "CHECKIN_BUCKET")]
    pub bucket: Option<String>,

    /// Key prefix inside the bucket
    #[arg(long, env = "CHECKIN_PREFIX", default_value = "einchecken")]
    pub prefix: String,

    /// S3 region (fallback: AWS_DEFAULT_REGION, then eu-central-1)
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// How many days before today to export
    #[arg(long, default_value_t = 1)]
    pub days_back: u32,

    /// Seconds the scraper keeps the page open after exporting
    #[arg(long, default_value_t = 5)]
    pub wait_seconds: u64,

    /// Explicit day to export (TT.MM.JJJJ), overrides --days-back
    #[arg(long, value_parser = parse_portal_date)]
    pub date: Option<NaiveDate>,
}

// =============================================================================
// Loaded configuration
// =============================================================================

/// Hub endpoint and credentials
#[derive(Debug, Clone)]
pub struct HubConfig {
    pub api_base: String,
    pub secret: String,
}

impl HubConfig {
    pub fn from_args(args: HubArgs) -> Result<Self> {
        let config = Self {
            api_base: args
                .api_base
                .context("STAFFING_API_BASE environment variable not set")?
                .trim()
                .trim_end_matches('/')
                .to_string(),
            secret: args
                .secret
                .or_else(|| env_fallback("STAFFING_SCRAPER_SECRET"))
                .context("STAFFING_RUN_SECRET environment variable not set")?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            anyhow::bail!("api_base must start with http:// or https://");
        }

        if self.secret.trim().is_empty() {
            anyhow::bail!("secret cannot be empty");
        }

        Ok(())
    }
}

/// Scraper process settings
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub python: String,
    pub args: Vec<String>,
    pub export_dir: PathBuf,
    pub working_dir: Option<PathBuf>,
}

impl ScraperConfig {
    pub fn from_args(args: ScraperArgs, command: &str) -> Result<Self> {
        Ok(Self {
            python: args.python,
            args: split_command(command)?,
            export_dir: args.export_dir,
            working_dir: args.working_dir,
        })
    }

    /// Export directory as seen from the poller
    ///
    /// A relative export directory is taken relative to the scraper's
    /// working directory, since that is where the scraper writes it.
    pub fn export_path(&self) -> PathBuf {
        match &self.working_dir {
            Some(dir) if self.export_dir.is_relative() => dir.join(&self.export_dir),
            _ => self.export_dir.clone(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.python.trim().is_empty() {
            anyhow::bail!("python command cannot be empty");
        }

        if self.args.is_empty() {
            anyhow::bail!("scraper command cannot be empty");
        }

        Ok(())
    }
}

/// Object storage target
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// `None` disables uploads
    pub bucket: Option<String>,
    pub folder: String,
    pub region: String,
}

impl StorageConfig {
    fn new(bucket: Option<String>, folder: String, region: Option<String>) -> Self {
        Self {
            bucket: bucket
                .map(|b| b.trim().to_string())
                .filter(|b| !b.is_empty()),
            folder: folder.trim().trim_matches('/').to_string(),
            region: region
                .or_else(|| env_fallback("AWS_DEFAULT_REGION"))
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
        }
    }
}

/// Claim/poll loop configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Sent with every claim so the hub can tell pollers apart
    pub poller_id: String,
    pub hub: HubConfig,
    pub scraper: ScraperConfig,
    pub storage: StorageConfig,
    /// Fixed date partition; today when `None`
    pub folder_date: Option<NaiveDate>,
    pub poll_interval: Duration,
    pub run_cooldown: Duration,
    pub forbidden_backoff: Duration,
}

impl Config {
    pub fn from_args(args: PollArgs) -> Result<Self> {
        let config = Self {
            poller_id: args
                .poller_id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            hub: HubConfig::from_args(args.hub)?,
            scraper: ScraperConfig::from_args(args.scraper, &args.scraper_command)?,
            storage: StorageConfig::new(
                args.bucket.or_else(|| env_fallback("STAFFING_S3_BUCKET")),
                args.folder,
                args.region,
            ),
            folder_date: args.folder_date,
            poll_interval: args.poll_interval,
            run_cooldown: args.run_cooldown,
            forbidden_backoff: args.forbidden_backoff,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.poller_id.is_empty() {
            anyhow::bail!("poller_id cannot be empty");
        }

        self.hub.validate()?;
        self.scraper.validate()?;

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        Ok(())
    }
}

/// Previous-day export configuration
#[derive(Debug, Clone)]
pub struct DailyExportConfig {
    pub scraper: ScraperConfig,
    pub storage: StorageConfig,
    pub days_back: u32,
    pub date: Option<NaiveDate>,
}

impl DailyExportConfig {
    pub fn from_args(args: DailyExportArgs) -> Result<Self> {
        let mut scraper = ScraperConfig::from_args(args.scraper, &args.scraper_command)?;
        scraper.args.extend([
            "--wait-seconds".to_string(),
            args.wait_seconds.to_string(),
            "--days-back".to_string(),
            args.days_back.to_string(),
        ]);
        if let Some(date) = args.date {
            scraper
                .args
                .extend(["--date".to_string(), date.format(PORTAL_DATE_FORMAT).to_string()]);
        }
        scraper.validate()?;

        Ok(Self {
            scraper,
            storage: StorageConfig::new(args.bucket, args.prefix, args.region),
            days_back: args.days_back,
            date: args.date,
        })
    }
}

// =============================================================================
// Parsers
// =============================================================================

/// Parses a (possibly fractional) number of seconds
pub fn parse_seconds(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number of seconds", value))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid duration '{}': {}", value, e))
}

/// Parses a `YYYY-MM-DD` date partition
pub fn parse_folder_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), FOLDER_DATE_FORMAT)
        .map_err(|_| format!("'{}' is not a date in YYYY-MM-DD format", value))
}

/// Parses a `TT.MM.JJJJ` portal date
pub fn parse_portal_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), PORTAL_DATE_FORMAT)
        .map_err(|_| format!("'{}' is not a date in TT.MM.JJJJ format", value))
}

/// Splits a command line the way a POSIX shell would
fn split_command(command: &str) -> Result<Vec<String>> {
    shlex::split(command).with_context(|| format!("Unbalanced quotes in command '{}'", command))
}

fn env_fallback(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub_args() -> HubArgs {
        HubArgs {
            api_base: Some("https://hub.example.com/".to_string()),
            secret: Some("s3cret".to_string()),
        }
    }

    fn scraper_args() -> ScraperArgs {
        ScraperArgs {
            python: "python3".to_string(),
            export_dir: PathBuf::from("exports"),
            working_dir: None,
        }
    }

    fn poll_args() -> PollArgs {
        PollArgs {
            hub: hub_args(),
            scraper: scraper_args(),
            scraper_command: DEFAULT_SCRAPER_COMMAND.to_string(),
            bucket: Some("staffing-data".to_string()),
            folder: "/staffing/dienstplan/".to_string(),
            region: Some("eu-west-1".to_string()),
            folder_date: None,
            poll_interval: Duration::from_secs(60),
            run_cooldown: Duration::from_secs(5),
            forbidden_backoff: Duration::from_secs(120),
            poller_id: Some("poller-1".to_string()),
        }
    }

    #[test]
    fn test_config_from_args() {
        let config = Config::from_args(poll_args()).unwrap();

        assert_eq!(config.poller_id, "poller-1");
        assert_eq!(config.hub.api_base, "https://hub.example.com");
        assert_eq!(config.scraper.python, "python3");
        assert_eq!(
            config.scraper.args,
            vec!["-m", "src.main", "schicht-bestaetigen", "--headless", "true"]
        );
        assert_eq!(config.storage.bucket.as_deref(), Some("staffing-data"));
        assert_eq!(config.storage.folder, "staffing/dienstplan");
        assert_eq!(config.storage.region, "eu-west-1");
        assert_eq!(config.poll_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_config_generates_poller_id() {
        let mut args = poll_args();
        args.poller_id = None;
        let config = Config::from_args(args).unwrap();
        assert!(!config.poller_id.is_empty());
    }

    #[test]
    fn test_blank_bucket_disables_upload() {
        let mut args = poll_args();
        args.bucket = Some("  ".to_string());
        let storage = StorageConfig::new(args.bucket, args.folder, args.region);
        assert_eq!(storage.bucket, None);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::from_args(poll_args()).unwrap();
        assert!(config.validate().is_ok());

        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());
        config.poll_interval = Duration::from_secs(60);

        config.hub.api_base = "hub.example.com".to_string();
        assert!(config.validate().is_err());
        config.hub.api_base = "http://localhost:8080".to_string();

        config.hub.secret = " ".to_string();
        assert!(config.validate().is_err());
        config.hub.secret = "s".to_string();

        config.scraper.args.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_api_base_is_rejected() {
        let mut args = poll_args();
        args.hub.api_base = None;
        let err = Config::from_args(args).unwrap_err();
        assert!(err.to_string().contains("STAFFING_API_BASE"));
    }

    #[test]
    fn test_export_path_follows_working_dir() {
        let mut scraper = ScraperConfig::from_args(scraper_args(), "-m x").unwrap();
        assert_eq!(scraper.export_path(), PathBuf::from("exports"));

        scraper.working_dir = Some(PathBuf::from("/srv/scraper"));
        assert_eq!(scraper.export_path(), PathBuf::from("/srv/scraper/exports"));

        scraper.export_dir = PathBuf::from("/var/exports");
        assert_eq!(scraper.export_path(), PathBuf::from("/var/exports"));
    }

    #[test]
    fn test_split_command_honours_quotes() {
        assert_eq!(
            split_command("-m src.main run --label 'late shift'").unwrap(),
            vec!["-m", "src.main", "run", "--label", "late shift"]
        );
        assert!(split_command("-m 'unterminated").is_err());
    }

    #[test]
    fn test_daily_export_appends_day_selection() {
        let args = DailyExportArgs {
            scraper: scraper_args(),
            scraper_command: DEFAULT_DAILY_COMMAND.to_string(),
            bucket: Some("checkin".to_string()),
            prefix: "einchecken".to_string(),
            region: Some("eu-central-1".to_string()),
            days_back: 2,
            wait_seconds: 10,
            date: NaiveDate::from_ymd_opt(2025, 11, 1),
        };

        let config = DailyExportConfig::from_args(args).unwrap();
        assert_eq!(
            config.scraper.args,
            vec![
                "-m",
                "src.main",
                "tagesplan-vortag",
                "--headless",
                "true",
                "--wait-seconds",
                "10",
                "--days-back",
                "2",
                "--date",
                "01.11.2025"
            ]
        );
        assert_eq!(config.storage.folder, "einchecken");
        assert_eq!(config.days_back, 2);
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("60"), Ok(Duration::from_secs(60)));
        assert_eq!(parse_seconds("0.5"), Ok(Duration::from_millis(500)));
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("soon").is_err());
    }

    #[test]
    fn test_parse_dates() {
        assert_eq!(
            parse_folder_date("2025-11-03"),
            Ok(NaiveDate::from_ymd_opt(2025, 11, 3).unwrap())
        );
        assert!(parse_folder_date("03.11.2025").is_err());

        assert_eq!(
            parse_portal_date("03.11.2025"),
            Ok(NaiveDate::from_ymd_opt(2025, 11, 3).unwrap())
        );
        assert!(parse_portal_date("2025-11-03").is_err());
    }
}
