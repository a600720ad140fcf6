use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://u50g7n0cbj.execute-api.us-east-1.amazonaws.com/v2";
pub const DEFAULT_OUTPUT_DIR: &str = "data/raw";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Everything a run needs, resolved once up front and handed to each component.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// API root, without the resource segment.
    pub base_url: String,
    /// Directory that receives the JSON files. Emptied at the start of a run.
    pub output_dir: PathBuf,
    pub verbose: bool,
    /// Where `--verbose` runs write their timestamped log file.
    pub log_dir: PathBuf,

    pub country_id: String,
    pub city: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    /// Aggregation level for averages (`location`, `country`, `total`).
    pub spatial: String,
    /// Time bucket for averages (`hour`, `day`, `month`, ...).
    pub temporal: String,
    /// Records per bulk page.
    pub page_size: u32,

    pub probe_timeout: Duration,
    pub bulk_timeout: Duration,
    /// Countries and parameters.
    pub catalog_timeout: Duration,
    pub locations_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.into(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            verbose: false,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            country_id: "ES".into(),
            city: "Lleida".into(),
            date_from: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            date_to: NaiveDate::from_ymd_opt(2020, 12, 31).unwrap_or_default(),
            spatial: "location".into(),
            temporal: "day".into(),
            page_size: 10_000,
            probe_timeout: Duration::from_secs(20),
            bulk_timeout: Duration::from_secs(120),
            catalog_timeout: Duration::from_secs(20),
            locations_timeout: Duration::from_secs(30),
        }
    }
}

impl Settings {
    /// Resolve settings from CLI values, then `OPENAQ_API_URL` / `OPENAQ_LOG_DIR`,
    /// then built-in defaults.
    pub fn from_env(path: Option<PathBuf>, verbose: bool) -> Self {
        Self::resolve(path, verbose, |k| std::env::var(k).ok())
    }

    /// Same as [`Settings::from_env`] with an explicit variable lookup.
    pub fn resolve(
        path: Option<PathBuf>,
        verbose: bool,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let defaults = Self::default();
        let non_empty = |k: &str| env(k).filter(|v| !v.trim().is_empty());
        Self {
            base_url: non_empty("OPENAQ_API_URL").unwrap_or(defaults.base_url.clone()),
            log_dir: non_empty("OPENAQ_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.log_dir.clone()),
            output_dir: path.unwrap_or(defaults.output_dir.clone()),
            verbose,
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_then_env_then_default() {
        let s = Settings::resolve(None, false, |_| None);
        assert_eq!(s, Settings::default());

        let s = Settings::resolve(Some("out".into()), true, |k| match k {
            "OPENAQ_API_URL" => Some("http://127.0.0.1:1/v2".into()),
            "OPENAQ_LOG_DIR" => Some("  ".into()),
            _ => None,
        });
        assert_eq!(s.output_dir, PathBuf::from("out"));
        assert!(s.verbose);
        assert_eq!(s.base_url, "http://127.0.0.1:1/v2");
        assert_eq!(s.log_dir, PathBuf::from(DEFAULT_LOG_DIR));
    }
}
