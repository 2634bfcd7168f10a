use color_eyre::eyre::{Result, WrapErr};
use reqwest::Url;
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "https://jsonplaceholder.typicode.com/posts";
const DEFAULT_LOG_FILE: &str = "simple_journal.log";

#[derive(Debug, Clone)]
pub struct Config {
    /// Collection endpoint; single entries live at `{api_url}/{id}`.
    pub api_url: String,
    pub log_file: PathBuf,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Config::from_vars(
            std::env::var("JOURNAL_API_URL").ok(),
            std::env::var("JOURNAL_LOG_FILE").ok(),
            std::env::var("RUST_LOG").ok(),
        )
    }

    fn from_vars(
        api_url: Option<String>,
        log_file: Option<String>,
        log_level: Option<String>,
    ) -> Result<Self> {
        let api_url = api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Url::parse(&api_url)
            .wrap_err_with(|| format!("JOURNAL_API_URL is not a valid URL: {api_url}"))?;

        Ok(Config {
            api_url: api_url.trim_end_matches('/').to_string(),
            log_file: PathBuf::from(log_file.unwrap_or_else(|| DEFAULT_LOG_FILE.to_string())),
            log_level: log_level.unwrap_or_else(|| "info".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_mock_service() {
        let config = Config::from_vars(None, None, None).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.log_file, PathBuf::from("simple_journal.log"));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn strips_trailing_slash() {
        let config =
            Config::from_vars(Some("http://localhost:3000/posts/".into()), None, None).unwrap();
        assert_eq!(config.api_url, "http://localhost:3000/posts");
    }

    #[test]
    fn rejects_invalid_url() {
        let err = Config::from_vars(Some("not a url".into()), None, None).unwrap_err();
        assert!(err.to_string().contains("JOURNAL_API_URL"));
    }
}
