use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Typed process configuration, loaded once at startup and passed to all
/// components. Nothing reads the environment after `load()` returns.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub config_dir: PathBuf,

    // Digest job
    pub digest_hour: u32,
    pub digest_minute: u32,
    pub max_results: usize,

    // arXiv API
    pub arxiv_api_url: String,
    pub http_timeout: Duration,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let telegram_bot_token = env_str("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let config_dir = env_path("ARXD_CONFIG_DIR").unwrap_or_else(|| PathBuf::from("./config"));
        fs::create_dir_all(&config_dir)?;

        let digest_hour = env_u32("ARXD_DIGEST_HOUR").unwrap_or(9);
        let digest_minute = env_u32("ARXD_DIGEST_MINUTE").unwrap_or(0);
        if digest_hour > 23 {
            return Err(Error::Config(format!(
                "ARXD_DIGEST_HOUR out of range: {digest_hour}"
            )));
        }
        if digest_minute > 59 {
            return Err(Error::Config(format!(
                "ARXD_DIGEST_MINUTE out of range: {digest_minute}"
            )));
        }

        let max_results = env_usize("ARXD_MAX_RESULTS").unwrap_or(10).clamp(1, 100);

        let arxiv_api_url = env_str("ARXIV_API_URL")
            .and_then(non_empty)
            .unwrap_or_else(|| "https://export.arxiv.org/api/query".to_string());
        let http_timeout = Duration::from_millis(env_u64("ARXD_HTTP_TIMEOUT_MS").unwrap_or(30_000));

        Ok(Self {
            telegram_bot_token,
            config_dir,
            digest_hour,
            digest_minute,
            max_results,
            arxiv_api_url,
            http_timeout,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    env_str(key).and_then(|s| s.trim().parse::<u32>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key).map(PathBuf::from)
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
