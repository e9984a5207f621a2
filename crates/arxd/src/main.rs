use std::sync::Arc;

use arxd_arxiv::ArxivClient;
use arxd_core::{config::Config, store::ConfigStore};

#[tokio::main]
async fn main() -> Result<(), arxd_core::Error> {
    arxd_core::logging::init("arxd")?;

    let cfg = Arc::new(Config::load()?);
    let store = ConfigStore::new(cfg.config_dir.clone());
    let index = Arc::new(ArxivClient::new(
        cfg.arxiv_api_url.clone(),
        cfg.http_timeout,
    )?);

    arxd_telegram::router::run_polling(cfg, store, index)
        .await
        .map_err(|e| arxd_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
