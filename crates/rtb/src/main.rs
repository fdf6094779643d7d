use std::sync::Arc;

use rtb_core::{config::Config, storage::file::FileStorage, storage::port::StoragePort};

#[tokio::main]
async fn main() -> Result<(), rtb_core::Error> {
    rtb_core::logging::init("rtb");

    let cfg = Arc::new(Config::load()?);
    let storage: Arc<dyn StoragePort> = Arc::new(FileStorage::open(&cfg.data_dir)?);

    rtb_telegram::router::run_polling(cfg, storage)
        .await
        .map_err(|e| rtb_core::Error::Transport(format!("telegram bot failed: {e}")))?;

    Ok(())
}
