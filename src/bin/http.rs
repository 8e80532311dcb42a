#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use worksite_planner::{AppConfig, JsonFileStore, MemoryTaskStore, http_api, logging};

    let config = AppConfig::from_env()?;
    logging::init_logging(&config.log_level);

    let addr: SocketAddr = config.http_addr.parse()?;
    println!("worksite-planner HTTP API listening on http://{addr}");
    match &config.data_path {
        Some(path) => {
            let store = JsonFileStore::open(path)?;
            http_api::serve(addr, store, config.timeline_config()).await?;
        }
        None => {
            http_api::serve(addr, MemoryTaskStore::new(), config.timeline_config()).await?;
        }
    }
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
