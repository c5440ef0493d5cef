use std::path::PathBuf;
use std::sync::Arc;

use restbase::config::Config;
use restbase::logger;
use restbase::server::{self, RestHost};

mod demo;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional first argument: config file path without extension
    let cfg = match std::env::args().nth(1) {
        Some(config_path) => Config::load_from(&config_path)?,
        None => Config::load()?,
    };
    logger::init(&cfg.logging)?;

    // Build the Tokio runtime, sized by `server.workers` when set
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        logger::log_info(&format!("Using {workers} worker threads"));
    } else {
        logger::log_info("Using default worker threads (CPU cores)");
    }

    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr, cfg.server.backlog)?;
    logger::log_server_start(&addr, &cfg);

    let download_dir = PathBuf::from(&cfg.demo.download_dir);
    let host = Arc::new(RestHost::new(Arc::new(cfg), move || {
        demo::FilesService::new(download_dir.clone())
    }));

    server::serve(listener, host, server::shutdown_signal()).await;
    logger::log_info("Server stopped");
    Ok(())
}
