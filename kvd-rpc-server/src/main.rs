use kvd_core::config::Config;
use kvd_core::storage::build_storage;
use kvd_rpc_server::RpcServer;
use std::net::SocketAddr;
use std::process;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tokio::sync::oneshot;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            log::error!("failed to load configuration: {}", err);
            process::exit(1);
        }
    };

    let ip = config.ip.clone().unwrap_or_else(|| "0.0.0.0".to_string());
    let addr: SocketAddr = match format!("{}:{}", ip, config.port).parse() {
        Ok(addr) => addr,
        Err(err) => {
            log::error!("invalid bind address: {}", err);
            process::exit(1);
        }
    };

    let storage = match build_storage(&config.storage) {
        Ok(storage) => storage,
        Err(err) => {
            log::error!("failed to open storage: {}", err);
            process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let signal_count = Arc::new(AtomicUsize::new(0));
    let shutdown_tx = Arc::new(Mutex::new(Some(shutdown_tx)));
    let handler_count = Arc::clone(&signal_count);
    ctrlc::set_handler(move || {
        let count = handler_count.fetch_add(1, Ordering::SeqCst) + 1;
        if count == 1 {
            log::info!("received shutdown signal, stopping gracefully");
            if let Some(tx) = shutdown_tx.lock().unwrap().take() {
                let _ = tx.send(());
            }
            thread::spawn(|| {
                thread::sleep(SHUTDOWN_GRACE);
                log::error!("graceful shutdown timed out, forcing exit");
                process::exit(1);
            });
        } else {
            log::warn!("received second shutdown signal, exiting immediately");
            process::exit(130);
        }
    })
    .expect("failed to install signal handler");

    let server = RpcServer::new(addr, storage, config.rpc_workers);
    if let Err(err) = server.run(shutdown_rx).await {
        log::error!("server loop exited with an error: {}", err);
        process::exit(1);
    }
}
