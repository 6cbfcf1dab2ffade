use kvd_core::config::Config;
use kvd_core::storage::build_storage;
use kvd_line_server::LineServer;
use std::net::SocketAddr;
use std::process;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

fn main() {
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

    let server = match LineServer::bind(addr, storage) {
        Ok(server) => server,
        Err(err) => {
            log::error!("failed to bind {}: {}", addr, err);
            process::exit(1);
        }
    };

    let stop_handle = server.stop_handle();
    let signal_count = Arc::new(AtomicUsize::new(0));
    let handler_count = Arc::clone(&signal_count);
    ctrlc::set_handler(move || {
        let count = handler_count.fetch_add(1, Ordering::SeqCst) + 1;
        if count == 1 {
            log::info!("received shutdown signal, stopping gracefully");
            stop_handle.stop();
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

    log::info!("line server listening on {}", addr);
    if let Err(err) = server.run() {
        log::error!("server loop exited with an error: {}", err);
        process::exit(1);
    }
}
