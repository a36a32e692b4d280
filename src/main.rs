use pr_reviewer_lib::config::ServerConfig;

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("[server] Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    log::info!(
        "[server] Starting with database {}",
        config.database_path.display()
    );

    if let Err(e) = pr_reviewer_lib::run(config).await {
        log::error!("[server] {}", e);
        std::process::exit(1);
    }
}
