use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use loki_log_sink::env::config_from_env;
use loki_log_sink::init::{init_tracing_with_config, LayerConfig};
use loki_log_sink::{HandlerConfig, Logger, LoggerContext, LokiHandler, Strategy};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // LOKI_URLS wins when set; otherwise push to two local instances,
    // falling back to the second one when the first is down.
    let config = match config_from_env() {
        Ok(config) => config,
        Err(_) => HandlerConfig::builder("http://127.0.0.1:3100/loki/api/v1/push")
            .url("http://127.0.0.1:3101/loki/api/v1/push")
            .strategy(Strategy::Fallback)
            .meta("service", "auth-service")
            .build()?,
    };
    let handler = LokiHandler::with_http(config)?;

    let logger = Logger::new("auth", Arc::new(handler.clone())).with_meta([("region", "eu")]);
    let report = logger.warning("direct logger call").await?;
    println!("delivered: {}", report.succeeded());

    let mut layer_config = LayerConfig::default();
    layer_config
        .logger_meta
        .insert("auth".to_string(), LoggerContext::new([("region", "eu")]));
    init_tracing_with_config(handler, layer_config)?;

    info!(target: "auth", "starting service");
    error!(target: "auth", user_id = 42, reason = "invalid password", "authentication failed");

    sleep(Duration::from_secs(2)).await;
    Ok(())
}
