use crate::handler::LokiHandler;
use crate::layer::LokiLayer;
use crate::merge::LoggerContext;
use std::collections::HashMap;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the tracing integration.
///
/// **Fields**
/// - `min_level`: least severe level shipped to Loki.
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   installed next to the [`LokiLayer`] so events are printed as well.
/// - `logger_meta`: logger-level metadata keyed by event target.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub min_level: tracing::Level,
    pub enable_stdout: bool,
    pub logger_meta: HashMap<String, LoggerContext>,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            min_level: tracing::Level::INFO,
            enable_stdout: true,
            logger_meta: HashMap::new(),
        }
    }
}

/// Install a [`LokiLayer`] for `handler` as the global `tracing` subscriber.
///
/// **Errors**
///
/// Fails if a global subscriber has already been set.
pub fn init_tracing_with_config(
    handler: LokiHandler,
    config: LayerConfig,
) -> Result<(), SetGlobalDefaultError> {
    let mut layer = LokiLayer::new(handler, config.min_level);
    for (target, context) in config.logger_meta {
        layer = layer.with_logger_meta(target, context);
    }

    // The two subscriber shapes have different types, so each branch
    // installs its own.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    }
}

/// Initialize tracing with [`LayerConfig::default`].
pub fn init_tracing(handler: LokiHandler) -> Result<(), SetGlobalDefaultError> {
    init_tracing_with_config(handler, LayerConfig::default())
}
