pub mod record;
pub mod merge;
pub mod payload;
pub mod error;
pub mod config;
pub mod env;
pub mod transport;
pub mod http;
pub mod noop_transport;
pub mod dispatch;
pub mod diagnostics;
pub mod handler;
pub mod logger;
pub mod layer;
pub mod init;

#[cfg(test)]
mod testing;

pub use config::{BasicAuth, HandlerConfig};
pub use dispatch::{DispatchOutcome, DispatchReport, Strategy};
pub use error::{ConfigError, DispatchFailure, TransportError};
pub use handler::LokiHandler;
pub use logger::Logger;
pub use merge::LoggerContext;
pub use record::{Level, LogRecord, Message};
