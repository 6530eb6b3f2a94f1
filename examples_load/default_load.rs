use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};

use loki_log_sink::diagnostics::StderrDiagnostics;
use loki_log_sink::noop_transport::NoopTransport;
use loki_log_sink::{HandlerConfig, Level, LogRecord, LokiHandler, Strategy};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = HandlerConfig::builder("http://loki1:3100/loki/api/v1/push")
        .url("http://loki2:3100/loki/api/v1/push")
        .strategy(Strategy::All)
        .meta("service", "load-test")
        .build()?;
    let handler = LokiHandler::new(config, Arc::new(NoopTransport), Arc::new(StderrDiagnostics))?;

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        let record = LogRecord::new("load", Level::Error, "default load test error")
            .with_meta([("iteration", i.to_string())]);
        // Delivery tasks are detached; only the emit cost is measured.
        drop(handler.emit(record));
    }

    let elapsed = start.elapsed();
    println!("default config: emitted {} records in {:?} (~{:.0} rec/s)",
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    // Give background tasks a little time to drain
    sleep(Duration::from_secs(2)).await;
    Ok(())
}
