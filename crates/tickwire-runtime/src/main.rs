//! tickwire demo host.
//!
//! Attaches a server and a client endpoint to one loopback host and drives
//! the tick loop on a tokio interval:
//! - `<namespace>:echo` answers with the request payload
//! - `<namespace>:fail` answers with a `Failure`
//! - `<namespace>:log` receives one-way messages
//!
//! The large invoke exercises streaming in both directions.

use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use tickwire_core::error::Result;
use tickwire_core::value::{Failure, Value};
use tickwire_runtime::{config, InvokeOptions, LoopbackHost, SendOptions};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tickwire.yaml".to_string());
    if let Err(e) = run(&path).await {
        tracing::error!(kind = e.kind().as_str(), error = %e, "tickwire-demo failed");
        std::process::exit(1);
    }
}

async fn run(path: &str) -> Result<()> {
    let cfg = config::load_from_file(path)?;
    let host = LoopbackHost::from_section(&cfg.host);
    let tick_every = Duration::from_millis(cfg.host.tick_interval_ms);

    let server = host.attach_config(&cfg)?;
    let client = host.attach("demo_client", cfg.invoke.timeout_ticks)?;
    let ns = cfg.namespace.as_str();

    server.register_listener(format!("{ns}:echo"), |v: Value| -> Result<Value> { Ok(v) })?;
    server.register_listener(format!("{ns}:fail"), |_: Value| -> Result<Value> {
        Err(Failure::new("demo failure").into())
    })?;
    server.register_listener(format!("{ns}:log"), |v: Value| -> Result<Value> {
        let len = v.as_str().map(str::len).unwrap_or_default();
        tracing::info!(len, "log message received");
        Ok(Value::Null)
    })?;
    tracing::info!(namespace = %ns, tick_ms = cfg.host.tick_interval_ms, "tickwire-demo starting");

    let small = client.invoke(&InvokeOptions::new(format!("{ns}:echo")), &Value::from("ping"))?;
    let reply = host.drive(tick_every, small).await?;
    tracing::info!(reply = ?reply, tick = host.scheduler().current_tick(), "echo answered");

    let big = Value::from("x".repeat(5000));
    let streamed = client.invoke_auto(&InvokeOptions::new(format!("{ns}:echo")), &big)?;
    let reply = host.drive(tick_every, streamed).await?;
    tracing::info!(
        same = (reply == big),
        tick = host.scheduler().current_tick(),
        "streamed echo answered"
    );

    let failed = client.invoke(
        &InvokeOptions::new(format!("{ns}:fail")).throw_failures(true),
        &Value::Null,
    )?;
    match host.drive(tick_every, failed).await {
        Err(e) => tracing::info!(kind = e.kind().as_str(), error = %e, "failure surfaced"),
        Ok(v) => tracing::warn!(value = ?v, "expected a failure"),
    }

    let sent = client.send_auto(&SendOptions::new(format!("{ns}:log")), &Value::from("y".repeat(3000)))?;
    host.drive(tick_every, sent).await?;
    // let the last fragment reach the server
    host.drive(tick_every, tokio::time::sleep(tick_every * 3)).await;

    let unanswered = client.invoke(
        &InvokeOptions::new(format!("{ns}:nobody")).timeout_ticks(5),
        &Value::Null,
    )?;
    if let Err(e) = host.drive(tick_every, unanswered).await {
        tracing::info!(kind = e.kind().as_str(), tick = host.scheduler().current_tick(), "unanswered invoke timed out");
    }

    tracing::info!("tickwire-demo done");
    Ok(())
}
