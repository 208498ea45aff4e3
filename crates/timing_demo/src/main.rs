//! Prints a timing report for a small simulated workload.
//!
//! Usage: `timing-demo [config.json]`
//!
//! Set `RUST_LOG=scope_timer=trace` to see scopes open and close.

use anyhow::Context;
use scope_timer::{IoSink, ReportConfig, RootScope, Scope, SystemClock};
use std::thread::sleep;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ReportConfig::load(&path)
            .with_context(|| format!("failed to load config from {}", path))?,
        None => ReportConfig::default(),
    };
    tracing::info!(?config, "starting timing demo");

    let root = RootScope::start_with(
        "load",
        IoSink::new(std::io::stdout()),
        SystemClock::new(),
        config,
    );

    {
        let parse = root.start_child("parse")?;
        work(&parse, 15);
        {
            let _validate = parse.start_child("validate")?;
            sleep(Duration::from_millis(5));
        }
    }
    {
        let _index = root.start_child("index")?;
        sleep(Duration::from_millis(10));
    }
    sleep(Duration::from_millis(3));

    root.finish().context("failed to write timing report")?;
    Ok(())
}

/// Split `ms` of simulated work into a few nested chunks.
fn work(parent: &Scope<'_>, ms: u64) {
    for chunk in 0..3 {
        match parent.start_child(format!("chunk {}", chunk)) {
            Ok(_scope) => sleep(Duration::from_millis(ms / 3)),
            Err(err) => tracing::warn!(error = %err, "could not open chunk scope"),
        }
    }
}
