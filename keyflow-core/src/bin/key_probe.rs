// keyflow-core/src/bin/key_probe.rs

use anyhow::{Context, Result};
use keyflow_core::{AgentConfig, EventCategory, InputAgent, Mode, listener};
use std::fs::File;
use std::sync::Mutex;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    eprintln!("[key_probe] starting… (Tab: line mode, ':key': key mode, q / ':quit': exit)");

    let config = AgentConfig::from_env().context("invalid KEYFLOW_* configuration")?;
    let agent = InputAgent::from_config(config);

    // Printing happens on the async side; the loop thread only forwards.
    let mut events = agent.subscribe(EventCategory::Input)?;

    let to_sequence = agent.clone();
    agent.add_listener(
        EventCategory::SingleKey,
        listener(move |event| {
            if event.value() == "\t" {
                to_sequence.set_mode(Mode::Sequence);
            }
        }),
    )?;

    let to_keys = agent.clone();
    agent.add_listener(
        EventCategory::Sequence,
        listener(move |event| {
            if event.value().trim() == ":key" {
                to_keys.set_mode(Mode::SingleKey);
            }
        }),
    )?;

    let handle = agent.start().context("failed to start input agent")?;
    let mut poll = tokio::time::interval(Duration::from_millis(250));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("\n[key_probe] Ctrl+C received, exiting…");
                break;
            }

            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };
                println!("[{}] {:?}", event.category(), event.value());

                let quit = match event.category() {
                    EventCategory::SingleKey => matches!(event.value(), "q" | "\x03"),
                    EventCategory::Sequence => event.value().trim() == ":quit",
                    _ => false,
                };
                if quit {
                    eprintln!("[key_probe] exit requested, exiting…");
                    break;
                }
            }

            _ = poll.tick() => {
                if handle.is_finished() {
                    break;
                }
            }
        }
    }

    handle.cancel();
    if let Err(e) = keyflow_io::reset_terminal() {
        tracing::warn!("failed to reset terminal: {}", e);
    }

    if handle.is_finished() {
        let exit = handle.join().context("input loop failed")?;
        eprintln!("[key_probe] input loop ended: {:?}", exit);
    }

    eprintln!("[key_probe] recent input: {:?}", agent.recent_inputs());
    Ok(())
}

/// Logs go to stderr, or to `KEYFLOW_LOG_FILE` when set. Never fatal.
fn init_tracing() {
    let builder = tracing_subscriber::fmt().with_max_level(tracing::Level::INFO);

    match std::env::var("KEYFLOW_LOG_FILE") {
        Ok(path) => match File::create(&path) {
            Ok(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
            Err(e) => {
                builder.with_writer(std::io::stderr).init();
                tracing::warn!("cannot open log file {}: {}, logging to stderr", path, e);
            }
        },
        Err(_) => builder.with_writer(std::io::stderr).init(),
    }
}
