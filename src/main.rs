//! GDB Console Driver
//!
//! Runs GDB in console mode and drives it through the command queue. Reads
//! requests from stdin, one per line, and prints parsed results to stdout.
//!
//! Usage:
//!   gdb-cmd-driver [program]
//!
//! Set `GDB_DRIVER_CONFIG` to a JSON file to override the defaults, or
//! `GDB_DRIVER_GDB_PATH` to pick the debugger executable.

mod cli;

use crate::cli::{parse_request, Console, Request};
use anyhow::{Context, Result};
use gdb_cmd_driver::gdb::{DriverError, DriverEvent, GdbConfig, Session};
use std::sync::mpsc::Receiver;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting gdb-cmd-driver v{}", env!("CARGO_PKG_VERSION"));

    let config = GdbConfig::from_env().context("Failed to load configuration")?;
    let mut session = Session::launch(config)
        .await
        .context("Failed to start the debugger")?;
    let events = session
        .driver_mut()
        .event_receiver()
        .context("Driver log receiver already taken")?;

    let mut console = Console::new();
    if let Some(program) = std::env::args().nth(1) {
        console.dispatch(Request::File(program), session.driver_mut())?;
        pump(&mut session).await?;
        print_events(&events);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("Ready, reading requests from stdin");

    let mut quit_sent = false;
    while let Some(line) = lines.next_line().await? {
        let request = match parse_request(&line) {
            Ok(Some(request)) => request,
            Ok(None) => continue,
            Err(e) => {
                warn!("{:#}", e);
                continue;
            }
        };
        let quit = request == Request::Quit;

        if let Err(e) = console.dispatch(request, session.driver_mut()) {
            warn!("{:#}", e);
            continue;
        }
        pump(&mut session).await?;
        print_events(&events);
        if quit {
            quit_sent = true;
            break;
        }
    }

    info!("Shutting down");
    if quit_sent {
        session.transport_mut().stop().await?;
    } else {
        session.shutdown().await?;
    }
    print_events(&events);
    Ok(())
}

/// Run the queue dry. A slow reply is reported and picked up by the next
/// pump; anything else ends the program.
async fn pump<T: gdb_cmd_driver::gdb::Transport>(session: &mut Session<T>) -> Result<()> {
    match session.run_until_idle().await {
        Ok(()) => Ok(()),
        Err(DriverError::Timeout(ms)) => {
            let pending = session.driver().current_command_text().unwrap_or_default();
            warn!("No reply to '{}' after {}ms", pending, ms);
            Ok(())
        }
        Err(e) => {
            error!("Debugger session failed: {}", e);
            Err(e.into())
        }
    }
}

fn print_events(events: &Receiver<DriverEvent>) {
    for event in events.try_iter() {
        match event {
            DriverEvent::Log(message) => println!("{}", message),
            // Already traced by the driver
            DriverEvent::DebugLog(_) => {}
        }
    }
}
