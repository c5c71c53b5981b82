// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Monitor program: connect to a Domintell gateway and print everything
//! the bus reports.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example monitor -- <host> [port]
//! ```
//!
//! The host can also be given through `DOMINTELL_HOST`. Set `RUST_LOG` to
//! see the library's own logs, e.g. `RUST_LOG=domintell_lib=debug`.

use std::env;
use std::sync::Arc;

use domintell_lib::module::{Module, ModuleUpdate};
use domintell_lib::session::{Connection, ConnectionConfig, ConnectionState, DEFAULT_PORT};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let Some(host) = args.get(1).cloned().or_else(|| env::var("DOMINTELL_HOST").ok()) else {
        eprintln!("Usage: {} <host> [port]", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --example monitor -- 192.168.1.20");
        std::process::exit(1);
    };
    let port = match args.get(2) {
        Some(port) => port.parse()?,
        None => DEFAULT_PORT,
    };

    let config = ConnectionConfig::new(host).with_port(port);
    println!("Connecting to {}:{}...", config.host, config.port);

    let connection = Connection::new(
        config,
        Arc::new(|state: ConnectionState, message: Option<&str>| match message {
            Some(message) => println!("[state] {state}: {message}"),
            None => println!("[state] {state}"),
        }),
        Arc::new(|module: &Arc<Module>| {
            println!("[discovered] {} ({:?})", module.key(), module.kind());
            module.set_update_sink(|module: &Module, update: &ModuleUpdate| {
                println!("[update] {}: {update:?}", module.key());
            });
        }),
    );
    connection.start()?;

    let mut states = connection.subscribe_state();
    let mut discovery_sent = false;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let online = states.borrow_and_update().state.is_online();
                if online && !discovery_sent {
                    connection.trigger_discovery();
                    discovery_sent = true;
                }
                if let Some(clock) = connection.last_known_remote_clock() {
                    println!("[clock] {clock}");
                }
            }
        }
    }

    println!("Stopping...");
    for module in connection.registry().modules() {
        match module.info() {
            Some(info) => println!("  {} {} [{}]", module.key(), info.name, info.location),
            None => println!("  {}", module.key()),
        }
    }
    connection.stop().await;
    Ok(())
}
