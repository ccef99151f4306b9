// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Map session host: one registry, a controller socket and a surface socket.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use mapsync_app_core::config::ConfigService;
use mapsync_app_core::prefs::HostPrefs;
use mapsync_config_fs::FsConfigStore;
use mapsync_core::{runtime, RegistryConfig, SessionRegistry};
use mapsync_surface::RemoteFactory;
use tokio::net::UnixListener;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod net;

#[derive(Parser, Debug)]
#[command(author, version, about = "Map session host")]
struct Args {
    /// Controller socket path (overrides saved prefs)
    #[arg(long)]
    controller_socket: Option<PathBuf>,
    /// Rendering surface socket path (overrides saved prefs)
    #[arg(long)]
    surface_socket: Option<PathBuf>,
    /// Quiet period before a view change is reported, in milliseconds
    #[arg(long)]
    debounce_ms: Option<u64>,
    /// Replace a live session when `initialize` repeats its id
    #[arg(long)]
    allow_duplicate_ids: bool,
}

impl Args {
    fn apply(self, mut prefs: HostPrefs) -> HostPrefs {
        if let Some(path) = self.controller_socket {
            prefs.controller_socket = path;
        }
        if let Some(path) = self.surface_socket {
            prefs.surface_socket = path;
        }
        if let Some(ms) = self.debounce_ms {
            prefs.view_debounce_ms = ms;
        }
        if self.allow_duplicate_ids {
            prefs.strict_session_ids = false;
        }
        prefs
    }
}

fn load_prefs() -> HostPrefs {
    let config = match FsConfigStore::new() {
        Ok(store) => ConfigService::new(store),
        Err(err) => {
            warn!(error = %err, "config dir unavailable; using defaults");
            return HostPrefs::default();
        }
    };
    config
        .load_or_init::<HostPrefs>(HostPrefs::KEY)
        .unwrap_or_else(|err| {
            warn!(error = %err, "could not load host prefs; using defaults");
            HostPrefs::default()
        })
}

fn bind(path: &Path) -> Result<UnixListener> {
    // Remove stale socket if present
    let _ = std::fs::remove_file(path);
    Ok(UnixListener::bind(path)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let prefs = Args::parse().apply(load_prefs());
    let config = RegistryConfig {
        view_debounce: prefs.view_debounce(),
        strict_session_ids: prefs.strict_session_ids,
    };

    let controller = bind(&prefs.controller_socket)?;
    let surface = bind(&prefs.surface_socket)?;
    info!(
        controller = %prefs.controller_socket.display(),
        surface = %prefs.surface_socket.display(),
        debounce_ms = prefs.view_debounce_ms,
        "map host listening"
    );

    let (input_tx, input_rx) = mpsc::channel(256);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (command_tx, command_rx) = mpsc::unbounded_channel();

    tokio::spawn({
        let inputs = input_tx.clone();
        async move {
            if let Err(err) = net::controller_loop(controller, inputs, event_rx).await {
                error!(?err, "controller listener stopped");
            }
        }
    });
    tokio::spawn(async move {
        if let Err(err) = net::surface_loop(surface, input_tx, command_rx).await {
            error!(?err, "surface listener stopped");
        }
    });

    let mut registry = SessionRegistry::new(RemoteFactory::new(command_tx), event_tx, config);
    tokio::select! {
        () = runtime::run(&mut registry, input_rx) => {}
        res = tokio::signal::ctrl_c() => {
            res?;
            info!("interrupted");
        }
    }
    registry.shutdown();

    for path in [&prefs.controller_socket, &prefs.surface_socket] {
        let _ = std::fs::remove_file(path);
    }
    Ok(())
}
