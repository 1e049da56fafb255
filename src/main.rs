//! ircore - multi-network IRC bot.
//!
//! Usage: `ircore [config.toml]`

use std::sync::Arc;

use ircore::config::{Config, validation};
use ircore::connection::ConnectionSet;
use ircore::console::{Console, ConsoleExit};
use ircore::hook::HookRegistry;
use ircore::manager::ConnectionManager;
use ircore::{plugins, telemetry};
use tokio::sync::oneshot;
use tracing::{error, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    telemetry::init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = validation::validate(&config) {
        for e in &errors {
            error!(path = %config_path, error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {config_path}", errors.len());
    }

    info!(
        networks = config.networks.len(),
        command_prefix = %config.bot.command_prefix,
        "Starting ircore"
    );

    let registry = HookRegistry::new();
    let builtins = plugins::register_builtin(&registry, config.bot.command_prefix)?;
    info!(hooks = builtins.len(), "Registered built-in hooks");

    let manager = Arc::new(ConnectionManager::new(registry));
    manager.start(config.connections())?;

    let console_exit = spawn_console(manager.peers().clone())?;
    let mut waiter = {
        let manager = Arc::clone(&manager);
        tokio::task::spawn_blocking(move || manager.join_all())
    };

    // Stop on Ctrl-C, on /exit, or once every worker has ended by itself.
    let finished = tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                error!(error = %e, "Failed to listen for Ctrl-C");
            }
            info!("Shutdown requested");
            None
        }
        Ok(()) = console_exit => {
            info!("Console requested exit");
            None
        }
        done = &mut waiter => Some(done),
    };

    let exits = match finished {
        Some(done) => done?,
        None => {
            manager.stop_all();
            waiter.await?
        }
    };

    for exit in &exits {
        match &exit.result {
            Ok(()) => info!(connection = %exit.id, "Connection finished"),
            Err(e) => warn!(connection = %exit.id, error = %e, "Connection failed"),
        }
    }
    info!("Shutdown complete");
    Ok(())
}

/// Run the console on its own thread; stdin reads block. The receiver
/// resolves only on `/exit`.
fn spawn_console(peers: ConnectionSet) -> std::io::Result<oneshot::Receiver<()>> {
    let (tx, rx) = oneshot::channel();
    std::thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            let _span = telemetry::spans::console().entered();
            let mut console = Console::new(peers);
            match console.run(std::io::stdin().lock(), std::io::stdout()) {
                Ok(ConsoleExit::Requested) => {
                    let _ = tx.send(());
                }
                Ok(ConsoleExit::InputClosed) => info!("Console input closed"),
                Err(e) => warn!(error = %e, "Console failed"),
            }
        })?;
    Ok(rx)
}
