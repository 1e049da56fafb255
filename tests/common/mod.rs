//! Integration test common infrastructure.
//!
//! A scripted fake IRC server plus helpers for driving a real
//! [`ConnectionManager`] against it.

pub mod server;

use std::sync::Arc;
use std::time::Duration;

use ircore::{Connection, ConnectionState, WorkerExit};
use ircore::manager::ConnectionManager;

#[allow(unused_imports)]
pub use server::{FakeServer, Peer};

/// Block (off the test runtime) until every worker has exited.
#[allow(dead_code)]
pub async fn join(manager: &Arc<ConnectionManager>) -> anyhow::Result<Vec<WorkerExit>> {
    let manager = Arc::clone(manager);
    Ok(tokio::task::spawn_blocking(move || manager.join_all()).await?)
}

/// Stop everything and wait for the workers.
#[allow(dead_code)]
pub async fn shutdown(manager: &Arc<ConnectionManager>) -> anyhow::Result<Vec<WorkerExit>> {
    manager.stop_all();
    join(manager).await
}

/// Poll until the connection reaches `state`.
#[allow(dead_code)]
pub async fn wait_for_state(conn: &Connection, state: ConnectionState) -> anyhow::Result<()> {
    for _ in 0..200 {
        if conn.state() == state {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    anyhow::bail!("{} never reached {state}, stuck in {}", conn.id(), conn.state())
}
