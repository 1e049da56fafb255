//! Connection manager.
//!
//! Starts one OS thread per connection, each driving its connection on a
//! private current-thread tokio runtime. The only state shared between
//! workers is the hook registry and the [`ConnectionSet`].

use std::collections::HashSet;
use std::thread;

use parking_lot::Mutex;
use tracing::{Instrument, error, info, warn};

use crate::config::ConnectionConfig;
use crate::connection::{self, Connection, ConnectionSet, Outbound};
use crate::dispatch::{Dispatcher, panic_message};
use crate::error::{ConnectionError, ManagerError};
use crate::hook::HookRegistry;
use crate::telemetry::spans;

struct Worker {
    id: String,
    handle: thread::JoinHandle<Result<(), ConnectionError>>,
}

/// How one worker ended.
#[derive(Debug)]
pub struct WorkerExit {
    pub id: String,
    pub result: Result<(), ConnectionError>,
}

/// Owns the worker threads.
pub struct ConnectionManager {
    registry: HookRegistry,
    peers: ConnectionSet,
    workers: Mutex<Vec<Worker>>,
}

impl ConnectionManager {
    pub fn new(registry: HookRegistry) -> Self {
        Self {
            registry,
            peers: ConnectionSet::new(),
            workers: Mutex::new(Vec::new()),
        }
    }

    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    /// Live connections.
    pub fn peers(&self) -> &ConnectionSet {
        &self.peers
    }

    /// Snapshot of the live connections, ordered by id.
    pub fn connections(&self) -> Vec<Connection> {
        self.peers.all()
    }

    /// Start one worker per config. Connections appear in [`Self::peers`]
    /// immediately and leave it when their worker exits. A repeated id, in the
    /// batch or among live connections, fails the call before anything starts.
    pub fn start<I>(&self, configs: I) -> Result<Vec<Connection>, ManagerError>
    where
        I: IntoIterator<Item = ConnectionConfig>,
    {
        let configs: Vec<ConnectionConfig> = configs.into_iter().collect();
        let mut ids = HashSet::new();
        for config in &configs {
            if !ids.insert(config.name.as_str()) || self.peers.get(&config.name).is_some() {
                return Err(ManagerError::DuplicateConnection(config.name.clone()));
            }
        }

        let mut started = Vec::new();
        for config in configs {
            let (conn, outbound) = Connection::new(config);
            if !self.peers.insert(conn.clone()) {
                return Err(ManagerError::DuplicateConnection(conn.id().to_owned()));
            }

            let dispatcher = Dispatcher::new(self.registry.clone(), self.peers.clone());
            let peers = self.peers.clone();
            let worker_conn = conn.clone();
            let spawned = thread::Builder::new()
                .name(format!("irc-{}", conn.id()))
                .spawn(move || worker_main(worker_conn, outbound, dispatcher, peers));

            let handle = match spawned {
                Ok(handle) => handle,
                Err(source) => {
                    self.peers.remove(conn.id());
                    return Err(ManagerError::Spawn {
                        name: conn.id().to_owned(),
                        source,
                    });
                }
            };

            info!(connection = %conn.id(), authority = %conn.authority(), "Started worker");
            self.workers.lock().push(Worker {
                id: conn.id().to_owned(),
                handle,
            });
            started.push(conn);
        }
        Ok(started)
    }

    /// Ask every live connection to stop. Returns immediately.
    pub fn stop_all(&self) {
        for conn in self.peers.all() {
            conn.stop();
        }
    }

    /// Block until every started worker has exited.
    pub fn join_all(&self) -> Vec<WorkerExit> {
        let workers = std::mem::take(&mut *self.workers.lock());
        workers
            .into_iter()
            .map(|worker| {
                let result = worker.handle.join().unwrap_or_else(|payload| {
                    Err(ConnectionError::WorkerPanicked(panic_message(payload.as_ref())))
                });
                WorkerExit {
                    id: worker.id,
                    result,
                }
            })
            .collect()
    }
}

fn worker_main(
    conn: Connection,
    outbound: Outbound,
    dispatcher: Dispatcher,
    peers: ConnectionSet,
) -> Result<(), ConnectionError> {
    let span = spans::connection(conn.id(), conn.authority());

    let result = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => {
            let run = connection::run(conn.clone(), outbound, dispatcher);
            runtime.block_on(run.instrument(span))
        }
        Err(e) => {
            error!(connection = %conn.id(), error = %e, "Failed to build runtime");
            conn.stop();
            Err(e.into())
        }
    };

    peers.remove(conn.id());
    match &result {
        Ok(()) => info!(connection = %conn.id(), "Worker exited"),
        Err(e) => warn!(connection = %conn.id(), error = %e, "Worker exited with error"),
    }
    result
}
