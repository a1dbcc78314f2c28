// SPDX-License-Identifier: MIT OR Apache-2.0

//! etcd path store adapter.
//!
//! Maps the hierarchical [`PathStore`] namespace onto etcd's flat keyspace:
//! every node is one key named by its full path (`/prod/app/1.0/config/db.url`),
//! holding the node's data as its value. Children are found with a prefix scan
//! of `{path}/` and watches are prefix watches filtered down to direct
//! children.

use crate::adapters::RetryPolicy;
use crate::domain::{paths, ConfigError, Result};
use crate::ports::{ChildCallback, ChildEvent, ChildEventKind, PathStore, WatchHandle};
use etcd_client::{
    Client, Compare, CompareOp, EventType, GetOptions, Txn, TxnOp, WatchOptions,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use tokio::runtime::Runtime;
use tokio::sync::oneshot;

fn store_error(operation: &'static str, path: &str, error: etcd_client::Error) -> ConfigError {
    ConfigError::PathOperationFailure {
        operation,
        path: path.to_string(),
        message: error.to_string(),
        source: Some(Box::new(error)),
    }
}

/// Key prefix under which the children of `path` live.
fn child_prefix(path: &str) -> String {
    if path == "/" {
        "/".to_string()
    } else {
        format!("{}/", path)
    }
}

/// Returns the child name if `key` is a direct child of the node owning `prefix`.
fn direct_child<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    key.strip_prefix(prefix)
        .filter(|rest| !rest.is_empty() && !rest.contains('/'))
}

/// [`PathStore`] backed by an etcd cluster.
///
/// All operations block on a runtime owned by the store, so the store can be
/// used from synchronous code. Watch events are delivered on one dedicated
/// thread per watch.
///
/// # Examples
///
/// ```rust,no_run
/// use layercfg::adapters::{EtcdPathStore, RetryPolicy};
/// use layercfg::ports::PathStore;
///
/// let store = EtcdPathStore::connect(vec!["localhost:2379"], &RetryPolicy::default()).unwrap();
/// let exists = store.exists("/prod/myapp/1.0.0/config").unwrap();
/// ```
pub struct EtcdPathStore {
    client: Client,
    runtime: Arc<Runtime>,
    endpoints: Vec<String>,
    closed: AtomicBool,
}

impl std::fmt::Debug for EtcdPathStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtcdPathStore")
            .field("endpoints", &self.endpoints)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}

impl EtcdPathStore {
    /// Connects to `endpoints`, retrying according to `policy`.
    ///
    /// Fails with [`ConfigError::RemoteConnectFailure`] once the policy is
    /// exhausted.
    pub fn connect<S: AsRef<str>>(endpoints: Vec<S>, policy: &RetryPolicy) -> Result<Self> {
        let endpoints: Vec<String> = endpoints.iter().map(|s| s.as_ref().to_string()).collect();

        let runtime = Arc::new(Runtime::new().map_err(|e| ConfigError::SourceError {
            source_name: "etcd".to_string(),
            message: "Failed to create tokio runtime".to_string(),
            source: Some(Box::new(e)),
        })?);

        let target = endpoints.join(",");
        let client = policy.run(&target, |_| {
            runtime.block_on(async {
                let mut client = Client::connect(&endpoints, None).await?;
                client.status().await?;
                Ok::<_, etcd_client::Error>(client)
            })
        })?;

        tracing::info!("Connected to etcd at {}", target);
        Ok(Self {
            client,
            runtime,
            endpoints,
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self, operation: &'static str, path: &str) -> Result<()> {
        paths::validate(path)?;
        if self.closed.load(Ordering::SeqCst) {
            return Err(ConfigError::path_failure(operation, path, "store is closed"));
        }
        Ok(())
    }

    fn key_exists(&self, path: &str) -> Result<bool> {
        if path == "/" {
            return Ok(true);
        }
        let mut client = self.client.clone();
        let response = self
            .runtime
            .block_on(client.get(path, Some(GetOptions::new().with_count_only())))
            .map_err(|e| store_error("exists", path, e))?;
        Ok(response.count() > 0)
    }

    fn has_children(&self, path: &str) -> Result<bool> {
        let mut client = self.client.clone();
        let options = GetOptions::new().with_prefix().with_keys_only();
        let response = self
            .runtime
            .block_on(client.get(child_prefix(path), Some(options)))
            .map_err(|e| store_error("get_children", path, e))?;
        Ok(!response.kvs().is_empty())
    }
}

impl PathStore for EtcdPathStore {
    fn exists(&self, path: &str) -> Result<bool> {
        self.ensure_open("exists", path)?;
        self.key_exists(path)
    }

    fn get_children(&self, path: &str) -> Result<Vec<String>> {
        self.ensure_open("get_children", path)?;
        if !self.key_exists(path)? {
            return Err(ConfigError::NoNode {
                path: path.to_string(),
            });
        }

        let prefix = child_prefix(path);
        let mut client = self.client.clone();
        let options = GetOptions::new().with_prefix().with_keys_only();
        let response = self
            .runtime
            .block_on(client.get(prefix.as_str(), Some(options)))
            .map_err(|e| store_error("get_children", path, e))?;

        Ok(response
            .kvs()
            .iter()
            .filter_map(|kv| kv.key_str().ok())
            .filter_map(|key| direct_child(&prefix, key))
            .map(str::to_string)
            .collect())
    }

    fn get_data(&self, path: &str) -> Result<String> {
        self.ensure_open("get_data", path)?;
        let mut client = self.client.clone();
        let response = self
            .runtime
            .block_on(client.get(path, None))
            .map_err(|e| store_error("get_data", path, e))?;

        let kv = response.kvs().first().ok_or_else(|| ConfigError::NoNode {
            path: path.to_string(),
        })?;
        kv.value_str()
            .map(str::to_string)
            .map_err(|e| store_error("get_data", path, e))
    }

    fn create(&self, path: &str, data: &str) -> Result<()> {
        self.ensure_open("create", path)?;
        let parent = paths::parent(path).ok_or_else(|| ConfigError::NodeExists {
            path: path.to_string(),
        })?;

        let mut conditions = vec![Compare::create_revision(path, CompareOp::Equal, 0)];
        if parent != "/" {
            conditions.push(Compare::create_revision(parent, CompareOp::Greater, 0));
        }
        let txn = Txn::new()
            .when(conditions)
            .and_then(vec![TxnOp::put(path, data, None)]);

        let mut client = self.client.clone();
        let response = self
            .runtime
            .block_on(client.txn(txn))
            .map_err(|e| store_error("create", path, e))?;

        if response.succeeded() {
            tracing::debug!("Created etcd node {}", path);
            return Ok(());
        }
        if self.key_exists(path)? {
            Err(ConfigError::NodeExists {
                path: path.to_string(),
            })
        } else {
            Err(ConfigError::NoNode {
                path: parent.to_string(),
            })
        }
    }

    fn set_data(&self, path: &str, data: &str) -> Result<()> {
        self.ensure_open("set_data", path)?;
        let txn = Txn::new()
            .when(vec![Compare::create_revision(path, CompareOp::Greater, 0)])
            .and_then(vec![TxnOp::put(path, data, None)]);

        let mut client = self.client.clone();
        let response = self
            .runtime
            .block_on(client.txn(txn))
            .map_err(|e| store_error("set_data", path, e))?;

        if response.succeeded() {
            tracing::debug!("Updated etcd node {}", path);
            Ok(())
        } else {
            Err(ConfigError::NoNode {
                path: path.to_string(),
            })
        }
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.ensure_open("delete", path)?;
        if path == "/" {
            return Err(ConfigError::path_failure("delete", path, "cannot delete the root"));
        }
        if self.has_children(path)? {
            return Err(ConfigError::path_failure("delete", path, "node has children"));
        }

        let mut client = self.client.clone();
        let response = self
            .runtime
            .block_on(client.delete(path, None))
            .map_err(|e| store_error("delete", path, e))?;

        if response.deleted() == 0 {
            return Err(ConfigError::NoNode {
                path: path.to_string(),
            });
        }
        tracing::debug!("Deleted etcd node {}", path);
        Ok(())
    }

    fn watch_children(&self, path: &str, callback: ChildCallback) -> Result<WatchHandle> {
        self.ensure_open("watch_children", path)?;
        let prefix = child_prefix(path);

        let mut client = self.client.clone();
        let options = WatchOptions::new().with_prefix();
        let (mut watcher, mut stream) = self
            .runtime
            .block_on(client.watch(prefix.as_str(), Some(options)))
            .map_err(|e| store_error("watch_children", path, e))?;

        let (event_tx, event_rx) = mpsc::channel::<ChildEvent>();
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let stopped = Arc::new(AtomicBool::new(false));

        let stream_prefix = prefix.clone();
        self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    message = stream.message() => {
                        let response = match message {
                            Ok(Some(response)) => response,
                            Ok(None) => break,
                            Err(e) => {
                                tracing::error!("etcd watch on {} failed: {}", stream_prefix, e);
                                break;
                            }
                        };
                        for event in response.events() {
                            let Some(kv) = event.kv() else { continue };
                            let Ok(key) = kv.key_str() else { continue };
                            if direct_child(&stream_prefix, key).is_none() {
                                continue;
                            }
                            let child = match event.event_type() {
                                EventType::Put => ChildEvent {
                                    kind: if kv.version() == 1 {
                                        ChildEventKind::Added
                                    } else {
                                        ChildEventKind::Updated
                                    },
                                    path: key.to_string(),
                                    data: kv.value_str().ok().map(str::to_string),
                                },
                                EventType::Delete => ChildEvent {
                                    kind: ChildEventKind::Removed,
                                    path: key.to_string(),
                                    data: None,
                                },
                            };
                            if event_tx.send(child).is_err() {
                                return;
                            }
                        }
                    }
                }
            }
            if let Err(e) = watcher.cancel().await {
                tracing::debug!("Failed to cancel etcd watch on {}: {}", stream_prefix, e);
            }
        });

        // Callbacks run outside the runtime so they may block on the store.
        let delivery_stopped = Arc::clone(&stopped);
        let watched = path.to_string();
        thread::Builder::new()
            .name(format!("etcd-watch:{}", watched))
            .spawn(move || {
                while let Ok(event) = event_rx.recv() {
                    if delivery_stopped.load(Ordering::SeqCst) {
                        break;
                    }
                    callback(event);
                }
                tracing::debug!("etcd watch delivery for {} stopped", watched);
            })
            .map_err(ConfigError::IoError)?;

        tracing::info!("Watching etcd children of {}", path);
        Ok(WatchHandle::new(move || {
            stopped.store(true, Ordering::SeqCst);
            let _ = stop_tx.send(());
        }))
    }

    fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            tracing::info!("Closed etcd path store for {}", self.endpoints.join(","));
        }
        Ok(())
    }
}
