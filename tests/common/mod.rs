// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared helpers for the integration tests.

use layercfg::adapters::MemoryPathStore;
use layercfg::domain::paths;
use layercfg::ports::PathStore;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Cached result of Docker availability check.
#[allow(dead_code)]
static DOCKER_AVAILABLE: OnceLock<bool> = OnceLock::new();

/// Checks if Docker is available on the system.
///
/// This check is cached after the first call.
#[allow(dead_code)]
pub fn is_docker_available() -> bool {
    *DOCKER_AVAILABLE.get_or_init(|| {
        std::process::Command::new("docker")
            .args(["ps"])
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    })
}

/// Prints a warning message that a test is skipped due to Docker being unavailable.
#[allow(dead_code)]
pub fn print_docker_unavailable_warning(test_name: &str) {
    eprintln!("\n⚠️  SKIPPED: {} - Docker is not available", test_name);
    eprintln!("   To run this test, ensure Docker is installed and running.");
    eprintln!("   Installation: https://docs.docker.com/get-docker/\n");
}

/// Routes `tracing` output through the test harness.
///
/// Honors `RUST_LOG`; later calls are no-ops.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builds a flat snapshot from literal pairs.
#[allow(dead_code)]
pub fn snapshot(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Writes `contents` to `dir/name` and returns the path.
#[allow(dead_code)]
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Creates `path` and every ancestor in `store`, then one child per entry.
#[allow(dead_code)]
pub fn seed(store: &MemoryPathStore, path: &str, entries: &[(&str, &str)]) {
    for node in paths::ancestors(path).into_iter().chain([path.to_string()]) {
        if !store.exists(&node).unwrap() {
            store.create(&node, "").unwrap();
        }
    }
    for (key, value) in entries {
        store.create(&paths::join(path, key), value).unwrap();
    }
}

/// Reads the children of `path` back as a snapshot.
#[allow(dead_code)]
pub fn read_tree(store: &dyn PathStore, path: &str) -> BTreeMap<String, String> {
    store
        .get_children(path)
        .unwrap()
        .into_iter()
        .map(|child| {
            let data = store.get_data(&paths::join(path, &child)).unwrap();
            (child, data)
        })
        .collect()
}

/// Polls `condition` until it holds or `timeout` elapses.
#[allow(dead_code)]
pub fn eventually(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    condition()
}
