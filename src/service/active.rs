// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opt-in process-wide registry of the active configuration.
//!
//! Most callers pass a [`ConfigHandle`] around explicitly. Code that cannot
//! (static initializers, logging hooks) may look up the handle installed here.
//! Only one configuration may be installed at a time; tests call
//! [`reset_active`] between cases.

use crate::domain::{ConfigError, Result};
use crate::service::layered::ConfigHandle;
use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};

static ACTIVE: Lazy<RwLock<Option<ConfigHandle>>> = Lazy::new(|| RwLock::new(None));

/// Installs `config` as the active configuration.
///
/// Fails with [`ConfigError::AlreadyInstalled`] if one is installed already.
pub fn install_active(config: ConfigHandle) -> Result<()> {
    let mut active = ACTIVE
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if active.is_some() {
        return Err(ConfigError::AlreadyInstalled);
    }
    *active = Some(config);
    tracing::debug!("Installed active configuration");
    Ok(())
}

/// The active configuration, if one is installed.
pub fn active() -> Option<ConfigHandle> {
    ACTIVE
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .as_ref()
        .map(Arc::clone)
}

/// Removes and returns the active configuration.
pub fn reset_active() -> Option<ConfigHandle> {
    ACTIVE
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::layered::LayeredConfig;

    // The registry is global; keep every assertion in one test.
    #[test]
    fn test_install_lifecycle() {
        reset_active();
        assert!(active().is_none());

        let first: ConfigHandle = Arc::new(LayeredConfig::builder().build());
        install_active(Arc::clone(&first)).unwrap();
        assert!(Arc::ptr_eq(&active().unwrap(), &first));

        let second: ConfigHandle = Arc::new(LayeredConfig::builder().build());
        assert!(matches!(
            install_active(second),
            Err(ConfigError::AlreadyInstalled)
        ));

        assert!(reset_active().is_some());
        assert!(active().is_none());
    }
}
