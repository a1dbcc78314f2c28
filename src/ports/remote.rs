// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote configuration provider trait definition.

use crate::domain::{AppIdentity, Result};
use crate::ports::ConfigSource;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// The two live layers fetched for one application instance.
#[derive(Clone)]
pub struct RemoteLayers {
    /// The shared `{base}/config` layer.
    pub base: Arc<dyn ConfigSource>,
    /// The `{base}/{instance_id}-config` layer; empty while that node is absent.
    pub instance: Arc<dyn ConfigSource>,
}

impl fmt::Debug for RemoteLayers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteLayers")
            .field("base", &self.base.name())
            .field("instance", &self.instance.name())
            .finish()
    }
}

/// Where an application's remote configuration is read from and published to.
pub trait RemoteConfigProvider: Send + Sync {
    /// Fetches the remote layers for `app` as seen by `instance_id`.
    ///
    /// Fails with [`RemoteNotFound`](crate::domain::ConfigError::RemoteNotFound)
    /// when no base configuration has been published for `app`.
    fn fetch(&self, app: &AppIdentity, instance_id: &str) -> Result<RemoteLayers>;

    /// Publishes `config` as the base configuration of `app`.
    ///
    /// With `allow_overwrite` false an existing configuration is left untouched
    /// and [`AlreadyExistsRefusal`](crate::domain::ConfigError::AlreadyExistsRefusal)
    /// is returned.
    fn write(
        &self,
        app: &AppIdentity,
        config: &BTreeMap<String, String>,
        allow_overwrite: bool,
    ) -> Result<()>;
}
