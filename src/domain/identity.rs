// SPDX-License-Identifier: MIT OR Apache-2.0

//! Application and instance identity.
//!
//! [`AppIdentity`] names the application whose configuration is being resolved
//! and determines where that configuration lives in a coordination service.
//! [`InstanceIdentity`] describes the running host and feeds the instance
//! metadata layer.

use crate::domain::errors::{ConfigError, Result};
use crate::domain::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Instance id used when no external instance identity is available.
pub const DEFAULT_INSTANCE_ID: &str = "local";

/// Placeholder for unknown region and availability zone.
pub const UNKNOWN: &str = "unknown";

/// Loopback address used as the default private and public IP.
pub const LOOPBACK_IP: &str = "127.0.0.1";

/// Name of the base configuration sub-tree under the application base path.
pub const BASE_CONFIG_NODE: &str = "config";

/// Suffix appended to an instance id to name its override sub-tree.
pub const INSTANCE_CONFIG_SUFFIX: &str = "-config";

/// The application whose configuration is being resolved.
///
/// All three fields are non-blank; [`AppIdentity::new`] enforces it.
///
/// # Examples
///
/// ```
/// use layercfg::domain::AppIdentity;
///
/// let app = AppIdentity::new("testapp", "unittest", "1.0.0").unwrap();
/// assert_eq!(app.base_path(), "/unittest/testapp/1.0.0");
/// assert_eq!(app.config_path(), "/unittest/testapp/1.0.0/config");
/// assert_eq!(app.instance_config_path("i-123"), "/unittest/testapp/1.0.0/i-123-config");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppIdentity {
    name: String,
    environment: String,
    version: String,
}

impl AppIdentity {
    /// Creates an identity, rejecting blank fields.
    pub fn new(
        name: impl Into<String>,
        environment: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self> {
        let identity = Self {
            name: name.into(),
            environment: environment.into(),
            version: version.into(),
        };
        identity.validate()?;
        Ok(identity)
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("environment", &self.environment),
            ("version", &self.version),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidIdentity { field });
            }
            if value.contains('/') {
                return Err(ConfigError::path_failure(
                    "identity",
                    value.as_str(),
                    format!("identity field '{}' must not contain '/'", field),
                ));
            }
        }
        Ok(())
    }

    /// The application name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The deployment environment (e.g. `prod`, `unittest`).
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// The application version.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// `/{environment}/{name}/{version}`
    pub fn base_path(&self) -> String {
        format!("/{}/{}/{}", self.environment, self.name, self.version)
    }

    /// `{base}/config`
    pub fn config_path(&self) -> String {
        paths::join(&self.base_path(), BASE_CONFIG_NODE)
    }

    /// The child node name of an instance override sub-tree: `{instance_id}-config`.
    pub fn instance_config_node(instance_id: &str) -> String {
        format!("{}{}", instance_id, INSTANCE_CONFIG_SUFFIX)
    }

    /// `{base}/{instance_id}-config`
    pub fn instance_config_path(&self, instance_id: &str) -> String {
        paths::join(&self.base_path(), &Self::instance_config_node(instance_id))
    }
}

/// Identity of the running instance, exposed through the instance metadata layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceIdentity {
    /// Instance id; `"local"` outside a managed environment.
    pub instance_id: String,
    /// Region; `"unknown"` outside a managed environment.
    pub region: String,
    /// Availability zone; `"unknown"` outside a managed environment.
    pub availability_zone: String,
    /// Private IP address.
    pub private_ip: String,
    /// Public IP address.
    pub public_ip: String,
}

impl InstanceIdentity {
    /// Flattens the identity into the keys of the instance metadata layer.
    ///
    /// ```
    /// use layercfg::domain::InstanceIdentity;
    ///
    /// let props = InstanceIdentity::default().to_properties();
    /// assert_eq!(props.get("instance.id").map(String::as_str), Some("local"));
    /// assert_eq!(props.get("instance.region").map(String::as_str), Some("unknown"));
    /// ```
    pub fn to_properties(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("instance.id".to_string(), self.instance_id.clone()),
            ("instance.region".to_string(), self.region.clone()),
            (
                "instance.availability_zone".to_string(),
                self.availability_zone.clone(),
            ),
            ("instance.private_ip".to_string(), self.private_ip.clone()),
            ("instance.public_ip".to_string(), self.public_ip.clone()),
        ])
    }
}

impl Default for InstanceIdentity {
    fn default() -> Self {
        Self {
            instance_id: DEFAULT_INSTANCE_ID.to_string(),
            region: UNKNOWN.to_string(),
            availability_zone: UNKNOWN.to_string(),
            private_ip: LOOPBACK_IP.to_string(),
            public_ip: LOOPBACK_IP.to_string(),
        }
    }
}
