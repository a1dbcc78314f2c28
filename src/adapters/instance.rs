// SPDX-License-Identifier: MIT OR Apache-2.0

//! Instance identity provider adapter.

use crate::domain::{InstanceIdentity, Result};
use crate::ports::InstanceIdentityProvider;
use std::env;

/// Environment variable holding the instance id.
pub const INSTANCE_ID_VAR: &str = "INSTANCE_ID";
/// Environment variable holding the region.
pub const REGION_VAR: &str = "REGION";
/// Environment variable holding the availability zone.
pub const AVAILABILITY_ZONE_VAR: &str = "AVAILABILITY_ZONE";
/// Environment variable holding the private IP address.
pub const PRIVATE_IP_VAR: &str = "PRIVATE_IP";
/// Environment variable holding the public IP address.
pub const PUBLIC_IP_VAR: &str = "PUBLIC_IP";

/// Instance identity provider returning a fixed identity.
///
/// [`DefaultInstanceIdentity::default`] yields the local defaults
/// (`local`, `unknown`, `unknown`, `127.0.0.1`, `127.0.0.1`).
/// [`DefaultInstanceIdentity::from_env`] overrides them from the environment,
/// which is how orchestrators usually hand metadata to a process.
///
/// # Examples
///
/// ```rust
/// use layercfg::adapters::DefaultInstanceIdentity;
/// use layercfg::ports::InstanceIdentityProvider;
///
/// let provider = DefaultInstanceIdentity::default();
/// assert_eq!(provider.instance_identity().unwrap().instance_id, "local");
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefaultInstanceIdentity {
    identity: InstanceIdentity,
}

impl DefaultInstanceIdentity {
    /// Wraps an explicit identity.
    pub fn new(identity: InstanceIdentity) -> Self {
        Self { identity }
    }

    /// Reads `INSTANCE_ID`, `REGION`, `AVAILABILITY_ZONE`, `PRIVATE_IP` and
    /// `PUBLIC_IP`; unset or blank variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut identity = InstanceIdentity::default();
        let fields: [(&str, &mut String); 5] = [
            (INSTANCE_ID_VAR, &mut identity.instance_id),
            (REGION_VAR, &mut identity.region),
            (AVAILABILITY_ZONE_VAR, &mut identity.availability_zone),
            (PRIVATE_IP_VAR, &mut identity.private_ip),
            (PUBLIC_IP_VAR, &mut identity.public_ip),
        ];
        for (name, field) in fields {
            if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                *field = value;
            }
        }

        tracing::debug!("Resolved instance identity {:?}", identity);
        Self { identity }
    }
}

impl InstanceIdentityProvider for DefaultInstanceIdentity {
    fn instance_identity(&self) -> Result<InstanceIdentity> {
        Ok(self.identity.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_identity() {
        let identity = DefaultInstanceIdentity::default()
            .instance_identity()
            .unwrap();
        assert_eq!(identity, InstanceIdentity::default());
    }

    #[test]
    fn test_lookup_overrides_set_fields_only() {
        let vars: HashMap<&str, &str> =
            HashMap::from([(INSTANCE_ID_VAR, "i-0abc"), (REGION_VAR, "eu-west-1"), (PUBLIC_IP_VAR, " ")]);

        let identity = DefaultInstanceIdentity::from_lookup(|name| {
            vars.get(name).map(|v| v.to_string())
        })
        .instance_identity()
        .unwrap();

        assert_eq!(identity.instance_id, "i-0abc");
        assert_eq!(identity.region, "eu-west-1");
        assert_eq!(identity.availability_zone, "unknown");
        assert_eq!(identity.public_ip, "127.0.0.1");
    }
}
