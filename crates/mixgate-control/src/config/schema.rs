use std::collections::BTreeMap;

use serde::Deserialize;

use mixgate_core::{Attributes, MixError, Result};

/// Top-level config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MixgateConfig {
    pub version: u32,

    #[serde(default)]
    pub filter: FilterConfig,
}

impl MixgateConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MixError::InvalidConfig(format!(
                "unsupported config version: {}",
                self.version
            )));
        }
        self.filter.validate()
    }
}

/// What to do with a Check when the policy service cannot be reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkFailPolicy {
    #[default]
    FailOpen,
    FailClose,
}

/// Filter-wide settings shared by every route.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    #[serde(default)]
    pub network_fail_policy: NetworkFailPolicy,

    #[serde(default)]
    pub disable_tcp_check_calls: bool,

    /// Static attributes added to every request.
    #[serde(default, deserialize_with = "singleton_attributes")]
    pub attributes: Attributes,

    /// Attributes handed to the next hop.
    #[serde(default, deserialize_with = "singleton_attributes")]
    pub forward_attributes: Attributes,

    #[serde(default)]
    pub default_destination_service: Option<String>,

    /// First quota deduplication id issued by this process.
    #[serde(default)]
    pub quota_dedup_start: u64,

    #[serde(default)]
    pub services: BTreeMap<String, ServiceConfig>,
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.default_destination_service {
            if !self.services.contains_key(name) {
                return Err(MixError::InvalidConfig(format!(
                    "filter.default_destination_service '{name}' is not a configured service"
                )));
            }
        }

        check_names("filter.attributes", &self.attributes)?;
        check_names("filter.forward_attributes", &self.forward_attributes)?;
        for (name, svc) in &self.services {
            if name.is_empty() {
                return Err(MixError::InvalidConfig(
                    "filter.services: service name must not be empty".into(),
                ));
            }
            check_names(&format!("filter.services.{name}.attributes"), &svc.attributes)?;
            check_names(
                &format!("filter.services.{name}.forward_attributes"),
                &svc.forward_attributes,
            )?;
        }
        Ok(())
    }

    pub fn fail_open(&self) -> bool {
        self.network_fail_policy == NetworkFailPolicy::FailOpen
    }

    /// Service config for `name`, falling back to the default destination.
    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.get(name).or_else(|| {
            self.default_destination_service
                .as_deref()
                .and_then(|d| self.services.get(d))
        })
    }
}

/// Per destination-service policy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    #[serde(default)]
    pub disable_check_calls: bool,

    #[serde(default)]
    pub disable_report_calls: bool,

    #[serde(default, deserialize_with = "singleton_attributes")]
    pub attributes: Attributes,

    /// Overrides `filter.forward_attributes` when non-empty.
    #[serde(default, deserialize_with = "singleton_attributes")]
    pub forward_attributes: Attributes,
}

/// Route-level config handed in by the proxy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerRouteConfig {
    #[serde(default)]
    pub destination_service: String,

    /// Old-style explicit switches. Takes precedence over `services`.
    #[serde(default)]
    pub legacy: Option<LegacyRouteConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LegacyRouteConfig {
    #[serde(default)]
    pub enable_check: bool,

    #[serde(default)]
    pub enable_report: bool,

    #[serde(default, deserialize_with = "singleton_attributes")]
    pub attributes: Attributes,
}

/// Attribute values are written as single-key maps (`{ int64: 5 }`).
fn singleton_attributes<'de, D>(deserializer: D) -> std::result::Result<Attributes, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde_yaml::with::singleton_map_recursive::deserialize(deserializer)
}

fn check_names(section: &str, attributes: &Attributes) -> Result<()> {
    if attributes.iter().any(|(k, _)| k.is_empty()) {
        return Err(MixError::InvalidConfig(format!(
            "{section}: attribute names must not be empty"
        )));
    }
    Ok(())
}
