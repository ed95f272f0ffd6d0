//! Control config loader (strict parsing).

pub mod schema;

use std::fs;

use mixgate_core::{MixError, Result};

pub use schema::{
    FilterConfig, LegacyRouteConfig, MixgateConfig, NetworkFailPolicy, PerRouteConfig,
    ServiceConfig,
};

pub fn load_from_file(path: &str) -> Result<MixgateConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| MixError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<MixgateConfig> {
    let cfg: MixgateConfig = serde_yaml::from_str(s)
        .map_err(|e| MixError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
