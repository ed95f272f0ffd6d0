//! Encoding of the attribute blob passed between proxy hops.
//!
//! The current format is the JSON form of an [`Attributes`] bag. Older
//! proxies send a flat JSON object of strings, which is still accepted.

use std::collections::BTreeMap;

use bytes::Bytes;
use thiserror::Error;

use mixgate_core::Attributes;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("forwarded attributes encode failed: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("forwarded attributes are neither a bag nor a string map: {0}")]
    Decode(#[source] serde_json::Error),
}

pub fn encode(attributes: &Attributes) -> Result<Bytes, ForwardError> {
    serde_json::to_vec(attributes)
        .map(Bytes::from)
        .map_err(ForwardError::Encode)
}

/// Merge a forwarded blob into `attributes`.
pub fn merge_into(attributes: &mut Attributes, data: &[u8]) -> Result<(), ForwardError> {
    if let Ok(bag) = serde_json::from_slice::<Attributes>(data) {
        attributes.merge(&bag);
        return Ok(());
    }

    let legacy: BTreeMap<String, String> =
        serde_json::from_slice(data).map_err(ForwardError::Decode)?;
    let mut builder = attributes.builder();
    for (k, v) in &legacy {
        builder.add_ip_or_string(k, v);
    }
    Ok(())
}
