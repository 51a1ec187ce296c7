//! Merges every raw aircraft document into the single prepared document.
//!
//! Each raw blob is a feed snapshot shaped like `{"time": .., "states": [..]}`.
//! The prepared blob is one JSON array holding all `states` entries, in the
//! order the raw keys are listed and then in source order within each blob.

use serde_json::Value;
use thiserror::Error;

use crate::gateway::Gateway;

pub const RAW_PREFIX: &str = "raw/";
pub const PREPARED_KEY: &str = "prepared/aircraft_data.json";
pub const STATES_FIELD: &str = "states";

/// Key a feed snapshot is stored under.
pub fn raw_key(file_limit: u32) -> String {
    format!("{RAW_PREFIX}aircraft_data_{file_limit}.json")
}

#[derive(Debug, Error)]
pub enum PrepareError {
    #[error("No raw data found")]
    NoSourceData,

    #[error("Failed to parse raw data in {key}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No valid data found")]
    NoValidData,

    #[error("Failed to upload prepared data")]
    WriteFailed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrepareSummary {
    /// Raw blobs that contributed at least one record.
    pub sources: usize,
    pub records: usize,
}

/// Concatenates the `states` arrays of `docs`.
///
/// Documents without a `states` array contribute nothing. A document that is not
/// valid JSON fails the whole merge.
pub fn merge_states<'a, I>(docs: I) -> Result<(Vec<Value>, usize), PrepareError>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut merged = Vec::new();
    let mut sources = 0;
    for (key, bytes) in docs {
        let doc: Value = serde_json::from_slice(bytes).map_err(|source| PrepareError::Parse {
            key: key.to_string(),
            source,
        })?;
        if let Some(Value::Array(states)) = doc.get(STATES_FIELD) {
            if !states.is_empty() {
                sources += 1;
            }
            merged.extend(states.iter().cloned());
        }
    }
    if merged.is_empty() {
        return Err(PrepareError::NoValidData);
    }
    Ok((merged, sources))
}

/// Runs one aggregation pass over everything currently under `raw/`.
///
/// Nothing is written unless every fetched blob parses and at least one record
/// was found.
pub async fn prepare(gateway: &Gateway) -> Result<PrepareSummary, PrepareError> {
    let keys = gateway.list(RAW_PREFIX).await;
    if keys.is_empty() {
        return Err(PrepareError::NoSourceData);
    }

    let mut fetched = Vec::with_capacity(keys.len());
    for key in &keys {
        match gateway.get(key).await {
            Some(bytes) if !bytes.is_empty() => fetched.push((key.as_str(), bytes)),
            _ => tracing::warn!(key = key.as_str(), "skipping unreadable raw blob"),
        }
    }

    let (merged, sources) =
        merge_states(fetched.iter().map(|(key, bytes)| (*key, bytes.as_slice())))?;
    let records = merged.len();
    let body = Value::Array(merged).to_string();

    if !gateway.put(PREPARED_KEY, body.as_bytes()).await {
        return Err(PrepareError::WriteFailed);
    }
    tracing::info!(sources, records, "wrote {}", PREPARED_KEY);
    Ok(PrepareSummary { sources, records })
}
