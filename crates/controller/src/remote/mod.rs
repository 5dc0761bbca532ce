//! Remote store access.
//!
//! The remote store is a passive document store addressed by hierarchical
//! string paths (`settings/automation`, `history/123/temperature`, ...).
//! Backends implement [`RemoteStore`]; the control loop never knows which
//! one it is talking to.
//!
//! Fields that moved between schema generations are read through an ordered
//! list of candidate paths (see [`read_each`]), paired with a parser that
//! decides whether the value found there has the expected type.

pub mod mqtt;
pub mod rest;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::RemoteError;

/// Path-addressed read/write of JSON values.  No transactions: every call
/// stands alone and may fail independently.
#[allow(async_fn_in_trait)]
pub trait RemoteStore {
    /// Cheap connectivity check done once at the start of each cycle.
    fn is_ready(&self) -> bool;

    async fn get(&mut self, path: &str) -> Result<Value, RemoteError>;

    async fn set(&mut self, path: &str, value: Value) -> Result<(), RemoteError>;

    async fn get_bool(&mut self, path: &str) -> Result<bool, RemoteError> {
        let v = self.get(path).await?;
        parse_bool(path, v)
    }

    async fn get_integer(&mut self, path: &str) -> Result<i64, RemoteError> {
        let v = self.get(path).await?;
        parse_integer(path, v)
    }
}

/// Turns a raw remote value into a typed field, or says why it can't.
pub type Parser<T> = fn(&str, Value) -> Result<T, RemoteError>;

pub fn parse_bool(path: &str, v: Value) -> Result<bool, RemoteError> {
    match v {
        Value::Bool(b) => Ok(b),
        Value::Null => Err(RemoteError::Missing(path.to_string())),
        other => Err(RemoteError::mismatch(path, "bool", &other)),
    }
}

/// Accepts JSON integers, and floats with no fractional part (some
/// dashboards write `31.0`).  Everything else is a schema mismatch.
pub fn parse_integer(path: &str, v: Value) -> Result<i64, RemoteError> {
    match &v {
        Value::Null => Err(RemoteError::Missing(path.to_string())),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                _ => Err(RemoteError::mismatch(path, "integer", &v)),
            }
        }
        _ => Err(RemoteError::mismatch(path, "integer", &v)),
    }
}

/// Read every candidate path in priority order and parse each value.
/// Results come back in the same order as `paths`.
pub async fn read_each<'p, S: RemoteStore, T>(
    store: &mut S,
    paths: &'p [String],
    parse: Parser<T>,
) -> Vec<(&'p str, Result<T, RemoteError>)> {
    let mut out = Vec::with_capacity(paths.len());
    for path in paths {
        let result = match store.get(path).await {
            Ok(v) => parse(path, v),
            Err(e) => Err(e),
        };
        out.push((path.as_str(), result));
    }
    out
}

/// First candidate that yields a well-typed value, if any.  Later
/// candidates are not read once one succeeds.
pub async fn read_first<S: RemoteStore, T>(
    store: &mut S,
    paths: &[String],
    parse: Parser<T>,
) -> Option<(String, T)> {
    for path in paths {
        let result = match store.get(path).await {
            Ok(v) => parse(path, v),
            Err(e) => Err(e),
        };
        match result {
            Ok(value) => return Some((path.clone(), value)),
            Err(e) => note_skipped(path, &e),
        }
    }
    None
}

/// Log a read that produced no update.  Schema drift is worth a warning;
/// an absent value or an offline store is routine.
pub fn note_skipped(path: &str, err: &RemoteError) {
    match err {
        RemoteError::SchemaMismatch { .. } => warn!(path, "ignoring remote value: {err}"),
        _ => debug!(path, "no remote update: {err}"),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
