//! Threshold refresh from the remote store.
//!
//! Each threshold has an ordered list of candidate paths (current schema
//! first, legacy after).  Every candidate is read each refresh; a numeric,
//! in-range value that differs from the current one replaces it, so when
//! both namespaces disagree the later candidate wins.

use tracing::{info, warn};

use crate::config::SchemaSettings;
use crate::remote::{note_skipped, parse_integer, read_each, RemoteStore};
use crate::state::{ThresholdConfig, ThresholdKind};

pub struct ThresholdStore {
    candidates: Vec<(ThresholdKind, Vec<String>)>,
}

impl ThresholdStore {
    pub fn new(schema: &SchemaSettings) -> Self {
        Self {
            candidates: ThresholdKind::ALL
                .into_iter()
                .map(|kind| (kind, schema.threshold_paths(kind).to_vec()))
                .collect(),
        }
    }

    /// Apply remote threshold updates to `current`.  Each change is logged
    /// where it is applied.
    pub async fn refresh<S: RemoteStore>(&self, store: &mut S, current: &mut ThresholdConfig) {
        for (kind, paths) in &self.candidates {
            for (path, result) in read_each(store, paths, parse_integer).await {
                let value = match result {
                    Ok(v) => v,
                    Err(e) => {
                        note_skipped(path, &e);
                        continue;
                    }
                };

                if !kind.accepts(value) {
                    warn!(
                        path,
                        value,
                        max = kind.max(),
                        "{kind} threshold out of range, ignored"
                    );
                    continue;
                }

                let old = current.get(*kind);
                if value != old {
                    info!(path, old, new = value, "{kind} threshold updated");
                    current.set(*kind, value);
                }
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
