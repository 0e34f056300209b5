//! Result merger
//!
//! Combines standalone producer output with graph-produced signals, filtered
//! to the ids actually requested for this run. Filtering prevents stale
//! signals from leaking between differently-scoped invocations.
//!
//! If the same key somehow shows up on both sides the graph value wins;
//! precedence is explicit, not an accident of iteration order.

use log::warn;
use quorum_core::AnalystSignals;
use std::collections::BTreeSet;

use crate::registry::AnalystId;

pub fn merge_signals(
    requested: &[AnalystId],
    standalone: AnalystSignals,
    graph: AnalystSignals,
) -> AnalystSignals {
    let allowed: BTreeSet<&str> = requested.iter().map(|id| id.key()).collect();

    let mut merged = AnalystSignals::new();
    for (key, signals) in standalone {
        if allowed.contains(key.as_str()) {
            merged.insert(key, signals);
        } else {
            warn!("[merger] dropping standalone signals for unrequested '{}'", key);
        }
    }
    for (key, signals) in graph {
        if allowed.contains(key.as_str()) {
            if merged.insert(key.clone(), signals).is_some() {
                warn!("[merger] '{}' present on both sides, graph value kept", key);
            }
        } else {
            warn!("[merger] dropping graph signals for unrequested '{}'", key);
        }
    }
    merged
}
