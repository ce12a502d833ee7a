//! Execution order resolution.
//!
//! Every `runs_before: X` on filter F is an edge F -> X and every
//! `runs_after: X` is an edge X -> F. The order is a Kahn topological sort;
//! among filters that are ready at the same time the lowest
//! `(priority, id)` goes first, so the result is deterministic.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap};

use tracing::debug;

use crate::filter::FilterDescriptor;

/// The declared constraints contain a cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Filter ordering cycle among: {}", .remaining.join(", "))]
pub struct CycleError {
    /// Filters that could not be placed, sorted by id.
    pub remaining: Vec<String>,
}

/// Resolves `descriptors` into one execution order of filter ids.
///
/// Constraints naming a filter that is not in `descriptors` are ignored.
///
/// # Errors
///
/// Returns [`CycleError`] if the constraints cannot all be satisfied.
pub fn resolve_order(descriptors: &[FilterDescriptor]) -> Result<Vec<String>, CycleError> {
    let priorities: HashMap<&str, i32> = descriptors
        .iter()
        .map(|d| (d.id.as_str(), d.priority))
        .collect();

    let mut edges: BTreeSet<(&str, &str)> = BTreeSet::new();
    for descriptor in descriptors {
        let id = descriptor.id.as_str();

        if let Some(target) = descriptor.runs_before.as_deref() {
            if priorities.contains_key(target) {
                edges.insert((id, target));
            } else {
                debug!(filter.id = %id, target = %target, "Ignoring runs_before on unknown filter");
            }
        }

        if let Some(target) = descriptor.runs_after.as_deref() {
            if priorities.contains_key(target) {
                edges.insert((target, id));
            } else {
                debug!(filter.id = %id, target = %target, "Ignoring runs_after on unknown filter");
            }
        }
    }

    let mut in_degree: HashMap<&str, usize> = priorities.keys().map(|id| (*id, 0)).collect();
    let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();
    for &(from, to) in &edges {
        successors.entry(from).or_default().push(to);
        if let Some(degree) = in_degree.get_mut(to) {
            *degree += 1;
        }
    }

    let mut ready: BinaryHeap<Reverse<(i32, &str)>> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| Reverse((priorities[id], *id)))
        .collect();

    let mut order = Vec::with_capacity(priorities.len());
    while let Some(Reverse((_, id))) = ready.pop() {
        order.push(id.to_string());

        for next in successors.get(id).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(next) {
                *degree -= 1;
                if *degree == 0 {
                    ready.push(Reverse((priorities[next], *next)));
                }
            }
        }
    }

    if order.len() < priorities.len() {
        let mut remaining: Vec<String> = in_degree
            .into_iter()
            .filter(|(_, degree)| *degree > 0)
            .map(|(id, _)| id.to_string())
            .collect();
        remaining.sort();
        return Err(CycleError { remaining });
    }

    Ok(order)
}
