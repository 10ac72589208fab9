//! Dependency ordering for batch operations.
//!
//! Builds a directed graph where an edge j -> i exists when operation i's
//! provenance references a name produced by operation j, then runs Kahn's
//! topological sort. A cycle yields one diagnostic per affected operation
//! and the original, unsorted order; callers must treat non-empty cycle
//! errors as a hard failure for the whole batch.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use super::operation::Operation;

/// Diagnostic for one operation caught in a dependency cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleError {
    /// Index of the affected operation in the submitted list.
    pub index: usize,
    /// Human-readable description naming the mutual dependency.
    pub message: String,
}

/// Compute a dependency-respecting processing order.
///
/// Returns the indices of `operations` in execution order, plus cycle
/// diagnostics. When diagnostics are non-empty the returned order is the
/// original submission order.
pub fn dependency_order(operations: &[Operation]) -> (Vec<usize>, Vec<CycleError>) {
    let n = operations.len();

    // Which operation produces each name. Later producers win, matching
    // last-write semantics within a batch.
    let mut producer: HashMap<&str, usize> = HashMap::new();
    for (idx, op) in operations.iter().enumerate() {
        for name in op.produced_names() {
            producer.insert(name, idx);
        }
    }

    let mut edges: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
    let mut indegree = vec![0usize; n];
    for (i, op) in operations.iter().enumerate() {
        for reference in op.provenance_references() {
            if let Some(&j) = producer.get(reference) {
                if j != i && edges[j].insert(i) {
                    indegree[i] += 1;
                }
            }
        }
    }

    // Kahn's algorithm; a BTreeSet queue keeps the order deterministic and
    // as close to submission order as the dependencies allow.
    let mut ready: BTreeSet<usize> = indegree
        .iter()
        .enumerate()
        .filter(|(_, &d)| d == 0)
        .map(|(i, _)| i)
        .collect();
    let mut order = Vec::with_capacity(n);
    while let Some(&i) = ready.iter().next() {
        ready.remove(&i);
        order.push(i);
        for &next in &edges[i] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                ready.insert(next);
            }
        }
    }

    if order.len() == n {
        return (order, Vec::new());
    }

    // Anything the sort could not emit sits on a cycle.
    let sorted: BTreeSet<usize> = order.iter().copied().collect();
    let cyclic: BTreeSet<usize> = (0..n).filter(|i| !sorted.contains(i)).collect();
    let errors = cyclic
        .iter()
        .map(|&i| {
            let partners: Vec<String> = operations[i]
                .provenance_references()
                .iter()
                .filter_map(|r| producer.get(r).copied())
                .filter(|j| cyclic.contains(j) && *j != i)
                .map(|j| operations[j].summary())
                .collect();
            let detail = if partners.is_empty() {
                "an upstream operation in the cycle".to_string()
            } else {
                partners.join(", ")
            };
            CycleError {
                index: i,
                message: format!(
                    "operation {} ({}) is in a circular dependency with {}",
                    i,
                    operations[i].summary(),
                    detail
                ),
            }
        })
        .collect();

    ((0..n).collect(), errors)
}
