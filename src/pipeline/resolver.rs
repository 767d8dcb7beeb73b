//! Dependency resolution into execution batches

use crate::detection::Detector;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Detectors with no dependency edges among them
#[derive(Clone)]
pub struct ExecutionBatch {
    pub index: usize,
    pub detectors: Vec<Arc<dyn Detector>>,
}

impl ExecutionBatch {
    pub fn names(&self) -> Vec<String> {
        self.detectors.iter().map(|d| d.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}

impl std::fmt::Debug for ExecutionBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionBatch")
            .field("index", &self.index)
            .field("detectors", &self.names())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    pub batches: Vec<ExecutionBatch>,
    /// Detectors that could only be placed in the trailing catch-all batch
    pub cyclic: Vec<String>,
}

impl ExecutionPlan {
    pub fn has_cycle(&self) -> bool {
        !self.cyclic.is_empty()
    }

    pub fn detector_count(&self) -> usize {
        self.batches.iter().map(ExecutionBatch::len).sum()
    }

    /// Batch names, for logging and the `detectors` CLI command
    pub fn layout(&self) -> Vec<Vec<String>> {
        self.batches.iter().map(ExecutionBatch::names).collect()
    }
}

/// Layers `detectors` so every dependency sits in a strictly earlier batch.
///
/// Dependencies naming an unregistered detector are ignored. Detectors that
/// cannot be layered because of a cycle all land in one final batch with no
/// ordering between them. Input order is kept inside each batch.
pub fn resolve(detectors: &[Arc<dyn Detector>]) -> ExecutionPlan {
    let registered: HashSet<String> = detectors.iter().map(|d| d.name().to_string()).collect();

    let mut pending: Vec<(Arc<dyn Detector>, Vec<String>)> = detectors
        .iter()
        .map(|d| {
            let deps: Vec<String> = d
                .dependencies()
                .into_iter()
                .filter(|dep| {
                    let known = registered.contains(dep);
                    if !known {
                        debug!(detector = %d.name(), dependency = %dep, "Ignoring unregistered dependency");
                    }
                    known
                })
                .collect();
            (Arc::clone(d), deps)
        })
        .collect();

    let mut placed: HashSet<String> = HashSet::new();
    let mut plan = ExecutionPlan::default();

    while !pending.is_empty() {
        let (ready, blocked): (Vec<_>, Vec<_>) = pending
            .into_iter()
            .partition(|(_, deps)| deps.iter().all(|dep| placed.contains(dep)));

        if ready.is_empty() {
            let cyclic: Vec<String> = blocked.iter().map(|(d, _)| d.name().to_string()).collect();
            warn!(
                detectors = ?cyclic,
                "Dependency cycle detected, running remaining detectors in a final batch"
            );
            plan.cyclic = cyclic;
            plan.batches.push(ExecutionBatch {
                index: plan.batches.len(),
                detectors: blocked.into_iter().map(|(d, _)| d).collect(),
            });
            break;
        }

        for (detector, _) in &ready {
            placed.insert(detector.name().to_string());
        }
        plan.batches.push(ExecutionBatch {
            index: plan.batches.len(),
            detectors: ready.into_iter().map(|(d, _)| d).collect(),
        });
        pending = blocked;
    }

    debug!(batches = ?plan.layout(), "Resolved execution plan");
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{DetectionContext, DetectionError, DetectorPayload};
    use async_trait::async_trait;

    struct Node {
        name: &'static str,
        deps: Vec<&'static str>,
    }

    #[async_trait]
    impl Detector for Node {
        fn name(&self) -> &str {
            self.name
        }

        fn dependencies(&self) -> Vec<String> {
            self.deps.iter().map(|d| d.to_string()).collect()
        }

        async fn detect(&self, _ctx: &DetectionContext) -> Result<DetectorPayload, DetectionError> {
            Ok(DetectorPayload::Custom(serde_json::Value::Null))
        }
    }

    fn node(name: &'static str, deps: &[&'static str]) -> Arc<dyn Detector> {
        Arc::new(Node {
            name,
            deps: deps.to_vec(),
        })
    }

    #[test]
    fn test_independent_detectors_share_first_batch() {
        let plan = resolve(&[node("a", &[]), node("b", &[]), node("c", &[])]);
        assert_eq!(plan.layout(), vec![vec!["a", "b", "c"]]);
        assert!(!plan.has_cycle());
    }

    #[test]
    fn test_linear_chain() {
        let plan = resolve(&[node("c", &["b"]), node("b", &["a"]), node("a", &[])]);
        assert_eq!(plan.layout(), vec![vec!["a"], vec!["b"], vec!["c"]]);
    }

    #[test]
    fn test_diamond() {
        let plan = resolve(&[
            node("app", &["lib1", "lib2"]),
            node("lib1", &["core"]),
            node("lib2", &["core"]),
            node("core", &[]),
        ]);
        assert_eq!(
            plan.layout(),
            vec![vec!["core"], vec!["lib1", "lib2"], vec!["app"]]
        );
    }

    #[test]
    fn test_detector_lands_in_earliest_possible_batch() {
        let plan = resolve(&[
            node("a", &[]),
            node("b", &["a"]),
            node("c", &["b"]),
            node("d", &["a"]),
        ]);
        assert_eq!(plan.layout(), vec![vec!["a"], vec!["b", "d"], vec!["c"]]);
    }

    #[test]
    fn test_unregistered_dependency_is_ignored() {
        let plan = resolve(&[node("framework", &["language", "missing"]), node("language", &[])]);
        assert_eq!(plan.layout(), vec![vec!["language"], vec!["framework"]]);

        let plan = resolve(&[node("framework", &["missing"])]);
        assert_eq!(plan.layout(), vec![vec!["framework"]]);
    }

    #[test]
    fn test_cycle_goes_to_final_batch() {
        let plan = resolve(&[
            node("root", &[]),
            node("a", &["b"]),
            node("b", &["a"]),
            node("c", &["a"]),
        ]);

        assert!(plan.has_cycle());
        assert_eq!(plan.layout(), vec![vec!["root"], vec!["a", "b", "c"]]);
        assert_eq!(plan.cyclic, vec!["a", "b", "c"]);
        assert_eq!(plan.detector_count(), 4);
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let plan = resolve(&[node("a", &["a"])]);
        assert!(plan.has_cycle());
        assert_eq!(plan.layout(), vec![vec!["a"]]);
    }

    #[test]
    fn test_empty_input() {
        let plan = resolve(&[]);
        assert!(plan.batches.is_empty());
        assert_eq!(plan.detector_count(), 0);
    }

    #[test]
    fn test_every_detector_placed_exactly_once() {
        let detectors = vec![
            node("a", &["e"]),
            node("b", &["a"]),
            node("c", &[]),
            node("d", &["c", "b"]),
            node("e", &["d"]),
        ];
        let plan = resolve(&detectors);
        let mut names: Vec<String> = plan.layout().into_iter().flatten().collect();
        names.sort();
        assert_eq!(names, vec!["a", "b", "c", "d", "e"]);
    }
}
