//! Name-keyed detector registry

use super::detector::Detector;
use std::sync::Arc;
use tracing::debug;

/// Ordered mapping from detector name to instance
///
/// Registration order is preserved and drives the default ordering inside a batch
/// and the ordering of the report's error list.
#[derive(Clone, Default)]
pub struct DetectorRegistry {
    detectors: Vec<Arc<dyn Detector>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    /// Registry holding every built-in detector
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(crate::detectors::LanguageDetector));
        registry.register(Arc::new(crate::detectors::BuildToolDetector));
        registry.register(Arc::new(crate::detectors::DependencyDetector));
        registry.register(Arc::new(crate::detectors::FrameworkDetector));
        registry.register(Arc::new(crate::detectors::DocumentationDetector));
        registry
    }

    /// Inserts `detector`, replacing any detector already registered under the
    /// same name. A replacement keeps the original slot.
    pub fn register(&mut self, detector: Arc<dyn Detector>) {
        let name = detector.name().to_string();
        match self.detectors.iter().position(|d| d.name() == name) {
            Some(idx) => {
                debug!(detector = %name, "Replacing registered detector");
                self.detectors[idx] = detector;
            }
            None => {
                debug!(detector = %name, "Registering detector");
                self.detectors.push(detector);
            }
        }
    }

    /// Detectors in registration order
    pub fn list(&self) -> Vec<Arc<dyn Detector>> {
        self.detectors.clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Detector>> {
        self.detectors.iter().find(|d| d.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.detectors.iter().any(|d| d.name() == name)
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }
}
