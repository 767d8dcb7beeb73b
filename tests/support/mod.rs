//! Scriptable detectors and fixture helpers shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use reposcan::{DetectionContext, DetectionError, Detector, DetectorPayload};
use serde_json::json;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed,
    Fail(&'static str),
    Panic,
    Sleep(Duration),
    Hang,
}

/// Start and settle instants per detector name
#[derive(Debug, Default)]
pub struct Timeline {
    spans: Mutex<HashMap<String, (Instant, Option<Instant>)>>,
}

impl Timeline {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn started(&self, name: &str) {
        if let Ok(mut spans) = self.spans.lock() {
            spans.insert(name.to_string(), (Instant::now(), None));
        }
    }

    fn settled(&self, name: &str) {
        if let Ok(mut spans) = self.spans.lock() {
            if let Some(span) = spans.get_mut(name) {
                span.1 = Some(Instant::now());
            }
        }
    }

    pub fn start_of(&self, name: &str) -> Instant {
        self.spans.lock().unwrap()[name].0
    }

    pub fn end_of(&self, name: &str) -> Instant {
        self.spans.lock().unwrap()[name]
            .1
            .unwrap_or_else(|| panic!("{} never settled", name))
    }

    pub fn has_started(&self, name: &str) -> bool {
        self.spans.lock().unwrap().contains_key(name)
    }
}

/// Detector whose outcome, timing and call count are controlled by the test
pub struct Probe {
    name: String,
    deps: Vec<String>,
    behavior: Behavior,
    timeline: Arc<Timeline>,
    calls: Arc<AtomicUsize>,
}

impl Probe {
    pub fn new(name: &str, deps: &[&str], behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            deps: deps.iter().map(|d| d.to_string()).collect(),
            behavior,
            timeline: Timeline::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_timeline(mut self, timeline: &Arc<Timeline>) -> Self {
        self.timeline = Arc::clone(timeline);
        self
    }

    pub fn with_counter(mut self, calls: &Arc<AtomicUsize>) -> Self {
        self.calls = Arc::clone(calls);
        self
    }

    pub fn shared(self) -> Arc<dyn Detector> {
        Arc::new(self)
    }
}

#[async_trait]
impl Detector for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> Vec<String> {
        self.deps.clone()
    }

    async fn detect(&self, _ctx: &DetectionContext) -> Result<DetectorPayload, DetectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.timeline.started(&self.name);

        let result = match &self.behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail(message) => Err(DetectionError::new("PROBE_FAILED", *message)),
            Behavior::Panic => panic!("{} panicked on purpose", self.name),
            Behavior::Sleep(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(())
            }
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        };

        self.timeline.settled(&self.name);
        result.map(|()| DetectorPayload::Custom(json!({ "probe": self.name })))
    }
}

pub fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

pub fn calls(counter: &Arc<AtomicUsize>) -> usize {
    counter.load(Ordering::SeqCst)
}

/// Writes `files` (path, content) under `root`, creating parent directories
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let full = root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }
}

/// A small Node project with tests, CI and docs
pub fn node_project(root: &Path) {
    write_files(
        root,
        &[
            (
                "package.json",
                r#"{
  "name": "web",
  "dependencies": { "react": "^18.2.0", "express": "4.18.2" },
  "devDependencies": { "jest": "^29.0.0" }
}"#,
            ),
            ("package-lock.json", "{}"),
            ("src/index.ts", "export const answer: number = 42;\n"),
            ("src/server.js", "module.exports = {};\n"),
            ("src/index.test.ts", "test('answer', () => {});\n"),
            (".github/workflows/ci.yml", "on: push\n"),
            (".eslintrc.json", "{}"),
            ("README.md", "# Web\n\n## Install\n\nnpm ci\n\n## Usage\n\nnpm start\n"),
            ("LICENSE", "MIT"),
        ],
    );
}
