//! Detector contract, per-detector results and the detector registry

pub mod detector;
pub mod registry;
pub mod types;

pub use detector::{DetectionContext, Detector};
pub use registry::DetectorRegistry;
pub use types::{
    BuildTool, BuildToolReport, DependencyEntry, DependencyReport, DetectionError,
    DetectionOutcome, DetectionResult, DetectorPayload, DocumentationReport, FrameworkInfo,
    LanguageReport, LanguageStat,
};
