//! Built-in detectors
//!
//! Each detector produces one report category. Only `framework` declares
//! dependencies (on `language` and `dependency`), so the default registry
//! resolves into two batches.

pub mod build_tool;
pub mod dependency;
pub mod documentation;
pub mod framework;
pub mod language;

pub use build_tool::BuildToolDetector;
pub use dependency::DependencyDetector;
pub use documentation::DocumentationDetector;
pub use framework::FrameworkDetector;
pub use language::LanguageDetector;
