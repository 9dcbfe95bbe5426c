pub mod citations;
mod client;
mod intelligence;
mod patterns;
mod types;
pub mod url;

pub use client::JenkinsClient;
pub use intelligence::{JenkinsIntelligence, JenkinsIntelligenceService};
pub use patterns::{FailureAnalysis, FailureCategory};
pub use types::{BuildMetadata, BuildResult};
