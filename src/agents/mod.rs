pub mod investigation;
pub mod probes;
pub mod recommendations;
pub mod repository;
pub mod solution;

pub use investigation::InvestigationAgent;
pub use probes::{HealthProbe, HttpHealthProbe, SimulatedHealthProbe};
pub use repository::{GitRepositoryAnalyzer, RepositoryAnalyzer, SimulatedRepositoryAnalyzer};
pub use solution::SolutionAgent;
