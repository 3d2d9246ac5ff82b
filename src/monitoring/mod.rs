pub mod check_service;
pub mod incident;
pub mod probe;
pub mod probes;

pub use check_service::{CheckService, CheckSummary};
pub use incident::IncidentTracker;
pub use probe::{Probe, ProbeOutcome, ProbeRunner};
