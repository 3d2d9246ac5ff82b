pub mod debounce;
pub mod evaluation_service;
pub mod evaluator;

pub use debounce::DebounceGate;
pub use evaluation_service::{EvaluationService, EvaluationSummary};
pub use evaluator::AlertCondition;
