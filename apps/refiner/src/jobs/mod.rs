pub mod orchestrator;
pub mod worker;

pub use orchestrator::BulkJobOrchestrator;
pub use worker::Worker;
