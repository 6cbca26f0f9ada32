pub mod controller;
pub mod prompts;
pub mod rewrite;

pub use controller::{ImprovementPassController, RefinementConfig, RegressionPolicy, StopReason};
