//! 核心层：运行状态、阶段错误与恢复、自动化编排

pub mod error;
pub mod orchestrator;
pub mod recovery;
pub mod state;

pub use error::{ErrorClass, StageError};
pub use orchestrator::{inputs_from_config, run_automation, run_with};
pub use recovery::RecoveryAgent;
pub use state::{Phase, RunInputs, RunOutcome, WorkflowState};
