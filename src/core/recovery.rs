//! RecoveryAgent：终止型错误吸收阶段
//!
//! 只在 `state.error` 有值时生效：按关键字归类错误、输出诊断、强制要求人工复核。
//! 之后流程一律结束。

use async_trait::async_trait;

use crate::core::{ErrorClass, WorkflowState};
use crate::workflow::{Stage, StageNode};

#[derive(Debug, Default)]
pub struct RecoveryAgent;

impl RecoveryAgent {
    pub fn new() -> Self {
        Self
    }

    pub fn recover(&self, mut state: WorkflowState) -> WorkflowState {
        let Some(error) = state.error.as_deref() else {
            return state;
        };
        let class = ErrorClass::classify(error);
        tracing::warn!(class = ?class, error = %error, "recovery: {}", class.diagnosis());
        state.requires_human_review = true;
        state
    }
}

#[async_trait]
impl StageNode for RecoveryAgent {
    fn stage(&self) -> Stage {
        Stage::Recovery
    }

    async fn run(&self, state: WorkflowState) -> WorkflowState {
        self.recover(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recover_flags_review_and_keeps_error() {
        let state = WorkflowState {
            error: Some("Failed to scrape blog content: connection reset".into()),
            ..WorkflowState::default()
        };
        let out = RecoveryAgent::new().recover(state);
        assert!(out.requires_human_review);
        assert_eq!(
            out.error.as_deref(),
            Some("Failed to scrape blog content: connection reset")
        );
    }

    #[test]
    fn test_recover_without_error_is_noop() {
        let state = WorkflowState::default();
        let out = RecoveryAgent::new().recover(state.clone());
        assert_eq!(out, state);
    }
}
