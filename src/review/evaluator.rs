//! SelfEvaluator：流程终点的整体质量判定
//!
//! 有改进版时看改进版，否则看原帖；平均分低于阈值即标记需要人工复核。

use async_trait::async_trait;

use crate::content::Post;
use crate::core::WorkflowState;
use crate::review::ReviewPolicy;
use crate::workflow::{Stage, StageNode};

pub struct SelfEvaluator {
    policy: ReviewPolicy,
}

impl SelfEvaluator {
    pub fn new(policy: ReviewPolicy) -> Self {
        Self { policy }
    }

    /// 平均分；没有帖子时返回 None
    pub fn average_score(&self, state: &WorkflowState) -> Option<f64> {
        let improved: Vec<&Post> = state.improved_posts().collect();
        let considered = if improved.is_empty() {
            state.posts().collect()
        } else {
            improved
        };
        if considered.is_empty() {
            return None;
        }
        let total: f64 = considered
            .iter()
            .map(|p| p.peer_review_score.unwrap_or(self.policy.missing_score))
            .sum();
        Some(total / considered.len() as f64)
    }

    pub fn evaluate(&self, mut state: WorkflowState) -> WorkflowState {
        if state.has_error() {
            return state;
        }
        let Some(average) = self.average_score(&state) else {
            tracing::info!("No posts to evaluate");
            return state;
        };
        tracing::info!("Final quality score: {:.1}/10", average);
        if average < self.policy.evaluation_threshold {
            tracing::warn!("Quality below threshold, flagging for human review");
            state.requires_human_review = true;
        }
        state
    }
}

#[async_trait]
impl StageNode for SelfEvaluator {
    fn stage(&self) -> Stage {
        Stage::SelfEvaluator
    }

    async fn run(&self, state: WorkflowState) -> WorkflowState {
        self.evaluate(state)
    }
}
