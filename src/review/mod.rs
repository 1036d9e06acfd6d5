//! 评审层：同行评审、按反馈改写、终点自评

pub mod evaluator;
pub mod feedback;
pub mod improver;
pub mod reviewer;

pub use evaluator::SelfEvaluator;
pub use feedback::{
    strip_code_fence, ActionableEdit, FeedbackParseError, FeedbackRecord, Priority, ReviewIssue,
    Severity, DEFAULT_REVIEW_SCORE,
};
pub use improver::ContentImprover;
pub use reviewer::PeerReviewer;

/// 评审相关阈值
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewPolicy {
    /// 低于此分数标记人工复核
    pub human_review_floor: f64,
    /// 低于此分数触发改写
    pub improvement_trigger: f64,
    /// 改写目标长度的上下浮动比例
    pub length_tolerance: f64,
    pub improved_score_bonus: f64,
    pub evaluation_threshold: f64,
    /// 自评时缺失分数按此计
    pub missing_score: f64,
}

impl Default for ReviewPolicy {
    fn default() -> Self {
        Self {
            human_review_floor: 6.0,
            improvement_trigger: 8.0,
            length_tolerance: 0.10,
            improved_score_bonus: 1.0,
            evaluation_threshold: 8.0,
            missing_score: 7.0,
        }
    }
}

impl ReviewPolicy {
    /// 分数低于触发线、存在 high 问题或优先级为 high 时改写
    pub fn should_improve(&self, feedback: &FeedbackRecord) -> bool {
        feedback.overall_score < self.improvement_trigger
            || feedback.has_high_severity_issue()
            || feedback.improvement_priority == Priority::High
    }
}
