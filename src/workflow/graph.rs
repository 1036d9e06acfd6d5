//! 工作流转移图
//!
//! 固定边直接给出下一阶段；条件边由 route_* 函数根据状态决定。
//! 所有条件路由先检查 `state.error`，有错误一律转到 RecoveryAgent。

use crate::core::{Phase, WorkflowState};
use crate::workflow::types::*;

/// 转移图：流程形态 + 改进循环上限
#[derive(Debug, Clone, Copy)]
pub struct WorkflowGraph {
    variant: Variant,
    max_improvement_iterations: u32,
}

impl WorkflowGraph {
    pub fn new(variant: Variant, max_improvement_iterations: u32) -> Self {
        Self {
            variant,
            max_improvement_iterations,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn entry(&self) -> Stage {
        match self.variant {
            Variant::BlogOnly => Stage::Scraper,
            Variant::IdeaToPublish => Stage::CaptureIdea,
        }
    }

    /// 计算 `from` 之后的去向；改进路由会递增 `improvement_iteration_count`
    pub fn next(&self, from: Stage, state: &mut WorkflowState) -> Transition {
        let cap = self.max_improvement_iterations;
        match from {
            Stage::CaptureIdea => Transition::To(Stage::Planner),
            Stage::Planner => Transition::To(route_after_planner(state)),
            Stage::TeaserGenerator => Transition::To(route_after_teaser(state)),
            Stage::BlogDrafter => route_after_draft(state),
            Stage::Scraper => Transition::To(Stage::NotesIntegration),
            Stage::NotesIntegration => Transition::To(Stage::Summarizer),
            Stage::Summarizer => Transition::To(Stage::LinkedInGenerator),
            Stage::LinkedInGenerator => Transition::To(Stage::XGenerator),
            Stage::XGenerator => route_after_generation(state),
            Stage::Validator => Transition::To(route_after_validation(state, self.variant, cap)),
            Stage::PeerReviewer => Transition::To(route_after_review(state, cap)),
            Stage::ContentImprover => Transition::To(Stage::Validator),
            Stage::SelfEvaluator => route_after_evaluation(state),
            Stage::Recovery => Transition::End,
        }
    }
}

pub fn route_after_planner(state: &WorkflowState) -> Stage {
    if state.has_error() {
        return Stage::Recovery;
    }
    match (state.has_blog_url(), state.phase) {
        (false, Phase::Teaser) => Stage::TeaserGenerator,
        (false, Phase::Draft) => Stage::BlogDrafter,
        (true, Phase::Final) => Stage::Scraper,
        _ => Stage::Planner,
    }
}

pub fn route_after_teaser(state: &WorkflowState) -> Stage {
    if state.has_error() {
        return Stage::Recovery;
    }
    match (state.has_blog_url(), state.phase) {
        (false, Phase::Draft) => Stage::BlogDrafter,
        (true, Phase::Final) => Stage::Scraper,
        _ => Stage::Planner,
    }
}

/// 草稿之后：博客已发布则抓取；否则有帖子就校验预热帖，没有就结束
pub fn route_after_draft(state: &WorkflowState) -> Transition {
    if state.has_error() {
        return Transition::To(Stage::Recovery);
    }
    if state.has_blog_url() && state.phase == Phase::Final {
        Transition::To(Stage::Scraper)
    } else if state.has_posts() {
        Transition::To(Stage::Validator)
    } else {
        Transition::End
    }
}

pub fn route_after_generation(state: &WorkflowState) -> Transition {
    if state.has_error() {
        return Transition::To(Stage::Recovery);
    }
    if state.has_posts() {
        Transition::To(Stage::Validator)
    } else {
        Transition::End
    }
}

/// 校验之后：博客流程总是进入同行评审；idea 流程只在校验发现问题时评审
pub fn route_after_validation(state: &WorkflowState, variant: Variant, max_iterations: u32) -> Stage {
    if state.has_error() {
        return Stage::Recovery;
    }
    if state.improvement_iteration_count >= max_iterations {
        tracing::warn!(
            "Maximum improvement iterations ({}) reached, proceeding to evaluation",
            max_iterations
        );
        return Stage::SelfEvaluator;
    }
    match variant {
        Variant::BlogOnly => Stage::PeerReviewer,
        Variant::IdeaToPublish if state.validation_issues.is_empty() => Stage::SelfEvaluator,
        Variant::IdeaToPublish => Stage::PeerReviewer,
    }
}

/// 改进循环守卫：到达上限强制进入自评；否则任一反馈优先级为 medium/high 时计数 +1 并改进
pub fn route_after_review(state: &mut WorkflowState, max_iterations: u32) -> Stage {
    if state.has_error() {
        return Stage::Recovery;
    }
    if state.improvement_iteration_count >= max_iterations {
        tracing::warn!(
            "Maximum improvement iterations ({}) reached, proceeding to evaluation",
            max_iterations
        );
        return Stage::SelfEvaluator;
    }
    let needs_improvement = state
        .peer_review_feedback
        .values()
        .any(|f| f.wants_another_pass());
    if needs_improvement {
        state.improvement_iteration_count += 1;
        tracing::info!(
            "Starting improvement iteration {}/{}",
            state.improvement_iteration_count,
            max_iterations
        );
        Stage::ContentImprover
    } else {
        Stage::SelfEvaluator
    }
}

/// 自评之后总是结束；requires_human_review 只是给调用方的信号
pub fn route_after_evaluation(state: &WorkflowState) -> Transition {
    if state.has_error() {
        Transition::To(Stage::Recovery)
    } else {
        Transition::End
    }
}
