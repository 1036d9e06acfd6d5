//! 工作流类型定义
//!
//! 定义阶段、转移、流程形态、阶段节点 trait 与工作流错误。

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::WorkflowState;

/// 流水线中的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    CaptureIdea,
    Planner,
    TeaserGenerator,
    BlogDrafter,
    Scraper,
    NotesIntegration,
    Summarizer,
    LinkedInGenerator,
    XGenerator,
    Validator,
    PeerReviewer,
    ContentImprover,
    SelfEvaluator,
    Recovery,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::CaptureIdea => "capture_idea",
            Stage::Planner => "planner_agent",
            Stage::TeaserGenerator => "teaser_generator",
            Stage::BlogDrafter => "blog_drafter",
            Stage::Scraper => "scraper",
            Stage::NotesIntegration => "notes_integration",
            Stage::Summarizer => "summarizer",
            Stage::LinkedInGenerator => "linkedin_generator",
            Stage::XGenerator => "x_generator",
            Stage::Validator => "validator",
            Stage::PeerReviewer => "peer_reviewer",
            Stage::ContentImprover => "content_improver",
            Stage::SelfEvaluator => "self_evaluator",
            Stage::Recovery => "recovery_agent",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 一个阶段结束后的去向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    To(Stage),
    End,
}

/// 流程形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// 已发布博客：Scrape → Notes → Summarize → LinkedIn → X → Validate ⇄ Review/Improve → Evaluate
    BlogOnly,
    /// 从想法开始：CaptureIdea → Planner → Teaser / Draft / Scrape …
    IdeaToPublish,
}

/// 工作流的数值上限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowSettings {
    /// 改进循环最多进入 ContentImprover 的次数
    pub max_improvement_iterations: u32,
    /// 单次运行最多执行的阶段数
    pub max_steps: usize,
    pub summary_input_chars: usize,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            max_improvement_iterations: 3,
            max_steps: 64,
            summary_input_chars: 4000,
        }
    }
}

/// 阶段节点：按值接收状态，返回更新后的状态
///
/// 约定：除 RecoveryAgent 外，`state.error` 有值时必须原样返回。
#[async_trait]
pub trait StageNode: Send + Sync {
    fn stage(&self) -> Stage;

    async fn run(&self, state: WorkflowState) -> WorkflowState;
}

/// 一次运行的结果：最终状态与实际经过的阶段
#[derive(Debug, Clone)]
pub struct WorkflowRun {
    pub state: WorkflowState,
    pub path: Vec<Stage>,
}

impl WorkflowRun {
    pub fn visits(&self, stage: Stage) -> usize {
        self.path.iter().filter(|s| **s == stage).count()
    }
}

/// 工作流错误类型
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Invalid workflow configuration: {0}")]
    InvalidConfiguration(String),
    #[error("No handler registered for stage {0}")]
    MissingStage(Stage),
}
