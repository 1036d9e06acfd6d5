//! 工作流状态：贯穿所有阶段的 WorkflowState
//!
//! 每个阶段按值接收状态、返回更新后的状态（所有权在阶段间转移），便于单独测试每次转换。
//! 一旦 `error` 被设置，除 RecoveryAgent 外的阶段都必须原样透传。

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::content::{Post, PostKey};
use crate::review::FeedbackRecord;

/// 内容所处阶段（idea → teaser → draft → final）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idea,
    Teaser,
    Draft,
    Final,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idea => "idea",
            Phase::Teaser => "teaser",
            Phase::Draft => "draft",
            Phase::Final => "final",
        };
        f.write_str(s)
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "idea" | "" => Ok(Phase::Idea),
            "teaser" => Ok(Phase::Teaser),
            "draft" => Ok(Phase::Draft),
            "final" => Ok(Phase::Final),
            other => Err(format!("unknown phase: {other}")),
        }
    }
}

/// 一次运行的输入描述
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunInputs {
    pub idea_text: String,
    pub blog_url: String,
    /// 已清洗的笔记正文（不是路径）
    pub obsidian_notes: String,
    pub custom_prompt: String,
    pub phase: Phase,
}

/// 运行结果分类，对应进程退出码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    /// 无错误但需要人工复核
    NeedsReview,
    Failed,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Success => 0,
            RunOutcome::Failed => 1,
            RunOutcome::NeedsReview => 2,
        }
    }
}

/// 贯穿整条流水线的状态
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowState {
    pub idea_text: String,
    pub blog_url: String,
    pub obsidian_notes: String,
    pub custom_prompt: String,
    pub phase: Phase,

    pub blog_content: String,
    pub blog_summary: String,
    pub blog_draft: String,

    pub linkedin_posts: Vec<Post>,
    pub x_posts: Vec<Post>,
    pub improved_linkedin_posts: Vec<Post>,
    pub improved_x_posts: Vec<Post>,

    pub validation_issues: Vec<String>,
    pub peer_review_feedback: HashMap<PostKey, FeedbackRecord>,
    pub improvement_summary: Vec<String>,
    pub requires_human_review: bool,
    pub improvement_iteration_count: u32,
    /// 有值即表示流水线已中止
    pub error: Option<String>,
}

impl WorkflowState {
    pub fn new(inputs: RunInputs) -> Self {
        Self {
            idea_text: inputs.idea_text,
            blog_url: inputs.blog_url.trim().to_string(),
            obsidian_notes: inputs.obsidian_notes,
            custom_prompt: inputs.custom_prompt,
            phase: inputs.phase,
            ..Self::default()
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// 记录阶段失败；已有错误时保留第一个
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{}", message);
        if self.error.is_none() {
            self.error = Some(message);
        }
    }

    pub fn has_blog_url(&self) -> bool {
        !self.blog_url.is_empty()
    }

    pub fn has_posts(&self) -> bool {
        !self.linkedin_posts.is_empty() || !self.x_posts.is_empty()
    }

    /// 原始帖子：先 LinkedIn 后 X
    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.linkedin_posts.iter().chain(self.x_posts.iter())
    }

    pub fn improved_posts(&self) -> impl Iterator<Item = &Post> {
        self.improved_linkedin_posts.iter().chain(self.improved_x_posts.iter())
    }

    pub fn outcome(&self) -> RunOutcome {
        if self.error.is_some() {
            RunOutcome::Failed
        } else if self.requires_human_review {
            RunOutcome::NeedsReview
        } else {
            RunOutcome::Success
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = WorkflowState::new(RunInputs {
            blog_url: "  https://example.test/post  ".into(),
            ..RunInputs::default()
        });
        assert_eq!(state.blog_url, "https://example.test/post");
        assert!(state.linkedin_posts.is_empty());
        assert!(state.error.is_none());
        assert!(!state.requires_human_review);
        assert_eq!(state.improvement_iteration_count, 0);
        assert_eq!(state.outcome(), RunOutcome::Success);
    }

    #[test]
    fn test_fail_keeps_first_error() {
        let mut state = WorkflowState::default();
        state.fail("first");
        state.fail("second");
        assert_eq!(state.error.as_deref(), Some("first"));
        assert_eq!(state.outcome(), RunOutcome::Failed);
        assert_eq!(state.outcome().exit_code(), 1);
    }

    #[test]
    fn test_review_outcome() {
        let state = WorkflowState {
            requires_human_review: true,
            ..WorkflowState::default()
        };
        assert_eq!(state.outcome(), RunOutcome::NeedsReview);
        assert_eq!(state.outcome().exit_code(), 2);
    }

    #[test]
    fn test_phase_parse() {
        assert_eq!("FINAL".parse::<Phase>().unwrap(), Phase::Final);
        assert_eq!("".parse::<Phase>().unwrap(), Phase::Idea);
        assert!("published".parse::<Phase>().is_err());
    }
}
