//! idea → publish 流程的前置阶段：记录想法、规划阶段、生成预热帖、起草博客

use std::sync::Arc;

use async_trait::async_trait;

use crate::content::generation::{custom_instructions, MONDAY_TEASER};
use crate::content::validator::{LengthWindow, ValidationRules};
use crate::content::{Platform, Post, VOICE_GUIDELINES};
use crate::core::{Phase, StageError, WorkflowState};
use crate::llm::TextGenerator;
use crate::workflow::{Stage, StageNode};

/// 校验至少有一种输入（想法、笔记或博客 URL）
#[derive(Debug, Default)]
pub struct IdeaCapture;

#[async_trait]
impl StageNode for IdeaCapture {
    fn stage(&self) -> Stage {
        Stage::CaptureIdea
    }

    async fn run(&self, mut state: WorkflowState) -> WorkflowState {
        if state.has_error() {
            return state;
        }
        state.idea_text = state.idea_text.trim().to_string();
        if state.idea_text.is_empty() && state.obsidian_notes.trim().is_empty() && !state.has_blog_url() {
            let err = StageError::MissingInput("idea text, notes or blog URL".to_string());
            state.fail(format!("Failed to capture idea: {}", err));
            return state;
        }
        tracing::info!(phase = %state.phase, chars = state.idea_text.chars().count(), "Idea captured");
        state
    }
}

/// 推进阶段：有博客 URL 即 final；否则 idea → teaser
///
/// final 阶段没有博客 URL 时无处可去，直接失败。
#[derive(Debug, Default)]
pub struct PhasePlanner;

impl PhasePlanner {
    pub fn plan(mut state: WorkflowState) -> WorkflowState {
        if state.has_error() {
            return state;
        }
        if state.phase == Phase::Final && !state.has_blog_url() {
            let err = StageError::MissingInput("blog URL is required in the final phase".to_string());
            state.fail(format!("Failed to plan next phase: {}", err));
            return state;
        }
        let next = if state.has_blog_url() {
            Phase::Final
        } else if state.phase == Phase::Idea {
            Phase::Teaser
        } else {
            state.phase
        };
        if next != state.phase {
            tracing::info!(from = %state.phase, to = %next, "Planner advanced phase");
            state.phase = next;
        }
        state
    }
}

#[async_trait]
impl StageNode for PhasePlanner {
    fn stage(&self) -> Stage {
        Stage::Planner
    }

    async fn run(&self, state: WorkflowState) -> WorkflowState {
        Self::plan(state)
    }
}

/// 博客发布前，根据想法与笔记生成 LinkedIn 预热帖
pub struct TeaserGenerator {
    llm: Arc<dyn TextGenerator>,
    window: LengthWindow,
}

impl TeaserGenerator {
    pub fn new(llm: Arc<dyn TextGenerator>, rules: &ValidationRules) -> Self {
        Self {
            llm,
            window: rules.teaser_window,
        }
    }

    fn prompt(&self, state: &WorkflowState) -> String {
        format!(
            "# Create a LinkedIn teaser post for an upcoming blog post that is not published yet.\n\n\
             ## Idea:\n{}\n\n\
             ## Research Notes:\n{}\n\n\
             ## Requirements:\n\
             - {}-{} characters total\n\
             - Engaging hook built on one concrete mechanism from the idea\n\
             - NO LINKS (the blog is not published yet)\n\
             - Include relevant hashtags (3 max)\n\
             - End with a question that invites practitioners to share their experience\n\n\
             ## Preferences:\n{}\n{}",
            state.idea_text,
            state.obsidian_notes,
            self.window.min,
            self.window.max,
            VOICE_GUIDELINES,
            custom_instructions(&state.custom_prompt)
        )
    }
}

#[async_trait]
impl StageNode for TeaserGenerator {
    fn stage(&self) -> Stage {
        Stage::TeaserGenerator
    }

    async fn run(&self, mut state: WorkflowState) -> WorkflowState {
        if state.has_error() {
            return state;
        }
        tracing::info!("Generating teaser from idea");
        match self.llm.generate(&self.prompt(&state)).await {
            Ok(teaser) => {
                state
                    .linkedin_posts
                    .push(Post::new(teaser.trim(), Platform::LinkedIn, MONDAY_TEASER, "Monday"));
                state.phase = Phase::Draft;
            }
            Err(e) => state.fail(format!("Failed to generate teaser: {}", e)),
        }
        state
    }
}

/// 起草博客正文，等待作者发布
pub struct BlogDrafter {
    llm: Arc<dyn TextGenerator>,
}

impl BlogDrafter {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    fn prompt(&self, state: &WorkflowState) -> String {
        let teaser = state
            .linkedin_posts
            .iter()
            .find(|p| p.post_type == MONDAY_TEASER)
            .map(|p| p.content.as_str())
            .unwrap_or("(none)");
        format!(
            "# Draft a technical blog post.\n\n\
             ## Idea:\n{}\n\n\
             ## Research Notes:\n{}\n\n\
             ## Teaser already shared:\n{}\n\n\
             ## Requirements:\n\
             - Title plus 800-1200 words in Markdown\n\
             - Explain mechanisms with concrete examples; one small ASCII diagram if it clarifies\n\
             - Deliver on the promise made in the teaser\n\
             - Mark any statistic that needs a source with [citation needed]\n\n\
             ## Preferences:\n{}\n{}",
            state.idea_text,
            state.obsidian_notes,
            teaser,
            VOICE_GUIDELINES,
            custom_instructions(&state.custom_prompt)
        )
    }
}

#[async_trait]
impl StageNode for BlogDrafter {
    fn stage(&self) -> Stage {
        Stage::BlogDrafter
    }

    async fn run(&self, mut state: WorkflowState) -> WorkflowState {
        if state.has_error() {
            return state;
        }
        tracing::info!("Drafting blog post");
        match self.llm.generate(&self.prompt(&state)).await {
            Ok(draft) => {
                state.blog_draft = draft.trim().to_string();
                tracing::info!("Blog draft ready ({} chars), awaiting publication", state.blog_draft.chars().count());
            }
            Err(e) => state.fail(format!("Failed to draft blog post: {}", e)),
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedGenerator;

    #[tokio::test]
    async fn test_capture_requires_some_input() {
        let out = IdeaCapture.run(WorkflowState::default()).await;
        assert_eq!(
            out.error.as_deref(),
            Some("Failed to capture idea: Missing input: idea text, notes or blog URL")
        );

        let state = WorkflowState {
            idea_text: "  DNS caching  ".into(),
            ..WorkflowState::default()
        };
        let out = IdeaCapture.run(state).await;
        assert!(out.error.is_none());
        assert_eq!(out.idea_text, "DNS caching");
    }

    #[test]
    fn test_planner_phases() {
        let out = PhasePlanner::plan(WorkflowState::default());
        assert_eq!(out.phase, Phase::Teaser);

        let draft = WorkflowState {
            phase: Phase::Draft,
            ..WorkflowState::default()
        };
        assert_eq!(PhasePlanner::plan(draft).phase, Phase::Draft);

        let published = WorkflowState {
            blog_url: "https://blog.test/p".into(),
            phase: Phase::Teaser,
            ..WorkflowState::default()
        };
        assert_eq!(PhasePlanner::plan(published).phase, Phase::Final);
    }

    #[test]
    fn test_final_phase_requires_blog_url() {
        let state = WorkflowState {
            idea_text: "DNS caching".into(),
            phase: Phase::Final,
            ..WorkflowState::default()
        };
        let out = PhasePlanner::plan(state);
        assert_eq!(
            out.error.as_deref(),
            Some("Failed to plan next phase: Missing input: blog URL is required in the final phase")
        );
        assert_eq!(out.phase, Phase::Final);

        let published = WorkflowState {
            blog_url: "https://blog.test/p".into(),
            phase: Phase::Final,
            ..WorkflowState::default()
        };
        assert!(PhasePlanner::plan(published).error.is_none());
    }

    #[tokio::test]
    async fn test_teaser_then_draft() {
        let llm = Arc::new(ScriptedGenerator::with_responses(["teaser text", "# Draft\nbody"]));
        let state = WorkflowState {
            idea_text: "DNS is eventually consistent".into(),
            phase: Phase::Teaser,
            ..WorkflowState::default()
        };

        let state = TeaserGenerator::new(llm.clone(), &ValidationRules::default())
            .run(state)
            .await;
        assert_eq!(state.phase, Phase::Draft);
        assert_eq!(state.linkedin_posts[0].post_type, MONDAY_TEASER);

        let state = BlogDrafter::new(llm.clone()).run(state).await;
        assert_eq!(state.blog_draft, "# Draft\nbody");
        assert!(llm.prompts()[1].contains("teaser text"));
    }
}
