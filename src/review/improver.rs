//! ContentImprover：按评审反馈改写帖子
//!
//! 不改原帖：满足触发条件的帖子生成一篇改进版，其余原样放入 improved 集合。
//! 单篇改写失败只记 warn 并退回原帖，不会中断流程。

use std::sync::Arc;

use async_trait::async_trait;

use crate::content::generation::custom_instructions;
use crate::content::{Platform, Post, PostKind, ValidationRules, BANNED_WORDS};
use crate::core::WorkflowState;
use crate::llm::{GenerationError, TextGenerator};
use crate::review::{FeedbackRecord, ReviewPolicy};
use crate::workflow::{Stage, StageNode};

pub struct ContentImprover {
    llm: Arc<dyn TextGenerator>,
    policy: ReviewPolicy,
    rules: ValidationRules,
}

impl ContentImprover {
    pub fn new(llm: Arc<dyn TextGenerator>, policy: ReviewPolicy, rules: ValidationRules) -> Self {
        Self { llm, policy, rules }
    }

    fn platform_constraints(&self, post: &Post, blog_url: &str) -> String {
        match post.kind() {
            PostKind::Teaser => format!(
                "- LinkedIn teaser: {}-{} characters, no links, end with a question.",
                self.rules.teaser_window.min, self.rules.teaser_window.max
            ),
            PostKind::BlogReference => format!(
                "- LinkedIn blog reference: {}-{} characters, must include the blog URL {}.",
                self.rules.reference_window.min, self.rules.reference_window.max, blog_url
            ),
            _ if post.platform == Platform::X => format!(
                "- X: keep numbering, every line under {} characters, final line includes the blog URL {}.",
                self.rules.max_line_chars, blog_url
            ),
            _ => "- Keep the same platform-appropriate formatting.".to_string(),
        }
    }

    fn prompt(&self, post: &Post, feedback: &FeedbackRecord, state: &WorkflowState) -> String {
        let tolerance = (post.char_count as f64 * self.policy.length_tolerance).round() as usize;
        let issues = serde_json::to_string_pretty(&feedback.issues).unwrap_or_default();
        let edits = serde_json::to_string_pretty(&feedback.actionable_edits).unwrap_or_default();
        let summary = if state.blog_summary.trim().is_empty() {
            "(not available)"
        } else {
            state.blog_summary.trim()
        };
        format!(
            "Improve this {platform} post based on the peer review feedback.\n\n\
             ORIGINAL POST:\n{content}\n\n\
             BLOG SUMMARY (source for concrete examples):\n{summary}\n\n\
             POST REQUIREMENTS:\n\
             - Platform: {platform}\n\
             - Type: {post_type}\n\
             - Target length: {chars} characters (stay within {low}-{high})\n\
             {constraints}\n\
             - Do not use these words: {banned}\n\n\
             PEER REVIEW FEEDBACK:\n\
             Issues to address: {issues}\n\
             Suggested edits: {edits}\n\
             Strengths to maintain: {strengths:?}\n\n\
             IMPROVEMENT GUIDELINES:\n\
             1. Address the specific issues mentioned in the feedback\n\
             2. Maintain the core message and key insights\n\
             3. Preserve the strengths identified\n\
             4. Keep the same platform-appropriate formatting\n\
             5. Maintain professional yet engaging tone\n\
             {custom}\n\
             Return ONLY the improved post content, nothing else.",
            platform = post.platform,
            content = post.content,
            summary = summary,
            post_type = post.post_type,
            chars = post.char_count,
            low = post.char_count.saturating_sub(tolerance),
            high = post.char_count + tolerance,
            constraints = self.platform_constraints(post, &state.blog_url),
            banned = BANNED_WORDS.join(", "),
            strengths = feedback.strengths,
            custom = custom_instructions(&state.custom_prompt),
        )
    }

    /// 改写单篇；没有具体问题时直接返回原帖
    pub async fn improve_post(
        &self,
        post: &Post,
        feedback: &FeedbackRecord,
        state: &WorkflowState,
    ) -> Post {
        if feedback.issues.is_empty() {
            return post.clone();
        }
        match self.rewrite(post, feedback, state).await {
            Ok(improved) => improved,
            Err(e) => {
                tracing::warn!("Failed to improve {}: {}", post.key(), e);
                post.clone()
            }
        }
    }

    async fn rewrite(
        &self,
        post: &Post,
        feedback: &FeedbackRecord,
        state: &WorkflowState,
    ) -> Result<Post, GenerationError> {
        let response = self.llm.generate(&self.prompt(post, feedback, state)).await?;
        let content = response.trim();
        if content.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        let notes = feedback.issues.iter().map(|i| i.kind.clone()).collect();
        Ok(post.improved(
            content,
            feedback.overall_score + self.policy.improved_score_bonus,
            notes,
        ))
    }

    async fn improve_all(&self, posts: &[Post], state: &WorkflowState, summary: &mut Vec<String>) -> Vec<Post> {
        let mut out = Vec::with_capacity(posts.len());
        for post in posts {
            let Some(feedback) = state.peer_review_feedback.get(&post.key()) else {
                out.push(post.clone());
                continue;
            };
            if !self.policy.should_improve(feedback) {
                out.push(post.clone());
                continue;
            }
            let improved = self.improve_post(post, feedback, state).await;
            if improved.is_improved_version {
                summary.push(format!(
                    "Improved {} {}: {}",
                    post.platform,
                    post.post_type,
                    improved.improvement_notes.join(", ")
                ));
            }
            out.push(improved);
        }
        out
    }

    pub async fn improve(&self, mut state: WorkflowState) -> WorkflowState {
        if state.has_error() {
            return state;
        }
        if state.peer_review_feedback.is_empty() {
            tracing::warn!("No peer review feedback available");
            return state;
        }
        tracing::info!("Generating improved content");

        let mut summary = Vec::new();
        let linkedin = self.improve_all(&state.linkedin_posts, &state, &mut summary).await;
        let x = self.improve_all(&state.x_posts, &state, &mut summary).await;

        state.improved_linkedin_posts = linkedin;
        state.improved_x_posts = x;
        state.improvement_summary.extend(summary);

        let improved = state.improved_posts().filter(|p| p.is_improved_version).count();
        tracing::info!("Content improvement complete. {} posts improved", improved);
        state
    }
}

#[async_trait]
impl StageNode for ContentImprover {
    fn stage(&self) -> Stage {
        Stage::ContentImprover
    }

    async fn run(&self, state: WorkflowState) -> WorkflowState {
        self.improve(state).await
    }
}
