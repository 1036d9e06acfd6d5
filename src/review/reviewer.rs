//! PeerReviewer：逐帖调用 LLM 做结构化评审
//!
//! 每篇帖子一次调用，严格串行。解析失败（或调用失败）只降级为默认反馈，
//! 绝不写入 `state.error`。`requires_human_review` 只会被置为 true，不会被清除。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::content::{Platform, Post, BANNED_WORDS};
use crate::core::WorkflowState;
use crate::llm::TextGenerator;
use crate::review::{FeedbackRecord, ReviewPolicy};
use crate::workflow::{Stage, StageNode};

pub struct PeerReviewer {
    llm: Arc<dyn TextGenerator>,
    policy: ReviewPolicy,
}

impl PeerReviewer {
    pub fn new(llm: Arc<dyn TextGenerator>, policy: ReviewPolicy) -> Self {
        Self { llm, policy }
    }

    fn prompt(post: &Post, blog_url: &str, source: &str) -> String {
        let platform_rules = match post.platform {
            Platform::LinkedIn => {
                "- For LinkedIn: ensure <=3 relevant hashtags max; a teaser has no links and ends with a question.".to_string()
            }
            Platform::X => format!(
                "- For X threads: preserve numbering and per-line <280 chars; final line includes blog URL {}.",
                blog_url
            ),
        };
        format!(
            "You are a senior editor reviewing this {platform} post. Your job is to deliver surgical, concrete edits that raise clarity and specificity without changing the author's core message or structure.\n\n\
             POST CONTENT:\n{content}\n\n\
             POST DETAILS:\n\
             - Platform: {platform}\n\
             - Type: {post_type}\n\
             - Length: {chars} characters\n\
             - Source: {source}\n\
             - Existing validation issues: {notes:?}\n\n\
             CRITERIA:\n\
             - Engagement: precise, curiosity-driven hook without hype.\n\
             - Specificity: replace abstractions with concrete mechanisms, examples, or numbers.\n\
             - Platform fit: {platform}-native formatting and constraints.\n\
             - Accuracy: avoid unsupported claims; flag stats without sources.\n\
             - Style: short sentences, plain language, no emojis, no exclamation points.\n\
             - Banlist: avoid words like {banlist} unless quoted from a source.\n\
             - Voice: individual practitioner tone; avoid team pronouns (\"we\", \"our\", \"us\", \"the team\"). Do not insert explicit role/motive statements.\n\n\
             WHAT TO RETURN:\n\
             Return ONLY valid JSON (no markdown, no code fences) with this exact shape and keys:\n\
             {{\n\
             \x20 \"overall_score\": number,\n\
             \x20 \"issues\": [{{\"type\": string, \"severity\": \"low\"|\"medium\"|\"high\", \"description\": string, \"suggestion\": string, \"example\": string}}],\n\
             \x20 \"strengths\": [string],\n\
             \x20 \"actionable_edits\": [{{\"target_quote\": string, \"rationale\": string, \"edit_text\": string}}],\n\
             \x20 \"improvement_priority\": \"low\"|\"medium\"|\"high\",\n\
             \x20 \"needs_human_review\": boolean,\n\
             \x20 \"banlist_hits\": [string]\n\
             }}\n\n\
             EDIT FOCUS:\n\
             - Prefer adding one concrete example that illustrates mechanism/cause, not just naming concepts.\n\
             {platform_rules}\n\n\
             Output the JSON only.",
            platform = post.platform,
            content = post.content,
            post_type = post.post_type,
            chars = post.char_count,
            notes = post.validation_notes,
            banlist = BANNED_WORDS.iter().map(|w| format!("\"{w}\"")).collect::<Vec<_>>().join(", "),
        )
    }

    /// 评审单篇；任何失败都退回默认反馈
    async fn review_post(&self, post: &Post, blog_url: &str, source: &str) -> FeedbackRecord {
        let key = post.key();
        let raw = match self.llm.generate(&Self::prompt(post, blog_url, source)).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Failed to review {}: {}", key, e);
                return FeedbackRecord::parse_failed();
            }
        };
        match FeedbackRecord::parse(&raw) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Failed to parse review for {}: {}", key, e);
                FeedbackRecord::parse_failed()
            }
        }
    }

    pub async fn review(&self, mut state: WorkflowState) -> WorkflowState {
        if state.has_error() {
            return state;
        }
        if !state.has_posts() {
            tracing::warn!("No posts to review");
            return state;
        }
        tracing::info!("Running peer review analysis");

        let blog_url = state.blog_url.clone();
        let source = if state.has_blog_url() { "blog" } else { "obsidian" };
        let mut feedback = HashMap::new();
        let mut needs_review = false;

        for post in state.linkedin_posts.iter_mut().chain(state.x_posts.iter_mut()) {
            let record = self.review_post(post, &blog_url, source).await;
            post.peer_review_score = Some(record.overall_score);
            if record.needs_human_review || record.overall_score < self.policy.human_review_floor {
                needs_review = true;
            }
            // 同键帖子：后写入的覆盖
            feedback.insert(post.key(), record);
        }

        state.peer_review_feedback = feedback;
        state.requires_human_review |= needs_review;

        let scores: Vec<f64> = state.posts().filter_map(|p| p.peer_review_score).collect();
        let average = scores.iter().sum::<f64>() / scores.len() as f64;
        tracing::info!("Peer review complete. Average score: {:.1}/10", average);
        state
    }
}

#[async_trait]
impl StageNode for PeerReviewer {
    fn stage(&self) -> Stage {
        Stage::PeerReviewer
    }

    async fn run(&self, state: WorkflowState) -> WorkflowState {
        self.review(state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::PostKey;
    use crate::llm::{GenerationError, ScriptedGenerator};
    use crate::review::Priority;

    fn reviewer(llm: ScriptedGenerator) -> PeerReviewer {
        PeerReviewer::new(Arc::new(llm), ReviewPolicy::default())
    }

    fn one_post() -> WorkflowState {
        WorkflowState {
            blog_url: "https://blog.test/dns".into(),
            linkedin_posts: vec![Post::new("teaser", Platform::LinkedIn, "Monday Teaser", "Monday")],
            ..WorkflowState::default()
        }
    }

    fn key() -> PostKey {
        PostKey::new(Platform::LinkedIn, "Monday Teaser")
    }

    #[tokio::test]
    async fn test_fenced_response() {
        let r = reviewer(ScriptedGenerator::with_responses(["```json\n{\"overall_score\": 9}\n```"]));
        let out = r.review(one_post()).await;
        assert_eq!(out.peer_review_feedback[&key()].overall_score, 9.0);
        assert_eq!(out.linkedin_posts[0].peer_review_score, Some(9.0));
        assert!(!out.requires_human_review);
    }

    #[tokio::test]
    async fn test_unparseable_response_degrades() {
        let r = reviewer(ScriptedGenerator::with_responses(["not json"]));
        let out = r.review(one_post()).await;
        assert_eq!(out.peer_review_feedback[&key()], FeedbackRecord::parse_failed());
        assert_eq!(out.linkedin_posts[0].peer_review_score, Some(8.0));
        assert!(out.error.is_none());
    }

    #[tokio::test]
    async fn test_generation_error_degrades() {
        let llm = ScriptedGenerator::new();
        llm.push_err(GenerationError::Timeout);
        let out = reviewer(llm).review(one_post()).await;
        assert_eq!(out.peer_review_feedback[&key()], FeedbackRecord::parse_failed());
        assert!(out.error.is_none());
    }

    #[tokio::test]
    async fn test_low_score_or_flag_requires_review() {
        let out = reviewer(ScriptedGenerator::with_responses([r#"{"overall_score": 5.5}"#]))
            .review(one_post())
            .await;
        assert!(out.requires_human_review);

        let out = reviewer(ScriptedGenerator::with_responses([
            r#"{"overall_score": 9, "needs_human_review": true}"#,
        ]))
        .review(one_post())
        .await;
        assert!(out.requires_human_review);
    }

    #[tokio::test]
    async fn test_flag_is_sticky() {
        let mut state = one_post();
        state.requires_human_review = true;
        let out = reviewer(ScriptedGenerator::with_responses([r#"{"overall_score": 9.5}"#]))
            .review(state)
            .await;
        assert!(out.requires_human_review);
    }

    #[tokio::test]
    async fn test_feedback_replaced_and_collisions_last_write_wins() {
        let mut state = one_post();
        state
            .linkedin_posts
            .push(Post::new("second teaser", Platform::LinkedIn, "Monday Teaser", "Monday"));
        state
            .peer_review_feedback
            .insert(PostKey::new(Platform::X, "X Thread"), FeedbackRecord::parse_failed());

        let out = reviewer(ScriptedGenerator::with_responses([
            r#"{"overall_score": 6.5, "improvement_priority": "high"}"#,
            r#"{"overall_score": 9}"#,
        ]))
        .review(state)
        .await;

        assert_eq!(out.peer_review_feedback.len(), 1);
        let record = &out.peer_review_feedback[&key()];
        assert_eq!(record.overall_score, 9.0);
        assert_eq!(record.improvement_priority, Priority::Low);
        assert_eq!(out.linkedin_posts[0].peer_review_score, Some(6.5));
    }

    #[tokio::test]
    async fn test_prompt_includes_validation_notes() {
        let llm = Arc::new(ScriptedGenerator::new());
        let mut state = one_post();
        state.linkedin_posts[0].add_note("too short");
        PeerReviewer::new(llm.clone(), ReviewPolicy::default())
            .review(state)
            .await;
        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("too short"));
        assert!(prompt.contains("Source: blog"));
        assert!(prompt.contains("\"leverage\""));
    }

    #[tokio::test]
    async fn test_no_posts_is_noop() {
        let llm = Arc::new(ScriptedGenerator::new());
        let state = WorkflowState::default();
        let out = PeerReviewer::new(llm.clone(), ReviewPolicy::default())
            .review(state.clone())
            .await;
        assert_eq!(out, state);
        assert_eq!(llm.calls(), 0);
    }
}
