//! 帖子生成：LinkedIn（周一预热 + 周四博客引用）与 X 线程

use std::sync::Arc;

use async_trait::async_trait;

use crate::content::validator::{LengthWindow, ValidationRules};
use crate::content::{Platform, Post, VOICE_GUIDELINES};
use crate::core::WorkflowState;
use crate::llm::{GenerationError, TextGenerator};
use crate::workflow::{Stage, StageNode};

pub const MONDAY_TEASER: &str = "Monday Teaser";
pub const THURSDAY_REFERENCE: &str = "Thursday Blog Reference";
pub const X_THREAD: &str = "X Thread";

/// 自定义指令段落；为空时不输出
pub(crate) fn custom_instructions(custom_prompt: &str) -> String {
    if custom_prompt.trim().is_empty() {
        String::new()
    } else {
        format!("\n## Custom Instructions:\n{}\n", custom_prompt.trim())
    }
}

pub struct LinkedInGenerator {
    llm: Arc<dyn TextGenerator>,
    teaser_window: LengthWindow,
    reference_window: LengthWindow,
}

impl LinkedInGenerator {
    pub fn new(llm: Arc<dyn TextGenerator>, rules: &ValidationRules) -> Self {
        Self {
            llm,
            teaser_window: rules.teaser_window,
            reference_window: rules.reference_window,
        }
    }

    fn teaser_prompt(&self, state: &WorkflowState) -> String {
        format!(
            "# Create a LinkedIn teaser post based on this blog summary.\n\n\
             ## Blog Summary:\n{}\n\n\
             ## Requirements:\n\
             - {}-{} characters total\n\
             - Engaging hook to grab attention\n\
             - Professional LinkedIn tone\n\
             - Include relevant hashtags\n\
             - NO LINKS (this is a teaser)\n\
             - End with a question or call for engagement\n\n\
             ## Preferences:\n{}\n{}\n\
             Make it compelling enough that people want to know more.",
            state.blog_summary,
            self.teaser_window.min,
            self.teaser_window.max,
            VOICE_GUIDELINES,
            custom_instructions(&state.custom_prompt)
        )
    }

    fn reference_prompt(&self, state: &WorkflowState) -> String {
        format!(
            "# Create a LinkedIn post that references the full blog post.\n\n\
             ## Blog Summary:\n{}\n\
             ## Blog URL:\n{}\n\n\
             ## Requirements:\n\
             - {}-{} characters total\n\
             - Reference insights from the blog\n\
             - Include the blog URL\n\
             - Professional but engaging tone\n\
             - Add relevant hashtags\n\
             - Include a clear call-to-action to read the full post\n\
             - Share 1-2 specific takeaways from the blog\n\n\
             ## Preferences:\n{}\n{}\n\
             This should provide value while encouraging clicks to the full article.",
            state.blog_summary,
            state.blog_url,
            self.reference_window.min,
            self.reference_window.max,
            VOICE_GUIDELINES,
            custom_instructions(&state.custom_prompt)
        )
    }

    async fn generate_posts(&self, state: &WorkflowState) -> Result<Vec<Post>, GenerationError> {
        let teaser = self.llm.generate(&self.teaser_prompt(state)).await?;
        let reference = self.llm.generate(&self.reference_prompt(state)).await?;
        Ok(vec![
            Post::new(teaser.trim(), Platform::LinkedIn, MONDAY_TEASER, "Monday"),
            Post::new(reference.trim(), Platform::LinkedIn, THURSDAY_REFERENCE, "Thursday"),
        ])
    }
}

#[async_trait]
impl StageNode for LinkedInGenerator {
    fn stage(&self) -> Stage {
        Stage::LinkedInGenerator
    }

    async fn run(&self, mut state: WorkflowState) -> WorkflowState {
        if state.has_error() {
            return state;
        }
        tracing::info!("Generating LinkedIn posts");
        match self.generate_posts(&state).await {
            Ok(posts) => {
                state.linkedin_posts = posts;
                tracing::info!("LinkedIn posts generated");
            }
            Err(e) => state.fail(format!("Failed to generate LinkedIn posts: {}", e)),
        }
        state
    }
}

pub struct XGenerator {
    llm: Arc<dyn TextGenerator>,
    max_line_chars: usize,
}

impl XGenerator {
    pub fn new(llm: Arc<dyn TextGenerator>, rules: &ValidationRules) -> Self {
        Self {
            llm,
            max_line_chars: rules.max_line_chars,
        }
    }

    fn prompt(&self, state: &WorkflowState) -> String {
        let limit = self.max_line_chars;
        format!(
            "# Create a complete X (Twitter) thread based on this blog summary.\n\n\
             ## Blog Summary:\n{summary}\n\
             ## Blog URL:\n{url}\n\n\
             ## Requirements:\n\
             Create exactly 3 separate posts for a complete thread:\n\n\
             1. **Hook Tweet**: A short, engaging tweet (under {limit} chars) that hints at the topic and creates curiosity\n\
             2. **Thread Starter**: A main tweet (under {limit} chars) that introduces the thread topic\n\
             3. **Thread Content**: A complete numbered thread with 6-8 tweets, each under {limit} characters:\n\
             \x20  - Format as: \"1/ First insight about...\", \"2/ Second key point...\" and so on\n\
             \x20  - Include the blog URL in the final tweet\n\
             \x20  - Each tweet should be on a new line\n\n\
             ## Style Guidelines:\n\
             - Twitter-appropriate tone (casual, engaging)\n\
             - Make each tweet valuable on its own\n\
             - Build narrative flow through the thread\n\
             {voice}\n{custom}\n\
             Return the 3 posts clearly separated, with the thread content as one cohesive block.",
            summary = state.blog_summary,
            url = state.blog_url,
            voice = VOICE_GUIDELINES,
            custom = custom_instructions(&state.custom_prompt),
        )
    }
}

#[async_trait]
impl StageNode for XGenerator {
    fn stage(&self) -> Stage {
        Stage::XGenerator
    }

    async fn run(&self, mut state: WorkflowState) -> WorkflowState {
        if state.has_error() {
            return state;
        }
        tracing::info!("Generating X posts");
        match self.llm.generate(&self.prompt(&state)).await {
            Ok(thread) => {
                state.x_posts = vec![Post::new(thread.trim(), Platform::X, X_THREAD, "")];
                tracing::info!("Generated {} X posts", state.x_posts.len());
            }
            Err(e) => state.fail(format!("Failed to generate X posts: {}", e)),
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedGenerator;

    fn summarized() -> WorkflowState {
        WorkflowState {
            blog_url: "https://blog.test/dns".into(),
            blog_summary: "DNS is eventually consistent.".into(),
            custom_prompt: "Mention TTLs.".into(),
            ..WorkflowState::default()
        }
    }

    #[tokio::test]
    async fn test_linkedin_posts() {
        let llm = Arc::new(ScriptedGenerator::with_responses(["  teaser body ", "reference body"]));
        let generator = LinkedInGenerator::new(llm.clone(), &ValidationRules::default());
        let out = generator.run(summarized()).await;

        assert_eq!(out.linkedin_posts.len(), 2);
        assert_eq!(out.linkedin_posts[0].content, "teaser body");
        assert_eq!(out.linkedin_posts[0].char_count, 11);
        assert_eq!(out.linkedin_posts[0].post_type, MONDAY_TEASER);
        assert_eq!(out.linkedin_posts[1].scheduled_day, "Thursday");

        let prompts = llm.prompts();
        assert!(prompts[0].contains("NO LINKS"));
        assert!(prompts[0].contains("1000-1200 characters"));
        assert!(prompts[0].contains("Mention TTLs."));
        assert!(prompts[1].contains("https://blog.test/dns"));
    }

    #[tokio::test]
    async fn test_linkedin_failure_sets_error() {
        let llm = ScriptedGenerator::with_responses(["teaser"]);
        llm.push_err(GenerationError::Connection("reset".into()));
        let out = LinkedInGenerator::new(Arc::new(llm), &ValidationRules::default())
            .run(summarized())
            .await;
        assert!(out.linkedin_posts.is_empty());
        assert_eq!(
            out.error.as_deref(),
            Some("Failed to generate LinkedIn posts: LLM connection error: reset")
        );
    }

    #[tokio::test]
    async fn test_x_thread() {
        let llm = Arc::new(ScriptedGenerator::with_responses(["1/ a\n2/ b https://blog.test/dns"]));
        let out = XGenerator::new(llm.clone(), &ValidationRules::default())
            .run(summarized())
            .await;
        assert_eq!(out.x_posts.len(), 1);
        assert_eq!(out.x_posts[0].post_type, X_THREAD);
        assert!(llm.prompts()[0].contains("under 280 chars"));
    }

    #[test]
    fn test_custom_instructions_optional() {
        assert_eq!(custom_instructions("  "), "");
        assert!(custom_instructions("be brief").contains("## Custom Instructions:\nbe brief"));
    }
}
