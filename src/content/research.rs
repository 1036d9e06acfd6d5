//! 素材阶段：抓取博客、并入笔记、生成摘要

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::{StageError, WorkflowState};
use crate::llm::TextGenerator;
use crate::sources::BlogFetcher;
use crate::workflow::{Stage, StageNode};

/// 抓取博客正文到 `blog_content`
pub struct Scraper {
    fetcher: Arc<dyn BlogFetcher>,
}

impl Scraper {
    pub fn new(fetcher: Arc<dyn BlogFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl StageNode for Scraper {
    fn stage(&self) -> Stage {
        Stage::Scraper
    }

    async fn run(&self, mut state: WorkflowState) -> WorkflowState {
        if state.has_error() {
            return state;
        }
        tracing::info!(url = %state.blog_url, "Scraping blog content");
        match self.fetcher.fetch(&state.blog_url).await {
            Ok(content) => {
                tracing::info!("Successfully scraped {} characters", content.chars().count());
                state.blog_content = content;
            }
            Err(e) => state.fail(format!("Failed to scrape blog content: {}", StageError::from(e))),
        }
        state
    }
}

/// 把笔记并入 `blog_content`；没有笔记时什么也不做
#[derive(Debug, Default)]
pub struct NotesIntegrator;

impl NotesIntegrator {
    pub fn integrate(mut state: WorkflowState) -> WorkflowState {
        if state.has_error() || state.obsidian_notes.trim().is_empty() {
            return state;
        }
        state.blog_content = if state.blog_content.is_empty() {
            format!("Notes Content:\n{}", state.obsidian_notes)
        } else {
            format!("{}\n\nAdditional Notes:\n{}", state.blog_content, state.obsidian_notes)
        };
        tracing::info!("Notes integrated");
        state
    }
}

#[async_trait]
impl StageNode for NotesIntegrator {
    fn stage(&self) -> Stage {
        Stage::NotesIntegration
    }

    async fn run(&self, state: WorkflowState) -> WorkflowState {
        Self::integrate(state)
    }
}

/// 提炼摘要与要点，供后续生成使用
pub struct Summarizer {
    llm: Arc<dyn TextGenerator>,
    max_input_chars: usize,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn TextGenerator>, max_input_chars: usize) -> Self {
        Self { llm, max_input_chars }
    }

    fn prompt(&self, content: &str) -> String {
        let excerpt: String = content.chars().take(self.max_input_chars).collect();
        format!(
            "Analyze this blog post and extract key insights for social media content creation.\n\n\
             Blog Content:\n{excerpt}\n\n\
             Please provide:\n\
             1. A concise summary (100-150 words)\n\
             2. 3-5 key takeaways/insights\n\
             3. Main topic/theme\n\
             4. Target audience\n\
             5. Key statistics or claims that need validation\n\n\
             Format your response clearly with sections."
        )
    }
}

#[async_trait]
impl StageNode for Summarizer {
    fn stage(&self) -> Stage {
        Stage::Summarizer
    }

    async fn run(&self, mut state: WorkflowState) -> WorkflowState {
        if state.has_error() {
            return state;
        }
        tracing::info!("Generating blog summary and key insights");
        match self.llm.generate(&self.prompt(&state.blog_content)).await {
            Ok(summary) => state.blog_summary = summary.trim().to_string(),
            Err(e) => state.fail(format!("Failed to generate summary: {}", e)),
        }
        state
    }
}
