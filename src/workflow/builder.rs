//! 流水线构建器
//!
//! 提供流畅的API来装配工作流：选择流程形态，注入生成器、抓取器与规则，
//! 一次性注册全部阶段节点。

use std::sync::Arc;

use crate::config::AppConfig;
use crate::content::{
    BlogDrafter, ContentValidator, IdeaCapture, LinkedInGenerator, NotesIntegrator, PhasePlanner,
    Scraper, Summarizer, TeaserGenerator, ValidationRules, XGenerator,
};
use crate::core::RecoveryAgent;
use crate::llm::TextGenerator;
use crate::review::{ContentImprover, PeerReviewer, ReviewPolicy, SelfEvaluator};
use crate::sources::{BlogFetcher, HttpBlogFetcher};
use crate::workflow::engine::WorkflowEngine;
use crate::workflow::graph::WorkflowGraph;
use crate::workflow::types::*;

/// 流水线构建器
pub struct PipelineBuilder {
    variant: Variant,
    generator: Option<Arc<dyn TextGenerator>>,
    fetcher: Option<Arc<dyn BlogFetcher>>,
    rules: ValidationRules,
    policy: ReviewPolicy,
    settings: WorkflowSettings,
    fetch_timeout_secs: u64,
    user_agent: String,
}

impl PipelineBuilder {
    pub fn new(variant: Variant) -> Self {
        let fetch = crate::config::FetchSection::default();
        Self {
            variant,
            generator: None,
            fetcher: None,
            rules: ValidationRules::default(),
            policy: ReviewPolicy::default(),
            settings: WorkflowSettings::default(),
            fetch_timeout_secs: fetch.timeout_secs,
            user_agent: fetch.user_agent,
        }
    }

    /// 按配置填充规则、阈值与上限；生成器与抓取器仍需单独注入
    pub fn from_config(cfg: &AppConfig, variant: Variant) -> Self {
        let mut builder = Self::new(variant)
            .rules(cfg.validation.rules())
            .policy(cfg.review.policy())
            .settings(cfg.workflow.settings());
        builder.fetch_timeout_secs = cfg.fetch.timeout_secs;
        builder.user_agent = cfg.fetch.user_agent.clone();
        builder
    }

    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn BlogFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn rules(mut self, rules: ValidationRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn policy(mut self, policy: ReviewPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn settings(mut self, settings: WorkflowSettings) -> Self {
        self.settings = settings;
        self
    }

    /// 全部阶段节点（不含转移图）
    fn stage_nodes(
        &self,
        llm: Arc<dyn TextGenerator>,
        fetcher: Arc<dyn BlogFetcher>,
    ) -> Vec<Arc<dyn StageNode>> {
        vec![
            Arc::new(IdeaCapture),
            Arc::new(PhasePlanner),
            Arc::new(TeaserGenerator::new(llm.clone(), &self.rules)),
            Arc::new(BlogDrafter::new(llm.clone())),
            Arc::new(Scraper::new(fetcher)),
            Arc::new(NotesIntegrator),
            Arc::new(Summarizer::new(llm.clone(), self.settings.summary_input_chars)),
            Arc::new(LinkedInGenerator::new(llm.clone(), &self.rules)),
            Arc::new(XGenerator::new(llm.clone(), &self.rules)),
            Arc::new(ContentValidator::new(llm.clone(), self.rules.clone())),
            Arc::new(PeerReviewer::new(llm.clone(), self.policy)),
            Arc::new(ContentImprover::new(llm, self.policy, self.rules.clone())),
            Arc::new(SelfEvaluator::new(self.policy)),
            Arc::new(RecoveryAgent::new()),
        ]
    }

    /// 构建引擎；缺少生成器、上限为 0 或 HTTP 客户端设置不合法时报错，未注入抓取器时使用 HTTP 抓取
    pub fn build(self) -> Result<WorkflowEngine, WorkflowError> {
        let llm = self
            .generator
            .clone()
            .ok_or_else(|| WorkflowError::InvalidConfiguration("no text generator configured".into()))?;
        if self.settings.max_steps == 0 {
            return Err(WorkflowError::InvalidConfiguration("max_steps must be positive".into()));
        }
        let fetcher: Arc<dyn BlogFetcher> = match &self.fetcher {
            Some(fetcher) => fetcher.clone(),
            None => Arc::new(
                HttpBlogFetcher::new(self.fetch_timeout_secs, &self.user_agent)
                    .map_err(|e| WorkflowError::InvalidConfiguration(e.to_string()))?,
            ),
        };

        let graph = WorkflowGraph::new(self.variant, self.settings.max_improvement_iterations);
        let mut engine = WorkflowEngine::new(graph, self.settings.max_steps);
        for node in self.stage_nodes(llm, fetcher) {
            engine.register(node);
        }

        tracing::debug!(variant = ?self.variant, "pipeline assembled");
        Ok(engine)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Platform, Post};
    use crate::core::{Phase, WorkflowState};
    use crate::llm::ScriptedGenerator;
    use crate::review::{FeedbackRecord, Priority};
    use crate::sources::StaticBlogFetcher;

    const ALL_STAGES: [Stage; 14] = [
        Stage::CaptureIdea,
        Stage::Planner,
        Stage::TeaserGenerator,
        Stage::BlogDrafter,
        Stage::Scraper,
        Stage::NotesIntegration,
        Stage::Summarizer,
        Stage::LinkedInGenerator,
        Stage::XGenerator,
        Stage::Validator,
        Stage::PeerReviewer,
        Stage::ContentImprover,
        Stage::SelfEvaluator,
        Stage::Recovery,
    ];

    #[test]
    fn test_build_registers_every_stage() {
        let engine = PipelineBuilder::new(Variant::BlogOnly)
            .generator(Arc::new(ScriptedGenerator::new()))
            .fetcher(Arc::new(StaticBlogFetcher::new("article")))
            .build()
            .unwrap();
        for stage in ALL_STAGES {
            assert!(engine.has_stage(stage), "missing {stage}");
        }
        assert_eq!(engine.graph().variant(), Variant::BlogOnly);
    }

    #[test]
    fn test_build_requires_generator() {
        let err = PipelineBuilder::new(Variant::IdeaToPublish).build().err().unwrap();
        assert!(matches!(err, WorkflowError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_build_rejects_zero_steps() {
        let result = PipelineBuilder::new(Variant::BlogOnly)
            .generator(Arc::new(ScriptedGenerator::new()))
            .settings(WorkflowSettings {
                max_steps: 0,
                ..WorkflowSettings::default()
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_from_config_uses_sections() {
        let mut cfg = AppConfig::default();
        cfg.workflow.max_improvement_iterations = 1;
        let engine = PipelineBuilder::from_config(&cfg, Variant::IdeaToPublish)
            .generator(Arc::new(ScriptedGenerator::new()))
            .build()
            .unwrap();
        assert_eq!(engine.graph().entry(), Stage::CaptureIdea);
    }

    #[test]
    fn test_build_rejects_invalid_user_agent() {
        let mut cfg = AppConfig::default();
        cfg.fetch.user_agent = "bad\nagent".to_string();
        let result = PipelineBuilder::from_config(&cfg, Variant::BlogOnly)
            .generator(Arc::new(ScriptedGenerator::new()))
            .build();
        assert!(matches!(result, Err(WorkflowError::InvalidConfiguration(_))));
    }

    /// 各阶段都会有事可做的状态：有想法、笔记、摘要、帖子与反馈
    fn busy_state_with_error() -> WorkflowState {
        let teaser = Post::new("teaser", Platform::LinkedIn, "Monday Teaser", "Monday");
        let mut state = WorkflowState {
            idea_text: "DNS caching".into(),
            blog_url: "https://blog.test/dns".into(),
            obsidian_notes: "TTL notes".into(),
            phase: Phase::Teaser,
            blog_content: "article".into(),
            blog_summary: "summary".into(),
            linkedin_posts: vec![teaser.clone()],
            x_posts: vec![Post::new("1/ thread", Platform::X, "X Thread", "")],
            error: Some("upstream failure".into()),
            ..WorkflowState::default()
        };
        let record = FeedbackRecord {
            overall_score: 4.0,
            improvement_priority: Priority::High,
            ..FeedbackRecord::parse_failed()
        };
        state.peer_review_feedback.insert(teaser.key(), record);
        state
    }

    #[tokio::test]
    async fn test_every_stage_passes_error_state_through() {
        let llm = Arc::new(ScriptedGenerator::new());
        let builder = PipelineBuilder::new(Variant::IdeaToPublish);
        let nodes = builder.stage_nodes(llm.clone(), Arc::new(StaticBlogFetcher::new("fresh article")));
        assert_eq!(nodes.len(), ALL_STAGES.len());

        let input = busy_state_with_error();
        for node in nodes {
            let out = node.run(input.clone()).await;
            if node.stage() == Stage::Recovery {
                let mut expected = input.clone();
                expected.requires_human_review = true;
                assert_eq!(out, expected, "stage {}", node.stage());
            } else {
                assert_eq!(out, input, "stage {}", node.stage());
            }
        }
        assert_eq!(llm.calls(), 0);
    }
}
