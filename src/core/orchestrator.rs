//! 自动化编排：由配置组装输入与流水线，跑完一次完整流程
//!
//! 负责：读取 [input] 段（含笔记文件）、按 [llm] 创建生成器、按 [workflow] 选择流程形态，
//! 然后交给工作流引擎顺序执行。

use std::sync::Arc;

use crate::config::{AppConfig, InputSection};
use crate::core::{Phase, RunInputs, WorkflowState};
use crate::llm::{create_generator, TextGenerator};
use crate::sources::{BlogFetcher, FsNotesReader, NotesReader};
use crate::workflow::{PipelineBuilder, WorkflowError, WorkflowRun};

/// 把 [input] 段解析为运行输入；笔记读不到只告警，不中断
pub fn inputs_from_config(input: &InputSection, reader: &dyn NotesReader) -> RunInputs {
    let obsidian_notes = match &input.notes_path {
        Some(path) => match reader.read(path) {
            Ok(notes) => {
                tracing::info!("Loaded {} chars of notes from {}", notes.chars().count(), path.display());
                notes
            }
            Err(e) => {
                tracing::warn!("{}; continuing without notes", e);
                String::new()
            }
        },
        None => String::new(),
    };

    let phase = match input.phase.as_deref() {
        Some(raw) => raw.parse::<Phase>().unwrap_or_else(|e| {
            tracing::warn!("{}, starting from idea", e);
            Phase::Idea
        }),
        None => Phase::Idea,
    };

    RunInputs {
        idea_text: input.idea_text.trim().to_string(),
        blog_url: input.blog_url.trim().to_string(),
        obsidian_notes,
        custom_prompt: input.custom_prompt.trim().to_string(),
        phase,
    }
}

/// 使用显式注入的生成器（与可选抓取器）跑一次流程
pub async fn run_with(
    cfg: &AppConfig,
    inputs: RunInputs,
    generator: Arc<dyn TextGenerator>,
    fetcher: Option<Arc<dyn BlogFetcher>>,
) -> Result<WorkflowRun, WorkflowError> {
    let variant = cfg.workflow.variant_for(&inputs.blog_url);
    tracing::info!(variant = ?variant, blog_url = %inputs.blog_url, "Starting content automation");

    let mut builder = PipelineBuilder::from_config(cfg, variant).generator(generator.clone());
    if let Some(fetcher) = fetcher {
        builder = builder.fetcher(fetcher);
    }
    let engine = builder.build()?;
    let run = engine.run(WorkflowState::new(inputs)).await;

    let (prompt, completion, total) = generator.token_usage();
    tracing::info!(prompt, completion, total, "LLM token usage");
    Ok(run)
}

/// 按配置创建生成器与 HTTP 抓取器，跑一次完整流程
pub async fn run_automation(cfg: &AppConfig) -> Result<WorkflowRun, WorkflowError> {
    let inputs = inputs_from_config(&cfg.input, &FsNotesReader);
    let generator = create_generator(&cfg.llm);
    run_with(cfg, inputs, generator, None).await
}
