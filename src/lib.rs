//! Postflow - 博客到社媒帖子的内容流水线
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **content**: 帖子模型、素材整理、生成、规划与规则校验
//! - **core**: 运行状态、阶段错误、恢复与自动化编排
//! - **llm**: 文本生成抽象与实现（OpenAI 兼容 / Scripted）
//! - **report**: 运行结果文本报告
//! - **review**: 同行评审、改写与自评
//! - **sources**: 博客抓取与 Obsidian 笔记读取
//! - **workflow**: 阶段转移图与顺序执行引擎

pub mod config;
pub mod content;
pub mod core;
pub mod llm;
pub mod report;
pub mod review;
pub mod sources;
pub mod workflow;

pub use crate::core::{RunOutcome, WorkflowState};
pub use workflow::{PipelineBuilder, Stage, Variant};
