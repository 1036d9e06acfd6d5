//! 文本生成抽象
//!
//! 所有后端（OpenAI 兼容 / Gemini / DeepSeek / Scripted）实现 TextGenerator：给定 prompt 返回纯文本。
//! 调用方不能假设返回的一定是合法结构化数据。

use async_trait::async_trait;
use thiserror::Error;

/// 生成失败（传输 / 鉴权 / 空响应）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("LLM request timeout")]
    Timeout,

    #[error("LLM connection error: {0}")]
    Connection(String),

    #[error("LLM API error: {0}")]
    Api(String),

    #[error("LLM returned an empty response")]
    EmptyResponse,

    #[error("Invalid LLM request: {0}")]
    InvalidRequest(String),
}

/// 无状态的请求 / 响应式文本补全
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// 累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
