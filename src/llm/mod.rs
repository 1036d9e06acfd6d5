//! LLM 层：文本生成抽象与实现（OpenAI 兼容 / Gemini / DeepSeek / Scripted）

pub mod mock;
pub mod openai;
pub mod providers;
pub mod traits;

pub use mock::ScriptedGenerator;
pub use openai::{OpenAiGenerator, TokenUsage};
pub use providers::{create_generator, DEEPSEEK_CHAT, GEMINI_FLASH};
pub use traits::{GenerationError, TextGenerator};
