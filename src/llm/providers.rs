//! 后端选择：Gemini / DeepSeek / OpenAI（均为 OpenAI 兼容格式）
//!
//! - Gemini: https://generativelanguage.googleapis.com/v1beta/openai/ ，Key 取 `GEMINI_API_KEY`
//! - DeepSeek: https://api.deepseek.com ，Key 取 `DEEPSEEK_API_KEY`
//! - OpenAI: 默认端点或 `llm.base_url`，Key 取 `OPENAI_API_KEY`
//!
//! 找不到对应 Key 时退回 ScriptedGenerator，便于离线试跑。

use std::sync::Arc;

use crate::config::LlmSection;
use crate::llm::{OpenAiGenerator, ScriptedGenerator, TextGenerator};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";
pub const GEMINI_FLASH: &str = "gemini-2.5-flash";
pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

/// 某个 provider 的默认端点、默认模型与 Key 环境变量
fn preset(provider: &str) -> Option<(Option<&'static str>, &'static str, &'static str)> {
    match provider {
        "gemini" => Some((Some(GEMINI_BASE_URL), GEMINI_FLASH, "GEMINI_API_KEY")),
        "deepseek" => Some((Some(DEEPSEEK_BASE_URL), DEEPSEEK_CHAT, "DEEPSEEK_API_KEY")),
        "openai" => Some((None, OPENAI_DEFAULT_MODEL, "OPENAI_API_KEY")),
        _ => None,
    }
}

/// 根据 [llm] 配置与环境变量创建生成器
pub fn create_generator(cfg: &LlmSection) -> Arc<dyn TextGenerator> {
    let provider = cfg.provider.to_lowercase();
    let Some((default_base, default_model, key_var)) = preset(&provider) else {
        tracing::warn!("Unknown LLM provider '{}', using scripted mock generator", provider);
        return Arc::new(ScriptedGenerator::new());
    };

    let Ok(api_key) = std::env::var(key_var) else {
        tracing::warn!("{} not set, using scripted mock generator", key_var);
        return Arc::new(ScriptedGenerator::new());
    };

    let model = cfg.model.clone().unwrap_or_else(|| default_model.to_string());
    let base_url = cfg.base_url.as_deref().or(default_base);
    tracing::info!(provider = %provider, model = %model, "Using OpenAI-compatible LLM");
    Arc::new(OpenAiGenerator::new(base_url, &model, &api_key, cfg.temperature))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let (base, model, key) = preset("gemini").unwrap();
        assert_eq!(base, Some(GEMINI_BASE_URL));
        assert_eq!(model, GEMINI_FLASH);
        assert_eq!(key, "GEMINI_API_KEY");
        assert!(preset("openai").unwrap().0.is_none());
        assert!(preset("llama").is_none());
    }

    #[tokio::test]
    async fn test_unknown_provider_falls_back_to_mock() {
        let cfg = LlmSection {
            provider: "nope".into(),
            ..LlmSection::default()
        };
        let generator = create_generator(&cfg);
        assert_eq!(generator.generate("hi").await.unwrap(), "Mock response");
    }
}
