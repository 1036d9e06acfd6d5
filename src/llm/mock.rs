//! Scripted 生成器（用于测试与离线试跑，无需 API）
//!
//! 按顺序返回预置响应；队列耗尽后交给 responder 闭包，再退回 fallback 文本。
//! 记录每次收到的 prompt，便于断言调用次数与内容。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{GenerationError, TextGenerator};

type Responder = Box<dyn Fn(&str) -> Result<String, GenerationError> + Send + Sync>;

pub struct ScriptedGenerator {
    queue: Mutex<VecDeque<Result<String, GenerationError>>>,
    responder: Option<Responder>,
    fallback: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl Default for ScriptedGenerator {
    fn default() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            responder: None,
            fallback: Some("Mock response".to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 依次返回给定文本
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let generator = Self::new();
        for r in responses {
            generator.push_ok(r);
        }
        generator
    }

    /// 队列为空时按 prompt 内容决定响应
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&str) -> Result<String, GenerationError> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    /// 队列与 responder 都不可用时返回的文本；None 表示返回 EmptyResponse 错误
    pub fn with_fallback(mut self, fallback: Option<String>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn push_ok(&self, response: impl Into<String>) {
        self.lock_queue().push_back(Ok(response.into()));
    }

    pub fn push_err(&self, err: GenerationError) {
        self.lock_queue().push_back(Err(err));
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, GenerationError>>> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        if let Some(next) = self.lock_queue().pop_front() {
            return next;
        }
        if let Some(responder) = &self.responder {
            return responder(prompt);
        }
        self.fallback.clone().ok_or(GenerationError::EmptyResponse)
    }
}
