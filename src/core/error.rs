//! 阶段错误与错误分类
//!
//! 阶段内部失败统一为 StageError，由阶段边界转成带前缀的字符串写入 `state.error`；
//! RecoveryAgent 再按关键字把错误字符串归入 ErrorClass（只影响诊断信息）。

use thiserror::Error;

use crate::llm::GenerationError;
use crate::sources::{FetchError, NotesError};

/// 阶段内部可能出现的失败
#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Notes(#[from] NotesError),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Workflow exceeded {0} stage executions")]
    StepLimit(usize),
}

/// 错误大类（仅用于诊断提示，不影响控制流）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 超时 / 连接类，稍后重试即可
    Transient,
    /// API / 凭据类
    Credentials,
    Unknown,
}

impl ErrorClass {
    /// 按大小写不敏感的关键字归类
    pub fn classify(error: &str) -> Self {
        let lower = error.to_lowercase();
        if lower.contains("timeout") || lower.contains("connection") {
            ErrorClass::Transient
        } else if lower.contains("api") {
            ErrorClass::Credentials
        } else {
            ErrorClass::Unknown
        }
    }

    pub fn diagnosis(&self) -> &'static str {
        match self {
            ErrorClass::Transient => "Network issue detected, consider retrying later",
            ErrorClass::Credentials => "API issue detected, check API key and quota",
            ErrorClass::Unknown => "Unknown error, manual intervention required",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(ErrorClass::classify("Request TIMEOUT after 30s"), ErrorClass::Transient);
        assert_eq!(ErrorClass::classify("connection refused"), ErrorClass::Transient);
        assert_eq!(ErrorClass::classify("API error: invalid key"), ErrorClass::Credentials);
        assert_eq!(ErrorClass::classify("something odd"), ErrorClass::Unknown);
    }

    #[test]
    fn test_timeout_wins_over_api() {
        assert_eq!(ErrorClass::classify("api timeout"), ErrorClass::Transient);
    }

    #[test]
    fn test_stage_error_messages() {
        let err = StageError::from(GenerationError::Timeout);
        assert!(err.to_string().to_lowercase().contains("timeout"));
        assert_eq!(
            StageError::StepLimit(64).to_string(),
            "Workflow exceeded 64 stage executions"
        );
    }
}
