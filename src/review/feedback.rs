//! 同行评审反馈：FeedbackRecord 及其解析
//!
//! 模型被要求只输出 JSON，但常会包一层 ```json 围栏；parse 先剥围栏再严格反序列化。
//! 解析失败时由调用方换成 [`FeedbackRecord::parse_failed`]，绝不做「半解析」。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 未给出 overall_score 时的默认分
pub const DEFAULT_REVIEW_SCORE: f64 = 8.0;

fn default_overall_score() -> f64 {
    DEFAULT_REVIEW_SCORE
}

/// 问题严重程度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

/// 改进优先级
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

/// 评审指出的单个问题
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewIssue {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub suggestion: String,
    #[serde(default)]
    pub example: String,
}

/// 可直接套用的修改建议
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionableEdit {
    #[serde(default)]
    pub target_quote: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub edit_text: String,
}

/// 单篇帖子的结构化评审结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    #[serde(default = "default_overall_score")]
    pub overall_score: f64,
    #[serde(default)]
    pub issues: Vec<ReviewIssue>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub actionable_edits: Vec<ActionableEdit>,
    #[serde(default)]
    pub improvement_priority: Priority,
    #[serde(default)]
    pub needs_human_review: bool,
    #[serde(default)]
    pub banlist_hits: Vec<String>,
}

#[derive(Error, Debug)]
pub enum FeedbackParseError {
    #[error("invalid review JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("overall_score out of range: {0}")]
    ScoreOutOfRange(f64),
}

impl FeedbackRecord {
    /// 解析失败时使用的中性默认反馈
    pub fn parse_failed() -> Self {
        Self {
            overall_score: DEFAULT_REVIEW_SCORE,
            issues: Vec::new(),
            strengths: vec!["Review parsing failed".to_string()],
            actionable_edits: Vec::new(),
            improvement_priority: Priority::Low,
            needs_human_review: false,
            banlist_hits: Vec::new(),
        }
    }

    /// 从模型原始输出解析（接受裸 JSON 或围栏包裹的 JSON）
    pub fn parse(raw: &str) -> Result<Self, FeedbackParseError> {
        let record: FeedbackRecord = serde_json::from_str(strip_code_fence(raw))?;
        if !record.overall_score.is_finite() || !(0.0..=10.0).contains(&record.overall_score) {
            return Err(FeedbackParseError::ScoreOutOfRange(record.overall_score));
        }
        Ok(record)
    }

    pub fn has_high_severity_issue(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::High)
    }

    /// 优先级为 medium / high 时路由会再进入改进阶段
    pub fn wants_another_pass(&self) -> bool {
        matches!(self.improvement_priority, Priority::Medium | Priority::High)
    }
}

/// 去掉 ``` / ```json 围栏；没有围栏时原样返回（已 trim）
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.trim_start_matches("json"),
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}
