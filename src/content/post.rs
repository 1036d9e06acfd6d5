//! 帖子模型：Post、平台、帖子种类与关联键
//!
//! Post 由生成阶段创建；Validator 只追加 validation_notes，从不改动正文；
//! Improver 不修改原帖，而是创建 is_improved_version=true 的新帖。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 发布平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Platform {
    LinkedIn,
    X,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "LinkedIn",
            Platform::X => "X",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 由 post_type 标签推断出的帖子种类，决定适用哪些校验规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKind {
    /// LinkedIn 预热帖：不得带链接
    Teaser,
    /// LinkedIn 博客引用帖：必须带博客链接
    BlogReference,
    /// X 线程
    Thread,
    Other,
}

/// 帖子与评审反馈的关联键：`{platform}_{post_type}`（小写，空格换下划线）
///
/// 同平台同类型的两篇帖子会得到相同的键，后写入的反馈覆盖先写入的（last-write-wins）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PostKey {
    platform: Platform,
    post_type: String,
}

impl PostKey {
    pub fn new(platform: Platform, post_type: &str) -> Self {
        Self {
            platform,
            post_type: post_type.to_lowercase().replace(' ', "_"),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }
}

impl fmt::Display for PostKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.platform.as_str().to_lowercase(), self.post_type)
    }
}

/// 单篇社媒帖子
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub content: String,
    pub platform: Platform,
    /// 自由标签，如 "Monday Teaser"、"X Thread"
    pub post_type: String,
    pub scheduled_day: String,
    /// 创建时的正文字符数，之后不再重算
    pub char_count: usize,
    pub validation_notes: Vec<String>,
    pub peer_review_score: Option<f64>,
    pub improvement_notes: Vec<String>,
    pub is_improved_version: bool,
    pub original_version_id: Option<Uuid>,
}

impl Post {
    pub fn new(
        content: impl Into<String>,
        platform: Platform,
        post_type: impl Into<String>,
        scheduled_day: impl Into<String>,
    ) -> Self {
        let content = content.into();
        Self {
            char_count: content.chars().count(),
            content,
            platform,
            post_type: post_type.into(),
            scheduled_day: scheduled_day.into(),
            validation_notes: Vec::new(),
            peer_review_score: None,
            improvement_notes: Vec::new(),
            is_improved_version: false,
            original_version_id: None,
        }
    }

    /// 基于本帖派生改进版：新正文、新字符数、新的 original_version_id，校验备注清空
    pub fn improved(&self, content: impl Into<String>, score: f64, notes: Vec<String>) -> Self {
        let mut post = Post::new(content, self.platform, self.post_type.clone(), self.scheduled_day.clone());
        post.peer_review_score = Some(score);
        post.improvement_notes = notes;
        post.is_improved_version = true;
        post.original_version_id = Some(Uuid::new_v4());
        post
    }

    pub fn key(&self) -> PostKey {
        PostKey::new(self.platform, &self.post_type)
    }

    pub fn kind(&self) -> PostKind {
        let label = self.post_type.to_lowercase();
        match self.platform {
            Platform::LinkedIn if label.contains("teaser") => PostKind::Teaser,
            Platform::LinkedIn if label.contains("reference") => PostKind::BlogReference,
            Platform::X if label.contains("thread") => PostKind::Thread,
            _ => PostKind::Other,
        }
    }

    pub fn add_note(&mut self, note: impl Into<String>) {
        self.validation_notes.push(note.into());
    }
}
