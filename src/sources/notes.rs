//! 笔记读取：NotesReader 边界与文件系统实现
//!
//! Obsidian 笔记清洗：`![[embed]]` 删除，`[[link]]` 保留文字，`#tag` 删除，空白压缩。

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::sources::collapse_whitespace;

#[derive(Error, Debug)]
pub enum NotesError {
    #[error("Notes file not found: {0}")]
    NotFound(String),
    #[error("Failed to read notes: {0}")]
    Io(#[from] std::io::Error),
}

/// 读取并返回清洗后的笔记正文
pub trait NotesReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<String, NotesError>;
}

static EMBED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[\[(.*?)\]\]").expect("embed regex"));
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[(.*?)\]\]").expect("link regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#\w+").expect("tag regex"));

pub fn clean_obsidian_notes(raw: &str) -> String {
    let text = EMBED_RE.replace_all(raw, "");
    let text = LINK_RE.replace_all(&text, "$1");
    let text = TAG_RE.replace_all(&text, "");
    collapse_whitespace(&text)
}

#[derive(Debug, Default)]
pub struct FsNotesReader;

impl NotesReader for FsNotesReader {
    fn read(&self, path: &Path) -> Result<String, NotesError> {
        if !path.exists() {
            return Err(NotesError::NotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(clean_obsidian_notes(&raw))
    }
}
