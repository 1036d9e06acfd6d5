//! 外部素材来源：博客抓取与笔记读取

pub mod fetcher;
pub mod notes;

pub use fetcher::{collapse_whitespace, html_to_article, BlogFetcher, FetchError, HttpBlogFetcher, StaticBlogFetcher};
pub use notes::{clean_obsidian_notes, FsNotesReader, NotesError, NotesReader};
