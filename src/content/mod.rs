//! 内容层：帖子模型、素材、生成、规划与规则校验

pub mod generation;
pub mod planning;
pub mod post;
pub mod research;
pub mod validator;

pub use generation::{LinkedInGenerator, XGenerator, MONDAY_TEASER, THURSDAY_REFERENCE, X_THREAD};
pub use planning::{BlogDrafter, IdeaCapture, PhasePlanner, TeaserGenerator};
pub use post::{Platform, Post, PostKey, PostKind};
pub use research::{NotesIntegrator, Scraper, Summarizer};
pub use validator::{ContentValidator, LengthWindow, ValidationRules};

/// 评审与改写都要避开的套话
pub const BANNED_WORDS: &[&str] = &[
    "unlock",
    "leverage",
    "cutting-edge",
    "AI-powered",
    "revolutionize",
    "game-changer",
    "drive impact",
    "elevate",
    "innovative",
];

/// 各生成 prompt 共用的口吻要求
pub const VOICE_GUIDELINES: &str = "\
- Do not use emojis
- Use ASCII sketches to visualize tough parts
- Individual practitioner voice. Avoid team pronouns (\"we\", \"our\", \"us\", \"the team\").
- Do not explicitly state role or motives (e.g., \"I'm a dev\", \"to grow my network\").";
