//! ContentValidator：规则校验 + 一次 LLM 断言检查
//!
//! 每条命中的规则同时追加到所属帖子的 validation_notes 与 `state.validation_issues`
//! （前者是逐帖细节，后者是扁平审计记录）。不去重：重复校验会重复追加。
//! 校验从不改动帖子正文与 char_count。

use std::sync::Arc;

use async_trait::async_trait;

use crate::content::{Platform, Post, PostKind};
use crate::core::WorkflowState;
use crate::llm::TextGenerator;
use crate::workflow::{Stage, StageNode};

/// 闭区间字符数窗口
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthWindow {
    pub min: usize,
    pub max: usize,
}

impl LengthWindow {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, len: usize) -> bool {
        (self.min..=self.max).contains(&len)
    }
}

/// 规则集
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRules {
    pub teaser_window: LengthWindow,
    pub reference_window: LengthWindow,
    pub max_line_chars: usize,
    pub team_pronouns: Vec<String>,
    pub role_phrases: Vec<String>,
    pub check_claims: bool,
}

impl Default for ValidationRules {
    fn default() -> Self {
        crate::config::ValidationSection::default().rules()
    }
}

const TEAM_VOICE_ISSUE: &str = "Team-voice pronouns detected (use individual practitioner voice)";
const ROLE_MOTIVE_ISSUE: &str =
    "Explicit role/motive statement detected (omit explicit self-description/motives)";

impl ValidationRules {
    /// 单篇帖子的确定性规则检查；返回命中的问题描述
    pub fn check_post(&self, post: &Post, blog_url: &str) -> Vec<String> {
        let mut issues = Vec::new();
        let url = blog_url.trim().to_lowercase();
        let content = post.content.to_lowercase();

        match post.kind() {
            PostKind::Teaser => {
                self.check_window(post, self.teaser_window, &mut issues);
                if !url.is_empty() && content.contains(&url) {
                    issues.push(format!(
                        "LinkedIn {} contains link (should not have links)",
                        post.post_type
                    ));
                }
            }
            PostKind::BlogReference => {
                self.check_window(post, self.reference_window, &mut issues);
                if !content.contains(&url) {
                    issues.push(format!("LinkedIn {} missing blog URL", post.post_type));
                }
            }
            PostKind::Thread | PostKind::Other => {}
        }

        if post.platform == Platform::X {
            let lines = post.content.lines().map(str::trim).filter(|l| !l.is_empty());
            for (idx, line) in lines.enumerate() {
                let len = line.chars().count();
                if len > self.max_line_chars {
                    issues.push(format!(
                        "X thread line {} too long: {} chars (max {})",
                        idx + 1,
                        len,
                        self.max_line_chars
                    ));
                }
            }
        }

        let padded = format!(" {} ", content);
        if self
            .team_pronouns
            .iter()
            .any(|p| padded.contains(&format!(" {} ", p.to_lowercase())))
        {
            issues.push(TEAM_VOICE_ISSUE.to_string());
        }
        if self
            .role_phrases
            .iter()
            .any(|p| padded.contains(&p.to_lowercase()))
        {
            issues.push(ROLE_MOTIVE_ISSUE.to_string());
        }

        issues
    }

    fn check_window(&self, post: &Post, window: LengthWindow, issues: &mut Vec<String>) {
        if !window.contains(post.char_count) {
            issues.push(format!(
                "LinkedIn {} post length issue: {} chars (should be {}-{})",
                post.post_type, post.char_count, window.min, window.max
            ));
        }
    }
}

/// 断言检查的回复是否表示存在可疑内容
fn flags_concern(response: &str) -> bool {
    response.contains('⚠') || response.to_lowercase().contains("concerning")
}

fn claims_prompt(state: &WorkflowState) -> String {
    let render = |posts: &[Post]| {
        posts
            .iter()
            .enumerate()
            .map(|(i, p)| format!("[{}] {}", i + 1, p.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    };
    format!(
        "Review these social media posts for potentially unsupported claims or statements that need fact-checking.\n\n\
         LinkedIn Posts:\n{}\n\n\
         X Posts:\n{}\n\n\
         Flag any:\n\
         - Specific statistics without clear sources\n\
         - Bold claims that seem unverifiable\n\
         - Statements presented as facts that could be opinions\n\
         - Exaggerated language\n\n\
         Return a list of concerning claims that should be marked with ⚠️ for manual review.",
        render(&state.linkedin_posts),
        render(&state.x_posts)
    )
}

/// 规则校验阶段
pub struct ContentValidator {
    llm: Arc<dyn TextGenerator>,
    rules: ValidationRules,
}

impl ContentValidator {
    pub fn new(llm: Arc<dyn TextGenerator>, rules: ValidationRules) -> Self {
        Self { llm, rules }
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    pub async fn validate(&self, mut state: WorkflowState) -> WorkflowState {
        if state.has_error() {
            return state;
        }
        tracing::info!("Validating posts");
        let before = state.validation_issues.len();

        let blog_url = state.blog_url.clone();
        for post in state.linkedin_posts.iter_mut().chain(state.x_posts.iter_mut()) {
            for issue in self.rules.check_post(post, &blog_url) {
                post.add_note(issue.clone());
                state.validation_issues.push(issue);
            }
        }

        if self.rules.check_claims && state.has_posts() {
            match self.llm.generate(&claims_prompt(&state)).await {
                Ok(response) if flags_concern(&response) => {
                    state
                        .validation_issues
                        .push(format!("⚠️ Potential unsupported claims detected: {}", response));
                }
                Ok(_) => {}
                Err(e) => {
                    state.fail(format!("Validation failed: {}", e));
                    return state;
                }
            }
        }

        tracing::info!(
            "Validation complete. Found {} issues.",
            state.validation_issues.len() - before
        );
        state
    }
}

#[async_trait]
impl StageNode for ContentValidator {
    fn stage(&self) -> Stage {
        Stage::Validator
    }

    async fn run(&self, state: WorkflowState) -> WorkflowState {
        self.validate(state).await
    }
}
