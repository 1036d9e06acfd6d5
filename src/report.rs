//! 运行结果的文本报告（供命令行输出）

use std::fmt;

use chrono::{DateTime, Local};

use crate::content::Post;
use crate::core::{RunOutcome, WorkflowState};

const PREVIEW_CHARS: usize = 200;

/// 对最终状态的只读视图
pub struct RunReport<'a> {
    state: &'a WorkflowState,
    generated_at: DateTime<Local>,
}

impl<'a> RunReport<'a> {
    pub fn new(state: &'a WorkflowState) -> Self {
        Self {
            state,
            generated_at: Local::now(),
        }
    }

    /// 有改进版时展示改进版
    fn final_posts(&self) -> Vec<&'a Post> {
        let improved: Vec<&Post> = self.state.improved_posts().collect();
        if improved.is_empty() {
            self.state.posts().collect()
        } else {
            improved
        }
    }
}

fn preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_CHARS {
        return content.to_string();
    }
    let head: String = content.chars().take(PREVIEW_CHARS).collect();
    format!("{head}...")
}

impl fmt::Display for RunReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state;
        writeln!(f, "Content automation report ({})", self.generated_at.format("%Y-%m-%d %H:%M:%S"))?;
        let status = match state.outcome() {
            RunOutcome::Success => "success",
            RunOutcome::NeedsReview => "needs human review",
            RunOutcome::Failed => "failed",
        };
        writeln!(f, "Status: {status}")?;
        if let Some(error) = &state.error {
            writeln!(f, "Error: {error}")?;
        }
        if state.has_blog_url() {
            writeln!(f, "Blog: {}", state.blog_url)?;
        }
        writeln!(f, "Phase: {}", state.phase)?;
        writeln!(f, "Improvement iterations: {}", state.improvement_iteration_count)?;

        let posts = self.final_posts();
        writeln!(f, "\nPosts ({}):", posts.len())?;
        for post in posts {
            let score = post
                .peer_review_score
                .map(|s| format!("{s:.1}/10"))
                .unwrap_or_else(|| "n/a".to_string());
            let marker = if post.is_improved_version { " [improved]" } else { "" };
            writeln!(
                f,
                "\n[{}] {} ({}, {} chars, score {}){}",
                post.platform, post.post_type, post.scheduled_day, post.char_count, score, marker
            )?;
            writeln!(f, "{}", preview(&post.content))?;
        }

        if !state.blog_draft.is_empty() {
            writeln!(f, "\nBlog draft:\n{}", preview(&state.blog_draft))?;
        }
        if !state.validation_issues.is_empty() {
            writeln!(f, "\nValidation issues:")?;
            for issue in &state.validation_issues {
                writeln!(f, "- {issue}")?;
            }
        }
        if !state.improvement_summary.is_empty() {
            writeln!(f, "\nImprovements:")?;
            for line in &state.improvement_summary {
                writeln!(f, "- {line}")?;
            }
        }
        Ok(())
    }
}

pub fn render_report(state: &WorkflowState) -> String {
    RunReport::new(state).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Platform;

    #[test]
    fn test_preview_truncates_by_chars() {
        let long = "é".repeat(250);
        let out = preview(&long);
        assert_eq!(out.chars().count(), PREVIEW_CHARS + 3);
        assert!(out.ends_with("..."));
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_report_prefers_improved_posts() {
        let original = Post::new("original body", Platform::LinkedIn, "Monday Teaser", "Monday");
        let improved = original.improved("improved body", 8.5, vec!["hook".into()]);
        let state = WorkflowState {
            linkedin_posts: vec![original],
            improved_linkedin_posts: vec![improved],
            improvement_summary: vec!["Improved LinkedIn Monday Teaser: hook".into()],
            ..WorkflowState::default()
        };
        let report = render_report(&state);
        assert!(report.contains("Status: success"));
        assert!(report.contains("improved body"));
        assert!(!report.contains("original body"));
        assert!(report.contains("score 8.5/10) [improved]"));
        assert!(report.contains("- Improved LinkedIn Monday Teaser: hook"));
    }

    #[test]
    fn test_report_shows_error() {
        let state = WorkflowState {
            error: Some("Failed to scrape blog content: timeout".into()),
            requires_human_review: true,
            ..WorkflowState::default()
        };
        let report = render_report(&state);
        assert!(report.contains("Status: failed"));
        assert!(report.contains("Error: Failed to scrape blog content: timeout"));
    }
}
