//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `POSTFLOW__*` 覆盖（双下划线表示嵌套，如 `POSTFLOW__LLM__PROVIDER=deepseek`）。
//! 所有长度窗口、阈值与迭代上限都是具名配置项，默认值即规范配置。

use std::path::PathBuf;

use serde::Deserialize;

use crate::content::validator::{LengthWindow, ValidationRules};
use crate::review::ReviewPolicy;
use crate::workflow::{Variant, WorkflowSettings};

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub fetch: FetchSection,
    pub validation: ValidationSection,
    pub review: ReviewSection,
    pub workflow: WorkflowSection,
    pub input: InputSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: String,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "postflow".to_string(),
        }
    }
}

/// [llm] 段：后端选择
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// gemini / deepseek / openai
    pub provider: String,
    /// 未设置时使用 provider 的默认模型
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: None,
            base_url: None,
            temperature: 0.7,
        }
    }
}

/// [fetch] 段：博客抓取
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
        }
    }
}

/// [validation] 段：规则校验
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValidationSection {
    pub teaser_min_chars: usize,
    pub teaser_max_chars: usize,
    pub reference_min_chars: usize,
    pub reference_max_chars: usize,
    /// X 线程单行上限
    pub max_line_chars: usize,
    /// 团队口吻代词（匹配时前后补空格）
    pub team_pronouns: Vec<String>,
    /// 自述身份 / 动机短语
    pub role_phrases: Vec<String>,
    /// 是否调用 LLM 检查无依据的断言
    pub check_claims: bool,
}

impl Default for ValidationSection {
    fn default() -> Self {
        Self {
            teaser_min_chars: 1000,
            teaser_max_chars: 1200,
            reference_min_chars: 1000,
            reference_max_chars: 1200,
            max_line_chars: 280,
            team_pronouns: ["we", "our", "us", "the team"].map(String::from).to_vec(),
            role_phrases: [
                "i'm a dev",
                "i am a dev",
                "to grow my network",
                "to increase my network",
            ]
            .map(String::from)
            .to_vec(),
            check_claims: true,
        }
    }
}

impl ValidationSection {
    pub fn rules(&self) -> ValidationRules {
        ValidationRules {
            teaser_window: LengthWindow::new(self.teaser_min_chars, self.teaser_max_chars),
            reference_window: LengthWindow::new(self.reference_min_chars, self.reference_max_chars),
            max_line_chars: self.max_line_chars,
            team_pronouns: self.team_pronouns.clone(),
            role_phrases: self.role_phrases.clone(),
            check_claims: self.check_claims,
        }
    }
}

/// [review] 段：评审、改进与自评的阈值
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReviewSection {
    /// 低于该分数要求人工复核
    pub human_review_floor: f64,
    /// 低于该分数触发改写
    pub improvement_trigger: f64,
    /// 改写目标长度容差（比例）
    pub length_tolerance: f64,
    /// 改写后乐观加分
    pub improved_score_bonus: f64,
    /// 自评均分阈值
    pub evaluation_threshold: f64,
    /// 自评时缺失分数按此计
    pub missing_score: f64,
}

impl Default for ReviewSection {
    fn default() -> Self {
        let policy = ReviewPolicy::default();
        Self {
            human_review_floor: policy.human_review_floor,
            improvement_trigger: policy.improvement_trigger,
            length_tolerance: policy.length_tolerance,
            improved_score_bonus: policy.improved_score_bonus,
            evaluation_threshold: policy.evaluation_threshold,
            missing_score: policy.missing_score,
        }
    }
}

impl ReviewSection {
    pub fn policy(&self) -> ReviewPolicy {
        ReviewPolicy {
            human_review_floor: self.human_review_floor,
            improvement_trigger: self.improvement_trigger,
            length_tolerance: self.length_tolerance,
            improved_score_bonus: self.improved_score_bonus,
            evaluation_threshold: self.evaluation_threshold,
            missing_score: self.missing_score,
        }
    }
}

/// [workflow] 段：流程形态与上限
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkflowSection {
    /// auto / blog / idea
    pub variant: String,
    pub max_improvement_iterations: u32,
    pub max_steps: usize,
    /// 摘要时截取的博客正文字符数
    pub summary_input_chars: usize,
}

impl Default for WorkflowSection {
    fn default() -> Self {
        let settings = WorkflowSettings::default();
        Self {
            variant: "auto".to_string(),
            max_improvement_iterations: settings.max_improvement_iterations,
            max_steps: settings.max_steps,
            summary_input_chars: settings.summary_input_chars,
        }
    }
}

impl WorkflowSection {
    pub fn settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            max_improvement_iterations: self.max_improvement_iterations,
            max_steps: self.max_steps,
            summary_input_chars: self.summary_input_chars,
        }
    }

    /// auto：有博客 URL 走线性博客流程，否则走 idea → publish 流程
    pub fn variant_for(&self, blog_url: &str) -> Variant {
        match self.variant.to_lowercase().as_str() {
            "blog" => Variant::BlogOnly,
            "idea" => Variant::IdeaToPublish,
            _ if blog_url.trim().is_empty() => Variant::IdeaToPublish,
            _ => Variant::BlogOnly,
        }
    }
}

/// [input] 段：本次运行的输入
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InputSection {
    pub idea_text: String,
    pub blog_url: String,
    pub notes_path: Option<PathBuf>,
    /// idea / teaser / draft / final；为空时有 URL 即 final，否则 idea
    pub phase: Option<String>,
    pub custom_prompt: String,
}

/// 从 config 目录加载配置，环境变量 POSTFLOW__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 POSTFLOW__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("POSTFLOW")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_canonical() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.validation.teaser_min_chars, 1000);
        assert_eq!(cfg.validation.reference_max_chars, 1200);
        assert_eq!(cfg.validation.max_line_chars, 280);
        assert_eq!(cfg.workflow.max_improvement_iterations, 3);
        assert_eq!(cfg.review.evaluation_threshold, 8.0);
        assert_eq!(cfg.fetch.timeout_secs, 30);
        assert_eq!(cfg.llm.provider, "gemini");
    }

    #[test]
    fn test_variant_selection() {
        let section = WorkflowSection::default();
        assert_eq!(section.variant_for("https://blog.test/a"), Variant::BlogOnly);
        assert_eq!(section.variant_for(""), Variant::IdeaToPublish);

        let forced = WorkflowSection {
            variant: "idea".into(),
            ..WorkflowSection::default()
        };
        assert_eq!(forced.variant_for("https://blog.test/a"), Variant::IdeaToPublish);
    }

    #[test]
    fn test_load_from_file_overrides_windows() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[validation]\nteaser_min_chars = 150\nteaser_max_chars = 200\n\n[workflow]\nmax_improvement_iterations = 1"
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        let rules = cfg.validation.rules();
        assert_eq!(rules.teaser_window, LengthWindow::new(150, 200));
        assert_eq!(rules.reference_window, LengthWindow::new(1000, 1200));
        assert_eq!(cfg.workflow.max_improvement_iterations, 1);
    }
}
