//! 博客抓取：BlogFetcher 边界与 HTTP 实现
//!
//! GET 请求带超时与浏览器 User-Agent；非 2xx 视为失败。
//! 正文优先取 <article> / <main>，用 html2text 转为可读文本并压缩空白，
//! 输出格式固定为 `Title: {title}\n\nContent: {content}`。

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use html2text::from_read;
use regex::Regex;
use reqwest::Client;
use thiserror::Error;

/// 抓取失败（网络、HTTP 状态、超时统一为一种错误）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Missing blog URL")]
    MissingUrl,
    #[error("Request timeout fetching {0}")]
    Timeout(String),
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("Failed to read body: {0}")]
    Body(String),
    #[error("Invalid HTTP client settings: {0}")]
    Client(String),
}

/// 取回已清洗的文章正文
#[async_trait]
pub trait BlogFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title regex"));
static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").expect("h1 regex"));
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag regex"));
static NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|nav|footer|header)\b[^>]*>.*?</(script|style|nav|footer|header)>")
        .expect("noise regex")
});
static CONTAINER_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["article", "main"]
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>(.*)</{tag}>")).expect("container regex")
        })
        .collect()
});

/// 压缩连续空白为单个空格
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 从 HTML 中取标题（<title> 优先，其次 <h1>）
fn extract_title(html: &str) -> Option<String> {
    [&*TITLE_RE, &*H1_RE].iter().find_map(|re| {
        re.captures(html)
            .map(|c| collapse_whitespace(&TAG_RE.replace_all(&c[1], " ")))
            .filter(|t| !t.is_empty())
    })
}

/// 将整页 HTML 转为 `Title: … Content: …` 形式的文本
pub fn html_to_article(html: &str) -> String {
    let title = extract_title(html).unwrap_or_else(|| "Blog Post".to_string());
    let cleaned = NOISE_RE.replace_all(html, " ");
    let body = CONTAINER_RES
        .iter()
        .find_map(|re| re.captures(&cleaned).map(|c| c[1].to_string()))
        .unwrap_or_else(|| cleaned.to_string());

    let text = match from_read(body.as_bytes(), 120) {
        Ok(text) if !text.trim().is_empty() => text,
        _ => TAG_RE.replace_all(&body, " ").to_string(),
    };
    format!("Title: {}\n\nContent: {}", title, collapse_whitespace(&text))
}

/// 基于 reqwest 的抓取实现
pub struct HttpBlogFetcher {
    client: Client,
}

impl HttpBlogFetcher {
    /// 超时或 User-Agent 不合法时返回错误，而不是退回默认客户端
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BlogFetcher for HttpBlogFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(FetchError::MissingUrl);
        }
        tracing::info!(url = %url, "fetching blog content");

        let resp = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Connection(e.to_string())
            }
        })?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?;

        // 去除 BOM
        let body = body.strip_prefix('\u{FEFF}').unwrap_or(&body);
        Ok(html_to_article(body))
    }
}

/// 固定返回给定文本（测试与离线试跑用）
pub struct StaticBlogFetcher {
    result: Result<String, FetchError>,
}

impl StaticBlogFetcher {
    pub fn new(article: impl Into<String>) -> Self {
        Self {
            result: Ok(article.into()),
        }
    }

    pub fn failing(err: FetchError) -> Self {
        Self { result: Err(err) }
    }
}

#[async_trait]
impl BlogFetcher for StaticBlogFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if url.trim().is_empty() {
            return Err(FetchError::MissingUrl);
        }
        self.result.clone()
    }
}
