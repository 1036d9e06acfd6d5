//! Postflow - 内容自动化命令行
//!
//! 入口：初始化日志、加载配置、跑一次流水线并打印报告；退出码区分成功 / 需复核 / 失败。

use std::path::PathBuf;

use anyhow::Context;
use postflow::config::{load_config, AppConfig};
use postflow::{core::run_automation, report::render_report};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    // 可选参数：额外的配置文件路径
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = load_config(config_path).unwrap_or_else(|e| {
        tracing::warn!("Failed to load config ({}), using defaults", e);
        AppConfig::default()
    });

    let run = run_automation(&cfg).await.context("Failed to assemble pipeline")?;
    tracing::debug!(path = ?run.path, "stages visited");

    println!("{}", render_report(&run.state));
    std::process::exit(run.state.outcome().exit_code());
}
