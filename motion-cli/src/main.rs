//! # Motion CLI
//!
//! 在无头文档上运行动效场景。
//!
//! ## 用法
//!
//! ```bash
//! cargo run -p motion-cli -- run scenarios/landing.json
//! cargo run -p motion-cli -- run scenarios/landing.json --reduced-motion --output report.json
//! cargo run -p motion-cli -- check scenarios/landing.json
//! cargo run -p motion-cli -- init-config --output config.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use motion_cli::{Scenario, run};
use motion_core::MotionConfig;
use tracing::{Level, info};

#[derive(Parser)]
#[command(name = "motion")]
#[command(about = "动效场景运行器 - 在无头文档上执行场景并输出报告")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件（默认：config.json，不存在时使用默认配置）
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 执行场景并输出 JSON 报告
    Run {
        /// 场景文件
        scenario: PathBuf,

        /// 覆盖场景帧率
        #[arg(long)]
        fps: Option<u32>,

        /// 以"减少动态效果"开始
        #[arg(long)]
        reduced_motion: bool,

        /// 报告输出文件（默认：标准输出）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 验证场景文件与配置
    Check {
        /// 场景文件
        scenarios: Vec<PathBuf>,
    },

    /// 写出默认配置
    InitConfig {
        /// 输出文件
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            fps,
            reduced_motion,
            output,
        } => {
            let config = load_config(&cli.config)?;
            let mut loaded = Scenario::load(&scenario)
                .with_context(|| format!("无法加载场景: {}", scenario.display()))?;
            if let Some(fps) = fps {
                loaded.fps = fps;
            }
            loaded.reduced_motion |= reduced_motion;

            let report = run(&loaded, &config)
                .with_context(|| format!("场景执行失败: {}", scenario.display()))?;
            let json = serde_json::to_string_pretty(&report).context("报告序列化失败")?;

            match output {
                Some(path) => {
                    fs::write(&path, json)
                        .with_context(|| format!("无法写入报告: {}", path.display()))?;
                    info!(path = %path.display(), "报告已写入");
                }
                None => println!("{json}"),
            }
        }
        Commands::Check { scenarios } => {
            load_config(&cli.config)?;
            if scenarios.is_empty() {
                bail!("未指定场景文件");
            }
            for path in &scenarios {
                let scenario = Scenario::load(path)
                    .with_context(|| format!("场景无效: {}", path.display()))?;
                info!(
                    path = %path.display(),
                    elements = scenario.elements.len(),
                    animations = scenario.animations.len(),
                    steps = scenario.steps.len(),
                    "场景有效"
                );
            }
        }
        Commands::InitConfig { output } => {
            MotionConfig::default()
                .save(&output)
                .with_context(|| format!("无法写入配置: {}", output.display()))?;
            info!(path = %output.display(), "默认配置已写出");
        }
    }

    Ok(())
}

/// 加载并验证配置
fn load_config(path: &Path) -> Result<MotionConfig> {
    let config = MotionConfig::load(path);
    config
        .validate()
        .with_context(|| format!("配置无效: {}", path.display()))?;
    Ok(config)
}
