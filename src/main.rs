//! ReAgent - 多轮推理编排引擎
//!
//! 入口：初始化日志与配置，装配工具注册表与 Oracle，从命令行读取问题并运行一次会话。

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reagent::config::load_config;
use reagent::memory::SessionArena;
use reagent::oracle::{MockOracle, OpenAiOracle, OracleClient};
use reagent::reason::{Problem, ReasonSession, SessionConfig, SessionEvent};
use reagent::tools::{
    CalculatorTool, DateTimeTool, MarkdownReportTool, TextAnalysisTool, ToolExecutor, ToolRegistry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .init();

    let cfg = load_config(None).context("配置加载失败")?;

    let workspace = cfg
        .tools
        .workspace_root
        .clone()
        .unwrap_or_else(|| "workspace".into());
    std::fs::create_dir_all(&workspace).context("无法创建工作目录")?;

    let mut registry = ToolRegistry::new();
    registry.register(CalculatorTool);
    registry.register(DateTimeTool);
    registry.register(TextAnalysisTool);
    registry.register(MarkdownReportTool::new(&workspace));
    let executor = ToolExecutor::new(Arc::new(registry), cfg.tools.tool_timeout_secs);

    // 无 API Key 时退回 Mock，便于离线试运行
    let api_key = std::env::var("OPENAI_API_KEY").ok();
    let oracle: Arc<dyn OracleClient> = match (cfg.oracle.provider.as_str(), api_key) {
        ("openai", Some(key)) => Arc::new(OpenAiOracle::new(
            cfg.oracle.base_url.as_deref(),
            &cfg.oracle.model,
            Some(&key),
        )),
        _ => {
            tracing::warn!("未配置 OPENAI_API_KEY，使用 Mock Oracle");
            Arc::new(MockOracle)
        }
    };

    let problem_text = std::env::args()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ");
    let problem = if problem_text.is_empty() {
        Problem::new("计算半径为 5 的圆的面积，并生成一份 report.md 总结结果")
    } else {
        Problem::new(problem_text)
    };

    let session_cfg = SessionConfig {
        control_mode: cfg.session.control_mode,
        auto_adjust: cfg.session.auto_adjust,
        safety_ceiling: cfg.session.safety_ceiling,
        ..SessionConfig::default()
    };

    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                SessionEvent::StepUpdate { current, max } => {
                    println!("--- 第 {}/{} 轮 ---", current + 1, max);
                }
                SessionEvent::ThinkingContent { text } => println!("思考: {text}"),
                SessionEvent::ToolCall { tool, .. } => println!("调用工具: {tool}"),
                SessionEvent::Observation { tool, preview } => {
                    println!("观察 [{tool}]: {preview}");
                }
                SessionEvent::BudgetExtended { new_max } => {
                    println!("预算扩展至 {new_max} 轮");
                }
                _ => {}
            }
        }
    });

    let session = ReasonSession::new(oracle, executor, cfg).with_event_tx(event_tx);
    let mut arena = SessionArena::new();
    let result = session
        .run_session(&problem, &session_cfg, &mut arena)
        .await
        .context("会话运行失败")?;
    // 关闭发送端，让打印任务排空后退出
    drop(session);
    let _ = printer.await;

    println!();
    println!("策略: {}", result.strategy_used.as_str());
    println!(
        "终止原因: {} | 共 {} 轮",
        result.termination_reason.as_str(),
        result.iterations_used
    );
    println!("最终答案:\n{}", result.final_answer);

    Ok(())
}
