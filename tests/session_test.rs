//! 会话级集成测试：用脚本化 Oracle 精确驱动状态机走过各终止路径

use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use reagent::config::AppConfig;
use reagent::core::{AgentError, OracleError};
use reagent::memory::SessionArena;
use reagent::oracle::ScriptedOracle;
use reagent::reason::{
    ControlMode, Problem, ReasonSession, SessionConfig, Strategy, TerminationReason,
};
use reagent::tools::{
    CalculatorTool, DateTimeTool, MarkdownReportTool, TextAnalysisTool, ToolExecutor, ToolRegistry,
};

fn make_executor(workspace: &std::path::Path) -> ToolExecutor {
    let mut registry = ToolRegistry::new();
    registry.register(CalculatorTool);
    registry.register(DateTimeTool);
    registry.register(TextAnalysisTool);
    registry.register(MarkdownReportTool::new(workspace));
    ToolExecutor::new(Arc::new(registry), 5)
}

fn analysis_response(complexity: &str) -> String {
    json!({
        "complexity": complexity,
        "reasoning": "测试场景",
        "estimated_steps": 3,
        "required_tools": [],
        "success_criteria": "答案正确"
    })
    .to_string()
}

fn continue_response(thought: &str) -> String {
    json!({ "thought": thought }).to_string()
}

fn final_answer_response(thought: &str, answer: &str) -> String {
    json!({ "thought": thought, "final_answer": answer }).to_string()
}

fn tool_call_response(thought: &str, tool: &str, args: serde_json::Value) -> String {
    json!({ "thought": thought, "tool": tool, "args": args }).to_string()
}

/// 简单问题：第一轮即给出最终答案，预算维持策略默认值
#[tokio::test]
async fn test_simple_problem_completes_in_one_iteration() {
    let dir = tempfile::tempdir().unwrap();
    let oracle = Arc::new(ScriptedOracle::new([
        analysis_response("SIMPLE"),
        final_answer_response("2+2 显然等于 4", "4"),
    ]));
    let session = ReasonSession::new(oracle, make_executor(dir.path()), AppConfig::default());

    let session_cfg = SessionConfig {
        control_mode: ControlMode::Strict,
        ..SessionConfig::default()
    };
    let mut arena = SessionArena::new();
    let result = session
        .run_session(&Problem::new("what is 2+2"), &session_cfg, &mut arena)
        .await
        .unwrap();

    assert_eq!(result.termination_reason, TerminationReason::Completed);
    assert_eq!(result.final_answer, "4");
    assert_eq!(result.iterations_used, 1);
    assert_eq!(result.chain.len(), 1);
    assert_eq!(result.strategy_used, Strategy::Focused);
    assert_eq!(arena.get("complexity"), Some("simple"));
    assert_eq!(arena.get("strategy"), Some("focused"));
}

/// 灵活模式下 Oracle 永远不收敛：恰好在安全上限处以 budget_exhausted 终止
#[tokio::test]
async fn test_flexible_mode_terminates_exactly_at_ceiling() {
    let dir = tempfile::tempdir().unwrap();
    let oracle = Arc::new(ScriptedOracle::new([analysis_response("MEDIUM")]));
    for i in 0..20 {
        oracle.push(continue_response(&format!("还在想（第 {i} 次）")));
    }
    let session = ReasonSession::new(oracle, make_executor(dir.path()), AppConfig::default());

    let session_cfg = SessionConfig {
        control_mode: ControlMode::Flexible,
        safety_ceiling: 10,
        ..SessionConfig::default()
    };
    let mut arena = SessionArena::new();
    let result = session
        .run_session(&Problem::new("一个永远想不完的问题"), &session_cfg, &mut arena)
        .await
        .unwrap();

    assert_eq!(result.termination_reason, TerminationReason::BudgetExhausted);
    assert_eq!(result.iterations_used, 10);
    assert_eq!(result.chain.len(), 10);
    // 兜底答案来自最后一条思考（Continue 步没有观察）
    assert!(result.final_answer.contains("还在想"));
}

/// 工具失败不是致命错误：错误文本记为观察，会话照常收敛
#[tokio::test]
async fn test_tool_failures_become_observations() {
    let dir = tempfile::tempdir().unwrap();
    let oracle = Arc::new(ScriptedOracle::new([
        analysis_response("MEDIUM"),
        tool_call_response("先算一下", "calculate_math", json!({"expression": "1/0"})),
        tool_call_response("换个工具试试", "ghost_tool", json!({})),
        final_answer_response("工具都失败了，用已知知识回答", "基于已有知识的答案"),
    ]));
    let session = ReasonSession::new(oracle, make_executor(dir.path()), AppConfig::default());

    let mut arena = SessionArena::new();
    let result = session
        .run_session(
            &Problem::new("需要两次工具调用的问题"),
            &SessionConfig::default(),
            &mut arena,
        )
        .await
        .unwrap();

    assert_eq!(result.termination_reason, TerminationReason::Completed);
    assert_eq!(result.chain.len(), 3);
    assert_eq!(result.iterations_used, 3);
    for step in &result.chain[..2] {
        let obs = step.observation.as_deref().unwrap();
        assert!(obs.starts_with("Error:"), "expected error observation, got {obs}");
    }
    assert_eq!(result.final_answer, "基于已有知识的答案");
}

/// 连续幻觉工具名：每次都记为错误观察，会话仍正常收敛
#[tokio::test]
async fn test_repeated_unknown_tools_do_not_derail_session() {
    let dir = tempfile::tempdir().unwrap();
    let oracle = Arc::new(ScriptedOracle::new([analysis_response("COMPLEX")]));
    for i in 0..3 {
        oracle.push(tool_call_response(
            "再试一个工具",
            &format!("ghost_{i}"),
            json!({}),
        ));
    }
    oracle.push(tool_call_response(
        "换真实工具",
        "calculate_math",
        json!({"expression": "6 * 7"}),
    ));
    oracle.push(final_answer_response("得到结果", "42"));
    let session = ReasonSession::new(oracle, make_executor(dir.path()), AppConfig::default());

    let mut arena = SessionArena::new();
    let result = session
        .run_session(
            &Problem::new("一个会诱发幻觉工具名的问题"),
            &SessionConfig::default(),
            &mut arena,
        )
        .await
        .unwrap();

    assert_eq!(result.termination_reason, TerminationReason::Completed);
    assert_eq!(result.chain.len(), 5);
    for step in &result.chain[..3] {
        assert!(step.observation.as_deref().unwrap().starts_with("Error:"));
    }
    assert!(result.chain[3]
        .observation
        .as_deref()
        .unwrap()
        .contains("42"));
}

/// 严格模式：即使观察内容充足也绝不扩展预算
#[tokio::test]
async fn test_strict_mode_never_extends() {
    let dir = tempfile::tempdir().unwrap();
    let oracle = Arc::new(ScriptedOracle::new([analysis_response("MEDIUM")]));
    // Sequential 默认 6 轮，每轮都拿到远超阈值长度的观察
    let long_text = "联系 alice@example.com 或 bob@example.com，详见 https://example.com/docs 。";
    for _ in 0..6 {
        oracle.push(tool_call_response(
            "继续分析文本",
            "analyze_text",
            json!({ "text": long_text }),
        ));
    }
    let session = ReasonSession::new(oracle, make_executor(dir.path()), AppConfig::default());

    let session_cfg = SessionConfig {
        control_mode: ControlMode::Strict,
        ..SessionConfig::default()
    };
    let mut arena = SessionArena::new();
    let result = session
        .run_session(&Problem::new("分析这段文本"), &session_cfg, &mut arena)
        .await
        .unwrap();

    assert_eq!(result.termination_reason, TerminationReason::BudgetExhausted);
    assert_eq!(result.iterations_used, 6);
    assert_eq!(result.chain.len(), 6);
    // 兜底答案用最近的有效观察
    assert!(result.final_answer.contains("alice@example.com"));
}

/// 智能模式：近期观察充足时扩展一次，随后无进展则在扩展后的上限终止
#[tokio::test]
async fn test_intelligent_mode_extends_then_stops() {
    let dir = tempfile::tempdir().unwrap();
    let oracle = Arc::new(ScriptedOracle::new([analysis_response("SIMPLE")]));
    let long_text = "联系 alice@example.com 或 bob@example.com，详见 https://example.com/docs 。";
    // Focused 默认 5 轮（auto_adjust 关闭），全部产生长观察
    for _ in 0..5 {
        oracle.push(tool_call_response(
            "继续分析",
            "analyze_text",
            json!({ "text": long_text }),
        ));
    }
    // 扩展到 min(5+2, 7) = 7 后的两轮只剩空想
    oracle.push(continue_response("没有新信息"));
    oracle.push(continue_response("还是没有新信息"));
    let session = ReasonSession::new(oracle, make_executor(dir.path()), AppConfig::default());

    let session_cfg = SessionConfig {
        control_mode: ControlMode::Intelligent,
        auto_adjust: false,
        safety_ceiling: 7,
        ..SessionConfig::default()
    };
    let mut arena = SessionArena::new();
    let result = session
        .run_session(&Problem::new("持续分析"), &session_cfg, &mut arena)
        .await
        .unwrap();

    assert_eq!(result.termination_reason, TerminationReason::BudgetExhausted);
    assert_eq!(result.iterations_used, 7);
    assert_eq!(result.chain.len(), 7);
    assert_eq!(arena.get("budget/max"), Some("7"));
}

/// 连续 Oracle 失败达到阈值：终止并保留前两次的保守恢复步
#[tokio::test]
async fn test_consecutive_oracle_failures_terminate() {
    let dir = tempfile::tempdir().unwrap();
    let oracle = Arc::new(ScriptedOracle::new([analysis_response("MEDIUM")]));
    for _ in 0..3 {
        oracle.push_err(OracleError::Transport("connection refused".to_string()));
    }
    let session = ReasonSession::new(oracle, make_executor(dir.path()), AppConfig::default());

    let mut arena = SessionArena::new();
    let result = session
        .run_session(
            &Problem::new("任何问题"),
            &SessionConfig::default(),
            &mut arena,
        )
        .await
        .unwrap();

    assert_eq!(result.termination_reason, TerminationReason::OracleFailure);
    // 第三次失败触发终止，前两次各记一条保守 Continue 步
    assert_eq!(result.chain.len(), 2);
    assert_eq!(result.iterations_used, 2);
    assert!(result.chain[0].thought.contains("Oracle 调用失败"));
}

/// 单次失败后恢复：失败计数被成功轮清零
#[tokio::test]
async fn test_oracle_failure_recovers_on_success() {
    let dir = tempfile::tempdir().unwrap();
    let oracle = Arc::new(ScriptedOracle::new([analysis_response("SIMPLE")]));
    oracle.push_err(OracleError::Transport("blip".to_string()));
    oracle.push(final_answer_response("恢复后作答", "42"));
    let session = ReasonSession::new(oracle, make_executor(dir.path()), AppConfig::default());

    let mut arena = SessionArena::new();
    let result = session
        .run_session(
            &Problem::new("什么是一切的答案"),
            &SessionConfig::default(),
            &mut arena,
        )
        .await
        .unwrap();

    assert_eq!(result.termination_reason, TerminationReason::Completed);
    assert_eq!(result.final_answer, "42");
    assert_eq!(result.chain.len(), 2);
}

/// 预先取消的令牌：不进入任何推理轮，干净返回 Cancelled
#[tokio::test]
async fn test_cancellation_before_first_iteration() {
    let dir = tempfile::tempdir().unwrap();
    let oracle = Arc::new(ScriptedOracle::new([analysis_response("SIMPLE")]));
    let token = CancellationToken::new();
    token.cancel();
    let session = ReasonSession::new(oracle, make_executor(dir.path()), AppConfig::default())
        .with_cancel_token(token);

    let mut arena = SessionArena::new();
    let result = session
        .run_session(
            &Problem::new("来不及想的问题"),
            &SessionConfig::default(),
            &mut arena,
        )
        .await
        .unwrap();

    assert_eq!(result.termination_reason, TerminationReason::Cancelled);
    assert_eq!(result.iterations_used, 0);
    assert!(result.chain.is_empty());
}

/// 空注册表与非法上限都在做任何工作之前拒绝
#[tokio::test]
async fn test_config_errors_fail_fast() {
    let dir = tempfile::tempdir().unwrap();
    let empty_executor = ToolExecutor::new(Arc::new(ToolRegistry::new()), 5);
    let oracle = Arc::new(ScriptedOracle::default());
    let session = ReasonSession::new(oracle, empty_executor, AppConfig::default());
    let err = session
        .run_session(
            &Problem::new("问题"),
            &SessionConfig::default(),
            &mut SessionArena::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::ConfigError(_)));

    // 上限低于最小策略默认值
    let oracle = Arc::new(ScriptedOracle::default());
    let session = ReasonSession::new(oracle, make_executor(dir.path()), AppConfig::default());
    let session_cfg = SessionConfig {
        safety_ceiling: 2,
        ..SessionConfig::default()
    };
    let err = session
        .run_session(&Problem::new("问题"), &session_cfg, &mut SessionArena::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::ConfigError(_)));

    // 非法信心度阈值覆盖
    let oracle = Arc::new(ScriptedOracle::default());
    let session = ReasonSession::new(oracle, make_executor(dir.path()), AppConfig::default());
    let session_cfg = SessionConfig {
        confidence_threshold_override: Some(1.5),
        ..SessionConfig::default()
    };
    let err = session
        .run_session(&Problem::new("问题"), &session_cfg, &mut SessionArena::new())
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::ConfigError(_)));
}

/// 产物类问题端到端：计算后调用报告工具落盘，文件真实存在
#[tokio::test]
async fn test_artifact_problem_writes_report() {
    let dir = tempfile::tempdir().unwrap();
    let analysis = json!({
        "complexity": "MEDIUM",
        "reasoning": "需要计算并产出报告",
        "estimated_steps": 3,
        "required_tools": ["calculate_math", "create_markdown_report"],
        "success_criteria": "报告已生成"
    })
    .to_string();
    let oracle = Arc::new(ScriptedOracle::new([
        analysis,
        tool_call_response("先算圆面积", "calculate_math", json!({"expression": "3.14 * 5 * 5"})),
        tool_call_response(
            "把结果写入报告",
            "create_markdown_report",
            json!({
                "filename": "area",
                "title": "圆面积计算",
                "content": "面积为 78.5"
            }),
        ),
        final_answer_response("报告已生成", "面积为 78.5，报告见 area.md"),
    ]));
    let session = ReasonSession::new(oracle, make_executor(dir.path()), AppConfig::default());

    let mut arena = SessionArena::new();
    let result = session
        .run_session(
            &Problem::new("计算半径为 5 的圆面积并生成 report.md"),
            &SessionConfig::default(),
            &mut arena,
        )
        .await
        .unwrap();

    assert_eq!(result.termination_reason, TerminationReason::Completed);
    assert_eq!(result.chain.len(), 3);
    assert!(result.chain[0]
        .observation
        .as_deref()
        .unwrap()
        .contains("78.5"));
    assert!(dir.path().join("area.md").exists());
}
