//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `REAGENT__*` 覆盖（双下划线表示嵌套，
//! 如 `REAGENT__SESSION__CONTROL_MODE=strict`）。可调的策略常量（观察长度阈值、
//! 回看窗口、扩展步长、产物关键词等）全部集中在这里，不散落为字面量。

use std::path::PathBuf;

use serde::Deserialize;

use crate::reason::types::ControlMode;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub budget: BudgetSection,
    #[serde(default)]
    pub strategy: StrategySection,
    #[serde(default)]
    pub analysis: AnalysisSection,
    #[serde(default)]
    pub oracle: OracleSection,
    #[serde(default)]
    pub tools: ToolsSection,
}

/// [session] 段：控制模式、安全上限与 Oracle 连续失败阈值
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub control_mode: ControlMode,
    /// 迭代数安全上限，任何模式都不允许超过
    pub safety_ceiling: u32,
    /// 是否按复杂度自动调整预算
    pub auto_adjust: bool,
    /// 连续 Oracle 失败达到该次数则终止会话
    pub oracle_failure_threshold: u32,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            control_mode: ControlMode::Intelligent,
            safety_ceiling: 40,
            auto_adjust: true,
            oracle_failure_threshold: 3,
        }
    }
}

/// [budget] 段：智能模式扩展启发式的可调常量
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BudgetSection {
    /// 智能模式基础迭代数（乘以复杂度乘数）
    pub base_iterations: u32,
    /// 判断扩展时回看的链步数
    pub extension_lookback: usize,
    /// 观察结果超过该字符数才视为「仍有进展」
    pub extension_min_observation_chars: usize,
    /// 每次扩展追加的迭代数
    pub extension_step: u32,
    /// 检测到产物生成/复杂计算信号时的固定追加
    pub artifact_extension: u32,
}

impl Default for BudgetSection {
    fn default() -> Self {
        Self {
            base_iterations: 6,
            extension_lookback: 2,
            extension_min_observation_chars: 50,
            extension_step: 2,
            artifact_extension: 5,
        }
    }
}

/// [strategy] 段：各策略默认迭代数与覆盖条件阈值
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StrategySection {
    pub sequential_iterations: u32,
    pub parallel_iterations: u32,
    pub hierarchical_iterations: u32,
    pub adaptive_iterations: u32,
    pub focused_iterations: u32,
    pub exploratory_iterations: u32,
    /// 剩余时间低于该秒数视为时间紧迫
    pub time_pressure_secs: u64,
    /// 工具调用上限低于该值视为受限
    pub min_tool_call_limit: usize,
}

impl Default for StrategySection {
    fn default() -> Self {
        Self {
            sequential_iterations: 6,
            parallel_iterations: 4,
            hierarchical_iterations: 8,
            adaptive_iterations: 10,
            focused_iterations: 5,
            exploratory_iterations: 12,
            time_pressure_secs: 300,
            min_tool_call_limit: 5,
        }
    }
}

/// [analysis] 段：产物/计算信号关键词与观察有效性阈值
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    /// 命中则视为「需要生成文件/报告」，复杂度提升一级
    pub artifact_keywords: Vec<String>,
    /// 命中则视为「需要复杂计算」（智能模式追加预算）
    pub calculation_keywords: Vec<String>,
    /// 观察结果超过该字符数才计入有效观察
    pub min_valid_observation_chars: usize,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            artifact_keywords: vec![
                "保存".into(),
                "生成".into(),
                "创建".into(),
                "报告".into(),
                "save".into(),
                "create".into(),
                "generate".into(),
                "report".into(),
                ".md".into(),
                ".pdf".into(),
                ".doc".into(),
                ".txt".into(),
                ".json".into(),
                ".html".into(),
                ".csv".into(),
            ],
            calculation_keywords: vec![
                "计算".into(),
                "推导".into(),
                "calculate".into(),
                "compute".into(),
                "derive".into(),
            ],
            min_valid_observation_chars: 20,
        }
    }
}

/// [oracle] 段：后端选择与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OracleSection {
    /// 后端：openai / mock；无 API Key 时自动退回 mock
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    /// 单次 Oracle 调用超时（秒）
    pub request_timeout_secs: u64,
}

impl Default for OracleSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            request_timeout_secs: 60,
        }
    }
}

/// [tools] 段：工件输出目录与工具超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsSection {
    /// 报告类工具的输出根目录，未设置时用 ./workspace
    pub workspace_root: Option<PathBuf>,
    /// 单次工具调用超时（秒）
    pub tool_timeout_secs: u64,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            workspace_root: None,
            tool_timeout_secs: 30,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session: SessionSection::default(),
            budget: BudgetSection::default(),
            strategy: StrategySection::default(),
            analysis: AnalysisSection::default(),
            oracle: OracleSection::default(),
            tools: ToolsSection::default(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 REAGENT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 REAGENT__*（双下划线表示嵌套键）
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
        config::Environment::with_prefix("REAGENT")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
