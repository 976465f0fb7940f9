//! 复杂度分析
//!
//! 会话启动时调用 Oracle 一次，解析出复杂度等级、预估步骤、推荐工具与成功标准。
//! 该组件不允许让会话失败：Oracle 出错或输出不可解析时返回默认的 Medium 结果。
//! 命中产物生成信号时复杂度提升一级、预估步骤抬高，并自动补入注册表中的
//! 产物类（late 阶段）工具，保证收尾阶段有足够预算与工具完成产出。

use std::sync::Arc;

use serde::Deserialize;

use crate::config::AnalysisSection;
use crate::memory::Message;
use crate::oracle::OracleClient;
use crate::reason::budget::ProblemSignals;
use crate::reason::types::{ComplexityAnalysis, ComplexityTier};
use crate::tools::{ToolDescriptor, ToolStage};

/// 产物信号下的最低预估步骤数（保证验证/产出环节有预算）
const ARTIFACT_MIN_STEPS: u32 = 6;
/// 默认预估步骤数（分析失败兜底）
const DEFAULT_STEPS: u32 = 3;
const DEFAULT_CRITERIA: &str = "完成问题解答";

/// 复杂度分析器：持有 Oracle 与关键词配置
pub struct ComplexityAnalyzer {
    oracle: Arc<dyn OracleClient>,
    cfg: AnalysisSection,
}

/// Oracle 返回的分析 JSON
#[derive(Debug, Deserialize)]
struct AnalysisJson {
    #[serde(default)]
    complexity: String,
    #[serde(default)]
    reasoning: String,
    #[serde(default)]
    estimated_steps: u32,
    #[serde(default)]
    required_tools: Vec<String>,
    #[serde(default)]
    success_criteria: Option<String>,
}

impl ComplexityAnalyzer {
    pub fn new(oracle: Arc<dyn OracleClient>, cfg: AnalysisSection) -> Self {
        Self { oracle, cfg }
    }

    /// 从问题文本检测产物/计算信号（预算控制器也会用到）
    pub fn detect_signals(&self, problem: &str) -> ProblemSignals {
        let lower = problem.to_lowercase();
        ProblemSignals {
            artifact: self
                .cfg
                .artifact_keywords
                .iter()
                .any(|k| lower.contains(&k.to_lowercase())),
            complex_calculation: self
                .cfg
                .calculation_keywords
                .iter()
                .any(|k| lower.contains(&k.to_lowercase())),
        }
    }

    /// 分析问题复杂度；任何失败都退化为默认结果，不中止会话
    pub async fn analyze(
        &self,
        problem: &str,
        available_tools: &[ToolDescriptor],
    ) -> ComplexityAnalysis {
        let parsed = match self.oracle.complete(&self.build_prompt(problem, available_tools)).await
        {
            Ok(output) => match parse_analysis(&output) {
                Some(a) => a,
                None => {
                    tracing::warn!("复杂度分析输出不可解析，使用默认结果");
                    return default_analysis("分析输出不可解析，使用默认复杂度");
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "复杂度分析调用失败，使用默认结果");
                return default_analysis(&format!("分析调用失败: {e}"));
            }
        };

        let mut tier = match parsed.complexity.to_uppercase().as_str() {
            "SIMPLE" => ComplexityTier::Simple,
            "MEDIUM" => ComplexityTier::Medium,
            "COMPLEX" => ComplexityTier::Complex,
            "VERY_COMPLEX" => ComplexityTier::VeryComplex,
            _ => ComplexityTier::Medium,
        };
        let mut estimated_steps = parsed.estimated_steps;

        // 推荐工具收敛到注册表内实际存在的名字
        let mut recommended: Vec<String> = parsed
            .required_tools
            .into_iter()
            .filter(|name| available_tools.iter().any(|d| &d.name == name))
            .collect();

        if self.detect_signals(problem).artifact {
            let before = tier;
            tier = tier.escalate();
            estimated_steps = estimated_steps.saturating_add(2).max(ARTIFACT_MIN_STEPS);
            tracing::info!(
                from = before.as_str(),
                to = tier.as_str(),
                steps = estimated_steps,
                "检测到产物生成要求，提升复杂度"
            );
            // 注册表中的产物类工具若缺失则补入推荐列表
            for descriptor in available_tools {
                if descriptor.stage == ToolStage::Late
                    && !recommended.contains(&descriptor.name)
                {
                    recommended.push(descriptor.name.clone());
                }
            }
        }

        ComplexityAnalysis {
            tier,
            rationale: parsed.reasoning,
            estimated_steps,
            recommended_tools: recommended,
            success_criteria: parsed
                .success_criteria
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_CRITERIA.to_string()),
        }
    }

    fn build_prompt(&self, problem: &str, available_tools: &[ToolDescriptor]) -> Vec<Message> {
        let catalog = available_tools
            .iter()
            .map(|d| format!("- {} [{}]: {}", d.name, stage_label(d.stage), d.description))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "请分析以下问题，帮助制定最佳的解决策略：\n\n\
             问题: {problem}\n\n\
             当前可用工具：\n{catalog}\n\n\
             请从问题本质、所需信息、处理步骤、可用工具与期望结果几个角度分析，\n\
             并特别检查用户是否要求生成文件或特定格式的输出（如 .md 报告、表格）。\n\
             若有此类要求，必须把相应工具列入推荐工具列表。\n\n\
             请评估问题的复杂程度：\n\
             - SIMPLE: 简单直接，可以快速解决\n\
             - MEDIUM: 中等复杂度，需要一些步骤\n\
             - COMPLEX: 比较复杂，需要多个步骤协调\n\
             - VERY_COMPLEX: 非常复杂，需要深入分析\n\n\
             请用 JSON 格式返回分析结果：\n\
             {{\n\
                 \"complexity\": \"SIMPLE|MEDIUM|COMPLEX|VERY_COMPLEX\",\n\
                 \"reasoning\": \"你的分析思路和理由\",\n\
                 \"estimated_steps\": 预估需要的步骤数,\n\
                 \"required_tools\": [\"推荐使用的工具列表\"],\n\
                 \"success_criteria\": \"怎样才算成功解决了这个问题\"\n\
             }}\n\n\
             只返回 JSON 格式内容。"
        );
        vec![Message::user(prompt)]
    }
}

fn stage_label(stage: ToolStage) -> &'static str {
    match stage {
        ToolStage::Early => "early",
        ToolStage::Middle => "middle",
        ToolStage::Late => "late",
    }
}

fn parse_analysis(output: &str) -> Option<AnalysisJson> {
    let trimmed = output.trim();
    let json_str = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        rest.find("```")
            .map(|end| rest[..end].trim())
            .unwrap_or_else(|| rest.trim())
    } else {
        let start = trimmed.find('{')?;
        let end = trimmed.rfind('}')?;
        &trimmed[start..=end]
    };
    serde_json::from_str(json_str).ok()
}

fn default_analysis(rationale: &str) -> ComplexityAnalysis {
    ComplexityAnalysis {
        tier: ComplexityTier::Medium,
        rationale: rationale.to_string(),
        estimated_steps: DEFAULT_STEPS,
        recommended_tools: Vec::new(),
        success_criteria: DEFAULT_CRITERIA.to_string(),
    }
}
