//! 决策提示词组装
//!
//! 每轮把问题、策略指导、迭代进度、进展评估、阶段过滤后的工具清单与完整推理链
//! 拼成发给 Oracle 的消息列表。输出格式约定为单个 JSON 决策对象。

use crate::memory::Message;
use crate::reason::strategy::StrategyProfile;
use crate::reason::types::{ComplexityAnalysis, ProgressEvaluation, ReasoningStep};
use crate::tools::ToolDescriptor;

/// 决策上下文：一轮 Oracle 调用需要的全部输入
pub struct DecisionContext<'a> {
    pub problem: &'a str,
    pub profile: &'a StrategyProfile,
    pub analysis: &'a ComplexityAnalysis,
    pub current_iteration: u32,
    pub max_iterations: u32,
    pub confidence_threshold: f64,
    pub evaluation: &'a ProgressEvaluation,
    /// 阶段过滤后的候选工具（带 schema）
    pub shortlist: &'a [ToolDescriptor],
    pub chain: &'a [ReasoningStep],
}

/// 组装一轮决策消息（system + user）
pub fn build_messages(ctx: &DecisionContext<'_>) -> Vec<Message> {
    let system = format!(
        "你是一个 ReAct 推理智能体，正在使用【{}】推理策略解决问题。\n\n\
         策略描述: {}\n\
         【策略指导】:\n{}\n\n\
         成功标准: {}\n\n\
         每轮你必须只输出一个 JSON 对象，三种形式之一：\n\
         1. 调用工具: {{\"thought\": \"思考\", \"tool\": \"工具名\", \"args\": {{...}}}}\n\
         2. 继续思考: {{\"thought\": \"思考\"}}\n\
         3. 给出最终答案: {{\"thought\": \"思考\", \"final_answer\": \"完整答案\"}}\n\
         规则：每次只调用一个工具；工具失败要分析原因换方法；\
         只有在完全解决问题后才给出 final_answer。\n\n\
         输出必须符合以下 JSON Schema：\n{}",
        ctx.profile.strategy.as_str(),
        ctx.profile.description,
        ctx.profile.guidance,
        ctx.analysis.success_criteria,
        crate::oracle::decision_schema_json(),
    );

    let tool_catalog = if ctx.shortlist.is_empty() {
        "（本轮无可用工具，请继续思考或给出最终答案）".to_string()
    } else {
        ctx.shortlist
            .iter()
            .map(|d| {
                format!(
                    "- {}: {}\n  参数 schema: {}",
                    d.name, d.description, d.parameters
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut user = format!(
        "用户问题: {}\n\n\
         问题复杂度: {} | 当前轮次: {}/{} | 信心度阈值: {}\n\
         进展评估: progress={:.2} confidence={:.2} tool_diversity={:.2}\n\n\
         本轮可用工具:\n{}\n",
        ctx.problem,
        ctx.analysis.tier.as_str(),
        ctx.current_iteration + 1,
        ctx.max_iterations,
        ctx.confidence_threshold,
        ctx.evaluation.progress_score,
        ctx.evaluation.confidence,
        ctx.evaluation.tool_diversity,
        tool_catalog,
    );

    if !ctx.evaluation.recommendations.is_empty() {
        user.push_str(&format!(
            "\n建议: {}\n",
            ctx.evaluation.recommendations.join("；")
        ));
    }

    if !ctx.chain.is_empty() {
        user.push_str("\n之前的推理过程:\n");
        for step in ctx.chain {
            user.push_str(&format!(
                "第{}轮:\n思考: {}\n行动: {}\n观察: {}\n\n",
                step.index + 1,
                step.thought,
                step.action,
                step.observation.as_deref().unwrap_or("（无）"),
            ));
        }
    }

    vec![Message::system(system), Message::user(user)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StrategySection;
    use crate::reason::strategy::{profile_for, Strategy};
    use crate::reason::types::ComplexityTier;

    #[test]
    fn test_messages_include_chain_and_tools() {
        let profile = profile_for(Strategy::Sequential, &StrategySection::default());
        let analysis = ComplexityAnalysis {
            tier: ComplexityTier::Medium,
            rationale: String::new(),
            estimated_steps: 3,
            recommended_tools: vec![],
            success_criteria: "答案正确".to_string(),
        };
        let evaluation = ProgressEvaluation {
            progress_score: 0.5,
            confidence: 0.4,
            tool_diversity: 0.0,
            reasoning_depth: 0.2,
            should_continue: true,
            recommendations: vec!["需要收集更多信息".to_string()],
        };
        let mut step = ReasoningStep::new(0, "先算面积", "calculate_math");
        step.observation = Some("3.14 * 25 = 78.5".to_string());
        let shortlist = vec![ToolDescriptor {
            name: "calculate_math".to_string(),
            description: "math".to_string(),
            stage: crate::tools::ToolStage::Early,
            parameters: serde_json::json!({}),
        }];
        let ctx = DecisionContext {
            problem: "算圆面积",
            profile: &profile,
            analysis: &analysis,
            current_iteration: 1,
            max_iterations: 6,
            confidence_threshold: 0.7,
            evaluation: &evaluation,
            shortlist: &shortlist,
            chain: std::slice::from_ref(&step),
        };
        let messages = build_messages(&ctx);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].content.contains("sequential"));
        assert!(messages[1].content.contains("calculate_math"));
        assert!(messages[1].content.contains("78.5"));
        assert!(messages[1].content.contains("2/6"));
    }
}
