//! 决策解析：Oracle 原始输出 -> Decision
//!
//! 先尝试结构化 JSON（```json 围栏或裸 JSON 对象），失败即 Unparseable；
//! 完全没有 JSON 时走启发式文本分支（识别 Final Answer 标记），作为解析器的
//! 一个显式变体而非嵌套异常处理。

use serde::Deserialize;
use serde_json::Value;

use crate::core::OracleError;
use crate::reason::types::Decision;

/// Final Answer 标记（启发式分支识别，中英文各一）
const FINAL_ANSWER_MARKERS: [&str; 2] = ["final answer:", "最终答案:"];

/// 一轮 Oracle 输出：思考文本 + 结构化决策
#[derive(Debug, Clone)]
pub struct OracleTurn {
    pub thought: String,
    pub decision: Decision,
}

/// JSON 决策格式：{"thought": "...", "tool": "...", "args": {...}} 或
/// {"thought": "...", "final_answer": "..."}；两者都没有则视为 Continue
#[derive(Debug, Deserialize)]
struct DecisionJson {
    #[serde(default)]
    thought: Option<String>,
    #[serde(default)]
    tool: Option<String>,
    #[serde(default)]
    args: Option<Value>,
    #[serde(default)]
    final_answer: Option<String>,
}

/// 从文本中抽取 JSON 片段：```json 围栏优先，其次首个 { 到末个 }
fn extract_json(trimmed: &str) -> Option<&str> {
    if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        let inner = rest
            .find("```")
            .map(|end| rest[..end].trim())
            .unwrap_or_else(|| rest.trim());
        return Some(inner);
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end > start {
        Some(&trimmed[start..=end])
    } else {
        None
    }
}

/// 解析 Oracle 输出为一轮决策
///
/// JSON 分支：格式错误返回 Unparseable（由循环按 Oracle 失败策略恢复）。
/// 启发式分支：含 Final Answer 标记则为最终答案，否则整段文本视为 Continue 思考。
pub fn parse_turn(output: &str) -> Result<OracleTurn, OracleError> {
    let trimmed = output.trim();

    if let Some(json_str) = extract_json(trimmed) {
        let parsed: DecisionJson = serde_json::from_str(json_str)
            .map_err(|e| OracleError::Unparseable(format!("{}: {}", e, json_str)))?;
        let thought = parsed.thought.unwrap_or_default();

        if let Some(tool) = parsed.tool.filter(|t| !t.is_empty()) {
            return Ok(OracleTurn {
                thought,
                decision: Decision::ToolCall {
                    name: tool,
                    args: parsed.args.unwrap_or_else(|| Value::Object(Default::default())),
                },
            });
        }
        if let Some(answer) = parsed.final_answer.filter(|a| !a.is_empty()) {
            return Ok(OracleTurn {
                thought,
                decision: Decision::FinalAnswer(answer),
            });
        }
        let thought = if thought.is_empty() {
            trimmed.to_string()
        } else {
            thought
        };
        return Ok(OracleTurn {
            thought: thought.clone(),
            decision: Decision::Continue { thought },
        });
    }

    // 启发式分支：无 JSON，可识别 Final Answer 标记
    let lower = trimmed.to_lowercase();
    for marker in FINAL_ANSWER_MARKERS {
        if let Some(idx) = lower.find(marker) {
            let answer = trimmed[idx + marker.len()..].trim();
            if !answer.is_empty() {
                return Ok(OracleTurn {
                    thought: trimmed[..idx].trim().to_string(),
                    decision: Decision::FinalAnswer(answer.to_string()),
                });
            }
        }
    }

    Ok(OracleTurn {
        thought: trimmed.to_string(),
        decision: Decision::Continue {
            thought: trimmed.to_string(),
        },
    })
}
