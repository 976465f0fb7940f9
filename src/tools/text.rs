//! 文本分析工具（middle 阶段）

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::{Tool, ToolStage};

/// analyze_text：统计字符/词/行数并抽取简单模式（邮箱、URL）
pub struct TextAnalysisTool;

#[async_trait]
impl Tool for TextAnalysisTool {
    fn name(&self) -> &str {
        "analyze_text"
    }

    fn description(&self) -> &str {
        "Analyze a text: character/word/line counts plus extracted emails and URLs. Args: {\"text\": \"...\"}"
    }

    fn stage(&self) -> ToolStage {
        ToolStage::Middle
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "text": { "type": "string", "description": "text to analyze" }
            },
            "required": ["text"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let text = args
            .get("text")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "Missing \"text\"".to_string())?;

        let chars = text.chars().count();
        let words = text.split_whitespace().count();
        let lines = text.lines().count();

        let mut emails = Vec::new();
        let mut urls = Vec::new();
        for token in text.split_whitespace() {
            let token = token.trim_matches(|c: char| ",;，。".contains(c));
            if token.starts_with("http://") || token.starts_with("https://") {
                urls.push(token.to_string());
            } else if token.contains('@') && token.split('@').nth(1).is_some_and(|d| d.contains('.')) {
                emails.push(token.to_string());
            }
        }

        let report = serde_json::json!({
            "chars": chars,
            "words": words,
            "lines": lines,
            "emails": emails,
            "urls": urls,
        });
        Ok(report.to_string())
    }
}
