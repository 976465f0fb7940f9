//! Markdown 报告工具（late 阶段）
//!
//! 在 workspace 根目录内写出报告文件；文件名做路径净化，拒绝目录逃逸。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::tools::{Tool, ToolStage};

/// create_markdown_report：将标题与正文写为 workspace 下的 .md 文件
pub struct MarkdownReportTool {
    workspace: PathBuf,
}

impl MarkdownReportTool {
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        Self {
            workspace: workspace.as_ref().to_path_buf(),
        }
    }

    fn sanitize_filename(name: &str) -> Result<String, String> {
        let name = name.trim();
        if name.is_empty() {
            return Err("Empty filename".to_string());
        }
        if name.contains("..") || name.contains('/') || name.contains('\\') {
            return Err(format!("Invalid filename: {name}"));
        }
        if name.ends_with(".md") {
            Ok(name.to_string())
        } else {
            Ok(format!("{name}.md"))
        }
    }
}

#[async_trait]
impl Tool for MarkdownReportTool {
    fn name(&self) -> &str {
        "create_markdown_report"
    }

    fn description(&self) -> &str {
        "Write a Markdown report into the workspace. Args: {\"filename\": \"report.md\", \"title\": \"...\", \"content\": \"...\"}"
    }

    fn stage(&self) -> ToolStage {
        ToolStage::Late
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "filename": { "type": "string", "description": "target file name, .md appended if missing" },
                "title": { "type": "string", "description": "report title" },
                "content": { "type": "string", "description": "report body (markdown)" }
            },
            "required": ["filename", "content"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let filename = args
            .get("filename")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "Missing \"filename\"".to_string())?;
        let filename = Self::sanitize_filename(filename)?;
        let title = args.get("title").and_then(|v| v.as_str()).unwrap_or("Report");
        let content = args
            .get("content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "Missing \"content\"".to_string())?;

        let body = format!(
            "# {title}\n\n> Generated at {}\n\n{content}\n",
            Utc::now().to_rfc3339()
        );

        tokio::fs::create_dir_all(&self.workspace)
            .await
            .map_err(|e| e.to_string())?;
        let path = self.workspace.join(&filename);
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| e.to_string())?;
        Ok(format!("Report written to {}", path.display()))
    }
}
