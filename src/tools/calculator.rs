//! 数学计算工具（early 阶段）
//!
//! 递归下降解析四则运算表达式（支持括号与负号），不依赖外部进程。

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::{Tool, ToolStage};

/// calculate_math：计算算术表达式
pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculate_math"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression (+ - * / and parentheses). Args: {\"expression\": \"2 * (3 + 4)\"}"
    }

    fn stage(&self) -> ToolStage {
        ToolStage::Early
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": { "type": "string", "description": "arithmetic expression" }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, String> {
        let expr = args
            .get("expression")
            .and_then(|v| v.as_str())
            .ok_or_else(|| "Missing \"expression\"".to_string())?;
        let value = eval(expr)?;
        // 整数结果不带小数点，便于 Oracle 直接引用
        if value.fract() == 0.0 && value.abs() < 1e15 {
            Ok(format!("{} = {}", expr.trim(), value as i64))
        } else {
            Ok(format!("{} = {}", expr.trim(), value))
        }
    }
}

/// 表达式求值入口
pub fn eval(input: &str) -> Result<f64, String> {
    let mut p = Parser {
        chars: input.chars().collect(),
        pos: 0,
    };
    let value = p.expr()?;
    p.skip_ws();
    if p.pos != p.chars.len() {
        return Err(format!("Unexpected input at offset {}", p.pos));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        loop {
            if self.eat('+') {
                value += self.term()?;
            } else if self.eat('-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.factor()?;
        loop {
            if self.eat('*') {
                value *= self.factor()?;
            } else if self.eat('/') {
                let rhs = self.factor()?;
                if rhs == 0.0 {
                    return Err("Division by zero".to_string());
                }
                value /= rhs;
            } else {
                return Ok(value);
            }
        }
    }

    fn factor(&mut self) -> Result<f64, String> {
        self.skip_ws();
        if self.eat('-') {
            return Ok(-self.factor()?);
        }
        if self.eat('(') {
            let value = self.expr()?;
            if !self.eat(')') {
                return Err("Missing closing parenthesis".to_string());
            }
            return Ok(value);
        }
        self.number()
    }

    fn number(&mut self) -> Result<f64, String> {
        self.skip_ws();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(format!("Expected number at offset {}", start));
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>().map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_precedence() {
        assert_eq!(eval("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(eval("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(eval("-3 + 5").unwrap(), 2.0);
    }

    #[test]
    fn test_eval_errors() {
        assert!(eval("1 / 0").is_err());
        assert!(eval("2 +").is_err());
        assert!(eval("(1 + 2").is_err());
    }

    #[tokio::test]
    async fn test_tool_execute() {
        let tool = CalculatorTool;
        let out = tool
            .execute(serde_json::json!({ "expression": "2 + 2" }))
            .await
            .unwrap();
        assert_eq!(out, "2 + 2 = 4");
    }
}
