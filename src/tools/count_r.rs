use crate::{errors::AppError, mcp::registry::{Param, Tool}, tools::required_str};
use async_trait::async_trait;

/// Case-insensitive count of `target` in `text`.
pub fn count(text: &str, target: char) -> usize {
    let needle: String = target.to_lowercase().collect();
    text.to_lowercase().matches(needle.as_str()).count()
}

pub struct CountTool;

#[async_trait]
impl Tool for CountTool {
    fn name(&self) -> &'static str { "count_r" }
    fn description(&self) -> &'static str { "Count the number of 'r' characters in a string" }
    fn parameters(&self) -> Vec<Param> {
        vec![
            Param::required("text", "Text to count 'r' characters in"),
            Param::optional("char", "Single character to count instead of 'r'"),
        ]
    }
    async fn call(&self, params: &serde_json::Value) -> Result<String, AppError> {
        let text = required_str(params, "text")?;
        let target = match params.get("char").and_then(|v| v.as_str()) {
            None => 'r',
            Some(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => c,
                    _ => return Err(AppError::InvalidParameter("char must be a single character".into())),
                }
            }
        };
        Ok(count(text, target).to_string())
    }
}
