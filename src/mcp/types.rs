use crate::{mcp::registry::ParamSpec, upstream::ModelParameters};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
pub struct ToolList {
    pub tools: Vec<ToolInfo>,
}

#[derive(Debug, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: &'static str,
    pub parameters: BTreeMap<&'static str, ParamSpec>,
}

/// Body of `POST /tools/:tool_name`; the tool comes from the path.
#[derive(Debug, Deserialize)]
pub struct ToolRequest {
    #[serde(default)]
    pub parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub tool: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    pub status: &'static str,
    pub tool: String,
    pub data: String,
}

#[derive(Debug, Deserialize)]
pub struct AgentRequest {
    pub prompt: String,
    #[serde(default)]
    pub context: Option<Vec<String>>,
    #[serde(default)]
    pub parameters: Option<ModelParameters>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AgentResponse {
    pub response: String,
    pub metadata: Metadata,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl AgentResponse {
    pub fn from_tool(tool: &str, response: String) -> Self {
        Self { response, metadata: Metadata { status: "success".into(), tool: Some(tool.into()), model: None } }
    }
    pub fn from_model(model: &str, response: String) -> Self {
        Self { response, metadata: Metadata { status: "success".into(), tool: None, model: Some(model.into()) } }
    }
}
