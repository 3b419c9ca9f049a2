use crate::{errors::AppError, security::PathValidator};
use async_trait::async_trait;
use serde::Serialize;
use std::{collections::BTreeMap, sync::Arc};

pub type DynTool = Arc<dyn Tool + Send + Sync + 'static>;

#[derive(Clone)]
pub struct ToolRegistry {
    tools: Vec<(String, DynTool)>,
}

impl ToolRegistry {
    pub fn new(validator: Arc<PathValidator>) -> Self {
        use crate::tools::{count_r::CountTool, read_file::ReadFileTool};
        let mut tools: Vec<(String, DynTool)> = vec![
            ("read_file".to_string(), Arc::new(ReadFileTool::new(validator))),
            ("count_r".to_string(), Arc::new(CountTool)),
        ];
        tools.sort_by(|a, b| a.0.cmp(&b.0));
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<DynTool> { self.tools.iter().find(|(n, _)| n == name).map(|(_, t)| t.clone()) }
    pub fn list_names(&self) -> Vec<String> { self.tools.iter().map(|(n, _)| n.clone()).collect() }
    pub fn iter(&self) -> impl Iterator<Item = &DynTool> { self.tools.iter().map(|(_, t)| t) }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub description: &'static str,
    pub required: bool,
}

pub struct Param {
    pub name: &'static str,
    pub spec: ParamSpec,
}

impl Param {
    pub fn required(name: &'static str, description: &'static str) -> Self {
        Self { name, spec: ParamSpec { kind: "string", description, required: true } }
    }
    pub fn optional(name: &'static str, description: &'static str) -> Self {
        Self { name, spec: ParamSpec { kind: "string", description, required: false } }
    }
}

pub fn param_map(params: Vec<Param>) -> BTreeMap<&'static str, ParamSpec> {
    params.into_iter().map(|p| (p.name, p.spec)).collect()
}

#[async_trait]
pub trait Tool {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// Declared parameters; the first one receives the argument text when the
    /// tool is invoked by keyword from a prompt.
    fn parameters(&self) -> Vec<Param>;
    async fn call(&self, params: &serde_json::Value) -> Result<String, AppError>;
}
