use crate::{
    config::Config,
    errors::{AppError, AppResult},
    mcp::{
        registry::{param_map, DynTool, ToolRegistry},
        types::{AgentRequest, AgentResponse, ExecuteRequest, ExecuteResponse, ToolInfo, ToolList, ToolRequest},
    },
    upstream::LanguageModel,
};
use anyhow::Context;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::{io, sync::Arc, time::Instant};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub registry: Arc<ToolRegistry>,
    pub model: Arc<dyn LanguageModel>,
}

/// Tools a prompt may invoke by naming them, in match priority.
const PROMPT_KEYWORDS: [&str; 2] = ["read_file", "count_r"];

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let server = &state.cfg.server;
    let listener = bind_with_retry(&server.bind_addr, server.port, server.port_attempts).await?;
    let addr = listener.local_addr()?;
    info!(addr = %addr, base_path = %server.base_path, "listening");
    let app = build_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Binds `addr:port`, moving to the next port while the current one is taken.
pub async fn bind_with_retry(addr: &str, port: u16, attempts: u16) -> anyhow::Result<TcpListener> {
    let mut port = port;
    for attempt in 1..=attempts {
        match TcpListener::bind((addr, port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                warn!(port, attempt, "port is in use, trying next port");
                port = match port.checked_add(1) {
                    Some(p) => p,
                    None => break,
                };
            }
            Err(e) => return Err(e).with_context(|| format!("binding {addr}:{port}")),
        }
    }
    anyhow::bail!("could not find available port after {attempts} attempts")
}

pub fn build_router(state: AppState) -> Router {
    let base = state.cfg.server.base_path.trim_end_matches('/').to_string();
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route(&format!("{base}/health"), get(health))
        .route(&format!("{base}/tools"), get(list_tools))
        .route(&format!("{base}/execute"), post(execute))
        .route("/tools/:tool_name", post(call_tool))
        .route("/process", post(process))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({"message": "Welcome to steward"}))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

async fn list_tools(State(state): State<AppState>) -> Json<ToolList> {
    let tools = state
        .registry
        .iter()
        .map(|t| ToolInfo {
            name: t.name().to_string(),
            description: t.description(),
            parameters: param_map(t.parameters()),
        })
        .collect();
    Json(ToolList { tools })
}

async fn execute(
    State(state): State<AppState>,
    Json(req): Json<ExecuteRequest>,
) -> AppResult<Json<ExecuteResponse>> {
    let data = run_tool(&state, "execute", &req.tool, &req.parameters).await?;
    Ok(Json(ExecuteResponse { status: "success", tool: req.tool, data }))
}

async fn call_tool(
    State(state): State<AppState>,
    Path(tool_name): Path<String>,
    Json(req): Json<ToolRequest>,
) -> AppResult<Json<AgentResponse>> {
    let response = run_tool(&state, "tools", &tool_name, &req.parameters).await?;
    Ok(Json(AgentResponse::from_tool(&tool_name, response)))
}

async fn process(
    State(state): State<AppState>,
    Json(req): Json<AgentRequest>,
) -> AppResult<Json<AgentResponse>> {
    if let Some((keyword, arg)) = keyword_invocation(&req.prompt) {
        let tool = state
            .registry
            .get(keyword)
            .ok_or_else(|| AppError::ToolNotFound(keyword.to_string()))?;
        let params = inline_params(&tool, arg);
        let response = run_tool(&state, "process", keyword, &params).await?;
        return Ok(Json(AgentResponse::from_tool(keyword, prompt_reply(keyword, response))));
    }

    let started = Instant::now();
    let request_id = uuid::Uuid::new_v4().to_string();
    let context = req.context.unwrap_or_default();
    let params = req.parameters.unwrap_or_default();
    let model = state.model.model_name().to_string();
    let result = state.model.complete(&req.prompt, &context, &params).await;
    let elapsed = started.elapsed().as_millis() as u64;
    match result {
        Ok(text) => {
            audit(&request_id, "process", &model, "allow", "OK", elapsed);
            Ok(Json(AgentResponse::from_model(&model, text)))
        }
        Err(e) => {
            let err = AppError::from(e);
            audit(&request_id, "process", &model, "error", err.code(), elapsed);
            Err(err)
        }
    }
}

async fn run_tool(state: &AppState, route: &str, name: &str, params: &Value) -> AppResult<String> {
    let started = Instant::now();
    let request_id = uuid::Uuid::new_v4().to_string();
    let Some(tool) = state.registry.get(name) else {
        let err = AppError::ToolNotFound(name.to_string());
        audit(&request_id, route, name, "deny", err.code(), started.elapsed().as_millis() as u64);
        return Err(err);
    };
    let result = tool.call(params).await;
    let elapsed = started.elapsed().as_millis() as u64;
    match &result {
        Ok(_) => audit(&request_id, route, name, "allow", "OK", elapsed),
        Err(AppError::AccessDenied { .. }) => audit(&request_id, route, name, "deny", "AccessDenied", elapsed),
        Err(e) => audit(&request_id, route, name, "error", e.code(), elapsed),
    }
    result
}

/// Finds the first tool keyword in `prompt` (ASCII case-insensitive) and
/// returns it with the trimmed text that follows it.
pub fn keyword_invocation(prompt: &str) -> Option<(&'static str, &str)> {
    let lowered = prompt.to_ascii_lowercase();
    PROMPT_KEYWORDS.iter().find_map(|&kw| {
        lowered
            .find(kw)
            .map(|at| (kw, prompt[at + kw.len()..].trim()))
    })
}

/// Prompt callers get a sentence for counts; file contents pass through.
fn prompt_reply(keyword: &str, response: String) -> String {
    match keyword {
        "count_r" => format!("Number of 'r' characters: {response}"),
        _ => response,
    }
}

fn inline_params(tool: &DynTool, arg: &str) -> Value {
    let mut map = serde_json::Map::new();
    if let Some(first) = tool.parameters().first() {
        map.insert(first.name.to_string(), Value::String(arg.to_string()));
    }
    Value::Object(map)
}

fn audit(request_id: &str, route: &str, target: &str, decision: &str, code: &str, duration_ms: u64) {
    tracing::info!(
        request_id = request_id,
        route = route,
        target = target,
        decision = decision,
        code = code,
        duration_ms = duration_ms,
        "audit"
    );
}
