use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub files: Files,
    #[serde(default)]
    pub model: Model,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Total number of consecutive ports tried before giving up.
    #[serde(default = "default_port_attempts")]
    pub port_attempts: u16,
    #[serde(default = "default_base_path")]
    pub base_path: String,
}
fn default_bind_addr() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8081 }
fn default_port_attempts() -> u16 { 5 }
fn default_base_path() -> String { "/mcp".to_string() }

impl Default for Server {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            port_attempts: default_port_attempts(),
            base_path: default_base_path(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Files {
    #[serde(default = "default_allowed_dirs")]
    pub allowed_dirs: Vec<String>,
    #[serde(default)]
    pub containment: Containment,
}
fn default_allowed_dirs() -> Vec<String> {
    ["~/Documents", "~/Downloads", "~/Desktop", "~/github"]
        .iter()
        .map(|d| d.to_string())
        .collect()
}

impl Default for Files {
    fn default() -> Self {
        Self { allowed_dirs: default_allowed_dirs(), containment: Containment::default() }
    }
}

/// How a normalized path is matched against an allowed directory.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Containment {
    /// Whole path components must match, so `Documents2` is not inside `Documents`.
    #[default]
    Segment,
    /// Raw string prefix. Admits sibling directories sharing a name prefix.
    Prefix,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Model {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}
fn default_api_base() -> String { "https://api.openai.com/v1".to_string() }
fn default_model() -> String { "gpt-3.5-turbo".to_string() }
fn default_temperature() -> f32 { 0.7 }
fn default_max_tokens() -> u32 { 1000 }
fn default_api_key_env() -> String { "OPENAI_API_KEY".to_string() }

impl Default for Model {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            Ok(serde_json::from_str(&raw)?)
        } else {
            Ok(toml::from_str(&raw)?)
        }
    }

    /// Loads `path` when it exists. A missing file is only tolerated when it
    /// is the default location; then built-in defaults apply.
    pub fn load_or_default(path: &Path, explicit: bool) -> anyhow::Result<Self> {
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port_attempts == 0 { anyhow::bail!("port_attempts must be > 0"); }
        if !self.server.base_path.starts_with('/') {
            anyhow::bail!("base_path must start with '/': {}", self.server.base_path);
        }
        if self.files.allowed_dirs.is_empty() { anyhow::bail!("allowed_dirs must not be empty"); }
        if self.files.allowed_dirs.iter().any(|d| d.trim().is_empty()) {
            anyhow::bail!("allowed_dirs entries must not be empty");
        }
        if self.model.model.trim().is_empty() { anyhow::bail!("model must not be empty"); }
        if self.model.max_tokens == 0 { anyhow::bail!("max_tokens must be > 0"); }
        if self.model.api_key_env.trim().is_empty() { anyhow::bail!("api_key_env must not be empty"); }
        Ok(())
    }

    /// Reads the upstream credential named by `model.api_key_env`.
    pub fn api_key(&self) -> anyhow::Result<String> {
        match std::env::var(&self.model.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => anyhow::bail!("{} environment variable not set", self.model.api_key_env),
        }
    }
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_home(dir: &str) -> anyhow::Result<PathBuf> {
    let rest = match dir.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return Ok(PathBuf::from(dir)),
    };
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot resolve home directory for {dir}"))?;
    Ok(home.join(rest.trim_start_matches(&['/', '\\'][..])))
}
