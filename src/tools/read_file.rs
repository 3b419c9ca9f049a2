use crate::{
    errors::{AppError, AppResult},
    mcp::registry::{Param, Tool},
    security::{PathValidator, ValidatedPath},
    tools::required_str,
};
use async_trait::async_trait;
use std::{fs, io, path::PathBuf, sync::Arc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("path is not a file: {}", .0.display())]
    NotAFile(PathBuf),
    #[error("could not read file {} with any of the supported encodings", .0.display())]
    UndecodableContent(PathBuf),
    #[error("error reading file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Latin1,
    Windows1252,
}

/// Tried in order; the first clean decode wins.
pub const ENCODINGS: [Encoding; 3] = [Encoding::Utf8, Encoding::Latin1, Encoding::Windows1252];

impl Encoding {
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf8 => "utf-8",
            Encoding::Latin1 => "latin-1",
            Encoding::Windows1252 => "cp1252",
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
            Encoding::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
            Encoding::Windows1252 => bytes.iter().map(|&b| cp1252_char(b)).collect(),
        }
    }
}

// 0x80..=0x9F; `None` marks the five bytes cp1252 leaves undefined.
const CP1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None, Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017D}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None, Some('\u{017E}'), Some('\u{0178}'),
];

fn cp1252_char(b: u8) -> Option<char> {
    match b {
        0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize],
        _ => Some(b as char),
    }
}

/// Returns the text and the encoding that decoded it.
pub fn decode(bytes: &[u8]) -> Option<(String, Encoding)> {
    ENCODINGS.iter().find_map(|&enc| enc.decode(bytes).map(|text| (text, enc)))
}

pub fn read_text(path: &ValidatedPath) -> Result<String, ReadError> {
    let p = path.as_path();
    let io_err = |source: io::Error| ReadError::Io { path: p.to_path_buf(), source };
    // Any stat failure (missing entry, a file used as a directory) means the
    // path does not exist.
    let meta = match fs::metadata(p) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(path = %path, error = %e, "stat failed");
            return Err(ReadError::NotFound(p.to_path_buf()));
        }
    };
    if !meta.is_file() {
        return Err(ReadError::NotAFile(p.to_path_buf()));
    }
    let bytes = fs::read(p).map_err(io_err)?;
    let (text, enc) = decode(&bytes).ok_or_else(|| ReadError::UndecodableContent(p.to_path_buf()))?;
    tracing::debug!(path = %path, encoding = enc.name(), "file decoded");
    Ok(text)
}

pub struct ReadFileTool {
    validator: Arc<PathValidator>,
}

impl ReadFileTool {
    pub fn new(validator: Arc<PathValidator>) -> Self { Self { validator } }

    pub fn read(&self, raw: &str) -> AppResult<String> {
        let path = self.validator.validate(raw)?;
        Ok(read_text(&path)?)
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &'static str { "read_file" }
    fn description(&self) -> &'static str {
        "Read the content of a file. Files must be in one of the allowed directories (by default Documents, Downloads, Desktop, or github)."
    }
    fn parameters(&self) -> Vec<Param> {
        vec![Param::required("file_path", "Path to the file to read")]
    }
    async fn call(&self, params: &serde_json::Value) -> Result<String, AppError> {
        let raw = required_str(params, "file_path")?;
        self.read(raw)
    }
}
