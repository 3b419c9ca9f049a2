//! Confinement of file reads to the configured allowed directories.
//!
//! Candidate paths go through variable expansion, absolutization against the
//! working directory and lexical normalization before the containment test.
//! Symlinks are never resolved, so the check is purely on the path text.

use crate::config::{self, Containment, Files};
use std::fmt;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("access to {} is not allowed", .path.display())]
    AccessDenied { path: PathBuf, allowed: Vec<PathBuf> },
    #[error("cannot resolve relative path against the working directory: {0}")]
    WorkingDir(#[source] io::Error),
}

/// Ordered, normalized, absolute directories reads are confined to.
#[derive(Debug, Clone)]
pub struct AllowedDirs(Vec<PathBuf>);

impl AllowedDirs {
    /// Normalizes every entry with the same pipeline used for candidate paths.
    pub fn new(dirs: &[PathBuf], cwd: &Path) -> Self {
        let mut out: Vec<PathBuf> = Vec::with_capacity(dirs.len());
        for d in dirs {
            let n = normalize(&absolutize(d, cwd));
            if !out.contains(&n) {
                out.push(n);
            }
        }
        Self(out)
    }

    pub fn from_config(files: &Files) -> anyhow::Result<Self> {
        let cwd = current_dir()?;
        let mut dirs = Vec::with_capacity(files.allowed_dirs.len());
        for raw in &files.allowed_dirs {
            dirs.push(config::expand_home(&expand_vars(raw, env_lookup))?);
        }
        Ok(Self::new(&dirs, &cwd))
    }

    pub fn as_slice(&self) -> &[PathBuf] { &self.0 }
}

/// A path proven to fall under one of the allowed directories.
///
/// Only [`PathValidator`] constructs these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPath(PathBuf);

impl ValidatedPath {
    pub fn as_path(&self) -> &Path { &self.0 }
}

impl fmt::Display for ValidatedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.display().fmt(f) }
}

#[derive(Debug, Clone)]
pub struct PathValidator {
    allowed: AllowedDirs,
    mode: Containment,
}

impl PathValidator {
    pub fn new(allowed: AllowedDirs, mode: Containment) -> Self { Self { allowed, mode } }

    pub fn allowed(&self) -> &[PathBuf] { self.allowed.as_slice() }

    /// Validates against the process environment and working directory.
    pub fn validate(&self, raw: &str) -> Result<ValidatedPath, ValidateError> {
        self.validate_with(raw, current_dir, env_lookup)
    }

    pub fn validate_in<F>(&self, raw: &str, cwd: &Path, lookup: F) -> Result<ValidatedPath, ValidateError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.validate_with(raw, || Ok(cwd.to_path_buf()), lookup)
    }

    /// `cwd` is only consulted for relative candidates; its failure is an error,
    /// never a fallback root.
    pub fn validate_with<C, F>(&self, raw: &str, cwd: C, lookup: F) -> Result<ValidatedPath, ValidateError>
    where
        C: FnOnce() -> io::Result<PathBuf>,
        F: Fn(&str) -> Option<String>,
    {
        let expanded = expand_vars(raw, lookup);
        let candidate = Path::new(&expanded);
        let absolute = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            cwd().map_err(ValidateError::WorkingDir)?.join(candidate)
        };
        let normalized = normalize(&absolute);
        if self.allowed.as_slice().iter().any(|dir| contains(dir, &normalized, self.mode)) {
            tracing::debug!(path = %normalized.display(), "path validated");
            Ok(ValidatedPath(normalized))
        } else {
            Err(ValidateError::AccessDenied {
                path: normalized,
                allowed: self.allowed.as_slice().to_vec(),
            })
        }
    }
}

fn contains(dir: &Path, path: &Path, mode: Containment) -> bool {
    match mode {
        Containment::Segment => path.starts_with(dir),
        Containment::Prefix => path
            .as_os_str()
            .as_encoded_bytes()
            .starts_with(dir.as_os_str().as_encoded_bytes()),
    }
}

fn env_lookup(name: &str) -> Option<String> { std::env::var(name).ok() }

fn current_dir() -> io::Result<PathBuf> {
    std::env::current_dir().map(|d| dunce::simplified(&d).to_path_buf())
}

fn absolutize(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() { path.to_path_buf() } else { cwd.join(path) }
}

/// Lexical normalization: separators collapse, `.` drops, `..` pops one
/// component and stops at the root. Does not touch the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}

/// Expands `$NAME` and `${NAME}` where NAME is made of word characters.
/// Unknown variables and an unterminated `${` are left verbatim.
pub fn expand_vars<F>(raw: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .char_indices()
                .find(|&(_, c)| !(c.is_alphanumeric() || c == '_'))
                .map(|(i, _)| i)
                .unwrap_or(after.len());
            (&after[..end], end)
        };
        let token = &rest[pos..pos + 1 + consumed];
        match (consumed, lookup(name)) {
            (0, _) => out.push('$'),
            (_, Some(value)) if !name.is_empty() => out.push_str(&value),
            _ => out.push_str(token),
        }
        rest = &rest[pos + 1 + consumed..];
    }
    out.push_str(rest);
    out
}
