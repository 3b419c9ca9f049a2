use crate::{security::ValidateError, tools::read_file::ReadError, upstream::UpstreamError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("access to {} is not allowed. File must be in one of these directories:\n{}", .path.display(), join_dirs(.allowed))]
    AccessDenied { path: PathBuf, allowed: Vec<PathBuf> },
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("path is not a file: {}", .0.display())]
    NotAFile(PathBuf),
    #[error("could not read file {} with any of the supported encodings", .0.display())]
    UndecodableContent(PathBuf),
    #[error("{0} parameter is required")]
    MissingParameter(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("tool not found: {0}")]
    ToolNotFound(String),
    #[error("upstream model error: {0}")]
    Upstream(String),
    #[error("{0}")]
    Unexpected(String),
}

fn join_dirs(dirs: &[PathBuf]) -> String {
    dirs.iter().map(|d| d.display().to_string()).collect::<Vec<_>>().join("\n")
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::AccessDenied { .. } => "AccessDenied",
            AppError::NotFound(_) => "NotFound",
            AppError::NotAFile(_) => "NotAFile",
            AppError::UndecodableContent(_) => "UndecodableContent",
            AppError::MissingParameter(_) => "MissingParameter",
            AppError::InvalidParameter(_) => "InvalidParameter",
            AppError::ToolNotFound(_) => "ToolNotFound",
            AppError::Upstream(_) => "UpstreamFailure",
            AppError::Unexpected(_) => "UnexpectedFailure",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AccessDenied { .. } => StatusCode::FORBIDDEN,
            AppError::NotFound(_) | AppError::ToolNotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotAFile(_)
            | AppError::UndecodableContent(_)
            | AppError::MissingParameter(_)
            | AppError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody { code: self.code(), message: self.to_string() }
    }
}

impl From<ValidateError> for AppError {
    fn from(err: ValidateError) -> Self {
        match err {
            ValidateError::AccessDenied { path, allowed } => AppError::AccessDenied { path, allowed },
            e @ ValidateError::WorkingDir(_) => AppError::Unexpected(e.to_string()),
        }
    }
}

impl From<ReadError> for AppError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::NotFound(p) => AppError::NotFound(p),
            ReadError::NotAFile(p) => AppError::NotAFile(p),
            ReadError::UndecodableContent(p) => AppError::UndecodableContent(p),
            e @ ReadError::Io { .. } => AppError::Unexpected(e.to_string()),
        }
    }
}

impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self { AppError::Upstream(err.to_string()) }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        }
        (self.status(), Json(self.body())).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
