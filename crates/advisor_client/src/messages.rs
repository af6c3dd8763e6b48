//! Request and response bodies for the `/chat` and `/analyze` endpoints.

use std::path::Path;

use serde::Serialize;

/// Shown when a failed response carries no usable `error` field.
pub const UNKNOWN_ERROR: &str = "Unknown error occurred.";

/// Input rejected before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a query.")]
    EmptyQuery,
    #[error("No file selected. Please choose a file.")]
    NoFileSelected,
}

/// Client → `/chat`: `{"query": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRequest {
    query: String,
}

impl QueryRequest {
    /// Trims `text`; whitespace-only input is rejected.
    pub fn new(text: &str) -> Result<Self, ValidationError> {
        let query = text.trim();
        if query.is_empty() {
            return Err(ValidationError::EmptyQuery);
        }
        Ok(Self {
            query: query.to_string(),
        })
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Client → `/analyze`: one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAnalysisRequest {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl FileAnalysisRequest {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    /// Read the file at `path`. The upload name is the final path component.
    pub async fn load(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self { filename, bytes })
    }

    /// A missing selection is a validation error.
    pub fn selected(file: Option<Self>) -> Result<Self, ValidationError> {
        file.ok_or(ValidationError::NoFileSelected)
    }
}

/// Which field of the success body carries the markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadField {
    Response,
    Analysis,
}

impl PayloadField {
    pub fn name(self) -> &'static str {
        match self {
            PayloadField::Response => "response",
            PayloadField::Analysis => "analysis",
        }
    }
}

/// Interpreted server answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerResponse {
    Success { payload: String },
    Failure { error: String },
}

impl ServerResponse {
    /// Interpret a response body. `Err` carries the JSON parser's message.
    ///
    /// Success needs a 2xx status and a non-empty string in `field`; anything
    /// else is a failure with the server's `error` or [`UNKNOWN_ERROR`].
    pub fn interpret(status: u16, body: &[u8], field: PayloadField) -> Result<Self, String> {
        let value: serde_json::Value = serde_json::from_slice(body).map_err(|e| e.to_string())?;
        let payload = non_empty_str(value.get(field.name()));
        let error = non_empty_str(value.get("error"));

        if (200..300).contains(&status) {
            if let Some(payload) = payload {
                return Ok(ServerResponse::Success { payload });
            }
        }
        let error = error.unwrap_or_else(|| UNKNOWN_ERROR.to_string());
        Ok(ServerResponse::Failure { error })
    }
}

fn non_empty_str(value: Option<&serde_json::Value>) -> Option<String> {
    match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
