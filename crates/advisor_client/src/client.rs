//! QueryClient: submit a query or a file, render the markdown answer (or the
//! error) into the output area.

use std::future::Future;
use std::sync::Arc;

use crate::messages::{
    FileAnalysisRequest, PayloadField, QueryRequest, ServerResponse, ValidationError,
};
use crate::output::{OutputArea, View};
use crate::render::markdown_to_html;

/// Where the two endpoints live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub base_url: String,
    pub chat_path: String,
    pub analyze_path: String,
    /// Multipart field name for the uploaded file.
    pub upload_field: String,
}

impl Endpoints {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            chat_path: crate::config::DEFAULT_CHAT_PATH.into(),
            analyze_path: crate::config::DEFAULT_ANALYZE_PATH.into(),
            upload_field: crate::config::DEFAULT_UPLOAD_FIELD.into(),
        }
    }

    pub fn chat_url(&self) -> String {
        join_url(&self.base_url, &self.chat_path)
    }

    pub fn analyze_url(&self) -> String {
        join_url(&self.base_url, &self.analyze_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Status and body of an HTTP response, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// The request could not be completed (connection, I/O, body read).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        TransportError(e.to_string())
    }
}

/// Why an exchange ended without a rendered answer. Both kinds are shown
/// inline in the output area.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    #[error("{0}")]
    Server(String),
    #[error("{0}")]
    Transport(String),
}

impl From<TransportError> for ExchangeError {
    fn from(e: TransportError) -> Self {
        ExchangeError::Transport(e.0)
    }
}

/// One-shot HTTP POSTs. No retry, no timeout.
pub trait Transport: Send + Sync {
    fn post_json(
        &self,
        url: &str,
        body: &QueryRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;

    fn post_multipart(
        &self,
        url: &str,
        field: &str,
        file: FileAnalysisRequest,
    ) -> impl Future<Output = Result<RawResponse, TransportError>> + Send;
}

/// [`Transport`] over `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    http: reqwest::Client,
}

async fn into_raw(response: reqwest::Response) -> Result<RawResponse, TransportError> {
    let status = response.status().as_u16();
    let body = response.bytes().await?.to_vec();
    Ok(RawResponse { status, body })
}

impl Transport for HttpTransport {
    async fn post_json(&self, url: &str, body: &QueryRequest) -> Result<RawResponse, TransportError> {
        let response = self.http.post(url).json(body).send().await?;
        into_raw(response).await
    }

    async fn post_multipart(
        &self,
        url: &str,
        field: &str,
        file: FileAnalysisRequest,
    ) -> Result<RawResponse, TransportError> {
        let part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.filename);
        let form = reqwest::multipart::Form::new().part(field.to_string(), part);
        let response = self.http.post(url).multipart(form).send().await?;
        into_raw(response).await
    }
}

/// Mediates between user input and the two endpoints.
///
/// Cloning shares the transport and the output area.
#[derive(Debug, Clone)]
pub struct QueryClient<T = HttpTransport> {
    endpoints: Endpoints,
    transport: Arc<T>,
    output: Arc<OutputArea>,
}

impl QueryClient<HttpTransport> {
    pub fn new(endpoints: Endpoints) -> Self {
        Self::with_transport(endpoints, HttpTransport::default())
    }
}

impl<T: Transport> QueryClient<T> {
    pub fn with_transport(endpoints: Endpoints, transport: T) -> Self {
        Self {
            endpoints,
            transport: Arc::new(transport),
            output: Arc::new(OutputArea::new()),
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn output(&self) -> &Arc<OutputArea> {
        &self.output
    }

    /// Submit a free-text query to the chat endpoint.
    ///
    /// Blank input returns `Err` without touching the network or the output
    /// area. Otherwise returns what the output area shows once this request
    /// settles (a newer submission's view if this one went stale).
    pub async fn submit_query(&self, text: &str) -> Result<View, ValidationError> {
        let request = QueryRequest::new(text)?;
        let url = self.endpoints.chat_url();
        let ticket = self.output.begin();
        tracing::debug!(%url, ticket = ticket.generation(), "submitting query");

        let result = match self.transport.post_json(&url, &request).await {
            Ok(raw) => interpret(raw, PayloadField::Response),
            Err(e) => Err(e.into()),
        };
        self.output.settle(ticket, view_for(&url, result));
        Ok(self.output.view())
    }

    /// Upload a file to the analyze endpoint. `None` means nothing was
    /// selected, which is a validation error.
    pub async fn submit_file(
        &self,
        file: Option<FileAnalysisRequest>,
    ) -> Result<View, ValidationError> {
        let file = FileAnalysisRequest::selected(file)?;
        let url = self.endpoints.analyze_url();
        let ticket = self.output.begin();
        tracing::debug!(
            %url,
            filename = %file.filename,
            size = file.bytes.len(),
            ticket = ticket.generation(),
            "submitting file"
        );

        let result = match self
            .transport
            .post_multipart(&url, &self.endpoints.upload_field, file)
            .await
        {
            Ok(raw) => interpret(raw, PayloadField::Analysis),
            Err(e) => Err(e.into()),
        };
        self.output.settle(ticket, view_for(&url, result));
        Ok(self.output.view())
    }
}

/// Markdown payload on success.
fn interpret(raw: RawResponse, field: PayloadField) -> Result<String, ExchangeError> {
    match ServerResponse::interpret(raw.status, &raw.body, field) {
        Ok(ServerResponse::Success { payload }) => Ok(payload),
        Ok(ServerResponse::Failure { error }) => Err(ExchangeError::Server(error)),
        Err(parse) => Err(ExchangeError::Transport(parse)),
    }
}

fn view_for(url: &str, result: Result<String, ExchangeError>) -> View {
    match result {
        Ok(markdown) => View::Rendered {
            html: markdown_to_html(&markdown),
        },
        Err(e) => {
            match &e {
                ExchangeError::Server(msg) => tracing::warn!(%url, error = %msg, "server error"),
                ExchangeError::Transport(msg) => {
                    tracing::warn!(%url, error = %msg, "transport error")
                }
            }
            View::Errored {
                message: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Transport that replays a fixed result and counts calls.
    struct FakeTransport {
        calls: AtomicUsize,
        last_field: Mutex<Option<String>>,
        reply: Result<RawResponse, TransportError>,
    }

    impl FakeTransport {
        fn replying(status: u16, body: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_field: Mutex::new(None),
                reply: Ok(RawResponse {
                    status,
                    body: body.as_bytes().to_vec(),
                }),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                last_field: Mutex::new(None),
                reply: Err(TransportError(message.into())),
            }
        }
    }

    impl Transport for FakeTransport {
        async fn post_json(
            &self,
            _url: &str,
            _body: &QueryRequest,
        ) -> Result<RawResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }

        async fn post_multipart(
            &self,
            _url: &str,
            field: &str,
            _file: FileAnalysisRequest,
        ) -> Result<RawResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_field.lock().unwrap() = Some(field.to_string());
            self.reply.clone()
        }
    }

    fn client(transport: FakeTransport) -> QueryClient<FakeTransport> {
        QueryClient::with_transport(Endpoints::new("http://advisor.test"), transport)
    }

    #[test]
    fn urls_join_cleanly() {
        let endpoints = Endpoints::new("http://host:5000/");
        assert_eq!(endpoints.chat_url(), "http://host:5000/chat");
        assert_eq!(endpoints.analyze_url(), "http://host:5000/analyze");
    }

    #[tokio::test]
    async fn blank_query_makes_no_call() {
        let c = client(FakeTransport::replying(200, r#"{"response":"x"}"#));
        let err = c.submit_query("   ").await.unwrap_err();
        assert_eq!(err, ValidationError::EmptyQuery);
        assert_eq!(c.transport.calls.load(Ordering::SeqCst), 0);
        assert_eq!(c.output().view(), View::Idle);
    }

    #[tokio::test]
    async fn no_file_makes_no_call() {
        let c = client(FakeTransport::replying(200, r#"{"analysis":"x"}"#));
        let err = c.submit_file(None).await.unwrap_err();
        assert_eq!(err, ValidationError::NoFileSelected);
        assert_eq!(c.transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn transport_failure_is_shown_inline() {
        let c = client(FakeTransport::failing("network down"));
        let view = c.submit_query("hello").await.unwrap();
        assert_eq!(view.text(), "Error: network down");
    }

    #[tokio::test]
    async fn malformed_body_is_a_transport_error() {
        let c = client(FakeTransport::replying(200, "not json"));
        let view = c.submit_query("hello").await.unwrap();
        assert!(matches!(view, View::Errored { .. }));
        assert!(view.text().starts_with("Error: "));
    }

    #[tokio::test]
    async fn file_uses_configured_field() {
        let c = client(FakeTransport::replying(200, r##"{"analysis":"# Summary"}"##));
        let file = FileAnalysisRequest::new("deed.txt", b"party A".to_vec());
        let view = c.submit_file(Some(file)).await.unwrap();
        assert_eq!(
            view,
            View::Rendered {
                html: markdown_to_html("# Summary")
            }
        );
        assert_eq!(
            c.transport.last_field.lock().unwrap().as_deref(),
            Some("file")
        );
    }
}
