//! Client library for the legal advisor backend: submit a query to `/chat` or
//! a document to `/analyze`, render the markdown answer into an output area.
//! Used by the `advisor` CLI.

pub mod client;
pub mod config;
pub mod messages;
pub mod output;
pub mod render;

pub use client::{
    Endpoints, ExchangeError, HttpTransport, QueryClient, RawResponse, Transport, TransportError,
};
pub use config::{default_config_path, Config, ConfigError, ServerSection};
pub use messages::{FileAnalysisRequest, QueryRequest, ServerResponse, ValidationError};
pub use output::{OutputArea, OutputState, Ticket, View};
pub use render::markdown_to_html;
