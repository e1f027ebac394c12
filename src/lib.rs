//! # docintel-pdf-decoder
//!
//! PDF content decoder backed by the Azure AI Document Intelligence
//! `prebuilt-read` model.
//!
//! The crate is an adapter: it submits a PDF to the remote service, waits for
//! the long-running analyze operation, and reshapes the recognised lines into
//! one plain-text [`FileSection`] per page. Layout analysis and OCR happen
//! remotely; nothing here parses PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! path | bytes | reader
//!  │
//!  ├─ 1. Input    normalise to one reader, read it (cancellable)
//!  ├─ 2. Submit   POST …/documentModels/prebuilt-read:analyze
//!  ├─ 3. Wait     poll Operation-Location until succeeded / failed (cancellable)
//!  └─ 4. Reshape  page lines joined with "\r\n" → FileContent
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docintel_pdf_decoder::{AuthMode, ContentDecoder, DocIntelConfig, DocIntelPdfDecoder};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DocIntelConfig::builder()
//!         .endpoint("https://my-resource.cognitiveservices.azure.com/")
//!         .auth(AuthMode::ApiKey)
//!         .api_key(std::env::var("AZURE_DOCINTEL_API_KEY")?)
//!         .build()?;
//!     let decoder = DocIntelPdfDecoder::new(&config)?;
//!
//!     if decoder.supports_mime_type("application/pdf") {
//!         let content = decoder
//!             .decode_file("report.pdf".as_ref(), &CancellationToken::new())
//!             .await?;
//!         println!("{} pages", content.sections.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Authentication
//!
//! | Mode | Source |
//! |------|--------|
//! | `ApiKey` | `Ocp-Apim-Subscription-Key` header from `api_key` |
//! | `AzureIdentity` | bearer token from [`DefaultCredential`] (`azure_identity` ambient chain) |
//!
//! Hosts with their own token source pass it to
//! [`DocIntelPdfDecoder::with_credential`].
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events and installs no subscriber: an
//! `ERROR` event for each rejected configuration and a `DEBUG` event when a
//! decode starts.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod content;
pub mod credential;
pub mod decoder;
pub mod error;
pub mod pipeline;
pub mod service;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AuthMode, DocIntelConfig, DocIntelConfigBuilder};
pub use content::{mime_types, FileContent, FileSection, LINE_SEPARATOR};
pub use credential::{AccessToken, DefaultCredential, TokenCredential};
pub use decoder::{is_pdf_mime_type, ContentDecoder, DocIntelPdfDecoder};
pub use error::DecodeError;
pub use pipeline::input::DocumentReader;
pub use service::{
    AnalysisService, AnalyzeResult, DocIntelClient, DocumentLine, DocumentPage, OperationHandle,
    OperationStatus, ServiceAuth,
};
