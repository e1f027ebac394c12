//! The content-decoder capability and its Document Intelligence implementation.
//!
//! [`ContentDecoder`] is the contract the surrounding ingestion pipeline
//! depends on: a mime-type predicate plus three decode entry points. The
//! path and byte-buffer entry points are thin default methods that acquire a
//! [`DocumentReader`] and hand it to [`ContentDecoder::decode_stream`], so an
//! implementation only writes the stream path.
//!
//! ## One decode call
//!
//! ```text
//! read input ──▶ begin_analyze ──▶ wait_for_completion ──▶ reshape
//!                 (Submitted)        (Waiting)               (Completed)
//!                      │                 │
//!                      └──── error ──────┴──▶ Failed / Cancelled, no output
//! ```

use crate::config::{AuthMode, DocIntelConfig};
use crate::content::{mime_types, FileContent};
use crate::credential::{DefaultCredential, TokenCredential};
use crate::error::DecodeError;
use crate::pipeline::input::{self, DocumentReader};
use crate::pipeline::{reshape, wait};
use crate::service::{AnalysisService, DocIntelClient, ServiceAuth};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Turns documents of some mime types into page-partitioned text.
#[async_trait]
pub trait ContentDecoder: Send + Sync {
    /// Whether this decoder can handle content of `mime_type`.
    fn supports_mime_type(&self, mime_type: &str) -> bool;

    /// Decode a document read from `reader`. The reader is dropped before
    /// this returns, whatever the outcome.
    async fn decode_stream(
        &self,
        reader: DocumentReader,
        cancel: &CancellationToken,
    ) -> Result<FileContent, DecodeError>;

    /// Decode the file at `path`.
    async fn decode_file(
        &self,
        path: &Path,
        cancel: &CancellationToken,
    ) -> Result<FileContent, DecodeError> {
        let reader = input::open_file(path).await?;
        self.decode_stream(reader, cancel).await
    }

    /// Decode an in-memory document.
    async fn decode_bytes(
        &self,
        data: Bytes,
        cancel: &CancellationToken,
    ) -> Result<FileContent, DecodeError> {
        self.decode_stream(input::from_bytes(data), cancel).await
    }
}

/// Case-insensitive prefix match against `application/pdf`, so parameterised
/// values such as `application/pdf; version=1.7` are accepted.
pub fn is_pdf_mime_type(mime_type: &str) -> bool {
    mime_type
        .get(..mime_types::PDF.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(mime_types::PDF))
}

/// PDF decoder that delegates text extraction to the Azure AI Document
/// Intelligence read model.
///
/// Holds one long-lived service client; decode calls share nothing else and
/// may run concurrently on the same instance.
///
/// # Example
/// ```rust,no_run
/// use docintel_pdf_decoder::{ContentDecoder, DocIntelConfig, DocIntelPdfDecoder};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let decoder = DocIntelPdfDecoder::new(&DocIntelConfig::from_env()?)?;
/// let content = decoder
///     .decode_file("invoice.pdf".as_ref(), &CancellationToken::new())
///     .await?;
/// for section in &content.sections {
///     println!("--- page {} ---\n{}", section.page_number, section.content);
/// }
/// # Ok(())
/// # }
/// ```
pub struct DocIntelPdfDecoder {
    service: Arc<dyn AnalysisService>,
    model_id: String,
    poll_interval: Duration,
}

impl DocIntelPdfDecoder {
    /// Build a decoder from configuration.
    ///
    /// [`AuthMode::AzureIdentity`] uses the ambient [`DefaultCredential`];
    /// [`AuthMode::ApiKey`] requires a non-empty `api_key`. Any other mode,
    /// or a missing key, is logged at error level and returned as a
    /// configuration error. No network call is made.
    pub fn new(config: &DocIntelConfig) -> Result<Self, DecodeError> {
        let auth = match &config.auth {
            AuthMode::AzureIdentity => None,
            AuthMode::ApiKey => match config.api_key.as_deref().filter(|k| !k.is_empty()) {
                Some(key) => Some(ServiceAuth::ApiKey(key.to_string())),
                None => return Err(fatal(DecodeError::MissingApiKey)),
            },
            AuthMode::Unspecified | AuthMode::Other(_) => {
                return Err(fatal(DecodeError::UnsupportedAuthMode {
                    mode: config.auth.to_string(),
                }))
            }
        };

        let auth = match auth {
            Some(auth) => auth,
            None => {
                let credential = DefaultCredential::new().map_err(fatal)?;
                ServiceAuth::Credential(Arc::new(credential))
            }
        };
        let http = DocIntelClient::http_client(config)?;
        let client = DocIntelClient::new(config, http, auth)?;
        Ok(Self::with_service(config, Arc::new(client)))
    }

    /// Build an identity-authenticated decoder around a caller-supplied
    /// credential. `config.auth` and `config.api_key` are ignored.
    pub fn with_credential(
        config: &DocIntelConfig,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self, DecodeError> {
        let http = DocIntelClient::http_client(config)?;
        let client = DocIntelClient::new(config, http, ServiceAuth::Credential(credential))?;
        Ok(Self::with_service(config, Arc::new(client)))
    }

    /// Build a decoder over any [`AnalysisService`] implementation.
    ///
    /// Only `model_id` and `poll_interval_ms` are read from `config`.
    pub fn with_service(config: &DocIntelConfig, service: Arc<dyn AnalysisService>) -> Self {
        Self {
            service,
            model_id: config.model_id.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
        }
    }

    /// The model documents are submitted to.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

impl fmt::Debug for DocIntelPdfDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocIntelPdfDecoder")
            .field("service", &"<dyn AnalysisService>")
            .field("model_id", &self.model_id)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

#[async_trait]
impl ContentDecoder for DocIntelPdfDecoder {
    fn supports_mime_type(&self, mime_type: &str) -> bool {
        is_pdf_mime_type(mime_type)
    }

    async fn decode_stream(
        &self,
        reader: DocumentReader,
        cancel: &CancellationToken,
    ) -> Result<FileContent, DecodeError> {
        debug!("Extracting text from PDF file");

        let document = input::read_document(reader, cancel).await?;

        let handle = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DecodeError::Cancelled),
            handle = self.service.begin_analyze(&self.model_id, document) => handle?,
        };

        let result =
            wait::wait_for_completion(self.service.as_ref(), &handle, self.poll_interval, cancel)
                .await?;

        Ok(reshape::to_file_content(result))
    }
}

/// Log a configuration error at the highest severity, then hand it back.
fn fatal(err: DecodeError) -> DecodeError {
    error!("{}", err);
    err
}
