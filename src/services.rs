//! Contracts with the external asset/ingestion and rendering services.
//!
//! Field names on the wire types are part of the compatibility surface and must not change.
//! The traits are the seam between the session and whatever transport reaches the services;
//! [`crate::http_services::HttpServices`] is the HTTP implementation.

use std::future::Future;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::render_request::RenderRequest;
use crate::transcript::{SubtitleBox, TranscriptEntry};

/// Result of ingesting a video plus transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub video_path: String,
    pub transcript: Vec<TranscriptEntry>,
    #[serde(default)]
    pub subtitles: Vec<SubtitleBox>,
    pub word_count: usize,
}

/// Raw upload reply: either `{success, file_path}` or `{error}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl UploadResponse {
    /// The stored asset path, or a network error describing why the upload failed.
    pub fn into_file_path(self) -> Result<String> {
        if let Some(error) = self.error {
            return Err(Error::network(error));
        }
        match (self.success, self.file_path) {
            (true, Some(path)) if !path.is_empty() => Ok(path),
            _ => Err(Error::network("upload did not report a stored file path")),
        }
    }
}

/// Media already available on the asset store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetListing {
    #[serde(default)]
    pub clips: Vec<String>,
    #[serde(default)]
    pub audio_files: Vec<String>,
}

/// Raw render reply: either `{output_filename}` or `{error}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderResponse {
    #[serde(default)]
    pub output_filename: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RenderResponse {
    pub fn into_output_filename(self) -> Result<String> {
        if let Some(error) = self.error {
            return Err(Error::network(error));
        }
        self.output_filename
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::network("render service returned no output filename"))
    }
}

/// Body shape shared by every service error reply.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

/// The external media store and transcript ingestion service.
pub trait AssetStore: Send + Sync {
    /// Upload a main video with a plain-text script whose lines become subtitle boxes.
    fn ingest(
        &self,
        video: &Path,
        transcript_txt: &Path,
    ) -> impl Future<Output = Result<IngestResponse>> + Send;

    /// Upload a clip or audio file, returning its stored path.
    fn upload(&self, file: &Path) -> impl Future<Output = Result<String>> + Send;

    fn list(&self) -> impl Future<Output = Result<AssetListing>> + Send;
}

/// The external video rendering service.
pub trait RenderService: Send + Sync {
    /// Submit a render request, returning the output filename.
    fn submit(&self, request: &RenderRequest) -> impl Future<Output = Result<String>> + Send;

    /// Where the rendered output for `filename` can be downloaded from.
    fn download_url(&self, filename: &str) -> String;
}
