//! HTTP transport for the asset/ingestion and rendering services.
//!
//! Both services live behind one base URL (see [`ServiceConfig`]):
//!
//! | call | endpoint |
//! |---|---|
//! | ingest with script | `POST /upload-video-with-txt` (multipart `video`, `transcript_file`) |
//! | upload asset | `POST /upload-clip` (multipart `file`) |
//! | list assets | `GET /list-clips` |
//! | render | `POST /process-video` (JSON [`RenderRequest`]) |
//! | download | `GET /download/{filename}` |
//!
//! Every failure becomes [`Error::Network`]: transport errors, non-2xx statuses, and
//! `{"error": ...}` bodies even when they arrive with a 2xx status. A 2xx ingestion reply that
//! doesn't parse is an [`Error::Format`], since the session must discard it rather than retry.
//! Nothing here retries. Downloads stream into a `.part` file that is renamed on success and
//! removed on failure.

use std::path::{Path, PathBuf};

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::render_request::RenderRequest;
use crate::services::{
    AssetListing, AssetStore, ErrorBody, IngestResponse, RenderResponse, RenderService,
    UploadResponse,
};

#[derive(Debug, Clone)]
pub struct HttpServices {
    client: Client,
    config: ServiceConfig,
}

impl HttpServices {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Stream a rendered output to `dest`, returning the number of bytes written.
    pub async fn download_to(&self, filename: &str, dest: &Path) -> Result<u64> {
        let mut resp = self.client.get(self.download_url(filename)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.bytes().await?;
            return Err(status_error(status, &body));
        }

        let part = part_path(dest);
        let written = match copy_body(&mut resp, &part).await {
            Ok(written) => written,
            Err(err) => {
                if let Err(rm) = tokio::fs::remove_file(&part).await {
                    warn!(error = %rm, part = %part.display(), "failed to remove partial download");
                }
                return Err(err);
            }
        };
        tokio::fs::rename(&part, dest).await?;

        debug!(filename, bytes = written, dest = %dest.display(), "download finished");
        Ok(written)
    }
}

impl AssetStore for HttpServices {
    async fn ingest(&self, video: &Path, transcript_txt: &Path) -> Result<IngestResponse> {
        let form = Form::new()
            .part("video", file_part(video).await?)
            .part("transcript_file", file_part(transcript_txt).await?);

        let resp = self
            .client
            .post(self.config.endpoint("upload-video-with-txt"))
            .multipart(form)
            .send()
            .await?;
        parse_ingest(resp).await
    }

    async fn upload(&self, file: &Path) -> Result<String> {
        let form = Form::new().part("file", file_part(file).await?);
        let resp = self
            .client
            .post(self.config.endpoint("upload-clip"))
            .multipart(form)
            .send()
            .await?;
        parse_json::<UploadResponse>(resp).await?.into_file_path()
    }

    async fn list(&self) -> Result<AssetListing> {
        let resp = self
            .client
            .get(self.config.endpoint("list-clips"))
            .send()
            .await?;
        parse_json(resp).await
    }
}

impl RenderService for HttpServices {
    async fn submit(&self, request: &RenderRequest) -> Result<String> {
        let resp = self
            .client
            .post(self.config.endpoint("process-video"))
            .json(request)
            .send()
            .await?;
        parse_json::<RenderResponse>(resp)
            .await?
            .into_output_filename()
    }

    fn download_url(&self, filename: &str) -> String {
        let Ok(mut url) = Url::parse(&self.config.base_url) else {
            return self.config.endpoint(&format!("download/{filename}"));
        };
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("download").push(filename);
        }
        url.to_string()
    }
}

fn part_path(dest: &Path) -> PathBuf {
    PathBuf::from(format!("{}.part", dest.display()))
}

async fn copy_body(resp: &mut Response, part: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(part).await?;
    let mut written = 0u64;
    while let Some(chunk) = resp.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

async fn file_part(path: &Path) -> Result<Part> {
    let bytes = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| Error::validation(format!("not a file: {}", path.display())))?;
    Ok(Part::bytes(bytes).file_name(name))
}

async fn parse_json<T: DeserializeOwned>(resp: Response) -> Result<T> {
    let status = resp.status();
    let body = resp.bytes().await?;
    if !status.is_success() {
        return Err(status_error(status, &body));
    }
    if let Ok(ErrorBody { error }) = serde_json::from_slice::<ErrorBody>(&body) {
        return Err(Error::network(error));
    }
    serde_json::from_slice(&body)
        .map_err(|err| Error::network(format!("malformed response: {err}")))
}

async fn parse_ingest(resp: Response) -> Result<IngestResponse> {
    let status = resp.status();
    let body = resp.bytes().await?;
    if !status.is_success() {
        return Err(status_error(status, &body));
    }
    if let Ok(ErrorBody { error }) = serde_json::from_slice::<ErrorBody>(&body) {
        return Err(Error::network(error));
    }
    serde_json::from_slice(&body)
        .map_err(|err| Error::format(format!("malformed ingestion response: {err}")))
}

fn status_error(status: StatusCode, body: &[u8]) -> Error {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody { error }) => Error::network(format!("{status}: {error}")),
        Err(_) => Error::network(format!(
            "{status}: {}",
            String::from_utf8_lossy(body).trim()
        )),
    }
}
