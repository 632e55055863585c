//! Session-scoped editing state.
//!
//! A [`Session`] owns everything one editing session touches: the ingested transcript, the
//! selection state machine, both highlight tracks, the last asset listing, and the in-flight
//! flags for network actions. Front-ends hold one `Session` and pass it around explicitly;
//! there is no ambient global state.
//!
//! Concurrency model:
//! - Mutations (gestures, commits, removals, ingestion) take `&mut self` and happen on the
//!   driving thread.
//! - Network actions that don't touch the timeline (`upload_asset`, `refresh_assets`,
//!   `process`) take `&self`, so a front-end can have several outstanding at once. Upload and
//!   process are each guarded against duplicate submission.
//! - Asset listings are last-response-wins: if two listings are outstanding, whichever answers
//!   last overwrites the other. This is accepted, not corrected.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use tracing::{info, warn};

use crate::error::{Action, Error, Result};
use crate::highlight::{Highlight, HighlightTrack, TrackKind};
use crate::id::{HighlightId, IdGenerator};
use crate::in_flight::InFlight;
use crate::render_request::{RenderRequest, RenderRequestBuilder};
use crate::selection::{CommitOpts, RangeSelector};
use crate::services::{AssetListing, AssetStore, IngestResponse, RenderService};
use crate::transcript::TranscriptIndex;

#[derive(Debug)]
pub struct Session {
    video_path: Option<String>,
    transcript: Option<TranscriptIndex>,
    selector: RangeSelector,
    clips: HighlightTrack,
    music: HighlightTrack,
    assets: Mutex<AssetListing>,
    upload: InFlight,
    process: InFlight,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::from_tracks(
            HighlightTrack::new(TrackKind::Clip),
            HighlightTrack::new(TrackKind::Music),
        )
    }

    /// Create a session whose tracks draw ids from the given generators.
    pub fn with_id_generators(
        clip_ids: impl IdGenerator + 'static,
        music_ids: impl IdGenerator + 'static,
    ) -> Self {
        Self::from_tracks(
            HighlightTrack::with_id_generator(TrackKind::Clip, clip_ids),
            HighlightTrack::with_id_generator(TrackKind::Music, music_ids),
        )
    }

    fn from_tracks(clips: HighlightTrack, music: HighlightTrack) -> Self {
        Self {
            video_path: None,
            transcript: None,
            selector: RangeSelector::new(),
            clips,
            music,
            assets: Mutex::new(AssetListing::default()),
            upload: InFlight::new(Action::Upload),
            process: InFlight::new(Action::Process),
        }
    }

    // ── Transcript ──────────────────────────────────────────────────────────

    /// Validate an ingestion response and make it the session's document.
    ///
    /// On a format error the previous transcript and tracks are kept as they were. On success
    /// both tracks and the selection are cleared, since their ranges index the old transcript.
    pub fn load_ingest(&mut self, resp: &IngestResponse) -> Result<()> {
        let index = TranscriptIndex::from_ingest(resp)?;
        self.load_transcript(resp.video_path.clone(), index);
        Ok(())
    }

    /// Install an already validated transcript for `video_path`.
    pub fn load_transcript(&mut self, video_path: impl Into<String>, transcript: TranscriptIndex) {
        self.video_path = Some(video_path.into());
        self.transcript = Some(transcript);
        self.selector.cancel();
        self.clips.clear();
        self.music.clear();
    }

    pub fn video_path(&self) -> Option<&str> {
        self.video_path.as_deref()
    }

    pub fn transcript(&self) -> Option<&TranscriptIndex> {
        self.transcript.as_ref()
    }

    /// Drop the document, the selection and all highlights.
    pub fn reset(&mut self) {
        self.video_path = None;
        self.transcript = None;
        self.selector.cancel();
        self.clips.clear();
        self.music.clear();
    }

    // ── Selection and tracks ────────────────────────────────────────────────

    pub fn selector(&self) -> &RangeSelector {
        &self.selector
    }

    pub fn selector_mut(&mut self) -> &mut RangeSelector {
        &mut self.selector
    }

    pub fn track(&self, kind: TrackKind) -> &HighlightTrack {
        match kind {
            TrackKind::Clip => &self.clips,
            TrackKind::Music => &self.music,
        }
    }

    /// Commit the current selection to the `kind` track.
    pub fn commit_selection(
        &mut self,
        kind: TrackKind,
        media_ref: &str,
        opts: CommitOpts,
    ) -> Result<HighlightId> {
        let transcript = self.transcript.as_ref().ok_or_else(no_transcript)?;
        let track = match kind {
            TrackKind::Clip => &mut self.clips,
            TrackKind::Music => &mut self.music,
        };
        self.selector.commit(track, transcript, media_ref, opts)
    }

    pub fn remove_highlight(&mut self, kind: TrackKind, id: &HighlightId) -> Option<Highlight> {
        match kind {
            TrackKind::Clip => self.clips.remove(id),
            TrackKind::Music => self.music.remove(id),
        }
    }

    /// Build the render request for the current document without submitting it.
    pub fn build_request(&self, preserve_audio: bool) -> Result<RenderRequest> {
        let transcript = self.transcript.as_ref().ok_or_else(no_transcript)?;
        let video_path = self.video_path.as_deref().unwrap_or_default();
        RenderRequestBuilder::new(video_path).build(
            transcript,
            &self.clips,
            &self.music,
            preserve_audio,
        )
    }

    // ── Network actions ─────────────────────────────────────────────────────

    pub fn is_in_flight(&self, action: Action) -> bool {
        match action {
            Action::Upload => self.upload.is_busy(),
            Action::Process => self.process.is_busy(),
        }
    }

    /// Upload a video and script to the ingestion service and load the result.
    pub async fn ingest<S: AssetStore>(
        &mut self,
        store: &S,
        video: &Path,
        transcript_txt: &Path,
    ) -> Result<()> {
        let resp = {
            let _guard = self.upload.try_acquire()?;
            store
                .ingest(video, transcript_txt)
                .await
                .inspect_err(|err| warn!(error = %err, "ingestion failed"))?
        };
        self.load_ingest(&resp)
    }

    /// Upload a clip or audio file, then refresh the asset listing.
    ///
    /// Returns the stored path. A failed refresh is logged but does not fail the upload.
    pub async fn upload_asset<S: AssetStore>(&self, store: &S, file: &Path) -> Result<String> {
        let _guard = self.upload.try_acquire()?;
        let stored = store
            .upload(file)
            .await
            .inspect_err(|err| warn!(error = %err, file = %file.display(), "upload failed"))?;
        info!(file_path = %stored, "asset uploaded");

        if let Err(err) = self.refresh_assets(store).await {
            warn!(error = %err, "asset listing refresh failed after upload");
        }
        Ok(stored)
    }

    /// Fetch the asset listing and store it as the latest known listing.
    pub async fn refresh_assets<S: AssetStore>(&self, store: &S) -> Result<AssetListing> {
        let listing = store.list().await?;
        *self.assets_lock() = listing.clone();
        Ok(listing)
    }

    /// The most recently received asset listing.
    pub fn assets(&self) -> AssetListing {
        self.assets_lock().clone()
    }

    /// Build the render request and submit it, returning the output filename.
    ///
    /// Validation happens before the network call; an empty timeline never reaches the service.
    pub async fn process<R: RenderService>(
        &self,
        service: &R,
        preserve_audio: bool,
    ) -> Result<String> {
        let _guard = self.process.try_acquire()?;
        let request = self.build_request(preserve_audio)?;

        info!(
            video_path = %request.video_path,
            highlights = request.highlights.len(),
            preserve_audio,
            "submitting render request"
        );
        let filename = service
            .submit(&request)
            .await
            .inspect_err(|err| warn!(error = %err, "render request failed"))?;
        info!(output_filename = %filename, "render finished");
        Ok(filename)
    }

    fn assets_lock(&self) -> MutexGuard<'_, AssetListing> {
        self.assets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn no_transcript() -> Error {
    Error::validation("no transcript loaded")
}
