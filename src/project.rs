//! JSON project files: a transcript plus the highlights to lay over it.
//!
//! Project files let a whole timeline be described up front and replayed into a [`Session`]
//! without a UI. Each highlight names its media with exactly one of `clip_path` or
//! `music_path`, and its words either by explicit `start_word`/`end_word` or by `phrase` (with
//! an optional 1-based `occurrence` for repeated phrases).
//!
//! Highlights are replayed through the session's range selector, the same path an interactive
//! front-end takes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::highlight::TrackKind;
use crate::id::HighlightId;
use crate::selection::CommitOpts;
use crate::services::IngestResponse;
use crate::session::Session;
use crate::transcript::{SubtitleBox, TranscriptEntry, TranscriptIndex};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFile {
    pub video_path: String,
    pub transcript: Vec<TranscriptEntry>,
    #[serde(default)]
    pub subtitles: Vec<SubtitleBox>,
    #[serde(default, alias = "highlight_assignments")]
    pub highlights: Vec<ProjectHighlight>,
    #[serde(default = "default_preserve_audio")]
    pub preserve_audio: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectHighlight {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phrase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_word: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_word: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_volume: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrence: Option<u32>,
}

fn default_preserve_audio() -> bool {
    true
}

impl ProjectFile {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|err| Error::validation(format!("invalid project file: {err}")))
    }

    /// A project with no highlights yet, seeded from an ingestion result.
    pub fn from_ingest(resp: IngestResponse) -> Self {
        Self {
            video_path: resp.video_path,
            transcript: resp.transcript,
            subtitles: resp.subtitles,
            highlights: Vec::new(),
            preserve_audio: default_preserve_audio(),
        }
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Load the transcript into `session` and replay every highlight.
    ///
    /// The session is taken by value and handed back only on success, so a project that fails
    /// halfway never leaves a caller with a partially applied timeline.
    pub fn apply(&self, mut session: Session) -> Result<(Session, Vec<HighlightId>)> {
        let transcript = TranscriptIndex::new(self.transcript.clone(), self.subtitles.clone())?;
        session.load_transcript(self.video_path.clone(), transcript);

        let mut ids = Vec::with_capacity(self.highlights.len());
        for (i, h) in self.highlights.iter().enumerate() {
            let id = replay(&mut session, h)
                .map_err(|err| Error::validation(format!("highlight {i}: {err}")))?;
            ids.push(id);
        }

        debug!(
            video_path = %self.video_path,
            highlights = ids.len(),
            "project applied"
        );
        Ok((session, ids))
    }
}

impl ProjectHighlight {
    /// Which track the highlight goes on, and its media reference.
    pub fn media(&self) -> Result<(TrackKind, &str)> {
        let clip = self.clip_path.as_deref().filter(|p| !p.trim().is_empty());
        let music = self.music_path.as_deref().filter(|p| !p.trim().is_empty());
        match (clip, music) {
            (Some(path), None) => Ok((TrackKind::Clip, path)),
            (None, Some(path)) => Ok((TrackKind::Music, path)),
            (Some(_), Some(_)) => Err(Error::validation(
                "both clip_path and music_path are set",
            )),
            (None, None) => Err(Error::validation("missing media")),
        }
    }

    /// The word range, resolved against `transcript` when given as a phrase.
    ///
    /// Explicit ranges are stored records, not gestures: a reversed range is rejected rather
    /// than normalized.
    pub fn resolve_range(&self, transcript: &TranscriptIndex) -> Result<(usize, usize)> {
        match (self.start_word, self.end_word) {
            (Some(start), Some(end)) if start > end => Err(Error::validation(format!(
                "invalid word range: start_word {start} is after end_word {end}"
            ))),
            (Some(start), Some(end)) => Ok((start, end)),
            (None, None) => {
                let phrase = self
                    .phrase
                    .as_deref()
                    .ok_or_else(|| Error::validation("missing selection"))?;
                transcript.find_phrase(phrase, self.occurrence.unwrap_or(1))
            }
            _ => Err(Error::validation(
                "start_word and end_word must be given together",
            )),
        }
    }
}

fn replay(session: &mut Session, h: &ProjectHighlight) -> Result<HighlightId> {
    let (kind, media_ref) = h.media()?;
    let transcript = session
        .transcript()
        .ok_or_else(|| Error::validation("no transcript loaded"))?;
    let (start, end) = h.resolve_range(transcript)?;

    let selector = session.selector_mut();
    selector.begin(start);
    selector.extend(end)?;

    let opts = CommitOpts {
        volume: h.music_volume,
        occurrence: h.occurrence,
    };
    session.commit_selection(kind, media_ref, opts)
}
