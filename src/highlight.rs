//! Highlight tracks: committed word ranges paired with a media reference.
//!
//! There are exactly two tracks per session, one for video clips and one for music. A record's
//! kind is decided by the track that holds it, never by a field on the record, so a highlight
//! can't end up with both (or neither) media kinds set.
//!
//! Entries are identified by a stable [`HighlightId`] rather than their position. Removing one
//! highlight leaves the identity and coverage of every other highlight untouched.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::id::{HighlightId, IdGenerator, UuidIdGen};
use crate::transcript::TranscriptIndex;

/// Which of the two overlay tracks a highlight belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    /// Video clips overlaid on the main video.
    Clip,

    /// Music or other audio mixed under the main video.
    Music,
}

impl TrackKind {
    pub fn default_volume(self) -> f32 {
        match self {
            Self::Clip | Self::Music => 1.0,
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clip => f.write_str("clip"),
            Self::Music => f.write_str("music"),
        }
    }
}

/// A committed highlight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Highlight {
    pub id: HighlightId,
    pub start_word: usize,
    pub end_word: usize,
    pub media_ref: String,
    pub volume: f32,
    pub occurrence: u32,
}

impl Highlight {
    pub fn covers(&self, index: usize) -> bool {
        self.start_word <= index && index <= self.end_word
    }
}

/// A request to create a highlight, as emitted by a selection commit.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHighlight {
    pub start_word: usize,
    pub end_word: usize,
    pub media_ref: String,

    /// Gain applied to the media. `None` means the track's default.
    pub volume: Option<f32>,

    pub occurrence: u32,
}

impl NewHighlight {
    pub fn new(start_word: usize, end_word: usize, media_ref: impl Into<String>) -> Self {
        Self {
            start_word,
            end_word,
            media_ref: media_ref.into(),
            volume: None,
            occurrence: 1,
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = Some(volume);
        self
    }

    pub fn with_occurrence(mut self, occurrence: u32) -> Self {
        self.occurrence = occurrence;
        self
    }
}

/// Insertion-ordered collection of highlights of one [`TrackKind`].
pub struct HighlightTrack {
    kind: TrackKind,
    entries: Vec<Highlight>,
    ids: Box<dyn IdGenerator>,
}

impl HighlightTrack {
    pub fn new(kind: TrackKind) -> Self {
        Self::with_id_generator(kind, UuidIdGen)
    }

    pub fn with_id_generator(kind: TrackKind, ids: impl IdGenerator + 'static) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            ids: Box::new(ids),
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    /// Validate and append a highlight, returning its freshly generated id.
    ///
    /// The range must satisfy `start_word <= end_word < transcript.len()`. On error the track is
    /// left exactly as it was.
    pub fn add(&mut self, transcript: &TranscriptIndex, new: NewHighlight) -> Result<HighlightId> {
        if !transcript.contains_range(new.start_word, new.end_word) {
            return Err(Error::validation(format!(
                "out of range: words {}..={} on a transcript of {} words",
                new.start_word,
                new.end_word,
                transcript.len()
            )));
        }
        if new.media_ref.trim().is_empty() {
            return Err(Error::validation("missing media"));
        }

        let volume = new.volume.unwrap_or(self.kind.default_volume());
        if !volume.is_finite() || volume < 0.0 {
            return Err(Error::validation(format!("invalid volume {volume}")));
        }
        if new.occurrence == 0 {
            return Err(Error::validation("occurrence must be at least 1"));
        }

        let id = self.ids.next_id();
        debug!(
            track = %self.kind,
            %id,
            start_word = new.start_word,
            end_word = new.end_word,
            media_ref = %new.media_ref,
            "highlight added"
        );

        self.entries.push(Highlight {
            id: id.clone(),
            start_word: new.start_word,
            end_word: new.end_word,
            media_ref: new.media_ref,
            volume,
            occurrence: new.occurrence,
        });
        Ok(id)
    }

    /// Remove the highlight with `id`, returning it if it was present.
    ///
    /// Removing an id that is already gone is a no-op.
    pub fn remove(&mut self, id: &HighlightId) -> Option<Highlight> {
        let pos = self.entries.iter().position(|h| &h.id == id)?;
        let removed = self.entries.remove(pos);
        debug!(track = %self.kind, %id, "highlight removed");
        Some(removed)
    }

    pub fn get(&self, id: &HighlightId) -> Option<&Highlight> {
        self.entries.iter().find(|h| &h.id == id)
    }

    pub fn is_word_covered(&self, index: usize) -> bool {
        self.entries.iter().any(|h| h.covers(index))
    }

    /// Highlights covering `index`, oldest first.
    pub fn covering_entries(&self, index: usize) -> Vec<&Highlight> {
        self.entries.iter().filter(|h| h.covers(index)).collect()
    }

    /// The most recently added highlight covering `index`; the one drawn on top.
    pub fn topmost_at(&self, index: usize) -> Option<&Highlight> {
        self.entries.iter().rev().find(|h| h.covers(index))
    }

    /// All highlights in insertion order.
    pub fn to_list(&self) -> &[Highlight] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every highlight. Used when the transcript they index is replaced.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl fmt::Debug for HighlightTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HighlightTrack")
            .field("kind", &self.kind)
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}
