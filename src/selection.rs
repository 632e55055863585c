//! Turning pointer and keyboard gestures into a word range.
//!
//! The selector knows nothing about any particular UI toolkit. Front-ends translate their own
//! events (mouse down, drag over a word, shift-click) into the four calls below, and the selector
//! keeps the range consistent:
//!
//! - `begin` starts a fresh range on one word
//! - `extend` moves the far end while a selection is in progress
//! - `extend_from_shift` does the same but may also re-open the last committed range
//! - `commit` turns the range into a highlight on a track
//!
//! Ranges are stored in gesture order and always reported as `(min, max)`.

use tracing::debug;

use crate::error::{Error, Result};
use crate::highlight::{HighlightTrack, NewHighlight};
use crate::id::HighlightId;
use crate::transcript::TranscriptIndex;

/// A word range under construction, in gesture order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    pub start: usize,
    pub end: usize,
}

impl SelectionRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The range as `(min, max)`, whichever direction it was dragged.
    pub fn normalized(&self) -> (usize, usize) {
        (self.start.min(self.end), self.start.max(self.end))
    }

    pub fn contains(&self, index: usize) -> bool {
        let (lo, hi) = self.normalized();
        lo <= index && index <= hi
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    Selecting,
    Committed,
}

/// Optional metadata supplied at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CommitOpts {
    pub volume: Option<f32>,
    pub occurrence: Option<u32>,
}

/// The `Idle → Selecting → Committed` state machine behind word selection.
#[derive(Debug, Clone, Default)]
pub struct RangeSelector {
    state: SelectionState,
    range: Option<SelectionRange>,
}

impl RangeSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// The current range normalized to `(min, max)`, if there is one.
    ///
    /// A committed range stays visible here until the next `begin` or `cancel`.
    pub fn range(&self) -> Option<(usize, usize)> {
        self.range.map(|r| r.normalized())
    }

    /// The current range in gesture order.
    pub fn raw_range(&self) -> Option<SelectionRange> {
        self.range
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.range.is_some_and(|r| r.contains(index))
    }

    /// Start a new single-word selection, discarding any previous range.
    pub fn begin(&mut self, index: usize) {
        self.range = Some(SelectionRange::new(index, index));
        self.transition(SelectionState::Selecting);
    }

    /// Move the far end of an in-progress selection.
    ///
    /// Only valid while selecting. Repeating the same index is a no-op.
    pub fn extend(&mut self, index: usize) -> Result<()> {
        match (self.state, self.range.as_mut()) {
            (SelectionState::Selecting, Some(range)) => {
                range.end = index;
                Ok(())
            }
            _ => Err(Error::validation("missing selection: no selection in progress")),
        }
    }

    /// Shift-click extension.
    ///
    /// Behaves like [`extend`](Self::extend), but also re-opens a committed range for adjustment.
    /// With nothing selected at all it starts a new selection at `index`.
    pub fn extend_from_shift(&mut self, index: usize) {
        match self.state {
            SelectionState::Idle => self.begin(index),
            SelectionState::Committed => {
                self.transition(SelectionState::Selecting);
                self.set_end(index);
            }
            SelectionState::Selecting => self.set_end(index),
        }
    }

    /// Commit the in-progress range as a highlight on `track`.
    ///
    /// The media reference must be non-empty and the range must fit `transcript`. On any error
    /// the selector keeps selecting and the track is untouched. On success the range stays
    /// visible as the last committed selection.
    pub fn commit(
        &mut self,
        track: &mut HighlightTrack,
        transcript: &TranscriptIndex,
        media_ref: &str,
        opts: CommitOpts,
    ) -> Result<HighlightId> {
        let request = self.commit_request(media_ref, opts)?;
        let id = track.add(transcript, request)?;
        self.transition(SelectionState::Committed);
        Ok(id)
    }

    /// Validate the selection and produce the highlight-creation request it represents, without
    /// changing state.
    pub fn commit_request(&self, media_ref: &str, opts: CommitOpts) -> Result<NewHighlight> {
        let range = match (self.state, self.range) {
            (SelectionState::Selecting, Some(range)) => range,
            _ => return Err(Error::validation("missing selection")),
        };
        if media_ref.trim().is_empty() {
            return Err(Error::validation("missing media"));
        }

        let (start, end) = range.normalized();
        let mut request = NewHighlight::new(start, end, media_ref);
        request.volume = opts.volume;
        if let Some(occurrence) = opts.occurrence {
            request.occurrence = occurrence;
        }
        Ok(request)
    }

    /// Drop the range from any state without emitting anything.
    pub fn cancel(&mut self) {
        self.range = None;
        self.transition(SelectionState::Idle);
    }

    fn set_end(&mut self, index: usize) {
        match self.range.as_mut() {
            Some(range) => range.end = index,
            None => self.range = Some(SelectionRange::new(index, index)),
        }
    }

    fn transition(&mut self, next: SelectionState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, range = ?self.range, "selection transition");
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::TrackKind;
    use crate::transcript::SubtitleBox;

    fn transcript(n: usize) -> TranscriptIndex {
        let words: Vec<String> = (0..n).map(|i| format!("w{i}")).collect();
        TranscriptIndex::from_words(words, vec![SubtitleBox::new(0, n - 1)])
            .expect("valid transcript")
    }

    #[test]
    fn starts_idle_with_no_range() {
        let sel = RangeSelector::new();
        assert_eq!(sel.state(), SelectionState::Idle);
        assert_eq!(sel.range(), None);
        assert!(!sel.is_selected(0));
    }

    #[test]
    fn right_to_left_drag_is_normalized() -> anyhow::Result<()> {
        let mut sel = RangeSelector::new();
        sel.begin(4);
        sel.extend(1)?;
        assert_eq!(sel.range(), Some((1, 4)));
        assert_eq!(sel.raw_range(), Some(SelectionRange::new(4, 1)));
        assert!(sel.is_selected(2));
        assert!(!sel.is_selected(5));
        Ok(())
    }

    #[test]
    fn range_is_ordered_for_any_gesture_direction() -> anyhow::Result<()> {
        for start in 0..6 {
            for end in 0..6 {
                let mut sel = RangeSelector::new();
                sel.begin(start);
                sel.extend(end)?;
                let (lo, hi) = sel.range().expect("range present");
                assert!(lo <= hi);
                assert_eq!((lo, hi), (start.min(end), start.max(end)));
            }
        }
        Ok(())
    }

    #[test]
    fn repeated_extend_is_idempotent() -> anyhow::Result<()> {
        let mut sel = RangeSelector::new();
        sel.begin(2);
        sel.extend(5)?;
        let once = sel.raw_range();
        sel.extend(5)?;
        sel.extend(5)?;
        assert_eq!(sel.raw_range(), once);
        assert_eq!(sel.state(), SelectionState::Selecting);
        Ok(())
    }

    #[test]
    fn extend_requires_an_active_selection() {
        let mut sel = RangeSelector::new();
        assert!(sel.extend(3).unwrap_err().is_validation());
        assert_eq!(sel.range(), None);
    }

    #[test]
    fn commit_adds_normalized_range_and_keeps_it_visible() -> anyhow::Result<()> {
        let t = transcript(6);
        let mut clips = HighlightTrack::new(TrackKind::Clip);
        let mut sel = RangeSelector::new();

        sel.begin(3);
        sel.extend(1)?;
        let id = sel.commit(&mut clips, &t, "clips/a.mp4", CommitOpts::default())?;

        assert_eq!(sel.state(), SelectionState::Committed);
        assert_eq!(sel.range(), Some((1, 3)));
        let h = clips.get(&id).expect("committed highlight");
        assert_eq!((h.start_word, h.end_word), (1, 3));

        // A plain extend after commit is rejected; shift-extend re-opens the range.
        assert!(sel.extend(5).is_err());
        sel.extend_from_shift(5);
        assert_eq!(sel.state(), SelectionState::Selecting);
        assert_eq!(sel.range(), Some((3, 5)));
        Ok(())
    }

    #[test]
    fn commit_without_media_leaves_state_unchanged() -> anyhow::Result<()> {
        let t = transcript(4);
        let mut clips = HighlightTrack::new(TrackKind::Clip);
        let mut sel = RangeSelector::new();
        sel.begin(0);
        sel.extend(2)?;

        let err = sel
            .commit(&mut clips, &t, "", CommitOpts::default())
            .unwrap_err();
        assert!(err.to_string().contains("missing media"));
        assert_eq!(sel.state(), SelectionState::Selecting);
        assert_eq!(sel.range(), Some((0, 2)));
        assert!(clips.is_empty());
        Ok(())
    }

    #[test]
    fn commit_out_of_range_keeps_selecting() -> anyhow::Result<()> {
        let t = transcript(3);
        let mut clips = HighlightTrack::new(TrackKind::Clip);
        let mut sel = RangeSelector::new();
        sel.begin(1);
        sel.extend(7)?;

        let err = sel
            .commit(&mut clips, &t, "a.mp4", CommitOpts::default())
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(sel.state(), SelectionState::Selecting);
        assert!(clips.is_empty());
        Ok(())
    }

    #[test]
    fn commit_without_selection_is_rejected() {
        let t = transcript(3);
        let mut clips = HighlightTrack::new(TrackKind::Clip);
        let mut sel = RangeSelector::new();
        let err = sel
            .commit(&mut clips, &t, "a.mp4", CommitOpts::default())
            .unwrap_err();
        assert!(err.to_string().contains("missing selection"));
    }

    #[test]
    fn commit_passes_volume_and_occurrence() -> anyhow::Result<()> {
        let t = transcript(3);
        let mut music = HighlightTrack::new(TrackKind::Music);
        let mut sel = RangeSelector::new();
        sel.begin(0);

        let opts = CommitOpts {
            volume: Some(0.25),
            occurrence: Some(2),
        };
        let id = sel.commit(&mut music, &t, "audio/bed.mp3", opts)?;
        let h = music.get(&id).expect("committed highlight");
        assert_eq!(h.volume, 0.25);
        assert_eq!(h.occurrence, 2);
        Ok(())
    }

    #[test]
    fn cancel_discards_from_any_state() -> anyhow::Result<()> {
        let t = transcript(3);
        let mut clips = HighlightTrack::new(TrackKind::Clip);
        let mut sel = RangeSelector::new();

        sel.begin(1);
        sel.cancel();
        assert_eq!(sel.state(), SelectionState::Idle);
        assert_eq!(sel.range(), None);

        sel.begin(0);
        sel.commit(&mut clips, &t, "a.mp4", CommitOpts::default())?;
        sel.cancel();
        assert_eq!(sel.state(), SelectionState::Idle);
        assert_eq!(clips.len(), 1);
        Ok(())
    }

    #[test]
    fn shift_extend_while_selecting_moves_the_far_end() -> anyhow::Result<()> {
        let mut shifted = RangeSelector::new();
        shifted.begin(3);
        shifted.extend_from_shift(6);
        shifted.extend_from_shift(1);

        let mut dragged = RangeSelector::new();
        dragged.begin(3);
        dragged.extend(6)?;
        dragged.extend(1)?;

        assert_eq!(shifted.state(), SelectionState::Selecting);
        assert_eq!(shifted.raw_range(), dragged.raw_range());
        assert_eq!(shifted.range(), Some((1, 3)));
        Ok(())
    }

    #[test]
    fn shift_extend_from_idle_starts_a_selection() {
        let mut sel = RangeSelector::new();
        sel.extend_from_shift(2);
        assert_eq!(sel.state(), SelectionState::Selecting);
        assert_eq!(sel.range(), Some((2, 2)));
    }
}
