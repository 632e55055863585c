//! The word-indexed transcript every range and highlight points into.
//!
//! A [`TranscriptIndex`] is built once per ingestion and never mutated afterwards. Construction
//! is where the ingestion service's output gets checked: subtitle boxes must tile the word list
//! exactly, with no gaps, overlaps, or dangling indices. Bad data is rejected, never repaired.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::services::IngestResponse;

/// A single transcript token with a stable position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub index: usize,
    pub text: String,
}

/// A transcript entry as exchanged with the external services.
///
/// Only `word` is interpreted here. Timing and any other fields the ingestion service attaches
/// are kept verbatim so they can be echoed back to the rendering service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub word: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TranscriptEntry {
    pub fn new(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// A contiguous group of words shown together as one subtitle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleBox {
    pub start_word: usize,
    pub end_word: usize,
}

impl SubtitleBox {
    pub fn new(start_word: usize, end_word: usize) -> Self {
        Self {
            start_word,
            end_word,
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start_word <= index && index <= self.end_word
    }

    /// Number of words in the box.
    pub fn word_count(&self) -> usize {
        self.end_word - self.start_word + 1
    }
}

/// Immutable ordered word sequence plus its subtitle partition.
#[derive(Debug, Clone)]
pub struct TranscriptIndex {
    entries: Vec<TranscriptEntry>,
    words: Vec<Word>,
    subtitles: Vec<SubtitleBox>,
}

impl TranscriptIndex {
    /// Build an index from wire entries and subtitle boxes.
    ///
    /// Fails with [`Error::Format`] unless `subtitles` partitions `[0, entries.len())`.
    pub fn new(entries: Vec<TranscriptEntry>, subtitles: Vec<SubtitleBox>) -> Result<Self> {
        validate_partition(entries.len(), &subtitles)?;

        let words = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| Word {
                index,
                text: entry.word.clone(),
            })
            .collect();

        Ok(Self {
            entries,
            words,
            subtitles,
        })
    }

    /// Build an index from bare word strings.
    pub fn from_words<I, S>(words: I, subtitles: Vec<SubtitleBox>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = words.into_iter().map(TranscriptEntry::new).collect();
        Self::new(entries, subtitles)
    }

    /// Validate an ingestion response and build the index from it.
    pub fn from_ingest(resp: &IngestResponse) -> Result<Self> {
        if resp.word_count != resp.transcript.len() {
            warn!(
                word_count = resp.word_count,
                transcript_len = resp.transcript.len(),
                "ingestion word count mismatch"
            );
            return Err(Error::format(format!(
                "word_count is {} but transcript has {} words",
                resp.word_count,
                resp.transcript.len()
            )));
        }

        let index = Self::new(resp.transcript.clone(), resp.subtitles.clone()).inspect_err(
            |err| warn!(error = %err, video_path = %resp.video_path, "rejected ingestion payload"),
        )?;

        info!(
            words = index.len(),
            subtitles = index.subtitles.len(),
            video_path = %resp.video_path,
            "transcript ingested"
        );
        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn word_at(&self, index: usize) -> Result<&Word> {
        self.words.get(index).ok_or(Error::Index {
            index,
            len: self.len(),
        })
    }

    /// The subtitle box containing `index`.
    pub fn subtitle_of(&self, index: usize) -> Result<&SubtitleBox> {
        self.check_index(index)?;

        // Boxes are sorted and contiguous, so the first box ending at or after `index` holds it.
        let pos = self.subtitles.partition_point(|b| b.end_word < index);
        self.subtitles.get(pos).ok_or(Error::Index {
            index,
            len: self.len(),
        })
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn subtitles(&self) -> &[SubtitleBox] {
        &self.subtitles
    }

    /// Whether `[start, end]` is a valid, ordered range inside the transcript.
    pub fn contains_range(&self, start: usize, end: usize) -> bool {
        start <= end && end < self.len()
    }

    /// The words of `[start, end]` joined by single spaces.
    pub fn phrase(&self, start: usize, end: usize) -> Result<String> {
        self.check_index(start)?;
        self.check_index(end)?;
        if start > end {
            return Err(Error::validation(format!(
                "range start {start} is after end {end}"
            )));
        }

        let text: Vec<&str> = self.words[start..=end]
            .iter()
            .map(|w| w.text.as_str())
            .collect();
        Ok(text.join(" "))
    }

    /// Locate the `occurrence`-th (1-based) match of `phrase`.
    ///
    /// Words are compared case-insensitively with punctuation stripped, so `"Hello,"` matches
    /// `"hello"`.
    pub fn find_phrase(&self, phrase: &str, occurrence: u32) -> Result<(usize, usize)> {
        let target: Vec<String> = phrase.split_whitespace().map(normalize_word).collect();
        if target.is_empty() {
            return Err(Error::validation("phrase must contain at least one word"));
        }
        if occurrence == 0 {
            return Err(Error::validation("occurrence must be at least 1"));
        }

        let normalized: Vec<String> = self.words.iter().map(|w| normalize_word(&w.text)).collect();

        normalized
            .windows(target.len())
            .enumerate()
            .filter(|(_, window)| *window == target.as_slice())
            .map(|(start, _)| (start, start + target.len() - 1))
            .nth(occurrence as usize - 1)
            .ok_or_else(|| {
                Error::validation(format!(
                    "phrase '{phrase}' occurrence {occurrence} not found in transcript"
                ))
            })
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.len() {
            Ok(())
        } else {
            Err(Error::Index {
                index,
                len: self.len(),
            })
        }
    }
}

fn normalize_word(token: &str) -> String {
    token
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Check that `boxes` tiles `[0, len)` in order with no gaps or overlaps.
fn validate_partition(len: usize, boxes: &[SubtitleBox]) -> Result<()> {
    if len == 0 {
        if boxes.is_empty() {
            return Ok(());
        }
        return Err(Error::format(
            "subtitle boxes supplied for an empty transcript",
        ));
    }

    let Some(first) = boxes.first() else {
        return Err(Error::format(format!(
            "no subtitle boxes for a transcript of {len} words"
        )));
    };
    if first.start_word != 0 {
        return Err(Error::format(format!(
            "first subtitle box starts at word {} instead of 0",
            first.start_word
        )));
    }

    let mut expected_start = 0;
    for (i, b) in boxes.iter().enumerate() {
        if b.start_word > b.end_word {
            return Err(Error::format(format!(
                "subtitle box {i} starts at word {} after its end word {}",
                b.start_word, b.end_word
            )));
        }
        if b.end_word >= len {
            return Err(Error::format(format!(
                "subtitle box {i} ends at word {} but transcript has {len} words",
                b.end_word
            )));
        }
        if b.start_word > expected_start {
            return Err(Error::format(format!(
                "gap before subtitle box {i}: words {expected_start}..{} are not covered",
                b.start_word
            )));
        }
        if b.start_word < expected_start {
            return Err(Error::format(format!(
                "subtitle box {i} overlaps the previous box at word {}",
                b.start_word
            )));
        }
        expected_start = b.end_word + 1;
    }

    if expected_start != len {
        return Err(Error::format(format!(
            "subtitles stop at word {} but transcript has {len} words",
            expected_start - 1
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("w{i}")).collect()
    }

    #[test]
    fn single_box_covers_every_word() -> anyhow::Result<()> {
        let idx = TranscriptIndex::from_words(words(5), vec![SubtitleBox::new(0, 4)])?;
        assert_eq!(idx.len(), 5);
        for i in 0..5 {
            assert_eq!(*idx.subtitle_of(i)?, SubtitleBox::new(0, 4));
        }
        Ok(())
    }

    #[test]
    fn subtitle_of_finds_the_containing_box() -> anyhow::Result<()> {
        let boxes = vec![
            SubtitleBox::new(0, 1),
            SubtitleBox::new(2, 2),
            SubtitleBox::new(3, 6),
            SubtitleBox::new(7, 9),
        ];
        let idx = TranscriptIndex::from_words(words(10), boxes.clone())?;
        for i in 0..10 {
            let b = idx.subtitle_of(i)?;
            assert!(b.contains(i), "box {b:?} should contain {i}");
        }
        assert_eq!(*idx.subtitle_of(2)?, boxes[1]);
        assert_eq!(*idx.subtitle_of(9)?, boxes[3]);
        Ok(())
    }

    #[test]
    fn out_of_range_lookups_are_index_errors() -> anyhow::Result<()> {
        let idx = TranscriptIndex::from_words(words(3), vec![SubtitleBox::new(0, 2)])?;
        assert!(matches!(
            idx.word_at(3),
            Err(Error::Index { index: 3, len: 3 })
        ));
        assert!(matches!(idx.subtitle_of(10), Err(Error::Index { .. })));
        assert_eq!(idx.word_at(2)?.text, "w2");
        Ok(())
    }

    #[test]
    fn gap_in_partition_is_rejected() {
        let err = TranscriptIndex::from_words(
            words(5),
            vec![SubtitleBox::new(0, 2), SubtitleBox::new(4, 4)],
        )
        .unwrap_err();
        assert!(err.is_format());
        assert!(err.to_string().contains("gap"));
    }

    #[test]
    fn overlap_in_partition_is_rejected() {
        let err = TranscriptIndex::from_words(
            words(5),
            vec![SubtitleBox::new(0, 2), SubtitleBox::new(2, 4)],
        )
        .unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn partition_must_reach_the_last_word() {
        let err = TranscriptIndex::from_words(words(5), vec![SubtitleBox::new(0, 3)]).unwrap_err();
        assert!(err.is_format());

        let err = TranscriptIndex::from_words(words(5), vec![SubtitleBox::new(0, 5)]).unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn partition_must_start_at_zero_and_be_ordered() {
        assert!(
            TranscriptIndex::from_words(words(3), vec![SubtitleBox::new(1, 2)])
                .unwrap_err()
                .is_format()
        );
        assert!(
            TranscriptIndex::from_words(words(3), vec![SubtitleBox::new(0, 2), SubtitleBox::new(2, 1)])
                .unwrap_err()
                .is_format()
        );
    }

    #[test]
    fn missing_boxes_are_rejected_for_non_empty_transcripts() {
        assert!(
            TranscriptIndex::from_words(words(2), Vec::new())
                .unwrap_err()
                .is_format()
        );
    }

    #[test]
    fn empty_transcript_needs_no_boxes() -> anyhow::Result<()> {
        let idx = TranscriptIndex::from_words(Vec::<String>::new(), Vec::new())?;
        assert!(idx.is_empty());
        assert!(
            TranscriptIndex::from_words(Vec::<String>::new(), vec![SubtitleBox::new(0, 0)])
                .unwrap_err()
                .is_format()
        );
        Ok(())
    }

    #[test]
    fn phrase_joins_words_in_range() -> anyhow::Result<()> {
        let idx = TranscriptIndex::from_words(
            ["treat", "yo", "self", "today"],
            vec![SubtitleBox::new(0, 3)],
        )?;
        assert_eq!(idx.phrase(0, 2)?, "treat yo self");
        assert_eq!(idx.phrase(3, 3)?, "today");
        assert!(idx.phrase(2, 1).unwrap_err().is_validation());
        assert!(matches!(idx.phrase(0, 4), Err(Error::Index { .. })));
        Ok(())
    }

    #[test]
    fn find_phrase_honours_occurrence_and_normalization() -> anyhow::Result<()> {
        let idx = TranscriptIndex::from_words(
            ["Hello,", "world.", "and", "hello", "WORLD!"],
            vec![SubtitleBox::new(0, 4)],
        )?;
        assert_eq!(idx.find_phrase("hello world", 1)?, (0, 1));
        assert_eq!(idx.find_phrase("Hello world", 2)?, (3, 4));
        assert!(idx.find_phrase("hello world", 3).unwrap_err().is_validation());
        assert!(idx.find_phrase("hello", 0).unwrap_err().is_validation());
        assert!(idx.find_phrase("   ", 1).unwrap_err().is_validation());
        Ok(())
    }

    #[test]
    fn entries_keep_extra_fields() -> anyhow::Result<()> {
        let entry: TranscriptEntry = serde_json::from_value(serde_json::json!({
            "word": "hi",
            "start_time": 0.5,
            "end_time": 0.9
        }))?;
        assert_eq!(entry.word, "hi");
        assert_eq!(entry.extra["start_time"], 0.5);

        let back = serde_json::to_value(&entry)?;
        assert_eq!(back["end_time"], 0.9);
        Ok(())
    }
}
