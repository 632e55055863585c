//! Normalizing both highlight tracks into a render request.
//!
//! The builder is the only producer of [`RenderRequest`]. It fails locally, before anything
//! touches the network, when there is nothing to render or a highlight no longer fits the
//! transcript it is about to be sent with.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::highlight::{Highlight, HighlightTrack, TrackKind};
use crate::transcript::{SubtitleBox, TranscriptEntry, TranscriptIndex};

/// One highlight on the wire.
///
/// Exactly one of `clip_path` / `music_path` is set, according to the track the highlight came
/// from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightPayload {
    pub phrase: String,
    pub start_word: usize,
    pub end_word: usize,
    pub clip_path: Option<String>,
    pub music_path: Option<String>,
    pub music_volume: f32,
    pub occurrence: u32,
}

/// The payload submitted to the rendering service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub video_path: String,
    pub highlights: Vec<HighlightPayload>,
    pub transcript: Vec<TranscriptEntry>,
    pub subtitles: Vec<SubtitleBox>,
    pub preserve_audio: bool,
}

#[derive(Debug, Clone)]
pub struct RenderRequestBuilder {
    video_path: String,
}

impl RenderRequestBuilder {
    pub fn new(video_path: impl Into<String>) -> Self {
        Self {
            video_path: video_path.into(),
        }
    }

    /// Merge both tracks and the transcript into a request.
    ///
    /// Clip highlights come first, then music highlights, each in insertion order.
    pub fn build(
        &self,
        transcript: &TranscriptIndex,
        clip_track: &HighlightTrack,
        music_track: &HighlightTrack,
        preserve_audio: bool,
    ) -> Result<RenderRequest> {
        if self.video_path.trim().is_empty() {
            return Err(Error::validation("no video uploaded"));
        }
        expect_kind(clip_track, TrackKind::Clip)?;
        expect_kind(music_track, TrackKind::Music)?;

        if clip_track.is_empty() && music_track.is_empty() {
            return Err(Error::validation("no highlights"));
        }

        let clips = clip_track.to_list().iter().map(|h| (TrackKind::Clip, h));
        let music = music_track.to_list().iter().map(|h| (TrackKind::Music, h));
        let highlights = clips
            .chain(music)
            .map(|(kind, h)| to_payload(transcript, kind, h))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            video_path = %self.video_path,
            clips = clip_track.len(),
            music = music_track.len(),
            preserve_audio,
            "render request built"
        );

        Ok(RenderRequest {
            video_path: self.video_path.clone(),
            highlights,
            transcript: transcript.entries().to_vec(),
            subtitles: transcript.subtitles().to_vec(),
            preserve_audio,
        })
    }
}

fn expect_kind(track: &HighlightTrack, kind: TrackKind) -> Result<()> {
    if track.kind() == kind {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "expected the {kind} track but got the {} track",
            track.kind()
        )))
    }
}

fn to_payload(
    transcript: &TranscriptIndex,
    kind: TrackKind,
    h: &Highlight,
) -> Result<HighlightPayload> {
    // Tracks validate on add, but the transcript may have been swapped since.
    if !transcript.contains_range(h.start_word, h.end_word) {
        return Err(Error::validation(format!(
            "out of range: {kind} highlight {} covers words {}..={} but transcript has {} words",
            h.id,
            h.start_word,
            h.end_word,
            transcript.len()
        )));
    }

    let (clip_path, music_path) = match kind {
        TrackKind::Clip => (Some(h.media_ref.clone()), None),
        TrackKind::Music => (None, Some(h.media_ref.clone())),
    };

    Ok(HighlightPayload {
        phrase: transcript.phrase(h.start_word, h.end_word)?,
        start_word: h.start_word,
        end_word: h.end_word,
        clip_path,
        music_path,
        music_volume: h.volume,
        occurrence: h.occurrence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::NewHighlight;
    use crate::id::SequentialIdGen;

    fn transcript(n: usize) -> TranscriptIndex {
        let words: Vec<String> = (0..n).map(|i| format!("w{i}")).collect();
        TranscriptIndex::from_words(words, vec![SubtitleBox::new(0, n - 1)])
            .expect("valid transcript")
    }

    fn tracks() -> (HighlightTrack, HighlightTrack) {
        (
            HighlightTrack::with_id_generator(TrackKind::Clip, SequentialIdGen::new("c")),
            HighlightTrack::with_id_generator(TrackKind::Music, SequentialIdGen::new("m")),
        )
    }

    #[test]
    fn clip_entries_precede_music_entries() -> anyhow::Result<()> {
        let t = transcript(10);
        let (mut clips, mut music) = tracks();
        music.add(&t, NewHighlight::new(0, 9, "audio/bed.mp3").with_volume(0.3))?;
        clips.add(&t, NewHighlight::new(5, 6, "clips/second.mp4"))?;
        clips.add(&t, NewHighlight::new(1, 2, "clips/third.mp4"))?;

        let req = RenderRequestBuilder::new("uploads/talk.mp4").build(&t, &clips, &music, true)?;

        assert_eq!(req.highlights.len(), 3);
        assert_eq!(req.highlights[0].clip_path.as_deref(), Some("clips/second.mp4"));
        assert_eq!(req.highlights[1].clip_path.as_deref(), Some("clips/third.mp4"));
        assert_eq!(req.highlights[2].music_path.as_deref(), Some("audio/bed.mp3"));
        assert_eq!(req.highlights[2].clip_path, None);
        assert_eq!(req.highlights[2].music_volume, 0.3);
        assert_eq!(req.highlights[0].phrase, "w5 w6");
        assert_eq!(req.transcript.len(), 10);
        assert_eq!(req.subtitles, vec![SubtitleBox::new(0, 9)]);
        assert!(req.preserve_audio);
        Ok(())
    }

    #[test]
    fn both_tracks_empty_is_a_validation_error() {
        let t = transcript(3);
        let (clips, music) = tracks();
        let err = RenderRequestBuilder::new("uploads/talk.mp4")
            .build(&t, &clips, &music, false)
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("no highlights"));
    }

    #[test]
    fn music_only_request_is_allowed() -> anyhow::Result<()> {
        let t = transcript(3);
        let (clips, mut music) = tracks();
        music.add(&t, NewHighlight::new(0, 2, "audio/a.wav"))?;
        let req = RenderRequestBuilder::new("v.mp4").build(&t, &clips, &music, false)?;
        assert_eq!(req.highlights.len(), 1);
        assert!(!req.preserve_audio);
        Ok(())
    }

    #[test]
    fn highlights_beyond_a_shorter_transcript_are_rejected() -> anyhow::Result<()> {
        let long = transcript(10);
        let short = transcript(4);
        let (mut clips, music) = tracks();
        clips.add(&long, NewHighlight::new(2, 8, "clips/a.mp4"))?;

        let err = RenderRequestBuilder::new("v.mp4")
            .build(&short, &clips, &music, true)
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("out of range"));
        Ok(())
    }

    #[test]
    fn swapped_tracks_are_rejected() -> anyhow::Result<()> {
        let t = transcript(3);
        let (mut clips, music) = tracks();
        clips.add(&t, NewHighlight::new(0, 0, "a.mp4"))?;
        let err = RenderRequestBuilder::new("v.mp4")
            .build(&t, &music, &clips, true)
            .unwrap_err();
        assert!(err.is_validation());
        Ok(())
    }

    #[test]
    fn missing_video_is_rejected() -> anyhow::Result<()> {
        let t = transcript(3);
        let (mut clips, music) = tracks();
        clips.add(&t, NewHighlight::new(0, 0, "a.mp4"))?;
        assert!(
            RenderRequestBuilder::new(" ")
                .build(&t, &clips, &music, true)
                .unwrap_err()
                .is_validation()
        );
        Ok(())
    }

    #[test]
    fn payload_serializes_null_for_the_other_media_kind() -> anyhow::Result<()> {
        let t = transcript(2);
        let (mut clips, music) = tracks();
        clips.add(&t, NewHighlight::new(0, 1, "clips/a.mp4"))?;
        let req = RenderRequestBuilder::new("v.mp4").build(&t, &clips, &music, true)?;

        let json = serde_json::to_value(&req)?;
        let h = &json["highlights"][0];
        assert_eq!(h["clip_path"], "clips/a.mp4");
        assert!(h["music_path"].is_null());
        assert_eq!(h["music_volume"], 1.0);
        assert_eq!(h["occurrence"], 1);
        assert_eq!(json["transcript"][0]["word"], "w0");
        assert_eq!(json["preserve_audio"], true);
        Ok(())
    }
}
