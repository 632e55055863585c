//! `reelmark`: a transcript/highlight timeline for clip and music overlays.
//!
//! This crate provides:
//! - A validated, word-indexed transcript with subtitle boxes
//! - A range-selection state machine that turns gestures into word ranges
//! - Two highlight tracks (clips, music) with overlap-aware coverage queries
//! - A builder that normalizes both tracks into a render request
//! - Service contracts (and an HTTP client) for the external asset and rendering services
//!
//! Front-ends own a single [`Session`] and drive it through these pieces; everything visual is
//! left to them.

pub mod error;

// Timeline model.
pub mod highlight;
pub mod id;
pub mod selection;
pub mod transcript;

// Render request assembly.
pub mod render_request;

// Session state and guarded network actions.
pub mod in_flight;
pub mod project;
pub mod session;

// External service contracts and configuration.
pub mod config;
#[cfg(feature = "client")]
pub mod http_services;
pub mod services;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

pub use config::ServiceConfig;
pub use error::{Action, Error, ErrorKind, Result};
pub use highlight::{Highlight, HighlightTrack, NewHighlight, TrackKind};
#[cfg(feature = "client")]
pub use http_services::HttpServices;
pub use id::{HighlightId, IdGenerator, SequentialIdGen, UuidIdGen};
pub use in_flight::{InFlight, InFlightGuard};
pub use project::{ProjectFile, ProjectHighlight};
pub use render_request::{HighlightPayload, RenderRequest, RenderRequestBuilder};
pub use selection::{CommitOpts, RangeSelector, SelectionRange, SelectionState};
pub use services::{
    AssetListing, AssetStore, IngestResponse, RenderResponse, RenderService, UploadResponse,
};
pub use session::Session;
pub use transcript::{SubtitleBox, TranscriptEntry, TranscriptIndex, Word};

#[cfg(feature = "logging")]
pub use logging::init as init_logging;
