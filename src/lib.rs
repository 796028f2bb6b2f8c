//! revlapse turns the saved history of a single document into a timelapse video.
//!
//! The pipeline runs in explicit stages, each a function from explicit inputs to explicit
//! outputs:
//!
//! - Collect versions into stills plus a [`Ledger`] with [`collect_previews`] (authenticated
//!   preview URLs) or [`collect_revisions`] (a cloud store's revision history)
//! - Caption every still on a shared canvas with [`composite_frames`]
//! - Encode the frames into a video through a [`FrameSink`] with [`assemble_timelapse`]
//!
//! Files go through [`Storage`], network access through [`PreviewFetcher`] and
//! [`RevisionSource`], and text through [`CaptionRenderer`], so every stage runs in memory under
//! test.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod foundation;

/// Stills: format conversion, image decoding, caption fonts.
pub mod assets;
/// Version collectors.
pub mod collect;
/// Run configuration.
pub mod config;
/// Encoding sinks.
pub mod encode;
/// The metadata ledger.
pub mod ledger;
/// Frame rendering.
pub mod render;
/// Filesystem seam.
pub mod storage;
/// Timelapse assembly.
pub mod timelapse;

pub use crate::foundation::core::{Canvas, Fps, FrameIndex};
pub use crate::foundation::error::{RevlapseError, RevlapseResult};
pub use crate::foundation::timestamp::{CAPTION_FORMAT, Timestamp};

pub use crate::assets::convert::{ConverterRegistry, FormatConverter, PdfRasterizer, PngCopy};
pub use crate::collect::dropbox::DropboxClient;
pub use crate::collect::previews::{
    FetchResponse, HttpFetcher, PreviewFetcher, PreviewRecord, collect_previews,
    parse_preview_records,
};
pub use crate::collect::revisions::{Revision, RevisionSource, collect_revisions};
pub use crate::collect::session::{SessionCredentials, parse_curl};
pub use crate::collect::{CollectFailure, CollectOutcome, CollectReport};
pub use crate::config::{CollectConfig, Config, TimelapseConfig};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sink::{FrameRGBA, FrameSink, InMemorySink, SinkConfig};
pub use crate::ledger::{Ledger, LedgerEntry};
pub use crate::render::caption::{
    BlockCaption, CaptionExtent, CaptionRenderer, ParleyCaption, caption_for_style,
};
pub use crate::render::compositor::{CompositeReport, composite_frames};
pub use crate::storage::{FsStorage, MemStorage, Storage};
pub use crate::timelapse::{AssembleStats, TimelapsePlan, assemble_timelapse};
