//! # webp-ingest
//!
//! Upload ingestion for image fields: decode whatever the user uploaded,
//! optionally scale it down to a maximum width, re-encode it as WebP at a
//! configurable quality, and store it on a named disk. Anything that can't be
//! converted is stored as the original file instead, so an upload is never
//! rejected because of its content.
//!
//! # Architecture
//!
//! ```text
//! UploadedInput ─→ IngestionPipeline::ingest ─→ IngestionResult
//!                   │  classify (declared MIME)
//!                   │  ImageCodec::decode
//!                   │  scale_down_to_width        (if max width set)
//!                   │  ImageCodec::encode → WebP
//!                   │  naming::resolve
//!                   └─ Disks::put                 (or fallback: original bytes)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Orchestrator, per-call config, result, and the fallback policy |
//! | [`imaging`] | Codec trait, `image`/`webp` codec, scale-down resizing |
//! | [`naming`] | Deterministic storage paths from the original filename |
//! | [`storage`] | `StorageSink` trait, atomic local disk, named disk registry |
//! | [`upload_field`] | Builder-style field adapter the host framework calls |
//! | [`config`] | `config.toml` loading, merging, and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Fallback Instead of Rejection
//!
//! Decode, resize, and encode failures are logged with `tracing` and the
//! original bytes are stored under the original name. The only error a caller
//! sees is a [`StorageError`](storage::StorageError) when even the fallback
//! could not be written.
//!
//! ## Trusting the Declared MIME Type
//!
//! Classification looks at the MIME type the upload declared, not at magic
//! bytes. A mislabeled file goes down the image path, fails to decode, and
//! lands in the fallback store like any other broken image.
//!
//! ## No Collision Handling
//!
//! Paths are a pure function of the directory and the original filename.
//! Two uploads with the same name resolve to the same path and the later
//! write wins at the storage layer.

pub mod config;
pub mod imaging;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod storage;
pub mod upload_field;

#[cfg(test)]
pub(crate) mod test_helpers;
