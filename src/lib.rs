//! Non-destructive raster image editing engine: per-image documents with a
//! replayable adjustment chain, bounded snapshot history, crop gesture
//! handling, and a render budget for large frames. Decode, OCR, text
//! rendering, and export encoding stay behind trait seams.

pub mod adjust;
pub mod config;
pub mod crop;
pub mod document;
pub mod error;
pub mod geometry;
pub mod interaction;
pub mod logging;
pub mod overlay;
pub mod raster;
pub mod render;
pub mod session;
pub mod tool;

pub use error::{AppError, AppResult};
