//! CD-i MCD212 video decoder: display control programs, plane decoding, matte and transparency
//! handling, plane compositing and the hardware cursor

pub mod api;
pub mod frame;
pub mod mcd212;
pub mod memory;
mod num;

pub use api::{CdiError, CdiVideo, CdiVideoConfig, InterruptSink, Renderer, TickEffect, VideoError};
pub use cdi_config::{CdiAspectRatio, CodingMethodPolicy};
