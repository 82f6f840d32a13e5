//! avsrt Data Model
//!
//! Defines the data contracts shared by every pipeline stage:
//! - **Segments:** Timestamped spans of recognized speech text
//! - **Blocks:** Display-ready subtitle units built from segments
//! - **Config:** Gate and block-building parameters, serialized canonically
//!   so they can take part in cache fingerprints
//! - **Subtitle:** The SRT track format (render, parse, timestamps)
//!
//! All times are integer milliseconds from the start of the media.

pub mod block;
pub mod config;
pub mod error;
pub mod language;
pub mod segment;
pub mod subtitle;

pub use block::*;
pub use config::*;
pub use error::*;
pub use language::*;
pub use segment::*;
pub use subtitle::*;
