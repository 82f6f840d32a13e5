//! avsrt Segmenter
//!
//! Turns recognized speech segments into display-ready subtitle text:
//! - **Gate:** Drop segments unlikely to be genuine speech
//! - **Block Builder:** Merge, split and consolidate segments into blocks
//!   under duration, length and reading-rate ceilings
//! - **Normalize:** Canonical punctuation and whitespace
//! - **Wrap:** Fixed-width line wrapping with forced-overflow fallback
//!
//! This crate is pure computation with no I/O. All inputs are data, all
//! outputs are data, and every transform is deterministic.

pub mod builder;
pub mod consolidate;
pub mod gate;
pub mod merge;
pub mod normalize;
pub mod split;
pub mod text;
pub mod wrap;

pub use builder::{BlockBuilder, BuildOutcome, BuildWarning};
pub use gate::{DropReason, GateOutcome, SegmentGate};
pub use normalize::normalize_text;
pub use wrap::{wrap_text, WrappedText};
