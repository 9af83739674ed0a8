//! Text services for the decoration pipeline: resolving request
//! locations against one file's text, patching stored anchor offsets
//! against a caller-modified buffer, and span containment checks.

mod error;
mod normalizer;
mod patcher;
mod span;

pub use error::{Result, TextError};
pub use normalizer::Normalizer;
pub use patcher::Patcher;
pub use span::in_span_bounds;
