//! Request extractors whose rejections answer with the common error body.
//!
//! - [`Json`] for request bodies
//! - [`Path`] for path parameters

mod json;
mod path;

pub use self::json::Json;
pub use self::path::Path;
