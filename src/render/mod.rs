//! Plain-text renderings of library payloads.
//!
//! Everything here is deterministic string assembly: the same spec always
//! renders to the same bytes, so the output can be diffed and shared.

pub mod prompt_text;
pub mod share;
pub mod skill_markdown;

pub use prompt_text::render_prompt_text;
pub use share::{decode_prompt_share, encode_prompt_share, ShareError};
pub use skill_markdown::render_skill_markdown;
