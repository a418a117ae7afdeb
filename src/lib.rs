//! prmpt - a local-first library of prompts, skills and agent anatomies
//!
//! Items live in a key-value store on disk, are validated on every write and
//! can be mirrored to a remote document store. Legacy prompt-builder data is
//! migrated on first run, and a set of built-in skills is seeded.

pub mod cli;
pub mod config;
pub mod kv;
pub mod library;
pub mod lint;
pub mod listeners;
pub mod render;
pub mod schema;
pub mod sync;
pub mod util;
