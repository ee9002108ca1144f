//! Interview Scout: starred-email interview classifier and per-interview researcher.

pub mod config;
pub mod error;
pub mod llm;
pub mod mail;
pub mod pipeline;
pub mod server;
pub mod store;
pub mod util;

pub use error::{Error, Result};
