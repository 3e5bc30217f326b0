//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the application to external systems:
//! - `ai` - Gemini REST client and test doubles
//! - `storage` - Local key/value storage (file, in-memory)
//! - `terminal` - Text rendering of the wizard screens

pub mod ai;
pub mod storage;
pub mod terminal;
