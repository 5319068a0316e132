//! Secret storage recovery key entry
//!
//! Decodes recovery keys and drives the key entry form

pub mod entry;
pub mod key;

pub use entry::{EntryError, KeyEntryForm};
