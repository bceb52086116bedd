//! Data models for Quill

mod note;
mod tombstone;

pub use note::Note;
pub use tombstone::Tombstone;
