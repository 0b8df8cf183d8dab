//! Double-entry journal: entry construction, posting, reversal

pub mod engine;
pub mod postings;

pub use engine::{DraftEntry, EntryBuilder, JournalEngine};
