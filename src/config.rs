//! Tunables for an extraction run.

use std::num::NonZeroUsize;
use std::thread;

/// How entry bytes are turned into text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextDecoding {
    /// Invalid UTF-8 skips the entry.
    #[default]
    Strict,
    /// Invalid sequences become U+FFFD and the entry is kept.
    Lossy,
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Upper bound on entries decoded at the same time.
    pub concurrency: NonZeroUsize,
    pub text_decoding: TextDecoding,
    /// Entries declaring a larger uncompressed size are skipped.
    pub max_entry_size: u64,
}

impl ExtractOptions {
    pub const DEFAULT_MAX_ENTRY_SIZE: u64 = 32 * 1024 * 1024;

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        if let Some(concurrency) = NonZeroUsize::new(concurrency) {
            self.concurrency = concurrency;
        }
        self
    }

    pub fn with_text_decoding(mut self, text_decoding: TextDecoding) -> Self {
        self.text_decoding = text_decoding;
        self
    }

    pub fn with_max_entry_size(mut self, max_entry_size: u64) -> Self {
        self.max_entry_size = max_entry_size;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            concurrency: thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
            text_decoding: TextDecoding::default(),
            max_entry_size: Self::DEFAULT_MAX_ENTRY_SIZE,
        }
    }
}
