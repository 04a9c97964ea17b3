// crates/core/src/analysis.rs
//! Single-pass letter-frequency analysis with percentage progress reporting.

use crate::types::LetterHistogram;

/// Number of bytes between progress reports for a text of `len` bytes:
/// roughly one report per percent, never zero.
pub fn progress_step(len: usize) -> usize {
    (len / 100).max(1)
}

/// Count ASCII letters in `text`, case-insensitively.
///
/// `on_progress` is called with `(index * 100) / len` every
/// [`progress_step`] bytes, starting at index 0. It is never called with 100;
/// completion is signalled by returning. Empty input returns immediately
/// without any progress call.
pub fn analyze<F>(text: &str, mut on_progress: F) -> LetterHistogram
where
    F: FnMut(u8),
{
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut histogram = LetterHistogram::new();
    if len == 0 {
        return histogram;
    }

    let step = progress_step(len);
    for (i, &b) in bytes.iter().enumerate() {
        histogram.record(b);
        if i % step == 0 {
            on_progress(((i * 100) / len) as u8);
        }
    }
    histogram
}
