//! Fixed-size word windows with overlap

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};

/// Word-window chunker with configurable size and overlap
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    /// Words per chunk
    size: usize,
    /// Words repeated from the previous chunk
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker; `overlap` must be smaller than `size`
    pub fn new(size: usize, overlap: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::config("chunk size must be greater than 0"));
        }
        if overlap >= size {
            return Err(Error::config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                overlap, size
            )));
        }
        Ok(Self { size, overlap })
    }

    /// Create a chunker from config
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Words the window start advances per chunk
    pub fn step(&self) -> usize {
        self.size - self.overlap
    }

    /// Lazily split `text` into windows
    pub fn chunks<'a>(&self, text: &'a str) -> WordWindows<'a> {
        WordWindows {
            words: text.split_whitespace().collect(),
            size: self.size,
            overlap: self.overlap,
            start: 0,
        }
    }
}

/// Split `text` into windows of `size` words, consecutive windows sharing `overlap` words
///
/// Windows start at `0, step, 2*step, ...` and stop once a window reaches the
/// end of the text, so `n` words give `ceil((n - overlap) / step)` windows
/// (at least one). Text shorter than `size` is a single chunk; empty text gives none.
pub fn chunk(text: &str, size: usize, overlap: usize) -> Result<WordWindows<'_>> {
    Ok(TextChunker::new(size, overlap)?.chunks(text))
}

/// Iterator over the word windows of one text, each joined by single spaces
#[derive(Debug, Clone)]
pub struct WordWindows<'a> {
    words: Vec<&'a str>,
    size: usize,
    overlap: usize,
    start: usize,
}

impl WordWindows<'_> {
    fn step(&self) -> usize {
        self.size - self.overlap
    }

    fn remaining(&self) -> usize {
        let n = self.words.len();
        if n == 0 || (self.start > 0 && self.start + self.overlap >= n) {
            return 0;
        }
        n.saturating_sub(self.start + self.overlap)
            .div_ceil(self.step())
            .max(1)
    }
}

impl Iterator for WordWindows<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.remaining() == 0 {
            return None;
        }
        let end = (self.start + self.size).min(self.words.len());
        let window = self.words[self.start..end].join(" ");
        self.start += self.step();
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WordWindows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunks: Vec<String> = chunk("  alpha\tbeta\n gamma ", 800, 120).unwrap().collect();
        assert_eq!(chunks, vec!["alpha beta gamma"]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert_eq!(chunk("   \n", 10, 2).unwrap().count(), 0);
    }

    #[test]
    fn test_window_count_follows_step() {
        let cases = [
            (10, 4, 1, 3),
            (100, 10, 0, 10),
            (7, 3, 2, 5),
            (1000, 800, 120, 2),
            (800, 800, 120, 1),
            (700, 800, 120, 1),
            (681, 800, 120, 1),
            (801, 800, 120, 2),
            (2, 4, 3, 1),
        ];
        for (n, size, overlap, expected) in cases {
            let text = numbered(n);
            let windows = chunk(&text, size, overlap).unwrap();
            assert_eq!(windows.len(), expected, "n={} size={} overlap={}", n, size, overlap);
            assert_eq!(windows.count(), expected, "n={} size={} overlap={}", n, size, overlap);
        }
    }

    #[test]
    fn test_text_up_to_size_is_one_whole_chunk() {
        for n in [680, 700, 800] {
            let text = numbered(n);
            let chunks: Vec<String> = chunk(&text, 800, 120).unwrap().collect();
            assert_eq!(chunks, vec![text.clone()], "n={}", n);
        }
    }

    #[test]
    fn test_last_window_reaches_end_of_text() {
        let text = numbered(1000);
        let chunks: Vec<String> = chunk(&text, 800, 120).unwrap().collect();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].starts_with("w680 "));
        assert!(chunks[1].ends_with(" w999"));
    }

    #[test]
    fn test_consecutive_windows_overlap() {
        let size = 5;
        let overlap = 2;
        let text = numbered(23);
        let chunks: Vec<Vec<String>> = chunk(&text, size, overlap)
            .unwrap()
            .map(|c| c.split(' ').map(str::to_string).collect())
            .collect();

        for pair in chunks.windows(2) {
            assert!(pair[0].len() <= size);
            let tail = &pair[0][pair[0].len() - overlap..];
            assert_eq!(&pair[1][..overlap.min(pair[1].len())], &tail[..overlap.min(pair[1].len())]);
        }
        assert_eq!(chunks[0], vec!["w0", "w1", "w2", "w3", "w4"]);
        assert_eq!(chunks[1][0], "w3");
    }

    #[test]
    fn test_overlap_not_smaller_than_size_is_rejected() {
        assert!(matches!(chunk("a b c", 4, 4), Err(Error::Config(_))));
        assert!(matches!(chunk("a b c", 4, 9), Err(Error::Config(_))));
        assert!(matches!(chunk("a b c", 0, 0), Err(Error::Config(_))));
    }
}
