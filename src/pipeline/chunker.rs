// file: src/pipeline/chunker.rs
// description: recursive length-bounded text splitter with overlap
// reference: recursive character text splitting

use std::collections::VecDeque;
use tracing::warn;

const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text into chunks of at most `chunk_size` characters, preferring the
/// coarsest separator that still fits and carrying up to `chunk_overlap`
/// characters from the end of one chunk into the next.
#[derive(Debug, Clone)]
pub struct RecursiveTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<&'static str>,
}

impl RecursiveTextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
            separators: DEFAULT_SEPARATORS.to_vec(),
        }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, &self.separators)
    }

    fn split_with(&self, text: &str, separators: &[&'static str]) -> Vec<String> {
        let (position, separator) = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| sep.is_empty() || text.contains(**sep))
            .map(|(i, sep)| (i, *sep))
            .unwrap_or((separators.len().saturating_sub(1), ""));
        let finer = separators.get(position + 1..).unwrap_or(&[]);

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in split_on(text, separator) {
            if char_len(piece) < self.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting, separator));
                fitting.clear();
            }

            if finer.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_with(piece, finer));
            }
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting, separator));
        }

        chunks
    }

    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let mut merged = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let piece_len = char_len(piece);
            let joiner = if window.is_empty() { 0 } else { separator_len };

            if total + piece_len + joiner > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        "Created a chunk of {} characters, longer than the limit of {}",
                        total, self.chunk_size
                    );
                }

                if !window.is_empty() {
                    push_joined(&mut merged, &window, separator);

                    while total > self.chunk_overlap
                        || (total > 0 && total + piece_len + separator_len > self.chunk_size)
                    {
                        let Some(front) = window.pop_front() else {
                            break;
                        };
                        let front_joiner = if window.is_empty() { 0 } else { separator_len };
                        total = total.saturating_sub(char_len(front) + front_joiner);
                    }
                }
            }

            let joiner = if window.is_empty() { 0 } else { separator_len };
            window.push_back(piece);
            total += piece_len + joiner;
        }

        push_joined(&mut merged, &window, separator);
        merged
    }
}

fn push_joined(out: &mut Vec<String>, window: &VecDeque<&str>, separator: &str) {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn split_on<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        text.char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect()
    } else {
        text.split(separator).filter(|s| !s.is_empty()).collect()
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_has_no_chunks() {
        let splitter = RecursiveTextSplitter::new(100, 10);
        assert!(splitter.split("").is_empty());
        assert!(splitter.split("   \n\n  ").is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let splitter = RecursiveTextSplitter::new(8191, 200);
        let chunks = splitter.split("def main():\n    return 1\n");
        assert_eq!(chunks, vec!["def main():\n    return 1".to_string()]);
    }

    #[test]
    fn test_chunks_respect_size_limit() {
        let splitter = RecursiveTextSplitter::new(50, 10);
        let text = (0..40)
            .map(|i| format!("line number {}", i))
            .collect::<Vec<_>>()
            .join("\n");

        let chunks = splitter.split(&text);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 50));
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let splitter = RecursiveTextSplitter::new(30, 12);
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa lambda";

        let chunks = splitter.split(text);
        assert!(chunks.len() > 1);
        let last_word_of_first = chunks[0].split(' ').last().unwrap();
        assert!(chunks[1].starts_with(last_word_of_first));
    }

    #[test]
    fn test_unbroken_text_falls_back_to_characters() {
        let splitter = RecursiveTextSplitter::new(10, 0);
        let text = "x".repeat(35);

        let chunks = splitter.split(&text);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0].len(), 10);
        assert_eq!(chunks[3].len(), 5);
    }

    #[test]
    fn test_multibyte_characters_are_not_split() {
        let splitter = RecursiveTextSplitter::new(4, 0);
        let chunks = splitter.split("héllo wörld");
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
        assert_eq!(chunks.concat().replace(' ', ""), "héllowörld");
    }
}
