//! Splitting long documents into overlapping segments.
//!
//! Text is split recursively on natural separators (paragraph break, line
//! break, sentence end, word boundary) before falling back to raw character
//! cuts. The resulting pieces are merged greedily into chunks of at most
//! `chunk_size` characters, with consecutive chunks sharing up to `overlap`
//! characters of trailing context.

use std::path::Path;

use serde::Serialize;

use crate::{
    corpus::Record,
    error::{Error, Result},
};

/// Separators tried in order, from coarsest to finest.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " "];

/// Default maximum chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between adjacent chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// A bounded-size span of text from a larger record.
///
/// `seq` is contiguous from 0 within a record; `(record_id, seq)` is unique
/// across one chunking pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Identifier of the parent record.
    pub record_id: String,
    /// Zero-based position within the parent record.
    pub seq: usize,
    /// The chunk text.
    pub text: String,
}

/// Splits text into chunks of bounded size with configurable overlap.
///
/// # Examples
///
/// ```
/// use passfind::chunking::ChunkSplitter;
///
/// let splitter = ChunkSplitter::new(1000, 200).unwrap();
///
/// // Short text returns a single chunk equal to the input
/// let chunks = splitter.split("Hello, world!");
/// assert_eq!(chunks, vec!["Hello, world!".to_string()]);
///
/// // Long text gets split
/// let text = "word ".repeat(500);
/// assert!(splitter.split(&text).len() >= 2);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ChunkSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkSplitter {
    /// Create a splitter. `overlap` must be strictly smaller than
    /// `chunk_size`, and `chunk_size` must be non-zero.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk size must be non-zero".into()));
        }
        if overlap >= chunk_size {
            return Err(Error::Config(format!(
                "overlap ({overlap}) must be smaller than chunk size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split text into ordered chunks.
    ///
    /// Empty input yields no chunks; input of at most `chunk_size`
    /// characters yields exactly one chunk equal to the input. No chunk
    /// exceeds `chunk_size` characters.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        let pieces = split_pieces(text, SEPARATORS, self.chunk_size);
        self.merge(pieces)
    }

    /// Merge separator-bounded pieces into chunks, re-seeding each new
    /// chunk with trailing pieces totaling at most `overlap` characters.
    fn merge(&self, pieces: Vec<String>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_len = 0usize;

        for piece in pieces {
            let piece_len = char_len(&piece);

            if current_len + piece_len > self.chunk_size && !current.is_empty()
            {
                emit(&mut chunks, &current);

                // Drop leading pieces until what remains fits inside the
                // overlap budget and leaves room for the incoming piece.
                while current_len > self.overlap
                    || (current_len + piece_len > self.chunk_size
                        && current_len > 0)
                {
                    let dropped = current.remove(0);
                    current_len -= char_len(&dropped);
                }
            }

            current.push(piece);
            current_len += piece_len;
        }

        emit(&mut chunks, &current);
        chunks
    }
}

impl Default for ChunkSplitter {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

fn emit(chunks: &mut Vec<String>, current: &[String]) {
    let chunk = current.concat();
    if !chunk.trim().is_empty() {
        chunks.push(chunk);
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split on the first separator present in the text, keeping the separator
/// attached to the preceding piece; recurse into pieces still longer than
/// `max` with the remaining separators, hard-cutting as a last resort.
fn split_pieces(text: &str, separators: &[&str], max: usize) -> Vec<String> {
    let Some((sep, rest)) = separators.split_first() else {
        return hard_cut(text, max);
    };

    if !text.contains(sep) {
        return split_pieces(text, rest, max);
    }

    let mut out = Vec::new();
    for piece in split_keep_separator(text, sep) {
        if char_len(&piece) <= max {
            out.push(piece);
        } else {
            out.extend(split_pieces(&piece, rest, max));
        }
    }
    out
}

fn split_keep_separator(text: &str, sep: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find(sep) {
        let end = pos + sep.len();
        pieces.push(rest[..end].to_string());
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }
    pieces
}

fn hard_cut(text: &str, max: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max)
        .map(|window| window.iter().collect())
        .collect()
}

/// Chunk every record, tagging each chunk with its parent id and a
/// zero-based sequence index.
pub fn chunk_records(
    records: &[Record],
    splitter: &ChunkSplitter,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for record in records {
        for (seq, text) in splitter.split(&record.content).into_iter().enumerate()
        {
            chunks.push(Chunk {
                record_id: record.id.clone(),
                seq,
                text,
            });
        }
    }
    chunks
}

/// Chunk every record and write the tabular snapshot to `snapshot_path`.
///
/// A failed snapshot write is logged and otherwise ignored; the in-memory
/// chunks are returned either way.
pub fn chunk_corpus(
    records: &[Record],
    splitter: &ChunkSplitter,
    snapshot_path: &Path,
) -> Vec<Chunk> {
    let chunks = chunk_records(records, splitter);

    if let Err(e) = write_chunk_snapshot(&chunks, snapshot_path) {
        tracing::warn!(
            "could not write chunk snapshot to {}: {e}",
            snapshot_path.display()
        );
    }

    chunks
}

#[derive(Serialize)]
struct ChunkRow<'a> {
    str_idx: &'a str,
    chunk_id: usize,
    chunk: &'a str,
}

/// Write chunks as CSV with columns `str_idx`, `chunk_id`, `chunk`.
/// Overwrites any existing file.
pub fn write_chunk_snapshot(chunks: &[Chunk], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for chunk in chunks {
        writer.serialize(ChunkRow {
            str_idx: &chunk.record_id,
            chunk_id: chunk.seq,
            chunk: &chunk.text,
        })?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, content: &str) -> Record {
        Record {
            id: id.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn short_text_single_chunk() {
        let splitter = ChunkSplitter::default();
        let chunks = splitter.split("Hello, world!");
        assert_eq!(chunks, vec!["Hello, world!".to_string()]);
    }

    #[test]
    fn empty_text_no_chunks() {
        let splitter = ChunkSplitter::default();
        assert!(splitter.split("").is_empty());
    }

    #[test]
    fn rejects_overlap_not_smaller_than_chunk_size() {
        assert!(ChunkSplitter::new(100, 100).is_err());
        assert!(ChunkSplitter::new(100, 150).is_err());
        assert!(ChunkSplitter::new(0, 0).is_err());
        assert!(ChunkSplitter::new(100, 99).is_ok());
    }

    #[test]
    fn long_text_respects_chunk_size() {
        let splitter = ChunkSplitter::new(100, 20).unwrap();
        let text = "the quick brown fox jumps over the lazy dog. ".repeat(20);
        let chunks = splitter.split(&text);

        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100, "chunk too long: {chunk:?}");
        }
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let splitter = ChunkSplitter::new(40, 0).unwrap();
        let text = "First paragraph here.\n\nSecond paragraph here.";
        let chunks = splitter.split(&text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "First paragraph here.\n\n");
        assert_eq!(chunks[1], "Second paragraph here.");
    }

    #[test]
    fn chunks_cover_all_words() {
        let splitter = ChunkSplitter::new(50, 0).unwrap();
        let words: Vec<String> =
            (0..60).map(|i| format!("word{i}")).collect();
        let text = words.join(" ");
        let chunks = splitter.split(&text);

        let joined = chunks.concat();
        for word in &words {
            assert!(joined.contains(word.as_str()), "missing {word}");
        }
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let splitter = ChunkSplitter::new(60, 20).unwrap();
        let text = "alpha beta gamma delta epsilon zeta eta theta iota \
                    kappa lambda mu nu xi omicron pi rho sigma tau";
        let chunks = splitter.split(&text);
        assert!(chunks.len() >= 2);

        // Each chunk after the first starts with text already seen.
        for window in chunks.windows(2) {
            let first_word =
                window[1].split_whitespace().next().unwrap().to_string();
            assert!(
                window[0].contains(&first_word),
                "expected overlap between {:?} and {:?}",
                window[0],
                window[1]
            );
        }
    }

    #[test]
    fn hard_cuts_text_without_separators() {
        let splitter = ChunkSplitter::new(10, 0).unwrap();
        let text = "a".repeat(35);
        let chunks = splitter.split(&text);

        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn handles_multibyte_characters() {
        let splitter = ChunkSplitter::new(20, 5).unwrap();
        let text = "café ☕ naïve 日本語 🎉 ".repeat(10);
        let chunks = splitter.split(&text);

        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 20);
        }
    }

    #[test]
    fn chunk_records_assigns_contiguous_sequence() {
        let splitter = ChunkSplitter::new(30, 0).unwrap();
        let records = vec![
            record("ch1", &"one two three four five six. ".repeat(5)),
            record("ch2", "short"),
        ];

        let chunks = chunk_records(&records, &splitter);

        let ch1: Vec<_> =
            chunks.iter().filter(|c| c.record_id == "ch1").collect();
        assert!(ch1.len() >= 2);
        for (i, chunk) in ch1.iter().enumerate() {
            assert_eq!(chunk.seq, i);
        }

        let ch2: Vec<_> =
            chunks.iter().filter(|c| c.record_id == "ch2").collect();
        assert_eq!(ch2.len(), 1);
        assert_eq!(ch2[0].seq, 0);
        assert_eq!(ch2[0].text, "short");
    }

    #[test]
    fn snapshot_written_with_expected_columns() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("chunks.csv");
        let splitter = ChunkSplitter::default();
        let records = vec![record("ch1", "some text")];

        let chunks = chunk_corpus(&records, &splitter, &path);
        assert_eq!(chunks.len(), 1);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("str_idx,chunk_id,chunk"));
        assert!(contents.contains("ch1,0,some text"));
    }

    #[test]
    fn failed_snapshot_write_keeps_chunks() {
        let tmp = tempfile::tempdir().unwrap();
        // Parent directory does not exist, so the write must fail.
        let path = tmp.path().join("missing").join("chunks.csv");
        let splitter = ChunkSplitter::default();
        let records = vec![record("ch1", "still usable")];

        let chunks = chunk_corpus(&records, &splitter, &path);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "still usable");
        assert!(!path.exists());
    }
}
