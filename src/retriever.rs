//! Mapping index search results back to chunks.
//!
//! The index only knows vector positions; the retriever pairs an index with
//! the chunk collection whose encoding order produced it, and refuses to be
//! built when the two disagree in length.

use serde::Serialize;

use crate::{
    chunking::Chunk,
    embedder::TextEncoder,
    error::{Error, Result},
    index::VectorIndex,
};

/// A retrieved chunk and its distance from the query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub record_id: String,
    pub seq: usize,
    pub text: String,
    pub distance: f32,
}

/// Answers queries against an index plus the chunk collection backing it.
#[derive(Debug)]
pub struct Retriever<'a, I: VectorIndex> {
    index: &'a I,
    chunks: &'a [Chunk],
}

impl<'a, I: VectorIndex> Retriever<'a, I> {
    /// Pair an index with its backing chunks.
    ///
    /// The chunk at position `i` must be the text whose vector was added to
    /// the index at position `i`; a length mismatch means the pairing is
    /// wrong and is rejected outright.
    pub fn new(index: &'a I, chunks: &'a [Chunk]) -> Result<Self> {
        if index.len() != chunks.len() {
            return Err(Error::Config(format!(
                "index holds {} vectors but {} chunks were provided; \
                 the index must be rebuilt from this chunk set",
                index.len(),
                chunks.len()
            )));
        }
        Ok(Self { index, chunks })
    }

    /// Embed the query and return the `top_n` closest chunks, ordered by
    /// ascending distance. Returns fewer than `top_n` results when the
    /// index is smaller.
    pub fn retrieve(
        &self,
        encoder: &mut dyn TextEncoder,
        query: &str,
        top_n: usize,
    ) -> Result<Vec<ScoredChunk>> {
        let query_vector = encoder.encode_query(query)?;
        let neighbors = self.index.search(&query_vector, top_n)?;

        Ok(neighbors
            .into_iter()
            .map(|n| {
                let chunk = &self.chunks[n.position];
                ScoredChunk {
                    record_id: chunk.record_id.clone(),
                    seq: chunk.seq,
                    text: chunk.text.clone(),
                    distance: n.distance,
                }
            })
            .collect())
    }
}

/// Format results for human-readable terminal output.
pub fn format_human(results: &[ScoredChunk]) {
    if results.is_empty() {
        println!("No results found.");
        return;
    }

    for (rank, r) in results.iter().enumerate() {
        println!(
            "{:>3}. [{:.3}] {}#{}",
            rank + 1,
            r.distance,
            r.record_id,
            r.seq
        );
        let preview: String = r.text.chars().take(160).collect();
        println!("     {}", preview.replace('\n', " "));
    }
    println!("\n{} result(s)", results.len());
}

/// Format results as a JSON document on stdout.
pub fn format_json(results: &[ScoredChunk], query: &str) -> Result<()> {
    let output = serde_json::json!({
        "query": query,
        "result_count": results.len(),
        "results": results,
    });
    println!(
        "{}",
        serde_json::to_string(&output)
            .map_err(|e| Error::Config(format!("JSON encoding failed: {e}")))?
    );
    Ok(())
}
