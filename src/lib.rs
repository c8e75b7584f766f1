//! passfind - semantic passage search over long documents.
//!
//! passfind splits a tabular corpus into overlapping chunks, embeds them
//! with a pretrained sentence-embedding model via
//! [fastembed](https://github.com/Anush008/fastembed-rs), and answers
//! queries through an exact flat L2 index or an approximate LSH index.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use passfind::{
//!     Embedder, EmbeddingMatrix, FlatIndex, Retriever, TextEncoder,
//!     VectorIndex,
//!     chunking::{self, ChunkSplitter},
//!     corpus,
//! };
//!
//! # fn main() -> passfind::Result<()> {
//! let records = corpus::load_records(
//!     Path::new("data/book_df.csv"),
//!     "str_idx",
//!     "processed_content",
//! )?;
//! let splitter = ChunkSplitter::new(1000, 200)?;
//! let chunks = chunking::chunk_records(&records, &splitter);
//!
//! let mut encoder = Embedder::new();
//! let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
//! let matrix = EmbeddingMatrix::from_rows(encoder.encode_batch(&texts)?)?;
//!
//! let mut index = FlatIndex::new(matrix.dimension());
//! index.add_batch(&matrix)?;
//!
//! let retriever = Retriever::new(&index, &chunks)?;
//! for hit in retriever.retrieve(&mut encoder, "who was the baker?", 5)? {
//!     println!("[{:.3}] {}#{}", hit.distance, hit.record_id, hit.seq);
//! }
//! # Ok(())
//! # }
//! ```

pub mod chunking;
pub mod cli;
pub mod corpus;
pub mod data_dir;
pub mod embedder;
pub mod embedding_store;
pub mod error;
pub mod eval;
pub mod index;
pub mod retriever;

pub use chunking::{Chunk, ChunkSplitter};
pub use corpus::Record;
pub use data_dir::DataDir;
pub use embedder::{Embedder, TextEncoder};
pub use embedding_store::EmbeddingMatrix;
pub use error::{Error, Result};
pub use index::{FlatIndex, LshIndex, Neighbor, VectorIndex};
pub use retriever::{Retriever, ScoredChunk};
