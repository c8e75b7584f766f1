//! Persisting computed embeddings between runs.
//!
//! The whole embedding matrix is serialized as a single binary snapshot so
//! a later run can skip re-encoding the corpus. No versioning, no partial
//! reads; I/O and decode errors propagate to the caller.

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A dense row-major matrix of embedding vectors.
///
/// Row `i` holds the vector for the `i`-th input of the encoding batch, so
/// row positions line up with the chunk collection that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingMatrix {
    dimension: usize,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    /// Build a matrix from per-input vectors, validating that every row has
    /// the same dimensionality.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let Some(first) = rows.first() else {
            return Ok(Self {
                dimension: 0,
                data: Vec::new(),
            });
        };

        let dimension = first.len();
        if dimension == 0 {
            return Err(Error::Config(
                "embedding vectors must be non-empty".into(),
            ));
        }

        let mut data = Vec::with_capacity(rows.len() * dimension);
        for row in &rows {
            if row.len() != dimension {
                return Err(Error::DimensionMismatch {
                    expected: dimension,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }

        Ok(Self { dimension, data })
    }

    /// Number of vectors stored.
    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality shared by every stored vector.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The `i`-th vector. Panics if `i` is out of bounds.
    pub fn row(&self, i: usize) -> &[f32] {
        let start = i * self.dimension;
        &self.data[start..start + self.dimension]
    }

    /// Iterate over all vectors in storage order.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimension.max(1))
    }
}

/// Serialize the matrix to a binary snapshot at `path`, overwriting any
/// existing file.
pub fn save_embeddings(matrix: &EmbeddingMatrix, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, matrix)?;
    Ok(())
}

/// Load a matrix previously written by [`save_embeddings`].
pub fn load_embeddings(path: &Path) -> Result<EmbeddingMatrix> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(bincode::deserialize_from(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matrix() -> EmbeddingMatrix {
        EmbeddingMatrix::from_rows(vec![
            vec![1.0, 2.0, 3.0],
            vec![4.0, 5.0, 6.0],
            vec![7.0, 8.0, 9.0],
        ])
        .unwrap()
    }

    #[test]
    fn from_rows_preserves_order_and_dimension() {
        let matrix = sample_matrix();
        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix.dimension(), 3);
        assert_eq!(matrix.row(0), &[1.0, 2.0, 3.0]);
        assert_eq!(matrix.row(2), &[7.0, 8.0, 9.0]);

        let rows: Vec<&[f32]> = matrix.rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        let err = EmbeddingMatrix::from_rows(vec![
            vec![1.0, 2.0],
            vec![3.0],
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn empty_matrix() {
        let matrix = EmbeddingMatrix::from_rows(Vec::new()).unwrap();
        assert!(matrix.is_empty());
        assert_eq!(matrix.len(), 0);
        assert_eq!(matrix.rows().count(), 0);
    }

    #[test]
    fn save_load_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("embeddings.bin");
        let matrix = sample_matrix();

        save_embeddings(&matrix, &path).unwrap();
        let loaded = load_embeddings(&path).unwrap();

        assert_eq!(loaded, matrix);
    }

    #[test]
    fn load_missing_file_propagates_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = load_embeddings(&tmp.path().join("nope.bin")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn save_to_unwritable_path_propagates_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing").join("embeddings.bin");
        let err = save_embeddings(&sample_matrix(), &path).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
