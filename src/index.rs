//! In-memory nearest-neighbor indexes.
//!
//! Two construction policies share one query interface: [`FlatIndex`] is an
//! exact brute-force scan over squared L2 distance; [`LshIndex`] is an
//! approximate locality-sensitive-hashing index that ranks stored vectors
//! by the Hamming distance between random-hyperplane bit signatures.
//!
//! Both are append-only: there is no deletion or re-indexing, rebuilding
//! means constructing a fresh index from the full vector set.

use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};

use crate::{
    embedding_store::EmbeddingMatrix,
    error::{Error, Result},
};

/// Fixed seed so LSH signatures are reproducible across runs.
const SEED: u64 = 42;

/// A single search hit: the position of a stored vector and its distance
/// from the query. Positions refer to insertion order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub position: usize,
    pub distance: f32,
}

/// Common query interface over the exact and approximate indexes.
pub trait VectorIndex {
    /// Number of stored vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimensionality every stored vector must have.
    fn dimension(&self) -> usize;

    /// Append one vector. Its position is the current [`VectorIndex::len`].
    fn add(&mut self, vector: &[f32]) -> Result<()>;

    /// Append every row of an embedding matrix in order.
    fn add_batch(&mut self, matrix: &EmbeddingMatrix) -> Result<()> {
        for row in matrix.rows() {
            self.add(row)?;
        }
        Ok(())
    }

    /// Return up to `k` nearest stored vectors, ordered by ascending
    /// distance. Fewer than `k` stored vectors yields fewer results.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>>;

    /// Run [`VectorIndex::search`] for each query, preserving query order.
    fn search_batch(
        &self,
        queries: &[Vec<f32>],
        k: usize,
    ) -> Result<Vec<Vec<Neighbor>>> {
        queries.iter().map(|q| self.search(q, k)).collect()
    }
}

fn check_dimension(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(Error::DimensionMismatch { expected, actual });
    }
    Ok(())
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn top_k(mut neighbors: Vec<Neighbor>, k: usize) -> Vec<Neighbor> {
    neighbors.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then(a.position.cmp(&b.position))
    });
    neighbors.truncate(k);
    neighbors
}

/// Exact brute-force index over squared L2 distance.
///
/// Squared distance ranks identically to Euclidean distance and avoids the
/// square root, matching the convention of flat L2 indexes elsewhere.
///
/// # Examples
///
/// ```
/// use passfind::index::{FlatIndex, VectorIndex};
///
/// let mut index = FlatIndex::new(2);
/// index.add(&[0.0, 0.0]).unwrap();
/// index.add(&[3.0, 4.0]).unwrap();
///
/// let hits = index.search(&[0.1, 0.0], 1).unwrap();
/// assert_eq!(hits[0].position, 0);
/// ```
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }
}

impl VectorIndex for FlatIndex {
    fn len(&self) -> usize {
        self.vectors.len()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn add(&mut self, vector: &[f32]) -> Result<()> {
        check_dimension(self.dimension, vector.len())?;
        self.vectors.push(vector.to_vec());
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        check_dimension(self.dimension, query.len())?;

        let neighbors = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, stored)| Neighbor {
                position,
                distance: squared_l2(query, stored),
            })
            .collect();

        Ok(top_k(neighbors, k))
    }
}

/// Approximate index using random hyperplane signatures.
///
/// Each stored vector is reduced to an `nbits`-bit signature (one bit per
/// hyperplane, set when the projection is non-negative). Queries are ranked
/// by Hamming distance between signatures, reported as `f32`. More bits
/// trade query cost for recall.
pub struct LshIndex {
    dimension: usize,
    nbits: usize,
    hyperplanes: Vec<Vec<f32>>,
    signatures: Vec<Vec<u64>>,
}

impl LshIndex {
    /// Create an LSH index with `nbits` hash bits. The hyperplanes are
    /// drawn from a seeded standard normal distribution so rebuilding the
    /// index yields identical signatures.
    pub fn new(dimension: usize, nbits: usize) -> Result<Self> {
        if nbits == 0 {
            return Err(Error::Config(
                "LSH hash width must be at least one bit".into(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(SEED);
        let normal = Normal::new(0.0f32, 1.0).map_err(|e| {
            Error::Config(format!("invalid hyperplane distribution: {e}"))
        })?;

        let hyperplanes = (0..nbits)
            .map(|_| normal.sample_iter(&mut rng).take(dimension).collect())
            .collect();

        Ok(Self {
            dimension,
            nbits,
            hyperplanes,
            signatures: Vec::new(),
        })
    }

    pub fn nbits(&self) -> usize {
        self.nbits
    }

    fn signature(&self, vector: &[f32]) -> Vec<u64> {
        let mut words = vec![0u64; self.nbits.div_ceil(64)];
        for (bit, plane) in self.hyperplanes.iter().enumerate() {
            let projection: f32 =
                plane.iter().zip(vector).map(|(p, v)| p * v).sum();
            if projection >= 0.0 {
                words[bit / 64] |= 1 << (bit % 64);
            }
        }
        words
    }
}

fn hamming(a: &[u64], b: &[u64]) -> u32 {
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}

impl VectorIndex for LshIndex {
    fn len(&self) -> usize {
        self.signatures.len()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn add(&mut self, vector: &[f32]) -> Result<()> {
        check_dimension(self.dimension, vector.len())?;
        let signature = self.signature(vector);
        self.signatures.push(signature);
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        check_dimension(self.dimension, query.len())?;

        let query_signature = self.signature(query);
        let neighbors = self
            .signatures
            .iter()
            .enumerate()
            .map(|(position, stored)| Neighbor {
                position,
                distance: hamming(&query_signature, stored) as f32,
            })
            .collect();

        Ok(top_k(neighbors, k))
    }
}

impl std::fmt::Debug for LshIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LshIndex")
            .field("dimension", &self.dimension)
            .field("nbits", &self.nbits)
            .field("len", &self.signatures.len())
            .finish()
    }
}
