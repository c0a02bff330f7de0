//! Vector index abstraction and the exact Euclidean implementation.

use agora_core::{AppError, AppResult};

const HEADER_LEN: usize = 8;

/// Trait for vector index backends.
///
/// Indexes are built from scratch and never updated in place.
pub trait VectorIndex: Send + Sync {
    fn dimensions(&self) -> usize;

    /// Number of stored vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `k` nearest vectors as `(position, distance)`, nearest first.
    /// Equal distances keep insertion order.
    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<(usize, f32)>>;
}

/// Brute-force index over squared L2 distance.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    dimensions: usize,
    data: Vec<f32>,
}

impl FlatL2Index {
    /// Build an index from row vectors, which must share one dimension.
    pub fn build(vectors: &[Vec<f32>]) -> AppResult<Self> {
        let dimensions = vectors.first().map(Vec::len).unwrap_or(0);
        if dimensions == 0 && !vectors.is_empty() {
            return Err(AppError::Knowledge("Cannot index zero-length vectors".to_string()));
        }

        let mut data = Vec::with_capacity(vectors.len() * dimensions);
        for (position, vector) in vectors.iter().enumerate() {
            if vector.len() != dimensions {
                return Err(AppError::Knowledge(format!(
                    "Vector {} has {} dimensions, expected {}",
                    position,
                    vector.len(),
                    dimensions
                )));
            }
            data.extend_from_slice(vector);
        }

        Ok(Self { dimensions, data })
    }

    /// Serialize as `dimensions:u32 LE`, `count:u32 LE`, then row-major `f32 LE`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.data.len() * 4);
        bytes.extend_from_slice(&(self.dimensions as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.len() as u32).to_le_bytes());
        for &value in &self.data {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> AppResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(AppError::Knowledge("Vector file is truncated".to_string()));
        }

        let read_u32 = |offset: usize| {
            u32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ]) as usize
        };
        let dimensions = read_u32(0);
        let count = read_u32(4);

        let body = &bytes[HEADER_LEN..];
        if body.len() != dimensions * count * 4 {
            return Err(AppError::Knowledge(format!(
                "Vector file length mismatch: header says {}x{}, found {} bytes",
                count,
                dimensions,
                body.len()
            )));
        }

        let data = body
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self { dimensions, data })
    }

    fn row(&self, position: usize) -> &[f32] {
        let start = position * self.dimensions;
        &self.data[start..start + self.dimensions]
    }
}

impl VectorIndex for FlatL2Index {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn len(&self) -> usize {
        if self.dimensions == 0 {
            0
        } else {
            self.data.len() / self.dimensions
        }
    }

    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<(usize, f32)>> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(AppError::Knowledge(format!(
                "Query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = (0..self.len())
            .map(|position| (position, squared_l2(query, self.row(position))))
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
