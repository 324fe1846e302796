//! Embedding vectors: parsing stored vectors and L2 normalization
//!
//! The corpus keeps each embedding column as a dense row-major matrix whose rows
//! are normalized to unit length, so cosine similarity reduces to a dot product.

use crate::error::{CorpusError, Result};

/// Added to every norm before dividing, so all-zero vectors stay finite
pub const NORM_EPSILON: f32 = 1e-12;

/// L2-normalize a vector in place
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt() + NORM_EPSILON;
    for v in vector.iter_mut() {
        *v /= norm;
    }
}

/// Return a normalized copy of `vector`
pub fn normalized(vector: &[f32]) -> Vec<f32> {
    let mut out = vector.to_vec();
    l2_normalize(&mut out);
    out
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Parse a vector stored as a textual list literal, e.g. `"[0.1, -0.2, 3e-05]"`
///
/// An empty list is rejected since it cannot take part in similarity math.
pub fn parse_vector_literal(text: &str) -> Result<Vec<f32>> {
    let trimmed = text.trim();
    let values: Vec<f64> = serde_json::from_str(trimmed).map_err(|e| {
        let preview: String = trimmed.chars().take(80).collect();
        CorpusError::load(format!("invalid vector literal '{}': {}", preview, e))
    })?;

    if values.is_empty() {
        return Err(CorpusError::load("empty vector"));
    }

    Ok(values.into_iter().map(|v| v as f32).collect())
}

/// Dense matrix of row-normalized embeddings
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    data: Vec<f32>,
    dimension: usize,
}

impl EmbeddingMatrix {
    /// Build a matrix from raw rows, normalizing each one
    ///
    /// Every row must be non-empty and share the first row's dimension.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let dimension = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * dimension);

        for (i, mut row) in rows.into_iter().enumerate() {
            if row.is_empty() {
                return Err(CorpusError::load(format!("row {} has an empty vector", i)));
            }
            if row.len() != dimension {
                return Err(CorpusError::load(format!(
                    "row {} has {} dimensions, expected {}",
                    i,
                    row.len(),
                    dimension
                )));
            }
            l2_normalize(&mut row);
            data.extend_from_slice(&row);
        }

        Ok(Self { data, dimension })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn rows(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn row(&self, index: usize) -> &[f32] {
        let start = index * self.dimension;
        &self.data[start..start + self.dimension]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact panics on a zero chunk size
        self.data.chunks_exact(self.dimension.max(1))
    }

    /// Dot product of `query` against every row
    ///
    /// `query` must already be normalized and have the matrix dimension.
    pub fn similarities(&self, query: &[f32]) -> Vec<f32> {
        self.iter_rows().map(|row| dot(row, query)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn test_normalize_unit_length() {
        let v = normalized(&[3.0, 4.0]);
        assert!((norm(&v) - 1.0).abs() < 1e-6);
        assert!((v[0] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector_stays_zero() {
        let v = normalized(&[0.0, 0.0, 0.0]);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_parse_literal() {
        let v = parse_vector_literal("[0.1, -0.2, 3e-05]").unwrap();
        assert_eq!(v.len(), 3);
        assert!((v[1] + 0.2).abs() < 1e-7);
    }

    #[test]
    fn test_parse_literal_with_whitespace() {
        let v = parse_vector_literal("  [1,\n 2 ,3]  ").unwrap();
        assert_eq!(v, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_parse_literal_rejects_garbage() {
        assert!(parse_vector_literal("").is_err());
        assert!(parse_vector_literal("[]").is_err());
        assert!(parse_vector_literal("[0.1, abc]").is_err());
        assert!(parse_vector_literal("not a vector").is_err());
    }

    #[test]
    fn test_matrix_rows_normalized() {
        let m = EmbeddingMatrix::from_rows(vec![vec![2.0, 0.0], vec![1.0, 1.0]]).unwrap();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.dimension(), 2);
        for row in m.iter_rows() {
            assert!((norm(row) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_matrix_rejects_ragged_rows() {
        let err = EmbeddingMatrix::from_rows(vec![vec![1.0, 0.0], vec![1.0]]).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn test_empty_matrix() {
        let m = EmbeddingMatrix::from_rows(vec![]).unwrap();
        assert_eq!(m.rows(), 0);
        assert!(m.similarities(&[]).is_empty());
    }

    #[test]
    fn test_similarities() {
        let m = EmbeddingMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        let s = m.similarities(&normalized(&[1.0, 0.0]));
        assert!((s[0] - 1.0).abs() < 1e-6);
        assert!(s[1].abs() < 1e-6);
    }
}
