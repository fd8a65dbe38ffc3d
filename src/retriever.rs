//! Similarity ranking over the stored chunks.
//!
//! A full linear scan with brute-force cosine similarity; the store is
//! small enough that an index would be overkill.

use std::cmp::Ordering;

use crate::store::Chunk;

/// A chunk paired with its similarity to the query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Cosine similarity of two vectors, `0.0` when either norm vanishes or
/// the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    if denom <= f32::EPSILON {
        0.0
    } else {
        dot / denom
    }
}

/// Ranks `chunks` against `query` by descending cosine similarity and
/// returns at most `max(1, top_k)` results.
///
/// When `allowed_sources` is given, only chunks whose source appears in it
/// participate. The sort is stable, so equal scores keep insertion order.
pub fn rank_chunks(
    chunks: &[Chunk],
    query: &[f32],
    top_k: usize,
    allowed_sources: Option<&[String]>,
) -> Vec<ScoredChunk> {
    let mut scored: Vec<ScoredChunk> = chunks
        .iter()
        .filter(|chunk| match allowed_sources {
            Some(allowed) => allowed.iter().any(|s| *s == chunk.source),
            None => true,
        })
        .map(|chunk| ScoredChunk {
            chunk: chunk.clone(),
            score: cosine_similarity(query, &chunk.embedding),
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(top_k.max(1));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(source: &str, embedding: Vec<f32>) -> Chunk {
        Chunk::new(format!("text-{source}"), source.to_string(), embedding)
    }

    fn approx_eq(left: f32, right: f32) -> bool {
        (left - right).abs() < 1e-5
    }

    #[test]
    fn cosine_is_one_for_identical_vectors() {
        let vec = [1.0, 2.0, 3.0, 4.0];
        assert!(approx_eq(cosine_similarity(&vec, &vec), 1.0));
    }

    #[test]
    fn cosine_is_zero_for_zero_norm_or_length_mismatch() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn cosine_is_zero_for_orthogonal_vectors() {
        assert!(approx_eq(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0));
    }

    #[test]
    fn ranking_returns_highest_similarity_first() {
        let chunks = vec![
            chunk("a", vec![0.8, 0.2]),
            chunk("b", vec![0.1, 0.9]),
            chunk("c", vec![0.9, 0.0]),
        ];
        let ranked = rank_chunks(&chunks, &[1.0, 0.0], 10, None);

        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].chunk.source, "c");
        assert_eq!(ranked[2].chunk.source, "b");
    }

    #[test]
    fn top_k_bounds_the_result() {
        let chunks: Vec<Chunk> = (0..5).map(|i| chunk(&format!("s{i}"), vec![1.0, 0.0])).collect();

        assert_eq!(rank_chunks(&chunks, &[1.0, 0.0], 2, None).len(), 2);
        assert_eq!(rank_chunks(&chunks, &[1.0, 0.0], 9, None).len(), 5);
        // top_k of zero is clamped to one.
        assert_eq!(rank_chunks(&chunks, &[1.0, 0.0], 0, None).len(), 1);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let chunks = vec![
            chunk("first", vec![1.0, 0.0]),
            chunk("second", vec![2.0, 0.0]),
            chunk("third", vec![3.0, 0.0]),
        ];
        let ranked = rank_chunks(&chunks, &[1.0, 0.0], 10, None);

        let order: Vec<&str> = ranked.iter().map(|s| s.chunk.source.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn source_filter_is_exclusive() {
        let chunks = vec![
            chunk("a.txt", vec![1.0, 0.0]),
            chunk("b.txt", vec![1.0, 0.0]),
            chunk("a.txt", vec![0.5, 0.5]),
        ];

        let allowed = vec!["a.txt".to_string()];
        let ranked = rank_chunks(&chunks, &[1.0, 0.0], 10, Some(&allowed));
        assert_eq!(ranked.len(), 2);
        assert!(ranked.iter().all(|s| s.chunk.source == "a.txt"));

        let missing = vec!["z.txt".to_string()];
        assert!(rank_chunks(&chunks, &[1.0, 0.0], 10, Some(&missing)).is_empty());
    }
}
