// SPDX-License-Identifier: MIT OR Apache-2.0

//! N-gram Jaccard similarity over whitespace-delimited token windows.

use std::collections::HashSet;

/// Default inclusive n-gram range.
pub const DEFAULT_NGRAM_RANGE: (usize, usize) = (2, 4);

/// Computes n-gram Jaccard similarity averaged over the inclusive range.
///
/// For each n, the n-gram sets of the source and target collections are
/// built separately and compared with |intersection| / |union|. Only n
/// values where both sides produced at least one n-gram contribute to the
/// average. Returns 0.0 when no n value contributes.
pub fn ngram_jaccard_similarity(
    source_texts: &[String],
    target_texts: &[String],
    n_range: (usize, usize),
) -> f32 {
    let (low, high) = n_range;
    if low == 0 || low > high {
        return 0.0;
    }

    let mut similarities: Vec<f32> = Vec::new();

    for n in low..=high {
        let source_ngrams = collect_ngrams(source_texts, n);
        let target_ngrams = collect_ngrams(target_texts, n);

        if source_ngrams.is_empty() || target_ngrams.is_empty() {
            continue;
        }

        let intersection = source_ngrams.intersection(&target_ngrams).count();
        let union = source_ngrams.union(&target_ngrams).count();
        similarities.push(intersection as f32 / union as f32);
    }

    if similarities.is_empty() {
        return 0.0;
    }
    similarities.iter().sum::<f32>() / similarities.len() as f32
}

/// Contiguous windows of `n` whitespace-delimited tokens, joined by a
/// single space, collected across all texts in the collection.
fn collect_ngrams(texts: &[String], n: usize) -> HashSet<String> {
    let mut ngrams = HashSet::new();
    for text in texts {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() < n {
            continue;
        }
        for window in tokens.windows(n) {
            ngrams.insert(window.join(" "));
        }
    }
    ngrams
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_identical_texts_score_one() {
        let source = texts(&["the quick brown fox jumps over the lazy dog"]);
        let score = ngram_jaccard_similarity(&source, &source, DEFAULT_NGRAM_RANGE);
        assert!((score - 1.0).abs() < 1e-6, "score was {}", score);
    }

    #[test]
    fn test_disjoint_texts_score_zero() {
        let source = texts(&["one two three four five"]);
        let target = texts(&["six seven eight nine ten"]);
        let score = ngram_jaccard_similarity(&source, &target, DEFAULT_NGRAM_RANGE);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_short_text_skips_large_n() {
        // Two tokens: only n=2 produces sets on both sides, n=3 and n=4
        // are empty and must not drag the average down.
        let source = texts(&["hello world"]);
        let score = ngram_jaccard_similarity(&source, &source, DEFAULT_NGRAM_RANGE);
        assert!((score - 1.0).abs() < 1e-6, "score was {}", score);
    }

    #[test]
    fn test_all_n_empty_degrades_to_zero() {
        let source = texts(&["single"]);
        let target = texts(&["word"]);
        let score = ngram_jaccard_similarity(&source, &target, DEFAULT_NGRAM_RANGE);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_empty_collections_degrade_to_zero() {
        let source = texts(&["some text here now"]);
        assert_eq!(
            ngram_jaccard_similarity(&source, &[], DEFAULT_NGRAM_RANGE),
            0.0
        );
        assert_eq!(
            ngram_jaccard_similarity(&[], &source, DEFAULT_NGRAM_RANGE),
            0.0
        );
    }

    #[test]
    fn test_invalid_range_degrades_to_zero() {
        let source = texts(&["a b c d"]);
        assert_eq!(ngram_jaccard_similarity(&source, &source, (3, 2)), 0.0);
        assert_eq!(ngram_jaccard_similarity(&source, &source, (0, 2)), 0.0);
    }

    #[test]
    fn test_partial_overlap() {
        let source = texts(&["the quick brown fox"]);
        let target = texts(&["the quick red fox"]);
        let score = ngram_jaccard_similarity(&source, &target, (2, 2));
        // Bigrams: source {the quick, quick brown, brown fox},
        // target {the quick, quick red, red fox}; 1 shared of 5 total.
        assert!((score - 0.2).abs() < 1e-6, "score was {}", score);
    }
}
