// SPDX-License-Identifier: MIT OR Apache-2.0

//! TF-IDF cosine similarity over a jointly built vocabulary.

use std::collections::HashMap;

/// Minimum token length retained during tokenization.
const MIN_TOKEN_LEN: usize = 2;

/// Computes the TF-IDF cosine similarity between two text collections.
///
/// The vector space is built jointly over the union of both collections so
/// vocabulary and IDF weights are shared. Each text becomes an
/// L2-normalized TF-IDF vector; the result is the cosine similarity
/// between the source centroid and the target centroid.
///
/// Returns 0.0 when either collection is empty or the vocabulary collapses
/// to zero terms after tokenization.
pub fn tfidf_similarity(source_texts: &[String], target_texts: &[String]) -> f32 {
    if source_texts.is_empty() || target_texts.is_empty() {
        return 0.0;
    }

    let source_tokens: Vec<Vec<String>> = source_texts.iter().map(|t| tokenize(t)).collect();
    let target_tokens: Vec<Vec<String>> = target_texts.iter().map(|t| tokenize(t)).collect();

    let mut vocabulary: HashMap<String, usize> = HashMap::new();
    let mut document_frequency: Vec<usize> = Vec::new();

    for tokens in source_tokens.iter().chain(target_tokens.iter()) {
        let mut seen: Vec<usize> = Vec::new();
        for token in tokens {
            let term = match vocabulary.get(token) {
                Some(&idx) => idx,
                None => {
                    let idx = vocabulary.len();
                    vocabulary.insert(token.clone(), idx);
                    document_frequency.push(0);
                    idx
                }
            };
            if !seen.contains(&term) {
                document_frequency[term] += 1;
                seen.push(term);
            }
        }
    }

    if vocabulary.is_empty() {
        return 0.0;
    }

    let total_docs = source_tokens.len() + target_tokens.len();
    // Smoothed IDF so terms present in every document still carry weight.
    let idf: Vec<f32> = document_frequency
        .iter()
        .map(|&df| ((1 + total_docs) as f32 / (1 + df) as f32).ln() + 1.0)
        .collect();

    let source_centroid = centroid(&source_tokens, &vocabulary, &idf);
    let target_centroid = centroid(&target_tokens, &vocabulary, &idf);

    sparse_cosine(&source_centroid, &target_centroid)
}

/// Lowercases and splits on non-alphanumeric boundaries, dropping tokens
/// shorter than two characters.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}

/// Mean of the per-text L2-normalized TF-IDF vectors, as a sparse map.
fn centroid(
    docs: &[Vec<String>],
    vocabulary: &HashMap<String, usize>,
    idf: &[f32],
) -> HashMap<usize, f32> {
    let mut accumulated: HashMap<usize, f32> = HashMap::new();
    let mut contributing = 0usize;

    for tokens in docs {
        let mut weights: HashMap<usize, f32> = HashMap::new();
        for token in tokens {
            if let Some(&term) = vocabulary.get(token) {
                *weights.entry(term).or_insert(0.0) += idf[term];
            }
        }
        if weights.is_empty() {
            continue;
        }

        let norm = weights.values().map(|w| w * w).sum::<f32>().sqrt();
        if norm == 0.0 {
            continue;
        }
        for (term, weight) in weights {
            *accumulated.entry(term).or_insert(0.0) += weight / norm;
        }
        contributing += 1;
    }

    if contributing > 1 {
        for weight in accumulated.values_mut() {
            *weight /= contributing as f32;
        }
    }

    accumulated
}

fn sparse_cosine(a: &HashMap<usize, f32>, b: &HashMap<usize, f32>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let dot: f32 = a
        .iter()
        .filter_map(|(term, weight)| b.get(term).map(|other| weight * other))
        .sum();
    let norm_a: f32 = a.values().map(|w| w * w).sum::<f32>().sqrt();
    let norm_b: f32 = b.values().map(|w| w * w).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
