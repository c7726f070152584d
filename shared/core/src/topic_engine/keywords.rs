//! Per-cluster keyword extraction: English stop-word removal plus
//! count-based term weighting over the cluster's document text.

use crate::models::Keyword;
use std::collections::{HashMap, HashSet};

const TOP_N: usize = 10;

const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "if", "then", "else", "for", "to", "of", "in", "on",
    "at", "by", "with", "from", "is", "are", "was", "were", "be", "been", "being", "this",
    "that", "these", "those", "it", "its", "as", "we", "our", "can", "using", "used", "use",
    "into", "than", "via", "such", "also", "not", "no", "new", "based", "which", "their",
];

/// Top ~10 `(term, count)` pairs across `documents`, stop words and
/// single-character tokens removed.
pub fn extract_keywords(documents: &[String]) -> Vec<Keyword> {
    let stop: HashSet<&str> = ENGLISH_STOP_WORDS.iter().copied().collect();
    let mut counts: HashMap<String, u64> = HashMap::new();

    for doc in documents {
        for token in doc.split(|c: char| !c.is_alphanumeric()) {
            if token.len() < 2 {
                continue;
            }
            let lower = token.to_lowercase();
            if stop.contains(lower.as_str()) || lower.chars().all(|c| c.is_numeric()) {
                continue;
            }
            *counts.entry(lower).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<Keyword> = counts.into_iter().map(|(k, v)| (k, v as f64)).collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap().then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(TOP_N);
    ranked
}
