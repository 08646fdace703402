use std::collections::BTreeMap;

/// Sparse term -> weight map. Absent terms weigh 0.
///
/// A `BTreeMap` keeps iteration (and so floating-point summation) order
/// fixed, which makes scores bit-for-bit reproducible.
pub type TermWeights = BTreeMap<String, f64>;

/// Added to the norm product so two zero-norm vectors still divide cleanly.
pub const COSINE_EPSILON: f64 = 1e-12;

/// Normalized term frequency: occurrences / total tokens.
pub fn term_frequency<I, S>(tokens: I) -> TermWeights
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total = 0usize;
    for token in tokens {
        *counts.entry(token.into()).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return TermWeights::new();
    }
    counts
        .into_iter()
        .map(|(term, count)| (term, count as f64 / total as f64))
        .collect()
}

pub fn norm(v: &TermWeights) -> f64 {
    v.values().map(|w| w * w).sum::<f64>().sqrt()
}

/// Cosine similarity over the shared keys of two sparse vectors.
/// Returns 0.0 if either side is empty.
pub fn cosine(a: &TermWeights, b: &TermWeights) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    // Shared keys come out in sorted order from either map, so the sum is order-stable.
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|other| w * other))
        .sum();
    dot / (norm(a) * norm(b) + COSINE_EPSILON)
}
