//! Heuristic answer confidence.
//!
//! The score rewards retrieval volume and context size. It is a cheap proxy,
//! not a calibrated probability.

const BASE_CONFIDENCE: f64 = 0.5;
const PER_DOCUMENT_BONUS: f64 = 0.1;
const MAX_DOCUMENT_BONUS: f64 = 0.3;
const CONTEXT_LENGTH_SCALE: f64 = 10_000.0;
const MAX_CONTEXT_BONUS: f64 = 0.2;

/// Score an answer from the number of retrieved documents and the length of
/// the assembled context.
///
/// `context_length` is counted in Unicode scalar values (`str::chars`), not
/// bytes, so multi-byte scripts score the same as ASCII of equal length.
///
/// ```text
/// min(1.0, 0.5 + min(0.3, 0.1 * documents) + min(0.2, context_length / 10000))
/// ```
pub fn calculate_confidence(document_count: usize, context_length: usize) -> f64 {
    let doc_bonus = (PER_DOCUMENT_BONUS * document_count as f64).min(MAX_DOCUMENT_BONUS);
    let context_bonus = (context_length as f64 / CONTEXT_LENGTH_SCALE).min(MAX_CONTEXT_BONUS);
    (BASE_CONFIDENCE + doc_bonus + context_bonus).min(1.0)
}
