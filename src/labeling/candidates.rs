use crate::config::{MAX_CANDIDATES, MIN_LABEL_CHARS};

/// Candidate labels offered in the modal.
///
/// Starts from the element's context headings (at most `max`), then appends fallback
/// labels in their configured order, skipping ones already present, until `max` is reached.
/// Any entry shorter than [`MIN_LABEL_CHARS`] after trimming is never offered, and `max`
/// never exceeds [`MAX_CANDIDATES`].
pub fn assemble_candidates(context_headings: &[String], fallback: &[String], max: usize) -> Vec<String> {
    let max = max.min(MAX_CANDIDATES);
    let mut candidates: Vec<String> = Vec::with_capacity(max);

    for label in context_headings.iter().chain(fallback) {
        if candidates.len() >= max {
            break;
        }
        if is_valid_label(label) && !candidates.contains(label) {
            candidates.push(label.clone());
        }
    }
    candidates
}

fn is_valid_label(label: &str) -> bool {
    label.trim().chars().count() >= MIN_LABEL_CHARS
}
