use crate::model::ClassificationCandidate;

/// Picks the highest-confidence candidate with a single linear scan.
///
/// The model gives no ordering guarantee, so nothing here assumes sorted
/// input. Ties keep the candidate seen first. NaN scores are never selected.
pub fn select(output: &[ClassificationCandidate]) -> Option<ClassificationCandidate> {
    output
        .iter()
        .filter(|candidate| !candidate.confidence.is_nan())
        .reduce(|best, candidate| {
            if candidate.confidence > best.confidence {
                candidate
            } else {
                best
            }
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(pairs: &[(&str, f32)]) -> Vec<ClassificationCandidate> {
        pairs
            .iter()
            .map(|(label, confidence)| ClassificationCandidate::new(*label, *confidence))
            .collect()
    }

    #[test]
    fn test_select_top_candidate() {
        let output = candidates(&[("cat", 0.92), ("dog", 0.08)]);
        assert_eq!(select(&output), Some(ClassificationCandidate::new("cat", 0.92)));
    }

    #[test]
    fn test_select_does_not_assume_order() {
        let output = candidates(&[("bird", 0.1), ("dog", 0.3), ("cat", 0.6)]);
        assert_eq!(select(&output).map(|c| c.label), Some("cat".to_string()));
    }

    #[test]
    fn test_empty_output_selects_nothing() {
        assert_eq!(select(&[]), None);
    }

    #[test]
    fn test_ties_keep_first_seen() {
        let output = candidates(&[("left", 0.5), ("right", 0.5), ("low", 0.1)]);
        assert_eq!(select(&output).map(|c| c.label), Some("left".to_string()));
    }

    #[test]
    fn test_nan_scores_are_skipped() {
        let output = candidates(&[("broken", f32::NAN), ("ok", 0.2)]);
        assert_eq!(select(&output).map(|c| c.label), Some("ok".to_string()));

        let all_nan = candidates(&[("a", f32::NAN), ("b", f32::NAN)]);
        assert_eq!(select(&all_nan), None);
    }
}
