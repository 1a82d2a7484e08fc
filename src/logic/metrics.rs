//! Evaluation Metrics
//!
//! Pure functions over predicted vs actual class indices.
//!
//! Precision and recall use the simplified correct-vs-incorrect scheme:
//! `matches / total_predicted` and `matches / total_actual`. With equal
//! length inputs both equal accuracy. This is not per-class multiclass
//! precision/recall.

use serde::{Deserialize, Serialize};

use crate::logic::error::{FaultError, FaultResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub accuracy: f32,
    pub precision: f32,
    pub recall: f32,
    pub f1_score: f32,
}

fn check_inputs(predicted: &[usize], actual: &[usize]) -> FaultResult<()> {
    if predicted.is_empty() || actual.is_empty() {
        return Err(FaultError::validation(
            "metrics",
            vec!["predicted".to_string(), "actual".to_string()],
            "class arrays must not be empty",
        ));
    }
    if predicted.len() != actual.len() {
        return Err(FaultError::validation(
            "metrics",
            vec!["predicted".to_string(), "actual".to_string()],
            format!("length mismatch: {} vs {}", predicted.len(), actual.len()),
        ));
    }
    Ok(())
}

fn matches(predicted: &[usize], actual: &[usize]) -> usize {
    predicted.iter().zip(actual).filter(|(p, a)| p == a).count()
}

pub fn accuracy(predicted: &[usize], actual: &[usize]) -> FaultResult<f32> {
    check_inputs(predicted, actual)?;
    Ok(matches(predicted, actual) as f32 / predicted.len() as f32)
}

/// `(precision, recall)`
pub fn precision_recall(predicted: &[usize], actual: &[usize]) -> FaultResult<(f32, f32)> {
    check_inputs(predicted, actual)?;
    let hits = matches(predicted, actual) as f32;
    Ok((hits / predicted.len() as f32, hits / actual.len() as f32))
}

/// Harmonic mean; undefined when precision + recall == 0
pub fn f1_score(precision: f32, recall: f32) -> FaultResult<f32> {
    let sum = precision + recall;
    if sum == 0.0 || !sum.is_finite() {
        return Err(FaultError::MetricsUndefined { precision, recall });
    }
    Ok(2.0 * precision * recall / sum)
}

pub fn evaluate_classes(predicted: &[usize], actual: &[usize]) -> FaultResult<EvaluationMetrics> {
    let accuracy = accuracy(predicted, actual)?;
    let (precision, recall) = precision_recall(predicted, actual)?;
    let f1_score = f1_score(precision, recall)?;

    Ok(EvaluationMetrics {
        accuracy,
        precision,
        recall,
        f1_score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_match() {
        let metrics = evaluate_classes(&[0, 1, 2, 3], &[0, 1, 0, 0]).unwrap();
        assert_eq!(metrics.accuracy, 0.5);
        assert_eq!(metrics.precision, 0.5);
        assert_eq!(metrics.recall, 0.5);
        assert!((metrics.f1_score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_all_wrong_is_undefined() {
        match evaluate_classes(&[3, 3, 3], &[0, 0, 0]) {
            Err(FaultError::MetricsUndefined { precision, recall }) => {
                assert_eq!(precision, 0.0);
                assert_eq!(recall, 0.0);
            }
            other => panic!("Expected MetricsUndefined, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_and_mismatched_inputs() {
        assert!(matches!(accuracy(&[], &[]), Err(FaultError::Validation { .. })));
        assert!(matches!(
            precision_recall(&[0, 1], &[0]),
            Err(FaultError::Validation { .. })
        ));
    }

    #[test]
    fn test_f1_perfect() {
        assert_eq!(f1_score(1.0, 1.0).unwrap(), 1.0);
    }
}
