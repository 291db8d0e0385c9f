//! Accuracy and per-class classification reports for the held-out split.

use serde::Serialize;
use std::fmt;

/// Fraction of positions where `truth` and `predicted` agree. Zero for empty input.
pub fn accuracy(truth: &[usize], predicted: &[usize]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let correct = truth
        .iter()
        .zip(predicted)
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / truth.len() as f64
}

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: usize,
    pub name: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class metrics plus accuracy and macro averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_precision: f64,
    pub macro_recall: f64,
    pub macro_f1: f64,
    pub support: usize,
}

impl ClassificationReport {
    /// Builds the report. `names[i]` labels class `i`; classes without a name use the index.
    ///
    /// Precision (or recall) is 0 for a class that was never predicted (or never present).
    pub fn compute(truth: &[usize], predicted: &[usize], names: &[String]) -> Self {
        let n_classes = truth
            .iter()
            .chain(predicted)
            .max()
            .map_or(0, |m| m + 1)
            .max(names.len());

        let mut true_pos = vec![0usize; n_classes];
        let mut predicted_count = vec![0usize; n_classes];
        let mut support = vec![0usize; n_classes];
        for (&t, &p) in truth.iter().zip(predicted) {
            support[t] += 1;
            predicted_count[p] += 1;
            if t == p {
                true_pos[t] += 1;
            }
        }

        let classes: Vec<ClassMetrics> = (0..n_classes)
            .map(|label| {
                let precision = ratio(true_pos[label], predicted_count[label]);
                let recall = ratio(true_pos[label], support[label]);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    label,
                    name: names
                        .get(label)
                        .cloned()
                        .unwrap_or_else(|| label.to_string()),
                    precision,
                    recall,
                    f1,
                    support: support[label],
                }
            })
            .collect();

        let mean = |f: fn(&ClassMetrics) -> f64| {
            if classes.is_empty() {
                0.0
            } else {
                classes.iter().map(f).sum::<f64>() / classes.len() as f64
            }
        };

        Self {
            accuracy: accuracy(truth, predicted),
            macro_precision: mean(|c| c.precision),
            macro_recall: mean(|c| c.recall),
            macro_f1: mean(|c| c.f1),
            support: truth.len(),
            classes,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.name.len())
            .max()
            .unwrap_or(0)
            .max(12);

        writeln!(
            f,
            "{:>width$}  {:>9}  {:>6}  {:>8}  {:>7}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$}  {:>9.2}  {:>6.2}  {:>8.2}  {:>7}",
                c.name, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$}  {:>9}  {:>6}  {:>8.2}  {:>7}",
            "accuracy", "", "", self.accuracy, self.support
        )?;
        write!(
            f,
            "{:>width$}  {:>9.2}  {:>6.2}  {:>8.2}  {:>7}",
            "macro avg", self.macro_precision, self.macro_recall, self.macro_f1, self.support
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    #[test]
    fn test_report_per_class_metrics() {
        let names = vec!["cold".to_string(), "flu".to_string()];
        let report = ClassificationReport::compute(&[0, 0, 1, 1], &[0, 1, 1, 1], &names);

        let cold = &report.classes[0];
        assert_eq!(cold.precision, 1.0);
        assert_eq!(cold.recall, 0.5);
        assert!((cold.f1 - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(cold.support, 2);

        let flu = &report.classes[1];
        assert!((flu.precision - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(flu.recall, 1.0);

        assert_eq!(report.accuracy, 0.75);
        assert_eq!(report.support, 4);
    }

    #[test]
    fn test_never_predicted_class_scores_zero() {
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let report = ClassificationReport::compute(&[0, 1], &[0, 1], &names);
        assert_eq!(report.classes[2].precision, 0.0);
        assert_eq!(report.classes[2].f1, 0.0);
        assert_eq!(report.classes[2].support, 0);
    }

    #[test]
    fn test_display_lists_every_class() {
        let names = vec!["cold".to_string(), "flu".to_string()];
        let text = ClassificationReport::compute(&[0, 1], &[0, 1], &names).to_string();
        assert!(text.contains("cold"));
        assert!(text.contains("flu"));
        assert!(text.contains("accuracy"));
        assert!(text.contains("macro avg"));
    }
}
