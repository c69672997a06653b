//! Recommendation policy.
//!
//! Pure functions mapping a normalised confidence and an optional catalog [`Condition`] to the
//! advice shown to the user, the severity attached to the result, the label it is reported
//! under and the storage folder it is filed in.

use crate::condition::Condition;
use crate::config::ConfidenceThresholds;
use crate::constants::{
    HIGH_CONFIDENCE_ADVICE, LOW_CONFIDENCE_DISCLAIMER, MODERATE_CONFIDENCE_ADVICE,
    UNCLASSIFIED_LABEL,
};
use cutis_files::{SKINS_FOLDER, UNCLASSIFIED_FOLDER};
use cutis_types::{Confidence, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    High,
    Moderate,
    Low,
}

impl ConfidenceTier {
    pub fn of(confidence: Confidence, thresholds: ConfidenceThresholds) -> Self {
        let value = confidence.value();
        if value >= thresholds.high {
            ConfidenceTier::High
        } else if value >= thresholds.moderate {
            ConfidenceTier::Moderate
        } else {
            ConfidenceTier::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationOutcome {
    pub advice: String,
    pub severity: Severity,
    pub tier: ConfidenceTier,
}

/// Advice and severity for a classification.
///
/// - High tier: the condition's recommendation, else generic dermatologist advice
/// - Moderate tier: the condition's recommendation, else a moderate-confidence advisory
/// - Low tier: the fixed low-confidence disclaimer; the condition is ignored
///
/// Severity follows the condition at the high and moderate tiers and is forced to
/// [`Severity::None`] at the low tier.
pub fn recommend(
    confidence: Confidence,
    condition: Option<&Condition>,
    thresholds: ConfidenceThresholds,
) -> RecommendationOutcome {
    let tier = ConfidenceTier::of(confidence, thresholds);
    let condition_advice = condition
        .and_then(|c| c.recommendation.as_deref())
        .map(str::trim)
        .filter(|r| !r.is_empty());
    let condition_severity = condition.map(|c| c.severity).unwrap_or_default();

    let (advice, severity) = match tier {
        ConfidenceTier::High => (
            condition_advice.unwrap_or(HIGH_CONFIDENCE_ADVICE),
            condition_severity,
        ),
        ConfidenceTier::Moderate => (
            condition_advice.unwrap_or(MODERATE_CONFIDENCE_ADVICE),
            condition_severity,
        ),
        ConfidenceTier::Low => (LOW_CONFIDENCE_DISCLAIMER, Severity::None),
    };

    RecommendationOutcome {
        advice: advice.to_string(),
        severity,
        tier,
    }
}

/// Label reported for a prediction: unreliable predictions become [`UNCLASSIFIED_LABEL`].
pub fn effective_label(
    label: &str,
    confidence: Confidence,
    thresholds: ConfidenceThresholds,
) -> String {
    match ConfidenceTier::of(confidence, thresholds) {
        ConfidenceTier::Low => UNCLASSIFIED_LABEL.to_string(),
        _ => label.trim().to_string(),
    }
}

/// Permanent folder for an image: `Skins/<classification>` for high-confidence results,
/// `Skins/Unclassified` otherwise.
pub fn target_folder(
    classification: &str,
    confidence: Confidence,
    thresholds: ConfidenceThresholds,
) -> String {
    match ConfidenceTier::of(confidence, thresholds) {
        ConfidenceTier::High if !classification.trim().is_empty() => {
            format!("{}/{}", SKINS_FOLDER, classification.trim())
        }
        _ => UNCLASSIFIED_FOLDER.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conf(value: f64) -> Confidence {
        Confidence::normalise(value).unwrap()
    }

    fn acne() -> Condition {
        Condition {
            name: "Acne".into(),
            description: "Clogged follicles".into(),
            severity: Severity::Moderate,
            recommendation: Some("See a dermatologist for prescription retinoids".into()),
        }
    }

    fn thresholds() -> ConfidenceThresholds {
        ConfidenceThresholds::default()
    }

    #[test]
    fn test_high_confidence_uses_condition_recommendation() {
        let outcome = recommend(conf(0.95), Some(&acne()), thresholds());
        assert_eq!(outcome.advice, "See a dermatologist for prescription retinoids");
        assert_eq!(outcome.severity, Severity::Moderate);
        assert_eq!(outcome.tier, ConfidenceTier::High);
    }

    #[test]
    fn test_high_confidence_without_condition_is_generic() {
        let outcome = recommend(conf(0.9), None, thresholds());
        assert_eq!(outcome.advice, HIGH_CONFIDENCE_ADVICE);
        assert_eq!(outcome.severity, Severity::None);
    }

    #[test]
    fn test_moderate_confidence_prefers_condition() {
        let with = recommend(conf(0.85), Some(&acne()), thresholds());
        assert_eq!(with.advice, "See a dermatologist for prescription retinoids");
        assert_eq!(with.tier, ConfidenceTier::Moderate);

        let mut blank = acne();
        blank.recommendation = Some("  ".into());
        let without = recommend(conf(0.8), Some(&blank), thresholds());
        assert_eq!(without.advice, MODERATE_CONFIDENCE_ADVICE);
        assert_eq!(without.severity, Severity::Moderate);
    }

    #[test]
    fn test_low_confidence_ignores_condition() {
        for value in [0.0, 0.45, 0.799] {
            let outcome = recommend(conf(value), Some(&acne()), thresholds());
            assert_eq!(outcome.advice, LOW_CONFIDENCE_DISCLAIMER);
            assert_eq!(outcome.severity, Severity::None);
            assert_eq!(outcome.tier, ConfidenceTier::Low);
        }
    }

    #[test]
    fn test_percentage_scores_are_normalised_first() {
        let outcome = recommend(conf(95.0), Some(&acne()), thresholds());
        assert_eq!(outcome.tier, ConfidenceTier::High);
    }

    #[test]
    fn test_effective_label() {
        assert_eq!(effective_label("Acne", conf(0.95), thresholds()), "Acne");
        assert_eq!(effective_label("Acne", conf(0.8), thresholds()), "Acne");
        assert_eq!(
            effective_label("Acne", conf(0.79), thresholds()),
            UNCLASSIFIED_LABEL
        );
    }

    #[test]
    fn test_target_folder() {
        assert_eq!(target_folder("Acne", conf(0.95), thresholds()), "Skins/Acne");
        assert_eq!(
            target_folder("Acne", conf(0.85), thresholds()),
            UNCLASSIFIED_FOLDER
        );
        assert_eq!(target_folder("", conf(0.95), thresholds()), UNCLASSIFIED_FOLDER);
    }
}
