use tracing::debug;

use crate::error::IqtError;
use crate::model::RouteAttributes;
use crate::scoring::grade::{
    coverage_score, driver_training_score, fare_policy_score, headway_score, integration_score,
    iqt_band_score, online_info_score, paved_road_score, punctuality_score, stop_spacing_score,
};
use crate::scoring::types::{INDICATOR_COUNT, IndicatorScores, IqtClass, RouteMetrics};
use crate::scoring::utility::population_stddev;

/// Indicator priorities, I1 through I10.
pub const DEFAULT_WEIGHTS: [f64; INDICATOR_COUNT] = [
    0.1526, 0.1121, 0.0997, 0.2269, 0.0992, 0.0831, 0.0954, 0.0756, 0.0277, 0.0277,
];

const WEIGHT_SUM_TOLERANCE: f64 = 1e-3;

/// Slot of the IQT band indicator, left empty during aggregation.
const IQT_BAND_SLOT: usize = 5;

pub const COLOR_EXCELLENT: &str = "#2ca02c";
pub const COLOR_GOOD: &str = "#1f77b4";
pub const COLOR_SUFFICIENT: &str = "#d62728";
pub const COLOR_INSUFFICIENT: &str = "#e377c2";

/// Validated weight vector with its normalization constant precomputed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    values: [f64; INDICATOR_COUNT],
    /// Population standard deviation of `values` times the indicator count.
    norm: f64,
}

impl Weights {
    pub fn new(values: &[f64]) -> Result<Self, IqtError> {
        let values: [f64; INDICATOR_COUNT] = values.try_into().map_err(|_| {
            IqtError::InvalidWeights(format!(
                "expected {INDICATOR_COUNT} weights, got {}",
                values.len()
            ))
        })?;

        if let Some(w) = values.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(IqtError::InvalidWeights(format!(
                "weights must be finite and nonnegative, got {w}"
            )));
        }

        let sum: f64 = values.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(IqtError::InvalidWeights(format!("weights sum to {sum}, expected 1")));
        }

        let norm = population_stddev(&values) * INDICATOR_COUNT as f64;
        if norm <= f64::EPSILON {
            return Err(IqtError::InvalidWeights(
                "weights have zero spread, index would be undefined".into(),
            ));
        }

        Ok(Self { values, norm })
    }

    pub fn values(&self) -> &[f64; INDICATOR_COUNT] {
        &self.values
    }

    pub fn normalization(&self) -> f64 {
        self.norm
    }

    /// Weighted sum of `scores` divided by the normalization constant.
    ///
    /// NaN scores count as 0 rather than poisoning the index.
    pub fn compute_iqt(&self, scores: &[f64; INDICATOR_COUNT]) -> f64 {
        let weighted: f64 = scores
            .iter()
            .zip(self.values.iter())
            .map(|(s, w)| if s.is_nan() { 0.0 } else { s * w })
            .sum();
        weighted / self.norm
    }
}

impl Default for Weights {
    fn default() -> Self {
        let norm = population_stddev(&DEFAULT_WEIGHTS) * INDICATOR_COUNT as f64;
        Self {
            values: DEFAULT_WEIGHTS,
            norm,
        }
    }
}

/// Free-function form of [`Weights::compute_iqt`].
pub fn compute_iqt(scores: &[f64; INDICATOR_COUNT], weights: &Weights) -> f64 {
    weights.compute_iqt(scores)
}

pub fn classify(iqt: f64) -> IqtClass {
    match iqt_band_score(iqt) {
        3 => IqtClass::Excellent,
        2 => IqtClass::Good,
        1 => IqtClass::Sufficient,
        _ => IqtClass::Insufficient,
    }
}

pub fn color_for(iqt: f64) -> &'static str {
    match classify(iqt) {
        IqtClass::Excellent => COLOR_EXCELLENT,
        IqtClass::Good => COLOR_GOOD,
        IqtClass::Sufficient => COLOR_SUFFICIENT,
        IqtClass::Insufficient => COLOR_INSUFFICIENT,
    }
}

/// Scores every indicator that feeds the aggregation. The IQT band slot stays empty.
pub fn score_indicators(metrics: &RouteMetrics, attributes: &RouteAttributes) -> IndicatorScores {
    let mut scores = [None; INDICATOR_COUNT];
    scores[0] = metrics.paved_fraction.map(paved_road_score);
    scores[1] = metrics.mean_distance_m.map(stop_spacing_score);
    scores[2] = Some(integration_score(attributes.integration));
    scores[3] = metrics.punctuality.map(punctuality_score);
    scores[4] = metrics.headway_min.map(headway_score);
    scores[6] = metrics.coverage_proportion.map(coverage_score);
    scores[7] = metrics.driver_training.map(driver_training_score);
    scores[8] = Some(online_info_score(attributes.online_info));
    scores[9] = Some(fare_policy_score(attributes.fare_policy));
    IndicatorScores(scores)
}

/// Aggregated result for one route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteScore {
    /// Reported scores, with the IQT band in the I6 slot.
    pub scores: [u8; INDICATOR_COUNT],
    pub iqt: f64,
    pub class: IqtClass,
    pub color: &'static str,
}

/// Scores a route's metrics and combines them into its IQT.
pub fn score_route(
    route_id: &str,
    metrics: &RouteMetrics,
    attributes: &RouteAttributes,
    weights: &Weights,
) -> RouteScore {
    let indicators = score_indicators(metrics, attributes);
    let missing = indicators.missing();
    let iqt = weights.compute_iqt(&indicators.to_vector());

    let mut scores = indicators.resolved();
    scores[IQT_BAND_SLOT] = iqt_band_score(iqt);

    debug!(route_id, iqt, ?missing, "Route aggregated");

    RouteScore {
        scores,
        iqt,
        class: classify(iqt),
        color: color_for(iqt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::grade::{FarePolicy, IntegrationLevel, OnlineInfo};

    const ALL_THREE_IQT: f64 = 5.443380430283492;

    #[test]
    fn test_default_weights_are_valid() {
        let weights = Weights::new(&DEFAULT_WEIGHTS).unwrap();
        assert_eq!(weights, Weights::default());
        assert!((weights.normalization() - 0.55112811577708504).abs() < 1e-12);
    }

    #[test]
    fn test_all_threes_is_a_fixed_constant() {
        let weights = Weights::default();
        let first = compute_iqt(&[3.0; 10], &weights);

        for _ in 0..5 {
            assert_eq!(compute_iqt(&[3.0; 10], &weights).to_bits(), first.to_bits());
        }
        assert!((first - ALL_THREE_IQT).abs() < 1e-9, "got {first}");
    }

    #[test]
    fn test_all_zeros_is_zero() {
        assert_eq!(compute_iqt(&[0.0; 10], &Weights::default()), 0.0);
    }

    #[test]
    fn test_nan_score_counts_as_zero() {
        let weights = Weights::default();
        let mut scores = [3.0; 10];
        scores[3] = f64::NAN;
        let mut zeroed = [3.0; 10];
        zeroed[3] = 0.0;

        let iqt = compute_iqt(&scores, &weights);
        assert!(iqt.is_finite());
        assert_eq!(iqt, compute_iqt(&zeroed, &weights));
    }

    #[test]
    fn test_weight_validation() {
        assert!(matches!(Weights::new(&[0.5, 0.5]), Err(IqtError::InvalidWeights(_))));

        let mut negative = DEFAULT_WEIGHTS;
        negative[0] = -0.1526;
        assert!(Weights::new(&negative).is_err());

        let mut unnormalized = DEFAULT_WEIGHTS;
        unnormalized[0] = 0.5;
        assert!(Weights::new(&unnormalized).is_err());

        assert!(Weights::new(&[0.1; 10]).is_err());
    }

    #[test]
    fn test_classify_and_color_share_bands() {
        assert_eq!(classify(ALL_THREE_IQT), IqtClass::Excellent);
        assert_eq!(classify(3.0), IqtClass::Excellent);
        assert_eq!(classify(2.0), IqtClass::Good);
        assert_eq!(classify(1.5), IqtClass::Sufficient);
        assert_eq!(classify(0.2), IqtClass::Insufficient);
        assert_eq!(classify(f64::NAN), IqtClass::Insufficient);

        assert_eq!(color_for(3.2), COLOR_EXCELLENT);
        assert_eq!(color_for(2.5), COLOR_GOOD);
        assert_eq!(color_for(1.0), COLOR_SUFFICIENT);
        assert_eq!(color_for(0.99), COLOR_INSUFFICIENT);
    }

    #[test]
    fn test_score_route_with_missing_metrics() {
        let attributes = RouteAttributes {
            integration: IntegrationLevel::Full,
            online_info: OnlineInfo::UpdatedSiteAndApp,
            fare_policy: FarePolicy::NoIncrease,
            ..Default::default()
        };
        let metrics = RouteMetrics {
            punctuality: Some(0.97),
            ..Default::default()
        };

        let result = score_route("10", &metrics, &attributes, &Weights::default());

        assert_eq!(result.scores[0], 0);
        assert_eq!(result.scores[2], 3);
        assert_eq!(result.scores[3], 3);
        assert_eq!(result.scores[8], 3);
        assert_eq!(result.scores[9], 3);

        let expected = 3.0 * (0.0997 + 0.2269 + 0.0277 + 0.0277) / Weights::default().normalization();
        assert!((result.iqt - expected).abs() < 1e-12);
        assert_eq!(result.scores[5], iqt_band_score(result.iqt));
        assert_eq!(result.class, classify(result.iqt));
    }

    #[test]
    fn test_band_slot_is_not_fed_back() {
        let metrics = RouteMetrics {
            paved_fraction: Some(1.0),
            mean_distance_m: Some(80.0),
            punctuality: Some(1.0),
            headway_min: Some(8.0),
            coverage_proportion: Some(1.0),
            driver_training: Some(1.0),
            completion_ratio: Some(1.0),
        };
        let attributes = RouteAttributes {
            integration: IntegrationLevel::Full,
            online_info: OnlineInfo::UpdatedSiteAndApp,
            fare_policy: FarePolicy::NoIncrease,
            ..Default::default()
        };

        let result = score_route("20", &metrics, &attributes, &Weights::default());

        let mut expected_vector = [3.0; 10];
        expected_vector[IQT_BAND_SLOT] = 0.0;
        assert_eq!(result.iqt, compute_iqt(&expected_vector, &Weights::default()));
        assert_eq!(result.scores, [3; 10]);
    }
}
