//! Indicator threshold classifiers.
//!
//! Each function maps a raw per-route metric onto an ordinal score in
//! {0, 1, 2, 3}. They are total: NaN, negative and unrecognized inputs fall
//! through to 0. The cut-offs are calibration constants and include the
//! published gaps (e.g. a paved fraction in [0.99, 1.0) scores 0).

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Score given to a category value outside the closed policy vocabulary.
///
/// Unknown text is scored as the worst band, so unclassified data and
/// genuinely poor service are indistinguishable downstream.
pub const UNRECOGNIZED_CATEGORY_SCORE: u8 = 0;

#[inline]
fn is_valid(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

/// I1: share of the route on paved roads (0.0–1.0).
///
/// | Range          | Score |
/// |----------------|-------|
/// | >= 1.00        | 3     |
/// | [0.95, 0.99)   | 2     |
/// | [0.85, 0.95)   | 1     |
/// | otherwise      | 0     |
pub fn paved_road_score(fraction: f64) -> u8 {
    match fraction {
        p if !is_valid(p) => 0,
        p if p >= 1.0 => 3,
        p if (0.95..0.99).contains(&p) => 2,
        p if (0.85..0.95).contains(&p) => 1,
        _ => 0,
    }
}

/// I2: stop spacing in metres.
///
/// | Range        | Score |
/// |--------------|-------|
/// | <= 100       | 3     |
/// | (100, 200)   | 2     |
/// | [200, 400)   | 1     |
/// | otherwise    | 0     |
pub fn stop_spacing_score(metres: f64) -> u8 {
    match metres {
        d if !is_valid(d) => 0,
        d if d <= 100.0 => 3,
        d if d < 200.0 => 2,
        d if d < 400.0 => 1,
        _ => 0,
    }
}

/// I4: share of trips with a recorded timestamp (0.0–1.0).
///
/// | Range          | Score |
/// |----------------|-------|
/// | >= 0.95        | 3     |
/// | [0.90, 0.95)   | 2     |
/// | [0.80, 0.90)   | 1     |
/// | otherwise      | 0     |
pub fn punctuality_score(rate: f64) -> u8 {
    match rate {
        p if !is_valid(p) => 0,
        p if p >= 0.95 => 3,
        p if p >= 0.90 => 2,
        p if p >= 0.80 => 1,
        _ => 0,
    }
}

/// I5: headway in minutes.
///
/// | Range       | Score |
/// |-------------|-------|
/// | <= 10       | 3     |
/// | (10, 15]    | 2     |
/// | (15, 30]    | 1     |
/// | otherwise   | 0     |
pub fn headway_score(minutes: f64) -> u8 {
    match minutes {
        m if !is_valid(m) => 0,
        m if m <= 10.0 => 3,
        m if m <= 15.0 => 2,
        m if m <= 30.0 => 1,
        _ => 0,
    }
}

/// I6: band of an IQT value. Shared with [`classify`](super::aggregate::classify)
/// and never fed back into the aggregation.
///
/// | Range        | Score |
/// |--------------|-------|
/// | >= 3.0       | 3     |
/// | [2.0, 3.0)   | 2     |
/// | [1.0, 2.0)   | 1     |
/// | otherwise    | 0     |
pub fn iqt_band_score(iqt: f64) -> u8 {
    match iqt {
        v if v >= 3.0 => 3,
        v if v >= 2.0 => 2,
        v if v >= 1.0 => 1,
        _ => 0,
    }
}

/// I7: share of residences within walking distance of a served stop.
///
/// | Range          | Score |
/// |----------------|-------|
/// | == 1.00        | 3     |
/// | (0.95, 0.99]   | 2     |
/// | (0.85, 0.95]   | 1     |
/// | otherwise      | 0     |
pub fn coverage_score(proportion: f64) -> u8 {
    match proportion {
        p if p == 1.0 => 3,
        p if p > 0.95 && p <= 0.99 => 2,
        p if p > 0.85 && p <= 0.95 => 1,
        _ => 0,
    }
}

/// I8: share of drivers with up-to-date training.
///
/// | Range          | Score |
/// |----------------|-------|
/// | >= 1.00        | 3     |
/// | [0.95, 0.98]   | 2     |
/// | [0.90, 0.95)   | 1     |
/// | otherwise      | 0     |
pub fn driver_training_score(fraction: f64) -> u8 {
    match fraction {
        p if !is_valid(p) => 0,
        p if p >= 1.0 => 3,
        p if (0.95..=0.98).contains(&p) => 2,
        p if (0.90..=0.95).contains(&p) => 1,
        _ => 0,
    }
}

/// I3: fare and terminal integration of the municipal system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationLevel {
    /// Electronic ticketing across terminals, intra- and intermodal.
    Full,
    /// Electronic ticketing across terminals, intramodal only.
    PartialIntra,
    /// Time-window fare integration at some points, intramodal only.
    Temporal,
    #[default]
    Unrecognized,
}

impl IntegrationLevel {
    pub const FULL_TEXT: &str = "Sistema de transporte público totalmente integrado com terminais com o uso de bilhete eletrônico para integração intra e intermodal";
    pub const PARTIAL_INTRA_TEXT: &str = "Sistema de transporte público totalmente integrado com terminais com o uso de bilhete eletrônico para integração intramodal somente";
    pub const TEMPORAL_TEXT: &str = "Integração tarifária temporal ocorre em determinados pontos, apenas com transferências intramodais";

    pub fn parse(text: &str) -> Self {
        match text.trim() {
            Self::FULL_TEXT | "full" => IntegrationLevel::Full,
            Self::PARTIAL_INTRA_TEXT | "partial_intra" => IntegrationLevel::PartialIntra,
            Self::TEMPORAL_TEXT | "temporal" => IntegrationLevel::Temporal,
            _ => IntegrationLevel::Unrecognized,
        }
    }
}

/// I9: how current the route's online information is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnlineInfo {
    UpdatedSiteAndApp,
    PartiallyUpdatedSite,
    OutdatedSite,
    #[default]
    Unrecognized,
}

impl OnlineInfo {
    pub const UPDATED_TEXT: &str = "Possuir informações em site e aplicativo atualizados";
    pub const PARTIAL_TEXT: &str = "Possuir informações em site parcialmente atualizado";
    pub const OUTDATED_TEXT: &str = "Possuir informação em site desatualizado";

    pub fn parse(text: &str) -> Self {
        match text.trim() {
            Self::UPDATED_TEXT | "updated_site_and_app" => OnlineInfo::UpdatedSiteAndApp,
            Self::PARTIAL_TEXT | "partially_updated_site" => OnlineInfo::PartiallyUpdatedSite,
            Self::OUTDATED_TEXT | "outdated_site" => OnlineInfo::OutdatedSite,
            _ => OnlineInfo::Unrecognized,
        }
    }
}

/// I10: latest fare change relative to the inflation index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FarePolicy {
    NoIncrease,
    BelowIndex,
    EqualToIndex,
    #[default]
    Unrecognized,
}

impl FarePolicy {
    pub const NO_INCREASE_TEXT: &str = "Não houve aumento da tarifa";
    pub const BELOW_INDEX_TEXT: &str = "Aumento inferior ao índice";
    pub const EQUAL_TO_INDEX_TEXT: &str = "Aumento equivalente ao índice";

    pub fn parse(text: &str) -> Self {
        match text.trim() {
            Self::NO_INCREASE_TEXT | "no_increase" => FarePolicy::NoIncrease,
            Self::BELOW_INDEX_TEXT | "below_index" => FarePolicy::BelowIndex,
            Self::EQUAL_TO_INDEX_TEXT | "equal_to_index" => FarePolicy::EqualToIndex,
            _ => FarePolicy::Unrecognized,
        }
    }
}

macro_rules! infallible_from_str {
    ($($t:ty),*) => {$(
        impl FromStr for $t {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(<$t>::parse(s))
            }
        }
    )*};
}

infallible_from_str!(IntegrationLevel, OnlineInfo, FarePolicy);

/// I3 score.
pub fn integration_score(level: IntegrationLevel) -> u8 {
    match level {
        IntegrationLevel::Full => 3,
        IntegrationLevel::PartialIntra => 2,
        IntegrationLevel::Temporal => 1,
        IntegrationLevel::Unrecognized => UNRECOGNIZED_CATEGORY_SCORE,
    }
}

/// I9 score.
pub fn online_info_score(info: OnlineInfo) -> u8 {
    match info {
        OnlineInfo::UpdatedSiteAndApp => 3,
        OnlineInfo::PartiallyUpdatedSite => 2,
        OnlineInfo::OutdatedSite => 1,
        OnlineInfo::Unrecognized => UNRECOGNIZED_CATEGORY_SCORE,
    }
}

/// I10 score.
pub fn fare_policy_score(policy: FarePolicy) -> u8 {
    match policy {
        FarePolicy::NoIncrease => 3,
        FarePolicy::BelowIndex => 2,
        FarePolicy::EqualToIndex => 1,
        FarePolicy::Unrecognized => UNRECOGNIZED_CATEGORY_SCORE,
    }
}
