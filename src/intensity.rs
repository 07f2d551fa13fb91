//! Saffir-Simpson intensity classification of observations.

use crate::constants::wind_thresholds;
use crate::models::{Category, Observation};

/// Classify a nature code and wind speed (knots) into an intensity category.
///
/// Extratropical observations are classified as such regardless of wind.
pub fn classify(nature: &str, wind: f64) -> Category {
    if nature.starts_with('E') {
        return Category::Extratropical;
    }

    if wind < wind_thresholds::TROPICAL_DEPRESSION {
        Category::NotRated
    } else if wind < wind_thresholds::TROPICAL_STORM {
        Category::TropicalDepression
    } else if wind < wind_thresholds::CATEGORY_1 {
        Category::TropicalStorm
    } else if wind < wind_thresholds::CATEGORY_2 {
        Category::H1
    } else if wind < wind_thresholds::CATEGORY_3 {
        Category::H2
    } else if wind < wind_thresholds::CATEGORY_4 {
        Category::H3
    } else if wind < wind_thresholds::CATEGORY_5 {
        Category::H4
    } else {
        Category::H5
    }
}

pub fn classify_observation(observation: &Observation) -> Category {
    classify(&observation.nature, observation.wind)
}
