//! Body-mass index
//!
//! Converts weight and height to metric and computes BMI with its category.

use crate::types::{BmiCategory, BmiReading, HeightUnit, Profile, WeightUnit};

/// BMI calculator
pub struct BmiCalculator;

impl BmiCalculator {
    /// Compute BMI; `None` unless both values are positive and finite
    pub fn compute(
        weight: f64,
        weight_unit: WeightUnit,
        height: f64,
        height_unit: HeightUnit,
    ) -> Option<BmiReading> {
        if !(weight.is_finite() && height.is_finite()) || weight <= 0.0 || height <= 0.0 {
            return None;
        }

        let kg = weight_unit.to_kg(weight);
        let meters = height_unit.to_meters(height);
        let value = kg / (meters * meters);

        Some(BmiReading {
            value,
            category: categorize(value),
        })
    }

    /// Compute BMI from a profile's current weight and height
    pub fn from_profile(profile: &Profile) -> Option<BmiReading> {
        Self::compute(
            profile.current_weight?,
            profile.weight_unit,
            profile.height?,
            profile.height_unit,
        )
    }
}

fn categorize(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}
