//! Business rules for proposed alert targets

use super::AlertDirection;
use crate::shared::errors::ValidationError;

/// Maximum relative distance between target and current price
pub const MAX_DEVIATION: f64 = 0.5;

/// Pure, side-effect-free validation. Used for live feedback while typing
/// and as the hard gate before an alert is created.
pub struct AlertValidator;

impl AlertValidator {
    /// Returns the parsed target on success
    pub fn validate(
        &self,
        proposed_target: &str,
        current_price: Option<f64>,
        direction: AlertDirection,
    ) -> Result<f64, ValidationError> {
        let target = proposed_target
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
            .ok_or(ValidationError::NotANumber)?;

        if target <= 0.0 {
            return Err(ValidationError::NonPositive);
        }

        let current = current_price
            .filter(|c| c.is_finite() && *c > 0.0)
            .ok_or(ValidationError::NoReferencePrice)?;

        let consistent = match direction {
            AlertDirection::Above => target > current,
            AlertDirection::Below => target < current,
        };
        if !consistent {
            return Err(ValidationError::DirectionInconsistent);
        }

        let lower = current * (1.0 - MAX_DEVIATION);
        let upper = current * (1.0 + MAX_DEVIATION);
        if target < lower || target > upper {
            return Err(ValidationError::OutOfBand);
        }

        Ok(target)
    }

    pub fn is_valid(&self, proposed_target: &str, current_price: Option<f64>, direction: AlertDirection) -> bool {
        self.validate(proposed_target, current_price, direction).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use AlertDirection::{Above, Below};

    #[test]
    fn test_reference_scenarios() {
        let v = AlertValidator;
        assert_eq!(v.validate("2500", Some(2000.0), Above), Ok(2500.0));
        assert_eq!(v.validate("1800", Some(2000.0), Above), Err(ValidationError::DirectionInconsistent));
        assert_eq!(v.validate("3500", Some(2000.0), Above), Err(ValidationError::OutOfBand));
    }

    #[test]
    fn test_not_a_number() {
        let v = AlertValidator;
        for input in ["", "   ", "abc", "12abc", "NaN", "inf", "-inf"] {
            assert_eq!(v.validate(input, Some(2000.0), Above), Err(ValidationError::NotANumber), "{:?}", input);
        }
    }

    #[test]
    fn test_non_positive() {
        let v = AlertValidator;
        assert_eq!(v.validate("0", Some(2000.0), Below), Err(ValidationError::NonPositive));
        assert_eq!(v.validate("-10", Some(2000.0), Below), Err(ValidationError::NonPositive));
    }

    #[test]
    fn test_missing_reference_price() {
        let v = AlertValidator;
        assert_eq!(v.validate("2500", None, Above), Err(ValidationError::NoReferencePrice));
        assert_eq!(v.validate("2500", Some(f64::NAN), Above), Err(ValidationError::NoReferencePrice));
        assert_eq!(v.validate("2500", Some(0.0), Above), Err(ValidationError::NoReferencePrice));
    }

    #[test]
    fn test_direction_rules() {
        let v = AlertValidator;
        assert_eq!(v.validate("2000", Some(2000.0), Above), Err(ValidationError::DirectionInconsistent));
        assert_eq!(v.validate("2000", Some(2000.0), Below), Err(ValidationError::DirectionInconsistent));
        assert_eq!(v.validate("2100", Some(2000.0), Below), Err(ValidationError::DirectionInconsistent));
        assert_eq!(v.validate("1900", Some(2000.0), Below), Ok(1900.0));
    }

    #[test]
    fn test_band_is_inclusive() {
        let v = AlertValidator;
        assert_eq!(v.validate("3000", Some(2000.0), Above), Ok(3000.0));
        assert_eq!(v.validate("1000", Some(2000.0), Below), Ok(1000.0));
        assert_eq!(v.validate("999.99", Some(2000.0), Below), Err(ValidationError::OutOfBand));
        assert_eq!(v.validate("3000.01", Some(2000.0), Above), Err(ValidationError::OutOfBand));
    }

    #[test]
    fn test_valid_iff_all_rules_hold() {
        let v = AlertValidator;
        let currents = [0.5, 1.0, 37.2, 2000.0, 64_000.0];
        let factors = [0.1, 0.49, 0.5, 0.75, 0.999, 1.0, 1.001, 1.25, 1.5, 1.51, 3.0];
        for &current in &currents {
            for &factor in &factors {
                let target = current * factor;
                for direction in [Above, Below] {
                    let consistent = match direction {
                        Above => target > current,
                        Below => target < current,
                    };
                    let in_band = target >= current * 0.5 && target <= current * 1.5;
                    let expected = target > 0.0 && consistent && in_band;
                    assert_eq!(
                        v.is_valid(&target.to_string(), Some(current), direction),
                        expected,
                        "current={} target={} direction={}",
                        current,
                        target,
                        direction
                    );
                }
            }
        }
    }
}
