//! Per-track randomization settings.
//!
//! `velocity` and `timing` are tagged records with an `enabled` flag and an
//! `amount` percentage, rather than loose numeric knobs, so defaults and
//! valid ranges live at the type boundary instead of being re-checked at
//! every call site.

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RandomParam {
    pub enabled: bool,
    pub amount: f32,
}

impl RandomParam {
    pub fn new(enabled: bool, amount: f32) -> Self {
        Self {
            enabled,
            amount: amount.clamp(0.0, 100.0),
        }
    }

    pub fn off() -> Self {
        Self {
            enabled: false,
            amount: 0.0,
        }
    }

    /// Fraction in [0, 1] used directly in the randomization formulas.
    pub fn fraction(&self) -> f32 {
        if self.enabled {
            self.amount / 100.0
        } else {
            0.0
        }
    }
}

impl Default for RandomParam {
    fn default() -> Self {
        Self::off()
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Randomization {
    pub velocity: RandomParam,
    pub timing: RandomParam,
}

impl Randomization {
    pub fn off() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_is_zero_when_disabled() {
        let p = RandomParam::new(false, 75.0);
        assert_eq!(p.fraction(), 0.0);
    }

    #[test]
    fn fraction_scales_amount() {
        let p = RandomParam::new(true, 50.0);
        assert_eq!(p.fraction(), 0.5);
    }

    #[test]
    fn amount_clamps_to_percent_range() {
        assert_eq!(RandomParam::new(true, 150.0).amount, 100.0);
        assert_eq!(RandomParam::new(true, -10.0).amount, 0.0);
    }

    #[test]
    fn default_randomization_is_off() {
        let r = Randomization::default();
        assert!(!r.velocity.enabled);
        assert!(!r.timing.enabled);
    }
}
