//! Data-driven game balance
//!
//! Every number the session engine plays with lives here so a host can ship
//! an override document without recompiling.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Inclusive operand range
pub type Range = (i64, i64);

/// Operand ranges and fuel drain for one difficulty tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub add: Range,
    /// Minuend range
    pub sub_a: Range,
    /// Subtrahend range (swapped with the minuend when larger)
    pub sub_b: Range,
    pub mul: Range,
    /// Divisor and quotient range
    pub div: Range,
    /// Multiplier on fuel loss per second while playing this tier
    pub fuel_loss_mul: f64,
}

/// When completing a tier unlocks the next planet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnlockRule {
    /// Any single completed tier unlocks the next planet
    #[default]
    AnyTier,
    /// All three tiers must be completed
    AllTiers,
}

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tier {tier}: range {range:?} is inverted")]
    InvertedRange { tier: usize, range: Range },
    #[error("tier {tier}: division range must start above zero")]
    ZeroDivisor { tier: usize },
    #[error("{0} must be positive")]
    NotPositive(&'static str),
}

/// Game balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Tier 1..=3 configurations
    pub levels: [LevelConfig; LEVEL_COUNT],
    pub base_max_fuel: f64,
    pub base_fuel_loss_per_sec: f64,
    pub base_fuel_gain: f64,
    pub fuel_empty_threshold: f64,
    pub question_count: u32,
    pub min_question_count: u32,
    /// Track points lost on a wrong answer (0 disables the penalty)
    pub wrong_answer_track_penalty: f64,
    pub unlock_rule: UnlockRule,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            levels: [
                LevelConfig {
                    add: (1, 50),
                    sub_a: (20, 99),
                    sub_b: (1, 50),
                    mul: (2, 9),
                    div: (2, 9),
                    fuel_loss_mul: 1.0,
                },
                LevelConfig {
                    add: (20, 101),
                    sub_a: (40, 140),
                    sub_b: (10, 120),
                    mul: (3, 12),
                    div: (3, 12),
                    fuel_loss_mul: 1.1,
                },
                LevelConfig {
                    add: (50, 150),
                    sub_a: (80, 220),
                    sub_b: (30, 180),
                    mul: (6, 14),
                    div: (6, 14),
                    fuel_loss_mul: 1.2,
                },
            ],
            base_max_fuel: BASE_MAX_FUEL,
            base_fuel_loss_per_sec: BASE_FUEL_LOSS_PER_SEC,
            base_fuel_gain: BASE_FUEL_GAIN,
            fuel_empty_threshold: FUEL_EMPTY_THRESHOLD,
            question_count: BASE_QUESTION_COUNT,
            min_question_count: MIN_QUESTION_COUNT,
            wrong_answer_track_penalty: 0.0,
            unlock_rule: UnlockRule::AnyTier,
        }
    }
}

impl Tuning {
    /// Parse an override document; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    fn validate(&self) -> Result<(), TuningError> {
        for (i, cfg) in self.levels.iter().enumerate() {
            let tier = i + 1;
            for range in [cfg.add, cfg.sub_a, cfg.sub_b, cfg.mul, cfg.div] {
                if range.0 > range.1 {
                    return Err(TuningError::InvertedRange { tier, range });
                }
            }
            if cfg.div.0 <= 0 {
                return Err(TuningError::ZeroDivisor { tier });
            }
        }
        if self.question_count == 0 {
            return Err(TuningError::NotPositive("question_count"));
        }
        if self.base_max_fuel.is_nan() || self.base_max_fuel <= 0.0 {
            return Err(TuningError::NotPositive("base_max_fuel"));
        }
        Ok(())
    }

    /// Configuration for a tier (1-based). Out-of-range tiers fall back to tier 1.
    pub fn level(&self, level: u8) -> &LevelConfig {
        match level {
            1..=3 => &self.levels[level as usize - 1],
            _ => &self.levels[0],
        }
    }

    /// Questions for a session after astro navigation reduction
    pub fn total_questions(&self, reduction: u32) -> u32 {
        let base = self.question_count;
        let floor = self.min_question_count.min(base);
        base.saturating_sub(reduction).clamp(floor, base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tiers_scale_drain() {
        let tuning = Tuning::default();
        assert_eq!(tuning.level(1).fuel_loss_mul, 1.0);
        assert_eq!(tuning.level(2).fuel_loss_mul, 1.1);
        assert_eq!(tuning.level(3).fuel_loss_mul, 1.2);
        assert_eq!(tuning.level(9), tuning.level(1));
    }

    #[test]
    fn test_total_questions_clamped() {
        let tuning = Tuning::default();
        assert_eq!(tuning.total_questions(0), 8);
        assert_eq!(tuning.total_questions(2), 6);
        assert_eq!(tuning.total_questions(10), 4);
    }

    #[test]
    fn test_partial_override() {
        let tuning = Tuning::from_json(r#"{"base_fuel_gain": 20.0, "unlock_rule": "allTiers"}"#)
            .unwrap();
        assert_eq!(tuning.base_fuel_gain, 20.0);
        assert_eq!(tuning.unlock_rule, UnlockRule::AllTiers);
        assert_eq!(tuning.question_count, BASE_QUESTION_COUNT);
    }

    #[test]
    fn test_rejects_bad_documents() {
        assert!(matches!(
            Tuning::from_json("not json"),
            Err(TuningError::Parse(_))
        ));

        let mut tuning = Tuning::default();
        tuning.levels[1].div = (0, 5);
        let json = serde_json::to_string(&tuning).unwrap();
        assert!(matches!(
            Tuning::from_json(&json),
            Err(TuningError::ZeroDivisor { tier: 2 })
        ));

        tuning.levels[1].div = (2, 5);
        tuning.levels[2].add = (10, 1);
        let json = serde_json::to_string(&tuning).unwrap();
        assert!(matches!(
            Tuning::from_json(&json),
            Err(TuningError::InvertedRange { tier: 3, .. })
        ));

        let json = r#"{"question_count": 0}"#;
        assert!(matches!(
            Tuning::from_json(json),
            Err(TuningError::NotPositive("question_count"))
        ));
    }
}
