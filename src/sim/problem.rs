//! Arithmetic problem generation
//!
//! Pure functions of (operation, tier config, rng). No memoization; repeats
//! are allowed.

use rand::Rng;
use serde::Serialize;

use super::state::Operation;
use crate::tuning::{LevelConfig, Range};

/// A generated question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    pub operation: Operation,
    pub lhs: i64,
    pub rhs: i64,
    pub answer: i64,
}

impl Problem {
    /// Question text, e.g. `"12 + 7 = ?"`
    pub fn prompt(&self) -> String {
        format!("{} {} {} = ?", self.lhs, self.operation.symbol(), self.rhs)
    }

    pub fn is_correct(&self, value: f64) -> bool {
        value == self.answer as f64
    }
}

#[inline]
fn draw<R: Rng + ?Sized>(rng: &mut R, range: Range) -> i64 {
    let (lo, hi) = range;
    if lo >= hi {
        return lo;
    }
    rng.random_range(lo..=hi)
}

/// Generate a problem for the given operation and tier
pub fn generate<R: Rng + ?Sized>(op: Operation, cfg: &LevelConfig, rng: &mut R) -> Problem {
    match op {
        Operation::Add => {
            let a = draw(rng, cfg.add);
            let b = draw(rng, cfg.add);
            Problem {
                operation: op,
                lhs: a,
                rhs: b,
                answer: a + b,
            }
        }
        Operation::Sub => {
            let mut a = draw(rng, cfg.sub_a);
            let mut b = draw(rng, cfg.sub_b);
            if b > a {
                std::mem::swap(&mut a, &mut b);
            }
            Problem {
                operation: op,
                lhs: a,
                rhs: b,
                answer: a - b,
            }
        }
        Operation::Mul => {
            let a = draw(rng, cfg.mul);
            let b = draw(rng, cfg.mul);
            Problem {
                operation: op,
                lhs: a,
                rhs: b,
                answer: a * b,
            }
        }
        Operation::Div => {
            // Build the dividend from divisor and quotient so the result is exact
            let b = draw(rng, cfg.div).max(1);
            let q = draw(rng, cfg.div);
            Problem {
                operation: op,
                lhs: b * q,
                rhs: b,
                answer: q,
            }
        }
    }
}

/// Parse a typed answer. Returns None for empty or non-numeric input;
/// a numeric but fractional answer parses and is simply wrong.
pub fn parse_answer(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_prompt_format() {
        let p = Problem {
            operation: Operation::Div,
            lhs: 42,
            rhs: 6,
            answer: 7,
        };
        assert_eq!(p.prompt(), "42 ÷ 6 = ?");
        assert!(p.is_correct(7.0));
        assert!(!p.is_correct(6.0));
        assert!(!p.is_correct(7.5));
    }

    #[test]
    fn test_operands_within_tier() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(7);
        for level in 1..=3u8 {
            let cfg = tuning.level(level);
            for _ in 0..200 {
                let p = generate(Operation::Add, cfg, &mut rng);
                assert!((cfg.add.0..=cfg.add.1).contains(&p.lhs));
                assert!((cfg.add.0..=cfg.add.1).contains(&p.rhs));
                assert_eq!(p.answer, p.lhs + p.rhs);

                let p = generate(Operation::Mul, cfg, &mut rng);
                assert!((cfg.mul.0..=cfg.mul.1).contains(&p.lhs));
                assert_eq!(p.answer, p.lhs * p.rhs);
            }
        }
    }

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer(" 42 "), Some(42.0));
        assert_eq!(parse_answer("-3"), Some(-3.0));
        assert_eq!(parse_answer("12,5"), Some(12.5));
        assert_eq!(parse_answer(""), None);
        assert_eq!(parse_answer("   "), None);
        assert_eq!(parse_answer("abc"), None);
        assert_eq!(parse_answer("NaN"), None);
        assert_eq!(parse_answer("inf"), None);
    }

    proptest! {
        #[test]
        fn prop_division_is_exact(seed in any::<u64>(), level in 1u8..=3) {
            let tuning = Tuning::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let p = generate(Operation::Div, tuning.level(level), &mut rng);
            prop_assert!(p.rhs > 0);
            prop_assert_eq!(p.lhs % p.rhs, 0);
            prop_assert_eq!(p.lhs / p.rhs, p.answer);
        }

        #[test]
        fn prop_subtraction_non_negative(seed in any::<u64>(), level in 1u8..=3) {
            let tuning = Tuning::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let p = generate(Operation::Sub, tuning.level(level), &mut rng);
            prop_assert!(p.answer >= 0);
            prop_assert!(p.lhs >= p.rhs);
            prop_assert_eq!(p.lhs - p.rhs, p.answer);
        }
    }
}
