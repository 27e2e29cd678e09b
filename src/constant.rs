//! Constant-expression synthesis.
//!
//! Array dimensions, case labels and subrange bounds must be compile-time
//! constants. Instead of printing them as bare literals, [`render`] spells a
//! target integer as a random arithmetic expression that evaluates to exactly
//! that integer: sums and differences, products of a divisor pair, exact
//! quotients, integer powers and negation.
//!
//! The chain mirrors the precedence of the target language, lowest first:
//! `sum -> mul_div -> unary -> power -> atom`. Each step either decomposes the
//! value or hands it to the next, simpler step, and a depth budget forces the
//! literal form once exhausted.

use rand::Rng;
use rand::seq::SliceRandom;

/// Probability of a sum/difference split at the additive level.
const SUM_PROBABILITY: f64 = 0.3;
/// Probability of a product/quotient split at the multiplicative level.
const MUL_DIV_PROBABILITY: f64 = 0.3;
/// Probability of trying a power form for values >= 4.
const POWER_PROBABILITY: f64 = 0.2;
/// Probability of wrapping an atom in parentheses.
const PAREN_PROBABILITY: f64 = 0.07;

/// Divisor and base searches, and quotient blow-up, stay below this magnitude.
const SEARCH_LIMIT: u64 = 1_000_000_000;

/// Render `value` as a constant expression.
///
/// `max_depth` bounds the recursion; with a budget of zero the plain literal
/// is returned.
pub fn render<R: Rng + ?Sized>(rng: &mut R, value: i64, max_depth: usize) -> String {
    Renderer { rng, max_depth }.sum(value, 0)
}

struct Renderer<'a, R: ?Sized> {
    rng: &'a mut R,
    max_depth: usize,
}

impl<R: Rng + ?Sized> Renderer<'_, R> {
    fn can_recurse(&self, depth: usize) -> bool {
        depth < self.max_depth
    }

    fn chance(&mut self, depth: usize, prob: f64) -> bool {
        self.can_recurse(depth) && self.rng.gen_bool(prob)
    }

    /// `a + b` or `a - b`.
    fn sum(&mut self, value: i64, depth: usize) -> String {
        if self.chance(depth, SUM_PROBABILITY) {
            let offset = self.rng.gen_range(0..15);
            if self.rng.gen_bool(0.5) {
                if let Some(rest) = value.checked_sub(offset) {
                    return format!(
                        "{} + {}",
                        self.sum(offset, depth + 1),
                        self.mul_div(rest, depth + 1)
                    );
                }
            } else if let Some(total) = value.checked_add(offset) {
                return format!(
                    "{} - {}",
                    self.sum(total, depth + 1),
                    self.mul_div(offset, depth + 1)
                );
            }
        }
        self.mul_div(value, depth)
    }

    /// `a * b` over a divisor pair, or the exact quotient `(value * a) / a`.
    fn mul_div(&mut self, value: i64, depth: usize) -> String {
        if self.chance(depth, MUL_DIV_PROBABILITY) {
            if self.rng.gen_bool(0.5) {
                let divisors = small_divisors(value);
                if let Some(&a) = divisors.choose(self.rng) {
                    let b = value / a;
                    return format!(
                        "{} * {}",
                        self.mul_div(a, depth + 1),
                        self.unary(b, depth + 1)
                    );
                }
            } else {
                let a = self.rng.gen_range(1..=5);
                if let Some(scaled) = value.checked_mul(a)
                    && scaled.unsigned_abs() <= SEARCH_LIMIT
                {
                    return format!(
                        "{} / {}",
                        self.mul_div(scaled, depth + 1),
                        self.unary(a, depth + 1)
                    );
                }
            }
        }
        self.unary(value, depth)
    }

    fn unary(&mut self, value: i64, depth: usize) -> String {
        if value < 0 {
            format!("-{}", self.power(value.unsigned_abs(), depth))
        } else {
            self.power(value.unsigned_abs(), depth)
        }
    }

    /// `base ^ exponent` when `value` is a perfect power.
    fn power(&mut self, value: u64, depth: usize) -> String {
        if value >= 4 && self.chance(depth, POWER_PROBABILITY) {
            let bases = perfect_power_bases(value);
            if let Some(&(base, exponent)) = bases.choose(self.rng) {
                return format!(
                    "{} ^ {}",
                    self.atom(base, depth + 1),
                    self.power(u64::from(exponent), depth + 1)
                );
            }
        }
        self.atom(value, depth)
    }

    fn atom(&mut self, value: u64, depth: usize) -> String {
        if self.chance(depth, PAREN_PROBABILITY) {
            // Values reaching the atom level are non-negative and were
            // produced from an i64, so the conversion cannot fail.
            if let Ok(signed) = i64::try_from(value) {
                return format!("({})", self.sum(signed, depth + 1));
            }
        }
        value.to_string()
    }
}

/// Divisors `1..=sqrt(|value|)` of `value`; empty for zero or out-of-range
/// magnitudes.
fn small_divisors(value: i64) -> Vec<i64> {
    let magnitude = value.unsigned_abs();
    if magnitude == 0 || magnitude > SEARCH_LIMIT {
        return Vec::new();
    }
    (1..=magnitude.isqrt())
        .filter(|n| magnitude % n == 0)
        .map(|n| n as i64)
        .collect()
}

/// Every `(base, exponent)` with `base ^ exponent == value`, `base >= 2` and
/// `exponent >= 2`.
fn perfect_power_bases(value: u64) -> Vec<(u64, u32)> {
    if value > SEARCH_LIMIT {
        return Vec::new();
    }
    let mut found = Vec::new();
    for base in 2..=value.isqrt() {
        let mut power = base;
        let mut exponent = 1;
        while power < value {
            match power.checked_mul(base) {
                Some(next) => power = next,
                None => break,
            }
            exponent += 1;
        }
        if power == value && exponent >= 2 {
            found.push((base, exponent));
        }
    }
    found
}
