//! Transcendental functions on [`BigNumber`]: sqrt, exp, ln, log10, pow,
//! the trigonometric family and their inverses, and the hyperbolic family.
//! Every function here computes at a small number of guard digits beyond
//! the caller's requested precision and rounds the final result down to
//! that precision, so intermediate rounding error in a long series or
//! iteration does not show up in the last returned digit.

use std::cmp::Ordering;

use crate::error::{Result, VmError};

use super::arith::{self, compare};
use super::BigNumber;

const GUARD_DIGITS: u16 = 6;

fn working(prec: u16) -> u16 {
    prec.saturating_add(GUARD_DIGITS).max(12)
}

fn two(p: u16) -> BigNumber {
    BigNumber::from_i32(2, Some(p))
}

fn one(p: u16) -> BigNumber {
    BigNumber::from_i32(1, Some(p))
}

fn is_negative_nonzero(a: &BigNumber) -> bool {
    a.is_negative() && !a.is_zero()
}

/// Number of Newton-style iterations sufficient to converge a
/// quadratically-convergent iteration to `prec` digits, starting from
/// roughly one good digit (doubles each step, plus a small safety margin).
fn newton_iterations(prec: u16) -> u32 {
    let mut n = 1u32;
    let mut bits = 1u32;
    while bits < prec as u32 {
        bits *= 2;
        n += 1;
    }
    n + 3
}

/// Square root via Newton's method on `f(x) = x^2 - a`. Negative operands
/// are an error; zero, NaN and positive infinity pass through.
pub fn sqrt(a: &BigNumber, prec: u16) -> Result<BigNumber> {
    if is_negative_nonzero(a) {
        return Err(VmError::BadValBif("sqrt of a negative number".into()));
    }
    if a.is_nan() {
        return Ok(BigNumber::nan(prec));
    }
    if a.is_infinite() {
        return Ok(BigNumber::infinity(prec, false));
    }
    if a.is_zero() {
        return Ok(BigNumber::zero(prec));
    }

    let wp = working(prec);
    let a_w = a.round_to(wp);
    let two_w = two(wp);

    let mut x = a_w.round_to(wp.min(a_w.precision()).max(1));
    if compare(&x, &one(wp)) == Some(Ordering::Less) {
        x = one(wp);
    }
    for _ in 0..newton_iterations(wp) {
        let quotient = arith::div(&a_w, &x)?;
        x = arith::div(&arith::add(&x, &quotient), &two_w)?;
    }
    Ok(x.round_to(prec))
}

/// `e^x` via range reduction (halve the argument until it is small) plus a
/// Taylor series, then squaring the result back up.
pub fn exp(a: &BigNumber, prec: u16) -> Result<BigNumber> {
    if a.is_nan() {
        return Ok(BigNumber::nan(prec));
    }
    if a.is_infinite() {
        return Ok(BigNumber::infinity(prec, false));
    }
    if a.is_zero() {
        return Ok(one(prec));
    }

    let wp = working(prec);
    let mut x = a.round_to(wp);
    let two_w = two(wp);

    let mut halvings = 0u32;
    while compare(&x, &one(wp)).map(|o| o == Ordering::Greater).unwrap_or(false)
        || compare(&x, &arith::neg(&one(wp))).map(|o| o == Ordering::Less).unwrap_or(false)
    {
        x = arith::div(&x, &two_w)?;
        halvings += 1;
        if halvings > 4096 {
            return Err(VmError::NumOverflow);
        }
    }

    let mut term = one(wp);
    let mut sum = one(wp);
    let mut k = 1u32;
    loop {
        term = arith::div(&arith::mul(&term, &x), &BigNumber::from_i32(k as i32, Some(wp)))?;
        sum = arith::add(&sum, &term);
        if term.round_to(wp).is_zero() {
            break;
        }
        k += 1;
        if k > 10_000 {
            break;
        }
    }

    for _ in 0..halvings {
        sum = arith::mul(&sum, &sum);
    }
    Ok(sum.round_to(prec))
}

/// Natural log via repeated square-rooting to bring the argument near 1,
/// then the fast-converging series `ln(x) = 2*atanh((x-1)/(x+1))`.
pub fn ln(a: &BigNumber, prec: u16) -> Result<BigNumber> {
    if a.is_nan() {
        return Ok(BigNumber::nan(prec));
    }
    if is_negative_nonzero(a) || a.is_zero() {
        return Err(VmError::BadValBif("ln of a non-positive number".into()));
    }
    if a.is_infinite() {
        return Ok(BigNumber::infinity(prec, false));
    }

    let wp = working(prec);
    let mut x = a.round_to(wp);
    let lo = BigNumber::parse("0.5", Some(wp))?;
    let hi = two(wp);

    let mut doublings = 0u32;
    while compare(&x, &hi) == Some(Ordering::Greater) || compare(&x, &lo) == Some(Ordering::Less) {
        x = sqrt(&x, wp)?;
        doublings += 1;
        if doublings > 4096 {
            return Err(VmError::NumOverflow);
        }
    }

    let y = arith::div(&arith::sub(&x, &one(wp)), &arith::add(&x, &one(wp)))?;
    let y2 = arith::mul(&y, &y);
    let mut term = y.clone();
    let mut sum = y.clone();
    let mut n = 1u32;
    loop {
        term = arith::mul(&term, &y2);
        n += 2;
        let addend = arith::div(&term, &BigNumber::from_i32(n as i32, Some(wp)))?;
        sum = arith::add(&sum, &addend);
        if addend.round_to(wp).is_zero() {
            break;
        }
        if n > 20_000 {
            break;
        }
    }

    let mut result = arith::mul(&sum, &two(wp));
    if doublings > 0 {
        let scale = pow_integer(&two(wp), doublings as i32, wp)?;
        result = arith::mul(&result, &scale);
    }
    Ok(result.round_to(prec))
}

/// `log10(x) = ln(x) / ln(10)`.
pub fn log10(a: &BigNumber, prec: u16) -> Result<BigNumber> {
    let wp = working(prec);
    let ln_a = ln(a, wp)?;
    let ln10 = ln(&BigNumber::from_i32(10, Some(wp)), wp)?;
    Ok(arith::div(&ln_a, &ln10)?.round_to(prec))
}

/// `base^exponent`. Integer exponents use exact
/// repeated squaring; non-integer exponents fall back to `exp(y * ln(x))`.
pub fn pow(base: &BigNumber, exponent: &BigNumber, prec: u16) -> Result<BigNumber> {
    if exponent.is_zero() {
        return Ok(one(prec));
    }
    if let Ok(n) = exponent.to_i32() {
        if arith::compare(exponent, &BigNumber::from_i32(n, Some(exponent.precision()))) == Some(Ordering::Equal) {
            return pow_integer(base, n, prec);
        }
    }
    if is_negative_nonzero(base) {
        return Err(VmError::BadValBif("fractional power of a negative number".into()));
    }
    let wp = working(prec);
    let y = exponent.round_to(wp);
    let l = ln(base, wp)?;
    exp(&arith::mul(&y, &l), prec)
}

fn pow_integer(base: &BigNumber, n: i32, prec: u16) -> Result<BigNumber> {
    let wp = working(prec);
    if n == 0 {
        return Ok(one(prec));
    }
    let negative_exp = n < 0;
    let mut exp_mag = n.unsigned_abs();
    let mut result = one(wp);
    let mut b = base.round_to(wp);
    while exp_mag > 0 {
        if exp_mag & 1 == 1 {
            result = arith::mul(&result, &b);
        }
        b = arith::mul(&b, &b);
        exp_mag >>= 1;
    }
    if negative_exp {
        result = arith::div(&one(wp), &result)?;
    }
    Ok(result.round_to(prec))
}

/// Reduce `x` modulo `2*pi` into `(-pi, pi]` using `div_rem`.
fn reduce_angle(x: &BigNumber, pi: &BigNumber, wp: u16) -> Result<BigNumber> {
    let two_pi = arith::mul(&two(wp), pi);
    let (_, mut r) = arith::div_rem(x, &two_pi)?;
    if compare(&r, pi) == Some(Ordering::Greater) {
        r = arith::sub(&r, &two_pi);
    } else if compare(&r, &arith::neg(pi)) != Some(Ordering::Greater) {
        r = arith::add(&r, &two_pi);
    }
    Ok(r)
}

fn pi_at(wp: u16) -> Result<BigNumber> {
    // 4 * asin(sqrt(1/2)), computed directly (no cross-module cache
    // dependency) so this module stands on its own.
    let half = arith::div(&one(wp), &two(wp))?;
    let s = sqrt(&half, wp)?;
    let a = asin(&s, wp)?;
    Ok(arith::mul(&BigNumber::from_i32(4, Some(wp)), &a).round_to(wp))
}

/// Direct power series for sine on a small argument (no range reduction):
/// `x - x^3/3! + x^5/5! - ...`.
fn sin_series(x: &BigNumber, wp: u16) -> BigNumber {
    let x2 = arith::mul(x, x);
    let mut term = x.clone();
    let mut sum = x.clone();
    let mut n = 1u32;
    loop {
        n += 2;
        term = arith::mul(&term, &x2);
        let denom = BigNumber::from_i32((n * (n - 1)) as i32, Some(wp));
        let addend = match arith::div(&term, &denom) {
            Ok(v) => v,
            Err(_) => break,
        };
        sum = if (n / 2) % 2 == 0 { arith::add(&sum, &addend) } else { arith::sub(&sum, &addend) };
        if addend.round_to(wp).is_zero() || n > 20_000 {
            break;
        }
    }
    sum
}

/// Direct power series for cosine on a small argument: `1 - x^2/2! + x^4/4! - ...`.
fn cos_series(x: &BigNumber, wp: u16) -> BigNumber {
    let x2 = arith::mul(x, x);
    let mut term = one(wp);
    let mut sum = one(wp);
    let mut n = 0u32;
    loop {
        n += 2;
        term = arith::mul(&term, &x2);
        let denom = BigNumber::from_i32((n * (n - 1)) as i32, Some(wp));
        let addend = match arith::div(&term, &denom) {
            Ok(v) => v,
            Err(_) => break,
        };
        sum = if (n / 2) % 2 == 1 { arith::add(&sum, &addend) } else { arith::sub(&sum, &addend) };
        if addend.round_to(wp).is_zero() || n > 20_000 {
            break;
        }
    }
    sum
}

/// Direct power series for arcsine on a small argument:
/// `Σ ((2k)! / (4^k (k!)^2 (2k+1))) x^(2k+1)`, valid (and fast-converging)
/// for `|x| <= 1/sqrt(2)`.
fn asin_series(x: &BigNumber, wp: u16) -> BigNumber {
    let x2 = arith::mul(x, x);
    let mut addend = x.clone();
    let mut sum = x.clone();
    let mut k: u32 = 0;
    loop {
        k += 1;
        let coeff = BigNumber::from_i32(((2 * k - 1) * (2 * k - 1)) as i32, Some(wp));
        let denom = BigNumber::from_i32((2 * k * (2 * k + 1)) as i32, Some(wp));
        addend = arith::mul(&addend, &x2);
        addend = arith::mul(&addend, &coeff);
        addend = match arith::div(&addend, &denom) {
            Ok(v) => v,
            Err(_) => break,
        };
        sum = arith::add(&sum, &addend);
        if addend.round_to(wp).is_zero() || k > 10_000 {
            break;
        }
    }
    sum
}

/// Direct power series for arctangent on a small argument:
/// `x - x^3/3 + x^5/5 - ...`.
fn atan_series(x: &BigNumber, wp: u16) -> BigNumber {
    let x2 = arith::mul(x, x);
    let mut term = x.clone();
    let mut sum = x.clone();
    let mut n = 1i32;
    let mut positive = false;
    loop {
        term = arith::mul(&term, &x2);
        n += 2;
        let denom = BigNumber::from_i32(n, Some(wp));
        let addend = match arith::div(&term, &denom) {
            Ok(v) => v,
            Err(_) => break,
        };
        sum = if positive { arith::add(&sum, &addend) } else { arith::sub(&sum, &addend) };
        positive = !positive;
        if addend.round_to(wp).is_zero() || n > 20_000 {
            break;
        }
    }
    sum
}

/// Reduce `|a|` into the first quadrant `[0, pi/2]`, returning the reduced
/// magnitude, whether it exceeds `pi/4` (so the complementary series
/// should be used), and the sign corrections `sin(a) = sin_sign * f(r)`
/// and `cos(a) = cos_sign * g(r)` where `f`/`g` are the sine/cosine series
/// appropriate to the quadrant.
fn reduce_quadrant(a: &BigNumber, pi: &BigNumber, wp: u16) -> Result<(BigNumber, bool, i8, i8)> {
    let reduced = reduce_angle(&a.round_to(wp), pi, wp)?;
    let sin_sign: i8 = if reduced.is_negative() { -1 } else { 1 };
    let r_abs = if reduced.is_negative() { arith::neg(&reduced) } else { reduced };

    let half_pi = arith::div(pi, &two(wp))?;
    let (r, cos_sign): (BigNumber, i8) = if compare(&r_abs, &half_pi) == Some(Ordering::Greater) {
        (arith::sub(pi, &r_abs), -1)
    } else {
        (r_abs, 1)
    };

    let quarter_pi = arith::div(pi, &BigNumber::from_i32(4, Some(wp)))?;
    let above_quarter = compare(&r, &quarter_pi) == Some(Ordering::Greater);
    Ok((r, above_quarter, sin_sign, cos_sign))
}

/// Sine, in radians. Range-reduces mod 2*pi and into the first quadrant;
/// above pi/4 uses the complementary cosine series for conditioning.
pub fn sin(a: &BigNumber, prec: u16) -> Result<BigNumber> {
    if a.is_nan() || a.is_infinite() {
        return Ok(BigNumber::nan(prec));
    }
    if a.is_zero() {
        return Ok(BigNumber::zero(prec));
    }
    let wp = working(prec);
    let pi = pi_at(wp)?;
    let (r, above_quarter, sin_sign, _) = reduce_quadrant(a, &pi, wp)?;
    let s = if above_quarter {
        let complement = arith::sub(&arith::div(&pi, &two(wp))?, &r);
        cos_series(&complement, wp)
    } else {
        sin_series(&r, wp)
    };
    let signed = if sin_sign < 0 { arith::neg(&s) } else { s };
    Ok(signed.round_to(prec))
}

/// Cosine, in radians. Same quadrant reduction as [`sin`].
pub fn cos(a: &BigNumber, prec: u16) -> Result<BigNumber> {
    if a.is_nan() || a.is_infinite() {
        return Ok(BigNumber::nan(prec));
    }
    if a.is_zero() {
        return Ok(one(prec));
    }
    let wp = working(prec);
    let pi = pi_at(wp)?;
    let (r, above_quarter, _, cos_sign) = reduce_quadrant(a, &pi, wp)?;
    let c = if above_quarter {
        let complement = arith::sub(&arith::div(&pi, &two(wp))?, &r);
        sin_series(&complement, wp)
    } else {
        cos_series(&r, wp)
    };
    let signed = if cos_sign < 0 { arith::neg(&c) } else { c };
    Ok(signed.round_to(prec))
}

/// Tangent, in radians. `tan = sin/cos`, except above pi/4 post-reduction
/// where `1/tan` (cotangent of the complement) is computed instead for
/// better conditioning near the pi/2 asymptote.
pub fn tan(a: &BigNumber, prec: u16) -> Result<BigNumber> {
    if a.is_nan() || a.is_infinite() {
        return Ok(BigNumber::nan(prec));
    }
    if a.is_zero() {
        return Ok(BigNumber::zero(prec));
    }
    let wp = working(prec);
    let pi = pi_at(wp)?;
    let (r, above_quarter, sin_sign, cos_sign) = reduce_quadrant(a, &pi, wp)?;
    let overall_sign = sin_sign * cos_sign;

    let t = if above_quarter {
        let complement = arith::sub(&arith::div(&pi, &two(wp))?, &r);
        let s_comp = sin_series(&complement, wp);
        let c_comp = cos_series(&complement, wp);
        if s_comp.is_zero() {
            return Err(VmError::DivideByZero);
        }
        arith::div(&c_comp, &s_comp)?
    } else {
        let s = sin_series(&r, wp);
        let c = cos_series(&r, wp);
        if c.is_zero() {
            return Err(VmError::DivideByZero);
        }
        arith::div(&s, &c)?
    };
    let signed = if overall_sign < 0 { arith::neg(&t) } else { t };
    Ok(signed.round_to(prec))
}

/// Arcsine. `|x| > 1` is out-of-range. Above `1/sqrt(2)` rewrites via
/// `asin(x) = sign(x)*(pi/2 - asin(sqrt(1-x^2)))`; otherwise uses the
/// direct power series. Domain `[-1, 1]`.
pub fn asin(a: &BigNumber, prec: u16) -> Result<BigNumber> {
    let wp = working(prec);
    let x = a.round_to(wp);
    if compare(&x, &one(wp)) == Some(Ordering::Greater) || compare(&x, &arith::neg(&one(wp))) == Some(Ordering::Less) {
        return Err(VmError::OutOfRange);
    }
    if x.is_zero() {
        return Ok(BigNumber::zero(prec));
    }

    let neg = x.is_negative();
    let mag = if neg { arith::neg(&x) } else { x.clone() };
    let threshold = sqrt(&arith::div(&one(wp), &two(wp))?, wp)?;

    let result = if compare(&mag, &threshold) == Some(Ordering::Greater) {
        let pi = pi_at(wp)?;
        let half_pi = arith::div(&pi, &two(wp))?;
        let complement = sqrt(&arith::sub(&one(wp), &arith::mul(&mag, &mag)), wp)?;
        arith::sub(&half_pi, &asin_series(&complement, wp))
    } else {
        asin_series(&mag, wp)
    };

    let signed = if neg { arith::neg(&result) } else { result };
    Ok(signed.round_to(prec))
}

/// `acos(x) = pi/2 - asin(x)`.
pub fn acos(a: &BigNumber, prec: u16) -> Result<BigNumber> {
    let wp = working(prec);
    let pi = pi_at(wp)?;
    let half_pi = arith::div(&pi, &two(wp))?;
    let asin_v = asin(a, wp)?;
    Ok(arith::sub(&half_pi, &asin_v).round_to(prec))
}

/// Arctangent. Small `|x|` (`exp < -1`) uses the direct series
/// `x - x^3/3 + x^5/5 - ...`; large `|x|` (`exp > 2`) uses
/// `pi/2 - 1/x + 1/(3x^3) - ...`; the intermediate range rewrites via
/// `sign(x)*acos(1/sqrt(1+x^2))`, which is the hard case for either series.
pub fn atan(a: &BigNumber, prec: u16) -> Result<BigNumber> {
    if a.is_zero() {
        return Ok(BigNumber::zero(prec));
    }
    let wp = working(prec);
    let x = a.round_to(wp);
    let neg = x.is_negative();
    let mag = if neg { arith::neg(&x) } else { x.clone() };

    let result = if a.exp_raw() < -1 {
        atan_series(&mag, wp)
    } else if a.exp_raw() > 2 {
        let pi = pi_at(wp)?;
        let half_pi = arith::div(&pi, &two(wp))?;
        let reciprocal = arith::div(&one(wp), &mag)?;
        arith::sub(&half_pi, &atan_series(&reciprocal, wp))
    } else {
        let denom = sqrt(&arith::add(&one(wp), &arith::mul(&mag, &mag)), wp)?;
        let ratio = arith::div(&one(wp), &denom)?;
        acos(&ratio, wp)?
    };

    let signed = if neg { arith::neg(&result) } else { result };
    Ok(signed.round_to(prec))
}

/// `sinh(x) = (e^x - e^-x) / 2`.
pub fn sinh(a: &BigNumber, prec: u16) -> Result<BigNumber> {
    let wp = working(prec);
    let ex = exp(a, wp)?;
    let enx = arith::div(&one(wp), &ex)?;
    Ok(arith::div(&arith::sub(&ex, &enx), &two(wp))?.round_to(prec))
}

/// `cosh(x) = (e^x + e^-x) / 2`.
pub fn cosh(a: &BigNumber, prec: u16) -> Result<BigNumber> {
    let wp = working(prec);
    let ex = exp(a, wp)?;
    let enx = arith::div(&one(wp), &ex)?;
    Ok(arith::div(&arith::add(&ex, &enx), &two(wp))?.round_to(prec))
}

/// `tanh(x) = sinh(x) / cosh(x)`.
pub fn tanh(a: &BigNumber, prec: u16) -> Result<BigNumber> {
    let wp = working(prec);
    let s = sinh(a, wp)?;
    let c = cosh(a, wp)?;
    Ok(arith::div(&s, &c)?.round_to(prec))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &BigNumber, b: &BigNumber, prec: u16) -> bool {
        let diff = arith::sub(a, b);
        let tolerance = BigNumber::parse("1e-4", Some(prec)).unwrap_or_else(|_| BigNumber::zero(prec));
        compare(&diff, &tolerance).map(|o| o != Ordering::Greater).unwrap_or(false)
            && compare(&arith::neg(&diff), &tolerance).map(|o| o != Ordering::Greater).unwrap_or(false)
    }

    #[test]
    fn sqrt_of_four_is_two() {
        let a = BigNumber::from_i32(4, Some(12));
        let r = sqrt(&a, 12).unwrap();
        assert!(close(&r, &BigNumber::from_i32(2, Some(12)), 12));
    }

    #[test]
    fn sqrt_of_negative_errors() {
        let a = BigNumber::from_i32(-1, Some(12));
        assert!(sqrt(&a, 12).is_err());
    }

    #[test]
    fn exp_of_zero_is_one() {
        let a = BigNumber::zero(12);
        let r = exp(&a, 12).unwrap();
        assert!(r.is_zero() == false);
        assert!(close(&r, &BigNumber::from_i32(1, Some(12)), 12));
    }

    #[test]
    fn ln_of_one_is_zero() {
        let a = BigNumber::from_i32(1, Some(12));
        let r = ln(&a, 12).unwrap();
        assert!(r.is_zero());
    }

    #[test]
    fn pow_integer_matches_repeated_mul() {
        let base = BigNumber::from_i32(3, Some(12));
        let exponent = BigNumber::from_i32(4, Some(12));
        let r = pow(&base, &exponent, 12).unwrap();
        assert!(close(&r, &BigNumber::from_i32(81, Some(12)), 12));
    }

    #[test]
    fn sin_of_zero_is_zero() {
        let a = BigNumber::zero(12);
        let r = sin(&a, 12).unwrap();
        assert!(r.is_zero());
    }

    #[test]
    fn asin_of_sin_round_trips() {
        let x = BigNumber::parse("0.3", Some(14)).unwrap();
        let s = sin(&x, 14).unwrap();
        let back = asin(&s, 14).unwrap();
        assert!(close(&back, &x, 14));
    }

    #[test]
    fn asin_above_complementary_threshold_round_trips() {
        // 0.9 > 1/sqrt(2), exercises the sign(x)*(pi/2 - asin(sqrt(1-x^2))) branch.
        let x = BigNumber::parse("0.9", Some(14)).unwrap();
        let s = sin(&x, 14).unwrap();
        let back = asin(&s, 14).unwrap();
        assert!(close(&back, &x, 14));
    }

    #[test]
    fn asin_out_of_range_errors() {
        let x = BigNumber::parse("1.5", Some(12)).unwrap();
        assert!(asin(&x, 12).is_err());
    }

    #[test]
    fn atan_small_x_matches_direct_series() {
        let x = BigNumber::parse("0.2", Some(14)).unwrap();
        let r = atan(&x, 14).unwrap();
        let t = tan(&r, 14).unwrap();
        assert!(close(&t, &x, 14));
    }

    #[test]
    fn atan_intermediate_x_round_trips_through_tan() {
        let x = BigNumber::from_i32(2, Some(14));
        let r = atan(&x, 14).unwrap();
        let t = tan(&r, 14).unwrap();
        assert!(close(&t, &x, 14));
    }

    #[test]
    fn atan_large_x_round_trips_through_tan() {
        let x = BigNumber::from_i32(1000, Some(14));
        let r = atan(&x, 14).unwrap();
        let t = tan(&r, 14).unwrap();
        assert!(close(&t, &x, 14));
    }

    #[test]
    fn cos_above_pi_over_four_uses_complementary_series() {
        let x = BigNumber::parse("1.2", Some(14)).unwrap();
        let s = sin(&x, 14).unwrap();
        let c = cos(&x, 14).unwrap();
        let sum_sq = arith::add(&arith::mul(&s, &s), &arith::mul(&c, &c));
        assert!(close(&sum_sq, &BigNumber::from_i32(1, Some(14)), 14));
    }
}
