//! Arithmetic on [`BigNumber`]: +, -, x, /, comparison, and the scaling
//! primitives (shift/multiply/divide by small integers, trailing-digit
//! rounding) that the rest of the module builds on.

use std::cmp::Ordering;

use crate::error::{Result, VmError};

use super::{BigNumber, Kind};

/// Add one to a magnitude's decimal digit array, carrying through the
/// front; if the carry propagates off the most significant digit the
/// array becomes `1` followed by zeros and `exp` is incremented (the value
/// gained one more digit of integer part), matching "carry from a
/// trailing-digit round shifts and increments exponent".
pub(crate) fn increment_abs(mantissa: &mut [u8], exp: &mut i16) {
    for slot in mantissa.iter_mut().rev() {
        if *slot == 9 {
            *slot = 0;
        } else {
            *slot += 1;
            return;
        }
    }
    if let Some(first) = mantissa.first_mut() {
        *first = 1;
    }
    *exp += 1;
}

/// Round a magnitude up by one ULP if `next_digit` (the first dropped
/// digit) is `>= 5` (round-half-up).
pub(crate) fn round_up_abs(mantissa: &mut [u8], exp: &mut i16, next_digit: u8) {
    if next_digit >= 5 {
        increment_abs(mantissa, exp);
    }
}

/// Multiply a magnitude's decimal digit array by a power of ten. In this
/// crate's unpacked-decimal representation this is a pure exponent
/// adjustment (no digit movement), even though a packed-BCD layout would
/// need an explicit nibble walk.
pub(crate) fn shift_left(exp: i16, n: i16) -> i16 {
    exp + n
}

/// Inverse of [`shift_left`].
pub(crate) fn shift_right(exp: i16, n: i16) -> i16 {
    exp - n
}

/// Multiply a magnitude digit array by a small integer `k` (0..=9999),
/// O(d) with one running carry. Returns the
/// (possibly longer) result digit array, MSD-first.
pub(crate) fn mul_by_long(mantissa: &[u8], k: u32) -> Vec<u8> {
    if k == 0 {
        return vec![0];
    }
    let mut carry: u64 = 0;
    let mut out: Vec<u8> = Vec::with_capacity(mantissa.len() + 2);
    let mut tmp = vec![0u64; mantissa.len()];
    for (i, &d) in mantissa.iter().enumerate() {
        tmp[i] = d as u64 * k as u64;
    }
    let mut rev_out = Vec::with_capacity(mantissa.len() + 2);
    for &v in tmp.iter().rev() {
        let total = v + carry;
        rev_out.push((total % 10) as u8);
        carry = total / 10;
    }
    while carry > 0 {
        rev_out.push((carry % 10) as u8);
        carry /= 10;
    }
    out.extend(rev_out.into_iter().rev());
    out
}

/// Divide a magnitude digit array by a small integer `k` (1..=9999), O(d)
/// with one running remainder. Returns the
/// quotient digit array (same length as input) and the final remainder.
pub(crate) fn div_by_long(mantissa: &[u8], k: u32) -> (Vec<u8>, u32) {
    let mut rem: u64 = 0;
    let mut out = Vec::with_capacity(mantissa.len());
    for &d in mantissa {
        let acc = rem * 10 + d as u64;
        out.push((acc / k as u64) as u8);
        rem = acc % k as u64;
    }
    (out, rem as u32)
}

fn strip_leading_zeros(mantissa: &mut Vec<u8>, exp: &mut i16) -> bool {
    if mantissa.iter().all(|&d| d == 0) {
        mantissa.clear();
        mantissa.push(0);
        *exp = 0;
        return true;
    }
    let lz = mantissa.iter().take_while(|&&d| d == 0).count();
    if lz > 0 {
        mantissa.drain(0..lz);
        *exp -= lz as i16;
    }
    false
}

/// Build a [`BigNumber`] from a raw, possibly leading-zero-padded digit
/// array plus the exponent that array would have *before* stripping
/// (`len(raw) + scale`, in the convention used throughout this module).
/// Precision is left at the array's post-strip length; callers round to
/// their desired output precision afterward.
pub(crate) fn from_raw(mut mantissa: Vec<u8>, mut exp: i16, neg: bool) -> BigNumber {
    let is_zero = strip_leading_zeros(&mut mantissa, &mut exp);
    let digits = mantissa.len() as u16;
    BigNumber {
        digits,
        exp,
        kind: Kind::Number,
        neg: if is_zero { false } else { neg },
        zero: is_zero,
        mantissa,
    }
}

fn pad_front(v: &mut Vec<u8>, len: usize) {
    while v.len() < len {
        v.insert(0, 0);
    }
}

fn add_unsigned(a: &[u8], b: &[u8]) -> Vec<u8> {
    let len = a.len().max(b.len());
    let mut a = a.to_vec();
    pad_front(&mut a, len);
    let mut b = b.to_vec();
    pad_front(&mut b, len);

    let mut result = vec![0u8; len + 1];
    let mut carry = 0u8;
    for i in (0..len).rev() {
        let s = a[i] + b[i] + carry;
        result[i + 1] = s % 10;
        carry = s / 10;
    }
    result[0] = carry;
    result
}

fn sub_unsigned(a: &[u8], b: &[u8]) -> Vec<u8> {
    let len = a.len().max(b.len());
    let mut a = a.to_vec();
    pad_front(&mut a, len);
    let mut b = b.to_vec();
    pad_front(&mut b, len);

    let mut result = vec![0u8; len];
    let mut borrow = 0i16;
    for i in (0..len).rev() {
        let mut d = a[i] as i16 - b[i] as i16 - borrow;
        if d < 0 {
            d += 10;
            borrow = 1;
        } else {
            borrow = 0;
        }
        result[i] = d as u8;
    }
    result
}

fn compare_unsigned(a: &[u8], b: &[u8]) -> Ordering {
    let len = a.len().max(b.len());
    let mut a = a.to_vec();
    pad_front(&mut a, len);
    let mut b = b.to_vec();
    pad_front(&mut b, len);
    a.cmp(&b)
}

fn scale_of(mantissa: &[u8], exp: i16) -> i32 {
    exp as i32 - mantissa.len() as i32
}

/// `c = a + b`, at precision `max(a.precision(), b.precision())`.
pub fn add(a: &BigNumber, b: &BigNumber) -> BigNumber {
    let prec = a.precision().max(b.precision());

    if a.is_nan() || b.is_nan() {
        return BigNumber::nan(prec);
    }
    if a.is_infinite() || b.is_infinite() {
        return match (a.is_infinite(), b.is_infinite()) {
            (true, true) if a.is_negative() != b.is_negative() => BigNumber::nan(prec),
            (true, _) => BigNumber::infinity(prec, a.is_negative()),
            (_, true) => BigNumber::infinity(prec, b.is_negative()),
            _ => unreachable!(),
        };
    }
    if a.is_zero() {
        return b.round_to(prec);
    }
    if b.is_zero() {
        return a.round_to(prec);
    }

    let a_scale = scale_of(a.mantissa(), a.exp_raw());
    let b_scale = scale_of(b.mantissa(), b.exp_raw());
    let scale = a_scale.min(b_scale);

    let a_shift = (a_scale - scale) as usize;
    let b_shift = (b_scale - scale) as usize;
    let mut a_digits = a.mantissa().to_vec();
    a_digits.extend(std::iter::repeat(0).take(a_shift));
    let mut b_digits = b.mantissa().to_vec();
    b_digits.extend(std::iter::repeat(0).take(b_shift));

    if a.is_negative() == b.is_negative() {
        let sum = add_unsigned(&a_digits, &b_digits);
        let exp = scale + sum.len() as i32;
        from_raw(sum, exp as i16, a.is_negative()).round_to(prec)
    } else {
        match compare_unsigned(&a_digits, &b_digits) {
            Ordering::Equal => BigNumber::zero(prec),
            Ordering::Greater => {
                let diff = sub_unsigned(&a_digits, &b_digits);
                let exp = scale + diff.len() as i32;
                from_raw(diff, exp as i16, a.is_negative()).round_to(prec)
            }
            Ordering::Less => {
                let diff = sub_unsigned(&b_digits, &a_digits);
                let exp = scale + diff.len() as i32;
                from_raw(diff, exp as i16, b.is_negative()).round_to(prec)
            }
        }
    }
}

/// `c = a - b`.
pub fn sub(a: &BigNumber, b: &BigNumber) -> BigNumber {
    add(a, &neg(b))
}

/// Additive inverse (never produces negative zero).
pub fn neg(a: &BigNumber) -> BigNumber {
    let mut out = a.clone();
    if !out.is_zero() {
        out.neg = !out.neg;
    }
    out
}

/// `c = a * b`, at precision `max(a.precision(), b.precision())`.
pub fn mul(a: &BigNumber, b: &BigNumber) -> BigNumber {
    let prec = a.precision().max(b.precision());

    if a.is_nan() || b.is_nan() {
        return BigNumber::nan(prec);
    }
    if a.is_zero() || b.is_zero() {
        if a.is_infinite() || b.is_infinite() {
            return BigNumber::nan(prec);
        }
        return BigNumber::zero(prec);
    }
    let neg_result = a.is_negative() != b.is_negative();
    if a.is_infinite() || b.is_infinite() {
        return BigNumber::infinity(prec, neg_result);
    }

    let mut acc = vec![0u32; a.mantissa().len() + b.mantissa().len()];
    for (i, &da) in a.mantissa().iter().rev().enumerate() {
        for (j, &db) in b.mantissa().iter().rev().enumerate() {
            acc[i + j] += da as u32 * db as u32;
        }
    }
    let mut carry = 0u32;
    for slot in acc.iter_mut() {
        let v = *slot + carry;
        *slot = v % 10;
        carry = v / 10;
    }
    debug_assert_eq!(carry, 0, "result array sized to absorb all carries");
    let raw: Vec<u8> = acc.iter().rev().map(|&d| d as u8).collect();

    let a_scale = scale_of(a.mantissa(), a.exp_raw());
    let b_scale = scale_of(b.mantissa(), b.exp_raw());
    let scale = a_scale + b_scale;
    let exp = scale + raw.len() as i32;
    from_raw(raw, exp as i16, neg_result).round_to(prec)
}

fn mul_small(b: &[u8], d: u8) -> Vec<u8> {
    if d == 0 {
        return vec![0];
    }
    let mut carry = 0u32;
    let mut out = vec![0u8; b.len()];
    for i in (0..b.len()).rev() {
        let v = b[i] as u32 * d as u32 + carry;
        out[i] = (v % 10) as u8;
        carry = v / 10;
    }
    if carry > 0 {
        let mut result = vec![carry as u8];
        result.extend(out);
        result
    } else {
        out
    }
}

/// Produce `count` quotient digits of `a / b` (both positive big-integer
/// digit arrays), finding each digit by trial subtraction. Returns the
/// quotient digits (MSD-first) and whether a nonzero remainder was left
/// over (used to decide rounding of the last digit).
fn long_divide(a: &[u8], b: &[u8], count: usize) -> (Vec<u8>, bool) {
    let mut remainder: Vec<u8> = Vec::new();
    let mut quotient = Vec::with_capacity(count);
    let mut feed = a.iter().copied().chain(std::iter::repeat(0));

    for _ in 0..count {
        remainder.push(feed.next().unwrap());
        let mut r_exp = 0i16;
        strip_leading_zeros(&mut remainder, &mut r_exp);

        let mut d = 0u8;
        while d < 9 && compare_unsigned(&mul_small(b, d + 1), &remainder) != Ordering::Greater {
            d += 1;
        }
        if d > 0 {
            remainder = sub_unsigned(&remainder, &mul_small(b, d));
        }
        quotient.push(d);
    }

    let remainder_nonzero = remainder.iter().any(|&x| x != 0);
    (quotient, remainder_nonzero)
}

/// `c = a / b`, at precision `max(a.precision(), b.precision())`.
/// Stops after `prec + 1` digits and rounds the last dropped digit.
pub fn div(a: &BigNumber, b: &BigNumber) -> Result<BigNumber> {
    let prec = a.precision().max(b.precision());

    if b.is_zero() && !b.is_infinite() {
        if a.is_zero() {
            return Ok(BigNumber::nan(prec));
        }
        return Err(VmError::DivideByZero);
    }
    if a.is_nan() || b.is_nan() {
        return Ok(BigNumber::nan(prec));
    }
    if a.is_infinite() && b.is_infinite() {
        return Ok(BigNumber::nan(prec));
    }
    let neg_result = a.is_negative() != b.is_negative();
    if a.is_infinite() {
        return Ok(BigNumber::infinity(prec, neg_result));
    }
    if b.is_infinite() {
        return Ok(BigNumber::zero(prec));
    }
    if a.is_zero() {
        return Ok(BigNumber::zero(prec));
    }

    // Generate exactly `prec + 1` quotient digits; `BigNumber::round_to`
    // below then rounds that trailing digit away.
    let working = prec as usize + 1;
    let (raw_q, _rem_nonzero) = long_divide(a.mantissa(), b.mantissa(), working);

    let a_scale = scale_of(a.mantissa(), a.exp_raw());
    let b_scale = scale_of(b.mantissa(), b.exp_raw());
    let d_a = a.mantissa().len() as i32;
    let raw_exp = d_a + a_scale - b_scale;

    let result = from_raw(raw_q, raw_exp as i16, neg_result);
    Ok(result.round_to(prec))
}

/// Integer quotient and remainder: the remainder output truncates the
/// quotient to an integer.
pub fn div_rem(a: &BigNumber, b: &BigNumber) -> Result<(BigNumber, BigNumber)> {
    let q = div(a, b)?;
    let int_part = truncate_to_integer(&q);
    let rem = sub(a, &mul(&int_part, b));
    Ok((int_part, rem))
}

fn truncate_to_integer(bn: &BigNumber) -> BigNumber {
    if bn.is_zero() || !matches!(bn.kind, Kind::Number) || bn.exp_raw() >= bn.mantissa().len() as i16 {
        return bn.clone();
    }
    if bn.exp_raw() <= 0 {
        return BigNumber::zero(bn.precision());
    }
    let keep = bn.exp_raw() as usize;
    let mut mantissa = bn.mantissa()[..keep].to_vec();
    mantissa.resize(bn.mantissa().len(), 0);
    BigNumber {
        digits: bn.precision(),
        exp: bn.exp_raw(),
        kind: Kind::Number,
        neg: bn.is_negative(),
        zero: mantissa.iter().all(|&d| d == 0),
        mantissa,
    }
}

/// Three-way comparison: by sign, then exponent, then
/// digit-by-digit comparison extending the shorter operand with implicit
/// trailing zeros. Returns `None` if either operand is NaN (comparison is
/// undefined, matching `invalid-comparison`).
pub fn compare(a: &BigNumber, b: &BigNumber) -> Option<Ordering> {
    if a.is_nan() || b.is_nan() {
        return None;
    }
    if a.is_infinite() || b.is_infinite() {
        let rank = |bn: &BigNumber| -> i32 {
            if bn.is_infinite() {
                if bn.is_negative() {
                    -2
                } else {
                    2
                }
            } else if bn.is_zero() {
                0
            } else if bn.is_negative() {
                -1
            } else {
                1
            }
        };
        return Some(rank(a).cmp(&rank(b)));
    }
    if a.is_zero() && b.is_zero() {
        return Some(Ordering::Equal);
    }
    if a.is_negative() != b.is_negative() {
        return Some(if a.is_negative() { Ordering::Less } else { Ordering::Greater });
    }
    if a.is_zero() != b.is_zero() {
        let nonzero_is_a = !a.is_zero();
        let nonzero_positive = if nonzero_is_a { !a.is_negative() } else { !b.is_negative() };
        let nonzero_is_greater = nonzero_positive;
        return Some(if nonzero_is_a == nonzero_is_greater {
            Ordering::Greater
        } else {
            Ordering::Less
        });
    }

    let ord = match a.exp_raw().cmp(&b.exp_raw()) {
        Ordering::Equal => {
            let len = a.mantissa().len().max(b.mantissa().len());
            let mut ad = a.mantissa().to_vec();
            ad.resize(len, 0);
            let mut bd = b.mantissa().to_vec();
            bd.resize(len, 0);
            ad.cmp(&bd)
        }
        other => other,
    };
    Some(if a.is_negative() { ord.reverse() } else { ord })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bignum::BigNumber;

    fn bn(s: &str, p: u16) -> BigNumber {
        BigNumber::parse(s, Some(p)).unwrap()
    }

    #[test]
    fn add_basic() {
        let a = bn("1.5", 10);
        let b = bn("2.25", 10);
        let c = add(&a, &b);
        assert_eq!(compare(&c, &bn("3.75", 10)), Some(Ordering::Equal));
    }

    #[test]
    fn sub_to_zero() {
        let a = bn("5", 10);
        let b = bn("5", 10);
        let c = sub(&a, &b);
        assert!(c.is_zero());
    }

    #[test]
    fn mul_basic() {
        let a = bn("12", 10);
        let b = bn("3", 10);
        let c = mul(&a, &b);
        assert_eq!(compare(&c, &bn("36", 10)), Some(Ordering::Equal));
    }

    #[test]
    fn div_basic() {
        let a = bn("10", 10);
        let b = bn("4", 10);
        let c = div(&a, &b).unwrap();
        assert_eq!(compare(&c, &bn("2.5", 10)), Some(Ordering::Equal));
    }

    #[test]
    fn div_by_zero_errors() {
        let a = bn("1", 10);
        let b = BigNumber::zero(10);
        assert_eq!(div(&a, &b), Err(VmError::DivideByZero));
    }

    #[test]
    fn compare_orders_by_sign_then_magnitude() {
        let neg = bn("-5", 10);
        let pos = bn("3", 10);
        assert_eq!(compare(&neg, &pos), Some(Ordering::Less));
        assert_eq!(compare(&pos, &neg), Some(Ordering::Greater));
    }
}
