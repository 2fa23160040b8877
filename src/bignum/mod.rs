//! Arbitrary-precision packed-BCD decimal numeric engine.
//!
//! Internally the mantissa is kept as a plain `Vec<u8>` of decimal digit
//! values (0..=9), most significant first — mathematically identical to
//! unpacked BCD, and far easier to index than nibble-packed bytes. The
//! nibble-packed BCD layout is only materialized at the image-file/
//! save-file boundary (see [`Self::to_packed_bcd`] / [`Self::from_packed_bcd`]).

pub mod arith;
pub mod cache;
pub mod format;
pub mod transcendental;

use bitflags::bitflags;
use itertools::Itertools;

use crate::error::{Result, VmError};

bitflags! {
    /// Raw flag byte layout: bit 0 `zero`, bit 1 `neg`, bits
    /// 2-3 `type` (00 number, 01 NaN, 10 +/-infinity).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct RawFlags: u8 {
        const ZERO = 0b0000_0001;
        const NEG  = 0b0000_0010;
        const NAN  = 0b0000_0100;
        const INF  = 0b0000_1000;
    }
}

/// The non-finite/finite discriminant of a [`BigNumber`]'s flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// An ordinary finite decimal value (possibly zero).
    Number,
    /// Not-a-number.
    NaN,
    /// Positive or negative infinity (sign carried separately).
    Infinite,
}

/// An arbitrary-precision decimal value: `mantissa x 10^(exp - digits)`.
#[derive(Debug, Clone, PartialEq)]
pub struct BigNumber {
    /// Mantissa precision in decimal digits (1..=65535).
    digits: u16,
    /// Power-of-ten exponent.
    exp: i16,
    kind: Kind,
    neg: bool,
    /// `zero` flag; independent of `mantissa` content so a zero value never
    /// needs its digit vector inspected.
    zero: bool,
    /// Most-significant-digit-first decimal digits, length == `digits`.
    mantissa: Vec<u8>,
}

impl BigNumber {
    /// Construct the canonical zero at the given precision: `zero=1,
    /// neg=0, exp=0`, all mantissa digits zero.
    pub fn zero(precision: u16) -> Self {
        let precision = precision.max(1);
        Self {
            digits: precision,
            exp: 0,
            kind: Kind::Number,
            neg: false,
            zero: true,
            mantissa: vec![0; precision as usize],
        }
    }

    /// Construct NaN at the given precision.
    pub fn nan(precision: u16) -> Self {
        let precision = precision.max(1);
        Self {
            digits: precision,
            exp: 0,
            kind: Kind::NaN,
            neg: false,
            zero: false,
            mantissa: vec![0; precision as usize],
        }
    }

    /// Construct signed infinity at the given precision.
    pub fn infinity(precision: u16, negative: bool) -> Self {
        let precision = precision.max(1);
        Self {
            digits: precision,
            exp: 0,
            kind: Kind::Infinite,
            neg: negative,
            zero: false,
            mantissa: vec![0; precision as usize],
        }
    }

    /// Construct from a signed 32-bit integer at the given precision (or
    /// wide enough to hold it exactly if `precision` is `None`).
    pub fn from_i32(value: i32, precision: Option<u16>) -> Self {
        let neg = value < 0;
        let digits_str = value.unsigned_abs().to_string();
        let natural_precision = digits_str.len() as u16;
        let precision = precision.unwrap_or(natural_precision).max(1);

        let mut mantissa: Vec<u8> = digits_str.bytes().map(|b| b - b'0').collect();
        while (mantissa.len() as u16) < precision {
            mantissa.push(0);
        }
        mantissa.truncate(precision as usize);

        let mut bn = Self {
            digits: precision,
            exp: natural_precision as i16,
            kind: Kind::Number,
            neg,
            zero: value == 0,
            mantissa,
        };
        bn.normalize();
        bn
    }

    /// Parse from a decimal string with optional sign, decimal point and
    /// scientific exponent. `precision` defaults to the count of
    /// significant digits present in the literal.
    pub fn parse(s: &str, precision: Option<u16>) -> Result<Self> {
        let s = s.trim();
        let mut chars = s.chars().peekable();

        let neg = match chars.peek() {
            Some('+') => {
                chars.next();
                false
            }
            Some('-') => {
                chars.next();
                true
            }
            _ => false,
        };

        let mut int_part = String::new();
        let mut frac_part = String::new();
        let mut seen_digit = false;
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() {
                int_part.push(c);
                seen_digit = true;
                chars.next();
            } else {
                break;
            }
        }
        if chars.peek() == Some(&'.') {
            chars.next();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_digit() {
                    frac_part.push(c);
                    seen_digit = true;
                    chars.next();
                } else {
                    break;
                }
            }
        }
        if !seen_digit {
            return Err(VmError::BadValBif(format!("not a number: {s:?}")));
        }

        let mut sci_exp: i64 = 0;
        if matches!(chars.peek(), Some('e') | Some('E')) {
            chars.next();
            let mut exp_str = String::new();
            if matches!(chars.peek(), Some('+') | Some('-')) {
                exp_str.push(*chars.peek().unwrap());
                chars.next();
            }
            let mut any = false;
            while let Some(&c) = chars.peek() {
                if c.is_ascii_digit() {
                    exp_str.push(c);
                    any = true;
                    chars.next();
                } else {
                    break;
                }
            }
            if !any {
                return Err(VmError::BadValBif(format!("malformed exponent in {s:?}")));
            }
            sci_exp = exp_str.parse().map_err(|_| VmError::BadValBif(format!("malformed exponent in {s:?}")))?;
        }

        if chars.next().is_some() {
            return Err(VmError::BadValBif(format!("trailing characters in {s:?}")));
        }

        let combined: String = int_part.chars().chain(frac_part.chars()).collect();
        let leading_zeros = combined.chars().take_while(|&c| c == '0').count();
        let significant: String = combined.chars().skip(leading_zeros).collect();

        let is_zero = significant.is_empty();
        let natural_precision = if is_zero { 1 } else { significant.len() as u16 };
        let precision = precision.unwrap_or(natural_precision).max(1);

        // decimal exponent: position of the most significant digit, in
        // `value = mantissa x 10^(exp - digits)` terms.
        let exp = if is_zero {
            0
        } else {
            (int_part.len() as i64 - leading_zeros as i64 + sci_exp) as i16
        };

        let mut mantissa: Vec<u8> = if is_zero {
            vec![0; precision as usize]
        } else {
            significant.bytes().map(|b| b - b'0').collect()
        };
        while (mantissa.len() as u16) < precision {
            mantissa.push(0);
        }
        mantissa.truncate(precision as usize);

        let mut bn = Self {
            digits: precision,
            exp,
            kind: Kind::Number,
            neg,
            zero: is_zero,
            mantissa,
        };
        bn.normalize();
        Ok(bn)
    }

    /// Round/extend to a new precision; backs the constructor's
    /// from-another-BigNumber-with-optional-precision form and the
    /// rendering pipeline's scratch-register copy.
    pub fn round_to(&self, precision: u16) -> Self {
        let precision = precision.max(1);
        if !matches!(self.kind, Kind::Number) || self.zero {
            let mut out = self.clone();
            out.digits = precision;
            out.mantissa = vec![0; precision as usize];
            return out;
        }

        if precision as usize >= self.mantissa.len() {
            let mut mantissa = self.mantissa.clone();
            mantissa.resize(precision as usize, 0);
            return Self {
                digits: precision,
                exp: self.exp,
                kind: Kind::Number,
                neg: self.neg,
                zero: false,
                mantissa,
            };
        }

        let keep = precision as usize;
        let round_up = self.mantissa[keep] >= 5;
        let mut mantissa = self.mantissa[..keep].to_vec();
        let mut exp = self.exp;
        if round_up {
            arith::increment_abs(&mut mantissa, &mut exp);
        }
        let mut out = Self {
            digits: precision,
            exp,
            kind: Kind::Number,
            neg: self.neg,
            zero: false,
            mantissa,
        };
        out.normalize();
        out
    }

    /// Enforce the "leading digit non-zero" invariant, or set the zero flag
    /// if the value collapsed to zero.
    fn normalize(&mut self) {
        if !matches!(self.kind, Kind::Number) {
            return;
        }
        if self.mantissa.iter().all(|&d| d == 0) {
            self.zero = true;
            self.neg = false;
            self.exp = 0;
            return;
        }
        self.zero = false;
        let leading_zeros = self.mantissa.iter().take_while(|&&d| d == 0).count();
        if leading_zeros == 0 {
            return;
        }
        self.mantissa.rotate_left(leading_zeros);
        for slot in self.mantissa.iter_mut().rev().take(leading_zeros) {
            *slot = 0;
        }
        self.exp -= leading_zeros as i16;
    }

    /// Mantissa precision in digits.
    pub fn precision(&self) -> u16 {
        self.digits
    }

    /// The kind discriminant (number / NaN / infinite).
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// True if this value is (signed) zero.
    pub fn is_zero(&self) -> bool {
        matches!(self.kind, Kind::Number) && self.zero
    }

    /// True if the sign bit is set (meaningless for NaN).
    pub fn is_negative(&self) -> bool {
        self.neg
    }

    /// True if this value is NaN.
    pub fn is_nan(&self) -> bool {
        matches!(self.kind, Kind::NaN)
    }

    /// True if this value is +/-infinity.
    pub fn is_infinite(&self) -> bool {
        matches!(self.kind, Kind::Infinite)
    }

    pub(crate) fn mantissa(&self) -> &[u8] {
        &self.mantissa
    }

    pub(crate) fn exp_raw(&self) -> i16 {
        self.exp
    }

    /// Cast to a signed 32-bit integer, clamping on overflow.
    pub fn to_i32(&self) -> Result<i32> {
        if !matches!(self.kind, Kind::Number) {
            return Err(VmError::NumOverflow);
        }
        if self.is_zero() {
            return Ok(0);
        }
        // value = 0.d1d2..dn x 10^exp (exp counts digits before the point)
        if self.exp > 10 || self.exp < 0 {
            return Err(VmError::NumOverflow);
        }
        let mut acc: i64 = 0;
        for i in 0..self.exp as usize {
            let digit = *self.mantissa.get(i).unwrap_or(&0) as i64;
            acc = acc.checked_mul(10).and_then(|a| a.checked_add(digit)).ok_or(VmError::NumOverflow)?;
            if acc > i32::MAX as i64 + 1 {
                return Err(VmError::NumOverflow);
            }
        }
        let signed = if self.neg { -acc } else { acc };
        i32::try_from(signed).map_err(|_| VmError::NumOverflow)
    }

    /// Pack the mantissa to the on-disk BCD layout: high
    /// nibble holds the first digit of each pair, `ceil(digits/2)` bytes.
    pub fn to_packed_bcd(&self) -> Vec<u8> {
        self.mantissa
            .iter()
            .copied()
            .chain(std::iter::once(0))
            .tuples()
            .map(|(hi, lo): (u8, u8)| (hi << 4) | lo)
            .take(self.digits.div_ceil(2) as usize)
            .collect()
    }

    /// Raw flag byte, for the image-file layout.
    pub fn flags_byte(&self) -> u8 {
        let mut f = RawFlags::empty();
        f.set(RawFlags::ZERO, self.zero);
        f.set(RawFlags::NEG, self.neg);
        match self.kind {
            Kind::Number => {}
            Kind::NaN => f.insert(RawFlags::NAN),
            Kind::Infinite => f.insert(RawFlags::INF),
        }
        f.bits()
    }

    /// Reconstruct from the on-disk layout.
    pub fn from_packed_bcd(digits: u16, exp: i16, flags: u8, packed: &[u8]) -> Self {
        let raw = RawFlags::from_bits_truncate(flags);
        let kind = if raw.contains(RawFlags::NAN) {
            Kind::NaN
        } else if raw.contains(RawFlags::INF) {
            Kind::Infinite
        } else {
            Kind::Number
        };

        let mut mantissa = Vec::with_capacity(digits as usize);
        for &byte in packed {
            mantissa.push(byte >> 4);
            mantissa.push(byte & 0x0f);
        }
        mantissa.truncate(digits as usize);
        while (mantissa.len() as u16) < digits {
            mantissa.push(0);
        }

        Self {
            digits,
            exp,
            kind,
            neg: raw.contains(RawFlags::NEG),
            zero: raw.contains(RawFlags::ZERO),
            mantissa,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_leading_digit_nonzero() {
        let bn = BigNumber::parse("00042.5", None).unwrap();
        assert!(!bn.is_zero());
        assert_ne!(bn.mantissa()[0], 0);
    }

    #[test]
    fn zero_has_canonical_form() {
        let bn = BigNumber::parse("0.000", Some(5)).unwrap();
        assert!(bn.is_zero());
        assert!(!bn.is_negative());
        assert_eq!(bn.exp_raw(), 0);
    }

    #[test]
    fn bcd_round_trips() {
        let bn = BigNumber::parse("314.159", Some(6)).unwrap();
        let packed = bn.to_packed_bcd();
        let back = BigNumber::from_packed_bcd(bn.precision(), bn.exp_raw(), bn.flags_byte(), &packed);
        assert_eq!(bn, back);
    }

    #[test]
    fn to_i32_round_trips_small_integers() {
        let bn = BigNumber::from_i32(-4200, None);
        assert_eq!(bn.to_i32().unwrap(), -4200);
    }
}
