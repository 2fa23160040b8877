//! Locale-independent formatted rendering of a [`BigNumber`].

use bitflags::bitflags;

use super::{BigNumber, Kind};

bitflags! {
    /// Rendering flag bitset.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FormatFlags: u16 {
        /// Always emit a `+` for non-negative values.
        const FORCE_SIGN        = 1 << 0;
        /// Always emit a sign on the exponent, even when positive.
        const FORCE_SIGN_EXP    = 1 << 1;
        /// Always render in exponential form.
        const FORCE_EXPONENT    = 1 << 2;
        /// Emit a leading `0` before the point when the integer part is empty.
        const LEADING_ZERO      = 1 << 3;
        /// Always emit the decimal point, even with no fractional digits.
        const ALWAYS_POINT      = 1 << 4;
        /// Use `E` instead of `e` in exponential form.
        const UPPER_E           = 1 << 5;
        /// Emit a leading space (instead of nothing) for non-negative values.
        const LEADING_SPACE     = 1 << 6;
        /// Group whole-part digits in threes with `,`.
        const THOUSANDS         = 1 << 7;
        /// European style: swap the roles of `.` and `,`.
        const EUROPEAN          = 1 << 8;
    }
}

/// Parameters controlling [`format`]'s output layout.
#[derive(Debug, Clone)]
pub struct FormatSpec {
    /// Total significant-digit budget; mandatory.
    pub max_digits: u16,
    /// Rendering flags.
    pub flags: FormatFlags,
    /// Minimum digit count before the point, zero-padded; `None` means no
    /// minimum.
    pub whole_places: Option<u16>,
    /// Fixed fractional digit count; `None` means "as many as precision
    /// allows, trimmed of trailing work beyond significant digits".
    pub frac_digits: Option<u16>,
    /// Minimum exponent digit count in exponential mode.
    pub exp_digits: Option<u16>,
    /// String used to pad the whole part on the left (spaces unless the
    /// caller asks for something else, e.g. zero-fill).
    pub lead_fill: String,
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self {
            max_digits: 32,
            flags: FormatFlags::empty(),
            whole_places: None,
            frac_digits: None,
            exp_digits: None,
            lead_fill: String::new(),
        }
    }
}

fn group_thousands(digits: &str) -> String {
    let bytes = digits.as_bytes();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let first_group = bytes.len() % 3;
    for (i, &b) in bytes.iter().enumerate() {
        if i != 0 && (i - first_group) % 3 == 0 && first_group != 0 {
            out.push(',');
        } else if i != 0 && i % 3 == 0 && first_group == 0 {
            out.push(',');
        }
        out.push(b as char);
    }
    out
}

fn point_and_sep(flags: FormatFlags) -> (char, char) {
    if flags.contains(FormatFlags::EUROPEAN) {
        (',', '.')
    } else {
        ('.', ',')
    }
}

/// Render `value` per `spec`.
pub fn format(value: &BigNumber, spec: &FormatSpec) -> String {
    match value.kind() {
        Kind::NaN => return "NaN".to_string(),
        Kind::Infinite => {
            return if value.is_negative() { "-Infinity".to_string() } else { "Infinity".to_string() };
        }
        Kind::Number => {}
    }

    let max_digits = spec.max_digits.max(1);
    let rounded = value.round_to(max_digits);
    let exp = rounded.exp_raw() as i32;

    let frac_budget = spec.frac_digits.unwrap_or(max_digits.saturating_sub(exp.max(0) as u16));
    let use_exponential = spec.flags.contains(FormatFlags::FORCE_EXPONENT)
        || exp > max_digits as i32
        || (-exp) as i64 > frac_budget as i64 + 1;

    if use_exponential {
        format_exponential(&rounded, spec)
    } else {
        format_positional(&rounded, spec, frac_budget)
    }
}

fn sign_prefix(negative: bool, flags: FormatFlags) -> &'static str {
    if negative {
        "-"
    } else if flags.contains(FormatFlags::FORCE_SIGN) {
        "+"
    } else if flags.contains(FormatFlags::LEADING_SPACE) {
        " "
    } else {
        ""
    }
}

fn format_positional(rounded: &BigNumber, spec: &FormatSpec, frac_budget: u16) -> String {
    let (point, sep) = point_and_sep(spec.flags);
    let exp = rounded.exp_raw().max(0) as usize;
    let digits: &[u8] = rounded.mantissa();

    let whole_digits: String = if rounded.is_zero() {
        "0".to_string()
    } else if exp == 0 {
        String::new()
    } else {
        digits.iter().take(exp).map(|&d| (d + b'0') as char).collect()
    };

    let frac_source: Vec<u8> = if rounded.is_zero() {
        Vec::new()
    } else if exp >= digits.len() {
        Vec::new()
    } else {
        digits[exp..].to_vec()
    };
    let mut frac_digits: String = frac_source.iter().take(frac_budget as usize).map(|&d| (d + b'0') as char).collect();
    if let Some(want) = spec.frac_digits {
        while (frac_digits.len() as u16) < want {
            frac_digits.push('0');
        }
        frac_digits.truncate(want as usize);
    }

    let mut whole = whole_digits;
    if whole.is_empty() && spec.flags.contains(FormatFlags::LEADING_ZERO) {
        whole.push('0');
    }
    if let Some(min) = spec.whole_places {
        while (whole.len() as u16) < min {
            whole.insert(0, '0');
        }
    }
    if spec.flags.contains(FormatFlags::THOUSANDS) {
        whole = group_thousands(&whole).replace(',', &sep.to_string());
    }

    let mut out = String::new();
    out.push_str(sign_prefix(rounded.is_negative(), spec.flags));
    if !spec.lead_fill.is_empty() {
        out.push_str(&spec.lead_fill);
    }
    out.push_str(&whole);
    if !frac_digits.is_empty() || spec.flags.contains(FormatFlags::ALWAYS_POINT) {
        out.push(point);
        out.push_str(&frac_digits);
    }
    out
}

fn format_exponential(rounded: &BigNumber, spec: &FormatSpec) -> String {
    let (point, _sep) = point_and_sep(spec.flags);
    let digits: &[u8] = rounded.mantissa();
    let decimal_exp = rounded.exp_raw() as i32 - 1;

    let lead = digits.first().copied().unwrap_or(0);
    let rest: String = digits.iter().skip(1).map(|&d| (d + b'0') as char).collect();

    let mut out = String::new();
    out.push_str(sign_prefix(rounded.is_negative(), spec.flags));
    out.push((lead + b'0') as char);
    if !rest.is_empty() || spec.flags.contains(FormatFlags::ALWAYS_POINT) {
        out.push(point);
        out.push_str(&rest);
    }
    out.push(if spec.flags.contains(FormatFlags::UPPER_E) { 'E' } else { 'e' });
    if decimal_exp >= 0 {
        if spec.flags.contains(FormatFlags::FORCE_SIGN_EXP) {
            out.push('+');
        }
    } else {
        out.push('-');
    }
    let exp_digits = decimal_exp.unsigned_abs().to_string();
    if let Some(min) = spec.exp_digits {
        for _ in 0..(min as usize).saturating_sub(exp_digits.len()) {
            out.push('0');
        }
    }
    out.push_str(&exp_digits);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_simple_positional_value() {
        let v = BigNumber::parse("123.45", Some(8)).unwrap();
        let spec = FormatSpec { max_digits: 8, ..Default::default() };
        assert_eq!(format(&v, &spec), "123.45");
    }

    #[test]
    fn renders_nan_and_infinity() {
        let spec = FormatSpec::default();
        assert_eq!(format(&BigNumber::nan(8), &spec), "NaN");
        assert_eq!(format(&BigNumber::infinity(8, true), &spec), "-Infinity");
    }

    #[test]
    fn switches_to_exponential_for_large_exponent() {
        let v = BigNumber::parse("1e20", Some(8)).unwrap();
        let spec = FormatSpec { max_digits: 8, ..Default::default() };
        let rendered = format(&v, &spec);
        assert!(rendered.contains('e'));
    }

    #[test]
    fn force_sign_flag_adds_plus() {
        let v = BigNumber::parse("5", Some(4)).unwrap();
        let spec = FormatSpec {
            max_digits: 4,
            flags: FormatFlags::FORCE_SIGN,
            ..Default::default()
        };
        assert_eq!(format(&v, &spec), "+5");
    }
}
