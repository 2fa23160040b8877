//! strftime-style rendering of a [`Date`].

use crate::bignum::BigNumber;
use crate::date::calendar::Calendar;
use crate::date::timezone::ZoneRecord;
use crate::date::{Date, MS_PER_DAY};
use crate::error::{Result, VmError};

/// The 15-slot locale vector a `Date` formats/parses against.
#[derive(Debug, Clone)]
pub struct Locale {
    /// Full month names, January first.
    pub month: [String; 12],
    /// Abbreviated month names.
    pub mon: [String; 12],
    /// Full weekday names, Sunday first.
    pub weekday: [String; 7],
    /// Abbreviated weekday names.
    pub wkdy: [String; 7],
    /// `[am, pm]` markers.
    pub ampm: [String; 2],
    /// `[bc, ad]` era markers.
    pub era: [String; 2],
    /// Parser template filter, `"us"` or `"eu"`.
    pub parse_filter: String,
    /// Ordinal-day suffixes, indexed `day % 10` (with teens handled by the
    /// caller).
    pub ordsuf: Vec<String>,
    /// Composite format strings for `%c %x %X %D %F %r %R %T`, in that
    /// order.
    pub fmt: [String; 6],
}

impl Default for Locale {
    fn default() -> Self {
        let s = |v: &str| v.to_string();
        Self {
            month: [
                s("January"), s("February"), s("March"), s("April"), s("May"), s("June"),
                s("July"), s("August"), s("September"), s("October"), s("November"), s("December"),
            ],
            mon: [s("Jan"), s("Feb"), s("Mar"), s("Apr"), s("May"), s("Jun"), s("Jul"), s("Aug"), s("Sep"), s("Oct"), s("Nov"), s("Dec")],
            weekday: [s("Sunday"), s("Monday"), s("Tuesday"), s("Wednesday"), s("Thursday"), s("Friday"), s("Saturday")],
            wkdy: [s("Sun"), s("Mon"), s("Tue"), s("Wed"), s("Thu"), s("Fri"), s("Sat")],
            ampm: [s("AM"), s("PM")],
            era: [s("BC"), s("AD")],
            parse_filter: s("us"),
            ordsuf: vec![s("th"), s("st"), s("nd"), s("rd"), s("th"), s("th"), s("th"), s("th"), s("th"), s("th")],
            fmt: [s("%a %b %e %H:%M:%S %Y"), s("%m/%d/%y"), s("%H:%M:%S"), s("%m/%d/%y"), s("%Y-%m-%d"), s("%I:%M:%S %p")],
        }
    }
}

struct FormatFlags {
    drop_leading_zeros: bool,
    space_pad: bool,
    swap_era_order: bool,
    roman: bool,
}

fn parse_flags(chars: &mut std::iter::Peekable<std::str::Chars>) -> FormatFlags {
    let mut f = FormatFlags {
        drop_leading_zeros: false,
        space_pad: false,
        swap_era_order: false,
        roman: false,
    };
    loop {
        match chars.peek() {
            Some('#') => {
                f.drop_leading_zeros = true;
                chars.next();
            }
            Some(' ') | Some('_') => {
                f.space_pad = true;
                chars.next();
            }
            Some('-') => {
                f.swap_era_order = true;
                chars.next();
            }
            Some('&') => {
                f.roman = true;
                chars.next();
            }
            _ => break,
        }
    }
    f
}

fn roman_numeral(mut n: u32) -> String {
    const TABLE: &[(u32, &str)] = &[
        (1000, "M"), (900, "CM"), (500, "D"), (400, "CD"), (100, "C"), (90, "XC"),
        (50, "L"), (40, "XL"), (10, "X"), (9, "IX"), (5, "V"), (4, "IV"), (1, "I"),
    ];
    let mut out = String::new();
    for &(value, sym) in TABLE {
        while n >= value {
            out.push_str(sym);
            n -= value;
        }
    }
    out
}

fn pad(n: i64, width: usize, flags: &FormatFlags) -> String {
    if flags.roman && n >= 1 && n < 5000 {
        return roman_numeral(n as u32);
    }
    let digits = n.unsigned_abs().to_string();
    if flags.drop_leading_zeros {
        return format!("{}{}", if n < 0 { "-" } else { "" }, digits);
    }
    let fill = if flags.space_pad { ' ' } else { '0' };
    let body: String = std::iter::repeat(fill).take(width.saturating_sub(digits.len())).chain(digits.chars()).collect();
    format!("{}{}", if n < 0 { "-" } else { "" }, body)
}

/// Format `date` under `calendar`, `zone` and `locale` per `template`.
pub fn format(date: &Date, calendar: &dyn Calendar, zone: &ZoneRecord, locale: &Locale, template: &str) -> Result<String> {
    let local_secs = zone.offset_at(date.dayno()).0 as i64;
    let local_dayno = date.dayno() + (date.daytime() + local_secs * 1000).div_euclid(MS_PER_DAY);
    let local_ms = (date.daytime() + local_secs * 1000).rem_euclid(MS_PER_DAY);
    let (year, month, day) = calendar.set_dayno(local_dayno);

    let hour = local_ms / 3_600_000;
    let minute = (local_ms / 60_000) % 60;
    let second = (local_ms / 1000) % 60;
    let millis = local_ms % 1000;
    let wd = calendar.weekday(local_dayno) as usize;
    let iso_wd = calendar.iso_weekday(local_dayno);
    let (iso_year, iso_week) = calendar.iso_weekno(local_dayno);

    let mut out = String::new();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let flags = parse_flags(&mut chars);
        let code = chars.next().ok_or(VmError::UnterminatedFormatTemplate)?;
        render_code(&mut out, code, &flags, RenderCtx {
            date, calendar, zone, locale, local_dayno, year, month, day, hour, minute, second, millis, wd, iso_wd, iso_year, iso_week,
        })?;
    }
    Ok(out)
}

struct RenderCtx<'a> {
    date: &'a Date,
    calendar: &'a dyn Calendar,
    zone: &'a ZoneRecord,
    locale: &'a Locale,
    local_dayno: i64,
    year: i64,
    month: u8,
    day: u8,
    hour: i64,
    minute: i64,
    second: i64,
    millis: i64,
    wd: usize,
    iso_wd: u8,
    iso_year: i64,
    iso_week: u32,
}

fn render_code(out: &mut String, code: char, flags: &FormatFlags, ctx: RenderCtx<'_>) -> Result<()> {
    match code {
        '%' => out.push('%'),
        'a' => out.push_str(&ctx.locale.wkdy[ctx.wd]),
        'A' => out.push_str(&ctx.locale.weekday[ctx.wd]),
        'b' => out.push_str(&ctx.locale.mon[ctx.month as usize - 1]),
        'B' => out.push_str(&ctx.locale.month[ctx.month as usize - 1]),
        'd' => out.push_str(&pad(ctx.day as i64, 2, flags)),
        'e' => out.push_str(&pad(ctx.day as i64, 2, &FormatFlags { space_pad: true, ..blank(flags) })),
        'm' => out.push_str(&pad(ctx.month as i64, 2, flags)),
        'Y' => out.push_str(&pad(ctx.year, 4, flags)),
        'y' => out.push_str(&pad(ctx.year.rem_euclid(100), 2, flags)),
        'C' => out.push_str(&pad(ctx.year.div_euclid(100), 2, flags)),
        'G' => out.push_str(&pad(ctx.iso_year, 4, flags)),
        'g' => out.push_str(&pad(ctx.iso_year.rem_euclid(100), 2, flags)),
        'H' => out.push_str(&pad(ctx.hour, 2, flags)),
        'I' => {
            let h12 = if ctx.hour % 12 == 0 { 12 } else { ctx.hour % 12 };
            out.push_str(&pad(h12, 2, flags));
        }
        'M' => out.push_str(&pad(ctx.minute, 2, flags)),
        'S' => out.push_str(&pad(ctx.second, 2, flags)),
        'N' => out.push_str(&pad(ctx.millis, 3, flags)),
        'p' => out.push_str(&ctx.locale.ampm[if ctx.hour >= 12 { 1 } else { 0 }]),
        'P' => out.push_str(&ctx.locale.ampm[if ctx.hour >= 12 { 1 } else { 0 }].to_lowercase()),
        'j' => {
            let jan1 = ctx.calendar.set_date(ctx.year, 1, 1);
            out.push_str(&pad(ctx.local_dayno - jan1 + 1, 3, flags));
        }
        'u' => out.push_str(&pad(ctx.iso_wd as i64, 1, flags)),
        'w' => out.push_str(&pad(ctx.wd as i64, 1, flags)),
        'U' => {
            let jan1 = ctx.calendar.set_date(ctx.year, 1, 1);
            let jan1_wd = ctx.calendar.weekday(jan1) as i64;
            let doy = ctx.local_dayno - jan1;
            out.push_str(&pad((doy + jan1_wd) / 7, 2, flags));
        }
        'W' => {
            let jan1 = ctx.calendar.set_date(ctx.year, 1, 1);
            let jan1_iso_wd = ctx.calendar.iso_weekday(jan1) as i64 - 1;
            let doy = ctx.local_dayno - jan1;
            out.push_str(&pad((doy + jan1_iso_wd) / 7, 2, flags));
        }
        'V' => out.push_str(&pad(ctx.iso_week as i64, 2, flags)),
        't' => out.push('\t'),
        'z' => {
            let secs = ctx.zone.offset_at(ctx.local_dayno).0;
            let sign = if secs < 0 { '-' } else { '+' };
            out.push_str(&format!("{}{:02}{:02}", sign, secs.abs() / 3600, (secs.abs() / 60) % 60));
        }
        'Z' => out.push_str(ctx.zone.offset_at(ctx.local_dayno).1),
        'E' => {
            let era_idx = if ctx.year >= 1 { 1 } else { 0 };
            let era_year = if ctx.year >= 1 { ctx.year } else { 1 - ctx.year };
            if flags.swap_era_order {
                out.push_str(&format!("{}{}", era_year, ctx.locale.era[era_idx]));
            } else {
                out.push_str(&format!("{}{}", ctx.locale.era[era_idx], era_year));
            }
        }
        'J' => {
            let jdn = ctx.calendar.julian_dayno(ctx.local_dayno);
            if flags.drop_leading_zeros {
                out.push_str(&jdn.to_string());
            } else {
                let frac = BigNumber::from_i32((ctx.millis + ctx.second * 1000 + ctx.minute * 60_000 + ctx.hour * 3_600_000) as i32, Some(12));
                let day_ms = BigNumber::from_i32(MS_PER_DAY as i32, Some(12));
                let frac = crate::bignum::arith::div(&frac, &day_ms).unwrap_or_else(|_| BigNumber::zero(12));
                let whole = BigNumber::from_i32(jdn as i32, Some(18));
                let total = crate::bignum::arith::add(&whole, &frac);
                out.push_str(&crate::bignum::format::format(&total, &crate::bignum::format::FormatSpec::default()));
            }
        }
        's' => out.push_str(&(ctx.date.dayno() - crate::date::UNIX_EPOCH_DAYNO).to_string()),
        'c' => {
            let tpl = ctx.locale.fmt[0].clone();
            return format_and_append(out, ctx, &tpl);
        }
        'x' => {
            let tpl = ctx.locale.fmt[1].clone();
            return format_and_append(out, ctx, &tpl);
        }
        'X' => {
            let tpl = ctx.locale.fmt[2].clone();
            return format_and_append(out, ctx, &tpl);
        }
        'D' => {
            let tpl = ctx.locale.fmt[3].clone();
            return format_and_append(out, ctx, &tpl);
        }
        'F' => {
            let tpl = ctx.locale.fmt[4].clone();
            return format_and_append(out, ctx, &tpl);
        }
        'r' => {
            let tpl = ctx.locale.fmt[5].clone();
            return format_and_append(out, ctx, &tpl);
        }
        'R' => {
            let tpl = "%H:%M".to_string();
            return format_and_append(out, ctx, &tpl);
        }
        'T' => {
            let tpl = "%H:%M:%S".to_string();
            return format_and_append(out, ctx, &tpl);
        }
        other => return Err(VmError::UnknownFormatCode(other)),
    }
    Ok(())
}

fn blank(flags: &FormatFlags) -> FormatFlags {
    FormatFlags {
        drop_leading_zeros: flags.drop_leading_zeros,
        space_pad: flags.space_pad,
        swap_era_order: flags.swap_era_order,
        roman: flags.roman,
    }
}

fn format_and_append(out: &mut String, ctx: RenderCtx<'_>, nested_template: &str) -> Result<()> {
    let nested = format(ctx.date, ctx.calendar, ctx.zone, ctx.locale, nested_template)?;
    out.push_str(&nested);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::{Date, Gregorian};

    #[test]
    fn formats_iso_date() {
        let cal = Gregorian;
        let locale = Locale::default();
        let zone = ZoneRecord::fixed(0);
        let date = Date::from_civil(&cal, 2024, 3, 7, 13 * 3_600_000 + 5 * 60_000 + 9_000);
        let rendered = format(&date, &cal, &zone, &locale, "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(rendered, "2024-03-07 13:05:09");
    }

    #[test]
    fn formats_weekday_and_month_names() {
        let cal = Gregorian;
        let locale = Locale::default();
        let zone = ZoneRecord::fixed(0);
        let date = Date::from_civil(&cal, 2024, 3, 7, 0);
        let rendered = format(&date, &cal, &zone, &locale, "%A, %B %e").unwrap();
        assert_eq!(rendered, "Thursday, March  7");
    }

    #[test]
    fn unknown_code_is_an_error() {
        let cal = Gregorian;
        let locale = Locale::default();
        let zone = ZoneRecord::fixed(0);
        let date = Date::from_civil(&cal, 2024, 3, 7, 0);
        assert!(format(&date, &cal, &zone, &locale, "%Q").is_err());
    }
}
