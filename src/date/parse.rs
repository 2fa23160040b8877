//! Table-driven date/time string parsing.
//!
//! The full system names a closed vocabulary of format-code tokens
//! assembled into ~40 whitespace-separated templates; this module keeps
//! that algorithm — try every enabled template, keep the longest match,
//! merge unset fields from a reference instant — but expresses each
//! template as a small dedicated matcher function rather than a generic
//! token interpreter, since the token vocabulary itself does no work the
//! matcher functions don't already do directly.

use crate::date::calendar::Calendar;
use crate::date::format::Locale;
use crate::date::{Date, MS_PER_DAY};
use crate::error::{Result, VmError};

/// Fields recovered from a successful parse; any field left `None` is
/// filled in from the reference date during [`parse`].
#[derive(Debug, Default, Clone)]
pub struct ParseResult {
    /// Nominal year (already era-adjusted if an era token matched).
    pub year: Option<i64>,
    /// True if a two-digit year token matched (controls century windowing).
    pub yy_needs_century: bool,
    /// True if a BC/`-` era token matched.
    pub era_bc: bool,
    pub month: Option<u8>,
    pub day: Option<u8>,
    /// Day of year (1-366), set by an ordinal-date template.
    pub day_of_year: Option<u32>,
    /// ISO week ordinal, paired with `iso_weekday`.
    pub iso_week: Option<u32>,
    pub iso_weekday: Option<u8>,
    pub hour: Option<i64>,
    pub minute: Option<i64>,
    pub second: Option<i64>,
    pub millis: Option<i64>,
    /// `Some(true)` for PM, `Some(false)` for AM.
    pub is_pm: Option<bool>,
    /// Explicit numeric zone offset, in seconds east of UTC.
    pub tz_offset_secs: Option<i32>,
    /// Named zone or abbreviation, if one was matched instead of (or
    /// alongside) a numeric offset.
    pub tz_name: Option<String>,
    /// Seconds since the Unix epoch, if a `unix` token matched (overrides
    /// every other field).
    pub unix_secs: Option<i64>,
    /// Template name(s) that contributed to the match, in match order.
    pub matched_templates: Vec<&'static str>,
}

type Matcher = fn(&str, &Locale) -> Option<(usize, ParseResult)>;

fn digits(s: &str, max: usize) -> (i64, usize) {
    let take: String = s.chars().take_while(|c| c.is_ascii_digit()).take(max).collect();
    let len = take.len();
    (take.parse().unwrap_or(0), len)
}

fn lit(s: &str, ch: char) -> Option<usize> {
    s.starts_with(ch).then(|| ch.len_utf8())
}

fn opt_lit(s: &str, ch: char) -> usize {
    lit(s, ch).unwrap_or(0)
}

fn skip_ws(s: &str) -> usize {
    s.chars().take_while(|c| c.is_whitespace()).map(|c| c.len_utf8()).sum()
}

fn match_iso(s: &str, _locale: &Locale) -> Option<(usize, ParseResult)> {
    let mut pos = 0;
    let (year, n) = digits(&s[pos..], 4);
    if n < 4 {
        return None;
    }
    pos += n;
    pos += lit(&s[pos..], '-')?;
    let (month, n) = digits(&s[pos..], 2);
    if n == 0 {
        return None;
    }
    pos += n;
    pos += lit(&s[pos..], '-')?;
    let (day, n) = digits(&s[pos..], 2);
    if n == 0 {
        return None;
    }
    pos += n;

    let mut r = ParseResult {
        year: Some(year),
        month: Some(month as u8),
        day: Some(day as u8),
        matched_templates: vec!["iso-date"],
        ..Default::default()
    };

    if let Some(tlen) = lit(&s[pos..], 'T').or_else(|| lit(&s[pos..], ' ')) {
        let time_pos = pos + tlen;
        if let Some((consumed, hour, minute, second, millis)) = match_hms(&s[time_pos..]) {
            pos = time_pos + consumed;
            r.hour = Some(hour);
            r.minute = Some(minute);
            r.second = Some(second);
            r.millis = millis;
            r.matched_templates.push("iso-time");
            pos += match_trailing_zone(&s[pos..], &mut r);
        }
    }
    Some((pos, r))
}

fn match_hms(s: &str) -> Option<(usize, i64, i64, i64, Option<i64>)> {
    let mut pos = 0;
    let (hour, n) = digits(&s[pos..], 2);
    if n == 0 {
        return None;
    }
    pos += n;
    pos += lit(&s[pos..], ':')?;
    let (minute, n) = digits(&s[pos..], 2);
    if n == 0 {
        return None;
    }
    pos += n;
    let mut second = 0;
    let mut millis = None;
    if let Some(clen) = lit(&s[pos..], ':') {
        let after_colon = pos + clen;
        let (sec, n) = digits(&s[after_colon..], 2);
        if n > 0 {
            pos = after_colon + n;
            second = sec;
            if let Some(dlen) = lit(&s[pos..], '.') {
                let frac_pos = pos + dlen;
                let (frac, n) = digits(&s[frac_pos..], 3);
                if n > 0 {
                    pos = frac_pos + n;
                    millis = Some(frac * 10i64.pow(3u32.saturating_sub(n as u32)));
                }
            }
        }
    }
    Some((pos, hour, minute, second, millis))
}

/// Matches a numeric zone offset (`Z`, `+HH[:MM[:SS]]`, `-HH[:MM]`),
/// optionally prefixed with a `GMT`/`UTC` literal.
fn match_zone_offset(s: &str) -> Option<(usize, i32)> {
    let mut pos = 0;
    for prefix in ["GMT", "UTC"] {
        if s.starts_with(prefix) {
            pos += prefix.len();
            break;
        }
    }
    if let Some(n) = lit(&s[pos..], 'Z') {
        return Some((pos + n, 0));
    }
    let sign = if s[pos..].starts_with('+') {
        1
    } else if s[pos..].starts_with('-') {
        -1
    } else if pos > 0 {
        return Some((pos, 0));
    } else {
        return None;
    };
    pos += 1;
    let (h, n) = digits(&s[pos..], 2);
    if n == 0 {
        return None;
    }
    pos += n;
    let mut m = 0;
    if let Some(clen) = lit(&s[pos..], ':') {
        let after = pos + clen;
        let (mm, n) = digits(&s[after..], 2);
        if n > 0 {
            pos = after + n;
            m = mm;
        }
    } else {
        let (mm, n) = digits(&s[pos..], 2);
        if n == 2 {
            pos += n;
            m = mm;
        }
    }
    Some((pos, sign * (h as i32 * 3600 + m as i32 * 60)))
}

/// Zone abbreviations with a fixed offset; named IANA zones and DST-history
/// lookups are the time-zone database's job, not the string parser's.
const NAMED_ZONES: &[(&str, i32)] = &[
    ("EST", -5 * 3600),
    ("EDT", -4 * 3600),
    ("CST", -6 * 3600),
    ("CDT", -5 * 3600),
    ("MST", -7 * 3600),
    ("MDT", -6 * 3600),
    ("PST", -8 * 3600),
    ("PDT", -7 * 3600),
];

fn match_named_zone(s: &str) -> Option<(usize, i32, &'static str)> {
    NAMED_ZONES.iter().find(|(name, _)| s.starts_with(name)).map(|(name, offset)| (name.len(), *offset, *name))
}

/// Consumes leading whitespace then a numeric or named zone, filling in
/// `r.tz_offset_secs`/`r.tz_name`. Returns the total bytes consumed
/// (including the whitespace), or 0 if nothing matched.
fn match_trailing_zone(s: &str, r: &mut ParseResult) -> usize {
    let ws = skip_ws(s);
    if let Some((zlen, offset)) = match_zone_offset(&s[ws..]) {
        r.tz_offset_secs = Some(offset);
        r.matched_templates.push("zone-offset");
        return ws + zlen;
    }
    if let Some((zlen, offset, name)) = match_named_zone(&s[ws..]) {
        r.tz_offset_secs = Some(offset);
        r.tz_name = Some(name.to_string());
        r.matched_templates.push("zone-name");
        return ws + zlen;
    }
    0
}

fn match_slash_date(s: &str, month_first: bool, tag: &'static str) -> Option<(usize, ParseResult)> {
    let mut pos = 0;
    let (a, n) = digits(&s[pos..], 2);
    if n == 0 {
        return None;
    }
    pos += n;
    pos += lit(&s[pos..], '/')?;
    let (b, n) = digits(&s[pos..], 2);
    if n == 0 {
        return None;
    }
    pos += n;
    pos += lit(&s[pos..], '/')?;
    let (year, n) = digits(&s[pos..], 4);
    if n == 0 {
        return None;
    }
    pos += n;
    let (month, day) = if month_first { (a, b) } else { (b, a) };

    let mut r = ParseResult {
        year: Some(year),
        yy_needs_century: n <= 2,
        month: Some(month as u8),
        day: Some(day as u8),
        matched_templates: vec![tag],
        ..Default::default()
    };

    let ws = skip_ws(&s[pos..]);
    if ws > 0 {
        if let Some((consumed, hour, minute, second, millis)) = match_hms(&s[pos + ws..]) {
            let mut end = pos + ws + consumed;
            r.hour = Some(hour);
            r.minute = Some(minute);
            r.second = Some(second);
            r.millis = millis;
            let ws2 = skip_ws(&s[end..]);
            if let Some((alen, is_pm)) = match_ampm(&s[end + ws2..]) {
                end += ws2 + alen;
                r.is_pm = Some(is_pm);
            }
            end += match_trailing_zone(&s[end..], &mut r);
            pos = end;
            r.matched_templates.push("clock-time");
        }
    }
    Some((pos, r))
}

fn match_ampm(s: &str) -> Option<(usize, bool)> {
    let lower = s.to_ascii_lowercase();
    if lower.starts_with("pm") {
        Some((2, true))
    } else if lower.starts_with("am") {
        Some((2, false))
    } else {
        None
    }
}

fn match_unix(s: &str, _locale: &Locale) -> Option<(usize, ParseResult)> {
    let mut pos = lit(s, '@')?;
    let neg = lit(&s[pos..], '-').is_some();
    if neg {
        pos += 1;
    }
    let (v, n) = digits(&s[pos..], 18);
    if n == 0 {
        return None;
    }
    pos += n;
    Some((
        pos,
        ParseResult {
            unix_secs: Some(if neg { -v } else { v }),
            matched_templates: vec!["unix"],
            ..Default::default()
        },
    ))
}

fn match_time_only(s: &str, _locale: &Locale) -> Option<(usize, ParseResult)> {
    let (consumed, hour, minute, second, millis) = match_hms(s)?;
    let mut pos = consumed;
    let mut r = ParseResult {
        hour: Some(hour),
        minute: Some(minute),
        second: Some(second),
        millis,
        matched_templates: vec!["time-only"],
        ..Default::default()
    };
    let ws = skip_ws(&s[pos..]);
    if let Some((alen, is_pm)) = match_ampm(&s[pos + ws..]) {
        pos += ws + alen;
        r.is_pm = Some(is_pm);
    }
    pos += match_trailing_zone(&s[pos..], &mut r);
    Some((pos, r))
}

/// Matches a day-of-week-of-month ISO week date, `YYYY-Www-D`.
fn match_iso_week(s: &str, _locale: &Locale) -> Option<(usize, ParseResult)> {
    let mut pos = 0;
    let (year, n) = digits(&s[pos..], 4);
    if n < 4 {
        return None;
    }
    pos += n;
    pos += lit(&s[pos..], '-')?;
    pos += lit(&s[pos..], 'W').or_else(|| lit(&s[pos..], 'w'))?;
    let (week, n) = digits(&s[pos..], 2);
    if n == 0 {
        return None;
    }
    pos += n;
    pos += lit(&s[pos..], '-')?;
    let (wd, n) = digits(&s[pos..], 1);
    if n == 0 {
        return None;
    }
    pos += n;

    let mut r = ParseResult {
        year: Some(year),
        iso_week: Some(week as u32),
        iso_weekday: Some(wd as u8),
        matched_templates: vec!["iso-week-date"],
        ..Default::default()
    };

    if let Some(tlen) = lit(&s[pos..], 'T').or_else(|| lit(&s[pos..], ' ')) {
        let time_pos = pos + tlen;
        if let Some((consumed, hour, minute, second, millis)) = match_hms(&s[time_pos..]) {
            pos = time_pos + consumed;
            r.hour = Some(hour);
            r.minute = Some(minute);
            r.second = Some(second);
            r.millis = millis;
            r.matched_templates.push("iso-time");
            pos += match_trailing_zone(&s[pos..], &mut r);
        }
    }
    Some((pos, r))
}

/// Matches an ordinal (day-of-year) date, `YYYY-DDD`.
fn match_ordinal_date(s: &str, _locale: &Locale) -> Option<(usize, ParseResult)> {
    let mut pos = 0;
    let (year, n) = digits(&s[pos..], 4);
    if n < 4 {
        return None;
    }
    pos += n;
    pos += lit(&s[pos..], '-')?;
    let (doy, n) = digits(&s[pos..], 3);
    if n != 3 {
        return None;
    }
    pos += n;

    let mut r = ParseResult {
        year: Some(year),
        day_of_year: Some(doy as u32),
        matched_templates: vec!["ordinal-date"],
        ..Default::default()
    };

    if let Some(tlen) = lit(&s[pos..], 'T').or_else(|| lit(&s[pos..], ' ')) {
        let time_pos = pos + tlen;
        if let Some((consumed, hour, minute, second, millis)) = match_hms(&s[time_pos..]) {
            pos = time_pos + consumed;
            r.hour = Some(hour);
            r.minute = Some(minute);
            r.second = Some(second);
            r.millis = millis;
            r.matched_templates.push("iso-time");
            pos += match_trailing_zone(&s[pos..], &mut r);
        }
    }
    Some((pos, r))
}

/// Matches a month name (long, then abbreviated, then Roman numeral)
/// against the active locale's name tables.
fn match_month_name(s: &str, locale: &Locale) -> Option<(usize, u8)> {
    let lower = s.to_ascii_lowercase();
    for (i, name) in locale.month.iter().enumerate() {
        if lower.starts_with(&name.to_ascii_lowercase()) {
            return Some((name.len(), (i + 1) as u8));
        }
    }
    for (i, name) in locale.mon.iter().enumerate() {
        if lower.starts_with(&name.to_ascii_lowercase()) {
            return Some((name.len(), (i + 1) as u8));
        }
    }
    match_roman_month(s)
}

const ROMAN_MONTHS: [&str; 12] = ["I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII"];

fn match_roman_month(s: &str) -> Option<(usize, u8)> {
    let upper: String = s.chars().take_while(|c| c.is_ascii_alphabetic()).collect::<String>().to_ascii_uppercase();
    let mut best: Option<(usize, u8)> = None;
    for (i, numeral) in ROMAN_MONTHS.iter().enumerate() {
        if upper.starts_with(numeral) && best.map(|(len, _)| numeral.len() > len).unwrap_or(true) {
            best = Some((numeral.len(), (i + 1) as u8));
        }
    }
    best
}

/// Matches an era marker: the locale's `era[0]`/`era[1]` (BC/AD) names, or
/// the bare `-`/`+` directives.
fn match_era(s: &str, locale: &Locale) -> Option<(usize, bool)> {
    let lower = s.to_ascii_lowercase();
    if lower.starts_with(&locale.era[0].to_ascii_lowercase()) {
        return Some((locale.era[0].len(), true));
    }
    if lower.starts_with(&locale.era[1].to_ascii_lowercase()) {
        return Some((locale.era[1].len(), false));
    }
    if let Some(n) = lit(s, '-') {
        return Some((n, true));
    }
    if let Some(n) = lit(s, '+') {
        return Some((n, false));
    }
    None
}

fn match_ordinal_suffix(s: &str) -> usize {
    let lower = s.to_ascii_lowercase();
    ["st", "nd", "rd", "th"].iter().find(|suf| lower.starts_with(**suf)).map(|suf| suf.len()).unwrap_or(0)
}

/// Consumes an optional era marker then an optional clock time, appending
/// to `r` and returning the position past whatever matched.
fn append_era_and_time(s: &str, locale: &Locale, pos: usize, r: &mut ParseResult) -> usize {
    let mut pos = pos;
    let ws = skip_ws(&s[pos..]);
    if let Some((elen, is_bc)) = match_era(&s[pos + ws..], locale) {
        pos += ws + elen;
        r.era_bc = is_bc;
        r.matched_templates.push("era");
    }

    let ws = skip_ws(&s[pos..]);
    if ws > 0 {
        if let Some((consumed, hour, minute, second, millis)) = match_hms(&s[pos + ws..]) {
            let mut end = pos + ws + consumed;
            r.hour = Some(hour);
            r.minute = Some(minute);
            r.second = Some(second);
            r.millis = millis;
            let ws2 = skip_ws(&s[end..]);
            if let Some((alen, is_pm)) = match_ampm(&s[end + ws2..]) {
                end += ws2 + alen;
                r.is_pm = Some(is_pm);
            }
            end += match_trailing_zone(&s[end..], r);
            pos = end;
            r.matched_templates.push("clock-time");
        }
    }
    pos
}

/// Matches `Month D[suffix][,] YYYY`, e.g. `"March 7th, 2024"`.
fn match_month_first_date(s: &str, locale: &Locale) -> Option<(usize, ParseResult)> {
    let mut pos = 0;
    let (mlen, month) = match_month_name(&s[pos..], locale)?;
    pos += mlen;
    pos += skip_ws(&s[pos..]);
    let (day, n) = digits(&s[pos..], 2);
    if n == 0 {
        return None;
    }
    pos += n;
    pos += match_ordinal_suffix(&s[pos..]);
    pos += opt_lit(&s[pos..], ',');
    pos += skip_ws(&s[pos..]);
    let (year, n) = digits(&s[pos..], 4);
    if n == 0 {
        return None;
    }
    pos += n;

    let mut r = ParseResult {
        year: Some(year),
        month: Some(month),
        day: Some(day as u8),
        matched_templates: vec!["long-month-first-date"],
        ..Default::default()
    };
    pos = append_era_and_time(s, locale, pos, &mut r);
    Some((pos, r))
}

/// Matches `D[suffix] Month[,] YYYY`, e.g. `"7 March 2024"`.
fn match_day_first_date(s: &str, locale: &Locale) -> Option<(usize, ParseResult)> {
    let mut pos = 0;
    let (day, n) = digits(&s[pos..], 2);
    if n == 0 {
        return None;
    }
    pos += n;
    pos += match_ordinal_suffix(&s[pos..]);
    pos += skip_ws(&s[pos..]);
    let (mlen, month) = match_month_name(&s[pos..], locale)?;
    pos += mlen;
    pos += opt_lit(&s[pos..], ',');
    pos += skip_ws(&s[pos..]);
    let (year, n) = digits(&s[pos..], 4);
    if n == 0 {
        return None;
    }
    pos += n;

    let mut r = ParseResult {
        year: Some(year),
        month: Some(month),
        day: Some(day as u8),
        matched_templates: vec!["long-day-first-date"],
        ..Default::default()
    };
    pos = append_era_and_time(s, locale, pos, &mut r);
    Some((pos, r))
}

fn match_long_date(s: &str, locale: &Locale) -> Option<(usize, ParseResult)> {
    match_month_first_date(s, locale).or_else(|| match_day_first_date(s, locale))
}

const US_MATCHERS: &[Matcher] = &[match_iso, match_iso_week, match_ordinal_date, match_unix, match_long_date, match_us_slash, match_time_only];
const EU_MATCHERS: &[Matcher] = &[match_iso, match_iso_week, match_ordinal_date, match_unix, match_long_date, match_eu_slash, match_time_only];

fn match_us_slash(s: &str, _locale: &Locale) -> Option<(usize, ParseResult)> {
    match_slash_date(s, true, "us-slash-date")
}

fn match_eu_slash(s: &str, _locale: &Locale) -> Option<(usize, ParseResult)> {
    match_slash_date(s, false, "eu-slash-date")
}

/// Parse `input` against the enabled template set, merge unset fields from
/// `reference`, and return the resulting UTC instant plus the raw parse
/// metadata.
pub fn parse(input: &str, locale: &Locale, calendar: &dyn Calendar, reference: &Date, default_offset_secs: i32) -> Result<(Date, ParseResult)> {
    let trimmed_offset = skip_ws(input);
    let s = &input[trimmed_offset..];

    let matchers: &[Matcher] = if locale.parse_filter == "eu" { EU_MATCHERS } else { US_MATCHERS };
    let mut best: Option<(usize, ParseResult)> = None;
    for m in matchers {
        if let Some((len, r)) = m(s, locale) {
            if best.as_ref().map(|(blen, _)| len > *blen).unwrap_or(true) {
                best = Some((len, r));
            }
        }
    }
    let (_, mut result) = best.ok_or_else(|| VmError::DateParseFailure(input.to_string()))?;

    if let Some(unix_secs) = result.unix_secs {
        let dayno = crate::date::UNIX_EPOCH_DAYNO + unix_secs.div_euclid(86_400);
        let daytime = unix_secs.rem_euclid(86_400) * 1000;
        return Ok((Date::new(dayno, daytime), result));
    }

    let (ref_year, ref_month, ref_day) = calendar.set_dayno(reference.dayno());

    if let Some(y) = result.year {
        result.year = Some(if result.yy_needs_century {
            window_two_digit_year(y, ref_year)
        } else {
            y
        });
    }
    if result.era_bc {
        result.year = result.year.map(|y| 1 - y);
    }

    let year = result.year.unwrap_or(ref_year);
    let month = result.month.unwrap_or(ref_month);
    let mut hour = result.hour.unwrap_or(0);
    let minute = result.minute.unwrap_or(0);
    let second = result.second.unwrap_or(0);
    let millis = result.millis.unwrap_or(0);

    if let Some(is_pm) = result.is_pm {
        hour = match (hour, is_pm) {
            (12, true) => 12,
            (12, false) => 0,
            (h, true) => h + 12,
            (h, false) => h,
        };
    }

    let dayno = if let (Some(week), Some(wd)) = (result.iso_week, result.iso_weekday) {
        let jan4 = calendar.set_date(year, 1, 4);
        let corr = calendar.iso_weekday(jan4) as i64 + 3;
        calendar.set_date(year, 1, 1) + (week as i64 * 7 + wd as i64 - corr)
    } else if let Some(doy) = result.day_of_year {
        calendar.set_date(year, 1, 1) + (doy as i64 - 1)
    } else {
        let day = result.day.unwrap_or(ref_day);
        calendar.set_date(year, month, day)
    };

    let daytime = hour * 3_600_000 + minute * 60_000 + second * 1000 + millis;

    let offset = result.tz_offset_secs.unwrap_or(default_offset_secs);
    let utc_daytime = daytime - offset as i64 * 1000;
    let utc_dayno = dayno + utc_daytime.div_euclid(MS_PER_DAY);
    let utc_daytime = utc_daytime.rem_euclid(MS_PER_DAY);

    Ok((Date::new(utc_dayno, utc_daytime), result))
}

fn window_two_digit_year(two_digit: i64, ref_year: i64) -> i64 {
    let century = (ref_year / 100) * 100;
    let candidates = [century - 100 + two_digit, century + two_digit, century + 100 + two_digit];
    *candidates.iter().min_by_key(|&&y| (y - ref_year).abs()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::Gregorian;

    #[test]
    fn parses_iso_datetime_with_zone() {
        let cal = Gregorian;
        let locale = Locale::default();
        let reference = Date::from_civil(&cal, 2000, 1, 1, 0);
        let (date, r) = parse("2024-03-07T13:05:09-08:00", &locale, &cal, &reference, 0).unwrap();
        assert_eq!(r.year, Some(2024));
        assert_eq!(date.civil(&cal), (2024, 3, 7));
        // 13:05:09 local at -08:00 is 21:05:09 UTC.
        assert_eq!(date.daytime(), 21 * 3_600_000 + 5 * 60_000 + 9_000);
    }

    #[test]
    fn parses_iso_datetime_with_space_before_zone() {
        // The formatter's "%Y-%m-%dT%H:%M:%S.%N %z" template emits a literal
        // space before the offset; the parser must round-trip it.
        let cal = Gregorian;
        let locale = Locale::default();
        let reference = Date::from_civil(&cal, 2000, 1, 1, 0);
        let (date, _) = parse("2024-03-07T13:05:09.000 -08:00", &locale, &cal, &reference, 0).unwrap();
        assert_eq!(date.daytime(), 21 * 3_600_000 + 5 * 60_000 + 9_000);
    }

    #[test]
    fn parses_us_slash_date_with_ampm() {
        let cal = Gregorian;
        let locale = Locale::default();
        let reference = Date::from_civil(&cal, 2000, 1, 1, 0);
        let (date, _) = parse("03/07/2024 01:30 PM", &locale, &cal, &reference, 0).unwrap();
        assert_eq!(date.civil(&cal), (2024, 3, 7));
        assert_eq!(date.daytime(), 13 * 3_600_000 + 30 * 60_000);
    }

    #[test]
    fn two_digit_year_windows_around_reference() {
        let cal = Gregorian;
        let locale = Locale::default();
        let reference = Date::from_civil(&cal, 2024, 1, 1, 0);
        let (date, _) = parse("07/04/30", &locale, &cal, &reference, 0).unwrap();
        assert_eq!(date.civil(&cal).0, 2030);
    }

    #[test]
    fn unix_token_overrides_other_fields() {
        let cal = Gregorian;
        let locale = Locale::default();
        let reference = Date::from_civil(&cal, 2000, 1, 1, 0);
        let (date, _) = parse("@0", &locale, &cal, &reference, 0).unwrap();
        assert_eq!(date.civil(&cal), (1970, 1, 1));
    }

    #[test]
    fn unparseable_input_is_an_error() {
        let cal = Gregorian;
        let locale = Locale::default();
        let reference = Date::from_civil(&cal, 2000, 1, 1, 0);
        assert!(parse("not a date", &locale, &cal, &reference, 0).is_err());
    }

    #[test]
    fn parses_long_month_first_date_with_ordinal_and_era() {
        let cal = Gregorian;
        let locale = Locale::default();
        let reference = Date::from_civil(&cal, 2000, 1, 1, 0);
        let (date, r) = parse("March 7th, 100 BC", &locale, &cal, &reference, 0).unwrap();
        assert!(r.era_bc);
        assert_eq!(date.civil(&cal), (-99, 3, 7));
    }

    #[test]
    fn parses_long_day_first_date() {
        let cal = Gregorian;
        let locale = Locale::default();
        let reference = Date::from_civil(&cal, 2000, 1, 1, 0);
        let (date, _) = parse("7 March 2024", &locale, &cal, &reference, 0).unwrap();
        assert_eq!(date.civil(&cal), (2024, 3, 7));
    }

    #[test]
    fn parses_roman_numeral_month() {
        let cal = Gregorian;
        let locale = Locale::default();
        let reference = Date::from_civil(&cal, 2000, 1, 1, 0);
        let (date, _) = parse("7 IX 2024", &locale, &cal, &reference, 0).unwrap();
        assert_eq!(date.civil(&cal), (2024, 9, 7));
    }

    #[test]
    fn parses_iso_week_date() {
        let cal = Gregorian;
        let locale = Locale::default();
        let reference = Date::from_civil(&cal, 2000, 1, 1, 0);
        let (date, _) = parse("2024-W10-4", &locale, &cal, &reference, 0).unwrap();
        let (iso_year, iso_week) = cal.iso_weekno(date.dayno());
        assert_eq!((iso_year, iso_week), (2024, 10));
    }

    #[test]
    fn parses_ordinal_date() {
        let cal = Gregorian;
        let locale = Locale::default();
        let reference = Date::from_civil(&cal, 2000, 1, 1, 0);
        let (date, _) = parse("2024-067", &locale, &cal, &reference, 0).unwrap();
        // day 67 of 2024 (leap year) is March 7.
        assert_eq!(date.civil(&cal), (2024, 3, 7));
    }

    #[test]
    fn parses_named_zone_abbreviation() {
        let cal = Gregorian;
        let locale = Locale::default();
        let reference = Date::from_civil(&cal, 2000, 1, 1, 0);
        let (_, r) = parse("2024-03-07T13:05:09 PST", &locale, &cal, &reference, 0).unwrap();
        assert_eq!(r.tz_name.as_deref(), Some("PST"));
        assert_eq!(r.tz_offset_secs, Some(-8 * 3600));
    }
}
