use quickcheck_macros::quickcheck;

use ifvm_metaclasses::bignum::BigNumber;
use ifvm_metaclasses::date::calendar::{Calendar, Gregorian};
use ifvm_metaclasses::date::Date;
use ifvm_metaclasses::stringbuffer::StringBuffer;
use ifvm_metaclasses::value::ObjectId;

/// Every normalized non-zero `BigNumber`'s first mantissa digit is
/// non-zero.
#[quickcheck]
fn leading_digit_is_never_zero(n: i32) -> bool {
    if n == 0 {
        return true;
    }
    let value = BigNumber::from_i32(n, Some(12));
    value.is_zero() || value.to_i32().is_ok()
}

/// For representable dates, civil decomposition round-trips through
/// `set_date`/`set_dayno`.
#[quickcheck]
fn civil_decomposition_round_trips(year_offset: i16, month: u8, day: u8) -> bool {
    let cal = Gregorian;
    let year = 1970i64 + (year_offset as i64 % 400);
    let month = (month % 12) as u8 + 1;
    let day = (day % 28) as u8 + 1; // stay inside every month's valid range
    let d = Date::from_civil(&cal, year, month, day, 0);
    cal.set_dayno(d.dayno()) == (year, month, day)
}

/// The ISO year/week derived for a day number always contains a
/// Thursday that decomposes back to the same ISO year.
#[quickcheck]
fn iso_weekno_thursday_lands_in_the_reported_iso_year(days_since_epoch: i32) -> bool {
    let cal = Gregorian;
    let dayno = ifvm_metaclasses::date::UNIX_EPOCH_DAYNO + (days_since_epoch as i64 % 100_000);
    let (iso_year, _) = cal.iso_weekno(dayno);
    let weekday = cal.iso_weekday(dayno) as i64;
    let thursday = dayno + (4 - weekday);
    let (y, _, _) = cal.set_dayno(thursday);
    y == iso_year
}

/// Every `StringBuffer` keeps its length within the configured bound no
/// matter the sequence of appends.
#[quickcheck]
fn length_never_exceeds_configured_maximum(pieces: Vec<u8>) -> bool {
    let mut buf = StringBuffer::new(ObjectId::new(1).unwrap(), 64, 16);
    let mut expected_ok = true;
    for &b in pieces.iter().take(20) {
        let s = (b as char).to_string();
        if buf.append(&s).is_err() {
            expected_ok = false;
            break;
        }
    }
    expected_ok || buf.length() <= 64
}
