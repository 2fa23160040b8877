use ifvm_metaclasses::date::calendar::{Calendar, Gregorian, Julian};
use ifvm_metaclasses::date::format;
use ifvm_metaclasses::date::parse;
use ifvm_metaclasses::date::timezone::{TimeZone, ZoneCache, ZoneRecord};
use ifvm_metaclasses::date::Date;

#[test]
fn civil_round_trip_is_exact_for_a_range_of_dates() {
    let cal = Gregorian;
    for year in 1900..2100 {
        for &(month, day) in &[(1u8, 1u8), (2, 28), (3, 1), (12, 31)] {
            let d = Date::from_civil(&cal, year, month, day, 0);
            assert_eq!(d.civil(&cal), (year, month, day));
        }
    }
}

#[test]
fn iso_weekno_resolves_year_boundary_into_prior_iso_year() {
    let cal = Gregorian;
    let d = Date::from_civil(&cal, 2021, 1, 1, 0);
    assert_eq!(cal.iso_weekno(d.dayno()), (2020, 53));
}

#[test]
fn julian_calendar_round_trips_its_own_leap_rule() {
    let cal = Julian;
    let d = Date::from_civil(&cal, 1900, 2, 29, 0);
    assert_eq!(cal.set_dayno(d.dayno()), (1900, 2, 29));
}

#[test]
fn format_then_parse_round_trips_an_iso_instant() {
    let cal = Gregorian;
    let mut zones = ZoneCache::new();
    let utc: TimeZone = zones.register(ZoneRecord::fixed(0));
    let locale = format::Locale::default();

    let original = Date::from_civil(&cal, 2024, 3, 7, 47_109_000);
    let rendered = format::format(&original, &cal, zones.record(utc), &locale, "%Y-%m-%dT%H:%M:%S").unwrap();

    let (parsed, _) = parse::parse(&rendered, &locale, &cal, &original, 0).unwrap();
    assert_eq!(parsed, original);
}

#[test]
fn two_digit_year_parses_within_the_reference_window() {
    let cal = Gregorian;
    let locale = format::Locale::default();
    let reference = Date::from_civil(&cal, 2024, 1, 1, 0);
    let (parsed, _) = parse::parse("1/2/30", &locale, &cal, &reference, 0).unwrap();
    let (year, _, _) = parsed.civil(&cal);
    assert_eq!(year, 2030);
}
