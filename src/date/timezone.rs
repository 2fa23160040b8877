//! Time zone resolution: a `TimeZone` is a handle into a VM-wide cache of
//! [`ZoneRecord`]s, queryable by IANA-style name, abbreviation or fixed
//! GMT offset.

use std::collections::HashMap;

use crate::error::{Result, VmError};

/// One DST transition rule: the offset (seconds east of UTC) and
/// abbreviation in effect from `from_dayno` onward, until the next
/// transition in the same zone's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Internal day number this rule takes effect.
    pub from_dayno: i64,
    /// Offset east of UTC, in seconds.
    pub offset_secs: i32,
    /// True if this rule represents daylight saving time.
    pub is_dst: bool,
    /// Abbreviation in effect, e.g. `"PST"` / `"PDT"`.
    pub abbrev: String,
}

/// A resolved time zone: a name, a standard/DST offset pair and an
/// optional transition history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneRecord {
    /// IANA-style database name, e.g. `"America/Los_Angeles"`; empty for a
    /// synthetic fixed-offset zone.
    pub name: String,
    /// Standard (non-DST) offset east of UTC, in seconds.
    pub std_offset_secs: i32,
    /// Additional offset applied during DST, in seconds (0 if the zone
    /// never observes DST).
    pub dst_offset_secs: i32,
    /// Standard-time abbreviation, e.g. `"PST"`.
    pub std_abbrev: String,
    /// DST abbreviation, e.g. `"PDT"`; empty if DST is never observed.
    pub dst_abbrev: String,
    /// Transition history, oldest first; empty for a fixed-offset zone.
    pub transitions: Vec<Transition>,
}

impl ZoneRecord {
    /// A zone with a single, permanent fixed offset and no DST.
    pub fn fixed(offset_secs: i32) -> Self {
        Self {
            name: String::new(),
            std_offset_secs: offset_secs,
            dst_offset_secs: 0,
            std_abbrev: format_fixed_abbrev(offset_secs),
            dst_abbrev: String::new(),
            transitions: Vec::new(),
        }
    }

    /// The offset and abbreviation in effect at `dayno`, walking the
    /// zone's history of offset/DST transitions.
    pub fn offset_at(&self, dayno: i64) -> (i32, &str) {
        match self.transitions.iter().rev().find(|t| t.from_dayno <= dayno) {
            Some(t) => (t.offset_secs, &t.abbrev),
            None => (self.std_offset_secs, &self.std_abbrev),
        }
    }
}

fn format_fixed_abbrev(offset_secs: i32) -> String {
    let total_minutes = offset_secs / 60;
    let sign = if total_minutes < 0 { '-' } else { '+' };
    format!("GMT{}{:02}:{:02}", sign, (total_minutes.abs()) / 60, (total_minutes.abs()) % 60)
}

/// A handle to a [`ZoneRecord`] owned by a [`ZoneCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeZone(u32);

/// VM-wide cache of resolved zones, queryable by name, abbreviation or
/// fixed offset, and by the `":local"` sentinel for the host's configured
/// zone.
#[derive(Default)]
pub struct ZoneCache {
    records: Vec<ZoneRecord>,
    by_name: HashMap<String, u32>,
    by_abbrev: HashMap<String, u32>,
    local: Option<u32>,
}

impl ZoneCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named zone (from the host's zone database), returning
    /// its handle.
    pub fn register(&mut self, record: ZoneRecord) -> TimeZone {
        let idx = self.records.len() as u32;
        if !record.name.is_empty() {
            self.by_name.insert(record.name.clone(), idx);
        }
        if !record.std_abbrev.is_empty() {
            self.by_abbrev.entry(record.std_abbrev.clone()).or_insert(idx);
        }
        if !record.dst_abbrev.is_empty() {
            self.by_abbrev.entry(record.dst_abbrev.clone()).or_insert(idx);
        }
        self.records.push(record);
        TimeZone(idx)
    }

    /// Designate a previously-registered zone as the host's local zone,
    /// resolved by the `":local"` sentinel.
    pub fn set_local(&mut self, zone: TimeZone) {
        self.local = Some(zone.0);
    }

    /// Resolve a query string: an IANA name, an abbreviation, or the
    /// `":local"` sentinel. Does not parse fixed `GMT±HH:MM` offsets —
    /// callers check for that syntax first and use
    /// [`Self::fixed_offset`] instead.
    pub fn lookup(&self, query: &str) -> Result<TimeZone> {
        if query == ":local" {
            return self.local.map(TimeZone).ok_or_else(|| VmError::UnknownZone(query.to_string()));
        }
        if let Some(&idx) = self.by_name.get(query) {
            return Ok(TimeZone(idx));
        }
        if let Some(&idx) = self.by_abbrev.get(query) {
            return Ok(TimeZone(idx));
        }
        Err(VmError::UnknownZone(query.to_string()))
    }

    /// Resolve (and cache) a fixed GMT offset in seconds, synthesizing a
    /// nameless zone the first time a given offset is requested.
    pub fn fixed_offset(&mut self, offset_secs: i32) -> TimeZone {
        let abbrev = format_fixed_abbrev(offset_secs);
        if let Some(&idx) = self.by_abbrev.get(&abbrev) {
            return TimeZone(idx);
        }
        self.register(ZoneRecord::fixed(offset_secs))
    }

    /// The record behind a handle.
    pub fn record(&self, zone: TimeZone) -> &ZoneRecord {
        &self.records[zone.0 as usize]
    }

    /// Restore a zone from its serialized (offset, offset, abbrev, name)
    /// tuple. If `name` is non-empty
    /// but unknown to `lookup`, a synthetic zone with the saved offsets is
    /// registered so dates continue to format usefully.
    pub fn restore(&mut self, std_offset_secs: i32, dst_offset_secs: i32, std_abbrev: &str, name: &str) -> TimeZone {
        if !name.is_empty() {
            if let Ok(zone) = self.lookup(name) {
                return zone;
            }
        }
        self.register(ZoneRecord {
            name: name.to_string(),
            std_offset_secs,
            dst_offset_secs,
            std_abbrev: std_abbrev.to_string(),
            dst_abbrev: String::new(),
            transitions: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_offset_round_trips_through_save_restore() {
        let mut cache = ZoneCache::new();
        let zone = cache.fixed_offset(-8 * 3600);
        let record = cache.record(zone).clone();
        let restored = cache.restore(record.std_offset_secs, record.dst_offset_secs, &record.std_abbrev, &record.name);
        assert_eq!(cache.record(restored).std_offset_secs, -8 * 3600);
    }

    #[test]
    fn unknown_name_restores_as_synthetic_zone() {
        let mut cache = ZoneCache::new();
        let zone = cache.restore(3600, 0, "CET", "Europe/Nowhere");
        assert_eq!(cache.record(zone).std_offset_secs, 3600);
    }

    #[test]
    fn local_sentinel_resolves_designated_zone() {
        let mut cache = ZoneCache::new();
        let zone = cache.register(ZoneRecord::fixed(0));
        cache.set_local(zone);
        assert_eq!(cache.lookup(":local").unwrap(), zone);
    }

    #[test]
    fn abbreviation_lookup_finds_registered_zone() {
        let mut cache = ZoneCache::new();
        let zone = cache.register(ZoneRecord {
            name: "America/Los_Angeles".into(),
            std_offset_secs: -8 * 3600,
            dst_offset_secs: 3600,
            std_abbrev: "PST".into(),
            dst_abbrev: "PDT".into(),
            transitions: Vec::new(),
        });
        assert_eq!(cache.lookup("PDT").unwrap(), zone);
    }
}
