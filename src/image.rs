//! Binary codecs for the per-object image-file and save-file payloads.
//! All multi-byte fields are big-endian, matching the host VM's image
//! container format; `byteorder`'s `Read`/`WriteBytesExt` extension traits
//! keep each field read/write a single expression the way a hand-rolled
//! big-endian cursor reader would.

use std::io::{self, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::bignum::BigNumber;
use crate::date::Date;
use crate::value::PropId;

/// Obfuscation XOR applied to each dictionary key byte on disk.
const DICT_KEY_XOR: u8 = 0xBD;

fn io_err(e: io::Error) -> crate::error::VmError {
    crate::error::VmError::BadValBif(e.to_string())
}

/// Read a byte-length-prefixed string.
fn read_short_string<R: Read>(r: &mut R) -> crate::error::Result<String> {
    let len = r.read_u8().map_err(io_err)? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf).map_err(io_err)?;
    String::from_utf8(buf).map_err(|e| crate::error::VmError::BadValBif(e.to_string()))
}

fn write_short_string<W: Write>(w: &mut W, s: &str) -> crate::error::Result<()> {
    let bytes = s.as_bytes();
    w.write_u8(bytes.len() as u8).map_err(io_err)?;
    w.write_all(bytes).map_err(io_err)
}

/// Write a `BigNumber`'s image payload: `digits`, `exp`, `flags`, then the
/// packed-BCD mantissa.
pub fn write_bignumber<W: Write>(w: &mut W, value: &BigNumber) -> crate::error::Result<()> {
    w.write_u16::<BigEndian>(value.precision()).map_err(io_err)?;
    w.write_i16::<BigEndian>(value.exp_raw()).map_err(io_err)?;
    w.write_u8(value.flags_byte()).map_err(io_err)?;
    w.write_all(&value.to_packed_bcd()).map_err(io_err)
}

/// Read a `BigNumber`'s image payload.
pub fn read_bignumber<R: Read>(r: &mut R) -> crate::error::Result<BigNumber> {
    let digits = r.read_u16::<BigEndian>().map_err(io_err)?;
    let exp = r.read_i16::<BigEndian>().map_err(io_err)?;
    let flags = r.read_u8().map_err(io_err)?;
    let mut packed = vec![0u8; digits.div_ceil(2) as usize];
    r.read_exact(&mut packed).map_err(io_err)?;
    Ok(BigNumber::from_packed_bcd(digits, exp, flags, &packed))
}

/// Write a `Date`'s image payload: signed `dayno`, unsigned `daytime`.
pub fn write_date<W: Write>(w: &mut W, value: &Date) -> crate::error::Result<()> {
    w.write_i32::<BigEndian>(value.dayno() as i32).map_err(io_err)?;
    w.write_u32::<BigEndian>(value.daytime() as u32).map_err(io_err)
}

/// Read a `Date`'s image payload.
pub fn read_date<R: Read>(r: &mut R) -> crate::error::Result<Date> {
    let dayno = r.read_i32::<BigEndian>().map_err(io_err)? as i64;
    let daytime = r.read_u32::<BigEndian>().map_err(io_err)? as i64;
    Ok(Date::new(dayno, daytime))
}

/// Serialized form of a `TimeZone`'s image/save payload; the saved name
/// may be the `":local"` sentinel. Also derives `serde` (Serialize,
/// Deserialize) behind the `serde` feature for tooling that wants a
/// human-readable snapshot (a debug dump, a test fixture) rather than the
/// packed binary form `write_timezone`/`read_timezone` produce.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZonePayload {
    pub gmt_ofs_ms: i32,
    pub dst_ofs_ms: i32,
    pub abbreviation: String,
    pub name: String,
}

/// Write a `TimeZone`'s payload.
pub fn write_timezone<W: Write>(w: &mut W, zone: &ZonePayload) -> crate::error::Result<()> {
    w.write_i32::<BigEndian>(zone.gmt_ofs_ms).map_err(io_err)?;
    w.write_i32::<BigEndian>(zone.dst_ofs_ms).map_err(io_err)?;
    write_short_string(w, &zone.abbreviation)?;
    write_short_string(w, &zone.name)
}

/// Read a `TimeZone`'s payload.
pub fn read_timezone<R: Read>(r: &mut R) -> crate::error::Result<ZonePayload> {
    let gmt_ofs_ms = r.read_i32::<BigEndian>().map_err(io_err)?;
    let dst_ofs_ms = r.read_i32::<BigEndian>().map_err(io_err)?;
    let abbreviation = read_short_string(r)?;
    let name = read_short_string(r)?;
    Ok(ZonePayload { gmt_ofs_ms, dst_ofs_ms, abbreviation, name })
}

/// One dictionary entry as it appears on disk: a key plus its
/// `(obj_id, prop_id)` associations.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DictEntryPayload {
    pub key: String,
    pub items: Vec<(u32, u16)>,
}

/// Write a `Dictionary`'s image/save payload.
pub fn write_dictionary<W: Write>(w: &mut W, comparator_obj_id: u32, entries: &[DictEntryPayload]) -> crate::error::Result<()> {
    w.write_u32::<BigEndian>(comparator_obj_id).map_err(io_err)?;
    w.write_u16::<BigEndian>(entries.len() as u16).map_err(io_err)?;
    for entry in entries {
        let key_bytes = entry.key.as_bytes();
        w.write_u8(key_bytes.len() as u8).map_err(io_err)?;
        for &b in key_bytes {
            w.write_u8(b ^ DICT_KEY_XOR).map_err(io_err)?;
        }
        w.write_u16::<BigEndian>(entry.items.len() as u16).map_err(io_err)?;
        for &(obj_id, prop_id) in &entry.items {
            w.write_u32::<BigEndian>(obj_id).map_err(io_err)?;
            w.write_u16::<BigEndian>(prop_id).map_err(io_err)?;
        }
    }
    Ok(())
}

/// Read a `Dictionary`'s image/save payload.
pub fn read_dictionary<R: Read>(r: &mut R) -> crate::error::Result<(u32, Vec<DictEntryPayload>)> {
    let comparator_obj_id = r.read_u32::<BigEndian>().map_err(io_err)?;
    let entry_count = r.read_u16::<BigEndian>().map_err(io_err)?;
    let mut entries = Vec::with_capacity(entry_count as usize);
    for _ in 0..entry_count {
        let key_len = r.read_u8().map_err(io_err)? as usize;
        let mut key_bytes = vec![0u8; key_len];
        r.read_exact(&mut key_bytes).map_err(io_err)?;
        for b in &mut key_bytes {
            *b ^= DICT_KEY_XOR;
        }
        let key = String::from_utf8(key_bytes).map_err(|e| crate::error::VmError::BadValBif(e.to_string()))?;
        let item_count = r.read_u16::<BigEndian>().map_err(io_err)?;
        let mut items = Vec::with_capacity(item_count as usize);
        for _ in 0..item_count {
            let obj_id = r.read_u32::<BigEndian>().map_err(io_err)?;
            let prop_id = r.read_u16::<BigEndian>().map_err(io_err)?;
            items.push((obj_id, prop_id));
        }
        entries.push(DictEntryPayload { key, items });
    }
    Ok((comparator_obj_id, entries))
}

/// Write a `StringBuffer`'s image/save payload: `alo`, `inc`, `len`, then
/// `len` UTF-16-width code points. Code
/// points outside the basic multilingual plane are rejected rather than
/// silently truncated to a surrogate half.
pub fn write_stringbuffer<W: Write>(w: &mut W, alo: u32, inc: u32, chars: &[char]) -> crate::error::Result<()> {
    w.write_u32::<BigEndian>(alo).map_err(io_err)?;
    w.write_u32::<BigEndian>(inc).map_err(io_err)?;
    w.write_u32::<BigEndian>(chars.len() as u32).map_err(io_err)?;
    for &c in chars {
        let code = c as u32;
        if code > 0xFFFF {
            return Err(crate::error::VmError::BadValBif(format!("code point U+{code:X} exceeds 16-bit storage")));
        }
        w.write_u16::<BigEndian>(code as u16).map_err(io_err)?;
    }
    Ok(())
}

/// Read a `StringBuffer`'s image/save payload.
pub fn read_stringbuffer<R: Read>(r: &mut R) -> crate::error::Result<(u32, u32, Vec<char>)> {
    let alo = r.read_u32::<BigEndian>().map_err(io_err)?;
    let inc = r.read_u32::<BigEndian>().map_err(io_err)?;
    let len = r.read_u32::<BigEndian>().map_err(io_err)?;
    let mut chars = Vec::with_capacity(len as usize);
    for _ in 0..len {
        let code = r.read_u16::<BigEndian>().map_err(io_err)?;
        chars.push(char::from_u32(code as u32).unwrap_or(char::REPLACEMENT_CHARACTER));
    }
    Ok((alo, inc, chars))
}

/// One `(prop, func_index)` binding as it appears in a metaclass dependency
/// record.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DependencyPropMapping {
    pub prop: u16,
    pub func_index: u16,
}

/// Write a metaclass dependency record's header plus its function-index
/// table, keyed by property (the image-file form; the alternative
/// save/restore form — `func_count` × property id — is handled by
/// [`crate::registry`]'s own snapshot types).
pub fn write_dependency_record<W: Write>(
    w: &mut W,
    name_with_version: &str,
    func_count: u16,
    min_prop: u16,
    max_prop: u16,
    func_xlat: &[Option<PropId>],
) -> crate::error::Result<()> {
    write_short_string(w, name_with_version)?;
    w.write_u16::<BigEndian>(func_count).map_err(io_err)?;
    w.write_u16::<BigEndian>(min_prop).map_err(io_err)?;
    w.write_u16::<BigEndian>(max_prop).map_err(io_err)?;
    for slot in func_xlat {
        w.write_u16::<BigEndian>(slot.map_or(0, PropId::get)).map_err(io_err)?;
    }
    Ok(())
}

/// Read a metaclass dependency record's header plus its function-index
/// table.
pub fn read_dependency_record<R: Read>(r: &mut R) -> crate::error::Result<(String, u16, u16, u16, Vec<Option<PropId>>)> {
    let name_with_version = read_short_string(r)?;
    let func_count = r.read_u16::<BigEndian>().map_err(io_err)?;
    let min_prop = r.read_u16::<BigEndian>().map_err(io_err)?;
    let max_prop = r.read_u16::<BigEndian>().map_err(io_err)?;
    let span = (max_prop - min_prop + 1) as usize;
    let mut func_xlat = Vec::with_capacity(span);
    for _ in 0..span {
        let raw = r.read_u16::<BigEndian>().map_err(io_err)?;
        func_xlat.push(PropId::new(raw));
    }
    Ok((name_with_version, func_count, min_prop, max_prop, func_xlat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bignumber_round_trips_through_its_payload() {
        let value = BigNumber::from_i32(-4207, Some(12));
        let mut buf = Vec::new();
        write_bignumber(&mut buf, &value).unwrap();
        let restored = read_bignumber(&mut &buf[..]).unwrap();
        assert_eq!(value.to_i32().unwrap(), restored.to_i32().unwrap());
    }

    #[test]
    fn date_round_trips_through_its_payload() {
        let d = Date::new(12345, 67890);
        let mut buf = Vec::new();
        write_date(&mut buf, &d).unwrap();
        let restored = read_date(&mut &buf[..]).unwrap();
        assert_eq!(d, restored);
    }

    #[test]
    fn timezone_round_trips_through_its_payload() {
        let zone = ZonePayload {
            gmt_ofs_ms: -8 * 3_600_000,
            dst_ofs_ms: 3_600_000,
            abbreviation: "PST".to_string(),
            name: "America/Los_Angeles".to_string(),
        };
        let mut buf = Vec::new();
        write_timezone(&mut buf, &zone).unwrap();
        let restored = read_timezone(&mut &buf[..]).unwrap();
        assert_eq!(restored.gmt_ofs_ms, zone.gmt_ofs_ms);
        assert_eq!(restored.name, zone.name);
    }

    #[test]
    fn dictionary_entries_round_trip_with_key_obfuscation_applied() {
        let entries = vec![
            DictEntryPayload { key: "lamp".to_string(), items: vec![(2, 5)] },
            DictEntryPayload { key: "sword".to_string(), items: vec![(3, 5), (3, 6)] },
        ];
        let mut buf = Vec::new();
        write_dictionary(&mut buf, 7, &entries).unwrap();
        // The key bytes on the wire are XORed, not the literal ASCII text.
        assert!(!buf.windows(4).any(|w| w == b"lamp"));
        let (comparator_obj_id, restored) = read_dictionary(&mut &buf[..]).unwrap();
        assert_eq!(comparator_obj_id, 7);
        assert_eq!(restored[0].key, "lamp");
        assert_eq!(restored[1].items, vec![(3, 5), (3, 6)]);
    }

    #[test]
    fn stringbuffer_round_trips_through_its_payload() {
        let chars: Vec<char> = "hello".chars().collect();
        let mut buf = Vec::new();
        write_stringbuffer(&mut buf, 64, 16, &chars).unwrap();
        let (alo, inc, restored) = read_stringbuffer(&mut &buf[..]).unwrap();
        assert_eq!(alo, 64);
        assert_eq!(inc, 16);
        assert_eq!(restored, chars);
    }
}
