//! The per-VM aggregate of runtime state the core metaclasses share:
//! object table, undo journal, metaclass registry, `BigNumber` constant
//! cache/register pool, and the date subsystem's zone cache and locale.
//! Pieces this crate owns outright (object identity, undo, registry
//! bookkeeping, `BigNumber` scratch state) live directly on [`VmContext`].
//! Pieces that are inherently host-specific — wall-clock time, the zone
//! database behind named zones the host hasn't already registered — are
//! expressed as traits the embedder implements.

use crate::bignum::cache::{ConstantCache, RegisterPool};
use crate::date::format::Locale;
use crate::date::timezone::ZoneCache;
use crate::object_table::ObjectTable;
use crate::registry::MetaclassRegistry;
use crate::undo::UndoJournal;

/// Unix-epoch wall-clock time at nanosecond precision, used only to seed
/// now-based constructs.
pub trait HostClock {
    /// Current time as (seconds, nanoseconds) since the Unix epoch.
    fn now(&self) -> (i64, u32);
}

/// The host's time zone database, consulted when a name isn't already in
/// the VM's [`ZoneCache`].
pub trait ZoneDatabase {
    /// Resolve an IANA-style name to a zone record, if the host's database
    /// has one.
    fn parse_zone(&self, name: &str) -> Option<crate::date::ZoneRecord>;

    /// The host's own configured local zone.
    fn local_zone(&self) -> crate::date::ZoneRecord;
}

/// The per-VM aggregate every core metaclass operation is threaded
/// through.
pub struct VmContext<C: HostClock, Z: ZoneDatabase> {
    pub objects: ObjectTable,
    pub undo: UndoJournal,
    pub registry: MetaclassRegistry,
    pub bignum_constants: ConstantCache,
    pub bignum_registers: RegisterPool,
    pub zones: ZoneCache,
    pub locale: Locale,
    clock: C,
    zone_db: Z,
}

impl<C: HostClock, Z: ZoneDatabase> VmContext<C, Z> {
    /// Build a fresh context over the VM-init-time descriptor set, wiring
    /// in the host's clock and zone database and registering the host's
    /// local zone under the `":local"` sentinel.
    pub fn new(descriptors: Vec<crate::registry::MetaclassDescriptor>, clock: C, zone_db: Z) -> Self {
        let mut zones = ZoneCache::new();
        let local = zones.register(zone_db.local_zone());
        zones.set_local(local);

        Self {
            objects: ObjectTable::new(),
            undo: UndoJournal::new(),
            registry: MetaclassRegistry::new(descriptors),
            bignum_constants: ConstantCache::new(),
            bignum_registers: RegisterPool::new(),
            zones,
            locale: Locale::default(),
            clock,
            zone_db,
        }
    }

    /// Current wall-clock time, via the host collaborator.
    pub fn now(&self) -> (i64, u32) {
        self.clock.now()
    }

    /// Resolve `name` against the live cache, falling back to the host's
    /// zone database and registering the result on success.
    pub fn resolve_zone(&mut self, name: &str) -> crate::error::Result<crate::date::TimeZone> {
        if let Ok(zone) = self.zones.lookup(name) {
            return Ok(zone);
        }
        match self.zone_db.parse_zone(name) {
            Some(record) => Ok(self.zones.register(record)),
            None => Err(crate::error::VmError::UnknownZone(name.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::ZoneRecord;

    struct FixedClock;
    impl HostClock for FixedClock {
        fn now(&self) -> (i64, u32) {
            (1_700_000_000, 0)
        }
    }

    struct EmptyZoneDb;
    impl ZoneDatabase for EmptyZoneDb {
        fn parse_zone(&self, _name: &str) -> Option<ZoneRecord> {
            None
        }

        fn local_zone(&self) -> ZoneRecord {
            ZoneRecord::fixed(0)
        }
    }

    #[test]
    fn local_sentinel_resolves_to_registered_local_zone() {
        let mut vm = VmContext::new(crate::registry::builtin_descriptors(), FixedClock, EmptyZoneDb);
        assert!(vm.resolve_zone(":local").is_ok());
    }

    #[test]
    fn unknown_zone_name_falls_through_to_the_host_database() {
        let mut vm = VmContext::new(crate::registry::builtin_descriptors(), FixedClock, EmptyZoneDb);
        assert!(vm.resolve_zone("Nowhere/Nonexistent").is_err());
    }

    #[test]
    fn clock_reports_the_injected_time() {
        let vm = VmContext::new(crate::registry::builtin_descriptors(), FixedClock, EmptyZoneDb);
        assert_eq!(vm.now().0, 1_700_000_000);
    }
}
