//! Metaclass registry: descriptor table, per-image dependency table, and
//! the property→function-index translation used on every property fetch.
//!
//! Descriptors are registered once at VM start-up (a closed set known
//! ahead of time, so a `Vec` with linear lookup by name is the right
//! structure, and the registry is consulted once per image load plus
//! once per property dispatch, never in a hot numeric loop).

mod descriptor;
mod dispatch;

pub use descriptor::{builtin_descriptors, FuncIndex, MetaclassDescriptor};
pub use dispatch::DispatchOutcome;

use tracing::{debug, warn};

use crate::error::{Result, VmError};
use crate::value::{ObjectId, PropId, V};

/// One binding from an image-file dependency slot to a host descriptor.
pub struct RegistryEntry {
    /// The exact name string from the image, preserved verbatim for re-save.
    pub image_meta_name: String,
    /// Index into [`MetaclassRegistry::descriptors`].
    pub descriptor_index: usize,
    /// The `IntrinsicClass` object representing this class in the program,
    /// or `None` until created on demand.
    pub class_obj: Option<ObjectId>,
    min_prop: u16,
    /// `prop_xlat[p - min_prop]` is the 1-based function index for property
    /// `p`, or 0 if unmapped.
    prop_xlat: Vec<u16>,
    /// `func_xlat[i - 1]` is the property id mapped to function index `i`.
    func_xlat: Vec<Option<PropId>>,
}

impl RegistryEntry {
    /// Translate a property id to a 1-based function index, or `None` if
    /// the property is out of range or unmapped for this class.
    pub fn prop_to_func_index(&self, prop: PropId) -> Option<FuncIndex> {
        let p = prop.get();
        if p < self.min_prop {
            return None;
        }
        let offset = (p - self.min_prop) as usize;
        let idx = *self.prop_xlat.get(offset)?;
        FuncIndex::new(idx)
    }

    /// Translate a 1-based function index back to the property id that maps
    /// to it (the inverse of [`Self::prop_to_func_index`]).
    pub fn func_index_to_prop(&self, index: FuncIndex) -> Option<PropId> {
        self.func_xlat.get(index.get() as usize - 1).copied().flatten()
    }

    /// Serializable view of the function→property inverse table, used by
    /// save: it is a smaller and equivalent representation of the
    /// property→function-index bindings.
    pub fn func_xlat(&self) -> &[Option<PropId>] {
        &self.func_xlat
    }
}

/// One `(prop, func_index)` binding from an image dependency record.
#[derive(Debug, Clone, Copy)]
pub struct PropMapping {
    /// The property id.
    pub prop: PropId,
    /// The 1-based function index it dispatches to.
    pub func_index: u16,
}

/// A parsed image-file dependency record, prior to registry resolution.
pub struct DependencyRecord {
    /// `name_with_version`, e.g. `"bignumber/030000"`.
    pub name_with_version: String,
    /// Number of functions the descriptor exposes, per the image.
    pub func_count: u16,
    /// Lowest property id mapped by this record.
    pub min_prop: u16,
    /// Highest property id mapped by this record.
    pub max_prop: u16,
    /// The explicit `(prop, func_index)` pairs.
    pub prop_map: Vec<PropMapping>,
}

/// Parses a `"base/version"` metaclass name into its parts. A missing
/// version segment defaults to `"000000"`.
pub fn parse_name_with_version(name: &str) -> (&str, &str) {
    match name.split_once('/') {
        Some((base, version)) => (base, version),
        None => (name, "000000"),
    }
}

/// The global metaclass registry: the static descriptor table plus the
/// per-load dependency table built while loading one image.
pub struct MetaclassRegistry {
    descriptors: Vec<MetaclassDescriptor>,
    entries: Vec<RegistryEntry>,
    /// `reverse_map[descriptor_index]` is the index into `entries` for the
    /// descriptor actually referenced by the current image, or `None`.
    reverse_map: Vec<Option<usize>>,
}

impl MetaclassRegistry {
    /// Create a registry over the (fixed, VM-init-time) set of descriptors.
    pub fn new(descriptors: Vec<MetaclassDescriptor>) -> Self {
        let reverse_map = vec![None; descriptors.len()];
        Self {
            descriptors,
            entries: Vec::new(),
            reverse_map,
        }
    }

    /// Descriptor table, by index.
    pub fn descriptors(&self) -> &[MetaclassDescriptor] {
        &self.descriptors
    }

    /// Find a descriptor index by base name (ignoring version).
    fn find_descriptor(&self, base: &str) -> Option<usize> {
        self.descriptors.iter().position(|d| d.base_name() == base)
    }

    /// Resolve one image dependency record into a registry entry.
    pub fn load_dependency(&mut self, record: DependencyRecord) -> Result<usize> {
        let (base, version) = parse_name_with_version(&record.name_with_version);

        let descriptor_index = self.find_descriptor(base).ok_or_else(|| {
            let err = VmError::UnknownMetaclass {
                name: record.name_with_version.clone(),
                version_error: true,
            };
            warn!(name = %record.name_with_version, kind = %err.kind(), "unknown metaclass referenced by image");
            err
        })?;

        let descriptor = &self.descriptors[descriptor_index];
        if descriptor.version() < version {
            let err = VmError::MetaclassTooOld {
                name: record.name_with_version.clone(),
                version_error: true,
            };
            warn!(
                name = %record.name_with_version,
                host_version = %descriptor.version(),
                kind = %err.kind(),
                "image requires a metaclass version newer than the host provides",
            );
            return Err(err);
        }

        let span = (record.max_prop - record.min_prop + 1) as usize;
        let mut prop_xlat = vec![0u16; span];
        let mut func_xlat: Vec<Option<PropId>> = vec![None; record.func_count as usize];

        for mapping in &record.prop_map {
            let offset = (mapping.prop.get() - record.min_prop) as usize;
            if let Some(slot) = prop_xlat.get_mut(offset) {
                *slot = mapping.func_index;
            }
            if let Some(slot) = func_xlat.get_mut(mapping.func_index as usize - 1) {
                *slot = Some(mapping.prop);
            }
        }

        let entry_index = self.entries.len();
        self.entries.push(RegistryEntry {
            image_meta_name: record.name_with_version,
            descriptor_index,
            class_obj: None,
            min_prop: record.min_prop,
            prop_xlat,
            func_xlat,
        });
        self.reverse_map[descriptor_index] = Some(entry_index);

        debug!(descriptor_index, entry_index, "bound metaclass dependency");
        Ok(entry_index)
    }

    /// Look up the entry bound to a descriptor index, if the current image
    /// actually references that descriptor.
    pub fn entry_for_descriptor(&self, descriptor_index: usize) -> Option<&RegistryEntry> {
        self.reverse_map.get(descriptor_index).copied().flatten().map(|i| &self.entries[i])
    }

    /// Mutable variant of [`Self::entry_for_descriptor`].
    pub fn entry_for_descriptor_mut(&mut self, descriptor_index: usize) -> Option<&mut RegistryEntry> {
        let idx = self.reverse_map.get(descriptor_index).copied().flatten()?;
        self.entries.get_mut(idx)
    }

    /// Entries by index (as bound in the current image load).
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Translate a property fetch for an instance of `descriptor_index`
    /// into the function index to call. Returns
    /// [`DispatchOutcome::NotFound`] (not an error) if the descriptor is
    /// unreferenced or the property is unmapped.
    pub fn resolve_prop(&self, descriptor_index: usize, prop: PropId) -> DispatchOutcome {
        match self.entry_for_descriptor(descriptor_index) {
            None => DispatchOutcome::NotFound,
            Some(entry) => match entry.prop_to_func_index(prop) {
                None => DispatchOutcome::NotFound,
                Some(idx) => DispatchOutcome::Found(idx),
            },
        }
    }

    /// Ensure the entry bound to `descriptor_index` has a class object,
    /// creating one via `allocate` if it doesn't. Dynamically created
    /// class objects are pinned as machine globals.
    pub fn ensure_class_obj(&mut self, descriptor_index: usize, allocate: impl FnOnce() -> ObjectId) -> Option<ObjectId> {
        let entry = self.entry_for_descriptor_mut(descriptor_index)?;
        if entry.class_obj.is_none() {
            entry.class_obj = Some(allocate());
        }
        entry.class_obj
    }
}

/// A serializable snapshot of one dependency table's bindings, written on
/// save and consumed on restore.
pub struct SavedRegistryEntry {
    /// Exact image name string.
    pub name: String,
    /// The class object id, if one had been created.
    pub class_obj: Option<u32>,
    /// Function→property inverse table.
    pub func_xlat: Vec<Option<u16>>,
}

impl MetaclassRegistry {
    /// Produce the save payload for every bound entry.
    pub fn snapshot_for_save(&self) -> Vec<SavedRegistryEntry> {
        self.entries
            .iter()
            .map(|e| SavedRegistryEntry {
                name: e.image_meta_name.clone(),
                class_obj: e.class_obj.map(ObjectId::get),
                func_xlat: e.func_xlat.iter().map(|p| p.map(PropId::get)).collect(),
            })
            .collect()
    }

    /// Rebuild the dependency table from a save payload. Any saved entry not
    /// already present in the current image baseline is recreated.
    pub fn restore_from_snapshot(&mut self, saved: Vec<SavedRegistryEntry>) -> Result<()> {
        for s in saved {
            let (base, version) = parse_name_with_version(&s.name);
            let descriptor_index = self.find_descriptor(base).ok_or_else(|| VmError::UnknownMetaclass {
                name: s.name.clone(),
                version_error: true,
            })?;
            if self.descriptors[descriptor_index].version() < version {
                return Err(VmError::MetaclassTooOld {
                    name: s.name.clone(),
                    version_error: true,
                });
            }

            if self.reverse_map[descriptor_index].is_some() {
                continue;
            }

            let func_xlat: Vec<Option<PropId>> = s.func_xlat.iter().map(|p| p.and_then(PropId::new)).collect();
            let max_func = func_xlat.len() as u16;
            let mut prop_map = Vec::new();
            for (i, prop) in func_xlat.iter().enumerate() {
                if let Some(p) = prop {
                    prop_map.push(PropMapping {
                        prop: *p,
                        func_index: i as u16 + 1,
                    });
                }
            }
            let min_prop = prop_map.iter().map(|m| m.prop.get()).min().unwrap_or(0);
            let max_prop = prop_map.iter().map(|m| m.prop.get()).max().unwrap_or(0);

            let entry_index = self.load_dependency(DependencyRecord {
                name_with_version: s.name,
                func_count: max_func,
                min_prop,
                max_prop,
                prop_map,
            })?;
            self.entries[entry_index].class_obj = s.class_obj.and_then(ObjectId::new);
        }
        Ok(())
    }
}

/// Return type for property getters: `Ok` on success, or the dispatch
/// outcome (`NotFound`) callers use to continue up the general object
/// model's inheritance chain rather than treat as an error.
pub type PropGetResult = std::result::Result<V, DispatchOutcome>;
