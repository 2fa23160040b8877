//! Host-side metaclass descriptors.

use crate::value::V;

/// A 1-based index into a descriptor's intrinsic function vector. Index 0
/// means "no such function" and is therefore never a valid [`FuncIndex`]
/// value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FuncIndex(u16);

impl FuncIndex {
    /// Construct from a raw 1-based index; `0` is rejected.
    pub fn new(raw: u16) -> Option<Self> {
        if raw == 0 {
            None
        } else {
            Some(Self(raw))
        }
    }

    /// The raw 1-based index.
    pub fn get(self) -> u16 {
        self.0
    }
}

/// An intrinsic function implemented by a metaclass: takes the receiver's
/// dynamic state (type-erased by the caller, since each metaclass's state
/// type differs) plus argument values, and returns a value or propagates a
/// [`crate::error::VmError`].
pub type IntrinsicFn<S> = fn(&mut S, &[V]) -> crate::error::Result<V>;

/// Host-side descriptor for one metaclass.
///
/// `name` and `version` are kept apart (rather than as one
/// `"name/version"` string) because version comparisons happen far more
/// often than re-serialization of the combined form.
pub struct MetaclassDescriptor {
    name: &'static str,
    version: &'static str,
    func_count: u16,
}

impl MetaclassDescriptor {
    /// Construct a descriptor. `version` is a fixed-width decimal string
    /// (e.g. `"030000"`) so that lexicographic and numeric ordering agree.
    pub const fn new(name: &'static str, version: &'static str, func_count: u16) -> Self {
        Self { name, version, func_count }
    }

    /// The class's base name, e.g. `"bignumber"`.
    pub fn base_name(&self) -> &str {
        self.name
    }

    /// The host's implemented version string.
    pub fn version(&self) -> &str {
        self.version
    }

    /// `name_with_version`, e.g. `"bignumber/030000"`.
    pub fn name_with_version(&self) -> String {
        format!("{}/{}", self.name, self.version)
    }

    /// Number of entries in this descriptor's intrinsic function vector.
    pub fn func_count(&self) -> u16 {
        self.func_count
    }
}

/// The closed set of metaclasses this crate implements, used to build the
/// registry's descriptor table at VM start-up.
pub fn builtin_descriptors() -> Vec<MetaclassDescriptor> {
    vec![
        MetaclassDescriptor::new("bignumber", "030000", 24),
        MetaclassDescriptor::new("tads-object", "000000", 0),
        MetaclassDescriptor::new("date", "010000", 18),
        MetaclassDescriptor::new("timezone", "010000", 4),
        MetaclassDescriptor::new("dictionary2", "000000", 8),
        MetaclassDescriptor::new("string-buffer", "000000", 10),
    ]
}
