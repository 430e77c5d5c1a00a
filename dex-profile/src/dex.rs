//! Descriptors for the dex files a profile refers to.

use std::cmp::Ordering;

/// A loadable code unit, as reported by its loader.
///
/// The profile never inspects dex bytecode; it only needs the location (for
/// key derivation), the location checksum and the sizes of the method and
/// type tables (for bounds checks).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DexFile {
    location: String,
    checksum: u32,
    num_method_ids: u32,
    num_type_ids: u32,
}

impl DexFile {
    /// Creates a new dex file descriptor.
    pub fn new(
        location: impl Into<String>,
        checksum: u32,
        num_method_ids: u32,
        num_type_ids: u32,
    ) -> Self {
        Self {
            location: location.into(),
            checksum,
            num_method_ids,
            num_type_ids,
        }
    }

    /// The location string of this dex file.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The location checksum of this dex file.
    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    /// The number of method slots this dex file declares.
    pub fn num_method_ids(&self) -> u32 {
        self.num_method_ids
    }

    /// The number of type slots this dex file declares.
    pub fn num_type_ids(&self) -> u32 {
        self.num_type_ids
    }
}

/// A method in a dex file.
#[derive(Clone, Copy, Debug)]
pub struct MethodReference<'a> {
    /// The dex file declaring the method.
    pub dex_file: &'a DexFile,
    /// The method index within the dex file's method table.
    pub index: u16,
}

impl MethodReference<'_> {
    fn sort_key(&self) -> (&str, u32, u16) {
        (self.dex_file.location(), self.dex_file.checksum(), self.index)
    }
}

impl PartialEq for MethodReference<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for MethodReference<'_> {}

impl PartialOrd for MethodReference<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MethodReference<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// A class in a dex file.
#[derive(Clone, Copy, Debug)]
pub struct TypeReference<'a> {
    /// The dex file declaring the type.
    pub dex_file: &'a DexFile,
    /// The type index within the dex file's type table.
    pub type_index: u16,
}

impl TypeReference<'_> {
    fn sort_key(&self) -> (&str, u32, u16) {
        (
            self.dex_file.location(),
            self.dex_file.checksum(),
            self.type_index,
        )
    }
}

impl PartialEq for TypeReference<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for TypeReference<'_> {}

impl PartialOrd for TypeReference<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeReference<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

/// Inline cache observations for a single call site of a method.
#[derive(Clone, Debug, Default)]
pub struct ProfileInlineCache<'a> {
    /// The bytecode offset of the call site.
    pub dex_pc: u16,
    /// The receiver types could not be recorded.
    pub is_missing_types: bool,
    /// The call site saw more receiver types than an inline cache tracks.
    pub is_megamorphic: bool,
    /// The receiver types observed at the call site.
    pub classes: Vec<TypeReference<'a>>,
}

/// A method together with its raw inline cache observations, in a shape
/// convenient to pass around without holding runtime structures.
#[derive(Clone, Debug)]
pub struct ProfileMethodInfo<'a> {
    /// The profiled method.
    pub reference: MethodReference<'a>,
    /// Inline caches observed for the method, one entry per call site.
    pub inline_caches: Vec<ProfileInlineCache<'a>>,
}

impl<'a> ProfileMethodInfo<'a> {
    /// Creates a method info without inline caches.
    pub fn new(reference: MethodReference<'a>) -> Self {
        Self {
            reference,
            inline_caches: Vec::new(),
        }
    }
}
