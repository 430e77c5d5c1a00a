//! Inline cache data recorded per call site of hot methods.

use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::ProfileIndex;

/// Maximum number of distinct receiver classes kept per call site. A site
/// that sees more becomes megamorphic.
pub const MAX_INLINE_CACHE_CLASSES: usize = 5;

/// A class referenced from an inline cache.
///
/// The owning dex file is encoded as its profile index within the same store
/// rather than as a full (location, checksum) reference. Receivers may live
/// in a different dex file than the calling method, so the index is not
/// necessarily the caller's.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClassReference {
    /// The profile index of the dex file declaring the class.
    pub dex_profile_index: ProfileIndex,
    /// The type index of the class within that dex file.
    pub type_index: u16,
}

/// The receiver types observed at a single call site.
///
/// The two degenerate markers dominate concrete types: once a site is
/// megamorphic it stays megamorphic, and missing types dominate both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DexPcData {
    /// The concrete receiver types seen at the site, ordered and unique.
    Types(SmallVec<[ClassReference; MAX_INLINE_CACHE_CLASSES]>),
    /// The site saw more distinct receiver types than the cache tracks.
    Megamorphic,
    /// Receiver types were observed but could not be recorded, e.g. because
    /// they belong to a dex file that is not tracked for profiling.
    MissingTypes,
}

impl Default for DexPcData {
    fn default() -> Self {
        DexPcData::Types(SmallVec::new())
    }
}

impl DexPcData {
    /// The recorded receiver classes. Empty for degenerate sites.
    pub fn classes(&self) -> &[ClassReference] {
        match self {
            DexPcData::Types(classes) => classes,
            _ => &[],
        }
    }

    /// Whether the site is megamorphic.
    pub fn is_megamorphic(&self) -> bool {
        matches!(self, DexPcData::Megamorphic)
    }

    /// Whether receiver types were missing at the site.
    pub fn is_missing_types(&self) -> bool {
        matches!(self, DexPcData::MissingTypes)
    }

    /// Adds a receiver class, upgrading the site to megamorphic when the
    /// class count would exceed [`MAX_INLINE_CACHE_CLASSES`].
    pub fn add_class(&mut self, dex_profile_index: ProfileIndex, type_index: u16) {
        let DexPcData::Types(classes) = self else {
            return;
        };
        let class = ClassReference {
            dex_profile_index,
            type_index,
        };
        if let Err(position) = classes.binary_search(&class) {
            if classes.len() + 1 > MAX_INLINE_CACHE_CLASSES {
                *self = DexPcData::Megamorphic;
            } else {
                classes.insert(position, class);
            }
        }
    }

    /// Marks the site megamorphic. Missing types dominate.
    pub fn set_megamorphic(&mut self) {
        if !self.is_missing_types() {
            *self = DexPcData::Megamorphic;
        }
    }

    /// Marks the site as having missing types. Dominates everything.
    pub fn set_missing_types(&mut self) {
        *self = DexPcData::MissingTypes;
    }

    /// Merges another site into this one, passing the other site's class
    /// references through `map` to rewrite their profile indices.
    pub(crate) fn merge_mapped(
        &mut self,
        other: &DexPcData,
        map: impl Fn(ProfileIndex) -> ProfileIndex,
    ) {
        match other {
            DexPcData::MissingTypes => self.set_missing_types(),
            DexPcData::Megamorphic => self.set_megamorphic(),
            DexPcData::Types(classes) => {
                for class in classes {
                    self.add_class(map(class.dex_profile_index), class.type_index);
                }
            }
        }
    }
}

/// The inline caches of one method, keyed by bytecode offset.
pub type InlineCacheMap = BTreeMap<u16, DexPcData>;

/// The hot methods of one dex file and their inline caches, keyed by method
/// index.
pub type MethodMap = BTreeMap<u16, InlineCacheMap>;

#[cfg(test)]
mod tests {
    use super::*;

    fn class(dex: ProfileIndex, type_index: u16) -> ClassReference {
        ClassReference {
            dex_profile_index: dex,
            type_index,
        }
    }

    #[test]
    fn classes_stay_ordered_and_unique() {
        let mut data = DexPcData::default();
        data.add_class(0, 7);
        data.add_class(0, 3);
        data.add_class(0, 7);
        assert_eq!(data.classes(), &[class(0, 3), class(0, 7)]);
    }

    #[test]
    fn sixth_class_turns_megamorphic() {
        let mut data = DexPcData::default();
        for type_index in 0..5 {
            data.add_class(0, type_index);
        }
        assert_eq!(data.classes().len(), MAX_INLINE_CACHE_CLASSES);
        assert!(!data.is_megamorphic());

        // Re-adding a known class is not growth.
        data.add_class(0, 4);
        assert!(!data.is_megamorphic());

        data.add_class(0, 5);
        assert!(data.is_megamorphic());
        assert!(data.classes().is_empty());
    }

    #[test]
    fn missing_types_dominates_megamorphic() {
        let mut data = DexPcData::default();
        data.set_missing_types();
        data.set_megamorphic();
        assert!(data.is_missing_types());

        let mut data = DexPcData::default();
        data.set_megamorphic();
        data.set_missing_types();
        assert!(data.is_missing_types());
    }

    #[test]
    fn degenerate_sites_ignore_classes() {
        let mut data = DexPcData::Megamorphic;
        data.add_class(0, 1);
        assert!(data.is_megamorphic());
        assert!(data.classes().is_empty());
    }

    #[test]
    fn merge_remaps_profile_indices() {
        let mut target = DexPcData::default();
        let mut source = DexPcData::default();
        source.add_class(1, 42);
        target.merge_mapped(&source, |index| index + 5);
        assert_eq!(target.classes(), &[class(6, 42)]);
    }
}
