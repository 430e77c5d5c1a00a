//! Per dex file profile storage.

use std::collections::BTreeSet;

use crate::bitmap::MethodBitmap;
use crate::hotness::{MethodFlags, MethodHotness, ProfileKind};
use crate::inline_cache::{InlineCacheMap, MethodMap};
use crate::{ProfileError, ProfileIndex};

/// Profile data of a single (dex file, annotation) pair.
///
/// The profile key is the canonical identity of the record; the profile
/// index is its position in the owning store and the value inline caches use
/// to refer to it.
#[derive(Clone, Debug)]
pub(crate) struct DexFileData {
    /// The augmented profile key this data belongs to.
    pub profile_key: String,
    /// The index of this record in the owning store.
    pub profile_index: ProfileIndex,
    /// The dex location checksum.
    pub checksum: u32,
    /// The number of method slots the dex file declares. Bounds every method
    /// index stored in this record.
    pub num_method_ids: u32,
    /// The kind of the owning store.
    pub kind: ProfileKind,
    /// Inline caches of hot methods.
    pub method_map: MethodMap,
    /// The type indices of profiled classes. Not necessarily a superset of
    /// the classes referenced by inline caches.
    pub class_set: BTreeSet<u16>,
    /// Execution flag bits for all methods.
    pub bitmap: MethodBitmap,
}

impl DexFileData {
    pub fn new(
        profile_key: String,
        profile_index: ProfileIndex,
        checksum: u32,
        num_method_ids: u32,
        kind: ProfileKind,
    ) -> Self {
        Self {
            profile_key,
            profile_index,
            checksum,
            num_method_ids,
            kind,
            method_map: MethodMap::new(),
            class_set: BTreeSet::new(),
            bitmap: MethodBitmap::new(num_method_ids, kind.flag_count()),
        }
    }

    /// Records an execution of the given method with the given flags.
    ///
    /// Hot methods additionally get a method map entry so their inline
    /// caches have somewhere to live.
    pub fn add_method(
        &mut self,
        flags: MethodFlags,
        method_index: u16,
    ) -> Result<(), ProfileError> {
        self.check_method_index(method_index)?;
        if !self.kind.flags_mask().contains(flags) {
            return Err(ProfileError::UnsupportedFlags);
        }
        for flag in flags.iter() {
            self.bitmap.set(flag.bitmap_position(), method_index);
        }
        if flags.contains(MethodFlags::HOT) {
            self.method_map.entry(method_index).or_default();
        }
        Ok(())
    }

    pub fn check_method_index(&self, method_index: u16) -> Result<(), ProfileError> {
        if u32::from(method_index) < self.num_method_ids {
            Ok(())
        } else {
            Err(ProfileError::MethodIndexOutOfRange)
        }
    }

    /// The inline caches of the given hot method, created on demand.
    pub fn find_or_add_hot_method(&mut self, method_index: u16) -> &mut InlineCacheMap {
        debug_assert!(u32::from(method_index) < self.num_method_ids);
        self.method_map.entry(method_index).or_default()
    }

    /// The hotness of the given method. Methods outside the dex file's
    /// method table are simply not in the profile.
    pub fn hotness(&self, method_index: u16) -> MethodHotness<'_> {
        if u32::from(method_index) >= self.num_method_ids {
            return MethodHotness::default();
        }
        let mut flags = MethodFlags::empty();
        for flag in self.kind.flags_mask().iter() {
            if self.bitmap.get(flag.bitmap_position(), method_index) {
                flags |= flag;
            }
        }
        let inline_caches = if flags.contains(MethodFlags::HOT) {
            self.method_map.get(&method_index)
        } else {
            None
        };
        MethodHotness::new(flags, inline_caches)
    }

    pub fn contains_class(&self, type_index: u16) -> bool {
        self.class_set.contains(&type_index)
    }

    /// Whether two records hold the same data, ignoring profile key and
    /// index, and treating inline cache class references as equal when they
    /// agree after mapping this record's store indices through `remap`.
    pub fn logically_equal(&self, other: &DexFileData, remap: &[ProfileIndex]) -> bool {
        if self.checksum != other.checksum
            || self.num_method_ids != other.num_method_ids
            || self.class_set != other.class_set
            || self.bitmap != other.bitmap
            || self.method_map.len() != other.method_map.len()
        {
            return false;
        }
        self.method_map.iter().all(|(method_index, inline_caches)| {
            other.method_map.get(method_index).is_some_and(|theirs| {
                inline_caches.len() == theirs.len()
                    && inline_caches.iter().all(|(dex_pc, data)| {
                        theirs
                            .get(dex_pc)
                            .is_some_and(|their_data| dex_pc_data_equal(data, their_data, remap))
                    })
            })
        })
    }
}

fn dex_pc_data_equal(
    ours: &crate::inline_cache::DexPcData,
    theirs: &crate::inline_cache::DexPcData,
    remap: &[ProfileIndex],
) -> bool {
    use crate::inline_cache::DexPcData;
    match (ours, theirs) {
        (DexPcData::Megamorphic, DexPcData::Megamorphic) => true,
        (DexPcData::MissingTypes, DexPcData::MissingTypes) => true,
        (DexPcData::Types(ours), DexPcData::Types(theirs)) => {
            if ours.len() != theirs.len() {
                return false;
            }
            // Remapping can reorder the set, so compare after re-sorting.
            let mut mapped: Vec<_> = ours
                .iter()
                .filter_map(|class| {
                    remap.get(usize::from(class.dex_profile_index)).map(|&index| {
                        crate::inline_cache::ClassReference {
                            dex_profile_index: index,
                            type_index: class.type_index,
                        }
                    })
                })
                .collect();
            if mapped.len() != ours.len() {
                return false;
            }
            mapped.sort_unstable();
            mapped.iter().eq(theirs.iter())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(num_method_ids: u32) -> DexFileData {
        DexFileData::new(
            "base.apk".to_owned(),
            0,
            0x1234,
            num_method_ids,
            ProfileKind::Regular,
        )
    }

    #[test]
    fn add_method_sets_flags_and_method_map() {
        let mut data = record(100);
        data.add_method(MethodFlags::HOT | MethodFlags::STARTUP, 7).unwrap();

        let hotness = data.hotness(7);
        assert!(hotness.is_hot());
        assert!(hotness.is_startup());
        assert!(!hotness.is_post_startup());
        assert!(hotness.inline_caches().is_some());

        // Startup-only methods carry no inline caches.
        data.add_method(MethodFlags::STARTUP, 8).unwrap();
        let hotness = data.hotness(8);
        assert!(hotness.is_in_profile());
        assert!(!hotness.is_hot());
        assert!(hotness.inline_caches().is_none());
    }

    #[test]
    fn add_method_rejects_out_of_range_index() {
        let mut data = record(10);
        assert!(matches!(
            data.add_method(MethodFlags::HOT, 10),
            Err(ProfileError::MethodIndexOutOfRange)
        ));
        assert!(!data.hotness(9).is_in_profile());
    }

    #[test]
    fn regular_records_reject_boot_flags() {
        let mut data = record(10);
        assert!(matches!(
            data.add_method(MethodFlags::BOOT, 1),
            Err(ProfileError::UnsupportedFlags)
        ));
    }

    #[test]
    fn hotness_outside_method_table_is_absent() {
        let data = record(10);
        assert!(!data.hotness(5000).is_in_profile());
    }
}
