//! The in-memory profile store.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt::Write;

use crate::annotation::{
    augmented_profile_key, base_key_of, base_key_view, migrate_annotation, profile_base_key,
    ProfileSampleAnnotation,
};
use crate::dex::{DexFile, MethodReference, ProfileMethodInfo};
use crate::dex_data::DexFileData;
use crate::hotness::{MethodFlags, MethodHotness, ProfileKind};
use crate::inline_cache::DexPcData;
use crate::{ProfileError, ProfileIndex};

/// Profile information for a set of dex files, in a format suitable to be
/// queried by the compiler for profile guided compilation.
///
/// A store is bound to one [`ProfileKind`]. Records are created when a
/// (dex file, annotation) pair is first referenced and live until
/// [`clear`](ProfileStore::clear); each gets a dense, stable profile index
/// that inline caches use to refer to receiver dex files.
///
/// All mutation requires `&mut self`; query results borrow from the store,
/// so the single-writer rule is enforced by the borrow checker.
#[derive(Clone, Debug)]
pub struct ProfileStore {
    kind: ProfileKind,
    /// Records in profile-index order: `records[i].profile_index == i`.
    records: Vec<DexFileData>,
    /// Reverse index over `records`, keyed by augmented profile key.
    key_to_index: HashMap<String, ProfileIndex>,
}

/// The classes and per-category methods recorded for one dex file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassesAndMethods {
    /// Type indices of profiled classes.
    pub classes: BTreeSet<u16>,
    /// Method indices flagged hot.
    pub hot_methods: BTreeSet<u16>,
    /// Method indices flagged startup.
    pub startup_methods: BTreeSet<u16>,
    /// Method indices flagged post-startup.
    pub post_startup_methods: BTreeSet<u16>,
}

impl ProfileStore {
    /// Creates an empty store of the given kind.
    pub fn new(kind: ProfileKind) -> Self {
        Self {
            kind,
            records: Vec::new(),
            key_to_index: HashMap::new(),
        }
    }

    /// The kind of this store.
    pub fn kind(&self) -> ProfileKind {
        self.kind
    }

    /// Whether the two stores have the same kind.
    pub fn same_kind(&self, other: &ProfileStore) -> bool {
        self.kind == other.kind
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The number of dex files referenced in the profile.
    pub fn number_of_dex_files(&self) -> usize {
        self.records.len()
    }

    /// The number of methods with at least one flag recorded.
    pub fn number_of_methods(&self) -> u32 {
        self.records
            .iter()
            .map(|data| data.bitmap.count_methods(self.kind.flag_count()))
            .sum()
    }

    /// The number of classes recorded across all dex files.
    pub fn number_of_resolved_classes(&self) -> u32 {
        self.records.iter().map(|data| data.class_set.len() as u32).sum()
    }

    /// Drops all records and their indices. The kind stays.
    pub fn clear(&mut self) {
        self.records.clear();
        self.key_to_index.clear();
    }

    /// Drops all records and rebinds the store to the given kind.
    pub fn clear_and_adjust_kind(&mut self, kind: ProfileKind) {
        self.clear();
        self.kind = kind;
    }

    /// Returns the record for the given profile key, creating it on first
    /// use.
    ///
    /// Fails if the key is already bound to a different (checksum,
    /// num_method_ids) descriptor, or if the store is out of profile
    /// indices for its kind.
    pub(crate) fn get_or_add(
        &mut self,
        profile_key: &str,
        checksum: u32,
        num_method_ids: u32,
    ) -> Result<&mut DexFileData, ProfileError> {
        let index = match self.key_to_index.get(profile_key).copied() {
            Some(index) => {
                let data = &self.records[usize::from(index)];
                if data.checksum != checksum || data.num_method_ids != num_method_ids {
                    return Err(ProfileError::DescriptorMismatch(profile_key.to_owned()));
                }
                index
            }
            None => {
                if self.records.len() >= usize::from(self.kind.max_profile_index()) {
                    return Err(ProfileError::TooManyDexFiles);
                }
                let index = self.records.len() as ProfileIndex;
                self.records.push(DexFileData::new(
                    profile_key.to_owned(),
                    index,
                    checksum,
                    num_method_ids,
                    self.kind,
                ));
                self.key_to_index.insert(profile_key.to_owned(), index);
                index
            }
        };
        Ok(&mut self.records[usize::from(index)])
    }

    /// Adds a single method to the profile.
    ///
    /// See [`add_methods`](ProfileStore::add_methods).
    pub fn add_method(
        &mut self,
        method: &ProfileMethodInfo<'_>,
        flags: MethodFlags,
        annotation: &ProfileSampleAnnotation,
    ) -> Result<(), ProfileError> {
        self.add_methods(std::slice::from_ref(method), flags, annotation)
    }

    /// Adds the given methods, with their inline caches, to the profile.
    ///
    /// Methods and their receiver classes are associated with the
    /// (dex file, annotation) group; each group keeps its own records.
    /// Inline caches are only attached for hot methods. The operation is
    /// all-or-nothing: on error the store is unchanged.
    pub fn add_methods(
        &mut self,
        methods: &[ProfileMethodInfo<'_>],
        flags: MethodFlags,
        annotation: &ProfileSampleAnnotation,
    ) -> Result<(), ProfileError> {
        if !self.kind.flags_mask().contains(flags) {
            return Err(ProfileError::UnsupportedFlags);
        }

        // Validate first so a failure cannot leave a partial update behind.
        // New keys carry their descriptor so that entries of the same batch
        // cannot disagree on a dex file the store does not know yet.
        let mut new_keys = HashMap::new();
        for method in methods {
            let dex_file = method.reference.dex_file;
            if u32::from(method.reference.index) >= dex_file.num_method_ids() {
                return Err(ProfileError::MethodIndexOutOfRange);
            }
            self.check_dex_file(dex_file, annotation, &mut new_keys)?;
            for cache in &method.inline_caches {
                for class in &cache.classes {
                    self.check_dex_file(class.dex_file, annotation, &mut new_keys)?;
                }
            }
        }
        if self.records.len() + new_keys.len() > usize::from(self.kind.max_profile_index()) {
            return Err(ProfileError::TooManyDexFiles);
        }

        for method in methods {
            self.add_method_unchecked(method, flags, annotation)?;
        }
        Ok(())
    }

    /// Bulk-adds methods of a single dex file, without inline caches.
    pub fn add_methods_for_dex(
        &mut self,
        flags: MethodFlags,
        dex_file: &DexFile,
        method_indices: impl IntoIterator<Item = u16>,
        annotation: &ProfileSampleAnnotation,
    ) -> Result<(), ProfileError> {
        if !self.kind.flags_mask().contains(flags) {
            return Err(ProfileError::UnsupportedFlags);
        }
        let indices: Vec<u16> = method_indices.into_iter().collect();
        if indices
            .iter()
            .any(|&index| u32::from(index) >= dex_file.num_method_ids())
        {
            return Err(ProfileError::MethodIndexOutOfRange);
        }
        let key = augmented_profile_key(dex_file.location(), annotation)?;
        let data = self.get_or_add(&key, dex_file.checksum(), dex_file.num_method_ids())?;
        for index in indices {
            data.add_method(flags, index)?;
        }
        Ok(())
    }

    /// Adds type indices for classes of a single dex file.
    pub fn add_classes_for_dex(
        &mut self,
        dex_file: &DexFile,
        type_indices: impl IntoIterator<Item = u16>,
        annotation: &ProfileSampleAnnotation,
    ) -> Result<(), ProfileError> {
        let key = augmented_profile_key(dex_file.location(), annotation)?;
        let data = self.get_or_add(&key, dex_file.checksum(), dex_file.num_method_ids())?;
        data.class_set.extend(type_indices);
        Ok(())
    }

    fn check_dex_file(
        &self,
        dex_file: &DexFile,
        annotation: &ProfileSampleAnnotation,
        new_keys: &mut HashMap<String, (u32, u32)>,
    ) -> Result<(), ProfileError> {
        let key = augmented_profile_key(dex_file.location(), annotation)?;
        let descriptor = (dex_file.checksum(), dex_file.num_method_ids());
        match self.key_to_index.get(&key) {
            Some(&index) => {
                let data = &self.records[usize::from(index)];
                if (data.checksum, data.num_method_ids) != descriptor {
                    return Err(ProfileError::DescriptorMismatch(key));
                }
            }
            None => match new_keys.get(&key) {
                Some(&seen) if seen != descriptor => {
                    return Err(ProfileError::DescriptorMismatch(key));
                }
                _ => {
                    new_keys.insert(key, descriptor);
                }
            },
        }
        Ok(())
    }

    fn add_method_unchecked(
        &mut self,
        method: &ProfileMethodInfo<'_>,
        flags: MethodFlags,
        annotation: &ProfileSampleAnnotation,
    ) -> Result<(), ProfileError> {
        let dex_file = method.reference.dex_file;
        let key = augmented_profile_key(dex_file.location(), annotation)?;
        let target = self
            .get_or_add(&key, dex_file.checksum(), dex_file.num_method_ids())?
            .profile_index;
        self.records[usize::from(target)].add_method(flags, method.reference.index)?;

        if !flags.contains(MethodFlags::HOT) {
            // Inline caches are only kept for hot methods.
            return Ok(());
        }

        for cache in &method.inline_caches {
            // Resolve receiver dex files before borrowing the target record;
            // resolution may create new records.
            let mut receivers = Vec::new();
            if !cache.is_missing_types && !cache.is_megamorphic {
                for class in &cache.classes {
                    let receiver_key =
                        augmented_profile_key(class.dex_file.location(), annotation)?;
                    let receiver = self
                        .get_or_add(
                            &receiver_key,
                            class.dex_file.checksum(),
                            class.dex_file.num_method_ids(),
                        )?
                        .profile_index;
                    receivers.push((receiver, class.type_index));
                }
            }

            let data = &mut self.records[usize::from(target)];
            let dex_pc_data = data
                .find_or_add_hot_method(method.reference.index)
                .entry(cache.dex_pc)
                .or_default();
            if cache.is_missing_types {
                dex_pc_data.set_missing_types();
            } else if cache.is_megamorphic {
                dex_pc_data.set_megamorphic();
            } else {
                for (receiver, type_index) in receivers {
                    dex_pc_data.add_class(receiver, type_index);
                }
            }
        }
        Ok(())
    }

    /// Merges the data of another store into this one.
    ///
    /// Records are matched by augmented profile key; profile indices
    /// referenced by inline caches are remapped accordingly. Classes are
    /// only merged when `merge_classes` is set. The merge is all-or-nothing:
    /// on error this store is unchanged.
    pub fn merge(&mut self, other: &ProfileStore, merge_classes: bool) -> Result<(), ProfileError> {
        if self.kind != other.kind {
            return Err(ProfileError::KindMismatch);
        }

        // Resolve every incoming record before touching anything.
        let mut new_records = 0;
        for theirs in &other.records {
            match self.key_to_index.get(&theirs.profile_key) {
                Some(&index) => {
                    let ours = &self.records[usize::from(index)];
                    if ours.checksum != theirs.checksum
                        || ours.num_method_ids != theirs.num_method_ids
                    {
                        tracing::warn!(
                            profile_key = %theirs.profile_key,
                            "cannot merge profiles with conflicting dex descriptors"
                        );
                        return Err(ProfileError::DescriptorMismatch(theirs.profile_key.clone()));
                    }
                }
                None => new_records += 1,
            }
        }
        if self.records.len() + new_records > usize::from(self.kind.max_profile_index()) {
            return Err(ProfileError::TooManyDexFiles);
        }

        let mut remap: Vec<ProfileIndex> = vec![0; other.records.len()];
        for theirs in &other.records {
            let ours =
                self.get_or_add(&theirs.profile_key, theirs.checksum, theirs.num_method_ids)?;
            remap[usize::from(theirs.profile_index)] = ours.profile_index;
        }

        for theirs in &other.records {
            let ours = &mut self.records[usize::from(remap[usize::from(theirs.profile_index)])];
            ours.bitmap.merge(&theirs.bitmap);
            if merge_classes {
                ours.class_set.extend(theirs.class_set.iter().copied());
            }
            for (method_index, inline_caches) in &theirs.method_map {
                let ours_caches = ours.method_map.entry(*method_index).or_default();
                for (dex_pc, data) in inline_caches {
                    ours_caches
                        .entry(*dex_pc)
                        .or_default()
                        .merge_mapped(data, |index| remap[usize::from(index)]);
                }
            }
        }
        Ok(())
    }

    /// Updates profile keys for dex files that have been renamed.
    ///
    /// Records are matched to the given dex files by (checksum,
    /// num_method_ids); matching records whose base key differs get re-keyed
    /// to the dex file's current location, keeping their annotation. If a
    /// new key would clash with a record that is not part of the rename, the
    /// whole operation fails and no key is changed.
    pub fn update_profile_keys(&mut self, dex_files: &[DexFile]) -> Result<(), ProfileError> {
        let mut planned: Vec<Option<String>> = vec![None; self.records.len()];
        for dex_file in dex_files {
            let new_base = profile_base_key(dex_file.location())?;
            for (position, data) in self.records.iter().enumerate() {
                if data.checksum == dex_file.checksum()
                    && data.num_method_ids == dex_file.num_method_ids()
                    && base_key_of(&data.profile_key) != new_base
                {
                    planned[position] = Some(migrate_annotation(&new_base, &data.profile_key));
                }
            }
        }
        if planned.iter().all(Option::is_none) {
            return Ok(());
        }

        // The final augmented keys must stay unique, and a rename must not
        // land on the base key of a record that keeps its key.
        let mut final_keys = HashSet::with_capacity(self.records.len());
        for (position, data) in self.records.iter().enumerate() {
            let key = planned[position].as_deref().unwrap_or(&data.profile_key);
            if !final_keys.insert(key) {
                tracing::warn!(profile_key = key, "profile key rename collides");
                return Err(ProfileError::KeyCollision(key.to_owned()));
            }
        }
        for (position, new_key) in planned.iter().enumerate() {
            let Some(new_key) = new_key else { continue };
            let new_base = base_key_of(new_key);
            let collision = self.records.iter().enumerate().any(|(other, data)| {
                other != position
                    && planned[other].is_none()
                    && base_key_of(&data.profile_key) == new_base
            });
            if collision {
                tracing::warn!(profile_key = %new_key, "profile key rename collides");
                return Err(ProfileError::KeyCollision(new_key.clone()));
            }
        }

        for (position, new_key) in planned.into_iter().enumerate() {
            if let Some(new_key) = new_key {
                let data = &mut self.records[position];
                self.key_to_index.remove(&data.profile_key);
                self.key_to_index.insert(new_key.clone(), data.profile_index);
                data.profile_key = new_key;
            }
        }
        Ok(())
    }

    /// Finds the record for a dex file.
    ///
    /// With the `None` annotation only the first record with a matching base
    /// key is considered; a checksum mismatch on that record means no match.
    /// With a concrete annotation the exact augmented key is looked up.
    pub(crate) fn find_record(
        &self,
        dex_file: &DexFile,
        annotation: &ProfileSampleAnnotation,
    ) -> Option<&DexFileData> {
        match annotation {
            ProfileSampleAnnotation::None => {
                let base = base_key_view(dex_file.location());
                let data = self
                    .records
                    .iter()
                    .find(|data| base_key_of(&data.profile_key) == base)?;
                (data.checksum == dex_file.checksum()).then_some(data)
            }
            annotation => {
                let key = augmented_profile_key(dex_file.location(), annotation).ok()?;
                let index = *self.key_to_index.get(&key)?;
                let data = &self.records[usize::from(index)];
                (data.checksum == dex_file.checksum()).then_some(data)
            }
        }
    }

    /// All records matching the dex file's base key and checksum, across
    /// annotations, in profile-index order.
    pub(crate) fn find_all_records<'s>(
        &'s self,
        dex_file: &'s DexFile,
    ) -> impl Iterator<Item = &'s DexFileData> {
        let base = base_key_view(dex_file.location());
        self.records.iter().filter(move |data| {
            data.checksum == dex_file.checksum() && base_key_of(&data.profile_key) == base
        })
    }

    pub(crate) fn records(&self) -> &[DexFileData] {
        &self.records
    }

    pub(crate) fn record_mut(&mut self, index: ProfileIndex) -> &mut DexFileData {
        &mut self.records[usize::from(index)]
    }

    /// The hotness recorded for the given method.
    pub fn method_hotness(
        &self,
        reference: MethodReference<'_>,
        annotation: &ProfileSampleAnnotation,
    ) -> MethodHotness<'_> {
        match self.find_record(reference.dex_file, annotation) {
            Some(data) => data.hotness(reference.index),
            None => MethodHotness::default(),
        }
    }

    /// Whether the class is present in the profile.
    pub fn contains_class(
        &self,
        dex_file: &DexFile,
        type_index: u16,
        annotation: &ProfileSampleAnnotation,
    ) -> bool {
        self.find_record(dex_file, annotation)
            .is_some_and(|data| data.contains_class(type_index))
    }

    /// Resolves a profile index to one of the given dex files, matching by
    /// checksum and base key.
    pub fn find_dex_file_for_profile_index<'a>(
        &self,
        profile_index: ProfileIndex,
        dex_files: &'a [DexFile],
    ) -> Option<&'a DexFile> {
        let data = self.records.get(usize::from(profile_index))?;
        dex_files.iter().find(|dex_file| {
            dex_file.checksum() == data.checksum
                && base_key_view(dex_file.location()) == base_key_of(&data.profile_key)
        })
    }

    /// Whether the given profile index resolves to the given dex file.
    pub fn profile_index_matches_dex_file(
        &self,
        profile_index: ProfileIndex,
        dex_file: &DexFile,
    ) -> bool {
        self.find_dex_file_for_profile_index(profile_index, std::slice::from_ref(dex_file))
            .is_some()
    }

    /// The classes and methods recorded for the given dex file, with the
    /// bitmap rows lifted back to index sets.
    pub fn classes_and_methods(
        &self,
        dex_file: &DexFile,
        annotation: &ProfileSampleAnnotation,
    ) -> Option<ClassesAndMethods> {
        let data = self.find_record(dex_file, annotation)?;
        Some(ClassesAndMethods {
            classes: data.class_set.clone(),
            hot_methods: data
                .bitmap
                .methods_with_flag(MethodFlags::HOT.bitmap_position())
                .collect(),
            startup_methods: data
                .bitmap
                .methods_with_flag(MethodFlags::STARTUP.bitmap_position())
                .collect(),
            post_startup_methods: data
                .bitmap
                .methods_with_flag(MethodFlags::POST_STARTUP.bitmap_position())
                .collect(),
        })
    }

    /// Renders the whole store into a human readable string, for debugging.
    pub fn dump(&self) -> String {
        let kind = match self.kind {
            ProfileKind::Regular => "regular",
            ProfileKind::BootImage => "boot-image",
        };
        let mut out = String::new();
        let _ = writeln!(
            out,
            "dex-profile [{kind}] [{} dex files]",
            self.records.len()
        );
        for data in &self.records {
            let _ = writeln!(
                out,
                " {} [index={}] [checksum={:#010x}] [num_method_ids={}]",
                data.profile_key, data.profile_index, data.checksum, data.num_method_ids
            );
            let _ = write!(out, "  hot methods:");
            for (method_index, inline_caches) in &data.method_map {
                let _ = write!(out, " {method_index}[");
                for (position, (dex_pc, pc_data)) in inline_caches.iter().enumerate() {
                    if position > 0 {
                        let _ = write!(out, " ");
                    }
                    match pc_data {
                        DexPcData::Megamorphic => {
                            let _ = write!(out, "{dex_pc}{{M}}");
                        }
                        DexPcData::MissingTypes => {
                            let _ = write!(out, "{dex_pc}{{T}}");
                        }
                        DexPcData::Types(classes) => {
                            let rendered: Vec<String> = classes
                                .iter()
                                .map(|class| {
                                    format!("{}.{}", class.dex_profile_index, class.type_index)
                                })
                                .collect();
                            let _ = write!(out, "{dex_pc}{{{}}}", rendered.join(","));
                        }
                    }
                }
                let _ = write!(out, "]");
            }
            let _ = writeln!(out);
            for (label, flag) in [
                ("startup methods", MethodFlags::STARTUP),
                ("post startup methods", MethodFlags::POST_STARTUP),
            ] {
                let methods: Vec<String> = data
                    .bitmap
                    .methods_with_flag(flag.bitmap_position())
                    .map(|index| index.to_string())
                    .collect();
                let _ = writeln!(out, "  {label}: {}", methods.join(", "));
            }
            let classes: Vec<String> =
                data.class_set.iter().map(|index| index.to_string()).collect();
            let _ = writeln!(out, "  classes: {}", classes.join(", "));
        }
        out
    }
}

impl PartialEq for ProfileStore {
    /// Logical, order-invariant equality.
    ///
    /// Two stores are equal when they have the same kind and hold the same
    /// records under the same profile keys, regardless of the order in which
    /// the records were first seen. Inline cache class references are
    /// compared after remapping profile indices through the key
    /// correspondence.
    fn eq(&self, other: &Self) -> bool {
        if self.kind != other.kind || self.records.len() != other.records.len() {
            return false;
        }
        let mut remap = Vec::with_capacity(self.records.len());
        for data in &self.records {
            match other.key_to_index.get(&data.profile_key) {
                Some(&index) => remap.push(index),
                None => return false,
            }
        }
        self.records.iter().all(|data| {
            let theirs = &other.records[usize::from(remap[usize::from(data.profile_index)])];
            data.logically_equal(theirs, &remap)
        })
    }
}

impl Eq for ProfileStore {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dex::{ProfileInlineCache, TypeReference};

    fn dex(location: &str, checksum: u32, num_method_ids: u32) -> DexFile {
        DexFile::new(location, checksum, num_method_ids, 100)
    }

    fn method<'a>(dex_file: &'a DexFile, index: u16) -> ProfileMethodInfo<'a> {
        ProfileMethodInfo::new(MethodReference { dex_file, index })
    }

    fn method_with_classes<'a>(
        dex_file: &'a DexFile,
        index: u16,
        dex_pc: u16,
        classes: Vec<TypeReference<'a>>,
    ) -> ProfileMethodInfo<'a> {
        ProfileMethodInfo {
            reference: MethodReference {
                dex_file,
                index,
            },
            inline_caches: vec![ProfileInlineCache {
                dex_pc,
                is_missing_types: false,
                is_megamorphic: false,
                classes,
            }],
        }
    }

    #[test]
    fn add_then_query_hotness() {
        let dex_file = dex("/system/app/base.apk", 0xf00d, 100);
        let mut store = ProfileStore::new(ProfileKind::Regular);
        store
            .add_method(
                &method(&dex_file, 7),
                MethodFlags::HOT | MethodFlags::STARTUP,
                &ProfileSampleAnnotation::None,
            )
            .unwrap();

        let hotness = store.method_hotness(
            MethodReference {
                dex_file: &dex_file,
                index: 7,
            },
            &ProfileSampleAnnotation::None,
        );
        assert!(hotness.is_hot());
        assert!(hotness.is_startup());
        assert!(!hotness.is_post_startup());

        let absent = store.method_hotness(
            MethodReference {
                dex_file: &dex_file,
                index: 8,
            },
            &ProfileSampleAnnotation::None,
        );
        assert!(!absent.is_in_profile());
    }

    #[test]
    fn checksum_mismatch_hides_record() {
        let dex_file = dex("base.apk", 1, 100);
        let mut store = ProfileStore::new(ProfileKind::Regular);
        store
            .add_method(&method(&dex_file, 0), MethodFlags::HOT, &ProfileSampleAnnotation::None)
            .unwrap();

        let stale = dex("base.apk", 2, 100);
        let hotness = store.method_hotness(
            MethodReference {
                dex_file: &stale,
                index: 0,
            },
            &ProfileSampleAnnotation::None,
        );
        assert!(!hotness.is_in_profile());
    }

    #[test]
    fn conflicting_descriptor_is_rejected() {
        let dex_file = dex("base.apk", 1, 100);
        let conflicting = dex("base.apk", 2, 100);
        let mut store = ProfileStore::new(ProfileKind::Regular);
        store
            .add_method(&method(&dex_file, 0), MethodFlags::HOT, &ProfileSampleAnnotation::None)
            .unwrap();
        assert!(matches!(
            store.add_method(
                &method(&conflicting, 1),
                MethodFlags::HOT,
                &ProfileSampleAnnotation::None
            ),
            Err(ProfileError::DescriptorMismatch(_))
        ));
        // The failed add left no trace.
        assert_eq!(store.number_of_methods(), 1);
    }

    #[test]
    fn conflicting_descriptors_within_one_batch_are_rejected() {
        let dex_file = dex("base.apk", 1, 100);
        let conflicting = dex("base.apk", 2, 100);
        let mut store = ProfileStore::new(ProfileKind::Regular);
        // Both entries reference a location the store does not know yet and
        // disagree on its checksum; nothing may be committed.
        assert!(matches!(
            store.add_methods(
                &[method(&dex_file, 1), method(&conflicting, 2)],
                MethodFlags::HOT,
                &ProfileSampleAnnotation::None
            ),
            Err(ProfileError::DescriptorMismatch(_))
        ));
        assert!(store.is_empty());
        assert_eq!(store.number_of_dex_files(), 0);
    }

    #[test]
    fn annotations_partition_records() {
        let dex_file = dex("base.apk", 1, 100);
        let app_a = ProfileSampleAnnotation::OriginPackage("com.a".to_owned());
        let app_b = ProfileSampleAnnotation::OriginPackage("com.b".to_owned());
        let mut store = ProfileStore::new(ProfileKind::Regular);
        store.add_method(&method(&dex_file, 1), MethodFlags::HOT, &app_a).unwrap();
        store.add_method(&method(&dex_file, 2), MethodFlags::HOT, &app_b).unwrap();

        assert_eq!(store.number_of_dex_files(), 2);
        let reference = MethodReference {
            dex_file: &dex_file,
            index: 1,
        };
        assert!(store.method_hotness(reference, &app_a).is_hot());
        assert!(!store.method_hotness(reference, &app_b).is_hot());
        // Without an annotation the first matching record wins.
        assert!(store.method_hotness(reference, &ProfileSampleAnnotation::None).is_hot());
    }

    #[test]
    fn megamorphic_upgrade_after_five_classes() {
        let caller = dex("caller.apk", 1, 100);
        let mut store = ProfileStore::new(ProfileKind::Regular);
        for type_index in 0..6 {
            store
                .add_method(
                    &method_with_classes(
                        &caller,
                        3,
                        12,
                        vec![TypeReference {
                            dex_file: &caller,
                            type_index,
                        }],
                    ),
                    MethodFlags::HOT,
                    &ProfileSampleAnnotation::None,
                )
                .unwrap();
        }

        let hotness = store.method_hotness(
            MethodReference {
                dex_file: &caller,
                index: 3,
            },
            &ProfileSampleAnnotation::None,
        );
        let caches = hotness.inline_caches().unwrap();
        let site = caches.get(&12).unwrap();
        assert!(site.is_megamorphic());
        assert!(site.classes().is_empty());
    }

    #[test]
    fn cross_dex_inline_cache_creates_receiver_record() {
        let caller = dex("caller.apk", 1, 100);
        let receiver = dex("receiver.apk", 2, 50);
        let mut store = ProfileStore::new(ProfileKind::Regular);
        store
            .add_method(
                &method_with_classes(
                    &caller,
                    3,
                    12,
                    vec![TypeReference {
                        dex_file: &receiver,
                        type_index: 9,
                    }],
                ),
                MethodFlags::HOT,
                &ProfileSampleAnnotation::None,
            )
            .unwrap();

        assert_eq!(store.number_of_dex_files(), 2);
        assert!(store.profile_index_matches_dex_file(0, &caller));
        assert!(store.profile_index_matches_dex_file(1, &receiver));
        let hotness = store.method_hotness(
            MethodReference {
                dex_file: &caller,
                index: 3,
            },
            &ProfileSampleAnnotation::None,
        );
        let site = hotness.inline_caches().unwrap().get(&12).unwrap();
        assert_eq!(site.classes()[0].dex_profile_index, 1);
        assert_eq!(site.classes()[0].type_index, 9);
    }

    #[test]
    fn merge_remaps_profile_indices() {
        let dex_a = dex("a.apk", 0xa, 100);
        let dex_b = dex("b.apk", 0xb, 100);

        let mut first = ProfileStore::new(ProfileKind::Regular);
        first
            .add_method(&method(&dex_a, 1), MethodFlags::HOT, &ProfileSampleAnnotation::None)
            .unwrap();

        // The other store saw the dex files in the opposite order and has an
        // inline cache pointing at its record 1 (dex A).
        let mut second = ProfileStore::new(ProfileKind::Regular);
        second
            .add_method(&method(&dex_b, 2), MethodFlags::HOT, &ProfileSampleAnnotation::None)
            .unwrap();
        second
            .add_method(
                &method_with_classes(
                    &dex_b,
                    2,
                    30,
                    vec![TypeReference {
                        dex_file: &dex_a,
                        type_index: 5,
                    }],
                ),
                MethodFlags::HOT,
                &ProfileSampleAnnotation::None,
            )
            .unwrap();

        first.merge(&second, true).unwrap();

        // Dex A kept index 0, dex B was appended at 1.
        assert!(first.profile_index_matches_dex_file(0, &dex_a));
        assert!(first.profile_index_matches_dex_file(1, &dex_b));
        let hotness = first.method_hotness(
            MethodReference {
                dex_file: &dex_b,
                index: 2,
            },
            &ProfileSampleAnnotation::None,
        );
        let site = hotness.inline_caches().unwrap().get(&30).unwrap();
        // The reference to dex A was rewritten from 1 to 0.
        assert_eq!(site.classes()[0].dex_profile_index, 0);
    }

    #[test]
    fn merge_algebra() {
        let dex_a = dex("a.apk", 0xa, 100);
        let dex_b = dex("b.apk", 0xb, 100);

        let mut profile_a = ProfileStore::new(ProfileKind::Regular);
        profile_a
            .add_method(&method(&dex_a, 1), MethodFlags::HOT, &ProfileSampleAnnotation::None)
            .unwrap();
        profile_a.add_classes_for_dex(&dex_a, 1..=3, &ProfileSampleAnnotation::None).unwrap();

        let mut profile_b = ProfileStore::new(ProfileKind::Regular);
        profile_b
            .add_method(
                &method(&dex_b, 2),
                MethodFlags::STARTUP,
                &ProfileSampleAnnotation::None,
            )
            .unwrap();

        // Identity.
        let mut merged = profile_a.clone();
        merged.merge(&ProfileStore::new(ProfileKind::Regular), true).unwrap();
        assert_eq!(merged, profile_a);
        let mut empty = ProfileStore::new(ProfileKind::Regular);
        empty.merge(&profile_a, true).unwrap();
        assert_eq!(empty, profile_a);

        // Idempotence.
        let mut doubled = profile_a.clone();
        doubled.merge(&profile_a, true).unwrap();
        assert_eq!(doubled, profile_a);

        // Commutativity up to logical equality.
        let mut ab = profile_a.clone();
        ab.merge(&profile_b, true).unwrap();
        let mut ba = profile_b.clone();
        ba.merge(&profile_a, true).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn merge_rejects_other_kind() {
        let mut regular = ProfileStore::new(ProfileKind::Regular);
        let boot = ProfileStore::new(ProfileKind::BootImage);
        assert!(matches!(
            regular.merge(&boot, true),
            Err(ProfileError::KindMismatch)
        ));
    }

    #[test]
    fn merge_without_classes_skips_class_sets() {
        let dex_a = dex("a.apk", 0xa, 100);
        let mut source = ProfileStore::new(ProfileKind::Regular);
        source.add_classes_for_dex(&dex_a, [1, 2], &ProfileSampleAnnotation::None).unwrap();
        source
            .add_method(&method(&dex_a, 1), MethodFlags::HOT, &ProfileSampleAnnotation::None)
            .unwrap();

        let mut target = ProfileStore::new(ProfileKind::Regular);
        target.merge(&source, false).unwrap();
        assert_eq!(target.number_of_resolved_classes(), 0);
        assert_eq!(target.number_of_methods(), 1);
    }

    #[test]
    fn update_profile_keys_renames_and_restores() {
        let mut store = ProfileStore::new(ProfileKind::Regular);
        let old = dex("old.apk", 1, 100);
        store.add_method(&method(&old, 1), MethodFlags::HOT, &ProfileSampleAnnotation::None).unwrap();

        let renamed = dex("new.apk", 1, 100);
        store.update_profile_keys(std::slice::from_ref(&renamed)).unwrap();
        assert!(store
            .method_hotness(
                MethodReference {
                    dex_file: &renamed,
                    index: 1
                },
                &ProfileSampleAnnotation::None
            )
            .is_hot());

        store.update_profile_keys(std::slice::from_ref(&old)).unwrap();
        assert!(store
            .method_hotness(
                MethodReference {
                    dex_file: &old,
                    index: 1
                },
                &ProfileSampleAnnotation::None
            )
            .is_hot());
    }

    #[test]
    fn update_profile_keys_collision_leaves_store_unchanged() {
        let annotation_a = ProfileSampleAnnotation::OriginPackage("com.a".to_owned());
        let annotation_b = ProfileSampleAnnotation::OriginPackage("com.b".to_owned());
        let first = dex("base1.apk!/classes.dex", 7, 100);
        let second = dex("base2.apk!/classes.dex", 7, 100);

        let mut store = ProfileStore::new(ProfileKind::Regular);
        store.add_method(&method(&first, 1), MethodFlags::HOT, &annotation_a).unwrap();
        store.add_method(&method(&second, 2), MethodFlags::HOT, &annotation_b).unwrap();
        let before = store.clone();

        // Renaming base1 onto base2 would shadow the existing record.
        assert!(matches!(
            store.update_profile_keys(std::slice::from_ref(&second)),
            Err(ProfileError::KeyCollision(_))
        ));
        assert_eq!(store, before);
    }

    #[test]
    fn classes_and_methods_lifts_bitmap_rows() {
        let dex_file = dex("base.apk", 1, 100);
        let mut store = ProfileStore::new(ProfileKind::Regular);
        store
            .add_method(
                &method(&dex_file, 3),
                MethodFlags::HOT | MethodFlags::STARTUP,
                &ProfileSampleAnnotation::None,
            )
            .unwrap();
        store
            .add_method(
                &method(&dex_file, 9),
                MethodFlags::POST_STARTUP,
                &ProfileSampleAnnotation::None,
            )
            .unwrap();
        store.add_classes_for_dex(&dex_file, [4, 2], &ProfileSampleAnnotation::None).unwrap();

        let summary = store
            .classes_and_methods(&dex_file, &ProfileSampleAnnotation::None)
            .unwrap();
        assert_eq!(summary.classes, BTreeSet::from([2, 4]));
        assert_eq!(summary.hot_methods, BTreeSet::from([3]));
        assert_eq!(summary.startup_methods, BTreeSet::from([3]));
        assert_eq!(summary.post_startup_methods, BTreeSet::from([9]));
    }

    #[test]
    fn clear_resets_records_and_indices() {
        let dex_file = dex("base.apk", 1, 100);
        let mut store = ProfileStore::new(ProfileKind::Regular);
        store.add_method(&method(&dex_file, 1), MethodFlags::HOT, &ProfileSampleAnnotation::None).unwrap();
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.kind(), ProfileKind::Regular);

        store.clear_and_adjust_kind(ProfileKind::BootImage);
        assert_eq!(store.kind(), ProfileKind::BootImage);
        // Indices restart densely after a clear.
        store.add_method(&method(&dex_file, 1), MethodFlags::HOT, &ProfileSampleAnnotation::None).unwrap();
        assert!(store.profile_index_matches_dex_file(0, &dex_file));
    }

    #[test]
    fn dump_mentions_records() {
        let dex_file = dex("base.apk", 0xaa, 100);
        let mut store = ProfileStore::new(ProfileKind::Regular);
        store.add_method(&method(&dex_file, 7), MethodFlags::HOT, &ProfileSampleAnnotation::None).unwrap();
        store.add_classes_for_dex(&dex_file, [1], &ProfileSampleAnnotation::None).unwrap();

        let dump = store.dump();
        assert!(dump.contains("base.apk"));
        assert!(dump.contains("index=0"));
        assert!(dump.contains("7[]"));
    }
}
