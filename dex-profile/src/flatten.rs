//! Flattened projection of a profile across annotations.
//!
//! A store may hold several records for the same dex file, one per
//! annotation. The flattened view folds them together: every method and
//! class is listed once, together with the union of its flags and the
//! multiset of annotations that touched it. This is what boot profile
//! generation consumes to weigh how many packages use an item.

use std::collections::BTreeMap;

use crate::annotation::{annotation_of, ProfileSampleAnnotation};
use crate::dex::{DexFile, MethodReference, TypeReference};
use crate::hotness::MethodFlags;
use crate::store::ProfileStore;

/// Aggregated metadata of one method or class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemMetadata {
    /// Union of the flags of all aggregated records. Empty for classes.
    flags: MethodFlags,
    /// One entry per record that contained the item. May contain duplicates
    /// after a merge, representing usage across devices.
    annotations: Vec<ProfileSampleAnnotation>,
}

impl ItemMetadata {
    /// The union of all flags recorded for the item.
    pub fn flags(&self) -> MethodFlags {
        self.flags
    }

    /// Whether all of the given flags are recorded for the item.
    pub fn has_flags(&self, flags: MethodFlags) -> bool {
        self.flags.contains(flags)
    }

    /// The annotations of all records that contained the item.
    pub fn annotations(&self) -> &[ProfileSampleAnnotation] {
        &self.annotations
    }
}

impl Default for ItemMetadata {
    fn default() -> Self {
        Self {
            flags: MethodFlags::empty(),
            annotations: Vec::new(),
        }
    }
}

/// All methods and classes of a store, keyed by dex file reference and
/// aggregated across annotations.
#[derive(Clone, Debug, Default)]
pub struct FlattenedProfile<'a> {
    method_metadata: BTreeMap<MethodReference<'a>, ItemMetadata>,
    class_metadata: BTreeMap<TypeReference<'a>, ItemMetadata>,
    max_aggregation_for_methods: u32,
    max_aggregation_for_classes: u32,
}

impl<'a> FlattenedProfile<'a> {
    /// Per-method aggregated metadata.
    pub fn method_data(&self) -> &BTreeMap<MethodReference<'a>, ItemMetadata> {
        &self.method_metadata
    }

    /// Per-class aggregated metadata.
    pub fn class_data(&self) -> &BTreeMap<TypeReference<'a>, ItemMetadata> {
        &self.class_metadata
    }

    /// The largest number of annotations aggregated on any one method.
    ///
    /// Precomputed so callers do not have to walk all methods.
    pub fn max_aggregation_for_methods(&self) -> u32 {
        self.max_aggregation_for_methods
    }

    /// The largest number of annotations aggregated on any one class.
    pub fn max_aggregation_for_classes(&self) -> u32 {
        self.max_aggregation_for_classes
    }

    /// Merges another flattened view into this one, ORing flags and
    /// concatenating annotation lists.
    pub fn merge(&mut self, other: &FlattenedProfile<'a>) {
        for (reference, metadata) in &other.method_metadata {
            let ours = self.method_metadata.entry(*reference).or_default();
            ours.flags |= metadata.flags;
            ours.annotations.extend(metadata.annotations.iter().cloned());
            self.max_aggregation_for_methods = self
                .max_aggregation_for_methods
                .max(ours.annotations.len() as u32);
        }
        for (reference, metadata) in &other.class_metadata {
            let ours = self.class_metadata.entry(*reference).or_default();
            ours.flags |= metadata.flags;
            ours.annotations.extend(metadata.annotations.iter().cloned());
            self.max_aggregation_for_classes = self
                .max_aggregation_for_classes
                .max(ours.annotations.len() as u32);
        }
    }
}

impl ProfileStore {
    /// Extracts the data the store has on the given dex files into a
    /// flattened, annotation-aggregated view.
    pub fn extract_profile_data<'a>(&self, dex_files: &'a [DexFile]) -> FlattenedProfile<'a> {
        let mut result = FlattenedProfile::default();
        for dex_file in dex_files {
            for data in self.find_all_records(dex_file) {
                let annotation = annotation_of(&data.profile_key);

                for &type_index in &data.class_set {
                    let metadata = result
                        .class_metadata
                        .entry(TypeReference {
                            dex_file,
                            type_index,
                        })
                        .or_default();
                    metadata.annotations.push(annotation.clone());
                    result.max_aggregation_for_classes = result
                        .max_aggregation_for_classes
                        .max(metadata.annotations.len() as u32);
                }

                // Method indices are 16 bit wide; larger method tables
                // cannot carry profile data beyond that.
                let method_count = data.num_method_ids.min(u32::from(u16::MAX) + 1);
                for method_index in 0..method_count {
                    let method_index = method_index as u16;
                    let hotness = data.hotness(method_index);
                    if !hotness.is_in_profile() {
                        continue;
                    }
                    let metadata = result
                        .method_metadata
                        .entry(MethodReference {
                            dex_file,
                            index: method_index,
                        })
                        .or_default();
                    metadata.flags |= hotness.flags();
                    metadata.annotations.push(annotation.clone());
                    result.max_aggregation_for_methods = result
                        .max_aggregation_for_methods
                        .max(metadata.annotations.len() as u32);
                }
            }
        }
        result
    }
}
