//! Deterministic generation of well-formed test profiles.

use std::io::Write;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::annotation::ProfileSampleAnnotation;
use crate::dex::DexFile;
use crate::hotness::{MethodFlags, ProfileKind};
use crate::store::ProfileStore;
use crate::ProfileError;

/// Method and type table size assumed for synthetic dex files.
const MAX_IDS: u32 = u16::MAX as u32;

fn multidex_location(index: u16, base: &str) -> String {
    if index == 0 {
        base.to_owned()
    } else {
        format!("{base}!classes{}.dex", index + 1)
    }
}

/// Writes a profile for `number_of_dex_files` synthetic dex files, marking
/// `method_percentage` percent of all method ids hot and recording
/// `class_percentage` percent of all type ids.
///
/// The output is fully determined by the arguments; the same seed yields
/// the same bytes.
pub fn generate_test_profile<W: Write>(
    destination: &mut W,
    kind: ProfileKind,
    number_of_dex_files: u16,
    method_percentage: u16,
    class_percentage: u16,
    seed: u64,
) -> Result<u64, ProfileError> {
    let mut rng = Pcg32::seed_from_u64(seed);
    let number_of_methods = MAX_IDS * u32::from(method_percentage) / 100;
    let number_of_classes = MAX_IDS * u32::from(class_percentage) / 100;

    let mut store = ProfileStore::new(kind);
    for dex_index in 0..number_of_dex_files {
        let dex_file = DexFile::new(
            multidex_location(dex_index, "base.apk"),
            rng.gen(),
            MAX_IDS,
            MAX_IDS,
        );
        let methods: Vec<u16> = (0..number_of_methods)
            .map(|_| rng.gen_range(0..u16::MAX))
            .collect();
        store.add_methods_for_dex(
            MethodFlags::HOT,
            &dex_file,
            methods,
            &ProfileSampleAnnotation::None,
        )?;
        let classes: Vec<u16> = (0..number_of_classes)
            .map(|_| rng.gen_range(0..u16::MAX))
            .collect();
        store.add_classes_for_dex(&dex_file, classes, &ProfileSampleAnnotation::None)?;
    }
    store.save(destination)
}

/// Writes a profile that randomly samples methods and classes from the
/// given dex files, keeping roughly the given percentages of each.
pub fn generate_test_profile_for_dex<W: Write>(
    destination: &mut W,
    kind: ProfileKind,
    dex_files: &[DexFile],
    method_percentage: u16,
    class_percentage: u16,
    seed: u64,
) -> Result<u64, ProfileError> {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut store = ProfileStore::new(kind);
    for dex_file in dex_files {
        let method_count = dex_file.num_method_ids().min(MAX_IDS) as u16;
        let methods: Vec<u16> = (0..method_count)
            .filter(|_| rng.gen_range(0..100) < method_percentage)
            .collect();
        store.add_methods_for_dex(
            MethodFlags::HOT,
            dex_file,
            methods,
            &ProfileSampleAnnotation::None,
        )?;
        let class_count = dex_file.num_type_ids().min(MAX_IDS) as u16;
        let classes: Vec<u16> = (0..class_count)
            .filter(|_| rng.gen_range(0..100) < class_percentage)
            .collect();
        store.add_classes_for_dex(dex_file, classes, &ProfileSampleAnnotation::None)?;
    }
    store.save(destination)
}
