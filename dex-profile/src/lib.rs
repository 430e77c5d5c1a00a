//! Profile guided compilation data for dex files.
//!
//! A [`ProfileStore`] records, per dex file, which methods have executed and
//! how ([`MethodFlags`]), which classes have been resolved, and the receiver
//! types observed at each call site of each hot method (inline caches). The
//! store is filled from interpreter samples, merged across runs and devices,
//! and consumed by the ahead-of-time compiler to drive method selection and
//! devirtualisation.
//!
//! # Records and keys
//!
//! Each record covers one (dex file, annotation) pair, identified by its
//! augmented profile key (see [`augmented_profile_key`]). Records get dense,
//! stable profile indices; inline caches refer to receiver dex files through
//! these indices, so cross-dex references stay cheap and cycle-free.
//!
//! # Dialects
//!
//! A store is bound to a [`ProfileKind`] at creation. Regular profiles
//! track three method flags and serialize profile indices as `u8`; boot
//! image profiles track the full flag set, serialize indices as `u16` and
//! allow twice the file size.
//!
//! # Persistence
//!
//! [`ProfileStore::save`] and [`ProfileStore::load`] implement a compressed,
//! length-prefixed binary format, including transparent extraction of
//! profiles embedded in dex metadata archives. Loading accepts a filter to
//! drop dex files, remapping all indices so the result is as dense as a
//! fresh profile.
//!
//! # Concurrency
//!
//! There is no interior locking: mutation takes `&mut self` and queries
//! return borrows, so the single-writer / concurrent-reader discipline is
//! enforced at compile time.

mod annotation;
mod bitmap;
mod dex;
mod dex_data;
mod error;
mod flatten;
mod generator;
mod hotness;
mod inline_cache;
mod serialize;
mod store;

pub use annotation::{
    annotation_of, augmented_profile_key, base_key_of, profile_base_key, ProfileSampleAnnotation,
};
pub use dex::{DexFile, MethodReference, ProfileInlineCache, ProfileMethodInfo, TypeReference};
pub use error::ProfileError;
pub use flatten::{FlattenedProfile, ItemMetadata};
pub use generator::{generate_test_profile, generate_test_profile_for_dex};
pub use hotness::{MethodFlags, MethodHotness, ProfileKind};
pub use inline_cache::{
    ClassReference, DexPcData, InlineCacheMap, MethodMap, MAX_INLINE_CACHE_CLASSES,
};
pub use serialize::is_profile_file;
pub use store::{ClassesAndMethods, ProfileStore};

/// In-memory representation of a record's index within a store.
///
/// Serialized as `u8` or `u16` depending on the profile kind.
pub type ProfileIndex = u16;
