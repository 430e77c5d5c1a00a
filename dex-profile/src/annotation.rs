//! Profile keys and sample annotations.
//!
//! Every dex file tracked by a profile is identified by its *profile key*.
//! The *base key* is derived from the dex location: the directory part is
//! stripped and the multidex suffix (`!classes2.dex` and friends) is kept
//! verbatim, so `/data/app/foo/base.apk!classes2.dex` and
//! `/tmp/staged/base.apk!classes2.dex` map to the same key.
//!
//! Samples can additionally be tagged with a [`ProfileSampleAnnotation`]
//! naming the package that generated them. The annotation is serialized into
//! the key (`base.apk:com.example.app`), which makes records for the same dex
//! file but different origins independent of each other. Base keys must not
//! contain the separator, so splitting an augmented key is unambiguous.

use std::fmt;

use crate::ProfileError;

/// Separates the base key from the serialized annotation in an augmented key.
const ANNOTATION_SEPARATOR: char = ':';

/// Separates the container location from the multidex entry name.
const MULTIDEX_SEPARATOR: char = '!';

/// Largest accepted dex location, in bytes.
const MAX_KEY_LEN: usize = 4096;

/// Optional metadata associated with the samples added to a profile.
///
/// Annotations partition samples by the package that generated them, so that
/// profiles merged from different sources remain distinguishable. The
/// [`None`](ProfileSampleAnnotation::None) annotation compares equal only to
/// itself.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProfileSampleAnnotation {
    /// No annotation is associated with the samples.
    #[default]
    None,
    /// The samples were generated by the given package.
    OriginPackage(String),
}

impl ProfileSampleAnnotation {
    /// Returns the origin package name, if any.
    pub fn origin_package(&self) -> Option<&str> {
        match self {
            ProfileSampleAnnotation::None => None,
            ProfileSampleAnnotation::OriginPackage(package) => Some(package),
        }
    }
}

impl fmt::Display for ProfileSampleAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileSampleAnnotation::None => f.write_str("none"),
            ProfileSampleAnnotation::OriginPackage(package) => f.write_str(package),
        }
    }
}

/// Returns the base profile key for the given dex location.
///
/// Fails on empty or oversized locations and on locations that contain the
/// reserved annotation separator.
pub fn profile_base_key(dex_location: &str) -> Result<String, ProfileError> {
    validate_location(dex_location)?;
    Ok(base_key_view(dex_location).to_owned())
}

/// Returns the augmented profile key for the given dex location.
///
/// For [`ProfileSampleAnnotation::None`] this is exactly the base key.
pub fn augmented_profile_key(
    dex_location: &str,
    annotation: &ProfileSampleAnnotation,
) -> Result<String, ProfileError> {
    validate_location(dex_location)?;
    let base = base_key_view(dex_location);
    Ok(match annotation.origin_package() {
        None => base.to_owned(),
        Some(package) => format!("{base}{ANNOTATION_SEPARATOR}{package}"),
    })
}

/// Returns the base key part of an augmented profile key.
pub fn base_key_of(profile_key: &str) -> &str {
    match profile_key.find(ANNOTATION_SEPARATOR) {
        Some(index) => &profile_key[..index],
        None => profile_key,
    }
}

/// Returns the annotation serialized into an augmented profile key.
pub fn annotation_of(profile_key: &str) -> ProfileSampleAnnotation {
    match profile_key.find(ANNOTATION_SEPARATOR) {
        Some(index) => {
            ProfileSampleAnnotation::OriginPackage(profile_key[index + 1..].to_owned())
        }
        None => ProfileSampleAnnotation::None,
    }
}

/// Re-attaches the annotation of `old_key` to a new base key.
pub(crate) fn migrate_annotation(new_base: &str, old_key: &str) -> String {
    match old_key.find(ANNOTATION_SEPARATOR) {
        Some(index) => format!("{new_base}{}", &old_key[index..]),
        None => new_base.to_owned(),
    }
}

/// The base key of a dex location, without validation.
///
/// The directory part applies to the container, so it is stripped from the
/// part before the multidex separator only.
pub(crate) fn base_key_view(dex_location: &str) -> &str {
    let container_end = dex_location
        .find(MULTIDEX_SEPARATOR)
        .unwrap_or(dex_location.len());
    match dex_location[..container_end].rfind('/') {
        Some(index) => &dex_location[index + 1..],
        None => dex_location,
    }
}

fn validate_location(dex_location: &str) -> Result<(), ProfileError> {
    if dex_location.is_empty()
        || dex_location.len() > MAX_KEY_LEN
        || base_key_view(dex_location).is_empty()
        || dex_location.contains(ANNOTATION_SEPARATOR)
    {
        return Err(ProfileError::InvalidDexLocation(dex_location.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_key_strips_directories() {
        assert_eq!(base_key_view("/data/app/foo/base.apk"), "base.apk");
        assert_eq!(base_key_view("base.apk"), "base.apk");
        assert_eq!(base_key_view("classes.dex"), "classes.dex");
    }

    #[test]
    fn base_key_keeps_multidex_suffix() {
        assert_eq!(
            base_key_view("/data/app/foo/base.apk!classes2.dex"),
            "base.apk!classes2.dex"
        );
        assert_eq!(
            base_key_view("/data/app/foo/base.apk!/classes2.dex"),
            "base.apk!/classes2.dex"
        );
    }

    #[test]
    fn invalid_locations_are_rejected() {
        assert!(profile_base_key("").is_err());
        assert!(profile_base_key("/ends/in/slash/").is_err());
        assert!(profile_base_key("odd:location.apk").is_err());
        assert!(profile_base_key(&"x".repeat(MAX_KEY_LEN + 1)).is_err());
    }

    #[test]
    fn augment_and_split_round_trip() {
        let annotation = ProfileSampleAnnotation::OriginPackage("com.example".to_owned());
        let key = augmented_profile_key("/a/b/base.apk", &annotation).unwrap();
        assert_eq!(key, "base.apk:com.example");
        assert_eq!(base_key_of(&key), "base.apk");
        assert_eq!(annotation_of(&key), annotation);
    }

    #[test]
    fn none_annotation_augments_to_base_key() {
        let key =
            augmented_profile_key("/a/b/base.apk", &ProfileSampleAnnotation::None).unwrap();
        assert_eq!(key, "base.apk");
        assert_eq!(annotation_of(&key), ProfileSampleAnnotation::None);
    }

    #[test]
    fn migrate_annotation_preserves_suffix() {
        assert_eq!(
            migrate_annotation("new.apk", "old.apk:com.example"),
            "new.apk:com.example"
        );
        assert_eq!(migrate_annotation("new.apk", "old.apk"), "new.apk");
    }
}
