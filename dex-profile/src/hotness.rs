//! Profile kinds and per-method execution flags.

use bitflags::bitflags;

use crate::inline_cache::InlineCacheMap;
use crate::ProfileIndex;

bitflags! {
    /// Execution flags recorded per method.
    ///
    /// Regular profiles only use [`HOT`](MethodFlags::HOT),
    /// [`STARTUP`](MethodFlags::STARTUP) and
    /// [`POST_STARTUP`](MethodFlags::POST_STARTUP); boot image profiles use
    /// the whole set.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct MethodFlags: u32 {
        /// The method is profile-hot.
        const HOT = 1 << 0;
        /// Executed during application startup, as determined by the runtime.
        const STARTUP = 1 << 1;
        /// Executed after application startup, as determined by the runtime.
        const POST_STARTUP = 1 << 2;
        /// Executed by a 32-bit process.
        const BITNESS_32 = 1 << 3;
        /// Executed by a 64-bit process.
        const BITNESS_64 = 1 << 4;
        /// Executed on a latency sensitive thread, such as the UI thread.
        const SENSITIVE_THREAD = 1 << 5;
        /// Executed during application startup, as determined by the
        /// framework.
        const AM_STARTUP = 1 << 6;
        /// Executed after application startup, as determined by the
        /// framework.
        const AM_POST_STARTUP = 1 << 7;
        /// Executed during system boot.
        const BOOT = 1 << 8;
        /// Executed after the system has booted.
        const POST_BOOT = 1 << 9;

        // The startup bins capture the relative order in which a method
        // became hot. A profile merged from several runs may carry more than
        // one bin per method. The bin granularity is unspecified.
        const STARTUP_BIN_0 = 1 << 10;
        const STARTUP_BIN_1 = 1 << 11;
        const STARTUP_BIN_2 = 1 << 12;
        const STARTUP_BIN_3 = 1 << 13;
        const STARTUP_BIN_4 = 1 << 14;
        const STARTUP_BIN_5 = 1 << 15;
    }
}

impl MethodFlags {
    /// The position of this single flag in the method bitmap.
    ///
    /// Must only be called on values with exactly one bit set.
    pub(crate) fn bitmap_position(self) -> usize {
        debug_assert_eq!(self.bits().count_ones(), 1);
        self.bits().trailing_zeros() as usize
    }
}

/// The two profile dialects.
///
/// The kind is fixed per store and per file. It determines the method flag
/// set, the serialized width of profile indices, the version tag and the
/// size thresholds. Mixing kinds in cross-store operations is an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileKind {
    /// Per-application profile.
    Regular,
    /// Boot image profile, aggregating samples from many applications.
    BootImage,
}

impl ProfileKind {
    /// The version tag written after the file magic.
    pub(crate) fn version_bytes(self) -> [u8; 4] {
        match self {
            ProfileKind::Regular => *b"010\0",
            ProfileKind::BootImage => *b"012\0",
        }
    }

    /// Parses a version tag back into a kind.
    pub(crate) fn from_version_bytes(bytes: [u8; 4]) -> Option<Self> {
        match &bytes {
            b"010\0" => Some(ProfileKind::Regular),
            b"012\0" => Some(ProfileKind::BootImage),
            _ => None,
        }
    }

    /// All method flags representable in this kind.
    pub fn flags_mask(self) -> MethodFlags {
        match self {
            ProfileKind::Regular => {
                MethodFlags::HOT | MethodFlags::STARTUP | MethodFlags::POST_STARTUP
            }
            ProfileKind::BootImage => MethodFlags::all(),
        }
    }

    /// The number of flag rows in the method bitmap.
    pub(crate) fn flag_count(self) -> usize {
        self.flags_mask().bits().count_ones() as usize
    }

    /// The largest profile index value; records are assigned indices strictly
    /// below this.
    pub fn max_profile_index(self) -> ProfileIndex {
        match self {
            ProfileKind::Regular => u8::MAX as ProfileIndex,
            ProfileKind::BootImage => u16::MAX,
        }
    }

    /// The serialized width of a profile index, in bytes.
    pub(crate) fn profile_index_width(self) -> usize {
        match self {
            ProfileKind::Regular => 1,
            ProfileKind::BootImage => 2,
        }
    }

    /// File size above which load and save log a warning.
    pub(crate) fn warn_threshold_bytes(self) -> usize {
        match self {
            ProfileKind::Regular => 2 * 1024 * 1024,
            ProfileKind::BootImage => 4 * 1024 * 1024,
        }
    }

    /// File size above which load and save fail.
    pub(crate) fn error_threshold_bytes(self) -> usize {
        match self {
            ProfileKind::Regular => 16 * 1024 * 1024,
            ProfileKind::BootImage => 32 * 1024 * 1024,
        }
    }
}

/// Hotness information for a single method, as returned by queries.
///
/// Borrows the inline cache map from the store; any mutation of the store
/// invalidates it.
#[derive(Clone, Copy, Debug)]
pub struct MethodHotness<'a> {
    flags: MethodFlags,
    inline_caches: Option<&'a InlineCacheMap>,
}

impl<'a> MethodHotness<'a> {
    pub(crate) fn new(flags: MethodFlags, inline_caches: Option<&'a InlineCacheMap>) -> Self {
        Self {
            flags,
            inline_caches,
        }
    }

    /// Whether the method appears in the profile at all.
    pub fn is_in_profile(&self) -> bool {
        !self.flags.is_empty()
    }

    /// Whether the method is profile-hot.
    pub fn is_hot(&self) -> bool {
        self.flags.contains(MethodFlags::HOT)
    }

    /// Whether the method executed during application startup.
    pub fn is_startup(&self) -> bool {
        self.flags.contains(MethodFlags::STARTUP)
    }

    /// Whether the method executed after application startup.
    pub fn is_post_startup(&self) -> bool {
        self.flags.contains(MethodFlags::POST_STARTUP)
    }

    /// All flags recorded for the method.
    pub fn flags(&self) -> MethodFlags {
        self.flags
    }

    /// Whether all of the given flags are recorded for the method.
    pub fn has_flags(&self, flags: MethodFlags) -> bool {
        self.flags.contains(flags)
    }

    /// The inline caches of the method, present only for hot methods.
    pub fn inline_caches(&self) -> Option<&'a InlineCacheMap> {
        self.inline_caches
    }
}

impl Default for MethodHotness<'_> {
    fn default() -> Self {
        Self::new(MethodFlags::empty(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_positions_are_dense_per_kind() {
        let regular: Vec<_> = ProfileKind::Regular
            .flags_mask()
            .iter()
            .map(MethodFlags::bitmap_position)
            .collect();
        assert_eq!(regular, vec![0, 1, 2]);

        let boot: Vec<_> = ProfileKind::BootImage
            .flags_mask()
            .iter()
            .map(MethodFlags::bitmap_position)
            .collect();
        assert_eq!(boot, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn version_bytes_round_trip() {
        for kind in [ProfileKind::Regular, ProfileKind::BootImage] {
            assert_eq!(ProfileKind::from_version_bytes(kind.version_bytes()), Some(kind));
        }
        assert_eq!(ProfileKind::from_version_bytes(*b"009\0"), None);
    }

    #[test]
    fn boot_image_doubles_thresholds() {
        assert_eq!(
            ProfileKind::BootImage.warn_threshold_bytes(),
            2 * ProfileKind::Regular.warn_threshold_bytes()
        );
        assert_eq!(
            ProfileKind::BootImage.error_threshold_bytes(),
            2 * ProfileKind::Regular.error_threshold_bytes()
        );
    }
}
