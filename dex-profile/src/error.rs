use std::io;

use thiserror::Error;

/// Errors produced when building, merging, loading or saving a profile.
///
/// I/O failures always surface as [`ProfileError::Io`] so that callers can
/// tell a failing disk apart from a semantically invalid profile.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Loading into a store that already holds data.
    #[error("loading would overwrite existing profile data")]
    WouldOverwrite,
    /// The underlying reader or writer failed.
    #[error("i/o error")]
    Io(#[from] io::Error),
    /// The file carries an unknown or incompatible version tag.
    #[error("profile version mismatch")]
    VersionMismatch,
    /// The file is structurally invalid.
    #[error("bad profile data: {0}")]
    BadData(String),
    /// Compressed or uncompressed payload exceeds the hard size limit.
    #[error("profile size limit exceeded")]
    LimitExceeded,
    /// The store cannot hold more dex files for its kind.
    #[error("profile cannot hold more dex files")]
    TooManyDexFiles,
    /// The dex location cannot be turned into a profile key.
    #[error("invalid dex location: {0}")]
    InvalidDexLocation(String),
    /// A profile key resolved to a record with a different checksum or
    /// method count.
    #[error("conflicting dex descriptor for profile key `{0}`")]
    DescriptorMismatch(String),
    /// Re-keying a record would collide with another record.
    #[error("profile key collision on `{0}`")]
    KeyCollision(String),
    /// A cross-store operation was attempted between different profile kinds.
    #[error("profile kinds differ")]
    KindMismatch,
    /// A method index is not within the dex file's method table.
    #[error("method index out of range")]
    MethodIndexOutOfRange,
    /// The given flags are not representable in this profile kind.
    #[error("method flags not representable in this profile kind")]
    UnsupportedFlags,
}
