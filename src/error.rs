use crate::raw;
use thiserror::Error;

pub use raw::ValueType;

/// Errors that can occur during settings operations. Marked as non-exhaustive to allow for future
/// additions without breaking the API. A caller would likely only need to handle KeyNotFound and
/// RegionTooSmall at runtime as the configuration errors are static.
#[derive(Error, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The region offset has to be aligned to the erase size of the flash (usually 4k)
    #[error("invalid region offset")]
    InvalidRegionOffset,

    /// The region size has to be a non-zero multiple of the erase size of the flash (usually 4k)
    #[error("invalid region size")]
    InvalidRegionSize,

    /// The default table plus the leading magic entry does not fit into the region.
    #[error("too many default entries for the region")]
    TooManyDefaults,

    /// The internal error value is returned from the provided `&mut impl NorFlash`
    #[error("internal flash error")]
    FlashError,

    /// Keys must not be empty and may only contain `A-Z`, `0-9` and `_`.
    #[error("key malformed")]
    KeyMalformed,

    /// The max key length is 29 bytes plus null terminator.
    #[error("key too long")]
    KeyTooLong,

    /// `MAGICVERSION` is owned by the store and can't be updated by the caller.
    #[error("key is reserved")]
    ReservedKey,

    /// Type tags are limited to INT (0), STRING (1) and BOOL (2).
    #[error("invalid type tag: {0}")]
    InvalidType(u32),

    /// The key is not part of the default table.
    #[error("key not found")]
    KeyNotFound,

    /// The stored type is reported
    #[error("item type mismatch: {0}")]
    ItemTypeMismatch(ValueType),

    /// The stored text can't be parsed as the requested type.
    #[error("value malformed")]
    ValueMalformed,

    /// The encoded table would not fit into the bound region. Nothing has been written.
    #[error("region too small")]
    RegionTooSmall,

    /// Memory for the entry table could not be reserved.
    #[error("allocation failed")]
    AllocationFailed,

    /// The store has been erased and needs to be initialized again.
    #[error("not initialized")]
    NotInitialized,
}
