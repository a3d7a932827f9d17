#![doc = include_str ! ("../README.md")]
#![cfg_attr(not(target_arch = "x86_64"), no_std)]

pub mod error;
mod get;
mod internal;
pub mod platform;
mod print;
mod put;
mod raw;
pub mod validate;

/// Maximum Key length is 29 bytes + 1 byte for the null terminator.
pub const MAX_KEY_LENGTH: usize = 29;
const MAX_KEY_NUL_TERMINATED_LENGTH: usize = MAX_KEY_LENGTH + 1;

/// Maximum Value length is 95 bytes + 1 byte for the null terminator.
pub const MAX_VALUE_LENGTH: usize = 95;
const MAX_VALUE_NUL_TERMINATED_LENGTH: usize = MAX_VALUE_LENGTH + 1;

/// Key of the leading entry that carries the combined magic and version.
pub const MAGICVERSION_KEY: &str = "MAGICVERSION";

pub use raw::{ENTRY_SIZE, ValueType};

/// A 30-byte key (29 characters + null terminator). Valid keys only contain `A-Z`, `0-9` and `_`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Key([u8; MAX_KEY_NUL_TERMINATED_LENGTH]);

impl Key {
    /// Creates a 30 byte, null-padded byte array used as key.
    ///
    /// Usage: `Key::from_str("WIFI_SSID")`
    ///
    /// Tip: use a const context if possible to ensure that the key is transformed at compile time:
    ///   `let my_key = const { Key::from_str("WIFI_SSID") };`
    ///
    /// # Panics
    ///
    /// Panics if `s` is longer than [`MAX_KEY_LENGTH`] bytes. Use [`Key::try_from_str`] for keys
    /// only known at runtime.
    pub const fn from_str(s: &str) -> Self {
        Self::from_slice(s.as_bytes())
    }

    /// Same as [`Key::from_str`] but accepts a byte slice.
    ///
    /// # Panics
    ///
    /// Panics if `src` is longer than [`MAX_KEY_LENGTH`] bytes.
    pub const fn from_slice(src: &[u8]) -> Self {
        assert!(src.len() <= MAX_KEY_LENGTH);
        let mut dst = [0u8; MAX_KEY_NUL_TERMINATED_LENGTH];
        let mut i = 0;
        while i < src.len() {
            dst[i] = src[i];
            i += 1;
        }
        Self(dst)
    }

    /// Fallible variant of [`Key::from_str`] for keys only known at runtime. The characters are
    /// validated as well.
    pub fn try_from_str(s: &str) -> Result<Self, error::Error> {
        if s.len() > MAX_KEY_LENGTH {
            return Err(error::Error::KeyTooLong);
        }
        validate::validate_key(s.as_bytes())?;
        Ok(Self::from_slice(s.as_bytes()))
    }

    /// Converts a key to a byte array.
    pub const fn as_bytes(&self) -> &[u8; MAX_KEY_NUL_TERMINATED_LENGTH] {
        &self.0
    }

    /// The key without its null padding.
    pub fn as_str(&self) -> &str {
        raw::slice_with_nullbytes_to_str(&self.0)
    }

    pub(crate) fn from_raw(raw: [u8; MAX_KEY_NUL_TERMINATED_LENGTH]) -> Self {
        Self(raw)
    }

    /// The raw key bytes up to the first null byte.
    pub(crate) fn trimmed(&self) -> &[u8] {
        match self.0.iter().position(|&b| b == 0) {
            Some(len) => &self.0[..len],
            None => &self.0,
        }
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key(\"{}\")", self.as_str())
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// A 96-byte value field holding the canonical text of a setting (95 characters + null
/// terminator).
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Value([u8; MAX_VALUE_NUL_TERMINATED_LENGTH]);

impl Value {
    /// Creates a null-padded value.
    ///
    /// # Panics
    ///
    /// Panics if `s` exceeds [`MAX_VALUE_LENGTH`] bytes, which turns into a compile error in const
    /// context. Use [`Value::truncated`] for text only known at runtime.
    pub const fn from_str(s: &str) -> Self {
        let src = s.as_bytes();
        assert!(src.len() <= MAX_VALUE_LENGTH);
        let mut dst = [0u8; MAX_VALUE_NUL_TERMINATED_LENGTH];
        let mut i = 0;
        while i < src.len() {
            dst[i] = src[i];
            i += 1;
        }
        Self(dst)
    }

    /// Creates a value from arbitrary text, cutting it at the last character boundary that fits
    /// into [`MAX_VALUE_LENGTH`] bytes.
    pub fn truncated(s: &str) -> Self {
        let mut end = s.len().min(MAX_VALUE_LENGTH);
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        let mut dst = [0u8; MAX_VALUE_NUL_TERMINATED_LENGTH];
        dst[..end].copy_from_slice(&s.as_bytes()[..end]);
        Self(dst)
    }

    pub const fn as_bytes(&self) -> &[u8; MAX_VALUE_NUL_TERMINATED_LENGTH] {
        &self.0
    }

    /// The value text without its null padding.
    pub fn as_str(&self) -> &str {
        raw::slice_with_nullbytes_to_str(&self.0)
    }

    pub(crate) fn from_raw(mut raw: [u8; MAX_VALUE_NUL_TERMINATED_LENGTH]) -> Self {
        // values read back from foreign flash are not guaranteed to be terminated
        raw[MAX_VALUE_LENGTH] = 0;
        Self(raw)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value(\"{}\")", self.as_str())
    }
}

/// A single named, typed setting. The value is always kept as text.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Entry {
    pub(crate) key: Key,
    pub(crate) value_type: ValueType,
    pub(crate) value: Value,
}

impl Entry {
    /// Declares a default entry, usually in a const table:
    ///
    /// ```ignore
    /// const DEFAULTS: [Entry; 2] = [
    ///     Entry::new("TIMEOUT", ValueType::Int, "60"),
    ///     Entry::new("NAME", ValueType::String, "device"),
    /// ];
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `key` exceeds [`MAX_KEY_LENGTH`] or `value` exceeds [`MAX_VALUE_LENGTH`] bytes.
    /// Key characters are not checked here, invalid defaults are skipped when the table is loaded.
    pub const fn new(key: &str, value_type: ValueType, value: &str) -> Self {
        Self {
            key: Key::from_str(key),
            value_type,
            value: Value::from_str(value),
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    pub fn raw_value(&self) -> &Value {
        &self.value
    }
}

/// Combined 16-bit schema magic and 16-bit version. A stored image is only adopted if its
/// `MAGICVERSION` entry matches.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Magic(u32);

impl Magic {
    pub const fn new(magic: u16, version: u16) -> Self {
        Self(((magic as u32) << 16) | version as u32)
    }

    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    pub const fn magic(&self) -> u16 {
        (self.0 >> 16) as u16
    }

    pub const fn version(&self) -> u16 {
        self.0 as u16
    }
}

/// The flash window the settings are persisted in. Offset and size have to be multiples of the
/// erase size of the flash.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Region {
    pub offset: usize,
    pub size: usize,
}

impl Region {
    pub const fn new(offset: usize, size: usize) -> Self {
        Self { offset, size }
    }

    /// Number of entries (including `MAGICVERSION`) that fit into the region.
    pub const fn capacity(&self) -> usize {
        self.size / ENTRY_SIZE
    }
}

pub use get::Get;
pub use put::Put;

extern crate alloc;

use crate::error::Error;
use crate::platform::Platform;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

/// The Settings struct owns the in-memory entry table of one flash region. Several independent
/// instances may be bound to different regions of the same flash.
pub struct Settings<T: Platform> {
    pub(crate) hal: T,
    pub(crate) region: Region,
    pub(crate) magic: Magic,

    // None after `erase` until the next `init`
    pub(crate) entries: Option<Vec<Entry>>,
}

impl<T: Platform> Settings<T> {
    /// Binds the store to `region` and loads it:
    /// 1. The `MAGICVERSION` entry followed by all valid `defaults` form the table
    /// 2. If the region starts with a matching `MAGICVERSION` entry, the stored values are laid
    ///    over the defaults. Stored keys without a default are dropped.
    ///
    /// Empty, erased or foreign flash content silently results in the defaults.
    pub fn new(hal: T, region: Region, magic: Magic, defaults: &[Entry]) -> Result<Settings<T>, Error> {
        if !region.offset.is_multiple_of(T::ERASE_SIZE) {
            return Err(Error::InvalidRegionOffset);
        }

        if region.size == 0 || !region.size.is_multiple_of(T::ERASE_SIZE) {
            return Err(Error::InvalidRegionSize);
        }

        match region.offset.checked_add(region.size) {
            Some(end) if end <= hal.capacity() && end <= u32::MAX as usize => {}
            _ => return Err(Error::InvalidRegionSize),
        }

        let mut settings = Self {
            hal,
            region,
            magic,
            entries: None,
        };
        settings.init(defaults)?;
        Ok(settings)
    }

    /// (Re-)initializes the table of the already bound region, e.g. after [`Settings::erase`].
    ///
    /// Returns the number of live entries including `MAGICVERSION`. Malformed, duplicate or
    /// reserved default keys are skipped and not counted.
    pub fn init(&mut self, defaults: &[Entry]) -> Result<usize, Error> {
        self.entries = None;
        let entries = self.load(defaults)?;
        let count = entries.len();
        self.entries = Some(entries);
        Ok(count)
    }

    /// Frees the table and returns the flash.
    pub fn deinit(self) -> T {
        self.hal
    }

    /// Number of live entries including `MAGICVERSION`, 0 after [`Settings::erase`].
    pub fn len(&self) -> usize {
        self.entries.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of entries the region can hold.
    pub fn capacity(&self) -> usize {
        self.region.capacity()
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn magic(&self) -> Magic {
        self.magic
    }

    /// All live entries in table order, `MAGICVERSION` first.
    pub fn entries(&self) -> &[Entry] {
        self.entries.as_deref().unwrap_or(&[])
    }

    /// Looks up an entry. Returns `None` for malformed keys as well as for unknown ones.
    pub fn find(&self, key: &str) -> Option<&Entry> {
        let key = Key::try_from_str(key).ok()?;
        self.entries().iter().find(|entry| entry.key == key)
    }

    /// Get a typed value.
    ///
    /// Supported types are i32, bool and String.
    pub fn get<R>(&self, key: &str) -> Result<R, Error>
    where
        Settings<T>: Get<R>,
    {
        Get::get(self, key)
    }

    /// Update an existing entry with a typed value. Only changes memory, see [`Settings::save`].
    ///
    /// Supported types are i32, bool and &str.
    pub fn put<R>(&mut self, key: &str, value: R) -> Result<(), Error>
    where
        Settings<T>: Put<R>,
    {
        Put::put(self, key, value)
    }

    /// Stores `value` as decimal text and sets the type to INT.
    pub fn put_int(&mut self, key: &str, value: i32) -> Result<(), Error> {
        let text = format!("{value}");
        self.update_entry(key, ValueType::Int, Value::truncated(&text))
    }

    /// Stores `"true"` or `"false"` and sets the type to BOOL.
    pub fn put_bool(&mut self, key: &str, value: bool) -> Result<(), Error> {
        let text = if value { "true" } else { "false" };
        self.update_entry(key, ValueType::Bool, Value::from_str(text))
    }

    /// Stores `value` and sets the type to STRING. Values longer than [`MAX_VALUE_LENGTH`] bytes
    /// are truncated.
    pub fn put_string(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.update_entry(key, ValueType::String, Value::truncated(value))
    }

    /// Writes the whole table to flash by erasing and programming the complete region.
    ///
    /// With `disable_interrupts` the erase and program pair runs with interrupts masked. A power
    /// loss between the two leaves an erased region, which loads as defaults.
    pub fn save(&mut self, disable_interrupts: bool) -> Result<(), Error> {
        let image = self.encode()?;
        self.write_region(&image, disable_interrupts)
    }

    /// Erases the region and frees the table. Call [`Settings::init`] to use the store again.
    pub fn erase(&mut self) -> Result<(), Error> {
        self.erase_region(true)?;
        self.entries = None;
        Ok(())
    }

    /// Renders the table into `buffer`, or to the log output (`defmt` / `debug-logs`) if no
    /// buffer is given.
    pub fn print(&self, buffer: Option<&mut String>) -> fmt::Result {
        match buffer {
            Some(buffer) => self.render(buffer),
            None => {
                self.log_table();
                Ok(())
            }
        }
    }
}
