use crate::error::Error;
use crate::validate::{validate_key, validate_type};
use crate::{
    Entry, Key, MAX_KEY_NUL_TERMINATED_LENGTH, MAX_VALUE_NUL_TERMINATED_LENGTH, Value,
};
use alloc::vec::Vec;
use core::mem::size_of;
#[cfg(feature = "defmt")]
use defmt::trace;

pub(crate) const KEY_SIZE: usize = MAX_KEY_NUL_TERMINATED_LENGTH;
pub(crate) const TYPE_TAG_SIZE: usize = size_of::<u32>();
pub(crate) const VALUE_SIZE: usize = MAX_VALUE_NUL_TERMINATED_LENGTH;

/// Size of one packed record on flash: `key[30] | type: u32 LE | value[96]`.
pub const ENTRY_SIZE: usize = KEY_SIZE + TYPE_TAG_SIZE + VALUE_SIZE;

/// The magic lives in the value field of the first record.
pub(crate) const MAGIC_OFFSET: usize = KEY_SIZE + TYPE_TAG_SIZE;

// Compile-time assertion to ensure the record layout matches the firmware image format
const _: () = assert!(ENTRY_SIZE == 130, "Record size must be 130 bytes");

/// Type tag of an entry. The value itself is always stored as text.
#[derive(
    strum::FromRepr,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    Debug,
    Eq,
    PartialEq,
    Copy,
    Clone,
)]
#[strum(serialize_all = "UPPERCASE")]
#[strum(ascii_case_insensitive)]
#[repr(u32)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValueType {
    Int = 0,
    String = 1,
    Bool = 2,
}

/// One record as found on flash, before it is checked.
pub(crate) struct RawEntry {
    pub(crate) key: [u8; KEY_SIZE],
    pub(crate) type_tag: u32,
    pub(crate) value: [u8; VALUE_SIZE],
}

impl RawEntry {
    pub(crate) fn read(src: &[u8]) -> Self {
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&src[..KEY_SIZE]);
        let mut tag = [0u8; TYPE_TAG_SIZE];
        tag.copy_from_slice(&src[KEY_SIZE..MAGIC_OFFSET]);
        let mut value = [0u8; VALUE_SIZE];
        value.copy_from_slice(&src[MAGIC_OFFSET..ENTRY_SIZE]);
        Self {
            key,
            type_tag: u32::from_le_bytes(tag),
            value,
        }
    }

    /// Returns `None` if the record marks the end of the stored entries: an empty key, a key with
    /// illegal characters or an unknown type tag. Blank or foreign flash ends up here.
    pub(crate) fn check(&self) -> Option<Entry> {
        let key = match self.key.iter().position(|&b| b == 0) {
            Some(0) => return None,
            Some(len) => &self.key[..len],
            None => &self.key[..],
        };
        validate_key(key).ok()?;
        let value_type = validate_type(self.type_tag).ok()?;

        // a key filling all 30 bytes has no terminator and can't match any in-memory key
        let mut raw_key = [0u8; KEY_SIZE];
        raw_key[..key.len()].copy_from_slice(key);
        Some(Entry {
            key: Key::from_raw(raw_key),
            value_type,
            value: Value::from_raw(self.value),
        })
    }
}

impl Entry {
    pub(crate) fn write(&self, dst: &mut [u8]) {
        dst[..KEY_SIZE].copy_from_slice(self.key.as_bytes());
        dst[KEY_SIZE..MAGIC_OFFSET].copy_from_slice(&(self.value_type as u32).to_le_bytes());
        dst[MAGIC_OFFSET..ENTRY_SIZE].copy_from_slice(self.value.as_bytes());
    }
}

/// Parses the magic stored as decimal text in the value field of the first record. Reading stops
/// at the first null byte or non-digit. Returns 0 if there are no digits or the number overflows.
pub(crate) fn decode_magic(region: &[u8]) -> u32 {
    let end = region.len().min(ENTRY_SIZE);
    if end <= MAGIC_OFFSET {
        return 0;
    }
    let field = &region[MAGIC_OFFSET..end];
    let field = match field.iter().position(|&b| b == 0) {
        Some(idx) => &field[..idx],
        None => field,
    };

    let digits = field
        .iter()
        .skip_while(|b| b.is_ascii_whitespace())
        .take_while(|b| b.is_ascii_digit());

    let mut magic = 0u32;
    let mut seen = false;
    for &digit in digits {
        seen = true;
        magic = match magic
            .checked_mul(10)
            .and_then(|m| m.checked_add(u32::from(digit - b'0')))
        {
            Some(m) => m,
            None => return 0,
        };
    }
    if seen { magic } else { 0 }
}

/// Lays the records stored in `region` over `entries`, matching by key. Stops at the first record
/// that doesn't look like a valid entry and reads at most `min(expected, max)` slots. Records
/// whose key isn't in `entries` are dropped.
///
/// Returns the number of slots that held a valid record.
pub(crate) fn decode_table(
    region: &[u8],
    entries: &mut [Entry],
    expected_entries: usize,
    max_entries: usize,
) -> usize {
    let mut count = 0;
    for slot in region
        .chunks_exact(ENTRY_SIZE)
        .take(expected_entries.min(max_entries))
    {
        let Some(stored) = RawEntry::read(slot).check() else {
            #[cfg(feature = "defmt")]
            trace!("decode_table: end of stored entries at slot {}", count);

            #[cfg(feature = "debug-logs")]
            println!("  raw: end of stored entries at slot {count}");
            break;
        };

        if let Some(existing) = entries.iter_mut().find(|e| e.key == stored.key) {
            existing.value_type = stored.value_type;
            existing.value = stored.value;
        } else {
            #[cfg(feature = "debug-logs")]
            println!("  raw: dropping unknown stored key {}", stored.key.as_str());
        }
        count += 1;
    }
    count
}

/// Serializes `entries` back to back into a zero-padded image of exactly `region_size` bytes.
pub(crate) fn encode_table(entries: &[Entry], region_size: usize) -> Result<Vec<u8>, Error> {
    if entries.len() * ENTRY_SIZE > region_size {
        return Err(Error::RegionTooSmall);
    }

    let mut image = try_alloc(region_size)?;
    for (entry, slot) in entries.iter().zip(image.chunks_exact_mut(ENTRY_SIZE)) {
        entry.write(slot);
    }
    Ok(image)
}

/// Zero-filled buffer that reports allocation failure instead of aborting.
pub(crate) fn try_alloc(len: usize) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailed)?;
    buf.resize(len, 0);
    Ok(buf)
}

/// Keys and values are saved in fixed-width, null padded arrays. We have to slice before the
/// first null byte if we want a str. Invalid UTF-8 from foreign flash cuts the
/// text at the last valid character.
pub(crate) fn slice_with_nullbytes_to_str(raw: &[u8]) -> &str {
    let sliced = match raw.iter().position(|&e| e == 0x00) {
        None => raw,
        Some(idx) => &raw[..idx],
    };
    match core::str::from_utf8(sliced) {
        Ok(s) => s,
        Err(e) => core::str::from_utf8(&sliced[..e.valid_up_to()]).unwrap_or_default(),
    }
}
