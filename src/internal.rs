use crate::error::Error;
use crate::platform::{InterruptGuard, Platform};
use crate::raw;
use crate::validate::validate_key;
use crate::{Entry, Key, MAGICVERSION_KEY, Magic, Settings, Value, ValueType};
use alloc::format;
use alloc::vec::Vec;
#[cfg(feature = "defmt")]
use defmt::{trace, warn};

impl Magic {
    /// The leading `MAGICVERSION` entry holding the magic as decimal text.
    pub(crate) fn entry(&self) -> Entry {
        Entry {
            key: Key::from_str(MAGICVERSION_KEY),
            value_type: ValueType::Int,
            value: Value::truncated(&format!("{}", self.as_u32())),
        }
    }
}

impl<T: Platform> Settings<T> {
    /// Builds the table from `MAGICVERSION` + `defaults` and overlays a matching stored image.
    pub(crate) fn load(&mut self, defaults: &[Entry]) -> Result<Vec<Entry>, Error> {
        let capacity = self.region.capacity();

        #[cfg(feature = "defmt")]
        trace!(
            "load: @{:#08x}[{:#x}] capacity {} defaults {}",
            self.region.offset,
            self.region.size,
            capacity,
            defaults.len()
        );

        if defaults.len() + 1 > capacity {
            return Err(Error::TooManyDefaults);
        }

        let mut entries = Vec::new();
        entries
            .try_reserve_exact(capacity)
            .map_err(|_| Error::AllocationFailed)?;
        entries.push(self.magic.entry());
        load_defaults(&mut entries, defaults);

        let mut image = raw::try_alloc(self.region.size)?;
        self.hal
            .read(self.region.offset as u32, &mut image)
            .map_err(|_| Error::FlashError)?;

        let stored_magic = raw::decode_magic(&image);
        if stored_magic != self.magic.as_u32() {
            #[cfg(feature = "defmt")]
            trace!(
                "load: {} != {}, no settings found, using defaults",
                stored_magic,
                self.magic.as_u32()
            );

            #[cfg(feature = "debug-logs")]
            println!(
                "internal: {stored_magic} != {}, no settings found, using defaults",
                self.magic.as_u32()
            );
            return Ok(entries);
        }

        let expected = entries.len();
        let _read = raw::decode_table(&image, &mut entries, expected, capacity);

        #[cfg(feature = "defmt")]
        trace!("load: magic matches, restored {} stored entries", _read);

        #[cfg(feature = "debug-logs")]
        println!("internal: magic matches, restored {_read} stored entries");

        Ok(entries)
    }

    pub(crate) fn update_entry(
        &mut self,
        key: &str,
        value_type: ValueType,
        value: Value,
    ) -> Result<(), Error> {
        let key = Key::try_from_str(key)?;
        if key.as_str() == MAGICVERSION_KEY {
            return Err(Error::ReservedKey);
        }

        let entry = self
            .entries
            .as_mut()
            .and_then(|entries| entries.iter_mut().find(|e| e.key == key))
            .ok_or(Error::KeyNotFound)?;
        entry.value_type = value_type;
        entry.value = value;
        Ok(())
    }

    pub(crate) fn encode(&self) -> Result<Vec<u8>, Error> {
        let entries = self.entries.as_ref().ok_or(Error::NotInitialized)?;
        raw::encode_table(entries, self.region.size)
    }

    /// Erase followed by a program of the whole region. Interrupts stay masked for both steps if
    /// requested and are restored on every exit path.
    pub(crate) fn write_region(&mut self, image: &[u8], mask: bool) -> Result<(), Error> {
        debug_assert_eq!(image.len(), self.region.size);

        #[cfg(feature = "defmt")]
        trace!(
            "write_region: @{:#08x}[{:#x}] masked: {}",
            self.region.offset,
            image.len(),
            mask
        );

        #[cfg(feature = "debug-logs")]
        println!(
            "internal: write_region: 0x{:0>8x}[0x{:x}] masked: {mask}",
            self.region.offset,
            image.len()
        );

        let (from, to) = self.region_bounds();
        let mut hal = InterruptGuard::new(&mut self.hal, mask);
        hal.erase(from, to).map_err(|_| Error::FlashError)?;
        hal.write(from, image).map_err(|_| Error::FlashError)?;
        Ok(())
    }

    pub(crate) fn erase_region(&mut self, mask: bool) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        trace!("erase_region: @{:#08x}[{:#x}]", self.region.offset, self.region.size);

        #[cfg(feature = "debug-logs")]
        println!(
            "internal: erase_region: 0x{:0>8x}[0x{:x}]",
            self.region.offset, self.region.size
        );

        let (from, to) = self.region_bounds();
        let mut hal = InterruptGuard::new(&mut self.hal, mask);
        hal.erase(from, to).map_err(|_| Error::FlashError)
    }

    fn region_bounds(&self) -> (u32, u32) {
        // checked against u32::MAX when the region was bound
        let from = self.region.offset as u32;
        (from, from + self.region.size as u32)
    }
}

/// Copies the defaults behind the `MAGICVERSION` entry. An empty key ends the list. Malformed,
/// reserved or repeated keys are skipped with a warning and don't count as loaded.
fn load_defaults(entries: &mut Vec<Entry>, defaults: &[Entry]) {
    let mut _skipped = 0usize;
    for default in defaults {
        if default.key.trimmed().is_empty() {
            break;
        }

        let key = default.key.as_str();
        if validate_key(default.key.trimmed()).is_err() {
            #[cfg(feature = "defmt")]
            warn!("load_defaults: invalid key format for key {}", key);

            #[cfg(feature = "debug-logs")]
            println!("internal: WARNING: invalid key format for key {key}");
            _skipped += 1;
        } else if key == MAGICVERSION_KEY {
            #[cfg(feature = "defmt")]
            warn!("load_defaults: {} is reserved", key);

            #[cfg(feature = "debug-logs")]
            println!("internal: WARNING: {key} is reserved");
            _skipped += 1;
        } else if entries.iter().any(|e| e.key == default.key) {
            #[cfg(feature = "defmt")]
            warn!("load_defaults: duplicate key {}", key);

            #[cfg(feature = "debug-logs")]
            println!("internal: WARNING: duplicate key {key}");
            _skipped += 1;
        } else {
            entries.push(*default);
        }
    }

    #[cfg(feature = "defmt")]
    trace!(
        "load_defaults: loaded {} default entries, skipped {}",
        entries.len() - 1,
        _skipped
    );

    #[cfg(feature = "debug-logs")]
    println!(
        "internal: loaded {} default entries, skipped {_skipped}",
        entries.len() - 1
    );
}
