//! The `Get<T>` trait and its implementation in this module allows providing a single generic,
//! overloaded function `get<T>()` for all supported types of the store. Values are kept as text,
//! so every getter parses the canonical representation written by the matching `put_*`.

use crate::error::Error;
use crate::platform::Platform;
use crate::{Entry, Settings, ValueType};
use alloc::string::{String, ToString};

pub trait Get<T> {
    fn get(&self, key: &str) -> Result<T, Error>;
}

impl<T, G: Get<T>> Get<T> for &G {
    fn get(&self, key: &str) -> Result<T, Error> {
        (*self).get(key)
    }
}

impl<T: Platform> Settings<T> {
    fn typed_entry(&self, key: &str, value_type: ValueType) -> Result<&Entry, Error> {
        let entry = self.find(key).ok_or(Error::KeyNotFound)?;
        if entry.value_type != value_type {
            return Err(Error::ItemTypeMismatch(entry.value_type));
        }
        Ok(entry)
    }
}

impl<T: Platform> Get<i32> for Settings<T> {
    fn get(&self, key: &str) -> Result<i32, Error> {
        let entry = self.typed_entry(key, ValueType::Int)?;
        entry.value().parse().map_err(|_| Error::ValueMalformed)
    }
}

impl<T: Platform> Get<bool> for Settings<T> {
    fn get(&self, key: &str) -> Result<bool, Error> {
        let entry = self.typed_entry(key, ValueType::Bool)?;
        match entry.value() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(Error::ValueMalformed),
        }
    }
}

impl<T: Platform> Get<String> for Settings<T> {
    fn get(&self, key: &str) -> Result<String, Error> {
        let entry = self.typed_entry(key, ValueType::String)?;
        Ok(entry.value().to_string())
    }
}
