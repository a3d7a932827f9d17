//! Checks applied to every key and type tag entering the store, whether it comes from the caller,
//! the default table or the flash.

use crate::error::Error;
use crate::raw::ValueType;

/// A key must not be empty and may only contain `A-Z`, `0-9` and `_`.
pub fn validate_key(key: &[u8]) -> Result<(), Error> {
    if key.is_empty() {
        return Err(Error::KeyMalformed);
    }

    if key
        .iter()
        .all(|&c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == b'_')
    {
        Ok(())
    } else {
        Err(Error::KeyMalformed)
    }
}

/// Maps a raw type tag to a [`ValueType`]. Only 0 (INT), 1 (STRING) and 2 (BOOL) are valid.
pub fn validate_type(tag: u32) -> Result<ValueType, Error> {
    ValueType::from_repr(tag).ok_or(Error::InvalidType(tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys() {
        assert_eq!(validate_key(b"TEST1"), Ok(()));
        assert_eq!(validate_key(b"WIFI_SSID_2"), Ok(()));
        assert_eq!(validate_key(b"_"), Ok(()));

        assert_eq!(validate_key(b""), Err(Error::KeyMalformed));
        assert_eq!(validate_key(b"test"), Err(Error::KeyMalformed));
        assert_eq!(validate_key(b"TEST 1"), Err(Error::KeyMalformed));
        assert_eq!(validate_key(b"TEST-1"), Err(Error::KeyMalformed));
        assert_eq!(validate_key(b"\xFF\xFF"), Err(Error::KeyMalformed));
    }

    #[test]
    fn types() {
        assert_eq!(validate_type(0), Ok(ValueType::Int));
        assert_eq!(validate_type(1), Ok(ValueType::String));
        assert_eq!(validate_type(2), Ok(ValueType::Bool));
        assert_eq!(validate_type(3), Err(Error::InvalidType(3)));
        assert_eq!(validate_type(u32::MAX), Err(Error::InvalidType(u32::MAX)));
    }
}
