use crate::error::Error;
use crate::platform::Platform;
use crate::Settings;

pub trait Put<T> {
    fn put(&mut self, key: &str, value: T) -> Result<(), Error>;
}

impl<T, S: Put<T>> Put<T> for &mut S {
    fn put(&mut self, key: &str, value: T) -> Result<(), Error> {
        (*self).put(key, value)
    }
}

impl<T: Platform> Put<i32> for Settings<T> {
    fn put(&mut self, key: &str, value: i32) -> Result<(), Error> {
        self.put_int(key, value)
    }
}

impl<T: Platform> Put<bool> for Settings<T> {
    fn put(&mut self, key: &str, value: bool) -> Result<(), Error> {
        self.put_bool(key, value)
    }
}

impl<T: Platform> Put<&str> for Settings<T> {
    fn put(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.put_string(key, value)
    }
}
