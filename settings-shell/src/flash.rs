use std::fs::{
    File,
    OpenOptions,
};
use std::io::{
    self,
    Read,
    Seek,
    SeekFrom,
    Write,
};
use std::path::Path;

use embedded_storage::nor_flash::{
    check_erase,
    check_read,
    check_write,
    ErrorType,
    NorFlash,
    NorFlashError,
    NorFlashErrorKind,
    ReadNorFlash,
};
use flash_settings::platform::Interrupts;
use thiserror::Error;

pub const SECTOR_SIZE: usize = 4096;

/// An image file standing in for a NOR flash device. Programming can only clear bits, erasing
/// sets whole sectors back to `0xFF`.
pub struct FileFlash {
    file: File,
    capacity: usize,
}

#[derive(Error, Debug)]
pub enum FileFlashError {
    #[error("flash access rejected: {0:?}")]
    Rejected(NorFlashErrorKind),

    #[error("io error: {0}")]
    IoError(#[from] io::Error),
}

impl NorFlashError for FileFlashError {
    fn kind(&self) -> NorFlashErrorKind {
        match self {
            FileFlashError::Rejected(kind) => *kind,
            FileFlashError::IoError(_) => NorFlashErrorKind::Other,
        }
    }
}

impl From<NorFlashErrorKind> for FileFlashError {
    fn from(kind: NorFlashErrorKind) -> Self {
        FileFlashError::Rejected(kind)
    }
}

impl FileFlash {
    /// Opens `path`, creating it if missing. Files shorter than `min_len` are extended with erased
    /// bytes.
    pub fn open(path: &Path, min_len: usize) -> io::Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let len = file.metadata()?.len() as usize;
        if len < min_len {
            file.seek(SeekFrom::End(0))?;
            file.write_all(&vec![0xFF; min_len - len])?;
            file.flush()?;
        }

        Ok(Self {
            file,
            capacity: len.max(min_len),
        })
    }

    fn read_at(&mut self, offset: u32, bytes: &mut [u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.read_exact(bytes)
    }

    fn write_at(&mut self, offset: u32, bytes: &[u8]) -> io::Result<()> {
        self.file.seek(SeekFrom::Start(offset as u64))?;
        self.file.write_all(bytes)?;
        self.file.flush()
    }
}

impl ErrorType for FileFlash {
    type Error = FileFlashError;
}

impl ReadNorFlash for FileFlash {
    const READ_SIZE: usize = 1;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        check_read(self, offset, bytes.len())?;
        self.read_at(offset, bytes)?;
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

impl NorFlash for FileFlash {
    const WRITE_SIZE: usize = 1;

    const ERASE_SIZE: usize = SECTOR_SIZE;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        check_erase(self, from, to)?;
        self.write_at(from, &vec![0xFF; (to - from) as usize])?;
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        check_write(self, offset, bytes.len())?;

        let mut current = vec![0u8; bytes.len()];
        self.read_at(offset, &mut current)?;
        for (cell, &val) in current.iter_mut().zip(bytes) {
            // NOR flash can only flip bits from 1 to 0
            *cell &= val;
        }
        self.write_at(offset, &current)?;
        Ok(())
    }
}

/// Nothing can preempt a hosted image file.
impl Interrupts for FileFlash {
    type Token = ();

    fn mask(&mut self) -> Self::Token {}

    fn restore(&mut self, _token: Self::Token) {}
}
