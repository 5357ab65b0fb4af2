use memmap2::Mmap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom};
use std::ops::Deref;
use std::path::Path;
use unsplice_core::{CoreError, Result};

/// A whole input file held in memory, either mapped or read into a buffer.
///
/// Mapping is preferred; empty files and sources that refuse to be mapped
/// fall back to a plain buffered read.
pub enum Blob {
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

impl Blob {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match map_file(path) {
            Ok(mmap) => Ok(Blob::Mapped(mmap)),
            Err(e) => {
                tracing::debug!(
                    path = %path.display(),
                    error = %e,
                    "mmap failed, reading into memory"
                );
                Ok(Blob::Buffered(read_file(path)?))
            }
        }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Blob::Mapped(m) => m,
            Blob::Buffered(v) => v,
        }
    }

    #[inline]
    pub fn is_mapped(&self) -> bool {
        matches!(self, Blob::Mapped(_))
    }
}

impl Deref for Blob {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl AsRef<[u8]> for Blob {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

fn map_file(path: &Path) -> Result<Mmap> {
    let mut file = File::open(path)?;
    let size = file.seek(SeekFrom::End(0))?;

    if size == 0 {
        return Err(CoreError::InvalidFormat("Cannot mmap empty file".to_string()));
    }

    // SAFETY: the mapping is read-only and inputs are not expected to be
    // modified while a split is running.
    let mmap = unsafe { Mmap::map(&file) }?;

    if mmap.is_empty() {
        return Err(CoreError::InvalidFormat(
            "mmap returned empty mapping".to_string(),
        ));
    }

    #[cfg(target_os = "linux")]
    {
        let _ = mmap.advise(memmap2::Advice::Sequential);
    }

    Ok(mmap)
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let mut file = OpenOptions::new().read(true).write(false).open(path)?;

    #[cfg(target_os = "linux")]
    {
        use rustix::fs::{fadvise, Advice};
        let _ = fadvise(&file, 0, None, Advice::Sequential);
    }

    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_open_maps_regular_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"\xFF\xD8 some bytes").unwrap();
        temp_file.flush().unwrap();

        let blob = Blob::open(temp_file.path()).unwrap();
        assert!(blob.is_mapped());
        assert_eq!(&blob[..2], &[0xFF, 0xD8]);
        assert_eq!(blob.len(), 13);
    }

    #[test]
    fn test_empty_file_falls_back_to_buffer() {
        let temp_file = NamedTempFile::new().unwrap();
        let blob = Blob::open(temp_file.path()).unwrap();
        assert!(!blob.is_mapped());
        assert!(blob.is_empty());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Blob::open(dir.path().join("missing.bin"));
        assert!(matches!(result, Err(CoreError::Io(_))));
    }
}
