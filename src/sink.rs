//! Output sinks: atomic file, caller-owned handle, or in-memory buffer

use crate::error::{Result, XmlError};
use crate::types::PART_SUFFIX;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Byte destination of an [`XmlWriter`](crate::XmlWriter)
///
/// The writer only ever calls [`Sink::write_bytes`] and [`Sink::finalize`].
pub enum Sink<'a> {
    /// Writes through `<path>.part` and renames over `<path>` on success
    File(AtomicFile),
    /// Handle supplied by the caller, who keeps its lifecycle
    Handle(&'a mut dyn Write),
    /// Growable in-memory buffer
    Buffer(Vec<u8>),
}

impl Sink<'_> {
    /// Append bytes to the sink
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Sink::File(file) => file.write_all(data),
            Sink::Handle(handle) => handle
                .write_all(data)
                .map_err(|e| XmlError::WriteError(format!("Failed to write to handle: {}", e))),
            Sink::Buffer(buffer) => {
                buffer.try_reserve(data.len()).map_err(|e| {
                    XmlError::WriteError(format!("Failed to grow buffer: {}", e))
                })?;
                buffer.extend_from_slice(data);
                Ok(())
            }
        }
    }

    /// Finish the sink: commit when `commit` is true, otherwise discard
    ///
    /// Caller handles are flushed on commit and never closed; buffers keep
    /// their bytes either way.
    pub fn finalize(&mut self, commit: bool) -> Result<()> {
        match self {
            Sink::File(file) => {
                if commit {
                    file.commit()
                } else {
                    file.discard()
                }
            }
            Sink::Handle(handle) => {
                if commit {
                    handle.flush().map_err(|e| {
                        XmlError::WriteError(format!("Failed to flush handle: {}", e))
                    })?;
                }
                Ok(())
            }
            Sink::Buffer(_) => Ok(()),
        }
    }

    /// Accumulated bytes, for buffer sinks only
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Sink::Buffer(buffer) => Some(buffer.as_slice()),
            _ => None,
        }
    }
}

/// File written under a temporary `.part` name and renamed into place
pub struct AtomicFile {
    target: PathBuf,
    part: PathBuf,
    file: Option<BufWriter<File>>,
    sync: bool,
}

impl AtomicFile {
    /// Create `<target>.part` for writing, truncating any stale one
    pub fn create<P: AsRef<Path>>(target: P, buffer_size: usize, sync: bool) -> Result<Self> {
        let target = target.as_ref().to_path_buf();
        let part = part_path(&target);

        let file = File::create(&part).map_err(|e| {
            XmlError::WriteError(format!("Failed to create {}: {}", part.display(), e))
        })?;

        Ok(AtomicFile {
            target,
            part,
            file: Some(BufWriter::with_capacity(buffer_size, file)),
            sync,
        })
    }

    /// Final path of the document
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Temporary path written until commit
    pub fn part(&self) -> &Path {
        &self.part
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| XmlError::WriteError("File already finalized".to_string()))?;

        file.write_all(data)
            .map_err(|e| XmlError::WriteError(format!("Failed to write to file: {}", e)))
    }

    /// Flush, close and rename the part file over the target
    ///
    /// If any step fails the part file is removed instead.
    fn commit(&mut self) -> Result<()> {
        let Some(writer) = self.file.take() else {
            return Ok(());
        };

        let result = Self::close(writer, self.sync)
            .and_then(|()| fs::rename(&self.part, &self.target).map_err(XmlError::from));

        match result {
            Ok(()) => {
                tracing::debug!(path = %self.target.display(), "committed document");
                Ok(())
            }
            Err(e) => {
                tracing::error!(part = %self.part.display(), error = %e, "commit failed");
                let _ = fs::remove_file(&self.part);
                Err(e)
            }
        }
    }

    /// Close and remove the part file
    fn discard(&mut self) -> Result<()> {
        let Some(writer) = self.file.take() else {
            return Ok(());
        };
        drop(writer);

        tracing::debug!(part = %self.part.display(), "discarding partial document");
        match fs::remove_file(&self.part) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn close(writer: BufWriter<File>, sync: bool) -> Result<()> {
        let file = writer
            .into_inner()
            .map_err(|e| XmlError::WriteError(format!("Failed to flush file: {}", e.error())))?;
        if sync {
            file.sync_all()?;
        }
        Ok(())
    }
}

impl Drop for AtomicFile {
    fn drop(&mut self) {
        if self.file.is_some() {
            let _ = self.discard();
        }
    }
}

/// `<path>.part`, keeping the full file name including its extension
pub fn part_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(PART_SUFFIX);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_part_path() {
        assert_eq!(
            part_path(Path::new("out/doc.xml")),
            PathBuf::from("out/doc.xml.part")
        );
    }

    #[test]
    fn test_buffer_sink() -> Result<()> {
        let mut sink = Sink::Buffer(Vec::new());
        sink.write_bytes(b"<a")?;
        sink.write_bytes(b" />")?;
        sink.finalize(true)?;
        assert_eq!(sink.as_bytes(), Some(&b"<a />"[..]));
        Ok(())
    }

    #[test]
    fn test_handle_sink() -> Result<()> {
        let mut out = Vec::new();
        {
            let mut sink = Sink::Handle(&mut out);
            sink.write_bytes(b"hello")?;
            assert!(sink.as_bytes().is_none());
            sink.finalize(false)?;
        }
        assert_eq!(out, b"hello");
        Ok(())
    }

    #[test]
    fn test_file_commit() -> Result<()> {
        let dir = TempDir::new()?;
        let target = dir.path().join("doc.xml");

        let mut sink = Sink::File(AtomicFile::create(&target, 64, false)?);
        sink.write_bytes(b"<doc />")?;
        assert!(part_path(&target).exists());
        assert!(!target.exists());

        sink.finalize(true)?;
        assert_eq!(fs::read(&target)?, b"<doc />");
        assert!(!part_path(&target).exists());
        Ok(())
    }

    #[test]
    fn test_file_discard() -> Result<()> {
        let dir = TempDir::new()?;
        let target = dir.path().join("doc.xml");

        let mut sink = Sink::File(AtomicFile::create(&target, 64, false)?);
        sink.write_bytes(b"<doc")?;
        sink.finalize(false)?;

        assert!(!target.exists());
        assert!(!part_path(&target).exists());
        Ok(())
    }

    #[test]
    fn test_write_after_finalize() -> Result<()> {
        let dir = TempDir::new()?;
        let mut file = AtomicFile::create(dir.path().join("doc.xml"), 64, false)?;
        file.discard()?;
        assert!(file.write_all(b"x").is_err());
        Ok(())
    }

    #[test]
    fn test_drop_removes_part() -> Result<()> {
        let dir = TempDir::new()?;
        let target = dir.path().join("doc.xml");
        {
            let mut file = AtomicFile::create(&target, 64, false)?;
            file.write_all(b"<doc")?;
        }
        assert!(!part_path(&target).exists());
        assert!(!target.exists());
        Ok(())
    }

    #[test]
    fn test_create_in_missing_dir() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("missing").join("doc.xml");
        let result = AtomicFile::create(&target, 64, false);
        assert!(matches!(result, Err(XmlError::WriteError(_))));
    }
}
