//! # Real
//!
//! File system backed by the real host file system

use crate::fs::{BoxedReader, BoxedWriter, FileSystem, Handle, TeeReader, TempFile};
use eyre::Context;
use std::{
    fs::{DirBuilder, OpenOptions},
    io::{Read, Write},
    path::Path,
};

/// File system backed by real files
pub struct RealFs;

impl FileSystem for RealFs {
    #[tracing::instrument(skip_all)]
    fn copy(&self, dst: &mut dyn Write, src: &mut dyn Read) -> eyre::Result<u64> {
        let count = std::io::copy(src, dst).context("failed to copy stream")?;
        tracing::debug!(count, "copied stream");
        Ok(count)
    }

    #[tracing::instrument(skip(self))]
    fn create(&self, path: &Path) -> eyre::Result<Handle> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .context("failed to create file")?;

        Ok(Box::new(file))
    }

    #[tracing::instrument(skip(self))]
    fn open(&self, path: &Path) -> eyre::Result<Handle> {
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .context("failed to open file")?;

        Ok(Box::new(file))
    }

    #[tracing::instrument(skip_all)]
    fn read_all(&self, src: &mut dyn Read) -> eyre::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        src.read_to_end(&mut bytes).context("failed to read stream")?;
        Ok(bytes)
    }

    #[tracing::instrument(skip(self))]
    fn remove(&self, path: &Path) {
        let result = match std::fs::symlink_metadata(path) {
            Ok(metadata) if metadata.is_dir() => std::fs::remove_dir(path),
            _ => std::fs::remove_file(path),
        };

        if let Err(error) = result {
            tracing::debug!(?error, "failed to remove path, ignoring");
        }
    }

    #[tracing::instrument(skip(self))]
    fn rename(&self, from: &Path, to: &Path) -> eyre::Result<()> {
        std::fs::rename(from, to).context("failed to rename file")?;
        Ok(())
    }

    fn tee_reader(
        &self,
        src: BoxedReader,
        sink: BoxedWriter,
    ) -> TeeReader<BoxedReader, BoxedWriter> {
        TeeReader::new(src, sink)
    }

    #[tracing::instrument(skip(self))]
    fn temp_file(&self, dir: &Path, pattern: &str) -> eyre::Result<TempFile> {
        let temp_dir;
        let dir = if dir.as_os_str().is_empty() {
            temp_dir = std::env::temp_dir();
            temp_dir.as_path()
        } else {
            dir
        };

        if pattern.chars().any(std::path::is_separator) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "pattern contains a path separator",
            ))
            .context("invalid temporary file pattern");
        }

        let (prefix, suffix) = pattern.rsplit_once('*').unwrap_or((pattern, ""));

        let (file, path) = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(dir)
            .context("failed to create temporary file")?
            .keep()
            .map_err(|error| error.error)
            .context("failed to persist temporary file")?;

        tracing::debug!(?path, "created temporary file");

        Ok(TempFile {
            path,
            handle: Box::new(file),
        })
    }

    #[tracing::instrument(skip(self, mode), fields(mode = %format!("{mode:o}")))]
    fn mkdir_all(&self, path: &Path, mode: u32) -> eyre::Result<()> {
        let mut builder = DirBuilder::new();
        builder.recursive(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }

        builder.create(path).context("failed to create directory")?;

        Ok(())
    }

    #[tracing::instrument(skip(self, bytes, mode), fields(mode = %format!("{mode:o}")))]
    fn write_file(&self, path: &Path, bytes: &[u8], mode: u32) -> eyre::Result<()> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }

        let mut file = options.open(path).context("failed to open file for writing")?;
        file.write_all(bytes).context("failed to write file")?;

        Ok(())
    }

    fn exit(&self, code: i32) {
        tracing::debug!(code, "exiting");
        std::process::exit(code);
    }
}
