//! # Install
//!
//! Stages a payload next to its destination and moves it into place once
//! it has been fully written, so the destination never holds a partial file

use crate::fs::{BoxedReader, BoxedWriter, FileSystem, Handle, TempFile};
use eyre::Context;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::{
    io::Write,
    path::{Path, PathBuf},
};

/// Options controlling how a file is staged
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Name pattern for the staging file
    pub temp_pattern: String,
    /// Mode to create missing destination directories with
    pub dir_mode: u32,
}

/// Details of a completed install
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Installed {
    /// Destination the payload was moved to
    pub path: PathBuf,
    /// Number of bytes installed
    pub bytes: u64,
    /// Hex encoded SHA-256 digest of the installed bytes
    pub sha256: String,
}

/// Install the file at `source` to `dest`
#[tracing::instrument(skip(fs, options))]
pub fn install_file<Fs: FileSystem>(
    fs: &Fs,
    source: &Path,
    dest: &Path,
    options: &InstallOptions,
) -> eyre::Result<Installed> {
    let parent = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    fs.mkdir_all(parent, options.dir_mode)
        .context("failed to create destination directory")?;

    let TempFile {
        path: temp_path,
        handle,
    } = fs
        .temp_file(parent, &options.temp_pattern)
        .context("failed to create staging file")?;

    tracing::debug!(?temp_path, "staging install");

    let result = stage_payload(fs, source, handle).and_then(|(bytes, sha256)| {
        fs.rename(&temp_path, dest)
            .context("failed to move staged file into place")?;

        Ok(Installed {
            path: dest.to_path_buf(),
            bytes,
            sha256,
        })
    });

    if result.is_err() {
        tracing::debug!(?temp_path, "install failed, removing staging file");
        fs.remove(&temp_path);
    }

    result
}

/// Copy `source` into the staging `handle`, producing the byte count and
/// digest of what was written. The handle is closed before returning
fn stage_payload<Fs: FileSystem>(
    fs: &Fs,
    source: &Path,
    handle: Handle,
) -> eyre::Result<(u64, String)> {
    let source = fs.open(source).context("failed to open install source")?;
    let source: BoxedReader = Box::new(source);
    let sink: BoxedWriter = Box::new(handle);

    let mut tee = fs.tee_reader(source, sink);
    let mut hasher = Sha256::new();

    let bytes = fs
        .copy(&mut hasher, &mut tee)
        .context("failed to write staging file")?;

    let (_source, mut sink) = tee.into_inner();
    sink.flush().context("failed to flush staging file")?;

    Ok((bytes, hex::encode(hasher.finalize())))
}

/// Write a JSON manifest describing `installed` to `path`
pub fn write_manifest<Fs: FileSystem>(
    fs: &Fs,
    path: &Path,
    installed: &Installed,
    mode: u32,
) -> eyre::Result<()> {
    let bytes =
        serde_json::to_vec_pretty(installed).context("failed to serialize install manifest")?;

    fs.write_file(path, &bytes, mode)
        .context("failed to write install manifest")
}
