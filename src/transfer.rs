use crate::fs::FileSystem;
use eyre::Context;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::{
    io::{Read, Write},
    path::Path,
};

/// Digest of a file's contents
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Checksum {
    pub bytes: u64,
    /// Hex encoded SHA-256 digest
    pub sha256: String,
}

/// Compute the [Checksum] of the file at `path`
#[tracing::instrument(skip(fs))]
pub fn checksum_file<Fs: FileSystem>(fs: &Fs, path: &Path) -> eyre::Result<Checksum> {
    let mut file = fs.open(path).context("failed to open file to checksum")?;
    let bytes = fs.read_all(&mut file)?;

    Ok(Checksum {
        bytes: bytes.len() as u64,
        sha256: hex::encode(Sha256::digest(&bytes)),
    })
}

/// Create the file at `path` and fill it with everything from `reader`
#[tracing::instrument(skip(fs, reader))]
pub fn write_stream<Fs: FileSystem>(
    fs: &Fs,
    path: &Path,
    reader: &mut dyn Read,
) -> eyre::Result<u64> {
    let mut file = fs.create(path)?;
    let count = fs.copy(&mut file, reader)?;
    file.flush().context("failed to flush file")?;
    Ok(count)
}
