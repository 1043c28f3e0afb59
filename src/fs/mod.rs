use mockall::automock;
use std::{
    io::{Read, Write},
    path::{Path, PathBuf},
};

pub mod real;
pub mod tee;

pub use tee::TeeReader;

/// Open file or stream that can be read from and written to. Dropping
/// the handle closes it.
pub trait FileHandle: Read + Write + Send {}

impl<T: Read + Write + Send> FileHandle for T {}

/// Owned handle to an open file
pub type Handle = Box<dyn FileHandle>;

/// Owned source stream accepted by [FileSystem::tee_reader]
pub type BoxedReader = Box<dyn Read + Send>;

/// Owned sink accepted by [FileSystem::tee_reader]
pub type BoxedWriter = Box<dyn Write + Send>;

/// Newly created temporary file along with the path it was created at.
///
/// The file outlives the handle, callers are expected to either rename
/// it into place or remove it.
pub struct TempFile {
    pub path: PathBuf,
    pub handle: Handle,
}

/// File system abstraction
#[automock]
pub trait FileSystem {
    /// Copy everything from `src` into `dst`, returning the number of bytes copied
    fn copy(&self, dst: &mut dyn Write, src: &mut dyn Read) -> eyre::Result<u64>;

    /// Create (or truncate) the file at `path` for reading and writing
    fn create(&self, path: &Path) -> eyre::Result<Handle>;

    /// Open the existing file at `path`
    fn open(&self, path: &Path) -> eyre::Result<Handle>;

    /// Read all remaining bytes from `src`
    fn read_all(&self, src: &mut dyn Read) -> eyre::Result<Vec<u8>>;

    /// Remove the file or empty directory at `path`, failures are ignored
    fn remove(&self, path: &Path);

    /// Rename `from` to `to`
    fn rename(&self, from: &Path, to: &Path) -> eyre::Result<()>;

    /// Wrap `src` so that every byte read from it is also written to `sink`
    fn tee_reader(
        &self,
        src: BoxedReader,
        sink: BoxedWriter,
    ) -> TeeReader<BoxedReader, BoxedWriter>;

    /// Create a uniquely named file within `dir`. The last `*` in `pattern`
    /// is replaced with a random string, without one the random string is
    /// appended
    fn temp_file(&self, dir: &Path, pattern: &str) -> eyre::Result<TempFile>;

    /// Create `path` and any missing parents using `mode`
    fn mkdir_all(&self, path: &Path, mode: u32) -> eyre::Result<()>;

    /// Write the provided `bytes` to the file at `path`, creating it with
    /// `mode` when it does not exist
    fn write_file(&self, path: &Path, bytes: &[u8], mode: u32) -> eyre::Result<()>;

    /// Terminate the process with the provided status `code`
    fn exit(&self, code: i32);
}
