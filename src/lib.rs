//! File system capability for update and installation pipelines along
//! with the staging logic built on top of it.
//!
//! [fs::FileSystem] is implemented by [fs::real::RealFs] for the host file
//! system, and by [fs::MockFileSystem] for tests that need to observe or
//! control file system interactions.

pub mod config;
pub mod fs;
pub mod install;
pub mod transfer;
