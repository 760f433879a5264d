use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
};

use crate::id::time_thread_id;

/// A scratch directory that is removed when the value is dropped.
///
/// Cleanup is best-effort only. If the process is killed mid-run the
/// directory is left behind.
#[derive(Debug)]
pub struct TempDir {
    path: PathBuf,
}

impl TempDir {
    pub fn absolute<T>(dir_path: T) -> Result<Self, std::io::Error>
    where
        T: Into<PathBuf>,
    {
        let path = dir_path.into();

        if !path.exists() {
            std::fs::create_dir_all(&path)?;
        }

        if !path.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "Path exists and is not a directory",
            ));
        }

        Ok(Self { path })
    }

    pub fn in_tmp<T>(dir_name: T) -> Result<Self, std::io::Error>
    where
        T: Into<OsString>,
    {
        let dir = env::temp_dir().join(dir_name.into());

        Self::absolute(dir)
    }

    pub fn in_tmp_with_prefix<T>(dir_name_prefix: T) -> Result<Self, std::io::Error>
    where
        T: Into<OsString>,
    {
        let mut name: OsString = dir_name_prefix.into();
        name.push(time_thread_id());

        Self::in_tmp(name)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}
