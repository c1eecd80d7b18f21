//! Atomic whole-file I/O

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::{Error, Result};

/// Permission bits applied to every file written by [`write_atomic`].
pub const OWNER_ONLY_MODE: u32 = 0o600;

/// Write content atomically to a file.
///
/// Uses write-to-temp-then-rename so readers see either the previous file or
/// the complete new one, never a partial buffer. The temp file lives next to
/// the target (same filesystem) and is created with [`OWNER_ONLY_MODE`] on
/// Unix, which the target inherits through the rename.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    let file_name = path.file_name().ok_or_else(|| Error::NoFileName {
        path: path.to_path_buf(),
    })?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    let temp_name = format!(
        ".{}.{}.tmp",
        file_name.to_string_lossy(),
        std::process::id()
    );
    let temp_path = path.with_file_name(&temp_name);

    let result = write_temp(&temp_path, content).and_then(|()| {
        fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))
    });

    match &result {
        Ok(()) => {
            tracing::debug!(path = %path.display(), bytes = content.len(), "Wrote file");
        }
        Err(_) => {
            // Leave nothing behind but the untouched target
            let _ = fs::remove_file(&temp_path);
        }
    }

    result
}

fn write_temp(temp_path: &Path, content: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(OWNER_ONLY_MODE);
    }

    let mut temp_file = options
        .open(temp_path)
        .map_err(|e| Error::io(temp_path, e))?;

    // A stale temp file keeps its old mode through `create`, so reset it
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .set_permissions(fs::Permissions::from_mode(OWNER_ONLY_MODE))
            .map_err(|e| Error::io(temp_path, e))?;
    }

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(temp_path, e))?;

    temp_file.sync_all().map_err(|e| Error::io(temp_path, e))
}

/// Read a whole file into memory.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::io(path, e))
}

/// Read a whole file, returning `None` when it does not exist.
pub fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}
