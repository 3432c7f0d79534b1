//! File façade: read or write a whole document, delegating to the codec.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use jseal_core::CodecResult;

use crate::context::Options;
use crate::decode::Decode;
use crate::encode::Encode;

/// Encode `value` and atomically replace `path` with the result.
///
/// The file is created with mode 0o600 on unix, not the permissive mode
/// (0o777 before umask) older writers used, since it holds secrets.
pub fn encode_to_file<T: Encode + ?Sized>(
    path: impl AsRef<Path>,
    value: &T,
    options: &Options,
) -> CodecResult<()> {
    let path = path.as_ref();
    let bytes = crate::encode(value, options)?;
    write_atomic(path, &bytes)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "wrote sealed document");
    Ok(())
}

pub fn decode_from_file<T: Decode + Default>(
    path: impl AsRef<Path>,
    options: &Options,
) -> CodecResult<T> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "read sealed document");
    crate::decode(&bytes, options)
}

/// Write to a temp file next to `path`, then rename over it.
///
/// The file is readable and writable by its owner only.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let tmp_path = parent.join(format!(".{}.tmp", name.to_string_lossy()));

    let result = write_private(&tmp_path, bytes).and_then(|()| fs::rename(&tmp_path, path));
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn write_private(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    // A stale temp file keeps its old mode through open(); force it.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(bytes)?;
    file.sync_all()
}
