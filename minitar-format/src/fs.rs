//! Filesystem utilities for turning files into headers and back.

use std::ffi::CStr;
use std::fs::{self, File, Permissions};
use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};

use crate::error::{Error, Result};
use crate::header::{EntryType, Header, HeaderError, MODE_MASK};
use crate::path::TarPath;
use crate::Block;

// getpwuid_r/getgrgid_r report ERANGE until the buffer fits the record
const LOOKUP_BUF_MIN: usize = 1024;
const LOOKUP_BUF_MAX: usize = 1 << 20;

impl Header {
    /// Builds the header for the regular file at `path` from its metadata.
    ///
    /// The member name is the path exactly as given. Owner and group must
    /// resolve to names, since the ustar name fields are always filled in.
    pub fn stat<P: AsRef<Path>>(path: P) -> Result<Header> {
        let path = path.as_ref();
        let name = TarPath::new(path).map_err(|source| Error::InvalidPath {
            path: path.to_path_buf(),
            source,
        })?;
        let meta = fs::metadata(path).map_err(|source| Error::stat(path.to_path_buf(), source))?;
        if !meta.is_file() {
            return Err(Error::NotRegularFile {
                path: path.to_path_buf(),
            });
        }

        let uname = user_name(meta.uid()).ok_or_else(|| Error::OwnerLookup {
            path: path.to_path_buf(),
            uid: meta.uid(),
        })?;
        let gname = group_name(meta.gid()).ok_or_else(|| Error::GroupLookup {
            path: path.to_path_buf(),
            gid: meta.gid(),
        })?;

        // Times before the epoch cannot be stored in the mtime field
        if meta.mtime() < 0 {
            return Err(Error::EncodeHeader {
                path: path.to_path_buf(),
                source: HeaderError::Negative { field: "mtime" },
            });
        }

        let dev = meta.dev() as libc::dev_t;

        Ok(Header {
            name,
            mode: meta.mode() & MODE_MASK,
            uid: meta.uid(),
            gid: meta.gid(),
            size: meta.len(),
            mtime: meta.mtime() as u64,
            entry_type: EntryType::Regular,
            uname,
            gname,
            devmajor: libc::major(dev) as u32,
            devminor: libc::minor(dev) as u32,
        })
    }
}

/// Stats `path` and serializes its header block in one step.
pub fn encode_path<P: AsRef<Path>>(path: P) -> Result<(Header, Block)> {
    let path = path.as_ref();
    let header = Header::stat(path)?;
    let block = header.encode().map_err(|source| Error::EncodeHeader {
        path: path.to_path_buf(),
        source,
    })?;
    Ok((header, block))
}

/// Applies the permission bits of `header` to an extracted file.
pub(crate) fn apply_mode(path: &Path, header: &Header) -> std::io::Result<()> {
    fs::set_permissions(path, Permissions::from_mode(header.mode))
}

/// Restores modification time and ownership. Both usually need privileges
/// the caller does not have, so failures are only logged.
pub(crate) fn restore_metadata(path: &Path, file: &File, header: &Header) {
    let mtime = UNIX_EPOCH + Duration::from_secs(header.mtime);
    if let Err(e) = file.set_modified(mtime) {
        tracing::warn!(path = %path.display(), error = %e, "could not restore mtime");
    }

    if let Err(e) = std::os::unix::fs::chown(path, Some(header.uid), Some(header.gid)) {
        tracing::debug!(path = %path.display(), error = %e, "could not restore ownership");
    }
}

pub(crate) fn user_name(uid: u32) -> Option<String> {
    let mut buf: Vec<libc::c_char> = vec![0; LOOKUP_BUF_MIN];

    loop {
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::passwd = std::ptr::null_mut();
        let rc = unsafe {
            libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result)
        };

        if rc == libc::ERANGE && buf.len() < LOOKUP_BUF_MAX {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || result.is_null() {
            return None;
        }

        let name = unsafe { CStr::from_ptr(pwd.pw_name) };
        return Some(name.to_string_lossy().into_owned());
    }
}

pub(crate) fn group_name(gid: u32) -> Option<String> {
    let mut buf: Vec<libc::c_char> = vec![0; LOOKUP_BUF_MIN];

    loop {
        let mut grp: libc::group = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::group = std::ptr::null_mut();
        let rc = unsafe {
            libc::getgrgid_r(gid, &mut grp, buf.as_mut_ptr(), buf.len(), &mut result)
        };

        if rc == libc::ERANGE && buf.len() < LOOKUP_BUF_MAX {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || result.is_null() {
            return None;
        }

        let name = unsafe { CStr::from_ptr(grp.gr_name) };
        return Some(name.to_string_lossy().into_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn stat_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        let mut file = File::create(&path).unwrap();
        file.write_all(b"hello").unwrap();
        drop(file);
        fs::set_permissions(&path, Permissions::from_mode(0o640)).unwrap();

        let header = Header::stat(&path).unwrap();
        assert_eq!(header.name.as_str(), path.to_str().unwrap());
        assert_eq!(header.size, 5);
        assert_eq!(header.mode, 0o640);
        assert_eq!(header.entry_type, EntryType::Regular);
        assert!(!header.uname.is_empty());
        assert!(!header.gname.is_empty());
    }

    #[test]
    fn stat_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        match Header::stat(dir.path().join("missing")) {
            Err(Error::PathNotFound { .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn stat_directory() {
        let dir = tempfile::tempdir().unwrap();
        match Header::stat(dir.path()) {
            Err(Error::NotRegularFile { .. }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn encode_path_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        File::create(&path).unwrap();

        let (header, block) = encode_path(&path).unwrap();
        assert_eq!(Header::decode(&block).unwrap(), header);
    }
}
