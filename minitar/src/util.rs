use std::time::{Duration, UNIX_EPOCH};

use minitar_format::{EntryType, Header};

/// Human-readable size using binary units, e.g. `1.50 KiB`.
pub fn format_size(size: u64) -> String {
    use humansize::{file_size_opts as options, FileSize};

    size.file_size(options::BINARY)
        .unwrap_or_else(|_| size.to_string())
}

/// Seconds since the epoch as an RFC 3339 UTC timestamp.
pub fn format_time(mtime: u64) -> String {
    let datetime: chrono::DateTime<chrono::Utc> = (UNIX_EPOCH + Duration::from_secs(mtime)).into();
    datetime.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// `ls -l` style mode string, e.g. `-rw-r--r--`.
pub fn format_mode(header: &Header) -> String {
    let kind = match header.entry_type {
        EntryType::Regular => '-',
        EntryType::Directory => 'd',
        EntryType::Other(_) => '?',
    };

    let mut s = String::with_capacity(10);
    s.push(kind);
    for shift in &[6u32, 3, 0] {
        let bits = (header.mode >> shift) & 0o7;
        s.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        s.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        s.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use minitar_format::TarPath;

    fn header(mode: u32, entry_type: EntryType) -> Header {
        Header {
            name: TarPath::new("a.txt").unwrap(),
            mode,
            uid: 0,
            gid: 0,
            size: 0,
            mtime: 0,
            entry_type,
            uname: "root".into(),
            gname: "root".into(),
            devmajor: 0,
            devminor: 0,
        }
    }

    #[test]
    fn mode_strings() {
        assert_eq!(format_mode(&header(0o644, EntryType::Regular)), "-rw-r--r--");
        assert_eq!(format_mode(&header(0o755, EntryType::Directory)), "drwxr-xr-x");
        assert_eq!(format_mode(&header(0o4700, EntryType::Other(b'6'))), "?rwx------");
    }

    #[test]
    fn epoch_timestamp() {
        assert_eq!(format_time(0), "1970-01-01T00:00:00Z");
        assert_eq!(format_time(1_600_000_000), "2020-09-13T12:26:40Z");
    }

    #[test]
    fn binary_sizes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1536), "1.50 KiB");
    }
}
