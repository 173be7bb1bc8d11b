use std::{
    fmt,
    path::{Component, Path, PathBuf},
};

mod error;

pub use self::error::IntoTarPathError;

/// Width of the ustar `name` field. A name of exactly this length is stored
/// without a terminating NUL.
pub const NAME_MAX: usize = 100;

/// The name of an archive member, exactly as it is stored in the header.
///
/// A `TarPath` is never empty, never contains a NUL byte and is at most
/// [`NAME_MAX`] bytes long. No normalisation happens when the name is built:
/// `./a.txt` and `a.txt` are distinct members, as they are for `tar`.
#[derive(Debug, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct TarPath(pub(crate) String);

impl TarPath {
    pub fn new<P: AsRef<Path>>(path: P) -> std::result::Result<TarPath, IntoTarPathError> {
        let name = path
            .as_ref()
            .to_str()
            .ok_or(IntoTarPathError::UnrepresentableStr)?;
        Self::validate(name)?;
        Ok(TarPath(name.to_string()))
    }

    /// Decodes the contents of a header name field, up to the first NUL.
    pub(crate) fn from_field(field: &[u8]) -> std::result::Result<TarPath, IntoTarPathError> {
        let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
        let name =
            std::str::from_utf8(&field[..end]).map_err(|_| IntoTarPathError::UnrepresentableStr)?;
        Self::validate(name)?;
        Ok(TarPath(name.to_string()))
    }

    fn validate(name: &str) -> std::result::Result<(), IntoTarPathError> {
        if name.is_empty() {
            return Err(IntoTarPathError::EmptyPath);
        }
        if name.contains('\0') {
            return Err(IntoTarPathError::UnrepresentableStr);
        }
        if name.len() > NAME_MAX {
            return Err(IntoTarPathError::TooLong(name.len()));
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Maps the member name onto a location below `root`.
    ///
    /// Leading `/` and `.` components are dropped. A name with a `..`
    /// component is rejected so extraction never leaves `root`.
    pub fn resolve<P: AsRef<Path>>(&self, root: P) -> std::result::Result<PathBuf, IntoTarPathError> {
        let mut out = root.as_ref().to_path_buf();
        let mut depth = 0;

        for component in Path::new(&self.0).components() {
            match component {
                Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
                Component::ParentDir => return Err(IntoTarPathError::NonCanonical),
                Component::Normal(part) => {
                    out.push(part);
                    depth += 1;
                }
            }
        }

        if depth == 0 {
            return Err(IntoTarPathError::EmptyPath);
        }

        Ok(out)
    }
}

impl fmt::Display for TarPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_name_as_given() {
        let tar_path = TarPath::new("./dir/../a.txt").unwrap();
        assert_eq!(tar_path.as_str(), "./dir/../a.txt");
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(TarPath::new(""), Err(IntoTarPathError::EmptyPath));
    }

    #[test]
    fn rejects_nul() {
        // Null is a sassy fellow
        assert_eq!(
            TarPath::new("a\0b"),
            Err(IntoTarPathError::UnrepresentableStr)
        );
    }

    #[test]
    fn name_length_limit() {
        let exact = "x".repeat(NAME_MAX);
        assert!(TarPath::new(&exact).is_ok());

        let long = "x".repeat(NAME_MAX + 1);
        assert_eq!(
            TarPath::new(&long),
            Err(IntoTarPathError::TooLong(NAME_MAX + 1))
        );
    }

    #[test]
    fn field_stops_at_nul() {
        let mut field = [0u8; NAME_MAX];
        field[..5].copy_from_slice(b"a.txt");
        assert_eq!(TarPath::from_field(&field).unwrap().as_str(), "a.txt");

        let full = [b'y'; NAME_MAX];
        assert_eq!(TarPath::from_field(&full).unwrap().as_str().len(), NAME_MAX);

        assert_eq!(
            TarPath::from_field(&[0u8; NAME_MAX]),
            Err(IntoTarPathError::EmptyPath)
        );
    }

    #[test]
    fn resolve_strips_root() {
        let tar_path = TarPath::new("/something/./foo.txt").unwrap();
        assert_eq!(
            tar_path.resolve("/out").unwrap(),
            PathBuf::from("/out/something/foo.txt")
        );
    }

    #[test]
    fn resolve_rejects_parent() {
        let tar_path = TarPath::new("../etc/passwd").unwrap();
        assert_eq!(
            tar_path.resolve("/out"),
            Err(IntoTarPathError::NonCanonical)
        );
    }

    #[test]
    fn resolve_slash() {
        let tar_path = TarPath::new("/").unwrap();
        assert_eq!(tar_path.resolve("/out"), Err(IntoTarPathError::EmptyPath));
    }
}
