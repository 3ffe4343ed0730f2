use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::parser::ParseError;

#[derive(Debug, PartialEq, Eq)]
pub struct Permissions {
    read: bool,     // r or -
    write: bool,    // w or -
    execute: bool,  // x or -
    shared: bool,   // s (shared) or p (private/copy-on-write)
}

impl FromStr for Permissions {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 4 {
            return Err(ParseError::InvalidPermissions(s.to_string()));
        }

        Ok(Permissions {
            read: bytes[0] == b'r',
            write: bytes[1] == b'w',
            execute: bytes[2] == b'x',
            shared: bytes[3] == b's',
        })
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}",
            if self.read { 'r' } else { '-' },
            if self.write { 'w' } else { '-' },
            if self.execute { 'x' } else { '-' },
            if self.shared { 's' } else { 'p' },
        )
    }
}

pub const STACK_NAME: &str = "[stack]";
pub const HEAP_NAME: &str = "[heap]";

/// What a region's name says about the mapping behind it.
#[derive(Debug, PartialEq)]
pub enum RegionName {
    // Actual file on disk
    File(PathBuf),

    // Special kernel-provided regions
    Stack,              // [stack]
    Heap,               // [heap]
    Pseudo(String),     // [vdso], [vvar], [vsyscall], [anon:...]

    // No path at all - truly anonymous
    Anonymous,

    // Deleted file (still mapped but unlinked)
    Deleted(PathBuf),
}

impl RegionName {
    pub fn classify(name: Option<&str>) -> Self {
        match name {
            None | Some("") => RegionName::Anonymous,
            Some(STACK_NAME) => RegionName::Stack,
            Some(HEAP_NAME) => RegionName::Heap,
            Some(pseudo) if pseudo.starts_with('[') => RegionName::Pseudo(pseudo.to_string()),
            Some(path) if path.ends_with(" (deleted)") => {
                let actual_path = path.trim_end_matches(" (deleted)");
                RegionName::Deleted(PathBuf::from(actual_path))
            }
            Some(path) => RegionName::File(PathBuf::from(path)),
        }
    }
}

impl fmt::Display for RegionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionName::Anonymous => write!(f, "[anonymous]"),
            RegionName::Heap => write!(f, "{HEAP_NAME}"),
            RegionName::Stack => write!(f, "{STACK_NAME}"),
            RegionName::Pseudo(name) => write!(f, "{name}"),
            RegionName::File(path) => write!(f, "{}", path.display()),
            RegionName::Deleted(path) => write!(f, "{} (deleted)", path.display()),
        }
    }
}

const SIZE_FIELD_COUNT: usize = 11;

/// The `<Label>: <n> kB` attributes a stanza may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeField {
    Size,
    Rss,
    Pss,
    SharedClean,
    SharedDirty,
    PrivateClean,
    PrivateDirty,
    Referenced,
    Swap,
    KernelPageSize,
    MmuPageSize,
}

impl SizeField {
    pub const ALL: [SizeField; SIZE_FIELD_COUNT] = [
        SizeField::Size,
        SizeField::Rss,
        SizeField::Pss,
        SizeField::SharedClean,
        SizeField::SharedDirty,
        SizeField::PrivateClean,
        SizeField::PrivateDirty,
        SizeField::Referenced,
        SizeField::Swap,
        SizeField::KernelPageSize,
        SizeField::MmuPageSize,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SizeField::Size => "Size",
            SizeField::Rss => "Rss",
            SizeField::Pss => "Pss",
            SizeField::SharedClean => "Shared_Clean",
            SizeField::SharedDirty => "Shared_Dirty",
            SizeField::PrivateClean => "Private_Clean",
            SizeField::PrivateDirty => "Private_Dirty",
            SizeField::Referenced => "Referenced",
            SizeField::Swap => "Swap",
            SizeField::KernelPageSize => "KernelPageSize",
            SizeField::MmuPageSize => "MMUPageSize",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Per-region size attributes in kB. `None` means the kernel did not report the label.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SizeFields([Option<u64>; SIZE_FIELD_COUNT]);

impl SizeFields {
    pub fn get(&self, field: SizeField) -> Option<u64> {
        self.0[field.index()]
    }

    pub fn set(&mut self, field: SizeField, value: Option<u64>) {
        self.0[field.index()] = value;
    }
}

/// One parsed smaps stanza.
#[derive(Debug)]
pub struct Region {
    pub start: String,
    pub end: String,
    pub name: Option<String>,
    pub permissions: Permissions,
    pub device: (String, String),
    pub inode: u64,
    pub sizes: SizeFields,
}

impl Region {
    pub fn size(&self, field: SizeField) -> Option<u64> {
        self.sizes.get(field)
    }

    pub fn size_kb(&self) -> u64 {
        self.size(SizeField::Size).unwrap_or(0)
    }

    pub fn rss_kb(&self) -> u64 {
        self.size(SizeField::Rss).unwrap_or(0)
    }

    pub fn kind(&self) -> RegionName {
        RegionName::classify(self.name.as_deref())
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_none()
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{} {} {}:{} {:8} {}",
            self.start,
            self.end,
            self.permissions,
            self.device.0,
            self.device.1,
            self.inode,
            self.kind(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissions() {
        let perms: Permissions = "r-xp".parse().unwrap();
        assert!(perms.read);
        assert!(!perms.write);
        assert!(perms.execute);
        assert!(!perms.shared);
        assert_eq!(perms.to_string(), "r-xp");

        let shared: Permissions = "rw-s".parse().unwrap();
        assert!(shared.shared);
        assert!(!shared.execute);
    }

    #[test]
    fn test_permissions_wrong_length() {
        assert!("r-x".parse::<Permissions>().is_err());
        assert!("r-xpp".parse::<Permissions>().is_err());
    }

    #[test]
    fn test_classify_names() {
        assert_eq!(RegionName::classify(None), RegionName::Anonymous);
        assert_eq!(RegionName::classify(Some("[stack]")), RegionName::Stack);
        assert_eq!(RegionName::classify(Some("[heap]")), RegionName::Heap);
        assert_eq!(
            RegionName::classify(Some("[vdso]")),
            RegionName::Pseudo("[vdso]".to_string())
        );
        assert_eq!(
            RegionName::classify(Some("/tmp/x.so (deleted)")),
            RegionName::Deleted(PathBuf::from("/tmp/x.so"))
        );
        assert_eq!(
            RegionName::classify(Some("/lib/libc.so")),
            RegionName::File(PathBuf::from("/lib/libc.so"))
        );
    }

    #[test]
    fn test_size_fields_absent_is_distinct_from_zero() {
        let mut sizes = SizeFields::default();
        sizes.set(SizeField::Swap, Some(0));

        assert_eq!(sizes.get(SizeField::Swap), Some(0));
        assert_eq!(sizes.get(SizeField::Rss), None);
    }

    #[test]
    fn test_labels_are_unique() {
        for (i, a) in SizeField::ALL.iter().enumerate() {
            assert_eq!(a.index(), i);
            for b in &SizeField::ALL[i + 1..] {
                assert_ne!(a.label(), b.label());
            }
        }
    }
}
