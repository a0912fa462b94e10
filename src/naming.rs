use std::fmt::Debug;

use crate::error::{Error, Result};

/// Strategy deriving archive container names from the head name.
///
/// Implementations must be injective over `id` for a given `base`, and must
/// never return `base` itself.
pub trait ArchiveNaming: Debug + Send + Sync {
    /// Name of the archive freezing revision `id` of the head `base`.
    fn archive_name(&self, base: &str, id: u64) -> String;

    /// A character the head name must not contain, if any.
    fn reserved_char(&self) -> Option<char> {
        None
    }

    /// Whether `name` can be an archive of `base` at all.
    ///
    /// Lets listings skip unrelated containers without reading their
    /// metadata. The default inspects everything.
    fn may_be_archive(&self, base: &str, name: &str) -> bool {
        let _ = (base, name);
        true
    }
}

/// The default naming: `<base><separator><id>`, e.g. `shop*3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeparatorNaming {
    pub separator: char,
}

impl SeparatorNaming {
    pub const DEFAULT_SEPARATOR: char = '*';

    pub fn new(separator: char) -> Self {
        Self { separator }
    }
}

impl Default for SeparatorNaming {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SEPARATOR)
    }
}

impl ArchiveNaming for SeparatorNaming {
    fn archive_name(&self, base: &str, id: u64) -> String {
        format!("{}{}{}", base, self.separator, id)
    }

    fn reserved_char(&self) -> Option<char> {
        Some(self.separator)
    }

    fn may_be_archive(&self, base: &str, name: &str) -> bool {
        name.strip_prefix(base)
            .and_then(|rest| rest.strip_prefix(self.separator))
            .map_or(false, |id| id.parse::<u64>().is_ok())
    }
}

/// Validate a head container name.
///
/// Rejects empty names, `.` and `..`, control characters, double quotes
/// (container names are quoted as identifiers), path separators (the name
/// keys a lock file) and the `reserved` separator.
///
/// # Errors
/// Returns [`Error::InvalidName`] if the name violates any rule.
pub fn validate_head_name(name: &str, reserved: Option<char>) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_name("container name must not be empty"));
    }
    if name == "." || name == ".." {
        return Err(Error::invalid_name(format!("invalid container name: {:?}", name)));
    }

    for ch in name.chars() {
        if ch.is_control() || ch == '"' || ch == '/' || ch == '\\' {
            return Err(Error::invalid_name(format!(
                "container name contains invalid character: {:?}",
                ch,
            )));
        }
        if Some(ch) == reserved {
            return Err(Error::invalid_name(format!(
                "container name must not contain the archive separator {:?}",
                ch,
            )));
        }
    }

    Ok(())
}
