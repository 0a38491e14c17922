//! # Reboot Mode Table
//!
//! Maps symbolic reboot mode names (e.g. `recovery`, `bootloader`) to the
//! magic values a later boot stage reads to decide how to come back up.
//! The table is built once from decoded configuration properties and is
//! immutable afterwards; it only ever grows during construction and is
//! dropped whole on teardown.

use alloc::{string::String, vec::Vec};
use arrayvec::ArrayString;
use syscall::error::{Error, Result, EINVAL, ENOMEM};

/// Property key prefix marking a configuration entry as a mode definition.
pub const MODE_PREFIX: &str = "mode-";

/// Mode assumed when a reboot request carries no argument.
pub const DEFAULT_MODE: &str = "normal";

/// Capacity in bytes of the scratch buffer used by the normalized lookup
/// pass. Requests that do not fit are matched by the exact pass only;
/// they are never truncated.
pub const CMD_CAPACITY: usize = 110;

/// One decoded configuration property, prefix still attached.
///
/// The magic value arrives as one or two 32-bit cells: `low` is mandatory
/// for the mode to be usable, `high` extends it to 64 bits.
#[derive(Clone, Copy, Debug)]
pub struct ModeProperty<'a> {
    /// Raw property key, including [`MODE_PREFIX`] if present.
    pub name: &'a str,
    /// Low 32 bits of the magic value.
    pub low: Option<u32>,
    /// High 32 bits of the magic value.
    pub high: Option<u32>,
}

struct ModeEntry {
    name: String,
    magic: u64,
}

/// Ordered name → magic table. Duplicate names may coexist; lookups
/// return the first match in insertion order.
pub struct ModeTable {
    entries: Vec<ModeEntry>,
}

impl ModeTable {
    /// Builds a table from a sequence of decoded configuration properties.
    ///
    /// Properties whose key lacks [`MODE_PREFIX`] are ignored, so a caller
    /// may pass a node's entire property set. A qualifying property
    /// without its low magic cell is skipped: a configuration may list a
    /// mode without assigning it a magic value.
    ///
    /// # Errors
    ///
    /// * `EINVAL` - a qualifying key has nothing after the prefix.
    /// * `ENOMEM` - entry storage could not be allocated.
    ///
    /// On error, every entry built so far is released; no partial table
    /// survives.
    pub fn from_properties<'a, I>(properties: I) -> Result<ModeTable>
    where
        I: IntoIterator<Item = ModeProperty<'a>>,
    {
        let mut entries = Vec::new();

        for prop in properties {
            let Some(name) = prop.name.strip_prefix(MODE_PREFIX) else {
                continue;
            };

            if name.is_empty() {
                log::error!("invalid mode name ({}): too short", prop.name);
                return Err(Error::new(EINVAL));
            }

            let Some(low) = prop.low else {
                log::error!("reboot mode {} without magic number", name);
                continue;
            };

            let magic = (u64::from(prop.high.unwrap_or(0)) << 32) | u64::from(low);

            entries.try_reserve(1).map_err(|_| Error::new(ENOMEM))?;
            let mut owned = String::new();
            owned
                .try_reserve_exact(name.len())
                .map_err(|_| Error::new(ENOMEM))?;
            owned.push_str(name);

            entries.push(ModeEntry { name: owned, magic });
        }

        Ok(ModeTable { entries })
    }

    /// Resolves a requested mode to its magic value.
    ///
    /// A missing request defaults to [`DEFAULT_MODE`]. The exact pass runs
    /// first; if it misses, a second pass matches against a copy of the
    /// request with every space, comma and slash replaced by `-`, since
    /// those separators cannot appear in a configuration key. Requests of
    /// [`CMD_CAPACITY`] bytes or more skip the second pass entirely.
    ///
    /// `None` means no magic is assigned: the reboot proceeds untouched.
    pub fn resolve(&self, cmd: Option<&str>) -> Option<u64> {
        let cmd = cmd.unwrap_or(DEFAULT_MODE);

        if let Some(magic) = self.find(cmd) {
            return Some(magic);
        }

        // Try again with the separators a configuration key cannot carry.
        let normalized = normalize(cmd)?;
        self.find(&normalized)
    }

    fn find(&self, name: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.magic)
    }

    /// Number of modes in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, magic)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.magic))
    }
}

/// Copies `cmd` into a bounded buffer, replacing separator characters.
/// Returns `None` when the request does not fit; overlong input means "no
/// magic", never a truncated match.
fn normalize(cmd: &str) -> Option<ArrayString<CMD_CAPACITY>> {
    if cmd.len() >= CMD_CAPACITY {
        return None;
    }

    let mut buf = ArrayString::new();
    for ch in cmd.chars() {
        let ch = match ch {
            ' ' | ',' | '/' => '-',
            other => other,
        };
        if buf.try_push(ch).is_err() {
            return None;
        }
    }
    Some(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(name: &str, low: u32) -> ModeProperty<'_> {
        ModeProperty {
            name,
            low: Some(low),
            high: None,
        }
    }

    #[test]
    fn test_build_preserves_order() {
        let table = ModeTable::from_properties(vec![
            prop("mode-normal", 0x1),
            prop("mode-recovery", 0x2),
            prop("mode-bootloader", 0x3),
        ])
        .expect("build failed");

        assert_eq!(table.len(), 3);
        let names: Vec<&str> = table.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["normal", "recovery", "bootloader"]);
    }

    #[test]
    fn test_build_ignores_unprefixed_keys() {
        let table = ModeTable::from_properties(vec![
            prop("compatible", 0x99),
            prop("mode-recovery", 0x2),
            prop("reg", 0x42),
        ])
        .expect("build failed");

        assert_eq!(table.len(), 1);
        assert_eq!(table.resolve(Some("recovery")), Some(0x2));
    }

    #[test]
    fn test_build_skips_missing_magic() {
        let table = ModeTable::from_properties(vec![
            prop("mode-normal", 0x1),
            ModeProperty {
                name: "mode-documented-only",
                low: None,
                high: None,
            },
            prop("mode-recovery", 0x2),
        ])
        .expect("build failed");

        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve(Some("documented-only")), None);
    }

    #[test]
    fn test_build_empty_name_fails() {
        let result = ModeTable::from_properties(vec![prop("mode-normal", 0x1), prop("mode-", 0x2)]);
        assert_eq!(result.err(), Some(Error::new(EINVAL)));
    }

    #[test]
    fn test_magic_composition() {
        let table = ModeTable::from_properties(vec![ModeProperty {
            name: "mode-wide",
            low: Some(0xdead_beef),
            high: Some(0x1234_5678),
        }])
        .expect("build failed");

        assert_eq!(table.resolve(Some("wide")), Some(0x1234_5678_dead_beef));
    }

    #[test]
    fn test_resolve_default_is_normal() {
        let table = ModeTable::from_properties(vec![
            prop("mode-recovery", 0x2),
            prop("mode-normal", 0x1),
        ])
        .expect("build failed");

        assert_eq!(table.resolve(None), Some(0x1));
        assert_eq!(table.resolve(None), table.resolve(Some("normal")));
    }

    #[test]
    fn test_resolve_normalizes_separators() {
        let table =
            ModeTable::from_properties(vec![prop("mode-re-covery", 0x2a)]).expect("build failed");

        assert_eq!(table.resolve(Some("re-covery")), Some(0x2a));
        assert_eq!(table.resolve(Some("re/covery")), Some(0x2a));
        assert_eq!(table.resolve(Some("re covery")), Some(0x2a));
        assert_eq!(table.resolve(Some("re,covery")), Some(0x2a));
    }

    #[test]
    fn test_resolve_unknown_mode() {
        let table =
            ModeTable::from_properties(vec![prop("mode-normal", 0x1)]).expect("build failed");
        assert_eq!(table.resolve(Some("unknown-mode")), None);
    }

    #[test]
    fn test_resolve_first_match_wins() {
        let table = ModeTable::from_properties(vec![
            prop("mode-duplicated", 0x1),
            prop("mode-duplicated", 0x2),
        ])
        .expect("build failed");

        assert_eq!(table.len(), 2);
        assert_eq!(table.resolve(Some("duplicated")), Some(0x1));
    }

    #[test]
    fn test_resolve_rejects_overlong_request() {
        // An entry whose name matches what normalization of the long
        // request would produce, so a hit would prove the guard leaked.
        let mut normalized_name = "x".repeat(CMD_CAPACITY + 8);
        normalized_name.push('-');
        let mut key = String::from(MODE_PREFIX);
        key.push_str(&normalized_name);
        let table = ModeTable::from_properties(vec![prop(&key, 0x7)]).expect("build failed");

        let mut request = "x".repeat(CMD_CAPACITY + 8);
        request.push('/');
        assert_eq!(table.resolve(Some(&request)), None);
    }

    #[test]
    fn test_resolve_at_capacity_boundary() {
        let mut hyphen_name = "y".repeat(CMD_CAPACITY - 2);
        hyphen_name.push('-');
        let mut hyphen_key = String::from(MODE_PREFIX);
        hyphen_key.push_str(&hyphen_name);

        let too_long = "y".repeat(CMD_CAPACITY);
        let mut long_key = String::from(MODE_PREFIX);
        long_key.push_str(&too_long);

        let table = ModeTable::from_properties(vec![prop(&hyphen_key, 0x5), prop(&long_key, 0x6)])
            .expect("build failed");

        // One byte under the bound still takes the normalized pass.
        let mut separated = "y".repeat(CMD_CAPACITY - 2);
        separated.push(' ');
        assert_eq!(table.resolve(Some(&separated)), Some(0x5));

        // At the bound the normalized pass is skipped, but the exact pass
        // still runs first.
        assert_eq!(table.resolve(Some(&too_long)), Some(0x6));
        let mut separated_long = "y".repeat(CMD_CAPACITY - 1);
        separated_long.push(',');
        assert_eq!(table.resolve(Some(&separated_long)), None);
    }

    #[test]
    fn test_empty_table_resolves_nothing() {
        let table = ModeTable::from_properties(Vec::<ModeProperty>::new()).expect("build failed");
        assert!(table.is_empty());
        assert_eq!(table.resolve(None), None);
        assert_eq!(table.resolve(Some("")), None);
    }
}
