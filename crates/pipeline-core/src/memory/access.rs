//! Bounds handling for data-memory accesses.

/// How accesses outside the memory array are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AccessPolicy {
    /// Out-of-range accesses raise [`crate::SimError::MemoryOutOfRange`].
    #[default]
    Strict,
    /// Out-of-range reads yield 0 and out-of-range writes are dropped.
    Lenient,
}

/// Maps a resolved word address onto an index into a `len`-word array.
///
/// Returns `None` for negative addresses and addresses at or past `len`.
#[must_use]
pub fn resolve_index(address: i64, len: usize) -> Option<usize> {
    usize::try_from(address).ok().filter(|index| *index < len)
}

#[cfg(test)]
mod tests {
    use super::{resolve_index, AccessPolicy};

    #[test]
    fn strict_is_the_default_policy() {
        assert_eq!(AccessPolicy::default(), AccessPolicy::Strict);
    }

    #[test]
    fn only_in_range_addresses_resolve() {
        assert_eq!(resolve_index(0, 19), Some(0));
        assert_eq!(resolve_index(18, 19), Some(18));
        assert_eq!(resolve_index(19, 19), None);
        assert_eq!(resolve_index(-1, 19), None);
        assert_eq!(resolve_index(i64::MIN, 19), None);
        assert_eq!(resolve_index(0, 0), None);
    }
}
