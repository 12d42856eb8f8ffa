//! Word-addressable data memory and its access policy.

/// Bounds policy and address resolution for memory accesses.
pub mod access;

pub use access::{resolve_index, AccessPolicy};

/// Memory image used when no other is supplied: addresses `0..=18`.
pub const DEFAULT_MEMORY_IMAGE: [i32; 19] = [
    45, 12, 0, 92, 10, 135, 254, 127, 18, 4, 55, 8, 2, 98, 13, 5, 233, 158, 167,
];

/// Allocates a memory array holding [`DEFAULT_MEMORY_IMAGE`].
#[must_use]
pub fn default_memory() -> Vec<i32> {
    DEFAULT_MEMORY_IMAGE.to_vec()
}

#[cfg(test)]
mod tests {
    use super::{default_memory, DEFAULT_MEMORY_IMAGE};

    #[test]
    fn default_memory_is_the_demonstration_image() {
        let memory = default_memory();
        assert_eq!(memory.len(), 19);
        assert_eq!(memory, DEFAULT_MEMORY_IMAGE);
        assert_eq!(memory[0], 45);
        assert_eq!(memory[18], 167);
    }
}
