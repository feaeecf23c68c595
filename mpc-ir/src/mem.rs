use std::collections::BTreeMap;

use crate::reg::RegKind;

/// A static memory address.
///
/// Addresses are compile-time concepts: they index the per-kind memory of
/// the VM, which is the only state visible across tapes. The address space
/// of each [`RegKind`] is independent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub u64);

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl Address {
    /// Address offset by `off` slots.
    pub fn offset(self, off: u64) -> Address {
        Address(self.0 + off)
    }
}

/// Errors of the static allocator. All of them are compiler defects rather
/// than user-facing conditions: addresses only exist at compile time.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MemError {
    /// A range was freed that was never handed out (or freed twice).
    #[error("freeing unallocated {kind:?} memory at {address} (size {size})")]
    DoubleFree {
        /// Memory kind of the offending range.
        kind: RegKind,
        /// Start of the offending range.
        address: Address,
        /// Length of the offending range.
        size: u64,
    },
}

/// Static memory allocator with one address space and free pool per kind.
///
/// Containers are allocated once and never resized; freeing returns the
/// range to a pool keyed by size so the next allocation of the same shape
/// can reuse it. There is no compaction; fragmentation is acceptable
/// because allocation happens at compile time.
#[derive(Debug, Default)]
pub struct MemPool {
    top: [u64; 6],
    // size -> start addresses of reusable ranges, per kind
    pools: [BTreeMap<u64, Vec<u64>>; 6],
    live: [BTreeMap<u64, u64>; 6],
}

impl MemPool {
    /// Creates an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates `size` consecutive slots of `kind` memory.
    pub fn malloc(&mut self, kind: RegKind, size: u64) -> Address {
        let idx = kind.index();
        let start = if let Some(starts) = self.pools[idx].get_mut(&size) {
            match starts.pop() {
                Some(start) => start,
                None => self.bump(idx, size),
            }
        } else {
            self.bump(idx, size)
        };
        self.live[idx].insert(start, size);
        tracing::trace!("malloc {kind:?} {size} -> @{start}");
        Address(start)
    }

    fn bump(&mut self, idx: usize, size: u64) -> u64 {
        let start = self.top[idx];
        self.top[idx] += size;
        start
    }

    /// Returns a previously allocated range to the pool.
    pub fn free(&mut self, kind: RegKind, address: Address, size: u64) -> Result<(), MemError> {
        let idx = kind.index();
        match self.live[idx].get(&address.0) {
            Some(&live_size) if live_size == size => {
                self.live[idx].remove(&address.0);
                self.pools[idx].entry(size).or_default().push(address.0);
                tracing::trace!("free {kind:?} {size} at {address}");
                Ok(())
            }
            _ => Err(MemError::DoubleFree {
                kind,
                address,
                size,
            }),
        }
    }

    /// Highest address handed out so far for `kind` (the VM's required
    /// memory size for that kind).
    pub fn high_water(&self, kind: RegKind) -> u64 {
        self.top[kind.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malloc_is_contiguous_per_kind() {
        let mut pool = MemPool::new();
        let a = pool.malloc(RegKind::Secret, 10);
        let b = pool.malloc(RegKind::Secret, 3);
        let c = pool.malloc(RegKind::Clear, 1);
        assert_eq!(a, Address(0));
        assert_eq!(b, Address(10));
        assert_eq!(c, Address(0));
        assert_eq!(pool.high_water(RegKind::Secret), 13);
    }

    #[test]
    fn free_list_reuses_same_shape() {
        let mut pool = MemPool::new();
        let a = pool.malloc(RegKind::Secret, 8);
        pool.free(RegKind::Secret, a, 8).unwrap();
        let b = pool.malloc(RegKind::Secret, 8);
        assert_eq!(a, b);
    }

    #[test]
    fn double_free_is_an_error() {
        let mut pool = MemPool::new();
        let a = pool.malloc(RegKind::Secret, 4);
        pool.free(RegKind::Secret, a, 4).unwrap();
        let err = pool.free(RegKind::Secret, a, 4).unwrap_err();
        assert!(matches!(err, MemError::DoubleFree { .. }));
    }

    #[test]
    fn free_with_wrong_size_is_an_error() {
        let mut pool = MemPool::new();
        let a = pool.malloc(RegKind::Clear, 4);
        assert!(pool.free(RegKind::Clear, a, 2).is_err());
    }
}
