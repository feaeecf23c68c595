use std::fmt;

/// The register file a register belongs to.
///
/// The VM keeps one register file per storage domain. Registers are
/// thread-local and ephemeral: they live for one tape and are never visible
/// to other tapes. Cross-tape values must go through static memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RegKind {
    /// Secret-shared ring/field element.
    Secret,
    /// Clear ring/field element, known to all parties.
    Clear,
    /// Secret-shared binary-field element.
    SecretBin,
    /// Clear binary-field element.
    ClearBin,
    /// Clear 64-bit machine integer (loop counters, addresses).
    Int64,
    /// Secret single bit, the result kind of secret comparisons.
    SecretBit,
}

impl RegKind {
    /// All register files, in a fixed order usable for indexing.
    pub const ALL: [RegKind; 6] = [
        RegKind::Secret,
        RegKind::Clear,
        RegKind::SecretBin,
        RegKind::ClearBin,
        RegKind::Int64,
        RegKind::SecretBit,
    ];

    pub(crate) fn index(self) -> usize {
        match self {
            RegKind::Secret => 0,
            RegKind::Clear => 1,
            RegKind::SecretBin => 2,
            RegKind::ClearBin => 3,
            RegKind::Int64 => 4,
            RegKind::SecretBit => 5,
        }
    }

    /// Short mnemonic used in disassembly.
    pub fn mnemonic(self) -> &'static str {
        match self {
            RegKind::Secret => "s",
            RegKind::Clear => "c",
            RegKind::SecretBin => "sb",
            RegKind::ClearBin => "cb",
            RegKind::Int64 => "i",
            RegKind::SecretBit => "sbit",
        }
    }
}

/// A register in one of the per-kind register files.
///
/// The id is only unique within its [`RegKind`]; disassembly prints the
/// kind mnemonic in front of the id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegId {
    /// Register file this register lives in.
    pub kind: RegKind,
    /// Index within the register file.
    pub id: u32,
}

impl fmt::Display for RegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.mnemonic(), self.id)
    }
}

/// Monotonic register allocator, one counter per register file.
///
/// Registers are never reused within a tape. A vectorized value of batch
/// width `n` occupies `n` consecutive ids starting at the returned register.
#[derive(Debug, Default, Clone)]
pub struct RegAlloc {
    next: [u32; 6],
}

impl RegAlloc {
    /// Creates an allocator with all register files empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates `size` consecutive registers of the given kind and returns
    /// the first one.
    pub fn alloc(&mut self, kind: RegKind, size: u32) -> RegId {
        let idx = kind.index();
        let id = self.next[idx];
        self.next[idx] += size;
        RegId { kind, id }
    }

    /// Number of registers handed out so far for `kind`.
    pub fn allocated(&self, kind: RegKind) -> u32 {
        self.next[kind.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_is_monotonic_per_kind() {
        let mut alloc = RegAlloc::new();
        let a = alloc.alloc(RegKind::Secret, 4);
        let b = alloc.alloc(RegKind::Secret, 1);
        let c = alloc.alloc(RegKind::Clear, 1);
        assert_eq!(a.id, 0);
        assert_eq!(b.id, 4);
        assert_eq!(c.id, 0);
        assert_eq!(alloc.allocated(RegKind::Secret), 5);
        assert_eq!(alloc.allocated(RegKind::Clear), 1);
    }

    #[test]
    fn display_uses_mnemonic() {
        let mut alloc = RegAlloc::new();
        let r = alloc.alloc(RegKind::SecretBin, 1);
        assert_eq!(r.to_string(), "sb0");
    }
}
