use std::fmt;

use crate::op::{Instr, Op};

/// Opaque token distinguishing compiled basic blocks.
///
/// The surrounding compiler bumps the block at every control-flow boundary;
/// the front-end only compares tokens (memory-value caching keys off them).
/// Tokens are monotonic within one tape and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u64);

/// The instruction sink for one independently schedulable program region.
///
/// A tape collects vectorized instructions in program order. Tapes are never
/// shared: one compilation pass owns one tape, and emission order within it
/// is exactly program order. Distinct tapes may later run on parallel
/// threads, synchronizing only through static memory.
#[derive(Debug, Default)]
pub struct Tape {
    instrs: Vec<Instr>,
    curr_block: u64,
}

impl Tape {
    /// Creates an empty tape positioned in block 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an instruction executing on `size` lanes.
    pub fn emit(&mut self, size: u32, op: Op) {
        debug_assert!(size > 0, "emitting instruction with zero batch width");
        tracing::trace!("emit [{size}] {op}");
        self.instrs.push(Instr { size, op });
    }

    /// The token of the block instructions are currently appended to.
    pub fn curr_block(&self) -> BlockId {
        BlockId(self.curr_block)
    }

    /// Starts a new basic block and returns its token. Called by the
    /// surrounding compiler at every control-flow boundary.
    pub fn begin_block(&mut self) -> BlockId {
        self.curr_block += 1;
        tracing::debug!("begin block {}", self.curr_block);
        BlockId(self.curr_block)
    }

    /// All instructions emitted so far, in program order.
    pub fn instrs(&self) -> &[Instr] {
        &self.instrs
    }

    /// Number of instructions emitted so far.
    pub fn len(&self) -> usize {
        self.instrs.len()
    }

    /// Whether nothing has been emitted yet.
    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    /// Counts emitted instructions matching a predicate. Used by tests to
    /// pin down emission behavior (e.g. that a cached memory read emits no
    /// load).
    pub fn count_ops(&self, pred: impl Fn(&Op) -> bool) -> usize {
        self.instrs.iter().filter(|i| pred(&i.op)).count()
    }
}

impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (ip, instr) in self.instrs.iter().enumerate() {
            writeln!(f, "{ip:0>4}| {instr}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reg::{RegAlloc, RegKind};

    #[test]
    fn blocks_are_monotonic() {
        let mut tape = Tape::new();
        let b0 = tape.curr_block();
        let b1 = tape.begin_block();
        let b2 = tape.begin_block();
        assert!(b0 < b1 && b1 < b2);
        assert_eq!(tape.curr_block(), b2);
    }

    #[test]
    fn emission_preserves_program_order() {
        let mut tape = Tape::new();
        let mut regs = RegAlloc::new();
        let a = regs.alloc(RegKind::Clear, 1);
        let b = regs.alloc(RegKind::Clear, 1);
        tape.emit(1, Op::LdI { dest: a, imm: 3 });
        tape.emit(4, Op::Add { dest: b, a, b: a });
        assert_eq!(tape.len(), 2);
        assert_eq!(tape.instrs()[0].size, 1);
        assert_eq!(tape.instrs()[1].size, 4);
        assert_eq!(tape.count_ops(|op| matches!(op, Op::Add { .. })), 1);
    }

    #[test]
    fn disassembly_prints_batch_width() {
        let mut tape = Tape::new();
        let mut regs = RegAlloc::new();
        let r = regs.alloc(RegKind::Secret, 1);
        tape.emit(8, Op::RandBit { dest: r });
        assert_eq!(tape.to_string(), "0000| [8] RAND_BIT s0\n");
    }
}
