//! Single-slot persistent values.

use mpc_ir::{Address, BlockId, Op};

use crate::error::{CompilerError, Result};
use crate::frontend::Frontend;
use crate::mem::MemElement;

enum State<T> {
    /// Allocated but never written; a read loads whatever the slot holds.
    Unwritten,
    /// The slot's value is mirrored in a register written or loaded in the
    /// given block; reads there are free.
    Cached { block: BlockId, value: T },
    /// The cached register can no longer be trusted (another tape may have
    /// written the slot); the next read reloads.
    Stale,
}

/// One persistent slot of static memory.
///
/// Register-based values die at basic-block boundaries; a `MemValue` is how
/// one value survives a control-flow join or crosses to another tape.
/// Reads inside the block that last touched the slot reuse the cached
/// register and emit nothing; any other read emits exactly one load.
pub struct MemValue<T: MemElement> {
    address: Address,
    state: State<T>,
    deleted: bool,
}

impl<T: MemElement> MemValue<T> {
    /// Allocates a slot without an initial value.
    pub fn new(fe: &mut Frontend) -> Self {
        Self {
            address: fe.malloc(T::mem_kind(), 1),
            state: State::Unwritten,
            deleted: false,
        }
    }

    /// Allocates a slot holding `value`.
    pub fn with_value(fe: &mut Frontend, value: &T) -> Result<Self> {
        let mut slot = Self::new(fe);
        slot.write(fe, value)?;
        Ok(slot)
    }

    /// The slot's address.
    pub fn address(&self) -> Address {
        self.address
    }

    fn check_live(&self) -> Result<()> {
        if self.deleted {
            return Err(CompilerError::DeletedAccess {
                what: "memory value",
            });
        }
        Ok(())
    }

    /// Reads the slot, reusing the cached register when the current block
    /// is the one that last touched it.
    pub fn read(&mut self, fe: &mut Frontend) -> Result<T> {
        self.check_live()?;
        if let State::Cached { block, value } = &self.state {
            if *block == fe.tape().curr_block() {
                return Ok(value.clone());
            }
        }
        let value = fe.with_size(1, |fe| {
            let dest = fe.alloc(T::mem_kind());
            fe.emit(Op::LdM {
                dest,
                address: self.address,
            });
            Ok(T::from_reg(fe, dest, 1))
        })?;
        self.state = State::Cached {
            block: fe.tape().curr_block(),
            value: value.clone(),
        };
        Ok(value)
    }

    /// Writes the slot and re-caches in the current block.
    pub fn write(&mut self, fe: &mut Frontend, value: &T) -> Result<()> {
        self.check_live()?;
        if value.size() != 1 {
            return Err(CompilerError::WrongElementCount {
                expected: 1,
                got: u64::from(value.size()),
            });
        }
        fe.emit_sized(
            1,
            Op::StM {
                src: value.reg(),
                address: self.address,
            },
        );
        self.state = State::Cached {
            block: fe.tape().curr_block(),
            value: value.clone(),
        };
        Ok(())
    }

    /// Drops the cached register. Call after a synchronization point with
    /// another tape that may have written the slot; the next read reloads
    /// even inside the current block.
    pub fn invalidate(&mut self) {
        if !self.deleted {
            self.state = State::Stale;
        }
    }

    /// Returns the slot to the pool. Terminal.
    pub fn delete(&mut self, fe: &mut Frontend) -> Result<()> {
        self.check_live()?;
        fe.free(T::mem_kind(), self.address, 1)?;
        self.deleted = true;
        self.state = State::Stale;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;
    use crate::types::SecretInt;

    fn fe() -> Frontend {
        Frontend::new(CompilerConfig::default())
    }

    fn loads(fe: &Frontend) -> usize {
        fe.tape().count_ops(Op::is_mem_load)
    }

    #[test]
    fn read_in_the_writing_block_is_free() {
        let mut fe = fe();
        let x = SecretInt::from_const(&mut fe, 5).unwrap();
        let mut m = MemValue::with_value(&mut fe, &x).unwrap();
        m.read(&mut fe).unwrap();
        m.read(&mut fe).unwrap();
        assert_eq!(loads(&fe), 0);
    }

    #[test]
    fn read_after_a_block_boundary_loads_exactly_once() {
        let mut fe = fe();
        let x = SecretInt::from_const(&mut fe, 5).unwrap();
        let mut m = MemValue::with_value(&mut fe, &x).unwrap();
        fe.begin_block();
        m.read(&mut fe).unwrap();
        assert_eq!(loads(&fe), 1);
        // re-cached in the new block
        m.read(&mut fe).unwrap();
        assert_eq!(loads(&fe), 1);
    }

    #[test]
    fn write_recaches_in_the_current_block() {
        let mut fe = fe();
        let x = SecretInt::from_const(&mut fe, 5).unwrap();
        let mut m = MemValue::with_value(&mut fe, &x).unwrap();
        fe.begin_block();
        let y = SecretInt::from_const(&mut fe, 6).unwrap();
        m.write(&mut fe, &y).unwrap();
        m.read(&mut fe).unwrap();
        assert_eq!(loads(&fe), 0);
        assert_eq!(fe.tape().count_ops(Op::is_mem_store), 2);
    }

    #[test]
    fn invalidation_forces_a_reload() {
        let mut fe = fe();
        let x = SecretInt::from_const(&mut fe, 5).unwrap();
        let mut m = MemValue::with_value(&mut fe, &x).unwrap();
        m.invalidate();
        m.read(&mut fe).unwrap();
        assert_eq!(loads(&fe), 1);
    }

    #[test]
    fn deleted_slot_is_terminal() {
        let mut fe = fe();
        let x = SecretInt::from_const(&mut fe, 5).unwrap();
        let mut m = MemValue::with_value(&mut fe, &x).unwrap();
        m.delete(&mut fe).unwrap();
        assert!(matches!(
            m.read(&mut fe),
            Err(CompilerError::DeletedAccess { .. })
        ));
        assert!(matches!(
            m.delete(&mut fe),
            Err(CompilerError::DeletedAccess { .. })
        ));
    }
}
