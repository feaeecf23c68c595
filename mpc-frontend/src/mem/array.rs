//! Flat memory-backed arrays.

use std::collections::HashMap;
use std::marker::PhantomData;

use mpc_ir::{AbortReason, Address, BlockId, Op, RegId, RegKind};

use crate::error::{CompilerError, Result};
use crate::frontend::Frontend;
use crate::mem::MemElement;
use crate::types::{Int64, NumberOps};

/// An array index: either known at compile time or held in a machine
/// integer register.
pub enum Index {
    /// Compile-time index, bounds-checked immediately.
    Const(u64),
    /// Runtime index; bounds violations compile into a guarded abort.
    Dynamic(Int64),
}

impl From<u64> for Index {
    fn from(i: u64) -> Self {
        Index::Const(i)
    }
}

impl From<Int64> for Index {
    fn from(v: Int64) -> Self {
        Index::Dynamic(v)
    }
}

/// Cache key for computed effective addresses. Structured on purpose: two
/// spellings of the same index must never miss each other, and distinct
/// registers must never collide.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum IndexKey {
    Const(u64),
    Reg(RegId),
}

enum EffAddr {
    Static(Address),
    Reg(Int64),
}

/// A contiguous run of `length` slots of one kind in static memory.
///
/// The array owns its address range; deleting it returns the range to the
/// pool of its kind. Effective addresses of dynamic indices are cached per
/// basic block, so indexing the same register twice in one block pays the
/// address arithmetic and the bounds guard once.
pub struct Array<T: MemElement> {
    base: Address,
    length: u64,
    deleted: bool,
    addr_cache: HashMap<(BlockId, IndexKey), Int64>,
    _elem: PhantomData<T>,
}

impl<T: MemElement> Array<T> {
    /// Allocates an array of `length` slots.
    pub fn new(fe: &mut Frontend, length: u64) -> Self {
        let base = fe.malloc(T::mem_kind(), length);
        Self {
            base,
            length,
            deleted: false,
            addr_cache: HashMap::new(),
            _elem: PhantomData,
        }
    }

    /// Number of slots.
    pub fn len(&self) -> u64 {
        self.length
    }

    /// Whether the array has zero slots.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Base address of the owned range.
    pub fn address(&self) -> Address {
        self.base
    }

    fn check_live(&self) -> Result<()> {
        if self.deleted {
            return Err(CompilerError::DeletedAccess { what: "array" });
        }
        Ok(())
    }

    fn check_bounds(&self, index: u64) -> Result<()> {
        if index >= self.length {
            return Err(CompilerError::IndexOutOfBounds {
                index,
                length: self.length,
            });
        }
        Ok(())
    }

    /// Resolves an index to an effective address. Dynamic indices compile
    /// address arithmetic plus (when enabled) a bounds guard, both cached
    /// per (block, register).
    fn effective(&mut self, fe: &mut Frontend, index: &Index) -> Result<EffAddr> {
        match index {
            Index::Const(i) => {
                self.check_bounds(*i)?;
                Ok(EffAddr::Static(self.base.offset(*i)))
            }
            Index::Dynamic(v) => {
                let key = (fe.tape().curr_block(), IndexKey::Reg(v.reg()));
                if let Some(addr) = self.addr_cache.get(&key) {
                    return Ok(EffAddr::Reg(addr.clone()));
                }
                let addr = fe.with_size(NumberOps::size(v), |fe| {
                    if fe.config().index_checks {
                        let zero = Int64::from_const(fe, 0)?;
                        let len = Int64::from_const(fe, self.length as i64)?;
                        let below = v.lt(fe, &zero)?;
                        let within = v.lt(fe, &len)?;
                        let one = Int64::from_const(fe, 1)?;
                        let above = one.sub(fe, &within)?;
                        let bad = below.add(fe, &above)?;
                        fe.emit(Op::CondAbort {
                            cond: bad.reg(),
                            reason: AbortReason::IndexOutOfBounds,
                        });
                    }
                    let base = Int64::from_const(fe, self.base.0 as i64)?;
                    base.add(fe, v)
                })?;
                self.addr_cache.insert(key, addr.clone());
                Ok(EffAddr::Reg(addr))
            }
        }
    }

    /// Loads one element.
    pub fn get(&mut self, fe: &mut Frontend, index: impl Into<Index>) -> Result<T> {
        self.check_live()?;
        let addr = self.effective(fe, &index.into())?;
        fe.with_size(1, |fe| {
            let dest = fe.alloc(T::mem_kind());
            match addr {
                EffAddr::Static(address) => fe.emit(Op::LdM { dest, address }),
                EffAddr::Reg(index) => fe.emit(Op::LdMInd {
                    dest,
                    index: index.reg(),
                }),
            }
            Ok(T::from_reg(fe, dest, 1))
        })
    }

    /// Stores one element.
    pub fn set(&mut self, fe: &mut Frontend, index: impl Into<Index>, value: &T) -> Result<()> {
        self.check_live()?;
        if value.size() != 1 {
            return Err(CompilerError::WrongElementCount {
                expected: 1,
                got: u64::from(value.size()),
            });
        }
        let addr = self.effective(fe, &index.into())?;
        match addr {
            EffAddr::Static(address) => fe.emit_sized(
                1,
                Op::StM {
                    src: value.reg(),
                    address,
                },
            ),
            EffAddr::Reg(index) => fe.emit_sized(
                1,
                Op::StMInd {
                    src: value.reg(),
                    index: index.reg(),
                },
            ),
        }
        Ok(())
    }

    /// Loads the whole array as one batched value of width `length`.
    pub fn get_vector(&self, fe: &mut Frontend) -> Result<T> {
        self.check_live()?;
        let n = self.length as u32;
        fe.with_size(n, |fe| {
            let dest = fe.alloc(T::mem_kind());
            fe.emit(Op::LdM {
                dest,
                address: self.base,
            });
            Ok(T::from_reg(fe, dest, n))
        })
    }

    /// Stores a batched value of width `length` over the whole array.
    pub fn assign_vector(&self, fe: &mut Frontend, value: &T) -> Result<()> {
        self.check_live()?;
        if u64::from(value.size()) != self.length {
            return Err(CompilerError::WrongElementCount {
                expected: self.length,
                got: u64::from(value.size()),
            });
        }
        fe.emit_sized(
            value.size(),
            Op::StM {
                src: value.reg(),
                address: self.base,
            },
        );
        Ok(())
    }

    /// Stores one scalar per slot.
    pub fn assign(&self, fe: &mut Frontend, values: &[T]) -> Result<()> {
        self.check_live()?;
        if values.len() as u64 != self.length {
            return Err(CompilerError::WrongElementCount {
                expected: self.length,
                got: values.len() as u64,
            });
        }
        for (i, v) in values.iter().enumerate() {
            if v.size() != 1 {
                return Err(CompilerError::WrongElementCount {
                    expected: 1,
                    got: u64::from(v.size()),
                });
            }
            fe.emit_sized(
                1,
                Op::StM {
                    src: v.reg(),
                    address: self.base.offset(i as u64),
                },
            );
        }
        Ok(())
    }

    /// Loads `[start, stop)` with the given step. A unit step is one
    /// batched load; other steps build an explicit index vector and load
    /// indirectly.
    pub fn get_range(&self, fe: &mut Frontend, start: u64, stop: u64, step: u64) -> Result<T> {
        self.check_live()?;
        if step == 0 {
            return Err(CompilerError::Internal("zero-step array range".into()));
        }
        if start > stop || stop > self.length {
            return Err(CompilerError::IndexOutOfBounds {
                index: stop,
                length: self.length,
            });
        }
        if step == 1 {
            let n = (stop - start) as u32;
            return fe.with_size(n, |fe| {
                let dest = fe.alloc(T::mem_kind());
                fe.emit(Op::LdM {
                    dest,
                    address: self.base.offset(start),
                });
                Ok(T::from_reg(fe, dest, n))
            });
        }
        let n = ((stop - start).div_ceil(step)) as u32;
        let run = fe.alloc_sized(RegKind::Int64, n);
        for i in 0..n {
            let dest = RegId {
                kind: RegKind::Int64,
                id: run.id + i,
            };
            let address = self.base.offset(start + u64::from(i) * step);
            fe.emit_sized(
                1,
                Op::LdI {
                    dest,
                    imm: address.0 as i64,
                },
            );
        }
        fe.with_size(n, |fe| {
            let dest = fe.alloc(T::mem_kind());
            fe.emit(Op::LdMInd { dest, index: run });
            Ok(T::from_reg(fe, dest, n))
        })
    }

    /// Fills the array from one party's input, one value per slot.
    pub fn input_from(&self, fe: &mut Frontend, party: u32) -> Result<()> {
        self.check_live()?;
        let n = self.length as u32;
        fe.with_size(n, |fe| {
            let dest = fe.alloc(T::mem_kind());
            fe.emit(Op::Input { dest, party });
            fe.emit(Op::StM {
                src: dest,
                address: self.base,
            });
            Ok(())
        })
    }

    /// Appends the contents to the persistence file of this kind.
    pub fn write_to_file(&self, fe: &mut Frontend) -> Result<()> {
        let v = self.get_vector(fe)?;
        fe.emit_sized(v.size(), Op::WriteFile { src: v.reg() });
        Ok(())
    }

    /// Fills the array from the persistence file of this kind.
    pub fn read_from_file(&self, fe: &mut Frontend) -> Result<()> {
        self.check_live()?;
        let n = self.length as u32;
        fe.with_size(n, |fe| {
            let dest = fe.alloc(T::mem_kind());
            fe.emit(Op::ReadFile { dest });
            fe.emit(Op::StM {
                src: dest,
                address: self.base,
            });
            Ok(())
        })
    }

    /// Writes the contents to a client socket channel.
    pub fn write_to_socket(&self, fe: &mut Frontend, client: u32) -> Result<()> {
        let v = self.get_vector(fe)?;
        fe.emit_sized(
            v.size(),
            Op::WriteSocket {
                src: v.reg(),
                client,
            },
        );
        Ok(())
    }

    /// Fills the array from a client socket channel.
    pub fn read_from_socket(&self, fe: &mut Frontend, client: u32) -> Result<()> {
        self.check_live()?;
        let n = self.length as u32;
        fe.with_size(n, |fe| {
            let dest = fe.alloc(T::mem_kind());
            fe.emit(Op::ReadSocket { dest, client });
            fe.emit(Op::StM {
                src: dest,
                address: self.base,
            });
            Ok(())
        })
    }

    /// Returns the address range to the pool. Terminal: any later access
    /// is a compile-time defect.
    pub fn delete(&mut self, fe: &mut Frontend) -> Result<()> {
        self.check_live()?;
        fe.free(T::mem_kind(), self.base, self.length)?;
        self.deleted = true;
        self.addr_cache.clear();
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

    #[test]
    fn compile_time_index_is_checked_immediately() {
        let mut fe = fe();
        let mut a = Array::<SecretInt>::new(&mut fe, 4);
        assert!(matches!(
            a.get(&mut fe, 4u64),
            Err(CompilerError::IndexOutOfBounds {
                index: 4,
                length: 4
            })
        ));
        assert!(a.get(&mut fe, 3u64).is_ok());
    }

    #[test]
    fn dynamic_index_compiles_a_guarded_indirect_load() {
        let mut fe = fe();
        let mut a = Array::<SecretInt>::new(&mut fe, 8);
        let i = Int64::from_const(&mut fe, 5).unwrap();
        a.get(&mut fe, i).unwrap();
        assert_eq!(
            fe.tape().count_ops(|op| matches!(op, Op::CondAbort { .. })),
            1
        );
        assert_eq!(fe.tape().count_ops(|op| matches!(op, Op::LdMInd { .. })), 1);
    }

    #[test]
    fn effective_address_is_cached_per_block() {
        let mut fe = fe();
        let mut a = Array::<SecretInt>::new(&mut fe, 8);
        let i = Int64::from_const(&mut fe, 2).unwrap();
        a.get(&mut fe, Index::Dynamic(i.clone())).unwrap();
        a.get(&mut fe, Index::Dynamic(i.clone())).unwrap();
        // one guard, one address computation, two loads
        assert_eq!(
            fe.tape().count_ops(|op| matches!(op, Op::CondAbort { .. })),
            1
        );
        assert_eq!(fe.tape().count_ops(|op| matches!(op, Op::LdMInd { .. })), 2);

        fe.begin_block();
        a.get(&mut fe, Index::Dynamic(i)).unwrap();
        assert_eq!(
            fe.tape().count_ops(|op| matches!(op, Op::CondAbort { .. })),
            2
        );
    }

    #[test]
    fn disabled_index_checks_drop_the_guard() {
        let mut fe = Frontend::new(CompilerConfig {
            index_checks: false,
            ..CompilerConfig::default()
        });
        let mut a = Array::<SecretInt>::new(&mut fe, 8);
        let i = Int64::from_const(&mut fe, 5).unwrap();
        a.get(&mut fe, i).unwrap();
        assert_eq!(
            fe.tape().count_ops(|op| matches!(op, Op::CondAbort { .. })),
            0
        );
    }

    #[test]
    fn unit_step_range_is_one_batched_load() {
        let mut fe = fe();
        let a = Array::<SecretInt>::new(&mut fe, 10);
        let v = a.get_range(&mut fe, 2, 6, 1).unwrap();
        assert_eq!(NumberOps::size(&v), 4);
        let batched = fe
            .tape()
            .instrs()
            .iter()
            .filter(|i| matches!(i.op, Op::LdM { .. }) && i.size == 4)
            .count();
        assert_eq!(batched, 1);
    }

    #[test]
    fn strided_range_builds_an_index_vector() {
        let mut fe = fe();
        let a = Array::<SecretInt>::new(&mut fe, 10);
        let v = a.get_range(&mut fe, 1, 8, 3).unwrap();
        // indices 1, 4, 7
        assert_eq!(NumberOps::size(&v), 3);
        assert_eq!(fe.tape().count_ops(|op| matches!(op, Op::LdI { .. })), 3);
        assert_eq!(fe.tape().count_ops(|op| matches!(op, Op::LdMInd { .. })), 1);
    }

    #[test]
    fn assignment_checks_element_count() {
        let mut fe = fe();
        let a = Array::<SecretInt>::new(&mut fe, 3);
        let x = SecretInt::from_const(&mut fe, 1).unwrap();
        assert!(matches!(
            a.assign(&mut fe, &[x.clone(), x.clone()]),
            Err(CompilerError::WrongElementCount {
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn deleted_array_rejects_access_and_returns_its_range() {
        let mut fe = fe();
        let mut a = Array::<SecretInt>::new(&mut fe, 16);
        let base = a.address();
        a.delete(&mut fe).unwrap();
        assert!(matches!(
            a.get(&mut fe, 0u64),
            Err(CompilerError::DeletedAccess { what: "array" })
        ));
        // the pool hands the same range to the next same-shape allocation
        let b = Array::<SecretInt>::new(&mut fe, 16);
        assert_eq!(b.address(), base);
    }
}
