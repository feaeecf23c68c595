//! The compilation driver.
//!
//! [`Frontend`] owns everything one tape's compilation needs: the
//! instruction sink, register and memory allocators, the scoped execution
//! context and the bit-decomposition arena. Every typed operation threads
//! `&mut Frontend` through; there is no global state anywhere.

use std::collections::HashMap;

use mpc_ir::{Address, MemPool, Op, RegAlloc, RegId, RegKind, Tape};
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::config::CompilerConfig;
use crate::context::{broadcast, Domain, ExecContext};
use crate::error::{CompilerError, Result};
use crate::types::{SecretBit, SecretInt, ValueId};

/// Compilation state for one tape.
pub struct Frontend {
    tape: Tape,
    regs: RegAlloc,
    mem: MemPool,
    ctx: ExecContext,
    config: CompilerConfig,
    bit_cache: HashMap<(ValueId, u32), Vec<SecretBit>>,
    next_id: u64,
}

impl Frontend {
    /// Creates a front-end for a fresh tape.
    pub fn new(config: CompilerConfig) -> Self {
        let ctx = ExecContext::new(config.ring_bits);
        Self {
            tape: Tape::new(),
            regs: RegAlloc::new(),
            mem: MemPool::new(),
            ctx,
            config,
            bit_cache: HashMap::new(),
            next_id: 0,
        }
    }

    /// The configuration this front-end compiles under.
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// The execution context (batch width, domain, bit length).
    pub fn ctx(&self) -> &ExecContext {
        &self.ctx
    }

    /// The tape compiled so far.
    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    /// Starts a new basic block. The surrounding compiler calls this at
    /// every control-flow boundary; memory-value caches key off the token.
    pub fn begin_block(&mut self) -> mpc_ir::BlockId {
        self.tape.begin_block()
    }

    /// Finishes compilation and hands the tape to the caller.
    pub fn finish(self) -> Tape {
        tracing::info!(
            instrs = self.tape.len(),
            secret_mem = self.mem.high_water(RegKind::Secret),
            "tape finished"
        );
        self.tape
    }

    /// Runs `f` with the batch width set to `size`, restoring the previous
    /// width on every exit path.
    pub fn with_size<R>(&mut self, size: u32, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        self.ctx.push_size(size)?;
        let res = f(self);
        self.ctx.pop_size();
        res
    }

    /// Runs `f` with the instruction domain set to `domain`.
    pub fn with_domain<R>(
        &mut self,
        domain: Domain,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        self.ctx.push_domain(domain);
        let res = f(self);
        self.ctx.pop_domain();
        res
    }

    /// Runs `f` with the default bit length set to `n`.
    pub fn with_bit_length<R>(
        &mut self,
        n: u32,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        self.ctx.push_bit_length(n);
        let res = f(self);
        self.ctx.pop_bit_length();
        res
    }

    /// Runs `f` with the broadcast width of two operand widths, checking
    /// the broadcast invariant first.
    pub fn with_broadcast<R>(
        &mut self,
        lhs: u32,
        rhs: u32,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        let size = broadcast(lhs, rhs)?;
        self.with_size(size, f)
    }

    pub(crate) fn fresh_id(&mut self) -> ValueId {
        let id = self.next_id;
        self.next_id += 1;
        ValueId(id)
    }

    /// Emits `op` at the current batch width.
    pub(crate) fn emit(&mut self, op: Op) {
        self.tape.emit(self.ctx.vector_size(), op);
    }

    /// Emits `op` at an explicit batch width.
    pub(crate) fn emit_sized(&mut self, size: u32, op: Op) {
        self.tape.emit(size, op);
    }

    /// Allocates a destination register spanning the current batch width.
    pub(crate) fn alloc(&mut self, kind: RegKind) -> RegId {
        self.regs.alloc(kind, self.ctx.vector_size())
    }

    /// Allocates `lanes` consecutive registers of `kind`.
    pub(crate) fn alloc_sized(&mut self, kind: RegKind, lanes: u32) -> RegId {
        self.regs.alloc(kind, lanes)
    }

    pub(crate) fn malloc(&mut self, kind: RegKind, size: u64) -> Address {
        self.mem.malloc(kind, size)
    }

    pub(crate) fn free(&mut self, kind: RegKind, address: Address, size: u64) -> Result<()> {
        Ok(self.mem.free(kind, address, size)?)
    }

    /// Largest immediate the load-immediate primitive accepts.
    const IMM_BITS: u32 = 31;

    /// Loads a compile-time constant into a register of `kind`.
    ///
    /// Constants beyond the immediate range split into at most 31-bit
    /// chunks reassembled most-significant first by shift-and-add, so any
    /// value up to the ring width loads, it just costs more instructions.
    pub(crate) fn load_const(&mut self, kind: RegKind, value: &BigInt) -> RegId {
        let negative = value.is_negative();
        let magnitude = value.abs();
        let reg = if let Some(imm) = magnitude.to_i64().filter(|v| v.abs() < (1 << Self::IMM_BITS))
        {
            let dest = self.alloc(kind);
            self.emit(Op::LdI { dest, imm });
            dest
        } else {
            let (_, digits) = magnitude.to_radix_be(2);
            let chunks: Vec<i64> = digits
                .chunks(Self::IMM_BITS as usize)
                .map(|bits| bits.iter().fold(0i64, |acc, b| (acc << 1) | i64::from(*b)))
                .collect();
            let mut acc = self.alloc(kind);
            self.emit(Op::LdI {
                dest: acc,
                imm: chunks[0],
            });
            for (i, chunk) in chunks.iter().enumerate().skip(1) {
                // shift width of the chunk that follows, not a fixed 31:
                // the last chunk may be shorter
                let width = (digits.len() - i * Self::IMM_BITS as usize)
                    .min(Self::IMM_BITS as usize) as u32;
                let shifted = self.alloc(kind);
                self.emit(Op::Shl {
                    dest: shifted,
                    src: acc,
                    amount: width,
                });
                let chunk_reg = self.alloc(kind);
                self.emit(Op::LdI {
                    dest: chunk_reg,
                    imm: *chunk,
                });
                let next = self.alloc(kind);
                self.emit(Op::Add {
                    dest: next,
                    a: shifted,
                    b: chunk_reg,
                });
                acc = next;
            }
            acc
        };
        if negative && !magnitude.is_zero() {
            let dest = self.alloc(kind);
            self.emit(Op::Neg { dest, src: reg });
            dest
        } else {
            reg
        }
    }

    /// Checks that a compile-time constant fits `bits` (two's complement
    /// signed range).
    pub(crate) fn check_const_range(
        &self,
        value: &BigInt,
        bits: u32,
        kind: &'static str,
    ) -> Result<()> {
        if value.bits() > u64::from(bits) {
            return Err(CompilerError::ConstantRange {
                value: value.to_string(),
                kind,
                bits,
            });
        }
        Ok(())
    }

    /// Bit-decomposes a secret integer into `n` bits, least significant
    /// first. Memoized per (value identity, requested width): asking twice
    /// emits the decomposition primitive once.
    pub fn bit_decompose(&mut self, v: &SecretInt, n: u32) -> Result<Vec<SecretBit>> {
        let key = (v.id, n);
        if let Some(bits) = self.bit_cache.get(&key) {
            return Ok(bits.clone());
        }
        let k = self.ctx.bit_length();
        let size = v.size;
        let bits = self.with_size(size, |fe| {
            let first = fe.alloc_sized(RegKind::SecretBit, n * size);
            fe.emit(Op::BitDec {
                dest: first,
                src: v.reg,
                k,
                n,
            });
            Ok((0..n)
                .map(|i| SecretBit {
                    reg: RegId {
                        kind: RegKind::SecretBit,
                        id: first.id + i * size,
                    },
                    size,
                })
                .collect::<Vec<_>>())
        })?;
        self.bit_cache.insert(key, bits.clone());
        Ok(bits)
    }

    /// Recomposes bits (least significant first) into a secret integer.
    pub fn bit_compose(&mut self, bits: &[SecretBit]) -> Result<SecretInt> {
        let first = bits
            .first()
            .ok_or_else(|| CompilerError::Internal("composing zero bits".into()))?;
        let size = first.size;
        // composition expects one consecutive register run; copy stragglers
        let contiguous = bits
            .iter()
            .enumerate()
            .all(|(i, b)| b.reg.id == first.reg.id + i as u32 * size && b.size == size);
        let src = if contiguous {
            first.reg
        } else {
            let run = self.alloc_sized(RegKind::SecretBit, bits.len() as u32 * size);
            for (i, b) in bits.iter().enumerate() {
                let dest = RegId {
                    kind: RegKind::SecretBit,
                    id: run.id + i as u32 * size,
                };
                self.emit_sized(size, Op::ConvReg { dest, src: b.reg });
            }
            run
        };
        self.with_size(size, |fe| {
            let dest = fe.alloc(RegKind::Secret);
            fe.emit(Op::BitCompose {
                dest,
                src,
                n: bits.len() as u32,
            });
            let id = fe.fresh_id();
            Ok(SecretInt {
                reg: dest,
                size,
                id,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpc_ir::Op;

    #[test]
    fn small_constant_is_one_immediate() {
        let mut fe = Frontend::new(CompilerConfig::default());
        fe.load_const(RegKind::Clear, &BigInt::from(42));
        assert_eq!(fe.tape().len(), 1);
        assert!(matches!(
            fe.tape().instrs()[0].op,
            Op::LdI { imm: 42, .. }
        ));
    }

    #[test]
    fn negative_constant_negates_once() {
        let mut fe = Frontend::new(CompilerConfig::default());
        fe.load_const(RegKind::Clear, &BigInt::from(-7));
        assert_eq!(fe.tape().count_ops(|op| matches!(op, Op::Neg { .. })), 1);
    }

    #[test]
    fn wide_constant_loads_in_chunks() {
        let mut fe = Frontend::new(CompilerConfig::default());
        // 2^62 needs three 31-bit chunks (63 significant bits)
        let value = BigInt::from(1u128 << 62);
        fe.load_const(RegKind::Clear, &value);
        let ldis = fe.tape().count_ops(|op| matches!(op, Op::LdI { .. }));
        let shls = fe.tape().count_ops(|op| matches!(op, Op::Shl { .. }));
        assert_eq!(ldis, 3);
        assert_eq!(shls, 2);
        // every immediate fits 31 signed bits
        for instr in fe.tape().instrs() {
            if let Op::LdI { imm, .. } = instr.op {
                assert!(imm.abs() < 1 << 31);
            }
        }
    }

    #[test]
    fn context_restored_after_error() {
        let mut fe = Frontend::new(CompilerConfig::default());
        let res: Result<()> = fe.with_size(16, |fe| {
            assert_eq!(fe.ctx().vector_size(), 16);
            Err(CompilerError::Internal("boom".into()))
        });
        assert!(res.is_err());
        assert_eq!(fe.ctx().vector_size(), 1);
    }

    #[test]
    fn const_range_check() {
        let fe = Frontend::new(CompilerConfig::default());
        assert!(fe
            .check_const_range(&BigInt::from(255), 8, "clear integer")
            .is_ok());
        assert!(fe
            .check_const_range(&BigInt::from(512), 8, "clear integer")
            .is_err());
    }
}
