use std::fmt;

use crate::mem::Address;
use crate::reg::RegId;

/// Why a compiled-in runtime check aborts the running computation.
///
/// These conditions depend on values only known while the secure computation
/// executes, so the compiler emits a guarded [`Op::CondAbort`] instead of
/// rejecting the program.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbortReason {
    /// A dynamic container index was out of the declared bounds.
    IndexOutOfBounds,
    /// A fixed-point intermediate exceeded its declared total bit width.
    FixOverflow,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::IndexOutOfBounds => f.write_str("index-out-of-bounds"),
            AbortReason::FixOverflow => f.write_str("fix-overflow"),
        }
    }
}

/// All primitive operations the front-end can emit.
///
/// The operand register kinds decide the flavor of an operation (secret,
/// clear or mixed); the VM dispatches on them. Non-linear primitives
/// (truncation, comparison-to-zero, bit decomposition, fixed-point division)
/// are opaque protocol calls parameterized by the relevant bit lengths; the
/// protocol run to produce them is none of the front-end's business.
///
/// Each instruction executes on `size` lanes in lock-step, where `size` is
/// the batch width recorded in the surrounding [`Instr`]. An operand whose
/// register holds a single lane broadcasts against wider operands; the VM
/// replicates its lane. The front-end guarantees any other width mix never
/// reaches a tape. Operations that
/// produce or consume `n` consecutive registers (bit decomposition and
/// composition) name the first register of the run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    /// Loads a signed immediate into a register.
    LdI {
        /// Destination register.
        dest: RegId,
        /// Immediate value; must fit the VM's immediate encoding.
        imm: i64,
    },
    /// Loads from a static address.
    LdM {
        /// Destination register.
        dest: RegId,
        /// Source address in the memory of `dest`'s kind.
        address: Address,
    },
    /// Stores to a static address.
    StM {
        /// Source register.
        src: RegId,
        /// Target address in the memory of `src`'s kind.
        address: Address,
    },
    /// Loads indirectly; the effective address sits in an `Int64` register.
    ///
    /// With batch width `n`, lane `i` loads from `index[i]`.
    LdMInd {
        /// Destination register.
        dest: RegId,
        /// Register holding the effective address per lane.
        index: RegId,
    },
    /// Stores indirectly; the effective address sits in an `Int64` register.
    StMInd {
        /// Source register.
        src: RegId,
        /// Register holding the effective address per lane.
        index: RegId,
    },
    /// Adds two ring/field values. Operand kinds may mix secret and clear.
    Add {
        /// Destination register.
        dest: RegId,
        /// First summand.
        a: RegId,
        /// Second summand.
        b: RegId,
    },
    /// Subtracts `b` from `a`.
    Sub {
        /// Destination register.
        dest: RegId,
        /// Minuend.
        a: RegId,
        /// Subtrahend.
        b: RegId,
    },
    /// Multiplies two ring/field values. Secret-by-secret consumes a triple
    /// inside the VM.
    Mul {
        /// Destination register.
        dest: RegId,
        /// First factor.
        a: RegId,
        /// Second factor.
        b: RegId,
    },
    /// Divides clear values. Secret division goes through the non-linear
    /// primitives instead.
    Div {
        /// Destination register.
        dest: RegId,
        /// Dividend.
        a: RegId,
        /// Divisor.
        b: RegId,
    },
    /// Remainder of clear values.
    Mod {
        /// Destination register.
        dest: RegId,
        /// Dividend.
        a: RegId,
        /// Divisor.
        b: RegId,
    },
    /// Clear less-than; writes 0/1. Secret comparisons go through the
    /// non-linear primitives instead.
    LtC {
        /// Destination register (0/1).
        dest: RegId,
        /// Left operand.
        a: RegId,
        /// Right operand.
        b: RegId,
    },
    /// Clear equality; writes 0/1.
    EqC {
        /// Destination register (0/1).
        dest: RegId,
        /// Left operand.
        a: RegId,
        /// Right operand.
        b: RegId,
    },
    /// Additive negation.
    Neg {
        /// Destination register.
        dest: RegId,
        /// Operand.
        src: RegId,
    },
    /// Bitwise XOR in the binary domain.
    Xor {
        /// Destination register.
        dest: RegId,
        /// First operand.
        a: RegId,
        /// Second operand.
        b: RegId,
    },
    /// Bitwise AND in the binary domain.
    And {
        /// Destination register.
        dest: RegId,
        /// First operand.
        a: RegId,
        /// Second operand.
        b: RegId,
    },
    /// Bitwise NOT in the binary domain, over the current bit length.
    Not {
        /// Destination register.
        dest: RegId,
        /// Operand.
        src: RegId,
    },
    /// Left shift by a public constant.
    Shl {
        /// Destination register.
        dest: RegId,
        /// Operand.
        src: RegId,
        /// Public shift amount.
        amount: u32,
    },
    /// Right shift by a public constant.
    Shr {
        /// Destination register.
        dest: RegId,
        /// Operand.
        src: RegId,
        /// Public shift amount.
        amount: u32,
    },
    /// Produces a fresh random secret bit from preprocessing.
    RandBit {
        /// Destination register.
        dest: RegId,
    },
    /// Produces a multiplication triple `(a, b, ab)` from preprocessing.
    Triple {
        /// First factor share.
        a: RegId,
        /// Second factor share.
        b: RegId,
        /// Product share.
        c: RegId,
    },
    /// Produces a random square pair `(a, a^2)` from preprocessing.
    Square {
        /// Base share.
        a: RegId,
        /// Square share.
        b: RegId,
    },
    /// Produces a random value and its inverse from preprocessing.
    Inverse {
        /// Value share.
        a: RegId,
        /// Inverse share.
        b: RegId,
    },
    /// Secret input from one party.
    Input {
        /// Destination register.
        dest: RegId,
        /// Providing party.
        party: u32,
    },
    /// Opens a secret value to all parties.
    Reveal {
        /// Clear destination register.
        dest: RegId,
        /// Secret source register.
        src: RegId,
    },
    /// Opens a secret value to a single party only.
    RevealTo {
        /// Receiving party.
        party: u32,
        /// Clear destination register (meaningful only for `party`).
        dest: RegId,
        /// Secret source register.
        src: RegId,
    },
    /// Transfers a personal clear value from one party to another.
    Send {
        /// Sending party.
        from: u32,
        /// Receiving party.
        to: u32,
        /// Destination register at the receiver.
        dest: RegId,
        /// Source register at the sender.
        src: RegId,
    },
    /// Reads values from a client socket channel (external serializer
    /// contract; the byte layout is kind-specific and opaque here).
    ReadSocket {
        /// Destination register.
        dest: RegId,
        /// Client channel.
        client: u32,
    },
    /// Writes values to a client socket channel.
    WriteSocket {
        /// Source register.
        src: RegId,
        /// Client channel.
        client: u32,
    },
    /// Reads values from the persistence file for the register's kind.
    ReadFile {
        /// Destination register.
        dest: RegId,
    },
    /// Appends values to the persistence file for the register's kind.
    WriteFile {
        /// Source register.
        src: RegId,
    },
    /// Probabilistic truncation by `m` bits of a `k`-bit value. Exact in
    /// expectation; the cheap choice for fixed-point reduction.
    TruncPr {
        /// Destination register.
        dest: RegId,
        /// Source register.
        src: RegId,
        /// Total bit width of the input.
        k: u32,
        /// Bits to remove.
        m: u32,
    },
    /// Deterministic round-half-up truncation by `m` bits of a `k`-bit value.
    TruncRound {
        /// Destination register.
        dest: RegId,
        /// Source register.
        src: RegId,
        /// Total bit width of the input.
        k: u32,
        /// Bits to remove.
        m: u32,
    },
    /// Reduction modulo `2^m` of a `k`-bit value.
    Mod2m {
        /// Destination register.
        dest: RegId,
        /// Source register.
        src: RegId,
        /// Total bit width of the input.
        k: u32,
        /// Modulus exponent.
        m: u32,
    },
    /// Equality-to-zero test of a `k`-bit value, yielding a secret bit.
    Eqz {
        /// Secret-bit destination register.
        dest: RegId,
        /// Source register.
        src: RegId,
        /// Bit width of the comparison.
        k: u32,
    },
    /// Less-than-zero test of a `k`-bit value, yielding a secret bit.
    Ltz {
        /// Secret-bit destination register.
        dest: RegId,
        /// Source register.
        src: RegId,
        /// Bit width of the comparison.
        k: u32,
    },
    /// Bit decomposition of a `k`-bit secret integer into `n` secret bits,
    /// written to `n` consecutive registers starting at `dest`.
    BitDec {
        /// First of `n` consecutive secret-bit destination registers.
        dest: RegId,
        /// Source register.
        src: RegId,
        /// Bit width of the source.
        k: u32,
        /// Number of bits to produce.
        n: u32,
    },
    /// Recomposes `n` consecutive bit registers starting at `src` into an
    /// arithmetic integer.
    BitCompose {
        /// Destination register.
        dest: RegId,
        /// First of `n` consecutive bit source registers.
        src: RegId,
        /// Number of bits to consume.
        n: u32,
    },
    /// Fixed-point division primitive for `(k, f)` precision.
    FixDiv {
        /// Destination register.
        dest: RegId,
        /// Dividend.
        a: RegId,
        /// Divisor.
        b: RegId,
        /// Total bit width.
        k: u32,
        /// Fractional bits.
        f: u32,
    },
    /// Secret power of two: `2^src` for an exponent of at most `n` bits.
    Pow2 {
        /// Destination register.
        dest: RegId,
        /// Secret exponent.
        src: RegId,
        /// Maximum exponent bit width.
        n: u32,
    },
    /// Moves/converts a value between register files where the VM defines a
    /// conversion (clear to secret by trivial sharing, machine integer to
    /// clear, and back-conversions after reveals).
    ConvReg {
        /// Destination register.
        dest: RegId,
        /// Source register.
        src: RegId,
    },
    /// Runtime range check: aborts the running computation with the given
    /// reason if the condition register holds a non-zero (failing) value.
    CondAbort {
        /// Clear condition register; non-zero aborts.
        cond: RegId,
        /// Reported reason.
        reason: AbortReason,
    },
}

impl Op {
    /// Whether this operation reads static memory.
    pub fn is_mem_load(&self) -> bool {
        matches!(self, Op::LdM { .. } | Op::LdMInd { .. })
    }

    /// Whether this operation writes static memory.
    pub fn is_mem_store(&self) -> bool {
        matches!(self, Op::StM { .. } | Op::StMInd { .. })
    }
}

/// One tape entry: an opcode plus the batch width it executes under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instr {
    /// Number of lock-step lanes.
    pub size: u32,
    /// The operation.
    pub op: Op,
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.size, self.op)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::LdI { dest, imm } => write!(f, "LDI {dest} {imm}"),
            Op::LdM { dest, address } => write!(f, "LDM {dest} {address}"),
            Op::StM { src, address } => write!(f, "STM {src} {address}"),
            Op::LdMInd { dest, index } => write!(f, "LDM_IND {dest} {index}"),
            Op::StMInd { src, index } => write!(f, "STM_IND {src} {index}"),
            Op::Add { dest, a, b } => write!(f, "ADD {dest} {a} {b}"),
            Op::Sub { dest, a, b } => write!(f, "SUB {dest} {a} {b}"),
            Op::Mul { dest, a, b } => write!(f, "MUL {dest} {a} {b}"),
            Op::Div { dest, a, b } => write!(f, "DIV {dest} {a} {b}"),
            Op::Mod { dest, a, b } => write!(f, "MOD {dest} {a} {b}"),
            Op::LtC { dest, a, b } => write!(f, "LTC {dest} {a} {b}"),
            Op::EqC { dest, a, b } => write!(f, "EQC {dest} {a} {b}"),
            Op::Neg { dest, src } => write!(f, "NEG {dest} {src}"),
            Op::Xor { dest, a, b } => write!(f, "XOR {dest} {a} {b}"),
            Op::And { dest, a, b } => write!(f, "AND {dest} {a} {b}"),
            Op::Not { dest, src } => write!(f, "NOT {dest} {src}"),
            Op::Shl { dest, src, amount } => write!(f, "SHL {dest} {src} {amount}"),
            Op::Shr { dest, src, amount } => write!(f, "SHR {dest} {src} {amount}"),
            Op::RandBit { dest } => write!(f, "RAND_BIT {dest}"),
            Op::Triple { a, b, c } => write!(f, "TRIPLE {a} {b} {c}"),
            Op::Square { a, b } => write!(f, "SQUARE {a} {b}"),
            Op::Inverse { a, b } => write!(f, "INVERSE {a} {b}"),
            Op::Input { dest, party } => write!(f, "INPUT {dest} p{party}"),
            Op::Reveal { dest, src } => write!(f, "REVEAL {dest} {src}"),
            Op::RevealTo { party, dest, src } => write!(f, "REVEAL_TO p{party} {dest} {src}"),
            Op::Send { from, to, dest, src } => write!(f, "SEND p{from}->p{to} {dest} {src}"),
            Op::ReadSocket { dest, client } => write!(f, "READ_SOCKET {dest} ch{client}"),
            Op::WriteSocket { src, client } => write!(f, "WRITE_SOCKET {src} ch{client}"),
            Op::ReadFile { dest } => write!(f, "READ_FILE {dest}"),
            Op::WriteFile { src } => write!(f, "WRITE_FILE {src}"),
            Op::TruncPr { dest, src, k, m } => write!(f, "TRUNC_PR {dest} {src} k{k} m{m}"),
            Op::TruncRound { dest, src, k, m } => write!(f, "TRUNC_ROUND {dest} {src} k{k} m{m}"),
            Op::Mod2m { dest, src, k, m } => write!(f, "MOD2M {dest} {src} k{k} m{m}"),
            Op::Eqz { dest, src, k } => write!(f, "EQZ {dest} {src} k{k}"),
            Op::Ltz { dest, src, k } => write!(f, "LTZ {dest} {src} k{k}"),
            Op::BitDec { dest, src, k, n } => write!(f, "BIT_DEC {dest} {src} k{k} n{n}"),
            Op::BitCompose { dest, src, n } => write!(f, "BIT_COMPOSE {dest} {src} n{n}"),
            Op::FixDiv { dest, a, b, k, f: frac } => {
                write!(f, "FIX_DIV {dest} {a} {b} k{k} f{frac}")
            }
            Op::Pow2 { dest, src, n } => write!(f, "POW2 {dest} {src} n{n}"),
            Op::ConvReg { dest, src } => write!(f, "CONV {dest} {src}"),
            Op::CondAbort { cond, reason } => write!(f, "COND_ABORT {cond} {reason}"),
        }
    }
}
