//! Memory-backed containers.
//!
//! Register-based values are ephemeral: they live for one tape and never
//! cross a basic-block or thread boundary. Everything that must survive a
//! control-flow join or be visible to another tape goes through the static
//! per-kind memory defined by the instruction layer. [`Array`] owns a
//! contiguous address range, [`MultiArray`]/[`Matrix`] lay out nested
//! dimensions row-major over one range, and [`MemValue`] is the single-slot
//! primitive for passing one value across blocks.
//!
//! Containers are allocated once and never resized; deleting one returns
//! its range to the pool of its kind.

mod array;
mod memvalue;
mod multi;

pub use array::{Array, Index};
pub use memvalue::MemValue;
pub use multi::{Matrix, MultiArray, SubView};

use mpc_ir::{RegId, RegKind};

use crate::frontend::Frontend;
use crate::types::{ClearInt, Int64, SecretBit, SecretInt};

/// A register-based kind that can live in static memory.
///
/// Elements occupy one slot per lane; a value of batch width `n` spans `n`
/// consecutive addresses.
pub trait MemElement: Clone {
    /// Kind name for error reporting.
    const KIND_NAME: &'static str;

    /// The register file (and so the address space) this kind lives in.
    fn mem_kind() -> RegKind;

    /// First register of the value.
    fn reg(&self) -> RegId;

    /// Batch width.
    fn size(&self) -> u32;

    /// Wraps a freshly loaded register run as a value of this kind.
    fn from_reg(fe: &mut Frontend, reg: RegId, size: u32) -> Self;
}

impl MemElement for SecretInt {
    const KIND_NAME: &'static str = "secret integer";

    fn mem_kind() -> RegKind {
        RegKind::Secret
    }

    fn reg(&self) -> RegId {
        self.reg
    }

    fn size(&self) -> u32 {
        self.size
    }

    fn from_reg(fe: &mut Frontend, reg: RegId, size: u32) -> Self {
        SecretInt::from_reg(fe, reg, size)
    }
}

impl MemElement for ClearInt {
    const KIND_NAME: &'static str = "clear integer";

    fn mem_kind() -> RegKind {
        RegKind::Clear
    }

    fn reg(&self) -> RegId {
        self.reg
    }

    fn size(&self) -> u32 {
        self.size
    }

    fn from_reg(_fe: &mut Frontend, reg: RegId, size: u32) -> Self {
        ClearInt::from_reg(reg, size)
    }
}

impl MemElement for Int64 {
    const KIND_NAME: &'static str = "machine integer";

    fn mem_kind() -> RegKind {
        RegKind::Int64
    }

    fn reg(&self) -> RegId {
        self.reg
    }

    fn size(&self) -> u32 {
        self.size
    }

    fn from_reg(_fe: &mut Frontend, reg: RegId, size: u32) -> Self {
        Int64::from_reg(reg, size)
    }
}

impl MemElement for SecretBit {
    const KIND_NAME: &'static str = "secret bit";

    fn mem_kind() -> RegKind {
        RegKind::SecretBit
    }

    fn reg(&self) -> RegId {
        self.reg
    }

    fn size(&self) -> u32 {
        self.size
    }

    fn from_reg(_fe: &mut Frontend, reg: RegId, size: u32) -> Self {
        SecretBit { reg, size }
    }
}
