//! The generic single-bit gate interface the circuit kernels build on.
//!
//! The same adder/comparator/multiplier constructions serve three worlds:
//! arithmetic-domain secret bits (gates via ring identities), binary-field
//! elements (native XOR/AND), and a plain boolean evaluator used by tests.
//! Constants are lazily materialized so a kernel that never needs them
//! costs nothing.

use crate::error::Result;
use crate::frontend::Frontend;
use crate::types::{SecretBin, SecretBit};

/// Single-bit gate set. `Bit` is whatever the implementation pushes around:
/// a register handle or a concrete boolean.
pub trait BitGates {
    /// The bit representation.
    type Bit: Clone;

    /// XOR gate.
    fn xor(&mut self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit>;
    /// AND gate.
    fn and(&mut self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit>;
    /// NOT gate.
    fn not(&mut self, a: &Self::Bit) -> Result<Self::Bit>;
    /// The constant 0, materialized at most once.
    fn const_zero(&mut self) -> Result<Self::Bit>;
    /// The constant 1, materialized at most once.
    fn const_one(&mut self) -> Result<Self::Bit>;

    /// OR from XOR and AND: `(a ^ b) ^ (a & b)`.
    fn or(&mut self, a: &Self::Bit, b: &Self::Bit) -> Result<Self::Bit> {
        let x = self.xor(a, b)?;
        let n = self.and(a, b)?;
        self.xor(&x, &n)
    }

    /// Multiplexer from one AND: `f ^ (cond & (t ^ f))`.
    fn mux(&mut self, cond: &Self::Bit, t: &Self::Bit, f: &Self::Bit) -> Result<Self::Bit> {
        let d = self.xor(t, f)?;
        let cd = self.and(cond, &d)?;
        self.xor(f, &cd)
    }
}

/// Gates over arithmetic-domain secret bits, lowered through the ring
/// identities (`a+b-2ab` and friends). Each AND costs one secret
/// multiplication in the VM.
pub struct ArithGates<'a> {
    fe: &'a mut Frontend,
    zero: Option<SecretBit>,
    one: Option<SecretBit>,
}

impl<'a> ArithGates<'a> {
    /// Wraps the front-end for circuit emission.
    pub fn new(fe: &'a mut Frontend) -> Self {
        Self {
            fe,
            zero: None,
            one: None,
        }
    }

    /// The wrapped front-end.
    pub fn fe(&mut self) -> &mut Frontend {
        self.fe
    }
}

impl BitGates for ArithGates<'_> {
    type Bit = SecretBit;

    fn xor(&mut self, a: &SecretBit, b: &SecretBit) -> Result<SecretBit> {
        a.xor(self.fe, b)
    }

    fn and(&mut self, a: &SecretBit, b: &SecretBit) -> Result<SecretBit> {
        a.and(self.fe, b)
    }

    fn not(&mut self, a: &SecretBit) -> Result<SecretBit> {
        a.not(self.fe)
    }

    fn const_zero(&mut self) -> Result<SecretBit> {
        if let Some(z) = &self.zero {
            return Ok(z.clone());
        }
        let z = SecretBit::constant(self.fe, false)?;
        self.zero = Some(z.clone());
        Ok(z)
    }

    fn const_one(&mut self) -> Result<SecretBit> {
        if let Some(o) = &self.one {
            return Ok(o.clone());
        }
        let o = SecretBit::constant(self.fe, true)?;
        self.one = Some(o.clone());
        Ok(o)
    }
}

/// Gates over single-bit secret binary-field elements, using the native
/// binary-domain instructions.
pub struct BinGates<'a> {
    fe: &'a mut Frontend,
    zero: Option<SecretBin>,
    one: Option<SecretBin>,
}

impl<'a> BinGates<'a> {
    /// Wraps the front-end for circuit emission.
    pub fn new(fe: &'a mut Frontend) -> Self {
        Self {
            fe,
            zero: None,
            one: None,
        }
    }
}

impl BitGates for BinGates<'_> {
    type Bit = SecretBin;

    fn xor(&mut self, a: &SecretBin, b: &SecretBin) -> Result<SecretBin> {
        a.xor(self.fe, b)
    }

    fn and(&mut self, a: &SecretBin, b: &SecretBin) -> Result<SecretBin> {
        a.and(self.fe, b)
    }

    fn not(&mut self, a: &SecretBin) -> Result<SecretBin> {
        a.not(self.fe)
    }

    fn const_zero(&mut self) -> Result<SecretBin> {
        if let Some(z) = &self.zero {
            return Ok(z.clone());
        }
        let z = SecretBin::from_const(self.fe, 0, 1)?;
        self.zero = Some(z.clone());
        Ok(z)
    }

    fn const_one(&mut self) -> Result<SecretBin> {
        if let Some(o) = &self.one {
            return Ok(o.clone());
        }
        let o = SecretBin::from_const(self.fe, 1, 1)?;
        self.one = Some(o.clone());
        Ok(o)
    }
}

/// Concrete boolean evaluator. Runs the kernels locally without a VM,
/// primarily intended for testing the circuit constructions.
#[derive(Debug, Default)]
pub struct PlainGates {
    /// Number of AND gates evaluated; the non-linear cost of a circuit.
    pub and_count: usize,
}

impl BitGates for PlainGates {
    type Bit = bool;

    fn xor(&mut self, a: &bool, b: &bool) -> Result<bool> {
        Ok(a ^ b)
    }

    fn and(&mut self, a: &bool, b: &bool) -> Result<bool> {
        self.and_count += 1;
        Ok(a & b)
    }

    fn not(&mut self, a: &bool) -> Result<bool> {
        Ok(!a)
    }

    fn const_zero(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn const_one(&mut self) -> Result<bool> {
        Ok(true)
    }
}
