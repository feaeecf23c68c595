//! Player-local values.
//!
//! A personal value is clear to exactly one party and opaque to everyone
//! else. Local arithmetic is free but only between values of the same
//! owner; combining with a secret kind goes through a secure input step.

use mpc_ir::Op;

use crate::error::{CompilerError, Result};
use crate::frontend::Frontend;
use crate::types::{ClearInt, NumberOps, SecretInt};

/// Clear value known in plaintext to a single declared party.
#[derive(Clone, Debug)]
pub struct Personal {
    pub(crate) owner: u32,
    pub(crate) value: ClearInt,
}

impl Personal {
    /// Wraps a clear value as known only to `owner`. The caller is
    /// responsible for the value actually originating at that party
    /// (reveal-to and player transfers construct these correctly).
    pub fn new(owner: u32, value: ClearInt) -> Self {
        Self { owner, value }
    }

    /// The owning party.
    pub fn owner(&self) -> u32 {
        self.owner
    }

    /// Batch width.
    pub fn size(&self) -> u32 {
        self.value.size()
    }

    fn check_owner(&self, other: &Self) -> Result<()> {
        if self.owner != other.owner {
            return Err(CompilerError::OwnerMismatch {
                lhs: self.owner,
                rhs: other.owner,
            });
        }
        Ok(())
    }

    /// Local addition; both operands must belong to the same party.
    pub fn add(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        self.check_owner(other)?;
        Ok(Self {
            owner: self.owner,
            value: self.value.add(fe, &other.value)?,
        })
    }

    /// Local subtraction; both operands must belong to the same party.
    pub fn sub(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        self.check_owner(other)?;
        Ok(Self {
            owner: self.owner,
            value: self.value.sub(fe, &other.value)?,
        })
    }

    /// Local multiplication; both operands must belong to the same party.
    pub fn mul(&self, fe: &mut Frontend, other: &Self) -> Result<Self> {
        self.check_owner(other)?;
        Ok(Self {
            owner: self.owner,
            value: self.value.mul(fe, &other.value)?,
        })
    }

    /// Secret-shares the value: a secure input step by the owner.
    pub fn to_secret(&self, fe: &mut Frontend) -> Result<SecretInt> {
        fe.with_size(self.size(), |fe| SecretInt::input(fe, self.owner))
    }

    /// Hands the value to another party.
    pub fn send_to(&self, fe: &mut Frontend, to: u32) -> Result<Personal> {
        fe.with_size(self.size(), |fe| {
            let dest = fe.alloc(self.value.reg().kind);
            fe.emit(Op::Send {
                from: self.owner,
                to,
                dest,
                src: self.value.reg(),
            });
            Ok(Personal {
                owner: to,
                value: ClearInt::from_reg(dest, self.size()),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompilerConfig;

    #[test]
    fn owner_mismatch_is_rejected() {
        let mut fe = Frontend::new(CompilerConfig::default());
        let a = Personal::new(0, ClearInt::from_const(&mut fe, 1).unwrap());
        let b = Personal::new(1, ClearInt::from_const(&mut fe, 2).unwrap());
        assert!(matches!(
            a.add(&mut fe, &b),
            Err(CompilerError::OwnerMismatch { lhs: 0, rhs: 1 })
        ));
    }

    #[test]
    fn secret_mixing_is_an_input_step() {
        let mut fe = Frontend::new(CompilerConfig::default());
        let p = Personal::new(2, ClearInt::from_const(&mut fe, 7).unwrap());
        let s = p.to_secret(&mut fe).unwrap();
        assert_eq!(
            fe.tape()
                .count_ops(|op| matches!(op, Op::Input { party: 2, .. })),
            1
        );
        let other = SecretInt::from_const(&mut fe, 1).unwrap();
        s.add(&mut fe, &other).unwrap();
    }
}
