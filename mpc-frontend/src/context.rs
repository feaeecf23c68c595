//! Scoped execution context.
//!
//! Batch width, instruction domain and default bit length are stack
//! disciplined: an operation pushes its local requirement (a binary operator
//! pushes the broadcast width of its operands), does its work, and pops on
//! every exit path. Nested operations therefore always observe a fully
//! restored context on their own exit, and a failing sub-expression cannot
//! leak an inconsistent width to its continuation. The context is a plain
//! value owned by the front-end, never a global.

use crate::error::{CompilerError, Result};

/// The instruction domain currently compiled for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Domain {
    /// Ring/field arithmetic instructions.
    Arithmetic,
    /// Binary-circuit instructions.
    Binary,
}

/// Stack-disciplined compilation state read by every primitive-emitting
/// operation.
#[derive(Debug)]
pub struct ExecContext {
    sizes: Vec<u32>,
    domains: Vec<Domain>,
    bit_lengths: Vec<u32>,
}

impl ExecContext {
    /// Creates a context with batch width 1, arithmetic domain and the
    /// given default bit length at the bottom of the stacks.
    pub fn new(bit_length: u32) -> Self {
        Self {
            sizes: vec![1],
            domains: vec![Domain::Arithmetic],
            bit_lengths: vec![bit_length],
        }
    }

    /// Current batch width.
    pub fn vector_size(&self) -> u32 {
        *self.sizes.last().expect("context size stack never empty")
    }

    /// Current instruction domain.
    pub fn domain(&self) -> Domain {
        *self.domains.last().expect("context domain stack never empty")
    }

    /// Current default bit length.
    pub fn bit_length(&self) -> u32 {
        *self
            .bit_lengths
            .last()
            .expect("context bit-length stack never empty")
    }

    pub(crate) fn push_size(&mut self, size: u32) -> Result<()> {
        if size == 0 {
            // width 0 is a compiler defect, not a user error
            return Err(CompilerError::Internal(
                "attempt to set batch width 0".into(),
            ));
        }
        self.sizes.push(size);
        Ok(())
    }

    pub(crate) fn pop_size(&mut self) {
        self.sizes.pop();
        debug_assert!(!self.sizes.is_empty(), "popped the base batch width");
    }

    pub(crate) fn push_domain(&mut self, domain: Domain) {
        self.domains.push(domain);
    }

    pub(crate) fn pop_domain(&mut self) {
        self.domains.pop();
        debug_assert!(!self.domains.is_empty(), "popped the base domain");
    }

    pub(crate) fn push_bit_length(&mut self, n: u32) {
        self.bit_lengths.push(n);
    }

    pub(crate) fn pop_bit_length(&mut self) {
        self.bit_lengths.pop();
        debug_assert!(!self.bit_lengths.is_empty(), "popped the base bit length");
    }
}

/// Checks the broadcast invariant and returns the result width.
///
/// Two widths are compatible iff they are equal or exactly one of them
/// is 1; the result width is the larger one.
pub fn broadcast(lhs: u32, rhs: u32) -> Result<u32> {
    if lhs == rhs || lhs.min(rhs) == 1 {
        Ok(lhs.max(rhs))
    } else {
        Err(CompilerError::VectorMismatch { lhs, rhs })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_invariant() {
        assert_eq!(broadcast(4, 4).unwrap(), 4);
        assert_eq!(broadcast(1, 7).unwrap(), 7);
        assert_eq!(broadcast(7, 1).unwrap(), 7);
        assert_eq!(broadcast(1, 1).unwrap(), 1);
        assert!(matches!(
            broadcast(2, 3),
            Err(CompilerError::VectorMismatch { lhs: 2, rhs: 3 })
        ));
    }

    #[test]
    fn zero_width_is_a_defect() {
        let mut ctx = ExecContext::new(64);
        assert!(ctx.push_size(0).is_err());
        assert_eq!(ctx.vector_size(), 1);
    }

    #[test]
    fn stacks_nest() {
        let mut ctx = ExecContext::new(64);
        ctx.push_size(8).unwrap();
        ctx.push_domain(Domain::Binary);
        assert_eq!(ctx.vector_size(), 8);
        assert_eq!(ctx.domain(), Domain::Binary);
        ctx.pop_domain();
        ctx.pop_size();
        assert_eq!(ctx.vector_size(), 1);
        assert_eq!(ctx.domain(), Domain::Arithmetic);
    }
}
