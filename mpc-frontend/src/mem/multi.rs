//! Row-major multi-dimensional views over one address range.

use std::marker::PhantomData;

use mpc_ir::{Address, Op};

use crate::error::{CompilerError, Result};
use crate::frontend::Frontend;
use crate::mem::MemElement;

/// A multi-dimensional array laid out row-major in one contiguous range.
///
/// The top-level object owns the storage; indexing all but the last
/// dimension yields [`SubView`]s borrowing the same range, so only
/// last-dimension accesses touch memory.
pub struct MultiArray<T: MemElement> {
    base: Address,
    dims: Vec<u64>,
    deleted: bool,
    _elem: PhantomData<T>,
}

impl<T: MemElement> MultiArray<T> {
    /// Allocates storage for the given dimensions.
    pub fn new(fe: &mut Frontend, dims: &[u64]) -> Self {
        let total: u64 = dims.iter().product();
        let base = fe.malloc(T::mem_kind(), total);
        Self {
            base,
            dims: dims.to_vec(),
            deleted: false,
            _elem: PhantomData,
        }
    }

    /// The dimensions, outermost first.
    pub fn dims(&self) -> &[u64] {
        &self.dims
    }

    /// Total number of slots.
    pub fn total_len(&self) -> u64 {
        self.dims.iter().product()
    }

    /// A view spanning the whole array.
    pub fn view(&self) -> Result<SubView<'_, T>> {
        if self.deleted {
            return Err(CompilerError::DeletedAccess {
                what: "multi-array",
            });
        }
        Ok(SubView {
            base: self.base,
            offset: 0,
            dims: &self.dims,
            _elem: PhantomData,
        })
    }

    /// Returns the address range to the pool.
    pub fn delete(&mut self, fe: &mut Frontend) -> Result<()> {
        if self.deleted {
            return Err(CompilerError::DeletedAccess {
                what: "multi-array",
            });
        }
        fe.free(T::mem_kind(), self.base, self.total_len())?;
        self.deleted = true;
        Ok(())
    }
}

/// A borrowed slice of a [`MultiArray`] with some leading dimensions fixed.
pub struct SubView<'a, T: MemElement> {
    base: Address,
    offset: u64,
    dims: &'a [u64],
    _elem: PhantomData<T>,
}

impl<'a, T: MemElement> SubView<'a, T> {
    /// Remaining dimensions.
    pub fn dims(&self) -> &[u64] {
        self.dims
    }

    fn stride(&self) -> u64 {
        self.dims[1..].iter().product()
    }

    fn check_index(&self, index: u64) -> Result<()> {
        if index >= self.dims[0] {
            return Err(CompilerError::IndexOutOfBounds {
                index,
                length: self.dims[0],
            });
        }
        Ok(())
    }

    /// Fixes the outermost dimension, narrowing the view.
    pub fn at(&self, index: u64) -> Result<SubView<'a, T>> {
        if self.dims.len() < 2 {
            return Err(CompilerError::Internal(
                "narrowing a one-dimensional view".into(),
            ));
        }
        self.check_index(index)?;
        Ok(SubView {
            base: self.base,
            offset: self.offset + index * self.stride(),
            dims: &self.dims[1..],
            _elem: PhantomData,
        })
    }

    /// Loads one element; valid on one-dimensional views.
    pub fn get(&self, fe: &mut Frontend, index: u64) -> Result<T> {
        if self.dims.len() != 1 {
            return Err(CompilerError::Internal(
                "element access on a view with more than one dimension".into(),
            ));
        }
        self.check_index(index)?;
        let address = self.base.offset(self.offset + index);
        fe.with_size(1, |fe| {
            let dest = fe.alloc(T::mem_kind());
            fe.emit(Op::LdM { dest, address });
            Ok(T::from_reg(fe, dest, 1))
        })
    }

    /// Stores one element; valid on one-dimensional views.
    pub fn set(&self, fe: &mut Frontend, index: u64, value: &T) -> Result<()> {
        if self.dims.len() != 1 {
            return Err(CompilerError::Internal(
                "element access on a view with more than one dimension".into(),
            ));
        }
        self.check_index(index)?;
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
                address: self.base.offset(self.offset + index),
            },
        );
        Ok(())
    }

    /// Loads the whole view as one batched value (row-major order).
    pub fn get_vector(&self, fe: &mut Frontend) -> Result<T> {
        let n: u64 = self.dims.iter().product();
        let n = n as u32;
        fe.with_size(n, |fe| {
            let dest = fe.alloc(T::mem_kind());
            fe.emit(Op::LdM {
                dest,
                address: self.base.offset(self.offset),
            });
            Ok(T::from_reg(fe, dest, n))
        })
    }
}

/// Two-dimensional convenience wrapper.
pub struct Matrix<T: MemElement> {
    inner: MultiArray<T>,
}

impl<T: MemElement> Matrix<T> {
    /// Allocates a `rows × cols` matrix.
    pub fn new(fe: &mut Frontend, rows: u64, cols: u64) -> Self {
        Self {
            inner: MultiArray::new(fe, &[rows, cols]),
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> u64 {
        self.inner.dims()[0]
    }

    /// Number of columns.
    pub fn cols(&self) -> u64 {
        self.inner.dims()[1]
    }

    /// A one-dimensional view of row `r`.
    pub fn row(&self, r: u64) -> Result<SubView<'_, T>> {
        self.inner.view()?.at(r)
    }

    /// Loads the element at `(r, c)`.
    pub fn get(&self, fe: &mut Frontend, r: u64, c: u64) -> Result<T> {
        self.row(r)?.get(fe, c)
    }

    /// Stores the element at `(r, c)`.
    pub fn set(&self, fe: &mut Frontend, r: u64, c: u64, value: &T) -> Result<()> {
        self.row(r)?.set(fe, c, value)
    }

    /// Returns the address range to the pool.
    pub fn delete(&mut self, fe: &mut Frontend) -> Result<()> {
        self.inner.delete(fe)
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
    fn views_share_the_backing_range() {
        let mut fe = fe();
        let m = MultiArray::<SecretInt>::new(&mut fe, &[2, 3, 4]);
        assert_eq!(m.total_len(), 24);
        let v = m.view().unwrap().at(1).unwrap().at(2).unwrap();
        assert_eq!(v.dims(), &[4]);
        // rows load without any address arithmetic instructions
        let before = fe.tape().len();
        v.get(&mut fe, 0).unwrap();
        assert_eq!(fe.tape().len(), before + 1);
    }

    #[test]
    fn row_major_addressing() {
        let mut fe = fe();
        let m = Matrix::<SecretInt>::new(&mut fe, 3, 5);
        let x = SecretInt::from_const(&mut fe, 9).unwrap();
        m.set(&mut fe, 2, 4, &x).unwrap();
        // last slot of the range
        let stored = fe
            .tape()
            .instrs()
            .iter()
            .filter_map(|i| match i.op {
                Op::StM { address, .. } => Some(address),
                _ => None,
            })
            .next_back()
            .unwrap();
        assert_eq!(stored.0, m.inner.base.0 + 14);
    }

    #[test]
    fn dimension_bounds_are_checked() {
        let mut fe = fe();
        let m = Matrix::<SecretInt>::new(&mut fe, 2, 2);
        assert!(matches!(
            m.get(&mut fe, 2, 0),
            Err(CompilerError::IndexOutOfBounds {
                index: 2,
                length: 2
            })
        ));
        assert!(matches!(
            m.get(&mut fe, 0, 2),
            Err(CompilerError::IndexOutOfBounds {
                index: 2,
                length: 2
            })
        ));
    }

    #[test]
    fn deleted_multi_array_rejects_views() {
        let mut fe = fe();
        let mut m = MultiArray::<SecretInt>::new(&mut fe, &[4, 4]);
        m.delete(&mut fe).unwrap();
        assert!(matches!(
            m.view(),
            Err(CompilerError::DeletedAccess { .. })
        ));
    }
}
