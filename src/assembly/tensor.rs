//! Global tensors that local contributions are added into, and strategies for adding them.
use crate::Real;
use eyre::{bail, eyre};
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};

/// A global tensor that accumulates local blocks.
///
/// `add` sums `values` into the entries addressed by the outer product of the dof lists, one
/// list per axis. `values` is laid out in row-major order. Repeated and overlapping calls
/// accumulate, independently of their order.
pub trait GlobalTensor<T: Real> {
    fn rank(&self) -> usize;

    fn dimension(&self, axis: usize) -> usize;

    fn add(&mut self, values: &[T], dofs: &[&[usize]]) -> eyre::Result<()>;
}

fn check_block<T>(rank: usize, values: &[T], dofs: &[&[usize]]) -> eyre::Result<()> {
    if dofs.len() != rank {
        bail!("{} dof lists given for a tensor of rank {}", dofs.len(), rank);
    }
    let expected: usize = dofs.iter().map(|d| d.len()).product();
    if values.len() != expected {
        bail!("local block has {} values, expected {}", values.len(), expected);
    }
    Ok(())
}

/// Checks every dof of an axis before anything is added, so a rejected block leaves the tensor
/// untouched.
fn check_indices(indices: &[usize], dimension: usize) -> eyre::Result<()> {
    match indices.iter().find(|&&index| index >= dimension) {
        Some(index) => Err(eyre!("dof {} is out of bounds for dimension {}", index, dimension)),
        None => Ok(()),
    }
}

/// Accumulator for functionals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarTensor<T>(pub T);

impl<T: Real> Default for ScalarTensor<T> {
    fn default() -> Self {
        Self(T::zero())
    }
}

impl<T: Real> GlobalTensor<T> for ScalarTensor<T> {
    fn rank(&self) -> usize {
        0
    }

    fn dimension(&self, _axis: usize) -> usize {
        1
    }

    fn add(&mut self, values: &[T], dofs: &[&[usize]]) -> eyre::Result<()> {
        check_block(0, values, dofs)?;
        self.0 += values[0];
        Ok(())
    }
}

impl<T: Real> GlobalTensor<T> for DVector<T> {
    fn rank(&self) -> usize {
        1
    }

    fn dimension(&self, _axis: usize) -> usize {
        self.len()
    }

    fn add(&mut self, values: &[T], dofs: &[&[usize]]) -> eyre::Result<()> {
        check_block(1, values, dofs)?;
        check_indices(dofs[0], self.len())?;
        for (&i, &v) in dofs[0].iter().zip(values) {
            self[i] += v;
        }
        Ok(())
    }
}

impl<T: Real> GlobalTensor<T> for DMatrix<T> {
    fn rank(&self) -> usize {
        2
    }

    fn dimension(&self, axis: usize) -> usize {
        if axis == 0 {
            self.nrows()
        } else {
            self.ncols()
        }
    }

    fn add(&mut self, values: &[T], dofs: &[&[usize]]) -> eyre::Result<()> {
        check_block(2, values, dofs)?;
        let (rows, cols) = (dofs[0], dofs[1]);
        check_indices(rows, self.nrows())?;
        check_indices(cols, self.ncols())?;
        for (a, &i) in rows.iter().enumerate() {
            for (b, &j) in cols.iter().enumerate() {
                self[(i, j)] += values[a * cols.len() + b];
            }
        }
        Ok(())
    }
}

/// Adds into the existing sparsity pattern. Entries outside the pattern are an error.
impl<T: Real> GlobalTensor<T> for CsrMatrix<T> {
    fn rank(&self) -> usize {
        2
    }

    fn dimension(&self, axis: usize) -> usize {
        if axis == 0 {
            self.nrows()
        } else {
            self.ncols()
        }
    }

    fn add(&mut self, values: &[T], dofs: &[&[usize]]) -> eyre::Result<()> {
        check_block(2, values, dofs)?;
        let (rows, cols) = (dofs[0], dofs[1]);
        check_indices(rows, self.nrows())?;
        // Resolve all positions in the pattern first, so that a block with an entry outside the
        // pattern is rejected as a whole
        let mut positions = Vec::with_capacity(values.len());
        for &i in rows {
            let row = self.row(i);
            let col_indices = row.col_indices();
            for &j in cols {
                let k = col_indices
                    .binary_search(&j)
                    .map_err(|_| eyre!("entry ({}, {}) is not part of the sparsity pattern", i, j))?;
                positions.push(k);
            }
        }
        for (a, &i) in rows.iter().enumerate() {
            let mut row = self.row_mut(i);
            let row_values = row.values_mut();
            for b in 0..cols.len() {
                let local = a * cols.len() + b;
                row_values[positions[local]] += values[local];
            }
        }
        Ok(())
    }
}

/// Pushes every entry of the block as a triplet. Duplicates are summed on conversion.
impl<T: Real> GlobalTensor<T> for CooMatrix<T> {
    fn rank(&self) -> usize {
        2
    }

    fn dimension(&self, axis: usize) -> usize {
        if axis == 0 {
            self.nrows()
        } else {
            self.ncols()
        }
    }

    fn add(&mut self, values: &[T], dofs: &[&[usize]]) -> eyre::Result<()> {
        check_block(2, values, dofs)?;
        let (rows, cols) = (dofs[0], dofs[1]);
        check_indices(rows, self.nrows())?;
        check_indices(cols, self.ncols())?;
        for (a, &i) in rows.iter().enumerate() {
            for (b, &j) in cols.iter().enumerate() {
                self.push(i, j, values[a * cols.len() + b]);
            }
        }
        Ok(())
    }
}

/// How local blocks are added into the global tensor.
///
/// The assembler hands every local block to its scatter strategy instead of adding it
/// directly, so that the values can be transformed first.
pub trait ScatterAdd<T: Real> {
    fn scatter_add(&self, tensor: &mut dyn GlobalTensor<T>, values: &[T], dofs: &[&[usize]]) -> eyre::Result<()>;
}

/// Adds local blocks unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectAdd;

impl<T: Real> ScatterAdd<T> for DirectAdd {
    fn scatter_add(&self, tensor: &mut dyn GlobalTensor<T>, values: &[T], dofs: &[&[usize]]) -> eyre::Result<()> {
        tensor.add(values, dofs)
    }
}

impl<T, F> ScatterAdd<T> for F
where
    T: Real,
    F: Fn(&mut dyn GlobalTensor<T>, &[T], &[&[usize]]) -> eyre::Result<()>,
{
    fn scatter_add(&self, tensor: &mut dyn GlobalTensor<T>, values: &[T], dofs: &[&[usize]]) -> eyre::Result<()> {
        self(tensor, values, dofs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitPart {
    /// `(A + A^T) / 2`
    Symmetric,
    /// `(A - A^T) / 2`
    Antisymmetric,
}

/// Adds only the symmetric or antisymmetric part of square local blocks.
///
/// Assembling once with each part gives the full tensor. Blocks must have the same dofs along
/// both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymmetricSplit {
    part: SplitPart,
}

impl SymmetricSplit {
    pub fn new(part: SplitPart) -> Self {
        Self { part }
    }

    pub fn symmetric() -> Self {
        Self::new(SplitPart::Symmetric)
    }

    pub fn antisymmetric() -> Self {
        Self::new(SplitPart::Antisymmetric)
    }

    pub fn part(&self) -> SplitPart {
        self.part
    }
}

impl<T: Real> ScatterAdd<T> for SymmetricSplit {
    fn scatter_add(&self, tensor: &mut dyn GlobalTensor<T>, values: &[T], dofs: &[&[usize]]) -> eyre::Result<()> {
        check_block(2, values, dofs)?;
        if dofs[0] != dofs[1] {
            bail!("symmetric splitting requires identical row and column dofs");
        }
        let n = dofs[0].len();
        let half = T::from_f64(0.5).expect("Literal must fit in T");
        let mut split = Vec::with_capacity(values.len());
        for i in 0..n {
            for j in 0..n {
                let (a_ij, a_ji) = (values[i * n + j], values[j * n + i]);
                split.push(match self.part {
                    SplitPart::Symmetric => half * (a_ij + a_ji),
                    SplitPart::Antisymmetric => half * (a_ij - a_ji),
                });
            }
        }
        tensor.add(&split, dofs)
    }
}
