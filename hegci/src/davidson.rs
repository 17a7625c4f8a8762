//! Davidson eigensolver for the lowest eigenpair of a large, sparse,
//! symmetric operator exposed through a matrix-vector product.

use nalgebra::DMatrix;

const RESIDUAL_TOLERANCE: f64 = 1.0e-10;

/// Iterative subspace solver for the lowest eigenpair.
///
/// The operator is given by its `diagonal` (used as preconditioner) and an
/// `apply` closure computing `H·v`. The subspace eigenproblem stays tiny, one
/// dimension per iteration, and is solved densely.
pub struct Davidson<'a, F>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    diagonal: &'a [f64],
    apply: F,
    n: usize,
    lowest_eigenvalue: f64,
    lowest_eigenvector: Vec<f64>,
}

impl<'a, F> Davidson<'a, F>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    /// Creates a solver for an operator of dimension `n`.
    ///
    /// # Panics
    ///
    /// Panics if `diagonal.len()` differs from `n` or `n` is zero.
    #[must_use]
    pub fn new(diagonal: &'a [f64], apply: F, n: usize) -> Self {
        assert_eq!(diagonal.len(), n);
        assert!(n > 0);
        Self {
            diagonal,
            apply,
            n,
            lowest_eigenvalue: 0.0,
            lowest_eigenvector: vec![0.0; n],
        }
    }

    /// The best eigenvalue found so far.
    #[must_use]
    pub const fn lowest_eigenvalue(&self) -> f64 {
        self.lowest_eigenvalue
    }

    /// The eigenvector belonging to [`Self::lowest_eigenvalue`].
    #[must_use]
    pub fn lowest_eigenvector(&self) -> &[f64] {
        &self.lowest_eigenvector
    }

    /// Expands the subspace from `initial` until the residual norm drops
    /// below tolerance or the iteration budget runs out. Returns the number
    /// of iterations consumed; a return value equal to `max_iterations`
    /// signals non-convergence to the caller.
    ///
    /// # Panics
    ///
    /// Panics if `initial.len()` differs from the operator dimension.
    pub fn diagonalize(&mut self, initial: &[f64], max_iterations: usize) -> usize {
        assert_eq!(initial.len(), self.n);

        let mut first = initial.to_vec();
        let initial_norm = norm(&first);
        if initial_norm > f64::EPSILON {
            scale(&mut first, 1.0 / initial_norm);
        } else {
            first.fill(0.0);
            first[0] = 1.0;
        }

        let mut basis = vec![first];
        let mut sigmas: Vec<Vec<f64>> = Vec::new();
        let mut iterations = 0;

        for iteration in 0..max_iterations {
            iterations = iteration + 1;

            let newest = basis.len() - 1;
            sigmas.push((self.apply)(&basis[newest]));

            let dim = basis.len();
            let mut subspace = DMatrix::from_fn(dim, dim, |i, j| dot(&basis[i], &sigmas[j]));
            subspace = (subspace.clone() + subspace.transpose()) * 0.5;

            let eigen = subspace.symmetric_eigen();
            let lowest = eigen
                .eigenvalues
                .iter()
                .enumerate()
                .min_by(|a, b| a.1.total_cmp(b.1))
                .map(|(index, _)| index)
                .unwrap_or_else(|| unreachable!());
            let eigenvalue = eigen.eigenvalues[lowest];
            let weights = eigen.eigenvectors.column(lowest);

            let mut ritz = vec![0.0; self.n];
            let mut residual = vec![0.0; self.n];
            for (index, (vector, sigma)) in basis.iter().zip(&sigmas).enumerate() {
                axpy(weights[index], vector, &mut ritz);
                axpy(weights[index], sigma, &mut residual);
            }
            axpy(-eigenvalue, &ritz, &mut residual);

            self.lowest_eigenvalue = eigenvalue;
            self.lowest_eigenvector.copy_from_slice(&ritz);

            if norm(&residual) < RESIDUAL_TOLERANCE {
                break;
            }

            // Diagonal preconditioning of the residual.
            let mut direction = residual;
            for (value, &diag) in direction.iter_mut().zip(self.diagonal) {
                let mut denominator = eigenvalue - diag;
                if denominator.abs() < 1.0e-12 {
                    denominator = 1.0e-12_f64.copysign(denominator);
                }
                *value /= denominator;
            }

            // Orthogonalise against the existing basis.
            for vector in &basis {
                let overlap = dot(vector, &direction);
                axpy(-overlap, vector, &mut direction);
            }
            let direction_norm = norm(&direction);
            if direction_norm < 1.0e-12 {
                // The subspace is exhausted; the current pair is as good as
                // this operator dimension permits.
                break;
            }
            scale(&mut direction, 1.0 / direction_norm);
            basis.push(direction);
        }

        iterations
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}

fn scale(a: &mut [f64], factor: f64) {
    for value in a {
        *value *= factor;
    }
}

fn axpy(factor: f64, x: &[f64], y: &mut [f64]) {
    for (y_i, &x_i) in y.iter_mut().zip(x) {
        *y_i += factor * x_i;
    }
}
