//! Ordered list of weighted determinants.

use super::det::Det;

/// A determinant together with its variational coefficient.
#[derive(Clone, Debug)]
pub struct Term {
    /// The determinant.
    pub det: Det,
    /// Its coefficient in the current eigenvector.
    pub coef: f64,
}

/// An ordered sequence of [`Term`]s. Term positions are stable between
/// mutations, so they double as row indices of the projected Hamiltonian.
#[derive(Clone, Debug, Default)]
pub struct Wavefunction {
    terms: Vec<Term>,
}

impl Wavefunction {
    /// Creates an empty wavefunction.
    #[must_use]
    pub const fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// Number of terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns `true` if there are no terms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Appends a term at the end.
    pub fn append_term(&mut self, det: Det, coef: f64) {
        self.terms.push(Term { det, coef });
    }

    /// All terms in order.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Copies out the coefficients in term order.
    #[must_use]
    pub fn coefs(&self) -> Vec<f64> {
        self.terms.iter().map(|term| term.coef).collect()
    }

    /// Overwrites all coefficients in term order.
    ///
    /// # Panics
    ///
    /// Panics if `coefs.len()` differs from the number of terms.
    pub fn set_coefs(&mut self, coefs: &[f64]) {
        assert_eq!(coefs.len(), self.terms.len());
        for (term, &coef) in self.terms.iter_mut().zip(coefs) {
            term.coef = coef;
        }
    }

    /// Permutes terms to descending `|coef|`, which keeps high-weight
    /// determinants at small row indices. The sort is stable and ties are
    /// broken by the encoded determinant, so every worker arrives at the same
    /// permutation.
    pub fn sort_by_coefs(&mut self) {
        self.terms.sort_by(|a, b| {
            b.coef
                .abs()
                .total_cmp(&a.coef.abs())
                .then_with(|| a.det.encode().cmp(&b.det.encode()))
        });
    }
}
