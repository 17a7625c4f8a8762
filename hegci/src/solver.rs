//! Variational driver: determinant-set expansion, diagonalisation, and the
//! distributed Hamiltonian apply used by the eigensolver.

use super::davidson::Davidson;
use super::det::{Det, DetCode};
use super::parallel::Communicator;
use super::timer::Timer;
use super::wavefunction::Wavefunction;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

/// Outer loop stops once consecutive variational energies agree this well.
const ENERGY_TOLERANCE: f64 = 1.0e-6;

/// The two system-specific hooks the variational driver needs.
pub trait Model: Sync {
    /// Matrix element `⟨det_i|H|det_j⟩`.
    fn hamiltonian(&self, det_i: &Det, det_j: &Det) -> f64;

    /// `det` followed by every determinant reachable through a double
    /// excitation whose matrix element magnitude is potentially at least
    /// `eps`.
    fn connected_dets(&self, det: &Det, eps: f64) -> Vec<Det>;

    /// The Hartree–Fock determinant of the system.
    fn hartree_fock(&self) -> Det;
}

/// The iteratively grown variational wavefunction and its energies.
///
/// Every worker holds an identical copy and mutates it identically; workers
/// only exchange data inside [`Communicator`] collectives.
pub struct Solver<'a, C: Communicator> {
    comm: &'a C,
    wf: Wavefunction,
    var_dets_index: FxHashMap<DetCode, usize>,
    new_dets_spawn_coef: FxHashMap<DetCode, f64>,
    energy_hf: f64,
    energy_var: f64,
}

impl<'a, C: Communicator> Solver<'a, C> {
    /// Creates a solver with an empty wavefunction.
    #[must_use]
    pub fn new(comm: &'a C) -> Self {
        Self {
            comm,
            wf: Wavefunction::new(),
            var_dets_index: FxHashMap::default(),
            new_dets_spawn_coef: FxHashMap::default(),
            energy_hf: 0.0,
            energy_var: 0.0,
        }
    }

    /// The Hartree–Fock energy, set once the wavefunction is seeded.
    #[must_use]
    pub const fn energy_hf(&self) -> f64 {
        self.energy_hf
    }

    /// The latest converged variational energy.
    #[must_use]
    pub const fn energy_var(&self) -> f64 {
        self.energy_var
    }

    /// The current wavefunction.
    #[must_use]
    pub const fn wavefunction(&self) -> &Wavefunction {
        &self.wf
    }

    /// Grows the determinant set and rediagonalises until the energy
    /// stabilises or the eigensolver exhausts its budget.
    ///
    /// `eps_var` gates which spawned determinants enter the wavefunction;
    /// `eps_var_ham_old` and `eps_var_ham_new` gate the matrix elements the
    /// apply operator keeps for pre-existing and for freshly added rows.
    pub fn variation<M: Model>(
        &mut self,
        model: &M,
        eps_var: f64,
        eps_var_ham_old: f64,
        eps_var_ham_new: f64,
        timer: &mut Timer,
    ) {
        if self.wf.is_empty() {
            let det_hf = model.hartree_fock();
            let energy = model.hamiltonian(&det_hf, &det_hf);
            self.wf.append_term(det_hf, 1.0);
            self.energy_hf = energy;
            self.energy_var = energy;
            if self.comm.is_master() {
                println!("HF energy: {energy:.15} Ha");
            }
        }

        let mut energy_var_new = 0.0; // Lets the first comparison fail.
        let mut end_variation = false;
        let mut iteration = 0;

        while (self.energy_var - energy_var_new).abs() > ENERGY_TOLERANCE && !end_variation {
            timer.start(&format!("variation iteration: {iteration}"));

            self.var_dets_index = self
                .wf
                .terms()
                .iter()
                .enumerate()
                .map(|(position, term)| (term.det.encode(), position))
                .collect();

            // Spawn candidates from every current term; remember the largest
            // spawning coefficient magnitude for the apply threshold.
            self.new_dets_spawn_coef.clear();
            for term in self.wf.terms() {
                let abs_coef = term.coef.abs();
                for connected in model.connected_dets(&term.det, eps_var / abs_coef) {
                    let code = connected.encode();
                    if !self.var_dets_index.contains_key(&code)
                        && !self.new_dets_spawn_coef.contains_key(&code)
                    {
                        self.new_dets_spawn_coef.insert(code, abs_coef);
                    }
                }
            }
            timer.checkpoint("found connections");

            let n_new = self.new_dets_spawn_coef.len();
            if self.comm.is_master() {
                println!(
                    "Number of new / total dets: {} / {}",
                    n_new,
                    self.wf.len() + n_new
                );
            }

            for code in self.new_dets_spawn_coef.keys() {
                self.var_dets_index.insert(code.clone(), self.wf.len());
                self.wf.append_term(Det::decode(code), 0.0);
            }

            self.energy_var = energy_var_new;
            let budget = if n_new > 0 { 5 } else { 10 };
            let (energy, exhausted) =
                self.diagonalize(model, eps_var_ham_old, eps_var_ham_new, budget, timer);
            energy_var_new = energy;
            if exhausted {
                end_variation = true;
            }
            if self.comm.is_master() {
                println!("Variation energy: {energy_var_new:.15} Ha");
            }

            iteration += 1;
            timer.end();
        }

        self.energy_var = energy_var_new;
        if self.comm.is_master() {
            println!("Final variation energy: {:.15} Ha", self.energy_var);
        }
    }

    /// Diagonalises the projected Hamiltonian, overwrites the coefficients
    /// with the lowest eigenvector and re-sorts the wavefunction. Returns the
    /// lowest eigenvalue and whether the eigensolver consumed its budget.
    fn diagonalize<M: Model>(
        &mut self,
        model: &M,
        eps_old: f64,
        eps_new: f64,
        max_iterations: usize,
        timer: &mut Timer,
    ) -> (f64, bool) {
        let diagonal: Vec<f64> = self
            .wf
            .terms()
            .par_iter()
            .map(|term| model.hamiltonian(&term.det, &term.det))
            .collect();
        let initial = self.wf.coefs();

        timer.start("diagonalization");
        let (eigenvalue, eigenvector, iterations) = {
            let apply = |vec: &[f64]| self.apply_hamiltonian(model, vec, eps_old, eps_new);
            let mut davidson = Davidson::new(&diagonal, apply, self.wf.len());
            let iterations = davidson.diagonalize(&initial, max_iterations);
            (
                davidson.lowest_eigenvalue(),
                davidson.lowest_eigenvector().to_vec(),
                iterations,
            )
        };
        timer.end();

        self.wf.set_coefs(&eigenvector);
        self.wf.sort_by_coefs();

        (eigenvalue, iterations >= max_iterations)
    }

    /// Sparse symmetric mat-vec over the variational determinant set, row
    /// sharded across workers and all-reduced at the end.
    ///
    /// Each unordered pair `{i, j}` is visited once from its smaller row and
    /// both sides are written. Rows belonging to determinants introduced in
    /// the current iteration use the `eps_new` threshold and their spawning
    /// magnitude; everything else uses `eps_old` and the current coefficient.
    fn apply_hamiltonian<M: Model>(
        &self,
        model: &M,
        vec: &[f64],
        eps_old: f64,
        eps_new: f64,
    ) -> Vec<f64> {
        let n = self.wf.len();
        assert_eq!(vec.len(), n);
        let n_old = n - self.new_dets_spawn_coef.len();
        let mut res = vec![0.0; n];

        for i in (self.comm.id()..n).step_by(self.comm.n()) {
            let term = &self.wf.terms()[i];
            let is_old = i < n_old;
            let eps = if is_old { eps_old } else { eps_new };
            let abs_coef = if is_old {
                term.coef.abs()
            } else {
                self.new_dets_spawn_coef[&term.det.encode()]
            };

            for det_j in model.connected_dets(&term.det, eps / abs_coef) {
                let Some(&j) = self.var_dets_index.get(&det_j.encode()) else {
                    continue;
                };
                if j < i {
                    continue;
                }
                let h_ij = model.hamiltonian(&term.det, &det_j);
                res[i] += h_ij * vec[j];
                if j != i {
                    res[j] += h_ij * vec[i];
                }
            }
        }

        self.comm.reduce_sum(&mut res);
        res
    }
}
