//! The homogeneous-electron-gas system: Slater–Condon matrix elements with
//! momentum conservation, ε-gated connected-determinant enumeration, and the
//! outer solve loop over cutoff and threshold ladders.

use super::config::Config;
use super::det::{Det, SpinDet};
use super::error::{Error, Result};
use super::kpoint::{KPoint, KPointGrid};
use super::parallel::{Communicator, Serial, SharedComm};
use super::queue::ExcitationQueue;
use super::solver::{Model, Solver};
use super::timer::Timer;
use itertools::Itertools;
use std::f64::consts::PI;
use std::thread;

/// Hamiltonian constants and excitation machinery of the electron gas for one
/// momentum cutoff. Immutable once constructed.
pub struct HegModel {
    n_up: u16,
    n_dn: u16,
    k_unit: f64,
    h_unit: f64,
    dn_offset: u16,
    grid: KPointGrid,
    queue: ExcitationQueue,
}

impl HegModel {
    /// Builds the orbital grid and excitation queue for `rcut_var`.
    ///
    /// # Errors
    ///
    /// Returns an error if the electron counts exceed the orbital capacity of
    /// the grid or the grid outgrows the 16-bit orbital indexing.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn new(n_up: usize, n_dn: usize, r_s: f64, rcut_var: f64) -> Result<Self> {
        let density = 3.0 / (4.0 * PI * r_s.powi(3));
        let cell_length = ((n_up + n_dn) as f64 / density).cbrt();
        let k_unit = 2.0 * PI / cell_length;
        let h_unit = 1.0 / (PI * cell_length);

        let grid = KPointGrid::new(rcut_var);
        // Combined orbital ids `orb + dn_offset` must fit a u16.
        if 2 * grid.len() > usize::from(u16::MAX) + 1 {
            return Err(Error::InvalidConfig(format!(
                "rcut_var {rcut_var} yields {} orbitals, more than the determinant \
                 representation supports",
                2 * grid.len()
            )));
        }
        let dn_offset = grid.len() as u16;
        let capacity = grid.len();
        let (n_up, n_dn) = match (u16::try_from(n_up), u16::try_from(n_dn)) {
            (Ok(up), Ok(dn)) if usize::from(up) <= capacity && usize::from(dn) <= capacity => {
                (up, dn)
            }
            _ => {
                return Err(Error::InvalidConfig(format!(
                    "{n_up} up and {n_dn} dn electrons exceed the {capacity} orbitals per spin \
                     of rcut_var {rcut_var}"
                )))
            }
        };

        let queue = ExcitationQueue::new(&grid, rcut_var, h_unit);

        Ok(Self {
            n_up,
            n_dn,
            k_unit,
            h_unit,
            dn_offset,
            grid,
            queue,
        })
    }

    /// Number of spatial orbitals, i.e. k-points within the cutoff.
    #[must_use]
    pub fn n_orbs(&self) -> usize {
        self.grid.len()
    }

    /// Kinetic-energy unit `2π / L`.
    #[must_use]
    pub const fn k_unit(&self) -> f64 {
        self.k_unit
    }

    /// Two-electron matrix-element unit `1 / (π L)`.
    #[must_use]
    pub const fn h_unit(&self) -> f64 {
        self.h_unit
    }

    /// The orbital grid.
    #[must_use]
    pub const fn grid(&self) -> &KPointGrid {
        &self.grid
    }

    /// The excitation queue.
    #[must_use]
    pub const fn queue(&self) -> &ExcitationQueue {
        &self.queue
    }

    fn diagonal(&self, det: &Det) -> f64 {
        let points = self.grid.points();
        let mut energy = 0.0;

        // One-electron kinetic term.
        for &orb in det.up.orbs().iter().chain(det.dn.orbs()) {
            energy +=
                0.5 * f64::from(points[usize::from(orb)].norm_sq()) * self.k_unit * self.k_unit;
        }

        // Same-spin exchange.
        for orbs in [det.up.orbs(), det.dn.orbs()] {
            for (&p, &q) in orbs.iter().tuple_combinations() {
                let diff = points[usize::from(p)] - points[usize::from(q)];
                energy -= self.h_unit / f64::from(diff.norm_sq());
            }
        }

        energy
    }

    fn off_diagonal(&self, det_i: &Det, det_j: &Det) -> f64 {
        let points = self.grid.points();
        let eor_up = SpinDet::from_eor(&det_i.up, &det_j.up);
        let eor_dn = SpinDet::from_eor(&det_i.dn, &det_j.dn);
        if eor_up.n_elecs() + eor_dn.n_elecs() != 4 {
            return 0.0;
        }

        // Walk the four differing orbitals in encounter order, splitting them
        // into removed (occupied in det_i) and added ones.
        let mut k_change = KPoint::default();
        let mut orb_p = None;
        let mut orb_r = None;
        let mut orb_s = None;
        for (eor, occupied) in [(&eor_up, &det_i.up), (&eor_dn, &det_i.dn)] {
            for &orb in eor.orbs() {
                let point = points[usize::from(orb)];
                if occupied.occupied(orb) {
                    k_change = k_change - point;
                    orb_p.get_or_insert(orb);
                } else {
                    k_change = k_change + point;
                    if orb_r.is_none() {
                        orb_r = Some(orb);
                    } else {
                        orb_s = Some(orb);
                    }
                }
            }
        }

        if !k_change.is_zero() {
            return 0.0;
        }

        // Particle number is conserved per channel, so two orbitals leave and
        // two enter.
        let (Some(orb_p), Some(orb_r), Some(orb_s)) = (orb_p, orb_r, orb_s) else {
            unreachable!()
        };
        let k_p = points[usize::from(orb_p)];
        let k_r = points[usize::from(orb_r)];
        let k_s = points[usize::from(orb_s)];

        let mut element = self.h_unit / f64::from((k_p - k_r).norm_sq());
        if eor_up.n_elecs() != 2 {
            // Same-spin excitation: subtract the exchange counterpart.
            element -= self.h_unit / f64::from((k_p - k_s).norm_sq());
        }

        let gamma = gamma_exp(&det_i.up, eor_up.orbs())
            + gamma_exp(&det_i.dn, eor_dn.orbs())
            + gamma_exp(&det_j.up, eor_up.orbs())
            + gamma_exp(&det_j.dn, eor_dn.orbs());
        if gamma % 2 == 1 {
            element = -element;
        }

        element
    }

    /// Occupied pairs in the combined orbital space: same-spin pairs of each
    /// channel plus all opposite-spin pairs.
    fn pq_pairs(&self, det: &Det) -> Vec<(u16, u16)> {
        let occ_up = det.up.orbs();
        let occ_dn = det.dn.orbs();
        let dn_offset = self.dn_offset;

        let mut pairs = Vec::new();
        pairs.extend(occ_up.iter().tuple_combinations().map(|(&p, &q)| (p, q)));
        pairs.extend(
            occ_dn
                .iter()
                .tuple_combinations()
                .map(|(&p, &q)| (p + dn_offset, q + dn_offset)),
        );
        pairs.extend(
            occ_up
                .iter()
                .cartesian_product(occ_dn.iter())
                .map(|(&p, &q)| (p, q + dn_offset)),
        );
        pairs
    }

    #[allow(clippy::cast_possible_truncation)]
    fn connected(&self, det: &Det, eps: f64) -> Vec<Det> {
        let mut connected = vec![det.clone()];
        if self.queue.max_abs_h() < eps {
            return connected;
        }

        let dn_offset = self.dn_offset;
        let points = self.grid.points();

        for (p, q) in self.pq_pairs(det) {
            // Normalise the pair into the spatial orbital space. An
            // opposite-spin pair whose up index exceeds its dn index is
            // swapped here and the scattered pair is swapped back below.
            let (pp, qq) = if p >= dn_offset && q >= dn_offset {
                (p - dn_offset, q - dn_offset)
            } else if p < dn_offset && q >= dn_offset && p > q - dn_offset {
                (q - dn_offset, p + dn_offset)
            } else {
                (p, q)
            };
            let same_spin = pp < dn_offset && qq < dn_offset;
            let qs_offset = if same_spin { 0 } else { dn_offset };

            let k_pp = points[usize::from(pp)];
            let k_qq = points[usize::from(qq - qs_offset)];
            let items = if same_spin {
                self.queue.same_spin(k_qq - k_pp)
            } else {
                self.queue.opposite_spin()
            };

            for &(diff_pr, abs_h) in items {
                // Sorted non-increasing: nothing below can qualify.
                if abs_h < eps {
                    break;
                }
                let Some(r) = self.grid.index_of(k_pp + diff_pr) else {
                    continue;
                };
                let Some(s) = self.grid.index_of(k_pp + k_qq - points[r]) else {
                    continue;
                };
                // Canonical order avoids double counting same-spin pairs.
                if same_spin && s < r {
                    continue;
                }
                let r = r as u16;
                let s = s as u16 + qs_offset;

                let (r, s) = if p >= dn_offset && q >= dn_offset {
                    (r + dn_offset, s + dn_offset)
                } else if p < dn_offset && q >= dn_offset && p > q - dn_offset {
                    (s - dn_offset, r + dn_offset)
                } else {
                    (r, s)
                };

                if det.occupied(r, dn_offset) || det.occupied(s, dn_offset) {
                    continue;
                }
                let mut excited = det.clone();
                excited.set_orb(p, dn_offset, false);
                excited.set_orb(q, dn_offset, false);
                excited.set_orb(r, dn_offset, true);
                excited.set_orb(s, dn_offset, true);
                connected.push(excited);
            }
        }

        connected
    }
}

impl Model for HegModel {
    fn hamiltonian(&self, det_i: &Det, det_j: &Det) -> f64 {
        if det_i == det_j {
            self.diagonal(det_i)
        } else {
            self.off_diagonal(det_i, det_j)
        }
    }

    fn connected_dets(&self, det: &Det, eps: f64) -> Vec<Det> {
        self.connected(det, eps)
    }

    fn hartree_fock(&self) -> Det {
        Det::hartree_fock(self.n_up, self.n_dn)
    }
}

/// Sum of the insertion positions into `spin_det`'s occupied list of every
/// orbital of `eor` that `spin_det` occupies. The parity of the total over
/// all four channel walks fixes the fermionic sign.
fn gamma_exp(spin_det: &SpinDet, eor: &[u16]) -> usize {
    let occ = spin_det.orbs();
    let mut gamma = 0;
    let mut pointer = 0;
    for &orb in eor {
        if !spin_det.occupied(orb) {
            continue;
        }
        pointer += occ[pointer..].partition_point(|&occupied| occupied < orb);
        gamma += pointer;
    }
    gamma
}

/// Converged energy of one variational pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnergyRecord {
    /// Momentum cutoff of the pass.
    pub rcut_var: f64,
    /// Variational threshold of the pass.
    pub eps_var: f64,
    /// Converged variational energy.
    pub energy_var: f64,
    /// Wavefunction size at the end of the pass.
    pub n_dets: usize,
}

/// Energies of a finished run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SolveResult {
    /// Hartree–Fock energy from the first variational pass.
    pub energy_hf: f64,
    /// One record per `(rcut_var, eps_var)` pass, in execution order.
    pub energies: Vec<EnergyRecord>,
}

/// Runs the full cutoff and threshold ladder on one worker of `comm`.
///
/// The wavefunction persists across passes: grid ordering is a prefix
/// extension as the cutoff grows, so orbital indices stay valid.
///
/// # Errors
///
/// Returns an error if the configuration fails validation or a cutoff cannot
/// accommodate the electron counts.
#[allow(clippy::float_cmp)]
pub fn solve<C: Communicator>(config: &Config, comm: &C) -> Result<SolveResult> {
    config.validate()?;
    comm.barrier();

    let mut timer = Timer::new(comm.is_master());
    let mut solver = Solver::new(comm);
    let mut result = SolveResult::default();

    timer.start("variation");
    for (i, &rcut_var) in config.rcut_vars.iter().enumerate() {
        if i > 0 && rcut_var == config.rcut_vars[i - 1] {
            continue;
        }
        timer.start(&format!("rcut_var: {rcut_var}"));

        timer.start("setup");
        let model = HegModel::new(config.n_up, config.n_dn, config.r_s, rcut_var)?;
        if comm.is_master() {
            println!("number of orbitals: {}", 2 * model.n_orbs());
        }
        timer.end();

        for (j, &eps_var) in config.eps_vars.iter().enumerate() {
            if j > 0 && eps_var == config.eps_vars[j - 1] {
                continue;
            }
            timer.start(&format!("eps_var: {eps_var}"));
            solver.variation(
                &model,
                eps_var,
                eps_var * config.eps_var_ham_old_ratio,
                eps_var * config.eps_var_ham_new_ratio,
                &mut timer,
            );
            result.energies.push(EnergyRecord {
                rcut_var,
                eps_var,
                energy_var: solver.energy_var(),
                n_dets: solver.wavefunction().len(),
            });
            timer.end();
        }
        timer.end();
    }
    timer.end();

    result.energy_hf = solver.energy_hf();
    Ok(result)
}

/// Runs `workers` lockstep workers over shared collectives and returns the
/// master's result. A single worker runs inline without threads.
///
/// # Errors
///
/// Returns the first worker's error; validation is deterministic, so all
/// workers fail alike.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run(config: &Config, workers: usize) -> Result<SolveResult> {
    if workers <= 1 {
        return solve(config, &Serial);
    }

    let comms = SharedComm::split(workers);
    thread::scope(|scope| {
        let handles: Vec<_> = comms
            .iter()
            .map(|comm| scope.spawn(move || solve(config, comm)))
            .collect();
        let mut results: Vec<Result<SolveResult>> = handles
            .into_iter()
            .map(|handle| handle.join().expect("worker panicked"))
            .collect();
        results.swap_remove(0)
    })
}
