//! Precomputed catalogue of candidate double excitations, sorted descending
//! by matrix-element magnitude so enumeration can stop at the first entry
//! below a threshold.

use super::kpoint::{KPoint, KPointGrid};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

/// A candidate `p → r` momentum transfer with its matrix-element magnitude.
pub type QueueItem = (KPoint, f64);

/// Per-momentum-transfer lists of candidate excitations.
///
/// Same-spin candidates are bucketed by the transfer `Δpq = k_q − k_p` of the
/// occupied pair; opposite-spin candidates share a single list because their
/// magnitude depends on `Δpr` alone. Every list is sorted non-increasing and
/// entries below machine epsilon are omitted.
pub struct ExcitationQueue {
    same_spin: FxHashMap<KPoint, Vec<QueueItem>>,
    opposite_spin: Vec<QueueItem>,
    max_abs_h: f64,
}

impl ExcitationQueue {
    /// Builds the queue for `grid`. `h_unit` scales all two-electron matrix
    /// elements and `rcut` bounds the momentum of the scattered orbitals.
    #[must_use]
    pub fn new(grid: &KPointGrid, rcut: f64, h_unit: f64) -> Self {
        let diffs = grid.differences();

        let same_spin: FxHashMap<KPoint, Vec<QueueItem>> = diffs
            .par_iter()
            .map(|&diff_pq| {
                let mut items: Vec<QueueItem> = Vec::new();
                for &diff_pr in diffs {
                    // Momentum conservation fixes s: r + s = p + q.
                    let diff_sr = diff_pr + diff_pr - diff_pq;
                    if diff_sr.is_zero() || f64::from(diff_sr.norm_sq()) > 4.0 * rcut * rcut {
                        continue;
                    }
                    let diff_ps = diff_pr - diff_sr;
                    if diff_ps.is_zero() || diff_pr.norm_sq() == diff_ps.norm_sq() {
                        continue;
                    }
                    let abs_h = (1.0 / f64::from(diff_pr.norm_sq())
                        - 1.0 / f64::from(diff_ps.norm_sq()))
                    .abs()
                        * h_unit;
                    if abs_h < f64::EPSILON {
                        continue;
                    }
                    items.push((diff_pr, abs_h));
                }
                items.sort_by(|a, b| b.1.total_cmp(&a.1));
                (diff_pq, items)
            })
            .filter(|(_, items)| !items.is_empty())
            .collect();

        let mut opposite_spin: Vec<QueueItem> = diffs
            .iter()
            .map(|&diff_pr| (diff_pr, h_unit / f64::from(diff_pr.norm_sq())))
            .filter(|&(_, abs_h)| abs_h >= f64::EPSILON)
            .collect();
        opposite_spin.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut max_abs_h: f64 = 0.0;
        for items in same_spin.values() {
            if let Some(&(_, abs_h)) = items.first() {
                max_abs_h = max_abs_h.max(abs_h);
            }
        }
        if let Some(&(_, abs_h)) = opposite_spin.first() {
            max_abs_h = max_abs_h.max(abs_h);
        }

        Self {
            same_spin,
            opposite_spin,
            max_abs_h,
        }
    }

    /// Candidate transfers for a same-spin occupied pair with transfer
    /// `diff_pq`, sorted non-increasing by magnitude.
    #[must_use]
    pub fn same_spin(&self, diff_pq: KPoint) -> &[QueueItem] {
        self.same_spin.get(&diff_pq).map_or(&[], Vec::as_slice)
    }

    /// Candidate transfers for opposite-spin pairs, sorted non-increasing by
    /// magnitude.
    #[must_use]
    pub fn opposite_spin(&self) -> &[QueueItem] {
        &self.opposite_spin
    }

    /// The largest magnitude over all retained entries. Anything below this
    /// bound can be skipped without consulting the queue at all.
    #[must_use]
    pub fn max_abs_h(&self) -> f64 {
        self.max_abs_h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    const H_UNIT: f64 = 0.25;

    fn queue(rcut: f64) -> (KPointGrid, ExcitationQueue) {
        let grid = KPointGrid::new(rcut);
        let queue = ExcitationQueue::new(&grid, rcut, H_UNIT);
        (grid, queue)
    }

    #[test]
    fn lists_are_sorted_non_increasing() {
        let (grid, queue) = queue(2.0);

        assert!(!queue.opposite_spin().is_empty());
        for pair in queue.opposite_spin().windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
        for &diff_pq in grid.differences() {
            for pair in queue.same_spin(diff_pq).windows(2) {
                assert!(pair[0].1 >= pair[1].1);
            }
        }
    }

    #[test]
    fn entries_are_above_machine_epsilon() {
        let (grid, queue) = queue(2.0);

        assert!(queue.opposite_spin().iter().all(|&(_, h)| h >= f64::EPSILON));
        for &diff_pq in grid.differences() {
            assert!(queue.same_spin(diff_pq).iter().all(|&(_, h)| h >= f64::EPSILON));
        }
    }

    #[test]
    fn max_abs_h_is_the_global_maximum() {
        let (grid, queue) = queue(2.0);

        let mut expected: f64 = 0.0;
        for &diff_pq in grid.differences() {
            for &(_, abs_h) in queue.same_spin(diff_pq) {
                expected = expected.max(abs_h);
            }
        }
        for &(_, abs_h) in queue.opposite_spin() {
            expected = expected.max(abs_h);
        }

        assert_eq!(queue.max_abs_h(), expected);
        // A unit transfer gives the largest opposite-spin magnitude.
        assert_eq!(queue.max_abs_h(), H_UNIT);
    }

    #[test]
    fn opposite_spin_magnitudes() {
        let (_, queue) = queue(1.0);

        for &(diff_pr, abs_h) in queue.opposite_spin() {
            assert_approx_eq!(f64, abs_h, H_UNIT / f64::from(diff_pr.norm_sq()), ulps = 2);
        }
    }

    #[test]
    fn same_spin_magnitudes_match_direct_and_exchange_difference() {
        let (grid, queue) = queue(1.5);

        let mut checked = 0;
        for &diff_pq in grid.differences() {
            for &(diff_pr, abs_h) in queue.same_spin(diff_pq) {
                let diff_ps = diff_pq - diff_pr;
                assert!(!diff_ps.is_zero());
                let expected = (1.0 / f64::from(diff_pr.norm_sq())
                    - 1.0 / f64::from(diff_ps.norm_sq()))
                .abs()
                    * H_UNIT;
                assert_approx_eq!(f64, abs_h, expected, ulps = 2);
                checked += 1;
            }
        }
        assert!(checked > 0);
    }

    #[test]
    fn unreachable_transfer_has_no_bucket() {
        let (_, queue) = queue(1.0);

        assert!(queue.same_spin(KPoint::new(5, 5, 5)).is_empty());
    }
}
