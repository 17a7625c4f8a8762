//! Worker identity and the collective operations every worker participates
//! in. Workers execute the solve in lockstep and only meet at collectives.

use std::sync::{Arc, Barrier, Mutex};

/// Collective operations shared by all workers of a run.
pub trait Communicator: Sync {
    /// This worker's identity in `[0, n)`.
    fn id(&self) -> usize;

    /// Total number of workers.
    fn n(&self) -> usize;

    /// Whether this worker emits human-readable output.
    fn is_master(&self) -> bool {
        self.id() == 0
    }

    /// Blocks until every worker has arrived.
    fn barrier(&self);

    /// Elementwise all-reduce: on return every worker holds the global sum.
    /// Contributions are summed in worker-id order, so the result is bitwise
    /// identical on every worker.
    fn reduce_sum(&self, data: &mut [f64]);
}

/// The single-worker communicator.
#[derive(Clone, Copy, Debug, Default)]
pub struct Serial;

impl Communicator for Serial {
    fn id(&self) -> usize {
        0
    }

    fn n(&self) -> usize {
        1
    }

    fn barrier(&self) {}

    fn reduce_sum(&self, _data: &mut [f64]) {}
}

struct Shared {
    barrier: Barrier,
    slots: Mutex<Vec<Vec<f64>>>,
}

/// An in-process peer of a group of lockstep worker threads.
///
/// Each worker deposits its contribution into its own slot; after a barrier
/// every worker reads all slots in id order. A second barrier keeps a worker
/// from starting the next reduction while a peer is still reading.
pub struct SharedComm {
    id: usize,
    n: usize,
    shared: Arc<Shared>,
}

impl SharedComm {
    /// Creates communicators for `n` lockstep workers, one per worker.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero.
    #[must_use]
    pub fn split(n: usize) -> Vec<Self> {
        assert!(n > 0);
        let shared = Arc::new(Shared {
            barrier: Barrier::new(n),
            slots: Mutex::new(vec![Vec::new(); n]),
        });
        (0..n)
            .map(|id| Self {
                id,
                n,
                shared: Arc::clone(&shared),
            })
            .collect()
    }
}

impl Communicator for SharedComm {
    fn id(&self) -> usize {
        self.id
    }

    fn n(&self) -> usize {
        self.n
    }

    fn barrier(&self) {
        self.shared.barrier.wait();
    }

    fn reduce_sum(&self, data: &mut [f64]) {
        {
            let mut slots = self.shared.slots.lock().expect("collective state poisoned");
            slots[self.id].clear();
            slots[self.id].extend_from_slice(data);
        }
        self.shared.barrier.wait();
        {
            let slots = self.shared.slots.lock().expect("collective state poisoned");
            data.fill(0.0);
            for slot in slots.iter() {
                assert_eq!(slot.len(), data.len());
                for (sum, &contribution) in data.iter_mut().zip(slot) {
                    *sum += contribution;
                }
            }
        }
        self.shared.barrier.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn serial_is_identity() {
        let comm = Serial;
        let mut data = [1.0, -2.0, 3.5];

        comm.reduce_sum(&mut data);
        assert_eq!(comm.id(), 0);
        assert_eq!(comm.n(), 1);
        assert!(comm.is_master());
        assert_eq!(data, [1.0, -2.0, 3.5]);
    }

    #[test]
    fn reduce_sums_across_workers() {
        let workers = 4;
        let comms = SharedComm::split(workers);

        let results: Vec<Vec<f64>> = thread::scope(|scope| {
            let handles: Vec<_> = comms
                .iter()
                .map(|comm| {
                    scope.spawn(move || {
                        let id = comm.id() as f64;
                        let mut data = vec![id, 2.0 * id, 1.0];
                        comm.reduce_sum(&mut data);
                        data
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        });

        // 0 + 1 + 2 + 3 = 6 in the first slot, twice that in the second.
        for result in &results {
            assert_eq!(result, &[6.0, 12.0, 4.0]);
        }
    }

    #[test]
    fn reduction_is_deterministic_across_repeats() {
        // Summation happens in id order, so repeated runs agree bitwise even
        // though thread arrival order varies.
        let contributions = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7];
        let expected: f64 = contributions.iter().sum();

        for _ in 0..20 {
            let comms = SharedComm::split(contributions.len());
            let results: Vec<f64> = thread::scope(|scope| {
                let handles: Vec<_> = comms
                    .iter()
                    .map(|comm| {
                        scope.spawn(move || {
                            let mut data = vec![contributions[comm.id()]];
                            comm.reduce_sum(&mut data);
                            data[0]
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| handle.join().unwrap())
                    .collect()
            });

            for &result in &results {
                assert_eq!(result.to_bits(), expected.to_bits());
            }
        }
    }

    #[test]
    fn consecutive_reductions_do_not_interfere() {
        let comms = SharedComm::split(2);

        let results: Vec<(f64, f64)> = thread::scope(|scope| {
            let handles: Vec<_> = comms
                .iter()
                .map(|comm| {
                    scope.spawn(move || {
                        let mut first = vec![1.0];
                        comm.reduce_sum(&mut first);
                        comm.barrier();
                        let mut second = vec![10.0];
                        comm.reduce_sum(&mut second);
                        (first[0], second[0])
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        });

        for &(first, second) in &results {
            assert_eq!(first, 2.0);
            assert_eq!(second, 20.0);
        }
    }
}
