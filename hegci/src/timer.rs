//! Bracketed timing records for nested events, printed on the master worker
//! only.

use std::time::Instant;

/// Emits `START`/`END` lines around nested events.
///
/// Only an enabled timer prints; non-master workers keep a silent timer so
/// the event stack stays aligned with the master's.
pub struct Timer {
    enabled: bool,
    events: Vec<(String, Instant)>,
}

impl Timer {
    /// Creates a timer that prints iff `enabled`.
    #[must_use]
    pub const fn new(enabled: bool) -> Self {
        Self {
            enabled,
            events: Vec::new(),
        }
    }

    /// Opens a nested event.
    pub fn start(&mut self, event: &str) {
        if self.enabled {
            println!("{}START {event}", "  ".repeat(self.events.len()));
        }
        self.events.push((event.to_owned(), Instant::now()));
    }

    /// Closes the innermost open event.
    ///
    /// # Panics
    ///
    /// Panics if no event is open.
    pub fn end(&mut self) {
        let (event, started) = self.events.pop().expect("no open event");
        if self.enabled {
            println!(
                "{}END {event} [{:.3} s]",
                "  ".repeat(self.events.len()),
                started.elapsed().as_secs_f64()
            );
        }
    }

    /// Emits a progress line inside the innermost open event.
    pub fn checkpoint(&mut self, label: &str) {
        if self.enabled {
            if let Some((_, started)) = self.events.last() {
                println!(
                    "{}{label} [{:.3} s]",
                    "  ".repeat(self.events.len()),
                    started.elapsed().as_secs_f64()
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_nest() {
        let mut timer = Timer::new(false);

        timer.start("outer");
        timer.start("inner");
        timer.checkpoint("progress");
        timer.end();
        timer.end();
    }

    #[test]
    #[should_panic(expected = "no open event")]
    fn unbalanced_end_panics() {
        let mut timer = Timer::new(false);
        timer.end();
    }
}
