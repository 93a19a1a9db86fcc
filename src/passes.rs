//! Passes.

pub mod const_prop;
pub mod copy_rewrite;
pub mod dce;
pub mod licm;
pub mod lvn;
pub mod pipeline;

pub use pipeline::{optimize, OptOptions, OptStats};

/// A budget on individual rewrites, shared by every pass of a
/// pipeline run. Limiting it bisects a miscompile down to the one
/// rewrite that introduced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fuel {
    pub remaining: u64,
    pub consumed: u64,
}

impl Fuel {
    /// Returns `false` once the budget is exhausted; the caller must
    /// then skip the rewrite.
    pub fn consume(&mut self) -> bool {
        self.consumed += 1;
        if self.remaining == u64::MAX {
            return true;
        }
        if self.remaining == 0 {
            false
        } else {
            self.remaining -= 1;
            true
        }
    }

    pub fn infinite() -> Fuel {
        Fuel {
            consumed: 0,
            remaining: u64::MAX,
        }
    }

    pub fn limited(remaining: u64) -> Fuel {
        Fuel {
            consumed: 0,
            remaining,
        }
    }
}

impl Default for Fuel {
    fn default() -> Self {
        Fuel::infinite()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fuel_runs_out() {
        let mut fuel = Fuel::limited(2);
        assert!(fuel.consume());
        assert!(fuel.consume());
        assert!(!fuel.consume());
        assert_eq!(fuel.consumed, 3);
        let mut fuel = Fuel::infinite();
        assert!((0..1000).all(|_| fuel.consume()));
    }
}
