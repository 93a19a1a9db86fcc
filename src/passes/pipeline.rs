//! The optimization pipeline.

use crate::ir::FunctionBody;
use crate::passes::{const_prop, copy_rewrite, dce, licm, lvn, Fuel};

/// Options for `optimize`.
#[derive(Clone, Debug)]
pub struct OptOptions {
    pub lvn: bool,
    pub const_prop: bool,
    pub dce: bool,
    pub copy_rewrite: bool,
    pub licm: bool,
    /// How many times the local and cleanup groups repeat after the
    /// one-shot group. A bound, not a convergence guarantee.
    pub rounds: usize,
    /// Budget shared by every rewrite of the run.
    pub fuel: Fuel,
}

impl Default for OptOptions {
    fn default() -> Self {
        OptOptions {
            lvn: true,
            const_prop: true,
            dce: true,
            copy_rewrite: true,
            licm: true,
            rounds: 1,
            fuel: Fuel::infinite(),
        }
    }
}

impl OptOptions {
    /// Every pass disabled; `optimize` leaves the body untouched.
    pub fn none() -> Self {
        OptOptions {
            lvn: false,
            const_prop: false,
            dce: false,
            copy_rewrite: false,
            licm: false,
            rounds: 0,
            fuel: Fuel::infinite(),
        }
    }
}

/// Rewrites performed by each pass over a whole run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OptStats {
    pub lvn: usize,
    pub const_prop: usize,
    pub dce: usize,
    pub copy_rewrite: usize,
    pub licm: usize,
    pub fuel_consumed: u64,
}

impl OptStats {
    pub fn total(&self) -> usize {
        self.lvn + self.const_prop + self.dce + self.copy_rewrite + self.licm
    }
}

/// Run the pipeline over `body`:
///
/// 1. local: `lvn`
/// 2. cleanup: `const_prop`, `dce`
/// 3. once: `copy_rewrite`, `licm`
/// 4. local and cleanup again, `opts.rounds` times.
///
/// Blocks and edges are never added or removed.
pub fn optimize(body: &mut FunctionBody, opts: &OptOptions) -> OptStats {
    body.check();
    log::trace!("optimize: input:\n{}", body.display("  "));

    let mut fuel = opts.fuel.clone();
    let mut stats = OptStats::default();

    local(body, opts, &mut fuel, &mut stats);
    cleanup(body, opts, &mut fuel, &mut stats);
    if opts.copy_rewrite {
        stats.copy_rewrite += run_pass(body, "copy_rewrite", &mut fuel, copy_rewrite::run);
    }
    if opts.licm {
        stats.licm += run_pass(body, "licm", &mut fuel, licm::run);
    }
    for round in 0..opts.rounds {
        log::debug!("optimize: {} round {}", body.name, round);
        local(body, opts, &mut fuel, &mut stats);
        cleanup(body, opts, &mut fuel, &mut stats);
    }

    stats.fuel_consumed = fuel.consumed;
    body.check();
    log::debug!("optimize: {} done: {:?}", body.name, stats);
    stats
}

fn local(body: &mut FunctionBody, opts: &OptOptions, fuel: &mut Fuel, stats: &mut OptStats) {
    if opts.lvn {
        stats.lvn += run_pass(body, "lvn", fuel, lvn::run);
    }
}

fn cleanup(body: &mut FunctionBody, opts: &OptOptions, fuel: &mut Fuel, stats: &mut OptStats) {
    if opts.const_prop {
        stats.const_prop += run_pass(body, "const_prop", fuel, const_prop::run);
    }
    if opts.dce {
        stats.dce += run_pass(body, "dce", fuel, dce::run);
    }
}

fn run_pass(
    body: &mut FunctionBody,
    name: &str,
    fuel: &mut Fuel,
    pass: fn(&mut FunctionBody, &mut Fuel) -> usize,
) -> usize {
    let count = pass(body, fuel);
    log::trace!("after {} ({} rewrites):\n{}", name, count, body.display("  "));
    count
}
