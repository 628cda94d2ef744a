//! Function pass pipeline with analysis bookkeeping.

use crate::ir::{Function, Module};

bitflags::bitflags! {
    /// Function analyses a pass may depend on or keep intact.
    #[derive(Debug, Default, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct Analyses: u32 {
        const DOMINATOR_TREE = 1 << 0;
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisUsage {
    /// Computed before the pass runs.
    pub required: Analyses,
    /// Still valid after the pass changed the function.
    pub preserved: Analyses,
}

pub trait FunctionPass {
    fn name(&self) -> &'static str;

    fn analysis_usage(&self) -> AnalysisUsage {
        AnalysisUsage::default()
    }

    /// Returns whether `func` was changed.
    fn run_on_function(&self, func: &mut Function<'_>) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassManagerConfig {
    /// Re-run the whole pipeline until a round changes nothing.
    pub run_to_fixed_point: bool,
    /// Upper bound on rounds when running to a fixed point.
    pub max_rounds: usize,
}
impl Default for PassManagerConfig {
    fn default() -> Self {
        Self {
            run_to_fixed_point: false,
            max_rounds: 16,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub rounds: usize,
    pub changed: bool,
    /// How many times an analysis had to be (re)computed.
    pub analysis_computations: usize,
}

pub struct PassManager {
    passes: Vec<Box<dyn FunctionPass>>,
    config: PassManagerConfig,
    valid: Analyses,
}
impl PassManager {
    pub fn new(config: PassManagerConfig) -> Self {
        Self {
            passes: Vec::new(),
            config,
            valid: Analyses::empty(),
        }
    }

    pub fn add_pass(&mut self, pass: impl FunctionPass + 'static) -> &mut Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Analyses that are up to date for the function processed last.
    #[inline]
    pub const fn valid_analyses(&self) -> Analyses {
        self.valid
    }

    pub fn run_on_function(&mut self, func: &mut Function<'_>) -> RunStats {
        let mut stats = RunStats::default();
        self.valid = Analyses::empty();

        loop {
            stats.rounds += 1;
            let mut round_changed = false;
            for pass in self.passes.iter() {
                let usage = pass.analysis_usage();
                let missing = usage.required.difference(self.valid);
                if !missing.is_empty() {
                    log::trace!("[PassManager] computing {missing:?} for @{}", func.name);
                    stats.analysis_computations += missing.bits().count_ones() as usize;
                    self.valid |= missing;
                }

                let changed = pass.run_on_function(func);
                log::debug!(
                    "[PassManager] {} on @{}: {}",
                    pass.name(),
                    func.name,
                    if changed { "changed" } else { "unchanged" }
                );
                if changed {
                    self.valid &= usage.preserved;
                    round_changed = true;
                }
            }
            stats.changed |= round_changed;

            if !self.config.run_to_fixed_point || !round_changed {
                break;
            }
            if stats.rounds >= self.config.max_rounds {
                log::warn!(
                    "[PassManager] @{} still changing after {} rounds",
                    func.name,
                    stats.rounds
                );
                break;
            }
        }

        stats
    }

    /// Runs the pipeline over every function in order. Returns whether any of them changed.
    pub fn run_on_module(&mut self, module: &mut Module<'_>) -> bool {
        module
            .functions
            .iter_mut()
            .fold(false, |changed, f| self.run_on_function(f).changed || changed)
    }
}
