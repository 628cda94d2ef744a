//! GenX instruction simplification.
//!
//! [`GenXSimplify`] walks a function once, replacing region intrinsic calls that reduce to one
//! of their operands or to a constant, then forwards region writes of `undef`.

use crate::{
    ir::{Constant, Function, InstRef, ValueRef},
    pass::{Analyses, AnalysisUsage, FunctionPass},
};

pub mod classify;
pub mod const_fold;
pub mod inst_simplify;
pub mod region;
pub mod undef_writes;

pub use self::classify::RegionOp;
pub use self::const_fold::{ConstantFolder, RegionConstantFolder};
pub use self::inst_simplify::{BasicInstSimplify, InstSimplify};
pub use self::region::simplify_region_intrinsic;
pub use self::undef_writes::{eliminate_undef_writes, is_write_with_undef_input};

bitflags::bitflags! {
    #[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
    pub struct SimplifyOptions: u32 {
        /// Algebraic rules for region reads and writes.
        const REGION_RULES = 1 << 0;
        /// Evaluation of GenX calls with all-constant inputs.
        const CONSTANT_FOLD = 1 << 1;
        /// Simplification of non-GenX instructions.
        const GENERIC = 1 << 2;
        /// Forwarding of region writes of `undef`.
        const UNDEF_WRITES = 1 << 3;
    }
}
impl Default for SimplifyOptions {
    fn default() -> Self {
        Self::all()
    }
}

/// What an instruction simplifies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Simplified<'t> {
    Existing(ValueRef),
    /// Not yet present in the function's constant table.
    Constant(Constant<'t>),
}
impl<'t> Simplified<'t> {
    pub fn materialize(self, func: &mut Function<'t>) -> ValueRef {
        match self {
            Self::Existing(v) => v,
            Self::Constant(c) => func.constant(c),
        }
    }
}

pub struct GenXSimplify {
    options: SimplifyOptions,
    folder: Box<dyn ConstantFolder>,
    generic: Box<dyn InstSimplify>,
}
impl Default for GenXSimplify {
    fn default() -> Self {
        Self::new(SimplifyOptions::default())
    }
}
impl GenXSimplify {
    pub fn new(options: SimplifyOptions) -> Self {
        Self {
            options,
            folder: Box::new(RegionConstantFolder),
            generic: Box::new(BasicInstSimplify),
        }
    }

    pub fn with_constant_folder(mut self, folder: impl ConstantFolder + 'static) -> Self {
        self.folder = Box::new(folder);
        self
    }

    pub fn with_inst_simplify(mut self, generic: impl InstSimplify + 'static) -> Self {
        self.generic = Box::new(generic);
        self
    }

    /// Region rules first, then constant folding.
    fn simplify_genx<'t>(&self, func: &Function<'t>, inst: InstRef) -> Option<Simplified<'t>> {
        let data = func.inst(inst);
        let id = data.intrinsic_id()?;

        if self.options.contains(SimplifyOptions::REGION_RULES) {
            if let Some(s) = simplify_region_intrinsic(id, data.ty, &data.operands, func) {
                return Some(s);
            }
        }
        if self.options.contains(SimplifyOptions::CONSTANT_FOLD) {
            return self.folder.fold(func, inst).map(Simplified::Constant);
        }

        None
    }

    /// One pass over the instructions present on entry, in program order.
    pub fn simplify_instructions(&self, func: &mut Function<'_>) -> bool {
        let mut changed = false;

        for inst in func.instructions().collect::<Vec<_>>() {
            if !func.contains(inst) {
                continue;
            }

            // GenX calls never fall back to the generic rules
            let simplified = if func.is_genx_intrinsic(inst) {
                self.simplify_genx(func, inst)
            } else if self.options.contains(SimplifyOptions::GENERIC) {
                self.generic.simplify(func, inst)
            } else {
                None
            };
            let Some(simplified) = simplified else {
                continue;
            };

            let replacement = simplified.materialize(func);
            if replacement == ValueRef::Inst(inst) {
                continue;
            }
            log::debug!(
                "[GenXSimplify] {} => {}",
                func.instruction_to_string(inst),
                func.value_to_string(replacement)
            );
            func.replace_all_uses_with(inst, replacement);
            func.erase(inst);
            changed = true;
        }

        changed
    }
}
impl FunctionPass for GenXSimplify {
    fn name(&self) -> &'static str {
        "GenXSimplify"
    }

    fn analysis_usage(&self) -> AnalysisUsage {
        AnalysisUsage {
            required: Analyses::DOMINATOR_TREE,
            preserved: Analyses::DOMINATOR_TREE,
        }
    }

    fn run_on_function(&self, func: &mut Function<'_>) -> bool {
        let mut changed = self.simplify_instructions(func);
        if self.options.contains(SimplifyOptions::UNDEF_WRITES) {
            changed |= eliminate_undef_writes(func);
        }

        changed
    }
}
