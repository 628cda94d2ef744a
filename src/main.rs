use std::{
    io::{Read, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use typed_arena::Arena;

use genx_simplify::{
    parser::parse_module,
    pass::{PassManager, PassManagerConfig},
    simplify::{GenXSimplify, SimplifyOptions},
    ty::TypeContext,
};

/// Simplifies GenX region intrinsics in a textual IR module.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Input module. `-` reads standard input
    input: PathBuf,
    /// Write the result here instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Disable the algebraic region rules
    #[arg(long)]
    no_region_rules: bool,
    /// Disable constant folding of GenX calls
    #[arg(long)]
    no_constant_fold: bool,
    /// Disable simplification of non-GenX instructions
    #[arg(long)]
    no_generic_simplify: bool,
    /// Disable forwarding of region writes of undef
    #[arg(long)]
    no_undef_writes: bool,
    /// Re-run the pass until a round changes nothing
    #[arg(long)]
    fixed_point: bool,
    /// Round limit for --fixed-point
    #[arg(long, default_value_t = PassManagerConfig::default().max_rounds)]
    max_rounds: usize,
    /// Print a unified diff between input and result instead of the result
    #[arg(long)]
    diff: bool,
}
impl Args {
    fn simplify_options(&self) -> SimplifyOptions {
        let mut options = SimplifyOptions::all();
        options.set(SimplifyOptions::REGION_RULES, !self.no_region_rules);
        options.set(SimplifyOptions::CONSTANT_FOLD, !self.no_constant_fold);
        options.set(SimplifyOptions::GENERIC, !self.no_generic_simplify);
        options.set(SimplifyOptions::UNDEF_WRITES, !self.no_undef_writes);

        options
    }
}

fn read_input(path: &Path) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        std::fs::read_to_string(path)
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let source = match read_input(&args.input) {
        Ok(x) => x,
        Err(e) => {
            eprintln!("{}: {e}", args.input.display());
            return ExitCode::FAILURE;
        }
    };

    let type_arena = Arena::new();
    let types = TypeContext::new(&type_arena);
    let mut module = match parse_module(&source, &types) {
        Ok(x) => x,
        Err(e) => {
            eprintln!("{}:{e}", args.input.display());
            return ExitCode::FAILURE;
        }
    };
    let before = module.dump_to_string();

    let mut pm = PassManager::new(PassManagerConfig {
        run_to_fixed_point: args.fixed_point,
        max_rounds: args.max_rounds,
    });
    pm.add_pass(GenXSimplify::new(args.simplify_options()));
    let changed = pm.run_on_module(&mut module);
    log::info!(
        "[genx-simplify] {} function(s), changed: {changed}",
        module.functions.len()
    );

    let after = module.dump_to_string();
    let rendered = if args.diff {
        similar::TextDiff::from_lines(&before, &after)
            .unified_diff()
            .context_radius(3)
            .header("before", "after")
            .to_string()
    } else {
        after
    };

    let written = match args.output {
        Some(ref path) => std::fs::write(path, rendered),
        None => std::io::stdout().write_all(rendered.as_bytes()),
    };
    if let Err(e) = written {
        eprintln!("failed to write output: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
