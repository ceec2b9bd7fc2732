//! `assembly-delayloop`: prints a cycle-exact AVR busy-wait.
//!
//! The delay is given either as a raw cycle count (`-c 16000`) or as a
//! time and a clock frequency (`1ms 16MHz`), or reloaded from a plan file.
//! Output goes to stdout; diagnostics and the simulation report go to
//! stderr.
//!
//! Exit status: 0 on success, 1 for runtime errors (bad plan file, I/O,
//! register range), 2 for argument errors.

mod args;

use std::env;
use std::process;

use args::{ArgError, Command, Config, DelaySource};
use delayloop_core::plan_file::{load_from_file, save_to_file};
use delayloop_core::units::cycles_for;
use delayloop_core::{render, simulate, DelayPlan, DEFAULT_SIMULATION_BUDGET};

const PROGRAM: &str = "assembly-delayloop";

fn print_usage() {
    eprintln!("AVR delay loop generator v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("Usage: {} [options] [TIME] [FREQUENCY]", PROGRAM);
    eprintln!();
    eprintln!("Delay:");
    eprintln!("  -c, --cycles N         Delay of exactly N clock cycles");
    eprintln!("  -t, --time T           Delay time, e.g. 1.5ms, 2 min, 1h");
    eprintln!("  -f, --frequency F      Clock frequency, e.g. 16MHz, 8M");
    eprintln!("      --load FILE        Reuse a plan saved with --save");
    eprintln!();
    eprintln!("Output:");
    eprintln!("  -s, --short            Print only the counters and the nop count");
    eprintln!("      --format FMT       asm (default), short, listing or hex");
    eprintln!("  -r, --register N       First counter register, 16-31 (default 16)");
    eprintln!("      --save FILE        Write the solved plan to FILE");
    eprintln!("      --simulate         Run the generated code and report its cycle count");
    eprintln!("  -v, --verbose          Debug logging (RUST_LOG overrides)");
    eprintln!("  -h, --help             Show this help");
    eprintln!();
    eprintln!("Positional TIME and FREQUENCY fill whichever of -t/-f was not given.");
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init()
        .ok();
}

fn obtain_plan(source: &DelaySource) -> delayloop_core::Result<DelayPlan> {
    match source {
        DelaySource::Cycles(cycles) => Ok(delayloop_core::plan(*cycles)),
        DelaySource::Duration { time, frequency } => {
            let cycles = cycles_for(time, frequency)?;
            log::debug!("{:?} at {:?} -> {} cycles", time, frequency, cycles);
            Ok(delayloop_core::plan(cycles))
        }
        DelaySource::PlanFile(path) => load_from_file(path),
    }
}

fn run_simulation(plan: &DelayPlan, config: &Config) -> delayloop_core::Result<()> {
    if plan.cycles > DEFAULT_SIMULATION_BUDGET {
        log::warn!(
            "skipping simulation: {} cycles exceeds the budget of {}",
            plan.cycles,
            DEFAULT_SIMULATION_BUDGET
        );
        return Ok(());
    }
    let measured = simulate(plan, config.render.register_base, DEFAULT_SIMULATION_BUDGET)?;
    assert_eq!(measured, plan.cycles, "simulated cycle count disagrees with the cost model");
    eprintln!("Simulated: {} cycles (target {})", measured, plan.cycles);
    Ok(())
}

fn run(config: &Config) -> delayloop_core::Result<String> {
    let plan = obtain_plan(&config.source)?;

    if let Some(path) = &config.save {
        save_to_file(&plan, path)?;
    }
    if config.simulate {
        run_simulation(&plan, config)?;
    }

    render::render(&plan.parameters, &config.render)
}

/// What one invocation ended with.
#[derive(Debug)]
enum Outcome {
    Help,
    Output(String),
    BadArguments(ArgError),
    Failed(delayloop_core::Error),
}

impl Outcome {
    fn exit_code(&self) -> i32 {
        match self {
            Outcome::Help | Outcome::Output(_) => 0,
            Outcome::Failed(_) => 1,
            Outcome::BadArguments(_) => 2,
        }
    }
}

fn dispatch(argv: &[String]) -> Outcome {
    let config = match args::parse(argv) {
        Ok(Command::Help) => return Outcome::Help,
        Ok(Command::Run(config)) => config,
        Err(e) => return Outcome::BadArguments(e),
    };

    init_logging(config.verbose);

    match run(&config) {
        Ok(text) => Outcome::Output(text),
        Err(e) => Outcome::Failed(e),
    }
}

fn main() {
    let argv: Vec<String> = env::args().skip(1).collect();

    let outcome = dispatch(&argv);
    match &outcome {
        Outcome::Help => print_usage(),
        Outcome::Output(text) => println!("{}", text),
        Outcome::BadArguments(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Try '{} --help' for more information.", PROGRAM);
        }
        Outcome::Failed(e) => eprintln!("Error: {}", e),
    }
    process::exit(outcome.exit_code());
}
