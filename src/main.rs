//! gbasm binary

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use gbasm::trace::Tracing;
use tracing::{level_filters::LevelFilter, warn};
use vm::{interpret::Exit, RenderConfig};

const DEFAULT_MAX_INSTRUCTIONS: usize = 10_000_000;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
struct Args {
    #[arg(value_name = "GBASM_FILE", help = "input program")]
    input: PathBuf,

    #[arg(short = 'o', long, value_name = "WAV_FILE", help = "output wave file")]
    output: PathBuf,

    #[arg(
        short = 'r',
        long,
        value_name = "HZ",
        default_value_t = 44_100,
        value_parser = clap::value_parser!(u32).range(1..=384_000),
        help = "output sample rate"
    )]
    sample_rate: u32,

    #[arg(long, value_name = "N", help = "seed the drum noise for a reproducible render")]
    seed: Option<u64>,

    #[arg(
        long,
        value_name = "N",
        default_value_t = DEFAULT_MAX_INSTRUCTIONS,
        conflicts_with = "unbounded",
        help = "stop programs that run longer than this"
    )]
    max_instructions: usize,

    #[arg(long, help = "never stop a program early")]
    unbounded: bool,

    #[arg(
        long,
        value_name = "TICKS",
        default_value_t = 0,
        help = "silence to append after the last note"
    )]
    tail_ticks: u64,

    #[arg(short, long, action = clap::ArgAction::Count, help = "more logging, repeat for more")]
    verbose: u8,

    #[arg(short, long, conflicts_with = "verbose", help = "only log warnings and errors")]
    quiet: bool,
}

impl Args {
    fn level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (true, _) => LevelFilter::WARN,
            (false, 0) => LevelFilter::INFO,
            (false, 1) => LevelFilter::DEBUG,
            (false, _) => LevelFilter::TRACE,
        }
    }

    fn config(&self) -> RenderConfig {
        RenderConfig {
            sample_rate: self.sample_rate,
            noise_seed: self.seed,
            max_instructions: (!self.unbounded).then_some(self.max_instructions),
            tail_ticks: self.tail_ticks,
        }
    }
}

fn run(args: &Args) -> color_eyre::Result<()> {
    color_eyre::install()?;

    let compiled = gbasm::compile_file(&args.input)?;
    lang::report::eprint_diagnostics(&compiled.source, &compiled.assembly.diagnostics);

    let summary = gbasm::render_to_file(&compiled.assembly, &args.output, &args.config())?;
    if summary.exit == Exit::InstructionLimit {
        warn!(
            "{} did not finish within {} instructions, rendered what it scheduled",
            args.input.display(),
            args.max_instructions
        );
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };
    let _tracing = Tracing::setup(args.level());

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            eprintln!("{report:?}");
            ExitCode::FAILURE
        }
    }
}
