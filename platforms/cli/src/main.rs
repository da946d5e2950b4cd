use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tapesim::{
    MachineConfig, SlotOrder, StepLog, TapeMachineError, TuringMachine, DEFAULT_SEGMENT_SIZE,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Runs a binary Turing machine over a tape file, updating the file in place.
#[derive(Parser)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
#[clap(after_help = "EXAMPLES:
  tapesim-cli programs/increment.txt tape.txt
  tapesim-cli programs/increment.txt tape.txt -o steps.log
  tapesim-cli programs/increment.txt tape.txt -s --report json")]
struct Cli {
    /// The instruction-set file (`STATES: N` followed by transition lines)
    instructions: PathBuf,

    /// The tape file of ASCII '0'/'1' characters, read and written in place
    tape: PathBuf,

    /// Write the step log to FILE instead of standard output
    #[clap(short = 'o', long = "output", value_name = "FILE")]
    output: Option<PathBuf>,

    /// Silence the step log and the final report
    #[clap(short = 's', long)]
    silent: bool,

    /// Number of tape cells held in memory at once
    #[clap(long, default_value_t = DEFAULT_SEGMENT_SIZE)]
    segment_size: usize,

    /// Fill table slots by each line's own state and symbol instead of by line order
    #[clap(long)]
    declared_slots: bool,

    /// Format of the final report
    #[clap(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging. `RUST_LOG` overrides the default `warn` filter.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), TapeMachineError> {
    // `-s` wins over `-o`.
    let mut log = if cli.silent {
        StepLog::silent()
    } else if let Some(path) = &cli.output {
        StepLog::to_file(path)?
    } else {
        StepLog::stdout()
    };

    let config = MachineConfig {
        segment_size: cli.segment_size,
        slot_order: if cli.declared_slots {
            SlotOrder::Declared
        } else {
            SlotOrder::LineOrder
        },
    };

    let mut machine = TuringMachine::open(&cli.instructions, &cli.tape, config)?;
    if !machine.table().can_halt() {
        info!("Instruction set has no STOP transition; the run will not halt on its own");
    }

    let report = machine.run(&mut log)?;

    match cli.report {
        ReportFormat::Text if !cli.silent => println!("{}", report),
        ReportFormat::Text => {}
        ReportFormat::Json => println!("{}", report.to_json()?),
    }

    Ok(())
}
