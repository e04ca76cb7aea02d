use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::Colorize;
use miette::{bail, IntoDiagnostic, NamedSource, Report, Result};

use accum::device::{ConsoleOutput, StdinInput};
use accum::{assemble, Machine, MachineConfig, Program, Width};

/// Accum is an assembler and interpreter for a small accumulator machine.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.asm` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run text `.asm` or binary `.acc` file and output to terminal
    Run {
        /// `.asm` or `.acc` file to run
        name: PathBuf,
        #[command(flatten)]
        machine: MachineArgs,
    },
    /// Create binary `.acc` file to run later or view compiled data
    Compile {
        /// `.asm` file to compile
        name: PathBuf,
        /// Destination to output .acc file
        dest: Option<PathBuf>,
        /// Word width of the image
        #[arg(short, long)]
        bits: Option<u32>,
        /// Print a listing of the assembled instructions
        #[arg(short, long)]
        list: bool,
    },
    /// Check a `.asm` file without running or outputting binary
    Check {
        /// File to check
        name: PathBuf,
    },
}

#[derive(ClapArgs)]
struct MachineArgs {
    /// Word width of registers and memory cells [default: 16, or $ACCUM_BITS]
    #[arg(short, long)]
    bits: Option<u32>,
    /// Dump memory and registers after every instruction
    #[arg(short, long)]
    verbose: bool,
}

impl MachineArgs {
    fn config(&self) -> MachineConfig {
        let mut config = MachineConfig::from_env();
        if let Some(bits) = self.bits {
            config = config.with_width(bits);
        }
        if self.verbose {
            config = config.with_verbose(true);
        }
        config
    }
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    env_logger::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(2)
                .build(),
        )
    }))?;

    match args.command {
        Some(Command::Run { name, machine }) => run(&name, machine.config()),
        Some(Command::Compile {
            name,
            dest,
            bits,
            list,
        }) => {
            file_message(Green, "Assembling", &name);
            let program = assemble_file(&name)?;
            let width = Width::new(bits.unwrap_or(MachineConfig::from_env().width))?;

            let out_file_name = dest.unwrap_or_else(|| name.with_extension("acc"));
            fs::write(&out_file_name, program.to_image(width)).into_diagnostic()?;

            if list {
                print!("{}", program.listing());
            }
            message(Green, "Finished", "emit binary");
            file_message(Green, "Saved", &out_file_name);
            Ok(())
        }
        Some(Command::Check { name }) => {
            file_message(Green, "Checking", &name);
            let _ = assemble_file(&name)?;
            message(Green, "Success", "no errors found!");
            Ok(())
        }
        None => {
            if let Some(path) = args.path {
                run(&path, MachineConfig::from_env())
            } else {
                println!("\n~ accum v{VERSION} ~");
                println!("{SHORT_INFO}");
                Ok(())
            }
        }
    }
}

enum MsgColor {
    Green,
    Cyan,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message(color: MsgColor, left: &str, right: &str) {
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
    };
    // Status goes to stderr so program output stays clean
    eprintln!("{left:>12} {right}");
}

fn read_source(name: &Path) -> Result<String> {
    fs::read_to_string(name).into_diagnostic()
}

/// Assemble a source file, pointing diagnostics at the offending token.
fn assemble_file(name: &Path) -> Result<Program> {
    let src = read_source(name)?;
    match assemble(&src) {
        Ok(program) => Ok(program),
        Err(err) => {
            let src = NamedSource::new(name.display().to_string(), src);
            Err(Report::new(err).with_source_code(src))
        }
    }
}

fn run(name: &Path, config: MachineConfig) -> Result<()> {
    file_message(MsgColor::Green, "Assembling", name);
    let (program, config) = match name.extension().and_then(|ext| ext.to_str()) {
        Some("asm") => (assemble_file(name)?, config),
        Some("acc") => {
            let image = fs::read(name).into_diagnostic()?;
            let (program, width) = Program::from_image(&image)?;
            // Images carry their own width
            (program, config.with_width(width.bits()))
        }
        Some(_) => bail!("File has unknown extension. Exiting..."),
        None => bail!("File has no extension. Exiting..."),
    };

    let mut machine = Machine::new(config)?;
    machine.attach_input(StdinInput);
    machine.attach_output(ConsoleOutput::stdout(machine.width()));

    message(MsgColor::Green, "Running", "assembled program");
    let summary = machine.execute(&program)?;
    if summary.halted {
        message(MsgColor::Cyan, "Halted", &format!("after {} steps", summary.steps));
    } else {
        message(
            MsgColor::Cyan,
            "Stopped",
            &format!("end of program after {} steps", summary.steps),
        );
    }

    file_message(MsgColor::Green, "Completed", name);
    Ok(())
}

const SHORT_INFO: &str = r"
Welcome to accum, an assembler and interpreter for a small accumulator
instruction set (LDM, LDD, ADD, CMP, JPN, IN, OUT, END and friends).
Please use `-h` or `--help` to access the usage instructions.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
