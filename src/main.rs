use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use disasm_8086::{Decoder, HEADER};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "disasm-8086")]
#[command(about = "Disassemble 16-bit 8086 machine code into nasm syntax")]
struct Args {
  /// Binary file to disassemble
  file: PathBuf,

  /// Write the listing here instead of stdout
  #[arg(short, long, value_name = "PATH")]
  output: Option<PathBuf>,

  /// Log decoding progress to stderr
  #[arg(short, long)]
  verbose: bool,
}

/// `RUST_LOG` wins when set; otherwise only this crate logs, at `warn` or `debug`.
fn log_filter(verbose: bool, rust_log: Option<&str>) -> Result<EnvFilter> {
  if let Some(directives) = rust_log {
    return Ok(EnvFilter::try_new(directives)?);
  }
  let level = if verbose { "debug" } else { "warn" };
  Ok(EnvFilter::try_new(format!("disasm_8086={level}"))?)
}

fn setup_logging(verbose: bool) -> Result<()> {
  use tracing_subscriber::{fmt, prelude::*};

  let rust_log = std::env::var(EnvFilter::DEFAULT_ENV)
    .ok()
    .filter(|directives| !directives.is_empty());
  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(io::stderr))
    .with(log_filter(verbose, rust_log.as_deref())?)
    .init();

  Ok(())
}

fn main() -> Result<ExitCode> {
  let args = Args::parse();
  setup_logging(args.verbose)?;

  let data = std::fs::read(&args.file)
    .with_context(|| format!("Error reading file {}", args.file.display()))?;
  info!("Read {} bytes from {:?}", data.len(), args.file);

  let mut out: Box<dyn Write> = match &args.output {
    Some(path) => Box::new(BufWriter::new(
      File::create(path).with_context(|| format!("Error creating {}", path.display()))?,
    )),
    None => Box::new(BufWriter::new(io::stdout().lock())),
  };

  for line in HEADER {
    writeln!(out, "{line}")?;
  }

  let mut status = ExitCode::SUCCESS;
  for located in Decoder::new(&data) {
    match located {
      Ok(located) => writeln!(out, "{}", located.instruction)?,
      Err(err) => {
        eprintln!("{err}");
        status = ExitCode::FAILURE;
      }
    }
  }
  out.flush()?;

  Ok(status)
}
