//! CLI driver: read a `.blu` source file, compile it, assemble, link.
//!
//! The compilation core is pure string-to-string; everything effectful
//! lives here. The driver writes the generated assembly to `out.asm`,
//! assembles it with YASM (preferred, for the listing file) or NASM, and
//! links the object with `ld` into `out`.

use std::env;
use std::fs;
use std::path::Path;
use std::process::{self, Command};

use anyhow::{Context, Result, bail};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_target(false)
    .without_time()
    .init();

  let args: Vec<String> = env::args().collect();
  if args.len() != 2 {
    let program = args.first().map(String::as_str).unwrap_or("bluec");
    eprintln!("usage: {program} <input.blu>");
    process::exit(1);
  }

  if let Err(err) = run(&args[1]) {
    eprintln!("{err:#}");
    process::exit(1);
  }
}

fn run(input: &str) -> Result<()> {
  let source = fs::read_to_string(input).with_context(|| format!("reading {input}"))?;
  debug!(bytes = source.len(), "read source file");

  let asm = bluec::generate_assembly(&source)?;
  debug!(bytes = asm.len(), "generated assembly");

  fs::write("out.asm", &asm).context("writing out.asm")?;
  assemble(Path::new("out.asm"))?;
  link(Path::new("out.o"), Path::new("out"))?;
  Ok(())
}

/// Assemble `out.asm` into `out.o`. YASM is preferred because it can emit a
/// listing file for examining the text segment; NASM is the fallback.
fn assemble(asm: &Path) -> Result<()> {
  if which::which("yasm").is_ok() {
    let status = Command::new("yasm")
      .args(["-felf64", "-g", "dwarf2", "-l", "out.lst"])
      .arg(asm)
      .status()
      .context("running yasm")?;
    if !status.success() {
      bail!("yasm failed on {}", asm.display());
    }
    debug!("assembled with yasm");
    return Ok(());
  }

  let nasm = which::which("nasm").context("neither yasm nor nasm found on PATH")?;
  let status = Command::new(nasm)
    .arg("-felf64")
    .arg(asm)
    .status()
    .context("running nasm")?;
  if !status.success() {
    bail!("nasm failed on {}", asm.display());
  }
  debug!("assembled with nasm");
  Ok(())
}

fn link(obj: &Path, out: &Path) -> Result<()> {
  let status = Command::new("ld")
    .arg(obj)
    .arg("-o")
    .arg(out)
    .status()
    .context("running ld")?;
  if !status.success() {
    bail!("ld failed on {}", obj.display());
  }
  debug!(exe = %out.display(), "linked");
  Ok(())
}
