use anyhow::Result;
use clap::Parser;
use simpleppl::{load, Compiler, Options};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Compile a probabilistic model into its model graph")]
struct Args {
  /// Model source file
  file: PathBuf,

  /// Only parse the file and print the program back
  #[arg(long)]
  parse_only: bool,

  /// Line width of the printed report
  #[arg(short, long, default_value_t = 80)]
  width: usize,

  /// Accept the reserved Dirichlet distribution `Dir`
  #[arg(long)]
  enable_dirichlet: bool,
}

fn main() -> Result<()> {
  env_logger::init();
  let args = Args::parse();

  let program = load(&args.file)?;
  log::info!("parsed {} statements from {}", program.stmts.len(), args.file.display());
  if args.parse_only {
    print!("{}", program);
    return Ok(());
  }

  let compiler = Compiler::new(Options {
    enable_dirichlet: args.enable_dirichlet,
  });
  let store = compiler.compile(&program)?;
  log::info!("compiled {} names", store.len());
  println!("{}", store.to_pretty(args.width));
  Ok(())
}
