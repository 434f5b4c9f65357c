use std::process::ExitCode;

use clap::Parser;
use colored::*;

use crate::cli::{args::Args, init_logging, run};

mod cli;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
