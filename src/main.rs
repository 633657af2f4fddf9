mod ast;
mod builtins;
mod error;
mod evaluator;
mod lexer;
mod parser;
mod repl;
mod runner;
mod table;
mod value;

use clap::{Arg, ArgAction, Command};
use std::fs;
use std::path::Path;

fn main() {
    let matches = Command::new("jung")
        .about("An interpreter for the jung scripting language")
        .disable_version_flag(true)
        .version(concat!("v", env!("CARGO_PKG_VERSION")))
        .arg(
            Arg::new("version")
                .short('v')
                .long("version")
                .help("Print version")
                .action(ArgAction::Version),
        )
        .arg(
            Arg::new("file")
                .help("The script file to execute")
                .value_name("FILE")
                .index(1),
        )
        .get_matches();

    match matches.get_one::<String>("file") {
        Some(file_path) => run_file(file_path),
        None => repl::start(),
    }
}

fn run_file(path: &str) {
    let path = Path::new(path);

    if !path.exists() {
        eprintln!("jung: cannot open file '{}'", path.display());
        std::process::exit(1);
    }

    match fs::read_to_string(path) {
        Ok(source) => {
            let code = runner::run(&source, path.to_str());
            std::process::exit(code);
        }
        Err(error) => {
            eprintln!("jung: error reading file '{}': {}", path.display(), error);
            std::process::exit(1);
        }
    }
}
