use crate::ast::Stmt;
use crate::evaluator::Interpreter;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::value::Value;
use std::io::{self, Write};

/// Line-oriented REPL. State persists across lines in one interpreter; a
/// line that is a single expression prints its value unless it is null.
pub fn start() {
    println!("jung v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl+D to quit");
    println!();

    let mut interpreter = Interpreter::new();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                // EOF reached (Ctrl+D or piped input ended)
                println!();
                break;
            }
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    break;
                }

                run_line(line, &mut interpreter);
            }
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        }
    }
}

fn run_line(source: &str, interpreter: &mut Interpreter) {
    let mut lexer = Lexer::new(source.to_string());
    let tokens = match lexer.scan_tokens() {
        Ok(tokens) => tokens,
        Err(error) => {
            error.report(source, None);
            return;
        }
    };

    let program = match Parser::new(tokens).parse() {
        Ok(program) => program,
        Err(error) => {
            error.report(source, None);
            return;
        }
    };

    // A lone expression echoes its value back
    if program.statements.len() == 1 {
        if let Stmt::Expression { expr, .. } = &program.statements[0] {
            match interpreter.eval_expr(expr) {
                Ok(value) => {
                    if !matches!(value, Value::Null) {
                        println!("{}", value);
                    }
                }
                Err(exception) => exception.into_error().report(source, None),
            }
            return;
        }
    }

    if let Err(exception) = interpreter.execute(&program) {
        exception.into_error().report(source, None);
    }
}
