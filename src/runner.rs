use crate::evaluator::Interpreter;
use crate::lexer::Lexer;
use crate::parser::Parser;

/// Run a complete source string in a fresh interpreter, reporting any error.
/// Returns the process exit code: 0 on success, 1 on any fatal error.
pub fn run(source: &str, filename: Option<&str>) -> i32 {
    let mut lexer = Lexer::new(source.to_string());
    let tokens = match lexer.scan_tokens() {
        Ok(tokens) => tokens,
        Err(error) => {
            error.report(source, filename);
            return 1;
        }
    };

    let program = match Parser::new(tokens).parse() {
        Ok(program) => program,
        Err(error) => {
            error.report(source, filename);
            return 1;
        }
    };

    let mut interpreter = Interpreter::new();
    match interpreter.execute(&program) {
        Ok(()) => 0,
        Err(exception) => {
            exception.into_error().report(source, filename);
            1
        }
    }
}
