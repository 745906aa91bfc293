use super::checker::check;
use super::message::MessageLog;
use super::parser::Parser;
use super::program::Program;

/// Front door for one script: tokenize, parse, then run the whole-program
/// checker. All diagnostics land in `messages`; `Err` means the script was
/// rejected and nothing should be executed.
pub fn compile(text: &str, messages: &mut MessageLog) -> Result<Program, ()> {
    let program = Parser::new(text, messages).parse()?;
    if !check(&program, messages) {
        return Err(());
    }
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::super::message::MessageLog;
    use super::compile;

    #[test]
    fn accepts_a_valid_script() {
        let mut log = MessageLog::new();
        let program = compile("CREATE_SAMPLER s\nCREATE_RENDERBUFFER rb WIDTH 4 HEIGHT 4\n", &mut log);
        assert!(log.is_empty());
        assert_eq!(program.expect("compile failed").num_commands(), 2);
    }

    #[test]
    fn rejects_a_script_that_fails_the_checker() {
        let mut log = MessageLog::new();
        let result = compile("COMPILE_SHADER c SHADER missing\n", &mut log);
        assert!(result.is_err());
        assert!(log.has_errors());
    }

    #[test]
    fn rejects_a_script_that_fails_the_parser() {
        let mut log = MessageLog::new();
        let result = compile("NOT_A_COMMAND\n", &mut log);
        assert!(result.is_err());
        assert!(log.has_errors());
    }
}
