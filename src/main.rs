use std::fs;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use color_print::cprintln;
use rayon::prelude::*;

use cli::CommandLine;
use script::compiler::compile;
use script::message::{MessageLog, Severity};

mod cli;
mod script;

struct Outcome {
    path: String,
    log: MessageLog,
    accepted: bool,
    program_json: Option<String>,
    read_error: Option<String>,
}

fn process_script(path: &str, json_out: bool) -> Outcome {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) => {
            return Outcome {
                path: path.to_string(),
                log: MessageLog::new(),
                accepted: false,
                program_json: None,
                read_error: Some(error.to_string()),
            }
        }
    };
    let mut log = MessageLog::new();
    let (accepted, program_json) = match compile(&text, &mut log) {
        Ok(program) => {
            let json = if json_out {
                serde_json::to_string_pretty(&program).ok()
            } else {
                None
            };
            (true, json)
        }
        Err(()) => (false, None),
    };
    Outcome {
        path: path.to_string(),
        log,
        accepted,
        program_json,
        read_error: None,
    }
}

fn main() -> ExitCode {
    let args = CommandLine::parse();
    let outcomes: Vec<Outcome> = args
        .scripts
        .par_iter()
        .map(|path| process_script(path, args.json_out))
        .collect();

    let mut all_accepted = true;
    for outcome in &outcomes {
        if let Some(error) = &outcome.read_error {
            cprintln!("{}: <red>{}</red>", outcome.path, error);
            all_accepted = false;
            continue;
        }
        if !args.quiet {
            for message in outcome.log.messages() {
                match message.severity {
                    Severity::Error => cprintln!("<red>{}</red>", message),
                    Severity::Warning => cprintln!("<yellow>{}</yellow>", message),
                }
            }
        }
        if outcome.accepted {
            cprintln!("{}: <green>ok</green>", outcome.path);
        } else {
            cprintln!("{}: <red>rejected</red>", outcome.path);
            all_accepted = false;
        }
        if let Some(json) = &outcome.program_json {
            let json_path = Path::new(&outcome.path).with_extension("json");
            if let Err(error) = fs::write(&json_path, json) {
                cprintln!("{}: <red>{}</red>", json_path.display(), error);
                all_accepted = false;
            }
        }
    }
    if all_accepted {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
