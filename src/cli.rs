use clap::Parser;

#[derive(Debug, Parser)]
#[clap(name = "gsc", about = "Validate graphics-API test scripts")]
pub struct CommandLine {
    /// Script files to validate.
    #[clap(required = true)]
    pub scripts: Vec<String>,

    /// Write each accepted program as JSON next to its script.
    #[clap(long = "json-out", action)]
    pub json_out: bool,

    /// Only report per-script outcomes, not individual diagnostics.
    #[clap(long, action)]
    pub quiet: bool,
}
