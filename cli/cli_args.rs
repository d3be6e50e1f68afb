use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Pack code into LLM-ready context.",
    long_about = "ctx walks the given files and directories, skips ignored, binary and empty files, \noptionally follows C/C++ #include \"...\" directives, and prints the surviving files \nas one structured stream. Size metrics go to stderr.",
    help_template = "{about-section}\nUsage: {usage}\n\n{all-args}{after-help}",
    after_help = "EXAMPLES:\n  ctx . | pbcopy\n  ctx src/main.c --deep\n  ctx src/main.c src/experimental/ --deep -f json"
)]
pub struct Cli {
    #[arg(
        value_name = "INPUTS",
        default_value = ".",
        help = "Files or directories to scan (default: current dir)."
    )]
    pub inputs: Vec<PathBuf>,

    #[arg(
        long,
        help = "Recursively follow C/C++ #include \"...\" directives.",
        help_heading = "Discovery"
    )]
    pub deep: bool,

    #[arg(
        long,
        help = "Do not apply the built-in ignore list.",
        help_heading = "Discovery"
    )]
    pub no_builtin_ignore: bool,

    #[arg(
        long,
        help = "Use a specific TOML config file (default: <root>/.ctx.toml).",
        value_name = "CONFIG_FILE",
        conflicts_with = "no_config",
        help_heading = "Configuration"
    )]
    pub config: Option<String>,

    #[arg(
        long,
        help = "Disable loading any TOML config file.",
        conflicts_with = "config",
        help_heading = "Configuration"
    )]
    pub no_config: bool,

    #[arg(
        short = 'f',
        long,
        help = "Set the output format.",
        value_name = "FORMAT",
        value_parser = ["text", "json"],
        default_value = "text",
        help_heading = "Output"
    )]
    pub format: String,

    #[arg(
        long,
        help = "Count tokens with the cl100k tokenizer instead of estimating.",
        help_heading = "Output"
    )]
    pub exact_tokens: bool,

    #[arg(long, help = "Print the full manual and exit.")]
    pub doc: bool,

    #[arg(short, long, action = clap::ArgAction::Count, help = "Increase message verbosity (-v, -vv).")]
    pub verbose: u8,

    #[arg(short, long, help = "Silence informational messages and warnings.")]
    pub quiet: bool,
}
