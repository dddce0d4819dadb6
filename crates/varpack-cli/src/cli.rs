//! CLI argument definitions for the varpack tool.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "varpack",
    version,
    about = "Save, restore and inspect portable variable files",
    long_about = "Save, restore and inspect portable variable files.\n\n\
                  Files written on one host read back on any other, whatever\n\
                  its byte order or word width."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load demo variables from a file, print them, and optionally save them.
    Demo(DemoArgs),

    /// Print the header of a variable file without loading it.
    Inspect(InspectArgs),

    /// List every outcome code with its diagnostic name.
    Errors,
}

#[derive(Args, Debug, Default, Clone)]
pub struct DemoArgs {
    /// Set the flag.
    #[arg(short = 'f', long = "flag")]
    pub flag: bool,

    /// Integers to store (at most 4096).
    #[arg(short = 'i', long = "ints", value_name = "INTS", num_args = 1.., allow_negative_numbers = true)]
    pub ints: Vec<i32>,

    /// Optional text to store.
    #[arg(short = 's', long = "text", value_name = "TEXT")]
    pub text: Option<String>,

    /// Save the variables to this file.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Load the variables from this file before printing them.
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Variable file to inspect.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print the header as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
