//! mdapi cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

/// Call apis declared in structured markdown files
///
/// Run without a subcommand for an overview of reserved variables, converters and action types.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; mdapi ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    /// Directory holding user defined action types
    ///
    /// Defaults to $HOME/.config/mdapi
    #[clap(long = "config-dir", env = "MDAPI_CONFIG_DIR", global(true))]
    pub config_dir: Option<PathBuf>,

    /// Shell used for script components and actions
    #[clap(long = "shell", env = "MDAPI_SHELL", default_value = "sh", global(true))]
    pub shell: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the variables of a document
    ///
    /// Without arguments every variable is listed as name:type:count
    Vars(VarsCommand),

    /// List the component types or describe one
    VarTypes(VarTypesCommand),

    /// List the available action types
    Types,

    /// List the fields of an action type
    TypeVars(KindArgs),

    /// Print a new api document for an action type
    Generate(KindArgs),

    /// Resolve a document and print all resolved values
    Resolve(ResolveCommand),

    /// Resolve a document and print what its action would execute
    Compile(ResolveArgs),

    /// Resolve a document and run its action
    Run(ResolveArgs),
}

#[derive(Parser, Debug)]
pub struct DocumentArgs {
    /// Api document
    #[clap(short = 'f', long = "file")]
    pub file: PathBuf,
}

#[derive(Parser, Debug)]
pub struct VarsCommand {
    #[clap(flatten)]
    pub document: DocumentArgs,

    /// Show the number of values of this variable
    pub name: Option<String>,

    /// Show the value at this index
    #[clap(requires("name"))]
    pub index: Option<usize>,
}

#[derive(Parser, Debug)]
pub struct VarTypesCommand {
    /// Component type to describe
    pub kind: Option<String>,
}

#[derive(Parser, Debug)]
pub struct KindArgs {
    /// Action type
    pub kind: String,
}

#[derive(Parser, Debug)]
pub struct ResolveArgs {
    #[clap(flatten)]
    pub document: DocumentArgs,

    /// Override a variable (e.g. --vars key1=value1 --vars key2=value2)
    #[clap(long = "vars", value_parser = parse_key_value)]
    pub vars: Vec<(String, String)>,
}

#[derive(Parser, Debug)]
pub struct ResolveCommand {
    #[clap(flatten)]
    pub args: ResolveArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected key=value, got {s:?}"))
}
