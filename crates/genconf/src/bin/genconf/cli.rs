//! genconf cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; genconf ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate configuration for one resource
    ///
    /// Writes a template of all settable attributes when no state is given.
    Resource(ResourceCommand),

    /// Generate configuration and import blocks for the results of a bulk read
    ///
    /// Every entry becomes a resource named <name>_<index> and an import block.
    List(ListCommand),
}

#[derive(Parser, Debug)]
pub struct ResourceCommand {
    #[clap(flatten)]
    pub target: TargetArgs,

    /// Resource schema document ({"version": .., "block": {..}})
    #[clap(short = 's', long = "schema")]
    pub schema: PathBuf,

    /// State document ({"values": {..}, "sensitive_values": {..}})
    #[clap(short = 'i', long = "state")]
    pub state: Option<PathBuf>,

    /// Also write an import block with this import ID
    #[clap(long = "import-id")]
    pub import_id: Option<String>,

    #[clap(flatten)]
    pub generate: GenerateArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct ListCommand {
    #[clap(flatten)]
    pub target: TargetArgs,

    /// Resource schema document ({"version": .., "block": {..}})
    #[clap(short = 's', long = "schema")]
    pub schema: PathBuf,

    /// Identity schema document ({"version": .., "attributes": {..}})
    #[clap(long = "identity-schema")]
    pub identity_schema: PathBuf,

    /// Entries document: a list of {"state": .., "sensitive_values": .., "identity": ..}
    #[clap(short = 'e', long = "entries")]
    pub entries: PathBuf,

    #[clap(flatten)]
    pub generate: GenerateArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct TargetArgs {
    /// Address of the resource, e.g. aws_instance.web
    #[clap(short = 'a', long = "address")]
    pub address: String,

    /// Provider configuration, e.g. aws or aws.west
    ///
    /// Defaults to the provider implied by the resource type.
    #[clap(short = 'p', long = "provider")]
    pub provider: Option<String>,

    /// Format of all input documents
    #[arg(short = 'f', long = "input-format", default_value_t)]
    pub format: InputFormat,
}

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Always write the provider attribute
    #[clap(long = "force-provider")]
    pub force_provider: bool,

    /// Leave out computed-only attributes even when they hold a value
    #[clap(long = "omit-computed")]
    pub omit_computed: bool,

    /// Keep strings holding JSON as plain strings instead of jsonencode(...)
    #[clap(long = "no-expand-json")]
    pub no_expand_json: bool,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    /// Write to a new file instead of stdout
    ///
    /// Fails if the file already exists.
    #[clap(short = 'O', long = "output-file")]
    pub output_file: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum InputFormat {
    #[default]
    Json,
    Yaml,
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFormat::Json => f.write_str("json"),
            InputFormat::Yaml => f.write_str("yaml"),
        }
    }
}
