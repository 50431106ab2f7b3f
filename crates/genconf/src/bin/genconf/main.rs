mod cli;

use anyhow::Context;
use genconf::schema::{Block, IdentitySchema, ResourceSchema};
use genconf::types::Type;
use genconf::{Diagnostics, GenerateOptions, ListEntry, ProviderRef, ResourceAddress, Value};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as Json;
use std::io::Write;
use std::path::Path;

const HEADER: &str = "# __generated__ by genconf\n# Please review these resources and move them into your main configuration files.\n\n";

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("GENCONF_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Resource(resource_cli) => resource(resource_cli),
        cli::Command::List(list_cli) => list(list_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn resource(cli: cli::ResourceCommand) -> anyhow::Result<()> {
    let (addr, provider) = target(&cli.target)?;
    let schema = load_schema(&cli.schema, &cli.target.format)?;
    let options = options(&cli.generate);

    let state = match &cli.state {
        Some(path) => Some(load_state(path, &cli.target.format, &schema)?),
        None => None,
    };

    let generated = genconf::generate_resource(&addr, &schema, &provider, state.as_ref(), &options)?;
    report(&generated.diagnostics);

    let mut text = generated.output.to_string();
    text.push('\n');
    if let Some(id) = cli.import_id {
        let import = genconf::ImportBlock::by_id(addr, provider, id);
        text.push_str(&format!("{import}\n"));
    }

    output(&cli.output, &text)
}

pub fn list(cli: cli::ListCommand) -> anyhow::Result<()> {
    let (addr, provider) = target(&cli.target)?;
    let schema = load_schema(&cli.schema, &cli.target.format)?;
    let identity_schema: IdentitySchema = load(&cli.identity_schema, &cli.target.format)?;
    let identity_schema = identity_schema.into_block();
    identity_schema
        .validate()
        .with_context(|| format!("Invalid identity schema {}", cli.identity_schema.display()))?;
    let options = options(&cli.generate);

    let documents: Vec<ListEntryDocument> = load(&cli.entries, &cli.target.format)?;
    let state_type = schema.implied_type();
    let identity_type = identity_schema.implied_type();

    let mut entries = Vec::with_capacity(documents.len());
    for (index, document) in documents.into_iter().enumerate() {
        let state = match document.state {
            Some(values) => Some(
                state_value(&values, &document.sensitive_values, &state_type)
                    .with_context(|| format!("Invalid state in entry {index}"))?,
            ),
            None => None,
        };
        let identity = Value::from_json(&document.identity, &identity_type)
            .with_context(|| format!("Invalid identity in entry {index}"))?;

        entries.push(ListEntry { state, identity });
    }

    let generated = genconf::generate_list_resources(
        &addr,
        &schema,
        &identity_schema,
        &provider,
        &entries,
        &options,
    )?;
    report(&generated.diagnostics);

    output(&cli.output, &generated.output.to_string())
}

#[derive(Deserialize)]
struct StateDocument {
    values: Json,
    #[serde(default)]
    sensitive_values: Json,
}

#[derive(Deserialize)]
struct ListEntryDocument {
    state: Option<Json>,
    #[serde(default)]
    sensitive_values: Json,
    identity: Json,
}

fn target(args: &cli::TargetArgs) -> anyhow::Result<(ResourceAddress, ProviderRef)> {
    let addr: ResourceAddress = args.address.parse()?;
    let provider = match &args.provider {
        Some(provider) => provider.parse()?,
        None => ProviderRef::new(addr.implied_provider()),
    };

    Ok((addr, provider))
}

fn options(args: &cli::GenerateArgs) -> GenerateOptions {
    GenerateOptions {
        force_provider: args.force_provider,
        computed: if args.omit_computed {
            genconf::ComputedAttributes::Omit
        } else {
            genconf::ComputedAttributes::OmitNull
        },
        expand_json_strings: !args.no_expand_json,
    }
}

fn load<T: DeserializeOwned>(path: &Path, format: &cli::InputFormat) -> anyhow::Result<T> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = std::io::BufReader::new(file);

    let document = match format {
        cli::InputFormat::Json => serde_json::from_reader(reader)
            .with_context(|| format!("Failed to read {} as json", path.display()))?,
        cli::InputFormat::Yaml => serde_yaml::from_reader(reader)
            .with_context(|| format!("Failed to read {} as yaml", path.display()))?,
    };

    Ok(document)
}

fn load_schema(path: &Path, format: &cli::InputFormat) -> anyhow::Result<Block> {
    let schema: ResourceSchema = load(path, format)?;
    schema
        .block
        .validate()
        .with_context(|| format!("Invalid schema {}", path.display()))?;

    tracing::debug!(version = schema.version, "schema loaded");
    Ok(schema.block)
}

fn load_state(path: &Path, format: &cli::InputFormat, schema: &Block) -> anyhow::Result<Value> {
    let document: StateDocument = load(path, format)?;
    state_value(
        &document.values,
        &document.sensitive_values,
        &schema.implied_type(),
    )
    .with_context(|| format!("Invalid state {}", path.display()))
}

/// Attributes that do not fit the schema stay in the value and are reported while generating
fn state_value(values: &Json, sensitive_values: &Json, ty: &Type) -> anyhow::Result<Value> {
    let mut state = Value::from_json(values, ty)?;
    state.apply_sensitive_values(sensitive_values);

    Ok(state)
}

fn report(diagnostics: &Diagnostics) {
    for diagnostic in diagnostics {
        eprintln!("{diagnostic}");
    }
}

fn output(output: &cli::OutputArgs, text: &str) -> anyhow::Result<()> {
    let Some(path) = &output.output_file else {
        print!("{text}");
        return Ok(());
    };

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("Refusing to write {}, it must not exist yet", path.display()))?;
    file.write_all(HEADER.as_bytes())?;
    file.write_all(text.as_bytes())?;

    tracing::info!(path=%path.display(), "configuration written");
    Ok(())
}
