//! env-check CLI
//!
//! Validates environment files against a schema, compares environment files,
//! generates schemas and example files, and encrypts files for sharing.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use env_check::config::{EnvCheckConfig, OutputFormat};
use env_check::crypto;
use env_check::format::{self, EnvFormat};
use env_check::report;
use env_check::{diff, SchemaDefinition, SchemaValidator};
use secrecy::SecretString;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "env-check")]
#[command(about = "A smart environment variable validator and manager")]
#[command(version)]
struct Cli {
    /// Path to an env-check.toml configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an env file against a schema and/or usage in code
    Validate {
        /// Path to the env file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Path to the schema file
        #[arg(short, long)]
        schema: Option<PathBuf>,
        /// Check whether variables are used in code
        #[arg(short = 'c', long)]
        code_check: bool,
        /// Directory to scan for code usage
        #[arg(short, long)]
        directory: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum)]
        output: Option<Format>,
        /// Fail on warnings and unused variables too
        #[arg(long)]
        strict: bool,
    },

    /// Show differences between two env files
    Diff {
        /// First env file
        file1: PathBuf,
        /// Second env file
        file2: PathBuf,
        /// Output format
        #[arg(short, long, value_enum)]
        output: Option<Format>,
    },

    /// Generate env.schema.json or .env.example
    Init {
        /// What to generate
        #[arg(short = 't', long = "type", value_enum, default_value = "schema")]
        kind: InitKind,
        /// Source env file
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Keep an existing schema and only add new variables
        #[arg(long)]
        merge: bool,
    },

    /// Encrypt an env file for safe sharing
    Encrypt {
        /// The env file to encrypt
        file: PathBuf,
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Encryption key (prompted for when omitted)
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Decrypt an encrypted env file
    Decrypt {
        /// The encrypted env file
        file: PathBuf,
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Decryption key (prompted for when omitted)
        #[arg(short, long)]
        key: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Table,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(value: Format) -> Self {
        match value {
            Format::Table => OutputFormat::Table,
            Format::Json => OutputFormat::Json,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum InitKind {
    Schema,
    Example,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the command ran but found problems
fn run(cli: Cli) -> anyhow::Result<bool> {
    let settings = EnvCheckConfig::load_from(cli.config.as_deref())
        .context("failed to load env-check configuration")?;

    match cli.command {
        Commands::Validate {
            file,
            schema,
            code_check,
            directory,
            output,
            strict,
        } => {
            let file = file.unwrap_or_else(|| settings.files.env_file.clone());
            let schema = schema.unwrap_or_else(|| settings.files.schema_file.clone());
            let output_format = output.map(OutputFormat::from).unwrap_or(settings.output.format);
            let strict = strict || settings.validation.strict;
            let table = output_format == OutputFormat::Table;

            if table {
                println!("🔍 Validating environment file: {}", file.display());
            }
            let config = format::load(&file)?;
            if table {
                println!("✅ Found {} environment variables", config.len());
            }

            let mut ok = true;
            let mut json = serde_json::Map::new();

            if schema.exists() {
                let definition = SchemaDefinition::load(&schema)?;
                let result = SchemaValidator::new().validate(&config, &definition)?;
                ok &= result.valid && !(strict && result.has_warnings());

                if table {
                    println!("🔍 Validating against schema: {}", schema.display());
                    print!("{}", report::validation_text(&result));
                } else {
                    json.insert("schema".to_string(), serde_json::to_value(&result)?);
                }
            } else if table {
                println!("⚠️  Schema file not found at {}. Skipping schema validation.", schema.display());
                println!("💡 Tip: Run `env-check init` to generate a schema file.");
            } else {
                json.insert("schema".to_string(), serde_json::Value::Null);
            }

            if code_check {
                let directory = directory.unwrap_or_else(|| settings.scan.directory.clone());
                let usage = settings.scanner().report(&config, &directory)?;
                ok &= !(strict && !usage.unused.is_empty());

                if table {
                    println!("🔍 Checking for variable usage in code: {}", directory.display());
                    print!("{}", report::usage_text(&usage));
                } else {
                    json.insert("usage".to_string(), serde_json::to_value(&usage)?);
                }
            }

            if !table {
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            Ok(ok)
        }

        Commands::Diff { file1, file2, output } => {
            let first = format::load(&file1)?;
            let second = format::load(&file2)?;
            let result = diff(&first, &second);

            match output.map(OutputFormat::from).unwrap_or(settings.output.format) {
                OutputFormat::Json => println!("{}", report::to_json(&result)?),
                OutputFormat::Table => print!(
                    "{}",
                    report::diff_text(&result, &file_label(&file1), &file_label(&file2))
                ),
            }
            Ok(true)
        }

        Commands::Init {
            kind,
            file,
            output,
            merge,
        } => {
            let file = file.unwrap_or_else(|| settings.files.env_file.clone());
            println!("🔍 Reading environment file: {}", file.display());
            let config = format::load(&file)?;
            println!("✅ Found {} environment variables", config.len());

            let inferencer = settings.inferencer();
            match kind {
                InitKind::Schema => {
                    let path = output.unwrap_or_else(|| settings.files.schema_file.clone());
                    let inferred = inferencer.infer(&config);

                    let definition = if merge && path.exists() {
                        let mut existing = SchemaDefinition::load(&path)?;
                        let added = existing.merge_missing(inferred);
                        println!("➕ Added {} new variables to existing schema", added);
                        existing
                    } else {
                        inferred
                    };

                    definition.save(&path)?;
                    println!("✅ Generated schema at {}", path.display());
                    println!("💡 You can now use this schema for validation with:");
                    println!("   env-check validate --schema {}", path.display());
                }
                InitKind::Example => {
                    let schema_path = &settings.files.schema_file;
                    let definition = if schema_path.exists() {
                        println!("📂 Found schema file: {}", schema_path.display());
                        Some(SchemaDefinition::load(schema_path)?)
                    } else {
                        None
                    };

                    let example = inferencer.generate_example(&config, definition.as_ref());
                    let path = output.unwrap_or_else(|| settings.files.example_file.clone());
                    format::save(&example, &path, EnvFormat::from_path(&path))?;
                    println!("✅ Generated example file at {}", path.display());
                }
            }
            Ok(true)
        }

        Commands::Encrypt { file, output, key } => {
            let key = resolve_key(key, "Enter encryption key")?;
            println!("🔒 Encrypting file: {}", file.display());
            let out = crypto::encrypt_file(&file, &key, output.as_deref())?;
            println!("✅ File encrypted successfully: {}", out.display());
            println!("💡 To decrypt this file, use:");
            println!("   env-check decrypt {}", out.display());
            Ok(true)
        }

        Commands::Decrypt { file, output, key } => {
            let key = resolve_key(key, "Enter decryption key")?;
            println!("🔓 Decrypting file: {}", file.display());
            let out = crypto::decrypt_file(&file, &key, output.as_deref())
                .context("check the key and that the file was written by `env-check encrypt`")?;
            println!("✅ File decrypted successfully: {}", out.display());
            Ok(true)
        }
    }
}

fn resolve_key(key: Option<String>, prompt: &str) -> anyhow::Result<SecretString> {
    let key = match key {
        Some(key) => key,
        None => dialoguer::Password::new().with_prompt(prompt).interact()?,
    };
    anyhow::ensure!(!key.is_empty(), "a key is required");
    Ok(SecretString::from(key))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
