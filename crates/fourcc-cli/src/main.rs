//! FourCC DB CLI
//!
//! Builds the FourCC database from the media framework headers and queries
//! generated databases. Running without arguments builds with defaults and
//! prints compact JSON to stdout.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use fourcc_core::{Config, FourCc, FourCcEntry};
use fourcc_parser::{ConstantExtractor, ParserError, PrefixSet};
use fourcc_query::{FourCcDatabase, QueryError};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fourcc-db")]
#[command(author, version, about = "FourCC constant database builder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Preprocess the headers and emit the database (default)
    Build(BuildArgs),

    /// Scan an already preprocessed file and emit the database
    Extract {
        /// Preprocessed file (default: stdin)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Recognized constant prefix (repeatable)
        #[arg(long = "prefix", value_name = "PREFIX")]
        prefixes: Vec<String>,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Search a database by name, FourCC, hex or decimal value
    Lookup {
        /// Database file
        #[arg(long, value_name = "FILE")]
        db: PathBuf,

        /// Search term
        #[arg(value_name = "TERM")]
        term: String,
    },

    /// Describe a raw value (decimal, 0x-hex or four characters)
    Describe {
        /// Database file
        #[arg(long, value_name = "FILE")]
        db: PathBuf,

        #[arg(value_name = "VALUE")]
        value: String,
    },
}

#[derive(Args, Default)]
struct BuildArgs {
    /// YAML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Clang executable (default: auto-detect)
    #[arg(long, value_name = "PATH")]
    clang: Option<PathBuf>,

    /// Include search path
    #[arg(short = 'I', long = "include", value_name = "DIR")]
    include_dirs: Vec<PathBuf>,

    /// Framework search path
    #[arg(short = 'F', long = "framework", value_name = "DIR")]
    framework_dirs: Vec<PathBuf>,

    /// SDK root passed as -isysroot
    #[arg(long, value_name = "DIR")]
    sysroot: Option<PathBuf>,

    /// Macro definition
    #[arg(short = 'D', long = "define", value_name = "NAME[=VALUE]")]
    defines: Vec<String>,

    /// Macro to undefine
    #[arg(short = 'U', long = "undefine", value_name = "NAME")]
    undefines: Vec<String>,

    /// Header to include instead of the default set (repeatable)
    #[arg(long = "header", value_name = "HEADER")]
    headers: Vec<String>,

    /// Recognized constant prefix instead of the default set (repeatable)
    #[arg(long = "prefix", value_name = "PREFIX")]
    prefixes: Vec<String>,

    /// Directory for temporary files
    #[arg(long, value_name = "DIR")]
    work_dir: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,
}

impl BuildArgs {
    /// Configuration file (or defaults) with command-line overrides applied
    fn to_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("loading configuration {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(clang) = &self.clang {
            config.preprocessor.clang_path = Some(clang.clone());
        }
        if let Some(sysroot) = &self.sysroot {
            config.preprocessor.sysroot = Some(sysroot.clone());
        }
        if let Some(work_dir) = &self.work_dir {
            config.work_dir = work_dir.clone();
        }
        config.preprocessor.include_dirs.extend(self.include_dirs.iter().cloned());
        config.preprocessor.framework_dirs.extend(self.framework_dirs.iter().cloned());
        config.preprocessor.defines.extend(self.defines.iter().cloned());
        config
            .preprocessor
            .defines
            .extend(self.undefines.iter().map(|name| format!("!{}", name)));
        if !self.headers.is_empty() {
            config.headers = self.headers.clone();
        }
        if !self.prefixes.is_empty() {
            config.extract.prefixes = self.prefixes.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

/// Failure classes reported on stderr and through the exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Preprocessing,
    FileSystem,
    Serialization,
    Other,
}

impl Failure {
    fn classify(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(e) = cause.downcast_ref::<ParserError>() {
                return match e {
                    ParserError::Preprocess(_) => Failure::Preprocessing,
                    ParserError::Synthesis { .. } | ParserError::ReadExpanded { .. } => {
                        Failure::FileSystem
                    }
                    ParserError::Config(fourcc_core::Error::Io(_)) => Failure::FileSystem,
                    ParserError::Extract(_) | ParserError::Config(_) => Failure::Other,
                };
            }
            if let Some(e) = cause.downcast_ref::<QueryError>() {
                return match e {
                    QueryError::Io(_) => Failure::FileSystem,
                    QueryError::Json(_) => Failure::Serialization,
                };
            }
            if let Some(e) = cause.downcast_ref::<fourcc_core::Error>() {
                return match e {
                    fourcc_core::Error::Io(_) => Failure::FileSystem,
                    fourcc_core::Error::Json(_) => Failure::Serialization,
                    _ => Failure::Other,
                };
            }
            if cause.is::<serde_json::Error>() {
                return Failure::Serialization;
            }
            if cause.is::<io::Error>() {
                return Failure::FileSystem;
            }
        }
        Failure::Other
    }

    fn label(self) -> &'static str {
        match self {
            Failure::Preprocessing => "preprocessing failed",
            Failure::FileSystem => "file system error",
            Failure::Serialization => "serialization error",
            Failure::Other => "error",
        }
    }

    fn exit_code(self) -> u8 {
        match self {
            Failure::Preprocessing => 2,
            Failure::FileSystem => 3,
            Failure::Serialization => 4,
            Failure::Other => 1,
        }
    }
}

fn main() -> ExitCode {
    // Logs go to stderr; stdout carries only JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        None => cmd_build(&BuildArgs::default()),
        Some(Commands::Build(args)) => cmd_build(&args),
        Some(Commands::Extract {
            file,
            prefixes,
            pretty,
        }) => cmd_extract(file.as_deref(), &prefixes, pretty),
        Some(Commands::Lookup { db, term }) => cmd_lookup(&db, &term),
        Some(Commands::Describe { db, value }) => cmd_describe(&db, &value),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let failure = Failure::classify(&err);
            eprintln!("{}: {}", failure.label(), report(&err));
            ExitCode::from(failure.exit_code())
        }
    }
}

/// Join the error chain, skipping causes already quoted by their parent
fn report(err: &anyhow::Error) -> String {
    let mut message = String::new();
    let mut parent: Option<String> = None;
    for cause in err.chain() {
        let text = cause.to_string();
        let quoted = parent.as_deref().is_some_and(|p| p.contains(&text));
        if !quoted {
            if !message.is_empty() {
                message.push_str(": ");
            }
            message.push_str(&text);
        }
        parent = Some(text);
    }
    message
}

fn cmd_build(args: &BuildArgs) -> Result<()> {
    let config = args.to_config()?;
    let entries = fourcc_parser::build_database(&config)?;

    emit(&entries, args.output.as_deref(), args.pretty)
}

fn cmd_extract(file: Option<&Path>, prefixes: &[String], pretty: bool) -> Result<()> {
    let text = match file {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?
        }
        None => {
            let mut buf = Vec::new();
            io::stdin().lock().read_to_end(&mut buf).context("reading stdin")?;
            buf
        }
    };

    let prefix_set = if prefixes.is_empty() {
        PrefixSet::default()
    } else {
        PrefixSet::new(prefixes.iter().cloned())
    };
    let extractor = ConstantExtractor::new(&prefix_set).map_err(ParserError::from)?;
    let entries = extractor.extract(&text).map_err(ParserError::from)?;

    emit(&entries, None, pretty)
}

fn cmd_lookup(db_path: &Path, term: &str) -> Result<()> {
    let db = FourCcDatabase::load(db_path)?;
    let matches: Vec<FourCcEntry> = db.entries_matching(term).into_iter().cloned().collect();
    info!("{} of {} entries match {:?}", matches.len(), db.len(), term);

    emit(&matches, None, false)
}

fn cmd_describe(db_path: &Path, value: &str) -> Result<()> {
    let db = FourCcDatabase::load(db_path)?;
    let raw = parse_value(value)?;

    let line = db
        .describe(raw)
        .unwrap_or_else(|| format!("0x{:08x}", raw));
    writeln!(io::stdout().lock(), "{}", line)?;

    Ok(())
}

/// Parse `0x`-hex, decimal, or a four-character literal
fn parse_value(value: &str) -> Result<u32> {
    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16)
            .with_context(|| format!("invalid hex value {:?}", value));
    }
    if let Ok(decimal) = value.parse::<u32>() {
        return Ok(decimal);
    }
    let fcc: FourCc = value
        .parse()
        .with_context(|| format!("{:?} is not a number or a four-character code", value))?;
    Ok(fcc.raw())
}

/// Serialize entries as a JSON array and write them out
fn emit(entries: &[FourCcEntry], output: Option<&Path>, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(entries)?
    } else {
        serde_json::to_string(entries)?
    };

    match output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", json))
                .with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote {} entries to {}", entries.len(), path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json)?;
            stdout.flush()?;
        }
    }

    Ok(())
}
