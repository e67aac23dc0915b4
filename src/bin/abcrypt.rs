//! abcrypt CLI - Passphrase-based file encryption
//!
//! Command-line interface for encrypting, decrypting and inspecting files in
//! the abcrypt encrypted data format.

use byte_unit::Byte;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::error::Error as StdError;
use std::ffi::OsString;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

use abcrypt::argon2_context::{Variant, Version};
use abcrypt::error::{AbcryptError, ErrorCategory, ErrorKind, Result};
use abcrypt::file_ops::{self, EncryptOptions};
use abcrypt::params::Params;
use abcrypt::passphrase::{
    EnvPassphraseReader, FilePassphraseReader, PassphraseReader, ReaderPassphraseReader,
    TerminalPassphraseReader,
};

#[derive(Parser)]
#[command(name = "abcrypt")]
#[command(version)]
#[command(about = "Passphrase-based file encryption.", long_about = None)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Generate shell completion to stdout
    #[arg(long, value_enum, value_name = "SHELL", exclusive = true)]
    generate_completion: Option<Shell>,

    /// Read the passphrase from the first line of stdin
    #[arg(
        long,
        global = true,
        conflicts_with_all = [
            "passphrase_from_tty_once",
            "passphrase_from_env",
            "passphrase_from_file",
        ]
    )]
    passphrase_stdin: bool,

    /// Read the passphrase from the terminal without asking for confirmation
    #[arg(
        long,
        global = true,
        conflicts_with_all = ["passphrase_from_env", "passphrase_from_file"]
    )]
    passphrase_from_tty_once: bool,

    /// Read the passphrase from the environment variable
    ///
    /// Note that storing a passphrase in an environment variable can be a
    /// security risk.
    #[arg(
        long,
        value_name = "VAR",
        global = true,
        conflicts_with = "passphrase_from_file"
    )]
    passphrase_from_env: Option<OsString>,

    /// Read the passphrase from the first line of the file
    #[arg(long, value_name = "FILE", global = true)]
    passphrase_from_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Where the passphrase comes from; the terminal if nothing is set.
struct PassphraseSource {
    stdin: bool,
    tty_once: bool,
    env: Option<OsString>,
    file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt files
    #[command(visible_aliases = ["enc", "e"])]
    Encrypt {
        /// Output the result to a file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Set the memory size in KiB
        #[arg(
            short,
            long,
            value_name = "KiB",
            env = "ABCRYPT_MEMORY_COST",
            default_value_t = Params::default().memory_cost()
        )]
        memory_cost: u32,

        /// Set the memory size in bytes, with an optional unit such as KiB or
        /// MiB; overrides --memory-cost
        ///
        /// Sizes that are not a multiple of 1 KiB are truncated.
        #[arg(long, value_name = "BYTE")]
        memory_size: Option<MemorySize>,

        /// Set the number of iterations
        #[arg(
            short = 't',
            long,
            value_name = "NUM",
            env = "ABCRYPT_TIME_COST",
            default_value_t = Params::default().time_cost()
        )]
        time_cost: u32,

        /// Set the degree of parallelism
        #[arg(
            short,
            long,
            value_name = "NUM",
            env = "ABCRYPT_PARALLELISM",
            default_value_t = Params::default().parallelism()
        )]
        parallelism: u32,

        /// Set the Argon2 type
        #[arg(long, value_enum, value_name = "TYPE", default_value_t)]
        argon2_type: Argon2Type,

        /// Set the Argon2 version
        #[arg(long, value_enum, value_name = "VERSION", default_value_t)]
        argon2_version: Argon2Version,

        /// Print the encryption parameters
        #[arg(short, long)]
        verbose: bool,

        /// Input file; stdin if omitted
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Decrypt files
    #[command(visible_aliases = ["dec", "d"])]
    Decrypt {
        /// Output the result to a file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Print the encryption parameters
        #[arg(short, long)]
        verbose: bool,

        /// Input file; stdin if omitted
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Provides information about the encryption parameters
    #[command(visible_aliases = ["info", "i"])]
    Information {
        /// Output the encryption parameters as JSON
        #[arg(short, long)]
        json: bool,

        /// Input file; stdin if omitted
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Detect the Argon2 type and version of an encrypted file
    Argon2 {
        /// Input file; stdin if omitted
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum Argon2Type {
    Argon2d,
    Argon2i,
    #[default]
    Argon2id,
}

impl From<Argon2Type> for Variant {
    fn from(argon2_type: Argon2Type) -> Self {
        match argon2_type {
            Argon2Type::Argon2d => Self::Argon2d,
            Argon2Type::Argon2i => Self::Argon2i,
            Argon2Type::Argon2id => Self::Argon2id,
        }
    }
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum Argon2Version {
    #[value(name = "0x10")]
    V0x10,
    #[default]
    #[value(name = "0x13")]
    V0x13,
}

impl From<Argon2Version> for Version {
    fn from(version: Argon2Version) -> Self {
        match version {
            Argon2Version::V0x10 => Self::V0x10,
            Argon2Version::V0x13 => Self::V0x13,
        }
    }
}

/// Argon2 memory size parsed from a byte count with an optional unit.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct MemorySize(u32);

impl FromStr for MemorySize {
    type Err = String;

    fn from_str(size: &str) -> std::result::Result<Self, Self::Err> {
        let bytes = Byte::parse_str(size, true)
            .map_err(|e| e.to_string())?
            .as_u64();
        u32::try_from(bytes / 1024)
            .ok()
            .filter(|kib| (argon2::Params::MIN_M_COST..=argon2::Params::MAX_M_COST).contains(kib))
            .map(Self)
            .ok_or_else(|| {
                format!(
                    "{size} is not in {}..={}",
                    Self(argon2::Params::MIN_M_COST),
                    Self(argon2::Params::MAX_M_COST)
                )
            })
    }
}

impl fmt::Display for MemorySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} KiB", self.0)
    }
}

fn main() {
    init_logging();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", error_chain(&e));
        process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("ABCRYPT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    if let Some(shell) = cli.generate_completion {
        let mut command = Cli::command();
        let name = command.get_name().to_owned();
        clap_complete::generate(shell, &mut command, name, &mut io::stdout());
        return Ok(());
    }

    let source = PassphraseSource {
        stdin: cli.passphrase_stdin,
        tty_once: cli.passphrase_from_tty_once,
        env: cli.passphrase_from_env,
        file: cli.passphrase_from_file,
    };

    let Some(command) = cli.command else {
        Cli::command()
            .error(
                clap::error::ErrorKind::MissingSubcommand,
                "a subcommand is required",
            )
            .exit();
    };

    match command {
        Commands::Encrypt {
            output,
            memory_cost,
            memory_size,
            time_cost,
            parallelism,
            argon2_type,
            argon2_version,
            verbose,
            input,
        } => {
            let options = EncryptOptions {
                variant: argon2_type.into(),
                version: argon2_version.into(),
                params: Params::from_costs(
                    memory_size.map_or(memory_cost, |size| size.0),
                    time_cost,
                    parallelism,
                )?,
            };
            let mut reader = passphrase_reader(&source, input.as_deref(), true)?;
            if verbose {
                eprintln!("{}", describe_params(&options.params));
            }
            file_ops::encrypt_file(input.as_deref(), output.as_deref(), &options, &mut *reader)
        }
        Commands::Decrypt {
            output,
            verbose,
            input,
        } => {
            let mut reader = passphrase_reader(&source, input.as_deref(), false)?;
            let params = file_ops::decrypt_file(input.as_deref(), output.as_deref(), &mut *reader)?;
            if verbose {
                eprintln!("{}", describe_params(&params));
            }
            Ok(())
        }
        Commands::Information { json, input } => {
            let params = file_ops::read_info(input.as_deref())?;
            if json {
                let output = serde_json::to_string(&params).map_err(|e| {
                    AbcryptError::with_kind_and_source(
                        ErrorCategory::Internal,
                        ErrorKind::General,
                        "could not serialize as JSON",
                        e,
                    )
                })?;
                println!("{output}");
            } else {
                println!("{}", describe_params(&params));
            }
            Ok(())
        }
        Commands::Argon2 { input } => {
            let context = file_ops::read_argon2_context(input.as_deref())?;
            println!("Type: {}", context.variant());
            println!("Version: {}", context.version());
            Ok(())
        }
    }
}

fn passphrase_reader(
    source: &PassphraseSource,
    input: Option<&Path>,
    confirm: bool,
) -> Result<Box<dyn PassphraseReader>> {
    if source.stdin {
        if input.is_none() {
            return Err(AbcryptError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "cannot read both passphrase and input data from stdin",
            ));
        }
        return Ok(Box::new(ReaderPassphraseReader::new(Box::new(
            std::io::stdin(),
        ))));
    }
    if let Some(name) = &source.env {
        return Ok(Box::new(EnvPassphraseReader::new(name.clone())));
    }
    if let Some(path) = &source.file {
        return Ok(Box::new(FilePassphraseReader::new(path.clone())));
    }
    if confirm && !source.tty_once {
        Ok(Box::new(TerminalPassphraseReader::with_confirmation()))
    } else {
        Ok(Box::new(TerminalPassphraseReader::new()))
    }
}

fn describe_params(params: &Params) -> String {
    format!(
        "Parameters used: memoryCost = {}; timeCost = {}; parallelism = {};",
        params.memory_cost(),
        params.time_cost(),
        params.parallelism()
    )
}

/// Renders an error and its sources as `outer: inner: ...`
fn error_chain(err: &AbcryptError) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(e) = source {
        rendered.push_str(": ");
        rendered.push_str(&e.to_string());
        source = e.source();
    }
    rendered
}
