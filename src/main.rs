use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pepperbox::{
    CredentialHasher, Credentials, DerivationLimiter, EnvPepperSource, FilePepperSource,
    FileStore, KdfParams, MemoryStore, PepperSource, StoreError, UserStore, default_store_path,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod auth;

#[derive(Debug, clap::Args)]
struct Argon2Args {
    /// Argon2 memory cost in KiB (default: 65536)
    #[arg(long = "argon-mem", global = true)]
    mem_cost_kib: Option<u32>,

    /// Argon2 time cost / iterations (default: 1)
    #[arg(long = "argon-time", global = true)]
    time_cost: Option<u32>,

    /// Argon2 parallelism (default: 4)
    #[arg(long = "argon-parallelism", global = true)]
    parallelism: Option<u32>,

    /// Digest length in bytes (default: 32)
    #[arg(long = "argon-output-len", global = true)]
    output_len: Option<u32>,
}

impl Argon2Args {
    fn to_kdf_params(&self) -> Result<KdfParams> {
        let default = KdfParams::default();

        Ok(KdfParams::new(
            self.mem_cost_kib.unwrap_or(default.mem_cost_kib()),
            self.time_cost.unwrap_or(default.time_cost()),
            self.parallelism.unwrap_or(default.parallelism()),
            self.output_len.unwrap_or(default.output_len() as u32),
        )?)
    }
}

#[derive(Debug, Parser)]
#[command(name = "pepperbox")]
#[command(
    version,
    about = "Salted, peppered Argon2id password registration and verification."
)]
struct Cli {
    /// Path to the credential store file
    #[arg(long, global = true, value_name = "PATH", env = "PEPPERBOX_STORE")]
    store: Option<PathBuf>,

    /// Read the pepper from this file instead of PEPPERBOX_PEPPER
    #[arg(long, global = true, value_name = "PATH", env = "PEPPERBOX_PEPPER_FILE")]
    pepper_file: Option<PathBuf>,

    /// Upper bound on simultaneous key derivations (default: CPU count)
    #[arg(long, global = true, env = "PEPPERBOX_MAX_DERIVATIONS")]
    max_derivations: Option<usize>,

    #[command(flatten)]
    argon2: Argon2Args,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Registers a new user
    #[command(arg_required_else_help = true)]
    Register { user: String },

    /// Checks a user's password
    #[command(arg_required_else_help = true)]
    Login { user: String },

    /// Changes a user's password
    #[command(arg_required_else_help = true)]
    Passwd { user: String },

    /// Shows the derivation parameters in effect
    Params,

    /// Walks through registration and login against an in-memory store
    Demo,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let params = args
        .argon2
        .to_kdf_params()
        .context("invalid Argon2 parameters")?;
    let limiter = match args.max_derivations {
        Some(max) => DerivationLimiter::new(max),
        None => DerivationLimiter::default(),
    };

    let code = match args.command {
        Commands::Params => {
            println!("memory cost:      {} KiB", params.mem_cost_kib());
            println!("time cost:        {}", params.time_cost());
            println!("parallelism:      {}", params.parallelism());
            println!("digest length:    {} bytes", params.output_len());
            println!("max derivations:  {}", limiter.max());
            ExitCode::SUCCESS
        }
        Commands::Demo => {
            let hasher = build_hasher(args.pepper_file, params)?;
            let creds = Credentials::new(hasher, MemoryStore::new()).with_limiter(limiter);
            demo(&creds);
            ExitCode::SUCCESS
        }
        Commands::Register { user } => {
            let creds = open(args.store, args.pepper_file, params, limiter)?;
            let password = auth::read_new_password(auth::PASSWORD_ENV)?;
            match creds.register(&user, password.as_bytes()) {
                Ok(()) => {
                    println!("registered '{user}'");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::debug!(error = %e, "registration failed");
                    eprintln!("registration failed");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Login { user } => {
            let creds = open(args.store, args.pepper_file, params, limiter)?;
            let password = auth::read_password(auth::PASSWORD_ENV, "Password: ")?;
            if creds.authenticate(&user, password.as_bytes()) {
                println!("authenticated");
                ExitCode::SUCCESS
            } else {
                println!("authentication failed");
                ExitCode::FAILURE
            }
        }
        Commands::Passwd { user } => {
            let creds = open(args.store, args.pepper_file, params, limiter)?;
            let current = auth::read_password(auth::PASSWORD_ENV, "Current password: ")?;
            let new = auth::read_new_password(auth::NEW_PASSWORD_ENV)?;
            match creds.change_password(&user, current.as_bytes(), new.as_bytes()) {
                Ok(()) => {
                    println!("password changed");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::debug!(error = %e, "password change failed");
                    eprintln!("password change failed");
                    ExitCode::FAILURE
                }
            }
        }
    };

    Ok(code)
}

fn open(
    store: Option<PathBuf>,
    pepper_file: Option<PathBuf>,
    params: KdfParams,
    limiter: DerivationLimiter,
) -> Result<Credentials<FileStore>> {
    let path = match store {
        Some(p) => p,
        None => default_store_path()?,
    };
    let hasher = build_hasher(pepper_file, params)?;
    Ok(Credentials::new(hasher, FileStore::new(path)).with_limiter(limiter))
}

/// Load the pepper once and build the hasher; failure aborts startup.
fn build_hasher(pepper_file: Option<PathBuf>, params: KdfParams) -> Result<CredentialHasher> {
    let pepper = match pepper_file {
        Some(path) => FilePepperSource::new(path).load(),
        None => EnvPepperSource::default().load(),
    }
    .context("failed to load pepper")?;

    Ok(CredentialHasher::new(pepper, params)?)
}

fn demo(creds: &Credentials<MemoryStore>) {
    println!("Simulating user registration:");
    match creds.register("john_doe", b"my-super-secret-password-123") {
        Ok(()) => println!("\tRegistration succeeded."),
        Err(_) => println!("\tRegistration failed."),
    }

    if let Ok(record) = creds.store().load("john_doe") {
        println!(
            "\tStored salt: {} bytes, digest: {} bytes",
            record.salt().as_bytes().len(),
            record.digest().len()
        );
    }

    let attempts: [(&str, &str, &str); 3] = [
        (
            "successful authentication",
            "john_doe",
            "my-super-secret-password-123",
        ),
        (
            "failed authentication with wrong password",
            "john_doe",
            "wrong-password",
        ),
        (
            "authentication for non-existent user",
            "jane_doe",
            "some-password",
        ),
    ];

    for (label, user, password) in attempts {
        println!("\nSimulating {label}:");
        if creds.authenticate(user, password.as_bytes()) {
            println!("\tAuthentication succeeded.");
        } else {
            println!("\tAuthentication failed.");
        }
    }

    if let Err(StoreError::NotFound(user)) = creds.store().load("jane_doe") {
        println!("\n(store reports no record for '{user}')");
    }
}
