use std::error::Error as _;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use mavl_stress::manifest::Manifest;
use mavl_stress::pretty::pretty_print;
use mavl_stress::profile::get_profile;
use mavl_stress::{StressError, generate_module};

#[derive(Parser)]
#[command(name = "mavl-stress")]
#[command(about = "Generate random, well-typed MAVL programs")]
struct Cli {
    /// Re-indent the program, one statement per line
    #[arg(long)]
    pretty: bool,

    /// Maximum vector and matrix dimension (overrides the profile)
    #[arg(long = "maxdim")]
    max_dimension: Option<usize>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Generation profile: an embedded name or a path to a TOML file
    #[arg(long, default_value = "default")]
    profile: String,

    /// Write the program to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write a JSON record of the run to this file
    #[arg(long)]
    manifest: Option<PathBuf>,
}

fn main() -> ExitCode {
    // Initialize tracing if MAVL_LOG is set; stdout stays the program.
    if let Ok(filter) = EnvFilter::try_from_env("MAVL_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .without_time()
            .with_writer(io::stderr)
            .init();
    }

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let mut message = e.to_string();
            let mut source = e.source();
            while let Some(cause) = source {
                message.push_str(&format!(": {cause}"));
                source = cause.source();
            }
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), StressError> {
    let mut profile = get_profile(&cli.profile)?;
    if let Some(max_dimension) = cli.max_dimension {
        profile.max_dimension = max_dimension;
        profile
            .validate()
            .map_err(|reason| StressError::InvalidProfile {
                name: cli.profile.clone(),
                reason,
            })?;
    }

    // Determine seed - use provided or generate from current time
    let seed = cli.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
    });
    eprintln!("mavl-stress: seed {seed}, profile {}", cli.profile);

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let program = generate_module(&mut rng, &profile);
    let program = if cli.pretty {
        pretty_print(&program)
    } else {
        program
    };

    match &cli.output {
        Some(path) => fs::write(path, &program).map_err(|source| StressError::Write {
            path: path.clone(),
            source,
        })?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(program.as_bytes())
                .and_then(|()| stdout.write_all(b"\n"))
                .map_err(|source| StressError::Write {
                    path: PathBuf::from("<stdout>"),
                    source,
                })?;
        }
    }

    if let Some(path) = &cli.manifest {
        Manifest::new(seed, cli.profile.clone(), &profile).write_to(path)?;
    }
    Ok(())
}
