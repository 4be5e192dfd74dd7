use anyhow::{bail, Context};
use casegen_core::constants::MAX_CASE_DURATION_MINUTES;
use casegen_core::{
    inspect_message, parse_anchor, resolve_schedule_with, CaseRequest, CaseService, CoreConfig,
    EventProfile, MessageKind, RandomJitter,
};
use casegen_files::OutputWriter;
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CONFIG_ENV: &str = "CASEGEN_CONFIG";
const OUTPUT_DIR_ENV: &str = "CASEGEN_OUTPUT_DIR";

#[derive(Parser)]
#[command(name = "casegen")]
#[command(about = "Synthetic HL7 surgical case message generator")]
struct Cli {
    /// YAML configuration file (defaults to $CASEGEN_CONFIG, then built-in settings)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate and write every message for a case
    Generate {
        /// Case description (YAML)
        #[arg(long)]
        case: PathBuf,
        /// Override the message set named in the case file
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        /// Output root (defaults to $CASEGEN_OUTPUT_DIR, then the current directory)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Seed for jitter and duration fallback
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the live-preview text for a case
    Preview {
        /// Case description (YAML)
        #[arg(long)]
        case: PathBuf,
    },
    /// Print resolved event times for an anchor and duration
    Schedule {
        /// Scheduled date (YYYYMMDD)
        #[arg(long)]
        date: String,
        /// Setup time (HHMM, HHMMSS, HH:MM or HH:MM:SS)
        #[arg(long)]
        time: String,
        /// Case duration in minutes
        #[arg(long)]
        duration: i64,
        /// Seed for jitter
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the fields recovered from an existing message
    Inspect {
        /// Message file
        file: PathBuf,
    },
    /// List the built-in event profiles
    Profiles,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    /// S12 scheduling message only
    Scheduled,
    /// S12 plus one S14 per clinical event
    Events,
    /// S12 plus an S15 cancellation
    Canceled,
}

impl From<KindArg> for MessageKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Scheduled => MessageKind::Scheduled,
            KindArg::Events => MessageKind::ScheduledAndCaseEvents,
            KindArg::Canceled => MessageKind::ScheduledAndCanceled,
        }
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("casegen=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Generate {
            case,
            kind,
            output_dir,
            seed,
        } => {
            let mut request = read_case(&case)?;
            if let Some(kind) = kind {
                request.kind = kind.into();
            }

            let service = CaseService::new(config);
            let output = service.generate(&request, &mut rng(seed))?;

            let output_dir = output_dir
                .or_else(|| std::env::var_os(OUTPUT_DIR_ENV).map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("."));
            std::fs::create_dir_all(&output_dir)
                .with_context(|| format!("creating output root {}", output_dir.display()))?;

            let writer = OutputWriter::new(&output_dir)?;
            let written = writer.write_case(
                chrono::Local::now().date_naive(),
                request.values.get_present("patientFirstName"),
                request.values.get_present("patientLastName"),
                &output.messages,
            )?;
            for path in written {
                println!("{}", path.display());
            }
        }
        Commands::Preview { case } => {
            let request = read_case(&case)?;
            println!("{}", CaseService::new(config).preview(&request)?);
        }
        Commands::Schedule {
            date,
            time,
            duration,
            seed,
        } => {
            if !(1..=MAX_CASE_DURATION_MINUTES).contains(&duration) {
                bail!("duration must be between 1 and {MAX_CASE_DURATION_MINUTES} minutes");
            }
            let Some(anchor) = parse_anchor(Some(date.as_str()), Some(time.as_str())) else {
                bail!("could not read anchor from date '{date}' and time '{time}'");
            };

            let mut jitter = RandomJitter::new(rng(seed), config.jitter_minutes());
            let Some(schedule) = resolve_schedule_with(
                anchor,
                duration,
                config.event_table(),
                &mut jitter,
                config.ordering(),
            ) else {
                bail!("event times for anchor {anchor} fall outside the supported date range");
            };
            for row in config.event_table().rows() {
                if let Some(time) = schedule.get(&row.name) {
                    println!("{:<14} {}  ({})", row.name, time.format("%Y-%m-%d %H:%M"), row.offset);
                }
            }
        }
        Commands::Inspect { file } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading message {}", file.display()))?;
            let values = inspect_message(&text);
            if values.is_empty() {
                println!("No fields recovered.");
            }
            for (token, value) in values.iter() {
                println!("{token} = {value}");
            }
        }
        Commands::Profiles => {
            for profile in EventProfile::ALL {
                println!("{}:", profile.name());
                for row in profile.table().rows() {
                    println!("  {:<14} {}", row.name, row.offset);
                }
            }
        }
    }

    Ok(())
}

/// Resolve configuration once: `--config`, then `$CASEGEN_CONFIG`, then built-in defaults.
fn load_config(flag: Option<PathBuf>) -> anyhow::Result<CoreConfig> {
    let path = flag.or_else(|| {
        std::env::var(CONFIG_ENV)
            .ok()
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    });

    match path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading configuration");
            CoreConfig::load(&path).with_context(|| format!("loading config {}", path.display()))
        }
        None => Ok(CoreConfig::default()),
    }
}

fn read_case(path: &Path) -> anyhow::Result<CaseRequest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading case file {}", path.display()))?;
    CaseRequest::parse_yaml(&text).with_context(|| format!("parsing case file {}", path.display()))
}

fn rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
