//! Statlab CLI - Football statistics tables as previews and CSV
//!
//! # Main Commands
//!
//! ```bash
//! statlab serve                                  # Start HTTP server (port 5050)
//! statlab fetch -l epl -s 2324 -d team -t shooting
//! statlab fetch -d schedule --teams Arsenal --preview
//! statlab normalize recorded.json --teams Chelsea
//! ```
//!
//! # Catalog Commands
//!
//! ```bash
//! statlab leagues                  # Supported leagues
//! statlab seasons                  # Suggested seasons
//! statlab stats -d player          # Stat subtypes of a category
//! statlab teams -l laliga -s 2324  # Teams of a league season
//! ```
//!
//! The statistics source comes from `STATLAB_SOURCE_URL` / `STATLAB_FIXTURE_DIR`
//! or from `--source-url` / `--fixtures`.

use clap::{Parser, Subcommand};
use statlab::{
    catalog, logging, normalize_and_filter, preview, to_csv, Category, Config, FetchRequest,
    RawTable, DEFAULT_PREVIEW_ROWS,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "statlab")]
#[command(about = "Fetch football statistics tables as previews or CSV", long_about = None)]
struct Cli {
    /// Base URL of the statistics table service
    #[arg(long, global = true)]
    source_url: Option<String>,

    /// Directory of recorded tables to use instead of a service
    #[arg(long, global = true)]
    fixtures: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a table and write it as CSV (or print a preview)
    Fetch {
        /// League keys
        #[arg(short, long, num_args = 1.., default_value = "epl")]
        leagues: Vec<String>,

        /// Seasons, e.g. 2324
        #[arg(short, long, num_args = 1.., default_value = "2324")]
        seasons: Vec<String>,

        /// Data category: team, player, schedule, player_match
        #[arg(short, long, default_value = "team")]
        data: String,

        /// Stat subtype (category default if omitted)
        #[arg(short = 't', long)]
        stat: Option<String>,

        /// Only keep rows for these teams
        #[arg(long, num_args = 1..)]
        teams: Vec<String>,

        /// Print a JSON preview instead of writing CSV
        #[arg(long)]
        preview: bool,

        /// Preview rows
        #[arg(long)]
        limit: Option<usize>,

        /// Output file (default: generated name under --output-dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for generated file names
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
    },

    /// Normalize a recorded raw table offline
    Normalize {
        /// RawTable JSON file
        input: PathBuf,

        /// Only keep rows for these teams
        #[arg(long, num_args = 1..)]
        teams: Vec<String>,

        /// Print a JSON preview instead of CSV
        #[arg(long)]
        preview: bool,

        /// Preview rows
        #[arg(long, default_value_t = DEFAULT_PREVIEW_ROWS)]
        limit: usize,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the teams of a league season
    Teams {
        #[arg(short, long, default_value = "epl")]
        league: String,

        #[arg(short, long, default_value = "2324")]
        season: String,
    },

    /// List supported leagues
    Leagues,

    /// List suggested seasons
    Seasons,

    /// List stat subtypes of a category
    Stats {
        #[arg(short, long, default_value = "team")]
        data: String,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: PORT or 5050)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match load_config(&cli) {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<Config, statlab::ConfigError> {
    let mut config = Config::from_env()?;
    if let Some(dir) = &cli.fixtures {
        config = config.with_fixture_dir(dir.clone());
    }
    if let Some(url) = &cli.source_url {
        config = config.with_source_url(url.clone());
    }
    Ok(config)
}

async fn run(command: Commands, config: Config) -> CliResult {
    match command {
        Commands::Fetch {
            leagues,
            seasons,
            data,
            stat,
            teams,
            preview,
            limit,
            output,
            output_dir,
        } => {
            let request = FetchRequest {
                leagues,
                seasons,
                data_type: data,
                stat_type: stat,
                teams,
            };
            if preview {
                cmd_preview(&config, &request, limit).await
            } else {
                cmd_fetch(&config, &request, output.as_deref(), &output_dir).await
            }
        }

        Commands::Normalize {
            input,
            teams,
            preview,
            limit,
            output,
        } => cmd_normalize(&input, &teams, preview, limit, output.as_deref()),

        Commands::Teams { league, season } => cmd_teams(&config, &league, &season).await,

        Commands::Leagues => print_json(&catalog::leagues()),

        Commands::Seasons => print_json(&catalog::SEASONS),

        Commands::Stats { data } => {
            let category: Category = data.parse()?;
            print_json(&catalog::stat_options(category))
        }

        Commands::Serve { port } => {
            let config = match port {
                Some(port) => Config { port, ..config },
                None => config,
            };
            statlab::server::start_server(config).await?;
            Ok(())
        }
    }
}

async fn cmd_preview(config: &Config, request: &FetchRequest, limit: Option<usize>) -> CliResult {
    let pipeline = config.build_pipeline()?;
    let output = pipeline.preview(request, limit).await?;
    eprintln!(
        "{} rows x {} columns",
        output.preview.row_count, output.preview.column_count
    );
    print_json(&output.preview)
}

async fn cmd_fetch(
    config: &Config,
    request: &FetchRequest,
    output: Option<&Path>,
    output_dir: &Path,
) -> CliResult {
    let pipeline = config.build_pipeline()?;
    let export = pipeline.export(request).await?;

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => {
            fs::create_dir_all(output_dir)?;
            output_dir.join(&export.filename)
        }
    };
    fs::write(&path, &export.bytes)?;
    eprintln!("Wrote {} rows to {}", export.row_count, path.display());
    Ok(())
}

fn cmd_normalize(
    input: &Path,
    teams: &[String],
    show_preview: bool,
    limit: usize,
    output: Option<&Path>,
) -> CliResult {
    let content = fs::read_to_string(input)?;
    let raw: RawTable = serde_json::from_str(&content)?;
    let table = normalize_and_filter(&raw, teams)?;
    eprintln!(
        "{} rows x {} columns",
        table.row_count(),
        table.column_count()
    );

    let bytes = if show_preview {
        serde_json::to_vec_pretty(&preview(&table, limit))?
    } else {
        to_csv(&table)?
    };
    write_output(&bytes, output)
}

async fn cmd_teams(config: &Config, league: &str, season: &str) -> CliResult {
    let pipeline = config.build_pipeline()?;
    for team in pipeline.teams(league, season).await? {
        println!("{}", team);
    }
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_output(content: &[u8], path: Option<&Path>) -> CliResult {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("Output written to: {}", p.display());
        }
        None => {
            use std::io::Write;
            std::io::stdout().write_all(content)?;
        }
    }
    Ok(())
}
