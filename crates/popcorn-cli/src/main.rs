use clap::{ArgAction, Parser, Subcommand};
use commands::{config, interactive, search, show, watched};
use popcorn_config::{Config, PathManager};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "popcorn")]
#[command(about = "popcorn - Find movies and keep track of the ones you watched")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search OMDb by title
    #[command(long_about = "Search OMDb for movies whose title matches QUERY. Queries shorter than three characters are not sent.")]
    Search {
        /// Title to search for
        query: String,
    },
    /// Show one movie, optionally rating it as watched
    #[command(long_about = "Load the full OMDb record for an IMDb id. With --rate, the movie is added to your watched list with that rating.")]
    Show {
        /// IMDb id, e.g. tt1375666
        imdb_id: String,

        /// Add to watched with this rating (1-10)
        #[arg(long, value_name = "N")]
        rate: Option<u8>,
    },
    /// Manage the watched list
    Watched {
        #[command(subcommand)]
        cmd: WatchedCommands,
    },
    /// View or change configuration
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
    /// Interactive search session (default)
    #[command(long_about = "Start a line-driven session. Type a title to search, then use :open N to see a movie, :rate N and :add to record it. Type :help for all commands.")]
    Interactive,
}

#[derive(Subcommand)]
enum WatchedCommands {
    /// List watched movies
    List,
    /// Averages over the watched list
    Summary,
    /// Remove a movie from the watched list
    Remove {
        imdb_id: String,
    },
    /// Remove every movie from the watched list
    Clear {
        /// Don't ask for confirmation
        #[arg(long, action = ArgAction::SetTrue)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration (masks the API key)
    Show {
        /// Show the API key unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Set the OMDb API key
    ApiKey {
        /// API key (if not provided, will prompt)
        #[arg(long)]
        key: Option<String>,
    },
    /// Show where popcorn keeps its files
    Path,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Interactive);

    // Only the interactive session logs to a file, and only when asked to
    let log_file = match command {
        Commands::Interactive => {
            let paths = PathManager::default();
            Config::load_or_default(&paths.config_file())
                .ok()
                .filter(|c| c.ui.log_to_file)
                .map(|_| paths.log_file())
        }
        _ => None,
    };
    logging::init_logging(cli.verbose, cli.quiet, log_file.as_deref())
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);

    match command {
        Commands::Search { query } => search::run_search(query, &output).await,
        Commands::Show { imdb_id, rate } => show::run_show(imdb_id, rate, &output).await,
        Commands::Watched { cmd } => watched::run_watched(cmd, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, &output).await,
        Commands::Interactive => interactive::run_interactive(&output).await,
    }
}
