use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use shufflecli::{cli, config, error, shuffle::ShuffleOptions, warning};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
  args_conflicts_with_subcommands = true // shuffle flags only apply without a subcommand
)]
struct Cli {
    /// Playlist ID to shuffle (defaults to SHUFFLE_PLAYLIST_ID)
    #[clap(short, long)]
    playlist: Option<String>,

    /// Seed for a reproducible order
    #[clap(long)]
    seed: Option<u64>,

    /// Let popular tracks tend to come first
    #[clap(long)]
    weighted: bool,

    /// Minimum distance between tracks of the same artist (0 disables)
    #[clap(long, default_value_t = 0)]
    min_artist_gap: usize,

    /// Shuffle and preview without writing the playlist
    #[clap(long)]
    dry_run: bool,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth,

    /// Remove the stored token
    Logout,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        warning!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Command::Auth) => cli::auth().await,
        Some(Command::Logout) => cli::logout().await,
        Some(Command::Completions(opt)) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
        None => {
            let options = ShuffleOptions {
                seed: cli.seed,
                weighted: cli.weighted,
                min_artist_gap: cli.min_artist_gap,
            };
            cli::shuffle(cli.playlist, options, cli.dry_run).await
        }
    };

    if let Err(e) = result {
        error!("{}", e);
    }
}
