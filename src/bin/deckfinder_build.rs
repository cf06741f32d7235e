//! Admin tool: build and publish lookup tables from the deck catalog.
//!
//! ```text
//! deckfinder-build global
//! deckfinder-build user --user-id 12
//! deckfinder-build all-users
//! deckfinder-build set-owned --user-id 12 --decks 3,8,21
//! deckfinder-build custom-lookup --user-id 12 --enabled false
//! deckfinder-build resolve --user-id 12 s=1 d=0 atag=4
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use deckfinder_server::catalog::DeckCatalog;
use deckfinder_server::lookup::{AnswerSet, BuildLimits, Universe};
use deckfinder_server::store::{update_owned_decks, TableStore};

#[derive(Parser)]
#[command(name = "deckfinder-build", about = "Build deck-recommendation lookup tables", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Deck catalog JSON exported from the database
    #[arg(long, global = true, env = "DECKFINDER_CATALOG", default_value = "data/deck_catalog.json")]
    catalog: PathBuf,

    /// Directory the lookup tables are published into
    #[arg(long, global = true, env = "DECKFINDER_TABLE_DIR", default_value = "media/lookup_tables")]
    table_dir: PathBuf,

    /// Reject decks with more attribute tokens than this (at most 32)
    #[arg(long, global = true, env = "DECKFINDER_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Log progress to stderr
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the global table
    Global,

    /// Rebuild one user's table (owned decks excluded)
    User {
        #[arg(long)]
        user_id: u32,
    },

    /// Rebuild every user's table
    AllUsers,

    /// Replace a user's owned decks, then rebuild their table
    SetOwned {
        #[arg(long)]
        user_id: u32,

        /// Comma-separated deck ids; pass `--decks` with no value to clear
        /// the list
        #[arg(long, required = true, value_delimiter = ',', num_args = 0..)]
        decks: Vec<u32>,
    },

    /// Turn a user's custom table on or off for `resolve`
    CustomLookup {
        #[arg(long)]
        user_id: u32,

        #[arg(long, action = clap::ArgAction::Set)]
        enabled: bool,
    },

    /// Resolve answers against a published table and print the status
    Resolve {
        /// Use this user's table unless they opted out or none is
        /// published; the global table otherwise
        #[arg(long)]
        user_id: Option<u32>,

        /// Answer tokens such as `s=1 d=0 atag=4`, in any order
        answers: Vec<String>,
    },
}

fn init_tracing(cli: &Cli) {
    // --verbose shows info (RUST_LOG still wins when set); otherwise only
    // RUST_LOG turns logging on.
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> deckfinder_server::Result<()> {
    let limits = cli.max_tokens.map(BuildLimits::new).unwrap_or_default();
    let store = TableStore::new(&cli.table_dir);

    match cli.command {
        Commands::Global => {
            let catalog = DeckCatalog::load(&cli.catalog)?;
            let path = store.rebuild(&catalog, Universe::Global, &limits)?;
            println!("{}", path.display());
        }
        Commands::User { user_id } => {
            let catalog = DeckCatalog::load(&cli.catalog)?;
            let path = store.rebuild(&catalog, Universe::User(user_id), &limits)?;
            println!("{}", path.display());
        }
        Commands::AllUsers => {
            let catalog = DeckCatalog::load(&cli.catalog)?;
            for path in store.rebuild_all_users(&catalog, &limits)? {
                println!("{}", path.display());
            }
        }
        Commands::SetOwned { user_id, decks } => {
            let path = update_owned_decks(&cli.catalog, &store, user_id, &decks, &limits)?;
            println!("{}", path.display());
        }
        Commands::CustomLookup { user_id, enabled } => {
            let mut catalog = DeckCatalog::load(&cli.catalog)?;
            catalog.set_use_custom_lookup(user_id, enabled)?;
            catalog.save_atomic(&cli.catalog)?;
            println!("user {} custom lookup: {}", user_id, enabled);
        }
        Commands::Resolve { user_id, answers } => {
            let (universe, table) = match user_id {
                Some(_) => store.load_preferred(&DeckCatalog::load(&cli.catalog)?, user_id)?,
                None => store.load_for_user(None)?,
            };
            let answers = AnswerSet::from_tokens(&answers);
            let key = answers.key();
            let status = table.resolve(&key);
            println!(
                "{}",
                json!({
                    "universe": universe.to_string(),
                    "key": key.as_str(),
                    "status": u8::from(status),
                })
            );
        }
    }
    Ok(())
}
