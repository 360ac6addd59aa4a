//! Offline inspection of a SimpleCoin ledger.
//!
//! # Usage
//! ```text
//! simplecoin <config.toml> info
//! simplecoin <config.toml> balance <address>
//! ```
//!
//! Opens the ledger at the config's `db_path` and answers through the same
//! callbacks the consensus engine uses. Never mutates state.

use simplecoin::app::application::{Application, SimpleCoin};
use simplecoin::app::types::RequestQuery;
use simplecoin::config::NodeConfig;
use simplecoin::error;
use simplecoin::storage::rocksdb_ledger::RocksDbLedger;
use simplecoin::utils::log::{Level, set_min_level};
use std::env;
use std::path::Path;
use std::process;

enum Command {
    Info,
    Balance(String),
}

fn parse_command(args: &[String]) -> Option<Command> {
    match args {
        [cmd] if cmd == "info" => Some(Command::Info),
        [cmd, address] if cmd == "balance" => Some(Command::Balance(address.clone())),
        _ => None,
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        process::exit(if args.len() < 2 { 1 } else { 0 });
    }

    let command = match parse_command(&args[2..]) {
        Some(command) => command,
        None => {
            eprintln!("Unexpected arguments: {}\n", args[2..].join(" "));
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    set_min_level(Level::Warn);

    let config = match NodeConfig::load(Path::new(&args[1])) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let ledger = match RocksDbLedger::open(&config.db_path) {
        Ok(ledger) => ledger,
        Err(e) => {
            error!("Failed to open ledger at {}: {e}", config.db_path.display());
            process::exit(1);
        }
    };
    let app = SimpleCoin::new(ledger, config.app_config());

    match command {
        Command::Info => {
            let info = app.info();
            println!("chain_id:  {}", config.chain_id);
            println!("height:    {}", info.last_height);
            println!("app_hash:  {}", info.last_app_hash);
            match config.genesis_supply() {
                Ok(supply) => println!("supply:    {supply}"),
                Err(e) => println!("supply:    unknown ({e})"),
            }
        }
        Command::Balance(address) => {
            let response = app.query(&RequestQuery::balance(&address));
            match response.as_ref().and_then(|r| r.balance()) {
                Some(balance) => println!("{balance}"),
                None => {
                    eprintln!("Invalid address: {address:?}");
                    process::exit(1);
                }
            }
        }
    }
}

const USAGE: &str = "\
SimpleCoin ledger inspector

USAGE:
    {program} <config.toml> <COMMAND>

COMMANDS:
    info                 Print the last committed height, app hash and genesis supply
    balance <address>    Print the committed balance of an address

OPTIONS:
    -h, --help           Print this help message
";

/// Prints usage information to stderr.
fn print_usage(program: &str) {
    eprintln!("{}", USAGE.replace("{program}", program));
}
