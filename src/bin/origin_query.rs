//! `origin-query` — offline, read-only inspection of the KV store. Never
//! calls into `origin_kv::write_submission` or `KvStore::put`;
//! opening the store here is purely to read records an already-running
//! daemon committed.

use clap::Parser;
use origin_kv::{list_submissions, read_submission, KvStore};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "origin-query", about = "Inspect the origind form-submission store")]
struct Cli {
    /// Path to the KV store file.
    #[arg(long, default_value = "./origind.kv")]
    store: PathBuf,

    /// List every committed submission id.
    #[arg(short = 'l', long = "list")]
    list: bool,

    /// Show the fields recorded for one submission id.
    #[arg(short = 'i', long = "inspect")]
    inspect: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if !cli.list && cli.inspect.is_none() {
        eprintln!("origin-query: specify -l/--list or -i/--inspect <id>");
        return ExitCode::FAILURE;
    }

    let store = match KvStore::open_read_only(&cli.store) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("origin-query: failed to open {:?}: {e}", cli.store);
            return ExitCode::FAILURE;
        }
    };

    if cli.list {
        for id in list_submissions(&store) {
            println!("{id}");
        }
    }

    if let Some(id) = cli.inspect {
        match read_submission(&store, &id) {
            Ok(Some(fields)) => {
                for (k, v) in fields {
                    println!("{id}.{k} = {v}");
                }
            }
            Ok(None) => {
                eprintln!("origin-query: no committed submission {id}");
                return ExitCode::FAILURE;
            }
            Err(e) => {
                eprintln!("origin-query: read failed: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
