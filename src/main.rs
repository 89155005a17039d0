//! seqstore - Binary Entry Point
//!
//! Inspect and maintain the files of one session's message store.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::error;
use tracing_subscriber::EnvFilter;

use seqstore::utils::encode_timestamp;
use seqstore::{FileStore, FileStoreConfig, MessageStore, SessionId, StoreError, StoreResult};

#[derive(Parser)]
#[command(name = "seqstore", version, about = "Inspect and maintain a session message store")]
struct Cli {
    /// Store directory (default: $SEQSTORE_PATH, then ./store)
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Session, e.g. "FIX.4.4:SENDER->TARGET"
    #[arg(long)]
    session: SessionId,

    /// Skip fsync after writes
    #[arg(long)]
    no_sync: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print counters, creation time and file sizes as JSON.
    Info,

    /// Print saved messages in a sequence number range, one per line.
    Replay {
        #[arg(long, default_value_t = 1)]
        begin: u64,

        #[arg(long, default_value_t = u64::MAX)]
        end: u64,

        /// Write payloads unmodified instead of showing SOH as '|'.
        #[arg(long)]
        raw: bool,
    },

    /// Overwrite the next sender and/or target sequence number.
    SetSeq {
        #[arg(long)]
        sender: Option<u64>,

        #[arg(long)]
        target: Option<u64>,
    },

    /// Delete all messages, reset both counters to 1 and start a new epoch.
    Reset,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> StoreResult<()> {
    let mut config = match cli.dir {
        Some(dir) => FileStoreConfig::from_env()?.with_path(dir),
        None => FileStoreConfig::from_env()?,
    };
    if cli.no_sync {
        config = config.with_sync(false);
    }

    let store = FileStore::open(cli.session, config)?;

    match cli.command {
        Command::Info => print_info(&store)?,
        Command::Replay { begin, end, raw } => replay(&store, begin, end, raw)?,
        Command::SetSeq { sender, target } => {
            if let Some(sender) = sender {
                store.set_next_sender_msg_seq_num(sender)?;
            }
            if let Some(target) = target {
                store.set_next_target_msg_seq_num(target)?;
            }
        }
        Command::Reset => store.reset()?,
    }

    store.close()
}

fn print_info(store: &FileStore) -> StoreResult<()> {
    let mut files = serde_json::Map::new();
    for (suffix, path) in store.paths().entries() {
        let size = fs::metadata(path)
            .map_err(|source| StoreError::io("reading metadata of", path, source))?
            .len();
        files.insert(suffix.to_string(), json!({ "path": path.display().to_string(), "size": size }));
    }

    let info = json!({
        "session": store.session_id().to_string(),
        "creationTime": encode_timestamp(&store.creation_time()),
        "nextSenderMsgSeqNum": store.next_sender_msg_seq_num(),
        "nextTargetMsgSeqNum": store.next_target_msg_seq_num(),
        "files": files,
    });

    let text = serde_json::to_string_pretty(&info)?;
    println!("{}", text);
    Ok(())
}

fn replay(store: &FileStore, begin: u64, end: u64, raw: bool) -> StoreResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    store.iterate_messages(begin, end, &mut |msg: &[u8]| {
        let written = if raw {
            out.write_all(msg).and_then(|()| out.write_all(b"\n"))
        } else {
            let text = String::from_utf8_lossy(msg).replace('\x01', "|");
            writeln!(out, "{}", text)
        };
        written.map_err(|source| StoreError::io("writing to", "stdout", source))
    })?;

    out.flush()
        .map_err(|source| StoreError::io("flushing", "stdout", source))
}
