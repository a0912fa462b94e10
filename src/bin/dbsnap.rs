use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use dbsnap::{
    Config, ConnectOptions, Error, History, HistoryOptions, LogOptions, PgOptions, PgStore,
    PurgeMode, RevertTarget, Revision,
};

#[derive(Parser)]
#[command(name = "dbsnap", version, about = "PostgreSQL snapshot versioning tool")]
struct Cli {
    /// State file holding the current database and connection settings
    #[arg(long, global = true, env = "DBSNAP_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for the advisory lock serializing writers
    #[arg(long, global = true, env = "DBSNAP_LOCK_DIR")]
    lock_dir: Option<PathBuf>,

    /// Log every step (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Default)]
struct ConnectArgs {
    #[arg(long, env = "PGHOST")]
    host: Option<String>,
    #[arg(long, env = "PGPORT")]
    port: Option<u16>,
    #[arg(long, env = "PGUSER")]
    user: Option<String>,
    #[arg(long, env = "PGPASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Select the database to work on and start its history
    Init {
        db: String,
        #[command(flatten)]
        connect: ConnectArgs,
    },
    /// Save the current database as a new revision
    Commit {
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Show the revision of the current database
    Info,
    /// Drop the current database and clone it from another revision
    Revert {
        /// Revision to revert to (default: the parent)
        revision: Option<u64>,
        #[arg(short, long, conflicts_with = "revision")]
        tag: Option<String>,
    },
    /// List revisions
    Log {
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Oldest first
        #[arg(short, long)]
        reverse: bool,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show revisions as a branch graph
    Glog {
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// List, add or delete tags
    Tag {
        name: Option<String>,
        revision: Option<u64>,
        #[arg(short, long, requires = "name")]
        delete: bool,
    },
    /// Destroy archived revisions
    Purge {
        #[arg(value_parser = ["all", "keeptags"])]
        what: String,
        /// Destroy without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Drop the current database itself
    Drop {
        #[arg(short, long)]
        yes: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("dbsnap: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> dbsnap::Result<()> {
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()
            .ok_or_else(|| Error::not_found("HOME is not set, pass --config"))?,
    };
    let mut config = Config::load(&config_path)?;
    let options = HistoryOptions {
        lock_dir: cli.lock_dir,
        ..Default::default()
    };

    match cli.command {
        Command::Init { db, connect } => {
            config.head = Some(db);
            config.connection = ConnectOptions {
                host: connect.host,
                port: connect.port,
                user: connect.user,
                password: connect.password,
            };
            let history = open(&config, options)?;
            let id = history.ensure_initialized()?;
            config.save(&config_path)?;
            println!("Now revision {}", id);
            Ok(())
        }
        command => {
            let history = open(&config, options)?;
            dispatch(&history, command)
        }
    }
}

fn dispatch(history: &History<PgStore>, command: Command) -> dbsnap::Result<()> {
    match command {
        Command::Init { .. } => return Err(Error::already_initialized(history.head())),
        Command::Commit { message } => {
            history.commit(message.as_deref())?;
            println!("Now revision {}", history.id()?);
        }
        Command::Info => {
            let rev = history.info()?;
            println!("database: {}", history.head());
            println!("revision: {} (parent: {})", rev.id, rev.parent);
            if let Some(tag) = rev.tag {
                println!("tag: {}", tag);
            }
        }
        Command::Revert { revision, tag } => {
            let target = match (revision, tag) {
                (Some(id), _) => RevertTarget::Revision(id),
                (None, Some(tag)) => RevertTarget::Tag(tag),
                (None, None) => RevertTarget::Parent,
            };
            let parent = history.revert(target)?;
            println!("Reverted to parent {}, now at revision {}", parent, history.id()?);
        }
        Command::Log {
            limit,
            reverse,
            json,
        } => {
            let revs = history.log(LogOptions {
                limit,
                newest_first: !reverse,
            })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&revs)?);
            } else {
                for rev in &revs {
                    print_revision(rev);
                }
            }
        }
        Command::Glog { limit } => {
            for line in history.glog(limit)? {
                println!("{}", line);
            }
        }
        Command::Tag {
            name,
            revision,
            delete,
        } => match name {
            None => {
                for tagged in history.tags().list()? {
                    println!("{}\t{}", tagged.tag, tagged.container);
                }
            }
            Some(name) if delete => {
                if !history.tags().delete(&name)? {
                    println!("No such tag: {}", name);
                }
            }
            Some(name) => history.tags().set(&name, revision)?,
        },
        Command::Purge { what, yes } => {
            let mode: PurgeMode = what.parse()?;
            let candidates = history.purge(mode, false)?;
            if candidates.is_empty() {
                println!("Nothing to purge");
                return Ok(());
            }
            let names: Vec<&str> = candidates.iter().map(|r| r.container.as_str()).collect();
            println!("Dropping these databases: {}", names.join(", "));
            if yes || confirm()? {
                history.purge(mode, true)?;
                println!("Purged");
            } else {
                println!("Cancelled");
            }
        }
        Command::Drop { yes } => {
            println!("Dropping database {}", history.head());
            if yes || confirm()? {
                history.destroy()?;
                println!("Dropped");
            } else {
                println!("Cancelled");
            }
        }
    }
    Ok(())
}

fn open(config: &Config, options: HistoryOptions) -> dbsnap::Result<History<PgStore>> {
    let store = PgStore::new(PgOptions {
        connect: config.connection.clone(),
        ..Default::default()
    });
    History::open(store, config.require_head()?, options)
}

fn print_revision(rev: &Revision) {
    println!("{}:", rev.container);
    println!("\trevision: {}", rev.id);
    println!("\tparent: {}", rev.parent);
    if let Some(ref tag) = rev.tag {
        println!("\ttag: {}", tag);
    }
    if let Some(ref message) = rev.message {
        println!("\tmessage: {}", message);
    }
}

fn confirm() -> dbsnap::Result<bool> {
    print!("Confirm? y[N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}
