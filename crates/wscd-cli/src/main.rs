//! `wscd` prints the directory a short query resolves to, for a shell function
//! to `cd` into:
//!
//! ```sh
//! wcd() { dir="$(wscd "$@")" && cd "$dir"; }
//! ```

use clap::Parser;
use mimalloc::MiMalloc;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use wscd_core::path_utils::{canonicalize, vendor_parent};
use wscd_core::{
    Config, DepthLimit, DirectoryIndex, Error, HealthReport, RankedMatch, ResultHistory, Resolver,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const VENDOR_PARENT_TOKEN: &str = "^";

const EXIT_NO_MATCH: u8 = 1;
const EXIT_AMBIGUOUS: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "wscd")]
#[command(about = "Resolve a short package name to a directory in your workspace", long_about = None)]
#[command(version)]
struct Args {
    /// Package query: a directory name, a trailing path like `user/repo`, a path
    /// relative to the root, an absolute path, or `^` for the parent of the
    /// enclosing vendor directory. Without a query the root is printed.
    query: Option<String>,

    /// Pick the Nth (1-based) match. Without a query, picks from the last ambiguous result
    #[arg(short = 'n', long = "pick")]
    pick: Option<usize>,

    /// Maximum walk depth below the root, -1 for unlimited
    #[arg(long, allow_hyphen_values = true)]
    depth: Option<i64>,

    /// Workspace root, defaults to the config file, then $GOPATH/src, then ~/go/src
    #[arg(long, env = "WSCD_ROOT")]
    root: Option<PathBuf>,

    /// Path to the config file
    #[arg(long, env = "WSCD_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `wscd_core=trace`
    #[arg(long, env = "WSCD_LOG")]
    log_level: Option<String>,

    /// Print index and history statistics and exit
    #[arg(long)]
    health: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    wscd_core::log::install_panic_hook();

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("wscd: {e}");
            return ExitCode::FAILURE;
        }
    };

    let log_level = args.log_level.as_deref().or(config.log_level.as_deref());
    let _guard = match wscd_core::log::init_tracing(config.log_file.as_deref(), log_level) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("wscd: {e}");
            None
        }
    };

    match run(&args, &config) {
        Ok(code) => code,
        Err(Error::NoMatch(query)) => {
            tracing::debug!(?query, "Nothing matched");
            eprintln!("no matching package found");
            ExitCode::from(EXIT_NO_MATCH)
        }
        Err(e) => {
            tracing::error!(error = %e, "Resolution failed");
            eprintln!("wscd: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, config: &Config) -> Result<ExitCode, Error> {
    let root = config.resolve_root(args.root.as_deref())?;
    // a symlinked root must map to the same history key and print real paths
    let root = canonicalize(&root).unwrap_or(root);

    if args.health {
        print_health(&root, config)?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(query) = args.query.as_deref() else {
        match args.pick {
            Some(position) => {
                let history = ResultHistory::open(&config.history_dir()?, false)?;
                println!("{}", history.nth(&root, position)?.target);
            }
            None => println!("{}", root.display()),
        }
        return Ok(ExitCode::SUCCESS);
    };

    if query == VENDOR_PARENT_TOKEN {
        let cwd = std::env::current_dir().map_err(Error::CurrentDir)?;
        let parent = vendor_parent(&cwd).ok_or(Error::NoVendorParent(cwd))?;
        println!("{}", parent.display());
        return Ok(ExitCode::SUCCESS);
    }

    let depth_limit = match args.depth {
        Some(raw) => DepthLimit::from_raw(raw)?,
        None => config.depth_limit()?,
    };
    let index = DirectoryIndex::load(config.index_file()?);
    let mut resolver = Resolver::new(&root, depth_limit, index);
    let matches = resolver.find(query)?;

    if let Some(position) = args.pick {
        let picked = position
            .checked_sub(1)
            .and_then(|i| matches.get(i))
            .ok_or(Error::HistoryOutOfRange(position))?;
        println!("{}", picked.target);
        return Ok(ExitCode::SUCCESS);
    }

    if let [single] = matches.as_slice() {
        println!("{}", single.target);
        return Ok(ExitCode::SUCCESS);
    }

    print_candidates(&matches);
    remember(&root, config, &matches);
    Ok(ExitCode::from(EXIT_AMBIGUOUS))
}

fn print_candidates(matches: &[RankedMatch]) {
    eprintln!("multiple packages match, pick one with -n:");
    for (position, candidate) in matches.iter().enumerate() {
        eprintln!("{:>3}  {}", position + 1, candidate.target);
    }
}

/// Failing to record history must not hide the candidates already printed.
fn remember(root: &Path, config: &Config, matches: &[RankedMatch]) {
    let recorded = config
        .history_dir()
        .and_then(|dir| ResultHistory::open(&dir, false))
        .and_then(|mut history| history.record(root, matches));

    if let Err(error) = recorded {
        tracing::warn!(%error, "Failed to record recent results");
    }
}

fn print_health(root: &Path, config: &Config) -> Result<(), Error> {
    println!("{}", HealthReport::collect(root, config)?);
    Ok(())
}
