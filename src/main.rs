// Chunk: docs/chunks/quick_open - Quick-open file finder host
//!
//! quick-open: command-line host for the finder and the file watcher.
//!
//! This binary plays the part of the presentation layer. It scans a project
//! root in the background, ranks queries against the result, and can watch a
//! single file for external changes, printing everything to stdout.
//!
//! ```text
//! quick-open ~/src/project mago          # one query, then exit
//! quick-open ~/src/project               # one query per stdin line
//! quick-open ~/src/project --watch notes.md
//! ```

mod config;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossbeam_channel::{Receiver, TryRecvError};
use quick_open_finder::{create_event_channel, FinderEvent, FinderEventReceiver, MatchResult, QueryController};
use quick_open_watch::FileWatcher;
use tracing_subscriber::EnvFilter;

use crate::config::load_config;

/// How long the main loop sleeps waiting for background events.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(name = "quick-open", version, about = "Fuzzy file finder with a single-file change watcher")]
struct Args {
    /// Project root to index
    root: PathBuf,

    /// Query to rank; queries are read from stdin, one per line, when omitted
    query: Option<String>,

    /// Config file (defaults to <config dir>/quick-open/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Watch this file and report external changes
    #[arg(long)]
    watch: Option<PathBuf>,

    /// Maximum number of results to print
    #[arg(long)]
    limit: Option<usize>,

    /// Skip `git ls-files` and always walk the tree
    #[arg(long)]
    no_vcs: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let mut config = load_config(args.config.as_deref());
    if let Some(limit) = args.limit {
        config.search.max_results = limit;
    }
    if args.no_vcs {
        config.scan.use_vcs_listing = false;
    }

    let (sender, receiver) = create_event_channel(|| {});
    let mut controller = QueryController::new(config.search);
    controller.begin_scan(args.root.clone(), config.scan.clone(), sender.clone());

    // Kept alive for the rest of main; dropping it stops the watch.
    let watcher = args.watch.map(|file| {
        let mut watcher = FileWatcher::new(config.watch);
        let changed = file.clone();
        watcher.start(file, move || {
            let _ = sender.send_file_changed(changed.clone());
        });
        watcher
    });

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match args.query {
        Some(query) => {
            controller.set_query(&query);
            wait_for_scan(&mut controller, &receiver, &mut out)?;
            print_results(&controller, &mut out)?;
            if watcher.is_some() {
                loop {
                    pump_events(&mut controller, &receiver, &mut out)?;
                }
            }
        }
        None => {
            let queries = spawn_query_reader();
            wait_for_scan(&mut controller, &receiver, &mut out)?;
            loop {
                pump_events(&mut controller, &receiver, &mut out)?;
                match queries.try_recv() {
                    Ok(query) => {
                        controller.set_query(query.trim());
                        print_results(&controller, &mut out)?;
                    }
                    Err(TryRecvError::Empty) => {}
                    Err(TryRecvError::Disconnected) => break,
                }
            }
        }
    }

    Ok(())
}

/// Blocks until the scan started in `main` lands.
fn wait_for_scan(
    controller: &mut QueryController,
    receiver: &FinderEventReceiver,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    while controller.is_scanning() {
        pump_events(controller, receiver, out)?;
    }
    writeln!(out, "indexed {} files", controller.candidate_count())?;
    Ok(())
}

/// Waits up to one poll interval, then handles every queued event.
fn pump_events(
    controller: &mut QueryController,
    receiver: &FinderEventReceiver,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let Some(first) = receiver.recv_timeout(POLL_INTERVAL) else {
        return Ok(());
    };
    for event in std::iter::once(first).chain(receiver.drain()) {
        match event {
            FinderEvent::FileChanged(path) => {
                writeln!(out, "changed: {}", path.display())?;
            }
            scan @ FinderEvent::ScanComplete { .. } => {
                controller.handle_event(scan);
            }
        }
    }
    out.flush().context("flushing stdout")?;
    Ok(())
}

fn print_results(controller: &QueryController, out: &mut impl Write) -> anyhow::Result<()> {
    for result in controller.results() {
        writeln!(out, "{:>5}  {}", result.score, highlight(result))?;
    }
    out.flush().context("flushing stdout")?;
    Ok(())
}

/// Reads stdin lines on a background thread. The channel closes at EOF.
fn spawn_query_reader() -> Receiver<String> {
    let (tx, rx) = crossbeam_channel::unbounded();
    thread::spawn(move || {
        for line in io::stdin().lock().lines().map_while(Result::ok) {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Wraps each matched character of the path in brackets.
fn highlight(result: &MatchResult) -> String {
    let mut matched = result.matched_indices.iter().peekable();
    let mut rendered = String::with_capacity(result.path.len() + 2 * result.matched_indices.len());
    for (i, c) in result.path.chars().enumerate() {
        if matched.peek() == Some(&&i) {
            matched.next();
            rendered.push('[');
            rendered.push(c);
            rendered.push(']');
        } else {
            rendered.push(c);
        }
    }
    rendered
}
