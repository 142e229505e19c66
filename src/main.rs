mod config;
mod error;
mod executor;
mod logsink;
mod matcher;
mod model;
mod notify;
mod service;
mod sources;

use anyhow::{Context, Result};
use calloop::EventLoop;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use crate::config::{load_config, NotifyMode};
use crate::executor::LaunchResult;
use crate::matcher::FuzzyMatcher;
use crate::notify::LogNotifier;
use crate::service::{ScriptService, ShutdownPolicy};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to read instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scripts directory, overrides the config
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Send notifications to the log instead of the desktop
    #[arg(long)]
    log_notify: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the scripts in the directory
    List {
        #[arg(long)]
        json: bool,
    },
    /// Launch the named scripts concurrently and wait for all of them
    Run {
        #[arg(required = true)]
        queries: Vec<String>,
    },
}

struct RunState {
    pending: usize,
    failed: usize,
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let args = Args::parse();

    // 1. Load Config
    let mut config = load_config(args.config.as_deref())?;
    if let Some(dir) = args.dir {
        config.general.directory = Some(dir);
    }

    let service = if args.log_notify {
        ScriptService::with_notifier(&config, Arc::new(LogNotifier))
    } else {
        ScriptService::new(&config)
    };

    // 2. Dispatch
    let code = match args.command {
        Command::List { json } => {
            list(&service, json)?;
            ExitCode::SUCCESS
        }
        Command::Run { queries } => run(&service, &queries)?,
    };

    service.dispose(ShutdownPolicy::Detach);
    Ok(code)
}

fn list(service: &ScriptService, json: bool) -> Result<()> {
    let entries = service.scan();
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    for entry in entries {
        println!(
            "{}\t{}\t{}",
            entry.display_name,
            entry.icon_hint.as_deref().unwrap_or("-"),
            entry.path.display()
        );
    }
    Ok(())
}

fn run(service: &ScriptService, queries: &[String]) -> Result<ExitCode> {
    let entries = service.scan();
    let mut matcher = FuzzyMatcher::new();

    let mut event_loop: EventLoop<RunState> = EventLoop::try_new()?;
    let (tx, rx) = calloop::channel::channel::<(String, LaunchResult)>();
    let mut state = RunState { pending: 0, failed: 0 };

    // Completion handler
    event_loop
        .handle()
        .insert_source(rx, |event, _, state: &mut RunState| {
            match event {
                calloop::channel::Event::Msg((name, result)) => {
                    state.pending = state.pending.saturating_sub(1);
                    if !result.succeeded() {
                        state.failed += 1;
                    }
                    if let Some(msg) = notify::message(&name, &result, NotifyMode::ExitCodeOnly) {
                        println!("{}", msg.summary);
                    }
                    log::debug!(
                        "{} exit code {:?}",
                        result.path.display(),
                        result.exit_code()
                    );
                }
                // every sender is gone, nothing else can arrive
                calloop::channel::Event::Closed => state.pending = 0,
            }
        })
        .map_err(|e| e.error)
        .context("registering completion channel")?;

    for query in queries {
        let Some(entry) = matcher.resolve(query, &entries) else {
            eprintln!("No script matches {:?}", query);
            state.failed += 1;
            continue;
        };
        state.pending += 1;
        let tx = tx.clone();
        let name = entry.name.clone();
        service.launch(entry, move |result| {
            let _ = tx.send((name, result));
        });
    }
    drop(tx);

    // 3. Run Loop
    while state.pending > 0 {
        event_loop.dispatch(None, &mut state)?;
    }

    Ok(if state.failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
