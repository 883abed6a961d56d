use std::path::Path;

use schwing::cli::{self, ConfigFile, ProgramSource};
use schwing::config::Config;
use schwing::device::Level;
use schwing::event_loop::{EventLoop, RunOutcome};
use schwing::logging::init_logging;
use schwing::script::Session;
use schwing::terminal::{self, TerminalNotifier};

const USAGE: &str = "Usage: schwing [-f[<file>]] [-t<ms>] [-a<n>] [-nd] [-c<source>] [<program>]";

#[tokio::main]
async fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("schwing: {e}");
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    };

    let interactive = terminal::is_interactive();
    init_logging(args.debug, interactive);

    // ── Load config ───────────────────────────────────────────────────────────
    let mut config = match args.config {
        ConfigFile::Skip => Config::new(),
        ConfigFile::Explicit(ref path) => load_config(path),
        ConfigFile::Search => cli::find_user_config()
            .map(|p| load_config(&p))
            .unwrap_or_default(),
    };
    if let Some(ms) = args.tick_ms {
        config.tick = std::time::Duration::from_millis(ms);
    }
    if let Some(n) = args.async_limit {
        config.async_limit = n;
    }
    if args.no_connect {
        config.connect = false;
    }

    // ── Load program ──────────────────────────────────────────────────────────
    let source = match args.program {
        ProgramSource::Inline(src) => src,
        ProgramSource::File(path) => match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("schwing: {}: {e}", path.display());
                std::process::exit(1);
            }
        },
        ProgramSource::None => {
            eprintln!("schwing: no program given");
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    };

    let mut session = Session::new().with_async_limit(config.async_limit);
    if let Err(e) = session.load(&source) {
        eprintln!("schwing: {e}");
        std::process::exit(1);
    }

    let bumper = Level::new(config.bumper);
    let led = Level::default();
    if config.connect {
        session.connect(config.sim_devices(&bumper, &led));
    }

    // ── Run ───────────────────────────────────────────────────────────────────
    let mut event_loop = EventLoop::new(session, TerminalNotifier::stdout(interactive), config.tick)
        .with_bumper(bumper);

    let raw_guard = if interactive {
        match terminal::enter_raw_mode() {
            Ok(guard) => {
                terminal::spawn_key_reader(event_loop.controller());
                eprint!("p pause  r resume  b bumper  q quit\r\n");
                Some(guard)
            }
            Err(e) => {
                tracing::warn!("raw mode unavailable: {e}");
                None
            }
        }
    } else {
        None
    };

    let outcome = match event_loop.run().await {
        Ok(outcome) => outcome,
        Err(e) => {
            drop(raw_guard);
            eprintln!("schwing: {e}");
            std::process::exit(1);
        }
    };
    drop(raw_guard);

    if event_loop.timeouts() > 0 {
        tracing::info!(timeouts = event_loop.timeouts(), "reads timed out during the run");
    }
    match outcome {
        RunOutcome::Finished => tracing::info!("reached end of program"),
        RunOutcome::Stopped => tracing::info!("stopped"),
        RunOutcome::Halted(_) => std::process::exit(1),
    }
    // The key reader thread may still be blocked on input.
    std::process::exit(0);
}

fn load_config(path: &Path) -> Config {
    match Config::load_file(path) {
        Ok((config, errors)) => {
            for e in errors {
                eprintln!("schwing: {}: {e}", path.display());
            }
            config
        }
        Err(e) => {
            eprintln!("schwing: warning: {}: {e}", path.display());
            Config::new()
        }
    }
}
