//! Command-line argument parsing.
//!
//! Usage:
//!   schwing [-f[<file>]] [-t<ms>] [-a<n>] [-nd] [-c<source>] [<program>]

use std::path::PathBuf;

use directories::ProjectDirs;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Config-file specification.
    pub config: ConfigFile,
    /// Tick period override in milliseconds (`-t<ms>`).
    pub tick_ms: Option<u64>,
    /// Read timeout override in ticks (`-a<n>`).
    pub async_limit: Option<u32>,
    /// Run without a device connection (`-n`).
    pub no_connect: bool,
    /// Debug logging (`-d`).
    pub debug: bool,
    /// Where the program comes from.
    pub program: ProgramSource,
}

/// How to choose the config file.
#[derive(Debug, Default)]
pub enum ConfigFile {
    /// Search the user config dir, then `./.schwingrc` (default).
    #[default]
    Search,
    /// `-f` with no file argument: skip the config file.
    Skip,
    /// `-f<file>`: load this specific file.
    Explicit(PathBuf),
}

/// Program to run.
#[derive(Debug, Default)]
pub enum ProgramSource {
    /// Nothing given; the binary reports a usage error.
    #[default]
    None,
    /// Program file named on the command line.
    File(PathBuf),
    /// Program text given with `-c`.
    Inline(String),
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut inline: Option<String> = None;
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            positional.extend(argv[i..].iter().cloned());
            break;
        }

        if !arg.starts_with('-') || arg == "-" {
            positional.push(arg.to_owned());
            i += 1;
            continue;
        }

        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'd' => args.debug = true,
                'n' => args.no_connect = true,

                // -f[<file>]
                'f' => {
                    if j + 1 < chars.len() {
                        let file: String = chars[j + 1..].iter().collect();
                        args.config = ConfigFile::Explicit(PathBuf::from(file));
                        j = chars.len();
                    } else if i + 1 < argv.len() && !argv[i + 1].starts_with('-') {
                        i += 1;
                        args.config = ConfigFile::Explicit(PathBuf::from(&argv[i]));
                    } else {
                        args.config = ConfigFile::Skip;
                    }
                }

                // -c<source>
                'c' => {
                    inline = Some(take_value(argv, &mut i, &chars, &mut j, "-c requires program text")?);
                }

                // -t<ms>
                't' => {
                    let v = take_value(argv, &mut i, &chars, &mut j, "-t requires a tick period")?;
                    let ms: u64 = v.parse().map_err(|_| format!("invalid tick period: {v}"))?;
                    if ms == 0 {
                        return Err("tick period must be at least 1 ms".to_owned());
                    }
                    args.tick_ms = Some(ms);
                }

                // -a<n>
                'a' => {
                    let v = take_value(argv, &mut i, &chars, &mut j, "-a requires a tick count")?;
                    let n: u32 = v.parse().map_err(|_| format!("invalid async limit: {v}"))?;
                    args.async_limit = Some(n);
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    args.program = match (inline, positional.len()) {
        (Some(_), n) if n > 0 => {
            return Err("give either -c<source> or a program file, not both".to_owned())
        }
        (Some(src), _) => ProgramSource::Inline(src),
        (None, 0) => ProgramSource::None,
        (None, 1) => ProgramSource::File(PathBuf::from(positional.remove(0))),
        (None, n) => return Err(format!("too many arguments ({n})")),
    };

    Ok(args)
}

/// Value of a flag, either embedded (`-t50`) or in the next argument (`-t 50`).
fn take_value(
    argv: &[String],
    i: &mut usize,
    chars: &[char],
    j: &mut usize,
    missing: &str,
) -> Result<String, String> {
    if *j + 1 < chars.len() {
        let s: String = chars[*j + 1..].iter().collect();
        *j = chars.len();
        Ok(s)
    } else if *i + 1 < argv.len() {
        *i += 1;
        Ok(argv[*i].clone())
    } else {
        Err(missing.to_owned())
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Search for the config file in the standard locations.
/// Returns the first path that exists, or `None`.
pub fn find_user_config() -> Option<PathBuf> {
    let user = ProjectDirs::from("", "", "schwing").map(|d| d.config_dir().join("schwingrc"));
    user.into_iter()
        .chain(std::iter::once(PathBuf::from("./.schwingrc")))
        .find(|p| p.exists())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
