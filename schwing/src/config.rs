//! `.schwingrc` configuration file parser.
//!
//! | Directive | Action |
//! |-----------|--------|
//! | `/set tick_ms=<n>` | tick period |
//! | `/set async_limit=<n>` | ticks a read may stay unanswered |
//! | `/set connect=<0\|1>` | attach the simulated board at startup |
//! | `/set bumper=<0\|1>` | initial bumper level |
//! | `/set read_latency_ms=<n>` | simulated input answer delay |
//! | `/set pin_pattern=<regex>` | accepted pin labels for later `/pin` lines |
//! | `/pin <device> <pin>` | pin label reported for a device |
//! | Lines starting with `;` | comment, ignored |
//! | Any other `/command` | silently skipped |
//!
//! `/set` also accepts the `/set <name> <value>` form.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

use crate::device::{DeviceTable, InputName, Level, OutputName, SimInput, SimOutput};
use crate::script::pending::DEFAULT_ASYNC_LIMIT;

/// Pin labels accepted when no `pin_pattern` is set: a port letter and a
/// bit number, e.g. `B0` or `D13`.
pub const DEFAULT_PIN_PATTERN: &str = r"^[A-Z][0-9]{1,2}$";

pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a config file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

/// Host settings: timing, connection and simulated board wiring.
#[derive(Debug, Clone)]
pub struct Config {
    pub tick: Duration,
    pub async_limit: u32,
    pub connect: bool,
    pub bumper: bool,
    pub read_latency: Duration,
    pub output_pins: HashMap<OutputName, String>,
    pub input_pins: HashMap<InputName, String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tick: DEFAULT_TICK,
            async_limit: DEFAULT_ASYNC_LIMIT,
            connect: true,
            bumper: false,
            read_latency: Duration::ZERO,
            output_pins: HashMap::from([(OutputName::Led, "B1".to_owned())]),
            input_pins: HashMap::from([(InputName::Bumper, "B0".to_owned())]),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config string.
    ///
    /// Unknown directives are skipped.  Returns the config and a list of any
    /// errors on recognised lines; a bad line leaves its setting unchanged.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();
        let mut pin_re = compile_pin_pattern(DEFAULT_PIN_PATTERN).ok();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let Some(rest) = line.strip_prefix('/') else { continue };

            let (cmd, args_str) = rest
                .split_once(|c: char| c.is_ascii_whitespace())
                .unwrap_or((rest, ""));
            let tokens: Vec<&str> = args_str.split_whitespace().collect();

            let result = match cmd {
                "set" => parse_set(&tokens).and_then(|(name, value)| {
                    if name == "pin_pattern" {
                        pin_re = Some(compile_pin_pattern(&value)?);
                        Ok(())
                    } else {
                        config.apply(&name, &value)
                    }
                }),
                "pin" => config.parse_pin(&tokens, pin_re.as_ref()),
                _ => Ok(()),
            };
            if let Err(message) = result {
                errors.push(ConfigError { line: lineno, message });
            }
        }

        (config, errors)
    }

    /// Read and parse a config file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }

    /// Apply one named setting.
    pub fn apply(&mut self, name: &str, value: &str) -> Result<(), String> {
        match name {
            "tick_ms" => {
                let ms = parse_num::<u64>(name, value)?;
                if ms == 0 {
                    return Err("tick_ms must be at least 1".into());
                }
                self.tick = Duration::from_millis(ms);
            }
            "async_limit" => self.async_limit = parse_num(name, value)?,
            "connect" => self.connect = parse_flag(name, value)?,
            "bumper" => self.bumper = parse_flag(name, value)?,
            "read_latency_ms" => {
                self.read_latency = Duration::from_millis(parse_num(name, value)?)
            }
            _ => return Err(format!("unknown setting '{name}'")),
        }
        Ok(())
    }

    fn parse_pin(&mut self, tokens: &[&str], pin_re: Option<&Regex>) -> Result<(), String> {
        let [device, pin] = tokens else {
            return Err("/pin: expected <device> <pin>".into());
        };
        if let Some(re) = pin_re {
            if !re.is_match(pin) {
                return Err(format!("/pin: '{pin}' is not a valid pin label"));
            }
        }
        if let Ok(name) = device.parse::<OutputName>() {
            self.output_pins.insert(name, (*pin).to_owned());
        } else if let Ok(name) = device.parse::<InputName>() {
            self.input_pins.insert(name, (*pin).to_owned());
        } else {
            return Err(format!("/pin: unknown device '{device}'"));
        }
        Ok(())
    }

    /// Pin label for a device, or `"?"` if none is configured.
    pub fn output_pin(&self, name: OutputName) -> &str {
        self.output_pins.get(&name).map_or("?", String::as_str)
    }

    pub fn input_pin(&self, name: InputName) -> &str {
        self.input_pins.get(&name).map_or("?", String::as_str)
    }

    /// Build the simulated board: every known device wired to a shared level.
    pub fn sim_devices(&self, bumper: &Level, led: &Level) -> DeviceTable {
        let input = SimInput::new(InputName::Bumper, self.input_pin(InputName::Bumper), bumper.clone())
            .with_latency(self.read_latency);
        let output = SimOutput::new(OutputName::Led, self.output_pin(OutputName::Led), led.clone());
        DeviceTable::new()
            .with_input(InputName::Bumper, input)
            .with_output(OutputName::Led, output)
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Parse `/set <name>=<value>` or `/set <name> <value>`.
fn parse_set(tokens: &[&str]) -> Result<(String, String), String> {
    let Some(first) = tokens.first() else {
        return Err("/set: requires an argument".into());
    };

    let (name, value) = if let Some((name, value)) = first.split_once('=') {
        (name.to_owned(), value.to_owned())
    } else if tokens.len() >= 2 {
        ((*first).to_owned(), tokens[1..].join(" "))
    } else {
        return Err(format!("/set: missing value for '{first}'"));
    };

    if name.is_empty() {
        return Err("/set: variable name cannot be empty".into());
    }
    Ok((name, value))
}

fn parse_num<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("{name}: '{value}' is not a valid number"))
}

fn parse_flag(name: &str, value: &str) -> Result<bool, String> {
    match value {
        "1" | "on" | "true" => Ok(true),
        "0" | "off" | "false" => Ok(false),
        _ => Err(format!("{name}: expected 0 or 1, got '{value}'")),
    }
}

fn compile_pin_pattern(pattern: &str) -> Result<Regex, String> {
    Regex::new(pattern).map_err(|e| format!("pin_pattern: {e}"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let (cfg, errs) = Config::load_str("");
        assert!(errs.is_empty());
        assert_eq!(cfg.tick, Duration::from_millis(100));
        assert_eq!(cfg.async_limit, 3);
        assert!(cfg.connect);
        assert_eq!(cfg.input_pin(InputName::Bumper), "B0");
        assert_eq!(cfg.output_pin(OutputName::Led), "B1");
    }

    // -- /set -----------------------------------------------------------------

    #[test]
    fn set_equals_syntax() {
        let (cfg, errs) = Config::load_str("/set tick_ms=20\n/set async_limit=5");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.tick, Duration::from_millis(20));
        assert_eq!(cfg.async_limit, 5);
    }

    #[test]
    fn set_space_syntax() {
        let (cfg, errs) = Config::load_str("/set connect 0\n/set bumper on");
        assert!(errs.is_empty(), "{errs:?}");
        assert!(!cfg.connect);
        assert!(cfg.bumper);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let (cfg, errs) = Config::load_str("/set tick_ms=fast\n/set tick_ms=0\n/set connect=maybe");
        assert_eq!(errs.len(), 3);
        assert_eq!(errs[0].line, 1);
        assert_eq!(cfg.tick, DEFAULT_TICK);
        assert!(cfg.connect);
    }

    #[test]
    fn unknown_setting_is_error() {
        let (_, errs) = Config::load_str("/set colour=red");
        assert_eq!(errs.len(), 1);
        assert!(errs[0].to_string().contains("unknown setting"));
    }

    // -- /pin -----------------------------------------------------------------

    #[test]
    fn pin_assignment() {
        let (cfg, errs) = Config::load_str("/pin Led D13\n/pin Bumper C2");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.output_pin(OutputName::Led), "D13");
        assert_eq!(cfg.input_pin(InputName::Bumper), "C2");
    }

    #[test]
    fn pin_label_is_validated() {
        let (cfg, errs) = Config::load_str("/pin Led b1\n/pin Lamp B2\n/pin Led");
        assert_eq!(errs.len(), 3, "{errs:?}");
        assert_eq!(cfg.output_pin(OutputName::Led), "B1");
    }

    #[test]
    fn custom_pin_pattern() {
        let (cfg, errs) = Config::load_str("/set pin_pattern=^GPIO[0-9]+$\n/pin Led GPIO17");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.output_pin(OutputName::Led), "GPIO17");

        let (_, errs) = Config::load_str("/set pin_pattern=([");
        assert!(errs[0].message.starts_with("pin_pattern"));
    }

    // -- Comments & skipping --------------------------------------------------

    #[test]
    fn comments_and_unknown_commands_skipped() {
        let src = "\
;; board setup\n\
\n\
/set tick_ms=50\n\
/def -i something = ignored\n\
plain text is ignored too\n\
";
        let (cfg, errs) = Config::load_str(src);
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.tick, Duration::from_millis(50));
    }

    #[test]
    fn load_file_from_disk() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "/set read_latency_ms=30").unwrap();
        writeln!(f, "/pin Bumper A4").unwrap();
        let (cfg, errs) = Config::load_file(f.path()).unwrap();
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.read_latency, Duration::from_millis(30));
        assert_eq!(cfg.input_pin(InputName::Bumper), "A4");
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_file(&dir.path().join("nope")).is_err());
    }
}
