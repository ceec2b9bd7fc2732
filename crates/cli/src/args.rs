//! Command-line parsing into an immutable [`Config`].
//!
//! Accepts getopt-style arguments: `--long value`, `--long=value`,
//! `-x value`, `-xvalue` and bundled flags (`-sv`). A bare `--` ends
//! option processing.

use std::path::PathBuf;

use delayloop_core::units::Quantity;
use delayloop_core::{OutputMode, RenderConfig, DEFAULT_REGISTER_BASE};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArgError {
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("option '{0}' requires a value")]
    MissingValue(String),

    #[error("option '{0}' does not take a value")]
    UnexpectedValue(String),

    #[error("invalid value '{value}' for {option}: {reason}")]
    InvalidValue { option: &'static str, value: String, reason: String },

    #[error(transparent)]
    Quantity(#[from] delayloop_core::Error),

    #[error("{0} cannot be combined with {1}")]
    Conflict(&'static str, &'static str),

    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),

    #[error("no delay given: pass --cycles N, or a time and a frequency")]
    MissingDelay,

    #[error("missing {0}: a time and a frequency must be given together")]
    IncompleteDuration(&'static str),
}

/// Where the cycle count comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum DelaySource {
    Cycles(u64),
    Duration { time: Quantity, frequency: Quantity },
    PlanFile(PathBuf),
}

/// Everything one invocation needs, fixed after parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub source: DelaySource,
    pub render: RenderConfig,
    pub save: Option<PathBuf>,
    pub simulate: bool,
    pub verbose: bool,
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Help,
    Run(Config),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Opt {
    Cycles,
    Time,
    Frequency,
    Register,
    Format,
    Save,
    Load,
    Short,
    Simulate,
    Verbose,
    Help,
}

impl Opt {
    fn from_long(name: &str) -> Option<Opt> {
        Some(match name {
            "cycles" => Opt::Cycles,
            "time" => Opt::Time,
            "frequency" => Opt::Frequency,
            "register" => Opt::Register,
            "format" => Opt::Format,
            "save" => Opt::Save,
            "load" => Opt::Load,
            "short" => Opt::Short,
            "simulate" => Opt::Simulate,
            "verbose" => Opt::Verbose,
            "help" => Opt::Help,
            _ => return None,
        })
    }

    fn from_short(c: char) -> Option<Opt> {
        Some(match c {
            'c' => Opt::Cycles,
            't' => Opt::Time,
            'f' => Opt::Frequency,
            'r' => Opt::Register,
            's' => Opt::Short,
            'v' => Opt::Verbose,
            'h' => Opt::Help,
            _ => return None,
        })
    }

    fn takes_value(self) -> bool {
        matches!(
            self,
            Opt::Cycles | Opt::Time | Opt::Frequency | Opt::Register | Opt::Format | Opt::Save | Opt::Load
        )
    }
}

/// Raw option values before cross-option validation.
#[derive(Default)]
struct Raw {
    cycles: Option<String>,
    time: Option<String>,
    frequency: Option<String>,
    register: Option<String>,
    mode: Option<OutputMode>,
    save: Option<PathBuf>,
    load: Option<PathBuf>,
    simulate: bool,
    verbose: bool,
    positionals: Vec<String>,
}

impl Raw {
    fn apply(&mut self, opt: Opt, value: Option<String>) -> Result<(), ArgError> {
        match opt {
            Opt::Cycles => self.cycles = value,
            Opt::Time => self.time = value,
            Opt::Frequency => self.frequency = value,
            Opt::Register => self.register = value,
            Opt::Format => {
                let name = value.unwrap_or_default();
                self.mode = Some(OutputMode::from_name(&name).ok_or_else(|| ArgError::InvalidValue {
                    option: "--format",
                    value: name.clone(),
                    reason: "expected asm, short, listing or hex".into(),
                })?);
            }
            Opt::Save => self.save = value.map(PathBuf::from),
            Opt::Load => self.load = value.map(PathBuf::from),
            Opt::Short => self.mode = Some(OutputMode::Compact),
            Opt::Simulate => self.simulate = true,
            Opt::Verbose => self.verbose = true,
            Opt::Help => unreachable!("help is handled while scanning"),
        }
        Ok(())
    }
}

/// Parse the arguments after the program name.
pub fn parse(args: &[String]) -> Result<Command, ArgError> {
    let mut raw = Raw::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if arg == "--" {
            raw.positionals.extend(iter.by_ref().cloned());
            break;
        }

        if let Some(body) = arg.strip_prefix("--") {
            let (name, inline) = match body.split_once('=') {
                Some((n, v)) => (n, Some(v.to_string())),
                None => (body, None),
            };
            let opt = Opt::from_long(name).ok_or_else(|| ArgError::UnknownOption(arg.clone()))?;
            if opt == Opt::Help {
                return Ok(Command::Help);
            }
            let value = if opt.takes_value() {
                match inline {
                    Some(v) => Some(v),
                    None => Some(iter.next().cloned().ok_or_else(|| ArgError::MissingValue(arg.clone()))?),
                }
            } else if inline.is_some() {
                return Err(ArgError::UnexpectedValue(arg.clone()));
            } else {
                None
            };
            raw.apply(opt, value)?;
        } else if arg.len() > 1 && arg.starts_with('-') {
            let body = &arg[1..];
            for (i, c) in body.char_indices() {
                let opt = Opt::from_short(c).ok_or_else(|| ArgError::UnknownOption(format!("-{}", c)))?;
                if opt == Opt::Help {
                    return Ok(Command::Help);
                }
                if opt.takes_value() {
                    let rest = &body[i + c.len_utf8()..];
                    let value = if rest.is_empty() {
                        iter.next().cloned().ok_or_else(|| ArgError::MissingValue(format!("-{}", c)))?
                    } else {
                        rest.to_string()
                    };
                    raw.apply(opt, Some(value))?;
                    break;
                }
                raw.apply(opt, None)?;
            }
        } else {
            raw.positionals.push(arg.clone());
        }
    }

    resolve(raw).map(Command::Run)
}

fn resolve(raw: Raw) -> Result<Config, ArgError> {
    let source = if let Some(path) = raw.load {
        if raw.cycles.is_some() {
            return Err(ArgError::Conflict("--load", "--cycles"));
        }
        if raw.time.is_some() || raw.frequency.is_some() || !raw.positionals.is_empty() {
            return Err(ArgError::Conflict("--load", "a time or frequency"));
        }
        DelaySource::PlanFile(path)
    } else if let Some(cycles) = raw.cycles {
        if raw.time.is_some() || raw.frequency.is_some() || !raw.positionals.is_empty() {
            return Err(ArgError::Conflict("--cycles", "a time or frequency"));
        }
        let cycles = cycles.parse::<u64>().map_err(|e| ArgError::InvalidValue {
            option: "--cycles",
            value: cycles.clone(),
            reason: e.to_string(),
        })?;
        DelaySource::Cycles(cycles)
    } else {
        let mut positionals = raw.positionals.into_iter();
        let time = raw.time.or_else(|| positionals.next());
        let frequency = raw.frequency.or_else(|| positionals.next());
        if let Some(extra) = positionals.next() {
            return Err(ArgError::UnexpectedArgument(extra));
        }
        match (time, frequency) {
            (Some(t), Some(f)) => DelaySource::Duration {
                time: Quantity::parse_time(&t)?,
                frequency: Quantity::parse_frequency(&f)?,
            },
            (None, None) => return Err(ArgError::MissingDelay),
            (Some(_), None) => return Err(ArgError::IncompleteDuration("frequency")),
            (None, Some(_)) => return Err(ArgError::IncompleteDuration("time")),
        }
    };

    let register_base = match raw.register {
        Some(r) => parse_register(&r)?,
        None => DEFAULT_REGISTER_BASE,
    };

    Ok(Config {
        source,
        render: RenderConfig { mode: raw.mode.unwrap_or(OutputMode::Assembly), register_base },
        save: raw.save,
        simulate: raw.simulate,
        verbose: raw.verbose,
    })
}

/// Register base as a number, optionally written `r20`.
fn parse_register(value: &str) -> Result<u8, ArgError> {
    let invalid = |reason: &str| ArgError::InvalidValue {
        option: "--register",
        value: value.to_string(),
        reason: reason.to_string(),
    };
    let digits = value.strip_prefix(['r', 'R']).unwrap_or(value);
    let base: u8 = digits.parse().map_err(|_| invalid("expected a register number"))?;
    if !(16..=31).contains(&base) {
        return Err(invalid("LDI only reaches r16..r31"));
    }
    Ok(base)
}
