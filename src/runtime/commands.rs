//! Parsing of the line commands read from stdin.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    Play,
    /// 1-based position in the playlist, as shown by `list`.
    PlayNumber(usize),
    Pause,
    /// Pause when playing, play otherwise.
    Toggle,
    Stop,
    Next,
    Previous,
    Seek(f64),
    Random(Option<bool>),
    Equalizer(Vec<f32>),
    Status,
    List,
    Config,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ParseError(String);

pub const HELP: &str = "\
commands:
  play [N]          play, resume, or jump to track N of `list`
  pause | toggle    pause, or flip between playing and paused
  stop              stop and release the output
  next | prev       move through the playlist
  fwd | back        seek by the configured step
  seek SECONDS      seek relative to the current position (may be negative)
  random [on|off]   set or flip random order
  eq G1 .. G10      set the ten band gains in dB (32 Hz .. 16 kHz)
  eq flat           reset all bands to 0 dB
  status | list     show what is playing / the playlist
  config            print the effective settings
  help | quit";

fn err(msg: impl Into<String>) -> ParseError {
    ParseError(msg.into())
}

/// Parse one input line. Blank lines yield `Ok(None)`.
///
/// `seek_step` is what `fwd` and `back` move by, in seconds.
pub fn parse(line: &str, seek_step: u64) -> Result<Option<CliCommand>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let no_args = |cmd: CliCommand| {
        if args.is_empty() {
            Ok(Some(cmd))
        } else {
            Err(err(format!("`{head}` takes no arguments")))
        }
    };

    match head.to_ascii_lowercase().as_str() {
        "play" | "p" => match args.as_slice() {
            [] => Ok(Some(CliCommand::Play)),
            [n] => match n.parse::<usize>() {
                Ok(n) if n >= 1 => Ok(Some(CliCommand::PlayNumber(n))),
                _ => Err(err(format!("not a track number: {n}"))),
            },
            _ => Err(err("usage: play [N]")),
        },
        "pause" => no_args(CliCommand::Pause),
        "toggle" | "t" => no_args(CliCommand::Toggle),
        "stop" | "s" => no_args(CliCommand::Stop),
        "next" | "n" => no_args(CliCommand::Next),
        "prev" | "previous" => no_args(CliCommand::Previous),
        "fwd" | "f" => no_args(CliCommand::Seek(seek_step as f64)),
        "back" | "b" => no_args(CliCommand::Seek(-(seek_step as f64))),
        "seek" => match args.as_slice() {
            [s] => s
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| Some(CliCommand::Seek(v)))
                .ok_or_else(|| err(format!("not a number of seconds: {s}"))),
            _ => Err(err("usage: seek SECONDS")),
        },
        "random" | "r" => match args.as_slice() {
            [] => Ok(Some(CliCommand::Random(None))),
            ["on"] => Ok(Some(CliCommand::Random(Some(true)))),
            ["off"] => Ok(Some(CliCommand::Random(Some(false)))),
            _ => Err(err("usage: random [on|off]")),
        },
        "eq" => match args.as_slice() {
            ["flat"] => Ok(Some(CliCommand::Equalizer(vec![0.0; 10]))),
            gains => gains
                .iter()
                .map(|g| g.parse::<f32>().map_err(|_| err(format!("not a gain: {g}"))))
                .collect::<Result<Vec<_>, _>>()
                .map(|g| Some(CliCommand::Equalizer(g))),
        },
        "status" | "st" => no_args(CliCommand::Status),
        "list" | "ls" => no_args(CliCommand::List),
        "config" => no_args(CliCommand::Config),
        "help" | "h" | "?" => no_args(CliCommand::Help),
        "quit" | "q" | "exit" => no_args(CliCommand::Quit),
        other => Err(err(format!("unknown command `{other}` (try `help`)"))),
    }
}
