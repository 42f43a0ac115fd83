//! Line-oriented serial command codec.
//!
//! Wire format (ASCII, one command per line):
//! ```text
//! ┌──────────────┬───┬───────────┬───┬────┐
//! │ attention    │ ; │ auxiliary │ ; │ \n │
//! │ 0-100        │   │ always 0  │   │    │
//! └──────────────┴───┴───────────┴───┴────┘
//! ```
//!
//! The line terminator belongs to the transport, so [`encode`] stops at
//! the last `;`. Controller responses are free-form text. The firmware
//! echoes each command it receives, which [`parse_echo`] recognises.

use core::fmt::Write;
use std::borrow::Cow;

use crate::control::mapping::{ATTENTION_MAX, ActuatorCommand};
use crate::error::{Error, Result};

/// Longest encoded command: `"100;255;"`.
pub const MAX_LINE_LEN: usize = 16;

/// An encoded command line, without terminator.
pub type CommandLine = heapless::String<MAX_LINE_LEN>;

/// Encode a command as `"<attention>;<auxiliary>;"`.
pub fn encode(cmd: &ActuatorCommand) -> Result<CommandLine> {
    if cmd.raw_attention() > ATTENTION_MAX {
        return Err(Error::InvalidCommand(u16::from(cmd.raw_attention())));
    }
    if cmd.derived_value() > cmd.kind().max_value() {
        return Err(Error::InvalidCommand(cmd.derived_value()));
    }

    let mut line = CommandLine::new();
    write!(line, "{};{};", cmd.raw_attention(), cmd.auxiliary())
        .map_err(|_| Error::InvalidCommand(u16::from(cmd.raw_attention())))?;
    Ok(line)
}

/// Split a burst of response bytes into trimmed, non-empty lines.
///
/// Both `\r` and `\n` delimit. Invalid UTF-8 is replaced rather than
/// rejected, so this never fails; an empty buffer yields nothing.
pub fn decode_lines(buf: &[u8]) -> impl Iterator<Item = Cow<'_, str>> {
    buf.split(|b| *b == b'\r' || *b == b'\n')
        .map(<[u8]>::trim_ascii)
        .filter(|frag| !frag.is_empty())
        .map(String::from_utf8_lossy)
}

/// Fields of a command echoed back by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEcho {
    pub raw_attention: u8,
    pub auxiliary: u8,
}

impl CommandEcho {
    pub fn matches(&self, cmd: &ActuatorCommand) -> bool {
        self.raw_attention == cmd.raw_attention() && self.auxiliary == cmd.auxiliary()
    }
}

/// Parse a response line as an echoed command.
///
/// Accepts `"a;b;"` and `"a;b"` (firmware trims before echoing, some
/// sketches drop the trailing separator). Anything else is `None`.
pub fn parse_echo(line: &str) -> Option<CommandEcho> {
    let line = line.trim();
    let body = line.strip_suffix(';').unwrap_or(line);
    let mut fields = body.split(';');

    let raw_attention: u8 = fields.next()?.trim().parse().ok()?;
    let auxiliary: u8 = fields.next()?.trim().parse().ok()?;
    if fields.next().is_some() || raw_attention > ATTENTION_MAX {
        return None;
    }

    Some(CommandEcho {
        raw_attention,
        auxiliary,
    })
}
