//! Interactive shell
//!
//! One line per request, all issued inside a single session:
//!
//! ```text
//! read 17
//! write 17 1
//! raw 0x5401
//! quit
//! ```

use std::io::{BufRead, Write};

use hal::chardev::ChannelRegistry;
use hal::gpio::GpioController;
use ledctl::{DriverError, PinRecord, Reply, Session};

/// Parsed shell line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellCommand {
    /// Read a pin
    Read { pin: u32 },
    /// Write a pin
    Write { pin: u32, value: i32 },
    /// Send an arbitrary command code with a zeroed record
    Raw { code: u32 },
    /// Print the command list
    Help,
    /// Leave the shell
    Quit,
}

fn parse_number(word: Option<&str>, what: &str) -> Result<i64, String> {
    let word = word.ok_or_else(|| format!("missing {what}"))?;
    let parsed = match word.strip_prefix("0x") {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => word.parse(),
    };
    parsed.map_err(|_| format!("invalid {what} `{word}`"))
}

fn parse_u32(word: Option<&str>, what: &str) -> Result<u32, String> {
    let value = parse_number(word, what)?;
    u32::try_from(value).map_err(|_| format!("{what} out of range: {value}"))
}

impl ShellCommand {
    /// Parses one line; `Ok(None)` for blank lines and comments.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let command = match verb {
            _ if verb.starts_with('#') => return Ok(None),
            "read" | "r" => Self::Read {
                pin: parse_u32(words.next(), "pin")?,
            },
            "write" | "w" => {
                let pin = parse_u32(words.next(), "pin")?;
                let value = parse_number(words.next(), "value")?;
                let value =
                    i32::try_from(value).map_err(|_| format!("value out of range: {value}"))?;
                Self::Write { pin, value }
            }
            "raw" => Self::Raw {
                code: parse_u32(words.next(), "code")?,
            },
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => return Err(format!("unknown command `{other}`")),
        };
        if let Some(extra) = words.next() {
            return Err(format!("unexpected argument `{extra}`"));
        }
        Ok(Some(command))
    }
}

const HELP: &str = "commands: read PIN | write PIN VALUE | raw CODE | help | quit";

/// Runs shell lines from `input` against `session` until `quit` or end of input.
pub fn run<G, R, I, O>(session: &Session<'_, G, R>, input: I, mut output: O) -> std::io::Result<()>
where
    G: GpioController,
    R: ChannelRegistry,
    I: BufRead,
    O: Write,
{
    for line in input.lines() {
        let line = line?;
        let command = match ShellCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(msg) => {
                writeln!(output, "error: {msg}")?;
                continue;
            }
        };
        let result = match command {
            ShellCommand::Quit => break,
            ShellCommand::Help => {
                writeln!(output, "{HELP}")?;
                continue;
            }
            ShellCommand::Read { pin } => session
                .read_pin(pin)
                .map(|record| format!("GPIO{} = {}", record.pin, record.value)),
            ShellCommand::Write { pin, value } => session
                .write_pin(pin, value)
                .map(|()| format!("GPIO{pin} <- {value}")),
            ShellCommand::Raw { code } => {
                let mut arg = PinRecord::default().to_bytes();
                session.ioctl(code, &mut arg).map(|reply| match reply {
                    Reply::Ack => "ok".to_string(),
                    Reply::Record(record) => format!("{record:?}"),
                })
            }
        };
        match result {
            Ok(text) => writeln!(output, "{text}")?,
            Err(err) => report(&mut output, &err)?,
        }
    }
    Ok(())
}

fn report<O: Write>(output: &mut O, err: &DriverError) -> std::io::Result<()> {
    writeln!(output, "error: {err} ({})", err.errno())
}

#[cfg(test)]
mod tests {
    use super::*;

    use hal_sim::{SimGpio, SimRegistry};
    use ledctl::{DriverConfig, LedController};

    #[test]
    fn parse_commands() {
        assert_eq!(
            ShellCommand::parse("read 17"),
            Ok(Some(ShellCommand::Read { pin: 17 }))
        );
        assert_eq!(
            ShellCommand::parse("  w 27 1 "),
            Ok(Some(ShellCommand::Write { pin: 27, value: 1 }))
        );
        assert_eq!(
            ShellCommand::parse("raw 0x5401"),
            Ok(Some(ShellCommand::Raw { code: 0x5401 }))
        );
        assert_eq!(ShellCommand::parse(""), Ok(None));
        assert_eq!(ShellCommand::parse("# comment"), Ok(None));
    }

    #[test]
    fn parse_errors() {
        assert!(ShellCommand::parse("read").is_err());
        assert!(ShellCommand::parse("read -1").is_err());
        assert!(ShellCommand::parse("write 17 1 2").is_err());
        assert!(ShellCommand::parse("blink 17").is_err());
    }

    #[test]
    fn shell_session() {
        let config = DriverConfig::from_params("led_gpios=17,27").unwrap();
        let controller = LedController::load(config, SimGpio::new(), SimRegistry::new()).unwrap();
        let session = controller.open().unwrap();

        let input = "write 17 1\nread 17\nread 4\nraw 0x5401\nquit\nread 27\n";
        let mut output = Vec::new();
        run(&session, input.as_bytes(), &mut output).unwrap();

        let output = String::from_utf8(output).unwrap();
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines[0], "GPIO17 <- 1");
        assert_eq!(lines[1], "GPIO17 = 1");
        assert!(lines[2].starts_with("error: GPIO4 is not managed"));
        assert!(lines[2].ends_with("(-22)"));
        assert_eq!(lines[3], "ok");
        assert_eq!(lines.len(), 4);
    }
}
