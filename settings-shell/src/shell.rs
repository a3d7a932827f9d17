use std::io::{
    self,
    Write,
};

use flash_settings::platform::Platform;
use flash_settings::{
    Entry,
    Settings,
};
use thiserror::Error;

/// A single line entered at the prompt.
#[derive(Debug, PartialEq)]
pub enum Command {
    Help,
    Print,
    Save,
    Erase,
    Init,
    Get(String),
    PutInt(String, i32),
    PutBool(String, bool),
    PutString(String, String),
    Quit,
}

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Unknown command '{0}'. Type 'help' for a list of commands.")]
    UnknownCommand(String),

    #[error("No key provided for '{0}' command.")]
    MissingKey(&'static str),

    #[error("Invalid arguments for '{0}' command. Usage: {1}")]
    InvalidArguments(&'static str, &'static str),

    #[error("Invalid integer value '{0}'.")]
    InvalidInt(String),

    #[error("Invalid boolean value '{0}'. Use 'true', 'false', 't', 'f', '1', or '0'.")]
    InvalidBool(String),
}

const HELP: &str = "\
Available commands:
  help                       - Show available commands
  print                      - Show settings
  save                       - Save settings
  erase                      - Erase settings
  init                       - Reload settings from flash or defaults
  get <KEY>                  - Get a setting
  put_int <KEY> <VALUE>      - Set an integer setting
  put_bool <KEY> <VALUE>     - Set a boolean setting (true/false/t/f/1/0)
  put_string <KEY> [VALUE]   - Set a string setting, the rest of the line is the value
  quit                       - Leave the shell";

impl Command {
    /// Splits `line` into the command word and its arguments.
    pub fn parse(line: &str) -> Result<Command, ParseError> {
        let line = line.trim_start();
        let (name, args) = line
            .split_once(char::is_whitespace)
            .unwrap_or((line, ""));

        match name {
            "help" => Ok(Command::Help),
            "print" => Ok(Command::Print),
            "save" => Ok(Command::Save),
            "erase" => Ok(Command::Erase),
            "init" => Ok(Command::Init),
            "quit" | "exit" => Ok(Command::Quit),
            "get" => {
                let key = args
                    .split_whitespace()
                    .next()
                    .ok_or(ParseError::MissingKey("get"))?;
                Ok(Command::Get(key.to_string()))
            }
            "put_int" => {
                let (key, value) = key_and_value(args)
                    .ok_or(ParseError::InvalidArguments("put_int", "put_int <KEY> <VALUE>"))?;
                let value = value
                    .parse::<i32>()
                    .map_err(|_| ParseError::InvalidInt(value.to_string()))?;
                Ok(Command::PutInt(key.to_string(), value))
            }
            "put_bool" => {
                let (key, value) = key_and_value(args).ok_or(ParseError::InvalidArguments(
                    "put_bool",
                    "put_bool <KEY> <true/false>",
                ))?;
                Ok(Command::PutBool(key.to_string(), parse_bool(value)?))
            }
            "put_string" => {
                let args = args.trim_start();
                if args.is_empty() {
                    return Err(ParseError::InvalidArguments(
                        "put_string",
                        "put_string <KEY> [VALUE]",
                    ));
                }
                // a single separator is consumed, anything after it is the value
                let (key, value) = args.split_once(' ').unwrap_or((args, ""));
                Ok(Command::PutString(key.to_string(), value.to_string()))
            }
            _ => Err(ParseError::UnknownCommand(name.to_string())),
        }
    }
}

fn key_and_value(args: &str) -> Option<(&str, &str)> {
    let mut words = args.split_whitespace();
    Some((words.next()?, words.next()?))
}

fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Ok(true),
        "false" | "f" | "0" => Ok(false),
        _ => Err(ParseError::InvalidBool(value.to_string())),
    }
}

/// Runs `command` against the store and reports the outcome to `out`. Store errors are reported,
/// only a failing `out` ends the shell.
pub fn execute<T: Platform, W: Write>(
    settings: &mut Settings<T>,
    defaults: &[Entry],
    command: Command,
    out: &mut W,
) -> io::Result<()> {
    match command {
        Command::Help => writeln!(out, "{HELP}"),
        Command::Print => write!(out, "{settings}"),
        Command::Save => match settings.save(true) {
            Ok(()) => writeln!(out, "Settings saved."),
            Err(e) => writeln!(out, "Error: {e}"),
        },
        Command::Erase => match settings.erase() {
            Ok(()) => writeln!(out, "Settings erased."),
            Err(e) => writeln!(out, "Error: {e}"),
        },
        Command::Init => match settings.init(defaults) {
            Ok(count) => writeln!(out, "Settings initialized, {count} entries."),
            Err(e) => writeln!(out, "Error: {e}"),
        },
        Command::Get(key) => match settings.find(&key) {
            Some(entry) => writeln!(out, "Key: {}, Value: {}", entry.key().as_str(), entry.value()),
            None => writeln!(out, "Key {key} not found."),
        },
        Command::PutInt(key, value) => match settings.put_int(&key, value) {
            Ok(()) => writeln!(out, "Key: {key}, Value: {value}"),
            Err(e) => writeln!(out, "Error: {e}"),
        },
        Command::PutBool(key, value) => match settings.put_bool(&key, value) {
            Ok(()) => writeln!(out, "Key: {key}, Value: {value}"),
            Err(e) => writeln!(out, "Error: {e}"),
        },
        Command::PutString(key, value) => match settings.put_string(&key, &value) {
            Ok(()) if value.is_empty() => writeln!(out, "Key: {key}, Value: <EMPTY>"),
            Ok(()) => writeln!(out, "Key: {key}, Value: {value}"),
            Err(e) => writeln!(out, "Error: {e}"),
        },
        Command::Quit => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::DEMO_DEFAULTS;
    use crate::flash::{
        FileFlash,
        SECTOR_SIZE,
    };
    use flash_settings::{
        Magic,
        Region,
    };
    use pretty_assertions::assert_eq;

    fn run(settings: &mut Settings<FileFlash>, line: &str) -> String {
        let mut out = vec![];
        let command = Command::parse(line).unwrap();
        execute(settings, &DEMO_DEFAULTS, command, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn open(path: &std::path::Path) -> Settings<FileFlash> {
        let flash = FileFlash::open(path, SECTOR_SIZE).unwrap();
        Settings::new(
            flash,
            Region::new(0, SECTOR_SIZE),
            Magic::new(0x1234, 0x0001),
            &DEMO_DEFAULTS,
        )
        .unwrap()
    }

    #[test]
    fn parse_commands() {
        assert_eq!(Command::parse("help"), Ok(Command::Help));
        assert_eq!(Command::parse("  print"), Ok(Command::Print));
        assert_eq!(Command::parse("exit"), Ok(Command::Quit));
        assert_eq!(Command::parse("get TEST1"), Ok(Command::Get("TEST1".to_string())));
        assert_eq!(
            Command::parse("put_int TEST3 -42"),
            Ok(Command::PutInt("TEST3".to_string(), -42))
        );
        assert_eq!(
            Command::parse("put_bool TEST2 T"),
            Ok(Command::PutBool("TEST2".to_string(), true))
        );
        assert_eq!(
            Command::parse("put_bool TEST2 0"),
            Ok(Command::PutBool("TEST2".to_string(), false))
        );
        assert_eq!(
            Command::parse("put_string TEST1 hello  spaced world"),
            Ok(Command::PutString(
                "TEST1".to_string(),
                "hello  spaced world".to_string()
            ))
        );
        assert_eq!(
            Command::parse("put_string TEST1"),
            Ok(Command::PutString("TEST1".to_string(), String::new()))
        );
    }

    #[test]
    fn parse_errors() {
        assert_eq!(
            Command::parse("reboot"),
            Err(ParseError::UnknownCommand("reboot".to_string()))
        );
        assert_eq!(Command::parse("get"), Err(ParseError::MissingKey("get")));
        assert!(matches!(
            Command::parse("put_int TEST3"),
            Err(ParseError::InvalidArguments("put_int", _))
        ));
        assert_eq!(
            Command::parse("put_int TEST3 many"),
            Err(ParseError::InvalidInt("many".to_string()))
        );
        assert_eq!(
            Command::parse("put_bool TEST2 yes"),
            Err(ParseError::InvalidBool("yes".to_string()))
        );
        assert!(matches!(
            Command::parse("put_string"),
            Err(ParseError::InvalidArguments("put_string", _))
        ));
    }

    #[test]
    fn session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.bin");

        let mut settings = open(&path);
        assert_eq!(run(&mut settings, "get TEST3"), "Key: TEST3, Value: 60\n");
        assert_eq!(run(&mut settings, "put_int TEST3 42"), "Key: TEST3, Value: 42\n");
        assert_eq!(run(&mut settings, "put_string TEST4"), "Key: TEST4, Value: <EMPTY>\n");
        assert_eq!(run(&mut settings, "put_int TEST9 1"), "Error: key not found\n");
        assert_eq!(run(&mut settings, "get TEST9"), "Key TEST9 not found.\n");
        assert_eq!(run(&mut settings, "save"), "Settings saved.\n");
        assert!(run(&mut settings, "print").contains("| TEST3 "));
        drop(settings);

        let mut settings = open(&path);
        assert_eq!(run(&mut settings, "get TEST3"), "Key: TEST3, Value: 42\n");
        assert_eq!(run(&mut settings, "get TEST4"), "Key: TEST4, Value: \n");

        assert_eq!(run(&mut settings, "erase"), "Settings erased.\n");
        assert_eq!(run(&mut settings, "get TEST3"), "Key TEST3 not found.\n");
        assert_eq!(run(&mut settings, "save"), "Error: not initialized\n");
        assert_eq!(run(&mut settings, "init"), "Settings initialized, 5 entries.\n");
        assert_eq!(run(&mut settings, "get TEST3"), "Key: TEST3, Value: 60\n");
    }
}
