use std::io::{
    self,
    BufRead,
    Write,
};
use std::path::PathBuf;

use clap::Parser;
use flash_settings::{
    Magic,
    Region,
    Settings,
};

mod defaults;
mod flash;
mod shell;

use crate::flash::FileFlash;
use crate::shell::Command;

#[derive(Parser)]
#[command(name = "settings-shell")]
#[command(about = "Interactive shell for a flash settings image", long_about = None)]
struct Cli {
    /// Flash image file, created erased if missing
    image: PathBuf,

    /// CSV file with the default entries (columns key,type,value)
    #[arg(short, long)]
    defaults: Option<PathBuf>,

    /// Region offset in bytes (must be multiple of 4096)
    #[arg(short, long, value_parser = parse_size, default_value = "0")]
    offset: usize,

    /// Region size in bytes (must be multiple of 4096)
    #[arg(short, long, value_parser = parse_size, default_value = "4096")]
    size: usize,

    /// Schema magic number
    #[arg(long, value_parser = parse_u16, default_value = "0x1234")]
    magic: u16,

    /// Schema version, stored images with another version are ignored
    #[arg(long, value_parser = parse_u16, default_value = "0x0001")]
    schema_version: u16,
}

fn parse_size(s: &str) -> Result<usize, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16).map_err(|e| e.to_string())
    } else {
        s.parse::<usize>().map_err(|e| e.to_string())
    }
}

fn parse_u16(s: &str) -> Result<u16, String> {
    let value = parse_size(s)?;
    u16::try_from(value).map_err(|e| e.to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let defaults = match &cli.defaults {
        Some(path) => {
            println!("Parsing CSV file: {}", path.display());
            defaults::from_csv_file(path)?
        }
        None => defaults::DEMO_DEFAULTS.to_vec(),
    };

    let end = cli
        .offset
        .checked_add(cli.size)
        .ok_or("region exceeds the address space")?;
    let flash = FileFlash::open(&cli.image, end)?;
    let mut settings = Settings::new(
        flash,
        Region::new(cli.offset, cli.size),
        Magic::new(cli.magic, cli.schema_version),
        &defaults,
    )?;

    println!("Settings shell for {}", cli.image.display());
    println!(
        "Region: 0x{:x}[0x{:x}], {} of {} entries used",
        cli.offset,
        cli.size,
        settings.len(),
        settings.capacity()
    );
    println!("Type 'help' for a list of commands.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim_end_matches(['\r', '\n']);
        if input.trim().is_empty() {
            continue;
        }

        match Command::parse(input) {
            Ok(Command::Quit) => break,
            Ok(command) => shell::execute(&mut settings, &defaults, command, &mut stdout)?,
            Err(e) => writeln!(stdout, "{e}")?,
        }
    }

    Ok(())
}
