use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::kv::{ToValue, Value};

#[derive(Parser, Debug, PartialEq)]
#[command(version, about)]
pub struct CliArgs {
    #[arg(short, long)]
    pub config: Option<String>,

    /// Directory holding the segment files.
    #[arg(short, long)]
    pub dir: PathBuf,

    /// Segment name, e.g. `_0` for `_0.dvm` / `_0.dvd`.
    #[arg(short, long)]
    pub segment: String,

    /// Document count of the segment.
    #[arg(short, long)]
    pub max_doc: u32,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List field descriptors from the metadata file.
    Fields,
    /// Verify the data file checksum.
    Check,
    /// Print per-document values of one field.
    Dump {
        #[arg(short, long)]
        field: u32,
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },
    /// Re-encode every field into a new segment in the same directory,
    /// using the codec settings from the config file.
    Rewrite {
        #[arg(short, long)]
        target: String,
    },
}

impl ToValue for CliArgs {
    fn to_value(&self) -> Value<'_> {
        Value::from_debug(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = CliArgs::parse_from([
            "self", "--config", "foo", "--dir", "/tmp/idx", "--segment", "_0", "--max-doc", "10",
            "fields",
        ]);
        assert_eq!(
            args,
            CliArgs {
                config: Some("foo".to_string()),
                dir: PathBuf::from("/tmp/idx"),
                segment: "_0".to_string(),
                max_doc: 10,
                command: Command::Fields,
            }
        );
    }

    #[test]
    fn test_dump_defaults() {
        let args = CliArgs::parse_from([
            "self", "-d", "/tmp/idx", "-s", "_1", "-m", "3", "dump", "--field", "7",
        ]);
        assert_eq!(args.config, None);
        assert_eq!(args.command, Command::Dump { field: 7, limit: 20 });
    }

    #[test]
    fn test_rewrite_target() {
        let args = CliArgs::parse_from([
            "self", "-d", "/tmp/idx", "-s", "_1", "-m", "3", "rewrite", "-t", "_2",
        ]);
        assert_eq!(
            args.command,
            Command::Rewrite {
                target: "_2".to_string()
            }
        );
    }
}
