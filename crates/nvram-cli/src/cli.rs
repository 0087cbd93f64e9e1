//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use nvram_core::CrcMode;

/// nvram-tweak - Edit AMISCE Setup Question dumps safely
#[derive(Parser, Debug)]
#[command(name = "nvram-tweak")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file layered over the user config
    #[arg(long, global = true, env = "NVRAM_TWEAK_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// What an edit changes.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    /// Select the option whose `[code]label` contains VALUE
    Option,
    /// Set the numeric value to VALUE (decimal or 0x-hex)
    Value,
}

/// CRC handling on write.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrcArg {
    #[default]
    Preserve,
    Placeholder,
    Empty,
    Remove,
}

impl From<CrcArg> for CrcMode {
    fn from(arg: CrcArg) -> Self {
        match arg {
            CrcArg::Preserve => CrcMode::Preserve,
            CrcArg::Placeholder => CrcMode::Placeholder,
            CrcArg::Empty => CrcMode::Empty,
            CrcArg::Remove => CrcMode::Remove,
        }
    }
}

/// How blocks are selected.
#[derive(clap::Args, Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectArgs {
    /// Match the name exactly instead of by substring
    #[arg(long)]
    pub exact: bool,

    /// Compare names case-insensitively
    #[arg(short = 'i', long)]
    pub ignore_case: bool,

    /// Only blocks with this token (hex, with or without 0x)
    #[arg(short, long)]
    pub token: Option<String>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Change an option or value in a dump
    ///
    /// Examples:
    ///   nvram-tweak edit nvram.txt "Fast Boot" Disabled --mode option --exact
    ///   nvram-tweak edit nvram.txt "Power Limit" 0x7d --mode value
    ///   nvram-tweak edit nvram.txt "PCIe Port" Gen3 --mode option --all --dry-run
    Edit {
        /// Dump file to edit in place
        file: PathBuf,

        /// Setup Question name (or part of it)
        query: String,

        /// Option text or numeric value
        value: String,

        /// Whether VALUE selects an option or sets a number
        #[arg(short, long, value_enum)]
        mode: EditMode,

        #[command(flatten)]
        select: SelectArgs,

        /// Apply to every matching block
        #[arg(long)]
        all: bool,

        /// Show what would change without writing
        #[arg(long)]
        dry_run: bool,

        /// Skip confirmation prompts
        #[arg(short, long)]
        yes: bool,

        /// Print a unified diff of the change
        #[arg(long)]
        diff: bool,

        /// How HIICrc32 markers of edited blocks are written
        #[arg(long, value_enum, default_value_t = CrcArg::Preserve)]
        crc: CrcArg,

        /// Allow empty/remove CRC modes on blocks carrying a CRC
        #[arg(long)]
        force_unsafe_crc: bool,
    },

    /// Describe blocks in a dump
    List {
        /// Dump file to read
        file: PathBuf,

        /// Only blocks whose name contains this text
        query: Option<String>,

        #[command(flatten)]
        select: SelectArgs,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Restore a dump from the backup written by the last edit
    Restore {
        /// Dump file to restore
        file: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_edit_command() {
        let cli = Cli::parse_from([
            "nvram-tweak",
            "edit",
            "nvram.txt",
            "Fast Boot",
            "Disabled",
            "--mode",
            "option",
            "--exact",
            "--token",
            "0x12",
            "--crc",
            "placeholder",
        ]);
        match cli.command {
            Commands::Edit {
                file,
                query,
                value,
                mode,
                select,
                crc,
                all,
                dry_run,
                ..
            } => {
                assert_eq!(file, PathBuf::from("nvram.txt"));
                assert_eq!(query, "Fast Boot");
                assert_eq!(value, "Disabled");
                assert_eq!(mode, EditMode::Option);
                assert!(select.exact);
                assert_eq!(select.token.as_deref(), Some("0x12"));
                assert_eq!(CrcMode::from(crc), CrcMode::Placeholder);
                assert!(!all);
                assert!(!dry_run);
            }
            other => panic!("Expected Edit command, got {other:?}"),
        }
    }

    #[test]
    fn edit_requires_mode() {
        let result = Cli::try_parse_from(["nvram-tweak", "edit", "nvram.txt", "X", "1"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_list_with_json() {
        let cli = Cli::parse_from(["nvram-tweak", "list", "nvram.txt", "--json", "-i"]);
        assert_eq!(
            cli.command,
            Commands::List {
                file: PathBuf::from("nvram.txt"),
                query: None,
                select: SelectArgs {
                    ignore_case: true,
                    ..SelectArgs::default()
                },
                json: true,
            }
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "nvram-tweak",
            "restore",
            "nvram.txt",
            "--verbose",
            "--config",
            "custom.toml",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }
}
