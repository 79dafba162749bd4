use clap::Parser;

use crate::zip::MatchFlags;

#[derive(Parser, Debug)]
#[command(name = "odtzip")]
#[command(version)]
#[command(about = "Read OpenDocument Text and other ZIP archives through their local headers", long_about = None)]
#[command(after_help = "Examples:\n  \
  odtzip report.odt              print the content.xml of report.odt\n  \
  odtzip -v report.odt           list entries with sizes and dates\n  \
  odtzip -p report.odt styles    send entries containing \"styles\" to stdout\n  \
  odtzip -l https://example.com/report.odt   list entries of a remote file")]
pub struct Cli {
    /// Archive path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Entries to extract (default: document mode)
    #[arg(value_name = "NAMES")]
    pub names: Vec<String>,

    /// List entry names
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Print the number of entries
    #[arg(short = 'c')]
    pub count: bool,

    /// Extract entries to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Select the entry at this 0-based position instead of by name
    #[arg(long = "index", value_name = "N")]
    pub index: Option<usize>,

    /// Match names case-insensitively
    #[arg(short = 'i')]
    pub ignore_case: bool,

    /// Match entries whose name contains NAME
    #[arg(short = 's')]
    pub substring: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Do not stop if the document mimetype is unknown
    #[arg(long)]
    pub force: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Whether entries were requested by name or position.
    pub fn has_selection(&self) -> bool {
        !self.names.is_empty() || self.index.is_some()
    }

    pub fn match_flags(&self) -> MatchFlags {
        let mut flags = MatchFlags::default();
        if !self.substring {
            flags = flags | MatchFlags::EXACT;
        }
        if !self.ignore_case {
            flags = flags | MatchFlags::CASE_SENSITIVE;
        }
        flags
    }
}
