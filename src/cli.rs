use clap::Parser;

use crate::config::{ExtractOptions, TextDecoding};
use crate::upload::UploadPolicy;

#[derive(Parser, Debug)]
#[command(name = "zipspace")]
#[command(version)]
#[command(about = "Load a ZIP archive into a normalized project file map", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipspace myapp.zip                      print the project as JSON\n  \
  zipspace -l https://example.com/app.zip list project files of a remote archive\n  \
  zipspace -p src/index.js myapp.zip      print one file of the project")]
pub struct Cli {
    /// ZIP file path or HTTP URL
    #[arg(value_name = "ARCHIVE")]
    pub archive: String,

    /// List normalized file paths only
    #[arg(short = 'l', conflicts_with = "print")]
    pub list: bool,

    /// Print the content of one project file
    #[arg(short = 'p', value_name = "PATH")]
    pub print: Option<String>,

    /// Archive name used to derive the project name
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Abort extraction after this many seconds
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    pub timeout: u64,

    /// Largest archive accepted, in bytes
    #[arg(long, value_name = "BYTES", default_value_t = UploadPolicy::DEFAULT_MAX_SIZE)]
    pub max_size: u64,

    /// Number of entries decoded concurrently (default: CPU count)
    #[arg(short = 'j', long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Keep files that are not valid UTF-8, replacing invalid bytes
    #[arg(long)]
    pub lossy: bool,

    /// Quiet mode, no diagnostics on stderr
    #[arg(short = 'q')]
    pub quiet: bool,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.archive.starts_with("http://") || self.archive.starts_with("https://")
    }

    pub fn extract_options(&self) -> ExtractOptions {
        let options = ExtractOptions::default().with_text_decoding(if self.lossy {
            TextDecoding::Lossy
        } else {
            TextDecoding::Strict
        });
        match self.concurrency {
            Some(concurrency) => options.with_concurrency(concurrency),
            None => options,
        }
    }

    pub fn upload_policy(&self) -> UploadPolicy {
        UploadPolicy {
            max_size: self.max_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_flags_to_options() {
        let cli = Cli::parse_from(["zipspace", "-j", "2", "--lossy", "app.zip"]);
        let options = cli.extract_options();
        assert_eq!(options.concurrency.get(), 2);
        assert_eq!(options.text_decoding, TextDecoding::Lossy);
        assert_eq!(cli.upload_policy(), UploadPolicy::default());
        assert!(!cli.is_http_url());
    }

    #[test]
    fn list_and_print_conflict() {
        assert!(Cli::try_parse_from(["zipspace", "-l", "-p", "a.js", "app.zip"]).is_err());
    }
}
