use clap::Parser;

/// A segmented HTTP downloader.
///
/// Splits the file into byte ranges fetched concurrently, then joins them.
/// Part files left by an interrupted run are picked up where they stopped.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The URL of the file to download.
    #[arg(short, long)]
    pub url: String,

    /// The name of the output file. Defaults to the server-supplied name.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Number of segments to fetch concurrently (1-16).
    #[arg(short = 'n', long)]
    pub segments: Option<usize>,

    /// The directory to save the file in. Defaults to the current directory.
    #[arg(short = 'd', long)]
    pub dir: Option<String>,

    /// Log filter, e.g. `info` or `splitget=debug`. Overrides RUST_LOG.
    #[arg(long)]
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_flags() {
        let args = Args::parse_from(["splitget", "-u", "http://x/y.bin", "-n", "4", "-o", "z"]);
        assert_eq!(args.url, "http://x/y.bin");
        assert_eq!(args.segments, Some(4));
        assert_eq!(args.output.as_deref(), Some("z"));
        assert_eq!(args.dir, None);
    }
}
