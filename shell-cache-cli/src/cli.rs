use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Define CLI arguments
#[derive(Parser, Debug)]
#[command(
    name = "shellcache",
    version,
    about = "Offline asset cache for deployed web applications",
    long_about = "Runs the install, activate, fetch and message handlers of a shell-cache\n\
                  agent against a live origin, keeping the stores on disk so consecutive\n\
                  runs behave like consecutive versions of the deployed application."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    /// Origin of the deployed application
    #[arg(
        short,
        long,
        global = true,
        default_value = "http://localhost:8080",
        help = "Origin the agent serves, e.g. https://app.example.com"
    )]
    pub origin: String,

    /// Build manifest produced by the bundler
    #[arg(
        short = 'm',
        long,
        global = true,
        default_value = "build-manifest.json",
        help = "JSON file with the resource manifest and the core shell list"
    )]
    pub build_manifest: PathBuf,

    /// Root directory of the stores
    #[arg(
        short = 'c',
        long,
        global = true,
        default_value = ".shell-cache",
        help = "Directory holding one sub-directory per store"
    )]
    pub cache_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true, help = "Enable detailed debug logging")]
    pub verbose: bool,

    /// Overall timeout in seconds
    #[arg(
        long,
        global = true,
        default_value = "30",
        help = "Overall timeout in seconds for HTTP requests (0 disables it)"
    )]
    pub timeout: u64,

    /// Connection timeout in seconds
    #[arg(
        long,
        global = true,
        default_value = "10",
        help = "Connection timeout in seconds (time to establish initial connection)"
    )]
    pub connect_timeout: u64,

    /// Do not hold fetches back while an activation runs
    #[arg(long, global = true)]
    pub no_fetch_gate: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the core shell into the staging store
    Install,

    /// Reconcile the staging store into the main store
    Activate,

    /// Install then activate, as a new version would
    Lifecycle,

    /// Run a GET request through the fetch handler
    Fetch {
        /// Manifest path (`main.dart.js`, `/`) or absolute URL
        target: String,

        /// Write the response body to this file
        #[arg(short = 'O', long)]
        output: Option<PathBuf>,
    },

    /// Post a message to the agent
    Message {
        /// Raw message value, e.g. `force-activate` or `download-offline`
        value: String,
    },

    /// Fetch every manifest asset that is not cached yet
    DownloadOffline,

    /// Show the stores and the difference to the recorded manifest
    Status,
}
