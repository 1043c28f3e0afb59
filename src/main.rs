use clap::{Parser, Subcommand, ValueEnum};
use eyre::Context;
use serde_json::json;
use std::path::{Path, PathBuf, absolute};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use update_fs::{
    config::{Config, discover_nearest_config_file, read_config_file},
    fs::{FileSystem, real::RealFs},
    install::{InstallOptions, install_file, write_manifest},
    transfer::{checksum_file, write_stream},
};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional custom path to the update-fs.toml configuration file. By default
    /// update-fs.toml is searched for in each parent directory, defaults are
    /// used when none is found
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format to use when providing command output
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Disable color in the output
    #[arg(short, long, default_value_t = false)]
    pub disable_color: bool,
}

/// Output format to use when providing program output
#[derive(ValueEnum, Clone)]
pub enum OutputFormat {
    /// Provide output in human readable format
    Human,

    /// Provide output in machine readable JSON format
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stage a file next to its destination and move it into place
    Install {
        /// File to install
        #[arg(short, long)]
        source: PathBuf,

        /// Path to install the file at
        #[arg(long)]
        dest: PathBuf,

        /// Write a JSON manifest of the install to this path, overrides
        /// the configured manifest
        #[arg(short, long)]
        manifest: Option<PathBuf>,

        /// Status code to exit with after a successful install, overrides
        /// the configured exit code
        #[arg(short, long)]
        exit_code: Option<i32>,
    },

    /// Print the SHA-256 digest of a file
    Checksum {
        #[arg(short, long)]
        path: PathBuf,
    },

    /// Write standard input to a file
    Write {
        #[arg(short, long)]
        path: PathBuf,
    },

    /// Create a directory and any missing parents
    Mkdir {
        #[arg(short, long)]
        path: PathBuf,

        /// Octal permission mode, defaults to the configured directory mode
        #[arg(short, long, value_parser = parse_mode)]
        mode: Option<u32>,
    },

    /// Rename a file
    Rename {
        #[arg(long)]
        from: PathBuf,

        #[arg(long)]
        to: PathBuf,
    },

    /// Remove a file or empty directory, failures are ignored
    Remove {
        #[arg(short, long)]
        path: PathBuf,
    },
}

/// Output data for a successful run
struct Output {
    /// Text version
    text: String,
    /// JSON version
    json: serde_json::Value,
    /// Status code to exit the process with
    status: i32,
}

impl Output {
    fn success(text: String, json: serde_json::Value) -> Output {
        Output {
            text,
            json,
            status: 0,
        }
    }
}

/// Status used when a command fails
const FAILURE_STATUS: i32 = 1;

fn main() {
    let fs = RealFs;

    let args = match Args::try_parse() {
        Ok(value) => value,
        Err(error) => {
            // Help and version requests also arrive here with a zero status
            let _ = error.print();
            fs.exit(error.exit_code());
            return;
        }
    };

    let format = args.format.clone();

    let status = match app(&fs, args).and_then(|output| {
        print_output(&format, &output)?;
        Ok(output.status)
    }) {
        Ok(status) => status,
        Err(error) => {
            print_error(&format, &error);
            FAILURE_STATUS
        }
    };

    // The only place the process is terminated
    fs.exit(status);
}

/// Print the output of a successful run in the requested `format`
fn print_output(format: &OutputFormat, output: &Output) -> eyre::Result<()> {
    match format {
        OutputFormat::Human => {
            println!("{}", output.text);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&output.json)?);
        }
    }

    Ok(())
}

/// Report a failed run, the full report always goes to stderr
fn print_error(format: &OutputFormat, error: &eyre::Report) {
    if let OutputFormat::Json = format {
        tracing::error!(?error, "error occurred");

        println!(
            "{}",
            json!({
                "success": false,
                "error": error.to_string()
            })
        );
    }

    eprintln!("Error: {error:?}");
}

/// Initialize the logging and indicator layers
fn init_logging() -> eyre::Result<()> {
    let indicatif_layer = IndicatifLayer::new();

    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                // Provide logging from update-fs by default
                .add_directive("update_fs=info".parse()?),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_line_number(false)
                .with_target(false)
                .with_file(false)
                .with_writer(indicatif_layer.get_stderr_writer()),
        )
        .with(indicatif_layer)
        .init();

    Ok(())
}

/// Main logic entrypoint
fn app<Fs: FileSystem>(fs: &Fs, args: Args) -> eyre::Result<Output> {
    if !args.disable_color {
        // Setup colorful error logging
        color_eyre::install()?;
    }

    init_logging()?;

    let config_path = match args.config {
        Some(value) => Some(value),
        None => discover_nearest_config_file()?,
    };

    let (config, working_path) = match config_path {
        Some(config_path) => {
            let config_path =
                absolute(config_path).context("failed to get absolute config path")?;

            tracing::debug!(?config_path, "found config file");

            let config = read_config_file(fs, &config_path)?;
            let working_path = config_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();

            (config, working_path)
        }
        None => {
            tracing::debug!("no config file found, using defaults");
            let working_path =
                std::env::current_dir().context("failed to determine current directory")?;
            (Config::default(), working_path)
        }
    };

    tracing::debug!(?working_path, "working path");

    match args.command {
        Commands::Install {
            source,
            dest,
            manifest,
            exit_code,
        } => {
            let options = InstallOptions {
                temp_pattern: config.install.temp_pattern.clone(),
                dir_mode: config.permissions.dir_mode,
            };

            let installed = install_file(fs, &source, &dest, &options)?;

            tracing::info!(
                path = ?installed.path,
                bytes = installed.bytes,
                "installed file"
            );

            let manifest = manifest.or_else(|| {
                config
                    .install
                    .manifest
                    .as_ref()
                    .map(|path| resolve_path(&working_path, path))
            });

            if let Some(manifest) = manifest.as_ref() {
                write_manifest(fs, manifest, &installed, config.permissions.file_mode)?;
            }

            Ok(Output {
                text: format!(
                    "installed {} byte(s) to \"{}\" (sha256 {})",
                    installed.bytes,
                    installed.path.display(),
                    installed.sha256
                ),
                json: json!({
                    "success": true,
                    "path": installed.path,
                    "bytes": installed.bytes,
                    "sha256": installed.sha256,
                    "manifest": manifest,
                }),
                status: exit_code.or(config.install.exit_code).unwrap_or(0),
            })
        }
        Commands::Checksum { path } => {
            let checksum = checksum_file(fs, &path)?;

            Ok(Output::success(
                format!("{}  {}", checksum.sha256, path.display()),
                json!({
                    "success": true,
                    "bytes": checksum.bytes,
                    "sha256": checksum.sha256,
                }),
            ))
        }
        Commands::Write { path } => {
            let mut stdin = std::io::stdin().lock();
            let count = write_stream(fs, &path, &mut stdin)?;

            Ok(Output::success(
                format!("wrote {} byte(s) to \"{}\"", count, path.display()),
                json!({
                    "success": true,
                    "bytes": count,
                }),
            ))
        }
        Commands::Mkdir { path, mode } => {
            fs.mkdir_all(&path, mode.unwrap_or(config.permissions.dir_mode))?;

            Ok(Output::success(
                format!("created directory \"{}\"", path.display()),
                json!({ "success": true }),
            ))
        }
        Commands::Rename { from, to } => {
            fs.rename(&from, &to)?;

            Ok(Output::success(
                format!("renamed \"{}\" to \"{}\"", from.display(), to.display()),
                json!({ "success": true }),
            ))
        }
        Commands::Remove { path } => {
            fs.remove(&path);

            Ok(Output::success(
                format!("removed \"{}\"", path.display()),
                json!({ "success": true }),
            ))
        }
    }
}

/// Resolve `path` against `working_path` when relative
fn resolve_path(working_path: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_path.join(path)
    }
}

/// Parse an octal permission mode such as `755` or `0o755`
fn parse_mode(value: &str) -> Result<u32, String> {
    let digits = value.strip_prefix("0o").unwrap_or(value);
    u32::from_str_radix(digits, 8).map_err(|error| format!("invalid octal mode: {error}"))
}
