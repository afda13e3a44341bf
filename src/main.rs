use clap::{Parser, Subcommand};
use marimushka::config::{self, BuildConfig, CONFIG_FILE};
use marimushka::converter::MarimoConverter;
use marimushka::{output, pipeline};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("MARIMUSHKA_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("MARIMUSHKA_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "marimushka")]
#[command(about = "Export marimo notebooks and apps to a static site")]
#[command(long_about = "\
Export marimo notebooks and apps to a static site

Every *.py file under the source roots is exported with marimo and linked
from a generated index.html.

Layout:

  notebooks/                 # static HTML      → _site/notebooks/<name>.html
  notebooks_wasm/            # WASM, editable   → _site/notebooks_wasm/<name>.html
  apps/                      # WASM, run mode   → _site/apps/<name>.html
  marimushka.toml            # optional config

Settings resolve as: stock defaults → marimushka.toml → flags.
Pass an empty string (--apps \"\") to skip a category.

Run 'marimushka gen-config' to print a documented marimushka.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./marimushka.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output directory
    #[arg(long, global = true, value_name = "DIR")]
    output: Option<String>,

    /// Index template (Jinja); omit for the bundled template
    #[arg(long, global = true)]
    template: Option<String>,

    /// Notebooks exported as static HTML
    #[arg(long, global = true)]
    notebooks: Option<String>,

    /// Apps exported as run-only WASM
    #[arg(long, global = true)]
    apps: Option<String>,

    /// Notebooks exported as editable WASM
    #[arg(long, global = true)]
    notebooks_wasm: Option<String>,

    /// Enable debug logging (or set MARIMUSHKA_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Clone, Default)]
struct BuildArgs {
    /// Maximum parallel conversions
    #[arg(long)]
    jobs: Option<usize>,

    /// Per-conversion timeout in seconds (0 = none)
    #[arg(long)]
    timeout: Option<u64>,

    /// Also list notebooks whose export failed
    #[arg(long)]
    include_failed: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Export everything and write index.html
    Build(BuildArgs),
    /// List what would be exported without running marimo
    Check,
    /// Print a stock marimushka.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Command::Build(args) => {
            let config = load_config(&cli, args)?;
            println!("==> Building {}", config.output.display());

            let converter = MarimoConverter::from_config(&config.converter);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                let mut tally = output::Tally::default();
                for event in rx {
                    tally.record(&event);
                    for line in output::format_event(&event) {
                        println!("{}", line);
                    }
                }
                tally
            });

            let result = pipeline::run(&config, &converter, Some(&tx));
            drop(tx);
            let tally = printer.join().map_err(|_| "output thread panicked")?;
            let html = result?;

            if !html.is_empty() {
                println!(
                    "==> Build complete: {} ({})",
                    config.output.display(),
                    output::format_summary(&tally)
                );
            }
        }
        Command::Check => {
            let config = load_config(&cli, &BuildArgs::default())?;
            let sources = pipeline::discover(&config, None)?;
            output::print_discovery(&sources);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = std::env::var("MARIMUSHKA_LOG").unwrap_or_else(|_| {
        if verbose {
            "marimushka=debug".to_string()
        } else {
            "marimushka=warn".to_string()
        }
    });
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::new(filter))
        .try_init();
}

/// Load the config file and layer command-line flags on top.
fn load_config(cli: &Cli, args: &BuildArgs) -> Result<BuildConfig, Box<dyn std::error::Error>> {
    let path = match &cli.config {
        Some(path) if !path.exists() => {
            return Err(format!("config file not found: {}", path.display()).into());
        }
        Some(path) => path.clone(),
        None => PathBuf::from(CONFIG_FILE),
    };
    Ok(config::load_config(&path, Some(cli_overlay(cli, args)?))?)
}

/// Flags the user actually passed, as a TOML table shaped like `BuildConfig`.
fn cli_overlay(cli: &Cli, args: &BuildArgs) -> Result<toml::Value, String> {
    let mut root = toml::Table::new();
    let paths: [(&str, &Option<String>); 5] = [
        ("output", &cli.output),
        ("template", &cli.template),
        ("notebooks", &cli.notebooks),
        ("apps", &cli.apps),
        ("notebooks_wasm", &cli.notebooks_wasm),
    ];
    for (key, value) in paths {
        if let Some(path) = value {
            root.insert(key.into(), toml::Value::String(path.clone()));
        }
    }

    if let Some(timeout) = args.timeout {
        let mut converter = toml::Table::new();
        converter.insert("timeout_secs".into(), integer("--timeout", timeout)?);
        root.insert("converter".into(), toml::Value::Table(converter));
    }
    if let Some(jobs) = args.jobs {
        let mut processing = toml::Table::new();
        processing.insert("max_processes".into(), integer("--jobs", jobs)?);
        root.insert("processing".into(), toml::Value::Table(processing));
    }
    if args.include_failed {
        let mut index = toml::Table::new();
        index.insert("include_failed".into(), toml::Value::Boolean(true));
        root.insert("index".into(), toml::Value::Table(index));
    }

    Ok(toml::Value::Table(root))
}

/// TOML integers are signed 64-bit; reject flag values that do not fit.
fn integer<T>(flag: &str, value: T) -> Result<toml::Value, String>
where
    T: Copy + std::fmt::Display + TryInto<i64>,
{
    value
        .try_into()
        .map(toml::Value::Integer)
        .map_err(|_| format!("{flag} {value} is too large (maximum {})", i64::MAX))
}
