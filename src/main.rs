//! sphinx-autodoc-vyper: generate Sphinx documentation for Vyper contracts.
//!
//! `sphinx-autodoc-vyper contracts/ -o build` writes `build/docs/` (conf.py,
//! index.rst and one page per contract), runs `sphinx-build` into
//! `build/docs/_build/html`, and with `--serve` hosts the result locally.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use sphinx_autodoc_vyper::builder::{self, BuildOptions};
use sphinx_autodoc_vyper::render::sphinx::ProjectInfo;
use sphinx_autodoc_vyper::{generate, locate, parse_all, server, GeneratorOptions, LocatorOptions};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "sphinx-autodoc-vyper",
    version,
    about = "Generate Sphinx documentation for Vyper smart contracts"
)]
struct Cli {
    /// Directory containing .vy contracts (searched recursively)
    contracts_dir: PathBuf,

    /// Output directory; sources go to OUTPUT/docs
    #[arg(short = 'o', long, default_value = ".")]
    output: PathBuf,

    /// Serve the built HTML after building
    #[arg(short = 's', long)]
    serve: bool,

    /// Port for --serve
    #[arg(short = 'p', long, default_value_t = server::DEFAULT_PORT)]
    port: u16,

    /// Address for --serve
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    host: IpAddr,

    /// Only write the RST sources; do not run sphinx-build
    #[arg(long)]
    no_build: bool,

    /// Sphinx builder executable
    #[arg(long, default_value = "sphinx-build")]
    sphinx_build: PathBuf,

    /// Include @internal functions in output
    #[arg(long)]
    include_internal: bool,

    /// Skip contracts matching this glob (relative to CONTRACTS_DIR).
    /// Can be specified multiple times.
    #[arg(long)]
    exclude: Vec<String>,

    /// Skip contracts that fail to parse instead of aborting
    #[arg(long)]
    skip_invalid: bool,

    /// Project name written to conf.py and the index title
    #[arg(long)]
    project: Option<String>,

    /// Author written to conf.py
    #[arg(long)]
    author: Option<String>,

    /// Copyright line written to conf.py
    #[arg(long)]
    copyright: Option<String>,

    /// More logging (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(&cli)
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "sphinx_autodoc_vyper=info",
        1 => "sphinx_autodoc_vyper=debug",
        _ => "sphinx_autodoc_vyper=trace",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let docs_dir = cli.output.join("docs");
    let html_dir = docs_dir.join("_build").join("html");

    // Claim the port up front so a conflict is reported before any work.
    let listener = if cli.serve {
        Some(server::bind(SocketAddr::new(cli.host, cli.port))?)
    } else {
        None
    };

    let files = locate(
        &cli.contracts_dir,
        &LocatorOptions {
            exclude: cli.exclude.clone(),
        },
    )?;
    info!(count = files.len(), dir = %cli.contracts_dir.display(), "found contracts");

    let contracts = parse_all(&files, cli.skip_invalid)?;

    let defaults = ProjectInfo::default();
    let options = GeneratorOptions {
        project: ProjectInfo {
            project: cli.project.clone().unwrap_or(defaults.project),
            author: cli.author.clone().unwrap_or(defaults.author),
            copyright: cli.copyright.clone(),
        },
        include_internal: cli.include_internal,
    };
    generate(&contracts, &docs_dir, &options)
        .with_context(|| format!("failed to write documentation to {}", docs_dir.display()))?;

    if cli.no_build {
        println!("Documentation sources written to {}", docs_dir.display());
    } else {
        builder::build(
            &docs_dir,
            &html_dir,
            &BuildOptions {
                sphinx_build: cli.sphinx_build.clone(),
            },
        )?;
        println!("Documentation built successfully in {}", html_dir.display());
    }

    if let Some(listener) = listener {
        server::serve(listener, &html_dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["sphinx-autodoc-vyper", "contracts"]).unwrap();
        assert_eq!(cli.output, PathBuf::from("."));
        assert_eq!(cli.port, 8000);
        assert_eq!(cli.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert!(!cli.serve && !cli.no_build && !cli.include_internal);
    }

    #[test]
    fn repeated_flags() {
        let cli = Cli::try_parse_from([
            "sphinx-autodoc-vyper",
            "contracts",
            "--exclude",
            "mocks/*",
            "--exclude",
            "test_*.vy",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.exclude, vec!["mocks/*", "test_*.vy"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn contracts_dir_is_required() {
        assert!(Cli::try_parse_from(["sphinx-autodoc-vyper"]).is_err());
    }
}
