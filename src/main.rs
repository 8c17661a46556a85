use clap::{Parser, Subcommand};
use phongsach_build::{config, output, pipeline};
use std::path::{Path, PathBuf};
use tracing::Level;

/// Shared flags for commands that encode images.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Ignore the derivative cache and re-encode every image
    #[arg(long)]
    no_cache: bool,
}

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "phongsach-build")]
#[command(about = "Build pipeline for the tuvanphongsach.com static site")]
#[command(long_about = "\
Build pipeline for the tuvanphongsach.com static site

Fragments in pages/ are wrapped with the shared header and footer, images are
converted to AVIF/WebP <picture> elements, index pages are generated from
the built articles, and every page receives its SEO metadata.

Site structure:

  ./
  ├── site.toml                     # Build config (optional)
  ├── partials/
  │   ├── header.html               # Full document head and site header
  │   └── footer.html
  ├── pages/
  │   ├── home.html                 # Static page → index.html
  │   ├── gioi-thieu.html           # Static page → gioi-thieu.html
  │   └── ahu-la-gi.html            # Article: <meta name=\"category\" content=\"ahu\">
  ├── seo-tools/generated/
  │   └── schema-ahu-ahu-la-gi.json # JSON-LD for ahu/ahu-la-gi.html
  └── image/                        # Source images; derivatives written alongside

Outputs are written into the same root: ahu/ahu-la-gi.html, ahu/index.html,
category/, tags/, danh-muc.html, sitemap.xml, robots.txt.

Run 'phongsach-build gen-config' to generate a documented site.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Site root
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Log per-file details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every phase: articles → indexes → static pages → SEO → sitemap
    Build(CacheArgs),
    /// Build articles and their index pages, then run the SEO pass
    Articles(CacheArgs),
    /// Build static pages, then run the SEO pass
    Static(CacheArgs),
    /// Regenerate index pages from built articles
    Indexes,
    /// Inject SEO metadata into every built page
    Seo,
    /// Write sitemap.xml and robots.txt
    Sitemap,
    /// Validate the site root without writing anything
    Check,
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    match cli.command {
        Command::GenConfig => print!("{}", config::stock_config_toml()),
        command => run(&cli.root, command)?,
    }

    Ok(())
}

fn run(root: &Path, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let site = config::load_config(root)?;

    match command {
        Command::Build(cache_args) => {
            println!("==> Building {}", root.display());
            let (reports, stats) = pipeline::with_cache(root, !cache_args.no_cache, |backend| {
                pipeline::build_all(root, &site, backend)
            })?;
            output::print_build_output(&reports, Some(&stats), root);
            println!("==> Build complete");
        }
        Command::Articles(cache_args) => {
            let (reports, stats) = pipeline::with_cache(root, !cache_args.no_cache, |backend| {
                pipeline::run_articles(root, &site, backend)
            })?;
            output::print_build_output(&reports, Some(&stats), root);
        }
        Command::Static(cache_args) => {
            let (reports, stats) = pipeline::with_cache(root, !cache_args.no_cache, |backend| {
                pipeline::run_static(root, &site, backend)
            })?;
            output::print_build_output(&reports, Some(&stats), root);
        }
        Command::Indexes => {
            let report = pipeline::indexes_phase(root, &site)?;
            output::print_build_output(&[report], None, root);
        }
        Command::Seo => {
            let report = pipeline::seo_phase(root, &site)?;
            output::print_build_output(&[report], None, root);
        }
        Command::Sitemap => {
            let report = pipeline::sitemap_phase(root, &site)?;
            output::print_build_output(&[report], None, root);
        }
        Command::Check => {
            println!("==> Checking {}", root.display());
            let report = pipeline::check(root, &site)?;
            output::print_check_output(&report);
            println!("==> Site root is valid");
        }
        Command::GenConfig => print!("{}", config::stock_config_toml()),
    }
    Ok(())
}
