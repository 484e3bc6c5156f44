use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::{fmt, EnvFilter};

mod bibtex;
mod citekey;
mod commands;
mod config;
mod format;
mod library;
mod sites;
mod ui;

use commands::config::ConfigUpdate;
use commands::show::ListColumns;
use ui::error_message;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// More diagnostics on stderr (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create, update or show the configuration
    Config(ConfigArgs),

    /// Add a paper from a supported site or a direct PDF link
    Add {
        #[arg(value_name = "URL")]
        url: String,

        /// Citation key to store the paper under (default: derived from its BibTeX)
        #[arg(value_name = "CK")]
        ck: Option<String>,

        /// Only download the BibTeX
        #[arg(long)]
        no_pdf: bool,
    },

    /// Print the BibTeX of papers
    Bib {
        #[arg(required = true, value_name = "CK")]
        cks: Vec<String>,
    },

    /// Print one-line citations
    Cite {
        #[arg(required = true, value_name = "CK")]
        cks: Vec<String>,

        /// markdown or text
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List papers, optionally only those with the given tags
    List {
        #[arg(value_name = "TAG")]
        tags: Vec<String>,

        /// Also print the venue
        #[arg(long)]
        venue: bool,

        /// Also print the URL
        #[arg(long)]
        url: bool,
    },

    /// Canonicalize every .bib file in the library
    Check,

    /// Rename a paper and re-point its tags
    Rename { old: String, new: String },

    /// Open a paper's PDF
    Open { ck: String },

    /// Tag a paper (comma-separated tags)
    Tag { ck: String, tags: String },

    /// Remove some (comma-separated) or all tags from a paper
    Untag { ck: String, tags: Option<String> },

    /// List all tags
    Tags,

    /// List papers without tags
    Untagged,
}

#[derive(Args)]
struct ConfigArgs {
    /// Directory holding <ck>.pdf and <ck>.bib files
    #[arg(long)]
    bib_dir: Option<PathBuf>,

    /// Directory holding the tag tree
    #[arg(long)]
    tag_dir: Option<PathBuf>,

    /// KeepBibtex, FirstAuthorYearTitle, InitialsShortYear or InitialsFullYear
    #[arg(long)]
    default_ck: Option<String>,

    /// User-Agent for downloads (empty to reset)
    #[arg(long)]
    user_agent: Option<String>,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Config(args) => commands::config::config(ConfigUpdate {
            bib_dir: args.bib_dir,
            tag_dir: args.tag_dir,
            default_ck: args.default_ck,
            user_agent: args.user_agent,
        }),
        Commands::Add { url, ck, no_pdf } => {
            let (config, library) = commands::open_library()?;
            commands::add::add(&config, &library, &url, ck.as_deref(), no_pdf)
        }
        Commands::Bib { cks } => commands::show::bib(&commands::library()?, &cks),
        Commands::Cite { cks, format } => {
            commands::show::cite(&commands::library()?, &cks, &format)
        }
        Commands::List { tags, venue, url } => {
            commands::show::list(&commands::library()?, &tags, ListColumns { venue, url })
        }
        Commands::Check => commands::check::check(&commands::library()?).map(|_| ()),
        Commands::Rename { old, new } => {
            commands::check::rename(&commands::library()?, &old, &new)
        }
        Commands::Open { ck } => commands::show::open(&commands::library()?, &ck),
        Commands::Tag { ck, tags } => commands::tag::tag(&commands::library()?, &ck, &tags),
        Commands::Untag { ck, tags } => {
            commands::tag::untag(&commands::library()?, &ck, tags.as_deref())
        }
        Commands::Tags => commands::tag::tags(&commands::library()?),
        Commands::Untagged => commands::tag::untagged(&commands::library()?),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli.command) {
        error_message(&format!("{:#}", err));
        process::exit(1);
    }
}
