//! gen1view - browse and summarize `gen1` particle trees.
//!
//! Usage:
//!   gen1view browse gen1_tau.root          # interactive browser
//!   gen1view compare a.root b.root         # two-file comparison
//!   gen1view unreco gen1.root --top 15     # reconstruction summary
//!   gen1view spectrum gen1.root            # pion energy spectra
//!   gen1view list gen1.root --event 3      # per-particle listing
//!   gen1view dump gen1.root -o gen1.json   # export as JSON
//!   gen1view trackscore tracks.root        # muon vs pion track scores
//!   gen1view dedx tracks.root              # dE/dx vs residual range
//!   gen1view branches tracks.root --tree ana/tree

use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use gen1view::analysis::{
    DedxOptions, DedxReport, EventListing, SpectrumOptions, SpectrumReport, TrackScoreOptions,
    TrackScoreReport, UnrecoOptions, UnrecoReport,
};
use gen1view::browser::{BrowseSession, BrowserConfig, Pager, compare, file_label};
use gen1view::pdg::PdgCatalog;
use gen1view::policy::ExclusionSet;
use gen1view::source::{
    DEFAULT_TRACK_TREE, DEFAULT_TREE, LoadOptions, list_branches, load, load_tracks, write_json,
};

/// Event browser and reports for gen1 particle trees.
#[derive(Parser)]
#[command(name = "gen1view", about = "Event browser for gen1 particle trees", version)]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// Tree path inside ROOT files.
    #[arg(long, global = true, env = "GEN1VIEW_TREE", default_value = DEFAULT_TREE)]
    tree: String,

    /// PDG codes treated as not reconstructable.
    #[arg(long, global = true, value_enum, default_value_t = Exclusions::Standard)]
    exclusions: Exclusions,

    /// Additional PDG code to treat as not reconstructable (repeatable, matches |pdg|).
    #[arg(long = "exclude", global = true, value_name = "PDG")]
    exclude: Vec<i32>,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Exclusions {
    /// Neutrals, neutrinos, Ar40 and neutral kaons by |pdg|.
    Standard,
    /// Neutrals by exact code, neutrinos by |pdg|.
    Legacy,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse events one at a time.
    Browse {
        file: PathBuf,

        /// Do not clear the terminal between events.
        #[arg(long)]
        no_clear: bool,
    },
    /// Compare particle statistics of two files.
    Compare { file_a: PathBuf, file_b: PathBuf },
    /// Reconstructed vs unreconstructed counts per particle species.
    Unreco {
        file: PathBuf,

        /// Neutrino flavour shown in the title.
        #[arg(long, default_value = "muon")]
        nu_type: String,

        /// Interaction type shown in the title.
        #[arg(long, default_value = "CC")]
        interaction: String,

        /// Event count shown in the title (default: events in the file).
        #[arg(long)]
        events: Option<usize>,

        /// Number of species to show.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Energy spectra of charged pions.
    Spectrum {
        file: PathBuf,

        /// Particle generation to select.
        #[arg(long, default_value_t = 1)]
        generation: i32,

        /// Histogram bins.
        #[arg(long, default_value_t = 20)]
        bins: usize,
    },
    /// Per-particle listing of one event.
    List {
        file: PathBuf,

        /// One-based event number.
        #[arg(long, default_value_t = 1)]
        event: usize,
    },
    /// Export the table as JSON.
    Dump {
        file: PathBuf,

        /// Output path (default: stdout).
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Track score distributions of muons and charged pions.
    Trackscore {
        file: PathBuf,

        /// Per-track tree path inside the ROOT file.
        #[arg(long, env = "GEN1VIEW_TRACK_TREE", default_value = DEFAULT_TRACK_TREE)]
        track_tree: String,

        /// Histogram bins over [0, 1].
        #[arg(long, default_value_t = 50)]
        bins: usize,
    },
    /// Mean dE/dx per residual range bin, all tracks then muons and pions.
    Dedx {
        file: PathBuf,

        /// Per-track tree path inside the ROOT file.
        #[arg(long, env = "GEN1VIEW_TRACK_TREE", default_value = DEFAULT_TRACK_TREE)]
        track_tree: String,

        /// Residual range bins.
        #[arg(long, default_value_t = 13)]
        bins: usize,

        /// Upper edge of the residual range window, cm.
        #[arg(long, default_value_t = 130.0)]
        max_range: f64,

        /// Upper edge of the dE/dx window, MeV/cm.
        #[arg(long, default_value_t = 15.0)]
        max_dedx: f64,
    },
    /// List the branches of the tree selected with --tree.
    Branches { file: PathBuf },
}

/// Initializes the tracing subscriber on stderr.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("gen1view={}", level).parse() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn exclusion_set(args: &Args) -> ExclusionSet {
    let base = match args.exclusions {
        Exclusions::Standard => ExclusionSet::standard(),
        Exclusions::Legacy => ExclusionSet::legacy(),
    };
    args.exclude.iter().fold(base, |set, &pdg| set.exclude(pdg))
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let options = LoadOptions {
        tree: args.tree.clone(),
    };
    let policy = exclusion_set(&args);
    let names = PdgCatalog::new();

    match args.command {
        Commands::Browse { file, no_clear } => {
            let mut session = BrowseSession::open(&file, &options)?.with_policy(policy);
            let config = BrowserConfig {
                clear_screen: !no_clear,
            };
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            Pager::new(stdin.lock(), stdout.lock(), config).run(&mut session)?;
        }
        Commands::Compare { file_a, file_b } => {
            let table_a = load(&file_a, &options)?;
            let table_b = load(&file_b, &options)?;
            let report = compare(
                &file_label(&file_a),
                &table_a,
                &file_label(&file_b),
                &table_b,
                &names,
            );
            print!("{}", report);
        }
        Commands::Unreco {
            file,
            nu_type,
            interaction,
            events,
            top,
        } => {
            let table = load(&file, &options)?;
            let unreco = UnrecoOptions {
                neutrino_type: nu_type,
                interaction,
                events,
                top,
            };
            print!("{}", UnrecoReport::build(&table, &policy, &names, &unreco));
        }
        Commands::Spectrum {
            file,
            generation,
            bins,
        } => {
            let table = load(&file, &options)?;
            let spectrum = SpectrumOptions { generation, bins };
            print!("{}", SpectrumReport::build(&table, &spectrum));
        }
        Commands::List { file, event } => {
            let table = load(&file, &options)?;
            let selected = event
                .checked_sub(1)
                .and_then(|ordinal| table.event(ordinal))
                .ok_or_else(|| {
                    format!(
                        "Event {} out of range (file has {} events)",
                        event,
                        table.event_count()
                    )
                })?;
            let listing =
                EventListing::build(&file_label(&file), &selected, table.event_count(), &names);
            print!("{}", listing);
        }
        Commands::Dump { file, output } => {
            let table = load(&file, &options)?;
            match output {
                Some(path) => {
                    let mut out = BufWriter::new(File::create(&path)?);
                    write_json(&table, &options.tree, &mut out)?;
                    out.flush()?;
                }
                None => write_json(&table, &options.tree, &mut std::io::stdout().lock())?,
            }
        }
        Commands::Trackscore {
            file,
            track_tree,
            bins,
        } => {
            let tracks = load_tracks(&file, &track_tree)?;
            print!("{}", TrackScoreReport::build(&tracks, &TrackScoreOptions { bins }));
        }
        Commands::Dedx {
            file,
            track_tree,
            bins,
            max_range,
            max_dedx,
        } => {
            let tracks = load_tracks(&file, &track_tree)?;
            let dedx = DedxOptions {
                max_range,
                max_dedx,
                bins,
            };
            print!("{}", DedxReport::build(&tracks, &dedx));
        }
        Commands::Branches { file } => {
            let branches = list_branches(&file, &options.tree)?;
            println!("Branches in '{}' of {}:", options.tree, file_label(&file));
            for branch in &branches {
                println!("  {}", branch);
            }
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
