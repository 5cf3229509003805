use clap::{ArgAction, Parser, Subcommand};
use packetfs::name::{self, NameParts};
use packetfs::sanitize::{is_troublesome, sanitize_name};
use packetfs::{
    list_packets, rename_packet, sort, IndexCriterion, IndexOrder, LocalFs, Packet, Properties,
    PropertiesCache, PropertyCriterion, PropertyKind, PropertyOrder, PropertyStore,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "packetfs", about = "Inspect and manage packets of related files")]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace); overrides RUST_LOG
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split paths into primary name, descriptor and extension
    Parse {
        #[arg(required = true, num_args = 1..)]
        paths: Vec<String>,
        /// Print a JSON array instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List the packets found in a directory
    Packets {
        dir: PathBuf,
    },
    /// Report whether names contain troublesome characters
    Check {
        #[arg(required = true, num_args = 1..)]
        names: Vec<String>,
    },
    /// Print the portable form of each name
    Sanitize {
        #[arg(required = true, num_args = 1..)]
        names: Vec<String>,
    },
    /// Print the properties of a packet
    Props {
        /// Any member path, or the packet path itself
        packet: PathBuf,
        /// Treat the path as a directory and show its own properties
        #[arg(long)]
        blank: bool,
    },
    /// Replace the properties of a packet with a JSON object
    Set {
        packet: PathBuf,
        json:   String,
        #[arg(long)]
        blank:  bool,
    },
    /// Rename every member of a packet
    Rename {
        from: PathBuf,
        to:   PathBuf,
    },
    /// Print the packets of a directory in property or index order
    Sort {
        dir: PathBuf,
        /// Order by this property of each packet
        #[arg(long, value_name = "FIELD", required_unless_present = "by_index", conflicts_with = "by_index")]
        by_property: Option<String>,
        /// Order by position in this array of the directory's properties
        #[arg(long, value_name = "FIELD")]
        by_index: Option<String>,
        /// Key conversion: natural (default), numeric, lexical, locale, date
        #[arg(short, long, default_value = "natural")]
        kind: PropertyKind,
        #[arg(short, long)]
        descending: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {

        // ── Parse ────────────────────────────────────────────────────────────
        Commands::Parse { paths, json: true } => {
            let parsed: Vec<ParsedPath> = paths
                .iter()
                .map(|path| ParsedPath { path, parts: name::decompose(path) })
                .collect();
            println!("{}", serde_json::to_string_pretty(&parsed)?);
        }
        Commands::Parse { paths, json: false } => {
            println!("{:<32} {:<20} {:<16} {}", "Path", "Primary", "Descriptor", "Extension");
            for path in &paths {
                let parts = name::decompose(path);
                println!("{:<32} {:<20} {:<16} {}",
                    path, parts.primary, parts.descriptor, parts.extension);
            }
        }

        // ── Packets ──────────────────────────────────────────────────────────
        Commands::Packets { dir } => {
            for packet in list_packets(&LocalFs, &dir)? {
                println!("{packet}");
            }
        }

        // ── Check ────────────────────────────────────────────────────────────
        Commands::Check { names } => {
            let mut bad = 0;
            for n in &names {
                if is_troublesome(n) {
                    bad += 1;
                    println!("troublesome  {n:?}");
                } else {
                    println!("ok           {n:?}");
                }
            }
            if bad > 0 {
                return Err(format!("{bad} troublesome name(s)").into());
            }
        }

        // ── Sanitize ─────────────────────────────────────────────────────────
        Commands::Sanitize { names } => {
            for n in &names {
                println!("{}", sanitize_name(n)?);
            }
        }

        // ── Props ────────────────────────────────────────────────────────────
        Commands::Props { packet, blank } => {
            let store = PropertyStore::new(LocalFs);
            let props = store.read(&target(&packet, blank))?;
            println!("{}", serde_json::to_string_pretty(&props)?);
        }

        // ── Set ──────────────────────────────────────────────────────────────
        Commands::Set { packet, json, blank } => {
            let props: Properties = serde_json::from_str(&json)
                .map_err(|e| format!("expected a JSON object: {e}"))?;
            let store = PropertyStore::new(LocalFs);
            let packet = target(&packet, blank);
            store.save(&packet, &props)?;
            println!("Wrote: {}", store.sidecar_path(&packet).display());
        }

        // ── Rename ───────────────────────────────────────────────────────────
        Commands::Rename { from, to } => {
            let (from, to) = (Packet::new(&from), Packet::new(&to));
            rename_packet(&LocalFs, &from, &to)?;
            println!("Renamed {from} → {to}");
        }

        // ── Sort ─────────────────────────────────────────────────────────────
        Commands::Sort { dir, by_property, by_index, kind, descending } => {
            let paths: Vec<PathBuf> = list_packets(&LocalFs, &dir)?
                .into_iter()
                .map(|p| p.path().to_owned())
                .collect();
            let mut cache = PropertiesCache::new(PropertyStore::new(LocalFs));
            let sorted = match (by_property, by_index) {
                (Some(field), _) => {
                    let mut order = PropertyOrder::new(field).kind(kind);
                    if descending { order = order.descending(); }
                    sort(paths, &mut PropertyCriterion::new(&mut cache, order))?
                }
                (None, Some(field)) => {
                    let mut order = IndexOrder::new(field);
                    if descending { order = order.descending(); }
                    sort(paths, &mut IndexCriterion::new(&mut cache, order))?
                }
                (None, None) => paths,
            };
            for path in sorted {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ParsedPath<'a> {
    path:  &'a str,
    #[serde(flatten)]
    parts: NameParts<'a>,
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn target(path: &Path, blank: bool) -> Packet {
    if blank { Packet::blank(path) } else { Packet::new(path) }
}
