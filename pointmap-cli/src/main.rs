//! CLI for the pointmap entity mapping engine.
//!
//! Maps host CPU samples between JSON, line protocol, and query rows, and
//! runs a write/read round trip through the in-memory store.

mod host;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use pointmap::memory::MemoryStore;
use pointmap::{
    Entity, MapperConfig, Point, Repository, Row, SchemaCache, hydrate_all, line_protocol, serialize,
};
use tracing_subscriber::EnvFilter;

use crate::host::HostCpu;

/// pointmap: map typed entities to time-series points and back.
#[derive(Parser)]
#[command(name = "pointmap", version, about)]
struct Cli {
    /// Mapper configuration file (JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Print the compiled schema of the host CPU entity.
    Schema,

    /// Serialize a JSON array of host CPU samples into points.
    Encode {
        /// Input file, or `-` for stdin.
        #[arg(default_value = "-")]
        input: PathBuf,

        /// Output format.
        #[arg(long, default_value = "line")]
        format: PointFormat,
    },

    /// Hydrate a JSON array of query rows into host CPU samples.
    Decode {
        /// Input file, or `-` for stdin.
        #[arg(default_value = "-")]
        input: PathBuf,
    },

    /// Write synthetic samples to the memory store and read them back.
    Bench {
        /// Number of samples to write.
        #[arg(long, default_value = "100000")]
        samples: u32,

        /// Number of distinct hosts.
        #[arg(long, default_value = "16")]
        hosts: u32,
    },
}

/// Output format for encoded points.
#[derive(Clone, ValueEnum)]
enum PointFormat {
    /// InfluxDB line protocol.
    Line,
    /// JSON array of point objects.
    Json,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Schema => cmd_schema(config),
        Commands::Encode { input, format } => cmd_encode(&input, &format, config),
        Commands::Decode { input } => cmd_decode(&input, config),
        Commands::Bench { samples, hosts } => cmd_bench(samples, hosts, config),
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<MapperConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(MapperConfig::load(path)?),
        None => Ok(MapperConfig::default()),
    }
}

fn read_input(input: &Path) -> Result<String, Box<dyn std::error::Error>> {
    if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read_to_string(input)?)
    }
}

/// Implements `pointmap schema`.
fn cmd_schema(config: MapperConfig) -> CliResult {
    let schema = SchemaCache::global().get_with::<HostCpu>(config.inherit_properties)?;
    println!("Entity: {}", HostCpu::TYPE.name());
    println!("{}", serde_json::to_string_pretty(&*schema)?);
    Ok(())
}

/// Implements `pointmap encode <input>`.
fn cmd_encode(input: &Path, format: &PointFormat, config: MapperConfig) -> CliResult {
    let samples: Vec<HostCpu> = serde_json::from_str(&read_input(input)?)?;
    let schema = SchemaCache::global().get_with::<HostCpu>(config.inherit_properties)?;

    let points = samples
        .iter()
        .map(|sample| serialize(&schema, sample))
        .collect::<pointmap::Result<Vec<Point>>>()?;

    match format {
        PointFormat::Line => println!("{}", line_protocol::encode_batch(&points)?),
        PointFormat::Json => println!("{}", serde_json::to_string_pretty(&points)?),
    }
    Ok(())
}

/// Implements `pointmap decode <input>`.
fn cmd_decode(input: &Path, config: MapperConfig) -> CliResult {
    let json: serde_json::Value = serde_json::from_str(&read_input(input)?)?;
    let serde_json::Value::Array(items) = json else {
        return Err("expected a JSON array of row objects".into());
    };

    let rows = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| Row::from_json(item).ok_or_else(|| format!("row {i} is not an object")))
        .collect::<Result<Vec<_>, _>>()?;

    let schema = SchemaCache::global().get_with::<HostCpu>(config.inherit_properties)?;
    let samples: Vec<HostCpu> = hydrate_all(&schema, &rows, config.row_errors)?;
    println!("{}", serde_json::to_string_pretty(&samples)?);
    Ok(())
}

/// Implements `pointmap bench`.
#[allow(clippy::cast_precision_loss)]
fn cmd_bench(samples: u32, hosts: u32, config: MapperConfig) -> CliResult {
    if hosts == 0 {
        return Err("--hosts must be at least 1".into());
    }

    println!("pointmap round-trip benchmark");
    println!("  Samples: {samples}");
    println!("  Hosts: {hosts}");
    println!("  Precision: {}", config.precision);
    println!();

    let repo = Repository::<HostCpu, _>::new(MemoryStore::new(), config)?;

    let base_time = 1_700_000_000_i64;
    let batch: Vec<HostCpu> = (0..samples)
        .map(|i| HostCpu {
            host: format!("host-{}", i % hosts),
            core: Some(i64::from(i % 8)),
            usage: f64::from(i % 100),
            steal: Some(0.01),
            extra: serde_json::Map::new(),
            time: Some(base_time + i64::from(i)),
        })
        .collect();

    let start = Instant::now();
    let written = repo.write_all(&batch)?;
    let write_elapsed = start.elapsed();

    let start = Instant::now();
    let read = repo.find_all(&[])?;
    let read_elapsed = start.elapsed();

    let per_write = write_elapsed.as_nanos() as f64 / written.max(1) as f64;
    let per_read = read_elapsed.as_nanos() as f64 / read.len().max(1) as f64;

    println!("Results:");
    println!("  Written: {written} in {write_elapsed:.3?} ({per_write:.1} ns/entity)");
    println!("  Read: {} in {read_elapsed:.3?} ({per_read:.1} ns/entity)", read.len());
    println!("  Stored points: {}", repo.client().len());

    Ok(())
}
