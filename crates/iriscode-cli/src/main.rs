//! iriscode CLI: latent-code extraction from iris photographs.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use iriscode::store::{self, OutputLayout, SequenceAllocator};
use iriscode::{FeatureSchema, IrisEncoder, PipelineConfig};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(Parser)]
#[command(name = "iriscode")]
#[command(about = "Extract deterministic latent codes from iris photographs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode one image and write all outputs under the data directory.
    Encode(EncodeArgs),

    /// Encode every image in a directory.
    Batch(BatchArgs),

    /// Run the pipeline without writing anything.
    Inspect(InspectArgs),

    /// Recompute the analysis record of an already-processed safe-zone image.
    Analyze(AnalyzeArgs),

    /// Regenerate codes_index.json.
    Index {
        /// Data directory holding codes/.
        #[arg(long)]
        data_dir: PathBuf,
    },

    /// Print the default pipeline configuration as JSON.
    DefaultConfig,
}

#[derive(Debug, Clone, Args)]
struct ConfigArgs {
    /// JSON file overriding parts of the default configuration.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Side length of the safe-zone image in pixels.
    #[arg(long)]
    crop_size: Option<u32>,
}

#[derive(Debug, Clone, Args)]
struct EncodeArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Output data directory.
    #[arg(long)]
    data_dir: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Debug, Clone, Args)]
struct BatchArgs {
    /// Directory with .jpg/.jpeg/.png inputs (processed in name order).
    #[arg(long)]
    input_dir: PathBuf,

    /// Output data directory.
    #[arg(long)]
    data_dir: PathBuf,

    /// Number of worker threads.
    #[arg(long, default_value = "1")]
    jobs: usize,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Debug, Clone, Args)]
struct InspectArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Print a JSON summary instead of the bare code.
    #[arg(long)]
    json: bool,

    /// Feature schema reported in the JSON summary.
    #[arg(long, value_enum, default_value_t = SchemaArg::Canonical)]
    schema: SchemaArg,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Debug, Clone, Args)]
struct AnalyzeArgs {
    /// Safe-zone image, e.g. `<data-dir>/processed/iris-001.jpg`.
    #[arg(long)]
    image: PathBuf,

    /// Write the record here instead of printing it.
    #[arg(long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    config: ConfigArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SchemaArg {
    Canonical,
    Legacy,
}

impl SchemaArg {
    fn to_core(self) -> FeatureSchema {
        match self {
            Self::Canonical => FeatureSchema::Canonical,
            Self::Legacy => FeatureSchema::Legacy,
        }
    }
}

impl ConfigArgs {
    fn to_config(&self) -> CliResult<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(size) = self.crop_size {
            config.ring.crop_size = size;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Encode(args) => run_encode(&args),
        Commands::Batch(args) => run_batch(&args),
        Commands::Inspect(args) => run_inspect(&args),
        Commands::Analyze(args) => run_analyze(&args),
        Commands::Index { data_dir } => run_index(&data_dir),
        Commands::DefaultConfig => run_default_config(),
    }
}

// ── encode ─────────────────────────────────────────────────────────────

fn run_encode(args: &EncodeArgs) -> CliResult<()> {
    let encoder = IrisEncoder::with_config(args.config.to_config()?)?;
    let layout = OutputLayout::new(&args.data_dir);
    let sequence = store::open_sequence(&layout)?;

    let code = encode_one(&encoder, &layout, &sequence, &args.image)?;
    store::refresh_index(&layout);
    println!("{code}");
    Ok(())
}

fn encode_one(
    encoder: &IrisEncoder,
    layout: &OutputLayout,
    sequence: &SequenceAllocator,
    image: &Path,
) -> CliResult<String> {
    let (analysis, out) = encoder.encode_to(image, layout, sequence)?;
    tracing::info!("Results written to {}", out.paths.code_json.display());
    Ok(analysis.code().to_string())
}

// ── batch ──────────────────────────────────────────────────────────────

fn run_batch(args: &BatchArgs) -> CliResult<()> {
    let encoder = IrisEncoder::with_config(args.config.to_config()?)?;
    let layout = OutputLayout::new(&args.data_dir);
    let sequence = store::open_sequence(&layout)?;

    let inputs = collect_inputs(&args.input_dir)?;
    if inputs.is_empty() {
        tracing::warn!("no images found in {}", args.input_dir.display());
        return Ok(());
    }
    let jobs = args.jobs.clamp(1, inputs.len());
    tracing::info!("{} images, {} worker(s)", inputs.len(), jobs);

    // Workers only write per-image files; the index is rebuilt once below.
    let cursor = AtomicUsize::new(0);
    let failures: Mutex<Vec<(PathBuf, String)>> = Mutex::new(Vec::new());
    std::thread::scope(|s| {
        for _ in 0..jobs {
            s.spawn(|| loop {
                let i = cursor.fetch_add(1, Ordering::Relaxed);
                let Some(path) = inputs.get(i) else {
                    break;
                };
                match encode_one(&encoder, &layout, &sequence, path) {
                    Ok(code) => println!("{}\t{}", path.display(), code),
                    Err(e) => {
                        tracing::warn!("{} failed: {}", path.display(), e);
                        if let Ok(mut f) = failures.lock() {
                            f.push((path.clone(), e.to_string()));
                        }
                    }
                }
            });
        }
    });

    store::refresh_index(&layout);

    let failures = failures.into_inner().unwrap_or_default();
    if failures.is_empty() {
        return Ok(());
    }
    for (path, msg) in &failures {
        eprintln!("FAILED {}: {}", path.display(), msg);
    }
    Err(format!("{} of {} images failed", failures.len(), inputs.len()).into())
}

/// Image files directly inside `dir`, sorted by name.
fn collect_inputs(dir: &Path) -> CliResult<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(dir)
        .map_err(|e| -> CliError { format!("Cannot read {}: {}", dir.display(), e).into() })?
    {
        let path = entry?.path();
        let is_image = path.is_file()
            && path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)));
        if is_image {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

// ── inspect ────────────────────────────────────────────────────────────

fn run_inspect(args: &InspectArgs) -> CliResult<()> {
    let encoder = IrisEncoder::with_config(args.config.to_config()?)?;
    let analysis = encoder.encode_path(&args.image)?;

    if args.json {
        let summary = analysis.summary_json(args.schema.to_core());
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", analysis.code());
        println!("  confidence: {:.3}", analysis.confidence());
        match &analysis.pupil {
            Some(p) => println!(
                "  pupil:      ({:.1}, {:.1}) r={:.1} via {}",
                p.center_x,
                p.center_y,
                p.radius,
                p.strategy.name()
            ),
            None => println!("  pupil:      not found (center crop)"),
        }
    }
    Ok(())
}

// ── analyze ────────────────────────────────────────────────────────────

fn run_analyze(args: &AnalyzeArgs) -> CliResult<()> {
    let config = args.config.to_config()?;
    let record = store::analyze_processed(&args.image, &config.spectral)?;
    match &args.output {
        Some(path) => {
            record.write(path)?;
            tracing::info!("Results saved to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&record)?),
    }
    Ok(())
}

// ── index ──────────────────────────────────────────────────────────────

fn run_index(data_dir: &Path) -> CliResult<()> {
    let layout = OutputLayout::new(data_dir);
    let index = store::write_index(&layout)?;
    println!(
        "{} codes indexed in {}",
        index.count,
        layout.index_path().display()
    );
    Ok(())
}

// ── default-config ─────────────────────────────────────────────────────

fn run_default_config() -> CliResult<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(&PipelineConfig::default())?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_inputs_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.PNG", "a.jpg", "c.txt", "d.jpeg"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.jpg")).unwrap();
        let names: Vec<String> = collect_inputs(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.jpg", "b.PNG", "d.jpeg"]);
    }

    #[test]
    fn crop_size_override_applies() {
        let args = ConfigArgs {
            config: None,
            crop_size: Some(300),
        };
        assert_eq!(args.to_config().unwrap().ring.crop_size, 300);
    }

    #[test]
    fn zero_crop_size_rejected() {
        let args = ConfigArgs {
            config: None,
            crop_size: Some(0),
        };
        assert!(args.to_config().is_err());
    }

    fn write_eye(path: &Path, seed: u32) {
        let (w, h, r) = (160u32, 160u32, 16.0 + seed as f64);
        image::GrayImage::from_fn(w, h, |x, y| {
            let d = (x as f64 - 80.0).hypot(y as f64 - 80.0);
            let v = if d <= r {
                12
            } else if d <= 2.4 * r {
                90 + ((x * 7 + y * 13 + seed * 5) % 60) as u8
            } else {
                225
            };
            image::Luma([v])
        })
        .save(path)
        .unwrap();
    }

    #[test]
    fn batch_with_workers_writes_complete_index() {
        let dir = tempfile::tempdir().unwrap();
        let input_dir = dir.path().join("in");
        std::fs::create_dir(&input_dir).unwrap();
        for i in 0..6 {
            write_eye(&input_dir.join(format!("eye-{i}.png")), i);
        }
        let data_dir = dir.path().join("data");
        let args = BatchArgs {
            input_dir,
            data_dir: data_dir.clone(),
            jobs: 4,
            config: ConfigArgs {
                config: None,
                crop_size: Some(96),
            },
        };
        run_batch(&args).unwrap();

        let raw = std::fs::read_to_string(data_dir.join("codes_index.json")).unwrap();
        let index: store::CodesIndex = serde_json::from_str(&raw).unwrap();
        assert_eq!(index.count, 6);
        let ids: Vec<&str> = index.codes.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            ["iris-001", "iris-002", "iris-003", "iris-004", "iris-005", "iris-006"]
        );
        for entry in &index.codes {
            assert!(entry.code.starts_with("IRIS/I?SEED="));
            assert_eq!(entry.metadata["latent_code"], entry.code.as_str());
        }
    }

    #[test]
    fn analyze_reads_confidence_from_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("eye.png");
        write_eye(&image, 2);
        let data_dir = dir.path().join("data");
        run_encode(&EncodeArgs {
            image,
            data_dir: data_dir.clone(),
            config: ConfigArgs {
                config: None,
                crop_size: Some(96),
            },
        })
        .unwrap();

        let output = dir.path().join("analysis.json");
        run_analyze(&AnalyzeArgs {
            image: data_dir.join("processed/iris-001.jpg"),
            output: Some(output.clone()),
            config: ConfigArgs {
                config: None,
                crop_size: None,
            },
        })
        .unwrap();
        let rec: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        let meta: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(data_dir.join("processed/metadata_iris-001.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(rec["waveform"].as_array().unwrap().len(), 64);
        let (a, b) = (rec["confidence"].as_f64().unwrap(), meta["confidence"].as_f64().unwrap());
        assert!((a - b).abs() < 1e-12, "{a} vs {b}");
    }

    #[test]
    fn cli_parses_batch() {
        let cli = Cli::try_parse_from([
            "iriscode", "batch", "--input-dir", "in", "--data-dir", "out", "--jobs", "4",
        ])
        .unwrap();
        match cli.command {
            Commands::Batch(args) => assert_eq!(args.jobs, 4),
            _ => panic!("expected batch"),
        }
    }
}
