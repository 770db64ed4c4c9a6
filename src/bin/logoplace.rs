use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "logoplace", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite every job in a JSON job list.
    Run(RunArgs),
    /// Print the anchor a placement label resolves to.
    Locate(LocateArgs),
    /// List supplier folders under the photo root.
    Suppliers(SuppliersArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// JSON array of job records.
    #[arg(long)]
    jobs: PathBuf,

    /// Settings JSON. Flags below override it.
    #[arg(long)]
    settings: Option<PathBuf>,

    #[arg(long)]
    photo_root: Option<PathBuf>,

    #[arg(long)]
    decoration_root: Option<PathBuf>,

    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Also copy outputs here.
    #[arg(long)]
    thumbnail_dir: Option<PathBuf>,

    /// Also copy outputs here as finals.
    #[arg(long)]
    final_dir: Option<PathBuf>,

    /// Decoration width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Worker threads (omit for sequential).
    #[arg(long)]
    threads: Option<usize>,

    /// Keep photo background as is.
    #[arg(long)]
    keep_background: bool,

    /// Write `<output>.placement.json` beside each output.
    #[arg(long)]
    manifest: bool,

    /// Landmark source.
    #[arg(long, value_enum, default_value_t = LandmarkChoice::Sidecar)]
    landmarks: LandmarkChoice,
}

#[derive(Parser, Debug)]
struct LocateArgs {
    /// Placement label, e.g. LEFT-CHEST.
    #[arg(long)]
    label: String,

    #[arg(long)]
    width: u32,

    #[arg(long)]
    height: u32,

    /// Keypoint sidecar JSON.
    #[arg(long)]
    keypoints: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct SuppliersArgs {
    #[arg(long)]
    photo_root: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LandmarkChoice {
    /// Never detect landmarks.
    None,
    /// Read `<photo>.keypoints.json` sidecars.
    Sidecar,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Locate(args) => cmd_locate(args),
        Command::Suppliers(args) => cmd_suppliers(args),
    }
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let mut settings = match &args.settings {
        Some(path) => logoplace::Settings::load(path)?,
        None => logoplace::Settings::default(),
    };
    if let Some(v) = args.photo_root {
        settings.photo_root = v;
    }
    if let Some(v) = args.decoration_root {
        settings.decoration_root = v;
    }
    if let Some(v) = args.output_dir {
        settings.output_dir = v;
    }
    if let Some(v) = args.thumbnail_dir {
        settings.thumbnail_dir = Some(v);
    }
    if let Some(v) = args.final_dir {
        settings.final_dir = Some(v);
    }
    if let Some(v) = args.width {
        settings.decoration_width = v;
    }
    if args.threads.is_some() {
        settings.threads = args.threads;
    }
    if args.keep_background {
        settings.neutralize_background = false;
    }
    settings.validate()?;
    settings.apply_root_swap();

    let pdf = logoplace::Pdftoppm::new(settings.pdf_rasterizer.clone(), settings.vector_dpi);
    if !pdf.is_available() {
        tracing::warn!(
            program = %pdf.program.display(),
            "pdf rasterizer not found; pdf decorations will fail"
        );
    }

    let jobs = logoplace::load_jobs(&args.jobs)?;
    let finals = settings.final_dir.clone();
    let thumbnails = settings.thumbnail_dir.clone();
    let mut placer = logoplace::Placer::new(settings)?;
    if finals.is_some() || thumbnails.is_some() {
        placer = placer.with_export(logoplace::FileCopyExport::new(finals, thumbnails));
    }
    if args.manifest {
        placer = placer.with_export(logoplace::ManifestExport);
    }

    let factory: Arc<dyn logoplace::ExtractorFactory> = match args.landmarks {
        LandmarkChoice::None => Arc::new(no_landmarks),
        LandmarkChoice::Sidecar => Arc::new(sidecar_landmarks),
    };

    let report = logoplace::run_batch(&placer, &jobs, factory, &|done, total| {
        eprintln!("[{done}/{total}]");
    })?;

    for r in &report.succeeded {
        eprintln!("wrote {}", r.primary.output_path.display());
        if let Some(front) = &r.front {
            eprintln!("wrote {}", front.output_path.display());
        }
    }
    for f in &report.failed {
        eprintln!("failed {}: {}", f.output_name, f.error);
    }
    if !report.failed.is_empty() {
        anyhow::bail!("{} of {} jobs failed", report.failed.len(), report.total());
    }
    Ok(())
}

fn no_landmarks() -> logoplace::PlaceResult<Arc<dyn logoplace::FeatureExtractor>> {
    Ok(Arc::new(logoplace::NoLandmarks))
}

fn sidecar_landmarks() -> logoplace::PlaceResult<Arc<dyn logoplace::FeatureExtractor>> {
    Ok(Arc::new(logoplace::SidecarKeypoints))
}

fn cmd_locate(args: LocateArgs) -> anyhow::Result<()> {
    let keypoints = match &args.keypoints {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("read keypoints '{}'", path.display()))?;
            logoplace::SidecarKeypoints::parse(&json, args.width, args.height)?
        }
        None => None,
    };

    let r = logoplace::LocationResolver::default().resolve(
        &args.label,
        keypoints.as_ref(),
        args.width,
        args.height,
    );
    let out = serde_json::json!({
        "label": args.label,
        "zone": r.zone,
        "mode": r.mode,
        "x": r.anchor.x,
        "y": r.anchor.y,
    });
    println!("{out}");
    Ok(())
}

fn cmd_suppliers(args: SuppliersArgs) -> anyhow::Result<()> {
    for name in logoplace::list_subdirectories(&args.photo_root)? {
        println!("{name}");
    }
    Ok(())
}
