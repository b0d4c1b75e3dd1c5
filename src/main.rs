use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use ferrite_filter::imaging::OutputFormat;
use ferrite_filter::pipeline::{run_archive, run_directory, JobSpec, NamingPolicy};
use ferrite_filter::kernel::MAX_KERNEL_SIZE;
use ferrite_filter::FilterParams;

/// Apply one random convolution filter per class to a labeled image dataset.
///
/// INPUT is either a zip archive or a directory laid out as
/// `<class_name>/<image files>`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dataset zip or directory
    input: PathBuf,

    /// Where to write the filtered dataset zip
    #[arg(short, long, default_value = "filtered_dataset.zip")]
    output: PathBuf,

    /// Side length of each kernel (odd)
    #[arg(short, long, default_value_t = 3, value_parser = parse_kernel_size)]
    kernel_size: usize,

    /// Upper bound of the random kernel entries
    #[arg(short, long, default_value_t = 1.0)]
    blur: f64,

    /// Value pinned at the kernel center before normalization
    #[arg(short, long, default_value_t = 1.0, conflicts_with = "no_center")]
    center: f64,

    /// Leave the kernel center random
    #[arg(long)]
    no_center: bool,

    /// Seed for reproducible kernels
    #[arg(short, long)]
    seed: Option<u64>,

    /// Worker threads for per-image filtering
    #[arg(short, long, default_value_t = 1)]
    workers: usize,

    /// Also write one original/filtered sample pair per class here
    #[arg(long)]
    samples: Option<PathBuf>,

    /// Write PNG instead of JPEG
    #[arg(long)]
    png: bool,
}

fn parse_kernel_size(s: &str) -> Result<usize, String> {
    let size: usize = s.parse().map_err(|_| format!("`{}` is not a positive integer", s))?;
    if size == 0 || size % 2 == 0 {
        return Err(format!("kernel size must be odd, got {}", size));
    }
    if size > MAX_KERNEL_SIZE {
        return Err(format!("kernel size must not exceed {}", MAX_KERNEL_SIZE));
    }
    Ok(size)
}

fn main() -> anyhow::Result<()> {
    ferrite_filter::logging::init_tracing("info")?;
    let args = Args::parse();

    let center = if args.no_center { None } else { Some(args.center) };
    let format = if args.png { OutputFormat::Png } else { OutputFormat::default() };
    let spec = JobSpec {
        params: FilterParams::new(args.kernel_size, args.blur, center),
        workers: args.workers.max(1),
        naming: NamingPolicy::new(format),
        samples_dir: args.samples.clone(),
        ..JobSpec::default()
    };

    let mut rng: Box<dyn RngCore> = match args.seed {
        Some(seed) => Box::new(ChaCha8Rng::seed_from_u64(seed)),
        None => Box::new(rand::thread_rng()),
    };

    let output = if args.input.is_dir() {
        run_directory(&args.input, &spec, &mut *rng)?
    } else if args.input.is_file() {
        let bytes = std::fs::read(&args.input)
            .with_context(|| format!("failed to read {}", args.input.display()))?;
        run_archive(&bytes, &spec, &mut *rng)?
    } else {
        bail!("{} is neither a file nor a directory", args.input.display());
    };

    std::fs::write(&args.output, &output.archive)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    for failure in &output.failures {
        warn!(file = %failure.file, error = %failure.error, "skipped item");
    }

    println!(
        "Loaded {} images from {} classes.",
        output.report.outcomes.len(),
        output.classes.len()
    );
    println!(
        "Filtered {} images ({} failed); saved to {}.",
        output.report.processed(),
        output.failures.len(),
        args.output.display()
    );
    if let Some(dir) = &args.samples {
        println!("Wrote {} sample pairs to {}.", output.report.samples.len(), dir.display());
    }
    Ok(())
}
