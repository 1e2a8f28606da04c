use anyhow::Context as _;
use anyhow::Result;
use itertools::Itertools as _;
use kmeans_trail::history::Frame;
use kmeans_trail::Chebyshev;
use kmeans_trail::Cluster as _;
use kmeans_trail::Distance;
use kmeans_trail::Euclidean;
use kmeans_trail::KMeansPlusPlus;
use kmeans_trail::Manhattan;
use kmeans_trail::Point2D;
use kmeans_trail::RandomSeeding;
use kmeans_trail::Run;
use kmeans_trail::Seeding;
use kmeans_trail::Termination;
use rand::Rng;
use std::env;
use std::fs;
use std::io;
use std::process;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::Registry;
use tracing_tree::HierarchicalLayer;

/// Parses the command line, handling `-h` for every tool.
///
/// `help_after` is printed after the option list.
pub fn parse_args(
    mut options: getopts::Options,
    usage: &str,
    help_after: &str,
    max_free_args: usize,
) -> Result<getopts::Matches> {
    options.optflag("h", "help", "print this help menu");

    let matches = options.parse(env::args().skip(1))?;

    if matches.opt_present("h") {
        eprintln!("{}", options.usage(usage));
        eprint!("{help_after}");
        process::exit(0);
    }
    if max_free_args < matches.free.len() {
        anyhow::bail!("too many arguments\n\n{}", options.usage(usage));
    }

    Ok(matches)
}

/// Sends traces to stderr, filtered by the `LOG` environment variable.
pub fn init_tracing() {
    Registry::default()
        .with(EnvFilter::from_env("LOG"))
        .with(
            HierarchicalLayer::new(4)
                .with_targets(true)
                .with_bracketed_fields(true),
        )
        .init();
}

/// Opens the given file, or stdin.
pub fn reader(path: Option<&String>) -> Result<Box<dyn io::BufRead>> {
    Ok(match path {
        Some(path) if path != "-" => {
            let file =
                fs::File::open(path).with_context(|| format!("failed to open {path:?}"))?;
            Box::new(io::BufReader::new(file))
        }
        _ => Box::new(io::stdin().lock()),
    })
}

/// Creates the given file, or writes to stdout.
pub fn writer(path: Option<&String>) -> Result<Box<dyn io::Write>> {
    Ok(match path {
        Some(path) if path != "-" => {
            let file =
                fs::File::create(path).with_context(|| format!("failed to create {path:?}"))?;
            Box::new(io::BufWriter::new(file))
        }
        _ => Box::new(io::BufWriter::new(io::stdout().lock())),
    })
}

fn parse_point(line: &str) -> Result<Point2D> {
    let mut coords = line.split_whitespace();
    let (x, y) = match (coords.next(), coords.next(), coords.next()) {
        (Some(x), Some(y), None) => (x, y),
        _ => anyhow::bail!("expected two coordinates, got {line:?}"),
    };
    let x: f64 = x
        .parse()
        .with_context(|| format!("invalid coordinate {x:?}"))?;
    let y: f64 = y
        .parse()
        .with_context(|| format!("invalid coordinate {y:?}"))?;
    Ok(Point2D::new(x, y))
}

/// Reads one `x y` point per line.  Blank lines and `#` comments are skipped.
pub fn read_points(r: impl io::BufRead) -> Result<Vec<Point2D>> {
    let mut points = Vec::new();
    for (line_idx, line) in r.lines().enumerate() {
        let line = line.context("failed to read input")?;
        let line = match line.split_once('#') {
            Some((content, _comment)) => content,
            None => &line,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let point = parse_point(line).with_context(|| format!("line {}", line_idx + 1))?;
        points.push(point);
    }
    Ok(points)
}

pub fn write_points(mut w: impl io::Write, points: &[Point2D]) -> io::Result<()> {
    for point in points {
        writeln!(w, "{} {}", point.x, point.y)?;
    }
    w.flush()
}

/// Random points in `[0, width] x [0, height]`.
///
/// With `blob_count == 0` points are uniform, otherwise they are spread
/// uniformly in discs around `blob_count` random centers.
pub fn generate_points(
    rng: &mut impl Rng,
    count: usize,
    blob_count: usize,
    width: f64,
    height: f64,
) -> Vec<Point2D> {
    if blob_count == 0 {
        return (0..count)
            .map(|_| Point2D::new(rng.gen_range(0.0..=width), rng.gen_range(0.0..=height)))
            .collect();
    }

    let radius = f64::min(width, height) / (2.0 * blob_count as f64);
    let centers: Vec<Point2D> = (0..blob_count)
        .map(|_| {
            Point2D::new(
                rng.gen_range(radius..=width - radius),
                rng.gen_range(radius..=height - radius),
            )
        })
        .collect();

    (0..count)
        .map(|i| {
            let center = centers[i % blob_count];
            let angle = rng.gen_range(0.0..std::f64::consts::TAU);
            let distance = radius * rng.gen_range(0.0..=1.0_f64).sqrt();
            center + distance * Point2D::new(angle.cos(), angle.sin())
        })
        .collect()
}

/// Seeding strategy from its command-line name.
pub fn parse_seeding<R>(name: &str, rng: R) -> Result<Box<dyn Seeding>>
where
    R: Rng + 'static,
{
    Ok(match name {
        "random" => Box::new(RandomSeeding { rng }),
        "kmeans++" | "k-means++" => Box::new(KMeansPlusPlus { rng }),
        _ => anyhow::bail!("unknown seeding strategy {name:?}, expected random or kmeans++"),
    })
}

/// Distance from its command-line name.
pub fn parse_distance(name: &str) -> Result<Box<dyn Distance>> {
    Ok(match name {
        "euclidean" | "l2" => Box::new(Euclidean),
        "manhattan" | "l1" => Box::new(Manhattan),
        "chebyshev" | "linf" => Box::new(Chebyshev),
        _ => anyhow::bail!(
            "unknown distance {name:?}, expected euclidean, manhattan or chebyshev"
        ),
    })
}

pub fn write_summary(mut w: impl io::Write, run: &Run, verbose: bool) -> io::Result<()> {
    writeln!(w, "items: {}", run.items().len())?;
    writeln!(w, "clusters: {}", run.cluster_seeds().clusters().len())?;
    writeln!(w, "iterations: {}", run.last_order())?;
    writeln!(w, "sizes: {}", final_sizes(run).iter().format(" "))?;
    match run.termination() {
        Termination::Converged { shift } => writeln!(w, "termination: converged (shift {shift})")?,
        Termination::IterationCap => writeln!(w, "termination: iteration cap")?,
    }
    for cluster in run.cluster_seeds().clusters() {
        let seed = cluster.centroid();
        writeln!(w, "seed {}: {} {}", cluster.id().0, seed.x, seed.y)?;
    }
    if verbose {
        for iteration in run.iterations() {
            writeln!(w, "inertia {}: {}", iteration.order(), iteration.inertia())?;
        }
    }
    Ok(())
}

pub fn write_frame(mut w: impl io::Write, frame: &Frame<'_>) -> io::Result<()> {
    writeln!(
        w,
        "frame {} (iteration {}, {})",
        frame.index, frame.order, frame.phase,
    )?;
    for cluster in &frame.clusters {
        let centroid = cluster.centroid();
        writeln!(
            w,
            "  cluster {}: centroid {} {}, links {}, members [{}]",
            cluster.id.0,
            centroid.x,
            centroid.y,
            cluster.links().count(),
            cluster.members.iter().map(|item| item.id().0).format(" "),
        )?;
    }
    for (id, path) in &frame.paths {
        writeln!(
            w,
            "  path {}: {}",
            id.0,
            path.iter().map(|p| format!("({} {})", p.x, p.y)).format(" -> "),
        )?;
    }
    Ok(())
}

/// Number of members of each cluster in the final iteration, by id.
pub fn final_sizes(run: &Run) -> Vec<usize> {
    run.final_iteration()
        .clusters()
        .iter()
        .map(|cluster| cluster.len())
        .collect()
}
