use anyhow::Context as _;
use anyhow::Result;
use kmeans_trail::History;
use kmeans_trail::Item;
use rand::SeedableRng as _;
use rand_pcg::Pcg64;
use std::io::Write as _;

const USAGE: &str = "Usage: kmeans-replay [options] [in-plot [out]] <in.plot >out";

fn main() -> Result<()> {
    let mut options = getopts::Options::new();
    options.optopt("k", "clusters", "number of clusters (default: 3)", "COUNT");
    options.optopt("s", "seed", "seed of the random generator (default: 0)", "SEED");
    options.optopt(
        "t",
        "tolerance",
        "largest centroid move of a converged run (default: 1e-4)",
        "DISTANCE",
    );
    options.optopt(
        "i",
        "max-iter",
        "maximum number of iterations (default: 100)",
        "COUNT",
    );
    options.optopt(
        "",
        "init",
        "seeding strategy: random or kmeans++ (default: random)",
        "NAME",
    );
    options.optopt(
        "d",
        "distance",
        "euclidean, manhattan or chebyshev (default: euclidean)",
        "NAME",
    );
    options.optopt("f", "frame", "only print this frame", "INDEX");
    options.optflag("v", "verbose", "print the inertia of each iteration");

    let matches =
        kmeans_trail_tools::parse_args(options, USAGE, include_str!("help_after.txt"), 2)?;

    kmeans_trail_tools::init_tracing();

    let cluster_count: usize = matches
        .opt_get_default("k", 3)
        .context("invalid value for option 'clusters'")?;
    let seed: u64 = matches
        .opt_get_default("s", 0)
        .context("invalid value for option 'seed'")?;
    let tolerance: f64 = matches
        .opt_get_default("t", 1e-4)
        .context("invalid value for option 'tolerance'")?;
    let max_iter: usize = matches
        .opt_get_default("i", 100)
        .context("invalid value for option 'max-iter'")?;
    let frame: Option<usize> = matches
        .opt_get("f")
        .context("invalid value for option 'frame'")?;

    let init = matches.opt_str("init").unwrap_or_else(|| "random".to_owned());
    let mut seeding = kmeans_trail_tools::parse_seeding(&init, Pcg64::seed_from_u64(seed))?;
    let distance = matches
        .opt_str("d")
        .unwrap_or_else(|| "euclidean".to_owned());
    let distance = kmeans_trail_tools::parse_distance(&distance)?;

    let input = kmeans_trail_tools::reader(matches.free.first())?;
    let points = kmeans_trail_tools::read_points(input).context("failed to read points")?;

    let run = kmeans_trail::run(
        Item::from_points(points),
        cluster_count,
        &mut seeding,
        &*distance,
        tolerance,
        max_iter,
    )
    .context("failed to run k-means")?;
    let history = History::new(&run);

    let mut output = kmeans_trail_tools::writer(matches.free.get(1))?;
    match frame {
        Some(frame) => {
            let frame = history
                .render_frame(frame)
                .context("invalid value for option 'frame'")?;
            kmeans_trail_tools::write_frame(&mut output, &frame)?;
        }
        None => {
            let verbose = matches.opt_present("v");
            kmeans_trail_tools::write_summary(&mut output, &run, verbose)?;
            for frame in 1..=history.frame_count() {
                let frame = history.render_frame(frame)?;
                kmeans_trail_tools::write_frame(&mut output, &frame)?;
            }
        }
    }
    output.flush().context("failed to write output")?;

    Ok(())
}
