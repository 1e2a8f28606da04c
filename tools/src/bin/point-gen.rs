use anyhow::Context as _;
use anyhow::Result;
use rand::SeedableRng as _;
use rand_pcg::Pcg64;

const USAGE: &str = "Usage: point-gen [options] [out-plot] >out.plot";

fn main() -> Result<()> {
    let mut options = getopts::Options::new();
    options.optopt("n", "count", "number of points (default: 1000)", "COUNT");
    options.optopt(
        "c",
        "centers",
        "number of blobs, 0 for a uniform spread (default: 0)",
        "COUNT",
    );
    options.optopt("s", "seed", "seed of the random generator (default: 0)", "SEED");
    options.optopt("", "width", "width of the domain (default: 100)", "WIDTH");
    options.optopt("", "height", "height of the domain (default: 100)", "HEIGHT");

    let matches = kmeans_trail_tools::parse_args(options, USAGE, "", 1)?;

    let count: usize = matches
        .opt_get_default("n", 1000)
        .context("invalid value for option 'count'")?;
    let blob_count: usize = matches
        .opt_get_default("c", 0)
        .context("invalid value for option 'centers'")?;
    let seed: u64 = matches
        .opt_get_default("s", 0)
        .context("invalid value for option 'seed'")?;
    let width: f64 = matches
        .opt_get_default("width", 100.0)
        .context("invalid value for option 'width'")?;
    let height: f64 = matches
        .opt_get_default("height", 100.0)
        .context("invalid value for option 'height'")?;
    if !(0.0 < width && 0.0 < height && width.is_finite() && height.is_finite()) {
        anyhow::bail!("the domain must have a positive, finite size");
    }

    let mut rng = Pcg64::seed_from_u64(seed);
    let points = kmeans_trail_tools::generate_points(&mut rng, count, blob_count, width, height);

    let output = kmeans_trail_tools::writer(matches.free.first())?;
    kmeans_trail_tools::write_points(output, &points).context("failed to write points")?;

    Ok(())
}
