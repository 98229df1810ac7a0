use anyhow::{Context, Result};
use firstfit_rs::MemorySpace;
use log::info;

const DEFAULT_CAPACITY: usize = 100;
const FIRST_REQUEST: usize = 20;
const SECOND_REQUEST: usize = 30;
/// fits in the block freed by the first request, so it needs no extra room
const REUSE_REQUEST: usize = 10;
const MIN_CAPACITY: usize = FIRST_REQUEST + SECOND_REQUEST;

fn main() -> Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        unsafe { std::env::set_var("RUST_LOG", "info") };
    }
    pretty_env_logger::init();

    let capacity = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<usize>()
            .with_context(|| format!("invalid capacity {:?}", arg))?,
        None => DEFAULT_CAPACITY,
    };

    let space = run_demo(capacity)?;
    info!("{:?}", space.stats());
    Ok(())
}

fn run_demo(capacity: usize) -> Result<MemorySpace> {
    anyhow::ensure!(
        capacity >= MIN_CAPACITY,
        "capacity must be at least {}, got {}",
        MIN_CAPACITY,
        capacity
    );

    let mut space = MemorySpace::new(capacity);
    info!("managing {} addresses", capacity);

    let a = space.allocate(FIRST_REQUEST).context("first request")?;
    let b = space.allocate(SECOND_REQUEST).context("second request")?;
    info!("allocated {} and {}", a, b);

    space.release(a);
    let c = space.allocate(REUSE_REQUEST).context("reuse request")?;
    info!("reallocated {} at {}", REUSE_REQUEST, c);
    println!("{}\n", space);

    space.defragment();
    println!("{}", space);

    space.verify()?;
    Ok(space)
}
