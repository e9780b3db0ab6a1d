use traffic_light::{CountdownLatch, TrafficLight, TrafficLightConfig, WaitStrategy};
use tracing_subscriber;
use tracing::{info, error};
use clap::Parser;
use chrono::{DateTime, Local};
use std::thread;
use std::time::Duration;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Options {
    /// shortest cycle, in seconds
    #[clap(long)]
    #[clap(default_value_t = 4.0)]
    min_seconds: f64,

    /// longest cycle, in seconds
    #[clap(long)]
    #[clap(default_value_t = 6.0)]
    max_seconds: f64,

    /// sleep between two timing checks of the cycling thread
    #[clap(short, long)]
    #[clap(default_value_t = 1)]
    poll_millis: u64,

    /// number of vehicles queued at the light
    #[clap(short, long)]
    #[clap(default_value_t = 4)]
    vehicles: usize,

    /// how many times each vehicle goes through the light
    #[clap(short, long)]
    #[clap(default_value_t = 2)]
    rounds: usize,

    #[clap(short, long)]
    seed: Option<u64>,

    /// latest | queue
    #[clap(long)]
    #[clap(default_value_t = String::from("latest"))]
    strategy: String,
}

fn parse_strategy(name: &str) -> Result<WaitStrategy, String> {
    match name {
        "latest" => Ok(WaitStrategy::Latest),
        "queue" => Ok(WaitStrategy::Queue),
        _ => Err(format!("unknown wait strategy {}, expected latest or queue", name)),
    }
}

fn drive(id: usize, light: TrafficLight, rounds: usize, crossed: CountdownLatch) {
    for round in 0..rounds {
        info!("vehicle {} waiting at {} light", id, light.current_phase());
        light.wait_for_green();

        let datetime: DateTime<Local> = Local::now();
        info!("vehicle {} crossed on round {} at {}", id, round + 1, datetime.format("%Y/%m/%d %T%.3f"));

        // drive around the block before coming back
        thread::sleep(Duration::from_millis(100 * (id as u64 + 1)));
    }
    crossed.countdown();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let options = Options::parse();
    info!("{:?}", options);

    let mut config = TrafficLightConfig::from_seconds(options.min_seconds, options.max_seconds)?
        .with_poll_quantum(Duration::from_millis(options.poll_millis))
        .with_wait_strategy(parse_strategy(&options.strategy)?);
    if let Some(seed) = options.seed {
        config = config.with_seed(seed);
    }

    let light = TrafficLight::new(config)?;
    info!("{:?}", light.config());
    let crossed = CountdownLatch::new(options.vehicles);

    let rounds = options.rounds;
    let mut vehicles = Vec::with_capacity(options.vehicles);
    for id in 0..options.vehicles {
        let light = light.clone();
        let crossed = crossed.clone();
        vehicles.push(thread::Builder::new()
            .name(format!("vehicle-{}", id))
            .spawn(move || drive(id, light, rounds, crossed))?);
    }

    let cycle = light.simulate()?;

    crossed.wait();
    info!("all {} vehicles done after {} toggles", options.vehicles, light.toggles());

    for vehicle in vehicles {
        if vehicle.join().is_err() {
            error!("a vehicle thread panicked");
        }
    }

    cycle.stop()?;
    Ok(())
}
