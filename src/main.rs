mod engine;

use clap::Parser;
use engine::{demo_config, Level, Vec2};

#[derive(Parser)]
#[command(name = "rail_shunt")]
#[command(about = "Headless train-coupling engine demo")]
struct Cli {
    /// Number of pointer steps for the scripted drag
    #[arg(long, default_value = "60")]
    steps: u32,

    /// Number of easing ticks to run after the drag
    #[arg(long, default_value = "50")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.05")]
    delta: f32,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut level = Level::from_config(&demo_config())?;

    println!("Initial state:");
    level.print_summary();
    println!();

    // Scripted stand-in for the pointer input layer: grab the freight car
    // and slide it down the yard toward its locomotive.
    let car_id = level
        .entity_id("car_freight")
        .ok_or_else(|| anyhow::anyhow!("demo level is missing the freight car"))?;
    let grab = level
        .entity(car_id)
        .map(|e| e.position)
        .unwrap_or(Vec2::ZERO);
    let release = Vec2::new(760.0, 0.0);

    if !level.start_drag(car_id, grab) {
        anyhow::bail!("could not start the scripted drag");
    }
    for step in 1..=cli.steps {
        let t = step as f32 / cli.steps as f32;
        level.update_drag(grab.lerp(&release, t));
        level.update(cli.delta);
    }
    level.end_drag();

    println!("After drag:");
    level.print_summary();
    println!();

    for _ in 0..cli.ticks {
        level.update(cli.delta);
    }

    println!("=== Final State ===");
    level.print_summary();
    println!(
        "Level {} after {:.1}s simulated time",
        if level.is_complete() {
            "complete"
        } else {
            "not complete"
        },
        level.time,
    );

    Ok(())
}
