use std::time::Duration;

use tablecrab_api::environment::StreamsBuilder;
use tablecrab_api::materialized::Materialized;
use tablecrab_api::tablecrab_core::TopologyConfig;
use tablecrab_api::tablecrab_core::graph::Named;
use tablecrab_api::tablecrab_core::window::WindowSpec;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let builder = StreamsBuilder::with_config(TopologyConfig::new("sensor-windows"));
    let temperatures = builder
        .stream_with_partitions::<String, f64>("temperatures", 4)?
        .group_by_key()?;
    let alarms = builder
        .stream_with_partitions::<String, String>("alarms", 4)?
        .group_by_key()?;

    // Per-sensor statistics over 10s windows, accepting records up to 2s late.
    let window = WindowSpec::tumbling(Duration::from_secs(10))?.with_grace(Duration::from_secs(2))?;
    temperatures
        .cogroup(|_sensor: &String, t: &f64, (max, raised): (f64, u32)| (max.max(*t), raised))
        .cogroup(&alarms, |_sensor: &String, _alarm: &String, (max, raised): (f64, u32)| {
            (max, raised + 1)
        })
        .windowed_by(window)?
        .aggregate_with(
            || (f64::MIN, 0u32),
            Named::new("sensor-stats")?,
            Materialized::as_store("sensor-stats-store")?,
        )?;

    // Sessions of alarms per sensor, closed after 30s of silence.
    let sessions = WindowSpec::session(Duration::from_secs(30))?;
    alarms
        .cogroup(|_sensor: &String, _alarm: &String, count: u64| count + 1)
        .session_windowed_by(sessions)?
        .aggregate_with(
            || 0u64,
            |_sensor: &String, a: u64, b: u64| a + b,
            Named::new("alarm-sessions")?,
            Materialized::new(),
        )?;

    println!("{}", builder.describe());
    Ok(())
}
