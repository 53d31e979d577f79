use tablecrab_api::environment::StreamsBuilder;
use tablecrab_api::materialized::Materialized;
use tablecrab_api::tablecrab_core::TopologyConfig;
use tablecrab_api::tablecrab_core::graph::Named;
use tracing_subscriber::EnvFilter;

/// Customer activity: purchase amounts and page views cogrouped into one
/// profile per customer.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let builder = StreamsBuilder::with_config(TopologyConfig::new("customer-profiles"));

    let purchases = builder
        .stream_with_partitions::<String, u64>("purchases", 6)?
        .group_by_key()?;
    // Page views are keyed by session; re-key them by customer.
    let views = builder
        .stream_with_partitions::<String, (String, String)>("page-views", 12)?
        .select_key(|_session: &String, (customer, _page): &(String, String)| customer.clone())?
        .group_by_key()?;

    let profiles = purchases
        .cogroup(|_customer: &String, cents: &u64, (spent, seen): (u64, u64)| {
            (spent + cents, seen)
        })
        .cogroup(&views, |_customer: &String, _view: &(String, String), (spent, seen): (u64, u64)| {
            (spent, seen + 1)
        })
        .aggregate_with(
            || (0u64, 0u64),
            Named::new("profiles")?,
            Materialized::as_store("customer-profiles-store")?,
        )?;

    println!("{}", builder.describe());
    println!("table `{}` is queryable as {:?}", profiles.name(), profiles.queryable_store_name());
    Ok(())
}
