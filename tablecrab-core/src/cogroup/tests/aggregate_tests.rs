use std::time::Duration;

use super::*;
use crate::graph::StreamGraph;

fn source(graph: &mut StreamGraph) -> NodeId {
    graph
        .add_node(
            &[],
            NodeSpec::new(
                "clicks-source",
                NodeKind::Source {
                    topic: "clicks".to_string(),
                    partitions: Some(4),
                },
            ),
        )
        .unwrap()
}

fn count_clicks() -> Aggregator<String, u64> {
    Aggregator::new(|_key: &String, clicks: &u32, total: u64| total + *clicks as u64)
}

fn aggregate_spec(graph: &StreamGraph, node: NodeId) -> AggregateSpec {
    match &graph.node(node).unwrap().kind {
        NodeKind::Aggregate(spec) => spec.clone(),
        other => panic!("expected aggregate node, got {other:?}"),
    }
}

#[test]
fn test_rolling_aggregate_node() {
    let mut g = StreamGraph::new();
    let parent = source(&mut g);
    let named = Named::new("S").unwrap();
    let init = Initializer::new(|| 0u64);
    let store = StoreDescriptor::named("totals").unwrap();
    let factory = AggregateNodeFactory {
        named: &named,
        initializer: &init,
        store: &store,
        window: &WindowSpec::None,
        session_merger: None,
        output_versioned: true,
    };

    let agg = factory.build(&mut g, parent, 0, count_clicks()).unwrap();

    assert_eq!(agg.name, "S-cogroup-agg-0");
    assert_eq!(agg.processor.kind(), WindowKind::None);
    assert_eq!(agg.processor.grace_period_ms(), None);
    assert_eq!(agg.processor.emit_strategy(), None);
    let spec = aggregate_spec(&g, agg.node);
    assert_eq!(spec.store_name, "totals");
    assert_eq!(spec.retention_ms, None);
    assert!(spec.output_versioned);
    assert_eq!(g.upstream(agg.node), vec![parent]);
}

#[test]
fn test_time_windowed_grace_period() {
    let mut g = StreamGraph::new();
    let parent = source(&mut g);
    let named = Named::new("S").unwrap();
    let init = Initializer::new(|| 0u64);
    let store = StoreDescriptor::named("totals").unwrap();
    let window = WindowSpec::tumbling(Duration::from_secs(60))
        .unwrap()
        .with_grace(Duration::from_secs(5))
        .unwrap();
    let factory = AggregateNodeFactory {
        named: &named,
        initializer: &init,
        store: &store,
        window: &window,
        session_merger: None,
        output_versioned: true,
    };

    let agg = factory.build(&mut g, parent, 1, count_clicks()).unwrap();

    assert_eq!(agg.name, "S-cogroup-agg-1");
    assert_eq!(agg.processor.kind(), WindowKind::Fixed);
    assert_eq!(agg.processor.grace_period_ms(), Some(5_000));
    let spec = aggregate_spec(&g, agg.node);
    assert_eq!(spec.grace_period_ms, Some(5_000));
    assert_eq!(spec.retention_ms, Some(65_000));
    assert_eq!(spec.emit, Some(EmitStrategy::OnWindowUpdate));
    // Windowed outputs are never versioned.
    assert!(!spec.output_versioned);
}

#[test]
fn test_session_grace_includes_inactivity_gap() {
    let mut g = StreamGraph::new();
    let parent = source(&mut g);
    let named = Named::unnamed();
    let init = Initializer::new(|| 0u64);
    let store = StoreDescriptor::named("sessions").unwrap();
    let merger = Merger::new(|_key: &String, a: u64, b: u64| a + b);
    let window = WindowSpec::session(Duration::from_secs(30))
        .unwrap()
        .with_grace(Duration::from_secs(10))
        .unwrap();
    let factory = AggregateNodeFactory {
        named: &named,
        initializer: &init,
        store: &store,
        window: &window,
        session_merger: Some(&merger),
        output_versioned: false,
    };

    let agg = factory.build(&mut g, parent, 0, count_clicks()).unwrap();

    assert_eq!(agg.name, "COGROUPKSTREAM-AGGREGATE-0000000000");
    assert_eq!(agg.processor.kind(), WindowKind::Session);
    assert_eq!(agg.processor.grace_period_ms(), Some(40_000));
    assert!(agg.processor.session_merger().is_some());
}

#[test]
fn test_session_without_merger_rejected() {
    let mut g = StreamGraph::new();
    let parent = source(&mut g);
    let named = Named::new("S").unwrap();
    let init = Initializer::new(|| 0u64);
    let store = StoreDescriptor::named("sessions").unwrap();
    let window = WindowSpec::session(Duration::from_secs(30)).unwrap();
    let factory = AggregateNodeFactory {
        named: &named,
        initializer: &init,
        store: &store,
        window: &window,
        session_merger: None,
        output_versioned: false,
    };

    let err = factory.build(&mut g, parent, 0, count_clicks()).unwrap_err();

    assert_eq!(err, TopologyError::MissingSessionMerger);
    assert_eq!(g.len(), 1);
}

#[test]
fn test_sliding_aggregate_node() {
    let mut g = StreamGraph::new();
    let parent = source(&mut g);
    let named = Named::new("S").unwrap();
    let init = Initializer::new(|| 0u64);
    let store = StoreDescriptor::named("recent").unwrap();
    let window = WindowSpec::sliding(Duration::from_secs(10))
        .unwrap()
        .with_grace(Duration::from_secs(2))
        .unwrap();
    let factory = AggregateNodeFactory {
        named: &named,
        initializer: &init,
        store: &store,
        window: &window,
        session_merger: None,
        output_versioned: false,
    };

    let agg = factory.build(&mut g, parent, 0, count_clicks()).unwrap();

    assert_eq!(agg.processor.kind(), WindowKind::Sliding);
    assert_eq!(agg.processor.grace_period_ms(), Some(2_000));
    assert_eq!(aggregate_spec(&g, agg.node).retention_ms, Some(22_000));
}

#[test]
fn test_processor_aggregates_from_initializer() {
    let processor = AggregateProcessor::for_window(
        &WindowSpec::None,
        StoreDescriptor::named("totals").unwrap(),
        Initializer::new(|| 100u64),
        count_clicks(),
        None,
    )
    .unwrap();
    let key = "user-1".to_string();

    let first = processor.aggregate(&key, &BoxedValue::new(3u32), None).unwrap();
    let second = processor
        .aggregate(&key, &BoxedValue::new(2u32), Some(first))
        .unwrap();

    assert_eq!(first, 103);
    assert_eq!(second, 105);
    assert!(processor.aggregate(&key, &BoxedValue::new(1u64), None).is_err());
}
