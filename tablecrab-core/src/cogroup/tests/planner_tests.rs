use super::*;
use crate::config::TopologyConfig;
use crate::graph::{Partition, StreamGraph};

fn source(graph: &mut StreamGraph, topic: &str, partitions: Option<u32>) -> GroupedStream {
    let node = graph
        .add_node(
            &[],
            NodeSpec::new(
                format!("{topic}-source"),
                NodeKind::Source {
                    topic: topic.to_string(),
                    partitions,
                },
            ),
        )
        .unwrap();
    let stream = GroupedStream::new(graph.new_stream_id(), node, topic);
    match partitions {
        Some(p) => stream.with_partitions(p),
        None => stream,
    }
}

fn repartition_nodes(graph: &StreamGraph) -> Vec<&RepartitionSpec> {
    graph
        .nodes()
        .filter_map(|n| match &n.kind {
            NodeKind::Repartition(spec) => Some(spec),
            _ => None,
        })
        .collect()
}

#[test]
fn test_no_repartition_uses_upstream_nodes() {
    let mut g = StreamGraph::new();
    let a = source(&mut g, "clicks", Some(4));
    let b = source(&mut g, "views", Some(4));

    let parents = plan_repartitions(&mut g, &[&a, &b], "totals", None).unwrap();

    assert_eq!(parents, vec![a.node(), b.node()]);
    assert!(repartition_nodes(&g).is_empty());
    assert_eq!(g.copartition_groups().len(), 1);
    assert_eq!(g.copartition_groups()[0].partitions, Some(4));
}

#[test]
fn test_same_stream_repartitioned_once() {
    let mut g = StreamGraph::new();
    let a = source(&mut g, "clicks", None).with_repartition_required(true);

    let parents = plan_repartitions(&mut g, &[&a, &a.clone()], "totals", None).unwrap();

    assert_eq!(repartition_nodes(&g).len(), 1);
    assert_eq!(parents[0], parents[1]);
    assert_ne!(parents[0], a.node());
    // One member per distinct stream.
    assert_eq!(g.copartition_groups()[0].members.len(), 1);
}

#[test]
fn test_repartition_named_after_store_when_queryable() {
    let mut g = StreamGraph::new();
    let a = source(&mut g, "clicks", None).with_repartition_required(true);

    let parents = plan_repartitions(&mut g, &[&a], "totals", Some("totals")).unwrap();

    let node = g.node(parents[0]).unwrap();
    assert_eq!(node.name, "totals-repartition-filter");
    let spec = repartition_nodes(&g)[0];
    assert_eq!(spec.topic, "totals-repartition");
    assert_eq!(spec.sink_name, "totals-repartition-sink");
    assert_eq!(spec.source_name, "totals-repartition-source");
    assert_eq!(g.edges().last().unwrap().partition, Partition::Forward);
}

#[test]
fn test_user_repartition_name_wins() {
    let mut g = StreamGraph::new();
    let a = source(&mut g, "clicks", None)
        .with_repartition_required(true)
        .with_repartition_name("clicks-by-user")
        .unwrap();

    plan_repartitions(&mut g, &[&a], "totals", None).unwrap();

    let spec = repartition_nodes(&g)[0];
    assert_eq!(spec.topic, "clicks-by-user-repartition");
    assert_eq!(spec.sink_name, "clicks-by-user-repartition-sink");
}

#[test]
fn test_generated_names_without_user_names() {
    let mut g = StreamGraph::new();
    let a = source(&mut g, "clicks", None).with_repartition_required(true);

    let parents = plan_repartitions(
        &mut g,
        &[&a],
        "COGROUPKSTREAM-AGGREGATE-STATE-STORE-0000000000",
        None,
    )
    .unwrap();

    assert_eq!(g.node(parents[0]).unwrap().name, "KSTREAM-FILTER-0000000000");
    let spec = repartition_nodes(&g)[0];
    assert_eq!(spec.sink_name, "KSTREAM-SINK-0000000001");
    assert_eq!(spec.source_name, "KSTREAM-SOURCE-0000000002");
    assert_eq!(
        spec.topic,
        "COGROUPKSTREAM-AGGREGATE-STATE-STORE-0000000000-repartition"
    );
}

#[test]
fn test_repartition_topic_suffix_not_doubled() {
    assert_eq!(repartition_topic("orders-repartition"), "orders-repartition");
    assert_eq!(repartition_topic("orders"), "orders-repartition");
}

#[test]
fn test_codecs_fall_back_to_config_defaults() {
    let mut g = StreamGraph::with_config(
        TopologyConfig::default()
            .with_default_key_codec("string")
            .with_default_value_codec("bincode"),
    );
    let a = source(&mut g, "clicks", None)
        .with_repartition_required(true)
        .with_value_codec("json");

    plan_repartitions(&mut g, &[&a], "totals", Some("totals")).unwrap();

    let spec = repartition_nodes(&g)[0];
    assert_eq!(spec.key_codec, "string");
    assert_eq!(spec.value_codec, "json");
}

#[test]
fn test_repartition_adopts_group_partition_count() {
    let mut g = StreamGraph::new();
    let a = source(&mut g, "clicks", None).with_repartition_required(true);
    let b = source(&mut g, "views", Some(6));

    plan_repartitions(&mut g, &[&a, &b], "totals", Some("totals")).unwrap();

    assert_eq!(repartition_nodes(&g)[0].partitions, Some(6));
}

#[test]
fn test_copartition_violation_leaves_no_repartition_node() {
    let mut g = StreamGraph::new();
    let a = source(&mut g, "clicks", None).with_repartition_required(true);
    let b = source(&mut g, "views", Some(3));
    let c = source(&mut g, "orders", Some(5));

    let err = plan_repartitions(&mut g, &[&a, &b, &c], "totals", Some("totals")).unwrap_err();

    assert!(matches!(err, TopologyError::CopartitionViolation { .. }));
    assert!(repartition_nodes(&g).is_empty());
    assert_eq!(g.len(), 3);
}

#[test]
fn test_empty_inputs_rejected() {
    let mut g = StreamGraph::new();
    let err = plan_repartitions(&mut g, &[], "totals", None).unwrap_err();
    assert_eq!(err, TopologyError::EmptyCogroup);
}

#[test]
fn test_explicit_naming_rejects_generated_topic() {
    let mut g = StreamGraph::with_config(
        TopologyConfig::default().with_explicit_internal_naming(true),
    );
    let a = source(&mut g, "clicks", None).with_repartition_required(true);

    let err = plan_repartitions(&mut g, &[&a], "store-0", None).unwrap_err();
    assert_eq!(
        err,
        TopologyError::ImplicitInternalName {
            resource: "store-0-repartition".to_string()
        }
    );

    // A queryable store name counts as user-provided.
    plan_repartitions(&mut g, &[&a], "totals", Some("totals")).unwrap();
}
