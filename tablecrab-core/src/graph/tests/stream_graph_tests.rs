use crate::error::TopologyError;
use crate::graph::{
    CopartitionMember, NodeKind, NodeSpec, Partition, RepartitionSpec, StreamGraph,
    TopologyBuilder,
};

fn source(topic: &str, partitions: Option<u32>) -> NodeSpec {
    NodeSpec::new(
        format!("{topic}-source"),
        NodeKind::Source {
            topic: topic.to_string(),
            partitions,
        },
    )
}

fn member(stream: u32, topic: &str, partitions: Option<u32>, repartitioned: bool) -> CopartitionMember {
    CopartitionMember {
        stream,
        topic: topic.to_string(),
        partitions,
        repartitioned,
    }
}

#[test]
fn test_build_linear_graph() {
    let mut g = StreamGraph::new();
    let src = g.add_node(&[], source("clicks", Some(4))).unwrap();
    let map = g
        .add_node(&[src], NodeSpec::new("select-key", NodeKind::Processor))
        .unwrap();

    assert_eq!(g.len(), 2);
    assert_eq!(g.edges().len(), 1);
    assert_eq!(g.downstream(src), vec![map]);
    assert_eq!(g.upstream(map), vec![src]);
    assert_eq!(g.sources(), vec![src]);
    assert_eq!(g.node_name(map), Some("select-key"));
    assert_eq!(g.node_by_name("clicks-source").map(|n| n.id), Some(src));
}

#[test]
fn test_edge_leaving_repartition_is_hash() {
    let mut g = StreamGraph::new();
    let src = g.add_node(&[], source("clicks", None)).unwrap();
    let repartition = g
        .add_node(
            &[src],
            NodeSpec::new(
                "clicks-repartition-filter",
                NodeKind::Repartition(RepartitionSpec {
                    topic: "clicks-repartition".to_string(),
                    sink_name: "clicks-repartition-sink".to_string(),
                    source_name: "clicks-repartition-source".to_string(),
                    key_codec: "bytes".to_string(),
                    value_codec: "bytes".to_string(),
                    partitions: None,
                }),
            ),
        )
        .unwrap();
    g.add_node(&[repartition], NodeSpec::new("agg", NodeKind::Processor))
        .unwrap();

    assert_eq!(g.edges()[0].partition, Partition::Forward);
    assert_eq!(g.edges()[1].partition, Partition::Hash);
}

#[test]
fn test_duplicate_name_rejected() {
    let mut g = StreamGraph::new();
    g.add_node(&[], source("clicks", None)).unwrap();
    let err = g.add_node(&[], source("clicks", None)).unwrap_err();
    assert_eq!(err, TopologyError::DuplicateNodeName("clicks-source".to_string()));
    assert_eq!(g.len(), 1);
}

#[test]
fn test_unknown_parent_rejected() {
    let mut g = StreamGraph::new();
    let err = g
        .add_node(&[7], NodeSpec::new("orphan", NodeKind::Processor))
        .unwrap_err();
    assert_eq!(err, TopologyError::UnknownNode(7));
}

#[test]
fn test_generated_names_share_one_counter() {
    let mut g = StreamGraph::new();
    assert_eq!(g.new_processor_name("KSTREAM-SOURCE-"), "KSTREAM-SOURCE-0000000000");
    assert_eq!(
        g.new_store_name("COGROUPKSTREAM-AGGREGATE-"),
        "COGROUPKSTREAM-AGGREGATE-STATE-STORE-0000000001"
    );
    assert_eq!(g.new_processor_name("KSTREAM-SINK-"), "KSTREAM-SINK-0000000002");
}

#[test]
fn test_copartition_resolves_fixed_count() {
    let mut g = StreamGraph::new();
    let resolved = g
        .ensure_copartition(
            &member(0, "clicks", Some(6), false),
            &[
                member(1, "views", Some(6), false),
                member(2, "store-repartition", None, true),
            ],
        )
        .unwrap();
    assert_eq!(resolved, Some(6));
    assert_eq!(g.copartition_groups().len(), 1);
    assert_eq!(g.copartition_groups()[0].members.len(), 3);
}

#[test]
fn test_copartition_violation() {
    let mut g = StreamGraph::new();
    let err = g
        .ensure_copartition(
            &member(0, "clicks", Some(3), false),
            &[member(1, "views", Some(4), false)],
        )
        .unwrap_err();
    assert_eq!(
        err,
        TopologyError::CopartitionViolation {
            topics: vec!["clicks".to_string(), "views".to_string()],
            partitions: vec![3, 4],
        }
    );
    assert!(g.copartition_groups().is_empty());
}

#[test]
fn test_repartitioned_members_do_not_conflict() {
    let mut g = StreamGraph::new();
    let resolved = g
        .ensure_copartition(
            &member(0, "a-repartition", Some(2), true),
            &[member(1, "views", Some(8), false)],
        )
        .unwrap();
    assert_eq!(resolved, Some(8));
}

#[test]
fn test_rollback_restores_graph() {
    let mut g = StreamGraph::new();
    let src = g.add_node(&[], source("clicks", None)).unwrap();
    let savepoint = g.savepoint();

    let name = g.new_processor_name("KSTREAM-FILTER-");
    let filter = g
        .add_node(&[src], NodeSpec::new(name.clone(), NodeKind::Processor))
        .unwrap();
    g.ensure_copartition(&member(0, "clicks", None, false), &[])
        .unwrap();

    g.rollback(savepoint);

    assert_eq!(g.len(), 1);
    assert!(g.edges().is_empty());
    assert!(g.copartition_groups().is_empty());
    assert!(g.node(filter).is_none());
    // Names and ids are handed out again from the savepoint.
    assert_eq!(g.new_processor_name("KSTREAM-FILTER-"), name);
    let again = g
        .add_node(&[src], NodeSpec::new(name, NodeKind::Processor))
        .unwrap();
    assert_eq!(again, filter);
}
