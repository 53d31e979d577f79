use super::*;
use crate::cogroup::{AggregateNodeFactory, Aggregator, Initializer};
use crate::graph::StreamGraph;
use crate::window::WindowSpec;

fn aggregates(
    graph: &mut StreamGraph,
    named: &Named,
    store: &StoreDescriptor,
    inputs: usize,
) -> Vec<AggregateNode<String, u64>> {
    let init = Initializer::new(|| 0u64);
    let factory = AggregateNodeFactory {
        named,
        initializer: &init,
        store,
        window: &WindowSpec::None,
        session_merger: None,
        output_versioned: false,
    };
    (0..inputs)
        .map(|i| {
            let source = graph
                .add_node(
                    &[],
                    NodeSpec::new(
                        format!("topic-{i}-source"),
                        NodeKind::Source {
                            topic: format!("topic-{i}"),
                            partitions: Some(2),
                        },
                    ),
                )
                .unwrap();
            let aggregator =
                Aggregator::new(|_key: &String, v: &u64, total: u64| total + *v);
            factory.build(graph, source, i, aggregator).unwrap()
        })
        .collect()
}

fn merge_nodes(graph: &StreamGraph) -> usize {
    graph
        .nodes()
        .filter(|n| matches!(n.kind, NodeKind::Merge { .. }))
        .count()
}

#[test]
fn test_single_input_gets_one_merge_node() {
    let mut g = StreamGraph::new();
    let named = Named::new("S").unwrap();
    let store = StoreDescriptor::named("S").unwrap();
    let aggs = aggregates(&mut g, &named, &store, 1);

    let table = build_merge(&mut g, &named, &store, aggs, TableCodecs::default()).unwrap();

    assert_eq!(merge_nodes(&g), 1);
    assert_eq!(table.name(), "S-cogroup-merge");
    assert_eq!(table.node_names().len(), 1);
    assert_eq!(table.merge_processor().processors().len(), 1);
}

#[test]
fn test_merge_node_is_child_of_every_aggregate() {
    let mut g = StreamGraph::new();
    let named = Named::new("S").unwrap();
    let store = StoreDescriptor::named("S").unwrap();
    let aggs = aggregates(&mut g, &named, &store, 5);
    let agg_nodes: Vec<NodeId> = aggs.iter().map(|a| a.node).collect();

    let table = build_merge(&mut g, &named, &store, aggs, TableCodecs::default()).unwrap();

    assert_eq!(merge_nodes(&g), 1);
    assert_eq!(g.upstream(table.node()), agg_nodes);
    assert_eq!(
        table.node_names().iter().collect::<Vec<_>>(),
        vec!["S-cogroup-merge"]
    );
    assert_eq!(table.merge_processor().processors().len(), 5);
    assert_eq!(table.merge_processor().store_name(), "S");
}

#[test]
fn test_merge_table_carries_store_and_codecs() {
    let mut g = StreamGraph::new();
    let named = Named::unnamed();
    let store = StoreDescriptor::generated(&mut g, "COGROUPKSTREAM-AGGREGATE-");
    let aggs = aggregates(&mut g, &named, &store, 2);
    let codecs = TableCodecs {
        key_codec: Some("string".to_string()),
        value_codec: Some("bincode".to_string()),
    };

    let table = build_merge(&mut g, &named, &store, aggs, codecs).unwrap();

    // Store took index 0, the two aggregates 1 and 2.
    assert_eq!(table.name(), "COGROUPKSTREAM-MERGE-0000000003");
    assert_eq!(table.queryable_name(), None);
    assert_eq!(table.key_codec(), Some("string"));
    assert_eq!(table.value_codec(), Some("bincode"));
}

#[test]
fn test_merge_forwards_records_unchanged() {
    let mut g = StreamGraph::new();
    let named = Named::new("S").unwrap();
    let store = StoreDescriptor::named("S").unwrap();
    let aggs = aggregates(&mut g, &named, &store, 2);

    let table = build_merge(&mut g, &named, &store, aggs, TableCodecs::default()).unwrap();

    assert_eq!(table.merge_processor().process(("k", 7u64)), ("k", 7));
}

#[test]
fn test_merge_without_aggregates_rejected() {
    let mut g = StreamGraph::new();
    let store = StoreDescriptor::named("S").unwrap();
    let err = build_merge::<_, String, u64>(
        &mut g,
        &Named::unnamed(),
        &store,
        Vec::new(),
        TableCodecs::default(),
    )
    .unwrap_err();
    assert_eq!(err, TopologyError::EmptyCogroup);
    assert!(g.is_empty());
}
