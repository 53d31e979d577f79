use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use tablecrab_core::cogroup::{CogroupedTable, MergeProcessor};
use tablecrab_core::graph::NodeDescription;
use tablecrab_core::types::NodeId;

use crate::environment::EnvInner;

/// A table produced by an aggregation.
pub struct KTable<K, VA> {
    env: Rc<RefCell<EnvInner>>,
    table: CogroupedTable<K, VA>,
}

impl<K, VA> KTable<K, VA> {
    pub(crate) fn new(env: Rc<RefCell<EnvInner>>, table: CogroupedTable<K, VA>) -> Self {
        Self { env, table }
    }

    /// Name of the node the table is read from.
    pub fn name(&self) -> &str {
        self.table.name()
    }

    pub fn node_id(&self) -> NodeId {
        self.table.node()
    }

    pub fn node_names(&self) -> &BTreeSet<String> {
        self.table.node_names()
    }

    /// Store name the table can be queried by, when the user chose one.
    pub fn queryable_store_name(&self) -> Option<&str> {
        self.table.queryable_name()
    }

    pub fn key_codec(&self) -> Option<&str> {
        self.table.key_codec()
    }

    pub fn value_codec(&self) -> Option<&str> {
        self.table.value_codec()
    }

    pub fn merge_processor(&self) -> &MergeProcessor<K, VA> {
        self.table.merge_processor()
    }

    /// The table's node as it appears in the topology description.
    pub fn describe(&self) -> Option<NodeDescription> {
        self.env.borrow().graph.describe().node(self.name()).cloned()
    }
}
