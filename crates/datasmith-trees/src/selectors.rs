//! Ready-made leaf mappers for [`translate`](crate::translate).

use serde_json::Value;

use crate::node::MultiTreeNode;

/// Value of the first tree that defines the node, `null` if none does.
pub fn first<E>(node: &MultiTreeNode<'_>) -> Result<Value, E> {
    Ok(node.first_defined().cloned().unwrap_or(Value::Null))
}

/// Value of the last tree that defines the node, `null` if none does.
pub fn last<E>(node: &MultiTreeNode<'_>) -> Result<Value, E> {
    Ok(node.last_defined().cloned().unwrap_or(Value::Null))
}
