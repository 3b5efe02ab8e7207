use serde_json::{Map, Value};

use crate::Tree;
use crate::error::ShapeConflictError;
use crate::node::MultiTreeNode;
use crate::options::TraversalOptions;
use crate::path::join_path;
use crate::traverse::{Visitor, walk};

/// Filter callback for [`translate`]; `Ok(false)` prunes the node and its
/// subtree from the output.
pub type NodeFilter<'f, E> = dyn FnMut(&MultiTreeNode<'_>) -> Result<bool, E> + 'f;

/// Fold every multi-tree node of `trees` into an accumulator, parents before
/// children.
///
/// Siblings are visited in first-seen key order unless `options` carries a
/// comparator.
pub fn reduce<A, R, E>(
    trees: &[&Tree],
    reducer: R,
    initial: A,
    options: &TraversalOptions<'_>,
) -> Result<A, E>
where
    R: FnMut(A, &MultiTreeNode<'_>) -> Result<A, E>,
    E: From<ShapeConflictError>,
{
    let mut visitor = ReduceVisitor {
        reducer,
        acc: Some(initial),
        _error: std::marker::PhantomData,
    };
    walk(&roots(trees), &[], options, &mut visitor)?;
    match visitor.acc {
        Some(acc) => Ok(acc),
        None => unreachable!("accumulator is restored after every visit"),
    }
}

/// Build one new tree out of `trees` walked in lockstep.
///
/// Leaves take the value returned by `map`; branches are rebuilt from their
/// surviving children. `seed` is the root object new keys are inserted
/// into.
pub fn translate<M, E>(
    trees: &[&Tree],
    filter: Option<&mut NodeFilter<'_, E>>,
    map: M,
    seed: Option<Tree>,
    options: &TraversalOptions<'_>,
) -> Result<Tree, E>
where
    M: FnMut(&MultiTreeNode<'_>) -> Result<Value, E>,
    E: From<ShapeConflictError>,
{
    let mut visitor = TranslateVisitor {
        filter,
        map,
        root: seed.unwrap_or_default(),
        open: Vec::new(),
    };
    walk(&roots(trees), &[], options, &mut visitor)?;
    Ok(visitor.root)
}

/// Collect the leaves of `tree` into `seed`, in traversal order.
///
/// Branches are ordered by the comparator of `options`, if any, before they
/// are descended into.
pub fn flatten<S: FlattenSink>(
    tree: &Tree,
    seed: S,
    options: &TraversalOptions<'_>,
) -> Result<S, ShapeConflictError> {
    let mut visitor = FlattenVisitor { sink: seed };
    walk(&[Some(tree)], &[], options, &mut visitor)?;
    Ok(visitor.sink)
}

/// Destination of [`flatten`].
pub trait FlattenSink {
    fn absorb(&mut self, path: &[String], value: Value);
}

/// Ordered sequence of leaf values.
impl FlattenSink for Vec<Value> {
    fn absorb(&mut self, _path: &[String], value: Value) {
        self.push(value);
    }
}

/// Mapping keyed by the `/`-joined path of each leaf. Existing entries of the
/// seed are kept unless a leaf path collides with them.
impl FlattenSink for Map<String, Value> {
    fn absorb(&mut self, path: &[String], value: Value) {
        self.insert(join_path(path), value);
    }
}

fn roots<'t>(trees: &[&'t Tree]) -> Vec<Option<&'t Tree>> {
    trees.iter().map(|tree| Some(*tree)).collect()
}

struct ReduceVisitor<A, R, E> {
    reducer: R,
    acc: Option<A>,
    _error: std::marker::PhantomData<E>,
}

impl<A, R, E> ReduceVisitor<A, R, E>
where
    R: FnMut(A, &MultiTreeNode<'_>) -> Result<A, E>,
{
    fn fold(&mut self, node: &MultiTreeNode<'_>) -> Result<(), E> {
        if let Some(acc) = self.acc.take() {
            self.acc = Some((self.reducer)(acc, node)?);
        }
        Ok(())
    }
}

impl<'t, A, R, E> Visitor<'t> for ReduceVisitor<A, R, E>
where
    R: FnMut(A, &MultiTreeNode<'_>) -> Result<A, E>,
    E: From<ShapeConflictError>,
{
    type Error = E;

    fn leaf(&mut self, node: &MultiTreeNode<'t>) -> Result<(), E> {
        self.fold(node)
    }

    fn enter_branch(&mut self, node: &MultiTreeNode<'t>) -> Result<(), E> {
        self.fold(node)
    }

    fn leave_branch(&mut self, _node: &MultiTreeNode<'t>) -> Result<(), E> {
        Ok(())
    }
}

struct TranslateVisitor<'f, 'g, M, E> {
    filter: Option<&'f mut NodeFilter<'g, E>>,
    map: M,
    root: Tree,
    open: Vec<Tree>,
}

impl<M, E> TranslateVisitor<'_, '_, M, E> {
    fn current(&mut self) -> &mut Tree {
        self.open.last_mut().unwrap_or(&mut self.root)
    }
}

impl<'t, M, E> Visitor<'t> for TranslateVisitor<'_, '_, M, E>
where
    M: FnMut(&MultiTreeNode<'_>) -> Result<Value, E>,
    E: From<ShapeConflictError>,
{
    type Error = E;

    fn keep(&mut self, node: &MultiTreeNode<'t>) -> Result<bool, E> {
        match self.filter.as_mut() {
            Some(filter) => filter(node),
            None => Ok(true),
        }
    }

    fn leaf(&mut self, node: &MultiTreeNode<'t>) -> Result<(), E> {
        let value = (self.map)(node)?;
        self.current().insert(node.key().to_string(), value);
        Ok(())
    }

    fn enter_branch(&mut self, _node: &MultiTreeNode<'t>) -> Result<(), E> {
        self.open.push(Map::new());
        Ok(())
    }

    fn leave_branch(&mut self, node: &MultiTreeNode<'t>) -> Result<(), E> {
        let branch = self.open.pop().unwrap_or_default();
        self.current()
            .insert(node.key().to_string(), Value::Object(branch));
        Ok(())
    }
}

struct FlattenVisitor<S> {
    sink: S,
}

impl<'t, S: FlattenSink> Visitor<'t> for FlattenVisitor<S> {
    type Error = ShapeConflictError;

    fn leaf(&mut self, node: &MultiTreeNode<'t>) -> Result<(), ShapeConflictError> {
        if let Some(value) = node.first_defined() {
            self.sink.absorb(node.path(), value.clone());
        }
        Ok(())
    }

    fn enter_branch(&mut self, _node: &MultiTreeNode<'t>) -> Result<(), ShapeConflictError> {
        Ok(())
    }

    fn leave_branch(&mut self, _node: &MultiTreeNode<'t>) -> Result<(), ShapeConflictError> {
        Ok(())
    }
}
