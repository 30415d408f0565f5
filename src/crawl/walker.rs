// src/crawl/walker.rs
// =============================================================================
// Depth-first walk of one package subtree.
//
// How it works:
// 1. Fetch the children of the package
// 2. For each child, in response order:
//    a. append the child itself to the output
//    b. if it is expandable, walk it right away and append everything
//       found underneath (so parents always come before their children)
// 3. Return the flattened list
//
// Guards:
// - A package that is already on the path from the start down to the
//   current node is not expanded again (a self-referencing tree would
//   otherwise recurse forever). The same name under two unrelated parents
//   is expanded under both.
// - Nothing deeper than `max_depth` levels below the start is expanded
// In both cases the record itself is still emitted; only its children are
// skipped, and a warning is logged.
//
// Failure isolation comes from NodeFetcher::fetch, which never fails: a
// package that cannot be read simply contributes no children.
//
// Rust concepts:
// - BoxFuture: an async fn cannot call itself directly (its future would
//   have infinite size), so the recursive step returns a boxed future
// - HashSet: the names on the current path, never shared between walks
// =============================================================================

use futures::future::{BoxFuture, FutureExt};
use std::collections::HashSet;
use tracing::{info, instrument, warn};

use crate::adt::{NodeFetcher, NodeRecord};

pub struct TreeWalker {
    fetcher: NodeFetcher,
    max_depth: usize,
}

impl TreeWalker {
    pub fn new(fetcher: NodeFetcher, max_depth: usize) -> Self {
        Self { fetcher, max_depth }
    }

    pub fn fetcher(&self) -> &NodeFetcher {
        &self.fetcher
    }

    // Walks the subtree under `package` and returns every record found,
    // in pre-order. The package's own record is not part of the result.
    #[instrument(skip(self))]
    pub async fn walk(&self, package: &str) -> Vec<NodeRecord> {
        let mut path = HashSet::new();
        path.insert(package.to_string());

        let mut records = Vec::new();
        self.walk_into(package, 0, &mut path, &mut records).await;

        info!("Collected {} records under {}", records.len(), package);
        records
    }

    fn walk_into<'a>(
        &'a self,
        package: &'a str,
        depth: usize,
        path: &'a mut HashSet<String>,
        out: &'a mut Vec<NodeRecord>,
    ) -> BoxFuture<'a, ()> {
        async move {
            for record in self.fetcher.fetch(package).await {
                let child = record.expandable.then(|| record.object_name.clone());
                out.push(record);

                let Some(child) = child else { continue };
                if depth + 1 > self.max_depth {
                    warn!(
                        "Not expanding {}: depth limit {} reached under {}",
                        child, self.max_depth, package
                    );
                    continue;
                }
                if !path.insert(child.clone()) {
                    warn!("Not expanding {}: cycle back to an enclosing package", child);
                    continue;
                }
                self.walk_into(&child, depth + 1, path, out).await;
                path.remove(&child);
            }
        }
        .boxed()
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why not just write `async fn walk_into(...)` and call it recursively?
//    - An async fn compiles to a state machine that contains the state of
//      every future it awaits
//    - If it awaits itself, that state machine would have to contain itself
//    - Boxing the recursive call puts the inner state on the heap, which
//      gives the outer state machine a fixed size
//
// 2. Why pass `path` and `out` as &mut instead of returning Vecs?
//    - One Vec for the whole subtree, no copying of child results upward
//    - The walk is sequential, so only one level touches them at a time
//    - `path` grows on the way down and shrinks on the way back up, so it
//      always holds exactly the ancestors of the package being listed
//
// 3. What is `let ... else`?
//    - Pattern match that must succeed, otherwise run the else block
//    - The else block has to leave the scope (continue, return, break)
// -----------------------------------------------------------------------------
