//! Variable expansion: inline cached trees of earlier assignments.

use bet_ast::{Context, NodeId, VarKey};
use smallvec::SmallVec;
use tracing::trace;

use crate::cache::TreeCache;
use crate::error::BetResult;

/// Replace every unexpanded variable leaf that has a cache entry with a deep
/// copy of the cached tree, then expand the copy itself.
///
/// Cache misses are expected (the variable was defined outside the rewritten
/// scope) and leave the leaf as is. Returns the number of inlined leaves.
pub fn expand_variables(ctx: &mut Context, root: NodeId, cache: &TreeCache) -> BetResult<usize> {
    let mut path: SmallVec<[VarKey; 8]> = SmallVec::new();
    expand_node(ctx, root, cache, &mut path)
}

fn expand_node(
    ctx: &mut Context,
    id: NodeId,
    cache: &TreeCache,
    path: &mut SmallVec<[VarKey; 8]>,
) -> BetResult<usize> {
    if ctx.is_expanded(id) {
        return Ok(0);
    }

    let mut inlined = 0;
    if let Some((left, right)) = ctx.children(id) {
        inlined += expand_node(ctx, left, cache, path)?;
        inlined += expand_node(ctx, right, cache, path)?;
    } else if let Some(key) = ctx.get(id).variable_key() {
        match cache.get(key) {
            Some(cached) => {
                ensure_invariant!(
                    !path.contains(&key),
                    "cached tree of variable {:?} reads itself",
                    key
                );
                let copy = ctx.deep_copy(cached);
                ctx.replace(id, copy);
                inlined += 1;

                // The copy may itself be a bare variable leaf, so it goes
                // through the same lookup.
                path.push(key);
                inlined += expand_node(ctx, id, cache, path)?;
                path.pop();
            }
            None => trace!(?key, "no cached tree, leaving variable leaf"),
        }
    }

    ctx.set_expanded(id);
    Ok(inlined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bet_ast::{DisplayNode, SecurityKind, ValueId};

    fn var(ctx: &mut Context, key: u64, name: &str) -> NodeId {
        ctx.variable(VarKey(key), name, Some(ValueId(key as u32)), SecurityKind::SecretShared)
    }

    #[test]
    fn inlines_cached_tree_and_marks_expanded() {
        let mut ctx = Context::new();
        let a = var(&mut ctx, 1, "a");
        let b = var(&mut ctx, 2, "b");
        let x_tree = ctx.mul(a, b);

        let x = var(&mut ctx, 3, "x");
        let c = var(&mut ctx, 4, "c");
        let root = ctx.add(x, c);

        let mut cache = TreeCache::new();
        cache.insert(VarKey(3), x_tree);

        assert_eq!(expand_variables(&mut ctx, root, &cache).unwrap(), 1);
        assert_eq!(DisplayNode::new(&ctx, root).to_string(), "a * b + c");
        assert!(ctx.is_expanded(root));
        // The cached tree was copied, not moved.
        let (left, _) = ctx.children(root).unwrap();
        assert_ne!(left, x_tree);
        assert_eq!(DisplayNode::new(&ctx, x_tree).to_string(), "a * b");
    }

    #[test]
    fn expansion_is_transitive_and_idempotent() {
        let mut ctx = Context::new();
        let a = var(&mut ctx, 1, "a");
        let b = var(&mut ctx, 2, "b");
        let y_tree = ctx.add(a, b);
        let y = var(&mut ctx, 5, "y");
        let c = var(&mut ctx, 4, "c");
        let x_tree = ctx.mul(y, c);

        let x = var(&mut ctx, 3, "x");
        let d = var(&mut ctx, 6, "d");
        let root = ctx.mul(x, d);

        let mut cache = TreeCache::new();
        cache.insert(VarKey(5), y_tree);
        cache.insert(VarKey(3), x_tree);

        assert_eq!(expand_variables(&mut ctx, root, &cache).unwrap(), 2);
        assert_eq!(DisplayNode::new(&ctx, root).to_string(), "(a + b) * c * d");
        assert_eq!(expand_variables(&mut ctx, root, &cache).unwrap(), 0);
    }

    #[test]
    fn cached_variable_leaf_is_followed_through_the_chain() {
        // y = a * b; x = y
        let mut ctx = Context::new();
        let a = var(&mut ctx, 1, "a");
        let b = var(&mut ctx, 2, "b");
        let y_tree = ctx.mul(a, b);
        let x_tree = var(&mut ctx, 5, "y");

        let x = var(&mut ctx, 3, "x");
        let c = var(&mut ctx, 4, "c");
        let root = ctx.add(x, c);

        let mut cache = TreeCache::new();
        cache.insert(VarKey(5), y_tree);
        cache.insert(VarKey(3), x_tree);

        assert_eq!(expand_variables(&mut ctx, root, &cache).unwrap(), 2);
        assert_eq!(DisplayNode::new(&ctx, root).to_string(), "a * b + c");
        assert_eq!(DisplayNode::new(&ctx, x_tree).to_string(), "y");
    }

    #[test]
    fn cycle_through_variable_leaves_is_rejected() {
        // x = y; y = x
        let mut ctx = Context::new();
        let x_tree = var(&mut ctx, 5, "y");
        let y_tree = var(&mut ctx, 3, "x");
        let x = var(&mut ctx, 3, "x");

        let mut cache = TreeCache::new();
        cache.insert(VarKey(3), x_tree);
        cache.insert(VarKey(5), y_tree);
        assert!(expand_variables(&mut ctx, x, &cache).is_err());
    }

    #[test]
    fn cache_miss_leaves_leaf_untouched() {
        let mut ctx = Context::new();
        let a = var(&mut ctx, 1, "a");
        let cache = TreeCache::new();
        assert_eq!(expand_variables(&mut ctx, a, &cache).unwrap(), 0);
        assert_eq!(ctx.get(a).variable_key(), Some(VarKey(1)));
        assert!(ctx.is_expanded(a));
    }

    #[test]
    fn self_reading_cache_entry_is_rejected() {
        let mut ctx = Context::new();
        let x_inner = var(&mut ctx, 3, "x");
        let b = var(&mut ctx, 2, "b");
        let x_tree = ctx.mul(x_inner, b);
        let x = var(&mut ctx, 3, "x");

        let mut cache = TreeCache::new();
        cache.insert(VarKey(3), x_tree);
        assert!(expand_variables(&mut ctx, x, &cache).is_err());
    }
}
