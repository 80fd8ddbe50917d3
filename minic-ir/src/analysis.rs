//! Block-order analysis over the control flow graph.

use ir::{BlockId, Function};


/// Compute the reverse-post-order of the blocks reachable from the entry,
/// following `exit_true` before `exit_false`. This is the order the
/// backends emit blocks in; blocks nothing branches to (for example the
/// continuation block started after a `ret` at the end of a branch arm)
/// do not appear.
pub fn reverse_post_order(function: &Function) -> Vec<BlockId> {
    let mut visited = vec![false; function.blocks.len()];
    let mut order = Vec::new();
    if !function.blocks.is_empty() {
        visit(function, BlockId(0), &mut visited, &mut order);
    }
    order.reverse();
    order
}

fn visit(function: &Function, id: BlockId, visited: &mut Vec<bool>, order: &mut Vec<BlockId>) {
    if visited[id.0 as usize] {
        return;
    }
    visited[id.0 as usize] = true;
    let block = function.block(id);
    if let Some(next) = block.exit_true {
        visit(function, next, visited, order);
    }
    if let Some(next) = block.exit_false {
        visit(function, next, visited, order);
    }
    order.push(id);
}

/// Whether every block of the function is reachable from the entry.
pub fn all_blocks_reachable(function: &Function) -> bool {
    reverse_post_order(function).len() == function.blocks.len()
}
