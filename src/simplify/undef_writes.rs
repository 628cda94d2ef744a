//! Forwarding of region writes whose written value is `undef`.
//!
//! Writing `undef` into a region leaves the destination unchanged as far as any reader can
//! tell, so such a write is replaced by its old value. Forwarding can expose further writes
//! (a write whose new value was a forwarded write of `undef` now writes `undef` itself), which
//! are processed from the same queue.

use std::collections::{HashSet, VecDeque};

use crate::ir::{Function, InstRef};

use super::classify::RegionOp;

/// A `wrregion*` or `wrpredregion` whose new value operand is `undef`.
pub fn is_write_with_undef_input(func: &Function<'_>, inst: InstRef) -> bool {
    let data = func.inst(inst);

    RegionOp::of_intrinsic(data.intrinsic_id())
        .new_value_operand()
        .and_then(|n| data.operands.get(n))
        .is_some_and(|&v| func.is_undef(v))
}

/// Replaces every write of `undef` with the value it would have overwritten, transitively.
///
/// Returns whether the initial scan found anything to remove.
pub fn eliminate_undef_writes(func: &mut Function<'_>) -> bool {
    let mut queue = func
        .instructions()
        .filter(|&x| is_write_with_undef_input(func, x))
        .collect::<VecDeque<_>>();
    let mut queued = queue.iter().copied().collect::<HashSet<_>>();
    let modified = !queue.is_empty();

    while let Some(w) = queue.pop_front() {
        let data = func.inst(w);
        let Some(old) = RegionOp::of_intrinsic(data.intrinsic_id())
            .old_value_operand()
            .and_then(|n| data.operands.get(n).copied())
        else {
            continue;
        };
        // users have to be taken before the redirect empties the list
        let mut users = data.users.clone();
        users.sort();
        users.dedup();

        log::debug!(
            "[UndefWrites] {} <- {}",
            func.instruction_to_string(w),
            func.value_to_string(old)
        );
        func.replace_all_uses_with(w, old);
        for u in users {
            if !queued.contains(&u) && is_write_with_undef_input(func, u) {
                queue.push_back(u);
                queued.insert(u);
            }
        }
        func.erase(w);
    }

    modified
}
