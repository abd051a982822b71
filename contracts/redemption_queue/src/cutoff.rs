use soroban_sdk::Env;

use crate::batches;
use crate::config::LedgerState;
use crate::queue;

/// First request id at or after `from` that still holds shares or credit,
/// or `last_request_id + 1` when every request from `from` on is inert.
fn first_active_request(env: &Env, state: &LedgerState, from: u64) -> u64 {
    let mut id = from;
    while id <= state.last_request_id {
        match queue::get_request(env, id) {
            Some(request) if !request.is_inert() => break,
            _ => id += 1,
        }
    }
    id
}

/// First batch id at or after `from` whose boundary reaches `request_cutoff`,
/// or `last_batch_id + 1` when none does.
fn first_relevant_batch(env: &Env, state: &LedgerState, from: u64, request_cutoff: u64) -> u64 {
    let mut id = from;
    while id <= state.last_batch_id {
        // A missing batch stops the scan: never skip what we cannot see.
        let reaches = batches::get_batch(env, id)
            .map(|batch| batch.boundary_request_id >= request_cutoff)
            .unwrap_or(true);
        if reaches {
            break;
        }
        id += 1;
    }
    id
}

/// Advance both cutoffs past the fully-settled prefix.
///
/// Cutoffs only move forward, and only when the scan actually skipped a
/// request or batch; a value of 0 or 1 both mean "start from the beginning".
/// Returns whether either cutoff moved.
pub fn advance(env: &Env, state: &mut LedgerState) -> bool {
    let request_from = state.request_cutoff.max(1);
    let new_request_cutoff = first_active_request(env, state, request_from);

    let batch_from = state.batch_cutoff.max(1);
    let new_batch_cutoff = first_relevant_batch(env, state, batch_from, new_request_cutoff);

    let mut moved = false;
    if new_request_cutoff > request_from {
        state.request_cutoff = new_request_cutoff;
        moved = true;
    }
    if new_batch_cutoff > batch_from {
        state.batch_cutoff = new_batch_cutoff;
        moved = true;
    }
    moved
}
