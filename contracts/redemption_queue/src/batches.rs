use soroban_sdk::{contracttype, symbol_short, Env, Symbol};

use crate::config::LedgerState;
use crate::queue::{self, Request};
use crate::rate::{self, ExchangeRate};
use crate::RedemptionError;

// ── Storage key constants ───────────────────────────────────────────────────

const BATCH: Symbol = symbol_short!("BATCH");

const BATCH_TTL_THRESHOLD: u32 = 5_184_000; // ~60 days
const BATCH_TTL_EXTEND_TO: u32 = 10_368_000; // ~120 days

// ── Types ───────────────────────────────────────────────────────────────────

/// Immutable record of "every request up to `boundary_request_id` was
/// finalized at `rate`".
///
/// A request is covered by batch `b` when
/// `batch[b - 1].boundary_request_id < id <= batch[b].boundary_request_id`,
/// with the sentinel batch 0 having boundary 0. Boundaries are strictly
/// increasing with the batch id.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Batch {
    pub id: u64,
    /// Highest request id fully finalized by this batch.
    pub boundary_request_id: u64,
    /// Rate snapshot taken when the batch was appended.
    pub rate: ExchangeRate,
    /// Shares consumed by the drain that produced this batch.
    pub shares_applied: i128,
    pub finalized_at: u64,
}

/// What a single drain did to the queue.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DrainOutcome {
    pub shares_applied: i128,
    /// Appended batch, or 0 when the drain only credited a partial request.
    pub batch_id: u64,
}

// ── Storage helpers ─────────────────────────────────────────────────────────

fn batch_key(id: u64) -> (Symbol, u64) {
    (BATCH, id)
}

pub fn get_batch(env: &Env, id: u64) -> Option<Batch> {
    env.storage().persistent().get(&batch_key(id))
}

fn store_batch(env: &Env, batch: &Batch) {
    let key = batch_key(batch.id);
    env.storage().persistent().set(&key, batch);
    env.storage()
        .persistent()
        .extend_ttl(&key, BATCH_TTL_THRESHOLD, BATCH_TTL_EXTEND_TO);
}

/// Boundary of batch `id`; the sentinel batch 0 has boundary 0.
pub fn boundary_of(env: &Env, id: u64) -> Result<u64, RedemptionError> {
    if id == 0 {
        return Ok(0);
    }
    get_batch(env, id)
        .map(|batch| batch.boundary_request_id)
        .ok_or(RedemptionError::InvalidReference)
}

// ── Drain ───────────────────────────────────────────────────────────────────

/// Shares a drain of `amount` stake will consume at `rate`.
///
/// Draining exactly the queued value takes every queued share, so floor
/// rounding can never strand a sliver of the last request.
pub fn shares_to_apply(
    state: &LedgerState,
    rate: &ExchangeRate,
    amount: i128,
) -> Result<i128, RedemptionError> {
    if amount <= 0 {
        return Err(RedemptionError::InvalidAmount);
    }
    if state.total_queued_shares == 0 {
        return Err(RedemptionError::NoActionNeeded);
    }
    let queued_value = rate::stake_for_shares(rate, state.total_queued_shares)?;
    if amount > queued_value {
        return Err(RedemptionError::InvalidAmount);
    }
    if amount == queued_value {
        return Ok(state.total_queued_shares);
    }
    let shares = rate::shares_for_stake(rate, amount)?.min(state.total_queued_shares);
    if shares == 0 {
        return Err(RedemptionError::InvalidAmount);
    }
    Ok(shares)
}

/// Apply `shares` to the front of the queue.
///
/// Walks requests from `next_unserviced_id`. Requests the drain covers
/// completely are skipped over; their value is fixed by the batch appended at
/// the end of the walk. A request the drain only reaches partially is
/// credited the stake value of the applied shares at `rate` and stays at the
/// front of the queue.
///
/// `shares` never exceeds the queued total, so the walk always stops on a
/// stored request; running past the last one is an invariant violation.
pub fn apply_drain(
    env: &Env,
    state: &mut LedgerState,
    rate: &ExchangeRate,
    shares: i128,
) -> Result<DrainOutcome, RedemptionError> {
    if shares <= 0 || shares > state.total_queued_shares {
        return Err(RedemptionError::InvariantViolation);
    }

    let mut remaining = shares;
    let mut id = state.next_unserviced_id;
    let boundary;

    loop {
        let mut request: Request =
            queue::get_request(env, id).ok_or(RedemptionError::InvariantViolation)?;

        if request.shares_remaining < remaining {
            remaining -= request.shares_remaining;
            id += 1;
            continue;
        }

        if request.shares_remaining > remaining {
            let credit = rate::stake_for_shares(rate, remaining)?;
            request.settled_amount = request
                .settled_amount
                .checked_add(credit)
                .ok_or(RedemptionError::ArithmeticOverflow)?;
            request.shares_remaining -= remaining;
            queue::store_request(env, &request);
            state.next_unserviced_id = id;
            boundary = id - 1;
        } else {
            state.next_unserviced_id = id + 1;
            boundary = id;
        }
        break;
    }
    state.total_queued_shares -= shares;

    let mut batch_id = 0;
    let last_boundary = boundary_of(env, state.last_batch_id)
        .map_err(|_| RedemptionError::InvariantViolation)?;
    if boundary > last_boundary {
        batch_id = state.last_batch_id + 1;
        store_batch(
            env,
            &Batch {
                id: batch_id,
                boundary_request_id: boundary,
                rate: *rate,
                shares_applied: shares,
                finalized_at: env.ledger().timestamp(),
            },
        );
        state.last_batch_id = batch_id;
    }

    Ok(DrainOutcome {
        shares_applied: shares,
        batch_id,
    })
}

// ── Lookup ──────────────────────────────────────────────────────────────────

/// First batch whose boundary reaches `request_id`, or 0 if the request is
/// not fully finalized yet.
///
/// Boundaries are sorted, so this is a binary search over
/// `[max(batch_cutoff, 1), last_batch_id]`. Requests below the request
/// cutoff are inert and resolve to 0; the batches that covered them may lie
/// below the batch cutoff.
pub fn resolve_batch_id(env: &Env, state: &LedgerState, request_id: u64) -> u64 {
    if request_id == 0 || request_id < state.request_cutoff || state.last_batch_id == 0 {
        return 0;
    }

    let mut lo = state.batch_cutoff.max(1);
    let mut hi = state.last_batch_id + 1;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let boundary = get_batch(env, mid)
            .map(|batch| batch.boundary_request_id)
            .unwrap_or(0);
        if boundary >= request_id {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }

    if lo > state.last_batch_id {
        0
    } else {
        lo
    }
}
