use soroban_sdk::{contracttype, Address, Env, Vec};

use crate::batches;
use crate::config::LedgerState;
use crate::queue::{self, Request};
use crate::rate;
use crate::RedemptionError;

/// An owner's requests that have value available right now.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FinalizedRequests {
    pub request_ids: Vec<u64>,
    /// Covering batch per request, 0 where only a partial credit exists.
    pub batch_ids: Vec<u64>,
    /// Stake payable if every listed request were settled now.
    pub total_payable: i128,
}

/// Value of `request` if settled against `batch_id`.
///
/// A covering batch releases the remaining shares at its rate on top of any
/// partial credit; without one only the partial credit is payable.
fn payable(env: &Env, request: &Request, batch_id: u64) -> Result<i128, RedemptionError> {
    if batch_id == 0 {
        return Ok(request.settled_amount);
    }
    let batch = batches::get_batch(env, batch_id).ok_or(RedemptionError::InvalidReference)?;
    if request.id > batch.boundary_request_id {
        return Ok(request.settled_amount);
    }
    let released = rate::stake_for_shares(&batch.rate, request.shares_remaining)?;
    request
        .settled_amount
        .checked_add(released)
        .ok_or(RedemptionError::ArithmeticOverflow)
}

/// Validate a caller-supplied batch hint for `request`.
fn check_hint(env: &Env, request: &Request, batch_id: u64) -> Result<(), RedemptionError> {
    if batch_id == 0 {
        return Ok(());
    }
    let boundary = batches::boundary_of(env, batch_id)?;
    let previous = batches::boundary_of(env, batch_id - 1)?;
    if request.id <= previous {
        return Err(RedemptionError::InvalidReference);
    }
    if request.id > boundary && request.settled_amount == 0 {
        return Err(RedemptionError::InvalidReference);
    }
    Ok(())
}

/// Zero out everything payable on the given requests and return the total.
///
/// Each request is written back before the next one is looked at, so a
/// duplicated id pays once. The caller transfers the total afterwards.
pub fn settle(
    env: &Env,
    caller: &Address,
    request_ids: &Vec<u64>,
    batch_ids: &Vec<u64>,
) -> Result<i128, RedemptionError> {
    if request_ids.len() != batch_ids.len() {
        return Err(RedemptionError::InvalidReference);
    }

    let mut total: i128 = 0;
    for (id, batch_id) in request_ids.iter().zip(batch_ids.iter()) {
        let mut request = queue::get_request(env, id).ok_or(RedemptionError::InvalidReference)?;
        if request.owner != *caller {
            return Err(RedemptionError::Unauthorized);
        }
        check_hint(env, &request, batch_id)?;

        let amount = payable(env, &request, batch_id)?;
        let fully_finalized = batch_id != 0
            && request.id <= batches::boundary_of(env, batch_id)?;
        if fully_finalized {
            request.shares_remaining = 0;
        }
        request.settled_amount = 0;
        queue::store_request(env, &request);

        total = total
            .checked_add(amount)
            .ok_or(RedemptionError::ArithmeticOverflow)?;
    }
    Ok(total)
}

/// Walk `owner`'s active requests in arrival order and report those with
/// value available.
///
/// Stops at the first request that has neither a covering batch nor a
/// partial credit: every later request is newer and cannot be finalized.
pub fn list_finalized(
    env: &Env,
    state: &LedgerState,
    owner: &Address,
) -> Result<FinalizedRequests, RedemptionError> {
    let mut listed = FinalizedRequests {
        request_ids: Vec::new(env),
        batch_ids: Vec::new(env),
        total_payable: 0,
    };

    for id in queue::active_request_ids(env, owner).iter() {
        let request = queue::get_request(env, id).ok_or(RedemptionError::InvalidReference)?;
        let batch_id = batches::resolve_batch_id(env, state, id);
        if batch_id == 0 && request.settled_amount == 0 {
            break;
        }
        let amount = payable(env, &request, batch_id)?;
        listed.request_ids.push_back(id);
        listed.batch_ids.push_back(batch_id);
        listed.total_payable = listed
            .total_payable
            .checked_add(amount)
            .ok_or(RedemptionError::ArithmeticOverflow)?;
    }
    Ok(listed)
}
