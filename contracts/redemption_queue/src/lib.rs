#![no_std]

//! Redemption queue for a liquid-staking receipt token.
//!
//! Holders redeem through the liquidity gate; when the protocol lacks
//! liquidity their requests wait in strict arrival order and are paid out as
//! liquidity arrives, at the exchange rate in effect when each portion is
//! finalized. Finalization is recorded as batches (one rate snapshot per
//! queue boundary) so settling many requests costs one lookup each.

#[cfg(test)]
extern crate std;

pub mod batches;
pub mod config;
pub mod cutoff;
pub mod events;
pub mod interfaces;
pub mod queue;
pub mod rate;
pub mod settlement;
#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

use soroban_sdk::{contract, contracterror, contractimpl, log, token, Address, Bytes, Env, Vec};

pub use batches::Batch;
pub use config::{LedgerState, Policy, Roles};
pub use interfaces::{LiquidityGateClient, ShareTokenClient};
pub use queue::Request;
pub use rate::ExchangeRate;
pub use settlement::FinalizedRequests;

/// Contract errors
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum RedemptionError {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    /// Caller is not the gate, the admin, or the request owner.
    Unauthorized = 3,
    AmountTooSmall = 4,
    /// Unknown request or batch, a batch hint that does not cover the
    /// request, or mismatched id/hint lists.
    InvalidReference = 5,
    NoActionNeeded = 6,
    /// Internal accounting broke an invariant; never expected.
    InvariantViolation = 7,
    InvalidAmount = 8,
    ArithmeticOverflow = 9,
}

#[contract]
pub struct RedemptionQueueContract;

#[contractimpl]
impl RedemptionQueueContract {
    // ── Setup ───────────────────────────────────────────────────────────────

    /// Initialize the ledger with its collaborators and policy.
    pub fn initialize(
        env: Env,
        admin: Address,
        gate: Address,
        share_token: Address,
        asset: Address,
        min_request_amount: i128,
        min_drain_interval: u64,
    ) -> Result<(), RedemptionError> {
        let roles = Roles {
            admin: admin.clone(),
            gate: gate.clone(),
            share_token,
            asset,
        };
        let policy = Policy {
            min_request_amount,
            min_drain_interval,
        };
        config::initialize(&env, &roles, &policy)?;

        events::publish_initialized(&env, admin, gate);
        Ok(())
    }

    pub fn is_initialized(env: Env) -> bool {
        config::is_initialized(&env)
    }

    // ── Liquidity gate ──────────────────────────────────────────────────────

    /// Queue a redemption of `amount` stake for `owner`.
    ///
    /// Only the gate may call this. The matching receipt shares move from the
    /// gate into ledger custody. Returns the new request id.
    pub fn enqueue(
        env: Env,
        caller: Address,
        owner: Address,
        amount: i128,
    ) -> Result<u64, RedemptionError> {
        let roles = config::require_gate(&env, &caller)?;
        let policy = config::policy(&env)?;
        if amount <= 0 || amount < policy.min_request_amount {
            return Err(RedemptionError::AmountTooSmall);
        }

        let share_token = ShareTokenClient::new(&env, &roles.share_token);
        let rate = share_token.exchange_rate();
        let shares = rate::shares_for_stake(&rate, amount)?;
        if shares == 0 {
            return Err(RedemptionError::AmountTooSmall);
        }

        let mut state = config::ledger(&env)?;
        let request_id = state.last_request_id + 1;
        queue::push_request(&env, request_id, &owner, shares);
        state.last_request_id = request_id;
        state.total_queued_shares = state
            .total_queued_shares
            .checked_add(shares)
            .ok_or(RedemptionError::ArithmeticOverflow)?;
        config::save_ledger(&env, &state);
        config::bump_instance(&env);

        share_token.transfer_shares(&caller, &env.current_contract_address(), &shares);

        log!(&env, "enqueue", request_id, amount, shares);
        events::publish_queued(&env, request_id, owner, amount, shares);
        Ok(request_id)
    }

    /// Apply `amount` of freshly available stake to the front of the queue.
    ///
    /// Only the gate may call this. The gate hands over `amount` of the
    /// underlying asset and receives back the receipt shares the drain
    /// consumed.
    pub fn drain(env: Env, caller: Address, amount: i128) -> Result<(), RedemptionError> {
        let roles = config::require_gate(&env, &caller)?;
        let mut state = config::ledger(&env)?;
        let share_token = ShareTokenClient::new(&env, &roles.share_token);
        let rate = share_token.exchange_rate();

        let shares = batches::shares_to_apply(&state, &rate, amount)?;
        let outcome = batches::apply_drain(&env, &mut state, &rate, shares)?;
        state.last_drain_at = Some(env.ledger().timestamp());
        config::save_ledger(&env, &state);
        config::bump_instance(&env);

        let this = env.current_contract_address();
        token::TokenClient::new(&env, &roles.asset).transfer(&caller, &this, &amount);
        share_token.transfer_shares(&this, &caller, &outcome.shares_applied);

        log!(&env, "drain", amount, outcome.shares_applied, outcome.batch_id);
        events::publish_drained(
            &env,
            amount,
            outcome.shares_applied,
            outcome.batch_id,
            state.next_unserviced_id,
        );
        Ok(())
    }

    /// Whether the queue holds anything and the drain interval has passed.
    pub fn can_drain(env: Env) -> bool {
        let (Ok(state), Ok(policy)) = (config::ledger(&env), config::policy(&env)) else {
            return false;
        };
        state.total_queued_shares != 0 && config::drain_interval_elapsed(&env, &state, &policy)
    }

    /// Stake value of everything still queued, at the current rate.
    pub fn total_queued(env: Env) -> Result<i128, RedemptionError> {
        let roles = config::roles(&env)?;
        let state = config::ledger(&env)?;
        let rate = ShareTokenClient::new(&env, &roles.share_token).exchange_rate();
        rate::stake_for_shares(&rate, state.total_queued_shares)
    }

    // ── Automation ──────────────────────────────────────────────────────────

    /// Report whether `execute_trigger` would drain anything.
    ///
    /// The hint is the drainable amount as 16 big-endian bytes, or empty.
    pub fn check_trigger(env: Env) -> (bool, Bytes) {
        match plan_trigger_drain(&env) {
            Ok(Some(plan)) => (true, Bytes::from_array(&env, &plan.amount.to_be_bytes())),
            _ => (false, Bytes::new(&env)),
        }
    }

    /// Pull as much liquidity from the gate as the queue can absorb and drain
    /// it. Callable by anyone; the hint is advisory and recomputed here.
    pub fn execute_trigger(env: Env, _hint: Bytes) -> Result<i128, RedemptionError> {
        let PlannedDrain {
            roles,
            mut state,
            rate,
            amount,
            shares,
        } = plan_trigger_drain(&env)?.ok_or(RedemptionError::NoActionNeeded)?;

        let outcome = batches::apply_drain(&env, &mut state, &rate, shares)?;
        state.last_drain_at = Some(env.ledger().timestamp());
        config::save_ledger(&env, &state);
        config::bump_instance(&env);

        let this = env.current_contract_address();
        let share_token = ShareTokenClient::new(&env, &roles.share_token);
        LiquidityGateClient::new(&env, &roles.gate).deliver(&this, &amount);
        share_token.transfer_shares(&this, &roles.gate, &outcome.shares_applied);

        log!(&env, "trigger drain", amount, outcome.shares_applied);
        events::publish_drained(
            &env,
            amount,
            outcome.shares_applied,
            outcome.batch_id,
            state.next_unserviced_id,
        );
        Ok(amount)
    }

    // ── Owners ──────────────────────────────────────────────────────────────

    /// Pay out everything finalized on `request_ids`.
    ///
    /// `batch_ids` holds one hint per request, as returned by
    /// `get_batch_ids`; 0 redeems only the partial credit. The total is
    /// transferred to `caller` once, after all requests are updated.
    pub fn settle(
        env: Env,
        caller: Address,
        request_ids: Vec<u64>,
        batch_ids: Vec<u64>,
    ) -> Result<i128, RedemptionError> {
        caller.require_auth();
        let roles = config::roles(&env)?;

        let total = settlement::settle(&env, &caller, &request_ids, &batch_ids)?;
        config::bump_instance(&env);

        if total > 0 {
            token::TokenClient::new(&env, &roles.asset).transfer(
                &env.current_contract_address(),
                &caller,
                &total,
            );
        }

        log!(&env, "settle", total);
        events::publish_settled(&env, caller, request_ids.len(), total);
        Ok(total)
    }

    /// Request ids of `owner` that still hold shares or an unpaid credit.
    pub fn get_queued_ids_by_owner(env: Env, owner: Address) -> Vec<u64> {
        queue::active_request_ids(&env, &owner)
    }

    /// `owner`'s requests with value available now, their batch hints and
    /// the total payable.
    pub fn list_finalized_for_owner(
        env: Env,
        owner: Address,
    ) -> Result<FinalizedRequests, RedemptionError> {
        let state = config::ledger(&env)?;
        settlement::list_finalized(&env, &state, &owner)
    }

    pub fn get_requests(env: Env, request_ids: Vec<u64>) -> Result<Vec<Request>, RedemptionError> {
        let mut requests = Vec::new(&env);
        for id in request_ids.iter() {
            let request = queue::get_request(&env, id).ok_or(RedemptionError::InvalidReference)?;
            requests.push_back(request);
        }
        Ok(requests)
    }

    /// Covering batch for each request id, 0 where not fully finalized.
    pub fn get_batch_ids(env: Env, request_ids: Vec<u64>) -> Result<Vec<u64>, RedemptionError> {
        let state = config::ledger(&env)?;
        let mut batch_ids = Vec::new(&env);
        for id in request_ids.iter() {
            batch_ids.push_back(batches::resolve_batch_id(&env, &state, id));
        }
        Ok(batch_ids)
    }

    pub fn get_batches(env: Env, batch_ids: Vec<u64>) -> Result<Vec<Batch>, RedemptionError> {
        let mut found = Vec::new(&env);
        for id in batch_ids.iter() {
            let batch = batches::get_batch(&env, id).ok_or(RedemptionError::InvalidReference)?;
            found.push_back(batch);
        }
        Ok(found)
    }

    // ── Compaction ──────────────────────────────────────────────────────────

    /// Move the lookup cutoffs past the fully-settled prefix. Open to anyone;
    /// it changes no payable amount.
    pub fn advance_cutoffs(env: Env) -> Result<LedgerState, RedemptionError> {
        let mut state = config::ledger(&env)?;
        if cutoff::advance(&env, &mut state) {
            config::save_ledger(&env, &state);
            config::bump_instance(&env);
            events::publish_cutoffs_advanced(&env, state.request_cutoff, state.batch_cutoff);
        }
        Ok(state)
    }

    pub fn get_ledger_state(env: Env) -> Result<LedgerState, RedemptionError> {
        config::ledger(&env)
    }

    // ── Admin ───────────────────────────────────────────────────────────────

    pub fn get_admin(env: Env) -> Result<Address, RedemptionError> {
        Ok(config::roles(&env)?.admin)
    }

    pub fn get_roles(env: Env) -> Result<Roles, RedemptionError> {
        config::roles(&env)
    }

    pub fn get_policy(env: Env) -> Result<Policy, RedemptionError> {
        config::policy(&env)
    }

    pub fn set_min_request_amount(
        env: Env,
        caller: Address,
        amount: i128,
    ) -> Result<(), RedemptionError> {
        config::require_admin(&env, &caller)?;
        let mut policy = config::policy(&env)?;
        policy.min_request_amount = amount;
        update_policy(&env, &policy)
    }

    pub fn set_min_drain_interval(
        env: Env,
        caller: Address,
        seconds: u64,
    ) -> Result<(), RedemptionError> {
        config::require_admin(&env, &caller)?;
        let mut policy = config::policy(&env)?;
        policy.min_drain_interval = seconds;
        update_policy(&env, &policy)
    }

    /// Point the ledger at a different liquidity gate.
    pub fn set_gate(env: Env, caller: Address, gate: Address) -> Result<(), RedemptionError> {
        let mut roles = config::require_admin(&env, &caller)?;
        let previous = roles.gate.clone();
        roles.gate = gate.clone();
        config::set_roles(&env, &roles);
        config::bump_instance(&env);

        events::publish_gate_changed(&env, previous, gate);
        Ok(())
    }

    pub fn transfer_admin(
        env: Env,
        caller: Address,
        new_admin: Address,
    ) -> Result<(), RedemptionError> {
        let mut roles = config::require_admin(&env, &caller)?;
        new_admin.require_auth();
        roles.admin = new_admin.clone();
        config::set_roles(&env, &roles);
        config::bump_instance(&env);

        events::publish_admin_changed(&env, caller, new_admin);
        Ok(())
    }

    /// Contract version
    pub fn version() -> u32 {
        1
    }
}

fn update_policy(env: &Env, policy: &Policy) -> Result<(), RedemptionError> {
    config::set_policy(env, policy)?;
    config::bump_instance(env);
    events::publish_policy_updated(env, policy.min_request_amount, policy.min_drain_interval);
    Ok(())
}

/// A trigger-driven drain worked out against one rate snapshot.
struct PlannedDrain {
    roles: Roles,
    state: LedgerState,
    rate: ExchangeRate,
    amount: i128,
    shares: i128,
}

/// What a trigger-driven drain would do right now, if anything.
///
/// `None` when the queue is empty, the drain interval has not elapsed, or
/// the gate's capacity does not buy a single queued share.
fn plan_trigger_drain(env: &Env) -> Result<Option<PlannedDrain>, RedemptionError> {
    let roles = config::roles(env)?;
    let policy = config::policy(env)?;
    let state = config::ledger(env)?;
    if state.total_queued_shares == 0 || !config::drain_interval_elapsed(env, &state, &policy) {
        return Ok(None);
    }

    let capacity = LiquidityGateClient::new(env, &roles.gate).available_liquidity();
    if capacity <= 0 {
        return Ok(None);
    }

    let rate = ShareTokenClient::new(env, &roles.share_token).exchange_rate();
    let queued = rate::stake_for_shares(&rate, state.total_queued_shares)?;
    let amount = queued.min(capacity);
    let shares = match batches::shares_to_apply(&state, &rate, amount) {
        Ok(shares) => shares,
        Err(RedemptionError::InvalidAmount) | Err(RedemptionError::NoActionNeeded) => {
            return Ok(None)
        }
        Err(err) => return Err(err),
    };

    Ok(Some(PlannedDrain {
        roles,
        state,
        rate,
        amount,
        shares,
    }))
}
