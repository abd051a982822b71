use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol};

use crate::RedemptionError;

// ── Storage keys ────────────────────────────────────────────────────────────

const INITIALIZED: Symbol = symbol_short!("INIT");
const ROLES: Symbol = symbol_short!("ROLES");
const POLICY: Symbol = symbol_short!("POLICY");
const LEDGER: Symbol = symbol_short!("LEDGER");

const INSTANCE_TTL_THRESHOLD: u32 = 518_400; // ~30 days
const INSTANCE_TTL_EXTEND_TO: u32 = 1_036_800; // ~60 days

// ── Types ───────────────────────────────────────────────────────────────────

/// Addresses the ledger trusts or talks to.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Roles {
    /// May change policy, rotate the gate and hand over admin.
    pub admin: Address,
    /// The only caller allowed to enqueue and drain.
    pub gate: Address,
    /// Rebasing receipt token; also the exchange-rate source.
    pub share_token: Address,
    /// Underlying asset paid out on settlement.
    pub asset: Address,
}

/// Admin-tunable knobs.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Policy {
    /// Smallest stake amount accepted by `enqueue`.
    pub min_request_amount: i128,
    /// Seconds that must pass between two trigger-driven drains.
    pub min_drain_interval: u64,
}

/// Global counters of the queue.
///
/// Loaded once at the start of an operation, mutated in memory and written
/// back with [`save_ledger`] so an operation never leaves a half-updated
/// view behind.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LedgerState {
    /// Id of the most recently queued request (0 = none yet).
    pub last_request_id: u64,
    /// Id of the most recently appended batch (0 = none yet).
    pub last_batch_id: u64,
    /// Front of the FIFO: smallest request id not yet fully drained.
    pub next_unserviced_id: u64,
    /// Σ `shares_remaining` over requests from `next_unserviced_id` on.
    pub total_queued_shares: i128,
    /// Requests below this id are inert (0 = nothing compacted).
    pub request_cutoff: u64,
    /// Batches below this id are irrelevant to lookups (0 = nothing compacted).
    pub batch_cutoff: u64,
    /// Ledger timestamp of the last drain, `None` until the first one.
    pub last_drain_at: Option<u64>,
}

impl LedgerState {
    fn new() -> Self {
        LedgerState {
            next_unserviced_id: 1,
            ..Default::default()
        }
    }
}

// ── Lifecycle ───────────────────────────────────────────────────────────────

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&INITIALIZED)
}

/// Write the initial configuration. Fails if called twice.
pub fn initialize(env: &Env, roles: &Roles, policy: &Policy) -> Result<(), RedemptionError> {
    if is_initialized(env) {
        return Err(RedemptionError::AlreadyInitialized);
    }
    validate_policy(policy)?;

    env.storage().instance().set(&ROLES, roles);
    env.storage().instance().set(&POLICY, policy);
    env.storage().instance().set(&LEDGER, &LedgerState::new());
    env.storage().instance().set(&INITIALIZED, &true);
    bump_instance(env);
    Ok(())
}

pub fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_TTL_THRESHOLD, INSTANCE_TTL_EXTEND_TO);
}

// ── Accessors ───────────────────────────────────────────────────────────────

pub fn roles(env: &Env) -> Result<Roles, RedemptionError> {
    env.storage()
        .instance()
        .get(&ROLES)
        .ok_or(RedemptionError::NotInitialized)
}

pub fn set_roles(env: &Env, roles: &Roles) {
    env.storage().instance().set(&ROLES, roles);
}

pub fn policy(env: &Env) -> Result<Policy, RedemptionError> {
    env.storage()
        .instance()
        .get(&POLICY)
        .ok_or(RedemptionError::NotInitialized)
}

pub fn set_policy(env: &Env, policy: &Policy) -> Result<(), RedemptionError> {
    validate_policy(policy)?;
    env.storage().instance().set(&POLICY, policy);
    Ok(())
}

pub fn ledger(env: &Env) -> Result<LedgerState, RedemptionError> {
    env.storage()
        .instance()
        .get(&LEDGER)
        .ok_or(RedemptionError::NotInitialized)
}

pub fn save_ledger(env: &Env, state: &LedgerState) {
    env.storage().instance().set(&LEDGER, state);
}

// ── Access control ──────────────────────────────────────────────────────────

/// Authenticate `caller` and check it is the admin.
pub fn require_admin(env: &Env, caller: &Address) -> Result<Roles, RedemptionError> {
    caller.require_auth();
    let roles = roles(env)?;
    if *caller != roles.admin {
        return Err(RedemptionError::Unauthorized);
    }
    Ok(roles)
}

/// Authenticate `caller` and check it is the liquidity gate.
pub fn require_gate(env: &Env, caller: &Address) -> Result<Roles, RedemptionError> {
    caller.require_auth();
    let roles = roles(env)?;
    if *caller != roles.gate {
        return Err(RedemptionError::Unauthorized);
    }
    Ok(roles)
}

fn validate_policy(policy: &Policy) -> Result<(), RedemptionError> {
    if policy.min_request_amount < 0 {
        return Err(RedemptionError::InvalidAmount);
    }
    Ok(())
}

/// Whether the minimum interval since the last drain has elapsed.
pub fn drain_interval_elapsed(env: &Env, state: &LedgerState, policy: &Policy) -> bool {
    match state.last_drain_at {
        None => true,
        Some(at) => env.ledger().timestamp() >= at.saturating_add(policy.min_drain_interval),
    }
}
