use soroban_sdk::{contracttype, symbol_short, Address, Env, Symbol, Vec};

// ── Storage key constants ───────────────────────────────────────────────────

const REQUEST: Symbol = symbol_short!("REQ");
const OWNER_INDEX: Symbol = symbol_short!("OWN_REQ");

const REQ_TTL_THRESHOLD: u32 = 5_184_000; // ~60 days
const REQ_TTL_EXTEND_TO: u32 = 10_368_000; // ~120 days

// ── Types ───────────────────────────────────────────────────────────────────

/// A redemption request sitting in the FIFO queue.
///
/// Requests are never removed from storage. Settlement zeroes them in place
/// so ids stay stable for batch lookups; a request with nothing remaining and
/// nothing settled is inert.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Request {
    /// Sequential id, starting at 1.
    pub id: u64,
    /// Account that may settle the request.
    pub owner: Address,
    /// Shares not yet allocated to any drain.
    pub shares_remaining: i128,
    /// Stake already finalized by partial drains but not yet paid out.
    pub settled_amount: i128,
    /// Ledger timestamp at enqueue.
    pub queued_at: u64,
}

impl Request {
    pub fn is_inert(&self) -> bool {
        self.shares_remaining == 0 && self.settled_amount == 0
    }
}

// ── Storage helpers ─────────────────────────────────────────────────────────

fn request_key(id: u64) -> (Symbol, u64) {
    (REQUEST, id)
}

fn owner_key(owner: &Address) -> (Symbol, Address) {
    (OWNER_INDEX, owner.clone())
}

/// Persist a `Request`.
pub fn store_request(env: &Env, request: &Request) {
    let key = request_key(request.id);
    env.storage().persistent().set(&key, request);
    env.storage()
        .persistent()
        .extend_ttl(&key, REQ_TTL_THRESHOLD, REQ_TTL_EXTEND_TO);
}

/// Retrieve a `Request` by id, returning `None` when not found.
pub fn get_request(env: &Env, id: u64) -> Option<Request> {
    env.storage().persistent().get(&request_key(id))
}

/// Create request `id` and record it in the owner's index.
pub fn push_request(env: &Env, id: u64, owner: &Address, shares: i128) -> Request {
    let request = Request {
        id,
        owner: owner.clone(),
        shares_remaining: shares,
        settled_amount: 0,
        queued_at: env.ledger().timestamp(),
    };
    store_request(env, &request);

    let key = owner_key(owner);
    let mut ids: Vec<u64> = env
        .storage()
        .persistent()
        .get(&key)
        .unwrap_or(Vec::new(env));
    ids.push_back(id);
    env.storage().persistent().set(&key, &ids);
    env.storage()
        .persistent()
        .extend_ttl(&key, REQ_TTL_THRESHOLD, REQ_TTL_EXTEND_TO);

    request
}

/// Every request id `owner` has ever queued, oldest first.
pub fn owner_request_ids(env: &Env, owner: &Address) -> Vec<u64> {
    env.storage()
        .persistent()
        .get(&owner_key(owner))
        .unwrap_or(Vec::new(env))
}

/// The owner's requests that still hold shares or an unpaid credit.
pub fn active_request_ids(env: &Env, owner: &Address) -> Vec<u64> {
    let mut active = Vec::new(env);
    for id in owner_request_ids(env, owner).iter() {
        if let Some(request) = get_request(env, id) {
            if !request.is_inert() {
                active.push_back(id);
            }
        }
    }
    active
}
