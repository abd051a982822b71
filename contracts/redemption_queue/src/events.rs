use soroban_sdk::{contracttype, symbol_short, Address, Env};

// ── Payloads ────────────────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InitializedEvent {
    pub admin: Address,
    pub gate: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QueuedEvent {
    pub request_id: u64,
    pub owner: Address,
    pub amount: i128,
    pub shares: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DrainedEvent {
    pub amount: i128,
    pub shares_applied: i128,
    /// 0 when the drain appended no batch.
    pub batch_id: u64,
    pub next_unserviced_id: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SettledEvent {
    pub owner: Address,
    pub request_count: u32,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CutoffsAdvancedEvent {
    pub request_cutoff: u64,
    pub batch_cutoff: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PolicyUpdatedEvent {
    pub min_request_amount: i128,
    pub min_drain_interval: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoleChangedEvent {
    pub previous: Address,
    pub current: Address,
}

// ── Publishers ──────────────────────────────────────────────────────────────

pub fn publish_initialized(env: &Env, admin: Address, gate: Address) {
    env.events()
        .publish((symbol_short!("INIT"),), InitializedEvent { admin, gate });
}

pub fn publish_queued(env: &Env, request_id: u64, owner: Address, amount: i128, shares: i128) {
    env.events().publish(
        (symbol_short!("QUEUED"), owner.clone()),
        QueuedEvent {
            request_id,
            owner,
            amount,
            shares,
        },
    );
}

pub fn publish_drained(
    env: &Env,
    amount: i128,
    shares_applied: i128,
    batch_id: u64,
    next_unserviced_id: u64,
) {
    env.events().publish(
        (symbol_short!("DRAINED"),),
        DrainedEvent {
            amount,
            shares_applied,
            batch_id,
            next_unserviced_id,
        },
    );
}

pub fn publish_settled(env: &Env, owner: Address, request_count: u32, amount: i128) {
    env.events().publish(
        (symbol_short!("SETTLED"), owner.clone()),
        SettledEvent {
            owner,
            request_count,
            amount,
        },
    );
}

pub fn publish_cutoffs_advanced(env: &Env, request_cutoff: u64, batch_cutoff: u64) {
    env.events().publish(
        (symbol_short!("CUTOFFS"),),
        CutoffsAdvancedEvent {
            request_cutoff,
            batch_cutoff,
        },
    );
}

pub fn publish_policy_updated(env: &Env, min_request_amount: i128, min_drain_interval: u64) {
    env.events().publish(
        (symbol_short!("POLICY"),),
        PolicyUpdatedEvent {
            min_request_amount,
            min_drain_interval,
        },
    );
}

pub fn publish_gate_changed(env: &Env, previous: Address, current: Address) {
    env.events().publish(
        (symbol_short!("GATE"),),
        RoleChangedEvent { previous, current },
    );
}

pub fn publish_admin_changed(env: &Env, previous: Address, current: Address) {
    env.events().publish(
        (symbol_short!("ADMIN"),),
        RoleChangedEvent { previous, current },
    );
}
