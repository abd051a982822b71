//! Minimal collaborators for exercising the ledger off-chain.

use soroban_sdk::testutils::{Address as _, Ledger as _};
use soroban_sdk::{contract, contractimpl, symbol_short, token, Address, Env, Symbol};

use crate::rate::ExchangeRate;
use crate::RedemptionQueueContractClient;

const TOTAL_STAKE: Symbol = symbol_short!("TOT_STK");
const TOTAL_SHARES: Symbol = symbol_short!("TOT_SHR");
const BALANCE: Symbol = symbol_short!("BAL");

const ASSET: Symbol = symbol_short!("ASSET");
const LIQUIDITY: Symbol = symbol_short!("LIQ");

/// Rebasing receipt token whose rate is set directly by tests.
#[contract]
pub struct MockShareToken;

#[contractimpl]
impl MockShareToken {
    pub fn setup_token(env: Env, total_stake: i128, total_shares: i128) {
        env.storage().instance().set(&TOTAL_STAKE, &total_stake);
        env.storage().instance().set(&TOTAL_SHARES, &total_shares);
    }

    /// Accrue (or slash) rewards: every share is now worth
    /// `total_stake / total_shares`.
    pub fn rebase(env: Env, total_stake: i128) {
        env.storage().instance().set(&TOTAL_STAKE, &total_stake);
    }

    pub fn mint_shares(env: Env, to: Address, shares: i128) {
        let key = (BALANCE, to);
        let balance: i128 = env.storage().persistent().get(&key).unwrap_or(0);
        env.storage().persistent().set(&key, &(balance + shares));
    }

    pub fn shares_of(env: Env, owner: Address) -> i128 {
        env.storage()
            .persistent()
            .get(&(BALANCE, owner))
            .unwrap_or(0)
    }

    pub fn exchange_rate(env: Env) -> ExchangeRate {
        ExchangeRate {
            total_stake: env.storage().instance().get(&TOTAL_STAKE).unwrap_or(0),
            total_shares: env.storage().instance().get(&TOTAL_SHARES).unwrap_or(0),
        }
    }

    pub fn transfer_shares(env: Env, from: Address, to: Address, shares: i128) {
        from.require_auth();

        let from_key = (BALANCE, from);
        let from_balance: i128 = env.storage().persistent().get(&from_key).unwrap_or(0);
        if shares < 0 || from_balance < shares {
            panic!("insufficient shares");
        }
        env.storage()
            .persistent()
            .set(&from_key, &(from_balance - shares));

        let to_key = (BALANCE, to);
        let to_balance: i128 = env.storage().persistent().get(&to_key).unwrap_or(0);
        env.storage().persistent().set(&to_key, &(to_balance + shares));
    }
}

/// Upstream pool holding the underlying asset and a configurable capacity.
#[contract]
pub struct MockLiquidityGate;

#[contractimpl]
impl MockLiquidityGate {
    pub fn setup_gate(env: Env, asset: Address) {
        env.storage().instance().set(&ASSET, &asset);
        env.storage().instance().set(&LIQUIDITY, &0i128);
    }

    pub fn set_liquidity(env: Env, amount: i128) {
        env.storage().instance().set(&LIQUIDITY, &amount);
    }

    pub fn available_liquidity(env: Env) -> i128 {
        env.storage().instance().get(&LIQUIDITY).unwrap_or(0)
    }

    pub fn deliver(env: Env, to: Address, amount: i128) {
        let available: i128 = env.storage().instance().get(&LIQUIDITY).unwrap_or(0);
        if amount > available {
            panic!("gate capacity exceeded");
        }
        let asset: Address = env
            .storage()
            .instance()
            .get(&ASSET)
            .expect("gate not set up");
        token::TokenClient::new(&env, &asset).transfer(
            &env.current_contract_address(),
            &to,
            &amount,
        );
        env.storage()
            .instance()
            .set(&LIQUIDITY, &(available - amount));
    }
}

/// A ledger wired to a parity-rate share token, a funded gate and a
/// Stellar asset, with all auths mocked.
pub struct LedgerFixture<'a> {
    pub env: Env,
    pub admin: Address,
    pub ledger: RedemptionQueueContractClient<'a>,
    pub shares: MockShareTokenClient<'a>,
    pub gate: MockLiquidityGateClient<'a>,
    pub asset: token::TokenClient<'a>,
}

impl<'a> LedgerFixture<'a> {
    /// Receipt shares and asset units the gate starts with.
    pub const GATE_FLOAT: i128 = 1_000_000_000_000;
    /// Share pool size; the token starts at one stake per share.
    pub const POOL: i128 = 1_000_000_000;
    pub const START_TIME: u64 = 1_700_000_000;

    pub fn new(min_request_amount: i128, min_drain_interval: u64) -> Self {
        let env = Env::default();
        env.mock_all_auths();
        env.ledger().with_mut(|li| li.timestamp = Self::START_TIME);

        let admin = Address::generate(&env);
        let sac = env.register_stellar_asset_contract_v2(admin.clone());
        let asset = token::TokenClient::new(&env, &sac.address());
        let asset_admin = token::StellarAssetClient::new(&env, &sac.address());

        let shares_id = env.register(MockShareToken, ());
        let shares = MockShareTokenClient::new(&env, &shares_id);
        shares.setup_token(&Self::POOL, &Self::POOL);

        let gate_id = env.register(MockLiquidityGate, ());
        let gate = MockLiquidityGateClient::new(&env, &gate_id);
        gate.setup_gate(&sac.address());
        shares.mint_shares(&gate_id, &Self::GATE_FLOAT);
        asset_admin.mint(&gate_id, &Self::GATE_FLOAT);

        let ledger_id = env.register(crate::RedemptionQueueContract, ());
        let ledger = RedemptionQueueContractClient::new(&env, &ledger_id);
        ledger.initialize(
            &admin,
            &gate_id,
            &shares_id,
            &sac.address(),
            &min_request_amount,
            &min_drain_interval,
        );

        LedgerFixture {
            env,
            admin,
            ledger,
            shares,
            gate,
            asset,
        }
    }

    pub fn user(&self) -> Address {
        Address::generate(&self.env)
    }

    /// Queue `amount` for `owner` through the gate.
    pub fn enqueue(&self, owner: &Address, amount: i128) -> u64 {
        self.ledger.enqueue(&self.gate.address, owner, &amount)
    }

    /// Drain `amount` directly as the gate.
    pub fn drain(&self, amount: i128) {
        self.ledger.drain(&self.gate.address, &amount);
    }

    pub fn advance_time(&self, seconds: u64) {
        self.env
            .ledger()
            .with_mut(|li| li.timestamp = li.timestamp.saturating_add(seconds));
    }
}
