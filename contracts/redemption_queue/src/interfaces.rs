//! Contracts the ledger calls out to.

use soroban_sdk::{contractclient, Address, Env};

use crate::rate::ExchangeRate;

/// Rebasing receipt token. Balances are held in shares; its pooled totals
/// define the exchange rate between shares and stake.
#[contractclient(name = "ShareTokenClient")]
pub trait ShareTokenInterface {
    fn exchange_rate(env: Env) -> ExchangeRate;

    /// Move `shares` from `from` to `to`. Requires `from` authorization.
    fn transfer_shares(env: Env, from: Address, to: Address, shares: i128);
}

/// Upstream pool that decides how much liquidity may leave and when.
#[contractclient(name = "LiquidityGateClient")]
pub trait LiquidityGateInterface {
    /// Stake the gate can deliver right now.
    fn available_liquidity(env: Env) -> i128;

    /// Transfer `amount` of the underlying asset to `to`.
    fn deliver(env: Env, to: Address, amount: i128);
}
