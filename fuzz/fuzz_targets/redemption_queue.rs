#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use redemption_queue::testutils::LedgerFixture;
use soroban_sdk::vec;

#[derive(Arbitrary, Debug)]
enum Action {
    Enqueue { owner: u8, amount: u16 },
    Drain { percent: u8 },
    Trigger { liquidity: u16 },
    Settle { owner: u8 },
    AdvanceCutoffs,
}

const OWNERS: usize = 3;

fuzz_target!(|actions: std::vec::Vec<Action>| {
    let f = LedgerFixture::new(1, 0);
    let owners: std::vec::Vec<_> = (0..OWNERS).map(|_| f.user()).collect();
    let mut queued = 0i128;
    let mut paid = 0i128;

    for action in actions.into_iter().take(64) {
        match action {
            Action::Enqueue { owner, amount } => {
                let amount = i128::from(amount) + 1;
                f.enqueue(&owners[owner as usize % OWNERS], amount);
                queued += amount;
            }
            Action::Drain { percent } => {
                let amount = f.ledger.total_queued() * i128::from(percent % 101) / 100;
                if amount > 0 {
                    f.drain(amount);
                }
            }
            Action::Trigger { liquidity } => {
                f.gate.set_liquidity(&i128::from(liquidity));
                let (ready, _) = f.ledger.check_trigger();
                if ready {
                    f.ledger.execute_trigger(&soroban_sdk::Bytes::new(&f.env));
                }
            }
            Action::Settle { owner } => {
                let owner = &owners[owner as usize % OWNERS];
                let listed = f.ledger.list_finalized_for_owner(owner);
                if !listed.request_ids.is_empty() {
                    paid += f.ledger.settle(owner, &listed.request_ids, &listed.batch_ids);
                }
            }
            Action::AdvanceCutoffs => {
                f.ledger.advance_cutoffs();
            }
        }

        let state = f.ledger.get_ledger_state();
        let mut unserviced = 0i128;
        for id in state.next_unserviced_id..=state.last_request_id {
            unserviced += f
                .ledger
                .get_requests(&vec![&f.env, id])
                .get(0)
                .map(|r| r.shares_remaining)
                .unwrap_or(0);
        }
        assert_eq!(state.total_queued_shares, unserviced);
        assert!(paid <= queued);
    }
});
