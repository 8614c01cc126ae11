pub mod counting_state;
pub mod identity_ledger;
