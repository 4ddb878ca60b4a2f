pub fn balance_key(account_id: &str) -> String {
    format!("ledger_balance:{}", account_id)
}
