//! `iou cash`: List the party's cash holdings and balances.

use clap::Args;
use iou_core::{Amount, CashHolding, StateAndRef};
use std::collections::BTreeMap;

use crate::client::{self, Target};

#[derive(Args, Debug)]
pub struct CashArgs {
    #[command(flatten)]
    pub target: Target,

    /// Only print balances per currency.
    #[arg(long)]
    pub balances: bool,
}

fn balance_lines(balances: &BTreeMap<String, Amount>) -> Vec<String> {
    if balances.is_empty() {
        return vec!["  (none)".to_string()];
    }
    balances.values().map(|amount| format!("  {}", amount)).collect()
}

pub async fn run(args: &CashArgs) -> anyhow::Result<()> {
    if !args.balances {
        let holdings: Vec<StateAndRef<CashHolding>> = client::get(&args.target, "cash").await?;
        println!("Holdings ({}):", holdings.len());
        for holding in &holdings {
            println!("  {}  issued by {}", holding.state.amount, holding.state.issuer.party.name);
        }
        println!();
    }

    let balances: BTreeMap<String, Amount> = client::get(&args.target, "cash-balances").await?;
    println!("Balances:");
    for line in balance_lines(&balances) {
        println!("{}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balances_above_u64_print_in_full() {
        let body = r#"{
            "GBP": {"value": 18446744073709551716, "currency": "GBP"},
            "JPY": {"value": 700, "currency": "JPY"}
        }"#;
        let balances: BTreeMap<String, Amount> = serde_json::from_str(body).unwrap();
        assert_eq!(
            balance_lines(&balances),
            vec!["  184467440737095517.16 GBP".to_string(), "  700 JPY".to_string()]
        );
    }

    #[test]
    fn test_no_balances() {
        assert_eq!(balance_lines(&BTreeMap::new()), vec!["  (none)".to_string()]);
    }
}
