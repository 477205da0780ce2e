//! `iou issue`: Issue an IOU owed by this party.

use clap::Args;
use serde::Serialize;

use crate::client::{self, Target};

#[derive(Args, Debug)]
pub struct IssueArgs {
    #[command(flatten)]
    pub target: Target,

    /// Amount owed, in whole units.
    #[arg(short, long)]
    pub amount: u64,

    /// Currency code (e.g., GBP, USD).
    #[arg(short, long)]
    pub currency: String,

    /// The lender, by organisation or X.500 name.
    #[arg(long)]
    pub counterparty: String,
}

#[derive(Serialize)]
struct IssueRequest<'a> {
    amount: u64,
    currency: &'a str,
    counterparty: &'a str,
}

pub async fn run(args: &IssueArgs) -> anyhow::Result<()> {
    let body = IssueRequest {
        amount: args.amount,
        currency: &args.currency,
        counterparty: &args.counterparty,
    };
    let resp = client::post(&args.target, "ious", &body).await?;
    client::print_response(&resp);
    Ok(())
}
