//! `iou self-issue-cash`: Issue test currency to this party.

use clap::Args;
use serde::Serialize;

use crate::client::{self, Target};

#[derive(Args, Debug)]
pub struct SelfIssueCashArgs {
    #[command(flatten)]
    pub target: Target,

    /// Amount to issue, in whole units.
    #[arg(short, long)]
    pub amount: u64,

    /// Currency code (e.g., GBP, USD).
    #[arg(short, long)]
    pub currency: String,
}

#[derive(Serialize)]
struct SelfIssueCashRequest<'a> {
    amount: u64,
    currency: &'a str,
}

pub async fn run(args: &SelfIssueCashArgs) -> anyhow::Result<()> {
    let body = SelfIssueCashRequest {
        amount: args.amount,
        currency: &args.currency,
    };
    let resp = client::post(&args.target, "cash", &body).await?;
    client::print_response(&resp);
    Ok(())
}
