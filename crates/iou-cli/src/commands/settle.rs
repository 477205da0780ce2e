//! `iou settle`: Pay cash against an IOU.

use clap::Args;
use serde::Serialize;

use crate::client::{self, Target};

#[derive(Args, Debug)]
pub struct SettleArgs {
    #[command(flatten)]
    pub target: Target,

    /// IOU id as shown by `iou ious`.
    #[arg(long)]
    pub id: String,

    /// Amount to pay, in whole units.
    #[arg(short, long)]
    pub amount: u64,

    /// Currency code; must match the IOU.
    #[arg(short, long)]
    pub currency: String,
}

#[derive(Serialize)]
struct SettleRequest<'a> {
    amount: u64,
    currency: &'a str,
}

pub async fn run(args: &SettleArgs) -> anyhow::Result<()> {
    let body = SettleRequest {
        amount: args.amount,
        currency: &args.currency,
    };
    let resp = client::post(&args.target, &format!("ious/{}/settle", args.id), &body).await?;
    client::print_response(&resp);
    Ok(())
}
