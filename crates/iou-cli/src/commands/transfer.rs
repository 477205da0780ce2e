//! `iou transfer`: Transfer an IOU to a new payee.

use clap::Args;
use serde::Serialize;

use crate::client::{self, Target};

#[derive(Args, Debug)]
pub struct TransferArgs {
    #[command(flatten)]
    pub target: Target,

    /// IOU id as shown by `iou ious`.
    #[arg(long)]
    pub id: String,

    /// The new payee, by organisation or X.500 name.
    #[arg(long)]
    pub new_payee: String,
}

#[derive(Serialize)]
struct TransferRequest<'a> {
    new_payee: &'a str,
}

pub async fn run(args: &TransferArgs) -> anyhow::Result<()> {
    let body = TransferRequest {
        new_payee: &args.new_payee,
    };
    let resp = client::post(&args.target, &format!("ious/{}/transfer", args.id), &body).await?;
    client::print_response(&resp);
    Ok(())
}
