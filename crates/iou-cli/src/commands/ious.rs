//! `iou ious`: List the party's unsettled IOUs.

use clap::Args;
use iou_core::{DebtNote, StateAndRef};

use crate::client::{self, Target};

#[derive(Args, Debug)]
pub struct IousArgs {
    #[command(flatten)]
    pub target: Target,

    /// Print the raw JSON returned by the node.
    #[arg(long)]
    pub json: bool,
}

fn describe(note: &DebtNote) -> Vec<String> {
    vec![
        format!("IOU {}", note.lifecycle_id),
        format!("  Payer:     {}", note.payer.name),
        format!("  Payee:     {}", note.payee.name),
        format!("  Principal: {}", note.principal),
        format!("  Paid:      {}", note.amount_paid),
    ]
}

pub async fn run(args: &IousArgs) -> anyhow::Result<()> {
    let notes: Vec<StateAndRef<DebtNote>> = client::get(&args.target, "ious").await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
        return Ok(());
    }
    if notes.is_empty() {
        println!("No IOUs.");
        return Ok(());
    }
    for note in &notes {
        for line in describe(&note.state) {
            println!("{}", line);
        }
    }
    Ok(())
}
