//! `iou whoami`: Show the party's X.500 name.

use clap::Args;
use serde_json::Value;

use crate::client::{self, Target};

#[derive(Args, Debug)]
pub struct WhoamiArgs {
    #[command(flatten)]
    pub target: Target,
}

pub async fn run(args: &WhoamiArgs) -> anyhow::Result<()> {
    let me: Value = client::get(&args.target, "me").await?;
    println!("{}", me["me"].as_str().unwrap_or_default());
    Ok(())
}
