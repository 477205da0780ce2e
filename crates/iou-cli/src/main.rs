//! IOU CLI: talks to a running `iou-node` over HTTP.
//!
//! Subcommands: init, whoami, peers, ious, cash, issue, transfer, settle,
//! self-issue-cash.

mod client;
mod commands;

use clap::{Parser, Subcommand};

/// IOU ledger CLI: issue, transfer and settle debt notes.
#[derive(Parser, Debug)]
#[command(name = "iou", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a node configuration file.
    Init(commands::init::InitArgs),
    /// Show the party's X.500 name.
    Whoami(commands::whoami::WhoamiArgs),
    /// List the parties this party can trade with.
    Peers(commands::peers::PeersArgs),
    /// List the party's unsettled IOUs.
    Ious(commands::ious::IousArgs),
    /// List the party's cash holdings and balances.
    Cash(commands::cash::CashArgs),
    /// Issue an IOU owed by this party.
    Issue(commands::issue::IssueArgs),
    /// Transfer an IOU held by this party to a new payee.
    Transfer(commands::transfer::TransferArgs),
    /// Pay cash against an IOU owed by this party.
    Settle(commands::settle::SettleArgs),
    /// Issue test currency to this party.
    SelfIssueCash(commands::self_issue_cash::SelfIssueCashArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Whoami(args) => commands::whoami::run(args).await,
        Commands::Peers(args) => commands::peers::run(args).await,
        Commands::Ious(args) => commands::ious::run(args).await,
        Commands::Cash(args) => commands::cash::run(args).await,
        Commands::Issue(args) => commands::issue::run(args).await,
        Commands::Transfer(args) => commands::transfer::run(args).await,
        Commands::Settle(args) => commands::settle::run(args).await,
        Commands::SelfIssueCash(args) => commands::self_issue_cash::run(args).await,
    }
}
