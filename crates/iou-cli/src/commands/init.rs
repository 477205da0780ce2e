//! `iou init`: Write a node configuration file.

use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (defaults to current directory).
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

const DEFAULT_CONFIG: &str = r#"# IOU Node Configuration

[api]
listen_addr = "127.0.0.1"
port = 10007

[network]
notary = "O=Notary, L=London, C=GB"
nodes = [
    "O=PartyA, L=London, C=GB",
    "O=PartyB, L=New York, C=US",
    "O=PartyC, L=Paris, C=FR",
]

[logging]
level = "info"
format = "text"
"#;

pub fn run(args: &InitArgs) -> anyhow::Result<()> {
    let config_path = args.dir.join("iou.toml");

    if config_path.exists() {
        anyhow::bail!("configuration file already exists at {}", config_path.display());
    }

    std::fs::create_dir_all(&args.dir)?;
    std::fs::write(&config_path, DEFAULT_CONFIG)?;
    println!("Initialized IOU node at {}", config_path.display());
    println!("Edit iou.toml to choose the hosted parties.");
    println!("Run 'iou-node --config {}' to start the node.", config_path.display());
    Ok(())
}
