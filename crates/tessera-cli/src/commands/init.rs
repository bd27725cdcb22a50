//! `tessera init` — Write a default CLI configuration.

use clap::Args;
use std::path::Path;

use crate::config::CliConfig;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file.
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &InitArgs, config_path: &Path) -> anyhow::Result<()> {
    if config_path.exists() && !args.force {
        anyhow::bail!(
            "configuration file already exists at {}",
            config_path.display()
        );
    }

    CliConfig::default().save(config_path)?;
    println!("Wrote configuration to {}", config_path.display());
    println!("Set [ledger] node_url to a running tessera-node, or use 'tessera demo --in-memory'.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = std::env::temp_dir().join(format!("tessera-cli-test-{}", rand::random::<u64>()));
        let path = dir.join("tessera.toml");

        run(&InitArgs { force: false }, &path).unwrap();
        assert!(CliConfig::load(&path).is_ok());
        assert!(run(&InitArgs { force: false }, &path).is_err());
        run(&InitArgs { force: true }, &path).unwrap();

        std::fs::remove_dir_all(&dir).ok();
    }
}
