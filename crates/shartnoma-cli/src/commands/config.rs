//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use std::path::Path;

/// Execute the config command against the file at `path`.
pub async fn execute_config(args: ConfigArgs, config: &Config, path: &Path, formatter: &Formatter) -> Result<()> {
    match args.action {
        ConfigAction::Show => print!("{}", config.to_toml()?),
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Init { force } => init_config(path, force, formatter)?,
    }
    Ok(())
}

fn init_config(path: &Path, force: bool, formatter: &Formatter) -> Result<()> {
    if path.exists() && !force {
        println!(
            "{}",
            formatter.warning(&format!("{} already exists, use --force to overwrite", path.display()))
        );
        return Ok(());
    }

    Config::default().save_to(path)?;
    println!("{}", formatter.success(&format!("Wrote {}", path.display())));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use std::fs;

    #[test]
    fn test_init_does_not_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[settings]\ncolor = false\n").unwrap();
        let formatter = Formatter::new(OutputFormat::Table, false);

        init_config(&path, false, &formatter).unwrap();
        assert!(!Config::load_from(&path).unwrap().settings.color);

        init_config(&path, true, &formatter).unwrap();
        assert!(Config::load_from(&path).unwrap().settings.color);
    }
}
