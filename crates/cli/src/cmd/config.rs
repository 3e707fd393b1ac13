//! Configuration helpers

use anyhow::Result;

/// Show example configuration
pub async fn run_example() -> Result<()> {
    print!("{}", savevault_core::config::example_config());
    Ok(())
}
