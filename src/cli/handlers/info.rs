//! Information display handlers

use crate::cli::output::print_config;
use crate::cli::output::print_warning;
use crate::AppConfig;
use crate::Result;

pub async fn handle_config_command(config: &AppConfig) -> Result<()> {
    print_config(&config.redacted());

    if let Err(e) = config.validate() {
        println!();
        print_warning(&format!("Configuration is incomplete: {e}"));
    }
    Ok(())
}
