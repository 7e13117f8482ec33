//! Store connectivity check.

use crate::output;
use vault_core::error::AppError;

/// Check that both the metadata store and the content store answer.
pub async fn execute(env: &str) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let engine = super::build_engine(&config).await?;

    if engine.health_check().await? {
        output::print_success("All stores healthy.");
        Ok(())
    } else {
        output::print_error("One or more stores reported unhealthy.");
        std::process::exit(1);
    }
}
