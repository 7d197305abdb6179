use crate::cli::actions::Action;
use crate::integration;
use anyhow::{Context, Result};

/// Handle the run action
///
/// # Errors
///
/// Returns an error if the run fails to connect, extract or publish
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Run(settings) => {
            integration::run(&settings)
                .await
                .with_context(|| format!("sampling {} failed", settings.connection))?;
        }
    }

    Ok(())
}
