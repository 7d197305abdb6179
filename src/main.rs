use anyhow::Result;
use mariadb_integration::cli::{actions, start};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let action = start()?;

    actions::run::handle(action).await?;

    Ok(())
}
