use eventos::commands::{load_settings, CommandRegistry};
use eventos_core::logging::setup_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let registry = CommandRegistry::default();
    let matches = registry.build_cli().get_matches();
    let settings = load_settings(&matches)?;
    setup_logging(&settings);
    registry.execute(&matches, &settings).await?;
    Ok(())
}
