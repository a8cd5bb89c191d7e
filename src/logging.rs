use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

/// Quiet by default: the subscriber is only installed when `--verbose`
/// is passed or RUST_LOG is set, and RUST_LOG wins over the flag.
pub fn init(verbose: bool) -> Result<()> {
    let has_env_filter = std::env::var("RUST_LOG").is_ok();
    if !verbose && !has_env_filter {
        return Ok(());
    }
    let filter = if has_env_filter {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new("card_composer=debug")
    };
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .try_init();
    Ok(())
}
