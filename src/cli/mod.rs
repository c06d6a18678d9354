use env_logger::Env;
use log::LevelFilter;

pub mod decrypt;
pub mod encrypt;
pub mod info;
pub mod opt;
mod util;

/// Set up error reports and logging
pub fn init(verbose: bool) -> color_eyre::Result<()> {
    color_eyre::install()?;
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_env(Env::new().filter("ECO2_TOOL_LOG"))
        .init();
    Ok(())
}
