use std::sync::Arc;

use ophthadesk::config::{load_config, print_schema};
use ophthadesk::startup;
use ophthadesk::utils::init_logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::args().skip(1).any(|arg| arg == "--schema") {
        print_schema()?;
        return Ok(());
    }

    let config = load_config();
    init_logging(&config.logging)?;
    startup::run(Arc::new(config)).await
}
