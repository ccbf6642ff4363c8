//! Tracing subscriber setup for binaries and tests embedding the engine.

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

static INIT: Once = Once::new();

/// Install a global fmt subscriber. Safe to call more than once; only the
/// first call wins (later calls in the same process are no-ops, as are calls
/// made after the host application installed its own subscriber).
pub fn init(verbose: bool) {
    INIT.call_once(|| {
        let level = if verbose { Level::DEBUG } else { Level::INFO };
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .finish();
        if tracing::subscriber::set_global_default(subscriber).is_err() {
            // A subscriber was already installed by the embedding application.
        }
    });
}
