//! Panic reporting hook
//!
//! Chains onto the process panic hook and forwards panics as fatal
//! messages. The previously installed hook always runs afterwards, so
//! default panic output is preserved.

use std::panic;
use std::sync::Arc;

use serde_json::{json, Map};
use tokio::runtime::Handle;
use tracing::debug;

use errbeacon_core::severity::Severity;

use crate::client::TelemetryClient;

/// Installs a panic hook that forwards panic messages through the client.
///
/// The ambient runtime handle is captured at install time; without one the
/// hook degrades to the previous behavior only.
pub fn install_panic_reporter(client: Arc<TelemetryClient>) {
    let handle = Handle::try_current().ok();
    let previous = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        let message = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic with non-string payload".to_string());

        let mut context = Map::new();
        if let Some(location) = info.location() {
            context.insert(
                "location".into(),
                json!(format!("{}:{}", location.file(), location.line())),
            );
        }

        if let Some(handle) = &handle {
            let client = client.clone();
            handle.spawn(async move {
                client
                    .capture_message(Severity::Fatal, &message, context)
                    .await;
            });
        } else {
            debug!("no async runtime available, panic not forwarded");
        }

        previous(info);
    }));
}
