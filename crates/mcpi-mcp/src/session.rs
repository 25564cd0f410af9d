//! Scoped server sessions.

use crate::adapter::TransportAdapter;
use mcpi_types::{InspectorError, ServerConfig};

/// Connect `adapter` to `config`, run `operation`, then disconnect.
///
/// The disconnect is awaited whether `operation` succeeds or fails, and the
/// operation's own result is returned unchanged.
pub async fn with_session<T, F>(
    adapter: &mut TransportAdapter,
    config: &ServerConfig,
    operation: F,
) -> Result<T, InspectorError>
where
    F: AsyncFnOnce(&TransportAdapter) -> Result<T, InspectorError>,
{
    adapter.connect(config).await?;
    let result = operation(&*adapter).await;
    adapter.disconnect().await;
    result
}
