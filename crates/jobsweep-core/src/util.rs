use std::time::Duration;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::AppError;

/// Sleep for `duration`, returning early with [`AppError::Cancelled`] if the
/// token fires first.
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> Result<(), AppError> {
    if duration.is_zero() {
        return if cancel.is_cancelled() {
            Err(AppError::Cancelled)
        } else {
            Ok(())
        };
    }
    tokio::select! {
        () = tokio::time::sleep(duration) => Ok(()),
        () = cancel.cancelled() => Err(AppError::Cancelled),
    }
}

/// Domain key for a URL (scheme://host:port).
pub fn domain_key(url_str: &str) -> Option<String> {
    let url = Url::parse(url_str).ok()?;
    let host = url.host_str()?;
    let port = url
        .port_or_known_default()
        .map(|p| format!(":{p}"))
        .unwrap_or_default();
    Some(format!("{}://{}{}", url.scheme(), host, port))
}
