//! Stage watchdog.
//!
//! # Responsibilities
//! - Bound how long one lifecycle stage may take
//! - Turn an expired deadline into an ordinary pipeline error
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - No deadline configured means no wrapping at all
//! - Timed-out stages fail with 408 and go through the normal error path

use std::future::Future;
use std::time::Duration;

use crate::http::HttpError;
use crate::pipeline::Stage;

/// Await `fut`, failing with [`HttpError::Timeout`] if `deadline` passes first.
pub async fn with_stage_deadline<F, T>(
    stage: Stage,
    deadline: Option<Duration>,
    fut: F,
) -> Result<T, HttpError>
where
    F: Future<Output = Result<T, HttpError>>,
{
    match deadline {
        None => fut.await,
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(stage = %stage, timeout_ms = limit.as_millis() as u64, "Stage timed out");
                Err(HttpError::Timeout(format!("Request timed out during {}", stage)))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_deadline_passes_through() {
        let out = with_stage_deadline(Stage::MapRequest, None, async { Ok::<_, HttpError>(7) }).await;
        assert_eq!(out, Ok(7));
    }

    #[tokio::test]
    async fn test_expired_deadline_is_timeout() {
        let out = with_stage_deadline(Stage::BeginRequest, Some(Duration::from_millis(10)), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, HttpError>(())
        })
        .await;
        let err = out.unwrap_err();
        assert_eq!(err.status().as_u16(), 408);
        assert!(err.message().contains("beginRequest"));
    }
}
