//! Wait for a submitted analyze operation to resolve.
//!
//! Every sleep and every poll races the caller's [`CancellationToken`]. When
//! the token wins, the in-flight poll is dropped and the decode ends with
//! [`DecodeError::Cancelled`]; nothing already received is returned.

use crate::error::DecodeError;
use crate::service::{AnalysisService, AnalyzeResult, OperationHandle, OperationStatus};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Poll `handle` until it succeeds, fails, or `cancel` fires.
///
/// The delay before each poll is the service's `Retry-After` when it sent
/// one, `poll_interval` otherwise. No timeout is applied here.
pub async fn wait_for_completion(
    service: &dyn AnalysisService,
    handle: &OperationHandle,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> Result<AnalyzeResult, DecodeError> {
    let mut delay = handle.retry_after.unwrap_or(poll_interval);
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DecodeError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }

        attempt += 1;
        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DecodeError::Cancelled),
            status = service.poll_operation(handle) => status?,
        };

        match status {
            OperationStatus::Succeeded(result) => {
                trace!("Operation succeeded after {} polls", attempt);
                return Ok(result);
            }
            OperationStatus::InProgress { retry_after } => {
                delay = retry_after.unwrap_or(poll_interval);
                trace!("Operation still running (poll {}), next in {:?}", attempt, delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::DocumentPage;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Reports `running` a fixed number of times, then succeeds.
    struct Countdown {
        running: usize,
        polls: AtomicUsize,
    }

    #[async_trait]
    impl AnalysisService for Countdown {
        async fn begin_analyze(
            &self,
            _model_id: &str,
            _document: Bytes,
        ) -> Result<OperationHandle, DecodeError> {
            unreachable!("wait tests start from a handle")
        }

        async fn poll_operation(
            &self,
            _handle: &OperationHandle,
        ) -> Result<OperationStatus, DecodeError> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            if n < self.running {
                Ok(OperationStatus::InProgress { retry_after: None })
            } else {
                Ok(OperationStatus::Succeeded(AnalyzeResult {
                    model_id: "prebuilt-read".into(),
                    pages: vec![DocumentPage::from_lines(1, ["done"])],
                }))
            }
        }
    }

    /// Never leaves the running state.
    struct Forever;

    #[async_trait]
    impl AnalysisService for Forever {
        async fn begin_analyze(
            &self,
            _model_id: &str,
            _document: Bytes,
        ) -> Result<OperationHandle, DecodeError> {
            unreachable!()
        }

        async fn poll_operation(
            &self,
            _handle: &OperationHandle,
        ) -> Result<OperationStatus, DecodeError> {
            Ok(OperationStatus::InProgress { retry_after: None })
        }
    }

    struct Broken;

    #[async_trait]
    impl AnalysisService for Broken {
        async fn begin_analyze(
            &self,
            _model_id: &str,
            _document: Bytes,
        ) -> Result<OperationHandle, DecodeError> {
            unreachable!()
        }

        async fn poll_operation(
            &self,
            _handle: &OperationHandle,
        ) -> Result<OperationStatus, DecodeError> {
            Err(DecodeError::AnalysisFailed {
                code: "InvalidContent".into(),
                message: "corrupt".into(),
            })
        }
    }

    fn handle() -> OperationHandle {
        OperationHandle {
            location: "https://x.example/analyzeResults/1".into(),
            retry_after: None,
        }
    }

    #[tokio::test]
    async fn polls_until_success() {
        let service = Countdown {
            running: 3,
            polls: AtomicUsize::new(0),
        };
        let result = wait_for_completion(
            &service,
            &handle(),
            Duration::from_millis(1),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(result.pages.len(), 1);
        assert_eq!(service.polls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn remote_failure_propagates() {
        let err = wait_for_completion(
            &Broken,
            &handle(),
            Duration::from_millis(1),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, DecodeError::AnalysisFailed { .. }));
    }

    #[tokio::test]
    async fn cancellation_stops_waiting() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(25)).await;
            trigger.cancel();
        });

        let err = wait_for_completion(&Forever, &handle(), Duration::from_millis(5), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn cancellation_cuts_a_long_retry_after() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let long = OperationHandle {
            retry_after: Some(Duration::from_secs(3600)),
            ..handle()
        };
        let err = wait_for_completion(&Forever, &long, Duration::from_millis(1), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
