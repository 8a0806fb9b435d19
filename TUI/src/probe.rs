//! Startup reachability check. Results are logged and never reach the UI.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::backend::{BackendError, TokenizerApi};

pub const PROBE_PAYLOAD: &str = "test";

/// One encode call with a fixed payload under `deadline`.
pub async fn probe(api: &dyn TokenizerApi, deadline: Duration) -> Result<(), BackendError> {
    match tokio::time::timeout(deadline, api.encode(PROBE_PAYLOAD)).await {
        Ok(result) => result.map(|_| ()),
        Err(_) => Err(BackendError::Connectivity(format!(
            "no response within {} ms",
            deadline.as_millis()
        ))),
    }
}

/// Fire and forget.
pub fn spawn_probe(
    runtime: &Handle,
    api: Arc<dyn TokenizerApi>,
    deadline: Duration,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        match probe(api.as_ref(), deadline).await {
            Ok(()) => tracing::info!(backend = api.base_url(), "Backend connection successful"),
            Err(e) => tracing::warn!(backend = api.base_url(), error = %e, "Backend connection check failed"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::EncodeResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ProbeTarget {
        delay: Duration,
        fail: bool,
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TokenizerApi for ProbeTarget {
        async fn encode(&self, text: &str) -> Result<EncodeResult, BackendError> {
            self.seen.lock().unwrap().push(text.to_string());
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(BackendError::Server {
                    status: 503,
                    status_text: "Service Unavailable".into(),
                });
            }
            EncodeResult::new(vec![1], vec![text.to_string()])
        }

        async fn decode(&self, _tokens: &[i64]) -> Result<String, BackendError> {
            unreachable!("probe never decodes")
        }

        fn base_url(&self) -> &str {
            "mock"
        }
    }

    fn target(delay_ms: u64, fail: bool) -> ProbeTarget {
        ProbeTarget {
            delay: Duration::from_millis(delay_ms),
            fail,
            seen: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn test_probe_sends_sentinel() {
        let api = target(0, false);
        probe(&api, Duration::from_secs(1)).await.unwrap();
        assert_eq!(*api.seen.lock().unwrap(), vec![PROBE_PAYLOAD.to_string()]);
    }

    #[tokio::test]
    async fn test_probe_deadline() {
        let api = target(500, false);
        let err = probe(&api, Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, BackendError::Connectivity(_)));
    }

    #[tokio::test]
    async fn test_probe_surfaces_server_failure_to_caller() {
        let api = target(0, true);
        assert!(matches!(
            probe(&api, Duration::from_secs(1)).await,
            Err(BackendError::Server { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_spawned_probe_swallows_failure() {
        let api: Arc<dyn TokenizerApi> = Arc::new(target(0, true));
        spawn_probe(&Handle::current(), api, Duration::from_secs(1))
            .await
            .unwrap();
    }
}
