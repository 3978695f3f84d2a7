//! Task-local trace id for the request being served.
//!
//! `RequestTrace` runs every downstream future inside [`scope`], so problem
//! responses rendered anywhere below it can echo the same id that is sent in
//! the `x-request-id` header.

use std::future::Future;

use tokio::task_local;

const UNKNOWN: &str = "unknown";

task_local! {
    static TRACE_ID: String;
}

/// Trace id of the current request, or `"unknown"` outside a request scope.
pub fn trace_id() -> String {
    TRACE_ID
        .try_with(Clone::clone)
        .unwrap_or_else(|_| UNKNOWN.to_string())
}

/// Run `future` with `trace_id` visible through [`trace_id`].
pub async fn scope<F, R>(trace_id: String, future: F) -> R
where
    F: Future<Output = R>,
{
    TRACE_ID.scope(trace_id, future).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trace_id_outside_scope() {
        assert_eq!(trace_id(), "unknown");
    }

    #[tokio::test]
    async fn test_trace_id_inside_scope() {
        let seen = scope("req-42".to_string(), async { trace_id() }).await;
        assert_eq!(seen, "req-42");
        assert_eq!(trace_id(), "unknown");
    }

    #[tokio::test]
    async fn test_nested_scope_restores_outer() {
        let (inner, outer) = scope("outer".to_string(), async {
            let inner = scope("inner".to_string(), async { trace_id() }).await;
            (inner, trace_id())
        })
        .await;

        assert_eq!(inner, "inner");
        assert_eq!(outer, "outer");
    }
}
