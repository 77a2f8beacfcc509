//! Per-request context carrying the correlation id.
//!
//! A [`RequestContext`] is passed explicitly to every conversion call. It is a
//! small value type: deriving a new context never mutates the original, so one
//! base context can be shared by many concurrent calls and specialised per call.
//!
//! The correlation id is opaque. It is never validated, trimmed or rewritten
//! here; the conversion engine generates a fresh UUID only when the context
//! carries none.

use std::time::Duration;

/// Request-scoped values consulted by the conversion engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    correlation_id: Option<String>,
    timeout: Option<Duration>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a context carrying `id`.
    ///
    /// An empty `id` returns the context unchanged, so an empty marker is never
    /// stored.
    pub fn with_correlation_id(self, id: impl Into<String>) -> Self {
        let id = id.into();
        if id.is_empty() {
            return self;
        }
        Self {
            correlation_id: Some(id),
            ..self
        }
    }

    /// The carried correlation id, or `""` when none was attached.
    pub fn correlation_id(&self) -> &str {
        self.correlation_id.as_deref().unwrap_or("")
    }

    /// Derive a context whose calls are abandoned after `timeout`.
    ///
    /// The effective limit of a call is the smaller of this value and the
    /// client's configured timeout.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..self
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Attach `id` to `ctx`. See [`RequestContext::with_correlation_id`].
pub fn with_correlation_id(ctx: RequestContext, id: impl Into<String>) -> RequestContext {
    ctx.with_correlation_id(id)
}

/// Read the correlation id carried by `ctx`, or `""`.
pub fn correlation_id(ctx: &RequestContext) -> &str {
    ctx.correlation_id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_has_no_id() {
        assert_eq!(RequestContext::new().correlation_id(), "");
        assert_eq!(RequestContext::new().timeout(), None);
    }

    #[test]
    fn attach_then_extract() {
        let ctx = with_correlation_id(RequestContext::new(), "my-id");
        assert_eq!(correlation_id(&ctx), "my-id");
    }

    #[test]
    fn empty_id_leaves_context_unchanged() {
        let base = RequestContext::new().with_correlation_id("keep-me");
        let derived = base.clone().with_correlation_id("");
        assert_eq!(derived, base);
        assert_eq!(derived.correlation_id(), "keep-me");
    }

    #[test]
    fn id_is_carried_verbatim() {
        let ctx = RequestContext::new().with_correlation_id("  spaced id  ");
        assert_eq!(ctx.correlation_id(), "  spaced id  ");
    }

    #[test]
    fn later_id_replaces_earlier() {
        let ctx = RequestContext::new()
            .with_correlation_id("first")
            .with_correlation_id("second");
        assert_eq!(ctx.correlation_id(), "second");
    }

    #[test]
    fn timeout_survives_id_attachment() {
        let ctx = RequestContext::new()
            .with_timeout(Duration::from_secs(5))
            .with_correlation_id("id");
        assert_eq!(ctx.timeout(), Some(Duration::from_secs(5)));
        assert_eq!(ctx.correlation_id(), "id");
    }
}
