use async_trait::async_trait;

/// Redirect hook used when the backend rejects the session
#[async_trait]
pub trait Navigator: Send + Sync {
    async fn navigate_to(&self, route: &str) -> anyhow::Result<()>;
}

/// Records the redirect in the log and does nothing else
#[derive(Debug, Default, Clone)]
pub struct TracingNavigator;

#[async_trait]
impl Navigator for TracingNavigator {
    async fn navigate_to(&self, route: &str) -> anyhow::Result<()> {
        tracing::info!("Redirecting to '{}'", route);
        Ok(())
    }
}
