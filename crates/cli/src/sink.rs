use async_trait::async_trait;
use forge::{DeliveryId, PipelineTrigger, Repo};
use listener::{PipelineSink, SinkError};
use tracing::info;

/// Records each accepted trigger as one structured log event.
///
/// Stands in for the CI server's pipeline queue when the adapter runs on
/// its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

#[async_trait]
impl PipelineSink for LoggingSink {
    async fn submit(
        &self,
        delivery: DeliveryId,
        repo: Repo,
        trigger: PipelineTrigger,
    ) -> Result<(), SinkError> {
        info!(
            delivery_id = %delivery,
            rid = %repo.forge_remote_id,
            repo = %repo.full_name,
            event = ?trigger.event,
            commit = %trigger.commit,
            branch = %trigger.branch,
            git_ref = %trigger.git_ref,
            author = %trigger.author,
            "Pipeline triggered"
        );
        Ok(())
    }
}
