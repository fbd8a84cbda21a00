//! Pipeline results as patch revision comments.

use std::sync::Arc;

use forge::node::PatchComment;
use forge::{ForgeConfig, ForgeError, NodeApi, Pipeline, Repo, SessionToken};
use tracing::{debug, error, info, instrument};

/// What [`StatusReporter::report`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    /// A comment was posted on the patch revision.
    Posted,
    /// The pipeline is still queued or running.
    SkippedInProgress,
    /// The pipeline was not triggered by a patch.
    SkippedNoPatch,
}

/// Renders the comment body for `pipeline`.
///
/// ```text
/// Woodpecker pipeline #12 completed with status: success. ✅
///  - Details: https://ci.example.com/repos/7/pipeline/12
/// ```
pub fn render_comment(config: &ForgeConfig, repo: &Repo, pipeline: &Pipeline) -> String {
    let annotation = pipeline.status.annotation();
    format!(
        "Woodpecker pipeline #{number} {phrasing} status: {status}. {icon} \n - Details: {url}",
        number = pipeline.number,
        phrasing = annotation.phrasing.as_str(),
        status = pipeline.status,
        icon = annotation.icon,
        url = config.pipeline_status_url(repo.id, pipeline.number),
    )
}

/// Posts pipeline results as comments on the patch revision that triggered
/// them.
#[derive(Clone)]
pub struct StatusReporter {
    node: Arc<dyn NodeApi>,
    config: ForgeConfig,
}

impl StatusReporter {
    /// Creates a reporter.
    pub fn new(node: Arc<dyn NodeApi>, config: ForgeConfig) -> Self {
        Self { node, config }
    }

    /// Comments on the patch revision recorded in the pipeline's variables.
    ///
    /// In-progress pipelines and pipelines without a patch are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ForgeError::Node`] if posting the comment fails. Nothing is
    /// retried.
    #[instrument(skip_all, fields(rid = %repo.forge_remote_id, pipeline = %pipeline.number, status = %pipeline.status))]
    pub async fn report(
        &self,
        token: &SessionToken,
        repo: &Repo,
        pipeline: &Pipeline,
    ) -> Result<Report, ForgeError> {
        if pipeline.status.is_in_progress() {
            debug!("Pipeline in progress; not commenting");
            return Ok(Report::SkippedInProgress);
        }
        let Some((patch, revision)) = pipeline.patch_target() else {
            debug!("Pipeline has no patch target; not commenting");
            return Ok(Report::SkippedNoPatch);
        };

        let comment = PatchComment::new(render_comment(&self.config, repo, pipeline), revision);
        self.node
            .add_patch_comment(token, &repo.forge_remote_id, &patch, &comment)
            .await
            .inspect_err(|e| error!(error = %e, patch = %patch, "Failed to post status comment"))?;

        info!(patch = %patch, "Posted status comment");
        Ok(Report::Posted)
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
