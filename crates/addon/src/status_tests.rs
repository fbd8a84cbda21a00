use super::*;

use forge::{
    BranchName, CommitSha, NodeApiError, PipelineNumber, PipelineStatus, PATCH_ID_VARIABLE,
    REVISION_ID_VARIABLE,
};

use crate::testing::{config, repo, token, FakeNode, HEAD};

fn pipeline(status: PipelineStatus, patch: bool) -> Pipeline {
    let mut pipeline = Pipeline {
        number: PipelineNumber::new(12),
        status,
        commit: CommitSha::new(HEAD).unwrap(),
        branch: BranchName::new("master").unwrap(),
        additional_variables: Default::default(),
    };
    if patch {
        pipeline
            .additional_variables
            .insert(PATCH_ID_VARIABLE.into(), "p1".into());
        pipeline
            .additional_variables
            .insert(REVISION_ID_VARIABLE.into(), "r2".into());
    }
    pipeline
}

fn reporter(node: &Arc<FakeNode>) -> StatusReporter {
    StatusReporter::new(node.clone(), config())
}

#[test]
fn test_render_success_comment() {
    assert_eq!(
        render_comment(&config(), &repo(), &pipeline(PipelineStatus::Success, true)),
        "Woodpecker pipeline #12 completed with status: success. ✅ \n - Details: https://ci.example.com/repos/7/pipeline/12"
    );
}

#[test]
fn test_render_uses_status_annotation() {
    let cases = [
        (PipelineStatus::Failure, "completed with status: failure. ❌"),
        (PipelineStatus::Killed, "completed with status: killed. ❌"),
        (PipelineStatus::Error, "completed with status: error. ❌"),
        (PipelineStatus::Declined, "completed with status: declined. ❌"),
        (PipelineStatus::Skipped, "current status: skipped. ↪️"),
        (PipelineStatus::Blocked, "current status: blocked. ⏳"),
        (PipelineStatus::Created, "current status: created. ⏳"),
    ];
    for (status, expected) in cases {
        let body = render_comment(&config(), &repo(), &pipeline(status, true));
        assert!(body.contains(expected), "{status}: {body}");
    }
}

#[tokio::test]
async fn test_finished_patch_pipeline_posts_comment() {
    let node = Arc::new(FakeNode::new());

    let report = reporter(&node)
        .report(&token(), &repo(), &pipeline(PipelineStatus::Failure, true))
        .await
        .unwrap();

    assert_eq!(report, Report::Posted);
    let state = node.state();
    let (rid, patch, comment) = &state.comments[0];
    assert_eq!(rid, &repo().forge_remote_id);
    assert_eq!(patch.as_str(), "p1");
    assert_eq!(comment.revision.as_str(), "r2");
    assert!(comment.body.starts_with("Woodpecker pipeline #12 completed with status: failure."));
}

#[tokio::test]
async fn test_in_progress_pipelines_never_comment() {
    for status in [PipelineStatus::Pending, PipelineStatus::Running] {
        let node = Arc::new(FakeNode::new());
        let report = reporter(&node)
            .report(&token(), &repo(), &pipeline(status, true))
            .await
            .unwrap();

        assert_eq!(report, Report::SkippedInProgress);
        assert!(node.calls().is_empty());
    }
}

#[tokio::test]
async fn test_pipeline_without_patch_is_skipped() {
    let node = Arc::new(FakeNode::new());
    let report = reporter(&node)
        .report(&token(), &repo(), &pipeline(PipelineStatus::Success, false))
        .await
        .unwrap();

    assert_eq!(report, Report::SkippedNoPatch);
    assert!(node.calls().is_empty());
}

#[tokio::test]
async fn test_comment_failure_is_returned_once() {
    let node = Arc::new(FakeNode::new());
    node.state().comment_error = Some(NodeApiError::Status {
        endpoint: "/api/v1/projects/rad:z3gqcJUoA1n9HaHKufZs5FCSGazv5/patches/p1".into(),
        status: 503,
        body: String::new(),
    });

    let err = reporter(&node)
        .report(&token(), &repo(), &pipeline(PipelineStatus::Success, true))
        .await
        .unwrap_err();

    assert!(matches!(err, ForgeError::Node(NodeApiError::Status { status: 503, .. })));
    assert_eq!(node.calls(), vec!["add_patch_comment"]);
}
