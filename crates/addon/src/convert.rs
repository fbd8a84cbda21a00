//! Conversions from node responses and canonical events to the CI-side model.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use forge::node::{Blob, Patch, Project, TreeEntry};
use forge::{
    CanonicalEvent, FileMeta, ForgeConfig, ForgeError, HookRepository, NodeId, PatchEvent, Perm,
    PipelineTrigger, PullRequest, PushEvent, Repo, RepositoryId, TriggerEvent, User,
    PATCH_ID_VARIABLE, REVISION_ID_VARIABLE,
};

/// Owner used when a repository lists no delegates.
const FALLBACK_OWNER: &str = "radicle";

const RID_PREFIX: &str = "rad:";

/// Web URL of a repository on the node.
pub(crate) fn repository_url(config: &ForgeConfig, rid: &RepositoryId) -> String {
    format!("{}/{rid}", config.node_url())
}

/// Git clone URL of a repository on the node.
pub(crate) fn clone_url(config: &ForgeConfig, rid: &RepositoryId) -> String {
    let id = rid.as_str();
    let id = id.strip_prefix(RID_PREFIX).unwrap_or(id);
    format!("{}/{id}.git", config.node_url())
}

/// Converts a node project for `user`. Delegates get admin rights.
pub(crate) fn project_to_repo(config: &ForgeConfig, user: &User, project: Project) -> Repo {
    let is_delegate = project.is_delegate(&user.forge_remote_id);
    let owner = project
        .delegates
        .first()
        .map(|d| d.alias.clone().unwrap_or_else(|| d.id.to_string()))
        .unwrap_or_else(|| FALLBACK_OWNER.to_string());

    Repo {
        id: 0,
        full_name: format!("{owner}/{}", project.name),
        forge_url: repository_url(config, &project.id),
        clone_url: clone_url(config, &project.id),
        is_private: project.is_private(),
        perm: Perm {
            pull: true,
            push: is_delegate,
            admin: is_delegate,
        },
        forge_remote_id: project.id,
        owner,
        name: project.name,
        branch: project.default_branch,
    }
}

fn non_empty_or(value: String, fallback: impl FnOnce() -> String) -> String {
    if value.is_empty() {
        fallback()
    } else {
        value
    }
}

/// Converts the repository section of a delivery.
///
/// Deliveries carry no user, so only read access is assumed.
pub(crate) fn hook_repository_to_repo(config: &ForgeConfig, repository: HookRepository) -> Repo {
    let owner = repository
        .delegates
        .first()
        .map(NodeId::to_string)
        .unwrap_or_else(|| FALLBACK_OWNER.to_string());
    let forge_url = non_empty_or(repository.url, || repository_url(config, &repository.id));
    let clone = non_empty_or(repository.clone_url, || clone_url(config, &repository.id));

    Repo {
        id: 0,
        full_name: format!("{owner}/{}", repository.name),
        forge_remote_id: repository.id,
        owner,
        name: repository.name,
        branch: repository.default_branch,
        forge_url,
        clone_url: clone,
        is_private: repository.private,
        perm: Perm {
            pull: true,
            push: false,
            admin: false,
        },
    }
}

pub(crate) fn patch_to_pull_request(patch: Patch) -> PullRequest {
    PullRequest {
        index: patch.id,
        title: patch.title,
    }
}

/// Decodes blob content. Binary blobs are base64 on the wire.
pub(crate) fn blob_content(blob: Blob) -> Result<Vec<u8>, ForgeError> {
    if !blob.binary {
        return Ok(blob.content.into_bytes());
    }
    STANDARD
        .decode(blob.content.as_bytes())
        .map_err(|e| ForgeError::Content {
            path: blob.path,
            message: e.to_string(),
        })
}

pub(crate) fn directory_entry(entry: &TreeEntry) -> FileMeta {
    FileMeta {
        name: entry.path.clone(),
        data: Vec::new(),
    }
}

fn push_trigger(config: &ForgeConfig, event: PushEvent) -> (Repo, PipelineTrigger) {
    let git_ref = format!("refs/heads/{}", event.branch);
    let repo = hook_repository_to_repo(config, event.repository);
    let forge_url = non_empty_or(event.commit_url, || repo.forge_url.clone());

    let trigger = PipelineTrigger {
        event: TriggerEvent::Push,
        commit: event.head_commit,
        branch: event.branch,
        git_ref,
        forge_url,
        message: event.message,
        author: event.pusher,
        additional_variables: BTreeMap::new(),
    };
    (repo, trigger)
}

fn patch_trigger(config: &ForgeConfig, event: PatchEvent) -> (Repo, PipelineTrigger) {
    let git_ref = format!("refs/heads/patches/{}", event.patch_id);
    let repo = hook_repository_to_repo(config, event.repository);
    let forge_url = non_empty_or(event.url, || repo.forge_url.clone());

    let additional_variables = BTreeMap::from([
        (PATCH_ID_VARIABLE.to_string(), event.patch_id.to_string()),
        (REVISION_ID_VARIABLE.to_string(), event.revision_id.to_string()),
    ]);
    let trigger = PipelineTrigger {
        event: TriggerEvent::PullRequest,
        commit: event.head_commit,
        branch: event.branch,
        git_ref,
        forge_url,
        message: event.title,
        author: event.author,
        additional_variables,
    };
    (repo, trigger)
}

/// Converts a canonical event into the repository to build and the trigger.
///
/// Patch triggers carry the patch and revision ids so the status of the
/// resulting pipeline can be reported on the patch.
pub(crate) fn event_to_trigger(
    config: &ForgeConfig,
    event: CanonicalEvent,
) -> (Repo, PipelineTrigger) {
    match event {
        CanonicalEvent::Push(event) => push_trigger(config, event),
        CanonicalEvent::Patch(event) => patch_trigger(config, event),
    }
}

#[cfg(test)]
#[path = "convert_tests.rs"]
mod tests;
