use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vitals_core::VitalsError;

/// Runs after `git pull` finishes a merge; tags the state that just landed.
const POST_MERGE_HOOK: &str = r#"#!/bin/sh
# Installed by vitals. Tags the repository state after a pull merge so a
# bad deployment can be rolled back to the previous tag.
tag="rollback-pull-$(date -u +%Y%m%d-%H%M%S)"
git tag "$tag" >/dev/null 2>&1
exit 0
"#;

/// Runs before `git push` leaves this machine; tags the outgoing state.
const PRE_PUSH_HOOK: &str = r#"#!/bin/sh
# Installed by vitals. Tags the repository state before a push so the
# exact pushed revision stays addressable on this machine.
tag="rollback-push-$(date -u +%Y%m%d-%H%M%S)"
git tag "$tag" >/dev/null 2>&1
exit 0
"#;

/// Paths of the two installed hook scripts.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use vitals_githooks::InstalledHooks;
///
/// let hooks = InstalledHooks {
///     post_merge: PathBuf::from(".git/hooks/post-merge"),
///     pre_push: PathBuf::from(".git/hooks/pre-push"),
/// };
/// assert!(hooks.post_merge.ends_with("post-merge"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledHooks {
    /// The post-merge (after pull) hook script.
    pub post_merge: PathBuf,
    /// The pre-push hook script.
    pub pre_push: PathBuf,
}

/// Install the rollback-tag hooks into the repository containing `path`.
///
/// Idempotent: rerunning overwrites the scripts with identical content and
/// keeps the executable bit. Both scripts are fixed; nothing is templated
/// at install time.
///
/// # Errors
///
/// Returns [`VitalsError::Hook`] when `path` is not inside a git
/// repository — in that case nothing is written — and [`VitalsError::Io`]
/// when the hooks directory cannot be written.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use vitals_githooks::install_hooks;
///
/// let hooks = install_hooks(Path::new(".")).unwrap();
/// println!("installed {}", hooks.pre_push.display());
/// ```
pub fn install_hooks(path: &Path) -> Result<InstalledHooks, VitalsError> {
    let repo = git2::Repository::discover(path)
        .map_err(|_| VitalsError::Hook(format!("{} is not a git repository", path.display())))?;

    let hooks_dir = repo.path().join("hooks");
    std::fs::create_dir_all(&hooks_dir)?;

    let post_merge = hooks_dir.join("post-merge");
    let pre_push = hooks_dir.join("pre-push");
    write_hook(&post_merge, POST_MERGE_HOOK)?;
    write_hook(&pre_push, PRE_PUSH_HOOK)?;

    Ok(InstalledHooks {
        post_merge,
        pre_push,
    })
}

fn write_hook(path: &Path, body: &str) -> Result<(), VitalsError> {
    std::fs::write(path, body)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms)?;
    }

    Ok(())
}
