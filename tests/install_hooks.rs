use std::process::Command;

fn run_install(dir: &std::path::Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_vitals"))
        .arg("install-hooks")
        .current_dir(dir)
        .output()
        .unwrap()
}

#[test]
fn outside_a_repository_fails_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();

    let output = run_install(dir.path());
    assert!(!output.status.success());

    // The failed run must not leave anything behind.
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn installs_hooks_into_a_repository() {
    let dir = tempfile::tempdir().unwrap();
    git2::Repository::init(dir.path()).unwrap();

    let output = run_install(dir.path());
    assert!(
        output.status.success(),
        "install-hooks failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let hooks = dir.path().join(".git/hooks");
    let post_merge = hooks.join("post-merge");
    let pre_push = hooks.join("pre-push");
    assert!(post_merge.exists());
    assert!(pre_push.exists());

    let body = std::fs::read_to_string(&pre_push).unwrap();
    assert!(body.starts_with("#!/bin/sh"));
    assert!(body.contains("rollback-push-"));
}

#[test]
fn second_run_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    git2::Repository::init(dir.path()).unwrap();

    assert!(run_install(dir.path()).status.success());
    let pre_push = dir.path().join(".git/hooks/pre-push");
    let before = std::fs::read_to_string(&pre_push).unwrap();

    assert!(run_install(dir.path()).status.success());
    let after = std::fs::read_to_string(&pre_push).unwrap();
    assert_eq!(before, after);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&pre_push).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111, "executable bit must survive a rerun");
    }
}
