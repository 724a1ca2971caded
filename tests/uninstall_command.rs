#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the `uninstall` phase lists.

use std::collections::HashSet;

use dotfiles_cli::tasks;

fn names(phases: &[tasks::Phase]) -> Vec<&'static str> {
    phases.iter().flat_map(|p| &p.tasks).map(|t| t.name()).collect()
}

#[test]
fn uninstall_keeps_tools_by_default() {
    let phases = tasks::uninstall_phases(false);
    insta::assert_snapshot!(names(&phases).join("\n"), @r"
    Remove configurations
    Remove local scripts
    ");
}

#[test]
fn uninstall_remove_tools_appends_phase() {
    let phases = tasks::uninstall_phases(true);
    assert_eq!(phases.len(), 2);
    assert_eq!(phases[1].title, "Remove Tools");
    insta::assert_snapshot!(names(&phases).join("\n"), @r"
    Remove configurations
    Remove local scripts
    Remove Oh My Zsh
    Remove proto
    Remove TPM
    ");
}

#[test]
fn uninstall_task_names_are_unique() {
    let phases = tasks::uninstall_phases(true);
    let all = names(&phases);
    let unique: HashSet<&str> = all.iter().copied().collect();
    assert_eq!(all.len(), unique.len(), "duplicate task names: {all:?}");
}

#[test]
fn uninstall_tasks_are_fatal() {
    for task in tasks::uninstall_phases(true).iter().flat_map(|p| &p.tasks) {
        assert!(!task.best_effort(), "{} should be fatal", task.name());
    }
}
