//! End-to-end linking flows over real temporary trees: the two-phase merge,
//! idempotency, conflict handling, and broken-link cleanup.
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

mod common;

use std::fs;
use std::os::unix::fs as unix_fs;

use common::{TestLayout, dir_entries, link_target};
use microdots_cli::linker::{LinkOptions, SymlinkEngine};

const MUTATE: LinkOptions = LinkOptions {
    dry_run: false,
    force: false,
};
const FORCE: LinkOptions = LinkOptions {
    dry_run: false,
    force: true,
};
const DRY: LinkOptions = LinkOptions {
    dry_run: true,
    force: false,
};

fn engine(layout: &TestLayout, with_local: bool) -> SymlinkEngine {
    let local = if with_local { Some(layout.local()) } else { None };
    SymlinkEngine::new(layout.public(), local, layout.home())
}

/// Public topics plus a local override and a local-only topic.
fn populated_layout() -> TestLayout {
    let layout = TestLayout::new();
    layout.init_local();
    layout.topic_file(&layout.public(), "vim", "vimrc.symlink", "set number\n");
    layout.topic_file(&layout.public(), "zsh", "zshrc.symlink", "# public zshrc\n");
    layout.topic_file(&layout.local(), "zsh", "zshrc.symlink", "# local zshrc\n");
    layout.topic_file(&layout.local(), "git", "gitconfig.symlink", "[user]\n");
    layout
}

#[test]
fn first_run_links_both_phases_counting_per_destination() {
    let layout = populated_layout();
    let log = common::test_logger();

    let report = engine(&layout, true).create_all(&log, MUTATE).expect("create_all");

    // Three destinations changed hands; the local zshrc laying over the
    // public one in the same run still counts once.
    assert_eq!(report.created, 3, "unexpected report: {report:?}");
    assert_eq!(report.updated, 0);
    assert_eq!(report.skipped, 0);
    assert!(report.conflicts.is_empty());
    assert!(report.errors.is_empty());

    assert_eq!(
        link_target(&layout.home().join(".vimrc")),
        layout.public().join("vim/vimrc.symlink")
    );
    assert_eq!(
        link_target(&layout.home().join(".zshrc")),
        layout.local().join("zsh/zshrc.symlink"),
        "the local layer must win the zshrc destination"
    );
    assert_eq!(
        link_target(&layout.home().join(".gitconfig")),
        layout.local().join("git/gitconfig.symlink")
    );
}

#[test]
fn local_content_is_what_the_shell_would_read() {
    let layout = populated_layout();
    let log = common::test_logger();

    engine(&layout, true).create_all(&log, MUTATE).expect("create_all");

    let through_link = fs::read_to_string(layout.home().join(".zshrc")).expect("read .zshrc");
    assert_eq!(through_link, "# local zshrc\n");
}

#[test]
fn second_run_is_idempotent() {
    let layout = populated_layout();
    let log = common::test_logger();
    let engine = engine(&layout, true);

    engine.create_all(&log, MUTATE).expect("first run");
    let report = engine.create_all(&log, MUTATE).expect("second run");

    assert_eq!(report.created, 0, "unexpected report: {report:?}");
    assert_eq!(report.updated, 0);
    assert_eq!(report.skipped, 3);
}

#[test]
fn public_link_upgrades_when_a_local_override_appears() {
    let layout = TestLayout::new();
    layout.topic_file(&layout.public(), "zsh", "zshrc.symlink", "# public\n");
    let log = common::test_logger();

    let report = engine(&layout, false).create_all(&log, MUTATE).expect("public run");
    assert_eq!(report.created, 1);

    layout.init_local();
    layout.topic_file(&layout.local(), "zsh", "zshrc.symlink", "# local\n");

    let report = engine(&layout, true).create_all(&log, MUTATE).expect("local run");
    assert_eq!(report.updated, 1, "unexpected report: {report:?}");
    assert_eq!(report.created, 0);
    assert_eq!(
        link_target(&layout.home().join(".zshrc")),
        layout.local().join("zsh/zshrc.symlink")
    );
}

#[test]
fn conflicting_file_is_preserved_without_force() {
    let layout = TestLayout::new();
    layout.topic_file(&layout.public(), "vim", "vimrc.symlink", "set number\n");
    fs::write(layout.home().join(".vimrc"), "precious edits\n").expect("write conflict");
    let log = common::test_logger();

    let report = engine(&layout, false).create_all(&log, MUTATE).expect("create_all");

    assert_eq!(report.conflicts, vec![layout.home().join(".vimrc")]);
    let content = fs::read_to_string(layout.home().join(".vimrc")).expect("read .vimrc");
    assert_eq!(content, "precious edits\n", "conflicting file must survive");
}

#[test]
fn force_displaces_the_conflict_to_a_timestamped_backup() {
    let layout = TestLayout::new();
    layout.topic_file(&layout.public(), "vim", "vimrc.symlink", "set number\n");
    fs::write(layout.home().join(".vimrc"), "precious edits\n").expect("write conflict");
    let log = common::test_logger();

    let report = engine(&layout, false).create_all(&log, FORCE).expect("create_all");

    assert_eq!(report.created, 1, "unexpected report: {report:?}");
    assert!(report.conflicts.is_empty());
    assert!(
        layout.home().join(".vimrc").is_symlink(),
        "destination should now be a link"
    );

    let backup = dir_entries(&layout.home())
        .into_iter()
        .find(|name| name.starts_with(".vimrc.backup."))
        .expect("a timestamped backup should exist");
    let content = fs::read_to_string(layout.home().join(&backup)).expect("read backup");
    assert_eq!(content, "precious edits\n");
}

#[test]
fn dry_run_previews_the_real_outcome_without_touching_home() {
    let layout = populated_layout();
    let log = common::test_logger();
    let engine = engine(&layout, true);

    let preview = engine.create_all(&log, DRY).expect("dry run");
    assert!(
        dir_entries(&layout.home()).is_empty(),
        "dry run must not create anything"
    );

    let real = engine.create_all(&log, MUTATE).expect("real run");
    assert_eq!(preview, real, "preview must match what the real run does");
}

#[test]
fn directory_source_links_as_a_directory() {
    let layout = TestLayout::new();
    let bundle = layout.public().join("vim/colors.symlink");
    fs::create_dir_all(&bundle).expect("create directory source");
    fs::write(bundle.join("theme.vim"), "hi Normal\n").expect("write theme");
    let log = common::test_logger();

    let report = engine(&layout, false).create_all(&log, MUTATE).expect("create_all");

    assert_eq!(report.created, 1);
    let dest = layout.home().join(".colors");
    assert!(dest.is_symlink(), ".colors should be a symlink");
    assert!(
        dest.join("theme.vim").is_file(),
        "directory content should be reachable through the link"
    );
}

#[test]
fn clean_broken_removes_only_dangling_links() {
    let layout = TestLayout::new();
    let log = common::test_logger();

    let kept_source = layout.topic_file(&layout.public(), "vim", "vimrc.symlink", "x\n");
    unix_fs::symlink(&kept_source, layout.home().join(".vimrc")).expect("valid link");
    unix_fs::symlink(
        layout.public().join("zsh/deleted.symlink"),
        layout.home().join(".deleted"),
    )
    .expect("dangling link");
    fs::write(layout.home().join(".profile"), "export A=1\n").expect("real file");

    let removed = engine(&layout, false)
        .clean_broken(&log, false)
        .expect("clean_broken");

    assert_eq!(removed, 1);
    assert_eq!(dir_entries(&layout.home()), vec![".profile", ".vimrc"]);
}

#[test]
fn clean_broken_dry_run_counts_but_keeps_the_link() {
    let layout = TestLayout::new();
    let log = common::test_logger();
    unix_fs::symlink(
        layout.public().join("zsh/deleted.symlink"),
        layout.home().join(".deleted"),
    )
    .expect("dangling link");

    let removed = engine(&layout, false)
        .clean_broken(&log, true)
        .expect("clean_broken");

    assert_eq!(removed, 1);
    assert_eq!(dir_entries(&layout.home()), vec![".deleted"]);
}
