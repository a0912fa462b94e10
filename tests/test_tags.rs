mod common;

use dbsnap::*;

#[test]
fn list_empty() {
    let history = common::history_with_commits("shop");
    assert!(history.tags().list().unwrap().is_empty());
}

#[test]
fn set_on_archive() {
    let history = common::history_with_commits("shop");
    history.tags().set("v1", Some(0)).unwrap();
    assert_eq!(
        history.store().get_meta("shop*0", "tag").unwrap().as_deref(),
        Some("v1")
    );
    assert_eq!(
        history.tags().list().unwrap(),
        vec![TaggedRevision {
            tag: "v1".into(),
            container: "shop*0".into(),
        }]
    );
}

#[test]
fn set_without_revision_targets_head() {
    let history = common::history_with_commits("shop");
    history.tags().set("wip", None).unwrap();
    assert_eq!(history.get("tag").unwrap().as_deref(), Some("wip"));
}

#[test]
fn set_with_head_id_targets_head() {
    let history = common::history_with_commits("shop");
    history.tags().set("wip", Some(3)).unwrap();
    assert_eq!(history.tags().find("wip").unwrap().unwrap().container, "shop");
}

#[test]
fn duplicate_tag_fails() {
    let history = common::history_with_commits("shop");
    history.tags().set("v1", Some(0)).unwrap();
    let err = history.tags().set("v1", Some(1)).unwrap_err();
    assert!(matches!(err, Error::TagExists(_)));
    // the failed call changed nothing
    assert_eq!(history.store().get_meta("shop*1", "tag").unwrap(), None);
}

#[test]
fn duplicate_tag_on_same_revision_fails() {
    let history = common::history_with_commits("shop");
    history.tags().set("v1", Some(0)).unwrap();
    assert!(matches!(history.tags().set("v1", Some(0)), Err(Error::TagExists(_))));
}

#[test]
fn delete_then_reuse() {
    let history = common::history_with_commits("shop");
    history.tags().set("v1", Some(0)).unwrap();
    assert!(history.tags().delete("v1").unwrap());
    history.tags().set("v1", Some(1)).unwrap();
    assert_eq!(history.tags().find("v1").unwrap().unwrap().id, 1);
}

#[test]
fn delete_missing_is_noop() {
    let history = common::history_with_commits("shop");
    history.tags().set("v1", Some(0)).unwrap();
    assert!(!history.tags().delete("nope").unwrap());
    assert!(history.tags().has("v1").unwrap());
}

#[test]
fn set_on_missing_revision_fails() {
    let history = common::history_with_commits("shop");
    assert!(matches!(history.tags().set("v9", Some(9)), Err(Error::NotFound(_))));
    assert!(!history.tags().has("v9").unwrap());
}

#[test]
fn empty_tag_rejected() {
    let history = common::history_with_commits("shop");
    assert!(matches!(history.tags().set("", None), Err(Error::InvalidName(_))));
    assert!(matches!(history.tags().set("  ", None), Err(Error::InvalidName(_))));
}

#[test]
fn second_tag_replaces_first_on_same_container() {
    let history = common::history_with_commits("shop");
    history.tags().set("v1", Some(0)).unwrap();
    history.tags().set("v1-final", Some(0)).unwrap();
    assert!(!history.tags().has("v1").unwrap());
    assert!(history.tags().has("v1-final").unwrap());
}

#[test]
fn list_is_newest_first() {
    let history = common::history_with_commits("shop");
    history.tags().set("old", Some(0)).unwrap();
    history.tags().set("mid", Some(2)).unwrap();
    history.tags().set("new", None).unwrap();
    let tags: Vec<String> = history
        .tags()
        .list()
        .unwrap()
        .into_iter()
        .map(|t| t.tag)
        .collect();
    assert_eq!(tags, vec!["new", "mid", "old"]);
}

#[test]
fn head_tag_moves_to_archive_on_commit() {
    let history = common::history_with_commits("shop");
    history.tags().set("release", None).unwrap();
    history.commit(None).unwrap();

    assert_eq!(history.get("tag").unwrap(), None);
    let tagged = history.tags().find("release").unwrap().unwrap();
    assert_eq!(tagged.container, "shop*3");
    assert_eq!(tagged.id, 3);
    // still unique across the history
    assert_eq!(history.tags().list().unwrap().len(), 1);
}

#[test]
fn tags_survive_revert_of_head() {
    let history = common::history_with_commits("shop");
    history.tags().set("keep", Some(1)).unwrap();
    history.revert(RevertTarget::Revision(1)).unwrap();
    history.revert(RevertTarget::Revision(0)).unwrap();
    let all = history.tags().list().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].container, "shop*1");
}
