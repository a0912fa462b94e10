mod common;

use dbsnap::*;

fn containers(history: &History<MemoryStore>) -> Vec<String> {
    history.store().containers().unwrap()
}

#[test]
fn dry_run_changes_nothing() {
    let history = common::history_with_commits("shop");
    let before = containers(&history);
    let preview = history.purge(PurgeMode::All, false).unwrap();
    assert_eq!(common::ids(&preview), vec![2, 1, 0]);
    assert_eq!(containers(&history), before);
}

#[test]
fn dry_run_matches_confirmed_selection() {
    let history = common::history_with_commits("shop");
    history.tags().set("v1", Some(1)).unwrap();
    let preview = history.purge(PurgeMode::KeepTags, false).unwrap();
    let purged = history.purge(PurgeMode::KeepTags, true).unwrap();
    assert_eq!(preview, purged);
}

#[test]
fn purge_all_keeps_only_head() {
    let history = common::history_with_commits("shop");
    history.tags().set("v1", Some(1)).unwrap();
    history.purge(PurgeMode::All, true).unwrap();
    assert_eq!(containers(&history), vec!["shop"]);
    assert_eq!(history.id().unwrap(), 3);
    assert_eq!(history.log(LogOptions::default()).unwrap().len(), 1);
}

#[test]
fn purge_never_selects_tagged_head() {
    let history = common::history_with_commits("shop");
    history.tags().set("wip", None).unwrap();
    let purged = history.purge(PurgeMode::All, true).unwrap();
    assert!(purged.iter().all(|r| r.container != "shop"));
    assert!(history.tags().has("wip").unwrap());
}

#[test]
fn purge_keeptags() {
    let history = common::history_with_commits("shop");
    history.tags().set("v1", Some(1)).unwrap();
    let purged = history.purge(PurgeMode::KeepTags, true).unwrap();
    assert_eq!(common::ids(&purged), vec![2, 0]);
    assert_eq!(containers(&history), vec!["shop", "shop*1"]);

    // the head can still go back to the kept revision
    history.revert(RevertTarget::Tag("v1".into())).unwrap();
    assert_eq!(history.parent().unwrap(), 1);
}

#[test]
fn purge_empty_history() {
    let history = common::init_history("shop");
    assert!(history.purge(PurgeMode::All, true).unwrap().is_empty());
    assert_eq!(containers(&history), vec!["shop"]);
}

#[test]
fn purge_leaves_other_histories() {
    let history = common::history_with_commits("shop");
    history.store().create("shopping").unwrap();
    history.store().create("shop*draft").unwrap();
    history.purge(PurgeMode::All, true).unwrap();
    assert_eq!(containers(&history), vec!["shop", "shop*draft", "shopping"]);
}

#[test]
fn purge_evicts_before_destroying() {
    let history = common::history_with_commits("shop");
    history.store().attach("shop*1").unwrap();
    history.store().clear_journal().unwrap();

    history.purge(PurgeMode::All, true).unwrap();
    assert_eq!(history.store().sessions("shop*1").unwrap(), 0);
    assert_eq!(
        history.store().journal().unwrap(),
        vec![
            StoreOp::Evict("shop*2".into()),
            StoreOp::Destroy("shop*2".into()),
            StoreOp::Evict("shop*1".into()),
            StoreOp::Destroy("shop*1".into()),
            StoreOp::Evict("shop*0".into()),
            StoreOp::Destroy("shop*0".into()),
        ]
    );
}

#[test]
fn purge_mode_from_str() {
    assert_eq!("all".parse::<PurgeMode>().unwrap(), PurgeMode::All);
    assert_eq!("keeptags".parse::<PurgeMode>().unwrap(), PurgeMode::KeepTags);
    assert!(matches!(
        "everything".parse::<PurgeMode>(),
        Err(Error::UnsupportedPurgeMode(_))
    ));
    assert!("All".parse::<PurgeMode>().is_err());
}

#[test]
fn purge_mode_display() {
    assert_eq!(PurgeMode::All.to_string(), "all");
    assert_eq!(PurgeMode::KeepTags.to_string(), "keeptags");
}
