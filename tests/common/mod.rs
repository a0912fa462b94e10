use dbsnap::*;

pub fn create_history(head: &str) -> History<MemoryStore> {
    let history = History::open(MemoryStore::new(), head, HistoryOptions::default()).unwrap();
    history.create().unwrap();
    history
}

#[allow(dead_code)]
pub fn init_history(head: &str) -> History<MemoryStore> {
    let history = create_history(head);
    assert_eq!(history.init().unwrap(), 0);
    history
}

/// Head at revision 3 with archives 0, 1 and 2 on a straight line.
#[allow(dead_code)]
pub fn history_with_commits(head: &str) -> History<MemoryStore> {
    let history = init_history(head);
    history.commit(Some("first")).unwrap();
    history.commit(Some("second")).unwrap();
    history.commit(None).unwrap();
    history
}

#[allow(dead_code)]
pub fn ids(revisions: &[Revision]) -> Vec<u64> {
    revisions.iter().map(|r| r.id).collect()
}

#[allow(dead_code)]
pub fn rev(id: u64, parent: u64, message: &str) -> Revision {
    Revision {
        container: format!("test*{}", id),
        id,
        parent,
        tag: None,
        message: Some(message.to_string()),
    }
}
