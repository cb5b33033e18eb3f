use crate::common::harness::init_tracing;
use crate::common::mocks::store::MockStore;
use mockall::Sequence;
use mockall::predicate::eq;
use std::sync::Arc;
use timeslip_core::StoreError;
use timeslip_core::rewind::PersistWriter;
use timeslip_core::storage::{MemoryStore, PersistentStore, Record};

fn record(key: &str) -> Record {
    Record {
        key: key.to_string(),
        ..Record::default()
    }
}

#[test]
fn jobs_run_in_enqueue_order() {
    let mut store = MockStore::new();
    let mut seq = Sequence::new();
    let _ = store
        .expect_put()
        .withf(|collection, record| collection == "saves" && record.key == "a")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(()));
    let _ = store
        .expect_delete()
        .with(eq("saves"), eq("a"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(()));
    let _ = store
        .expect_put()
        .withf(|_, record| record.key == "b")
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(()));

    let writer = PersistWriter::spawn(Arc::new(store)).unwrap();
    writer.put("saves", record("a"));
    writer.delete("saves", "a".to_string());
    writer.put("saves", record("b"));
    writer.flush();
    assert_eq!(writer.failures(), 0);
}

#[test]
fn failed_job_does_not_stop_writer() {
    init_tracing();
    let mut store = MockStore::new();
    let _ = store
        .expect_put()
        .withf(|_, record| record.key == "bad")
        .returning(|_, _| Err(StoreError::Backend("rejected".into())));
    let _ = store
        .expect_put()
        .withf(|_, record| record.key == "good")
        .times(1)
        .returning(|_, _| Ok(()));

    let writer = PersistWriter::spawn(Arc::new(store)).unwrap();
    writer.put("saves", record("bad"));
    writer.put("saves", record("good"));
    writer.flush();
    assert_eq!(writer.failures(), 1);
}

#[test]
fn drop_drains_pending_jobs() {
    let store = Arc::new(MemoryStore::new());
    let dyn_store: Arc<dyn PersistentStore> = store.clone();
    let writer = PersistWriter::spawn(dyn_store).unwrap();
    for key in ["x", "y", "z"] {
        writer.put("saves", record(key));
    }
    drop(writer);
    assert_eq!(store.len("saves"), 3);
}
