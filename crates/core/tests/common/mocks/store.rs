use mockall::mock;
use timeslip_core::StoreError;
use timeslip_core::storage::{PersistentStore, Record};

mock! {
    pub Store {}
    impl PersistentStore for Store {
        fn put(&self, collection: &str, record: Record) -> Result<(), StoreError>;
        fn get(&self, collection: &str, key: &str) -> Result<Option<Record>, StoreError>;
        fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError>;
        fn enumerate(&self, collection: &str) -> Result<Vec<Record>, StoreError>;
    }
}

/// A store whose every operation fails with a backend error.
pub fn failing_store() -> MockStore {
    let mut store = MockStore::new();
    let _ = store
        .expect_put()
        .returning(|_, _| Err(StoreError::Backend("disk full".into())));
    let _ = store
        .expect_get()
        .returning(|_, _| Err(StoreError::Backend("disk full".into())));
    let _ = store
        .expect_delete()
        .returning(|_, _| Err(StoreError::Backend("disk full".into())));
    let _ = store
        .expect_enumerate()
        .returning(|_| Err(StoreError::Backend("disk full".into())));
    store
}
