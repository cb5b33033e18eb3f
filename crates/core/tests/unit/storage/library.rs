//! ROM library tests.

use crate::common::mocks::store::failing_store;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use timeslip_core::Error;
use timeslip_core::storage::{LastRom, MemoryStore, PersistentStore, RomLibrary};

fn library() -> RomLibrary {
    let store: Arc<dyn PersistentStore> = Arc::new(MemoryStore::new());
    RomLibrary::new(store)
}

#[test]
fn add_stores_image_with_metadata() {
    let library = library();
    let id = library.add("game.gba", &[1, 2, 3, 4]).unwrap();
    assert!(id.starts_with("rom_"));

    let record = library.get(&id).unwrap();
    assert_eq!(record.data, [1, 2, 3, 4]);
    assert_eq!(record.meta["name"], "game.gba");
    assert_eq!(record.meta["size"], "4");
    assert_eq!(record.meta["addedAt"], record.timestamp.to_string());
}

#[test]
fn ids_are_unique_within_a_millisecond() {
    let library = library();
    let a = library.add("a.gba", &[]).unwrap();
    let b = library.add("a.gba", &[]).unwrap();
    assert_ne!(a, b);
}

#[test]
fn find_or_add_reuses_matching_record() {
    let library = library();
    let id = library.find_or_add("game.gba", &[1, 2, 3]).unwrap();
    assert_eq!(library.find_or_add("game.gba", &[1, 2, 3]).unwrap(), id);
    assert_eq!(library.list().unwrap().len(), 1);

    let renamed = library.find_or_add("copy.gba", &[1, 2, 3]).unwrap();
    let patched = library.find_or_add("game.gba", &[1, 2, 4]).unwrap();
    assert_ne!(renamed, id);
    assert_ne!(patched, id);
    assert_eq!(library.list().unwrap().len(), 3);
}

#[test]
fn find_or_add_surfaces_store_failure() {
    let library = RomLibrary::new(Arc::new(failing_store()));
    assert!(matches!(
        library.find_or_add("game.gba", &[1]),
        Err(Error::Store(_))
    ));
}

#[test]
fn list_is_newest_first() {
    let library = library();
    let first = library.add("first.gba", &[1]).unwrap();
    let second = library.add("second.gba", &[2]).unwrap();
    let third = library.add("third.gba", &[3]).unwrap();

    let ids: Vec<_> = library.list().unwrap().into_iter().map(|r| r.key).collect();
    assert_eq!(ids, [third, second, first]);
}

#[test]
fn unknown_id_is_rom_not_found() {
    let err = library().get("rom_0_0").unwrap_err();
    assert!(matches!(err, Error::RomNotFound(ref id) if id == "rom_0_0"), "{err:?}");
}

#[test]
fn last_rom_pointer_round_trips() {
    let library = library();
    assert!(library.last().unwrap().is_none());
    let id = library.add("game.gba", &[0]).unwrap();
    library.set_last(&id, "game.gba").unwrap();
    assert_eq!(
        library.last().unwrap(),
        Some(LastRom {
            id,
            name: "game.gba".into()
        })
    );
    library.clear_last().unwrap();
    assert!(library.last().unwrap().is_none());
}

#[test]
fn removing_last_rom_clears_pointer() {
    let library = library();
    let kept = library.add("kept.gba", &[0]).unwrap();
    let gone = library.add("gone.gba", &[0]).unwrap();

    library.set_last(&kept, "kept.gba").unwrap();
    library.remove(&gone).unwrap();
    assert_eq!(library.last().unwrap().map(|l| l.id), Some(kept.clone()));

    library.remove(&kept).unwrap();
    assert!(library.last().unwrap().is_none());
    assert!(library.list().unwrap().is_empty());
}

#[test]
fn store_errors_propagate() {
    let library = RomLibrary::new(Arc::new(failing_store()));
    assert!(matches!(library.add("x.gba", &[0]), Err(Error::Store(_))));
    assert!(matches!(library.list(), Err(Error::Store(_))));
}
