//! Emulator facade tests.
//!
//! Drives whole user flows: load, play, rewind, export/import, resuming a previous session
//! from the same store, wiping data and swapping engines.

use crate::common::harness::{CART_BASE, CART_MAX, SNAPSHOT_LEN, TestContext, WRAM_BASE, rom, small_config};
use crate::common::mocks::engine::{CallLog, ScriptedEngine};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use timeslip_core::Error;
use timeslip_core::common::constants::{LAST_SAVE_KEY, META_COLLECTION, SAVES_COLLECTION};
use timeslip_core::core::CartridgeMeta;
use timeslip_core::sim::machine::lock;
use timeslip_core::sim::{ResumeSource, RunState, SpeedMultiplier, StatusEvent};
use timeslip_core::soc::MemoryBus;
use timeslip_core::storage::{MemoryStore, PersistentStore};

fn playing(ticks: usize) -> TestContext {
    let mut ctx = TestContext::new().load_rom("game.gba", 0x1000);
    ctx.emu.start().unwrap();
    for _ in 0..ticks {
        let _ = ctx.emu.tick();
    }
    ctx.emu.pause();
    ctx
}

// ══════════════════════════════════════════════════════════
// 1. Loading
// ══════════════════════════════════════════════════════════

#[test]
fn load_maps_cartridge_and_pushes_initial_snapshot() {
    let ctx = TestContext::new().load_rom("game.gba", 0x1000);

    {
        let machine = lock(ctx.emu.machine());
        assert_eq!(machine.reference().memory().read_u32(CART_BASE), 0x0302_0100);
        assert_eq!(machine.reference().memory().read_u32(CART_BASE + 0xFFC), 0xFFFE_FDFC);
        assert_eq!(machine.rom_name(), "game.gba");
    }
    assert_eq!(ctx.pc(), CART_BASE);
    assert_eq!(ctx.emu.scheduler().state(), RunState::Paused);
    assert_eq!(ctx.emu.rewind_store().len(), 1);
    assert_eq!(
        ctx.last_event(),
        Some(StatusEvent::Loaded {
            name: "game.gba".into()
        })
    );
}

#[test]
fn oversized_cartridge_reports_load_failure() {
    let mut ctx = TestContext::new();
    let err = ctx
        .emu
        .load_cartridge(&rom(CART_MAX as usize + 1), CartridgeMeta::named("huge.gba"))
        .unwrap_err();

    assert!(matches!(err, Error::RegionTooLarge { .. }), "{err:?}");
    assert!(matches!(ctx.last_event(), Some(StatusEvent::LoadFailed { .. })));
    assert_eq!(ctx.emu.scheduler().state(), RunState::Idle);
    assert!(ctx.emu.rewind_store().is_empty());
    assert!(lock(ctx.emu.machine()).cartridge().is_none());
}

#[test]
fn load_from_library_records_last_rom() {
    let mut ctx = TestContext::new();
    let id = ctx.emu.library().add("lib.gba", &rom(64)).unwrap();
    ctx.emu.load_from_library(&id).unwrap();

    let last = ctx.emu.library().last().unwrap().unwrap();
    assert_eq!(last.id, id);
    assert_eq!(last.name, "lib.gba");
    assert_eq!(lock(ctx.emu.machine()).rom_name(), "lib.gba");
}

#[test]
fn load_from_unknown_id_is_rom_not_found() {
    let mut ctx = TestContext::new();
    assert!(matches!(
        ctx.emu.load_from_library("rom_0_0"),
        Err(Error::RomNotFound(_))
    ));
}

// ══════════════════════════════════════════════════════════
// 2. Restore and rewind
// ══════════════════════════════════════════════════════════

#[test]
fn rewind_with_single_entry_reports_nothing_to_restore() {
    let mut ctx = TestContext::new().load_rom("game.gba", 0x1000);
    assert!(ctx.emu.rewind().unwrap().is_none());
    assert_eq!(ctx.last_event(), Some(StatusEvent::NoPreviousSnapshot));
    assert_eq!(ctx.emu.rewind_store().len(), 1);
}

#[test]
fn rewind_restores_earlier_state() {
    let mut ctx = playing(2);
    assert_eq!(ctx.pc(), CART_BASE + 128);

    let entry = ctx.emu.rewind().unwrap().unwrap();
    assert_eq!(ctx.pc(), CART_BASE + 64);
    assert_eq!(ctx.last_event(), Some(StatusEvent::Rewound { id: entry.id }));

    let _ = ctx.emu.rewind().unwrap().unwrap();
    assert_eq!(ctx.pc(), CART_BASE);
    assert!(ctx.emu.rewind().unwrap().is_none());
}

#[test]
fn invalid_restore_leaves_state_unchanged() {
    let mut ctx = playing(1);
    lock(ctx.emu.machine())
        .reference_mut()
        .memory_mut()
        .write_u32(WRAM_BASE, 0x1234_5678);
    let pc = ctx.pc();

    let err = ctx.emu.restore_snapshot(&[1, 0, 0, 0, 9]).unwrap_err();
    assert!(matches!(err, Error::SnapshotTooShort { .. }), "{err:?}");
    assert!(matches!(ctx.last_event(), Some(StatusEvent::RestoreFailed { .. })));
    assert_eq!(ctx.pc(), pc);
    assert_eq!(
        lock(ctx.emu.machine()).reference().memory().read_u32(WRAM_BASE),
        0x1234_5678
    );
}

// ══════════════════════════════════════════════════════════
// 3. Export and import
// ══════════════════════════════════════════════════════════

#[test]
fn export_names_artifact_after_cartridge() {
    let ctx = playing(1);
    let artifact = ctx.emu.export_current().unwrap();
    assert_eq!(artifact.filename, "game.gba.sav");
    assert_eq!(artifact.bytes.len(), SNAPSHOT_LEN);
    assert_eq!(&*ctx.emu.rewind_store().latest().unwrap().payload, &artifact.bytes[..]);
}

#[test]
fn export_without_saves_is_none() {
    assert!(TestContext::new().emu.export_current().is_none());
}

#[test]
fn import_restores_and_tags_entry() {
    let mut ctx = playing(3);
    let early = ctx.emu.rewind_store().ids()[0].clone();
    let store = Arc::clone(&ctx.store);
    ctx.emu.rewind_store().flush();
    let bytes = store.get(SAVES_COLLECTION, &early).unwrap().unwrap().data;

    let entry = ctx.emu.import_save(bytes).unwrap();
    assert_eq!(ctx.pc(), CART_BASE);
    assert_eq!(entry.metadata.get("imported").map(String::as_str), Some("true"));
    assert_eq!(ctx.emu.rewind_store().current_id(), Some(entry.id.clone()));
    assert_eq!(ctx.last_event(), Some(StatusEvent::Imported { id: entry.id }));
}

#[test]
fn import_of_garbage_fails_but_keeps_entry() {
    let mut ctx = playing(1);
    let pc = ctx.pc();
    let before = ctx.emu.rewind_store().len();

    assert!(ctx.emu.import_save(vec![7, 7, 7]).is_err());
    assert_eq!(ctx.pc(), pc);
    assert_eq!(ctx.emu.rewind_store().len(), before + 1);
    assert!(matches!(ctx.last_event(), Some(StatusEvent::RestoreFailed { .. })));
}

// ══════════════════════════════════════════════════════════
// 4. Resume and wipe
// ══════════════════════════════════════════════════════════

#[test]
fn resume_restores_last_save_with_its_cartridge() {
    let store = Arc::new(MemoryStore::new());
    let expected_pc;
    {
        let mut first = TestContext::with_store(&small_config(), Arc::clone(&store));
        let id = first.emu.library().add("game.gba", &rom(0x1000)).unwrap();
        first.emu.load_from_library(&id).unwrap();
        first.emu.start().unwrap();
        let _ = first.emu.tick();
        let _ = first.emu.tick();
        first.emu.pause();
        expected_pc = first.pc();
        first.emu.rewind_store().flush();
    }

    let mut second = TestContext::with_store(&small_config(), store);
    let source = second.emu.restore_last_session().unwrap().unwrap();
    assert!(matches!(source, ResumeSource::Snapshot { .. }));
    assert_eq!(second.pc(), expected_pc);
    assert_eq!(lock(second.emu.machine()).rom_name(), "game.gba");
    assert_eq!(
        lock(second.emu.machine())
            .reference()
            .memory()
            .read_u32(CART_BASE),
        0x0302_0100
    );
    assert_eq!(second.last_event(), Some(StatusEvent::SessionResumed(source)));
}

#[test]
fn resumed_session_can_rewind_into_earlier_history() {
    let store = Arc::new(MemoryStore::new());
    {
        let mut first = TestContext::with_store(&small_config(), Arc::clone(&store));
        let id = first.emu.library().add("game.gba", &rom(0x1000)).unwrap();
        first.emu.load_from_library(&id).unwrap();
        first.emu.start().unwrap();
        let _ = first.emu.tick();
        let _ = first.emu.tick();
        first.emu.pause();
        first.emu.rewind_store().flush();
    }

    let mut second = TestContext::with_store(&small_config(), Arc::clone(&store));
    assert_eq!(second.emu.rewind_store().len(), 3);
    let _ = second.emu.restore_last_session().unwrap().unwrap();
    assert_eq!(second.pc(), CART_BASE + 128);

    let _ = second.emu.rewind().unwrap().unwrap();
    assert_eq!(second.pc(), CART_BASE + 64);
    second.emu.rewind_store().flush();
    assert_eq!(store.len(SAVES_COLLECTION), 2);
}

#[test]
fn resume_without_saves_cold_starts_last_rom() {
    let mut ctx = TestContext::new();
    let id = ctx.emu.library().add("cold.gba", &rom(64)).unwrap();
    ctx.emu.library().set_last(&id, "cold.gba").unwrap();

    let source = ctx.emu.restore_last_session().unwrap();
    assert_eq!(
        source,
        Some(ResumeSource::Cartridge {
            name: "cold.gba".into()
        })
    );
    assert_eq!(ctx.pc(), CART_BASE);
    assert_eq!(ctx.emu.rewind_store().len(), 1);
}

#[test]
fn resume_with_nothing_stored_is_none() {
    let mut ctx = TestContext::new();
    assert!(ctx.emu.restore_last_session().unwrap().is_none());
    assert_eq!(ctx.last_event(), Some(StatusEvent::NothingToResume));
}

#[test]
fn resume_with_missing_last_rom_is_none() {
    let mut ctx = TestContext::new();
    ctx.emu.library().set_last("rom_0_0", "gone.gba").unwrap();
    assert!(ctx.emu.restore_last_session().unwrap().is_none());
    assert_eq!(ctx.last_event(), Some(StatusEvent::NothingToResume));
}

#[test]
fn clear_all_data_wipes_saves_and_pointers() {
    let mut ctx = TestContext::new();
    let id = ctx.emu.library().add("game.gba", &rom(0x100)).unwrap();
    ctx.emu.load_from_library(&id).unwrap();
    ctx.emu.start().unwrap();
    let _ = ctx.emu.tick();
    let _ = ctx.emu.tick();
    ctx.emu.pause();

    assert_eq!(ctx.emu.clear_all_data().unwrap(), 3);
    assert_eq!(ctx.last_event(), Some(StatusEvent::Cleared { deleted: 3 }));
    assert!(ctx.store.is_empty(SAVES_COLLECTION));
    assert!(ctx.store.get(META_COLLECTION, LAST_SAVE_KEY).unwrap().is_none());
    assert!(ctx.emu.library().last().unwrap().is_none());
    assert!(ctx.emu.rewind_store().is_empty());
    assert_eq!(ctx.emu.library().list().unwrap().len(), 1);
}

// ══════════════════════════════════════════════════════════
// 5. Speed and engines
// ══════════════════════════════════════════════════════════

#[test]
fn four_toggles_return_to_normal_speed() {
    let mut ctx = TestContext::new().load_rom("game.gba", 0x1000);
    for _ in 0..4 {
        let _ = ctx.emu.toggle_speed();
    }
    assert_eq!(ctx.emu.scheduler().speed(), SpeedMultiplier::X1);
    assert_eq!(
        ctx.last_event(),
        Some(StatusEvent::SpeedChanged(SpeedMultiplier::X1))
    );
}

#[test]
fn engines_cannot_be_swapped_while_running() {
    let mut ctx = TestContext::new().load_rom("game.gba", 0x1000);
    ctx.emu.start().unwrap();
    let err = ctx
        .emu
        .attach_engine(Box::new(ScriptedEngine::new(CallLog::default())))
        .unwrap_err();
    assert!(matches!(err, Error::EngineBusy));
    assert!(matches!(ctx.emu.detach_engine(), Err(Error::EngineBusy)));

    ctx.emu.pause();
    ctx.emu
        .attach_engine(Box::new(ScriptedEngine::new(CallLog::default())))
        .unwrap();
    assert_eq!(
        ctx.last_event(),
        Some(StatusEvent::EngineAttached {
            name: "scripted".into()
        })
    );
    assert!(ctx.emu.detach_engine().unwrap().is_some());
    assert_eq!(ctx.last_event(), Some(StatusEvent::EngineDetached));
}

#[test]
fn external_engine_owns_snapshots_and_rewind() {
    let log = CallLog::default();
    let mut ctx = TestContext::new();
    ctx.emu
        .attach_engine(Box::new(ScriptedEngine::new(log.clone())))
        .unwrap();
    ctx.emu
        .load_cartridge(&rom(32), CartridgeMeta::named("ext.gba"))
        .unwrap();
    ctx.emu.start().unwrap();
    let _ = ctx.emu.tick();
    ctx.emu.pause();

    let entry = ctx.emu.rewind().unwrap().unwrap();
    assert_eq!(&*entry.payload, &0u32.to_le_bytes());
    assert!(log.contains("restore"));
    assert!(lock(ctx.emu.machine()).reference().is_halted());
}
