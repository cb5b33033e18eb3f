use rstest::rstest;
use timeslip_core::sim::{ResumeSource, SpeedMultiplier, StatusEvent};

#[rstest]
#[case(StatusEvent::Loaded { name: "game.gba".into() }, "Loaded ROM game.gba")]
#[case(StatusEvent::NoPreviousSnapshot, "No previous savestate to restore")]
#[case(StatusEvent::SpeedChanged(SpeedMultiplier::X4), "Speed 4x")]
#[case(
    StatusEvent::SessionResumed(ResumeSource::Snapshot { id: "s_1_0".into() }),
    "Restored last save"
)]
#[case(StatusEvent::Cleared { deleted: 2 }, "Cleared 2 saves")]
fn events_render_user_messages(#[case] event: StatusEvent, #[case] expected: &str) {
    assert_eq!(event.to_string(), expected);
}
