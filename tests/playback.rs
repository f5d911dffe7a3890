//! Playback integration tests: text → compile → step sequencer → events.
//!
//! These run the tick logic directly, without a timer thread or audio output.

use assert_approx_eq::assert_approx_eq;
use beatmark::dsl::note::note_to_frequency;
use beatmark::dsl::presets;
use beatmark::event::{Event, Hit, StepSequencer, Tick};

/// Helper: run `count` ticks of `src` from a fresh start.
fn run(src: &str, count: usize) -> Vec<Tick> {
    let mut sequencer = StepSequencer::new();
    sequencer.start();
    (0..count).filter_map(|_| sequencer.tick(src)).collect()
}

fn track_hits<'a>(ticks: &'a [Tick], track: &str) -> Vec<(usize, &'a Event)> {
    ticks
        .iter()
        .flat_map(|t| t.events.iter().map(move |e| (t.step, e)))
        .filter(|(_, e)| e.track_name == track)
        .collect()
}

#[test]
fn rock_preset_plays_one_bar() {
    let ticks = run(presets::get("rock").unwrap(), 16);
    assert_eq!(ticks.len(), 16);
    assert!(ticks.iter().all(|t| t.step_seconds == Some(0.125)));

    let kicks: Vec<usize> = track_hits(&ticks, "Kick").iter().map(|(s, _)| *s).collect();
    assert_eq!(kicks, vec![0, 4, 8, 12]);

    let hats = track_hits(&ticks, "HiHat");
    assert_eq!(hats.len(), 8);
    assert!(hats
        .iter()
        .all(|(_, e)| e.hit == Hit::Drum { accent: false }));

    assert!(track_hits(&ticks, "Clap").is_empty());
}

#[test]
fn second_bar_repeats_the_first() {
    let src = presets::get("hiphop").unwrap();
    let ticks = run(src, 32);
    for step in 0..16 {
        assert_eq!(ticks[step].events, ticks[step + 16].events, "step {step}");
    }
}

#[test]
fn tracks_of_different_lengths_loop_on_their_own() {
    let src = "# Poly\nKick: X...............\nHiHat: x..\n";
    let ticks = run(src, 16);
    let hats: Vec<usize> = track_hits(&ticks, "HiHat").iter().map(|(s, _)| *s).collect();
    assert_eq!(hats, vec![0, 3, 6, 9, 12, 15]);
}

#[test]
fn chord_steps_carry_every_member() {
    let src = presets::get("pluckkeys").unwrap();
    let ticks = run(src, 1);
    let keys = track_hits(&ticks, "Keys");
    let (_, event) = keys.first().expect("keys play on step 0");
    match &event.hit {
        Hit::Pitched {
            frequencies_hz, ..
        } => {
            let expected: Vec<f64> = ["c4", "e4", "g4"]
                .iter()
                .filter_map(|n| note_to_frequency(n))
                .collect();
            assert_eq!(frequencies_hz.len(), 3);
            for (got, want) in frequencies_hz.iter().zip(expected) {
                assert_approx_eq!(*got, want, 1e-9);
            }
        }
        other => panic!("expected pitched hit, got {other:?}"),
    }
}

#[test]
fn editing_mid_bar_keeps_the_cursor() {
    let mut sequencer = StepSequencer::new();
    sequencer.start();
    for _ in 0..5 {
        sequencer.tick("# P\nKick: X...X...X...X...\n");
    }
    assert_eq!(sequencer.current_step(), 5);

    let tick = sequencer
        .tick("---\ntempo: 60\n---\n# P\nKick: .....X..........\n")
        .unwrap();
    assert_eq!(tick.step, 5);
    assert_eq!(tick.events.len(), 1);
    assert_eq!(tick.step_seconds, Some(0.25));
}

#[test]
fn half_typed_text_degrades_to_silence() {
    let mut sequencer = StepSequencer::new();
    sequencer.start();
    for partial in ["", "---\ntem", "---\ntempo: 120\n---\n# Pat", "# P\nKick"] {
        let tick = sequencer.tick(partial).unwrap();
        assert!(tick.events.is_empty(), "{partial:?}");
    }
    let tick = sequencer.tick("# P\nKick: X\n").unwrap();
    assert_eq!(tick.events.len(), 1);
}
