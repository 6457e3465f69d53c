//! Integration tests - command dispatch and the transition table
//!
//! Drives the engine with a scripted transport and verifies the externally
//! observable contract: event order, guarded no-ops, and transport calls.

mod helpers;

use audiocast_common::events::{PlaybackState, PlayerEvent};
use audiocast_player::engine::{Command, PlayRequest};
use audiocast_player::transport::TransportEvent;
use helpers::TestEngine;

#[tokio::test]
async fn play_from_idle_walks_full_lifecycle() {
    let mut engine = TestEngine::start();

    assert!(engine.handle.command(Command::Play(PlayRequest {
        stream_url: Some("http://radio.example/live".to_string()),
        title: Some("Example Radio".to_string()),
        ..Default::default()
    })));

    // Metadata first, then each lifecycle state in order.
    let mut seen = Vec::new();
    loop {
        match engine.next_event().await {
            PlayerEvent::MetadataChanged { track, .. } => {
                seen.push(format!("metadata:{}", track.stream_url))
            }
            PlayerEvent::StateChanged { state, .. } => {
                seen.push(format!("state:{}", state));
                if state == PlaybackState::Preparing {
                    engine.transport.emit(TransportEvent::Prepared);
                }
                if state == PlaybackState::Started {
                    break;
                }
            }
            _ => {}
        }
    }
    assert_eq!(
        seen,
        vec![
            "metadata:http://radio.example/live",
            "state:initialized",
            "state:preparing",
            "state:prepared",
            "state:started",
        ]
    );

    // One acquire of each exclusive resource.
    assert_eq!(engine.host.focus_acquires(), 1);
    assert_eq!(engine.host.lock_acquires(), 1);
    assert_eq!(engine.host.focus_releases(), 0);

    // Transport saw exactly the legal call sequence.
    let calls = engine.transport.calls();
    assert_eq!(
        calls,
        vec!["set_source:http://radio.example/live", "prepare", "start"]
    );
}

#[tokio::test]
async fn out_of_table_commands_are_noops() {
    let mut engine = TestEngine::start();

    // None of these are legal from Idle.
    engine.handle.command(Command::Pause);
    engine.handle.command(Command::Stop);
    engine.handle.command(Command::Seek { position_ms: 1000 });

    // Probe: volume commands always answer, and ordering guarantees the
    // commands above were already processed.
    engine.handle.command(Command::SetVolume { volume: 0.7 });
    engine.wait_for_event("VolumeChanged").await;

    assert_eq!(engine.shared.playback_state(), PlaybackState::Idle);
    // The transport never saw the rejected lifecycle calls.
    let calls = engine.transport.calls();
    assert!(
        calls.iter().all(|c| c.starts_with("set_volume")),
        "unexpected transport calls: {:?}",
        calls
    );
}

#[tokio::test]
async fn play_toggle_cycles_between_started_and_paused() {
    let mut engine = TestEngine::start();
    engine.play_until_started("http://radio.example/live").await;

    engine.handle.command(Command::PlayToggle);
    engine.wait_for_state(PlaybackState::Paused).await;

    engine.handle.command(Command::PlayToggle);
    engine.wait_for_state(PlaybackState::Started).await;
}

#[tokio::test]
async fn play_toggle_from_stopped_prepares_with_autoplay() {
    let mut engine = TestEngine::start();
    engine.play_until_started("http://radio.example/live").await;

    engine.handle.command(Command::Stop);
    engine.wait_for_state(PlaybackState::Stopped).await;
    engine.transport.clear_calls();

    engine.handle.command(Command::PlayToggle);
    engine.wait_for_state(PlaybackState::Preparing).await;

    engine.transport.emit(TransportEvent::Prepared);
    engine.wait_for_state(PlaybackState::Started).await;
    assert_eq!(engine.transport.calls(), vec!["prepare", "start"]);
}

#[tokio::test]
async fn negative_seek_clamps_to_zero() {
    let mut engine = TestEngine::start();
    engine.play_until_started("http://radio.example/live").await;

    // Pause first so the position sampler cannot race the seek
    // acknowledgement for the next PositionChanged event.
    engine.handle.command(Command::Pause);
    engine.wait_for_state(PlaybackState::Paused).await;
    engine.transport.clear_calls();

    engine.handle.command(Command::Seek { position_ms: -50 });
    engine.transport.wait_for_call("seek:0").await;
}

#[tokio::test]
async fn seek_by_applies_delta_to_transport_position() {
    let mut engine = TestEngine::start();
    engine.play_until_started("http://radio.example/live").await;

    engine.handle.command(Command::Pause);
    engine.wait_for_state(PlaybackState::Paused).await;
    engine.transport.set_position(10_000);
    engine.transport.clear_calls();

    engine.handle.command(Command::SeekBy { delta_ms: -4_000 });
    engine.transport.wait_for_call("seek:6000").await;

    engine.handle.command(Command::SeekBy { delta_ms: 2_500 });
    engine.transport.wait_for_call("seek:8500").await;
}

#[tokio::test]
async fn same_url_play_is_resume_only_start() {
    let mut engine = TestEngine::start();
    engine.play_until_started("http://radio.example/live").await;

    engine.handle.command(Command::Pause);
    engine.wait_for_state(PlaybackState::Paused).await;
    engine.transport.clear_calls();

    engine
        .handle
        .command(Command::Play(PlayRequest::for_url("http://radio.example/live")));
    engine.wait_for_state(PlaybackState::Started).await;

    // No re-source, no re-prepare: just a start on the existing transport.
    assert_eq!(engine.transport.calls(), vec!["start"]);
}

#[tokio::test]
async fn metadata_changed_only_when_snapshot_differs() {
    let mut engine = TestEngine::start();

    let request = PlayRequest {
        stream_url: Some("http://radio.example/live".to_string()),
        title: Some("Example Radio".to_string()),
        ..Default::default()
    };

    engine.handle.command(Command::Play(request.clone()));
    engine.wait_for_state(PlaybackState::Preparing).await;
    engine.transport.emit(TransportEvent::Prepared);
    engine.wait_for_state(PlaybackState::Started).await;

    // Re-play the identical request: same stream, same metadata.
    engine.handle.command(Command::Play(request));
    engine.wait_for_state(PlaybackState::Started).await;

    // Drain what the second play produced; none of it may be metadata.
    engine.handle.command(Command::SetVolume { volume: 0.9 });
    loop {
        let event = engine.next_event().await;
        assert_ne!(event.event_type(), "MetadataChanged");
        if event.event_type() == "VolumeChanged" {
            break;
        }
    }
}

#[tokio::test]
async fn new_url_cancels_inflight_prepare() {
    let mut engine = TestEngine::start();

    engine
        .handle
        .command(Command::Play(PlayRequest::for_url("http://radio.example/a")));
    engine.wait_for_state(PlaybackState::Preparing).await;
    engine.transport.clear_calls();

    // Different stream while the first prepare is still in flight.
    engine
        .handle
        .command(Command::Play(PlayRequest::for_url("http://radio.example/b")));
    engine.wait_for_state(PlaybackState::Preparing).await;

    let calls = engine.transport.calls();
    assert_eq!(
        calls,
        vec!["reset", "set_source:http://radio.example/b", "prepare"]
    );

    engine.transport.emit(TransportEvent::Prepared);
    engine.wait_for_state(PlaybackState::Started).await;
    assert_eq!(
        engine.shared.track().unwrap().stream_url,
        "http://radio.example/b"
    );
}

#[tokio::test]
async fn stop_during_prepare_cancels_autoplay() {
    let mut engine = TestEngine::start();

    engine
        .handle
        .command(Command::Play(PlayRequest::for_url("http://radio.example/a")));
    engine.wait_for_state(PlaybackState::Preparing).await;

    engine.handle.command(Command::Stop);
    engine.wait_for_state(PlaybackState::Idle).await;

    // A compliant transport discards the pending prepared callback on
    // reset; nothing may start on its own afterwards.
    assert_eq!(engine.shared.playback_state(), PlaybackState::Idle);
    assert_eq!(engine.host.focus_acquires(), 0);
}

#[tokio::test]
async fn failed_set_source_lands_in_error_state() {
    let mut engine = TestEngine::start();
    engine.transport.fail_next_set_source(true);

    engine
        .handle
        .command(Command::Play(PlayRequest::for_url("http://radio.example/bad")));
    engine.wait_for_state(PlaybackState::Error).await;

    // No prepare was issued after the failure.
    assert_eq!(engine.transport.call_count("prepare"), 0);
}

#[tokio::test]
async fn transport_error_releases_resources() {
    let mut engine = TestEngine::start();
    engine.play_until_started("http://radio.example/live").await;

    engine.transport.emit(TransportEvent::Error {
        reason: "decoder died".to_string(),
    });
    engine.wait_for_state(PlaybackState::Error).await;

    assert_eq!(engine.host.focus_releases(), 1);
    assert_eq!(engine.host.lock_releases(), 1);
}

#[tokio::test]
async fn completion_transitions_and_allows_replay() {
    let mut engine = TestEngine::start();
    engine.play_until_started("http://radio.example/show").await;

    engine.transport.emit(TransportEvent::Completed);
    engine.wait_for_state(PlaybackState::Completed).await;
    assert_eq!(engine.host.focus_releases(), 1);
    engine.transport.clear_calls();

    // Start is legal from Completed (replay without re-prepare).
    engine.handle.command(Command::PlayToggle);
    engine.wait_for_state(PlaybackState::Started).await;
    assert_eq!(engine.transport.calls(), vec!["start"]);
    assert_eq!(engine.host.focus_acquires(), 2);
}

#[tokio::test]
async fn buffering_callbacks_surface_without_state_change() {
    let mut engine = TestEngine::start();

    engine
        .handle
        .command(Command::Play(PlayRequest::for_url("http://radio.example/live")));
    engine.wait_for_state(PlaybackState::Preparing).await;

    engine.transport.emit(TransportEvent::Buffering { percent: 40 });
    let event = engine.wait_for_event("BufferingChanged").await;
    match event {
        PlayerEvent::BufferingChanged { percent, .. } => assert_eq!(percent, 40),
        _ => unreachable!(),
    }
    assert_eq!(engine.shared.playback_state(), PlaybackState::Preparing);
}
