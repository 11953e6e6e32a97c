//! Integration tests for the on-demand path: queue session over the real
//! mixer, including rendered auto-advance.

mod helpers;

use briefcast_ap::audio::mixer::{Mixer, MixerHandle, MixerNotice};
use briefcast_ap::audio::types::AudioFrame;
use briefcast_ap::error::Error;
use briefcast_ap::queue::QueueSession;
use briefcast_ap::state::SharedState;
use briefcast_common::events::PlaybackState;
use helpers::{topic, ScriptedTracks, TEST_RATE};
use std::sync::Arc;

fn make_session(
    tracks: ScriptedTracks,
) -> (Arc<QueueSession>, MixerHandle, Arc<SharedState>) {
    let mixer = MixerHandle::new(Mixer::new(TEST_RATE));
    let state = Arc::new(SharedState::default());
    let session = Arc::new(QueueSession::new(
        mixer.clone(),
        Arc::new(tracks),
        Arc::clone(&state),
    ));
    (session, mixer, state)
}

fn render(mixer: &MixerHandle, frames: usize) -> (Vec<AudioFrame>, Vec<MixerNotice>) {
    let mut out = vec![AudioFrame::zero(); frames];
    let notices = mixer.render(&mut out);
    (out, notices)
}

/// Queue `[T1 ready, T2 not ready, T3 ready]`: advancing from T1 skips
/// T2 and lands on T3 (the chosen not-ready policy).
#[tokio::test]
async fn test_advance_skips_not_ready_topic() {
    let (session, _, state) = make_session(ScriptedTracks::new(1.0));
    session
        .set_queue(vec![
            topic("t1", 0, true),
            topic("t2", 1, false),
            topic("t3", 2, true),
        ])
        .await;

    session.play_topic(&topic("t1", 0, true)).await.unwrap();
    let advanced = session.play_next_topic().await.unwrap();

    assert_eq!(advanced.unwrap().id, "t3");
    assert_eq!(state.current_topic().await.unwrap().id, "t3");
    assert!(!session.is_played("t2").await);
}

/// Direct selection of a not-ready topic is rejected.
#[tokio::test]
async fn test_not_ready_selection_rejected() {
    let (session, _, state) = make_session(ScriptedTracks::new(1.0));
    session.set_queue(vec![topic("t2", 1, false)]).await;

    let result = session.play_topic(&topic("t2", 1, false)).await;
    assert!(matches!(result, Err(Error::NotReady(_))));
    assert!(state.current_topic().await.is_none());
}

/// Playing the current topic again toggles play/pause and never resets
/// the position to zero.
#[tokio::test]
async fn test_replay_toggles_without_position_reset() {
    let (session, mixer, state) = make_session(ScriptedTracks::new(1.0));
    session.set_queue(vec![topic("t1", 0, true)]).await;

    let t1 = topic("t1", 0, true);
    session.play_topic(&t1).await.unwrap();
    render(&mixer, 300);
    let position = mixer.position_seconds();
    assert!(position > 0.25);

    session.play_topic(&t1).await.unwrap(); // pause
    assert_eq!(state.playback_state().await, PlaybackState::Paused);
    assert!((mixer.position_seconds() - position).abs() < 1e-9);

    session.play_topic(&t1).await.unwrap(); // resume
    assert_eq!(state.playback_state().await, PlaybackState::Playing);
    assert!((mixer.position_seconds() - position).abs() < 1e-9);
}

/// Natural completion auto-advances exactly once, and the next track is
/// audible after the switch.
#[tokio::test]
async fn test_rendered_auto_advance_chain() {
    let (session, mixer, state) = make_session(ScriptedTracks::new(0.1));
    session
        .set_queue(vec![topic("a", 0, true), topic("b", 1, true)])
        .await;
    session.play_topic(&topic("a", 0, true)).await.unwrap();

    // Render past the end of track a
    let (_, notices) = render(&mixer, 150);
    assert_eq!(notices.len(), 1);
    match &notices[0] {
        MixerNotice::TrackCompleted {
            topic_id,
            duration_seconds,
        } => {
            assert_eq!(topic_id, "a");
            assert!((duration_seconds - 0.1).abs() < 1e-9);
        }
    }

    // Route the completion as the player glue does
    match &notices[0] {
        MixerNotice::TrackCompleted {
            topic_id,
            duration_seconds,
        } => session.on_track_completed(topic_id, *duration_seconds).await,
    }

    assert_eq!(state.current_topic().await.unwrap().id, "b");
    assert_eq!(state.playback_state().await, PlaybackState::Playing);

    // Track b starts from zero and is audible
    assert_eq!(mixer.loaded_topic_id().as_deref(), Some("b"));
    let (out, notices) = render(&mixer, 50);
    assert!(notices.is_empty());
    assert!(out.iter().all(|f| (f.left - 0.2).abs() < 1e-6));
}

/// Completion with no ready successor drops the state to Paused.
#[tokio::test]
async fn test_completion_at_queue_end_pauses() {
    let (session, mixer, state) = make_session(ScriptedTracks::new(0.1));
    session.set_queue(vec![topic("a", 0, true)]).await;
    session.play_topic(&topic("a", 0, true)).await.unwrap();

    let (_, notices) = render(&mixer, 150);
    assert_eq!(notices.len(), 1);
    session.on_track_completed("a", 0.1).await;

    assert_eq!(state.playback_state().await, PlaybackState::Paused);
    // No duplicate completion on further rendering
    let (_, notices) = render(&mixer, 150);
    assert!(notices.is_empty());
}

/// A failing resource switch advances the queue position but reports a
/// paused state and surfaces the error to the caller.
#[tokio::test]
async fn test_resource_switch_failure_semantics() {
    let (session, mixer, state) =
        make_session(ScriptedTracks::new(1.0).failing_for("b"));
    session
        .set_queue(vec![topic("a", 0, true), topic("b", 1, true)])
        .await;

    session.play_topic(&topic("a", 0, true)).await.unwrap();
    let result = session.play_topic(&topic("b", 1, true)).await;

    assert!(matches!(result, Err(Error::ResourceSwitch(_))));
    assert_eq!(state.current_topic().await.unwrap().id, "b");
    assert!(session.is_played("b").await);
    assert_eq!(state.playback_state().await, PlaybackState::Paused);

    // Retrying the same topic attempts the switch again rather than
    // toggling the stale track
    let retry = session.play_topic(&topic("b", 1, true)).await;
    assert!(matches!(retry, Err(Error::ResourceSwitch(_))));
    assert_eq!(mixer.loaded_topic_id().as_deref(), Some("a"));
}

/// Feed re-deliveries that reorder the queue keep the current topic
/// anchored by id, and the projections follow the new ordering.
#[tokio::test]
async fn test_requeue_relocates_current() {
    let (session, _, state) = make_session(ScriptedTracks::new(1.0));
    session
        .set_queue(vec![topic("a", 0, true), topic("b", 1, true)])
        .await;
    session.play_topic(&topic("b", 1, true)).await.unwrap();

    // Superset arrives with b no longer last
    session
        .set_queue(vec![
            topic("a", 0, true),
            topic("b", 1, true),
            topic("c", 2, true),
        ])
        .await;

    assert_eq!(state.current_topic().await.unwrap().id, "b");
    assert_eq!(session.playback_queue_ids().await, vec!["c".to_string()]);
    assert_eq!(session.played_topic_ids().await, vec!["a".to_string()]);
}
