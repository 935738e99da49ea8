//! End-to-end decision flow over the embedded log and control channel.

use std::sync::Arc;

use director_core::command_channel::CommandPublisher;
use director_core::director::{Director, DirectorConfig, TickOutcome};
use director_core::event_log::{Cursor, EventPayload, InMemoryEventLog, SignalScore};
use director_core::scoring::PreferenceProfile;
use director_core::session_store::SessionStore;

const SESSION: &str = "studio-main";

struct World {
    log: Arc<InMemoryEventLog>,
    sessions: Arc<SessionStore>,
    publisher: Arc<CommandPublisher>,
    director: Director,
}

fn world() -> World {
    let log = Arc::new(InMemoryEventLog::new());
    let sessions = Arc::new(SessionStore::new());
    let publisher = Arc::new(CommandPublisher::new());
    let director = Director::new(
        log.clone(),
        sessions.clone(),
        publisher.clone(),
        DirectorConfig::default(),
    );
    World {
        log,
        sessions,
        publisher,
        director,
    }
}

fn sound_only() -> PreferenceProfile {
    PreferenceProfile {
        motion: 0.0,
        sound: 1.0,
        gaze: 0.0,
        gesture: 0.0,
        interval: 0.0,
    }
}

fn sound_event(camera_id: i64, sound_score: f64) -> EventPayload {
    EventPayload {
        camera_id,
        motion_score: 0.0,
        sound_score,
        gaze: None,
        gesture: None,
    }
}

#[tokio::test]
async fn full_session_lifecycle() {
    let w = world();
    let (_id, mut commands) = w.publisher.subscribe(SESSION).await;

    // fresh session, sound-dominant profile
    w.sessions.set_profile(SESSION, sound_only()).await.unwrap();

    // first batch: camera 2 is the loudest
    w.log.append(SESSION, sound_event(1, 0.2)).await;
    w.log.append(SESSION, sound_event(2, 0.9)).await;
    assert_eq!(
        w.director.tick(SESSION).await.unwrap(),
        TickOutcome::Switched { camera_id: 2 }
    );

    let json = commands.recv().await.unwrap();
    let command: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(command["type"], "switch_to_camera");
    assert_eq!(command["target_camera_id"], 2);
    assert_eq!(command["transition"], "cut");
    assert_eq!(command["min_duration_ms"], 1500);

    // immediate louder challenger loses to the debounce window
    w.log.append(SESSION, sound_event(1, 0.95)).await;
    assert_eq!(
        w.director.tick(SESSION).await.unwrap(),
        TickOutcome::Suppressed
    );
    let state = w.sessions.get(SESSION).await.unwrap();
    assert_eq!(state.current_camera, Some(2));
    assert_eq!(state.cursor, Cursor(3));
    assert!(commands.try_recv().is_err());

    // once the window has passed, the challenger takes program
    {
        let entry = w.sessions.entry(SESSION).await.unwrap();
        entry.lock().await.last_switch_at_ms -= 2_000;
    }
    w.log.append(SESSION, sound_event(1, 0.95)).await;
    assert_eq!(
        w.director.tick(SESSION).await.unwrap(),
        TickOutcome::Switched { camera_id: 1 }
    );
    let json = commands.recv().await.unwrap();
    let command: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(command["target_camera_id"], 1);

    // quiet log: tick is idle, cursor stays put
    let before = w.sessions.get(SESSION).await.unwrap().cursor;
    assert_eq!(w.director.tick(SESSION).await.unwrap(), TickOutcome::Idle);
    assert_eq!(w.sessions.get(SESSION).await.unwrap().cursor, before);
}

#[tokio::test]
async fn first_tick_without_profile_uses_defaults() {
    let w = world();

    // default profile is sound-dominant, so the louder camera wins even
    // though no profile was ever installed
    w.log.append(SESSION, sound_event(4, 0.1)).await;
    w.log.append(SESSION, sound_event(7, 0.8)).await;

    assert_eq!(
        w.director.tick(SESSION).await.unwrap(),
        TickOutcome::Switched { camera_id: 7 }
    );

    let state = w.sessions.get(SESSION).await.unwrap();
    assert_eq!(state.profile, PreferenceProfile::default());
}

#[tokio::test]
async fn profile_hot_swap_takes_effect_next_tick() {
    let w = world();
    w.sessions.set_profile(SESSION, sound_only()).await.unwrap();

    w.log.append(SESSION, sound_event(1, 0.9)).await;
    assert_eq!(
        w.director.tick(SESSION).await.unwrap(),
        TickOutcome::Switched { camera_id: 1 }
    );

    // swap to a gaze-only profile; camera 2 carries the gaze signal
    let gaze_only = PreferenceProfile {
        motion: 0.0,
        sound: 0.0,
        gaze: 1.0,
        gesture: 0.0,
        interval: 0.0,
    };
    w.sessions.set_profile(SESSION, gaze_only).await.unwrap();

    {
        let entry = w.sessions.entry(SESSION).await.unwrap();
        entry.lock().await.last_switch_at_ms -= 2_000;
    }
    w.log.append(SESSION, sound_event(1, 0.99)).await;
    w.log
        .append(
            SESSION,
            EventPayload {
                camera_id: 2,
                motion_score: 0.0,
                sound_score: 0.0,
                gaze: Some(SignalScore { score: 0.5 }),
                gesture: None,
            },
        )
        .await;

    assert_eq!(
        w.director.tick(SESSION).await.unwrap(),
        TickOutcome::Switched { camera_id: 2 }
    );
}

#[tokio::test]
async fn sessions_are_fully_independent() {
    let w = world();
    w.sessions.set_profile("north", sound_only()).await.unwrap();
    w.sessions.set_profile("south", sound_only()).await.unwrap();

    let (_n, mut north_rx) = w.publisher.subscribe("north").await;
    let (_s, mut south_rx) = w.publisher.subscribe("south").await;

    w.log.append("north", sound_event(1, 0.9)).await;
    w.log.append("south", sound_event(2, 0.9)).await;

    assert_eq!(
        w.director.tick("north").await.unwrap(),
        TickOutcome::Switched { camera_id: 1 }
    );
    assert_eq!(
        w.director.tick("south").await.unwrap(),
        TickOutcome::Switched { camera_id: 2 }
    );

    let north: serde_json::Value =
        serde_json::from_str(&north_rx.recv().await.unwrap()).unwrap();
    let south: serde_json::Value =
        serde_json::from_str(&south_rx.recv().await.unwrap()).unwrap();
    assert_eq!(north["target_camera_id"], 1);
    assert_eq!(south["target_camera_id"], 2);

    // a switch in one session never leaks into the other channel
    assert!(north_rx.try_recv().is_err());
    assert!(south_rx.try_recv().is_err());

    let north_state = w.sessions.get("north").await.unwrap();
    let south_state = w.sessions.get("south").await.unwrap();
    assert_eq!(north_state.cursor, Cursor(1));
    assert_eq!(south_state.cursor, Cursor(1));
}
