use async_trait::async_trait;
use mesixcontrol::{
    BroadcastHub, Error, PlaybackController, PlaybackPhase, PlayerProcess, PlayerSpawner,
};
use mesixstore::Track;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Fabrique factice : journalise les spawn/terminate pour vérifier
/// l'ordonnancement des processus externes
struct MockSpawner {
    log: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl MockSpawner {
    fn new() -> (Arc<Self>, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        (
            Arc::new(Self {
                log: log.clone(),
                fail: false,
            }),
            log,
        )
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            log: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        })
    }
}

struct MockProcess {
    path: String,
    log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl PlayerSpawner for MockSpawner {
    async fn spawn(&self, path: &str) -> mesixcontrol::Result<Box<dyn PlayerProcess>> {
        if self.fail {
            return Err(Error::SpawnFailed("mock refuses to start".to_string()));
        }
        self.log.lock().unwrap().push(format!("spawn {path}"));
        Ok(Box::new(MockProcess {
            path: path.to_string(),
            log: self.log.clone(),
        }))
    }
}

#[async_trait]
impl PlayerProcess for MockProcess {
    async fn send_command(&mut self, cmd: &str) -> mesixcontrol::Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("cmd {} {}", self.path, cmd));
        Ok(())
    }

    async fn terminate(self: Box<Self>) {
        self.log
            .lock()
            .unwrap()
            .push(format!("terminate {}", self.path));
    }
}

fn track(path: &str) -> Track {
    let mut t = Track::new(path);
    t.title = Some("Test".to_string());
    t
}

fn engine() -> (Arc<BroadcastHub>, Arc<PlaybackController>, Arc<Mutex<Vec<String>>>) {
    let hub = Arc::new(BroadcastHub::new());
    let (spawner, log) = MockSpawner::new();
    let controller = Arc::new(PlaybackController::new(hub.clone(), spawner));
    (hub, controller, log)
}

/// Inscrit une session et retourne son flux de trames désérialisées
fn connect(hub: &BroadcastHub) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    hub.register(Uuid::new_v4(), tx);
    rx
}

fn next_frame(rx: &mut mpsc::UnboundedReceiver<String>) -> Value {
    let frame = rx.try_recv().expect("expected a frame");
    serde_json::from_str(&frame).unwrap()
}

#[tokio::test]
async fn test_full_scenario_two_sessions() {
    let (hub, controller, _log) = engine();

    // S1 se connecte et reçoit l'état Idle complet
    let mut s1 = connect(&hub);
    assert_eq!(
        next_frame(&mut s1),
        serde_json::json!({"playing": false, "current": null})
    );

    let mut s2 = connect(&hub);
    let _ = next_frame(&mut s2);

    // play : les deux sessions reçoivent le même delta
    controller.play(track("/a.mp3")).await.unwrap();
    for rx in [&mut s1, &mut s2] {
        let frame = next_frame(rx);
        assert_eq!(frame["playing"], serde_json::json!(true));
        assert_eq!(frame["current"]["path"], serde_json::json!("/a.mp3"));
    }

    // pause : delta {"playing": false} seul, current inchangé
    controller.pause().await.unwrap();
    for rx in [&mut s1, &mut s2] {
        assert_eq!(next_frame(rx), serde_json::json!({"playing": false}));
    }

    // S1 meurt, S2 continue de recevoir
    drop(s1);
    controller.stop().await;
    let frame = next_frame(&mut s2);
    assert_eq!(frame["current"], serde_json::Value::Null);
    assert_eq!(hub.session_count(), 1);
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let (hub, controller, _log) = engine();
    let mut rx = connect(&hub);
    let _ = next_frame(&mut rx);

    controller.play(track("/a.mp3")).await.unwrap();
    let _ = next_frame(&mut rx);

    controller.stop().await;
    let _ = next_frame(&mut rx); // un seul delta d'arrêt

    controller.stop().await;
    assert!(rx.try_recv().is_err()); // deuxième stop : rien
    assert_eq!(controller.phase().await, PlaybackPhase::Idle);
}

#[tokio::test]
async fn test_no_process_overlap_on_replay() {
    let (_hub, controller, log) = engine();

    controller.play(track("/a.mp3")).await.unwrap();
    controller.play(track("/b.mp3")).await.unwrap();

    // Le processus de A doit être terminé avant que celui de B ne démarre
    let events = log.lock().unwrap().clone();
    assert_eq!(
        events,
        vec!["spawn /a.mp3", "terminate /a.mp3", "spawn /b.mp3"]
    );
}

#[tokio::test]
async fn test_spawn_failure_stays_idle() {
    let hub = Arc::new(BroadcastHub::new());
    let controller = Arc::new(PlaybackController::new(hub.clone(), MockSpawner::failing()));
    let mut rx = connect(&hub);
    let _ = next_frame(&mut rx);

    let err = controller.play(track("/a.mp3")).await.unwrap_err();
    assert!(matches!(err, Error::SpawnFailed(_)));
    assert_eq!(controller.phase().await, PlaybackPhase::Idle);

    // Pas de diffusion : l'état n'a pas changé
    assert!(rx.try_recv().is_err());
    assert_eq!(
        serde_json::to_value(hub.snapshot()).unwrap(),
        serde_json::json!({"playing": false, "current": null})
    );
}

#[tokio::test]
async fn test_pause_on_idle_is_invalid_state() {
    let (_hub, controller, _log) = engine();
    let err = controller.pause().await.unwrap_err();
    assert!(matches!(err, Error::InvalidState(_)));
}

#[tokio::test]
async fn test_pause_toggles_and_sends_command() {
    let (_hub, controller, log) = engine();

    controller.play(track("/a.mp3")).await.unwrap();
    controller.pause().await.unwrap();
    assert_eq!(controller.phase().await, PlaybackPhase::Paused);

    controller.pause().await.unwrap();
    assert_eq!(controller.phase().await, PlaybackPhase::Playing);

    let events = log.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "spawn /a.mp3",
            "cmd /a.mp3 pause",
            "cmd /a.mp3 pause"
        ]
    );
}

#[tokio::test]
async fn test_process_exit_recovery() {
    let (hub, controller, _log) = engine();
    let mut rx = connect(&hub);
    let _ = next_frame(&mut rx);

    controller.play(track("/a.mp3")).await.unwrap();
    let _ = next_frame(&mut rx);

    controller.notify_process_exited().await;
    assert_eq!(controller.phase().await, PlaybackPhase::Idle);
    assert_eq!(
        next_frame(&mut rx),
        serde_json::json!({"playing": false, "current": null})
    );

    // Une seconde notification est un no-op
    controller.notify_process_exited().await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_late_joiner_equals_folded_deltas() {
    let (hub, controller, _log) = engine();
    let mut early = connect(&hub);
    let mut folded = next_frame(&mut early); // état initial

    controller.play(track("/a.mp3")).await.unwrap();
    controller.pause().await.unwrap();
    controller.play(track("/b.mp3")).await.unwrap();

    // Replier tous les deltas reçus par la session de longue durée
    while let Ok(frame) = early.try_recv() {
        let delta: Value = serde_json::from_str(&frame).unwrap();
        let map = folded.as_object_mut().unwrap();
        for (key, value) in delta.as_object().unwrap() {
            map.insert(key.clone(), value.clone());
        }
    }

    // Une session tardive reçoit exactement cet état en première trame
    let mut late = connect(&hub);
    assert_eq!(next_frame(&mut late), folded);
}
