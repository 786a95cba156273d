use mesixstore::{MediaStore, StoreEvent, Track};
use serde_json::{json, Map, Value};
use std::sync::Arc;

fn track(path: &str, title: &str, artist: &str) -> Track {
    let mut t = Track::new(path);
    t.title = Some(title.to_string());
    t.artist = Some(artist.to_string());
    t
}

fn store_with_fixtures() -> MediaStore {
    let store = MediaStore::new("/tmp/none", vec!["mp3".into()]);
    store.upsert(track("/m/a.mp3", "Alpha", "Ann"));
    store.upsert(track("/m/b.mp3", "Beta", "Ann"));
    store.upsert(track("/m/c.mp3", "Gamma", "Carl"));
    store
}

#[test]
fn test_upsert_and_lookup() {
    let store = store_with_fixtures();

    let found = store.lookup("/m/a.mp3").unwrap();
    assert_eq!(found.title.as_deref(), Some("Alpha"));
    assert!(store.lookup("/m/missing.mp3").is_none());

    // Upsert du même chemin = remplacement, pas de doublon
    store.upsert(track("/m/a.mp3", "Alpha (remaster)", "Ann"));
    assert_eq!(store.len(), 3);
    assert_eq!(
        store.lookup("/m/a.mp3").unwrap().title.as_deref(),
        Some("Alpha (remaster)")
    );
}

#[test]
fn test_library_sorted_by_path() {
    let store = store_with_fixtures();
    let library = store.library();

    let paths: Vec<&str> = library.iter().map(|t| t.path.as_str()).collect();
    assert_eq!(paths, vec!["/m/a.mp3", "/m/b.mp3", "/m/c.mp3"]);
}

#[test]
fn test_filter_unique_values() {
    let store = store_with_fixtures();

    let artists = store.filter("artist", &Map::new(), false);
    assert_eq!(artists, json!(["Ann", "Carl"]));
}

#[test]
fn test_filter_with_query() {
    let store = store_with_fixtures();

    let mut query = Map::new();
    query.insert("artist".into(), Value::String("Ann".into()));

    let titles = store.filter("title", &query, false);
    assert_eq!(titles, json!(["Alpha", "Beta"]));

    // all=true retourne les documents complets
    let full = store.filter("title", &query, true);
    let docs = full.as_array().unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["path"], json!("/m/a.mp3"));
    assert_eq!(docs[0]["artist"], json!("Ann"));
}

#[tokio::test]
async fn test_upsert_notifies_subscribers() {
    let store = store_with_fixtures();
    let mut events = store.subscribe();

    store.upsert(track("/m/d.mp3", "Delta", "Dee"));

    let StoreEvent::TrackUpserted(received) = events.recv().await.unwrap();
    assert_eq!(received.path, "/m/d.mp3");
    assert_eq!(received.title.as_deref(), Some("Delta"));
}

#[tokio::test]
async fn test_add_folder_scans_recursively() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("album");
    std::fs::create_dir(&sub).unwrap();

    // Fichiers factices : illisibles par lofty, indexés quand même avec le
    // nom de fichier comme titre
    std::fs::write(dir.path().join("one.mp3"), b"not really audio").unwrap();
    std::fs::write(sub.join("two.mp3"), b"not really audio").unwrap();
    std::fs::write(sub.join("cover.jpg"), b"not audio at all").unwrap();

    let store = Arc::new(MediaStore::new(dir.path(), vec!["mp3".into()]));
    let count = store.add_folder(None).await.unwrap();

    assert_eq!(count, 2);
    assert_eq!(store.len(), 2);

    let two = store
        .lookup(&sub.join("two.mp3").to_string_lossy())
        .unwrap();
    assert_eq!(two.title.as_deref(), Some("two"));
}

#[tokio::test]
async fn test_add_folder_missing_directory() {
    let store = Arc::new(MediaStore::new("/tmp/none", vec!["mp3".into()]));
    let err = store
        .add_folder(Some("/definitely/not/a/folder".into()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Folder not found"));
}

#[tokio::test]
async fn test_extension_filtering_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("loud.MP3"), b"x").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

    let store = Arc::new(MediaStore::new(dir.path(), vec!["mp3".into()]));
    let count = store.add_folder(None).await.unwrap();
    assert_eq!(count, 1);
}
