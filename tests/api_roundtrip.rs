use std::sync::Arc;
use std::time::Duration;

use quicktune::server::{self, Catalog, ServerState};
use quicktune::store::MemoryStorage;
use quicktune::{AppError, GenerationFlow, Store, TrackApi, TrackClient};
use url::Url;

async fn spawn_backend(delay: Duration) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(listener, ServerState::new(delay)));
    Url::parse(&format!("http://{}/api", addr)).unwrap()
}

fn client(base: Url, timeout: Duration) -> TrackClient {
    TrackClient::new(base, timeout).unwrap()
}

#[tokio::test]
async fn test_lists_and_health() {
    let base = spawn_backend(Duration::ZERO).await;
    let client = client(base, Duration::from_secs(10));

    assert_eq!(
        client.get_moods().await.unwrap(),
        vec!["Happy", "Sad", "Energetic", "Chill"]
    );
    assert_eq!(
        client.get_genres().await.unwrap(),
        vec!["Pop", "Lo-fi", "Cinematic", "EDM"]
    );
    assert_eq!(client.health_check().await.unwrap().status, "OK");
}

#[tokio::test]
async fn test_generate_happy_pop_through_flow() {
    let base = spawn_backend(Duration::from_millis(50)).await;
    let store = Arc::new(Store::open(Box::new(MemoryStorage::new())));
    let mut flow = GenerationFlow::new(
        client(base, Duration::from_secs(10)),
        Arc::clone(&store),
    );

    flow.select_mood("Happy");
    flow.select_genre("Pop");
    let track = flow.generate().await.unwrap();

    assert_eq!(track.mood, "Happy");
    assert_eq!(track.genre, "Pop");
    assert!(Catalog::default().sample_ids().all(|id| id != track.id));

    let state = store.snapshot();
    assert_eq!(state.current_track.as_ref().map(|t| t.id), Some(track.id));
    assert_eq!(state.recent_tracks.len(), 1);
    assert!(!state.is_generating);
}

#[tokio::test]
async fn test_unmatched_pair_uses_fallback_category() {
    let base = spawn_backend(Duration::ZERO).await;
    let track = client(base, Duration::from_secs(10))
        .generate_track("Chill", "EDM")
        .await
        .unwrap();

    assert_eq!(track.mood, "Happy");
    assert_eq!(track.genre, "Pop");
}

#[tokio::test]
async fn test_timeout_leaves_track_state_unchanged() {
    let base = spawn_backend(Duration::from_secs(5)).await;
    let store = Arc::new(Store::open(Box::new(MemoryStorage::new())));
    let mut flow = GenerationFlow::new(
        client(base, Duration::from_millis(200)),
        Arc::clone(&store),
    );

    flow.select_mood("Sad");
    flow.select_genre("Lo-fi");
    let result = flow.generate().await;

    assert!(matches!(result, Err(AppError::Http(ref e)) if e.is_timeout()));
    let state = store.snapshot();
    assert!(state.current_track.is_none());
    assert!(state.recent_tracks.is_empty());
    assert!(!state.is_generating);
}

#[tokio::test]
async fn test_bad_request_body_is_an_api_error() {
    let base = spawn_backend(Duration::ZERO).await;
    let response = reqwest::Client::new()
        .post(format!("{}/generate", base.as_str().trim_end_matches('/')))
        .json(&serde_json::json!({"mood": "Happy"}))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
