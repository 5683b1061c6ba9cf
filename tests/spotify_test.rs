use std::time::Duration;

use playgen::{
    Error,
    http::ClientConfig,
    matching::{TrackMatcher, TrackProvider, TrackSearcher},
    spotify::{SpotifyClient, playlists},
    types::QuerySong,
};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

fn spotify(server: &MockServer) -> SpotifyClient {
    let config = ClientConfig {
        base_url: server.uri(),
        min_wait: Duration::from_millis(1),
        max_wait: Duration::from_millis(10),
        ..ClientConfig::default()
    };
    SpotifyClient::new(config, "test-token").unwrap()
}

fn track_json(id: &str, name: &str, artist: &str, album: &str, album_type: &str) -> Value {
    json!({
        "id": id,
        "uri": format!("spotify:track:{id}"),
        "name": name,
        "popularity": 50,
        "album": { "id": format!("{id}-album"), "name": album, "album_type": album_type },
        "artists": [{ "id": format!("{id}-artist"), "name": artist }]
    })
}

fn search_body(items: Vec<Value>) -> Value {
    json!({ "tracks": { "total": items.len(), "items": items, "limit": 20, "offset": 0 } })
}

#[tokio::test]
async fn test_search_track_sends_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("type", "track"))
        .and(query_param("q", "track:yellow artist:coldplay album:parachutes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(vec![track_json(
            "3AJwUDP919kvQ9QcozQPxg",
            "Yellow",
            "Coldplay",
            "Parachutes",
            "album",
        )])))
        .expect(1)
        .mount(&server)
        .await;

    let response = spotify(&server)
        .search_track(&CancellationToken::new(), "coldplay", "yellow", "parachutes")
        .await
        .unwrap();

    assert_eq!(response.tracks.total, 1);
    assert_eq!(response.tracks.items[0].name, "Yellow");
    assert_eq!(response.tracks.items[0].artist_names(), "Coldplay");
}

#[tokio::test]
async fn test_search_track_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid access token"))
        .expect(1)
        .mount(&server)
        .await;

    let result = spotify(&server)
        .search_track(&CancellationToken::new(), "coldplay", "yellow", "")
        .await;

    assert!(matches!(result, Err(Error::Rejected { status, .. }) if status.as_u16() == 401));
}

#[tokio::test]
async fn test_provider_falls_back_to_search_without_album() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "track:yellow artist:coldplay album:radio hits 2000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(Vec::new())))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "track:yellow artist:coldplay"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(vec![
            track_json("live", "Yellow - Live", "Coldplay", "Live 2003", "album"),
            track_json("studio", "Yellow", "Coldplay", "Parachutes", "album"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let provider = TrackProvider::new(spotify(&server), TrackMatcher::default());
    let song = QuerySong::new("Coldplay", "Yellow", "Radio Hits 2000");

    let found = provider
        .get_track(&CancellationToken::new(), &song)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(found.track_id, "studio");
    assert_eq!(found.track_uri, "spotify:track:studio");
}

fn playlist_page(total: usize, offset: usize, count: usize) -> Value {
    let items: Vec<Value> = (offset..offset + count)
        .map(|n| {
            if n == 7 {
                // local files come back without a track
                json!({ "track": null })
            } else {
                json!({
                    "added_at": "2024-05-01T00:00:00Z",
                    "track": {
                        "id": format!("t{n}"),
                        "uri": format!("spotify:track:t{n}"),
                        "name": format!("Track {n}"),
                        "artists": [{ "id": "a", "name": "Artist" }]
                    }
                })
            }
        })
        .collect();

    json!({ "total": total, "limit": 50, "offset": offset, "items": items })
}

#[tokio::test]
async fn test_get_all_playlist_tracks() {
    let server = MockServer::start().await;
    for (offset, count) in [(0, 50), (50, 50), (100, 20)] {
        Mock::given(method("GET"))
            .and(path("/playlists/37i9dQZF1DXcBWIGoYBM5M/tracks"))
            .and(query_param("offset", offset.to_string()))
            .and(query_param("limit", "50"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(playlist_page(120, offset, count)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let tracks = playlists::get_all_playlist_tracks(
        &CancellationToken::new(),
        spotify(&server),
        "37i9dQZF1DXcBWIGoYBM5M",
    )
    .await
    .unwrap();

    assert_eq!(tracks.len(), 119);
    let mut ids: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 119);
    assert!(!ids.contains(&"t7"));
}

#[tokio::test]
async fn test_get_all_playlist_tracks_failing_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(playlist_page(120, 0, 50)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("offset", "50"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("offset", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(playlist_page(120, 100, 20)))
        .mount(&server)
        .await;

    let result =
        playlists::get_all_playlist_tracks(&CancellationToken::new(), spotify(&server), "p1")
            .await;

    assert!(matches!(result, Err(Error::Rejected { .. })));
}
