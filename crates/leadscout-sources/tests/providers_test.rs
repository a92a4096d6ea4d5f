//! HTTP-level tests for the source providers against a mock server.

use leadscout_core::{City, Niche, OsmConfig, PlacesConfig, Throttle};
use leadscout_sources::{OsmProvider, PlacesProvider, SourceError, SourceProvider};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn places_config(server: &MockServer) -> PlacesConfig {
    PlacesConfig {
        api_key: Some("test-key".to_string()),
        base_url: server.uri(),
        token_delay_ms: 0,
        min_text_results: 2,
        ..PlacesConfig::default()
    }
}

fn details(place_id: &str, website: Option<&str>) -> serde_json::Value {
    let mut result = json!({
        "place_id": place_id,
        "name": format!("Praxis {place_id}"),
        "formatted_address": "Hauptstraße 1, 89073 Ulm",
        "geometry": {"location": {"lat": 48.4, "lng": 9.99}},
        "url": format!("https://maps.google.com/?cid={place_id}"),
        "rating": 4.5,
        "user_ratings_total": 10
    });
    if let Some(site) = website {
        result["website"] = json!(site);
    }
    json!({"status": "OK", "result": result})
}

async fn mount_details(server: &MockServer, place_id: &str, website: Option<&str>) {
    Mock::given(method("GET"))
        .and(path("/place/details/json"))
        .and(query_param("place_id", place_id))
        .respond_with(ResponseTemplate::new(200).set_body_json(details(place_id, website)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_places_text_search_paginates_and_filters() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .and(query_param("pagetoken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [{"place_id": "C"}, {"place_id": "A"}]
        })))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .and(query_param("query", "Dentists in Ulm, Germany"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [{"place_id": "A"}, {"place_id": "B"}],
            "next_page_token": "page-2"
        })))
        .mount(&server)
        .await;

    mount_details(&server, "A", Some("https://praxis-a.de/?utm=1")).await;
    mount_details(&server, "B", None).await;
    mount_details(&server, "C", Some("praxis-c.de")).await;

    let provider = PlacesProvider::new(&places_config(&server), "Germany", Throttle::unlimited())
        .expect("create provider");
    let records = provider
        .search(Niche::Dentists, City::Ulm)
        .await
        .expect("search succeeds");

    let ids: Vec<&str> = records.iter().map(|r| r.place_id.as_str()).collect();
    assert_eq!(ids, vec!["A", "C"]);
    assert_eq!(records[0].rating, Some(4.5));
    assert_eq!(provider.source_id(), "google");
}

#[tokio::test]
async fn test_places_rejected_page_token_keeps_earlier_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .and(query_param("pagetoken", "not-ready"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "INVALID_REQUEST"})))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .and(query_param("query", "Dentists in Ulm, Germany"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [{"place_id": "A"}, {"place_id": "B"}],
            "next_page_token": "not-ready"
        })))
        .mount(&server)
        .await;

    mount_details(&server, "A", Some("https://praxis-a.de")).await;
    mount_details(&server, "B", Some("https://praxis-b.de")).await;

    let provider = PlacesProvider::new(&places_config(&server), "Germany", Throttle::unlimited())
        .expect("create provider");
    let records = provider
        .search(Niche::Dentists, City::Ulm)
        .await
        .expect("page 2 failure is not fatal");

    let ids: Vec<&str> = records.iter().map(|r| r.place_id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B"]);
}

#[tokio::test]
async fn test_places_failed_geocode_skips_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [{"place_id": "A"}]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/geocode/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "INVALID_REQUEST",
            "error_message": "Invalid request. Missing the 'address' parameter."
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/place/nearbysearch/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "OK", "results": []})))
        .expect(0)
        .mount(&server)
        .await;

    mount_details(&server, "A", Some("https://praxis-a.de")).await;

    let provider = PlacesProvider::new(&places_config(&server), "Germany", Throttle::unlimited())
        .expect("create provider");
    let records = provider
        .search(Niche::Dentists, City::Pforzheim)
        .await
        .expect("geocode failure is not fatal");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].place_id, "A");
}

#[tokio::test]
async fn test_places_nearby_fallback_when_text_search_is_thin() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"status": "ZERO_RESULTS", "results": []})),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/geocode/json"))
        .and(query_param("address", "Heilbronn, Germany"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [{"geometry": {"location": {"lat": 49.14, "lng": 9.22}}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/place/nearbysearch/json"))
        .and(query_param("keyword", "Moving companies"))
        .and(query_param("radius", "15000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [{"place_id": "N1"}]
        })))
        .mount(&server)
        .await;

    mount_details(&server, "N1", Some("https://umzug-n1.de")).await;

    let provider = PlacesProvider::new(&places_config(&server), "Germany", Throttle::unlimited())
        .expect("create provider");
    let records = provider
        .search(Niche::MovingCompanies, City::Heilbronn)
        .await
        .expect("search succeeds");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].place_id, "N1");
}

#[tokio::test]
async fn test_places_status_classification() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .and(query_param("query", "Dentists in Ulm, Germany"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OVER_QUERY_LIMIT",
            "error_message": "You have exceeded your daily request quota."
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .and(query_param("query", "Pet services in Ulm, Germany"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid."
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/place/textsearch/json"))
        .and(query_param("query", "Real estate agents in Ulm, Germany"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let provider = PlacesProvider::new(&places_config(&server), "Germany", Throttle::unlimited())
        .expect("create provider");

    let err = provider
        .search(Niche::Dentists, City::Ulm)
        .await
        .expect_err("quota error");
    assert!(matches!(err, SourceError::RateLimited { .. }));
    assert!(err.is_transient());

    let err = provider
        .search(Niche::PetServices, City::Ulm)
        .await
        .expect_err("denied error");
    assert!(matches!(err, SourceError::AccessDenied { .. }));
    assert!(!err.is_transient());

    let err = provider
        .search(Niche::RealEstateAgents, City::Ulm)
        .await
        .expect_err("server error");
    assert!(err.is_transient());
}

fn osm_config(server: &MockServer) -> OsmConfig {
    OsmConfig {
        nominatim_url: server.uri(),
        overpass_url: format!("{}/interpreter", server.uri()),
        ..OsmConfig::default()
    }
}

#[tokio::test]
async fn test_osm_search_collapses_tags_and_caches_bbox() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Tübingen, Germany"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "lat": "48.52",
            "lon": "9.05",
            "boundingbox": ["48.45", "48.58", "8.95", "9.15"]
        }])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/interpreter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "elements": [
                {
                    "type": "node", "id": 1, "lat": 48.52, "lon": 9.05,
                    "tags": {"name": "Tierpension", "website": "https://tierpension.de"}
                },
                {
                    "type": "node", "id": 2, "lat": 48.53, "lon": 9.06,
                    "tags": {"name": "Ohne Website"}
                }
            ]
        })))
        .mount(&server)
        .await;

    let provider = OsmProvider::new(&osm_config(&server), "Germany", Throttle::unlimited())
        .expect("create provider");

    // Pet services has three tag filters; the same element comes back for each.
    let records = provider
        .search(Niche::PetServices, City::Tuebingen)
        .await
        .expect("search succeeds");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].place_id, "osm:node:1");

    // Second search in the same city reuses the cached bounding box.
    let records = provider
        .search(Niche::Dentists, City::Tuebingen)
        .await
        .expect("search succeeds");
    assert_eq!(records.len(), 1);
    assert_eq!(provider.source_id(), "osm");
}

#[tokio::test]
async fn test_osm_unknown_city_yields_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/interpreter"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"elements": []})))
        .expect(0)
        .mount(&server)
        .await;

    let provider = OsmProvider::new(&osm_config(&server), "Germany", Throttle::unlimited())
        .expect("create provider");
    let records = provider
        .search(Niche::Dentists, City::Ulm)
        .await
        .expect("search succeeds");
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_osm_overpass_overload_is_transient() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "lat": "49.0", "lon": "8.7", "boundingbox": ["48.8", "49.0", "8.6", "8.8"]
        }])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/interpreter"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let provider = OsmProvider::new(&osm_config(&server), "Germany", Throttle::unlimited())
        .expect("create provider");
    let err = provider
        .search(Niche::Dentists, City::Pforzheim)
        .await
        .expect_err("overpass overloaded");
    assert!(err.is_transient());
}
