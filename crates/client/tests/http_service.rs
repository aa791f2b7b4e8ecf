use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storefront_catalog::{CartLine, Price};
use storefront_client::http::REQUEST_ID_HEADER;
use storefront_client::{
    ClientConfig, HttpLessonService, LessonService, OrderForm, Reconciler, ServiceError,
    StoreError,
};
use storefront_core::{LessonId, OrderId};

fn lessons_body() -> serde_json::Value {
    json!([
        { "_id": 1, "subject": "Mathematics", "location": "Hendon", "price": 100, "spaces": 5, "icon": "images/math.png" },
        { "id": "2", "subject": "English", "location": "Colindale", "price": 80.5, "spaces": 0 }
    ])
}

async fn service_for(server: &MockServer) -> HttpLessonService {
    let config = ClientConfig::default().with_api_url(server.uri()).unwrap();
    HttpLessonService::new(&config).unwrap()
}

#[tokio::test]
async fn lists_lessons() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lessons"))
        .and(header_exists(REQUEST_ID_HEADER))
        .respond_with(ResponseTemplate::new(200).set_body_json(lessons_body()))
        .expect(1)
        .mount(&server)
        .await;

    let lessons = service_for(&server).await.list_lessons().await.unwrap();

    assert_eq!(lessons.len(), 2);
    assert_eq!(lessons[0].id, LessonId::from(1));
    assert_eq!(lessons[0].price, Price::from_minor(10_000));
    assert_eq!(lessons[0].available_spaces, 5);
    assert_eq!(lessons[0].icon.as_deref(), Some("images/math.png"));
    assert_eq!(lessons[1].id.as_str(), "2");
    assert_eq!(lessons[1].price, Price::from_minor(8_050));
    assert!(lessons[1].is_sold_out());
}

#[tokio::test]
async fn search_sends_query_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "hendon math"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "_id": 1, "subject": "Mathematics", "location": "Hendon", "price": 100, "spaces": 5 }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let hits = service_for(&server).await.search_lessons("hendon math").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].subject, "Mathematics");
}

#[tokio::test]
async fn update_spaces_puts_absolute_count() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/lessons/7"))
        .and(body_json(json!({ "spaces": 2 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    service_for(&server)
        .await
        .update_spaces(&LessonId::from(7), 2)
        .await
        .unwrap();
}

#[tokio::test]
async fn reserved_characters_in_lesson_id_stay_in_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/lessons/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/lessons/7%3Fx=1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/lessons/a%2Fb%23c"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server).await;
    service
        .update_spaces(&LessonId::new("7?x=1").unwrap(), 0)
        .await
        .unwrap();
    service
        .update_spaces(&LessonId::new("a/b#c").unwrap(), 3)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.url.query().is_none()));
}

#[tokio::test]
async fn dot_segment_lesson_id_is_never_sent() {
    let server = MockServer::start().await;
    let service = service_for(&server).await;

    for raw in [".", ".."] {
        let err = service
            .update_spaces(&LessonId::new(raw).unwrap(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Parse(_)));
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unsuccessful_update_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/lessons/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;

    let err = service_for(&server)
        .await
        .update_spaces(&LessonId::from(7), 2)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Rejected(_)));
}

#[tokio::test]
async fn error_status_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lessons"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database offline"))
        .mount(&server)
        .await;

    let err = service_for(&server).await.list_lessons().await.unwrap_err();
    assert_eq!(
        err,
        ServiceError::Api {
            status: 500,
            message: "database offline".to_string()
        }
    );
}

#[tokio::test]
async fn undecodable_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lessons"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = service_for(&server).await.list_lessons().await.unwrap_err();
    assert!(matches!(err, ServiceError::Parse(_)));
}

#[tokio::test]
async fn unreachable_service_is_network_error() {
    let config = ClientConfig::default()
        .with_api_url("http://127.0.0.1:9")
        .unwrap()
        .with_request_timeout(Duration::from_secs(2));
    let service = HttpLessonService::new(&config).unwrap();

    let err = service.list_lessons().await.unwrap_err();
    assert!(matches!(err, ServiceError::Network(_)));
}

#[tokio::test]
async fn token_is_sent_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lessons"))
        .and(header("Authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::default().with_api_url(server.uri()).unwrap();
    let service = HttpLessonService::with_token(&config, "s3cret".to_string()).unwrap();
    assert!(service.list_lessons().await.unwrap().is_empty());
}

#[tokio::test]
async fn reconciler_round_trip_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lessons"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lessons_body()))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/lessons/1"))
        .and(body_json(json!({ "spaces": 4 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/orders"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "orderId": "65f0c1" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let reconciler = Reconciler::new(service_for(&server).await);
    reconciler.refresh().await.unwrap();

    let lesson = LessonId::from(1);
    reconciler.add_to_cart(&lesson).await.unwrap();
    assert_eq!(reconciler.item(&lesson).unwrap().available_spaces, 4);

    // Sold out locally: refused before any request is made.
    let sold_out = reconciler.add_to_cart(&LessonId::from(2)).await;
    assert!(matches!(sold_out, Err(StoreError::SoldOut(_))));

    let confirmation = reconciler
        .checkout(&OrderForm::new("Ada Lovelace", "0501234567"))
        .await
        .unwrap();
    assert_eq!(confirmation.order_id, OrderId::new("65f0c1").unwrap());
    assert_eq!(confirmation.lines, vec![CartLine { item_id: lesson, quantity: 1 }]);
    assert!(reconciler.cart().is_empty());

    let requests = server.received_requests().await.unwrap();
    let order = requests
        .iter()
        .find(|r| r.url.path() == "/orders")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&order.body).unwrap();
    assert_eq!(body["name"], "Ada Lovelace");
    assert_eq!(body["items"], json!([{ "itemId": "1", "quantity": 1 }]));
    assert_eq!(body["total"], json!(100.0));
}
