//! CRUD services against a local HTTP server.

use std::sync::{Arc, Mutex};

use axum::extract::Path;
use axum::routing::{get, post};
use axum::{Json, Router};
use conduit_request::{ApiConfig, AppConfig, ConfigHandle, Method, Notifier, RequestOptions, Requester};
use conduit_service::{Endpoint, Error, ListResponse, ListState, Service};
use conduit_state::{StoreOptions, StoreRegistry};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
struct Product {
    id: u64,
    name: String,
}

#[derive(Debug, Serialize)]
struct NewProduct {
    name: String,
}

#[derive(Debug, Default)]
struct RecordingNotifier {
    successes: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn successes(&self) -> Vec<String> {
        self.successes.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.successes.lock().unwrap().push(message.to_string());
    }

    fn error(&self, _message: &str) {}
}

fn lamp() -> Value {
    json!({ "id": 1, "name": "Lamp" })
}

async fn spawn_server() -> String {
    let app = Router::new()
        .route(
            "/products",
            get(|| async { Json(json!({ "status": "success", "data": [lamp()] })) }).post(
                |Json(body): Json<Value>| async move {
                    Json(json!({
                        "status": "success",
                        "message": "Created",
                        "data": { "id": 2, "name": body["name"] }
                    }))
                },
            ),
        )
        .route(
            "/products/{id}",
            get(|Path(id): Path<u64>| async move {
                Json(json!({ "status": "success", "data": { "id": id, "name": "Lamp" } }))
            })
            .put(|Path(id): Path<u64>, Json(body): Json<Value>| async move {
                Json(json!({
                    "status": "success",
                    "message": "Updated",
                    "data": { "id": id, "name": body["name"] }
                }))
            })
            .delete(|| async { Json(json!({ "status": "success", "message": "Deleted" })) }),
        )
        .route(
            "/products/{id}/approve",
            post(|Path(id): Path<u64>| async move {
                Json(json!({ "status": "success", "data": { "approved": id } }))
            }),
        )
        .route(
            "/paged",
            get(|| async {
                Json(json!({
                    "status": "success",
                    "data": { "data": [lamp()], "total": 41 }
                }))
            }),
        )
        .route(
            "/empty",
            get(|| async { Json(json!({ "status": "success" })) }),
        )
        .route(
            "/tenants/{tenant}/products",
            get(|Path(tenant): Path<String>| async move {
                Json(json!({
                    "status": "success",
                    "data": [{ "id": 5, "name": tenant }]
                }))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn requester(base: &str, notifier: Arc<RecordingNotifier>) -> Requester {
    Requester::with_config(ConfigHandle::new(AppConfig {
        api: ApiConfig {
            url: Some(base.to_string()),
            ..ApiConfig::default()
        },
    }))
    .notifier(notifier)
}

fn products(base: &str, notifier: Arc<RecordingNotifier>) -> Service<Product, NewProduct> {
    Service::builder("/products/")
        .default_store()
        .requester(requester(base, notifier))
        .registry(Arc::new(StoreRegistry::new()))
        .build()
}

#[tokio::test]
async fn test_get_all_syncs_list_into_store() {
    let _ = tracing_subscriber::fmt::try_init();
    let base = spawn_server().await;
    let service: Service<Product> = Service::builder("/products")
        .default_store()
        .sync_with_store(true)
        .requester(requester(&base, Arc::default()))
        .registry(Arc::new(StoreRegistry::new()))
        .build();

    let response = service.get_all(None, RequestOptions::new()).await.unwrap();

    let expected = vec![Product {
        id: 1,
        name: "Lamp".to_string(),
    }];
    assert_eq!(response, Some(ListResponse::Items(expected.clone())));
    assert_eq!(service.use_store(|state| state.list.clone()).await.unwrap(), expected);
}

#[tokio::test]
async fn test_get_all_syncs_page_data() {
    let base = spawn_server().await;
    let service: Service<Product> = Service::builder("/paged")
        .default_store()
        .sync_with_store(true)
        .requester(requester(&base, Arc::default()))
        .registry(Arc::new(StoreRegistry::new()))
        .build();

    let response = service.get_all(None, RequestOptions::new()).await.unwrap().unwrap();

    let ListResponse::Page { meta, .. } = &response else {
        panic!("expected a page");
    };
    assert_eq!(meta["total"], json!(41));
    assert_eq!(service.store().await.unwrap().state().list, response.into_items());
}

#[tokio::test]
async fn test_get_all_without_data_leaves_store_untouched() {
    let base = spawn_server().await;
    let seeded = ListState {
        list: vec![Product {
            id: 9,
            name: "Chair".to_string(),
        }],
        selected: None,
        loading: false,
    };
    let service: Service<Product> = Service::builder("/empty")
        .store(seeded.clone(), StoreOptions::in_memory())
        .sync_with_store(true)
        .requester(requester(&base, Arc::default()))
        .registry(Arc::new(StoreRegistry::new()))
        .build();

    assert_eq!(service.get_all(None, RequestOptions::new()).await.unwrap(), None);
    assert_eq!(*service.store().await.unwrap().state(), seeded);
}

#[tokio::test]
async fn test_get_all_without_sync_leaves_store_untouched() {
    let base = spawn_server().await;
    let service = products(&base, Arc::default());

    service.get_all(None, RequestOptions::new()).await.unwrap();

    assert!(service.use_store(|state| state.list.is_empty()).await.unwrap());
}

#[tokio::test]
async fn test_get_by_id() {
    let base = spawn_server().await;
    let notifier = Arc::new(RecordingNotifier::default());
    let service = products(&base, notifier.clone());

    let product = service.get_by_id(7, RequestOptions::new()).await.unwrap();

    assert_eq!(
        product,
        Some(Product {
            id: 7,
            name: "Lamp".to_string(),
        })
    );
    assert!(notifier.successes().is_empty());
}

#[tokio::test]
async fn test_mutations_notify_by_default_and_leave_store_untouched() {
    let base = spawn_server().await;
    let notifier = Arc::new(RecordingNotifier::default());
    let service = products(&base, notifier.clone());
    let payload = NewProduct {
        name: "Desk".to_string(),
    };

    let created = service.create(&payload, RequestOptions::new()).await.unwrap();
    let updated = service
        .update(3, &payload, RequestOptions::new())
        .await
        .unwrap();
    let deleted = service.delete(3, RequestOptions::new()).await.unwrap();

    assert_eq!(
        created,
        Some(Product {
            id: 2,
            name: "Desk".to_string(),
        })
    );
    assert_eq!(
        updated,
        Some(Product {
            id: 3,
            name: "Desk".to_string(),
        })
    );
    assert_eq!(deleted, None);
    assert_eq!(
        notifier.successes(),
        vec![
            "Created".to_string(),
            "Updated".to_string(),
            "Deleted".to_string()
        ]
    );
    assert!(service.use_store(|state| state.list.is_empty()).await.unwrap());
}

#[tokio::test]
async fn test_per_call_options_override_defaults() {
    let base = spawn_server().await;
    let notifier = Arc::new(RecordingNotifier::default());
    let service = products(&base, notifier.clone());

    service
        .delete(3, RequestOptions::new().display_success(false))
        .await
        .unwrap();

    assert!(notifier.successes().is_empty());
}

#[tokio::test]
async fn test_blank_id_is_rejected_before_any_request() {
    let service = products("http://127.0.0.1:9", Arc::default());

    assert!(matches!(
        service.get_by_id("", RequestOptions::new()).await,
        Err(Error::MissingId("get_by_id"))
    ));
    assert!(matches!(
        service
            .update(
                "  ",
                &NewProduct {
                    name: "x".to_string()
                },
                RequestOptions::new()
            )
            .await,
        Err(Error::MissingId("update"))
    ));
    assert!(matches!(
        service.delete("", RequestOptions::new()).await,
        Err(Error::MissingId("delete"))
    ));
}

#[tokio::test]
async fn test_store_requires_configuration() {
    let service: Service<Product> = Service::builder("/products")
        .registry(Arc::new(StoreRegistry::new()))
        .build();

    assert!(matches!(service.store().await, Err(Error::StoreNotConfigured)));
    assert!(matches!(
        service.use_store(|state| state.loading).await,
        Err(Error::StoreNotConfigured)
    ));
}

#[tokio::test]
async fn test_clones_share_one_store() {
    let registry = Arc::new(StoreRegistry::new());
    let service: Service<Product> = Service::builder("/products")
        .default_store()
        .registry(registry.clone())
        .build();
    let other: Service<Product> = Service::builder("/products")
        .default_store()
        .registry(registry.clone())
        .build();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.store().await.unwrap() })
        })
        .collect();

    let first = service.store().await.unwrap();
    for handle in handles {
        assert!(handle.await.unwrap().ptr_eq(&first));
    }
    assert_eq!(service.clone().binding(), service.binding());
    assert!(!other.store().await.unwrap().ptr_eq(&first));
    assert_eq!(registry.len(), 2);
}

#[tokio::test]
async fn test_custom_action() {
    let base = spawn_server().await;
    let service = products(&base, Arc::default());

    let data = service
        .custom_action(Method::POST, "/4/approve", RequestOptions::new())
        .await
        .unwrap();

    assert_eq!(data, Some(json!({ "approved": 4 })));
}

#[tokio::test]
async fn test_dynamic_endpoint_is_resolved_per_call() {
    let base = spawn_server().await;
    let tenant = Arc::new(Mutex::new("acme".to_string()));
    let service: Service<Product> = Service::builder(Endpoint::dynamic({
        let tenant = tenant.clone();
        move || format!("/tenants/{}/products/", tenant.lock().unwrap())
    }))
    .requester(requester(&base, Arc::default()))
    .build();

    let first = service.get_all(None, RequestOptions::new()).await.unwrap().unwrap();
    *tenant.lock().unwrap() = "globex".to_string();
    let second = service.get_all(None, RequestOptions::new()).await.unwrap().unwrap();

    assert_eq!(first.items()[0].name, "acme");
    assert_eq!(second.items()[0].name, "globex");
}
