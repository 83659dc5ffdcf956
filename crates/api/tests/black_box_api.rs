use reqwest::StatusCode;
use serde_json::{Value, json};

use stockroom_api::app::{AppServices, build_app};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, in-memory repositories, ephemeral port.
        let app = build_app(AppServices::in_memory());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        read(res).await
    }

    async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.put(self.url(path)).json(&body).send().await.unwrap();
        read(res).await
    }

    async fn patch(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.patch(self.url(path)).json(&body).send().await.unwrap();
        read(res).await
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        read(res).await
    }

    async fn delete(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.delete(self.url(path)).send().await.unwrap();
        read(res).await
    }

    async fn create_supplier(&self, name: &str) -> String {
        let (status, body) = self.post("/suppliers", json!({ "name": name })).await;
        assert_eq!(status, StatusCode::CREATED, "body={body}");
        body["id"].as_str().unwrap().to_string()
    }

    async fn create_item(&self, name: &str, category: &str, stock: i64, supplier: &str) -> String {
        let (status, body) = self
            .post(
                "/items",
                json!({
                    "name": name,
                    "category": category,
                    "stock": stock,
                    "price": 2.5,
                    "supplier": supplier,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "body={body}");
        body["id"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn read(res: reqwest::Response) -> (StatusCode, Value) {
    let status = res.status();
    let body = res.json().await.unwrap_or(Value::Null);
    (status, body)
}

const MISSING_ID: &str = "0123456789abcdef01234567";

#[tokio::test]
async fn health_reports_backend() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["backend"], "memory");
}

#[tokio::test]
async fn item_lifecycle_with_populated_supplier() {
    let srv = TestServer::spawn().await;
    let supplier = srv.create_supplier("Acme").await;
    let id = srv.create_item("Widget", "General", 10, &supplier).await;

    let (status, item) = srv.get(&format!("/items/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["name"], "Widget");
    assert_eq!(item["supplier"], json!({ "id": supplier, "name": "Acme" }));

    let (status, patched) = srv
        .patch(&format!("/items/{id}"), json!({ "stock": "4" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["stock"], 4);
    assert_eq!(patched["name"], "Widget");

    let (status, replaced) = srv
        .put(
            &format!("/items/{id}"),
            json!({
                "name": "Widget Pro",
                "category": "Electronics",
                "stock": 7,
                "price": 3,
                "supplier": supplier,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "body={replaced}");
    assert_eq!(replaced["category"], "Electronics");
    assert_eq!(replaced["createdAt"], item["createdAt"]);

    let (status, body) = srv.delete(&format!("/items/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);

    let (status, body) = srv.get(&format!("/items/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn invalid_item_lists_every_field_error() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv
        .post(
            "/items",
            json!({ "name": "", "category": "Toys", "stock": -1, "price": "abc" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "category", "stock", "price", "supplier"]);
}

#[tokio::test]
async fn unknown_supplier_is_unprocessable() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv
        .post(
            "/items",
            json!({
                "name": "Widget",
                "category": "General",
                "stock": 1,
                "price": 1,
                "supplier": MISSING_ID,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "supplier_not_found");
    assert_eq!(body["supplierId"], MISSING_ID);
}

#[tokio::test]
async fn malformed_ids_and_bodies_are_bad_requests() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.get("/items/not-an-id").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "id");

    let res = srv
        .client
        .post(srv.url("/suppliers"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    let (status, body) = read(res).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_body");

    let (status, _) = srv.post("/suppliers", json!(["Acme"])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_names_conflict() {
    let srv = TestServer::spawn().await;
    srv.create_supplier("Acme").await;
    let (status, body) = srv.post("/suppliers", json!({ "name": "Acme" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn supplier_with_items_cannot_be_deleted() {
    let srv = TestServer::spawn().await;
    let supplier = srv.create_supplier("Acme").await;
    let item = srv.create_item("Widget", "General", 1, &supplier).await;

    let (status, body) = srv.delete(&format!("/suppliers/{supplier}")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "has_dependents");
    assert_eq!(body["count"], 1);

    let (status, body) = srv.get(&format!("/suppliers/{supplier}/items")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    srv.delete(&format!("/items/{item}")).await;
    let (status, _) = srv.delete(&format!("/suppliers/{supplier}")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = srv.delete(&format!("/suppliers/{supplier}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn supplier_patch_and_filters() {
    let srv = TestServer::spawn().await;
    let acme = srv.create_supplier("Acme Tools").await;
    srv.create_supplier("Globex").await;

    let (status, body) = srv
        .patch(
            &format!("/suppliers/{acme}"),
            json!({ "status": "Inactive", "email": "Sales@Acme.Example" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "sales@acme.example");
    assert_eq!(body["paymentTerms"], "Net 30");

    let (_, body) = srv.get("/suppliers?status=Inactive").await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["items"][0]["name"], "Acme Tools");

    let (_, body) = srv.get("/suppliers?q=glo").await;
    assert_eq!(body["count"], 1);

    let (status, _) = srv.get("/suppliers?status=Sleeping").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn report_search_and_categories() {
    let srv = TestServer::spawn().await;
    let supplier = srv.create_supplier("Acme").await;
    srv.create_item("Laptop", "Electronics", 4, &supplier).await;
    srv.create_item("Novel", "Books", 20, &supplier).await;
    srv.create_item("Pen", "Office Supplies", 100, &supplier).await;

    let (status, report) = srv.get("/items/report").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["summary"]["totalItems"], 3);
    assert_eq!(report["summary"]["totalStock"], 124);
    assert_eq!(report["summary"]["totalValue"], 310.0);
    assert_eq!(report["byCategory"].as_array().unwrap().len(), 3);
    assert_eq!(report["lowStock"][0]["name"], "Laptop");

    let (_, low) = srv.get("/items/low-stock").await;
    assert_eq!(low["count"], 1);

    let (_, found) = srv.get("/items/search?q=book").await;
    assert_eq!(found["count"], 1);
    assert_eq!(found["items"][0]["name"], "Novel");

    let (_, found) = srv.get("/items/search?minStock=5&maxStock=50").await;
    assert_eq!(found["count"], 1);

    let (status, body) = srv.get("/items/search?minStock=lots").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "minStock");

    let (_, cats) = srv.get("/items/categories").await;
    assert_eq!(cats["categories"], json!(["Books", "Electronics", "Office Supplies"]));
}

#[tokio::test]
async fn list_items_filters_and_paginates() {
    let srv = TestServer::spawn().await;
    let acme = srv.create_supplier("Acme").await;
    let globex = srv.create_supplier("Globex").await;
    for n in 0..5 {
        srv.create_item(&format!("Book {n}"), "Books", 10, &acme).await;
    }
    srv.create_item("Shirt", "Clothing", 10, &globex).await;

    let (_, body) = srv.get("/items?category=Books&limit=2&page=3").await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["items"][0]["name"], "Book 4");

    let (_, body) = srv.get(&format!("/items?supplier={globex}")).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["items"][0]["supplier"]["name"], "Globex");

    let (status, _) = srv.get("/items?limit=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_routes_use_error_envelope() {
    let srv = TestServer::spawn().await;
    let (status, body) = srv.get("/warehouses").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}
