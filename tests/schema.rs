use async_graphql::Request;
use cca_hub::graphql::{build_schema, CcaSchema};
use cca_hub::models::permissions::{Caller, Role};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;

/// Neither store is reached before access is decided, so lazy handles suffice
async fn offline_schema() -> CcaSchema {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/cca_test")
        .unwrap();
    let database = mongodb::Client::with_uri_str("mongodb://localhost:27017")
        .await
        .unwrap()
        .database("cca_test");

    build_schema(pool, database)
}

async fn execute(request: Request) -> Value {
    let response = offline_schema().await.execute(request).await;
    serde_json::to_value(&response).unwrap()
}

#[tokio::test]
async fn anonymous_callers_cannot_list_accounts() {
    let response = execute(Request::new("{ profiles { id } }")).await;
    let error = &response["errors"][0];

    assert_eq!(error["message"], "User must be logged in");
    assert_eq!(error["extensions"]["code"], "unauthenticated");
    assert_eq!(error["extensions"]["status"], 401);
}

#[tokio::test]
async fn students_cannot_change_roles() {
    let student = Caller::new("student", Role::Student, None);
    let request =
        Request::new(r#"mutation { setRole(userId: "someone", role: SYSTEM_ADMIN) { id } }"#)
            .data(student);

    let response = execute(request).await;
    let error = &response["errors"][0];

    assert_eq!(error["extensions"]["code"], "forbidden_role");
    assert_eq!(error["extensions"]["status"], 403);
}

#[tokio::test]
async fn my_clubs_requires_login() {
    let response = execute(Request::new("{ myClubs { id name } }")).await;

    assert_eq!(response["errors"][0]["extensions"]["code"], "unauthenticated");
}

#[tokio::test]
async fn analytics_are_exposed_in_the_schema() {
    let sdl = offline_schema().await.sdl();

    for field in ["clubAnalytics", "averageAttendance", "trendData", "registerForEvent"] {
        assert!(sdl.contains(field), "missing {}", field);
    }
}
