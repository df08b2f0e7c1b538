use butler_core::message_inbox::TraceContext;
use butler_storage::Db;

use super::*;

#[sqlx::test(migrator = "butler_storage::db::TEST_MIGRATOR")]
async fn routing_to_an_unregistered_butler_fails_without_an_http_call(pool: sqlx::PgPool) {
    let db = Db::from_pool_for_test(pool);
    let client = RouteClient::new(RegistryStore::new(db.clone()), RoutingLog::new(db));

    let err = client
        .route(
            "concierge",
            RequestId::new(),
            "book a table",
            "telegram",
            "bot-1",
            "user-1",
            &TraceContext { trace_id: "t1".to_string(), span_id: None },
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, RouterError::UnknownTarget(name) if name == "concierge"));
}
