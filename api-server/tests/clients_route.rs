use easypay_api::models::{DataResponse, EasyPayClient, MessageResponse, PaginatedResponse};
use easypay_api::routes::clients::{
    create_client, delete_client, get_client, list_clients, update_client,
};
use easypay_api::test_support::{TestDatabase, TestDatabaseError, TestFixtures, TestRocketBuilder};
use rocket::http::{ContentType, Status};
use rocket::routes;
use serde_json::json;

#[tokio::test]
async fn list_clients_paginates_and_searches() {
    let test_db = match TestDatabase::new_from_env().await {
        Ok(db) => db,
        Err(TestDatabaseError::MissingUrl) => {
            eprintln!("skipping client list test: TEST_DATABASE_URL not set");
            return;
        }
        Err(err) => panic!("failed to provision test database: {err:?}"),
    };

    let pool = test_db.pool_clone();
    let fixtures = TestFixtures::new(&pool);
    for (client_id, name) in [
        ("EP-001", "Aziz Karimov"),
        ("EP-002", "Dilnoza Rahimova"),
        ("EP-003", "Azamat Yusupov"),
        ("EP-004", "Bobur Tursunov"),
        ("EP-005", "Kamola Azimova"),
    ] {
        fixtures
            .insert_client(
                client_id,
                Some(name),
                &format!("{}@example.com", client_id.to_lowercase()),
                "+998900000000",
            )
            .await
            .expect("seed client");
    }

    let client = TestRocketBuilder::new()
        .manage_pg_pool(pool.clone())
        .mount_api_routes(routes![list_clients])
        .async_client()
        .await;

    let response = client
        .get("/api/v1/easypay/clients?page=2&size=2&sortBy=clientId&order=asc")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let payload: PaginatedResponse<EasyPayClient> =
        response.into_json().await.expect("payload should deserialize");
    assert_eq!(payload.page.total_items, 5);
    assert_eq!(payload.page.total_pages, 3);
    let ids: Vec<_> = payload.data.iter().map(|c| c.client_id.as_str()).collect();
    assert_eq!(ids, ["EP-003", "EP-004"]);

    let response = client
        .get("/api/v1/easypay/clients?q=aZ&sortBy=name&order=asc")
        .dispatch()
        .await;
    let payload: PaginatedResponse<EasyPayClient> =
        response.into_json().await.expect("payload should deserialize");
    let names: Vec<_> = payload
        .data
        .iter()
        .filter_map(|c| c.name.as_deref())
        .collect();
    assert_eq!(names, ["Azamat Yusupov", "Aziz Karimov", "Kamola Azimova"]);
    assert_eq!(payload.page.total_items, 3);

    let response = client
        .get("/api/v1/easypay/clients?size=1000")
        .dispatch()
        .await;
    let payload: PaginatedResponse<EasyPayClient> =
        response.into_json().await.expect("payload should deserialize");
    assert_eq!(payload.page.size, 100);
    assert_eq!(payload.data.len(), 5);

    let response = client
        .get("/api/v1/easypay/clients?page=9223372036854775807&size=100")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let payload: PaginatedResponse<EasyPayClient> =
        response.into_json().await.expect("payload should deserialize");
    assert!(payload.data.is_empty());
    assert_eq!(payload.page.total_items, 5);

    drop(client);

    test_db.close().await.expect("failed to drop test database");
}

#[tokio::test]
async fn client_crud_round_trip() {
    let test_db = match TestDatabase::new_from_env().await {
        Ok(db) => db,
        Err(TestDatabaseError::MissingUrl) => {
            eprintln!("skipping client crud test: TEST_DATABASE_URL not set");
            return;
        }
        Err(err) => panic!("failed to provision test database: {err:?}"),
    };

    let client = TestRocketBuilder::new()
        .manage_pg_pool(test_db.pool_clone())
        .mount_api_routes(routes![
            create_client,
            get_client,
            update_client,
            delete_client
        ])
        .async_client()
        .await;

    {
        let body = json!({
            "clientId": "EP-100",
            "name": "Malika",
            "email": "malika@example.com",
            "phone": 998901112233u64,
            "isVerified": true
        });

        let response = client
            .post("/api/v1/easypay/clients")
            .header(ContentType::JSON)
            .body(body.to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);
        let created: DataResponse<EasyPayClient> = response.into_json().await.expect("created");
        assert_eq!(created.data.phone.as_deref(), Some("998901112233"));
        assert_eq!(created.data.is_verified.as_deref(), Some("true"));

        let conflict = client
            .post("/api/v1/easypay/clients")
            .header(ContentType::JSON)
            .body(body.to_string())
            .dispatch()
            .await;
        assert_eq!(conflict.status(), Status::Conflict);

        let response = client
            .put("/api/v1/easypay/clients/EP-100")
            .header(ContentType::JSON)
            .body(
                json!({
                    "name": "Malika R.",
                    "email": "malika@example.com",
                    "phone": "+998901112233"
                })
                .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let updated: DataResponse<EasyPayClient> = response.into_json().await.expect("updated");
        assert_eq!(updated.data.id, created.data.id);
        assert_eq!(updated.data.name.as_deref(), Some("Malika R."));
        assert_eq!(updated.data.is_verified, None);

        let response = client.get("/api/v1/easypay/clients/EP-100").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let response = client.delete("/api/v1/easypay/clients/EP-100").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let message: MessageResponse = response.into_json().await.expect("message");
        assert!(message.message.contains("EP-100"));

        let response = client.get("/api/v1/easypay/clients/EP-100").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);

        let response = client.delete("/api/v1/easypay/clients/EP-100").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
    }

    drop(client);

    test_db.close().await.expect("failed to drop test database");
}
