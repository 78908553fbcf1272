//! API integration tests
//!
//! Expect a running server with a seeded administrator account
//! (admin@athenaeum.edu / admin-password).

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Helper to get an administrator token
async fn get_admin_token(client: &Client) -> String {
    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@athenaeum.edu",
            "password": "admin-password"
        }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

/// Helper to register a fresh borrower and get their token
async fn register_borrower(client: &Client, tag: &str) -> String {
    let body: Value = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "first_name": "Queue",
            "last_name": "Tester",
            "email": format!("{}-{}@example.edu", tag, std::process::id()),
            "password": "borrower-pass-1"
        }))
        .send()
        .await
        .expect("Failed to send register request")
        .json()
        .await
        .expect("Failed to parse register response");
    body["token"].as_str().expect("No token in response").to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@athenaeum.edu",
            "password": "admin-password"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["user"]["role"], "administrator");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "admin@athenaeum.edu",
            "password": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_register_and_get_current_user() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "first_name": "Test",
            "last_name": "Borrower",
            "email": format!("borrower-{}@example.edu", std::process::id()),
            "password": "borrower-pass-1"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    let token = body["token"].as_str().expect("No token in response");
    assert_eq!(body["user"]["role"], "borrower");

    let response = client
        .get(format!("{}/auth/me", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let me: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(me["first_name"], "Test");
}

#[tokio::test]
#[ignore]
async fn test_list_books() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let response = client
        .get(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}

#[tokio::test]
#[ignore]
async fn test_create_and_delete_book() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let categories: Value = client
        .get(format!("{}/books/categories", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let category_id = categories[0]["id"].as_i64().expect("No seeded category");

    // Create book
    let response = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Test Book",
            "author": "Test Author",
            "isbn": "978-0-00-000000-0",
            "category_id": category_id,
            "total_copies": 2
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    let book_id = body["id"].as_i64().expect("No book ID");
    assert_eq!(body["available_copies"], 2);

    // Delete book
    let response = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
}

#[tokio::test]
#[ignore]
async fn test_loan_lifecycle() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let categories: Value = client
        .get(format!("{}/books/categories", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let category_id = categories[0]["id"].as_i64().expect("No seeded category");

    let book: Value = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Loanable Book",
            "author": "Test Author",
            "category_id": category_id,
            "total_copies": 1
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let book_id = book["id"].as_i64().expect("No book ID");

    // Borrow
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let loan: Value = response.json().await.expect("Failed to parse response");
    let loan_id = loan["id"].as_i64().expect("No loan ID");
    assert_eq!(loan["status"], "active");

    let book: Value = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(book["available_copies"], 0);

    // The only copy is out, a second borrow must be refused
    let response = client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);

    // Extend
    let response = client
        .put(format!("{}/loans/{}/extend", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "days": 7 }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let extended: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(extended["extension_count"], 1);

    // Return
    let response = client
        .put(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let returned: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(returned["loan"]["status"], "returned");
    assert!(returned["fine"].is_null());

    // The copy goes back on the shelf
    let book: Value = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(book["available_copies"], 1);

    // Cleanup
    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_mark_lost() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let categories: Value = client
        .get(format!("{}/books/categories", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let category_id = categories[0]["id"].as_i64().expect("No seeded category");

    let book: Value = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Losable Book",
            "author": "Test Author",
            "category_id": category_id,
            "total_copies": 2
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let book_id = book["id"].as_i64().expect("No book ID");

    let loan: Value = client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let loan_id = loan["id"].as_i64().expect("No loan ID");

    let response = client
        .put(format!("{}/loans/{}/lost", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "notes": "Reported lost by the borrower" }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    // The loan closes with a close date and the replacement fee is charged
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["loan"]["status"], "lost");
    assert!(body["loan"]["returned_at"].is_string());
    assert_eq!(body["fine"]["kind"], "fine");

    // The shelf counters keep the shortage visible: the lost copy is not
    // restored and the total is not silently corrected
    let book: Value = client
        .get(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(book["total_copies"], 2);
    assert_eq!(book["available_copies"], 1);

    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_reservation_requires_unavailable_book() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let categories: Value = client
        .get(format!("{}/books/categories", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let category_id = categories[0]["id"].as_i64().expect("No seeded category");

    let book: Value = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Available Book",
            "author": "Test Author",
            "category_id": category_id,
            "total_copies": 3
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let book_id = book["id"].as_i64().expect("No book ID");

    // Copies are on the shelf, so queueing is refused
    let response = client
        .post(format!("{}/reservations", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 422);

    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_concurrent_cancellations() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let categories: Value = client
        .get(format!("{}/books/categories", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let category_id = categories[0]["id"].as_i64().expect("No seeded category");

    let book: Value = client
        .post(format!("{}/books", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": "Contested Book",
            "author": "Test Author",
            "category_id": category_id,
            "total_copies": 1
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let book_id = book["id"].as_i64().expect("No book ID");

    // Take the only copy off the shelf so the book becomes reservable
    let loan: Value = client
        .post(format!("{}/loans", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "book_id": book_id }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let loan_id = loan["id"].as_i64().expect("No loan ID");

    let token_a = register_borrower(&client, "queue-a").await;
    let token_b = register_borrower(&client, "queue-b").await;

    let mut reservation_ids = Vec::new();
    for token in [&token_a, &token_b] {
        let reservation: Value = client
            .post(format!("{}/reservations", BASE_URL))
            .header("Authorization", format!("Bearer {}", token))
            .json(&json!({ "book_id": book_id }))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse response");
        reservation_ids.push(reservation["id"].as_i64().expect("No reservation ID"));
    }

    // Both queue members cancel at once; each must get a clean answer, not
    // a serialization failure
    let (first, second) = tokio::join!(
        client
            .put(format!("{}/reservations/{}/cancel", BASE_URL, reservation_ids[0]))
            .header("Authorization", format!("Bearer {}", token_a))
            .send(),
        client
            .put(format!("{}/reservations/{}/cancel", BASE_URL, reservation_ids[1]))
            .header("Authorization", format!("Bearer {}", token_b))
            .send(),
    );

    let first = first.expect("Failed to send request");
    let second = second.expect("Failed to send request");
    assert!(first.status().is_success());
    assert!(second.status().is_success());

    // Cleanup
    let _ = client
        .put(format!("{}/loans/{}/return", BASE_URL, loan_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await;
    let _ = client
        .delete(format!("{}/books/{}", BASE_URL, book_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await;
}

#[tokio::test]
#[ignore]
async fn test_list_users_requires_staff() {
    let client = Client::new();

    let register: Value = client
        .post(format!("{}/auth/register", BASE_URL))
        .json(&json!({
            "first_name": "Plain",
            "last_name": "Borrower",
            "email": format!("plain-{}@example.edu", std::process::id()),
            "password": "borrower-pass-1"
        }))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let token = register["token"].as_str().expect("No token in response");

    let response = client
        .get(format!("{}/users", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

#[tokio::test]
#[ignore]
async fn test_get_stats() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let response = client
        .get(format!("{}/loans/stats", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["active"].is_number());
    assert!(body["overdue"].is_number());

    let response = client
        .get(format!("{}/users/stats", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["total"].is_number());
    assert!(body["borrowers"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_notifications() {
    let client = Client::new();
    let token = get_admin_token(&client).await;

    let response = client
        .get(format!("{}/notifications/unread", BASE_URL))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["notifications"].is_array());
    assert!(body["unread"].is_number());
}

#[tokio::test]
#[ignore]
async fn test_unauthorized_access() {
    let client = Client::new();

    let response = client
        .get(format!("{}/loans", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}
