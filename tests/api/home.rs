use axum::{
    body::Body,
    extract::Request,
    http::{self, StatusCode},
};
use bookshelf::{
    db::{added_books::set_current_page, user::set_reminder},
    model::Home,
};
use http_body_util::BodyExt;

use crate::AppStateTest;

#[tokio::test]
async fn should_be_ok() {
    let test_state = AppStateTest::new(false).await;

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();

    let response = test_state.generate_response(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    let response_body = response.into_body().collect().await.unwrap().to_bytes();

    assert_eq!(&response_body[..], b"Alive");
}

#[tokio::test]
async fn should_require_login_for_recommendations() {
    let test_state = AppStateTest::new(false).await;

    let request = Request::builder()
        .uri("/home/recommendations?exclude=1,two")
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_list_reading_list_most_recent_first() {
    let mut test_state = AppStateTest::new(true).await;

    let (user, token) = test_state.generate_jwt_with_user().await;
    test_state.generate_category("Fantasy").await;
    let first = test_state
        .generate_book(&user, "Fantasy", "First", false)
        .await;
    let second = test_state
        .generate_book(&user, "Fantasy", "Second", false)
        .await;

    set_current_page(test_state.pool(), user.id, first, 42)
        .await
        .unwrap();

    let request = Request::builder()
        .uri("/home")
        .header(http::header::AUTHORIZATION, format!("bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response_body = response.into_body().collect().await.unwrap().to_bytes();
    let home: Home = serde_json::from_slice(&response_body).unwrap();

    let ids: Vec<i64> = home.books.iter().map(|b| b.book.id).collect();
    assert_eq!(ids, vec![first, second]);
    assert_eq!(home.books[0].last_page, 42);
    // Two books in the whole catalog is far below the recommendation threshold.
    assert!(home.recommend_books.is_empty());
    assert!(home.reminder.is_none());

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_recommend_unread_books_of_favourite_category() {
    let mut test_state = AppStateTest::new(true).await;

    let (reader, token) = test_state.generate_jwt_with_user().await;
    let uploader = test_state.generate_user().await;
    test_state.generate_category("Poetry").await;

    test_state
        .generate_book(&reader, "Poetry", "Mine", false)
        .await;
    let mut candidates = Vec::new();
    for i in 0..12 {
        let id = test_state
            .generate_book(&uploader, "Poetry", &format!("Poem {}", i), false)
            .await;
        candidates.push(id);
    }
    let hidden = test_state
        .generate_book(&uploader, "Poetry", "Hidden", true)
        .await;

    let request = Request::builder()
        .uri(format!(
            "/home/recommendations?exclude={}",
            candidates[0]
        ))
        .header(http::header::AUTHORIZATION, format!("bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response_body = response.into_body().collect().await.unwrap().to_bytes();
    let books: Vec<serde_json::Value> = serde_json::from_slice(&response_body).unwrap();

    assert_eq!(books.len(), 4);
    for book in &books {
        let id = book["id"].as_i64().unwrap();
        assert!(candidates[1..].contains(&id));
        assert_ne!(id, hidden);
    }

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_not_attach_reminder_when_all_disabled() {
    let mut config = bookshelf::config::Config::new().unwrap();
    config.library.show_reminder_count = 0;
    let mut test_state = AppStateTest::new_with_config(true, config).await;

    let (user, token) = test_state.generate_jwt_with_user().await;
    set_reminder(test_state.pool(), user.id, "disabled_all", true)
        .await
        .unwrap();

    let request = Request::builder()
        .uri("/home")
        .header(http::header::AUTHORIZATION, format!("bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response_body = response.into_body().collect().await.unwrap().to_bytes();
    let home: Home = serde_json::from_slice(&response_body).unwrap();
    assert!(home.reminder.is_none());

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_attach_reminder_when_due() {
    let mut config = bookshelf::config::Config::new().unwrap();
    config.library.show_reminder_count = 0;
    let mut test_state = AppStateTest::new_with_config(true, config).await;

    let (_, token) = test_state.generate_jwt_with_user().await;

    let request = Request::builder()
        .uri("/home")
        .header(http::header::AUTHORIZATION, format!("bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response_body = response.into_body().collect().await.unwrap().to_bytes();
    let home: Home = serde_json::from_slice(&response_body).unwrap();
    assert!(home.reminder.is_some());

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_keep_reminder_pending_until_home_is_opened() {
    let mut config = bookshelf::config::Config::new().unwrap();
    config.library.show_reminder_count = 2;
    let mut test_state = AppStateTest::new_with_config(true, config).await;

    let (user, token) = test_state.generate_jwt_with_user().await;

    // The third request crosses the threshold on a page without reminders.
    for _ in 0..3 {
        let request = Request::builder()
            .uri("/me")
            .header(http::header::AUTHORIZATION, format!("bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let response = test_state.generate_response(request).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    // This request alone is one short of the threshold.
    let request = Request::builder()
        .uri("/home")
        .header(http::header::AUTHORIZATION, format!("bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response_body = response.into_body().collect().await.unwrap().to_bytes();
    let home: Home = serde_json::from_slice(&response_body).unwrap();
    assert!(home.reminder.is_some());

    assert!(!test_state.app_state.reminder_counter.take_due(user.id));

    test_state.cleanup().await;
}
