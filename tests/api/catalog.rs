use axum::{
    body::Body,
    http::{self, Request, StatusCode},
};
use bookshelf::{
    db::books::{NewBook, insert_book},
    library::pagination::Page,
    model::{BookSummary, Language},
};
use http_body_util::BodyExt;

use crate::AppStateTest;

async fn get_page(test_state: &AppStateTest, request: Request<Body>) -> Page<BookSummary> {
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response_body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&response_body).unwrap()
}

#[tokio::test]
async fn should_reject_page_zero() {
    let test_state = AppStateTest::new(false).await;

    let request = Request::builder()
        .uri("/categories/1/books?page=0")
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_reject_unknown_criterion() {
    let test_state = AppStateTest::new(false).await;

    let request = Request::builder()
        .uri("/categories/1/books?criterion=popularity")
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_reject_non_numeric_category() {
    let test_state = AppStateTest::new(false).await;

    let request = Request::builder()
        .uri("/categories/fantasy/books")
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn should_reject_empty_search_terms() {
    let test_state = AppStateTest::new(false).await;

    let request = Request::builder()
        .uri("/books/search?q=")
        .body(Body::empty())
        .unwrap();
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let request = Request::builder()
        .uri("/authors?part=")
        .body(Body::empty())
        .unwrap();
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_return_not_found_for_unknown_category() {
    let mut test_state = AppStateTest::new(true).await;

    let request = Request::builder()
        .uri("/categories/999/books")
        .body(Body::empty())
        .unwrap();

    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_hide_private_books_from_other_viewers() {
    let mut test_state = AppStateTest::new(true).await;

    let (owner, owner_token) = test_state.generate_jwt_with_user().await;
    let category_id = test_state.generate_category("Drama").await;
    test_state
        .generate_book(&owner, "Drama", "Public", false)
        .await;
    let private = test_state
        .generate_book(&owner, "Drama", "Secret", true)
        .await;

    let request = Request::builder()
        .uri(format!("/categories/{}/books", category_id))
        .body(Body::empty())
        .unwrap();
    let page = get_page(&test_state, request).await;
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].name, "Public");
    assert!(!page.has_next);
    assert_eq!(page.next_page, 1);

    let request = Request::builder()
        .uri(format!("/categories/{}/books", category_id))
        .header(
            http::header::AUTHORIZATION,
            format!("bearer {}", owner_token),
        )
        .body(Body::empty())
        .unwrap();
    let page = get_page(&test_state, request).await;
    assert_eq!(page.items.len(), 2);

    let request = Request::builder()
        .uri(format!("/books/{}", private))
        .body(Body::empty())
        .unwrap();
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_sort_and_paginate_category_books() {
    let mut test_state = AppStateTest::new(true).await;

    let (uploader, _) = test_state.generate_jwt_with_user().await;
    let category_id = test_state.generate_category("Sci-Fi").await;
    for name in ["Dune", "Anathem", "Solaris"] {
        test_state
            .generate_book(&uploader, "Sci-Fi", name, false)
            .await;
    }

    let request = Request::builder()
        .uri(format!(
            "/categories/{}/books?criterion=book_name&page=1",
            category_id
        ))
        .body(Body::empty())
        .unwrap();
    let page = get_page(&test_state, request).await;
    let names: Vec<&str> = page.items.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["Anathem", "Dune", "Solaris"]);

    let request = Request::builder()
        .uri(format!("/categories/{}/books?page=2", category_id))
        .body(Body::empty())
        .unwrap();
    let page = get_page(&test_state, request).await;
    assert!(page.items.is_empty());
    assert_eq!(page.next_page, 2);

    let request = Request::builder()
        .uri(format!(
            "/categories/{}/books?criterion=most_readable",
            category_id
        ))
        .body(Body::empty())
        .unwrap();
    let page = get_page(&test_state, request).await;
    assert!(page.items.iter().all(|b| b.read_count == Some(1)));

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_escape_web_output_only() {
    let mut test_state = AppStateTest::new(true).await;

    let (uploader, _) = test_state.generate_jwt_with_user().await;
    test_state.generate_category("Horror").await;
    test_state
        .generate_book(&uploader, "Horror", "<Tom & Jerry>", false)
        .await;

    let request = Request::builder()
        .uri("/books/search?q=tom")
        .body(Body::empty())
        .unwrap();
    let page = get_page(&test_state, request).await;
    assert_eq!(page.items[0].name, "&lt;Tom &amp; Jerry&gt;");

    let request = Request::builder()
        .uri("/api/v1/books/search?q=TOM")
        .header("x-app-key", test_state.app_key())
        .body(Body::empty())
        .unwrap();
    let page = get_page(&test_state, request).await;
    assert_eq!(page.items[0].name, "<Tom & Jerry>");

    let request = Request::builder()
        .uri("/authors?part=jerry")
        .body(Body::empty())
        .unwrap();
    let response = test_state.generate_response(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response_body = response.into_body().collect().await.unwrap().to_bytes();
    let authors: Vec<String> = serde_json::from_slice(&response_body).unwrap();
    assert_eq!(authors, vec!["Author of &lt;Tom &amp; Jerry&gt;".to_string()]);

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_escape_language_names_on_web() {
    let mut test_state = AppStateTest::new(true).await;

    let uploader = test_state.generate_user().await;
    test_state.generate_category("Drama").await;
    let book = NewBook {
        book_name: "Masks".to_string(),
        author: "Someone".to_string(),
        category: "Drama".to_string(),
        language: "<x>".to_string(),
        description: None,
        cover_url: None,
        book_file: "/books/masks.pdf".to_string(),
        private_book: false,
    };
    insert_book(test_state.pool(), uploader.id, &book)
        .await
        .unwrap();

    let get_languages = |uri: &str, app_key: Option<String>| {
        let mut builder = Request::builder().uri(uri);
        if let Some(app_key) = app_key {
            builder = builder.header("x-app-key", app_key);
        }
        builder.body(Body::empty()).unwrap()
    };

    let response = test_state
        .generate_response(get_languages("/languages", None))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let response_body = response.into_body().collect().await.unwrap().to_bytes();
    let languages: Vec<Language> = serde_json::from_slice(&response_body).unwrap();
    assert_eq!(languages[0].language, "&lt;x&gt;");

    let response = test_state
        .generate_response(get_languages(
            "/api/v1/languages",
            Some(test_state.app_key()),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let response_body = response.into_body().collect().await.unwrap().to_bytes();
    let languages: Vec<Language> = serde_json::from_slice(&response_body).unwrap();
    assert_eq!(languages[0].language, "<x>");

    test_state.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running postgres instance"]
async fn should_tell_unrated_estimation_entries_from_plain_ones() {
    let mut test_state = AppStateTest::new(true).await;

    let uploader = test_state.generate_user().await;
    let category_id = test_state.generate_category("Essays").await;
    test_state
        .generate_book(&uploader, "Essays", "Unrated", false)
        .await;

    let request = Request::builder()
        .uri(format!(
            "/categories/{}/books?criterion=estimation",
            category_id
        ))
        .body(Body::empty())
        .unwrap();
    let page = get_page(&test_state, request).await;
    assert_eq!(page.items[0].rating, Some(None));

    let request = Request::builder()
        .uri(format!("/categories/{}/books", category_id))
        .body(Body::empty())
        .unwrap();
    let page = get_page(&test_state, request).await;
    assert_eq!(page.items[0].rating, None);

    test_state.cleanup().await;
}
