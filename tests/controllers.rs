use std::sync::Arc;

use messenger_client::context::ApplicationContext;
use messenger_client::controller::{
    Controller, MessagesController, PeopleController, PersonFilter, PreferencesController,
    PreferencesUpdate,
};
use messenger_client::rest::RestError;
use mockito::Matcher;
use serde_json::{json, Value};

fn owner_document() -> Value {
    json!({
        "identity": 5,
        "version": 1,
        "creationTimestamp": 1380000000000i64,
        "email": "ann@example.org",
        "group": "USER",
        "name": {"given": "Ann", "family": "Lee"},
        "address": {"street": "Main 1", "postcode": "10115", "city": "Berlin"},
        "peopleObservingReferences": [4],
        "peopleObservedReferences": [3]
    })
}

fn person_document(identity: i64, email: &str, given: &str) -> Value {
    json!({
        "identity": identity,
        "email": email,
        "name": {"given": given, "family": "Roe"},
        "address": {"street": "", "postcode": "", "city": ""}
    })
}

async fn signed_on_context(server: &mut mockito::ServerGuard) -> Arc<ApplicationContext> {
    server
        .mock("GET", "/people/requester")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(owner_document().to_string())
        .create_async()
        .await;

    let context = Arc::new(ApplicationContext::new(&server.url()).unwrap());
    context
        .sign_on("ann@example.org", "secret")
        .await
        .unwrap();
    context
}

#[tokio::test]
async fn test_sign_on_failure_leaves_no_session() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/people/requester")
        .with_status(401)
        .create_async()
        .await;

    let context = ApplicationContext::new(&server.url()).unwrap();
    let result = context.sign_on("ann@example.org", "wrong").await;

    assert!(matches!(result, Err(RestError::Http { status: 401, .. })));
    assert!(context.session_owner().await.is_none());
    assert!(!context.rest().has_credentials().await);
}

#[tokio::test]
async fn test_controllers_require_a_session() {
    let server = mockito::Server::new_async().await;
    let context = Arc::new(ApplicationContext::new(&server.url()).unwrap());

    let result = MessagesController::new(context).display().await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_root_messages_merge_and_sort_by_identity() {
    let mut server = mockito::Server::new_async().await;
    let context = signed_on_context(&mut server).await;

    // subject 3 is observed, subject 5 is the owner
    server
        .mock("GET", "/entities/3/messagesCaused")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{"identity": 9, "body": "later", "authorReference": 4, "subjectReference": 3}])
                .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/entities/5/messagesCaused")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{"identity": 8, "body": "earlier", "authorReference": 4, "subjectReference": 5}])
                .to_string(),
        )
        .create_async()
        .await;

    // both messages share one author, resolved through the cache exactly once
    let author = server
        .mock("GET", "/entities/4")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(person_document(4, "kim@example.org", "Kim").to_string())
        .expect(1)
        .create_async()
        .await;

    let views = MessagesController::new(context).display().await.unwrap();

    let identities: Vec<i64> = views.iter().map(|view| view.message.identity).collect();
    assert_eq!(identities, vec![8, 9]);
    assert!(views.iter().all(|view| view.author_email == "kim@example.org"));
    author.assert_async().await;
}

#[tokio::test]
async fn test_root_messages_skip_unreadable_subjects() {
    let mut server = mockito::Server::new_async().await;
    let context = signed_on_context(&mut server).await;

    server
        .mock("GET", "/entities/3/messagesCaused")
        .with_status(403)
        .create_async()
        .await;
    server
        .mock("GET", "/entities/5/messagesCaused")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{"identity": 8, "body": "mine", "authorReference": 4, "subjectReference": 5}])
                .to_string(),
        )
        .create_async()
        .await;
    server
        .mock("GET", "/entities/4")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(person_document(4, "kim@example.org", "Kim").to_string())
        .create_async()
        .await;

    let views = MessagesController::new(context).display().await.unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].message.body, "mine");
}

#[tokio::test]
async fn test_post_message_returns_the_new_identity() {
    let mut server = mockito::Server::new_async().await;
    let context = signed_on_context(&mut server).await;

    let mock = server
        .mock("POST", "/messages")
        .match_query(Matcher::UrlEncoded(
            "subjectReference".into(),
            "3".into(),
        ))
        .match_header("content-type", "text/plain")
        .match_body("hello there")
        .with_status(200)
        .with_body("42")
        .expect(1)
        .create_async()
        .await;

    let identity = MessagesController::new(context)
        .post_message(3, "hello there")
        .await
        .unwrap();

    assert_eq!(identity, 42);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_query_people_transmits_only_populated_criteria() {
    let mut server = mockito::Server::new_async().await;
    let context = signed_on_context(&mut server).await;

    server
        .mock("GET", "/people")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("forename".into(), "Kim".into()),
            Matcher::UrlEncoded("resultLimit".into(), "25".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([person_document(4, "kim@example.org", "Kim")]).to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/entities/4")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(person_document(4, "kim@example.org", "Kim").to_string())
        .create_async()
        .await;

    let filter = PersonFilter {
        forename: Some("Kim".to_string()),
        surname: Some(String::new()),
        result_limit: Some(25),
        ..PersonFilter::default()
    };
    let tiles = PeopleController::new(context)
        .query_people(&filter)
        .await
        .unwrap();

    assert_eq!(tiles.len(), 1);
    assert_eq!(tiles[0].caption, "Kim");
    assert_eq!(tiles[0].title, "Kim Roe");
    assert!(tiles[0].avatar_uri.ends_with("/people/4/avatar"));
}

#[tokio::test]
async fn test_toggle_observation_sends_the_form_encoded_references() {
    let mut server = mockito::Server::new_async().await;
    let context = signed_on_context(&mut server).await;

    let update = server
        .mock("PUT", "/people/5/peopleObserved")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body("peopleObserved=3&peopleObserved=7")
        .with_status(204)
        .expect(1)
        .create_async()
        .await;

    let mut refreshed = owner_document();
    refreshed["peopleObservedReferences"] = json!([3, 7]);
    server
        .mock("GET", "/people/5")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(refreshed.to_string())
        .create_async()
        .await;

    let owner = PeopleController::new(context.clone())
        .toggle_observation(7)
        .await
        .unwrap();

    assert_eq!(owner.people_observed_references, vec![3, 7]);
    // the refreshed owner replaces the retained session owner
    assert_eq!(
        context.session_owner().await.unwrap().people_observed_references,
        vec![3, 7]
    );
    update.assert_async().await;
}

#[tokio::test]
async fn test_persist_preferences_updates_and_reauthenticates() {
    let mut server = mockito::Server::new_async().await;
    let context = signed_on_context(&mut server).await;

    let update = server
        .mock("POST", "/people")
        .match_header("content-type", "application/json")
        .match_header("set-password", "changed")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJsonString(r#"{"name": {"given": "Anna"}}"#.to_string()),
            Matcher::PartialJsonString(r#"{"email": "ann@example.org"}"#.to_string()),
        ]))
        .with_status(200)
        .with_body("5")
        .expect(1)
        .create_async()
        .await;

    let controller = PreferencesController::new(context.clone());
    let owner = controller
        .persist(
            &PreferencesUpdate {
                given: Some("Anna".to_string()),
                ..PreferencesUpdate::default()
            },
            Some("changed"),
        )
        .await
        .unwrap();

    assert_eq!(owner.identity, 5);
    update.assert_async().await;
}

#[tokio::test]
async fn test_avatar_tiles_preserve_input_order() {
    let mut server = mockito::Server::new_async().await;
    let context = signed_on_context(&mut server).await;

    for (identity, given) in [(3, "Jo"), (4, "Kim")] {
        server
            .mock("GET", &*format!("/entities/{identity}"))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                person_document(identity, &format!("{given}@example.org"), given).to_string(),
            )
            .create_async()
            .await;
    }

    let view = PeopleController::new(context).display().await.unwrap();

    // observing slider lists person 4, observed slider person 3
    assert_eq!(view.observing.len(), 1);
    assert_eq!(view.observing[0].person.identity, 4);
    assert_eq!(view.observed.len(), 1);
    assert_eq!(view.observed[0].person.identity, 3);
}
