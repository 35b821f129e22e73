mod common;

use common::{memory_repositories, memory_stack, sample_document, sample_user};
use docsys::changes::NotificationOutcome;
use docsys::messaging::{ChangeEvent, MessageEnvelope, MessageStream};
use docsys::models::{DocumentPatch, UserPatch};
use docsys::repository::RepositoryError;
use docsys::search::{IndexedField, SearchEngine};
use std::collections::HashSet;
use std::time::Duration;

#[tokio::test]
async fn test_created_ids_are_unique_and_timestamps_equal() {
    let (repos, _) = memory_repositories();

    let mut ids = HashSet::new();
    for _ in 0..20 {
        let created = repos.documents.create(sample_document(), None).await.unwrap();
        assert!(!created.id.is_empty());
        assert!(ids.insert(created.id.clone()), "duplicate id {}", created.id);

        let doc = repos.documents.get_by_id(&created.id).await.unwrap();
        assert_eq!(doc.created_at, doc.updated_at);
    }
}

#[tokio::test]
async fn test_get_returns_created_fields() {
    let (repos, _) = memory_repositories();
    let input = sample_document();

    let created = repos.documents.create(input.clone(), None).await.unwrap();
    let doc = repos.documents.get_by_id(&created.id).await.unwrap();

    assert_eq!(doc.id, created.id);
    assert_eq!(doc.name, input.name);
    assert_eq!(doc.description, input.description);
    assert_eq!(doc.extension, input.extension);
    assert_eq!(doc.path, input.path);
    assert_eq!(doc.mime_type, input.mime_type);
}

#[tokio::test]
async fn test_update_reflects_patch_and_advances_updated_at() {
    let (repos, _) = memory_repositories();
    let created = repos.documents.create(sample_document(), None).await.unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;

    let patch = DocumentPatch::default().name("b.txt").description("d2");
    assert!(repos.documents.update(&created.id, patch).await.unwrap());

    let doc = repos.documents.get_by_id(&created.id).await.unwrap();
    assert_eq!(doc.name, "b.txt");
    assert_eq!(doc.description, "d2");
    assert_eq!(doc.extension, ".txt");
    assert!(doc.updated_at > doc.created_at);
}

#[tokio::test]
async fn test_update_missing_id_is_not_found() {
    let (repos, _) = memory_repositories();
    repos.documents.create(sample_document(), None).await.unwrap();

    let err = repos
        .documents
        .update("6f1c2a9e-0000-0000-0000-000000000000", DocumentPatch::default().description("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { entity: "document", .. }));
}

#[tokio::test]
async fn test_update_only_touches_the_addressed_record() {
    let (repos, _) = memory_repositories();
    let first = repos.documents.create(sample_document(), None).await.unwrap();
    let second = repos.documents.create(sample_document(), None).await.unwrap();

    repos
        .documents
        .update(&first.id, DocumentPatch::default().description("changed"))
        .await
        .unwrap();

    let untouched = repos.documents.get_by_id(&second.id).await.unwrap();
    assert_eq!(untouched.description, "d");
}

#[tokio::test]
async fn test_update_values_are_data_not_code() {
    let (repos, _) = memory_repositories();
    let created = repos.documents.create(sample_document(), None).await.unwrap();

    let hostile = "'; ctx.op = 'delete'; '";
    repos
        .documents
        .update(&created.id, DocumentPatch::default().description(hostile))
        .await
        .unwrap();

    let doc = repos.documents.get_by_id(&created.id).await.unwrap();
    assert_eq!(doc.description, hostile);
}

#[tokio::test]
async fn test_delete_then_get_is_not_found() {
    let (repos, _) = memory_repositories();
    let created = repos.documents.create(sample_document(), None).await.unwrap();

    assert!(repos.documents.delete(&created.id).await.unwrap());
    assert!(repos
        .documents
        .get_by_id(&created.id)
        .await
        .unwrap_err()
        .is_not_found());

    // second delete finds nothing
    assert!(repos
        .documents
        .delete(&created.id)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_get_all_on_empty_index_is_empty() {
    let (repos, engine) = memory_repositories();
    repos.documents.index().ensure_index().await.unwrap();
    assert!(engine.index_exists("documents_19092022").await.unwrap());

    assert!(repos.documents.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_all_lists_every_document() {
    let (repos, _) = memory_repositories();
    for _ in 0..3 {
        repos.documents.create(sample_document(), None).await.unwrap();
    }
    assert_eq!(repos.documents.get_all().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_check_email_exists_before_and_after_create() {
    let (repos, _) = memory_repositories();
    let email = "ada@example.com";

    assert!(!repos.users.check_email_exists(email).await.unwrap());

    repos.users.create(sample_user(email)).await.unwrap();
    repos.users.index().refresh().await.unwrap();

    assert!(repos.users.check_email_exists(email).await.unwrap());
    assert!(!repos.users.check_email_exists("other@example.com").await.unwrap());
}

#[tokio::test]
async fn test_email_lookup_is_exact() {
    let (repos, _) = memory_repositories();
    repos.users.create(sample_user("ada@example.com")).await.unwrap();

    // a phrase match on analyzed text would accept these
    assert!(!repos.users.check_email_exists("example.com").await.unwrap());
    assert!(!repos.users.check_email_exists("ADA@example.com").await.unwrap());
    assert_eq!(IndexedField::Email.path(), "email");

    let user = repos.users.get_by_email("ada@example.com").await.unwrap();
    assert_eq!(user.username, "ada");
    assert!(repos
        .users
        .get_by_email("nobody@example.com")
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let (repos, _) = memory_repositories();

    repos.users.register(sample_user("ada@example.com")).await.unwrap();
    let err = repos
        .users
        .register(sample_user("ada@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
}

#[tokio::test]
async fn test_user_update_and_delete() {
    let (repos, _) = memory_repositories();
    let created = repos.users.create(sample_user("ada@example.com")).await.unwrap();

    repos
        .users
        .update(&created.id, UserPatch::default().role("viewer"))
        .await
        .unwrap();
    let user = repos.users.get_by_id(&created.id).await.unwrap();
    assert_eq!(user.role, "viewer");
    assert_eq!(user.email, "ada@example.com");

    repos.users.delete(&created.id).await.unwrap();
    assert!(repos.users.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_document_scenario() {
    let (repos, messaging, _bus) = memory_stack();
    let mut stream = messaging.subscribe("doc-system").await.unwrap();

    let created = repos
        .documents
        .create(sample_document(), Some("user-42"))
        .await
        .unwrap();
    assert!(uuid::Uuid::parse_str(&created.id).is_ok());
    assert_eq!(created.notification, NotificationOutcome::Published);

    let doc = repos.documents.get_by_id(&created.id).await.unwrap();
    assert_eq!(doc.name, "a.txt");
    assert_eq!(doc.mime_type, "text/plain");

    tokio::time::sleep(Duration::from_millis(5)).await;
    repos
        .documents
        .update(&created.id, DocumentPatch::default().description("d2"))
        .await
        .unwrap();

    let updated = repos.documents.get_by_id(&created.id).await.unwrap();
    assert_eq!(updated.description, "d2");
    assert!(updated.updated_at > doc.updated_at);
    assert_eq!(updated.created_at, doc.created_at);

    let message = stream.next().await.unwrap().unwrap();
    let envelope: MessageEnvelope<ChangeEvent> = serde_json::from_str(&message.payload).unwrap();
    assert_eq!(
        envelope.payload,
        ChangeEvent::DocumentCreated {
            document_id: created.id.clone(),
            name: "a.txt".to_string(),
            description: "d".to_string(),
            extension: ".txt".to_string(),
            path: "p".to_string(),
            mime_type: "text/plain".to_string(),
            user_id: Some("user-42".to_string()),
        }
    );
}
