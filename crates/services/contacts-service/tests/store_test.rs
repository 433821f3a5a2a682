//! Document store adapter integration tests.
//!
//! Every scenario runs against both the in-process backend and SQLite.

use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use common::StoreConfig;
use contacts_service_lib::schemas::Collections;
use contacts_service_lib::store::{
    Condition, Connection, DocumentHandler, FieldKind, FieldSpec, Projection, SchemaDescriptor,
    StoreError,
};
use domain::{Group, NewGroup, UpdateGroup};

async fn memory_store() -> DocumentHandler {
    DocumentHandler::new(Connection::init("memory://").await.unwrap())
}

async fn sqlite_store() -> DocumentHandler {
    let config = StoreConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
    };
    DocumentHandler::new(Connection::init_with(&config).await.unwrap())
}

async fn round_trip(store: DocumentHandler) {
    let models = Collections::register(&store).unwrap();

    let added = store
        .add_document(&models.groups, &NewGroup::new("Friends", "Close friends", "u1"))
        .await
        .unwrap();
    let value = serde_json::to_value(&added).unwrap();
    assert!(value.get("_id").is_none());
    assert!(value.get("__v").is_none());

    let found = store
        .search_by_id(&models.groups, &added.id, None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, added);

    let group: Group = found.into_entity().unwrap();
    assert_eq!(group.max_contacts, 50);

    let patch = UpdateGroup {
        max_contacts: Some(10),
        ..Default::default()
    };
    let edited = store
        .edit_document(&models.groups, &added.id, &patch)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(edited.get("maxContacts"), Some(&json!(10)));
    assert_eq!(edited.get_str("name"), Some("Friends"));

    let removed = store.remove_document(&models.groups, &added.id).await.unwrap();
    assert_eq!(removed.map(|d| d.id), Some(added.id.clone()));
    assert!(store
        .search_by_id(&models.groups, &added.id, None)
        .await
        .unwrap()
        .is_none());
}

async fn relations_and_conditions(store: DocumentHandler) {
    let models = Collections::register(&store).unwrap();

    let owner = store
        .add_document(
            &models.users,
            &json!({
                "username": "alice01",
                "email": "alice@example.com",
                "passwordHash": "$argon2id$hash"
            }),
        )
        .await
        .unwrap();
    for name in ["Friends", "Work"] {
        store
            .add_document(
                &models.groups,
                &NewGroup::new(name, "Some people", owner.id.as_str()),
            )
            .await
            .unwrap();
    }
    store
        .add_document(&models.groups, &NewGroup::new("Other", "Not hers", "u2"))
        .await
        .unwrap();

    let owned = store
        .search_many(
            &models.groups,
            &Condition::new().eq("idUser", owner.id.as_str()),
            None,
        )
        .await
        .unwrap();
    assert_eq!(owned.len(), 2);

    let related = store
        .search_relations(&models.groups, Some(owner.id.as_str()), "idUser")
        .await
        .unwrap();
    assert_eq!(related.len(), 2);
    for group in &related {
        let embedded = group.get("idUser").unwrap();
        assert_eq!(embedded["id"], json!(owner.id));
        assert_eq!(embedded["username"], "alice01");
    }

    let names = Projection::include(["name"]);
    let projected = store
        .search_one(&models.groups, &Condition::new().eq("name", "Other"), Some(&names))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(projected.fields.len(), 1);
    assert_eq!(projected.get_str("name"), Some("Other"));

    assert_eq!(store.search_all(&models.groups, None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_round_trip_memory() {
    round_trip(memory_store().await).await;
}

#[tokio::test]
async fn test_round_trip_sqlite() {
    round_trip(sqlite_store().await).await;
}

#[tokio::test]
async fn test_relations_memory() {
    relations_and_conditions(memory_store().await).await;
}

#[tokio::test]
async fn test_relations_sqlite() {
    relations_and_conditions(sqlite_store().await).await;
}

#[tokio::test]
async fn test_dynamic_model() {
    let store = memory_store().await;
    let notes = store
        .define_model(
            "notes",
            SchemaDescriptor::new()
                .field("text", FieldSpec::string().required())
                .field(
                    "pinned",
                    FieldSpec::new(FieldKind::Boolean).default_value(false),
                ),
        )
        .unwrap();

    let note = assert_ok!(store.add_document(&notes, &json!({ "text": "call Bob" })).await);
    assert_eq!(note.get("pinned"), Some(&json!(false)));

    let err = assert_err!(store.add_document(&notes, &json!({ "pinned": true })).await);
    assert!(err.is_validation());
    assert_eq!(
        serde_json::to_value(&err).unwrap(),
        json!({ "error": "Validation failed for model notes: Path `text` is required." })
    );
}

#[tokio::test]
async fn test_unknown_ids_are_not_errors() {
    let store = sqlite_store().await;
    let models = Collections::register(&store).unwrap();

    assert!(assert_ok!(store.search_by_id(&models.groups, "not-an-id", None).await).is_none());
    assert!(assert_ok!(store.remove_document(&models.groups, "not-an-id").await).is_none());
    assert!(assert_ok!(
        store
            .edit_document(&models.groups, "not-an-id", &json!({ "name": "X" }))
            .await
    )
    .is_none());
}

#[tokio::test]
async fn test_shutdown_disconnects_sqlite() {
    let store = sqlite_store().await;
    let models = Collections::register(&store).unwrap();

    assert!(store.connection().is_connected());
    assert_ok!(store.connection().shutdown().await);
    assert!(!store.connection().is_connected());

    let result = store.search_all(&models.groups, None).await;
    assert_eq!(result, Err(StoreError::Disconnected));
}

#[tokio::test]
async fn test_sqlite_conditions_on_arrays_and_ids() {
    let store = sqlite_store().await;
    let tags = store
        .define_model(
            "tags",
            SchemaDescriptor::new()
                .field("label", FieldSpec::string().required())
                .field("members", FieldSpec::string_array().default_value(json!([])))
                .field("weight", FieldSpec::number()),
        )
        .unwrap();

    let red = assert_ok!(
        store
            .add_document(&tags, &json!({ "label": "red", "members": ["c1", "c2"], "weight": 1 }))
            .await
    );
    assert_ok!(
        store
            .add_document(&tags, &json!({ "label": "blue", "members": ["c3"], "weight": 2 }))
            .await
    );

    let with_c2 = assert_ok!(
        store
            .search_many(&tags, &Condition::new().eq("members", "c2"), None)
            .await
    );
    assert_eq!(with_c2.len(), 1);
    assert_eq!(with_c2[0].id, red.id);

    let by_id = assert_ok!(
        store
            .search_many(&tags, &Condition::new().eq("id", red.id.as_str()), None)
            .await
    );
    assert_eq!(by_id.len(), 1);

    let by_label_and_weight = assert_ok!(
        store
            .search_many(
                &tags,
                &Condition::new().eq("label", "blue").eq("weight", 2),
                None,
            )
            .await
    );
    assert_eq!(by_label_and_weight.len(), 1);

    let mismatch = assert_ok!(
        store
            .search_many(
                &tags,
                &Condition::new().eq("label", "red").eq("members", "c3"),
                None,
            )
            .await
    );
    assert!(mismatch.is_empty());
}
