//! Mediator-level access and concurrency tests
//!
//! Uses `ServerState::initialize` so the wiring matches the HTTP server.

use std::collections::BTreeMap;
use std::sync::Barrier;

use menu_server::core::BossAccount;
use menu_server::mediator::{ContentRequest, ContentResponse, ProfileRequest, ProfileResponse};
use menu_server::store::ListQuery;
use menu_server::{Config, CurrentUser, ServerState};
use serde_json::json;
use shared::models::{
    Attributes, AttributesPatch, Entity, EntityDraft, EntityKind, Role, Translation, UserCreate,
};
use shared::{ErrorCode, Locale};
use tokio_util::sync::CancellationToken;

fn state() -> (ServerState, CurrentUser) {
    let mut config = Config::for_tests();
    config.boss = Some(BossAccount {
        username: "boss".into(),
        email: "boss@menu.test".into(),
        password: "bosspass123".into(),
    });
    let state = ServerState::initialize(&config).unwrap();
    let boss = state.users.find_by_username("boss").unwrap();
    (state, CurrentUser::from(&boss))
}

fn employee(state: &ServerState, boss: &CurrentUser, username: &str) -> CurrentUser {
    let response = state
        .mediator
        .handle_profile(
            Some(boss),
            ProfileRequest::CreateEmployee {
                payload: UserCreate {
                    username: username.into(),
                    name: username.into(),
                    email: format!("{username}@menu.test"),
                    password: "cookpass123".into(),
                },
            },
            &CancellationToken::new(),
        )
        .unwrap();
    let ProfileResponse::User(user) = response else {
        panic!("expected user");
    };
    CurrentUser::from(&user)
}

fn written(response: ContentResponse) -> Entity {
    match response {
        ContentResponse::Written(entity) => entity,
        other => panic!("expected written entity, got {other:?}"),
    }
}

fn create(state: &ServerState, caller: &CurrentUser, kind: EntityKind, body: serde_json::Value) -> Entity {
    let draft = EntityDraft::from_json(kind, body).unwrap();
    written(
        state
            .mediator
            .handle(
                Some(caller),
                ContentRequest::Create { kind, draft },
                &CancellationToken::new(),
            )
            .unwrap(),
    )
}

fn loc(code: &str) -> Locale {
    Locale::parse(code).unwrap()
}

#[test]
fn test_employee_and_boss_ownership() {
    let (state, boss) = state();
    let cook = employee(&state, &boss, "cook");
    let cancel = CancellationToken::new();

    let mine = create(&state, &cook, EntityKind::Product, json!({ "attributes": { "price": 4.5 } }));
    assert_eq!(mine.owner, Some(cook.id));
    let theirs = create(&state, &boss, EntityKind::Product, json!({ "attributes": { "price": 7.0 } }));

    let err = state
        .mediator
        .handle(
            Some(&cook),
            ContentRequest::Delete {
                kind: EntityKind::Product,
                id: theirs.id,
            },
            &cancel,
        )
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::PermissionDenied);

    let translated = written(
        state
            .mediator
            .handle(
                Some(&cook),
                ContentRequest::UpsertTranslation {
                    kind: EntityKind::Product,
                    id: mine.id,
                    locale: loc("en"),
                    translation: Translation::new("Empanada", None),
                },
                &cancel,
            )
            .unwrap(),
    );
    assert_eq!(translated.version, 2);

    // Route kind must match the stored kind
    let err = state
        .mediator
        .handle(
            Some(&boss),
            ContentRequest::Delete {
                kind: EntityKind::Category,
                id: mine.id,
            },
            &cancel,
        )
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::EntityNotFound);

    for id in [mine.id, theirs.id] {
        let response = state
            .mediator
            .handle(
                Some(&boss),
                ContentRequest::Delete {
                    kind: EntityKind::Product,
                    id,
                },
                &cancel,
            )
            .unwrap();
        assert_eq!(response, ContentResponse::Deleted { id, deleted: true });
    }
    assert!(state.content.is_empty());
}

#[test]
fn test_concurrent_upserts_leave_one_winner() {
    const WRITERS: usize = 8;
    let (state, boss) = state();
    let product = create(&state, &boss, EntityKind::Product, json!({ "attributes": { "price": 1.0 } }));
    let barrier = Barrier::new(WRITERS);

    std::thread::scope(|scope| {
        for n in 0..WRITERS {
            let state = &state;
            let boss = &boss;
            let barrier = &barrier;
            scope.spawn(move || {
                barrier.wait();
                state
                    .mediator
                    .handle(
                        Some(boss),
                        ContentRequest::UpsertTranslation {
                            kind: EntityKind::Product,
                            id: product.id,
                            locale: loc("es"),
                            translation: Translation::new(format!("Nombre {n}"), None),
                        },
                        &CancellationToken::new(),
                    )
                    .unwrap();
            });
        }
    });

    let entity = state.content.get_entity(product.id).unwrap();
    assert_eq!(entity.version, 1 + WRITERS as u64);
    assert_eq!(entity.translations.len(), 1);
    let name = &entity.translations[&loc("es")].name;
    assert!((0..WRITERS).any(|n| *name == format!("Nombre {n}")));
}

#[test]
fn test_concurrent_deletes_succeed_once() {
    const DELETERS: usize = 6;
    let (state, boss) = state();
    let category = create(&state, &boss, EntityKind::Category, json!({}));
    let barrier = Barrier::new(DELETERS);

    let outcomes: Vec<Result<(), ErrorCode>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..DELETERS)
            .map(|_| {
                let state = &state;
                let boss = &boss;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    state
                        .mediator
                        .handle(
                            Some(boss),
                            ContentRequest::Delete {
                                kind: EntityKind::Category,
                                id: category.id,
                            },
                            &CancellationToken::new(),
                        )
                        .map(|_| ())
                        .map_err(|e| e.code)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    assert!(
        outcomes
            .iter()
            .filter_map(|o| o.as_ref().err())
            .all(|code| *code == ErrorCode::EntityNotFound)
    );
}

#[test]
fn test_deleting_category_prunes_product_references() {
    let (state, boss) = state();
    let category = create(&state, &boss, EntityKind::Category, json!({}));
    let product = create(
        &state,
        &boss,
        EntityKind::Product,
        json!({ "attributes": { "price": 8.0, "categories": [category.id] } }),
    );

    state
        .mediator
        .handle(
            Some(&boss),
            ContentRequest::Delete {
                kind: EntityKind::Category,
                id: category.id,
            },
            &CancellationToken::new(),
        )
        .unwrap();

    let product = state.content.get_entity(product.id).unwrap();
    let Attributes::Product(attrs) = product.attributes else {
        panic!("expected product attributes");
    };
    assert!(attrs.categories.is_empty());
}

#[test]
fn test_category_delete_racing_writers_leaves_no_dangling_reference() {
    const WRITERS: usize = 6;
    let (state, boss) = state();
    let category = create(&state, &boss, EntityKind::Category, json!({}));
    let existing: Vec<Entity> = (0..WRITERS)
        .map(|_| create(&state, &boss, EntityKind::Product, json!({ "attributes": { "price": 3.0 } })))
        .collect();
    let barrier = Barrier::new(2 * WRITERS + 1);

    std::thread::scope(|scope| {
        for product in &existing {
            let (state, boss, barrier) = (&state, &boss, &barrier);
            scope.spawn(move || {
                let patch = AttributesPatch::from_json(
                    EntityKind::Product,
                    json!({ "categories": [category.id] }),
                )
                .unwrap();
                barrier.wait();
                let result = state.mediator.handle(
                    Some(boss),
                    ContentRequest::Update {
                        kind: EntityKind::Product,
                        id: product.id,
                        patch,
                        expected_version: None,
                    },
                    &CancellationToken::new(),
                );
                if let Err(e) = result {
                    assert_eq!(e.code, ErrorCode::UnknownReference);
                }
            });
        }
        for _ in 0..WRITERS {
            let (state, boss, barrier) = (&state, &boss, &barrier);
            scope.spawn(move || {
                let draft = EntityDraft::from_json(
                    EntityKind::Product,
                    json!({ "attributes": { "price": 5.0, "categories": [category.id] } }),
                )
                .unwrap();
                barrier.wait();
                let result = state.mediator.handle(
                    Some(boss),
                    ContentRequest::Create {
                        kind: EntityKind::Product,
                        draft,
                    },
                    &CancellationToken::new(),
                );
                if let Err(e) = result {
                    assert_eq!(e.code, ErrorCode::UnknownReference);
                }
            });
        }
        barrier.wait();
        state
            .mediator
            .handle(
                Some(&boss),
                ContentRequest::Delete {
                    kind: EntityKind::Category,
                    id: category.id,
                },
                &CancellationToken::new(),
            )
            .unwrap();
    });

    let products = state
        .content
        .list(EntityKind::Product, &ListQuery::default())
        .unwrap();
    assert!(products.len() >= WRITERS);
    for product in products {
        let Attributes::Product(attrs) = product.attributes else {
            panic!("expected product attributes");
        };
        assert!(!attrs.categories.contains(&category.id));
    }
}

#[test]
fn test_price_update_after_category_delete() {
    let (state, boss) = state();
    let category = create(&state, &boss, EntityKind::Category, json!({}));
    let product = create(
        &state,
        &boss,
        EntityKind::Product,
        json!({ "attributes": { "price": 8.0, "categories": [category.id] } }),
    );
    state
        .content
        .delete_entity(category.id, &CancellationToken::new())
        .unwrap();

    let patch = AttributesPatch::from_json(EntityKind::Product, json!({ "price": 9.5 })).unwrap();
    let updated = written(
        state
            .mediator
            .handle(
                Some(&boss),
                ContentRequest::Update {
                    kind: EntityKind::Product,
                    id: product.id,
                    patch,
                    expected_version: None,
                },
                &CancellationToken::new(),
            )
            .unwrap(),
    );
    assert_eq!(updated.version, 3);
}

#[test]
fn test_stale_version_and_cancelled_requests() {
    let (state, boss) = state();
    let product = create(&state, &boss, EntityKind::Product, json!({ "attributes": { "price": 2.0 } }));
    let patch = AttributesPatch::from_json(EntityKind::Product, json!({ "stock": 9 })).unwrap();

    let err = state
        .mediator
        .handle(
            Some(&boss),
            ContentRequest::Update {
                kind: EntityKind::Product,
                id: product.id,
                patch: patch.clone(),
                expected_version: Some(5),
            },
            &CancellationToken::new(),
        )
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::VersionConflict);
    assert!(err.is_retryable());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = state
        .mediator
        .handle(
            Some(&boss),
            ContentRequest::Update {
                kind: EntityKind::Product,
                id: product.id,
                patch,
                expected_version: Some(1),
            },
            &cancel,
        )
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::RequestCancelled);
    assert_eq!(state.content.get_entity(product.id).unwrap().version, 1);
}

#[test]
fn test_listing_resolves_every_entity() {
    let (state, boss) = state();
    for (en, de) in [("Water", Some("Wasser")), ("Beer", None)] {
        let mut translations = BTreeMap::new();
        translations.insert("en".to_string(), json!({ "name": en }));
        if let Some(de) = de {
            translations.insert("de".to_string(), json!({ "name": de }));
        }
        create(
            &state,
            &boss,
            EntityKind::Product,
            json!({ "attributes": { "price": 2.0 }, "translations": translations }),
        );
    }

    let response = state
        .mediator
        .handle(
            None,
            ContentRequest::List {
                kind: EntityKind::Product,
                query: ListQuery {
                    ordering: Some("created_at".into()),
                    ..Default::default()
                },
                locale: Some("de-AT".into()),
            },
            &CancellationToken::new(),
        )
        .unwrap();
    let ContentResponse::List(items) = response else {
        panic!("expected list");
    };
    let mut names: Vec<_> = items.iter().filter_map(|i| i.name.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["Beer".to_string(), "Wasser".to_string()]);
}

#[test]
fn test_deactivated_boss_loses_access() {
    let (state, boss) = state();
    let other_boss = employee(&state, &boss, "deputy");
    let cancel = CancellationToken::new();
    state
        .mediator
        .handle_profile(
            Some(&boss),
            ProfileRequest::ChangeRole {
                user_id: other_boss.id,
                role: Role::Boss,
            },
            &cancel,
        )
        .unwrap();
    state
        .mediator
        .handle_profile(
            Some(&boss),
            ProfileRequest::Deactivate {
                user_id: other_boss.id,
            },
            &cancel,
        )
        .unwrap();

    assert_eq!(state.users.credential_state(other_boss.id), Some((3, false)));
}
