//! End-to-end search consistency: every committed write to a searchable
//! entity is reflected by the next query, and the index rebuilds cleanly
//! from the primary store.

use e2e_tests::spawn_app;

#[test]
fn search_reflects_committed_posts() {
    let app = spawn_app(true);
    let alice = app.engine.create_user("alice", "alice@example.com").unwrap();
    let bob = app.engine.create_user("bob", "bob@example.com").unwrap();

    let hello = app
        .engine
        .publish_post(&alice.user_id, "hello", None)
        .unwrap();
    app.engine.publish_post(&bob.user_id, "world", None).unwrap();

    let page = app.engine.search_posts("hello", 1, 10).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].post_id, hello.post_id);

    let miss = app.engine.search_posts("xyz", 1, 10).unwrap();
    assert_eq!(miss.total, 0);
    assert!(miss.items.is_empty());
}

#[test]
fn deleting_a_post_removes_it_from_results() {
    let app = spawn_app(true);
    let user = app.engine.create_user("carol", "carol@example.com").unwrap();

    let keep = app
        .engine
        .publish_post(&user.user_id, "shared topic kept", None)
        .unwrap();
    let drop = app
        .engine
        .publish_post(&user.user_id, "shared topic dropped", None)
        .unwrap();

    assert_eq!(app.engine.search_posts("shared", 1, 10).unwrap().total, 2);

    app.engine.delete_post(&drop.post_id).unwrap();

    let page = app.engine.search_posts("shared", 1, 10).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].post_id, keep.post_id);
    assert!(!page.items.iter().any(|p| p.post_id == drop.post_id));
}

#[test]
fn editing_a_post_indexes_current_values() {
    let app = spawn_app(true);
    let user = app.engine.create_user("dave", "dave@example.com").unwrap();
    let post = app
        .engine
        .publish_post(&user.user_id, "about gardening", None)
        .unwrap();

    app.engine.edit_post(&post.post_id, "about astronomy").unwrap();

    assert_eq!(app.engine.search_posts("astronomy", 1, 10).unwrap().total, 1);
    assert_eq!(app.engine.search_posts("gardening", 1, 10).unwrap().total, 0);
}

#[test]
fn search_results_paginate_with_exact_totals() {
    let app = spawn_app(true);
    let user = app.engine.create_user("erin", "erin@example.com").unwrap();
    for i in 0..5 {
        app.engine
            .publish_post(&user.user_id, &format!("pagination filler {}", i), None)
            .unwrap();
    }

    let page1 = app.engine.search_posts("pagination", 1, 2).unwrap();
    assert_eq!(page1.total, 5);
    assert_eq!(page1.items.len(), 2);
    assert!(page1.has_next());
    assert!(!page1.has_prev());

    let page3 = app.engine.search_posts("pagination", 3, 2).unwrap();
    assert_eq!(page3.items.len(), 1);
    assert!(!page3.has_next());

    // Past the end: empty page, total intact.
    let page9 = app.engine.search_posts("pagination", 9, 2).unwrap();
    assert!(page9.items.is_empty());
    assert_eq!(page9.total, 5);
}

#[test]
fn rebuild_restores_a_lost_index() {
    let app = spawn_app(true);
    let user = app.engine.create_user("frank", "frank@example.com").unwrap();
    for body in ["alpha beta", "beta gamma", "gamma delta"] {
        app.engine.publish_post(&user.user_id, body, None).unwrap();
    }

    let stats = app.engine.rebuild_index().unwrap();
    assert!(stats.completed);
    assert_eq!(stats.indexed, 3);

    assert_eq!(app.engine.search_posts("beta", 1, 10).unwrap().total, 2);
    assert_eq!(app.engine.search_posts("delta", 1, 10).unwrap().total, 1);
}
