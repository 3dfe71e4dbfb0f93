//! Direct messages and change subscriptions against a migrated database.

#![allow(clippy::unwrap_used)]

mod common;

use aibuilders_common::AppError;
use aibuilders_core::{ChangeOperation, Table};

#[tokio::test]
async fn send_then_list_returns_the_message() {
    let h = common::harness().await;
    let a = h.seed_user("alice").await;
    let b = h.seed_user("bob").await;

    h.services.messaging.send_message(&a, &b, "hi").await.unwrap();

    let thread = h.services.messaging.list_messages(&a, &b).await.unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].content, "hi");
    assert_eq!(thread[0].sender_id, a);

    let reversed = h.services.messaging.list_messages(&b, &a).await.unwrap();
    assert_eq!(reversed.len(), 1);
}

#[tokio::test]
async fn thread_is_oldest_first_in_both_directions() {
    let h = common::harness().await;
    let a = h.seed_user("alice").await;
    let b = h.seed_user("bob").await;

    h.services.messaging.send_message(&a, &b, "one").await.unwrap();
    h.services.messaging.send_message(&b, &a, "two").await.unwrap();
    h.services.messaging.send_message(&a, &b, "three").await.unwrap();

    let contents: Vec<_> = h
        .services
        .messaging
        .list_messages(&a, &b)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(contents, vec!["one", "two", "three"]);
}

#[tokio::test]
async fn send_rejects_invalid_messages() {
    let h = common::harness().await;
    let a = h.seed_user("alice").await;
    let b = h.seed_user("bob").await;

    assert!(matches!(
        h.services.messaging.send_message(&a, &b, "   ").await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        h.services.messaging.send_message(&a, &a, "me").await,
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        h.services
            .messaging
            .send_message(&a, "01j0000000000000000000000z", "hello")
            .await,
        Err(AppError::UserNotFound(_))
    ));
    assert!(h.services.messaging.list_messages(&a, &b).await.unwrap().is_empty());
}

#[tokio::test]
async fn subscribers_see_only_their_messages() {
    let h = common::harness().await;
    let a = h.seed_user("alice").await;
    let b = h.seed_user("bob").await;
    let c = h.seed_user("carol").await;

    let mut sub_b = h.services.messaging.subscribe(&b);
    let mut sub_c = h.services.messaging.subscribe(&c);

    let sent = h.services.messaging.send_message(&a, &b, "hi").await.unwrap();

    let notice = sub_b.try_recv().unwrap();
    assert_eq!(notice.table, Table::Message);
    assert_eq!(notice.operation, ChangeOperation::Insert);
    assert_eq!(notice.row_id.as_deref(), Some(sent.id.as_str()));
    assert!(sub_b.try_recv().is_none());
    assert!(sub_c.try_recv().is_none());
}

#[tokio::test]
async fn dropping_subscription_releases_it() {
    let h = common::harness().await;
    let a = h.seed_user("alice").await;
    let feed = &h.services.change_feed;

    let first = h.services.messaging.subscribe(&a);
    let second = h.services.messaging.subscribe(&a);
    assert_eq!(feed.subscriber_count(Table::Message), 2);

    drop(first);
    assert_eq!(feed.subscriber_count(Table::Message), 1);

    second.close();
    assert_eq!(feed.subscriber_count(Table::Message), 0);
}

#[tokio::test]
async fn conversations_have_one_entry_per_counterpart() {
    let h = common::harness().await;
    let a = h.seed_user("alice").await;
    let b = h.seed_user("bob").await;
    let c = h.seed_user("carol").await;

    h.services.messaging.send_message(&a, &b, "hi bob").await.unwrap();
    h.services.messaging.send_message(&c, &a, "hi alice").await.unwrap();
    let latest = h
        .services
        .messaging
        .send_message(&b, &a, "hey alice")
        .await
        .unwrap();

    let conversations = h.services.messaging.list_conversations(&a).await.unwrap();

    assert_eq!(conversations.len(), 2);
    assert_eq!(conversations[0].counterpart_id, b);
    assert_eq!(conversations[0].last_message.id, latest.id);
    assert_eq!(
        conversations[0].counterpart.as_ref().map(|p| p.username.as_str()),
        Some("bob")
    );
    assert_eq!(conversations[1].counterpart_id, c);
    assert!(
        h.services
            .messaging
            .list_conversations(&c)
            .await
            .unwrap()
            .iter()
            .all(|s| s.counterpart_id == a)
    );
}
