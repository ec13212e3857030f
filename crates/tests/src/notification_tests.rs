use crate::fixtures::test_app::TestApp;
use servicehub_models::{NewNotification, NotificationType, UserType};
use servicehub_services::{NotificationFeed, ToastLevel};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

const LIST: &str = "GET /api/notifications";
const MARK_READ: &str = "PUT /api/notifications/{id}/read";
const MARK_ALL_READ: &str = "PUT /api/notifications/mark-all-read";
const POLL: Duration = Duration::from_millis(100);

fn feed(app: &TestApp) -> Arc<NotificationFeed> {
    Arc::new(NotificationFeed::new(Arc::clone(&app.client), app.toasts.clone()))
}

#[tokio::test]
async fn refresh_replaces_cache_and_counts_unread() {
    let app = TestApp::spawn().await;
    let (_store, user) = app.signed_in(UserType::Customer, "nina@test.com").await;
    let other = app.backend.seed_user(UserType::Customer, "other@test.com");
    app.backend.seed_notification(user.id(), "Booking request", false);
    app.backend.seed_notification(user.id(), "Offer received", false);
    app.backend.seed_notification(user.id(), "Old news", true);
    app.backend.seed_notification(other.id(), "Not yours", false);

    let feed = feed(&app);
    feed.set_user(Some(user.id()));
    assert_ok!(feed.refresh().await);

    assert_eq!(feed.notifications().len(), 3);
    assert_eq!(feed.unread_count(), 2);
    assert_eq!(feed.of_type(NotificationType::BookingRequest).len(), 3);
    assert_eq!(feed.unread_count_remote().await.unwrap(), Some(2));
}

#[tokio::test]
async fn mark_as_read_decrements_once_and_never_below_zero() {
    let app = TestApp::spawn().await;
    let (_store, user) = app.signed_in(UserType::Customer, "olga@test.com").await;
    let first = app.backend.seed_notification(user.id(), "First", false);
    app.backend.seed_notification(user.id(), "Second", false);

    let feed = feed(&app);
    feed.set_user(Some(user.id()));
    feed.refresh().await.unwrap();
    assert_eq!(feed.unread_count(), 2);

    assert_ok!(feed.mark_as_read(first.id).await);
    assert_eq!(feed.unread_count(), 1);

    assert_ok!(feed.mark_as_read(first.id).await);
    assert_eq!(feed.unread_count(), 1);

    let server = app.backend.notifications_of(user.id());
    assert!(server.iter().find(|n| n.id == first.id).unwrap().is_read);
}

#[tokio::test]
async fn mark_all_as_read_twice_stays_at_zero() {
    let app = TestApp::spawn().await;
    let (_store, user) = app.signed_in(UserType::Worker, "pat@test.com").await;
    for title in ["a", "b", "c"] {
        app.backend.seed_notification(user.id(), title, false);
    }

    let feed = feed(&app);
    feed.set_user(Some(user.id()));
    feed.refresh().await.unwrap();

    assert_ok!(feed.mark_all_as_read().await);
    assert_eq!(feed.unread_count(), 0);
    assert_ok!(feed.mark_all_as_read().await);
    assert_eq!(feed.unread_count(), 0);

    assert!(feed.notifications().iter().all(|n| n.is_read));
    assert!(app.backend.notifications_of(user.id()).iter().all(|n| n.is_read));
    assert_eq!(app.backend.hits(MARK_ALL_READ), 2);
}

#[tokio::test]
async fn refused_mark_as_read_restores_only_that_notification() {
    let app = TestApp::spawn().await;
    let (_store, user) = app.signed_in(UserType::Customer, "quinn@test.com").await;
    let keep = app.backend.seed_notification(user.id(), "Keep", false);
    let refused = app.backend.seed_notification(user.id(), "Refused", false);

    let feed = feed(&app);
    feed.set_user(Some(user.id()));
    feed.refresh().await.unwrap();
    feed.mark_as_read(keep.id).await.unwrap();

    let mut toasts = app.toasts.subscribe();
    app.backend.fail(MARK_READ, 500);
    assert_err!(feed.mark_as_read(refused.id).await);

    let cached = feed.notifications();
    assert!(cached.iter().find(|n| n.id == keep.id).unwrap().is_read);
    assert!(!cached.iter().find(|n| n.id == refused.id).unwrap().is_read);
    assert_eq!(feed.unread_count(), 1);
    assert_eq!(toasts.try_recv().unwrap().level, ToastLevel::Error);
}

#[tokio::test]
async fn refused_mark_all_as_read_restores_unread_count() {
    let app = TestApp::spawn().await;
    let (_store, user) = app.signed_in(UserType::Customer, "rose@test.com").await;
    app.backend.seed_notification(user.id(), "a", false);
    app.backend.seed_notification(user.id(), "b", false);

    let feed = feed(&app);
    feed.set_user(Some(user.id()));
    feed.refresh().await.unwrap();
    app.backend.fail(MARK_ALL_READ, 500);

    assert_err!(feed.mark_all_as_read().await);
    assert_eq!(feed.unread_count(), 2);
}

#[tokio::test]
async fn poll_landing_mid_mutation_keeps_the_local_read_flag() {
    let app = TestApp::spawn().await;
    let (_store, user) = app.signed_in(UserType::Customer, "sue@test.com").await;
    let n = app.backend.seed_notification(user.id(), "Slow", false);
    app.backend.stall(MARK_READ, Duration::from_millis(300));

    let feed = feed(&app);
    feed.set_user(Some(user.id()));
    feed.refresh().await.unwrap();

    let pending = {
        let feed = Arc::clone(&feed);
        tokio::spawn(async move { feed.mark_as_read(n.id).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(feed.unread_count(), 0);

    // The server still says unread; the pending mutation wins.
    feed.refresh().await.unwrap();
    assert_eq!(feed.unread_count(), 0);

    assert_ok!(pending.await.unwrap());
    feed.refresh().await.unwrap();
    assert_eq!(feed.unread_count(), 0);
}

#[tokio::test]
async fn create_notification_reports_success_as_bool() {
    let app = TestApp::spawn().await;
    let (_store, user) = app.signed_in(UserType::Admin, "ada@test.com").await;
    let feed = feed(&app);
    let new = NewNotification {
        user_id: user.id(),
        notification_type: NotificationType::WorkerVerified,
        title: "Verified".to_string(),
        message: "Your profile is verified".to_string(),
        related_id: None,
        related_type: None,
    };

    assert!(feed.create_notification(&new).await);
    // Not cached until the next fetch.
    assert!(feed.notifications().is_empty());

    app.backend.fail("POST /api/notifications", 500);
    assert!(!feed.create_notification(&new).await);
}

#[tokio::test]
async fn polling_fetches_on_start_and_every_interval() {
    let app = TestApp::spawn().await;
    let (store, user) = app.signed_in(UserType::Customer, "tia@test.com").await;
    app.backend.seed_notification(user.id(), "Hello", false);

    let feed = feed(&app);
    let _handle = feed.start(store.subscribe(), POLL);

    tokio::time::sleep(Duration::from_millis(350)).await;

    assert!(app.backend.hits(LIST) >= 3);
    assert_eq!(feed.active_user(), Some(user.id()));
    assert_eq!(feed.unread_count(), 1);
}

#[tokio::test]
async fn profile_refreshes_do_not_hold_back_the_poll() {
    let app = TestApp::spawn().await;
    let (store, _user) = app.signed_in(UserType::Customer, "yara@test.com").await;

    let feed = feed(&app);
    let _handle = feed.start(store.subscribe(), POLL);

    // Republish the same user faster than the poll interval.
    for _ in 0..10 {
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_ok!(store.refresh_profile().await);
    }

    assert!(app.backend.hits(LIST) >= 4);
}

#[tokio::test]
async fn sign_out_stops_polling_and_empties_the_feed() {
    let app = TestApp::spawn().await;
    let (store, user) = app.signed_in(UserType::Customer, "uma@test.com").await;
    app.backend.seed_notification(user.id(), "Hello", false);

    let feed = feed(&app);
    let handle = feed.start(store.subscribe(), POLL);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(feed.unread_count(), 1);

    store.sign_out().await;
    tokio::time::sleep(POLL).await;
    let hits_after_sign_out = app.backend.hits(LIST);
    tokio::time::sleep(POLL * 4).await;

    assert_eq!(app.backend.hits(LIST), hits_after_sign_out);
    assert_eq!(feed.active_user(), None);
    assert!(feed.notifications().is_empty());
    assert!(!handle.is_finished());
}

#[tokio::test]
async fn dropping_the_handle_stops_polling() {
    let app = TestApp::spawn().await;
    let (store, _user) = app.signed_in(UserType::Customer, "val@test.com").await;

    let feed = feed(&app);
    let handle = feed.start(store.subscribe(), POLL);
    tokio::time::sleep(Duration::from_millis(150)).await;
    drop(handle);
    tokio::time::sleep(POLL).await;
    let hits = app.backend.hits(LIST);

    tokio::time::sleep(POLL * 4).await;
    assert_eq!(app.backend.hits(LIST), hits);
}

#[tokio::test]
async fn switching_user_drops_the_previous_users_notifications() {
    let app = TestApp::spawn().await;
    let (store, first) = app.signed_in(UserType::Customer, "wes@test.com").await;
    app.backend.seed_notification(first.id(), "For Wes", false);
    let second = app.backend.seed_user(UserType::Customer, "xena@test.com");
    app.backend.seed_notification(second.id(), "For Xena", false);
    app.backend.seed_notification(second.id(), "Also for Xena", false);

    let feed = feed(&app);
    let _handle = feed.start(store.subscribe(), POLL);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(feed.unread_count(), 1);

    store.sign_out().await;
    store
        .sign_in("xena@test.com", crate::fixtures::seed::PASSWORD)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(feed.active_user(), Some(second.id()));
    assert_eq!(feed.unread_count(), 2);
    assert!(feed.notifications().iter().all(|n| n.user_id == second.id()));
}
