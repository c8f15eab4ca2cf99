//! Integration tests for the friendship and interaction Diesel adapters.
//!
//! Each test runs against its own database cloned from a migrated template on
//! the shared embedded PostgreSQL cluster.

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;

use checkin_social::domain::ports::{
    FriendshipRepository, FriendshipRepositoryError, InteractionRepository,
    NotificationRepository, ReminderWrite,
};
use checkin_social::domain::{
    FriendPermission, Friendship, FriendshipStatus, NewNotification, NotificationKind, Reminder,
    UserId,
};
use checkin_social::outbound::persistence::{
    DbPool, DieselFriendshipRepository, DieselInteractionRepository,
    DieselNotificationRepository, PoolConfig,
};

#[path = "support/embedded_postgres.rs"]
mod embedded_postgres;

use embedded_postgres::{
    handle_cluster_setup_failure, provision_template_database, seed_user, shared_cluster,
};

struct TestContext {
    runtime: Runtime,
    friendships: DieselFriendshipRepository,
    interactions: DieselInteractionRepository,
    notifications: DieselNotificationRepository,
    ada: UserId,
    bo: UserId,
    _database: TemporaryDatabase,
}

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .single()
        .expect("valid fixture timestamp")
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let database = provision_template_database(cluster)?;
    let url = database.url().to_owned();
    let ada = seed_user(&url, "+100", "Ada")?;
    let bo = seed_user(&url, "+200", "Bo")?;

    let config = PoolConfig::new(url.as_str())
        .with_max_size(2)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(async { DbPool::new(config).await })
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        runtime,
        friendships: DieselFriendshipRepository::new(pool.clone()),
        interactions: DieselInteractionRepository::new(pool.clone()),
        notifications: DieselNotificationRepository::new(pool),
        ada,
        bo,
        _database: database,
    })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn remind_notice(from: UserId, to: UserId) -> NewNotification {
    NewNotification {
        recipient: to,
        actor: Some(from),
        related_group: None,
        related_user: Some(from),
        kind: NotificationKind::Remind,
        message: "Ada reminded you to check in".to_owned(),
        created_at: at(),
    }
}

#[rstest]
fn accepting_seeds_permissions_in_both_directions(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: accepting_seeds_permissions_in_both_directions skipped");
        return;
    };
    let repo = &context.friendships;
    let (ada, bo) = (context.ada, context.bo);

    context.runtime.block_on(async {
        repo.create_request(&Friendship::pending(ada, bo, Some("hi".to_owned()), at()))
            .await
            .expect("create request");

        let wrong_way = repo
            .accept_pending(&bo, &ada, at())
            .await
            .expect("accept lookup");
        assert!(wrong_way.is_none(), "only the recipient may accept");

        let accepted = repo
            .accept_pending(&ada, &bo, at() + TimeDelta::minutes(1))
            .await
            .expect("accept")
            .expect("pending row");
        assert_eq!(accepted.status, FriendshipStatus::Accepted);
        assert_eq!(accepted.blocked_by, None);

        for (owner, target) in [(ada, bo), (bo, ada)] {
            let permission = repo
                .permission(&owner, &target)
                .await
                .expect("permission read");
            assert_eq!(permission, Some(FriendPermission::default()));
        }

        let again = repo
            .accept_pending(&ada, &bo, at() + TimeDelta::minutes(2))
            .await
            .expect("second accept");
        assert!(again.is_none(), "nothing left pending");
    });
}

#[rstest]
fn reverse_request_for_an_existing_pair_is_a_duplicate(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: reverse_request_for_an_existing_pair_is_a_duplicate skipped");
        return;
    };
    let repo = &context.friendships;
    let (ada, bo) = (context.ada, context.bo);

    context.runtime.block_on(async {
        repo.create_request(&Friendship::pending(ada, bo, None, at()))
            .await
            .expect("first request");
        let error = repo
            .create_request(&Friendship::pending(bo, ada, None, at()))
            .await
            .expect_err("pair already stored");
        assert!(matches!(
            error,
            FriendshipRepositoryError::DuplicatePair { .. }
        ));
        let rows = repo.list_for(&ada).await.expect("list");
        assert_eq!(rows.len(), 1);
    });
}

#[rstest]
fn duplicate_reminder_on_the_same_date_writes_nothing(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: duplicate_reminder_on_the_same_date_writes_nothing skipped");
        return;
    };
    let (ada, bo) = (context.ada, context.bo);
    let day = NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date");
    let reminder = |local_date: NaiveDate| Reminder {
        from: ada,
        to: bo,
        local_date,
        created_at: at(),
    };

    context.runtime.block_on(async {
        let first = context
            .interactions
            .record_reminder(&reminder(day), &remind_notice(ada, bo))
            .await
            .expect("first reminder");
        assert_eq!(first, ReminderWrite::Recorded);

        let second = context
            .interactions
            .record_reminder(&reminder(day), &remind_notice(ada, bo))
            .await
            .expect("second reminder");
        assert_eq!(second, ReminderWrite::AlreadySent);

        let inbox = context
            .notifications
            .list_for(&bo, 100, false)
            .await
            .expect("inbox");
        assert_eq!(inbox.len(), 1, "a limited reminder adds no notification");

        let next_day = day.succ_opt().expect("next day");
        let third = context
            .interactions
            .record_reminder(&reminder(next_day), &remind_notice(ada, bo))
            .await
            .expect("next-day reminder");
        assert_eq!(third, ReminderWrite::Recorded);
    });
}
