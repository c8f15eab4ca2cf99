//! Tests for the friendship service.

use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::domain::ports::{FixtureCheckinOracle, MockFriendshipRepository, MockUserDirectory};
use crate::domain::test_support::{fixture_calendar, fixture_timestamp, profile};
use crate::domain::{ErrorCode, FriendStatusLabel};

type TestService = FriendshipService<MockFriendshipRepository, MockUserDirectory, FixtureCheckinOracle>;

fn make_service(repo: MockFriendshipRepository, users: MockUserDirectory) -> TestService {
    FriendshipService::new(
        Arc::new(repo),
        Arc::new(users),
        Arc::new(FixtureCheckinOracle),
        fixture_calendar(),
    )
}

fn directory_with_phone(target: UserProfile) -> MockUserDirectory {
    let mut users = MockUserDirectory::new();
    users
        .expect_find_by_phone()
        .return_once(move |_| Ok(Some(target)));
    users
}

fn request(actor: UserId, phone: &str) -> FriendRequest {
    FriendRequest {
        actor,
        target_phone: format!("  {phone} "),
        message: Some("hi there".to_owned()),
    }
}

fn row(requester: UserId, recipient: UserId, status: FriendshipStatus) -> Friendship {
    Friendship {
        status,
        ..Friendship::pending(requester, recipient, None, fixture_timestamp())
    }
}

#[tokio::test]
async fn request_rejects_unknown_phone() {
    let mut users = MockUserDirectory::new();
    users
        .expect_find_by_phone()
        .withf(|phone| phone == "5550100")
        .return_once(|_| Ok(None));
    let service = make_service(MockFriendshipRepository::new(), users);

    let error = service
        .request_friend(request(UserId::random(), "5550100"))
        .await
        .expect_err("unknown phone");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn request_rejects_befriending_self() {
    let me = profile("Ada", "5550100");
    let actor = me.id;
    let service = make_service(MockFriendshipRepository::new(), directory_with_phone(me));

    let error = service
        .request_friend(request(actor, "5550100"))
        .await
        .expect_err("self request");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn request_creates_pending_row_for_new_pair() {
    let target = profile("Grace", "5550101");
    let target_id = target.id;
    let actor = UserId::random();
    let mut repo = MockFriendshipRepository::new();
    repo.expect_find_between().return_once(|_, _| Ok(None));
    repo.expect_create_request()
        .withf(move |row: &Friendship| {
            row.requester == actor
                && row.recipient == target_id
                && row.status == FriendshipStatus::Pending
                && row.message.as_deref() == Some("hi there")
        })
        .times(1)
        .return_once(|_| Ok(()));

    let service = make_service(repo, directory_with_phone(target));
    let view = service
        .request_friend(request(actor, "5550101"))
        .await
        .expect("request succeeds");

    assert_eq!(view.status, FriendStatusLabel::PendingOut);
    assert_eq!(view.user.display_name, "Grace");
    assert!(!view.checked_in_today);
}

#[tokio::test]
async fn request_against_incoming_request_accepts_it() {
    let target = profile("Grace", "5550101");
    let target_id = target.id;
    let actor = UserId::random();
    let mut repo = MockFriendshipRepository::new();
    repo.expect_find_between()
        .return_once(move |_, _| Ok(Some(row(target_id, actor, FriendshipStatus::Pending))));
    repo.expect_accept_pending()
        .withf(move |requester, recipient, _| *requester == target_id && *recipient == actor)
        .times(1)
        .return_once(move |_, _, _| Ok(Some(row(target_id, actor, FriendshipStatus::Accepted))));
    repo.expect_create_request().times(0);

    let service = make_service(repo, directory_with_phone(target));
    let view = service
        .request_friend(request(actor, "5550101"))
        .await
        .expect("auto accept");

    assert_eq!(view.status, FriendStatusLabel::Accepted);
}

#[tokio::test]
async fn repeated_request_updates_pending_message() {
    let target = profile("Grace", "5550101");
    let target_id = target.id;
    let actor = UserId::random();
    let mut repo = MockFriendshipRepository::new();
    repo.expect_find_between()
        .return_once(move |_, _| Ok(Some(row(actor, target_id, FriendshipStatus::Pending))));
    repo.expect_update_pending_message()
        .withf(|_, _, message, _| message == "hi there")
        .times(1)
        .return_once(move |_, _, message, _| {
            let mut updated = row(actor, target_id, FriendshipStatus::Pending);
            updated.message = Some(message.to_owned());
            Ok(Some(updated))
        });

    let service = make_service(repo, directory_with_phone(target));
    let view = service
        .request_friend(request(actor, "5550101"))
        .await
        .expect("idempotent request");

    assert_eq!(view.status, FriendStatusLabel::PendingOut);
    assert_eq!(view.message.as_deref(), Some("hi there"));
}

#[rstest]
#[case(FriendshipStatus::Accepted, ErrorCode::Conflict)]
#[case(FriendshipStatus::Blocked, ErrorCode::Forbidden)]
#[tokio::test]
async fn request_against_settled_row_fails(
    #[case] status: FriendshipStatus,
    #[case] expected: ErrorCode,
) {
    let target = profile("Grace", "5550101");
    let target_id = target.id;
    let actor = UserId::random();
    let mut repo = MockFriendshipRepository::new();
    repo.expect_find_between()
        .return_once(move |_, _| Ok(Some(row(target_id, actor, status))));

    let service = make_service(repo, directory_with_phone(target));
    let error = service
        .request_friend(request(actor, "5550101"))
        .await
        .expect_err("settled row");
    assert_eq!(error.code(), expected);
}

#[tokio::test]
async fn duplicate_insert_re_reads_the_winning_row() {
    let target = profile("Grace", "5550101");
    let target_id = target.id;
    let actor = UserId::random();
    let mut repo = MockFriendshipRepository::new();
    let mut reads = 0;
    repo.expect_find_between().times(2).returning(move |_, _| {
        reads += 1;
        if reads == 1 {
            Ok(None)
        } else {
            Ok(Some(row(target_id, actor, FriendshipStatus::Pending)))
        }
    });
    repo.expect_create_request()
        .return_once(|_| Err(FriendshipRepositoryError::duplicate_pair("pair index")));
    repo.expect_accept_pending()
        .return_once(move |_, _, _| Ok(Some(row(target_id, actor, FriendshipStatus::Accepted))));

    let service = make_service(repo, directory_with_phone(target));
    let view = service
        .request_friend(request(actor, "5550101"))
        .await
        .expect("race resolves");
    assert_eq!(view.status, FriendStatusLabel::Accepted);
}

#[tokio::test]
async fn accept_without_pending_request_is_not_found() {
    let mut repo = MockFriendshipRepository::new();
    repo.expect_accept_pending().return_once(|_, _, _| Ok(None));
    let service = make_service(repo, MockUserDirectory::new());

    let error = service
        .accept_friend(&UserId::random(), &UserId::random())
        .await
        .expect_err("nothing to accept");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn permission_update_merges_patch_over_stored_row() {
    let actor = UserId::random();
    let friend = UserId::random();
    let mut repo = MockFriendshipRepository::new();
    repo.expect_find_between()
        .return_once(move |_, _| Ok(Some(row(actor, friend, FriendshipStatus::Pending))));
    repo.expect_permission().return_once(|_, _| {
        Ok(Some(FriendPermission {
            can_view_detail: true,
            can_remind: true,
        }))
    });
    repo.expect_save_permission()
        .withf(|_, _, permission, _| permission.can_view_detail && !permission.can_remind)
        .times(1)
        .return_once(|_, _, _, _| Ok(()));

    let service = make_service(repo, MockUserDirectory::new());
    let updated = service
        .update_permission(
            &actor,
            &friend,
            FriendPermissionPatch {
                can_view_detail: None,
                can_remind: Some(false),
            },
        )
        .await
        .expect("update succeeds");

    assert!(updated.can_view_detail);
    assert!(!updated.can_remind);
}

#[tokio::test]
async fn permission_of_blocked_pair_is_hidden() {
    let actor = UserId::random();
    let friend = UserId::random();
    let mut repo = MockFriendshipRepository::new();
    repo.expect_find_between()
        .return_once(move |_, _| Ok(Some(row(actor, friend, FriendshipStatus::Blocked))));

    let service = make_service(repo, MockUserDirectory::new());
    let error = service
        .permission(&actor, &friend)
        .await
        .expect_err("blocked");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn list_skips_blocked_rows() {
    let actor = UserId::random();
    let pending_friend = profile("Grace", "5550101");
    let blocked = UserId::random();
    let pending_id = pending_friend.id;
    let mut repo = MockFriendshipRepository::new();
    repo.expect_list_for().return_once(move |_| {
        Ok(vec![
            row(pending_id, actor, FriendshipStatus::Pending),
            row(actor, blocked, FriendshipStatus::Blocked),
        ])
    });
    let mut users = MockUserDirectory::new();
    users
        .expect_find_many()
        .withf(move |ids| ids == [pending_id])
        .return_once(move |_| Ok(vec![pending_friend]));

    let service = make_service(repo, users);
    let views = service.list_friends(&actor).await.expect("list succeeds");

    assert_eq!(views.len(), 1);
    assert_eq!(views[0].status, FriendStatusLabel::PendingIn);
}

#[tokio::test]
async fn connection_failures_surface_as_unavailable() {
    let mut repo = MockFriendshipRepository::new();
    repo.expect_list_for()
        .return_once(|_| Err(FriendshipRepositoryError::connection("refused")));
    let service = make_service(repo, MockUserDirectory::new());

    let error = service
        .list_friends(&UserId::random())
        .await
        .expect_err("unavailable");
    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}
