//! Tests for the group service.

use std::sync::Arc;

use chrono::TimeDelta;
use rstest::rstest;

use super::*;
use crate::domain::ports::{
    FixtureCheckinOracle, JoinResolution, MembershipTransition, MockCheckinOracle,
    MockGroupRepository, MockUserDirectory,
};
use crate::domain::test_support::{fixture_calendar, fixture_timestamp, profile};
use crate::domain::{
    EncouragementId, ErrorCode, GroupEncouragement, GroupPrivacy, JoinCode, MemberRole,
    MemberStatus, MembershipLabel, NotificationKind, UserProfile,
};

const CODE: &str = "123456";

fn group(privacy: GroupPrivacy, requires_approval: bool) -> Group {
    Group {
        id: GroupId::new(42),
        name: "Early Risers".to_owned(),
        privacy,
        requires_approval,
        join_code: JoinCode::parse(CODE).expect("valid code"),
        owner: UserId::random(),
        announcement: Some("Welcome to the group!".to_owned()),
        created_at: fixture_timestamp(),
    }
}

fn member(user: UserId, role: MemberRole, status: MemberStatus) -> GroupMember {
    GroupMember {
        group_id: GroupId::new(42),
        user_id: user,
        role,
        status,
        requested_at: fixture_timestamp(),
        approved_at: (status == MemberStatus::Accepted).then(fixture_timestamp),
    }
}

fn directory(profiles: Vec<UserProfile>) -> MockUserDirectory {
    let by_id = profiles.clone();
    let mut users = MockUserDirectory::new();
    users.expect_find_by_id().returning(move |id| {
        Ok(by_id.iter().find(|profile| profile.id == *id).cloned())
    });
    users.expect_find_many().returning(move |ids| {
        Ok(profiles
            .iter()
            .filter(|profile| ids.contains(&profile.id))
            .cloned()
            .collect())
    });
    users
}

fn make_service(
    repo: MockGroupRepository,
    users: MockUserDirectory,
) -> GroupService<MockGroupRepository, MockUserDirectory, FixtureCheckinOracle> {
    GroupService::new(
        Arc::new(repo),
        Arc::new(users),
        Arc::new(FixtureCheckinOracle),
        fixture_calendar(),
    )
}

#[tokio::test]
async fn create_regenerates_colliding_join_codes() {
    let owner = profile("Ada", "5550100");
    let owner_id = owner.id;
    let mut repo = MockGroupRepository::new();
    let mut attempts = 0;
    repo.expect_create_group().times(3).returning(move |draft| {
        attempts += 1;
        if attempts < 3 {
            return Err(GroupRepositoryError::join_code_taken(draft.join_code.as_str()));
        }
        Ok(Group {
            id: GroupId::new(42),
            name: draft.name.clone(),
            privacy: draft.privacy,
            requires_approval: draft.requires_approval,
            join_code: draft.join_code.clone(),
            owner: draft.owner,
            announcement: draft.announcement.clone(),
            created_at: draft.created_at,
        })
    });
    repo.expect_membership()
        .returning(move |_, user| Ok(Some(GroupMember::owner(GroupId::new(42), *user, fixture_timestamp()))));
    repo.expect_accepted_members()
        .returning(move |_| Ok(vec![GroupMember::owner(GroupId::new(42), owner_id, fixture_timestamp())]));

    let service = make_service(repo, directory(vec![owner]));
    let view = service
        .create_group(CreateGroupRequest {
            actor: owner_id,
            name: "  Early Risers ".to_owned(),
            privacy: GroupPrivacy::Private,
            requires_approval: true,
        })
        .await
        .expect("create succeeds");

    assert_eq!(view.name, "Early Risers");
    assert!(!view.requires_approval);
    assert_eq!(view.status, MembershipLabel::Member);
    assert_eq!(view.announcement.as_deref(), Some("Welcome to the group!"));
    assert_eq!(view.members.len(), 1);
    assert_eq!(view.members[0].role, MemberRole::Owner);
    assert!(view.join_code.is_some());
}

#[tokio::test]
async fn create_gives_up_after_bounded_attempts() {
    let mut repo = MockGroupRepository::new();
    repo.expect_create_group()
        .times(crate::domain::JOIN_CODE_MAX_ATTEMPTS)
        .returning(|draft| Err(GroupRepositoryError::join_code_taken(draft.join_code.as_str())));

    let service = make_service(repo, MockUserDirectory::new());
    let error = service
        .create_group(CreateGroupRequest {
            actor: UserId::random(),
            name: "Early Risers".to_owned(),
            privacy: GroupPrivacy::Public,
            requires_approval: false,
        })
        .await
        .expect_err("exhausted");
    assert_eq!(error.code(), ErrorCode::InternalError);
}

#[tokio::test]
async fn private_group_cannot_be_joined_by_id() {
    let mut repo = MockGroupRepository::new();
    repo.expect_find_by_id()
        .return_once(|_| Ok(Some(group(GroupPrivacy::Private, false))));

    let service = make_service(repo, MockUserDirectory::new());
    let error = service
        .join_group(&UserId::random(), " 42 ")
        .await
        .expect_err("code required");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn join_code_match_takes_precedence_over_id() {
    let applicant = profile("Grace", "5550101");
    let applicant_id = applicant.id;
    let mut repo = MockGroupRepository::new();
    repo.expect_find_by_join_code()
        .withf(|code| code.as_str() == CODE)
        .return_once(|_| Ok(Some(group(GroupPrivacy::Private, false))));
    repo.expect_find_by_id().times(0);
    let mut lookups = 0;
    repo.expect_membership().times(2).returning(move |_, user| {
        lookups += 1;
        Ok((lookups > 1).then(|| member(*user, MemberRole::Member, MemberStatus::Accepted)))
    });
    repo.expect_apply_membership()
        .withf(|transition: &MembershipTransition| {
            transition.expected.is_none()
                && transition.next.status == MemberStatus::Accepted
                && transition.notice.kind == NotificationKind::GroupJoined
                && transition.notice.message == "Grace joined Early Risers"
        })
        .times(1)
        .return_once(|transition| Ok(transition.next.clone()));
    repo.expect_accepted_members()
        .returning(move |_| Ok(vec![member(applicant_id, MemberRole::Member, MemberStatus::Accepted)]));

    let service = make_service(repo, directory(vec![applicant]));
    let view = service
        .join_group(&applicant_id, CODE)
        .await
        .expect("join succeeds");

    assert_eq!(view.status, MembershipLabel::Member);
    assert_eq!(view.join_code.as_deref(), Some(CODE));
}

#[tokio::test]
async fn approval_gated_join_records_pending_request() {
    let applicant = profile("Grace", "5550101");
    let applicant_id = applicant.id;
    let mut repo = MockGroupRepository::new();
    repo.expect_find_by_id()
        .return_once(|_| Ok(Some(group(GroupPrivacy::Public, true))));
    repo.expect_membership().return_once(|_, _| Ok(None));
    repo.expect_apply_membership()
        .withf(|transition: &MembershipTransition| {
            transition.next.status == MemberStatus::Pending
                && transition.notice.kind == NotificationKind::GroupJoinRequest
                && transition.notice.message == "Grace asked to join Early Risers"
        })
        .times(1)
        .return_once(|transition| Ok(transition.next.clone()));
    repo.expect_accepted_members().times(0);

    let service = make_service(repo, directory(vec![applicant]));
    let view = service
        .join_group(&applicant_id, "42")
        .await
        .expect("request recorded");

    assert_eq!(view.status, MembershipLabel::Pending);
    assert!(view.members.is_empty());
    assert!(view.join_code.is_none());
}

#[tokio::test]
async fn reapplying_within_cooldown_is_throttled() {
    let applicant = profile("Grace", "5550101");
    let applicant_id = applicant.id;
    let mut repo = MockGroupRepository::new();
    repo.expect_find_by_id()
        .return_once(|_| Ok(Some(group(GroupPrivacy::Public, true))));
    repo.expect_membership().return_once(move |_, _| {
        let mut row = member(applicant_id, MemberRole::Member, MemberStatus::Pending);
        row.requested_at = fixture_timestamp() - TimeDelta::hours(23);
        Ok(Some(row))
    });
    repo.expect_apply_membership().times(0);

    let service = make_service(repo, directory(vec![applicant]));
    let error = service
        .join_group(&applicant_id, "42")
        .await
        .expect_err("cooldown");

    assert_eq!(error.code(), ErrorCode::TooManyRequests);
    let retry = error
        .details()
        .and_then(|details| details.get("retryAfterSeconds"))
        .and_then(serde_json::Value::as_i64);
    assert_eq!(retry, Some(3_600));
}

#[tokio::test]
async fn reapplying_after_cooldown_refreshes_request() {
    let applicant = profile("Grace", "5550101");
    let applicant_id = applicant.id;
    let stale = fixture_timestamp() - TimeDelta::hours(25);
    let mut repo = MockGroupRepository::new();
    repo.expect_find_by_id()
        .return_once(|_| Ok(Some(group(GroupPrivacy::Public, true))));
    repo.expect_membership().return_once(move |_, _| {
        let mut row = member(applicant_id, MemberRole::Member, MemberStatus::Pending);
        row.requested_at = stale;
        Ok(Some(row))
    });
    repo.expect_apply_membership()
        .withf(move |transition: &MembershipTransition| {
            transition.expected.map(|snapshot| snapshot.requested_at) == Some(stale)
                && transition.next.requested_at == fixture_timestamp()
        })
        .times(1)
        .return_once(|transition| Ok(transition.next.clone()));

    let service = make_service(repo, directory(vec![applicant]));
    let view = service
        .join_group(&applicant_id, "42")
        .await
        .expect("re-apply succeeds");
    assert_eq!(view.status, MembershipLabel::Pending);
}

#[tokio::test]
async fn concurrent_membership_change_is_a_conflict() {
    let applicant = profile("Grace", "5550101");
    let applicant_id = applicant.id;
    let mut repo = MockGroupRepository::new();
    repo.expect_find_by_id()
        .return_once(|_| Ok(Some(group(GroupPrivacy::Public, false))));
    repo.expect_membership().return_once(|_, _| Ok(None));
    repo.expect_apply_membership()
        .return_once(|_| Err(GroupRepositoryError::stale_membership(42_i64)));

    let service = make_service(repo, directory(vec![applicant]));
    let error = service
        .join_group(&applicant_id, "42")
        .await
        .expect_err("stale");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[case(MemberRole::Member, MemberStatus::Accepted)]
#[case(MemberRole::Admin, MemberStatus::Pending)]
#[tokio::test]
async fn approval_requires_accepted_manager(
    #[case] role: MemberRole,
    #[case] status: MemberStatus,
) {
    let mut repo = MockGroupRepository::new();
    repo.expect_find_by_id()
        .return_once(|_| Ok(Some(group(GroupPrivacy::Public, true))));
    repo.expect_membership()
        .return_once(move |_, user| Ok(Some(member(*user, role, status))));
    repo.expect_resolve_join_request().times(0);

    let service = make_service(repo, MockUserDirectory::new());
    let error = service
        .approve_member(&UserId::random(), GroupId::new(42), &UserId::random())
        .await
        .expect_err("not a manager");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn approval_without_pending_request_is_not_found() {
    let mut repo = MockGroupRepository::new();
    repo.expect_find_by_id()
        .return_once(|_| Ok(Some(group(GroupPrivacy::Public, true))));
    repo.expect_membership()
        .return_once(|_, user| Ok(Some(member(*user, MemberRole::Owner, MemberStatus::Accepted))));
    repo.expect_resolve_join_request().return_once(|_| Ok(false));

    let service = make_service(repo, MockUserDirectory::new());
    let error = service
        .reject_member(&UserId::random(), GroupId::new(42), &UserId::random())
        .await
        .expect_err("nothing pending");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn approval_supersedes_admin_notice_and_notifies_applicant() {
    let admin = profile("Ada", "5550100");
    let admin_id = admin.id;
    let applicant = UserId::random();
    let mut repo = MockGroupRepository::new();
    repo.expect_find_by_id()
        .return_once(|_| Ok(Some(group(GroupPrivacy::Public, true))));
    repo.expect_membership()
        .returning(|_, user| Ok(Some(member(*user, MemberRole::Admin, MemberStatus::Accepted))));
    repo.expect_resolve_join_request()
        .withf(move |resolution: &JoinResolution| {
            resolution.admin == admin_id
                && resolution.applicant == applicant
                && resolution.decision == JoinDecision::Approve
                && resolution.admin_notice.kind == NotificationKind::GroupJoinApproved
                && resolution.admin_notice.message == "You approved this join request"
                && resolution.applicant_notification.recipient == applicant
                && resolution.applicant_notification.related_user == Some(admin_id)
                && resolution.applicant_notification.message == "You joined Early Risers"
        })
        .times(1)
        .return_once(|_| Ok(true));
    repo.expect_accepted_members().returning(move |_| {
        Ok(vec![
            member(admin_id, MemberRole::Admin, MemberStatus::Accepted),
            member(applicant, MemberRole::Member, MemberStatus::Accepted),
        ])
    });

    let service = make_service(repo, directory(vec![admin]));
    let view = service
        .approve_member(&admin_id, GroupId::new(42), &applicant)
        .await
        .expect("approve succeeds");

    // The applicant has no resolvable profile and is left off the roster.
    assert_eq!(view.members.len(), 1);
    assert_eq!(view.status, MembershipLabel::Member);
    assert!(view.join_code.is_none());
}

#[tokio::test]
async fn private_detail_hides_content_from_non_members() {
    let mut repo = MockGroupRepository::new();
    repo.expect_find_by_id()
        .return_once(|_| Ok(Some(group(GroupPrivacy::Private, false))));
    repo.expect_membership().return_once(|_, _| Ok(None));
    repo.expect_accepted_members().times(0);

    let service = make_service(repo, MockUserDirectory::new());
    let view = service
        .group_detail(&UserId::random(), GroupId::new(42))
        .await
        .expect("detail succeeds");

    assert_eq!(view.status, MembershipLabel::None);
    assert!(view.announcement.is_none());
    assert!(view.members.is_empty());
    assert!(view.join_code.is_none());
}

#[tokio::test]
async fn roster_flags_members_checked_in_on_their_local_today() {
    let viewer = profile("Ada", "5550100");
    let mut night_owl = profile("Grace", "5550101");
    night_owl.timezone = "Pacific/Honolulu".to_owned();
    let (viewer_id, owl_id) = (viewer.id, night_owl.id);

    let mut repo = MockGroupRepository::new();
    repo.expect_find_by_id()
        .return_once(|_| Ok(Some(group(GroupPrivacy::Public, false))));
    repo.expect_membership()
        .return_once(|_, user| Ok(Some(member(*user, MemberRole::Member, MemberStatus::Accepted))));
    repo.expect_accepted_members().return_once(move |_| {
        Ok(vec![
            member(viewer_id, MemberRole::Owner, MemberStatus::Accepted),
            member(owl_id, MemberRole::Member, MemberStatus::Accepted),
        ])
    });
    let mut checkins = MockCheckinOracle::new();
    // 09:30 UTC on the 14th is still the 13th in Honolulu.
    checkins.expect_has_checkin().returning(move |user, date| {
        let expected = if *user == owl_id { 13 } else { 14 };
        Ok(date == chrono::NaiveDate::from_ymd_opt(2026, 3, expected).expect("date"))
    });

    let service = GroupService::new(
        Arc::new(repo),
        Arc::new(directory(vec![viewer, night_owl])),
        Arc::new(checkins),
        fixture_calendar(),
    );
    let view = service
        .group_detail(&viewer_id, GroupId::new(42))
        .await
        .expect("detail succeeds");

    assert_eq!(view.members.len(), 2);
    assert!(view.members.iter().all(|entry| entry.checked_in_today));
    assert!(view.join_code.is_none());
}

#[tokio::test]
async fn summaries_count_members_and_todays_checkins() {
    let viewer = profile("Ada", "5550100");
    let viewer_id = viewer.id;
    let mut repo = MockGroupRepository::new();
    repo.expect_list_all()
        .return_once(|| Ok(vec![group(GroupPrivacy::Public, false)]));
    repo.expect_memberships_of().return_once(|_| Ok(Vec::new()));
    repo.expect_accepted_members().return_once(|_| {
        Ok(vec![
            member(UserId::random(), MemberRole::Owner, MemberStatus::Accepted),
            member(UserId::random(), MemberRole::Member, MemberStatus::Accepted),
            member(UserId::random(), MemberRole::Member, MemberStatus::Accepted),
        ])
    });
    let mut checkins = MockCheckinOracle::new();
    checkins
        .expect_count_checked_in()
        .withf(|users, _| users.len() == 3)
        .return_once(|_, _| Ok(2));

    let service = GroupService::new(
        Arc::new(repo),
        Arc::new(directory(vec![viewer])),
        Arc::new(checkins),
        fixture_calendar(),
    );
    let summaries = service.list_groups(&viewer_id).await.expect("list succeeds");

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].members_count, 3);
    assert_eq!(summaries[0].active_today, 2);
    assert_eq!(summaries[0].status, MembershipLabel::None);
}

#[tokio::test]
async fn wall_is_members_only() {
    let mut repo = MockGroupRepository::new();
    repo.expect_find_by_id()
        .return_once(|_| Ok(Some(group(GroupPrivacy::Public, true))));
    repo.expect_membership()
        .return_once(|_, user| Ok(Some(member(*user, MemberRole::Member, MemberStatus::Pending))));
    repo.expect_list_encouragements().times(0);

    let service = make_service(repo, MockUserDirectory::new());
    let error = service
        .list_encouragements(&UserId::random(), GroupId::new(42), None)
        .await
        .expect_err("pending member");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn wall_names_vanished_authors_generically() {
    let mut repo = MockGroupRepository::new();
    repo.expect_find_by_id()
        .return_once(|_| Ok(Some(group(GroupPrivacy::Public, false))));
    repo.expect_membership()
        .return_once(|_, user| Ok(Some(member(*user, MemberRole::Member, MemberStatus::Accepted))));
    repo.expect_list_encouragements()
        .withf(|_, limit| *limit == 20)
        .return_once(|group_id, _| {
            Ok(vec![GroupEncouragement {
                id: EncouragementId::new(1),
                group_id,
                author: UserId::random(),
                emoji: "🌅".to_owned(),
                message: Some("rise and shine".to_owned()),
                created_at: fixture_timestamp(),
            }])
        });

    let service = make_service(repo, directory(Vec::new()));
    let wall = service
        .list_encouragements(&UserId::random(), GroupId::new(42), None)
        .await
        .expect("wall succeeds");

    assert_eq!(wall.len(), 1);
    assert_eq!(wall[0].author_name, "member");
    assert_eq!(wall[0].text, "🌅 rise and shine");
}

#[tokio::test]
async fn group_nudges_require_membership() {
    let mut repo = MockGroupRepository::new();
    repo.expect_find_by_id()
        .returning(|_| Ok(Some(group(GroupPrivacy::Public, false))));
    repo.expect_membership().returning(|_, _| Ok(None));
    repo.expect_add_reminder().times(0);
    repo.expect_add_encouragement().times(0);

    let service = make_service(repo, MockUserDirectory::new());
    let actor = UserId::random();
    let remind = service
        .remind_group(&actor, GroupId::new(42))
        .await
        .expect_err("not a member");
    assert_eq!(remind.code(), ErrorCode::Forbidden);

    let encourage = service
        .encourage_group(GroupEncourageRequest {
            actor,
            group: GroupId::new(42),
            emoji: "🔥".to_owned(),
            message: None,
        })
        .await
        .expect_err("not a member");
    assert_eq!(encourage.code(), ErrorCode::Forbidden);
}
