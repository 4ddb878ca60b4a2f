use crate::constants::{GROUP_CREATED, MEMBER_ADDED, MEMBER_REMOVED};
use crate::core::errors::CofundError;
use crate::core::models::group::Role;
use crate::tests::{add_test_user, co_guaranteed_group, create_test_service};

#[tokio::test]
async fn test_create_group() {
    let service = create_test_service();
    let (leader, members, group) = co_guaranteed_group(&service, "leader", &["a", "b"]).await;

    assert_eq!(group.members.len(), 3);
    assert_eq!(group.leader_id(), Some(leader.id.as_str()));
    assert!(members.iter().all(|m| group.has_member(&m.id)));
    assert_eq!(
        group.members.iter().filter(|m| m.role == Role::Leader).count(),
        1
    );

    let audits = service.get_group_audits(&group.id).await.unwrap();
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].action, GROUP_CREATED);
}

#[tokio::test]
async fn test_create_group_dedups_members() {
    let service = create_test_service();
    let leader = add_test_user(&service, "leader").await;
    let a = add_test_user(&service, "a").await;

    let group = service
        .create_group(
            "Dupes".to_string(),
            vec![a.clone(), a.clone(), leader.clone()],
            &leader,
        )
        .await
        .unwrap();
    assert_eq!(group.members.len(), 2);
    assert_eq!(group.leader_id(), Some("leader"));
}

#[tokio::test]
async fn test_create_group_with_unknown_member() {
    let service = create_test_service();
    let leader = add_test_user(&service, "leader").await;
    let ghost = crate::core::models::user::User {
        id: "ghost".to_string(),
        name: "Ghost".to_string(),
        email: "ghost@example.com".to_string(),
        password: String::new(),
    };

    let result = service.create_group("Haunted".to_string(), vec![ghost], &leader).await;
    assert!(matches!(result, Err(CofundError::UserNotFound(id)) if id == "ghost"));
}

#[tokio::test]
async fn test_add_member_to_group() {
    let service = create_test_service();
    let (leader, members, group) = co_guaranteed_group(&service, "leader", &["a"]).await;
    let c = add_test_user(&service, "c").await;

    service.add_member_to_group(&group.id, c.clone(), &leader).await.unwrap();
    let group = service.get_group(&group.id).await.unwrap().unwrap();
    assert!(group.has_member("c"));

    let result = service.add_member_to_group(&group.id, c.clone(), &leader).await;
    assert!(matches!(result, Err(CofundError::AlreadyGroupMember(_))));

    let d = add_test_user(&service, "d").await;
    let result = service.add_member_to_group(&group.id, d, &members[0]).await;
    assert!(matches!(result, Err(CofundError::NotGroupLeader(_))));

    let audits = service.get_group_audits(&group.id).await.unwrap();
    assert_eq!(audits.last().unwrap().action, MEMBER_ADDED);
}

#[tokio::test]
async fn test_remove_member_from_group() {
    let service = create_test_service();
    let (leader, _, group) = co_guaranteed_group(&service, "leader", &["a", "b"]).await;

    service.remove_member_from_group(&group.id, "a", &leader).await.unwrap();
    let group = service.get_group(&group.id).await.unwrap().unwrap();
    assert!(!group.has_member("a"));
    assert!(group.has_member("b"));

    let result = service.remove_member_from_group(&group.id, "a", &leader).await;
    assert!(matches!(result, Err(CofundError::NotGroupMember(_))));

    let result = service.remove_member_from_group(&group.id, "leader", &leader).await;
    assert!(matches!(result, Err(CofundError::LeaderCannotRemoveSelf)));

    let audits = service.get_group_audits(&group.id).await.unwrap();
    assert_eq!(audits.last().unwrap().action, MEMBER_REMOVED);
}

#[tokio::test]
async fn test_group_audits_for_unknown_group() {
    let service = create_test_service();
    let result = service.get_group_audits("missing").await;
    assert!(matches!(result, Err(CofundError::GroupNotFound(_))));
}
