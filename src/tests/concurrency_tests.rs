use crate::core::models::payout::{ApprovalOutcome, PayoutState};
use crate::tests::{co_guaranteed_group, create_test_service, request_test_payout};
use rust_decimal::Decimal;
use std::sync::Arc;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_approvers_finalize_exactly_once() {
    let service = Arc::new(create_test_service());
    let member_ids = ["m1", "m2", "m3", "m4", "m5", "m6", "m7", "m8"];
    let (leader, members, _) = co_guaranteed_group(&service, "leader", &member_ids).await;
    let payout = request_test_payout(&service, &leader, 900, Some(3)).await;

    let handles: Vec<_> = members
        .into_iter()
        .map(|member| {
            let service = Arc::clone(&service);
            let payout_id = payout.id.clone();
            tokio::spawn(async move { service.approve_payout(&payout_id, &member).await })
        })
        .collect();

    let mut outcomes = Vec::new();
    for result in futures::future::join_all(handles).await {
        outcomes.push(result.unwrap().unwrap().outcome);
    }

    let count = |outcome: ApprovalOutcome| outcomes.iter().filter(|o| **o == outcome).count();
    assert_eq!(count(ApprovalOutcome::Finalized), 1);
    assert_eq!(count(ApprovalOutcome::Recorded), 2);
    assert_eq!(count(ApprovalOutcome::AlreadyFinal), 5);

    let stored = service.get_payout(&payout.id).await.unwrap().unwrap();
    assert_eq!(stored.state, PayoutState::Completed);
    assert_eq!(stored.approvals.len(), 3);

    let ledger = service.get_account_ledger("leader").await.unwrap();
    assert_eq!(ledger.entries.len(), 1);
    assert_eq!(ledger.balance, Decimal::new(900, 0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_approver_retrying_concurrently_counts_once() {
    let service = Arc::new(create_test_service());
    let (leader, members, _) = co_guaranteed_group(&service, "leader", &["a", "b"]).await;
    let payout = request_test_payout(&service, &leader, 400, Some(2)).await;
    let a = members[0].clone();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let service = Arc::clone(&service);
            let payout_id = payout.id.clone();
            let a = a.clone();
            tokio::spawn(async move { service.approve_payout(&payout_id, &a).await })
        })
        .collect();

    let outcomes: Vec<ApprovalOutcome> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap().unwrap().outcome)
        .collect();
    assert_eq!(outcomes.iter().filter(|o| **o == ApprovalOutcome::Recorded).count(), 1);
    assert_eq!(
        outcomes.iter().filter(|o| **o == ApprovalOutcome::AlreadyApproved).count(),
        9
    );

    let stored = service.get_payout(&payout.id).await.unwrap().unwrap();
    assert_eq!(stored.state, PayoutState::PendingApproval);
    assert_eq!(stored.approvals.len(), 1);
    assert!(service.get_account_ledger("leader").await.unwrap().entries.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rejection_racing_approvals_never_credits_a_rejected_request() {
    let service = Arc::new(create_test_service());
    let (leader, members, _) = co_guaranteed_group(&service, "leader", &["a", "b", "c"]).await;
    let payout = request_test_payout(&service, &leader, 600, Some(2)).await;

    let approver_a = {
        let service = Arc::clone(&service);
        let (id, a) = (payout.id.clone(), members[0].clone());
        tokio::spawn(async move { service.approve_payout(&id, &a).await })
    };
    let approver_b = {
        let service = Arc::clone(&service);
        let (id, b) = (payout.id.clone(), members[1].clone());
        tokio::spawn(async move { service.approve_payout(&id, &b).await })
    };
    let rejecter = {
        let service = Arc::clone(&service);
        let (id, c) = (payout.id.clone(), members[2].clone());
        tokio::spawn(async move { service.reject_payout(&id, &c, None).await })
    };
    let (a, b, r) = tokio::join!(approver_a, approver_b, rejecter);
    a.unwrap().unwrap();
    b.unwrap().unwrap();
    r.unwrap().unwrap();

    let stored = service.get_payout(&payout.id).await.unwrap().unwrap();
    let entries = service.get_account_ledger("leader").await.unwrap().entries;
    match stored.state {
        PayoutState::Completed => assert_eq!(entries.len(), 1),
        PayoutState::Rejected => assert!(entries.is_empty()),
        other => panic!("unexpected state {}", other),
    }
}
