//! Academic calendar and period resolution tests.

mod common;

use bursary_core::calendar::CalendarError;
use bursary_db::repositories::{
    AcademicError, CalendarRepository, CreateSessionInput, CreateTermInput,
};
use chrono::NaiveDate;
use common::{setup, setup_db};

fn term_input(session_id: uuid::Uuid, name: &str, ordinal: Option<i32>) -> CreateTermInput {
    CreateTermInput {
        session_id,
        name: name.to_string(),
        ordinal,
        start_date: NaiveDate::from_ymd_opt(2027, 1, 6).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2027, 4, 2).unwrap(),
        next_term_date: None,
    }
}

#[tokio::test]
async fn test_last_term_of_session_resolves_to_first_term_of_next() {
    let fx = setup().await;
    let repo = CalendarRepository::new(fx.db.clone());

    let (session_id, term_id) = fx.period(0, 2);
    let next = repo.resolve_next_period(session_id, term_id).await.unwrap();

    let (expected_session, expected_term) = fx.period(1, 0);
    assert_eq!(next.session_id.into_inner(), expected_session);
    assert_eq!(next.term_id.into_inner(), expected_term);
}

#[tokio::test]
async fn test_next_term_within_session() {
    let fx = setup().await;
    let repo = CalendarRepository::new(fx.db.clone());

    let (session_id, term_id) = fx.period(1, 0);
    let next = repo.resolve_next_period(session_id, term_id).await.unwrap();

    assert_eq!(next.term_id.into_inner(), fx.period(1, 1).1);
}

#[tokio::test]
async fn test_last_period_has_no_successor() {
    let fx = setup().await;
    let repo = CalendarRepository::new(fx.db.clone());

    let (session_id, term_id) = fx.period(1, 2);
    let err = repo.resolve_next_period(session_id, term_id).await.unwrap_err();

    assert!(matches!(
        err,
        AcademicError::Calendar(CalendarError::NoFurtherPeriod)
    ));
}

#[tokio::test]
async fn test_session_without_terms_is_skipped() {
    let fx = setup().await;
    let repo = CalendarRepository::new(fx.db.clone());

    let empty = repo
        .create_session(CreateSessionInput {
            name: "2027/2028".to_string(),
            ordinal: None,
        })
        .await
        .unwrap();
    let later = repo
        .create_session(CreateSessionInput {
            name: "2028/2029".to_string(),
            ordinal: None,
        })
        .await
        .unwrap();
    let later_term = repo
        .create_term(term_input(later.id, "First Term", None))
        .await
        .unwrap();
    assert_eq!(empty.ordinal + 1, later.ordinal);

    let (session_id, term_id) = fx.period(1, 2);
    let next = repo.resolve_next_period(session_id, term_id).await.unwrap();

    assert_eq!(next.session_id.into_inner(), later.id);
    assert_eq!(next.term_id.into_inner(), later_term.id);
}

#[tokio::test]
async fn test_ordinals_are_assigned_in_creation_order() {
    let db = setup_db().await;
    let repo = CalendarRepository::new(db);

    let first = repo
        .create_session(CreateSessionInput {
            name: "A".to_string(),
            ordinal: None,
        })
        .await
        .unwrap();
    let second = repo
        .create_session(CreateSessionInput {
            name: "B".to_string(),
            ordinal: None,
        })
        .await
        .unwrap();
    assert_eq!(first.ordinal, 1);
    assert_eq!(second.ordinal, 2);

    let t1 = repo.create_term(term_input(first.id, "One", None)).await.unwrap();
    let t2 = repo.create_term(term_input(first.id, "Two", None)).await.unwrap();
    assert_eq!((t1.ordinal, t2.ordinal), (1, 2));

    let listed = repo.list_sessions().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].terms.len(), 2);
    assert!(listed[1].terms.is_empty());
}

#[tokio::test]
async fn test_duplicates_are_rejected() {
    let db = setup_db().await;
    let repo = CalendarRepository::new(db);

    let session = repo
        .create_session(CreateSessionInput {
            name: "2025/2026".to_string(),
            ordinal: Some(4),
        })
        .await
        .unwrap();

    let dup_name = repo
        .create_session(CreateSessionInput {
            name: "2025/2026".to_string(),
            ordinal: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(dup_name, AcademicError::DuplicateSession(_)));

    let dup_ordinal = repo
        .create_session(CreateSessionInput {
            name: "2026/2027".to_string(),
            ordinal: Some(4),
        })
        .await
        .unwrap_err();
    assert!(matches!(dup_ordinal, AcademicError::DuplicateOrdinal(4)));

    repo.create_term(term_input(session.id, "First Term", None))
        .await
        .unwrap();
    let dup_term = repo
        .create_term(term_input(session.id, "first term", None))
        .await
        .unwrap_err();
    assert!(matches!(dup_term, AcademicError::DuplicateTerm(_)));

    repo.create_class("JSS 1").await.unwrap();
    let dup_class = repo.create_class(" JSS 1 ").await.unwrap_err();
    assert!(matches!(dup_class, AcademicError::DuplicateClass(_)));
}

#[tokio::test]
async fn test_inverted_term_dates_rejected() {
    let db = setup_db().await;
    let repo = CalendarRepository::new(db);
    let session = repo
        .create_session(CreateSessionInput {
            name: "2025/2026".to_string(),
            ordinal: None,
        })
        .await
        .unwrap();

    let mut input = term_input(session.id, "First Term", None);
    input.end_date = NaiveDate::from_ymd_opt(2026, 12, 1).unwrap();
    let err = repo.create_term(input).await.unwrap_err();

    assert!(matches!(err, AcademicError::InvalidTermDates { .. }));
}

#[tokio::test]
async fn test_ordinal_after_maximum_is_rejected() {
    let db = setup_db().await;
    let repo = CalendarRepository::new(db);
    let session = repo
        .create_session(CreateSessionInput {
            name: "2099/2100".to_string(),
            ordinal: Some(i32::MAX),
        })
        .await
        .unwrap();

    let err = repo
        .create_session(CreateSessionInput {
            name: "2100/2101".to_string(),
            ordinal: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AcademicError::OrdinalExhausted(i32::MAX)));

    repo.create_term(term_input(session.id, "Last Term", Some(i32::MAX)))
        .await
        .unwrap();
    let err = repo
        .create_term(term_input(session.id, "Extra Term", None))
        .await
        .unwrap_err();
    assert!(matches!(err, AcademicError::OrdinalExhausted(i32::MAX)));
}

#[tokio::test]
async fn test_blank_names_are_rejected() {
    let db = setup_db().await;
    let repo = CalendarRepository::new(db);

    let err = repo
        .create_session(CreateSessionInput {
            name: "   ".to_string(),
            ordinal: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AcademicError::MissingName("Session")));

    let session = repo
        .create_session(CreateSessionInput {
            name: "2025/2026".to_string(),
            ordinal: None,
        })
        .await
        .unwrap();
    let err = repo
        .create_term(term_input(session.id, " ", None))
        .await
        .unwrap_err();
    assert!(matches!(err, AcademicError::MissingName("Term")));

    let err = repo.create_class("").await.unwrap_err();
    assert!(matches!(err, AcademicError::MissingName("Class")));
}
