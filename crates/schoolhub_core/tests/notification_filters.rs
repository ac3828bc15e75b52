use chrono::{DateTime, TimeZone, Utc};
use rusqlite::Connection;
use schoolhub_core::db::open_db_in_memory;
use schoolhub_core::repo::directory_repo::{DirectoryRepository, NewUser, SqliteDirectoryRepository};
use schoolhub_core::repo::notification_repo::{NewNotification, SqliteNotificationRepository};
use schoolhub_core::service::filters::NotificationQuery;
use schoolhub_core::service::push::{PushError, PushGateway, PushPayload};
use schoolhub_core::{
    NotificationId, NotificationKind, NotificationRepository, NotificationService, Principal, Role,
    ServiceError, UserId,
};

struct NoopGateway;

impl PushGateway for NoopGateway {
    fn deliver(&self, _payload: &PushPayload) -> Result<(), PushError> {
        Ok(())
    }
}

struct Fixture {
    admin: Principal,
    student1: UserId,
    student2: UserId,
    subject_math: i64,
    n_direct_s1: NotificationId,
    n_class_a: NotificationId,
    n_direct_s2: NotificationId,
    n_dual_s3: NotificationId,
    n_tie_first: NotificationId,
    n_tie_second: NotificationId,
}

fn at(d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2017, 9, d, h, 0, 0).unwrap()
}

fn seed(conn: &Connection) -> Fixture {
    let directory = SqliteDirectoryRepository::try_new(conn).unwrap();
    let notifications = SqliteNotificationRepository::try_new(conn).unwrap();

    let class_a = directory.create_class("5a").unwrap();
    let subject_math = directory.create_subject("Mathematics").unwrap();
    let subject_bio = directory.create_subject("Biology").unwrap();

    let add_user = |email: &str, role: Role| -> UserId {
        let id = directory
            .create_user(&NewUser {
                email: email.to_string(),
                first_name: "First".to_string(),
                last_name: "Last".to_string(),
                date_joined: at(1, 8),
            })
            .unwrap();
        directory.grant_role(id, role).unwrap();
        id
    };

    let admin_id = add_user("admin@school.example", Role::Admin);
    let teacher = add_user("teacher@school.example", Role::Teacher);
    let student1 = add_user("student1@school.example", Role::Student);
    let student2 = add_user("student2@school.example", Role::Student);
    let student3 = add_user("student3@school.example", Role::Student);

    directory.set_attends(student1, Some(class_a)).unwrap();
    directory.set_attends(student3, Some(class_a)).unwrap();
    // student2 attends no class at all.

    let add = |target_student: Option<UserId>,
                   target_class: Option<i64>,
                   subject: Option<i64>,
                   kind: NotificationKind,
                   date: DateTime<Utc>|
     -> NotificationId {
        notifications
            .create(&NewNotification {
                owner: teacher,
                title: "note".to_string(),
                description: String::new(),
                created_at: at(1, 8),
                date,
                target_student,
                target_class,
                subject,
                kind,
                custom_fields: serde_json::json!({}),
                icon: None,
            })
            .unwrap()
    };

    let n_direct_s1 = add(
        Some(student1),
        None,
        Some(subject_math),
        NotificationKind::Exam,
        at(5, 12),
    );
    let n_class_a = add(
        None,
        Some(class_a),
        Some(subject_math),
        NotificationKind::Generic,
        at(6, 12),
    );
    let n_direct_s2 = add(
        Some(student2),
        None,
        Some(subject_bio),
        NotificationKind::Task,
        at(7, 12),
    );
    // Dual-targeted: student3 plus the class. The class arm of the
    // counterpart filter only applies when target_student is null.
    let n_dual_s3 = add(
        Some(student3),
        Some(class_a),
        None,
        NotificationKind::Generic,
        at(7, 18),
    );
    let n_tie_first = add(None, Some(class_a), None, NotificationKind::Generic, at(8, 9));
    let n_tie_second = add(None, Some(class_a), None, NotificationKind::Generic, at(8, 9));

    Fixture {
        admin: Principal {
            user_id: admin_id,
            role: Some(Role::Admin),
        },
        student1,
        student2,
        subject_math,
        n_direct_s1,
        n_class_a,
        n_direct_s2,
        n_dual_s3,
        n_tie_first,
        n_tie_second,
    }
}

fn list(conn: &Connection, principal: &Principal, query: &NotificationQuery) -> Vec<NotificationId> {
    let service = NotificationService::new(
        SqliteNotificationRepository::try_new(conn).unwrap(),
        SqliteDirectoryRepository::try_new(conn).unwrap(),
        NoopGateway,
    );
    service
        .list(principal, query)
        .unwrap()
        .iter()
        .map(|n| n.id)
        .collect()
}

fn list_err(conn: &Connection, principal: &Principal, query: &NotificationQuery) -> ServiceError {
    let service = NotificationService::new(
        SqliteNotificationRepository::try_new(conn).unwrap(),
        SqliteDirectoryRepository::try_new(conn).unwrap(),
        NoopGateway,
    );
    service.list(principal, query).unwrap_err()
}

#[test]
fn student_filter_falls_back_to_attendance_class() {
    let conn = open_db_in_memory().unwrap();
    let fx = seed(&conn);

    let ids = list(
        &conn,
        &fx.admin,
        &NotificationQuery {
            student: Some(fx.student1.to_string()),
            ..NotificationQuery::default()
        },
    );
    // Direct target plus class-targeted records without a direct target.
    // The dual-targeted record names another student, so the class arm
    // must not pick it up.
    assert_eq!(
        ids,
        vec![fx.n_tie_first, fx.n_tie_second, fx.n_class_a, fx.n_direct_s1]
    );
    assert!(!ids.contains(&fx.n_dual_s3));
}

#[test]
fn student_filter_without_attendance_class_matches_direct_targets_only() {
    let conn = open_db_in_memory().unwrap();
    let fx = seed(&conn);

    let ids = list(
        &conn,
        &fx.admin,
        &NotificationQuery {
            student: Some(fx.student2.to_string()),
            ..NotificationQuery::default()
        },
    );
    assert_eq!(ids, vec![fx.n_direct_s2]);
}

#[test]
fn unknown_student_is_not_found_and_non_integer_is_bad_request() {
    let conn = open_db_in_memory().unwrap();
    let fx = seed(&conn);

    let err = list_err(
        &conn,
        &fx.admin,
        &NotificationQuery {
            student: Some("9999".to_string()),
            ..NotificationQuery::default()
        },
    );
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: "user",
            id: 9999
        }
    ));

    let err = list_err(
        &conn,
        &fx.admin,
        &NotificationQuery {
            student: Some("abc".to_string()),
            ..NotificationQuery::default()
        },
    );
    assert!(matches!(err, ServiceError::BadRequest(_)));
}

#[test]
fn subject_filter_is_exact_and_checked_for_existence() {
    let conn = open_db_in_memory().unwrap();
    let fx = seed(&conn);

    let ids = list(
        &conn,
        &fx.admin,
        &NotificationQuery {
            subject: Some(fx.subject_math.to_string()),
            ..NotificationQuery::default()
        },
    );
    assert_eq!(ids, vec![fx.n_class_a, fx.n_direct_s1]);

    let err = list_err(
        &conn,
        &fx.admin,
        &NotificationQuery {
            subject: Some("424242".to_string()),
            ..NotificationQuery::default()
        },
    );
    assert!(matches!(
        err,
        ServiceError::NotFound {
            entity: "subject",
            id: 424242
        }
    ));
}

#[test]
fn kind_filter_selects_one_category() {
    let conn = open_db_in_memory().unwrap();
    let fx = seed(&conn);

    let ids = list(
        &conn,
        &fx.admin,
        &NotificationQuery {
            kind: Some("EXAM".to_string()),
            ..NotificationQuery::default()
        },
    );
    assert_eq!(ids, vec![fx.n_direct_s1]);
}

#[test]
fn date_range_is_inclusive_from_and_exclusive_to() {
    let conn = open_db_in_memory().unwrap();
    let fx = seed(&conn);

    // from_date exactly on a record's date keeps it; to_date exactly on a
    // record's date drops it.
    let ids = list(
        &conn,
        &fx.admin,
        &NotificationQuery {
            from_date: Some("2017-09-06T12:00:00Z".to_string()),
            to_date: Some("2017-09-07T18:00:00Z".to_string()),
            ..NotificationQuery::default()
        },
    );
    assert_eq!(ids, vec![fx.n_direct_s2, fx.n_class_a]);
    assert!(!ids.contains(&fx.n_dual_s3));
}

#[test]
fn ordering_is_date_descending_with_insertion_order_tie_break() {
    let conn = open_db_in_memory().unwrap();
    let fx = seed(&conn);

    let ids = list(&conn, &fx.admin, &NotificationQuery::default());
    assert_eq!(
        ids,
        vec![
            fx.n_tie_first,
            fx.n_tie_second,
            fx.n_dual_s3,
            fx.n_direct_s2,
            fx.n_class_a,
            fx.n_direct_s1,
        ]
    );
}

#[test]
fn size_limits_the_page_and_zero_yields_an_empty_page() {
    let conn = open_db_in_memory().unwrap();
    let fx = seed(&conn);

    let ids = list(
        &conn,
        &fx.admin,
        &NotificationQuery {
            size: Some("2".to_string()),
            ..NotificationQuery::default()
        },
    );
    assert_eq!(ids, vec![fx.n_tie_first, fx.n_tie_second]);

    let ids = list(
        &conn,
        &fx.admin,
        &NotificationQuery {
            size: Some("0".to_string()),
            ..NotificationQuery::default()
        },
    );
    assert!(ids.is_empty());
}

#[test]
fn filters_compose_over_the_scope() {
    let conn = open_db_in_memory().unwrap();
    let fx = seed(&conn);

    // Counterpart + date range + size together.
    let ids = list(
        &conn,
        &fx.admin,
        &NotificationQuery {
            student: Some(fx.student1.to_string()),
            from_date: Some("2017-09-06".to_string()),
            size: Some("1".to_string()),
            ..NotificationQuery::default()
        },
    );
    assert_eq!(ids, vec![fx.n_tie_first]);
}
