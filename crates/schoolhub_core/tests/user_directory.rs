use chrono::{TimeZone, Utc};
use rusqlite::Connection;
use schoolhub_core::db::open_db_in_memory;
use schoolhub_core::repo::directory_repo::{DirectoryRepository, NewUser, SqliteDirectoryRepository};
use schoolhub_core::{DirectoryService, Principal, Role, ServiceError, UserId};

struct Fixture {
    admin: UserId,
    teacher1: UserId,
    teacher2: UserId,
    teacher3: UserId,
    parent1: UserId,
    parent2: UserId,
    parent3: UserId,
    student1: UserId,
    student2: UserId,
    student3: UserId,
    class_a: i64,
    subject_math: i64,
}

fn seed(conn: &Connection) -> Fixture {
    let directory = SqliteDirectoryRepository::try_new(conn).unwrap();

    let class_a = directory.create_class("5a").unwrap();
    let class_b = directory.create_class("6b").unwrap();
    let subject_math = directory.create_subject("Mathematics").unwrap();
    let subject_bio = directory.create_subject("Biology").unwrap();

    let add_user = |email: &str, role: Role| -> UserId {
        let id = directory
            .create_user(&NewUser {
                email: email.to_string(),
                first_name: "First".to_string(),
                last_name: "Last".to_string(),
                date_joined: Utc.with_ymd_and_hms(2017, 9, 1, 8, 0, 0).unwrap(),
            })
            .unwrap();
        directory.grant_role(id, role).unwrap();
        id
    };

    let admin = add_user("admin@school.example", Role::Admin);
    let teacher1 = add_user("teacher1@school.example", Role::Teacher);
    let teacher2 = add_user("teacher2@school.example", Role::Teacher);
    let teacher3 = add_user("teacher3@school.example", Role::Teacher);
    let parent1 = add_user("parent1@school.example", Role::Parent);
    let parent2 = add_user("parent2@school.example", Role::Parent);
    let parent3 = add_user("parent3@school.example", Role::Parent);
    let student1 = add_user("student1@school.example", Role::Student);
    let student2 = add_user("student2@school.example", Role::Student);
    let student3 = add_user("student3@school.example", Role::Student);

    directory.set_attends(student1, Some(class_a)).unwrap();
    directory.set_attends(student2, Some(class_a)).unwrap();
    directory.set_attends(student3, Some(class_b)).unwrap();
    directory.link_parent(student1, parent1).unwrap();
    directory.link_parent(student2, parent2).unwrap();
    directory.link_parent(student3, parent3).unwrap();
    directory.add_student_subject(student1, subject_math).unwrap();
    directory.add_student_subject(student1, subject_bio).unwrap();

    directory
        .create_assignment(teacher1, subject_math, class_a)
        .unwrap();
    directory
        .create_assignment(teacher2, subject_bio, class_b)
        .unwrap();

    Fixture {
        admin,
        teacher1,
        teacher2,
        teacher3,
        parent1,
        parent2,
        parent3,
        student1,
        student2,
        student3,
        class_a,
        subject_math,
    }
}

fn service(conn: &Connection) -> DirectoryService<SqliteDirectoryRepository<'_>> {
    DirectoryService::new(SqliteDirectoryRepository::try_new(conn).unwrap())
}

fn listed_ids(conn: &Connection, principal: Principal, no_students: bool) -> Vec<UserId> {
    service(conn)
        .list_users(&principal, no_students)
        .unwrap()
        .iter()
        .map(|u| u.id)
        .collect()
}

#[test]
fn admin_sees_everyone_except_self() {
    let conn = open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let principal = Principal {
        user_id: fx.admin,
        role: Some(Role::Admin),
    };

    let ids = listed_ids(&conn, principal, false);
    assert_eq!(ids.len(), 9);
    assert!(!ids.contains(&fx.admin));

    let ids = listed_ids(&conn, principal, true);
    assert_eq!(ids.len(), 6);
    assert!(!ids.contains(&fx.student1));
    assert!(!ids.contains(&fx.student2));
    assert!(!ids.contains(&fx.student3));
}

#[test]
fn teacher_reaches_peers_and_the_families_of_taught_classes() {
    let conn = open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let principal = Principal {
        user_id: fx.teacher1,
        role: Some(Role::Teacher),
    };

    // teacher1 teaches class A only.
    let ids = listed_ids(&conn, principal, false);
    assert_eq!(
        ids,
        vec![fx.teacher2, fx.teacher3, fx.parent1, fx.parent2, fx.student1, fx.student2]
    );

    let ids = listed_ids(&conn, principal, true);
    assert_eq!(ids, vec![fx.teacher2, fx.teacher3, fx.parent1, fx.parent2]);
}

#[test]
fn parent_reaches_co_parents_teachers_and_own_children() {
    let conn = open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let principal = Principal {
        user_id: fx.parent1,
        role: Some(Role::Parent),
    };

    // parent1's child attends class A: parent2 is a co-parent through a
    // classmate, teacher1 teaches the class, student1 is the child.
    let ids = listed_ids(&conn, principal, false);
    assert_eq!(ids, vec![fx.teacher1, fx.parent2, fx.student1]);

    let ids = listed_ids(&conn, principal, true);
    assert_eq!(ids, vec![fx.teacher1, fx.parent2]);
}

#[test]
fn student_contact_list_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let principal = Principal {
        user_id: fx.student1,
        role: Some(Role::Student),
    };

    assert!(listed_ids(&conn, principal, false).is_empty());
}

#[test]
fn user_retrieval_is_gated_by_the_visible_set() {
    let conn = open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let svc = service(&conn);
    let teacher1 = Principal {
        user_id: fx.teacher1,
        role: Some(Role::Teacher),
    };

    // Self always resolves.
    assert_eq!(svc.get_user(&teacher1, fx.teacher1).unwrap().id, fx.teacher1);

    // In reach.
    assert_eq!(svc.get_user(&teacher1, fx.parent1).unwrap().id, fx.parent1);

    // student3 attends a class teacher1 does not teach.
    let err = svc.get_user(&teacher1, fx.student3).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "user", .. }));

    // Same NotFound shape for a missing id.
    let err = svc.get_user(&teacher1, 9999).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "user", .. }));
}

#[test]
fn parent_listing_shares_the_retrieval_gate() {
    let conn = open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let svc = service(&conn);

    let teacher1 = Principal {
        user_id: fx.teacher1,
        role: Some(Role::Teacher),
    };
    let parents: Vec<UserId> = svc
        .user_parents(&teacher1, fx.student1)
        .unwrap()
        .iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(parents, vec![fx.parent1]);

    // teacher2 teaches class B; student1 is out of reach.
    let teacher2 = Principal {
        user_id: fx.teacher2,
        role: Some(Role::Teacher),
    };
    let err = svc.user_parents(&teacher2, fx.student1).unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { entity: "user", .. }));
}

#[test]
fn profile_carries_nested_relationship_detail() {
    let conn = open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let svc = service(&conn);

    let student_profile = svc
        .profile(&Principal {
            user_id: fx.student1,
            role: Some(Role::Student),
        })
        .unwrap();
    assert_eq!(student_profile.user.id, fx.student1);
    assert_eq!(
        student_profile.attends_class.as_ref().map(|c| c.id),
        Some(fx.class_a)
    );
    let subject_ids: Vec<i64> = student_profile.subjects.iter().map(|s| s.id).collect();
    assert!(subject_ids.contains(&fx.subject_math));
    assert_eq!(student_profile.subjects.len(), 2);
    assert!(student_profile.children.is_empty());

    let parent_profile = svc
        .profile(&Principal {
            user_id: fx.parent1,
            role: Some(Role::Parent),
        })
        .unwrap();
    assert!(parent_profile.attends_class.is_none());
    assert!(parent_profile.subjects.is_empty());
    let children: Vec<UserId> = parent_profile.children.iter().map(|u| u.id).collect();
    assert_eq!(children, vec![fx.student1]);
}

#[test]
fn class_projection_nests_roster_and_assignments() {
    let conn = open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let svc = service(&conn);

    let detail = svc.get_class(fx.class_a).unwrap();
    assert_eq!(detail.class.id, fx.class_a);
    let roster: Vec<UserId> = detail.students.iter().map(|s| s.user.id).collect();
    assert_eq!(roster, vec![fx.student1, fx.student2]);
    assert_eq!(detail.students[0].subjects.len(), 2);
    assert!(detail.students[1].subjects.is_empty());
    assert_eq!(detail.assignments.len(), 1);
    assert_eq!(detail.assignments[0].teacher.id, fx.teacher1);
    assert_eq!(detail.assignments[0].subject.id, fx.subject_math);

    let err = svc.get_class(9999).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound { entity: "class", .. }
    ));

    assert_eq!(svc.list_classes().unwrap().len(), 2);
}

#[test]
fn multi_role_principal_acts_under_its_highest_role() {
    let conn = open_db_in_memory().unwrap();
    let fx = seed(&conn);
    let directory = SqliteDirectoryRepository::try_new(&conn).unwrap();

    // parent3 also teaches: Teacher precedence wins over Parent.
    directory.grant_role(fx.parent3, Role::Teacher).unwrap();
    let user = directory.get_user(fx.parent3).unwrap().unwrap();
    let principal = Principal::for_user(&user);
    assert_eq!(principal.role, Some(Role::Teacher));

    // Teacher scope without assignments reaches other teachers only.
    let ids = listed_ids(&conn, principal, false);
    assert_eq!(ids, vec![fx.teacher1, fx.teacher2, fx.teacher3]);
}
