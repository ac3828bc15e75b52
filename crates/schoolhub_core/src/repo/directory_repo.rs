//! Directory graph repository: users, roles, classes, subjects,
//! teaching assignments and schedule entries.
//!
//! # Responsibility
//! - Own every relationship traversal (parent<->child,
//!   teacher<->class<->subject, student<->class) as indexed adjacency
//!   queries, never object-graph pointer walking.
//! - Compile `UserScope`/`SubjectScope` visibility predicates into single
//!   SQL statements that compose with further filtering.
//! - Provide the provisioning/import write surface.
//!
//! # Invariants
//! - Scope compilation never materializes intermediate id lists; reach
//!   rules become EXISTS/IN subqueries over the adjacency tables.
//! - All list orders are deterministic (`id ASC` unless stated otherwise).

use crate::model::directory::{
    parse_weekday, weekday_to_db, Class, ScheduleEntry, Subject, TeachingAssignment, Weekday,
};
use crate::model::user::{parse_role, role_to_db, Role, User, UserId};
use crate::model::{AssignmentId, ClassId, SubjectId};
use crate::repo::{ensure_connection_ready, parse_db_bool, parse_db_timestamp, RepoError, RepoResult};
use crate::time::format_utc;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const USER_SELECT_SQL: &str = "SELECT
    u.id,
    u.email,
    u.first_name,
    u.last_name,
    u.is_active,
    u.date_joined,
    u.attends_class_id
FROM users u";

const DIRECTORY_TABLES: &[&str] = &[
    "users",
    "user_roles",
    "user_parents",
    "user_subjects",
    "classes",
    "subjects",
    "teaching_assignments",
    "schedule_entries",
];

/// Role-derived base set for user directory queries.
///
/// Each variant is an abstract set predicate; the repository compiles it
/// to a WHERE clause, so scopes compose with secondary filters without
/// loading all records. `no_students` is folded into the scope because
/// the student arm differs per role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserScope {
    /// Everyone except the principal; optionally excluding anyone holding
    /// the Student role.
    AdminAll { except: UserId, no_students: bool },
    /// Other teachers, parents of students in the teacher's classes and
    /// (unless `no_students`) students of those classes.
    TeacherReach { teacher: UserId, no_students: bool },
    /// Co-parents of classmates of the principal's children, teachers of
    /// the children's classes and (unless `no_students`) the children.
    ParentReach { parent: UserId, no_students: bool },
    /// No visible users at all.
    Empty,
}

/// Role-derived base set for the subjects view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectScope {
    All,
    /// Subjects the teacher holds at least one assignment for.
    TaughtBy(UserId),
    Empty,
}

/// Fields for user provisioning.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
}

/// Teaching assignment joined with its teacher and subject records, as
/// nested in class and schedule projections.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AssignmentDetail {
    pub assignment: TeachingAssignment,
    pub teacher: User,
    pub subject: Subject,
}

/// One schedule entry joined with the subject and class it is taught in.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSlot {
    pub entry: ScheduleEntry,
    pub subject: Subject,
    pub class: Class,
}

/// Repository interface for the directory graph.
pub trait DirectoryRepository {
    fn create_user(&self, user: &NewUser) -> RepoResult<UserId>;
    fn grant_role(&self, user_id: UserId, role: Role) -> RepoResult<()>;
    fn set_attends(&self, student_id: UserId, class_id: Option<ClassId>) -> RepoResult<()>;
    fn link_parent(&self, child_id: UserId, parent_id: UserId) -> RepoResult<()>;
    fn add_student_subject(&self, student_id: UserId, subject_id: SubjectId) -> RepoResult<()>;

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn users_by_ids(&self, ids: &[UserId]) -> RepoResult<Vec<User>>;
    fn list_users(&self, scope: &UserScope) -> RepoResult<Vec<User>>;
    /// Scope membership test for single-record retrieval; composes the
    /// scope predicate with an id equality instead of loading the set.
    fn user_in_scope(&self, scope: &UserScope, id: UserId) -> RepoResult<bool>;
    /// Parents of one user, ascending id order.
    fn parents_of(&self, user_id: UserId) -> RepoResult<Vec<User>>;
    /// Children of one parent, ascending id order.
    fn children_of(&self, parent_id: UserId) -> RepoResult<Vec<User>>;
    fn subjects_of_student(&self, user_id: UserId) -> RepoResult<Vec<Subject>>;

    fn create_class(&self, name: &str) -> RepoResult<ClassId>;
    fn create_subject(&self, name: &str) -> RepoResult<SubjectId>;
    fn list_classes(&self) -> RepoResult<Vec<Class>>;
    fn get_class(&self, id: ClassId) -> RepoResult<Option<Class>>;
    fn class_exists(&self, id: ClassId) -> RepoResult<bool>;
    fn subject_exists(&self, id: SubjectId) -> RepoResult<bool>;
    /// Students attending one class, ascending id order.
    fn class_students(&self, class_id: ClassId) -> RepoResult<Vec<User>>;
    fn class_assignments(&self, class_id: ClassId) -> RepoResult<Vec<AssignmentDetail>>;
    fn list_subjects(
        &self,
        scope: &SubjectScope,
        class_filter: Option<ClassId>,
    ) -> RepoResult<Vec<Subject>>;
    /// Distinct parents (Parent role) of students attending one class,
    /// ascending id order. Fan-out contract for class-targeted pushes.
    fn class_parent_ids(&self, class_id: ClassId) -> RepoResult<Vec<UserId>>;

    fn create_assignment(
        &self,
        teacher_id: UserId,
        subject_id: SubjectId,
        class_id: ClassId,
    ) -> RepoResult<AssignmentId>;
    fn create_schedule_entry(
        &self,
        assignment_id: AssignmentId,
        day: Weekday,
        starts_at: &str,
        slot_order: u8,
    ) -> RepoResult<i64>;
    fn schedule_for_teacher(&self, teacher_id: UserId) -> RepoResult<Vec<ScheduleSlot>>;
}

/// SQLite-backed directory repository.
pub struct SqliteDirectoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDirectoryRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, DIRECTORY_TABLES)?;
        Ok(Self { conn })
    }
}

impl DirectoryRepository for SqliteDirectoryRepository<'_> {
    fn create_user(&self, user: &NewUser) -> RepoResult<UserId> {
        self.conn.execute(
            "INSERT INTO users (email, first_name, last_name, is_active, date_joined)
             VALUES (?1, ?2, ?3, 1, ?4);",
            params![
                user.email.as_str(),
                user.first_name.as_str(),
                user.last_name.as_str(),
                format_utc(user.date_joined),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn grant_role(&self, user_id: UserId, role: Role) -> RepoResult<()> {
        require_user(self.conn, user_id)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?1, ?2);",
            params![user_id, role_to_db(role)],
        )?;
        Ok(())
    }

    fn set_attends(&self, student_id: UserId, class_id: Option<ClassId>) -> RepoResult<()> {
        if let Some(class_id) = class_id {
            require_class(self.conn, class_id)?;
        }
        let changed = self.conn.execute(
            "UPDATE users SET attends_class_id = ?2 WHERE id = ?1;",
            params![student_id, class_id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "user",
                id: student_id,
            });
        }
        Ok(())
    }

    fn link_parent(&self, child_id: UserId, parent_id: UserId) -> RepoResult<()> {
        require_user(self.conn, child_id)?;
        require_user(self.conn, parent_id)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO user_parents (user_id, parent_id) VALUES (?1, ?2);",
            params![child_id, parent_id],
        )?;
        Ok(())
    }

    fn add_student_subject(&self, student_id: UserId, subject_id: SubjectId) -> RepoResult<()> {
        require_user(self.conn, student_id)?;
        require_subject(self.conn, subject_id)?;
        self.conn.execute(
            "INSERT OR IGNORE INTO user_subjects (user_id, subject_id) VALUES (?1, ?2);",
            params![student_id, subject_id],
        )?;
        Ok(())
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE u.id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn users_by_ids(&self, ids: &[UserId]) -> RepoResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql =
            format!("{USER_SELECT_SQL} WHERE u.id IN ({placeholders}) ORDER BY u.id ASC;");
        let bind_values: Vec<Value> = ids.iter().map(|id| Value::Integer(*id)).collect();
        self.query_users(&sql, bind_values)
    }

    fn list_users(&self, scope: &UserScope) -> RepoResult<Vec<User>> {
        let (predicate, bind_values) = compile_user_scope(scope);
        let sql = format!("{USER_SELECT_SQL} WHERE {predicate} ORDER BY u.id ASC;");
        self.query_users(&sql, bind_values)
    }

    fn user_in_scope(&self, scope: &UserScope, id: UserId) -> RepoResult<bool> {
        let (predicate, mut bind_values) = compile_user_scope(scope);
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM users u WHERE ({predicate}) AND u.id = ?);"
        );
        bind_values.push(Value::Integer(id));
        let exists: i64 =
            self.conn
                .query_row(&sql, params_from_iter(bind_values), |row| row.get(0))?;
        Ok(exists == 1)
    }

    fn parents_of(&self, user_id: UserId) -> RepoResult<Vec<User>> {
        let sql = format!(
            "{USER_SELECT_SQL}
             INNER JOIN user_parents up ON up.parent_id = u.id
             WHERE up.user_id = ?
             ORDER BY u.id ASC;"
        );
        self.query_users(&sql, vec![Value::Integer(user_id)])
    }

    fn children_of(&self, parent_id: UserId) -> RepoResult<Vec<User>> {
        let sql = format!(
            "{USER_SELECT_SQL}
             INNER JOIN user_parents up ON up.user_id = u.id
             WHERE up.parent_id = ?
             ORDER BY u.id ASC;"
        );
        self.query_users(&sql, vec![Value::Integer(parent_id)])
    }

    fn subjects_of_student(&self, user_id: UserId) -> RepoResult<Vec<Subject>> {
        let mut stmt = self.conn.prepare(
            "SELECT s.id, s.name
             FROM subjects s
             INNER JOIN user_subjects us ON us.subject_id = s.id
             WHERE us.user_id = ?1
             ORDER BY s.id ASC;",
        )?;
        let mut rows = stmt.query([user_id])?;
        let mut subjects = Vec::new();
        while let Some(row) = rows.next()? {
            subjects.push(parse_subject_row(row)?);
        }
        Ok(subjects)
    }

    fn create_class(&self, name: &str) -> RepoResult<ClassId> {
        self.conn
            .execute("INSERT INTO classes (name) VALUES (?1);", [name])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn create_subject(&self, name: &str) -> RepoResult<SubjectId> {
        self.conn
            .execute("INSERT INTO subjects (name) VALUES (?1);", [name])?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_classes(&self) -> RepoResult<Vec<Class>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM classes ORDER BY id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut classes = Vec::new();
        while let Some(row) = rows.next()? {
            classes.push(parse_class_row(row)?);
        }
        Ok(classes)
    }

    fn get_class(&self, id: ClassId) -> RepoResult<Option<Class>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM classes WHERE id = ?1;")?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_class_row(row)?));
        }
        Ok(None)
    }

    fn class_exists(&self, id: ClassId) -> RepoResult<bool> {
        row_exists(self.conn, "SELECT EXISTS(SELECT 1 FROM classes WHERE id = ?1);", id)
    }

    fn subject_exists(&self, id: SubjectId) -> RepoResult<bool> {
        row_exists(
            self.conn,
            "SELECT EXISTS(SELECT 1 FROM subjects WHERE id = ?1);",
            id,
        )
    }

    fn class_students(&self, class_id: ClassId) -> RepoResult<Vec<User>> {
        let sql = format!(
            "{USER_SELECT_SQL} WHERE u.attends_class_id = ? ORDER BY u.id ASC;"
        );
        self.query_users(&sql, vec![Value::Integer(class_id)])
    }

    fn class_assignments(&self, class_id: ClassId) -> RepoResult<Vec<AssignmentDetail>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                ta.id,
                ta.teacher_id,
                ta.subject_id,
                ta.class_id,
                s.name AS subject_name
             FROM teaching_assignments ta
             INNER JOIN subjects s ON s.id = ta.subject_id
             WHERE ta.class_id = ?1
             ORDER BY ta.id ASC;",
        )?;
        let mut rows = stmt.query([class_id])?;
        let mut details = Vec::new();
        while let Some(row) = rows.next()? {
            let assignment = TeachingAssignment {
                id: row.get("id")?,
                teacher_id: row.get("teacher_id")?,
                subject_id: row.get("subject_id")?,
                class_id: row.get("class_id")?,
            };
            let subject = Subject {
                id: assignment.subject_id,
                name: row.get("subject_name")?,
            };
            let teacher = self.get_user(assignment.teacher_id)?.ok_or(RepoError::NotFound {
                entity: "user",
                id: assignment.teacher_id,
            })?;
            details.push(AssignmentDetail {
                assignment,
                teacher,
                subject,
            });
        }
        Ok(details)
    }

    fn list_subjects(
        &self,
        scope: &SubjectScope,
        class_filter: Option<ClassId>,
    ) -> RepoResult<Vec<Subject>> {
        let (predicate, mut bind_values) = compile_subject_scope(scope);
        let mut sql = format!("SELECT s.id, s.name FROM subjects s WHERE {predicate}");

        // Class filter is a set intersection applied after the role-based
        // base predicate; an empty base stays empty.
        if let Some(class_id) = class_filter {
            sql.push_str(
                " AND s.id IN (
                    SELECT ta.subject_id
                    FROM teaching_assignments ta
                    WHERE ta.class_id = ?
                )",
            );
            bind_values.push(Value::Integer(class_id));
        }

        sql.push_str(" ORDER BY s.id ASC;");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut subjects = Vec::new();
        while let Some(row) = rows.next()? {
            subjects.push(parse_subject_row(row)?);
        }
        Ok(subjects)
    }

    fn class_parent_ids(&self, class_id: ClassId) -> RepoResult<Vec<UserId>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT p.id
             FROM users p
             INNER JOIN user_parents up ON up.parent_id = p.id
             INNER JOIN users child ON child.id = up.user_id
             WHERE child.attends_class_id = ?1
               AND EXISTS (
                    SELECT 1 FROM user_roles r
                    WHERE r.user_id = p.id AND r.role = 'PARENT'
               )
             ORDER BY p.id ASC;",
        )?;
        let mut rows = stmt.query([class_id])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get(0)?);
        }
        Ok(ids)
    }

    fn create_assignment(
        &self,
        teacher_id: UserId,
        subject_id: SubjectId,
        class_id: ClassId,
    ) -> RepoResult<AssignmentId> {
        require_user(self.conn, teacher_id)?;
        require_subject(self.conn, subject_id)?;
        require_class(self.conn, class_id)?;
        self.conn.execute(
            "INSERT INTO teaching_assignments (teacher_id, subject_id, class_id)
             VALUES (?1, ?2, ?3);",
            params![teacher_id, subject_id, class_id],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn create_schedule_entry(
        &self,
        assignment_id: AssignmentId,
        day: Weekday,
        starts_at: &str,
        slot_order: u8,
    ) -> RepoResult<i64> {
        self.conn.execute(
            "INSERT INTO schedule_entries (assignment_id, day, starts_at, slot_order)
             VALUES (?1, ?2, ?3, ?4);",
            params![assignment_id, weekday_to_db(day), starts_at, slot_order],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn schedule_for_teacher(&self, teacher_id: UserId) -> RepoResult<Vec<ScheduleSlot>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                se.id,
                se.assignment_id,
                se.day,
                se.starts_at,
                se.slot_order,
                s.id AS subject_id,
                s.name AS subject_name,
                c.id AS class_id,
                c.name AS class_name
             FROM schedule_entries se
             INNER JOIN teaching_assignments ta ON ta.id = se.assignment_id
             INNER JOIN subjects s ON s.id = ta.subject_id
             INNER JOIN classes c ON c.id = ta.class_id
             WHERE ta.teacher_id = ?1
             ORDER BY se.id ASC;",
        )?;
        let mut rows = stmt.query([teacher_id])?;
        let mut slots = Vec::new();
        while let Some(row) = rows.next()? {
            let day_text: String = row.get("day")?;
            let day = parse_weekday(&day_text).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid weekday `{day_text}` in schedule_entries.day"
                ))
            })?;
            slots.push(ScheduleSlot {
                entry: ScheduleEntry {
                    id: row.get("id")?,
                    assignment_id: row.get("assignment_id")?,
                    day,
                    starts_at: row.get("starts_at")?,
                    slot_order: row.get("slot_order")?,
                },
                subject: Subject {
                    id: row.get("subject_id")?,
                    name: row.get("subject_name")?,
                },
                class: Class {
                    id: row.get("class_id")?,
                    name: row.get("class_name")?,
                },
            });
        }
        Ok(slots)
    }
}

impl SqliteDirectoryRepository<'_> {
    fn query_users(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(parse_user_row(self.conn, row)?);
        }
        Ok(users)
    }
}

fn role_membership(role: &'static str) -> String {
    format!(
        "EXISTS (SELECT 1 FROM user_roles r WHERE r.user_id = u.id AND r.role = '{role}')"
    )
}

/// Compiles a user scope into a WHERE predicate over alias `u` plus its
/// positional bind values.
fn compile_user_scope(scope: &UserScope) -> (String, Vec<Value>) {
    match scope {
        UserScope::AdminAll {
            except,
            no_students,
        } => {
            let mut predicate = "u.id <> ?".to_string();
            if *no_students {
                predicate.push_str(&format!(" AND NOT {}", role_membership("STUDENT")));
            }
            (predicate, vec![Value::Integer(*except)])
        }
        UserScope::TeacherReach {
            teacher,
            no_students,
        } => {
            let taught_classes = "SELECT ta.class_id FROM teaching_assignments ta
                 WHERE ta.teacher_id = ?";
            let mut arms = vec![
                format!("({} AND u.id <> ?)", role_membership("TEACHER")),
                format!(
                    "({} AND EXISTS (
                        SELECT 1 FROM user_parents up
                        INNER JOIN users child ON child.id = up.user_id
                        WHERE up.parent_id = u.id
                          AND child.attends_class_id IN ({taught_classes})
                    ))",
                    role_membership("PARENT")
                ),
            ];
            let mut bind_values = vec![Value::Integer(*teacher), Value::Integer(*teacher)];
            if !*no_students {
                arms.push(format!(
                    "({} AND u.attends_class_id IN ({taught_classes}))",
                    role_membership("STUDENT")
                ));
                bind_values.push(Value::Integer(*teacher));
            }
            (format!("({})", arms.join(" OR ")), bind_values)
        }
        UserScope::ParentReach {
            parent,
            no_students,
        } => {
            let child_classes = "SELECT child.attends_class_id FROM users child
                 INNER JOIN user_parents up ON up.user_id = child.id
                 WHERE up.parent_id = ?
                   AND child.attends_class_id IS NOT NULL";
            let mut arms = vec![
                format!(
                    "(u.id <> ? AND {} AND EXISTS (
                        SELECT 1 FROM user_parents up2
                        INNER JOIN users child2 ON child2.id = up2.user_id
                        WHERE up2.parent_id = u.id
                          AND child2.attends_class_id IN ({child_classes})
                    ))",
                    role_membership("PARENT")
                ),
                format!(
                    "({} AND EXISTS (
                        SELECT 1 FROM teaching_assignments ta
                        WHERE ta.teacher_id = u.id
                          AND ta.class_id IN ({child_classes})
                    ))",
                    role_membership("TEACHER")
                ),
            ];
            let mut bind_values = vec![
                Value::Integer(*parent),
                Value::Integer(*parent),
                Value::Integer(*parent),
            ];
            if !*no_students {
                arms.push(format!(
                    "({} AND EXISTS (
                        SELECT 1 FROM user_parents up3
                        WHERE up3.user_id = u.id AND up3.parent_id = ?
                    ))",
                    role_membership("STUDENT")
                ));
                bind_values.push(Value::Integer(*parent));
            }
            (format!("({})", arms.join(" OR ")), bind_values)
        }
        UserScope::Empty => ("0 = 1".to_string(), Vec::new()),
    }
}

/// Compiles a subject scope into a WHERE predicate over alias `s`.
fn compile_subject_scope(scope: &SubjectScope) -> (String, Vec<Value>) {
    match scope {
        SubjectScope::All => ("1 = 1".to_string(), Vec::new()),
        SubjectScope::TaughtBy(teacher) => (
            "EXISTS (
                SELECT 1 FROM teaching_assignments ta
                WHERE ta.subject_id = s.id AND ta.teacher_id = ?
            )"
            .to_string(),
            vec![Value::Integer(*teacher)],
        ),
        SubjectScope::Empty => ("0 = 1".to_string(), Vec::new()),
    }
}

fn parse_user_row(conn: &Connection, row: &Row<'_>) -> RepoResult<User> {
    let id: UserId = row.get("id")?;
    let date_joined_text: String = row.get("date_joined")?;
    let is_active = parse_db_bool(row.get("is_active")?, "users.is_active")?;
    Ok(User {
        id,
        email: row.get("email")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        is_active,
        date_joined: parse_db_timestamp(&date_joined_text, "users.date_joined")?,
        roles: load_roles(conn, id)?,
        attends: row.get("attends_class_id")?,
    })
}

fn load_roles(conn: &Connection, user_id: UserId) -> RepoResult<Vec<Role>> {
    let mut stmt = conn.prepare(
        "SELECT role FROM user_roles
         WHERE user_id = ?1
         ORDER BY CASE role
            WHEN 'ADMIN' THEN 0
            WHEN 'TEACHER' THEN 1
            WHEN 'PARENT' THEN 2
            ELSE 3
         END;",
    )?;
    let mut rows = stmt.query([user_id])?;
    let mut roles = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        let role = parse_role(&value).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid role `{value}` in user_roles.role"))
        })?;
        roles.push(role);
    }
    Ok(roles)
}

fn parse_class_row(row: &Row<'_>) -> RepoResult<Class> {
    Ok(Class {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn parse_subject_row(row: &Row<'_>) -> RepoResult<Subject> {
    Ok(Subject {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

fn row_exists(conn: &Connection, sql: &str, id: i64) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(sql, [id], |row| row.get(0))?;
    Ok(exists == 1)
}

fn require_user(conn: &Connection, id: UserId) -> RepoResult<()> {
    if row_exists(conn, "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);", id)? {
        Ok(())
    } else {
        Err(RepoError::NotFound { entity: "user", id })
    }
}

fn require_class(conn: &Connection, id: ClassId) -> RepoResult<()> {
    if row_exists(conn, "SELECT EXISTS(SELECT 1 FROM classes WHERE id = ?1);", id)? {
        Ok(())
    } else {
        Err(RepoError::NotFound { entity: "class", id })
    }
}

fn require_subject(conn: &Connection, id: SubjectId) -> RepoResult<()> {
    if row_exists(conn, "SELECT EXISTS(SELECT 1 FROM subjects WHERE id = ?1);", id)? {
        Ok(())
    } else {
        Err(RepoError::NotFound {
            entity: "subject",
            id,
        })
    }
}
