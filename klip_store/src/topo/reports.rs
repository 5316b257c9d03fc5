//! Maintenance reports and their authors.
//!
//! Reporters are identified by e-mail. Filing a report creates the user on first
//! use; later reports only fill in name parts that are non-empty. A report can be
//! changed or deleted by its author only.

use diesel::{SqliteConnection, dsl::exists, select};
use diesel::prelude::*;
use tracing::{debug, info};

use super::{TopoError, TopoResult, queries::ReportWithReporter, roles::UserRole};
use crate::models::{AppUser, NewAppUser, NewReport, Report, ReportChanges};
use crate::schema::{app_user, pitch, report};

/// Checks and comment shared by new and edited reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportUpdate {
    /// Visual inspection done.
    pub visual_check: Option<bool>,
    /// Anchor inspection done.
    pub anchor_check: Option<bool>,
    /// Cleaning done.
    pub cleaning_done: Option<bool>,
    /// Loose rock removed.
    pub trundle_done: Option<bool>,
    /// Full rebolting done.
    pub total_rebolting_done: Option<bool>,
    /// Free-text comment.
    pub comment: Option<String>,
}

impl ReportUpdate {
    fn changes(&self) -> ReportChanges<'_> {
        ReportChanges {
            comment: self.comment.as_deref(),
            visual_check: self.visual_check,
            anchor_check: self.anchor_check,
            cleaning_done: self.cleaning_done,
            trundle_done: self.trundle_done,
            total_rebolting_done: self.total_rebolting_done,
        }
    }
}

/// A report filed on one or more pitches at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportInput {
    /// Pitches covered; one report row each.
    pub pitch_ids: Vec<i32>,
    /// Author e-mail.
    pub user_email: String,
    /// Author full name, split into first name and the rest.
    pub user_name: Option<String>,
    /// Checks and comment.
    pub details: ReportUpdate,
}

#[derive(AsChangeset)]
#[diesel(table_name = app_user)]
struct ReporterNames<'a> {
    firstname: Option<&'a str>,
    lastname: Option<&'a str>,
}

/// `"Jean Pierre Dupont"` → `("Jean", "Pierre Dupont")`.
pub fn split_name(full: Option<&str>) -> (String, String) {
    let mut parts = full.unwrap_or_default().split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let rest = parts.collect::<Vec<_>>().join(" ");
    (first, rest)
}

/// User with this exact e-mail.
pub fn get_user_by_email(conn: &mut SqliteConnection, email: &str) -> TopoResult<Option<AppUser>> {
    Ok(app_user::table
        .filter(app_user::email.eq(email))
        .select(AppUser::as_select())
        .first(conn)
        .optional()?)
}

/// User with this e-mail, created as a contributor when missing.
///
/// Non-empty parts of `name` replace the stored first and last name.
pub fn get_or_create_user(
    conn: &mut SqliteConnection,
    email: &str,
    name: Option<&str>,
) -> TopoResult<AppUser> {
    let email = email.trim();
    if email.is_empty() {
        return Err(TopoError::Invalid {
            field: "email",
            reason: "is required".into(),
        });
    }
    upsert_reporter(conn, email, name)
}

fn upsert_reporter(
    conn: &mut SqliteConnection,
    email: &str,
    name: Option<&str>,
) -> TopoResult<AppUser> {
    let (firstname, lastname) = split_name(name);
    let Some(user) = get_user_by_email(conn, email)? else {
        let user = diesel::insert_into(app_user::table)
            .values(&NewAppUser {
                email,
                firstname: &firstname,
                lastname: &lastname,
                role: UserRole::Contributor.as_db(),
            })
            .returning(AppUser::as_returning())
            .get_result(conn)?;
        debug!(user_id = user.id, email, "reporter created");
        return Ok(user);
    };

    let names = ReporterNames {
        firstname: Some(firstname.as_str()).filter(|s| !s.is_empty()),
        lastname: Some(lastname.as_str()).filter(|s| !s.is_empty()),
    };
    if names.firstname.is_none() && names.lastname.is_none() {
        return Ok(user);
    }
    Ok(diesel::update(app_user::table.find(user.id))
        .set(&names)
        .returning(AppUser::as_returning())
        .get_result(conn)?)
}

/// File one report per pitch in `input.pitch_ids`, creating or updating the author.
/// All rows are written in one transaction; returns the new report ids in input order.
pub fn create_report(conn: &mut SqliteConnection, input: &ReportInput) -> TopoResult<Vec<i32>> {
    if input.pitch_ids.is_empty() {
        return Err(TopoError::Invalid {
            field: "pitch_ids",
            reason: "select at least one pitch".into(),
        });
    }
    let email = input.user_email.trim();
    if email.is_empty() {
        return Err(TopoError::Invalid {
            field: "user_email",
            reason: "is required".into(),
        });
    }

    conn.transaction::<_, TopoError, _>(|conn| {
        let reporter = upsert_reporter(conn, email, input.user_name.as_deref())?;
        let d = &input.details;

        let mut ids = Vec::with_capacity(input.pitch_ids.len());
        for &pitch_id in &input.pitch_ids {
            if !select(exists(pitch::table.find(pitch_id))).get_result::<bool>(conn)? {
                return Err(TopoError::NotFound {
                    entity: "pitch",
                    id: pitch_id,
                });
            }
            let id = diesel::insert_into(report::table)
                .values(&NewReport {
                    pitch_id,
                    reporter_id: reporter.id,
                    comment: d.comment.as_deref(),
                    visual_check: d.visual_check,
                    anchor_check: d.anchor_check,
                    cleaning_done: d.cleaning_done,
                    trundle_done: d.trundle_done,
                    total_rebolting_done: d.total_rebolting_done,
                })
                .returning(report::id)
                .get_result(conn)?;
            ids.push(id);
        }
        info!(reporter_id = reporter.id, reports = ids.len(), "reports filed");
        Ok(ids)
    })
}

/// One report with its author.
pub fn get_report(
    conn: &mut SqliteConnection,
    report_id: i32,
) -> TopoResult<Option<ReportWithReporter>> {
    Ok(report::table
        .inner_join(app_user::table)
        .filter(report::id.eq(report_id))
        .select((Report::as_select(), AppUser::as_select()))
        .first::<(Report, AppUser)>(conn)
        .optional()?
        .map(|(report, reporter)| ReportWithReporter { report, reporter }))
}

fn owned_report(
    conn: &mut SqliteConnection,
    actor_email: &str,
    report_id: i32,
    action: &str,
) -> TopoResult<Report> {
    let found = get_report(conn, report_id)?.ok_or(TopoError::NotFound {
        entity: "report",
        id: report_id,
    })?;
    if found.reporter.email != actor_email {
        return Err(TopoError::Forbidden(format!(
            "only the author can {action} this report"
        )));
    }
    Ok(found.report)
}

/// Replace every check and the comment of a report; absent values are cleared.
pub fn update_report(
    conn: &mut SqliteConnection,
    actor_email: &str,
    report_id: i32,
    update: &ReportUpdate,
) -> TopoResult<Report> {
    owned_report(conn, actor_email, report_id, "edit")?;
    Ok(diesel::update(report::table.find(report_id))
        .set(&update.changes())
        .returning(Report::as_returning())
        .get_result(conn)?)
}

/// Delete a report.
pub fn delete_report(conn: &mut SqliteConnection, actor_email: &str, report_id: i32) -> TopoResult<()> {
    owned_report(conn, actor_email, report_id, "delete")?;
    diesel::delete(report::table.find(report_id)).execute(conn)?;
    info!(report_id, "report deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::split_name;

    #[test]
    fn names_split_on_whitespace() {
        assert_eq!(
            split_name(Some("  Jean  Pierre   Dupont ")),
            ("Jean".to_string(), "Pierre Dupont".to_string())
        );
        assert_eq!(split_name(Some("Cher")), ("Cher".to_string(), String::new()));
        assert_eq!(split_name(None), (String::new(), String::new()));
    }
}
