use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use pgvector::Vector;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{Postgres, Row};
use tracing::{debug, warn};

use crate::config::DatabaseConfig;
use crate::staffing::domain::{
    Allocation, AllocationId, Candidate, CandidateId, EmbeddingVector, Project, ProjectId,
    UserSummary,
};
use crate::staffing::matching::{
    effective_limit, EligibilityStatus, SimilarityMatch, VectorStore, VectorStoreError,
};
use crate::staffing::notifications::{
    InAppNotification, NewInAppNotification, NotificationStore, NotificationType,
};
use crate::staffing::repository::{
    AllocationRepository, CandidateRepository, ProjectDirectory, ProjectRepository,
    RepositoryError,
};

const PROJECT_EMBEDDING_STATE: &str = "\
SELECT (embedding IS NOT NULL) AS embedded
FROM projects
WHERE id = $1 AND deleted_at IS NULL";

// $1 is the project id, used for the target vector and both "already on this
// project" checks; $2 is the row limit.
const RANKING_QUERY: &str = "\
WITH proj AS (
    SELECT embedding AS e, COALESCE(start_date::date, CURRENT_DATE) AS starts_on
    FROM projects
    WHERE id = $1 AND embedding IS NOT NULL AND deleted_at IS NULL
),
ranked AS (
    SELECT
        ep.user_id::bigint AS user_id,
        COALESCE(ep.geo, '') AS geo,
        ep.type AS profile_type,
        COALESCE(ep.skills, '[]'::jsonb) AS skills,
        COALESCE(ep.years_of_experience, 0)::int4 AS years_of_experience,
        COALESCE(ep.industry, '') AS industry,
        COALESCE(ep.availability_flag, false) AS availability_flag,
        ep.date_of_joining::date AS date_of_joining,
        ep.end_date::date AS end_date,
        ep.notice_date::date AS notice_date,
        u.first_name,
        u.last_name,
        u.email,
        u.role,
        u.slack_user_id,
        (ep.embedding <=> proj.e)::float8 AS distance,
        CASE
            WHEN NOT EXISTS (
                SELECT 1 FROM project_allocations pa
                WHERE pa.employee_id = ep.user_id
                  AND pa.deleted_at IS NULL
                  AND pa.end_date IS NULL
            ) OR (
                ep.availability_flag = false
                AND NOT EXISTS (
                    SELECT 1 FROM project_allocations pa
                    WHERE pa.employee_id = ep.user_id
                      AND pa.project_id = $1
                      AND pa.deleted_at IS NULL
                )
                AND EXISTS (
                    SELECT 1 FROM project_allocations pa
                    WHERE pa.employee_id = ep.user_id
                      AND pa.deleted_at IS NULL
                      AND pa.end_date IS NOT NULL
                      AND pa.end_date::date BETWEEN proj.starts_on - 7 AND proj.starts_on + 7
                )
            ) THEN 'onBench'
            WHEN ep.availability_flag = true
                AND NOT EXISTS (
                    SELECT 1 FROM project_allocations pa
                    WHERE pa.employee_id = ep.user_id
                      AND pa.project_id = $1
                      AND pa.deleted_at IS NULL
                ) THEN 'onWork'
        END AS status
    FROM employee_profiles ep
    INNER JOIN users u ON u.id = ep.user_id
    CROSS JOIN proj
    WHERE ep.embedding IS NOT NULL
      AND ep.deleted_at IS NULL
      AND u.deleted_at IS NULL
)
SELECT * FROM ranked
WHERE status IS NOT NULL
ORDER BY distance
LIMIT $2";

const PROJECT_COLUMNS: &str = "\
SELECT id::bigint AS id, name, COALESCE(description, '') AS description, seats_by_type,
       COALESCE(summary, '') AS summary, start_date::date AS start_date,
       end_date::date AS end_date, embedding
FROM projects";

const PROJECT_BY_ID: &str = "WHERE id = $1 AND deleted_at IS NULL";

const LIST_PROJECTS: &str = "WHERE deleted_at IS NULL ORDER BY id";

// The projects table requires both dates; a missing end date falls back to the start.
const INSERT_PROJECT: &str = "\
INSERT INTO projects (id, name, description, required_seats, seats_by_type, start_date,
                      end_date, status, summary, embedding, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, COALESCE($6::date, CURRENT_DATE),
        COALESCE($7::date, $6::date, CURRENT_DATE), 'Open', $8, $9, NOW(), NOW())";

const UPDATE_PROJECT: &str = "\
UPDATE projects
SET name = $2, description = $3, required_seats = $4, seats_by_type = $5,
    start_date = COALESCE($6::date, start_date), end_date = COALESCE($7::date, end_date),
    summary = $8, embedding = $9, updated_at = NOW()
WHERE id = $1 AND deleted_at IS NULL";

const CANDIDATE_COLUMNS: &str = "\
SELECT ep.user_id::bigint AS user_id,
       COALESCE(ep.geo, '') AS geo,
       ep.type AS profile_type,
       COALESCE(ep.skills, '[]'::jsonb) AS skills,
       COALESCE(ep.years_of_experience, 0)::int4 AS years_of_experience,
       COALESCE(ep.industry, '') AS industry,
       COALESCE(ep.availability_flag, false) AS availability_flag,
       ep.date_of_joining::date AS date_of_joining,
       ep.end_date::date AS end_date,
       ep.notice_date::date AS notice_date,
       ep.embedding,
       u.first_name, u.last_name, u.email, u.role, u.slack_user_id
FROM employee_profiles ep
LEFT JOIN users u ON u.id = ep.user_id AND u.deleted_at IS NULL";

const CANDIDATE_BY_ID: &str = "WHERE ep.user_id = $1 AND ep.deleted_at IS NULL";

const LIST_CANDIDATES: &str = "WHERE ep.deleted_at IS NULL ORDER BY ep.user_id";

const INSERT_CANDIDATE: &str = "\
INSERT INTO employee_profiles (user_id, geo, date_of_joining, end_date, notice_date, type,
                               skills, years_of_experience, industry, availability_flag,
                               embedding, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW(), NOW())";

const UPDATE_CANDIDATE: &str = "\
UPDATE employee_profiles
SET geo = $2, date_of_joining = $3, end_date = $4, notice_date = $5, type = $6,
    skills = $7, years_of_experience = $8, industry = $9, availability_flag = $10,
    embedding = $11, updated_at = NOW()
WHERE user_id = $1 AND deleted_at IS NULL";

const ALLOCATION_COLUMNS: &str = "\
SELECT id::bigint AS id, project_id::bigint AS project_id, employee_id::bigint AS employee_id,
       allocation_type, start_date::date AS start_date, end_date::date AS end_date
FROM project_allocations";

const ALLOCATIONS_FOR_PROJECT: &str = "WHERE project_id = $1 AND deleted_at IS NULL ORDER BY id";

const ALLOCATIONS_FOR_CANDIDATE: &str = "WHERE employee_id = $1 AND deleted_at IS NULL ORDER BY id";

const INSERT_ALLOCATION: &str = "\
INSERT INTO project_allocations (project_id, employee_id, allocation_type, start_date, end_date,
                                 created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
RETURNING id::bigint AS id";

const INSERT_ALLOCATION_WITH_ID: &str = "\
INSERT INTO project_allocations (project_id, employee_id, allocation_type, start_date, end_date,
                                 id, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
RETURNING id::bigint AS id";

const DELETE_ALLOCATION: &str = "\
UPDATE project_allocations SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL";

const INSERT_NOTIFICATION: &str = "\
INSERT INTO notifications (type, message, user_id, is_read, created_at, updated_at)
VALUES ($1, $2, $3, false, NOW(), NOW())
RETURNING id::bigint AS id, created_at";

const NOTIFICATIONS_FOR_USER: &str = "\
SELECT id::bigint AS id, type, message, user_id::bigint AS user_id, is_read, created_at
FROM notifications
WHERE user_id = $1 AND deleted_at IS NULL AND ($2 = false OR is_read = false)
ORDER BY created_at DESC";

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

/// Postgres + pgvector adapter backing every staffing trait.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lazily connecting pool; the first query opens the connection.
    pub fn connect_lazy(config: &DatabaseConfig, url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy(url)?;
        Ok(Self::new(pool))
    }

    /// Round trip used by `/ready`.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map(|_| ())
    }

    async fn rank(
        &self,
        project_id: ProjectId,
        limit: i64,
        with_user: bool,
    ) -> Result<Vec<SimilarityMatch>, VectorStoreError> {
        let embedded: Option<bool> = sqlx::query_scalar(PROJECT_EMBEDDING_STATE)
            .bind(project_id.0)
            .fetch_optional(&self.pool)
            .await?;
        match embedded {
            None => return Err(VectorStoreError::ProjectNotFound(project_id)),
            Some(false) => return Err(VectorStoreError::ProjectNotEmbedded(project_id)),
            Some(true) => {}
        }

        let rows = sqlx::query(RANKING_QUERY)
            .bind(project_id.0)
            .bind(effective_limit(limit))
            .fetch_all(&self.pool)
            .await?;
        debug!(%project_id, rows = rows.len(), "ranking query returned");

        rows.iter()
            .map(|row| similarity_row(row, with_user))
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(VectorStoreError::from)
    }
}

fn to_vector(embedding: Option<&EmbeddingVector>) -> Option<Vector> {
    embedding.map(|vector| Vector::from(vector.as_slice().to_vec()))
}

fn user_row(row: &PgRow) -> Result<Option<UserSummary>, sqlx::Error> {
    let first_name: Option<String> = row.try_get("first_name")?;
    let Some(first_name) = first_name else {
        return Ok(None);
    };
    let text = |column: &str| -> Result<String, sqlx::Error> {
        Ok(row.try_get::<Option<String>, _>(column)?.unwrap_or_default())
    };
    Ok(Some(UserSummary {
        first_name,
        last_name: text("last_name")?,
        email: text("email")?,
        role: text("role")?,
        chat_handle: row.try_get("slack_user_id")?,
    }))
}

/// Profile columns shared by the ranking query and the repository reads.
/// `skills` is a jsonb array.
fn candidate_row(row: &PgRow, with_user: bool) -> Result<Candidate, sqlx::Error> {
    let years: i32 = row.try_get("years_of_experience")?;
    let Json(skills): Json<Vec<String>> = row.try_get("skills")?;

    Ok(Candidate {
        id: CandidateId(row.try_get("user_id")?),
        user: if with_user { user_row(row)? } else { None },
        geo: row.try_get("geo")?,
        profile_type: row.try_get("profile_type")?,
        skills,
        years_of_experience: u32::try_from(years).unwrap_or(0),
        industry: row.try_get("industry")?,
        open_to_extra_work: row.try_get("availability_flag")?,
        date_of_joining: row.try_get("date_of_joining")?,
        end_date: row.try_get("end_date")?,
        notice_date: row.try_get("notice_date")?,
        embedding: None,
    })
}

fn similarity_row(row: &PgRow, with_user: bool) -> Result<SimilarityMatch, sqlx::Error> {
    let distance: f64 = row.try_get("distance")?;
    let status: Option<String> = row.try_get("status")?;

    Ok(SimilarityMatch {
        candidate: candidate_row(row, with_user)?,
        similarity: 1.0 - distance,
        status: status.as_deref().and_then(EligibilityStatus::from_label),
    })
}

fn stored_candidate_row(row: &PgRow) -> Result<Candidate, sqlx::Error> {
    let mut candidate = candidate_row(row, true)?;
    let embedding: Option<Vector> = row.try_get("embedding")?;
    candidate.embedding = embedding.map(|vector| EmbeddingVector::new(vector.to_vec()));
    Ok(candidate)
}

fn project_row(row: &PgRow) -> Result<Project, sqlx::Error> {
    let seats: Option<Json<BTreeMap<String, u32>>> = row.try_get("seats_by_type")?;
    let embedding: Option<Vector> = row.try_get("embedding")?;
    let start_date: Option<NaiveDate> = row.try_get("start_date")?;
    let end_date: Option<NaiveDate> = row.try_get("end_date")?;

    Ok(Project {
        id: ProjectId(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        seats_by_role: seats.map(|Json(seats)| seats).unwrap_or_default(),
        summary: row.try_get("summary")?,
        start_date,
        end_date,
        embedding: embedding.map(|vector| EmbeddingVector::new(vector.to_vec())),
    })
}

fn allocation_row(row: &PgRow) -> Result<Allocation, sqlx::Error> {
    Ok(Allocation {
        id: AllocationId(row.try_get("id")?),
        project_id: ProjectId(row.try_get("project_id")?),
        candidate_id: CandidateId(row.try_get("employee_id")?),
        allocation_type: row.try_get("allocation_type")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
    })
}

/// Binds `$1..$11` in the column order of the candidate insert and update.
fn bind_candidate<'q>(query: PgQuery<'q>, candidate: &'q Candidate) -> PgQuery<'q> {
    query
        .bind(candidate.id.0)
        .bind(&candidate.geo)
        .bind(candidate.date_of_joining)
        .bind(candidate.end_date)
        .bind(candidate.notice_date)
        .bind(&candidate.profile_type)
        .bind(Json(&candidate.skills))
        .bind(i32::try_from(candidate.years_of_experience).unwrap_or(i32::MAX))
        .bind(&candidate.industry)
        .bind(candidate.open_to_extra_work)
        .bind(to_vector(candidate.embedding.as_ref()))
}

/// Binds `$1..$9` in the column order of the project insert and update.
fn bind_project<'q>(query: PgQuery<'q>, project: &'q Project) -> PgQuery<'q> {
    let required_seats: u32 = project.seats_by_role.values().sum();
    query
        .bind(project.id.0)
        .bind(&project.name)
        .bind(&project.description)
        .bind(i32::try_from(required_seats).unwrap_or(i32::MAX))
        .bind(Json(&project.seats_by_role))
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(&project.summary)
        .bind(to_vector(project.embedding.as_ref()))
}

fn bind_allocation<'q>(query: PgQuery<'q>, allocation: &'q Allocation) -> PgQuery<'q> {
    query
        .bind(allocation.project_id.0)
        .bind(allocation.candidate_id.0)
        .bind(&allocation.allocation_type)
        .bind(allocation.start_date)
        .bind(allocation.end_date)
}

fn expect_one_row(rows_affected: u64) -> Result<(), RepositoryError> {
    if rows_affected == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl VectorStore for PostgresStore {
    async fn similar_profiles(
        &self,
        project_id: ProjectId,
        limit: i64,
    ) -> Result<Vec<SimilarityMatch>, VectorStoreError> {
        self.rank(project_id, limit, false).await
    }

    async fn similar_profiles_with_user(
        &self,
        project_id: ProjectId,
        limit: i64,
    ) -> Result<Vec<SimilarityMatch>, VectorStoreError> {
        self.rank(project_id, limit, true).await
    }
}

#[async_trait]
impl ProjectDirectory for PostgresStore {
    async fn project(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError> {
        let sql = format!("{PROJECT_COLUMNS}\n{PROJECT_BY_ID}");
        let row = sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(project_row).transpose()?)
    }
}

#[async_trait]
impl ProjectRepository for PostgresStore {
    async fn insert_project(&self, project: Project) -> Result<Project, RepositoryError> {
        bind_project(sqlx::query(INSERT_PROJECT), &project)
            .execute(&self.pool)
            .await?;
        Ok(project)
    }

    async fn update_project(&self, project: Project) -> Result<(), RepositoryError> {
        let result = bind_project(sqlx::query(UPDATE_PROJECT), &project)
            .execute(&self.pool)
            .await?;
        expect_one_row(result.rows_affected())
    }

    async fn list_projects(&self) -> Result<Vec<Project>, RepositoryError> {
        let sql = format!("{PROJECT_COLUMNS}\n{LIST_PROJECTS}");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(project_row).collect::<Result<_, _>>()?)
    }
}

#[async_trait]
impl CandidateRepository for PostgresStore {
    async fn candidate(&self, id: CandidateId) -> Result<Option<Candidate>, RepositoryError> {
        let sql = format!("{CANDIDATE_COLUMNS}\n{CANDIDATE_BY_ID}");
        let row = sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(stored_candidate_row).transpose()?)
    }

    async fn insert_candidate(&self, candidate: Candidate) -> Result<Candidate, RepositoryError> {
        bind_candidate(sqlx::query(INSERT_CANDIDATE), &candidate)
            .execute(&self.pool)
            .await?;
        Ok(candidate)
    }

    async fn update_candidate(&self, candidate: Candidate) -> Result<(), RepositoryError> {
        let result = bind_candidate(sqlx::query(UPDATE_CANDIDATE), &candidate)
            .execute(&self.pool)
            .await?;
        expect_one_row(result.rows_affected())
    }

    async fn list_candidates(&self) -> Result<Vec<Candidate>, RepositoryError> {
        let sql = format!("{CANDIDATE_COLUMNS}\n{LIST_CANDIDATES}");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(stored_candidate_row).collect::<Result<_, _>>()?)
    }
}

#[async_trait]
impl AllocationRepository for PostgresStore {
    /// An id of 0 lets the database assign one.
    async fn insert_allocation(
        &self,
        mut allocation: Allocation,
    ) -> Result<Allocation, RepositoryError> {
        let query = if allocation.id == AllocationId(0) {
            bind_allocation(sqlx::query(INSERT_ALLOCATION), &allocation)
        } else {
            bind_allocation(sqlx::query(INSERT_ALLOCATION_WITH_ID), &allocation)
                .bind(allocation.id.0)
        };
        let row = query.fetch_one(&self.pool).await?;
        let id: i64 = row.try_get("id")?;
        allocation.id = AllocationId(id);
        Ok(allocation)
    }

    async fn delete_allocation(&self, id: AllocationId) -> Result<(), RepositoryError> {
        let result = sqlx::query(DELETE_ALLOCATION)
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        expect_one_row(result.rows_affected())
    }

    async fn allocations_for_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Allocation>, RepositoryError> {
        let sql = format!("{ALLOCATION_COLUMNS}\n{ALLOCATIONS_FOR_PROJECT}");
        let rows = sqlx::query(&sql)
            .bind(project_id.0)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(allocation_row).collect::<Result<_, _>>()?)
    }

    async fn allocations_for_candidate(
        &self,
        candidate_id: CandidateId,
    ) -> Result<Vec<Allocation>, RepositoryError> {
        let sql = format!("{ALLOCATION_COLUMNS}\n{ALLOCATIONS_FOR_CANDIDATE}");
        let rows = sqlx::query(&sql)
            .bind(candidate_id.0)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(allocation_row).collect::<Result<_, _>>()?)
    }
}

#[async_trait]
impl NotificationStore for PostgresStore {
    async fn insert_notification(
        &self,
        notification: NewInAppNotification,
    ) -> Result<InAppNotification, RepositoryError> {
        let row = sqlx::query(INSERT_NOTIFICATION)
            .bind(notification.kind.label())
            .bind(&notification.message)
            .bind(notification.user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(InAppNotification {
            id: row.try_get("id")?,
            user_id: notification.user_id,
            kind: notification.kind,
            message: notification.message,
            is_read: false,
            created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        })
    }

    async fn notifications_for_user(
        &self,
        user_id: i64,
        unread_only: bool,
    ) -> Result<Vec<InAppNotification>, RepositoryError> {
        let rows = sqlx::query(NOTIFICATIONS_FOR_USER)
            .bind(user_id)
            .bind(unread_only)
            .fetch_all(&self.pool)
            .await?;

        let mut notifications = Vec::with_capacity(rows.len());
        for row in rows {
            let label: String = row.try_get("type")?;
            let Some(kind) = NotificationType::from_label(&label) else {
                warn!(%label, "skipping notification with unknown type");
                continue;
            };
            notifications.push(InAppNotification {
                id: row.try_get("id")?,
                user_id: row.try_get("user_id")?,
                kind,
                message: row.try_get("message")?,
                is_read: row.try_get("is_read")?,
                created_at: row.try_get("created_at")?,
            });
        }
        Ok(notifications)
    }
}
