//! Backend jobs probe.
//!
//! Counts rows in the backend database's `jobs` table generated within each
//! configured window. Each job is measured separately and then merged into a
//! single leaf, one keyed `jobs` message per job.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{Connection, PgConnection};
use tracing::debug;

use crate::domain::models::context::RunContext;
use crate::domain::models::measurement::Measurement;
use crate::domain::models::message::{Cardinality, Datatype, Message, MessageDescription};
use crate::domain::models::status::Status;
use crate::domain::models::subject::{BackendJob, Subject, SubjectKind};
use crate::domain::ports::probe::{Probe, ProbeAction, ProbeMeta};

use super::database::connect;

/// SQL counting the rows of one job window.
pub fn job_query(job: &BackendJob) -> &'static str {
    if job.activity.is_empty() {
        "SELECT count(*) FROM jobs WHERE gen_time > $1"
    } else {
        "SELECT count(*) FROM jobs WHERE gen_time > $1 AND activity = ANY($2)"
    }
}

/// Status of one job given its counted rows.
pub const fn job_status(job: &BackendJob, count: i64) -> Status {
    if count >= job.min_count {
        Status::Good
    } else {
        Status::Failed
    }
}

async fn count_jobs(conn: &mut PgConnection, job: &BackendJob) -> Result<i64> {
    let window = chrono::Duration::from_std(job.period).context("Job period out of range")?;
    let min_time: NaiveDateTime = (Utc::now() - window).naive_utc();
    let sql = job_query(job);
    debug!(sql, min_time = %min_time, activity = ?job.activity, "Counting jobs");

    let query = sqlx::query_scalar::<_, i64>(sql).bind(min_time);
    let query = if job.activity.is_empty() {
        query
    } else {
        query.bind(job.activity.clone())
    };
    query
        .fetch_one(conn)
        .await
        .with_context(|| format!("Failed to count jobs for '{}'", job.message()))
}

/// Checks each configured job ran often enough recently.
pub struct JobsProbe;

#[async_trait]
impl ProbeAction for JobsProbe {
    async fn measure(&self, subject: &Subject, context: &RunContext) -> Result<Measurement> {
        let backend = subject
            .as_backend()
            .with_context(|| format!("{} is not a backend", subject.id()))?;
        if backend.jobs.is_empty() {
            return Ok(Measurement::not_applicable());
        }
        if context.simulate {
            return Ok(Measurement::good());
        }
        let database = backend
            .database
            .as_deref()
            .with_context(|| format!("Backend {} has no database", backend.info.id))?;

        let mut conn = connect(database).await?;
        let mut result = Measurement::new(Status::InProgress);
        for job in &backend.jobs {
            let count = count_jobs(&mut conn, job).await?;
            debug!(job = %job.message(), count, "Job count");
            result.add_child(
                Measurement::new(job_status(job, count))
                    .with_message(Message::value("jobs", count).with_parameter(job.message())),
            );
        }
        conn.close().await.ok();

        result.absorb_children();
        Ok(result)
    }
}

pub fn jobs_probe() -> Probe {
    Probe::new(
        ProbeMeta::new(
            "jobs",
            "Jobs",
            "Check the backend generated enough jobs within each configured window",
            SubjectKind::Backend,
        )
        .with_message(
            MessageDescription::new(
                "jobs",
                "Job count",
                "Jobs generated within the window",
                Datatype::Integer,
            )
            .with_cardinality(Cardinality::Keyed),
        ),
        Arc::new(JobsProbe),
    )
}
