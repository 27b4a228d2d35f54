//! Database probes.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgConnectOptions;
use sqlx::{ConnectOptions, Connection, PgConnection};

use crate::domain::models::context::RunContext;
use crate::domain::models::measurement::Measurement;
use crate::domain::models::message::{Datatype, Message, MessageDescription};
use crate::domain::models::subject::{Database, DatabaseEngine, Subject, SubjectKind};
use crate::domain::ports::probe::{Probe, ProbeAction, ProbeMeta};

/// Connection settings for `database`, passed field by field so credentials
/// never go through URL parsing.
pub fn connect_options(database: &Database) -> PgConnectOptions {
    let mut options = PgConnectOptions::new().host(&database.host.hostname);
    if let Some(port) = database.port {
        options = options.port(port);
    }
    if let Some(user) = &database.user {
        options = options.username(user);
    }
    if let Some(password) = &database.password {
        options = options.password(password);
    }
    if let Some(name) = &database.database {
        options = options.database(name);
    }
    options
}

/// Open a connection to `database`. Shared with the backend jobs probe.
pub async fn connect(database: &Database) -> Result<PgConnection> {
    match database.engine {
        DatabaseEngine::Postgres => connect_options(database)
            .connect()
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to database {} on {}",
                    database.info.id, database.host.hostname
                )
            }),
    }
}

/// Logs in and records the server version.
pub struct LoginProbe;

#[async_trait]
impl ProbeAction for LoginProbe {
    async fn measure(&self, subject: &Subject, context: &RunContext) -> Result<Measurement> {
        let database = subject
            .as_database()
            .with_context(|| format!("{} is not a database", subject.id()))?;
        if context.simulate {
            return Ok(Measurement::good());
        }

        let mut conn = connect(database).await?;
        let version: String = sqlx::query_scalar("SELECT version()")
            .fetch_one(&mut conn)
            .await
            .context("Failed to read server version")?;
        conn.close().await.ok();

        Ok(Measurement::good().with_message(Message::value("version", version)))
    }
}

pub fn login_probe() -> Probe {
    Probe::new(
        ProbeMeta::new(
            "login",
            "Login",
            "Check we can log into the database and record server info",
            SubjectKind::Database,
        )
        .with_message(MessageDescription::new(
            "version",
            "Server version",
            "Version string reported by the database server",
            Datatype::Text,
        )
        .hidden()),
        Arc::new(LoginProbe),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::subject::{Server, SubjectInfo};

    fn database(password: &str) -> Database {
        Database {
            info: SubjectInfo::new("main"),
            engine: DatabaseEngine::Postgres,
            host: Arc::new(Server::new(SubjectInfo::new("dbhost"), "db.example.com")),
            database: Some("app".into()),
            port: Some(5433),
            user: Some("pg".into()),
            password: Some(password.into()),
        }
    }

    #[test]
    fn test_reserved_characters_in_password_keep_target() {
        let options = connect_options(&database("p@ss/w#rd"));
        assert_eq!(options.get_host(), "db.example.com");
        assert_eq!(options.get_port(), 5433);
        assert_eq!(options.get_username(), "pg");
        assert_eq!(options.get_database(), Some("app"));
    }

    #[test]
    fn test_optional_fields_leave_host_alone() {
        let mut db = database("secret");
        db.port = None;
        db.database = None;
        db.user = None;
        assert_eq!(connect_options(&db).get_host(), "db.example.com");
    }

    #[tokio::test]
    async fn test_simulated_login_is_good() {
        let subject = Subject::Database(Arc::new(database("secret")));
        let ctx = RunContext::new().with_simulate(true);
        let m = LoginProbe.measure(&subject, &ctx).await.unwrap();
        assert_eq!(m.status, crate::domain::models::status::Status::Good);
    }
}
