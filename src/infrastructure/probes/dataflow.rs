//! Dataflow outage probe.
//!
//! Lists the dataflow directory, keeps the files matching the configured
//! pattern, and fails when there are none or the newest is older than the
//! allowed outage. Directories on a remote server are listed over ssh,
//! otherwise the local filesystem is read.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glob::Pattern;

use crate::domain::models::context::RunContext;
use crate::domain::models::measurement::Measurement;
use crate::domain::models::message::{Datatype, Message, MessageDescription};
use crate::domain::models::status::Status;
use crate::domain::models::subject::{Dataflow, Subject, SubjectKind};
use crate::domain::ports::probe::{Probe, ProbeAction, ProbeMeta};

use super::shell::{shell_quote, SshSessions};

/// A file name with its modification time.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry {
    pub name: String,
    pub modified: DateTime<Utc>,
}

/// Matching file count and newest modification time.
pub fn summarize(entries: &[FileEntry], pattern: &Pattern) -> (usize, Option<DateTime<Utc>>) {
    let matching: Vec<&FileEntry> = entries.iter().filter(|e| pattern.matches(&e.name)).collect();
    let newest = matching.iter().map(|e| e.modified).max();
    (matching.len(), newest)
}

/// Decode `find -printf '%f\t%T@\n'` output.
pub fn parse_find_output(output: &str) -> Vec<FileEntry> {
    output
        .lines()
        .filter_map(|line| {
            let (name, mtime) = line.rsplit_once('\t')?;
            let secs: f64 = mtime.trim().parse().ok()?;
            #[allow(clippy::cast_possible_truncation)]
            let modified = DateTime::from_timestamp(secs.trunc() as i64, 0)?;
            Some(FileEntry {
                name: name.to_string(),
                modified,
            })
        })
        .collect()
}

async fn list_local(directory: &str) -> Result<Vec<FileEntry>> {
    let mut entries = Vec::new();
    let mut dir = tokio::fs::read_dir(directory)
        .await
        .with_context(|| format!("Failed to read directory {directory}"))?;
    while let Some(entry) = dir.next_entry().await? {
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let modified: SystemTime = metadata.modified()?;
        entries.push(FileEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            modified: modified.into(),
        });
    }
    Ok(entries)
}

/// Checks a dataflow directory is still receiving files.
pub struct OutageProbe {
    ssh: Arc<SshSessions>,
}

impl OutageProbe {
    pub fn new(ssh: Arc<SshSessions>) -> Self {
        Self { ssh }
    }

    async fn list(&self, flow: &Dataflow) -> Result<Vec<FileEntry>> {
        let Some(server) = &flow.server else {
            return list_local(&flow.directory).await;
        };
        let user = server
            .ssh_user()
            .with_context(|| format!("No ssh user configured for {}", server.hostname))?;
        let command = format!(
            "find {} -maxdepth 1 -type f -printf '%f\\t%T@\\n'",
            shell_quote(&flow.directory)
        );
        let output = self.ssh.exec(&server.hostname, user, &command).await?;
        Ok(parse_find_output(&output))
    }
}

#[async_trait]
impl ProbeAction for OutageProbe {
    async fn measure(&self, subject: &Subject, context: &RunContext) -> Result<Measurement> {
        let flow = subject
            .as_dataflow()
            .with_context(|| format!("{} is not a dataflow", subject.id()))?;
        if context.simulate {
            return Ok(Measurement::good());
        }

        let pattern = Pattern::new(flow.pattern.as_deref().unwrap_or("*"))
            .with_context(|| format!("Invalid file pattern for dataflow {}", flow.info.id))?;
        let entries = self.list(flow).await?;
        let (files, newest) = summarize(&entries, &pattern);

        let mut result = Measurement::good().with_message(Message::value("files", files));
        let Some(newest) = newest else {
            result.status = Status::Failed;
            return Ok(result);
        };

        let age = (Utc::now() - newest).to_std().unwrap_or(Duration::ZERO);
        result.add_message(Message::value("newest", newest));
        result.add_message(Message::value("age", age));
        if age >= flow.max_outage {
            result.status = Status::Failed;
        }
        Ok(result)
    }
}

pub fn outage_probe(ssh: Arc<SshSessions>) -> Probe {
    Probe::new(
        ProbeMeta::new(
            "outage",
            "Dataflow outage",
            "Test if data is flowing with acceptable timeliness",
            SubjectKind::Dataflow,
        )
        .with_message(MessageDescription::new(
            "files",
            "Matching files",
            "Number of files in dataflow directory matching our pattern",
            Datatype::Integer,
        ))
        .with_message(MessageDescription::new(
            "newest",
            "Newest file",
            "Timestamp of most recent matching file",
            Datatype::Timestamp,
        ))
        .with_message(MessageDescription::new(
            "age",
            "Dataflow outage",
            "How long ago the dataflow was last active",
            Datatype::Duration,
        )),
        Arc::new(OutageProbe::new(ssh)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::subject::SubjectInfo;

    fn flow(directory: &str, pattern: Option<&str>, max_outage: Duration) -> Subject {
        Subject::Dataflow(Arc::new(Dataflow {
            info: SubjectInfo::new("ingest"),
            directory: directory.to_string(),
            server: None,
            pattern: pattern.map(str::to_string),
            max_outage,
        }))
    }

    #[test]
    fn test_parse_find_output() {
        let entries = parse_find_output("a.csv\t1700000000.5\nbroken line\nb.csv\t1700000100.0\n");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].name, "b.csv");
        assert_eq!(entries[1].modified.timestamp(), 1_700_000_100);
    }

    #[test]
    fn test_summarize_filters_by_pattern() {
        let t = |s| DateTime::from_timestamp(s, 0).unwrap();
        let entries = vec![
            FileEntry { name: "a.csv".into(), modified: t(10) },
            FileEntry { name: "b.log".into(), modified: t(30) },
            FileEntry { name: "c.csv".into(), modified: t(20) },
        ];
        let (files, newest) = summarize(&entries, &Pattern::new("*.csv").unwrap());
        assert_eq!(files, 2);
        assert_eq!(newest, Some(t(20)));
    }

    #[tokio::test]
    async fn test_local_fresh_files_are_good() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.csv"), "1").unwrap();
        std::fs::write(dir.path().join("y.txt"), "1").unwrap();

        let subject = flow(dir.path().to_str().unwrap(), Some("*.csv"), Duration::from_secs(3600));
        let m = OutageProbe::new(Arc::new(SshSessions::new()))
            .measure(&subject, &RunContext::new())
            .await
            .unwrap();
        assert_eq!(m.status, Status::Good);
        assert_eq!(m.messages[0].name, "files");
        assert_eq!(m.messages[0].get_value().unwrap().to_string(), "1");
    }

    #[tokio::test]
    async fn test_local_no_matching_files_is_failed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("y.txt"), "1").unwrap();

        let subject = flow(dir.path().to_str().unwrap(), Some("*.csv"), Duration::from_secs(3600));
        let m = OutageProbe::new(Arc::new(SshSessions::new()))
            .measure(&subject, &RunContext::new())
            .await
            .unwrap();
        assert_eq!(m.status, Status::Failed);
        assert_eq!(m.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_stale_files_are_failed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.csv"), "1").unwrap();

        let subject = flow(dir.path().to_str().unwrap(), None, Duration::ZERO);
        let m = OutageProbe::new(Arc::new(SshSessions::new()))
            .measure(&subject, &RunContext::new())
            .await
            .unwrap();
        assert_eq!(m.status, Status::Failed);
    }

    #[tokio::test]
    async fn test_missing_directory_is_error() {
        let subject = flow("/nonexistent/cmon/dataflow", None, Duration::from_secs(60));
        let result = OutageProbe::new(Arc::new(SshSessions::new()))
            .measure(&subject, &RunContext::new())
            .await;
        assert!(result.is_err());
    }
}
