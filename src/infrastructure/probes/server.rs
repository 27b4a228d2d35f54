//! Server probes: ping, ssh aliveness and mountpoints.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::models::context::RunContext;
use crate::domain::models::measurement::Measurement;
use crate::domain::models::message::{Cardinality, Datatype, Message, MessageDescription};
use crate::domain::models::status::Status;
use crate::domain::models::subject::{Server, Subject, SubjectKind};
use crate::domain::ports::probe::{Probe, ProbeAction, ProbeMeta};

use super::df::decode_df;
use super::shell::{run_local, SshSessions};

fn server_of(subject: &Subject) -> Result<&Server> {
    subject
        .as_server()
        .with_context(|| format!("{} is not a server", subject.id()))
}

/// ICMP reachability via the system `ping`.
pub struct PingProbe;

#[async_trait]
impl ProbeAction for PingProbe {
    async fn measure(&self, subject: &Subject, context: &RunContext) -> Result<Measurement> {
        let server = server_of(subject)?;
        if context.simulate {
            info!(host = %server.hostname, "Simulating ping");
            return Ok(Measurement::good());
        }

        let output = run_local("ping", &["-c", "1", "-W", "5", &server.hostname]).await?;
        if context.verbose {
            debug!(host = %server.hostname, stdout = %output.stdout, "ping output");
        }
        if output.success {
            Ok(Measurement::good())
        } else {
            Ok(Measurement::failed().with_message(Message::value("ping", output.summary())))
        }
    }
}

pub fn ping_probe() -> Probe {
    Probe::new(
        ProbeMeta::new(
            "ping",
            "Ping",
            "Check the server answers an ICMP echo. A failed ping does not prove the server is down.",
            SubjectKind::Server,
        )
        .with_message(MessageDescription::new(
            "ping",
            "Ping failure",
            "Last line of ping output when the echo went unanswered",
            Datatype::Text,
        )),
        Arc::new(PingProbe),
    )
}

/// Checks an SSH session can be opened as the first configured user.
pub struct AlivenessProbe {
    ssh: Arc<SshSessions>,
}

impl AlivenessProbe {
    pub fn new(ssh: Arc<SshSessions>) -> Self {
        Self { ssh }
    }
}

#[async_trait]
impl ProbeAction for AlivenessProbe {
    async fn measure(&self, subject: &Subject, context: &RunContext) -> Result<Measurement> {
        let server = server_of(subject)?;
        let Some(user) = server.ssh_user() else {
            return Ok(Measurement::not_applicable());
        };
        if context.simulate {
            return Ok(Measurement::good());
        }

        match self.ssh.connect(&server.hostname, user).await {
            Ok(()) => Ok(Measurement::good()),
            Err(e) => Ok(Measurement::failed().with_message(Message::error("ssh", e.to_string()))),
        }
    }
}

pub fn aliveness_probe(ssh: Arc<SshSessions>) -> Probe {
    Probe::new(
        ProbeMeta::new(
            "aliveness",
            "SSH aliveness",
            "Check an ssh session can be opened to the server",
            SubjectKind::Server,
        )
        .with_message(MessageDescription::new(
            "ssh",
            "SSH connection",
            "Connection failure reported by ssh",
            Datatype::Text,
        )),
        Arc::new(AlivenessProbe::new(ssh)),
    )
}

/// Checks every configured mountpoint appears in remote `df` output.
pub struct MountsProbe {
    ssh: Arc<SshSessions>,
}

impl MountsProbe {
    pub fn new(ssh: Arc<SshSessions>) -> Self {
        Self { ssh }
    }
}

#[async_trait]
impl ProbeAction for MountsProbe {
    async fn measure(&self, subject: &Subject, context: &RunContext) -> Result<Measurement> {
        let server = server_of(subject)?;
        if server.mounts.is_empty() {
            return Ok(Measurement::not_applicable());
        }
        if context.simulate {
            return Ok(Measurement::good());
        }
        let user = server
            .ssh_user()
            .with_context(|| format!("No ssh user configured for {}", server.hostname))?;

        let output = self.ssh.exec(&server.hostname, user, "df -P").await?;
        let found = decode_df(&output)?;

        let mut result = Measurement::new(Status::Good);
        for mount in &server.mounts {
            let info = found.get(&mount.mountpoint);
            result.add_message(
                Message::value("mount", info.is_some()).with_parameter(&mount.mountpoint),
            );
            match info {
                Some(info) => {
                    if let Some(percent) = &info.percent {
                        result.add_message(
                            Message::value("usage", percent.as_str())
                                .with_parameter(&mount.mountpoint),
                        );
                    }
                }
                None if mount.required => result.status = Status::Failed,
                None => {}
            }
        }
        Ok(result)
    }
}

pub fn mounts_probe(ssh: Arc<SshSessions>) -> Probe {
    Probe::new(
        ProbeMeta::new(
            "mounts",
            "Mountpoints",
            "Check all configured mountpoints are mounted",
            SubjectKind::Server,
        )
        .with_message(
            MessageDescription::new("mount", "Mounted", "Mountpoint is present", Datatype::Bool)
                .with_cardinality(Cardinality::Keyed),
        )
        .with_message(
            MessageDescription::new("usage", "Usage", "Filesystem capacity used", Datatype::Text)
                .with_cardinality(Cardinality::Keyed),
        ),
        Arc::new(MountsProbe::new(ssh)),
    )
}
