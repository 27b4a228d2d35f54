//! Isolated probe invocation.
//!
//! Every probe call goes through [`run_probe`], which guarantees a leaf
//! [`Measurement`] comes back no matter how the probe behaves: errors,
//! panics and timeouts all become `Error` leaves with a descriptive message,
//! so one failing probe never takes its siblings down with it.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;

use crate::domain::models::context::RunContext;
use crate::domain::models::measurement::{fold_measurements, Measurement, MeasurementSubject};
use crate::domain::models::status::Status;
use crate::domain::models::subject::Subject;
use crate::domain::ports::probe::{Probe, ProbeMeta};

/// Invoke one probe against one subject and return its finished leaf.
pub async fn run_probe(probe: &Probe, subject: &Subject, context: &RunContext) -> Measurement {
    let start = Instant::now();
    let call = AssertUnwindSafe(probe.action().measure(subject, context)).catch_unwind();

    let mut measurement = match tokio::time::timeout(context.probe_timeout, call).await {
        Ok(Ok(Ok(measurement))) => measurement,
        Ok(Ok(Err(err))) => {
            tracing::warn!(
                subject = subject.id(),
                probe = probe.name(),
                error = %err,
                "Probe returned an error"
            );
            Measurement::error(format!("{err:#}"))
        }
        Ok(Err(panic)) => {
            let reason = panic_message(panic.as_ref());
            tracing::error!(
                subject = subject.id(),
                probe = probe.name(),
                reason = %reason,
                "Probe panicked"
            );
            Measurement::error(format!("probe panicked: {reason}"))
        }
        Err(_) => {
            tracing::warn!(
                subject = subject.id(),
                probe = probe.name(),
                timeout_secs = context.probe_timeout.as_secs_f64(),
                "Probe timed out"
            );
            Measurement::error(format!(
                "timed out after {:.1}s",
                context.probe_timeout.as_secs_f64()
            ))
        }
    };

    // Parent states are computed by the runner, never reported by a probe.
    if matches!(measurement.status, Status::Empty | Status::InProgress) {
        measurement.status = if measurement.children.is_empty() {
            Status::Error
        } else {
            fold_measurements(&measurement.children)
        };
    }

    bind_descriptions(&mut measurement, probe.meta());
    measurement.subject = Some(MeasurementSubject::testable(subject));
    measurement.probe = Some(Arc::clone(probe.meta()));
    measurement.important = true;
    measurement.elapsed = Some(start.elapsed());

    tracing::info!(
        subject = subject.id(),
        probe = probe.name(),
        status = %measurement.status,
        messages = measurement.messages.len(),
        elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Probe complete"
    );

    measurement
}

/// Attach declared descriptions to messages by exact name.
///
/// Messages without a matching description are kept as they are.
pub fn bind_descriptions(measurement: &mut Measurement, meta: &ProbeMeta) {
    for message in &mut measurement.messages {
        if message.description.is_none() {
            message.description = meta.describe(&message.name).cloned();
        }
    }
    for child in &mut measurement.children {
        bind_descriptions(child, meta);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::message::{Datatype, Message, MessageDescription};
    use crate::domain::models::subject::{Server, SubjectInfo, SubjectKind};
    use crate::domain::ports::probe::ProbeAction;
    use async_trait::async_trait;
    use std::time::Duration;

    struct Fixed(Status);

    #[async_trait]
    impl ProbeAction for Fixed {
        async fn measure(&self, _: &Subject, _: &RunContext) -> anyhow::Result<Measurement> {
            Ok(Measurement::new(self.0)
                .with_message(Message::value("files", 3_i64))
                .with_message(Message::value("extra", "x")))
        }
    }

    struct Failing;

    #[async_trait]
    impl ProbeAction for Failing {
        async fn measure(&self, _: &Subject, _: &RunContext) -> anyhow::Result<Measurement> {
            anyhow::bail!("connection refused")
        }
    }

    struct Panicking;

    #[async_trait]
    impl ProbeAction for Panicking {
        async fn measure(&self, _: &Subject, _: &RunContext) -> anyhow::Result<Measurement> {
            panic!("boom")
        }
    }

    struct Slow;

    #[async_trait]
    impl ProbeAction for Slow {
        async fn measure(&self, _: &Subject, _: &RunContext) -> anyhow::Result<Measurement> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Measurement::good())
        }
    }

    fn subject() -> Subject {
        Subject::Server(Arc::new(Server::new(SubjectInfo::new("webhost"), "h")))
    }

    fn probe(action: Arc<dyn ProbeAction>) -> Probe {
        Probe::new(
            ProbeMeta::new("test", "Test", "", SubjectKind::Server).with_message(
                MessageDescription::new("files", "Matching files", "", Datatype::Integer),
            ),
            action,
        )
    }

    #[tokio::test]
    async fn test_success_binds_descriptions() {
        let m = run_probe(&probe(Arc::new(Fixed(Status::Good))), &subject(), &RunContext::new()).await;
        assert_eq!(m.status, Status::Good);
        assert_eq!(m.messages[0].label(), "Matching files");
        assert!(m.messages[1].description.is_none());
        assert_eq!(m.probe_name(), Some("test"));
        assert!(matches!(
            m.subject,
            Some(MeasurementSubject::Testable { ref id, .. }) if id == "webhost"
        ));
    }

    #[tokio::test]
    async fn test_error_becomes_error_leaf() {
        let m = run_probe(&probe(Arc::new(Failing)), &subject(), &RunContext::new()).await;
        assert_eq!(m.status, Status::Error);
        assert_eq!(m.messages.len(), 1);
        assert_eq!(m.messages[0].get_error(), Some("connection refused"));
        assert!(m.messages[0].get_value().is_none());
    }

    #[tokio::test]
    async fn test_panic_becomes_error_leaf() {
        let m = run_probe(&probe(Arc::new(Panicking)), &subject(), &RunContext::new()).await;
        assert_eq!(m.status, Status::Error);
        assert!(m.messages[0].get_error().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_timeout_becomes_error_leaf() {
        let ctx = RunContext::new().with_probe_timeout(Duration::from_millis(20));
        let m = run_probe(&probe(Arc::new(Slow)), &subject(), &ctx).await;
        assert_eq!(m.status, Status::Error);
        assert!(m.messages[0].get_error().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_unsettled_status_without_children_is_error() {
        let m = run_probe(&probe(Arc::new(Fixed(Status::Empty))), &subject(), &RunContext::new()).await;
        assert_eq!(m.status, Status::Error);
    }
}
