//! Database-friendly flat export of a result tree.
//!
//! One line per probe leaf:
//!
//! ```text
//! Server.webhost.ping=good
//! ```
//!
//! followed by one line per message of that leaf:
//!
//! ```text
//! Server.webhost.mounts.mount./mnt/a=true
//! Website.site.urls.url.http://example.com=ERROR: connection refused
//! ```
//!
//! Subject type, id, probe name and value are quoted when they contain a
//! `.`. Message names and parameters are written as they are, so everything
//! after the probe name belongs to the message.

use crate::domain::models::measurement::{Measurement, MeasurementSubject};
use crate::domain::models::message::MessagePayload;

/// Quote `s` when it contains a dot.
pub fn markup(s: &str) -> String {
    if s.contains('.') {
        format!("\"{s}\"")
    } else {
        s.to_string()
    }
}

/// Lines for a single probe leaf. Non-leaf nodes produce nothing.
pub fn leaf_lines(leaf: &Measurement) -> Vec<String> {
    let (Some(MeasurementSubject::Testable { kind, id, .. }), Some(probe)) =
        (&leaf.subject, &leaf.probe)
    else {
        return Vec::new();
    };

    let prefix = format!(
        "{}.{}.{}",
        markup(kind.type_name()),
        markup(id),
        markup(&probe.name)
    );

    let mut lines = Vec::with_capacity(1 + leaf.messages.len());
    lines.push(format!("{prefix}={}", leaf.status));
    for message in &leaf.messages {
        let parameter = message
            .parameter
            .as_ref()
            .map(|p| format!(".{p}"))
            .unwrap_or_default();
        let rhs = match &message.payload {
            MessagePayload::Value(v) => markup(&v.to_string()),
            MessagePayload::Error(e) => format!("ERROR: {e}"),
        };
        lines.push(format!("{prefix}.{}{parameter}={rhs}", message.name));
    }
    lines
}

/// Lines for every probe leaf in the tree, in tree order.
pub fn result_lines(root: &Measurement) -> Vec<String> {
    root.leaves().into_iter().flat_map(leaf_lines).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::message::Message;
    use crate::domain::models::subject::SubjectKind;
    use crate::domain::ports::probe::ProbeMeta;
    use std::sync::Arc;

    fn leaf(kind: SubjectKind, id: &str, probe: &str, m: Measurement) -> Measurement {
        let mut m = m.with_subject(MeasurementSubject::Testable {
            kind,
            id: id.into(),
            label: id.into(),
        });
        m.probe = Some(Arc::new(ProbeMeta::new(probe, probe, "", kind)));
        m
    }

    #[test]
    fn test_good_leaf_without_messages() {
        let m = leaf(SubjectKind::Server, "webhost", "ping", Measurement::good());
        assert_eq!(leaf_lines(&m), vec!["Server.webhost.ping=good".to_string()]);
    }

    #[test]
    fn test_messages_with_parameter_and_error() {
        let m = leaf(
            SubjectKind::Website,
            "site",
            "urls",
            Measurement::failed()
                .with_message(Message::value("url", "12 ms").with_parameter("home"))
                .with_message(Message::error("url", "connection refused").with_parameter("api")),
        );
        assert_eq!(
            leaf_lines(&m),
            vec![
                "Website.site.urls=failed".to_string(),
                "Website.site.urls.url.home=12 ms".to_string(),
                "Website.site.urls.url.api=ERROR: connection refused".to_string(),
            ]
        );
    }

    #[test]
    fn test_dotted_values_are_quoted() {
        let m = leaf(
            SubjectKind::Server,
            "192.168.4.10",
            "mounts",
            Measurement::good().with_message(Message::value("ratio", 0.5)),
        );
        assert_eq!(
            leaf_lines(&m),
            vec![
                "Server.\"192.168.4.10\".mounts=good".to_string(),
                "Server.\"192.168.4.10\".mounts.ratio=\"0.5\"".to_string(),
            ]
        );
    }

    #[test]
    fn test_parameters_are_not_quoted() {
        let m = leaf(
            SubjectKind::Website,
            "site",
            "urls",
            Measurement::failed().with_message(
                Message::error("url", "connection refused").with_parameter("http://example.com"),
            ),
        );
        assert_eq!(
            leaf_lines(&m)[1],
            "Website.site.urls.url.http://example.com=ERROR: connection refused"
        );
    }

    #[test]
    fn test_parent_nodes_produce_no_lines() {
        let m = Measurement::parent(MeasurementSubject::System { label: None });
        assert!(leaf_lines(&m).is_empty());
    }

    #[test]
    fn test_result_lines_walks_tree() {
        let mut root = Measurement::parent(MeasurementSubject::System { label: None });
        let mut subject = Measurement::parent(MeasurementSubject::Testable {
            kind: SubjectKind::Server,
            id: "a".into(),
            label: "a".into(),
        });
        subject.add_child(leaf(SubjectKind::Server, "a", "ping", Measurement::good()));
        subject.add_child(leaf(SubjectKind::Server, "a", "aliveness", Measurement::failed()));
        root.add_child(subject);
        assert_eq!(
            result_lines(&root),
            vec![
                "Server.a.ping=good".to_string(),
                "Server.a.aliveness=failed".to_string(),
            ]
        );
    }
}
