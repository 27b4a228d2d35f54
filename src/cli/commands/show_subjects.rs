//! `cmon show-subjects`

use crate::domain::models::subject::Subject;
use crate::services::binding::resolve_probes;
use crate::services::System;

/// One block per subject: kind, id, label, probes and links.
pub fn render(system: &System) -> String {
    let mut out = String::new();
    for subject in system.all_subjects() {
        out.push_str(&format!("{} {}", subject.kind(), subject.id()));
        if subject.label() != subject.id() {
            out.push_str(&format!(" ({})", subject.label()));
        }
        if !subject.important() {
            out.push_str(" [unimportant]");
        }
        out.push('\n');

        if let Some(description) = subject.description() {
            out.push_str(&format!("    {description}\n"));
        }

        let probes: Vec<&str> = resolve_probes(subject, system.standard_tests())
            .iter()
            .map(|p| p.name())
            .collect();
        if probes.is_empty() {
            out.push_str("    probes: none\n");
        } else {
            out.push_str(&format!("    probes: {}\n", probes.join(", ")));
        }

        let links: Vec<String> = subject.links().iter().map(Subject::to_string).collect();
        if !links.is_empty() {
            out.push_str(&format!("    links: {}\n", links.join(", ")));
        }
    }
    out
}

pub fn execute(system: &System) {
    print!("{}", render(system));
}
