use console::style;

use crate::domain::models::measurement::{Measurement, MeasurementSubject};
use crate::domain::models::message::{Message, MessagePayload};
use crate::domain::models::status::Status;

/// Unicode box-drawing characters for tree visualization
const TREE_BRANCH: &str = "├── ";
const TREE_LAST: &str = "└── ";
const TREE_PIPE: &str = "│   ";
const TREE_SPACE: &str = "    ";

/// Render a result tree
///
/// Parent nodes show their label and folded status, probe leaves show the
/// probe label, and each message is listed under its leaf.
///
/// # Arguments
/// * `root` - The measurement to render, usually the system measurement
/// * `use_color` - Whether to emit ANSI colors
pub fn render_measurement_tree(root: &Measurement, use_color: bool) -> String {
    let mut output = String::new();
    render_node(root, 0, true, "", use_color, &mut output);
    output
}

fn render_node(
    node: &Measurement,
    depth: usize,
    is_last: bool,
    prefix: &str,
    use_color: bool,
    output: &mut String,
) {
    let connector = if depth == 0 {
        ""
    } else if is_last {
        TREE_LAST
    } else {
        TREE_BRANCH
    };

    let mut line = format!(
        "{prefix}{connector}{} {} [{}]",
        render_status_icon(node.status, use_color),
        node_label(node),
        render_status_text(node.status, use_color)
    );
    if !node.important {
        line.push_str(" (unimportant)");
    }
    if let Some(elapsed) = node.elapsed {
        line.push_str(&format!(" {}ms", elapsed.as_millis()));
    }
    output.push_str(&line);
    output.push('\n');

    let child_prefix = if depth == 0 {
        String::new()
    } else if is_last {
        format!("{prefix}{TREE_SPACE}")
    } else {
        format!("{prefix}{TREE_PIPE}")
    };

    let messages: Vec<&Message> = node.messages.iter().filter(|m| m.is_shown()).collect();
    let total = messages.len() + node.children.len();
    for (i, message) in messages.iter().enumerate() {
        let connector = if i + 1 == total { TREE_LAST } else { TREE_BRANCH };
        output.push_str(&format!(
            "{child_prefix}{connector}{}\n",
            render_message(message, use_color)
        ));
    }
    for (i, child) in node.children.iter().enumerate() {
        let last = messages.len() + i + 1 == total;
        render_node(child, depth + 1, last, &child_prefix, use_color, output);
    }
}

fn node_label(node: &Measurement) -> String {
    if let Some(probe) = &node.probe {
        return probe.label.clone();
    }
    match &node.subject {
        Some(MeasurementSubject::Testable { kind, label, .. }) => format!("{kind} {label}"),
        Some(subject) => subject.display_label().to_string(),
        None => String::new(),
    }
}

fn render_message(message: &Message, use_color: bool) -> String {
    let mut key = message.label().to_string();
    if let Some(parameter) = &message.parameter {
        key.push_str(&format!(" {parameter}"));
    }
    let unit = message
        .description
        .as_ref()
        .and_then(|d| d.unit.as_deref())
        .map(|u| format!(" {u}"))
        .unwrap_or_default();

    match &message.payload {
        MessagePayload::Value(value) => format!("{key}: {value}{unit}"),
        MessagePayload::Error(error) => {
            let text = format!("{key}: ERROR {error}");
            if use_color {
                style(text).red().to_string()
            } else {
                text
            }
        }
    }
}

/// Map status to visual icon
fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Good => "✓",
        Status::Failed => "✗",
        Status::Error => "!",
        Status::Mixed => "◐",
        Status::NotApplicable => "-",
        Status::InProgress => "⟳",
        Status::Empty => "○",
    }
}

fn paint(text: &str, status: Status) -> String {
    let styled = style(text);
    match status {
        Status::Good => styled.green().bold(),
        Status::Failed => styled.red(),
        Status::Error => styled.red().bold(),
        Status::Mixed => styled.yellow(),
        Status::InProgress => styled.cyan(),
        Status::NotApplicable | Status::Empty => styled.dim(),
    }
    .to_string()
}

/// Render a status icon, optionally colored
pub fn render_status_icon(status: Status, use_color: bool) -> String {
    let icon = status_icon(status);
    if use_color {
        paint(icon, status)
    } else {
        icon.to_string()
    }
}

/// Render a status name, optionally colored
pub fn render_status_text(status: Status, use_color: bool) -> String {
    if use_color {
        paint(status.as_str(), status)
    } else {
        status.as_str().to_string()
    }
}
