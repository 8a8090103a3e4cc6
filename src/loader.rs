//! Tolerant application of serialized text to a container tree.

use serde_json::Value as JsonValue;

use crate::codec::{self, Section};
use crate::engine::RuledContainer;
use crate::error::ConfigError;
use crate::value::Value;

struct Report<'a> {
    source: &'a str,
    okay: bool,
    on_warning: &'a mut dyn FnMut(&str),
}

impl Report<'_> {
    fn warn(&mut self, section: &str, message: String) {
        tracing::warn!(source = self.source, section, "{message}");
        (self.on_warning)(&message);
        self.okay = false;
    }
}

/// Apply `data` to `root`. The first path segment of every section names the
/// root itself and is skipped. Unknown sections and rejected entries are
/// reported and skipped; everything else is applied.
pub(crate) fn load(
    root: &mut dyn RuledContainer,
    data: &str,
    source: &str,
    on_warning: &mut dyn FnMut(&str),
) -> bool {
    let parsed = codec::parse(data);
    let mut report = Report {
        source,
        okay: true,
        on_warning,
    };

    for problem in parsed.problems {
        report.warn("", format!("Invalid ({source}): {problem}"));
    }

    for section in &parsed.sections {
        let Some(target) = resolve(&mut *root, section) else {
            report.warn(section.name(), format!(
                "Invalid ({source}): section {} does not exist",
                section.name()
            ));
            continue;
        };
        for entry in &section.entries {
            let result = match codec::unescape(&entry.value) {
                Ok(text) => target.load_entry(&entry.key, JsonValue::String(text)),
                Err(e) => Err(ConfigError::invalid_value(
                    target.header().child_path(&entry.key),
                    entry.value.clone(),
                    e.to_string(),
                )),
            };
            if let Err(e) = result {
                report.warn(section.name(), format!(
                    "Invalid ({source}): section {}, variable {}: {e}",
                    section.name(),
                    entry.key
                ));
            }
        }
    }

    tracing::debug!(source, sections = parsed.sections.len(), okay = report.okay, "loaded settings");
    report.okay
}

/// Walk to the container a section names, creating missing children on the
/// way when their rule allows a container. List addresses that do not exist
/// yet append a fresh element.
fn resolve<'a>(
    root: &'a mut dyn RuledContainer,
    section: &Section,
) -> Option<&'a mut dyn RuledContainer> {
    let mut current = root;
    for part in section.path().into_iter().skip(1) {
        current = descend(current, &part).ok()?;
    }
    Some(current)
}

fn descend<'a>(
    container: &'a mut dyn RuledContainer,
    part: &str,
) -> Result<&'a mut dyn RuledContainer, ConfigError> {
    let key = if container.contains_key(part) {
        part.to_string()
    } else {
        container.materialize(part)?
    };
    let err = ConfigError::NotAContainer {
        path: container.header().child_path(&key),
    };
    container
        .lookup_mut(&key)
        .and_then(Value::as_container_mut)
        .ok_or(err)
}
