//! Keyboards from JSON files, with generated fallbacks

use super::KeyboardRenderer;
use crate::config::Platform;
use crate::state_machine::action::{KeyboardHandle, KeyboardName};
use crate::state_machine::vocabulary;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;

/// Loads `<platform>_<stem>.json` files once at startup. A keyboard with no
/// file is generated from the built-in vocabulary in the platform's format.
#[derive(Debug, Clone)]
pub struct FileKeyboards {
    platform: Platform,
    files: HashMap<String, Value>,
}

impl FileKeyboards {
    pub fn load(dir: &Path, platform: Platform) -> Self {
        let mut files = HashMap::new();
        let prefix = format!("{}_", platform.prefix());

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::info!(dir = %dir.display(), error = %e, "No keyboard directory, using generated keyboards");
                return Self::generated(platform);
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let Some(stem) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_prefix(&prefix))
            else {
                continue;
            };
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match std::fs::read_to_string(&path).map(|raw| serde_json::from_str::<Value>(&raw)) {
                Ok(Ok(value)) => {
                    files.insert(stem.to_string(), value);
                }
                Ok(Err(e)) => tracing::warn!(path = %path.display(), error = %e, "Malformed keyboard file"),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Unreadable keyboard file"),
            }
        }

        tracing::info!(platform = %platform, count = files.len(), "Keyboards loaded");
        Self { platform, files }
    }

    /// No files at all
    pub fn generated(platform: Platform) -> Self {
        Self {
            platform,
            files: HashMap::new(),
        }
    }

    fn layout(&self, labels: &[String]) -> Value {
        let labels = labels.iter().map(|l| capitalize(l));
        match self.platform {
            Platform::Vk => json!({
                "one_time": false,
                "buttons": labels
                    .map(|l| json!([{ "action": { "type": "text", "label": l }, "color": "primary" }]))
                    .collect::<Vec<_>>(),
            }),
            Platform::Tg => json!({
                "keyboard": labels.map(|l| json!([{ "text": l }])).collect::<Vec<_>>(),
                "resize_keyboard": true,
            }),
        }
    }
}

fn labels_for(name: &KeyboardName) -> Vec<String> {
    let owned = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect::<Vec<_>>();
    match name {
        KeyboardName::MainMenu => owned(&vocabulary::MAIN_MENU_LABELS),
        KeyboardName::OtherMenu => owned(&vocabulary::OTHER_MENU_LABELS),
        KeyboardName::Courses => owned(&vocabulary::COURSES),
        KeyboardName::Groups(course) => vocabulary::groups(course),
        // Subjects live in the link files; offer a way back instead.
        KeyboardName::Lectures(_) => owned(&[vocabulary::RETURN_MAIN_MENU]),
        KeyboardName::Days => owned(&vocabulary::DAYS),
        KeyboardName::VarNum => vocabulary::VAR_COUNTS.iter().map(|(l, _)| (*l).to_string()).collect(),
    }
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl KeyboardRenderer for FileKeyboards {
    fn render(&self, name: &KeyboardName) -> KeyboardHandle {
        match self.files.get(&name.stem()) {
            Some(value) => KeyboardHandle(value.clone()),
            None => KeyboardHandle(self.layout(&labels_for(name))),
        }
    }
}
