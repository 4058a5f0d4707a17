//! The reply a handler produces for the transport layer

use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

/// Menus the bot can attach to a reply
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyboardName {
    /// Persistent main menu
    MainMenu,
    /// Persistent "other functions" menu
    OtherMenu,
    Courses,
    /// Groups of one course, keyed by course label
    Groups(String),
    /// Subjects of one course, keyed by course label
    Lectures(String),
    Days,
    VarNum,
}

impl KeyboardName {
    /// Stable file stem used by file-backed renderers
    pub fn stem(&self) -> String {
        match self {
            KeyboardName::MainMenu => "start".to_string(),
            KeyboardName::OtherMenu => "other".to_string(),
            KeyboardName::Courses => "courses".to_string(),
            KeyboardName::Groups(course) => format!("groups_{}", course_number(course)),
            KeyboardName::Lectures(course) => format!("lectures_{}", course_number(course)),
            KeyboardName::Days => "days".to_string(),
            KeyboardName::VarNum => "dimensions".to_string(),
        }
    }
}

/// Leading digits of a course label ("2 курс" -> "2")
fn course_number(course: &str) -> &str {
    let end = course
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(course.len(), |(i, _)| i);
    course.get(..end).filter(|n| !n.is_empty()).unwrap_or("0")
}

/// Platform-rendered menu, opaque to the router
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct KeyboardHandle(pub Value);

/// Image produced by a collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// Remote image, sent by URL
    Link(String),
    /// Locally written image file
    File(PathBuf),
}

/// At most one of these is returned per inbound message.
///
/// Photo fields may accompany `text` (text is sent first); `keyboard`
/// only makes sense together with `text`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<KeyboardHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_file: Option<PathBuf>,
    /// Replaces the persistent default menu for future turns
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_keyboard: Option<KeyboardHandle>,
}

impl ResponseAction {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn photo_link(url: impl Into<String>) -> Self {
        Self {
            photo_link: Some(url.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_keyboard(mut self, keyboard: KeyboardHandle) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    #[must_use]
    pub fn with_default_keyboard(mut self, keyboard: KeyboardHandle) -> Self {
        self.default_keyboard = Some(keyboard);
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: ImageRef) -> Self {
        match image {
            ImageRef::Link(url) => self.photo_link = Some(url),
            ImageRef::File(path) => self.photo_file = Some(path),
        }
        self
    }

    /// True when there is nothing for the transport to send
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.photo_link.is_none() && self.photo_file.is_none()
    }
}
