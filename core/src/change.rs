//! The batched change model shared by `file/edit`, `doc/edit` and
//! `inbox/add`.
//!
//! # Design
//! The service distinguishes "field not supplied" from "field supplied with
//! an empty value" (omitting `checked` leaves it alone, `checked: false`
//! unchecks). Every field other than `action` is therefore an `Option` that
//! is skipped on the wire while unset.

use serde::{Deserialize, Serialize};

use crate::error::ChangeError;
use crate::types::{Action, FileType};

/// One mutation instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub action: Action,
    /// Position among siblings; `None` appends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<FileType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
}

/// Where a change is going to be applied. Decides which target id is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeTarget {
    /// A document's outline (`doc/edit`), addressed by node id.
    Document,
    /// The account's file tree (`file/edit`), addressed by file id.
    FileTree,
    /// A new inbox item (`inbox/add`).
    Inbox,
}

impl Change {
    /// A change with only `action` set.
    pub fn new(action: Action) -> Self {
        Self {
            action,
            index: None,
            node_id: None,
            parent_id: None,
            content: None,
            file_type: None,
            file_id: None,
            title: None,
            note: None,
            checked: None,
        }
    }

    pub fn insert_node(parent_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(Action::Insert).parent_id(parent_id).content(content)
    }

    pub fn edit_node(node_id: impl Into<String>) -> Self {
        Self::new(Action::Edit).node_id(node_id)
    }

    pub fn move_node(node_id: impl Into<String>, parent_id: impl Into<String>, index: i64) -> Self {
        Self::new(Action::Move)
            .node_id(node_id)
            .parent_id(parent_id)
            .index(index)
    }

    pub fn delete_node(node_id: impl Into<String>) -> Self {
        Self::new(Action::Delete).node_id(node_id)
    }

    pub fn insert_file(
        parent_id: impl Into<String>,
        file_type: FileType,
        title: impl Into<String>,
    ) -> Self {
        Self::new(Action::Insert)
            .parent_id(parent_id)
            .file_type(file_type)
            .title(title)
    }

    pub fn edit_file(file_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(Action::Edit).file_id(file_id).title(title)
    }

    pub fn move_file(file_id: impl Into<String>, parent_id: impl Into<String>, index: i64) -> Self {
        Self::new(Action::Move)
            .file_id(file_id)
            .parent_id(parent_id)
            .index(index)
    }

    pub fn delete_file(file_id: impl Into<String>) -> Self {
        Self::new(Action::Delete).file_id(file_id)
    }

    /// An item for `inbox/add`. The service files it wherever the account's
    /// inbox points.
    pub fn inbox_item(content: impl Into<String>) -> Self {
        Self::new(Action::Insert).content(content)
    }

    pub fn index(mut self, index: i64) -> Self {
        self.index = Some(index);
        self
    }

    pub fn node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn parent_id(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn file_type(mut self, file_type: FileType) -> Self {
        self.file_type = Some(file_type);
        self
    }

    pub fn file_id(mut self, file_id: impl Into<String>) -> Self {
        self.file_id = Some(file_id.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = Some(checked);
        self
    }

    /// Check that the fields this change carries make sense for `target`.
    ///
    /// Unknown actions skip the per-action field rules. The inbox only takes
    /// inserts.
    pub fn validate(&self, target: ChangeTarget) -> Result<(), ChangeError> {
        match target {
            ChangeTarget::Document => {
                self.forbid(self.file_id.is_some(), "file_id")?;
                match self.action {
                    Action::Insert => {
                        self.require(self.parent_id.is_some(), "parent_id")?;
                        self.require(self.content.is_some(), "content")
                    }
                    Action::Edit => {
                        self.require(self.node_id.is_some(), "node_id")?;
                        if self.content.is_none() && self.note.is_none() && self.checked.is_none() {
                            return Err(ChangeError::NothingToEdit);
                        }
                        Ok(())
                    }
                    Action::Move => {
                        self.require(self.node_id.is_some(), "node_id")?;
                        self.require(self.parent_id.is_some(), "parent_id")?;
                        self.require(self.index.is_some(), "index")
                    }
                    Action::Delete => self.require(self.node_id.is_some(), "node_id"),
                    Action::Unknown(_) => Ok(()),
                }
            }
            ChangeTarget::FileTree => {
                self.forbid(self.node_id.is_some(), "node_id")?;
                match self.action {
                    Action::Insert => {
                        self.require(self.parent_id.is_some(), "parent_id")?;
                        self.require(self.file_type.is_some(), "type")?;
                        self.require(self.title.is_some(), "title")
                    }
                    Action::Edit => {
                        self.require(self.file_id.is_some(), "file_id")?;
                        self.require(self.title.is_some(), "title")
                    }
                    Action::Move => {
                        self.require(self.file_id.is_some(), "file_id")?;
                        self.require(self.parent_id.is_some(), "parent_id")?;
                        self.require(self.index.is_some(), "index")
                    }
                    Action::Delete => self.require(self.file_id.is_some(), "file_id"),
                    Action::Unknown(_) => Ok(()),
                }
            }
            ChangeTarget::Inbox => {
                if !matches!(self.action, Action::Insert | Action::Unknown(_)) {
                    return Err(ChangeError::UnexpectedAction(self.action.clone()));
                }
                self.forbid(self.node_id.is_some(), "node_id")?;
                self.forbid(self.parent_id.is_some(), "parent_id")?;
                self.forbid(self.file_id.is_some(), "file_id")?;
                self.require(self.content.is_some(), "content")
            }
        }
    }

    fn require(&self, present: bool, field: &'static str) -> Result<(), ChangeError> {
        if present {
            Ok(())
        } else {
            Err(ChangeError::MissingField {
                action: self.action.clone(),
                field,
            })
        }
    }

    fn forbid(&self, present: bool, field: &'static str) -> Result<(), ChangeError> {
        if present {
            Err(ChangeError::UnexpectedField { field })
        } else {
            Ok(())
        }
    }
}
