//! Domain DTOs for the Dynalist API.
//!
//! # Design
//! Every type here is a transient value decoded from (or encoded into) a
//! single call. The string enumerations are *open*: the service may add new
//! codes or actions, so an unrecognised value decodes into `Unknown(raw)`
//! instead of failing the whole response.
//!
//! `Response<P>` carries the common `_code` / `_msg` envelope and a payload
//! whose type is fixed by the endpoint that produced it. A `doc/read` caller
//! gets a `Response<Document>` and cannot reach for `files` by mistake.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Declares a string enum that round-trips unknown wire values.
macro_rules! open_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// A value this client does not recognise, kept verbatim.
            Unknown(String),
        }

        impl $name {
            /// The wire representation of this value.
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $wire, )+
                    Self::Unknown(raw) => raw.as_str(),
                }
            }

            pub fn is_known(&self) -> bool {
                !matches!(self, Self::Unknown(_))
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                match raw {
                    $( $wire => Self::$variant, )+
                    other => Self::Unknown(other.to_string()),
                }
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                match Self::from(raw.as_str()) {
                    Self::Unknown(_) => Self::Unknown(raw),
                    known => known,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                String::deserialize(deserializer).map(Self::from)
            }
        }
    };
}

open_enum! {
    /// The kind of mutation a `Change` performs.
    pub enum Action {
        Insert => "insert",
        Edit => "edit",
        Move => "move",
        Delete => "delete",
    }
}

open_enum! {
    /// Whether a file-tree entry is a document or a folder.
    pub enum FileType {
        Document => "document",
        Folder => "folder",
    }
}

open_enum! {
    /// Application-level status carried in every response's `_code`.
    pub enum Code {
        Ok => "Ok",
        /// The request was not valid JSON.
        Invalid => "Invalid",
        /// The caller hit the limit on how many requests it can send.
        TooManyRequests => "TooManyRequests",
        /// The secret token is invalid.
        InvalidToken => "InvalidToken",
        /// The server was unable to handle the request.
        LockFail => "LockFail",
        /// No permission to access this document.
        Unauthorized => "Unauthorized",
        /// The requested document was not found.
        NotFound => "NotFound",
        /// The requested node was not found.
        NodeNotFound => "NodeNotFound",
        /// The inbox location is not configured, or invalid.
        NoInbox => "NoInbox",
    }
}

impl Code {
    pub fn is_ok(&self) -> bool {
        *self == Code::Ok
    }
}

/// Access level on a file, ordered from no access up to owner.
///
/// Stored as the raw integer so levels the service adds later still decode
/// and compare.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Permission(pub i64);

impl Permission {
    pub const NO_ACCESS: Permission = Permission(0);
    pub const READ_ONLY: Permission = Permission(1);
    pub const EDIT_RIGHTS: Permission = Permission(2);
    pub const MANAGE: Permission = Permission(3);
    pub const OWNER: Permission = Permission(4);

    pub fn can_read(self) -> bool {
        self >= Self::READ_ONLY
    }

    pub fn can_edit(self) -> bool {
        self >= Self::EDIT_RIGHTS
    }

    pub fn can_manage(self) -> bool {
        self >= Self::MANAGE
    }

    pub fn is_owner(self) -> bool {
        self >= Self::OWNER
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// An entry in the account's file tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    #[serde(default)]
    pub permission: Permission,
    #[serde(default, skip_serializing_if = "is_false")]
    pub collapsed: bool,
    /// Child file ids in display order. Always empty for documents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
}

impl File {
    pub fn is_folder(&self) -> bool {
        self.file_type == FileType::Folder
    }
}

/// An item inside a document's outline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub checked: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub collapsed: bool,
    /// Back-reference to the parent node; `None` for the document root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
    /// Creation time in milliseconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    /// Last modification time in milliseconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<i64>,
}

/// Payload of `file/list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_file_id: Option<String>,
    #[serde(default)]
    pub files: Vec<File>,
}

impl FileList {
    pub fn get(&self, id: &str) -> Option<&File> {
        self.files.iter().find(|file| file.id == id)
    }

    pub fn root(&self) -> Option<&File> {
        self.root_file_id.as_deref().and_then(|id| self.get(id))
    }

    /// Children of `id` in display order. Dangling child ids are skipped.
    pub fn children_of(&self, id: &str) -> Vec<&File> {
        self.get(id)
            .map(|parent| {
                parent
                    .children
                    .iter()
                    .filter_map(|child| self.get(child))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Payload of `file/edit` and `doc/edit`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditResults {
    /// One entry per submitted change, in submission order.
    #[serde(default)]
    pub results: Vec<bool>,
    /// Ids of the nodes created by `insert` changes (`doc/edit` only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_node_ids: Vec<String>,
}

impl EditResults {
    pub fn all_applied(&self) -> bool {
        self.results.iter().all(|applied| *applied)
    }

    /// Positions of the changes the service rejected.
    pub fn failed(&self) -> impl Iterator<Item = usize> + '_ {
        self.results
            .iter()
            .enumerate()
            .filter(|(_, applied)| !**applied)
            .map(|(index, _)| index)
    }
}

/// Payload of `doc/read`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl Document {
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Nodes without a parent, in the order the service listed them.
    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| node.parent.is_none())
    }

    /// Children of `id` in outline order. Dangling child ids are skipped.
    pub fn children_of(&self, id: &str) -> Vec<&Node> {
        self.get(id)
            .map(|parent| {
                parent
                    .children
                    .iter()
                    .filter_map(|child| self.get(child))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Payload of `inbox/add`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
}

/// The envelope every endpoint answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response<P> {
    #[serde(rename = "_code")]
    pub code: Code,
    #[serde(rename = "_msg", default)]
    pub message: String,
    #[serde(flatten)]
    pub payload: P,
}

impl<P> Response<P> {
    pub fn is_ok(&self) -> bool {
        self.code.is_ok()
    }
}

pub type FileListResponse = Response<FileList>;
pub type EditResponse = Response<EditResults>;
pub type DocumentResponse = Response<Document>;
pub type InboxResponse = Response<InboxItem>;
