use std::{collections::HashMap, sync::Arc};

use axum::{extract::State, routing::post, Json, Router};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;
use uuid::Uuid;

pub const TEST_TOKEN: &str = "test-token";
pub const ROOT_FILE_ID: &str = "root";
pub const ROOT_NODE_ID: &str = "root";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct File {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub permission: i64,
    #[serde(default)]
    pub collapsed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
}

/// A change as the service receives it. Every field is optional so that a
/// partially filled change reports `false` instead of rejecting the batch.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub action: String,
    pub index: Option<i64>,
    pub node_id: Option<String>,
    pub parent_id: Option<String>,
    pub content: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub file_id: Option<String>,
    pub title: Option<String>,
    pub note: Option<String>,
    pub checked: Option<bool>,
}

/// Everything the fake service knows about one account.
#[derive(Clone, Debug)]
pub struct Account {
    pub token: String,
    pub files: HashMap<String, File>,
    /// Outline of each document, keyed by file id.
    pub documents: HashMap<String, HashMap<String, Node>>,
    /// Document and parent node that `inbox/add` appends to.
    pub inbox: Option<(String, String)>,
}

impl Account {
    /// An account with an inbox document and a project folder:
    ///
    /// ```text
    /// root/            (folder)
    ///   inbox          (document, empty)
    ///   projects/      (folder)
    ///     plan         (document: "Draft outline", "Review" [checked])
    /// ```
    pub fn seeded() -> Self {
        let mut account = Self {
            token: TEST_TOKEN.to_string(),
            files: HashMap::new(),
            documents: HashMap::new(),
            inbox: Some(("inbox".to_string(), ROOT_NODE_ID.to_string())),
        };
        account.add_file(folder(ROOT_FILE_ID, "My files", &["inbox", "projects"]));
        account.add_file(document("inbox", "Inbox"));
        account.add_file(folder("projects", "Projects", &["plan"]));
        account.add_file(document("plan", "Plan"));

        let Some(plan) = account.documents.get_mut("plan") else {
            return account;
        };
        for (id, content, checked) in [("n1", "Draft outline", false), ("n2", "Review", true)] {
            plan.insert(
                id.to_string(),
                Node {
                    id: id.to_string(),
                    content: content.to_string(),
                    note: String::new(),
                    checked,
                    parent: Some(ROOT_NODE_ID.to_string()),
                    children: Vec::new(),
                },
            );
            if let Some(root) = plan.get_mut(ROOT_NODE_ID) {
                root.children.push(id.to_string());
            }
        }
        account
    }

    fn add_file(&mut self, file: File) {
        if file.kind == "document" {
            self.documents.insert(file.id.clone(), empty_outline());
        }
        self.files.insert(file.id.clone(), file);
    }

    /// Files in depth-first display order, starting at the root folder.
    fn listing(&self) -> Vec<File> {
        let mut out = Vec::new();
        let mut stack = vec![ROOT_FILE_ID.to_string()];
        while let Some(id) = stack.pop() {
            if let Some(file) = self.files.get(&id) {
                stack.extend(file.children.iter().rev().cloned());
                out.push(file.clone());
            }
        }
        out
    }

    fn file_parent(&self, id: &str) -> Option<String> {
        self.files
            .values()
            .find(|f| f.children.iter().any(|c| c == id))
            .map(|f| f.id.clone())
    }

    fn is_folder(&self, id: &str) -> bool {
        self.files.get(id).is_some_and(|f| f.kind == "folder")
    }

    fn apply_file_change(&mut self, change: &Change) -> bool {
        match change.action.as_str() {
            "insert" => {
                let (Some(parent_id), Some(kind), Some(title)) =
                    (&change.parent_id, &change.kind, &change.title)
                else {
                    return false;
                };
                if !self.is_folder(parent_id) || (kind != "document" && kind != "folder") {
                    return false;
                }
                let id = new_id();
                let file = if kind == "folder" {
                    folder(&id, title, &[])
                } else {
                    document(&id, title)
                };
                self.add_file(file);
                if let Some(parent) = self.files.get_mut(parent_id) {
                    place(&mut parent.children, id, change.index);
                }
                true
            }
            "edit" => {
                let Some(file) = change.file_id.as_ref().and_then(|id| self.files.get_mut(id))
                else {
                    return false;
                };
                if let Some(title) = &change.title {
                    file.title = title.clone();
                }
                true
            }
            "move" => {
                let (Some(id), Some(parent_id)) = (&change.file_id, &change.parent_id) else {
                    return false;
                };
                if id == ROOT_FILE_ID
                    || !self.files.contains_key(id)
                    || !self.is_folder(parent_id)
                    || self.file_descends_from(parent_id, id)
                {
                    return false;
                }
                if let Some(old) = self.file_parent(id) {
                    if let Some(old) = self.files.get_mut(&old) {
                        old.children.retain(|c| c != id);
                    }
                }
                if let Some(parent) = self.files.get_mut(parent_id) {
                    place(&mut parent.children, id.clone(), change.index);
                }
                true
            }
            "delete" => {
                let Some(id) = &change.file_id else {
                    return false;
                };
                if id == ROOT_FILE_ID || !self.files.contains_key(id) {
                    return false;
                }
                if let Some(parent) = self.file_parent(id) {
                    if let Some(parent) = self.files.get_mut(&parent) {
                        parent.children.retain(|c| c != id);
                    }
                }
                let mut stack = vec![id.clone()];
                while let Some(id) = stack.pop() {
                    if let Some(file) = self.files.remove(&id) {
                        stack.extend(file.children);
                    }
                    self.documents.remove(&id);
                }
                true
            }
            _ => false,
        }
    }

    /// Whether `id` is `ancestor` or lives somewhere below it.
    fn file_descends_from(&self, id: &str, ancestor: &str) -> bool {
        let mut current = Some(id.to_string());
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.file_parent(&id);
        }
        false
    }
}

fn folder(id: &str, title: &str, children: &[&str]) -> File {
    File {
        id: id.to_string(),
        title: title.to_string(),
        kind: "folder".to_string(),
        permission: 4,
        collapsed: false,
        children: children.iter().map(|c| c.to_string()).collect(),
    }
}

fn document(id: &str, title: &str) -> File {
    File {
        id: id.to_string(),
        title: title.to_string(),
        kind: "document".to_string(),
        permission: 4,
        collapsed: false,
        children: Vec::new(),
    }
}

fn empty_outline() -> HashMap<String, Node> {
    let root = Node {
        id: ROOT_NODE_ID.to_string(),
        content: String::new(),
        note: String::new(),
        checked: false,
        parent: None,
        children: Vec::new(),
    };
    HashMap::from([(root.id.clone(), root)])
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Insert `id` at `index`; a missing, negative or out-of-range index appends.
/// Returns the position used.
fn place(children: &mut Vec<String>, id: String, index: Option<i64>) -> usize {
    let at = match index {
        Some(i) if i >= 0 && (i as usize) <= children.len() => i as usize,
        _ => children.len(),
    };
    children.insert(at, id);
    at
}

/// Outline nodes in depth-first order from the document root.
fn outline(nodes: &HashMap<String, Node>) -> Vec<Node> {
    let mut out = Vec::new();
    let mut stack = vec![ROOT_NODE_ID.to_string()];
    while let Some(id) = stack.pop() {
        if let Some(node) = nodes.get(&id) {
            stack.extend(node.children.iter().rev().cloned());
            out.push(node.clone());
        }
    }
    out
}

fn node_descends_from(nodes: &HashMap<String, Node>, id: &str, ancestor: &str) -> bool {
    let mut current = Some(id.to_string());
    while let Some(id) = current {
        if id == ancestor {
            return true;
        }
        current = nodes.get(&id).and_then(|n| n.parent.clone());
    }
    false
}

fn insert_node(
    nodes: &mut HashMap<String, Node>,
    parent_id: &str,
    change: &Change,
) -> Option<(String, usize)> {
    let id = new_id();
    let parent = nodes.get_mut(parent_id)?;
    let at = place(&mut parent.children, id.clone(), change.index);
    nodes.insert(
        id.clone(),
        Node {
            id: id.clone(),
            content: change.content.clone().unwrap_or_default(),
            note: change.note.clone().unwrap_or_default(),
            checked: change.checked.unwrap_or(false),
            parent: Some(parent_id.to_string()),
            children: Vec::new(),
        },
    );
    Some((id, at))
}

/// Apply one `doc/edit` change. Returns whether it applied and, for
/// inserts, the new node's id.
fn apply_node_change(nodes: &mut HashMap<String, Node>, change: &Change) -> (bool, Option<String>) {
    match change.action.as_str() {
        "insert" => match &change.parent_id {
            Some(parent_id) => match insert_node(nodes, parent_id, change) {
                Some((id, _)) => (true, Some(id)),
                None => (false, None),
            },
            None => (false, None),
        },
        "edit" => {
            let Some(node) = change.node_id.as_ref().and_then(|id| nodes.get_mut(id)) else {
                return (false, None);
            };
            if let Some(content) = &change.content {
                node.content = content.clone();
            }
            if let Some(note) = &change.note {
                node.note = note.clone();
            }
            if let Some(checked) = change.checked {
                node.checked = checked;
            }
            (true, None)
        }
        "move" => {
            let (Some(id), Some(parent_id)) = (&change.node_id, &change.parent_id) else {
                return (false, None);
            };
            if id == ROOT_NODE_ID
                || !nodes.contains_key(id)
                || !nodes.contains_key(parent_id)
                || node_descends_from(nodes, parent_id, id)
            {
                return (false, None);
            }
            if let Some(old) = nodes.get(id).and_then(|n| n.parent.clone()) {
                if let Some(old) = nodes.get_mut(&old) {
                    old.children.retain(|c| c != id);
                }
            }
            if let Some(parent) = nodes.get_mut(parent_id) {
                place(&mut parent.children, id.clone(), change.index);
            }
            if let Some(node) = nodes.get_mut(id) {
                node.parent = Some(parent_id.clone());
            }
            (true, None)
        }
        "delete" => {
            let Some(id) = &change.node_id else {
                return (false, None);
            };
            if id == ROOT_NODE_ID {
                return (false, None);
            }
            let Some(node) = nodes.remove(id) else {
                return (false, None);
            };
            if let Some(parent) = node.parent.as_ref().and_then(|p| nodes.get_mut(p)) {
                parent.children.retain(|c| c != id);
            }
            let mut stack = node.children;
            while let Some(id) = stack.pop() {
                if let Some(child) = nodes.remove(&id) {
                    stack.extend(child.children);
                }
            }
            (true, None)
        }
        _ => (false, None),
    }
}

#[derive(Deserialize)]
struct Auth {
    token: String,
}

#[derive(Deserialize)]
struct FileEditRequest {
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Deserialize)]
struct DocReadRequest {
    file_id: String,
}

#[derive(Deserialize)]
struct DocEditRequest {
    file_id: String,
    #[serde(default)]
    changes: Vec<Change>,
}

pub type Db = Arc<RwLock<Account>>;

pub fn app() -> Router {
    app_with(Account::seeded())
}

pub fn app_with(account: Account) -> Router {
    let db: Db = Arc::new(RwLock::new(account));
    Router::new()
        .route("/file/list", post(file_list))
        .route("/file/edit", post(file_edit))
        .route("/doc/read", post(doc_read))
        .route("/doc/edit", post(doc_edit))
        .route("/inbox/add", post(inbox_add))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, app()).await
}

/// Serve a prepared router, e.g. one built by [`app_with`].
pub async fn serve(listener: TcpListener, router: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, router).await
}

type Reply = Result<Json<Value>, Json<Value>>;

fn ok(payload: Value) -> Json<Value> {
    let mut body = json!({ "_code": "Ok", "_msg": "" });
    if let (Some(body), Value::Object(payload)) = (body.as_object_mut(), payload) {
        body.extend(payload);
    }
    Json(body)
}

fn failure(code: &str, msg: &str) -> Json<Value> {
    Json(json!({ "_code": code, "_msg": msg }))
}

/// Check the token, then decode the endpoint-specific fields.
fn authorize<T: DeserializeOwned>(account: &Account, body: &str) -> Result<T, Json<Value>> {
    let auth: Auth =
        serde_json::from_str(body).map_err(|e| failure("Invalid", &e.to_string()))?;
    if auth.token != account.token {
        return Err(failure("InvalidToken", "Your secret token is invalid."));
    }
    serde_json::from_str(body).map_err(|e| failure("Invalid", &e.to_string()))
}

async fn file_list(State(db): State<Db>, body: String) -> Reply {
    let account = db.read().await;
    let _: Auth = authorize(&account, &body)?;
    info!(files = account.files.len(), "file/list");
    Ok(ok(json!({
        "root_file_id": ROOT_FILE_ID,
        "files": account.listing(),
    })))
}

async fn file_edit(State(db): State<Db>, body: String) -> Reply {
    let mut account = db.write().await;
    let req: FileEditRequest = authorize(&account, &body)?;
    let results: Vec<bool> = req
        .changes
        .iter()
        .map(|change| account.apply_file_change(change))
        .collect();
    info!(changes = results.len(), "file/edit");
    Ok(ok(json!({ "results": results })))
}

async fn doc_read(State(db): State<Db>, body: String) -> Reply {
    let account = db.read().await;
    let req: DocReadRequest = authorize(&account, &body)?;
    let (Some(file), Some(nodes)) = (
        account.files.get(&req.file_id),
        account.documents.get(&req.file_id),
    ) else {
        return Err(failure("NotFound", "The document you're requesting is not found."));
    };
    info!(file_id = %req.file_id, "doc/read");
    Ok(ok(json!({
        "file_id": file.id,
        "title": file.title,
        "nodes": outline(nodes),
    })))
}

async fn doc_edit(State(db): State<Db>, body: String) -> Reply {
    let mut account = db.write().await;
    let req: DocEditRequest = authorize(&account, &body)?;
    let Some(nodes) = account.documents.get_mut(&req.file_id) else {
        return Err(failure("NotFound", "The document you're requesting is not found."));
    };
    let mut results = Vec::with_capacity(req.changes.len());
    let mut new_node_ids = Vec::new();
    for change in &req.changes {
        let (applied, created) = apply_node_change(nodes, change);
        results.push(applied);
        new_node_ids.extend(created);
    }
    info!(file_id = %req.file_id, changes = results.len(), "doc/edit");
    Ok(ok(json!({ "results": results, "new_node_ids": new_node_ids })))
}

async fn inbox_add(State(db): State<Db>, body: String) -> Reply {
    let mut account = db.write().await;
    let change: Change = authorize(&account, &body)?;
    let Some((file_id, parent_id)) = account.inbox.clone() else {
        return Err(failure("NoInbox", "Inbox location is not configured, or invalid."));
    };
    let Some(nodes) = account.documents.get_mut(&file_id) else {
        return Err(failure("NoInbox", "Inbox location is not configured, or invalid."));
    };
    let Some((node_id, index)) = insert_node(nodes, &parent_id, &change) else {
        return Err(failure(
            "NodeNotFound",
            "The node (item) you're requesting is not found.",
        ));
    };
    info!(file_id = %file_id, node_id = %node_id, "inbox/add");
    Ok(ok(json!({ "file_id": file_id, "node_id": node_id, "index": index })))
}
