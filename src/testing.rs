//! In-memory backend used by the store and app tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{MenuError, MenuResult};
use crate::model::{DropdownCandidate, MenuNode, MenuOp, MenuUpdate, NewMenu};
use crate::repository::MenuRepository;

#[derive(Default)]
struct Backend {
    /// Flat records; `children` is always empty here and rebuilt on read.
    nodes: Vec<MenuNode>,
    next_id: u32,
    failing: HashSet<MenuOp>,
    calls: Vec<MenuOp>,
}

impl Backend {
    fn record(&mut self, op: MenuOp) -> MenuResult<()> {
        self.calls.push(op);
        if self.failing.contains(&op) {
            return Err(MenuError::fetch(op.failure_message(), "injected failure"));
        }
        Ok(())
    }

    fn node(&self, id: &str) -> Option<&MenuNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    fn depth_of(&self, parent_id: Option<&str>) -> u32 {
        parent_id
            .and_then(|id| self.node(id))
            .map(|parent| parent.depth + 1)
            .unwrap_or(0)
    }

    fn subtree(&self, node: &MenuNode) -> MenuNode {
        let mut built = node.clone();
        built.children = self
            .nodes
            .iter()
            .filter(|child| child.parent_id.as_deref() == Some(node.id.as_str()))
            .map(|child| self.subtree(child))
            .collect();
        built
    }

    fn not_found(op: MenuOp, id: &str) -> MenuError {
        MenuError::fetch(op.failure_message(), format!("HTTP 404 Not Found: {id}"))
    }
}

pub(crate) struct FakeRepository {
    backend: Mutex<Backend>,
}

impl FakeRepository {
    pub(crate) fn new() -> Self {
        Self {
            backend: Mutex::new(Backend {
                next_id: 1,
                ..Default::default()
            }),
        }
    }

    /// Inserts a node directly, bypassing call recording.
    pub(crate) fn seed(&self, name: &str, parent_id: Option<&str>) -> String {
        let mut backend = self.backend.lock().unwrap();
        let id = backend.next_id.to_string();
        backend.next_id += 1;
        let depth = backend.depth_of(parent_id);
        let parent_name = parent_id
            .and_then(|pid| backend.node(pid))
            .map(|parent| parent.name.clone());
        backend.nodes.push(MenuNode {
            id: id.clone(),
            name: name.to_string(),
            depth,
            parent_id: parent_id.map(str::to_string),
            parent_name,
            ..Default::default()
        });
        id
    }

    pub(crate) fn fail(&self, op: MenuOp) {
        self.backend.lock().unwrap().failing.insert(op);
    }

    pub(crate) fn calls(&self) -> Vec<MenuOp> {
        self.backend.lock().unwrap().calls.clone()
    }

    pub(crate) fn names(&self) -> Vec<String> {
        let backend = self.backend.lock().unwrap();
        backend.nodes.iter().map(|node| node.name.clone()).collect()
    }
}

#[async_trait]
impl MenuRepository for FakeRepository {
    async fn list_menus(&self, root: Option<&str>) -> MenuResult<Vec<MenuNode>> {
        let mut backend = self.backend.lock().unwrap();
        backend.record(MenuOp::FetchMenus)?;
        let tops: Vec<&MenuNode> = match root {
            Some(id) => backend.nodes.iter().filter(|node| node.id == id).collect(),
            None => backend.nodes.iter().filter(|node| node.is_root()).collect(),
        };
        Ok(tops.into_iter().map(|node| backend.subtree(node)).collect())
    }

    async fn get_menu(&self, id: &str) -> MenuResult<MenuNode> {
        let mut backend = self.backend.lock().unwrap();
        backend.record(MenuOp::FetchMenuDetails)?;
        let node = backend
            .node(id)
            .ok_or_else(|| Backend::not_found(MenuOp::FetchMenuDetails, id))?;
        let mut detail = backend.subtree(node);
        detail.parent = node
            .parent_id
            .as_deref()
            .and_then(|pid| backend.node(pid))
            .map(|parent| Box::new(parent.clone()));
        Ok(detail)
    }

    async fn create_menu(&self, menu: &NewMenu) -> MenuResult<MenuNode> {
        self.backend.lock().unwrap().record(MenuOp::AddMenu)?;
        let id = self.seed(&menu.name, menu.parent_id.as_deref());
        let backend = self.backend.lock().unwrap();
        backend
            .node(&id)
            .cloned()
            .ok_or_else(|| Backend::not_found(MenuOp::AddMenu, &id))
    }

    async fn update_menu(&self, update: &MenuUpdate) -> MenuResult<MenuNode> {
        let mut backend = self.backend.lock().unwrap();
        backend.record(MenuOp::UpdateMenu)?;
        let depth = backend.depth_of(update.parent_id.as_deref());
        let parent_name = update
            .parent_id
            .as_deref()
            .and_then(|pid| backend.node(pid))
            .map(|parent| parent.name.clone());
        let node = backend
            .nodes
            .iter_mut()
            .find(|node| node.id == update.id)
            .ok_or_else(|| Backend::not_found(MenuOp::UpdateMenu, &update.id))?;
        node.name = update.name.clone();
        node.parent_id = update.parent_id.clone();
        node.parent_name = parent_name;
        node.depth = depth;
        Ok(node.clone())
    }

    async fn delete_menu(&self, id: &str) -> MenuResult<String> {
        let mut backend = self.backend.lock().unwrap();
        backend.record(MenuOp::DeleteMenu)?;
        let before = backend.nodes.len();
        backend.nodes.retain(|node| node.id != id);
        if backend.nodes.len() == before {
            return Err(Backend::not_found(MenuOp::DeleteMenu, id));
        }
        Ok(id.to_string())
    }

    async fn list_dropdown_candidates(&self) -> MenuResult<Vec<DropdownCandidate>> {
        let mut backend = self.backend.lock().unwrap();
        backend.record(MenuOp::FetchDropdownItems)?;
        Ok(backend
            .nodes
            .iter()
            .map(|node| DropdownCandidate {
                id: node.id.clone(),
                name: node.name.clone(),
                depth: node.depth,
            })
            .collect())
    }
}
