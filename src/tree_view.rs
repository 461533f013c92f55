use std::collections::HashMap;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::{DropdownCandidate, MenuNode, NewMenu};

#[derive(Clone, Copy, Debug)]
pub struct TreeRow<'a> {
    pub node: &'a MenuNode,
    pub depth: usize,
    pub expanded: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeAction {
    None,
    ShowDetails(String),
    Create(NewMenu),
    SelectRoot(String),
    Refresh,
}

/// Pre-order; `visit` returns whether to descend.
pub fn walk_depth_first<'a, F>(nodes: &'a [MenuNode], depth: usize, visit: &mut F)
where
    F: FnMut(&'a MenuNode, usize) -> bool,
{
    for node in nodes {
        if visit(node, depth) {
            walk_depth_first(&node.children, depth + 1, visit);
        }
    }
}

#[derive(Debug, Default)]
pub struct TreeView {
    /// Absent ids are collapsed.
    pub expanded_items: HashMap<String, bool>,
    pub is_adding_new: bool,
    pub new_menu_name: String,
    /// Parent for the pending child; empty means a new root.
    pub parent_id: String,
    cursor: usize,
    root_picker: Option<usize>,
    viewing_root: Option<String>,
}

impl TreeView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded_items.get(id).copied().unwrap_or(false)
    }

    pub fn toggle(&mut self, id: &str) {
        let next = !self.is_expanded(id);
        self.expanded_items.insert(id.to_string(), next);
    }

    /// Replaces the map with every node of `menus` marked expanded.
    pub fn expand_all(&mut self, menus: &[MenuNode]) {
        let mut all = HashMap::new();
        walk_depth_first(menus, 0, &mut |node, _| {
            all.insert(node.id.clone(), true);
            true
        });
        self.expanded_items = all;
    }

    pub fn collapse_all(&mut self) {
        self.expanded_items.clear();
    }

    pub fn visible_rows<'a>(&self, menus: &'a [MenuNode]) -> Vec<TreeRow<'a>> {
        let mut rows = Vec::new();
        walk_depth_first(menus, 0, &mut |node, depth| {
            let expanded = self.is_expanded(&node.id);
            rows.push(TreeRow {
                node,
                depth,
                expanded,
            });
            expanded
        });
        rows
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn root_picker(&self) -> Option<usize> {
        self.root_picker
    }

    pub fn viewing_root(&self) -> Option<&str> {
        self.viewing_root.as_deref()
    }

    /// The full tree was requested again; forget the chosen subtree.
    pub fn show_all_roots(&mut self) {
        self.viewing_root = None;
    }

    pub fn clamp_cursor(&mut self, len: usize) {
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    pub fn begin_add(&mut self, parent_id: &str) {
        self.parent_id = parent_id.to_string();
        self.new_menu_name.clear();
        self.is_adding_new = true;
    }

    /// `None` and no change while the trimmed name is empty.
    pub fn confirm_add(&mut self) -> Option<NewMenu> {
        if !self.is_adding_new || self.new_menu_name.trim().is_empty() {
            return None;
        }
        let menu = NewMenu::new(self.new_menu_name.clone(), &self.parent_id);
        self.new_menu_name.clear();
        self.is_adding_new = false;
        Some(menu)
    }

    pub fn cancel_add(&mut self) {
        self.new_menu_name.clear();
        self.parent_id.clear();
        self.is_adding_new = false;
    }

    pub fn blur(&mut self) {
        self.is_adding_new = false;
        self.new_menu_name.clear();
        self.root_picker = None;
    }

    pub fn captures_text(&self) -> bool {
        self.is_adding_new
    }

    pub fn on_key(
        &mut self,
        key: KeyEvent,
        menus: &[MenuNode],
        candidates: &[DropdownCandidate],
    ) -> TreeAction {
        if let Some(index) = self.root_picker {
            return self.on_picker_key(key, index, candidates);
        }
        if self.is_adding_new {
            return self.on_entry_key(key);
        }

        let rows = self.visible_rows(menus);
        self.clamp_cursor(rows.len());
        let current = rows.get(self.cursor).map(|row| (row.node.id.clone(), row.node.has_children()));
        let len = rows.len();

        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
                TreeAction::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor + 1 < len {
                    self.cursor += 1;
                }
                TreeAction::None
            }
            KeyCode::Home | KeyCode::Char('g') => {
                self.cursor = 0;
                TreeAction::None
            }
            KeyCode::End | KeyCode::Char('G') => {
                self.cursor = len.saturating_sub(1);
                TreeAction::None
            }
            KeyCode::Char(' ') | KeyCode::Right | KeyCode::Left => {
                if let Some((id, true)) = current {
                    let wants_open = match key.code {
                        KeyCode::Right => Some(true),
                        KeyCode::Left => Some(false),
                        _ => None,
                    };
                    if wants_open.map_or(true, |open| open != self.is_expanded(&id)) {
                        self.toggle(&id);
                    }
                }
                TreeAction::None
            }
            KeyCode::Enter => match current {
                Some((id, _)) => TreeAction::ShowDetails(id),
                None => TreeAction::None,
            },
            KeyCode::Char('e') => {
                self.expand_all(menus);
                TreeAction::None
            }
            KeyCode::Char('c') => {
                self.collapse_all();
                TreeAction::None
            }
            KeyCode::Char('a') => {
                if let Some((id, _)) = current {
                    self.begin_add(&id);
                }
                TreeAction::None
            }
            KeyCode::Char('A') => {
                self.begin_add("");
                TreeAction::None
            }
            KeyCode::Char('m') => {
                self.root_picker = Some(0);
                TreeAction::None
            }
            KeyCode::Char('r') => TreeAction::Refresh,
            _ => TreeAction::None,
        }
    }

    fn on_entry_key(&mut self, key: KeyEvent) -> TreeAction {
        match key.code {
            KeyCode::Enter => match self.confirm_add() {
                Some(menu) => TreeAction::Create(menu),
                None => TreeAction::None,
            },
            KeyCode::Esc => {
                self.cancel_add();
                TreeAction::None
            }
            KeyCode::Backspace => {
                self.new_menu_name.pop();
                TreeAction::None
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.new_menu_name.push(c);
                TreeAction::None
            }
            _ => TreeAction::None,
        }
    }

    fn on_picker_key(
        &mut self,
        key: KeyEvent,
        index: usize,
        candidates: &[DropdownCandidate],
    ) -> TreeAction {
        match key.code {
            KeyCode::Esc | KeyCode::Char('m') => {
                self.root_picker = None;
                TreeAction::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.root_picker = Some(index.saturating_sub(1));
                TreeAction::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let last = candidates.len().saturating_sub(1);
                self.root_picker = Some((index + 1).min(last));
                TreeAction::None
            }
            KeyCode::Enter => {
                self.root_picker = None;
                match candidates.get(index) {
                    Some(candidate) => {
                        self.viewing_root = Some(candidate.name.clone());
                        self.cursor = 0;
                        TreeAction::SelectRoot(candidate.id.clone())
                    }
                    None => TreeAction::None,
                }
            }
            _ => TreeAction::None,
        }
    }
}
