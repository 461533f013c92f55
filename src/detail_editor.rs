use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::model::{DropdownCandidate, MenuNode, MenuUpdate};
use crate::store::{Command, MenuState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetailField {
    Parent,
    Name,
    Save,
    Delete,
}

impl DetailField {
    fn next(self) -> Self {
        match self {
            DetailField::Parent => DetailField::Name,
            DetailField::Name => DetailField::Save,
            DetailField::Save => DetailField::Delete,
            DetailField::Delete => DetailField::Parent,
        }
    }

    fn previous(self) -> Self {
        match self {
            DetailField::Parent => DetailField::Delete,
            DetailField::Name => DetailField::Parent,
            DetailField::Save => DetailField::Name,
            DetailField::Delete => DetailField::Save,
        }
    }
}

/// Editing form for the selected node.
///
/// The draft is local until saved; choosing a parent only rewrites the
/// draft's parent and depth fields.
#[derive(Debug)]
pub struct DetailEditor {
    pub draft: MenuNode,
    field: DetailField,
    parent_picker: Option<usize>,
    seen_revision: u64,
}

impl Default for DetailEditor {
    fn default() -> Self {
        Self {
            draft: MenuNode::default(),
            field: DetailField::Name,
            parent_picker: None,
            seen_revision: 0,
        }
    }
}

impl DetailEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&self) -> DetailField {
        self.field
    }

    pub fn parent_picker(&self) -> Option<usize> {
        self.parent_picker
    }

    /// Syncs the draft with the store after a transition.
    ///
    /// Returns true when the selection was written since the last call, in
    /// which case the caller refreshes the parent candidates. A cleared
    /// selection leaves the draft alone.
    pub fn observe(&mut self, state: &MenuState) -> bool {
        if state.selected_revision == self.seen_revision {
            return false;
        }
        self.seen_revision = state.selected_revision;
        if let Some(selected) = &state.selected_menu {
            self.draft = selected.clone();
        }
        true
    }

    pub fn select_parent(&mut self, candidate: &DropdownCandidate) {
        self.draft.parent_id = Some(candidate.id.clone());
        self.draft.parent_name = Some(candidate.name.clone());
        self.draft.depth = candidate.depth;
    }

    /// Update then refetch; nothing when no node is loaded.
    pub fn save(&self) -> Option<Vec<Command>> {
        if self.draft.id.is_empty() {
            return None;
        }
        Some(vec![
            Command::UpdateMenu(MenuUpdate::from(&self.draft)),
            Command::fetch_all_menus(),
        ])
    }

    /// Delete, clear the selection, refetch. The caller resets the draft
    /// once the selection reset arrives.
    pub fn delete(&self) -> Option<Vec<Command>> {
        if self.draft.id.is_empty() {
            return None;
        }
        Some(vec![
            Command::DeleteMenu(self.draft.id.clone()),
            Command::ResetSelectedMenu,
            Command::fetch_all_menus(),
        ])
    }

    pub fn reset_draft(&mut self) {
        self.draft = MenuNode::default();
    }

    pub fn captures_text(&self) -> bool {
        self.field == DetailField::Name && self.parent_picker.is_none()
    }

    pub fn blur(&mut self) {
        self.parent_picker = None;
    }

    pub fn on_key(&mut self, key: KeyEvent, candidates: &[DropdownCandidate]) -> Option<Vec<Command>> {
        if let Some(index) = self.parent_picker {
            self.on_picker_key(key, index, candidates);
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('s') => self.save(),
                KeyCode::Char('d') => self.delete(),
                _ => None,
            };
        }
        match key.code {
            KeyCode::Up => {
                self.field = self.field.previous();
                None
            }
            KeyCode::Down => {
                self.field = self.field.next();
                None
            }
            KeyCode::Enter => match self.field {
                DetailField::Parent => {
                    self.parent_picker = Some(0);
                    None
                }
                DetailField::Name => {
                    self.field = DetailField::Save;
                    None
                }
                DetailField::Save => self.save(),
                DetailField::Delete => self.delete(),
            },
            KeyCode::Backspace if self.field == DetailField::Name => {
                self.draft.name.pop();
                None
            }
            KeyCode::Delete if self.field == DetailField::Name => {
                self.draft.name.clear();
                None
            }
            KeyCode::Char(c) if self.field == DetailField::Name => {
                self.draft.name.push(c);
                None
            }
            _ => None,
        }
    }

    fn on_picker_key(&mut self, key: KeyEvent, index: usize, candidates: &[DropdownCandidate]) {
        match key.code {
            KeyCode::Esc => self.parent_picker = None,
            KeyCode::Up | KeyCode::Char('k') => self.parent_picker = Some(index.saturating_sub(1)),
            KeyCode::Down | KeyCode::Char('j') => {
                let last = candidates.len().saturating_sub(1);
                self.parent_picker = Some((index + 1).min(last));
            }
            KeyCode::Enter => {
                if let Some(candidate) = candidates.get(index) {
                    self.select_parent(candidate);
                }
                self.parent_picker = None;
            }
            _ => {}
        }
    }
}
