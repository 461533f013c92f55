use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info};

use crate::config::Settings;
use crate::detail_editor::DetailEditor;
use crate::error::MenuError;
use crate::store::{Command, Store, StoreMsg};
use crate::theme::Theme;
use crate::tree_view::{TreeAction, TreeView};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pane {
    Tree,
    Detail,
}

pub struct App {
    pub store: Store,
    pub tree: TreeView,
    pub detail: DetailEditor,
    pub focus: Pane,
    pub should_quit: bool,
    pub status_message: Option<String>,
    pub title: String,
    pub theme: Theme,
    pub base_url: String,
}

impl App {
    pub fn new(store: Store, settings: &Settings) -> Self {
        Self {
            store,
            tree: TreeView::new(),
            detail: DetailEditor::new(),
            focus: Pane::Tree,
            should_quit: false,
            status_message: None,
            title: settings.title.clone(),
            theme: Theme::resolve(&settings.theme),
            base_url: settings.base_url.clone(),
        }
    }

    /// Initial loads for both panes. They are independent requests.
    pub fn start(&self) {
        self.store.dispatch(vec![Command::fetch_all_menus()]);
        self.store.dispatch(vec![Command::FetchDropdownItems]);
    }

    pub fn set_status(&mut self, message: Option<String>) {
        self.status_message = message;
    }

    pub fn status_text(&self) -> String {
        let state = self.store.state();
        let mut text = format!(
            "{} | Menus: {} | Theme: {}",
            self.base_url,
            state.menus.len(),
            self.theme.name
        );
        if let Some(msg) = &self.status_message {
            text.push_str(" | ");
            text.push_str(msg);
        }
        text
    }

    fn focused_captures_text(&self) -> bool {
        match self.focus {
            Pane::Tree => self.tree.captures_text(),
            Pane::Detail => self.detail.captures_text(),
        }
    }

    fn switch_focus(&mut self) {
        self.focus = match self.focus {
            Pane::Tree => {
                self.tree.blur();
                Pane::Detail
            }
            Pane::Detail => {
                self.detail.blur();
                Pane::Tree
            }
        };
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                self.switch_focus();
                return;
            }
            KeyCode::Char('q') if !self.focused_captures_text() => {
                self.should_quit = true;
                return;
            }
            _ => {}
        }
        self.set_status(None);

        match self.focus {
            Pane::Tree => {
                let state = self.store.state();
                let action = self.tree.on_key(key, &state.menus, &state.dropdown_items);
                self.run_tree_action(action);
            }
            Pane::Detail => {
                let candidates = &self.store.state().dropdown_items;
                if let Some(commands) = self.detail.on_key(key, candidates) {
                    self.dispatch(commands);
                }
            }
        }
    }

    fn dispatch(&mut self, commands: Vec<Command>) {
        if commands.contains(&Command::fetch_all_menus()) {
            self.tree.show_all_roots();
        }
        self.store.dispatch(commands);
    }

    fn run_tree_action(&mut self, action: TreeAction) {
        match action {
            TreeAction::None => {}
            TreeAction::ShowDetails(id) => {
                debug!(%id, "showing details");
                self.store.dispatch(vec![Command::FetchMenuDetails(id)]);
            }
            TreeAction::Create(menu) => match self.store.dispatch_add(menu) {
                Ok(()) => self.tree.show_all_roots(),
                Err(MenuError::Validation(message)) => self.set_status(Some(message)),
                Err(err) => self.set_status(Some(err.to_string())),
            },
            TreeAction::SelectRoot(id) => {
                info!(%id, "viewing subtree");
                self.store.dispatch(vec![Command::FetchMenus { root: Some(id) }]);
            }
            TreeAction::Refresh => self.dispatch(vec![Command::fetch_all_menus()]),
        }
    }

    /// Applies one dispatcher message and lets the panes react to it.
    pub fn handle_store_msg(&mut self, msg: StoreMsg) {
        let selection_reset = msg == StoreMsg::ResetSelectedMenu;
        self.store.apply(msg);
        if selection_reset {
            self.detail.reset_draft();
        }
        let state = self.store.state();
        if self.detail.observe(state) {
            self.store.dispatch(vec![Command::FetchDropdownItems]);
        }
        let rows = self.tree.visible_rows(&state.menus).len();
        self.tree.clamp_cursor(rows);
    }
}
