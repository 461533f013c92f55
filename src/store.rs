use std::sync::Arc;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::error::MenuResult;
use crate::model::{validate_menu_name, DropdownCandidate, MenuNode, MenuOp, MenuUpdate, NewMenu};
use crate::repository::MenuRepository;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MenuState {
    pub menus: Vec<MenuNode>,
    pub dropdown_items: Vec<DropdownCandidate>,
    pub loading: bool,
    pub error: Option<String>,
    pub selected_menu: Option<MenuNode>,
    /// Bumped on every write to `selected_menu`, equal values included,
    /// except clearing an already empty selection.
    pub selected_revision: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreMsg {
    Pending(MenuOp),
    MenusFetched(Vec<MenuNode>),
    MenuDetailsFetched(MenuNode),
    MenuUpdated(MenuNode),
    MenuDeleted(String),
    MenuAdded(MenuNode),
    DropdownItemsFetched(Vec<DropdownCandidate>),
    Rejected { op: MenuOp, message: String },
    ResetSelectedMenu,
}

impl MenuState {
    pub fn apply(&mut self, msg: StoreMsg) {
        match msg {
            // Delete leaves a previous error in place.
            StoreMsg::Pending(MenuOp::DeleteMenu) => {
                self.loading = true;
            }
            StoreMsg::Pending(_) => {
                self.loading = true;
                self.error = None;
            }
            StoreMsg::MenusFetched(menus) => {
                self.loading = false;
                self.menus = menus;
            }
            StoreMsg::MenuDetailsFetched(menu) | StoreMsg::MenuUpdated(menu) => {
                self.loading = false;
                self.set_selected(Some(menu));
            }
            StoreMsg::MenuDeleted(_) => {
                self.loading = false;
                self.set_selected(None);
            }
            StoreMsg::MenuAdded(_) => {
                self.loading = false;
            }
            StoreMsg::DropdownItemsFetched(items) => {
                self.loading = false;
                self.dropdown_items = items;
            }
            StoreMsg::Rejected { op, message } => {
                self.loading = false;
                self.error = Some(if message.is_empty() {
                    op.failure_message().to_string()
                } else {
                    message
                });
            }
            StoreMsg::ResetSelectedMenu => {
                self.set_selected(None);
            }
        }
    }

    fn set_selected(&mut self, menu: Option<MenuNode>) {
        if menu.is_none() && self.selected_menu.is_none() {
            return;
        }
        self.selected_menu = menu;
        self.selected_revision += 1;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    FetchMenus { root: Option<String> },
    FetchMenuDetails(String),
    UpdateMenu(MenuUpdate),
    DeleteMenu(String),
    AddMenu(NewMenu),
    FetchDropdownItems,
    ResetSelectedMenu,
}

impl Command {
    pub fn fetch_all_menus() -> Self {
        Command::FetchMenus { root: None }
    }

    fn op(&self) -> Option<MenuOp> {
        match self {
            Command::FetchMenus { .. } => Some(MenuOp::FetchMenus),
            Command::FetchMenuDetails(_) => Some(MenuOp::FetchMenuDetails),
            Command::UpdateMenu(_) => Some(MenuOp::UpdateMenu),
            Command::DeleteMenu(_) => Some(MenuOp::DeleteMenu),
            Command::AddMenu(_) => Some(MenuOp::AddMenu),
            Command::FetchDropdownItems => Some(MenuOp::FetchDropdownItems),
            Command::ResetSelectedMenu => None,
        }
    }
}

async fn execute(repo: &dyn MenuRepository, op: MenuOp, command: Command) -> StoreMsg {
    let result = match command {
        Command::FetchMenus { root } => repo
            .list_menus(root.as_deref())
            .await
            .map(StoreMsg::MenusFetched),
        Command::FetchMenuDetails(id) => repo
            .get_menu(&id)
            .await
            .map(StoreMsg::MenuDetailsFetched),
        Command::UpdateMenu(update) => repo
            .update_menu(&update)
            .await
            .map(StoreMsg::MenuUpdated),
        Command::DeleteMenu(id) => repo.delete_menu(&id).await.map(StoreMsg::MenuDeleted),
        Command::AddMenu(menu) => repo.create_menu(&menu).await.map(StoreMsg::MenuAdded),
        Command::FetchDropdownItems => repo
            .list_dropdown_candidates()
            .await
            .map(StoreMsg::DropdownItemsFetched),
        Command::ResetSelectedMenu => Ok(StoreMsg::ResetSelectedMenu),
    };
    result.unwrap_or_else(|err| {
        debug!(
            operation = op.name(),
            detail = err.detail().unwrap_or_default(),
            "operation rejected"
        );
        StoreMsg::Rejected {
            op,
            message: err.to_string(),
        }
    })
}

pub struct Store {
    state: MenuState,
    repo: Arc<dyn MenuRepository>,
    tx: UnboundedSender<StoreMsg>,
}

impl Store {
    pub fn new(repo: Arc<dyn MenuRepository>) -> (Self, UnboundedReceiver<StoreMsg>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let store = Self {
            state: MenuState::default(),
            repo,
            tx,
        };
        (store, rx)
    }

    pub fn state(&self) -> &MenuState {
        &self.state
    }

    pub fn apply(&mut self, msg: StoreMsg) {
        debug!(?msg, "applying store transition");
        self.state.apply(msg);
    }

    /// Runs `commands` in order on one task; each waits for the previous
    /// outcome, failed or not. Separate dispatches are not ordered.
    pub fn dispatch(&self, commands: Vec<Command>) {
        if commands.is_empty() {
            return;
        }
        let repo = Arc::clone(&self.repo);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            for command in commands {
                let outcome = match command.op() {
                    Some(op) => {
                        info!(operation = op.name(), "dispatching");
                        if tx.send(StoreMsg::Pending(op)).is_err() {
                            return;
                        }
                        execute(repo.as_ref(), op, command).await
                    }
                    None => StoreMsg::ResetSelectedMenu,
                };
                if tx.send(outcome).is_err() {
                    return;
                }
            }
        });
    }

    /// Create then refetch the full tree. Blank names never reach the network.
    pub fn dispatch_add(&self, menu: NewMenu) -> MenuResult<()> {
        validate_menu_name(&menu.name)?;
        self.dispatch(vec![Command::AddMenu(menu), Command::fetch_all_menus()]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MenuError;
    use crate::testing::FakeRepository;
    use pretty_assertions::assert_eq;
    use tokio::sync::mpsc::error::TryRecvError;

    fn node(id: &str, name: &str, parent_id: Option<&str>, children: Vec<MenuNode>) -> MenuNode {
        MenuNode {
            id: id.into(),
            name: name.into(),
            depth: if parent_id.is_some() { 1 } else { 0 },
            parent_id: parent_id.map(str::to_string),
            children,
            ..Default::default()
        }
    }

    /// Applies the next `count` messages from the dispatcher, in order.
    async fn drain(
        store: &mut Store,
        rx: &mut UnboundedReceiver<StoreMsg>,
        count: usize,
    ) -> Vec<StoreMsg> {
        let mut seen = Vec::with_capacity(count);
        for _ in 0..count {
            let msg = rx.recv().await.expect("dispatcher hung up");
            seen.push(msg.clone());
            store.apply(msg);
        }
        seen
    }

    #[test]
    fn pending_sets_loading_and_clears_error() {
        let mut state = MenuState {
            error: Some("Failed to fetch menus".into()),
            ..Default::default()
        };
        state.apply(StoreMsg::Pending(MenuOp::FetchMenus));
        assert!(state.loading);
        assert_eq!(state.error, None);
    }

    #[test]
    fn delete_pending_keeps_previous_error() {
        let mut state = MenuState {
            error: Some("Failed to update menu".into()),
            ..Default::default()
        };
        state.apply(StoreMsg::Pending(MenuOp::DeleteMenu));
        assert!(state.loading);
        assert_eq!(state.error.as_deref(), Some("Failed to update menu"));
    }

    #[test]
    fn rejected_without_message_uses_operation_default() {
        let mut state = MenuState::default();
        state.apply(StoreMsg::Pending(MenuOp::AddMenu));
        state.apply(StoreMsg::Rejected {
            op: MenuOp::AddMenu,
            message: String::new(),
        });
        assert!(!state.loading);
        assert_eq!(state.error.as_deref(), Some("Failed to add menu"));
    }

    #[test]
    fn add_fulfilled_leaves_menus_untouched() {
        let menus = vec![node("1", "Home", None, vec![])];
        let mut state = MenuState {
            menus: menus.clone(),
            ..Default::default()
        };
        state.apply(StoreMsg::Pending(MenuOp::AddMenu));
        state.apply(StoreMsg::MenuAdded(node("9", "New", None, vec![])));
        assert!(!state.loading);
        assert_eq!(state.menus, menus);
    }

    #[test]
    fn delete_fulfilled_clears_selection_even_for_other_id() {
        let mut state = MenuState::default();
        state.apply(StoreMsg::MenuDetailsFetched(node("1", "Home", None, vec![])));
        state.apply(StoreMsg::MenuDeleted("42".into()));
        assert_eq!(state.selected_menu, None);
    }

    #[test]
    fn update_echo_becomes_selected_menu() {
        let echo = node("1", "X", Some("2"), vec![]);
        let mut state = MenuState::default();
        state.apply(StoreMsg::Pending(MenuOp::UpdateMenu));
        state.apply(StoreMsg::MenuUpdated(echo.clone()));
        assert_eq!(state.selected_menu, Some(echo));
        assert!(state.menus.is_empty());
    }

    #[test]
    fn fetch_replaces_menus() {
        let mut state = MenuState::default();
        let payload = vec![
            node("1", "Home", None, vec![]),
            node("2", "Shop", None, vec![node("3", "Deals", Some("2"), vec![])]),
        ];
        state.apply(StoreMsg::Pending(MenuOp::FetchMenus));
        state.apply(StoreMsg::MenusFetched(payload));
        assert_eq!(state.menus.len(), 2);
        assert_eq!(state.menus[1].children[0].name, "Deals");
        assert!(!state.loading);
    }

    #[test]
    fn selection_writes_bump_revision() {
        let mut state = MenuState::default();
        let home = node("1", "Home", None, vec![]);
        state.apply(StoreMsg::MenuDetailsFetched(home.clone()));
        state.apply(StoreMsg::MenuDetailsFetched(home));
        state.apply(StoreMsg::ResetSelectedMenu);
        assert_eq!(state.selected_revision, 3);
    }

    #[test]
    fn clearing_empty_selection_keeps_revision() {
        let mut state = MenuState::default();
        state.apply(StoreMsg::MenuDeleted("1".into()));
        state.apply(StoreMsg::ResetSelectedMenu);
        assert_eq!(state.selected_revision, 0);

        state.apply(StoreMsg::MenuDetailsFetched(node("1", "Home", None, vec![])));
        state.apply(StoreMsg::MenuDeleted("1".into()));
        state.apply(StoreMsg::ResetSelectedMenu);
        assert_eq!(state.selected_revision, 2);
    }

    #[tokio::test]
    async fn add_then_refetch_runs_in_order() {
        let repo = Arc::new(FakeRepository::new());
        let home = repo.seed("Home", None);
        let (mut store, mut rx) = Store::new(repo.clone());
        store.dispatch(vec![Command::fetch_all_menus()]);
        drain(&mut store, &mut rx, 2).await;
        let before = store.state().menus.clone();

        store
            .dispatch_add(NewMenu::new("About", &home))
            .expect("valid name");
        let seen = drain(&mut store, &mut rx, 2).await;
        assert_eq!(seen[0], StoreMsg::Pending(MenuOp::AddMenu));
        assert!(matches!(seen[1], StoreMsg::MenuAdded(_)));
        assert_eq!(store.state().menus, before);

        let seen = drain(&mut store, &mut rx, 2).await;
        assert_eq!(seen[0], StoreMsg::Pending(MenuOp::FetchMenus));
        assert_eq!(store.state().menus[0].children[0].name, "About");
        assert_eq!(
            repo.calls(),
            vec![MenuOp::FetchMenus, MenuOp::AddMenu, MenuOp::FetchMenus]
        );
    }

    #[tokio::test]
    async fn blank_name_is_rejected_before_dispatch() {
        let repo = Arc::new(FakeRepository::new());
        let (store, mut rx) = Store::new(repo.clone());
        let err = store.dispatch_add(NewMenu::new("   ", "")).unwrap_err();
        assert!(matches!(err, MenuError::Validation(_)));
        tokio::task::yield_now().await;
        assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        assert!(repo.calls().is_empty());
    }

    #[tokio::test]
    async fn refetch_still_runs_after_failed_add() {
        let repo = Arc::new(FakeRepository::new());
        repo.fail(MenuOp::AddMenu);
        let (mut store, mut rx) = Store::new(repo.clone());
        store.dispatch_add(NewMenu::new("About", "")).unwrap();
        drain(&mut store, &mut rx, 2).await;
        assert_eq!(store.state().error.as_deref(), Some("Failed to add menu"));

        drain(&mut store, &mut rx, 2).await;
        assert_eq!(store.state().error, None);
        assert_eq!(repo.calls(), vec![MenuOp::AddMenu, MenuOp::FetchMenus]);
    }

    #[tokio::test]
    async fn dropdown_failure_keeps_previous_items() {
        let repo = Arc::new(FakeRepository::new());
        repo.seed("Home", None);
        let (mut store, mut rx) = Store::new(repo.clone());
        store.dispatch(vec![Command::FetchDropdownItems]);
        drain(&mut store, &mut rx, 2).await;
        let previous = store.state().dropdown_items.clone();
        assert_eq!(previous.len(), 1);

        repo.fail(MenuOp::FetchDropdownItems);
        store.dispatch(vec![Command::FetchDropdownItems]);
        drain(&mut store, &mut rx, 2).await;
        assert_eq!(
            store.state().error.as_deref(),
            Some("Failed to fetch dropdown items")
        );
        assert_eq!(store.state().dropdown_items, previous);
        assert!(!store.state().loading);
    }

    #[tokio::test]
    async fn delete_chain_resets_selection_and_refetches() {
        let repo = Arc::new(FakeRepository::new());
        let home = repo.seed("Home", None);
        let shop = repo.seed("Shop", None);
        let (mut store, mut rx) = Store::new(repo.clone());
        store.dispatch(vec![Command::FetchMenuDetails(shop.clone())]);
        drain(&mut store, &mut rx, 2).await;
        assert_eq!(
            store.state().selected_menu.as_ref().map(|m| m.name.as_str()),
            Some("Shop")
        );

        store.dispatch(vec![
            Command::DeleteMenu(home),
            Command::ResetSelectedMenu,
            Command::fetch_all_menus(),
        ]);
        let seen = drain(&mut store, &mut rx, 5).await;
        assert_eq!(seen[2], StoreMsg::ResetSelectedMenu);
        assert_eq!(store.state().selected_menu, None);
        assert_eq!(store.state().menus.len(), 1);
        assert_eq!(repo.names(), vec!["Shop".to_string()]);
    }

    #[tokio::test]
    async fn second_delete_of_same_id_is_an_ordinary_failure() {
        let repo = Arc::new(FakeRepository::new());
        let home = repo.seed("Home", None);
        let (mut store, mut rx) = Store::new(repo.clone());
        store.dispatch(vec![Command::DeleteMenu(home.clone())]);
        drain(&mut store, &mut rx, 2).await;
        store.dispatch(vec![Command::DeleteMenu(home)]);
        drain(&mut store, &mut rx, 2).await;
        assert_eq!(store.state().error.as_deref(), Some("Failed to delete menu"));
    }
}
