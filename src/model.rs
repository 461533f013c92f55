use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{MenuError, MenuResult};

/// One node of the administered menu tree, as served by the backend.
///
/// `parent` is a single-level back-reference the backend fills in on detail
/// reads; tree listings usually leave it empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNode {
    #[serde(default, deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "de_or_default")]
    pub depth: u32,
    #[serde(default, deserialize_with = "de_opt_id")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub parent_name: Option<String>,
    #[serde(default)]
    pub parent: Option<Box<MenuNode>>,
    #[serde(default, deserialize_with = "de_or_default")]
    pub children: Vec<MenuNode>,
}

impl MenuNode {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Name shown for the node's parent: the explicit `parentName` when
    /// present, otherwise the denormalized parent record.
    pub fn parent_label(&self) -> &str {
        self.parent_name
            .as_deref()
            .or_else(|| self.parent.as_ref().map(|parent| parent.name.as_str()))
            .unwrap_or("")
    }
}

/// Flattened node record used only to populate parent pickers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownCandidate {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_or_default")]
    pub name: String,
    #[serde(default, deserialize_with = "de_or_default")]
    pub depth: u32,
}

/// Body of a create request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMenu {
    pub name: String,
    pub parent_id: Option<String>,
}

impl NewMenu {
    /// An empty `parent_id` means "create a root".
    pub fn new(name: impl Into<String>, parent_id: &str) -> Self {
        Self {
            name: name.into(),
            parent_id: if parent_id.is_empty() {
                None
            } else {
                Some(parent_id.to_string())
            },
        }
    }
}

/// Body of an update request; `id` travels in the path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuUpdate {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub parent_id: Option<String>,
}

impl From<&MenuNode> for MenuUpdate {
    fn from(node: &MenuNode) -> Self {
        Self {
            id: node.id.clone(),
            name: node.name.clone(),
            parent_id: node.parent_id.clone(),
        }
    }
}

/// The store operations that talk to the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MenuOp {
    FetchMenus,
    FetchMenuDetails,
    UpdateMenu,
    DeleteMenu,
    AddMenu,
    FetchDropdownItems,
}

impl MenuOp {
    pub fn name(self) -> &'static str {
        match self {
            MenuOp::FetchMenus => "fetch_menus",
            MenuOp::FetchMenuDetails => "fetch_menu_details",
            MenuOp::UpdateMenu => "update_menu",
            MenuOp::DeleteMenu => "delete_menu",
            MenuOp::AddMenu => "add_menu",
            MenuOp::FetchDropdownItems => "fetch_dropdown_items",
        }
    }

    /// Message recorded when the operation fails without a better one.
    pub fn failure_message(self) -> &'static str {
        match self {
            MenuOp::FetchMenus => "Failed to fetch menus",
            MenuOp::FetchMenuDetails => "Failed to fetch menu details",
            MenuOp::UpdateMenu => "Failed to update menu",
            MenuOp::DeleteMenu => "Failed to delete menu",
            MenuOp::AddMenu => "Failed to add menu",
            MenuOp::FetchDropdownItems => "Failed to fetch dropdown items",
        }
    }
}

pub fn validate_menu_name(name: &str) -> MenuResult<()> {
    if name.trim().is_empty() {
        return Err(MenuError::Validation("Menu name is required".into()));
    }
    Ok(())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(text) => text,
            RawId::Number(number) => number.to_string(),
        }
    }
}

fn de_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

/// `null` reads as the type's default.
fn de_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
