use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, PRAGMA};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{MenuError, MenuResult};
use crate::model::{DropdownCandidate, MenuNode, MenuOp, MenuUpdate, NewMenu};

#[async_trait]
pub trait MenuRepository: Send + Sync {
    /// Full tree, or the subtree rooted at `root`.
    async fn list_menus(&self, root: Option<&str>) -> MenuResult<Vec<MenuNode>>;

    async fn get_menu(&self, id: &str) -> MenuResult<MenuNode>;

    async fn create_menu(&self, menu: &NewMenu) -> MenuResult<MenuNode>;

    async fn update_menu(&self, update: &MenuUpdate) -> MenuResult<MenuNode>;

    /// Returns the id that was deleted.
    async fn delete_menu(&self, id: &str) -> MenuResult<String>;

    async fn list_dropdown_candidates(&self) -> MenuResult<Vec<DropdownCandidate>>;
}

#[derive(Deserialize)]
struct MenusEnvelope {
    menus: Vec<MenuNode>,
}

#[derive(Deserialize)]
struct MenuEnvelope {
    menu: MenuNode,
}

#[derive(Deserialize)]
struct UpdatedEnvelope {
    #[serde(rename = "updatedMenu", alias = "menu")]
    updated_menu: MenuNode,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CandidateList {
    Bare(Vec<DropdownCandidate>),
    Wrapped { menus: Vec<DropdownCandidate> },
}

impl From<CandidateList> for Vec<DropdownCandidate> {
    fn from(list: CandidateList) -> Self {
        match list {
            CandidateList::Bare(items) | CandidateList::Wrapped { menus: items } => items,
        }
    }
}

pub struct HttpMenuRepository {
    base_url: String,
    client: reqwest::Client,
}

impl HttpMenuRepository {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn menus_url(&self) -> String {
        format!("{}/api/menus", self.base_url)
    }

    fn menu_url(&self, id: &str) -> String {
        format!("{}/api/menus/{}", self.base_url, urlencoding::encode(id))
    }

    fn list_url(&self, root: Option<&str>) -> String {
        match root {
            Some(id) => format!("{}?menuId={}", self.menus_url(), urlencoding::encode(id)),
            None => self.menus_url(),
        }
    }

    async fn send(&self, op: MenuOp, request: RequestBuilder) -> MenuResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|err| fetch_failure(op, format!("request failed: {err}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_failure(op, format!("HTTP {status}")));
        }
        debug!(operation = op.name(), %status, "menu request completed");
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        op: MenuOp,
        request: RequestBuilder,
    ) -> MenuResult<T> {
        self.send(op, request)
            .await?
            .json::<T>()
            .await
            .map_err(|err| fetch_failure(op, format!("parse error: {err}")))
    }
}

fn fetch_failure(op: MenuOp, detail: String) -> MenuError {
    warn!(operation = op.name(), %detail, "menu request failed");
    MenuError::fetch(op.failure_message(), detail)
}

#[async_trait]
impl MenuRepository for HttpMenuRepository {
    async fn list_menus(&self, root: Option<&str>) -> MenuResult<Vec<MenuNode>> {
        let request = self
            .client
            .get(self.list_url(root))
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache");
        let envelope: MenusEnvelope = self.send_json(MenuOp::FetchMenus, request).await?;
        Ok(envelope.menus)
    }

    async fn get_menu(&self, id: &str) -> MenuResult<MenuNode> {
        let request = self.client.get(self.menu_url(id));
        let envelope: MenuEnvelope = self.send_json(MenuOp::FetchMenuDetails, request).await?;
        Ok(envelope.menu)
    }

    async fn create_menu(&self, menu: &NewMenu) -> MenuResult<MenuNode> {
        let request = self.client.post(self.menus_url()).json(menu);
        let envelope: MenuEnvelope = self.send_json(MenuOp::AddMenu, request).await?;
        Ok(envelope.menu)
    }

    async fn update_menu(&self, update: &MenuUpdate) -> MenuResult<MenuNode> {
        let request = self.client.put(self.menu_url(&update.id)).json(update);
        let envelope: UpdatedEnvelope = self.send_json(MenuOp::UpdateMenu, request).await?;
        Ok(envelope.updated_menu)
    }

    async fn delete_menu(&self, id: &str) -> MenuResult<String> {
        let request = self
            .client
            .delete(self.menu_url(id))
            .header(CONTENT_TYPE, "application/json");
        self.send(MenuOp::DeleteMenu, request).await?;
        Ok(id.to_string())
    }

    async fn list_dropdown_candidates(&self) -> MenuResult<Vec<DropdownCandidate>> {
        let request = self
            .client
            .get(format!("{}/selection", self.menus_url()))
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache");
        let list: CandidateList = self.send_json(MenuOp::FetchDropdownItems, request).await?;
        Ok(list.into())
    }
}
