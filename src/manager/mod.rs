/// Record managers
///
/// One list/create/edit/delete state machine for any record shape. The list is
/// reconciled only from rows the gateway returns; a failed call leaves the
/// list, the draft and the edit state exactly as they were.
use crate::{
    gateway::{Gateway, GatewayResult},
    records::{self, Model, Record, Tool},
};
use std::sync::Arc;

pub type ModelManager = RecordManager<Model>;
pub type ToolManager = RecordManager<Tool>;

pub struct RecordManager<R: Record> {
    gateway: Arc<dyn Gateway>,
    items: Vec<R>,
    draft: R,
    editing: Option<R>,
}

impl<R: Record> RecordManager<R> {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self {
            gateway,
            items: Vec::new(),
            draft: R::default(),
            editing: None,
        }
    }

    pub fn items(&self) -> &[R] {
        &self.items
    }

    /// New-record draft bound to the create form
    pub fn draft(&self) -> &R {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut R {
        &mut self.draft
    }

    pub fn editing(&self) -> Option<&R> {
        self.editing.as_ref()
    }

    pub fn editing_mut(&mut self) -> Option<&mut R> {
        self.editing.as_mut()
    }

    /// Enter edit mode on a copy of the listed record; `false` if unknown
    pub fn begin_edit(&mut self, id: &str) -> bool {
        match self.items.iter().find(|item| item.id() == Some(id)) {
            Some(item) => {
                self.editing = Some(item.clone());
                true
            }
            None => false,
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Replace the list with the table's current rows
    pub async fn refresh(&mut self) -> GatewayResult<()> {
        let fetched = self
            .gateway
            .list(R::TABLE)
            .await
            .and_then(records::from_rows::<R>);

        match fetched {
            Ok(items) => {
                self.items = items;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Error fetching {}: {}", R::TABLE, e);
                Err(e)
            }
        }
    }

    /// Insert the draft, append the stored record and reset the draft
    pub async fn create(&mut self) -> GatewayResult<()> {
        match self.insert_draft().await {
            Ok(stored) => {
                self.items.push(stored);
                self.draft = R::default();
                Ok(())
            }
            Err(e) => {
                tracing::error!("Error adding {}: {}", R::TABLE, e);
                Err(e)
            }
        }
    }

    /// Persist the record under edit and leave edit mode
    ///
    /// Does nothing outside edit mode.
    pub async fn save(&mut self) -> GatewayResult<()> {
        let Some(editing) = &self.editing else {
            return Ok(());
        };
        let Some(id) = editing.id().map(str::to_string) else {
            return Ok(());
        };

        match self.update_record(&id, editing).await {
            Ok(stored) => {
                for item in self.items.iter_mut().filter(|item| item.id() == Some(id.as_str())) {
                    *item = stored.clone();
                }
                self.editing = None;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Error updating {} {}: {}", R::TABLE, id, e);
                Err(e)
            }
        }
    }

    /// Delete by id and drop exactly the matching entry
    pub async fn remove(&mut self, id: &str) -> GatewayResult<()> {
        match self.gateway.delete(R::TABLE, id).await {
            Ok(_) => {
                self.items.retain(|item| item.id() != Some(id));
                Ok(())
            }
            Err(e) => {
                tracing::error!("Error deleting {} {}: {}", R::TABLE, id, e);
                Err(e)
            }
        }
    }

    /// Form submit: save in edit mode, create otherwise
    pub async fn submit(&mut self) -> GatewayResult<()> {
        if self.editing.is_some() {
            self.save().await
        } else {
            self.create().await
        }
    }

    async fn insert_draft(&self) -> GatewayResult<R> {
        let row = self.draft.to_row()?;
        let stored = self.gateway.insert(R::TABLE, row).await?;
        R::from_row(stored)
    }

    async fn update_record(&self, id: &str, record: &R) -> GatewayResult<R> {
        let patch = record.to_row()?;
        let stored = self.gateway.update(R::TABLE, id, patch).await?;
        R::from_row(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SqliteGateway;

    async fn tool_manager() -> (Arc<SqliteGateway>, ToolManager) {
        let gateway = Arc::new(SqliteGateway::in_memory().await.unwrap());
        let manager = ToolManager::new(gateway.clone());
        (gateway, manager)
    }

    async fn add_tool(manager: &mut ToolManager, name: &str, description: &str) {
        *manager.draft_mut() = Tool::new(name, description);
        manager.create().await.unwrap();
    }

    #[tokio::test]
    async fn create_appends_exactly_one_matching_entry() {
        let (_, mut manager) = tool_manager().await;

        add_tool(&mut manager, "Text Analysis", "Analyze text content").await;

        assert_eq!(manager.items().len(), 1);
        let tool = &manager.items()[0];
        assert_eq!(tool.name, "Text Analysis");
        assert_eq!(tool.description, "Analyze text content");
        assert!(tool.id().is_some());
        assert_eq!(manager.draft(), &Tool::default());
    }

    #[tokio::test]
    async fn remove_drops_only_the_matching_entry() {
        let (_, mut manager) = tool_manager().await;
        add_tool(&mut manager, "A", "first").await;
        add_tool(&mut manager, "B", "second").await;
        add_tool(&mut manager, "C", "third").await;

        let target = manager.items()[1].id().unwrap().to_string();
        manager.remove(&target).await.unwrap();

        let names: Vec<_> = manager.items().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);

        manager.refresh().await.unwrap();
        assert_eq!(manager.items().len(), 2);
    }

    #[tokio::test]
    async fn save_replaces_entry_and_leaves_edit_mode() {
        let (_, mut manager) = tool_manager().await;
        add_tool(&mut manager, "Scraper", "old").await;
        let id = manager.items()[0].id().unwrap().to_string();

        assert!(manager.begin_edit(&id));
        manager.editing_mut().unwrap().description = "new".to_string();
        manager.submit().await.unwrap();

        assert!(manager.editing().is_none());
        assert_eq!(manager.items()[0].description, "new");
        assert_eq!(manager.items()[0].id(), Some(id.as_str()));
    }

    #[tokio::test]
    async fn begin_edit_unknown_id_is_rejected() {
        let (_, mut manager) = tool_manager().await;
        assert!(!manager.begin_edit("missing"));
        assert!(manager.editing().is_none());
    }

    #[tokio::test]
    async fn failed_calls_leave_state_untouched() {
        let (gateway, mut manager) = tool_manager().await;
        add_tool(&mut manager, "Keep", "me").await;
        let id = manager.items()[0].id().unwrap().to_string();
        manager.begin_edit(&id);
        manager.editing_mut().unwrap().name = "Changed".to_string();
        *manager.draft_mut() = Tool::new("Pending", "draft");

        let items_before = manager.items().to_vec();
        let editing_before = manager.editing().cloned();
        let draft_before = manager.draft().clone();

        gateway.close().await;

        assert!(manager.create().await.is_err());
        assert!(manager.save().await.is_err());
        assert!(manager.remove(&id).await.is_err());
        assert!(manager.refresh().await.is_err());

        assert_eq!(manager.items(), items_before.as_slice());
        assert_eq!(manager.editing().cloned(), editing_before);
        assert_eq!(manager.draft(), &draft_before);
    }

    #[tokio::test]
    async fn model_manager_round_trips_list_fields() {
        let gateway = Arc::new(SqliteGateway::in_memory().await.unwrap());
        let mut manager = ModelManager::new(gateway);

        {
            let draft = manager.draft_mut();
            draft.name = "tiny-llm".to_string();
            draft.supported_languages = vec!["en".to_string(), "fr".to_string()];
        }
        manager.create().await.unwrap();
        manager.refresh().await.unwrap();

        let model = &manager.items()[0];
        assert_eq!(model.supported_languages, vec!["en", "fr"]);
        assert_eq!(model.temperature, 0.7);
    }
}
