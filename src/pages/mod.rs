/// Read-only list pages
///
/// Each page shows one table ordered by name. A failed fetch is logged and the
/// page renders empty.
use crate::{
    gateway::{Gateway, Selection},
    records::{self, ConfigEntry, Function, Model, Record, Secret, Tool},
};

/// Full contents of `R`'s table ordered by name; empty on failure
pub async fn list_by_name<R: Record>(gateway: &dyn Gateway) -> Vec<R> {
    let fetched = gateway
        .select(R::TABLE, &Selection::all().order_by("name"))
        .await
        .and_then(records::from_rows::<R>);

    match fetched {
        Ok(items) => items,
        Err(e) => {
            tracing::error!("Error fetching {}: {}", R::TABLE, e);
            Vec::new()
        }
    }
}

pub async fn secrets(gateway: &dyn Gateway) -> Vec<Secret> {
    list_by_name(gateway).await
}

pub async fn configs(gateway: &dyn Gateway) -> Vec<ConfigEntry> {
    list_by_name(gateway).await
}

pub async fn functions(gateway: &dyn Gateway) -> Vec<Function> {
    list_by_name(gateway).await
}

pub async fn tools(gateway: &dyn Gateway) -> Vec<Tool> {
    list_by_name(gateway).await
}

pub async fn models(gateway: &dyn Gateway) -> Vec<Model> {
    list_by_name(gateway).await
}
