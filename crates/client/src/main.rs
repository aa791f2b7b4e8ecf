//! Storefront command-line entry point.
//!
//! `storefront` loads the catalog and logs it sorted by subject.
//! `storefront <query>` logs the lessons the service finds for the query.

use anyhow::Context;

use storefront_catalog::{SortField, SortKey};
use storefront_client::{ClientConfig, HttpLessonService, ItemIcon, Reconciler, SearchBox};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storefront_observability::init();

    let config = ClientConfig::from_env().context("invalid storefront configuration")?;

    let service = match std::env::var("STOREFRONT_AUTH_TOKEN") {
        Ok(token) => {
            tracing::info!("using lesson service authentication token");
            HttpLessonService::with_token(&config, token)
        }
        Err(_) => HttpLessonService::new(&config),
    }
    .context("failed to build HTTP client")?;

    tracing::info!(api_url = service.api_url(), "connecting to lesson service");
    let reconciler = Reconciler::new(service);

    let query = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let lessons = if query.trim().is_empty() {
        let report = reconciler.refresh().await.context("failed to load lessons")?;
        reconciler.sort_by(SortKey::ascending(SortField::Subject));
        tracing::info!(lessons = report.items, "catalog loaded");
        reconciler.items()
    } else {
        let mut search = SearchBox::from_config(&reconciler, &config);
        search.input(query);
        match search.results().await {
            Some(found) => found.context("search failed")?.items,
            None => Vec::new(),
        }
    };

    for lesson in &lessons {
        let icon = ItemIcon::for_item(lesson, &config);
        tracing::info!(
            id = %lesson.id,
            subject = %lesson.subject,
            location = %lesson.location,
            price = %lesson.price,
            spaces = lesson.available_spaces,
            sold_out = lesson.is_sold_out(),
            icon = icon.src(),
            "lesson"
        );
    }

    Ok(())
}
