use crate::config::Config;
use crate::error::Result;
use crate::events::{PointerEvent, Rect, Surface};
use crate::page::Document;
use std::sync::Arc;
use tracing::info;

use super::r#trait::PageHost;

/// Хост без живой страницы: поверхность всегда «есть», действия только логируются.
///
/// Если задан `page.fixture_path`, на запросы к документу отвечает этот снимок.
pub struct DryRunHost {
    surface_rect: Rect,
    page_source: String,
}

impl DryRunHost {
    pub fn new(config: Arc<Config>) -> Result<Self> {
        info!("Dry-run режим - PageHost работает в режиме эмуляции");
        let page_source = match config.page.fixture_path.as_deref() {
            Some(path) => {
                info!("[DRY RUN] Документ страницы берётся из {}", path);
                std::fs::read_to_string(path)?
            }
            None => String::new(),
        };
        Ok(Self {
            surface_rect: Rect::sized(config.dry_run.surface_width, config.dry_run.surface_height),
            page_source,
        })
    }
}

#[async_trait::async_trait]
impl PageHost for DryRunHost {
    async fn locate(&self, selector: &str) -> Result<Option<Surface>> {
        Ok(Some(Surface::new(selector, self.surface_rect)))
    }

    async fn dispatch(&self, surface: &Surface, event: PointerEvent) -> Result<()> {
        info!("[DRY RUN] {} -> {}", event, surface);
        Ok(())
    }

    async fn document(&self) -> Result<Document> {
        Ok(Document::parse(&self.page_source))
    }

    async fn activate(&self, target: &str) -> Result<()> {
        info!("[DRY RUN] Активация элемента {}", target);
        Ok(())
    }

    async fn submit_form(&self, target: &str) -> Result<()> {
        info!("[DRY RUN] Отправка формы {}", target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_resolves_virtual_surface() {
        let host = DryRunHost::new(Arc::new(Config::default())).unwrap();
        let surface = host.locate("canvas").await.unwrap().unwrap();
        assert_eq!(surface.rect, Rect::sized(800.0, 600.0));
        assert!(host.document().await.unwrap().query("canvas").unwrap().is_none());
    }

    #[tokio::test]
    async fn document_comes_from_fixture_when_configured() {
        let mut config = Config::default();
        config.page.fixture_path =
            Some(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/itch_edit_page.html").to_string());
        let host = DryRunHost::new(Arc::new(config)).unwrap();

        let document = host.document().await.unwrap();
        assert!(document.query(".screenshot_list").unwrap().is_some());
        assert!(document.query("form.edit_game").unwrap().is_some());
    }
}
