use crate::config::Config;
use crate::error::{AutoclickError, Result};
use crate::events::{PointerEvent, Surface};
use crate::page::Document;
use std::sync::Arc;

/// Возможности страницы, которые нужны автокликеру от окружения.
///
/// Ядро (синтезатор и планировщик) пользуется только `locate` и `dispatch`;
/// остальные методы нужны вспомогательным запросам и сохранению страницы.
/// Элементы для `activate` и `submit_form` задаются путём из `Document::css_path`.
#[async_trait::async_trait]
pub trait PageHost: Send + Sync {
    /// Найти не более одной поверхности по селектору с её текущим прямоугольником
    async fn locate(&self, selector: &str) -> Result<Option<Surface>>;

    /// Отправить одно синтетическое событие указателя в поверхность
    async fn dispatch(&self, surface: &Surface, event: PointerEvent) -> Result<()>;

    /// Снимок страницы только для чтения
    async fn document(&self) -> Result<Document>;

    /// Активировать элемент (аналог `element.click()`)
    async fn activate(&self, target: &str) -> Result<()>;

    /// Отправить форму напрямую (аналог `form.submit()`)
    async fn submit_form(&self, target: &str) -> Result<()>;
}

/// Factory function to create an appropriate page host.
///
/// Порядок: dry-run, затем браузер по CDP, затем HTML-снимок страницы.
pub async fn create_host(config: Arc<Config>, dry_run: bool) -> Result<Arc<dyn PageHost>> {
    if dry_run {
        return Ok(Arc::new(super::dry_run::DryRunHost::new(config)?));
    }

    if let Some(url) = config.browser.debugger_url.as_deref() {
        let host = super::chrome_page::ChromePage::connect(url, &config.browser).await?;
        return Ok(Arc::new(host));
    }

    let path = config.page.fixture_path.as_deref().ok_or_else(|| {
        AutoclickError::Config(anyhow::anyhow!(
            "не задан ни browser.debugger_url, ни page.fixture_path (или используйте --dry-run)"
        ))
    })?;
    Ok(Arc::new(super::fixture_page::FixturePage::load(path)?))
}
