use crate::autoclick_error;
use crate::error::{AutoclickError, Result};
use crate::events::{PointerEvent, Surface};
use crate::page::Document;
use crate::trace_if_enabled;
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::r#trait::PageHost;

/// Сколько последних действий хранит журнал
const JOURNAL_LIMIT: usize = 4096;

/// Действие, выполненное над страницей-снимком
#[derive(Debug, Clone, PartialEq)]
pub enum HostAction {
    Pointer { target: String, event: PointerEvent },
    Activated(String),
    Submitted(String),
}

/// Хост поверх HTML-снимка страницы.
///
/// Если снимок загружен из файла, файл перечитывается при каждом обращении:
/// правка файла во время прогона монтирует, убирает или меняет размер canvas.
/// Все действия логируются и пишутся в ограниченный журнал.
pub struct FixturePage {
    path: Option<PathBuf>,
    source: RwLock<String>,
    journal: Mutex<VecDeque<HostAction>>,
}

impl FixturePage {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            path: None,
            source: RwLock::new(source.into()),
            journal: Mutex::new(VecDeque::new()),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Загрузка снимка страницы из {:?}", path);
        let source = std::fs::read_to_string(path)?;
        debug!("Снимок страницы: {} байт", source.len());
        Ok(Self {
            path: Some(path.to_path_buf()),
            ..Self::new(source)
        })
    }

    /// Заменить разметку страницы. Возвращает `true`, если она изменилась.
    pub fn replace_html(&self, source: impl Into<String>) -> bool {
        let source = source.into();
        let mut current = self.source.write();
        if *current == source {
            return false;
        }
        *current = source;
        info!("Разметка страницы обновлена ({} байт)", current.len());
        true
    }

    fn refresh(&self) -> Result<()> {
        if let Some(path) = &self.path {
            self.replace_html(std::fs::read_to_string(path)?);
        }
        Ok(())
    }

    fn snapshot(&self) -> Result<Document> {
        self.refresh()?;
        Ok(Document::parse(&self.source.read()))
    }

    fn record(&self, action: HostAction) {
        trace_if_enabled!("Журнал страницы: {:?}", action);
        let mut journal = self.journal.lock();
        if journal.len() == JOURNAL_LIMIT {
            journal.pop_front();
        }
        journal.push_back(action);
    }

    fn locate_now(&self, selector: &str) -> Result<Option<Surface>> {
        let document = self.snapshot()?;
        let found = document.query(selector)?;
        Ok(found.map(|element| {
            Surface::new(selector, Document::rect(element)).with_target(Document::css_path(element))
        }))
    }

    /// Проверить, что элемент всё ещё есть на странице, и вернуть его тег
    fn resolve(&self, target: &str) -> Result<String> {
        let document = self.snapshot()?;
        match document.query(target)? {
            Some(element) => Ok(element.value().name().to_string()),
            None => AutoclickError::element_not_found(format!("элемент '{}' отсоединён от страницы", target)),
        }
    }
}

#[async_trait::async_trait]
impl PageHost for FixturePage {
    async fn locate(&self, selector: &str) -> Result<Option<Surface>> {
        self.locate_now(selector)
    }

    async fn dispatch(&self, surface: &Surface, event: PointerEvent) -> Result<()> {
        let target = surface.dispatch_selector();
        self.resolve(target)?;
        info!("[PAGE] {} -> {}", event, surface);
        self.record(HostAction::Pointer {
            target: target.to_string(),
            event,
        });
        Ok(())
    }

    async fn document(&self) -> Result<Document> {
        self.snapshot()
    }

    async fn activate(&self, target: &str) -> Result<()> {
        self.resolve(target)?;
        info!("[PAGE] Активация элемента {}", target);
        self.record(HostAction::Activated(target.to_string()));
        Ok(())
    }

    async fn submit_form(&self, target: &str) -> Result<()> {
        if self.resolve(target)? != "form" {
            return Err(autoclick_error!(host, "элемент '{}' не является формой", target));
        }
        info!("[PAGE] Отправка формы {}", target);
        self.record(HostAction::Submitted(target.to_string()));
        Ok(())
    }
}

#[cfg(test)]
impl FixturePage {
    pub fn journal(&self) -> Vec<HostAction> {
        self.journal.lock().iter().cloned().collect()
    }

    pub fn pointer_events(&self) -> Vec<PointerEvent> {
        self.journal
            .lock()
            .iter()
            .filter_map(|action| match action {
                HostAction::Pointer { event, .. } => Some(*event),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{PointerEventKind, Rect, TargetPoint};
    use std::io::Write;

    const CANVAS: &str = r#"<canvas width="100" height="50"></canvas>"#;

    fn click() -> PointerEvent {
        PointerEvent::new(PointerEventKind::Click, TargetPoint { x: 1.0, y: 1.0 })
    }

    #[tokio::test]
    async fn locate_reports_current_rect() {
        let page = FixturePage::new(CANVAS);
        let surface = page.locate("canvas").await.unwrap().unwrap();
        assert_eq!(surface.rect, Rect::sized(100.0, 50.0));

        assert!(page.replace_html(r#"<canvas width="320" height="240"></canvas>"#));
        let surface = page.locate("canvas").await.unwrap().unwrap();
        assert_eq!(surface.rect, Rect::sized(320.0, 240.0));
    }

    #[tokio::test]
    async fn locate_missing_surface_is_none() {
        let page = FixturePage::new("");
        assert!(page.locate("canvas").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dispatch_to_unmounted_surface_fails() {
        let page = FixturePage::new(CANVAS);
        let surface = page.locate("canvas").await.unwrap().unwrap();
        page.replace_html("<p>game over</p>");

        assert!(matches!(
            page.dispatch(&surface, click()).await,
            Err(AutoclickError::ElementNotFound(_))
        ));
        assert!(page.journal().is_empty());
    }

    #[tokio::test]
    async fn file_edits_are_picked_up_between_calls() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<div id=\"game\"></div>").unwrap();
        let page = FixturePage::load(file.path()).unwrap();
        assert!(page.locate("#game canvas").await.unwrap().is_none());

        std::fs::write(file.path(), r#"<div id="game"><canvas width="64" height="32"></canvas></div>"#)
            .unwrap();
        let surface = page.locate("#game canvas").await.unwrap().unwrap();
        assert_eq!(surface.rect, Rect::sized(64.0, 32.0));

        page.dispatch(&surface, click()).await.unwrap();
        assert_eq!(page.pointer_events(), vec![click()]);
    }

    #[test]
    fn missing_page_file_is_io_error() {
        assert!(matches!(
            FixturePage::load("/nonexistent/page.html"),
            Err(AutoclickError::Io(_))
        ));
    }

    #[tokio::test]
    async fn bundled_edit_page_fixture_loads() {
        let page = FixturePage::load(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/itch_edit_page.html"))
            .unwrap();

        let canvas = page.locate("canvas").await.unwrap().unwrap();
        assert_eq!(canvas.rect, Rect::new(0.0, 64.0, 960.0, 540.0));

        let document = page.document().await.unwrap();
        assert!(document.query("form.edit_game").unwrap().is_some());
    }

    #[tokio::test]
    async fn submit_rejects_non_form() {
        let page = FixturePage::new(CANVAS);
        let canvas = page.locate("canvas").await.unwrap().unwrap();
        assert!(matches!(
            page.submit_form(canvas.dispatch_selector()).await,
            Err(AutoclickError::Host(_))
        ));
    }

    #[tokio::test]
    async fn journal_keeps_most_recent_actions() {
        let page = FixturePage::new(CANVAS);
        let surface = page.locate("canvas").await.unwrap().unwrap();
        for _ in 0..JOURNAL_LIMIT + 5 {
            page.dispatch(&surface, click()).await.unwrap();
        }
        assert_eq!(page.journal().len(), JOURNAL_LIMIT);
    }
}
