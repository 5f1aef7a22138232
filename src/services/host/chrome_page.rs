use crate::autoclick_error;
use crate::config::BrowserConfig;
use crate::error::{AutoclickError, Result};
use crate::events::{PointerEvent, Rect, Surface};
use crate::page::Document;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use super::r#trait::PageHost;

const TAB_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Хост поверх живой вкладки браузера, подключённого по CDP.
///
/// События указателя отправляются в DOM через `Runtime.evaluate`
/// (`dispatchEvent`), поэтому страница получает ровно mousedown, mouseup и click.
pub struct ChromePage {
    page: Page,
    _browser: Browser,
    handler: JoinHandle<()>,
}

impl ChromePage {
    pub async fn connect(debugger_url: &str, config: &BrowserConfig) -> Result<Self> {
        info!("Подключение к браузеру: {}", debugger_url);
        let (mut browser, mut handler) = Browser::connect(debugger_url).await?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    warn!("Соединение CDP прервано: {}", err);
                    break;
                }
            }
        });

        match Self::find_tab(&mut browser, config).await {
            Ok(page) => Ok(Self {
                page,
                _browser: browser,
                handler,
            }),
            Err(err) => {
                handler.abort();
                Err(err)
            }
        }
    }

    async fn find_tab(browser: &mut Browser, config: &BrowserConfig) -> Result<Page> {
        let filter = config.page_url_contains.as_deref();

        for attempt in 1..=config.connect_attempts {
            browser.fetch_targets().await?;
            for page in browser.pages().await? {
                let url = page.url().await?.unwrap_or_default();
                if filter.map_or(true, |needle| url.contains(needle)) {
                    info!("Выбрана вкладка {}", url);
                    return Ok(page);
                }
            }
            debug!("Попытка {}: подходящей вкладки пока нет", attempt);
            sleep(TAB_POLL_INTERVAL).await;
        }

        AutoclickError::element_not_found(format!(
            "вкладка браузера (фильтр URL: {})",
            filter.unwrap_or("любой")
        ))
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T> {
        let result = self.page.evaluate(script).await?;
        let value = result.value().cloned().unwrap_or(serde_json::Value::Null);
        serde_json::from_value(value)
            .map_err(|err| autoclick_error!(host, "неожиданный ответ страницы: {}", err))
    }

    async fn eval_on_element(&self, script: String, target: &str) -> Result<()> {
        if self.eval::<bool>(script).await? {
            Ok(())
        } else {
            AutoclickError::element_not_found(format!("элемент '{}' отсоединён от страницы", target))
        }
    }
}

impl Drop for ChromePage {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

fn js_literal(value: &str) -> Result<String> {
    serde_json::to_string(value).map_err(|err| autoclick_error!(host, "{}", err))
}

fn locate_script(selector: &str) -> Result<String> {
    Ok(format!(
        r#"(() => {{
  const el = document.querySelector({});
  if (!el) return null;
  const r = el.getBoundingClientRect();
  return {{ x: r.x, y: r.y, width: r.width, height: r.height }};
}})()"#,
        js_literal(selector)?
    ))
}

fn dispatch_script(selector: &str, event: &PointerEvent) -> Result<String> {
    Ok(format!(
        r#"(() => {{
  const el = document.querySelector({});
  if (!el) return false;
  el.dispatchEvent(new MouseEvent({}, {{ clientX: {}, clientY: {}, bubbles: {} }}));
  return true;
}})()"#,
        js_literal(selector)?,
        js_literal(event.kind.dom_name())?,
        event.point.x,
        event.point.y,
        event.bubbles
    ))
}

fn element_call_script(target: &str, method: &str) -> Result<String> {
    Ok(format!(
        r#"(() => {{
  const el = document.querySelector({});
  if (!el) return false;
  el.{}();
  return true;
}})()"#,
        js_literal(target)?,
        method
    ))
}

#[async_trait::async_trait]
impl PageHost for ChromePage {
    async fn locate(&self, selector: &str) -> Result<Option<Surface>> {
        let rect: Option<Rect> = self.eval(locate_script(selector)?).await?;
        Ok(rect.map(|rect| Surface::new(selector, rect)))
    }

    async fn dispatch(&self, surface: &Surface, event: PointerEvent) -> Result<()> {
        let target = surface.dispatch_selector();
        self.eval_on_element(dispatch_script(target, &event)?, target)
            .await
    }

    async fn document(&self) -> Result<Document> {
        let html = self.page.content().await?;
        Ok(Document::parse(&html))
    }

    async fn activate(&self, target: &str) -> Result<()> {
        info!("Активация элемента {}", target);
        self.eval_on_element(element_call_script(target, "click")?, target)
            .await
    }

    async fn submit_form(&self, target: &str) -> Result<()> {
        info!("Отправка формы {}", target);
        self.eval_on_element(element_call_script(target, "submit")?, target)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{PointerEventKind, TargetPoint};

    #[test]
    fn dispatch_script_carries_event_fields() {
        let event = PointerEvent::new(PointerEventKind::Press, TargetPoint { x: 50.0, y: 18.5 });
        let script = dispatch_script("canvas", &event).unwrap();
        assert!(script.contains(r#"document.querySelector("canvas")"#));
        assert!(script.contains(r#"new MouseEvent("mousedown", { clientX: 50, clientY: 18.5, bubbles: true })"#));
    }

    #[test]
    fn selectors_are_quoted_as_js_strings() {
        let script = locate_script(r#"a[title="it's \ here"]"#).unwrap();
        assert!(script.contains(r#"document.querySelector("a[title=\"it's \\ here\"]")"#));
    }

    #[test]
    fn element_call_invokes_method() {
        let script = element_call_script("form:nth-child(2)", "submit").unwrap();
        assert!(script.contains(r#"document.querySelector("form:nth-child(2)")"#));
        assert!(script.contains("el.submit();"));
    }
}
