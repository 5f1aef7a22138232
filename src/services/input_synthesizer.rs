use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{ClickGesture, Surface, TargetPoint};
use crate::services::host::PageHost;
use std::sync::Arc;

/// Результат одного вызова синтезатора
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickOutcome {
    /// Поверхности нет: ничего не отправлено
    Skipped,
    /// Отправлен полный жест press → release → click
    Dispatched(TargetPoint),
}

/// Синтезатор кликов: считает точку от текущего прямоугольника поверхности
/// и отправляет жест из трёх событий
#[derive(Clone)]
pub struct InputSynthesizer {
    host: Arc<dyn PageHost>,
}

impl InputSynthesizer {
    pub fn new(host: Arc<dyn PageHost>) -> Self {
        Self { host }
    }

    pub async fn dispatch_click_at(
        &self,
        surface: Option<&Surface>,
        x_fraction: f64,
        y_fraction: f64,
    ) -> Result<ClickOutcome> {
        let Some(surface) = surface else {
            debug_if_enabled!("Поверхность не найдена - клик пропущен");
            return Ok(ClickOutcome::Skipped);
        };

        let point = TargetPoint::within(&surface.rect, x_fraction, y_fraction);
        for event in ClickGesture::at(point).events() {
            self.host.dispatch(surface, *event).await?;
        }

        debug_if_enabled!("Клик {} отправлен в {}", point, surface);
        Ok(ClickOutcome::Dispatched(point))
    }

    /// Найти поверхность заново и кликнуть в неё
    pub async fn click_selector(
        &self,
        selector: &str,
        x_fraction: f64,
        y_fraction: f64,
    ) -> Result<ClickOutcome> {
        let surface = self.host.locate(selector).await?;
        self.dispatch_click_at(surface.as_ref(), x_fraction, y_fraction)
            .await
    }
}
