//! PageHost: возможности страницы, которые автокликер получает извне
//!
//! Этот модуль отвечает ТОЛЬКО за доступ к странице: поиск поверхности,
//! доставку синтетических событий, снимок документа и активацию элементов.
//! Никакой логики таймеров и расписаний здесь нет; ей владеет
//! AutomationController.

mod chrome_page;
mod dry_run;
mod fixture_page;
mod r#trait;

#[cfg(test)]
pub use self::fixture_page::{FixturePage, HostAction};
pub use self::r#trait::{create_host, PageHost};
