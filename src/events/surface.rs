use serde::{Deserialize, Serialize};
use std::fmt;

/// Ограничивающий прямоугольник элемента (в CSS-пикселях)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn sized(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}@({}, {})", self.width, self.height, self.x, self.y)
    }
}

/// Найденная по селектору поверхность (обычно canvas игры).
///
/// Не владеет элементом: это снимок геометрии на момент поиска,
/// поэтому ищется заново на каждом тике.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub selector: String,
    /// Точный путь к найденному элементу, если хост его знает
    pub target: Option<String>,
    pub rect: Rect,
}

impl Surface {
    pub fn new(selector: impl Into<String>, rect: Rect) -> Self {
        Self {
            selector: selector.into(),
            target: None,
            rect,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Селектор, по которому хост доставляет события
    pub fn dispatch_selector(&self) -> &str {
        self.target.as_deref().unwrap_or(&self.selector)
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' {}", self.selector, self.rect)
    }
}
