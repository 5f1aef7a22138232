use super::surface::Rect;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Вид синтетического события указателя
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerEventKind {
    Press,
    Release,
    Click,
}

impl PointerEventKind {
    /// Имя DOM-события, которое эмулируется
    pub fn dom_name(&self) -> &'static str {
        match self {
            PointerEventKind::Press => "mousedown",
            PointerEventKind::Release => "mouseup",
            PointerEventKind::Click => "click",
        }
    }
}

/// Точка клика относительно поверхности.
///
/// Считается от ширины/высоты прямоугольника без добавления его начала координат.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetPoint {
    pub x: f64,
    pub y: f64,
}

impl TargetPoint {
    pub fn within(rect: &Rect, x_fraction: f64, y_fraction: f64) -> Self {
        Self {
            x: rect.width * x_fraction,
            y: rect.height * y_fraction,
        }
    }
}

impl fmt::Display for TargetPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub point: TargetPoint,
    pub bubbles: bool,
}

impl PointerEvent {
    pub fn new(kind: PointerEventKind, point: TargetPoint) -> Self {
        Self {
            kind,
            point,
            bubbles: true,
        }
    }
}

impl fmt::Display for PointerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.dom_name(), self.point)
    }
}

/// Жест клика: строго press → release → click в одной точке
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickGesture {
    events: [PointerEvent; 3],
}

impl ClickGesture {
    pub fn at(point: TargetPoint) -> Self {
        Self {
            events: [
                PointerEvent::new(PointerEventKind::Press, point),
                PointerEvent::new(PointerEventKind::Release, point),
                PointerEvent::new(PointerEventKind::Click, point),
            ],
        }
    }

    pub fn events(&self) -> &[PointerEvent; 3] {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_point_is_relative_to_surface_size() {
        let rect = Rect::new(40.0, 300.0, 100.0, 50.0);
        let point = TargetPoint::within(&rect, 0.5, 0.37);
        assert_eq!(point, TargetPoint { x: 50.0, y: 18.5 });
    }

    #[test]
    fn gesture_orders_press_release_click() {
        let point = TargetPoint { x: 10.0, y: 20.0 };
        let gesture = ClickGesture::at(point);
        let kinds: Vec<_> = gesture.events().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![PointerEventKind::Press, PointerEventKind::Release, PointerEventKind::Click]
        );
        assert!(gesture.events().iter().all(|e| e.point == point && e.bubbles));
    }
}
