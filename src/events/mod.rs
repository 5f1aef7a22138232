pub mod pointer;
pub mod surface;

pub use pointer::{ClickGesture, PointerEvent, PointerEventKind, TargetPoint};
pub use surface::{Rect, Surface};
