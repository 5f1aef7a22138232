use crate::error::{AutoclickError, Result};
use crate::events::Rect;
use scraper::{ElementRef, Html, Selector};

/// Разобрать CSS-селектор; синтаксически неверный селектор это ошибка, а не пустой результат
pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|err| AutoclickError::Selector(format!("{} ({:?})", selector, err)))
}

/// Снимок страницы только для чтения.
///
/// Геометрия элемента берётся из атрибутов `width`/`height` (как у canvas)
/// и `data-x`/`data-y` для смещения; у остальных элементов она нулевая.
#[derive(Debug)]
pub struct Document {
    html: Html,
}

impl Default for Document {
    fn default() -> Self {
        Self::parse("")
    }
}

impl Document {
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
        }
    }

    /// Все элементы документа в порядке обхода
    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.html.root_element().descendants().filter_map(ElementRef::wrap)
    }

    pub fn query_all(&self, selector: &str) -> Result<Vec<ElementRef<'_>>> {
        let selector = parse_selector(selector)?;
        Ok(self.html.select(&selector).collect())
    }

    pub fn query(&self, selector: &str) -> Result<Option<ElementRef<'_>>> {
        let selector = parse_selector(selector)?;
        Ok(self.html.select(&selector).next())
    }

    /// Потомки `scope`, подходящие под селектор (без самого `scope`)
    pub fn query_within<'a>(scope: ElementRef<'a>, selector: &str) -> Result<Vec<ElementRef<'a>>> {
        let selector = parse_selector(selector)?;
        Ok(scope.select(&selector).collect())
    }

    pub fn text_content(element: ElementRef<'_>) -> String {
        element.text().collect()
    }

    pub fn rect(element: ElementRef<'_>) -> Rect {
        let number = |name: &str| {
            element
                .value()
                .attr(name)
                .and_then(|value| value.trim().parse::<f64>().ok())
                .unwrap_or(0.0)
        };
        Rect::new(number("data-x"), number("data-y"), number("width"), number("height"))
    }

    /// Однозначный путь `html > body:nth-child(2) > ...` до элемента.
    ///
    /// По нему хост находит тот же элемент на живой странице.
    pub fn css_path(element: ElementRef<'_>) -> String {
        let mut parts = Vec::new();
        let mut current = Some(element);
        while let Some(node) = current {
            let parent = node.parent().and_then(ElementRef::wrap);
            let name = node.value().name();
            match parent {
                Some(parent) => {
                    let index = parent
                        .children()
                        .filter_map(ElementRef::wrap)
                        .position(|sibling| sibling.id() == node.id())
                        .map_or(1, |i| i + 1);
                    parts.push(format!("{}:nth-child({})", name, index));
                }
                None => parts.push(name.to_string()),
            }
            current = parent;
        }
        parts.reverse();
        parts.join(" > ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<div class="screenshot_list"><img class="thumb"><div class="screenshot_editor">shot 1</div></div><div id="game"><canvas width="100" height="50" data-y="64"></canvas></div>"#;

    #[test]
    fn finds_canvas_with_geometry() {
        let doc = Document::parse(PAGE);
        let canvas = doc.query("canvas").unwrap().unwrap();
        assert_eq!(Document::rect(canvas), Rect::new(0.0, 64.0, 100.0, 50.0));
    }

    #[test]
    fn combinators_are_supported() {
        let doc = Document::parse(PAGE);
        assert!(doc.query("#game canvas").unwrap().is_some());
        assert!(doc.query("div > canvas").unwrap().is_some());
        assert!(doc.query(".screenshot_list > canvas").unwrap().is_none());
    }

    #[test]
    fn invalid_selector_is_rejected() {
        let doc = Document::parse(PAGE);
        assert!(matches!(doc.query("div >"), Err(AutoclickError::Selector(_))));
        assert!(matches!(doc.query_all("#"), Err(AutoclickError::Selector(_))));
    }

    #[test]
    fn query_scoped_to_container() {
        let doc = Document::parse(PAGE);
        let list = doc.query(".screenshot_list").unwrap().unwrap();
        assert_eq!(Document::query_within(list, "img").unwrap().len(), 1);
        assert_eq!(Document::query_within(list, "canvas").unwrap().len(), 0);
        assert_eq!(Document::query_within(list, ".screenshot_list").unwrap().len(), 0);
    }

    #[test]
    fn inner_html_escapes_attribute_quotes() {
        let doc = Document::parse(r#"<div class="list"><img alt='say "cheese"'></div>"#);
        let list = doc.query(".list").unwrap().unwrap();
        assert_eq!(list.inner_html(), r#"<img alt="say &quot;cheese&quot;">"#);
    }

    #[test]
    fn css_path_resolves_to_same_element() {
        let doc = Document::parse(PAGE);
        let canvas = doc.query("canvas").unwrap().unwrap();
        let path = Document::css_path(canvas);
        assert_eq!(path, "html > body:nth-child(2) > div:nth-child(2) > canvas:nth-child(1)");

        let found = doc.query(&path).unwrap().unwrap();
        assert_eq!(found.id(), canvas.id());
    }

    #[test]
    fn text_content_includes_descendants() {
        let doc = Document::parse("<button> Save <span>&amp; View</span></button>");
        let button = doc.query("button").unwrap().unwrap();
        assert_eq!(Document::text_content(button), " Save & View");
    }
}
