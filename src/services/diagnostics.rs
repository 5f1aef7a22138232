//! Диагностические запросы к странице публикации: только чтение, без таймеров.

use crate::config::PageConfig;
use crate::error::Result;
use crate::page::Document;
use crate::utils::truncate_chars;
use scraper::ElementRef;
use std::fmt::Write;

const BUTTON_KEYWORDS: [&str; 4] = ["screenshot", "image", "gallery", "add"];

/// Состояние списка скриншотов: счётчики и начало разметки контейнера
pub fn screenshot_state(doc: &Document, config: &PageConfig) -> Result<String> {
    let selector = &config.screenshot_list_selector;
    let Some(list) = doc.query(selector)? else {
        return Ok(format!("NO {}", selector.trim_start_matches(['.', '#'])));
    };

    let imgs = Document::query_within(list, "img")?.len();
    let uploading = Document::query_within(list, ".uploading_screenshot")?.len();
    let items = Document::query_within(list, ".screenshot_editor")?.len();
    let html = list.inner_html();

    Ok(format!(
        "imgs:{} uploading:{} items:{} html:{}",
        imgs,
        uploading,
        items,
        truncate_chars(&html, config.snapshot_limit)
    ))
}

fn attr<'a>(element: ElementRef<'a>, name: &str) -> &'a str {
    element.value().attr(name).unwrap_or_default()
}

fn is_screenshot_related(element: ElementRef<'_>) -> bool {
    attr(element, "class").contains("screenshot")
        || attr(element, "id").contains("screenshot")
        || attr(element, "name").contains("screenshot")
        || attr(element, "class").contains("gallery")
}

/// Отчёт об элементах, через которые загружаются скриншоты
pub fn find_upload_controls(doc: &Document) -> Result<String> {
    let mut out = String::new();

    for element in doc.elements().filter(|element| is_screenshot_related(*element)) {
        let _ = writeln!(
            out,
            "SCREENSHOT: tag={} class={}",
            element.value().name().to_uppercase(),
            truncate_chars(attr(element, "class"), 80)
        );
    }

    for element in doc.query_all("button, a.button")? {
        let text = Document::text_content(element);
        let text = text.trim();
        let lower = text.to_lowercase();
        if BUTTON_KEYWORDS.iter().any(|k| lower.contains(k)) {
            let _ = writeln!(
                out,
                "BTN: {} class={}",
                truncate_chars(text, 60),
                truncate_chars(attr(element, "class"), 60)
            );
        }
    }

    let file_inputs = doc.query_all("input[type=file]")?;
    let _ = writeln!(out, "File inputs: {}", file_inputs.len());
    for element in file_inputs {
        let _ = writeln!(
            out,
            "  FILE: name={} accept={} class={}",
            attr(element, "name"),
            attr(element, "accept"),
            attr(element, "class")
        );
    }

    Ok(out)
}
