use crate::config::PageConfig;
use crate::error::Result;
use crate::page::Document;
use crate::services::host::PageHost;
use scraper::ElementRef;
use tracing::{info, warn};

const SAVE_CONTROLS: &str = "button, input[type=submit]";

/// Что нажать, чтобы сохранить страницу
#[derive(Debug, Clone, PartialEq)]
enum SaveTarget {
    Button { label: String, path: String },
    Form(String),
    Missing,
}

/// Надпись кнопки как её видит пользователь: текст, а если он пуст - `value`
fn control_label(element: ElementRef<'_>) -> String {
    let text = Document::text_content(element);
    let label = if text.is_empty() {
        element.value().attr("value").unwrap_or_default().to_string()
    } else {
        text
    };
    label.trim().to_lowercase()
}

/// Короткое имя формы для отчёта: `form.edit_game` -> `edit_game`
fn form_name(selector: &str) -> &str {
    selector.rsplit(['.', '#']).next().unwrap_or(selector)
}

fn find_save_target(doc: &Document, config: &PageConfig) -> Result<SaveTarget> {
    let labels: Vec<String> = config
        .save_labels
        .iter()
        .map(|label| label.trim().to_lowercase())
        .collect();

    for element in doc.query_all(SAVE_CONTROLS)? {
        let label = control_label(element);
        if labels.contains(&label) {
            return Ok(SaveTarget::Button {
                label,
                path: Document::css_path(element),
            });
        }
    }

    Ok(match doc.query(&config.form_selector)? {
        Some(form) => SaveTarget::Form(Document::css_path(form)),
        None => SaveTarget::Missing,
    })
}

/// Сохранить страницу: сначала кнопка из списка надписей, затем прямая отправка формы
pub async fn save_page(host: &dyn PageHost, config: &PageConfig) -> Result<String> {
    let target = {
        let doc = host.document().await?;
        find_save_target(&doc, config)?
    };

    match target {
        SaveTarget::Button { label, path } => {
            host.activate(&path).await?;
            info!("Нажата кнопка сохранения '{}'", label);
            Ok(format!("Clicked save button: {}", label))
        }
        SaveTarget::Form(path) => {
            host.submit_form(&path).await?;
            info!("Форма '{}' отправлена напрямую", config.form_selector);
            Ok(format!("Submitted {} form", form_name(&config.form_selector)))
        }
        SaveTarget::Missing => {
            warn!("Кнопка сохранения и форма '{}' не найдены", config.form_selector);
            Ok("ERROR: No save button found".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::host::{FixturePage, HostAction};

    const FORM: &str = r#"<form class="edit_game"></form>"#;

    fn page_config() -> PageConfig {
        Config::default().page
    }

    #[tokio::test]
    async fn clicks_first_matching_button() {
        let page = FixturePage::new(format!(
            "<button>Preview</button><button>  Save &amp; View Page </button><button>Save</button>{}",
            FORM
        ));

        let message = save_page(&page, &page_config()).await.unwrap();
        assert_eq!(message, "Clicked save button: save & view page");

        let journal = page.journal();
        assert_eq!(
            journal,
            vec![HostAction::Activated(
                "html > body:nth-child(2) > button:nth-child(2)".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn submit_input_uses_value_when_text_empty() {
        let page = FixturePage::new(r#"<input type="submit" value="SAVE">"#);

        let message = save_page(&page, &page_config()).await.unwrap();
        assert_eq!(message, "Clicked save button: save");
    }

    #[tokio::test]
    async fn label_match_is_exact() {
        let page = FixturePage::new(format!("<button>Save draft</button>{}", FORM));

        let message = save_page(&page, &page_config()).await.unwrap();
        assert_eq!(message, "Submitted edit_game form");
        assert!(matches!(page.journal()[0], HostAction::Submitted(_)));
    }

    #[tokio::test]
    async fn reports_not_found() {
        let page = FixturePage::new("<button>Cancel</button>");

        let message = save_page(&page, &page_config()).await.unwrap();
        assert_eq!(message, "ERROR: No save button found");
        assert!(page.journal().is_empty());
    }

    #[test]
    fn save_target_prefers_button_over_form() {
        let doc = Document::parse(&format!("{}<button>save</button>", FORM));
        assert!(matches!(
            find_save_target(&doc, &page_config()).unwrap(),
            SaveTarget::Button { ref label, .. } if label == "save"
        ));
    }

    #[test]
    fn form_name_strips_selector_prefix() {
        assert_eq!(form_name("form.edit_game"), "edit_game");
        assert_eq!(form_name("form"), "form");
    }
}
