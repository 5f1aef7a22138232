use crate::config::Config;
use crate::error::Result;
use crate::services::host::PageHost;
use crate::services::input_synthesizer::InputSynthesizer;
use crate::services::loop_scheduler::{AutomationController, LoopSpec};
use std::sync::Arc;
use tracing::info;

/// Автовыбор улучшений: клик в первый вариант на экране level-up
pub fn auto_click_loop(
    controller: &AutomationController,
    host: Arc<dyn PageHost>,
    config: &Config,
) -> String {
    let spec = LoopSpec::from_config(&config.surface.selector, &config.auto_click);
    let started = controller.start_click_loop(host, spec);
    format!(
        "{} Will auto-select upgrades.",
        started.status_message("Auto-clicker")
    )
}

/// Запуск игры кликом в центр поверхности и автокликер поверх
pub async fn start_and_play(
    controller: &AutomationController,
    host: Arc<dyn PageHost>,
    config: &Config,
) -> Result<String> {
    let preset = &config.start_and_play;
    let Some(surface) = host.locate(&config.surface.selector).await? else {
        info!("Поверхность '{}' не найдена - игра не запущена", config.surface.selector);
        return Ok("no canvas".to_string());
    };

    InputSynthesizer::new(Arc::clone(&host))
        .dispatch_click_at(Some(&surface), preset.start_x_fraction, preset.start_y_fraction)
        .await?;
    info!("Стартовый клик отправлен в {}", surface);

    let spec = LoopSpec::from_config(&config.surface.selector, &preset.loop_);
    controller.start_click_loop(host, spec);

    Ok("Game started with auto-clicker".to_string())
}
