use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub surface: SurfaceConfig,
    pub auto_click: LoopConfig,
    pub start_and_play: StartAndPlayConfig,
    pub page: PageConfig,
    pub browser: BrowserConfig,
    pub dry_run: DryRunConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SurfaceConfig {
    /// Селектор игровой поверхности
    pub selector: String,
}

/// Параметры цикла автокликера
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoopConfig {
    pub tick_interval_ms: u64,
    pub total_duration_ms: u64,
    pub x_fraction: f64,
    pub y_fraction: f64,
}

impl LoopConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn total_duration(&self) -> Duration {
        Duration::from_millis(self.total_duration_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StartAndPlayConfig {
    /// Точка стартового клика (по умолчанию центр)
    pub start_x_fraction: f64,
    pub start_y_fraction: f64,
    #[serde(rename = "loop")]
    pub loop_: LoopConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageConfig {
    /// HTML-снимок страницы; перечитывается при каждом обращении
    #[serde(default)]
    pub fixture_path: Option<String>,
    pub screenshot_list_selector: String,
    pub snapshot_limit: usize,
    pub save_labels: Vec<String>,
    pub form_selector: String,
}

/// Подключение к уже запущенному браузеру по CDP
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserConfig {
    /// WebSocket отладчика, например `ws://127.0.0.1:9222/devtools/browser/<id>`
    #[serde(default)]
    pub debugger_url: Option<String>,
    /// Подстрока URL нужной вкладки; без неё берётся первая
    #[serde(default)]
    pub page_url_contains: Option<String>,
    pub connect_attempts: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DryRunConfig {
    pub surface_width: f64,
    pub surface_height: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "compact".to_string(),
            },
            surface: SurfaceConfig {
                selector: "canvas".to_string(),
            },
            auto_click: LoopConfig {
                tick_interval_ms: 3000,
                total_duration_ms: 720_000,
                x_fraction: 0.5,
                y_fraction: 0.37,
            },
            start_and_play: StartAndPlayConfig {
                start_x_fraction: 0.5,
                start_y_fraction: 0.5,
                loop_: LoopConfig {
                    tick_interval_ms: 2000,
                    total_duration_ms: 120_000,
                    x_fraction: 0.5,
                    y_fraction: 0.37,
                },
            },
            page: PageConfig {
                fixture_path: None,
                screenshot_list_selector: ".screenshot_list".to_string(),
                snapshot_limit: 800,
                save_labels: vec!["save".to_string(), "save & view page".to_string()],
                form_selector: "form.edit_game".to_string(),
            },
            browser: BrowserConfig {
                debugger_url: None,
                page_url_contains: None,
                connect_attempts: 10,
            },
            dry_run: DryRunConfig {
                surface_width: 800.0,
                surface_height: 600.0,
            },
        }
    }
}

impl Config {
    /// Загружает конфигурацию: значения по умолчанию ← TOML-файл ← переменные `AUTOCLICK_*`.
    ///
    /// Отсутствующий файл не ошибка, берутся значения по умолчанию.
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("AUTOCLICK_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "compact" | "full" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        Self::validate_selector("surface.selector", &self.surface.selector)?;

        Self::validate_loop("auto_click", &self.auto_click)?;
        Self::validate_loop("start_and_play.loop", &self.start_and_play.loop_)?;
        Self::validate_fraction("start_and_play.start_x_fraction", self.start_and_play.start_x_fraction)?;
        Self::validate_fraction("start_and_play.start_y_fraction", self.start_and_play.start_y_fraction)?;

        if self.page.save_labels.is_empty() {
            anyhow::bail!("page.save_labels должен содержать хотя бы одну надпись");
        }
        Self::validate_selector("page.form_selector", &self.page.form_selector)?;
        Self::validate_selector(
            "page.screenshot_list_selector",
            &self.page.screenshot_list_selector,
        )?;

        if self.browser.connect_attempts == 0 {
            anyhow::bail!("browser.connect_attempts должно быть больше 0");
        }

        if self.dry_run.surface_width <= 0.0 || self.dry_run.surface_height <= 0.0 {
            anyhow::bail!("Размер виртуальной поверхности dry_run должен быть положительным");
        }

        Ok(())
    }

    fn validate_loop(section: &str, cfg: &LoopConfig) -> Result<()> {
        if cfg.tick_interval_ms == 0 {
            anyhow::bail!("{}.tick_interval_ms должно быть больше 0", section);
        }
        Self::validate_fraction(&format!("{}.x_fraction", section), cfg.x_fraction)?;
        Self::validate_fraction(&format!("{}.y_fraction", section), cfg.y_fraction)?;
        Ok(())
    }

    fn validate_selector(name: &str, selector: &str) -> Result<()> {
        if selector.trim().is_empty() {
            anyhow::bail!("{} не может быть пустым", name);
        }
        scraper::Selector::parse(selector)
            .map_err(|err| anyhow::anyhow!("{}: неверный CSS-селектор '{}' ({:?})", name, selector, err))?;
        Ok(())
    }

    fn validate_fraction(name: &str, value: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&value) {
            anyhow::bail!("{} должно быть в диапазоне [0, 1], получено {}", name, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_presets_match_recording_scripts() {
        let config = Config::default();
        assert_eq!(config.auto_click.tick_interval(), Duration::from_secs(3));
        assert_eq!(config.auto_click.total_duration(), Duration::from_secs(12 * 60));
        assert_eq!(config.start_and_play.loop_.tick_interval(), Duration::from_secs(2));
        assert_eq!(config.start_and_play.loop_.total_duration(), Duration::from_secs(120));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let mut config = Config::default();
        config.auto_click.tick_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_fraction_out_of_range() {
        let mut config = Config::default();
        config.start_and_play.start_y_fraction = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_save_labels() {
        let mut config = Config::default();
        config.page.save_labels.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_invalid_surface_selector() {
        let mut config = Config::default();
        config.surface.selector = "#game >".to_string();
        assert!(config.validate().is_err());

        config.surface.selector = "#game canvas".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = Config::load("/nonexistent/autoclick.toml").unwrap();
        assert_eq!(config.surface.selector, "canvas");
        assert_eq!(config.page.snapshot_limit, 800);
    }
}
