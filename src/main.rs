use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod page;
mod services;
mod utils;

use config::Config;
use services::loop_scheduler::LoopStatus;
use services::{create_host, diagnostics, form_submit, scenarios, AutomationController};

#[derive(Parser, Debug)]
#[command(name = "gif-autoclick")]
#[command(about = "Автокликер canvas-игры для записи GIF и утилиты страницы публикации")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "autoclick.toml", global = true)]
    config: String,

    /// Режим сухого запуска (без реальных действий)
    #[arg(long, global = true)]
    dry_run: bool,

    /// Уровень логирования (по умолчанию из конфигурации)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Автовыбор улучшений: клик в первый вариант по таймеру
    AutoClick {
        /// Интервал между кликами, мс
        #[arg(long)]
        interval_ms: Option<u64>,
        /// Время жизни цикла, мс
        #[arg(long)]
        duration_ms: Option<u64>,
        /// Доля ширины поверхности для точки клика
        #[arg(long)]
        x: Option<f64>,
        /// Доля высоты поверхности для точки клика
        #[arg(long)]
        y: Option<f64>,
    },
    /// Запустить игру кликом в центр и включить автокликер
    StartAndPlay,
    /// Показать состояние списка скриншотов
    CheckScreenshots,
    /// Найти элементы загрузки скриншотов
    FindUpload,
    /// Сохранить страницу игры
    SavePage,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let mut config = Config::load(&args.config)?;

    // Инициализация системы логирования
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    info!("Запуск gif-autoclick v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - реальные действия отключены");
    }

    if let Command::AutoClick { interval_ms, duration_ms, x, y } = &args.command {
        let auto_click = &mut config.auto_click;
        auto_click.tick_interval_ms = interval_ms.unwrap_or(auto_click.tick_interval_ms);
        auto_click.total_duration_ms = duration_ms.unwrap_or(auto_click.total_duration_ms);
        auto_click.x_fraction = x.unwrap_or(auto_click.x_fraction);
        auto_click.y_fraction = y.unwrap_or(auto_click.y_fraction);
        config.validate()?;
    }

    let config = Arc::new(config);
    let host = create_host(config.clone(), args.dry_run).await?;
    let controller = AutomationController::new();

    match args.command {
        Command::AutoClick { .. } => {
            println!("{}", scenarios::auto_click_loop(&controller, host, &config));
            wait_for_loop(&controller).await;
        }
        Command::StartAndPlay => {
            println!("{}", scenarios::start_and_play(&controller, host, &config).await?);
            wait_for_loop(&controller).await;
        }
        Command::CheckScreenshots => {
            let doc = host.document().await?;
            println!("{}", diagnostics::screenshot_state(&doc, &config.page)?);
        }
        Command::FindUpload => {
            let doc = host.document().await?;
            print!("{}", diagnostics::find_upload_controls(&doc)?);
        }
        Command::SavePage => {
            println!("{}", form_submit::save_page(host.as_ref(), &config.page).await?);
        }
    }

    info!("gif-autoclick завершил работу");
    Ok(())
}

/// Ожидание окончания цикла или Ctrl+C
async fn wait_for_loop(controller: &AutomationController) {
    if controller.status() == LoopStatus::Idle {
        return;
    }

    tokio::select! {
        _ = controller.wait_idle() => {
            info!("Цикл завершён, тиков: {}", controller.last_tick_count());
        }
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
            }
            if let LoopStatus::Running { generation, ticks, elapsed } = controller.status() {
                info!(
                    "Остановка цикла #{}: {} тиков за {:.1}с",
                    generation,
                    ticks,
                    elapsed.as_secs_f64()
                );
            }
            controller.shutdown().await;
        }
    }
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    // stdout занят текстовым результатом команды
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        "full" => registry.with(fmt::layer().with_writer(std::io::stderr)).init(),
        _ => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
    }

    Ok(())
}
