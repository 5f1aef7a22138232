use crate::config::LoopConfig;
use crate::services::host::PageHost;
use crate::services::input_synthesizer::{ClickOutcome, InputSynthesizer};
use crate::{debug_if_enabled, trace_if_enabled};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Duration, Instant, MissedTickBehavior};
use tracing::{info, warn};

/// tokio::time::interval не принимает нулевой период
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Параметры цикла кликов по поверхности
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSpec {
    pub selector: String,
    pub tick_interval: Duration,
    pub total_duration: Duration,
    pub x_fraction: f64,
    pub y_fraction: f64,
}

impl LoopSpec {
    pub fn from_config(selector: &str, cfg: &LoopConfig) -> Self {
        Self {
            selector: selector.to_string(),
            tick_interval: cfg.tick_interval(),
            total_duration: cfg.total_duration(),
            x_fraction: cfg.x_fraction,
            y_fraction: cfg.y_fraction,
        }
    }
}

/// Подтверждение запуска цикла
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopStarted {
    pub generation: u64,
    pub tick_interval: Duration,
    pub total_duration: Duration,
    /// Поколение цикла, который был заменён этим запуском
    pub replaced: Option<u64>,
}

impl LoopStarted {
    /// Текстовый результат для оператора, например
    /// `Auto-clicker started (every 3s, stops after 12min).`
    pub fn status_message(&self, subject: &str) -> String {
        format!(
            "{} started (every {}, stops after {}).",
            subject,
            format_duration(self.tick_interval),
            format_duration(self.total_duration)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
    Idle,
    Running {
        generation: u64,
        ticks: u64,
        elapsed: Duration,
    },
}

#[derive(Debug)]
struct ActiveLoop {
    generation: u64,
    handle: JoinHandle<()>,
    // Цикл проверяет флаг только между тиками: начатый жест всегда доходит до click
    stop: watch::Sender<bool>,
    ticks: Arc<AtomicU64>,
    started_at: Instant,
}

impl ActiveLoop {
    fn request_stop(&self) {
        self.stop.send_replace(true);
    }
}

struct Shared {
    slot: Mutex<Option<ActiveLoop>>,
    latest_ticks: Mutex<Arc<AtomicU64>>,
    // Some(generation) пока цикл активен
    state: watch::Sender<Option<u64>>,
}

impl Shared {
    /// Освобождает слот, только если в нём всё ещё цикл этого поколения
    fn release(&self, generation: u64) -> bool {
        let mut slot = self.slot.lock();
        if slot.as_ref().map(|active| active.generation) != Some(generation) {
            return false;
        }
        slot.take();
        self.state.send_replace(None);
        true
    }
}

/// Владелец единственного цикла автокликера.
///
/// В каждый момент активен не более чем один цикл: `restart` сначала
/// отменяет предыдущий, затем ставит новый. Отмена не прерывает тик, который
/// уже выполняется. Цикл сам завершается по истечении `total_duration`.
pub struct AutomationController {
    shared: Arc<Shared>,
    next_generation: AtomicU64,
}

impl Default for AutomationController {
    fn default() -> Self {
        Self::new()
    }
}

impl AutomationController {
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                slot: Mutex::new(None),
                latest_ticks: Mutex::new(Arc::new(AtomicU64::new(0))),
                state,
            }),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Отменить текущий цикл (если есть) и запустить новый.
    ///
    /// Возвращается сразу; должен вызываться внутри tokio runtime.
    /// `on_tick` получает порядковый номер тика, начиная с 1.
    pub fn restart<F, Fut>(
        &self,
        tick_interval: Duration,
        total_duration: Duration,
        on_tick: F,
    ) -> LoopStarted
    where
        F: FnMut(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let period = tick_interval.max(MIN_TICK_INTERVAL);
        let ticks = Arc::new(AtomicU64::new(0));

        let mut slot = self.shared.slot.lock();

        let replaced = slot.take().map(|old| {
            old.request_stop();
            info!(
                "Цикл #{} заменён новым после {} тиков",
                old.generation,
                old.ticks.load(Ordering::Relaxed)
            );
            old.generation
        });

        let started_at = Instant::now();
        let (stop, stop_rx) = watch::channel(false);
        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.shared),
            generation,
            started_at,
            period,
            total_duration,
            Arc::clone(&ticks),
            stop_rx,
            on_tick,
        ));

        *slot = Some(ActiveLoop {
            generation,
            handle,
            stop,
            ticks: Arc::clone(&ticks),
            started_at,
        });
        *self.shared.latest_ticks.lock() = ticks;
        self.shared.state.send_replace(Some(generation));
        drop(slot);

        info!(
            "Цикл #{} запущен: интервал {}мс, завершение через {}мс",
            generation,
            period.as_millis(),
            total_duration.as_millis()
        );

        LoopStarted {
            generation,
            tick_interval: period,
            total_duration,
            replaced,
        }
    }

    /// Цикл кликов: на каждом тике поверхность ищется заново
    pub fn start_click_loop(&self, host: Arc<dyn PageHost>, spec: LoopSpec) -> LoopStarted {
        let synthesizer = InputSynthesizer::new(host);
        let selector: Arc<str> = spec.selector.into();
        let (x_fraction, y_fraction) = (spec.x_fraction, spec.y_fraction);

        self.restart(spec.tick_interval, spec.total_duration, move |tick| {
            let synthesizer = synthesizer.clone();
            let selector = Arc::clone(&selector);
            async move {
                match synthesizer
                    .click_selector(&selector, x_fraction, y_fraction)
                    .await
                {
                    Ok(ClickOutcome::Dispatched(point)) => {
                        debug_if_enabled!("Тик #{}: клик в {}", tick, point);
                    }
                    Ok(ClickOutcome::Skipped) => {
                        debug_if_enabled!("Тик #{}: поверхность '{}' не найдена", tick, selector);
                    }
                    Err(e) => {
                        warn!("Тик #{}: не удалось отправить клик: {}", tick, e);
                    }
                }
            }
        })
    }

    /// Остановить активный цикл досрочно. Возвращает `true`, если цикл был.
    ///
    /// Новых тиков не будет; тик, который уже идёт, доотправляет свой жест.
    pub fn cancel(&self) -> bool {
        self.take_active().is_some()
    }

    /// Остановить цикл и дождаться, пока его задача доработает текущий тик
    pub async fn shutdown(&self) -> bool {
        match self.take_active() {
            Some(active) => {
                if let Err(e) = active.handle.await {
                    warn!("Задача цикла #{} завершилась с ошибкой: {}", active.generation, e);
                }
                debug_if_enabled!("Цикл #{} полностью остановлен", active.generation);
                true
            }
            None => false,
        }
    }

    fn take_active(&self) -> Option<ActiveLoop> {
        let active = self.shared.slot.lock().take()?;
        active.request_stop();
        self.shared.state.send_replace(None);
        info!(
            "Цикл #{} остановлен после {} тиков",
            active.generation,
            active.ticks.load(Ordering::Relaxed)
        );
        Some(active)
    }

    pub fn status(&self) -> LoopStatus {
        match self.shared.slot.lock().as_ref() {
            Some(active) => LoopStatus::Running {
                generation: active.generation,
                ticks: active.ticks.load(Ordering::Relaxed),
                elapsed: active.started_at.elapsed(),
            },
            None => LoopStatus::Idle,
        }
    }

    /// Число тиков последнего запущенного цикла (активного или завершённого)
    pub fn last_tick_count(&self) -> u64 {
        self.shared.latest_ticks.lock().load(Ordering::Relaxed)
    }

    /// Дождаться, пока не останется активного цикла
    pub async fn wait_idle(&self) {
        let mut rx = self.shared.state.subscribe();
        let _ = rx.wait_for(|generation| generation.is_none()).await;
    }
}

impl Drop for AutomationController {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_loop<F, Fut>(
    shared: Arc<Shared>,
    generation: u64,
    started_at: Instant,
    period: Duration,
    total_duration: Duration,
    ticks: Arc<AtomicU64>,
    mut stop: watch::Receiver<bool>,
    mut on_tick: F,
) where
    F: FnMut(u64) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut ticker = interval_at(started_at + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let expiry = sleep_until(started_at + total_duration);
    tokio::pin!(expiry);

    loop {
        tokio::select! {
            // Истечение приоритетнее тика на той же границе
            biased;
            _ = &mut expiry => break,
            _ = async { let _ = stop.wait_for(|stopped| *stopped).await; } => {
                trace_if_enabled!("Цикл #{}: получен сигнал остановки", generation);
                break;
            }
            _ = ticker.tick() => {
                let tick = ticks.fetch_add(1, Ordering::Relaxed) + 1;
                trace_if_enabled!("Цикл #{}: тик #{}", generation, tick);
                on_tick(tick).await;
            }
        }
    }

    if shared.release(generation) {
        info!(
            "Цикл #{} завершён по таймеру после {} тиков",
            generation,
            ticks.load(Ordering::Relaxed)
        );
    }
}

fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms > 0 && ms % 60_000 == 0 {
        format!("{}min", ms / 60_000)
    } else if ms % 1000 == 0 {
        format!("{}s", ms / 1000)
    } else {
        format!("{}ms", ms)
    }
}
