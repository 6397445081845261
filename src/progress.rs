//! Модуль для отслеживания прогресса сборки подкаста
//!
//! Наблюдатели ([`ProgressObserver`]) подписываются на репортер
//! ([`ProgressReporter`]), трекер ([`ProgressTracker`]) пересчитывает общий
//! прогресс по весам этапов и рассылает уведомления. Все вызовы синхронные,
//! наблюдатели вызываются в потоке сборки.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

/// Информация о прогрессе выполнения операции
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressInfo {
    /// Текущий этап
    pub step: String,
    /// Процент выполнения текущего этапа (0.0 - 100.0)
    pub step_progress: f32,
    /// Общий процент выполнения (0.0 - 100.0)
    pub total_progress: f32,
    /// Описание, например `TTS line 2/10`
    pub details: Option<String>,
}

impl ProgressInfo {
    pub fn new(
        step: impl Into<String>,
        step_progress: f32,
        total_progress: f32,
        details: Option<String>,
    ) -> Self {
        Self {
            step: step.into(),
            step_progress: step_progress.clamp(0.0, 100.0),
            total_progress: total_progress.clamp(0.0, 100.0),
            details,
        }
    }
}

/// Наблюдатель, получающий уведомления о прогрессе
pub trait ProgressObserver: Send + Sync {
    fn on_progress_update(&self, progress: ProgressInfo);
}

/// Источник уведомлений о прогрессе
pub trait ProgressReporter: Send + Sync {
    /// Добавить наблюдателя; возвращает идентификатор для удаления
    fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> usize;

    /// Удалить наблюдателя по идентификатору
    fn remove_observer(&mut self, id: usize) -> Option<Box<dyn ProgressObserver>>;

    /// Уведомить всех наблюдателей
    fn notify_progress(&self, progress: ProgressInfo);
}

/// Репортер, рассылающий уведомления наблюдателям в порядке подписки
#[derive(Default)]
pub struct DefaultProgressReporter {
    observers: RwLock<Vec<(usize, Box<dyn ProgressObserver>)>>,
    next_id: AtomicUsize,
}

impl DefaultProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.read().len()
    }
}

impl ProgressReporter for DefaultProgressReporter {
    fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> usize {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.observers.write().push((id, observer));
        id
    }

    fn remove_observer(&mut self, id: usize) -> Option<Box<dyn ProgressObserver>> {
        let mut observers = self.observers.write();
        let position = observers.iter().position(|(observer_id, _)| *observer_id == id)?;
        Some(observers.remove(position).1)
    }

    fn notify_progress(&self, progress: ProgressInfo) {
        for (_, observer) in self.observers.read().iter() {
            observer.on_progress_update(progress.clone());
        }
    }
}

/// Этапы сборки подкаста
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessStep {
    /// Проверка настроек и разбор сценария
    ScriptParsing,
    /// Озвучивание реплик, реакции и паузы
    SpeechSynthesis,
    /// Фоновая музыка
    BackgroundMusic,
    /// Сохранение файла
    Export,
}

impl ProcessStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScriptParsing => "Parsing script",
            Self::SpeechSynthesis => "Synthesizing speech",
            Self::BackgroundMusic => "Mixing background music",
            Self::Export => "Exporting audio",
        }
    }

    /// Доля этапа в общем прогрессе, в процентах
    pub fn weight(&self) -> f32 {
        match self {
            Self::ScriptParsing => 5.0,
            Self::SpeechSynthesis => 75.0,
            Self::BackgroundMusic => 10.0,
            Self::Export => 10.0,
        }
    }
}

struct TrackerState {
    step: ProcessStep,
    step_progress: f32,
    total_progress: f32,
    completed: HashMap<ProcessStep, f32>,
}

impl TrackerState {
    fn new() -> Self {
        Self {
            step: ProcessStep::ScriptParsing,
            step_progress: 0.0,
            total_progress: 0.0,
            completed: HashMap::new(),
        }
    }

    fn recompute_total(&mut self) {
        let (mut done, mut weight) = self
            .completed
            .iter()
            .filter(|(step, _)| **step != self.step)
            .fold((0.0, 0.0), |(done, weight), (step, progress)| {
                (done + step.weight() * progress / 100.0, weight + step.weight())
            });
        done += self.step.weight() * self.step_progress / 100.0;
        weight += self.step.weight();
        self.total_progress = (done / weight * 100.0).clamp(0.0, 100.0);
    }

    fn snapshot(&self, details: Option<String>) -> ProgressInfo {
        ProgressInfo::new(self.step.as_str(), self.step_progress, self.total_progress, details)
    }
}

/// Трекер прогресса одной сборки
pub struct ProgressTracker {
    reporter: Option<Box<dyn ProgressReporter>>,
    state: Mutex<TrackerState>,
}

impl ProgressTracker {
    /// Трекер без репортера: состояние считается, уведомления не отправляются
    pub fn new() -> Self {
        Self {
            reporter: None,
            state: Mutex::new(TrackerState::new()),
        }
    }

    pub fn with_reporter(reporter: Box<dyn ProgressReporter>) -> Self {
        Self {
            reporter: Some(reporter),
            state: Mutex::new(TrackerState::new()),
        }
    }

    pub fn set_reporter(&mut self, reporter: Box<dyn ProgressReporter>) {
        self.reporter = Some(reporter);
    }

    pub fn has_reporter(&self) -> bool {
        self.reporter.is_some()
    }

    /// Добавить наблюдателя; `None`, если репортер не задан
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> Option<usize> {
        self.reporter
            .as_mut()
            .map(|reporter| reporter.add_observer(observer))
    }

    /// Сбросить состояние перед новой сборкой
    pub fn reset(&self) {
        *self.state.lock() = TrackerState::new();
    }

    /// Перейти к этапу `step`; предыдущий этап считается завершенным
    pub fn set_step(&self, step: ProcessStep) {
        let info = {
            let mut state = self.state.lock();
            if state.step == step {
                return;
            }
            let previous = state.step;
            state.completed.insert(previous, 100.0);
            state.step = step;
            state.step_progress = 0.0;
            state.recompute_total();
            state.snapshot(None)
        };
        self.report(info);
    }

    /// Обновить прогресс текущего этапа (0.0 - 100.0)
    pub fn update_step_progress(&self, progress: f32, details: Option<String>) {
        let info = {
            let mut state = self.state.lock();
            state.step_progress = progress.clamp(0.0, 100.0);
            state.recompute_total();
            state.snapshot(details)
        };
        self.report(info);
    }

    /// Отметить завершение сборки
    pub fn complete(&self) {
        let info = {
            let mut state = self.state.lock();
            let step = state.step;
            state.completed.insert(step, 100.0);
            state.step_progress = 100.0;
            state.total_progress = 100.0;
            state.snapshot(Some("Done".to_string()))
        };
        self.report(info);
    }

    pub fn current_step(&self) -> ProcessStep {
        self.state.lock().step
    }

    pub fn total_progress(&self) -> f32 {
        self.state.lock().total_progress
    }

    // Наблюдатели вызываются без удержания лока
    fn report(&self, info: ProgressInfo) {
        if let Some(reporter) = &self.reporter {
            reporter.notify_progress(info);
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct TestObserver {
        updates: Arc<Mutex<Vec<ProgressInfo>>>,
    }

    impl ProgressObserver for TestObserver {
        fn on_progress_update(&self, progress: ProgressInfo) {
            self.updates.lock().push(progress);
        }
    }

    fn tracker_with_observer() -> (ProgressTracker, Arc<Mutex<Vec<ProgressInfo>>>) {
        let updates = Arc::new(Mutex::new(Vec::new()));
        let mut reporter = DefaultProgressReporter::new();
        reporter.add_observer(Box::new(TestObserver {
            updates: updates.clone(),
        }));
        (ProgressTracker::with_reporter(Box::new(reporter)), updates)
    }

    #[test]
    fn test_step_progress_and_completion() {
        let (tracker, updates) = tracker_with_observer();

        tracker.update_step_progress(50.0, None);
        tracker.set_step(ProcessStep::SpeechSynthesis);
        tracker.update_step_progress(50.0, Some("TTS line 1/1".to_string()));
        tracker.complete();

        let updates = updates.lock();
        assert_eq!(updates.len(), 4);
        assert_eq!(updates[0].step, "Parsing script");
        assert_eq!(updates[0].total_progress, 50.0);

        assert_eq!(updates[1].step, "Synthesizing speech");
        assert_eq!(updates[1].step_progress, 0.0);

        // 5% этапа разбора + половина от 75% синтеза, из 80% учтенных
        let expected = (5.0 + 37.5) / 80.0 * 100.0;
        assert!((updates[2].total_progress - expected).abs() < 1e-3);
        assert_eq!(updates[2].details.as_deref(), Some("TTS line 1/1"));

        assert_eq!(updates[3].total_progress, 100.0);
        assert_eq!(updates[3].details.as_deref(), Some("Done"));
    }

    #[test]
    fn test_same_step_is_not_reported_twice() {
        let (tracker, updates) = tracker_with_observer();
        tracker.set_step(ProcessStep::ScriptParsing);
        assert!(updates.lock().is_empty());
        assert_eq!(tracker.current_step(), ProcessStep::ScriptParsing);
    }

    #[test]
    fn test_remove_observer() {
        let mut reporter = DefaultProgressReporter::new();
        let updates = Arc::new(Mutex::new(Vec::new()));
        let id = reporter.add_observer(Box::new(TestObserver {
            updates: updates.clone(),
        }));
        assert_eq!(reporter.observer_count(), 1);
        assert!(reporter.remove_observer(id).is_some());
        assert!(reporter.remove_observer(id).is_none());

        reporter.notify_progress(ProgressInfo::new("x", 1.0, 1.0, None));
        assert!(updates.lock().is_empty());
    }

    #[test]
    fn test_tracker_without_reporter_still_tracks() {
        let mut tracker = ProgressTracker::new();
        assert!(tracker
            .add_observer(Box::new(TestObserver {
                updates: Arc::new(Mutex::new(Vec::new())),
            }))
            .is_none());
        tracker.set_step(ProcessStep::Export);
        tracker.complete();
        assert_eq!(tracker.total_progress(), 100.0);
    }
}
