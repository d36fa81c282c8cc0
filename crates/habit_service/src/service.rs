use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use habit_core::{current_streak, is_due, CompletionLookup, Habit};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::{
    dashboard::{Dashboard, DashboardOptions},
    reminders::{ReminderRequest, ReminderSink},
    snapshot::{Snapshot, SnapshotFile},
};

/// State shared with the filesystem watcher callback.
struct Shared {
    roots: RwLock<Vec<PathBuf>>,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl Shared {
    fn reload(&self) -> Result<()> {
        let roots = self.roots.read().clone();
        let snapshot = load_roots(&roots)?;
        *self.snapshot.write() = Arc::new(snapshot);
        Ok(())
    }
}

pub struct HabitService {
    shared: Arc<Shared>,
    watcher: Option<RecommendedWatcher>,
    reminder_sink: Option<Box<dyn ReminderSink>>,
}

pub struct HabitServiceBuilder {
    roots: Vec<PathBuf>,
    snapshot: Option<Snapshot>,
    reminder_sink: Option<Box<dyn ReminderSink>>,
}

impl HabitServiceBuilder {
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            snapshot: None,
            reminder_sink: None,
        }
    }

    /// Register a snapshot file or a directory of snapshot files.
    pub fn add_root(mut self, path: impl AsRef<Path>) -> Self {
        Self::push_unique(&mut self.roots, path.as_ref().to_path_buf());
        self
    }

    /// Start from an in-memory snapshot instead of reading roots, for hosts
    /// that fetch habits and completions from elsewhere.
    pub fn with_snapshot(mut self, snapshot: Snapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn with_reminder_sink(mut self, sink: Box<dyn ReminderSink>) -> Self {
        self.reminder_sink = Some(sink);
        self
    }

    pub fn build(self) -> Result<HabitService> {
        let snapshot = match self.snapshot {
            Some(snapshot) => snapshot,
            None => load_roots(&self.roots)?,
        };
        Ok(HabitService {
            shared: Arc::new(Shared {
                roots: RwLock::new(self.roots),
                snapshot: RwLock::new(Arc::new(snapshot)),
            }),
            watcher: None,
            reminder_sink: self.reminder_sink,
        })
    }

    fn push_unique(vec: &mut Vec<PathBuf>, path: PathBuf) {
        if !vec.contains(&path) {
            vec.push(path);
        }
    }
}

impl Default for HabitServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HabitService {
    pub fn builder() -> HabitServiceBuilder {
        HabitServiceBuilder::new()
    }

    pub fn roots(&self) -> Vec<PathBuf> {
        let mut roots = self.shared.roots.read().clone();
        roots.sort();
        roots
    }

    pub fn add_root(&mut self, path: PathBuf) -> Result<()> {
        anyhow::ensure!(path.exists(), "habit root `{}` does not exist", path.display());
        let mut candidate = self.shared.roots.read().clone();
        if candidate.contains(&path) {
            return Ok(());
        }
        candidate.push(path.clone());
        // a root that fails to load is never registered
        let snapshot = load_roots(&candidate)?;
        info!(path = %path.display(), "registering root");
        *self.shared.roots.write() = candidate;
        *self.shared.snapshot.write() = Arc::new(snapshot);
        self.watch_path(&path)?;
        Ok(())
    }

    /// Re-read every root and publish the result as the new snapshot.
    pub fn reload_all(&self) -> Result<()> {
        self.shared.reload()
    }

    /// Publish a snapshot supplied by the host.
    pub fn replace_snapshot(&self, snapshot: Snapshot) {
        *self.shared.snapshot.write() = Arc::new(snapshot);
    }

    /// The current snapshot. Holding the returned `Arc` keeps habits and
    /// completions consistent even if a reload happens meanwhile.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.shared.snapshot.read())
    }

    pub fn habits(&self) -> Vec<Habit> {
        self.snapshot().habits().to_vec()
    }

    /// Active habits due on `date`, in snapshot order.
    pub fn due_on(&self, date: NaiveDate) -> Vec<Habit> {
        self.snapshot()
            .active_habits()
            .filter(|habit| is_due(habit, date))
            .cloned()
            .collect()
    }

    pub fn dashboard(&self, as_of: NaiveDate, options: &DashboardOptions) -> Dashboard {
        let snapshot = self.snapshot();
        Dashboard::compute(&snapshot, as_of, options)
    }

    /// Ask the reminder sink to nudge for every active habit due on `date`
    /// that is still open, and clear reminders for the ones already done.
    /// Returns the number of reminders scheduled.
    pub fn schedule_reminders(&self, date: NaiveDate, at: NaiveTime) -> usize {
        let Some(sink) = &self.reminder_sink else {
            return 0;
        };
        let snapshot = self.snapshot();
        let when = Utc.from_utc_datetime(&date.and_time(at));
        let mut scheduled = 0;
        for habit in snapshot.active_habits().filter(|habit| is_due(habit, date)) {
            if snapshot.index().is_completed(&habit.id, date) {
                sink.clear_for_habit(habit);
                continue;
            }
            // today is still open, so the streak at stake runs through yesterday
            let streak = date
                .pred_opt()
                .map_or(0, |yesterday| current_streak(habit, snapshot.index(), yesterday));
            let body = if streak > 0 {
                format!("Due on {} (keep your {}-day streak)", date, streak)
            } else {
                format!("Due on {}", date)
            };
            sink.schedule(ReminderRequest {
                habit_id: habit.id.clone(),
                title: format!("Habit: {}", habit.name),
                body,
                scheduled_for: when,
            });
            scheduled += 1;
        }
        scheduled
    }

    pub fn watch(&mut self) -> Result<()> {
        if self.watcher.is_some() {
            return Ok(());
        }
        let shared = Arc::clone(&self.shared);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) if Self::is_content_change(&event.kind) => {
                    debug!(?event, "snapshot change detected");
                    if let Err(err) = shared.reload() {
                        warn!(%err, "failed to reload habit snapshot");
                    }
                }
                Ok(_) => {}
                Err(err) => warn!(%err, "filesystem watcher error"),
            }
        })?;
        for root in self.shared.roots.read().iter() {
            watcher.watch(root, Self::watch_mode(root))?;
        }
        self.watcher = Some(watcher);
        Ok(())
    }
}

impl HabitService {
    fn watch_path(&mut self, path: &Path) -> Result<()> {
        if let Some(watcher) = &mut self.watcher {
            watcher.watch(path, Self::watch_mode(path))?;
        }
        Ok(())
    }

    fn watch_mode(path: &Path) -> RecursiveMode {
        if root_is_file(path) {
            RecursiveMode::NonRecursive
        } else {
            RecursiveMode::Recursive
        }
    }

    fn is_content_change(kind: &EventKind) -> bool {
        matches!(
            kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        )
    }
}

/// Read every snapshot file reachable from `roots`, in a stable order.
#[instrument(skip(roots), fields(root_count = roots.len()))]
pub fn load_roots(roots: &[PathBuf]) -> Result<Snapshot> {
    let mut files = Vec::new();
    for root in roots {
        ingest_root(&mut files, root)?;
    }
    debug!(file_count = files.len(), "loaded snapshot files");
    Ok(Snapshot::merge(files))
}

fn ingest_root(files: &mut Vec<(PathBuf, SnapshotFile)>, path: &Path) -> Result<()> {
    if path.is_file() {
        if is_snapshot_file(path) {
            files.push((path.to_path_buf(), SnapshotFile::load(path)?));
        }
        return Ok(());
    }

    if path.is_dir() {
        let mut paths = Vec::new();
        for entry in WalkDir::new(path) {
            let entry = entry.with_context(|| format!("failed to walk `{}`", path.display()))?;
            if entry.file_type().is_file() && is_snapshot_file(entry.path()) {
                paths.push(entry.into_path());
            }
        }
        paths.sort();
        for entry_path in paths {
            let file = SnapshotFile::load(&entry_path)?;
            files.push((entry_path, file));
        }
    }
    Ok(())
}

fn root_is_file(path: &Path) -> bool {
    is_snapshot_file(path) || path.is_file()
}

fn is_snapshot_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use habit_core::{Frequency, HabitCompletion};
    use parking_lot::Mutex;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[derive(Default)]
    struct RecordingSink {
        scheduled: Mutex<Vec<ReminderRequest>>,
        cleared: Mutex<Vec<String>>,
    }

    impl ReminderSink for Arc<RecordingSink> {
        fn schedule(&self, reminder: ReminderRequest) {
            self.scheduled.lock().push(reminder);
        }

        fn clear_for_habit(&self, habit: &Habit) {
            self.cleared.lock().push(habit.id.clone());
        }
    }

    fn in_memory(sink: Option<Arc<RecordingSink>>) -> HabitService {
        let created = date(2025, 10, 1);
        let snapshot = Snapshot::new(
            vec![
                Habit::new("read", "Read", Frequency::Daily, created),
                Habit::new("swim", "Swim", Frequency::Alternate, created),
                Habit::new("walk", "Walk", Frequency::Daily, created),
                Habit::new("old", "Old", Frequency::Daily, created).deactivated(),
            ],
            vec![
                HabitCompletion::new("read", date(2025, 10, 4)),
                HabitCompletion::new("walk", date(2025, 10, 5)),
                HabitCompletion::new("walk", date(2025, 10, 4)),
            ],
        );
        let mut builder = HabitService::builder().with_snapshot(snapshot);
        if let Some(sink) = sink {
            builder = builder.with_reminder_sink(Box::new(sink));
        }
        builder.build().expect("build service")
    }

    #[test]
    fn due_on_lists_active_due_habits() {
        let service = in_memory(None);
        let due: Vec<_> = service
            .due_on(date(2025, 10, 5))
            .into_iter()
            .map(|habit| habit.id)
            .collect();
        assert_eq!(due, vec!["read", "swim", "walk"]);
        let due: Vec<_> = service
            .due_on(date(2025, 10, 4))
            .into_iter()
            .map(|habit| habit.id)
            .collect();
        assert_eq!(due, vec!["read", "walk"]);
    }

    #[test]
    fn reminders_cover_open_due_habits() {
        let sink = Arc::new(RecordingSink::default());
        let service = in_memory(Some(Arc::clone(&sink)));
        let at = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let scheduled = service.schedule_reminders(date(2025, 10, 5), at);
        assert_eq!(scheduled, 2);

        let reminders = sink.scheduled.lock();
        let ids: Vec<_> = reminders.iter().map(|r| r.habit_id.as_str()).collect();
        assert_eq!(ids, vec!["read", "swim"]);
        assert!(reminders[0].body.contains("1-day streak"));
        assert_eq!(reminders[1].body, "Due on 2025-10-05");
        assert_eq!(
            reminders[0].scheduled_for,
            Utc.with_ymd_and_hms(2025, 10, 5, 9, 0, 0).unwrap()
        );
        assert_eq!(*sink.cleared.lock(), vec!["walk".to_string()]);
    }

    #[test]
    fn reminders_without_sink_are_a_no_op() {
        let service = in_memory(None);
        let at = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(service.schedule_reminders(date(2025, 10, 5), at), 0);
    }

    #[test]
    fn captured_snapshot_survives_replacement() {
        let service = in_memory(None);
        let before = service.snapshot();
        service.replace_snapshot(Snapshot::default());
        assert_eq!(before.habits().len(), 4);
        assert!(service.habits().is_empty());
    }

    #[test]
    fn recognises_snapshot_files_by_extension() {
        assert!(is_snapshot_file(Path::new("habits.json")));
        assert!(is_snapshot_file(Path::new("HABITS.JSON")));
        assert!(!is_snapshot_file(Path::new("habits.org")));
        assert!(!is_snapshot_file(Path::new("habits")));
    }
}
