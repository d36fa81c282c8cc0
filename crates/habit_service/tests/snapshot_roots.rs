use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use habit_core::{Frequency, Granularity};
use habit_service::{DashboardOptions, HabitService};
use tempfile::tempdir;

fn write_file(path: &PathBuf, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, contents).expect("write fixture");
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn dashboard_from_snapshot_directory() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path();

    write_file(
        &root.join("habits.json"),
        r#"{
  "habits": [
    { "id": "read", "name": "Read", "frequencyType": "daily",
      "createdAt": "2025-10-01T08:00:00Z", "isActive": true },
    { "id": "gym", "name": "Gym", "frequencyType": "custom",
      "customDays": ["monday", "wednesday", "friday"],
      "createdAt": "2025-10-01T08:00:00Z", "isActive": true },
    { "id": "piano", "name": "Piano", "frequencyType": "alternate",
      "createdAt": "2025-10-02T19:30:00+02:00", "isActive": true },
    { "id": "smoke", "name": "Quit", "frequencyType": "daily",
      "createdAt": "2025-09-01", "isActive": false }
  ]
}"#,
    );
    write_file(
        &root.join("2025/10/completions.json"),
        r#"{
  "completions": [
    { "habitId": "read", "completionDate": "2025-10-18" },
    { "habitId": "read", "completionDate": "2025-10-19" },
    { "habitId": "read", "completionDate": "2025-10-20" },
    { "habitId": "read", "completionDate": "2025-10-20", "notes": "double tap" },
    { "habitId": "gym", "completionDate": "2025-10-17" },
    { "habitId": "gym", "completionDate": "2025-10-20" },
    { "habitId": "piano", "completionDate": "2025-10-20" },
    { "habitId": "deleted-habit", "completionDate": "2025-10-20" }
  ]
}"#,
    );
    write_file(&root.join("notes.txt"), "not a snapshot");

    let service = HabitService::builder()
        .add_root(root)
        .build()
        .expect("build habit service");

    let snapshot = service.snapshot();
    assert_eq!(snapshot.habits().len(), 4);
    assert_eq!(snapshot.completions().len(), 8);
    assert!(matches!(
        snapshot.habit("gym").map(|habit| &habit.frequency),
        Some(Frequency::Custom(days)) if days.len() == 3
    ));

    // Monday 2025-10-20
    let as_of = date(2025, 10, 20);
    let due: Vec<_> = service.due_on(as_of).into_iter().map(|h| h.id).collect();
    assert_eq!(due, vec!["read", "gym", "piano"]);

    let options = DashboardOptions {
        window_days: 7,
        granularity: Granularity::Day,
        ..DashboardOptions::default()
    };
    let dashboard = service.dashboard(as_of, &options);
    assert_eq!(dashboard.habits.len(), 3);

    let read = dashboard.habits.iter().find(|s| s.id == "read").unwrap();
    assert_eq!(read.current_streak, 3);
    assert_eq!(read.totals.planned, 7);
    assert_eq!(read.totals.completed, 3);

    let gym = dashboard.habits.iter().find(|s| s.id == "gym").unwrap();
    // Friday 17th and Monday 20th done, Wednesday 15th missed
    assert_eq!(gym.current_streak, 2);
    assert_eq!(gym.totals.planned, 3);

    let piano = dashboard.habits.iter().find(|s| s.id == "piano").unwrap();
    assert!(piano.due_today && piano.completed_today);
    assert_eq!(piano.current_streak, 1);

    assert_eq!(dashboard.trend.len(), 7);
    assert_eq!(dashboard.trend.last().unwrap().rate, 100.0);
    assert_eq!(dashboard.abandoned.first().map(|entry| entry.id.as_str()), Some("piano"));
}

#[test]
fn reload_picks_up_new_completions() {
    let temp = tempdir().expect("tempdir");
    let file = temp.path().join("snapshot.json");
    write_file(
        &file,
        r#"{"habits": [{"id": "read", "frequency_type": "daily", "created_at": "2025-10-01"}]}"#,
    );

    let service = HabitService::builder()
        .add_root(&file)
        .build()
        .expect("build habit service");
    let as_of = date(2025, 10, 2);
    let before = service.snapshot();
    let dashboard = service.dashboard(as_of, &DashboardOptions::default());
    assert_eq!(dashboard.habits[0].current_streak, 0);

    write_file(
        &file,
        r#"{"habits": [{"id": "read", "frequency_type": "daily", "created_at": "2025-10-01"}],
            "completions": [{"habit_id": "read", "completion_date": "2025-10-01"},
                            {"habit_id": "read", "completion_date": "2025-10-02"}]}"#,
    );
    service.reload_all().expect("reload");

    let dashboard = service.dashboard(as_of, &DashboardOptions::default());
    assert_eq!(dashboard.habits[0].current_streak, 2);
    assert!(before.completions().is_empty(), "earlier snapshot is untouched");
}

#[test]
fn malformed_snapshot_reports_the_file() {
    let temp = tempdir().expect("tempdir");
    let file = temp.path().join("broken.json");
    write_file(&file, "{ not json");

    let err = match HabitService::builder().add_root(&file).build() {
        Ok(_) => panic!("broken snapshot should fail to load"),
        Err(err) => err,
    };
    assert!(format!("{err:#}").contains("broken.json"));
}

#[test]
fn add_root_rejects_missing_paths() {
    let temp = tempdir().expect("tempdir");
    let mut service = HabitService::builder().build().expect("empty service");
    assert!(service.habits().is_empty());
    assert!(service.add_root(temp.path().join("missing")).is_err());

    let extra = temp.path().join("extra.json");
    write_file(
        &extra,
        r#"{"habits": [{"id": "walk", "frequency_type": "daily", "created_at": "2025-10-01"}]}"#,
    );
    service.add_root(extra.clone()).expect("add root");
    assert_eq!(service.roots(), vec![extra]);
    assert_eq!(service.habits().len(), 1);
}

#[test]
fn failed_add_root_leaves_service_reloadable() {
    let temp = tempdir().expect("tempdir");
    let good = temp.path().join("good.json");
    write_file(
        &good,
        r#"{"habits": [{"id": "read", "frequency_type": "daily", "created_at": "2025-10-01"}]}"#,
    );
    let bad = temp.path().join("bad.json");
    write_file(&bad, "{ not json");

    let mut service = HabitService::builder()
        .add_root(&good)
        .build()
        .expect("build habit service");
    let err = service.add_root(bad).expect_err("bad root should fail to load");
    assert!(format!("{err:#}").contains("bad.json"));

    assert_eq!(service.roots(), vec![good]);
    assert_eq!(service.habits().len(), 1);
    service.reload_all().expect("reload after rejected root");
}
