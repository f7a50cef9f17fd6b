use techmate::roadmap::{ModuleStatus, ProgressError, RoadmapProgress};
use techmate::schema::RoadmapModule;

use ModuleStatus::{Completed, Current, Locked};

fn module(id: u32, xp: u32) -> RoadmapModule {
    RoadmapModule {
        id,
        title: format!("Module {}", id),
        description: "Learn things".into(),
        xp,
        duration: "1h 00m".into(),
        topics: vec!["one".into(), "two".into(), "three".into(), "four".into()],
    }
}

fn roadmap() -> RoadmapProgress {
    RoadmapProgress::new(vec![module(1, 100), module(2, 150), module(3, 250)])
}

#[test]
fn only_first_module_starts_current() {
    let progress = roadmap();
    assert_eq!(progress.statuses(), vec![Current, Locked, Locked]);
    assert_eq!(progress.current_index(), Some(0));
    assert_eq!(progress.earned_xp(), 0);
    assert_eq!(progress.total_xp(), 500);
}

#[test]
fn completing_current_unlocks_next() {
    let mut progress = roadmap();
    progress.complete(0).unwrap();
    assert_eq!(progress.statuses(), vec![Completed, Current, Locked]);
    assert_eq!(progress.current_index(), Some(1));
    assert_eq!(progress.earned_xp(), 100);
}

#[test]
fn progress_counts_completed_modules() {
    let mut progress = roadmap();
    assert_eq!((progress.completed_count(), progress.progress_percent()), (0, 0));

    progress.complete(0).unwrap();
    assert_eq!((progress.completed_count(), progress.progress_percent()), (1, 33));

    progress.complete(1).unwrap();
    assert_eq!(progress.progress_percent(), 66);

    progress.complete(2).unwrap();
    assert_eq!((progress.completed_count(), progress.progress_percent()), (3, 100));

    assert_eq!(RoadmapProgress::new(Vec::new()).progress_percent(), 0);
}

#[test]
fn locked_and_completed_modules_cannot_be_completed() {
    let mut progress = roadmap();
    assert_eq!(progress.complete(2), Err(ProgressError::NotCurrent { index: 2, status: Locked }));

    progress.complete(0).unwrap();
    assert_eq!(progress.complete(0), Err(ProgressError::NotCurrent { index: 0, status: Completed }));
    assert_eq!(progress.statuses(), vec![Completed, Current, Locked]);
}

#[test]
fn out_of_range_index_is_rejected() {
    let mut progress = roadmap();
    assert_eq!(progress.complete(7), Err(ProgressError::NoSuchModule(7)));
}

#[test]
fn completing_every_module_finishes_roadmap() {
    let mut progress = roadmap();
    for i in 0..3 {
        assert!(!progress.is_finished());
        progress.complete(i).unwrap();
    }
    assert!(progress.is_finished());
    assert_eq!(progress.current_index(), None);
    assert_eq!(progress.earned_xp(), progress.total_xp());
}

#[test]
fn tracked_module_serializes_flat_with_status() {
    let progress = roadmap();
    let value = serde_json::to_value(&progress.modules()[0]).unwrap();
    assert_eq!(value["status"], "current");
    assert_eq!(value["xp"], 100);
    assert_eq!(value["title"], "Module 1");
}
