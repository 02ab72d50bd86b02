use chrono::{TimeZone, Utc};
use lms_activity_core::config::ExtractorConfig;
use lms_activity_core::db::open_db_in_memory;
use lms_activity_core::{
    ActivityFilter, ActivityService, ActivitySource, ActivityStatus, ActivityType,
    ExtractedActivity, Extractor, HtmlPage, NewActivity, Priority, SqliteActivityRepository,
};

fn extracted(title: &str, source: ActivitySource) -> ExtractedActivity {
    ExtractedActivity {
        title: title.to_string(),
        kind: ActivityType::Quiz,
        deadline: Utc.with_ymd_and_hms(2025, 4, 2, 23, 59, 59).unwrap(),
        url: String::new(),
        description: String::new(),
        source,
    }
}

#[test]
fn import_stores_pending_medium_records_and_counts_failures() {
    let conn = open_db_in_memory().unwrap();
    let service = ActivityService::new(SqliteActivityRepository::new(&conn));

    let items = vec![
        extracted("Quiz 5", ActivitySource::LmsExtracted),
        extracted("", ActivitySource::LmsTable),
        extracted("Quiz 6", ActivitySource::LmsTable),
    ];
    let report = service.import_extracted(7, &items);

    assert_eq!(report.imported_count(), 2);
    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.failed[0].title, "");

    let stored = service
        .list_activities(7, &ActivityFilter::default())
        .unwrap();
    assert_eq!(stored.len(), 2);
    for activity in &stored {
        assert_eq!(activity.status, ActivityStatus::Pending);
        assert_eq!(activity.priority, Priority::Medium);
        assert!(activity.url.is_none());
    }
    assert!(stored
        .iter()
        .any(|activity| activity.title == "Quiz 6" && activity.source == ActivitySource::LmsTable));
}

#[test]
fn extracted_page_imports_end_to_end() {
    let html = r#"
        <ul class="section">
          <li class="activity modtype_assign">
            <a href="/mod/assign/view.php?id=11"><span class="instancename">Lab Report 1</span></a>
            <div class="due-date">Due: 2025-03-15</div>
          </li>
        </ul>"#;
    let page = HtmlPage::parse(html, "https://lms.example.edu/course/view.php?id=3");
    let found = Extractor::new(ExtractorConfig::utc()).extract(&page.accessor());
    assert!(!found.is_empty());

    let conn = open_db_in_memory().unwrap();
    let service = ActivityService::new(SqliteActivityRepository::new(&conn));
    let report = service.import_extracted(1, &found);
    assert_eq!(report.failed_count(), 0);

    let stored = &report.imported[0];
    assert_eq!(stored.title, "Lab Report 1");
    assert_eq!(stored.kind, ActivityType::Assignment);
    assert_eq!(
        stored.url.as_deref(),
        Some("https://lms.example.edu/mod/assign/view.php?id=11")
    );
    assert_eq!(
        lms_activity_core::model::timestamp::format(&stored.deadline),
        "2025-03-15T23:59:59.999Z"
    );
}

#[test]
fn manual_add_goes_through_validation() {
    let conn = open_db_in_memory().unwrap();
    let service = ActivityService::new(SqliteActivityRepository::new(&conn));

    let deadline = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
    let added = service
        .add_activity(3, &NewActivity::new("Final Exam", ActivityType::Exam, deadline))
        .unwrap();
    assert_eq!(added.source, ActivitySource::Manual);
    assert!(service.add_activity(3, &NewActivity::new(" ", ActivityType::Exam, deadline)).is_err());

    let loaded = service.get_activity(3, added.id).unwrap().unwrap();
    assert_eq!(loaded.deadline, deadline);
    service.delete_activity(3, added.id).unwrap();
    assert!(service.get_activity(3, added.id).unwrap().is_none());
}
