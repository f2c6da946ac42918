//! Integration tests for the database layer.
//!
//! These tests verify the core database operations using an in-memory SQLite database.
//! Tests are organized by module and functionality.

use chrono::NaiveDate;
use taskdeck::db::Database;
use taskdeck::error::{ErrorCode, ErrorReport};
use taskdeck::types::{StatusFilter, SubtaskInput, SubtaskUpdate, TaskInput, TaskQuery};

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn task_input(name: &str) -> TaskInput {
    TaskInput {
        name: name.to_string(),
        ..Default::default()
    }
}

fn subtask_input(task_id: &str, group_id: Option<&str>, name: &str) -> SubtaskInput {
    SubtaskInput {
        task_id: task_id.to_string(),
        group_id: group_id.map(String::from),
        name: name.to_string(),
        ..Default::default()
    }
}

fn error_code(err: &anyhow::Error) -> ErrorCode {
    err.downcast_ref::<ErrorReport>()
        .expect("expected an ErrorReport")
        .code
}

mod task_tests {
    use super::*;

    #[test]
    fn create_task_with_defaults() {
        let db = setup_db();

        let task = db.create_task(task_input("Write report")).unwrap();

        assert_eq!(task.name, "Write report");
        assert!(task.content.is_none());
        assert!(task.due_date.is_none());
        assert!(!task.is_completed());
        assert!(task.created_at > 0);
        assert_eq!(task.created_at, task.updated_at);
    }

    #[test]
    fn create_task_rejects_blank_name() {
        let db = setup_db();

        let err = db.create_task(task_input("   ")).unwrap_err();
        assert_eq!(error_code(&err), ErrorCode::MissingRequiredField);
    }

    #[test]
    fn create_task_keeps_due_date() {
        let db = setup_db();
        let due = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();

        let task = db
            .create_task(TaskInput {
                name: "Taxes".into(),
                content: Some("  ".into()),
                due_date: Some(due),
            })
            .unwrap();

        let loaded = db.require_task(&task.id).unwrap();
        assert_eq!(loaded.due_date, Some(due));
        // Blank content is stored as absent
        assert!(loaded.content.is_none());
    }

    #[test]
    fn update_task_replaces_fields() {
        let db = setup_db();
        let task = db.create_task(task_input("Old")).unwrap();

        let updated = db
            .update_task(
                &task.id,
                TaskInput {
                    name: "New".into(),
                    content: Some("body".into()),
                    due_date: None,
                },
            )
            .unwrap();

        assert_eq!(updated.name, "New");
        assert_eq!(updated.content.as_deref(), Some("body"));
        assert!(updated.updated_at >= task.updated_at);
    }

    #[test]
    fn update_missing_task_fails() {
        let db = setup_db();

        let err = db.update_task("nope", task_input("x")).unwrap_err();
        assert_eq!(error_code(&err), ErrorCode::TaskNotFound);
    }

    #[test]
    fn toggle_task_complete_flips() {
        let db = setup_db();
        let task = db.create_task(task_input("Flip")).unwrap();

        let done = db.toggle_task_complete(&task.id).unwrap();
        assert!(done.is_completed());

        let reopened = db.toggle_task_complete(&task.id).unwrap();
        assert!(!reopened.is_completed());
    }

    #[test]
    fn delete_task_cascades() {
        let db = setup_db();
        let task = db.create_task(task_input("Doomed")).unwrap();
        let group = db.create_group(&task.id, "G", 0).unwrap();
        let sub = db
            .create_subtask(subtask_input(&task.id, Some(&group.id), "s"), 0)
            .unwrap();

        db.delete_task(&task.id).unwrap();

        assert!(db.get_task(&task.id).unwrap().is_none());
        assert!(db.get_group(&group.id).unwrap().is_none());
        assert!(db.get_subtask(&sub.id).unwrap().is_none());

        let err = db.delete_task(&task.id).unwrap_err();
        assert_eq!(error_code(&err), ErrorCode::TaskNotFound);
    }
}

mod list_tests {
    use super::*;

    #[test]
    fn search_matches_name_or_content_case_insensitively() {
        let db = setup_db();
        db.create_task(task_input("Buy MILK")).unwrap();
        db.create_task(TaskInput {
            name: "Errands".into(),
            content: Some("milk and eggs".into()),
            due_date: None,
        })
        .unwrap();
        db.create_task(task_input("Unrelated")).unwrap();

        let found = db
            .list_tasks(&TaskQuery {
                search: Some("milk".into()),
                ..Default::default()
            })
            .unwrap();

        let mut names: Vec<_> = found.iter().map(|t| t.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["Buy MILK", "Errands"]);
    }

    #[test]
    fn search_treats_wildcards_literally() {
        let db = setup_db();
        db.create_task(task_input("100% done")).unwrap();
        db.create_task(task_input("100 things")).unwrap();

        let found = db
            .list_tasks(&TaskQuery {
                search: Some("0%".into()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "100% done");
    }

    #[test]
    fn status_filter() {
        let db = setup_db();
        let open = db.create_task(task_input("open")).unwrap();
        let done = db.create_task(task_input("done")).unwrap();
        db.toggle_task_complete(&done.id).unwrap();

        let active = db
            .list_tasks(&TaskQuery {
                status: StatusFilter::Active,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, open.id);

        let completed = db
            .list_tasks(&TaskQuery {
                status: StatusFilter::Completed,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, done.id);

        let all = db.list_tasks(&TaskQuery::default()).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn tag_filter_matches_any_selected_tag() {
        let db = setup_db();
        let a = db.create_task(task_input("a")).unwrap();
        let b = db.create_task(task_input("b")).unwrap();
        let untagged = db.create_task(task_input("untagged")).unwrap();
        let work = db.create_tag("work", None).unwrap();
        let home = db.create_tag("home", Some("#f00".into())).unwrap();
        let other = db.create_tag("other", None).unwrap();

        db.add_tags_to_task(&a.id, &[work.id.clone()]).unwrap();
        db.add_tags_to_task(&b.id, &[home.id.clone(), work.id.clone()])
            .unwrap();

        let either = db
            .list_tasks(&TaskQuery {
                tag_ids: vec![work.id.clone(), home.id.clone()],
                ..Default::default()
            })
            .unwrap();
        let mut ids: Vec<_> = either.iter().map(|t| t.id.clone()).collect();
        ids.sort();
        let mut expected = vec![a.id.clone(), b.id.clone()];
        expected.sort();
        // A task carrying both tags is listed once
        assert_eq!(ids, expected);
        assert!(!ids.contains(&untagged.id));

        let home_only = db
            .list_tasks(&TaskQuery {
                tag_ids: vec![home.id.clone()],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(home_only.len(), 1);
        assert_eq!(home_only[0].id, b.id);

        let unused = db
            .list_tasks(&TaskQuery {
                tag_ids: vec![other.id.clone()],
                ..Default::default()
            })
            .unwrap();
        assert!(unused.is_empty());
    }
}

mod subtask_tests {
    use super::*;

    #[test]
    fn create_subtask_in_foreign_group_fails() {
        let db = setup_db();
        let t1 = db.create_task(task_input("one")).unwrap();
        let t2 = db.create_task(task_input("two")).unwrap();
        let g2 = db.create_group(&t2.id, "theirs", 0).unwrap();

        let err = db
            .create_subtask(subtask_input(&t1.id, Some(&g2.id), "s"), 0)
            .unwrap_err();
        assert_eq!(error_code(&err), ErrorCode::GroupNotFound);
    }

    #[test]
    fn create_subtask_for_missing_task_fails() {
        let db = setup_db();

        let err = db
            .create_subtask(subtask_input("ghost", None, "s"), 0)
            .unwrap_err();
        assert_eq!(error_code(&err), ErrorCode::TaskNotFound);
    }

    #[test]
    fn update_subtask_is_partial() {
        let db = setup_db();
        let task = db.create_task(task_input("t")).unwrap();
        let due = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let sub = db
            .create_subtask(
                SubtaskInput {
                    content: Some("notes".into()),
                    due_date: Some(due),
                    ..subtask_input(&task.id, None, "before")
                },
                0,
            )
            .unwrap();

        let renamed = db
            .update_subtask(
                &sub.id,
                SubtaskUpdate {
                    name: Some("after".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.name, "after");
        assert_eq!(renamed.content.as_deref(), Some("notes"));
        assert_eq!(renamed.due_date, Some(due));

        let cleared = db
            .update_subtask(
                &sub.id,
                SubtaskUpdate {
                    content: Some(None),
                    due_date: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(cleared.name, "after");
        assert!(cleared.content.is_none());
        assert!(cleared.due_date.is_none());
        assert_eq!(cleared.order_index, sub.order_index);
    }

    #[test]
    fn complete_and_skip_are_independent() {
        let db = setup_db();
        let task = db.create_task(task_input("t")).unwrap();
        let sub = db
            .create_subtask(subtask_input(&task.id, None, "s"), 0)
            .unwrap();

        let skipped = db.toggle_subtask_skip(&sub.id).unwrap();
        assert!(skipped.skipped);
        assert!(!skipped.is_completed());

        let both = db.toggle_subtask_complete(&sub.id).unwrap();
        assert!(both.skipped);
        assert!(both.is_completed());

        let unskipped = db.toggle_subtask_skip(&sub.id).unwrap();
        assert!(!unskipped.skipped);
        assert!(unskipped.is_completed());
    }

    #[test]
    fn toggle_missing_subtask_fails() {
        let db = setup_db();

        let err = db.toggle_subtask_skip("nope").unwrap_err();
        assert_eq!(error_code(&err), ErrorCode::SubtaskNotFound);
    }
}

mod group_tests {
    use super::*;

    #[test]
    fn rename_group() {
        let db = setup_db();
        let task = db.create_task(task_input("t")).unwrap();
        let group = db.create_group(&task.id, "Draft", 0).unwrap();

        let renamed = db.rename_group(&group.id, "Final").unwrap();
        assert_eq!(renamed.name, "Final");
        assert_eq!(renamed.order_index, 0);

        let err = db.rename_group(&group.id, "").unwrap_err();
        assert_eq!(error_code(&err), ErrorCode::MissingRequiredField);
    }

    #[test]
    fn deleting_group_row_removes_its_subtasks() {
        let db = setup_db();
        let task = db.create_task(task_input("t")).unwrap();
        let group = db.create_group(&task.id, "G", 0).unwrap();
        db.create_subtask(subtask_input(&task.id, Some(&group.id), "in"), 0)
            .unwrap();
        let loose = db
            .create_subtask(subtask_input(&task.id, None, "out"), 0)
            .unwrap();

        db.delete_group_row(&group.id).unwrap();

        let remaining = db.list_subtasks(&task.id).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, loose.id);
    }
}

mod tag_tests {
    use super::*;

    #[test]
    fn tag_names_are_unique() {
        let db = setup_db();
        db.create_tag("home", None).unwrap();

        let err = db.create_tag("home", None).unwrap_err();
        assert_eq!(error_code(&err), ErrorCode::AlreadyExists);
    }

    #[test]
    fn find_and_update_tag() {
        let db = setup_db();
        let tag = db.create_tag("home", None).unwrap();

        let found = db.find_tag_by_name("home").unwrap().unwrap();
        assert_eq!(found.id, tag.id);

        let updated = db
            .update_tag(&tag.id, "house", Some("#0f0".into()))
            .unwrap();
        assert_eq!(updated.name, "house");
        assert_eq!(updated.color.as_deref(), Some("#0f0"));
        assert!(db.find_tag_by_name("home").unwrap().is_none());
    }

    #[test]
    fn attach_detach_and_set() {
        let db = setup_db();
        let task = db.create_task(task_input("t")).unwrap();
        let a = db.create_tag("a", None).unwrap();
        let b = db.create_tag("b", None).unwrap();
        let c = db.create_tag("c", None).unwrap();

        db.add_tags_to_task(&task.id, &[a.id.clone(), b.id.clone()])
            .unwrap();
        // Attaching twice is a no-op
        db.add_tags_to_task(&task.id, &[a.id.clone()]).unwrap();
        let names: Vec<_> = db
            .tags_for_task(&task.id)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);

        db.remove_tags_from_task(&task.id, &[a.id.clone()]).unwrap();
        assert_eq!(db.tags_for_task(&task.id).unwrap().len(), 1);

        db.set_task_tags(&task.id, &[c.id.clone(), a.id.clone()])
            .unwrap();
        let names: Vec<_> = db
            .tags_for_task(&task.id)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["a", "c"]);

        db.remove_tags_from_task(&task.id, &[]).unwrap();
        assert!(db.tags_for_task(&task.id).unwrap().is_empty());
    }

    #[test]
    fn set_task_tags_is_all_or_nothing() {
        let db = setup_db();
        let task = db.create_task(task_input("t")).unwrap();
        let a = db.create_tag("a", None).unwrap();
        db.add_tags_to_task(&task.id, &[a.id.clone()]).unwrap();

        let err = db
            .set_task_tags(&task.id, &["missing".to_string()])
            .unwrap_err();
        assert_eq!(error_code(&err), ErrorCode::TagNotFound);
        assert_eq!(db.tags_for_task(&task.id).unwrap().len(), 1);
    }

    #[test]
    fn deleting_tag_detaches_it() {
        let db = setup_db();
        let task = db.create_task(task_input("t")).unwrap();
        let tag = db.create_tag("gone", None).unwrap();
        db.add_tags_to_task(&task.id, &[tag.id.clone()]).unwrap();

        db.delete_tag(&tag.id).unwrap();

        assert!(db.tags_for_task(&task.id).unwrap().is_empty());
        assert!(db.list_tags().unwrap().is_empty());
    }
}

mod detail_tests {
    use super::*;

    #[test]
    fn detail_groups_subtasks_in_order() {
        let db = setup_db();
        let task = db.create_task(task_input("t")).unwrap();
        let g0 = db.create_group(&task.id, "first", 0).unwrap();
        let g1 = db.create_group(&task.id, "second", 1).unwrap();
        let u1 = db.create_subtask(subtask_input(&task.id, None, "u1"), 1).unwrap();
        let u0 = db.create_subtask(subtask_input(&task.id, None, "u0"), 0).unwrap();
        let a = db
            .create_subtask(subtask_input(&task.id, Some(&g1.id), "a"), 0)
            .unwrap();
        let tag = db.create_tag("x", None).unwrap();
        db.add_tags_to_task(&task.id, &[tag.id.clone()]).unwrap();

        let detail = db.get_task_detail(&task.id).unwrap();

        assert_eq!(detail.task.id, task.id);
        assert_eq!(detail.tags.len(), 1);
        let ungrouped: Vec<_> = detail.ungrouped.iter().map(|s| s.id.clone()).collect();
        assert_eq!(ungrouped, vec![u0.id, u1.id]);
        let groups: Vec<_> = detail.groups.iter().map(|g| g.group.id.clone()).collect();
        assert_eq!(groups, vec![g0.id, g1.id]);
        assert!(detail.groups[0].subtasks.is_empty());
        assert_eq!(detail.groups[1].subtasks[0].id, a.id);
    }

    #[test]
    fn progress_ignores_skipped() {
        let db = setup_db();
        let task = db.create_task(task_input("t")).unwrap();
        let s0 = db.create_subtask(subtask_input(&task.id, None, "a"), 0).unwrap();
        let s1 = db.create_subtask(subtask_input(&task.id, None, "b"), 1).unwrap();
        db.create_subtask(subtask_input(&task.id, None, "c"), 2).unwrap();

        db.toggle_subtask_complete(&s0.id).unwrap();
        db.toggle_subtask_skip(&s1.id).unwrap();

        let progress = db.get_task_detail(&task.id).unwrap().progress();
        assert_eq!(progress.completed, 1);
        assert_eq!(progress.total, 2);
    }
}

mod copy_tests {
    use super::*;

    #[test]
    fn copy_task_duplicates_structure_densely() {
        let db = setup_db();
        let task = db
            .create_task(TaskInput {
                name: "Trip".into(),
                content: Some("pack".into()),
                due_date: None,
            })
            .unwrap();
        db.toggle_task_complete(&task.id).unwrap();
        let tag = db.create_tag("travel", None).unwrap();
        db.add_tags_to_task(&task.id, &[tag.id.clone()]).unwrap();

        // Gapped indices on purpose
        let g_late = db.create_group(&task.id, "late", 7).unwrap();
        db.create_group(&task.id, "early", 2).unwrap();
        let s_b = db
            .create_subtask(subtask_input(&task.id, Some(&g_late.id), "b"), 9)
            .unwrap();
        db.create_subtask(subtask_input(&task.id, Some(&g_late.id), "a"), 4)
            .unwrap();
        db.toggle_subtask_complete(&s_b.id).unwrap();
        db.toggle_subtask_skip(&s_b.id).unwrap();
        db.create_subtask(subtask_input(&task.id, None, "loose"), 5)
            .unwrap();

        let copy = db.copy_task(&task.id).unwrap();
        assert_eq!(copy.name, "Trip (Copy)");
        assert_eq!(copy.content.as_deref(), Some("pack"));
        assert!(!copy.is_completed());

        let detail = db.get_task_detail(&copy.id).unwrap();
        assert!(detail.tags.is_empty());

        let groups: Vec<_> = detail
            .groups
            .iter()
            .map(|g| (g.group.name.as_str(), g.group.order_index))
            .collect();
        assert_eq!(groups, vec![("early", 0), ("late", 1)]);

        let late: Vec<_> = detail.groups[1]
            .subtasks
            .iter()
            .map(|s| (s.name.as_str(), s.order_index))
            .collect();
        assert_eq!(late, vec![("a", 0), ("b", 1)]);
        assert!(detail.subtasks().all(|s| !s.is_completed() && !s.skipped));

        assert_eq!(detail.ungrouped.len(), 1);
        assert_eq!(detail.ungrouped[0].order_index, 0);

        // Original untouched
        let original = db.get_task_detail(&task.id).unwrap();
        assert!(original.task.is_completed());
        assert_eq!(original.tags.len(), 1);
    }

    #[test]
    fn copy_missing_task_fails() {
        let db = setup_db();

        let err = db.copy_task("nope").unwrap_err();
        assert_eq!(error_code(&err), ErrorCode::TaskNotFound);
    }
}

mod quote_tests {
    use super::*;

    #[test]
    fn random_quote_is_none_without_quotes() {
        let db = setup_db();

        assert!(db.random_quote().unwrap().is_none());
        assert!(db.list_quotes().unwrap().is_empty());
    }

    #[test]
    fn add_list_and_pick_quotes() {
        let db = setup_db();
        let first = db.add_quote("  Well begun is half done. ").unwrap();
        let second = db.add_quote("One thing at a time.").unwrap();
        assert_eq!(first.quote_text, "Well begun is half done.");

        let all = db.list_quotes().unwrap();
        let ids: Vec<_> = all.iter().map(|q| q.id.clone()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&first.id) && ids.contains(&second.id));

        for _ in 0..10 {
            let picked = db.random_quote().unwrap().unwrap();
            assert!(ids.contains(&picked.id));
        }
    }

    #[test]
    fn blank_quote_is_rejected() {
        let db = setup_db();

        let err = db.add_quote("   ").unwrap_err();
        assert_eq!(error_code(&err), ErrorCode::MissingRequiredField);
    }

    #[test]
    fn delete_quote() {
        let db = setup_db();
        let quote = db.add_quote("Gone soon.").unwrap();

        db.delete_quote(&quote.id).unwrap();
        assert!(db.random_quote().unwrap().is_none());

        let err = db.delete_quote(&quote.id).unwrap_err();
        assert_eq!(error_code(&err), ErrorCode::QuoteNotFound);
    }
}
