use chrono::NaiveDateTime;
use gantt_core::db::open_db_in_memory;
use gantt_core::model::plan_date::parse_plan_date;
use gantt_core::{
    AccessPolicy, AllowAll, BasicHtmlSanitizer, ChartError, ChartService, Item, ItemId, ItemType,
    LinkType, NewLink, NewProject, NewTask, ParentRef, Project, ProjectId, ProjectScope,
    SqliteLinkRepository, SqliteProjectRepository, SqliteTaskRepository, Task, TaskId,
};
use gantt_core::{LinkRepository, ProjectRepository, TaskRepository};
use rusqlite::Connection;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn plan_date(value: &str) -> NaiveDateTime {
    parse_plan_date(value).unwrap()
}

fn reference_time() -> NaiveDateTime {
    plan_date("2024-06-01 08:00:00")
}

fn chart_service(
    conn: &Connection,
) -> ChartService<
    SqliteProjectRepository<'_>,
    SqliteTaskRepository<'_>,
    SqliteLinkRepository<'_>,
    AllowAll,
    BasicHtmlSanitizer,
> {
    ChartService::new(
        SqliteProjectRepository::new(conn),
        SqliteTaskRepository::new(conn),
        SqliteLinkRepository::new(conn),
        AllowAll,
        BasicHtmlSanitizer,
    )
}

fn seed_project(conn: &Connection, name: &str, parent_id: Option<ProjectId>) -> Project {
    SqliteProjectRepository::new(conn)
        .create_project(&NewProject {
            name: name.to_string(),
            parent_id,
            show_on_global_view: true,
            ..Default::default()
        })
        .unwrap()
}

fn seed_task(
    conn: &Connection,
    project_id: ProjectId,
    parent_task_id: Option<TaskId>,
    name: &str,
) -> Task {
    SqliteTaskRepository::new(conn)
        .create_task(&NewTask {
            project_id,
            parent_task_id,
            name: name.to_string(),
            ..Default::default()
        })
        .unwrap()
}

fn item_ids(items: &[Item]) -> Vec<ItemId> {
    items.iter().map(|item| item.id).collect()
}

#[test]
fn project_walk_emits_preorder_with_tasks_before_subprojects() {
    let conn = setup();
    let project = seed_project(&conn, "Main", None);
    let task_a = seed_task(&conn, project.id, None, "A");
    let task_b = seed_task(&conn, project.id, Some(task_a.id), "B");
    let subproject = seed_project(&conn, "Sub", Some(project.id));
    let sub_task = seed_task(&conn, subproject.id, None, "C");

    let service = chart_service(&conn);
    let items = service
        .build_for_project(ProjectScope::Project(project.id), reference_time())
        .unwrap();

    assert_eq!(
        item_ids(&items),
        vec![
            ItemId::Project(project.id),
            ItemId::Task(task_a.uuid),
            ItemId::Task(task_b.uuid),
            ItemId::Project(subproject.id),
            ItemId::Task(sub_task.uuid),
        ]
    );

    assert_eq!(items[0].parent, ParentRef::None);
    assert_eq!(items[1].parent, ParentRef::Project(project.id));
    assert_eq!(items[2].parent, ParentRef::Task(task_a.uuid));
    assert_eq!(items[3].parent, ParentRef::Project(project.id));
    assert_eq!(items[4].parent, ParentRef::Project(subproject.id));
}

struct DenyProjects(Vec<ProjectId>);

impl AccessPolicy for DenyProjects {
    fn can_view_project(&self, project: &Project) -> bool {
        !self.0.contains(&project.id)
    }

    fn can_view_task(&self, _task: &Task) -> bool {
        true
    }

    fn can_create_task(&self) -> bool {
        true
    }

    fn can_update_task(&self, _task: &Task) -> bool {
        true
    }
}

#[test]
fn denied_subproject_is_skipped_with_its_whole_subtree() {
    let conn = setup();
    let project = seed_project(&conn, "P", None);
    let viewable = seed_project(&conn, "Q", Some(project.id));
    let viewable_task = seed_task(&conn, viewable.id, None, "QT");
    let hidden = seed_project(&conn, "R", Some(project.id));
    let hidden_child = seed_project(&conn, "R1", Some(hidden.id));
    let hidden_task = seed_task(&conn, hidden.id, None, "RT");

    let service = ChartService::new(
        SqliteProjectRepository::new(&conn),
        SqliteTaskRepository::new(&conn),
        SqliteLinkRepository::new(&conn),
        DenyProjects(vec![hidden.id]),
        BasicHtmlSanitizer,
    );
    let items = service
        .build_for_project(ProjectScope::Project(project.id), reference_time())
        .unwrap();

    let ids = item_ids(&items);
    assert!(ids.contains(&ItemId::Project(project.id)));
    assert!(ids.contains(&ItemId::Project(viewable.id)));
    assert!(ids.contains(&ItemId::Task(viewable_task.uuid)));
    assert!(!ids.contains(&ItemId::Project(hidden.id)));
    assert!(!ids.contains(&ItemId::Project(hidden_child.id)));
    assert!(!ids.contains(&ItemId::Task(hidden_task.uuid)));
}

#[test]
fn global_view_lists_only_eligible_roots() {
    let conn = setup();
    let projects = SqliteProjectRepository::new(&conn);

    let global = seed_project(&conn, "Global", None);
    let nested = seed_project(&conn, "Nested", Some(global.id));
    let off_view = projects
        .create_project(&NewProject {
            name: "OffView".to_string(),
            show_on_global_view: false,
            ..Default::default()
        })
        .unwrap();
    let template = projects
        .create_project(&NewProject {
            name: "Template".to_string(),
            show_on_global_view: true,
            is_template: true,
            ..Default::default()
        })
        .unwrap();
    let deleted = projects
        .create_project(&NewProject {
            name: "Deleted".to_string(),
            show_on_global_view: true,
            is_deleted: true,
            ..Default::default()
        })
        .unwrap();

    let service = chart_service(&conn);
    let items = service
        .build_for_project(ProjectScope::All, reference_time())
        .unwrap();

    let ids = item_ids(&items);
    assert!(ids.contains(&ItemId::Project(global.id)));
    assert!(ids.contains(&ItemId::Project(nested.id)));
    assert!(!ids.contains(&ItemId::Project(off_view.id)));
    assert!(!ids.contains(&ItemId::Project(template.id)));
    assert!(!ids.contains(&ItemId::Project(deleted.id)));
}

#[test]
fn template_tasks_are_skipped() {
    let conn = setup();
    let project = seed_project(&conn, "P", None);
    let regular = seed_task(&conn, project.id, None, "Regular");
    let template = SqliteTaskRepository::new(&conn)
        .create_task(&NewTask {
            project_id: project.id,
            name: "Template".to_string(),
            is_template: true,
            ..Default::default()
        })
        .unwrap();

    let service = chart_service(&conn);
    let items = service
        .build_for_project(ProjectScope::Project(project.id), reference_time())
        .unwrap();

    let ids = item_ids(&items);
    assert!(ids.contains(&ItemId::Task(regular.uuid)));
    assert!(!ids.contains(&ItemId::Task(template.uuid)));
}

struct DenyTask(TaskId);

impl AccessPolicy for DenyTask {
    fn can_view_project(&self, _project: &Project) -> bool {
        true
    }

    fn can_view_task(&self, task: &Task) -> bool {
        task.id != self.0
    }

    fn can_create_task(&self) -> bool {
        true
    }

    fn can_update_task(&self, _task: &Task) -> bool {
        true
    }
}

#[test]
fn view_denied_task_is_skipped() {
    let conn = setup();
    let project = seed_project(&conn, "P", None);
    let visible = seed_task(&conn, project.id, None, "Visible");
    let hidden = seed_task(&conn, project.id, None, "Hidden");

    let service = ChartService::new(
        SqliteProjectRepository::new(&conn),
        SqliteTaskRepository::new(&conn),
        SqliteLinkRepository::new(&conn),
        DenyTask(hidden.id),
        BasicHtmlSanitizer,
    );
    let items = service
        .build_for_project(ProjectScope::Project(project.id), reference_time())
        .unwrap();

    let ids = item_ids(&items);
    assert!(ids.contains(&ItemId::Task(visible.uuid)));
    assert!(!ids.contains(&ItemId::Task(hidden.uuid)));
}

#[test]
fn built_items_satisfy_progress_and_date_invariants() {
    let conn = setup();
    let tasks = SqliteTaskRepository::new(&conn);
    let project = seed_project(&conn, "P", None);

    tasks
        .create_task(&NewTask {
            project_id: project.id,
            name: "Dated".to_string(),
            plan_start_date: Some(plan_date("2024-01-01 09:00:00")),
            plan_end_date: Some(plan_date("2024-01-05 17:00:00")),
            percent_done: 100,
            ..Default::default()
        })
        .unwrap();
    tasks
        .create_task(&NewTask {
            project_id: project.id,
            name: "Undated".to_string(),
            percent_done: 50,
            ..Default::default()
        })
        .unwrap();
    tasks
        .create_task(&NewTask {
            project_id: project.id,
            name: "Marker".to_string(),
            is_milestone: true,
            ..Default::default()
        })
        .unwrap();

    let service = chart_service(&conn);
    let items = service
        .build_for_project(ProjectScope::Project(project.id), reference_time())
        .unwrap();

    assert_eq!(items.len(), 4);
    for item in &items {
        assert!((0.0..=1.0).contains(&item.progress), "progress in range");
        assert!(item.end_date >= item.start_date, "end not before start");
    }
}

#[test]
fn milestone_flag_projects_as_milestone_item() {
    let conn = setup();
    let project = seed_project(&conn, "P", None);
    let marker = SqliteTaskRepository::new(&conn)
        .create_task(&NewTask {
            project_id: project.id,
            name: "Release".to_string(),
            is_milestone: true,
            ..Default::default()
        })
        .unwrap();

    let service = chart_service(&conn);
    let items = service
        .build_for_project(ProjectScope::Project(project.id), reference_time())
        .unwrap();

    let item = items
        .iter()
        .find(|item| item.id == ItemId::Task(marker.uuid))
        .unwrap();
    assert_eq!(item.kind, ItemType::Milestone);
}

#[test]
fn building_twice_over_an_unchanged_store_is_idempotent() {
    let conn = setup();
    let project = seed_project(&conn, "P", None);
    let task = seed_task(&conn, project.id, None, "A");
    seed_task(&conn, project.id, Some(task.id), "B");
    seed_project(&conn, "Sub", Some(project.id));

    let service = chart_service(&conn);
    let now = reference_time();
    let first = service
        .build_for_project(ProjectScope::Project(project.id), now)
        .unwrap();
    let second = service
        .build_for_project(ProjectScope::Project(project.id), now)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn every_parent_resolves_within_the_result_set() {
    let conn = setup();
    let root = seed_project(&conn, "Root", None);
    let sub = seed_project(&conn, "Sub", Some(root.id));
    let task = seed_task(&conn, root.id, None, "A");
    seed_task(&conn, root.id, Some(task.id), "B");
    seed_task(&conn, sub.id, None, "C");

    let service = chart_service(&conn);
    let items = service
        .build_for_project(ProjectScope::All, reference_time())
        .unwrap();

    let ids = item_ids(&items);
    for item in &items {
        match item.parent {
            ParentRef::None => {}
            ParentRef::Project(project_id) => {
                assert!(ids.contains(&ItemId::Project(project_id)));
            }
            ParentRef::Task(uuid) => {
                assert!(ids.contains(&ItemId::Task(uuid)));
            }
        }
    }
}

#[test]
fn unknown_project_surfaces_not_found() {
    let conn = setup();
    let service = chart_service(&conn);
    let err = service
        .build_for_project(ProjectScope::Project(9999), reference_time())
        .unwrap_err();
    assert!(matches!(err, ChartError::ProjectNotFound(9999)));
}

#[test]
fn out_of_range_percent_surfaces_as_integrity_error() {
    let conn = setup();
    let project = seed_project(&conn, "P", None);
    SqliteTaskRepository::new(&conn)
        .create_task(&NewTask {
            project_id: project.id,
            name: "Broken".to_string(),
            percent_done: 150,
            ..Default::default()
        })
        .unwrap();

    let service = chart_service(&conn);
    let err = service
        .build_for_project(ProjectScope::Project(project.id), reference_time())
        .unwrap_err();
    assert!(matches!(err, ChartError::Map(_)));
}

#[test]
fn subtask_traversal_emits_children_before_their_parent() {
    let conn = setup();
    let project = seed_project(&conn, "P", None);
    let root = seed_task(&conn, project.id, None, "Root");
    let child_a = seed_task(&conn, project.id, Some(root.id), "A");
    let child_b = seed_task(&conn, project.id, Some(root.id), "B");
    let grandchild = seed_task(&conn, project.id, Some(child_a.id), "G");

    let service = chart_service(&conn);
    let items = service
        .build_subtasks_of(root.id, reference_time())
        .unwrap();

    assert_eq!(
        item_ids(&items),
        vec![
            ItemId::Task(grandchild.uuid),
            ItemId::Task(child_a.uuid),
            ItemId::Task(child_b.uuid),
        ]
    );
}

#[test]
fn subtask_traversal_skips_template_but_visits_its_children() {
    let conn = setup();
    let project = seed_project(&conn, "P", None);
    let root = seed_task(&conn, project.id, None, "Root");
    let template = SqliteTaskRepository::new(&conn)
        .create_task(&NewTask {
            project_id: project.id,
            parent_task_id: Some(root.id),
            name: "Template".to_string(),
            is_template: true,
            ..Default::default()
        })
        .unwrap();
    let nested = seed_task(&conn, project.id, Some(template.id), "Nested");

    let service = chart_service(&conn);
    let items = service
        .build_subtasks_of(root.id, reference_time())
        .unwrap();

    let ids = item_ids(&items);
    assert!(!ids.contains(&ItemId::Task(template.uuid)));
    assert!(ids.contains(&ItemId::Task(nested.uuid)));
}

#[test]
fn links_for_returns_empty_without_task_items() {
    let conn = setup();
    let project = seed_project(&conn, "P", None);

    let service = chart_service(&conn);
    let items = service
        .build_for_project(ProjectScope::Project(project.id), reference_time())
        .unwrap();

    assert!(service.links_for(&items).unwrap().is_empty());
    assert!(service.links_for(&[]).unwrap().is_empty());
}

#[test]
fn links_for_projects_endpoints_to_task_uuids() {
    let conn = setup();
    let project = seed_project(&conn, "P", None);
    let first = seed_task(&conn, project.id, None, "First");
    let second = seed_task(&conn, project.id, None, "Second");
    SqliteLinkRepository::new(&conn)
        .create_link(&NewLink {
            source_task_id: first.id,
            target_task_id: second.id,
            kind: LinkType::FinishToStart,
            lag_days: 2,
            lead_days: 1,
        })
        .unwrap();

    let service = chart_service(&conn);
    let items = service
        .build_for_project(ProjectScope::Project(project.id), reference_time())
        .unwrap();
    let links = service.links_for(&items).unwrap();

    assert_eq!(links.len(), 1);
    assert_eq!(links[0].source, first.uuid);
    assert_eq!(links[0].target, second.uuid);
    assert_eq!(links[0].kind, LinkType::FinishToStart);
    assert_eq!(links[0].lag, 2);
    assert_eq!(links[0].lead, 1);
}

#[test]
fn links_for_resolves_endpoints_outside_the_item_set() {
    let conn = setup();
    let project = seed_project(&conn, "P", None);
    let other_project = seed_project(&conn, "Q", None);
    let inside = seed_task(&conn, project.id, None, "Inside");
    let outside = seed_task(&conn, other_project.id, None, "Outside");
    SqliteLinkRepository::new(&conn)
        .create_link(&NewLink {
            source_task_id: inside.id,
            target_task_id: outside.id,
            ..Default::default()
        })
        .unwrap();

    let service = chart_service(&conn);
    let items = service
        .build_for_project(ProjectScope::Project(project.id), reference_time())
        .unwrap();
    let links = service.links_for(&items).unwrap();

    assert_eq!(links.len(), 1);
    assert_eq!(links[0].source, inside.uuid);
    assert_eq!(links[0].target, outside.uuid);
}
