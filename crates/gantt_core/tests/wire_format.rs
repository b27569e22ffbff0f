use chrono::NaiveDateTime;
use gantt_core::db::open_db_in_memory;
use gantt_core::model::plan_date::parse_plan_date;
use gantt_core::{
    AllowAll, BasicHtmlSanitizer, ChartService, ItemId, LinkRepository, LinkType, NewLink,
    NewProject, NewTask, ProjectRepository, ProjectScope, SqliteLinkRepository,
    SqliteProjectRepository, SqliteTaskRepository, TaskRepository,
};
use rusqlite::Connection;
use serde_json::json;

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn reference_time() -> NaiveDateTime {
    parse_plan_date("2024-06-01 08:00:00").unwrap()
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

#[test]
fn project_item_serializes_the_chart_payload_shape() {
    let conn = setup();
    let project = SqliteProjectRepository::new(&conn)
        .create_project(&NewProject {
            name: "Launch".to_string(),
            content: Some("<p>plan</p>".to_string()),
            comment: Some("internal".to_string()),
            plan_start_date: Some(parse_plan_date("2024-01-01 09:00:00").unwrap()),
            plan_end_date: Some(parse_plan_date("2024-02-01 09:00:00").unwrap()),
            percent_done: 25,
            show_on_global_view: true,
            ..Default::default()
        })
        .unwrap();

    let service = chart_service(&conn);
    let items = service
        .build_for_project(ProjectScope::Project(project.id), reference_time())
        .unwrap();
    let value = serde_json::to_value(&items[0]).unwrap();

    assert_eq!(value["id"], json!(project.id));
    assert_eq!(value["type"], json!("project"));
    assert_eq!(value["parent"], json!(0));
    assert_eq!(value["start_date"], json!("2024-01-01 09:00:00"));
    assert_eq!(value["end_date"], json!("2024-02-01 09:00:00"));
    assert_eq!(value["text"], json!("Launch"));
    assert_eq!(value["content"], json!("<p>plan</p>"));
    assert_eq!(value["comment"], json!("internal"));
    assert_eq!(value["progress"], json!(0.25));
    assert!(value.get("link_task_id").is_none());
}

#[test]
fn task_and_milestone_items_serialize_uuid_identities() {
    let conn = setup();
    let project = SqliteProjectRepository::new(&conn)
        .create_project(&NewProject {
            name: "P".to_string(),
            show_on_global_view: true,
            ..Default::default()
        })
        .unwrap();
    let tasks = SqliteTaskRepository::new(&conn);
    let parent = tasks
        .create_task(&NewTask {
            project_id: project.id,
            name: "Parent".to_string(),
            ..Default::default()
        })
        .unwrap();
    let child = tasks
        .create_task(&NewTask {
            project_id: project.id,
            parent_task_id: Some(parent.id),
            name: "Child".to_string(),
            is_milestone: true,
            ..Default::default()
        })
        .unwrap();

    let service = chart_service(&conn);
    let items = service
        .build_for_project(ProjectScope::Project(project.id), reference_time())
        .unwrap();

    let parent_value = items
        .iter()
        .find(|item| item.id == ItemId::Task(parent.uuid))
        .map(|item| serde_json::to_value(item).unwrap())
        .unwrap();
    assert_eq!(parent_value["id"], json!(parent.uuid.to_string()));
    assert_eq!(parent_value["type"], json!("task"));
    assert_eq!(parent_value["parent"], json!(project.id));

    let child_value = items
        .iter()
        .find(|item| item.id == ItemId::Task(child.uuid))
        .map(|item| serde_json::to_value(item).unwrap())
        .unwrap();
    assert_eq!(child_value["id"], json!(child.uuid.to_string()));
    assert_eq!(child_value["type"], json!("milestone"));
    assert_eq!(child_value["parent"], json!(parent.uuid.to_string()));
}

#[test]
fn links_serialize_numeric_types_and_uuid_endpoints() {
    let conn = setup();
    let project = SqliteProjectRepository::new(&conn)
        .create_project(&NewProject {
            name: "P".to_string(),
            show_on_global_view: true,
            ..Default::default()
        })
        .unwrap();
    let tasks = SqliteTaskRepository::new(&conn);
    let first = tasks
        .create_task(&NewTask {
            project_id: project.id,
            name: "First".to_string(),
            ..Default::default()
        })
        .unwrap();
    let second = tasks
        .create_task(&NewTask {
            project_id: project.id,
            name: "Second".to_string(),
            ..Default::default()
        })
        .unwrap();
    let links = SqliteLinkRepository::new(&conn);
    links
        .create_link(&NewLink {
            source_task_id: first.id,
            target_task_id: second.id,
            kind: LinkType::FinishToStart,
            lag_days: 2,
            lead_days: 1,
        })
        .unwrap();
    links
        .create_link(&NewLink {
            source_task_id: second.id,
            target_task_id: first.id,
            kind: LinkType::StartToFinish,
            ..Default::default()
        })
        .unwrap();

    let service = chart_service(&conn);
    let items = service
        .build_for_project(ProjectScope::Project(project.id), reference_time())
        .unwrap();
    let resolved = service.links_for(&items).unwrap();
    let value = serde_json::to_value(&resolved).unwrap();

    assert_eq!(value[0]["source"], json!(first.uuid.to_string()));
    assert_eq!(value[0]["target"], json!(second.uuid.to_string()));
    assert_eq!(value[0]["type"], json!(0));
    assert_eq!(value[0]["lag"], json!(2));
    assert_eq!(value[0]["lead"], json!(1));
    assert_eq!(value[1]["type"], json!(1));
}
