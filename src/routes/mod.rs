pub mod docs;
pub mod health;
pub mod tasks;

use std::sync::Arc;

use crate::api::{DumpOptions, EnvelopeTemplate, SchemaRef};
use crate::app::AppState;
use crate::domain::Task;
use crate::error::ValidationError;
use crate::routing::{AuthPolicy, Controller, RouteInfo, RouteParameters, RouteTable, Setting};

/// Build the route table with all controllers
pub fn route_table() -> Result<RouteTable<Arc<AppState>>, ValidationError> {
    let task = || Setting::Value(SchemaRef::of::<Task>());

    // Public routes
    let health = Controller::new("/")
        .auth(Setting::Disabled)
        .route(
            RouteParameters::get("/health")
                .with_url_name("health")
                .with_include_in_schema(false),
            health::health_check,
        )?;

    let docs = Controller::new("/api").tags(["docs"]).route(
        RouteParameters::get("/routes")
            .with_url_name("route-list")
            .with_summary("List published routes")
            .with_auth(Setting::Disabled)
            .with_response(Setting::Value(
                EnvelopeTemplate::Items.specialize::<RouteInfo>(),
            )),
        docs::list_routes,
    )?;

    // Tasks
    let tasks = Controller::new("/api/tasks")
        .tags(["tasks"])
        .route(
            RouteParameters::get("/")
                .with_url_name("task-list")
                .with_summary("List tasks")
                .with_response(Setting::Value(
                    EnvelopeTemplate::Paginated.specialize::<Task>(),
                )),
            tasks::list_tasks,
        )?
        .route(
            RouteParameters::get("/items")
                .with_url_name("task-items")
                .with_summary("List tasks by limit and offset")
                .with_response(Setting::Value(EnvelopeTemplate::Items.specialize::<Task>())),
            tasks::list_task_items,
        )?
        .route(
            RouteParameters::post("/")
                .with_url_name("task-create")
                .with_summary("Create a task")
                .with_response(task()),
            tasks::create_task,
        )?
        .route(
            RouteParameters::get("/:id")
                .with_url_name("task-detail")
                .with_summary("Get a task")
                .with_response(task())
                .with_serialization(DumpOptions::exclude_none()),
            tasks::get_task,
        )?
        .route(
            RouteParameters::put("/:id")
                .with_url_name("task-update")
                .with_summary("Update a task")
                .with_response(task())
                .with_serialization(DumpOptions::exclude_none()),
            tasks::update_task,
        )?
        .route(
            RouteParameters::patch("/:id")
                .with_url_name("task-patch")
                .with_summary("Patch a task")
                .with_response(task())
                .with_serialization(DumpOptions::exclude_none()),
            tasks::patch_task,
        )?;

    RouteTable::new()
        .auth(Setting::Value(AuthPolicy::new("bearer")))
        .register(health)?
        .register(docs)?
        .register(tasks)
}
