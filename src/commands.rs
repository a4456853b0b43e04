//! Command handlers
//!
//! Each handler loads the stores it needs, runs one operation and prints the
//! result. Store notifications are printed by the console notifier.

use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use studioboard_client::StudioApi;
use studioboard_proto::{
    recent_tasks, Entity, EntityId, ItemDraft, ItemPatch, ItemStatus, Progress, ProjectDraft,
    ProjectPatch, ProjectSummaryUpdate, TaskDraft, TaskPatch, TeamMemberDraft, TeamMemberPatch,
};
use studioboard_store::{
    CancellationToken, ItemStore, Notifier, ProjectStore, RemoteCollection, TaskStore, TeamStore,
};

use crate::console;
use crate::{ItemCommands, ProjectCommands, TaskCommands, TeamCommands};

/// Number of tasks shown on the dashboard by default
pub const RECENT_TASKS: usize = 10;

/// Shared handles for one CLI invocation
pub struct Session {
    pub api: StudioApi,
    pub notifier: Arc<dyn Notifier>,
    /// Cancelled on Ctrl-C; aborts in-flight fetches
    pub shutdown: CancellationToken,
}

impl Session {
    fn projects(&self) -> ProjectStore {
        ProjectStore::new(self.api.clone(), self.notifier.clone())
    }

    fn tasks(&self, project_id: &EntityId) -> TaskStore {
        TaskStore::new(self.api.clone(), self.notifier.clone(), project_id.clone())
    }

    fn team(&self) -> TeamStore {
        TeamStore::new(self.api.clone(), self.notifier.clone())
    }

    fn items(&self) -> ItemStore {
        ItemStore::new(self.api.clone(), self.notifier.clone())
    }
}

/// Fail the command when the fetch did not go through
async fn ensure_loaded<E: Entity>(collection: &RemoteCollection<E>) -> Result<()> {
    match collection.last_error().await {
        Some(message) => bail!("Could not load {}: {}", E::KIND.plural(), message),
        None => Ok(()),
    }
}

// ========================
// Dashboard
// ========================

pub async fn dashboard(ctx: &Session, recent: usize) -> Result<()> {
    let projects = ctx.projects();
    let team = ctx.team();

    let (project_list, members) = tokio::try_join!(
        projects.fetch_all_cancellable(&ctx.shutdown),
        team.fetch_all_cancellable(&ctx.shutdown),
    )?;
    ensure_loaded(projects.collection()).await?;
    ensure_loaded(team.collection()).await?;

    let stats = projects.overview(members.len()).await;
    println!("Projects:     {}", stats.total_projects);
    println!("In progress:  {}", stats.in_progress);
    println!("Completed:    {}", stats.completed);
    println!("Team members: {}", stats.team_members);
    println!(
        "Tasks:        {}/{} complete",
        stats.completed_tasks, stats.total_tasks
    );

    // The newest `recent` overall are among each project's newest `recent`
    let mut all_tasks = Vec::new();
    for project in &project_list {
        let tasks = ctx.tasks(&project.id);
        tasks.fetch_all_cancellable(&ctx.shutdown).await?;
        all_tasks.extend(tasks.recent(recent).await);
    }
    debug!(
        "Collected {} recent tasks across {} projects",
        all_tasks.len(),
        project_list.len()
    );

    println!();
    println!("Recent tasks:");
    console::print_tasks(&recent_tasks(&all_tasks, recent));
    Ok(())
}

// ========================
// Projects
// ========================

pub async fn projects(ctx: &Session, command: ProjectCommands) -> Result<()> {
    let store = ctx.projects();
    store.fetch_all_cancellable(&ctx.shutdown).await?;
    ensure_loaded(store.collection()).await?;

    match command {
        ProjectCommands::List => {
            console::print_projects(&store.projects().await);
        }
        ProjectCommands::Create {
            name,
            studio,
            status,
            color,
            due,
            notes,
            lead,
        } => {
            let mut draft = ProjectDraft::new(name, studio);
            if let Some(status) = status {
                draft.status = status.into();
            }
            if let Some(color) = color {
                draft.color = color;
            }
            draft.due_date = due;
            draft.notes = notes;
            draft.project_lead = lead.map(EntityId::from);

            let project = store.create(draft).await?;
            info!("Created project {}", project.id);
            console::print_projects(&[project]);
        }
        ProjectCommands::Update {
            id,
            name,
            studio,
            status,
            color,
            notes,
            clear_due,
        } => {
            let patch = ProjectPatch {
                name,
                studio,
                status: status.map(Into::into),
                color,
                notes: notes.map(Some),
                due_date: clear_due.then_some(None),
                ..Default::default()
            };
            let project = store.update(&EntityId::from(id), patch).await?;
            console::print_projects(&[project]);
        }
        ProjectCommands::Progress { id, value } => {
            let project = store
                .update_progress(&EntityId::from(id), Progress::new(value))
                .await?;
            console::print_projects(&[project]);
        }
        ProjectCommands::Delete { id } => {
            store.delete(&EntityId::from(id)).await?;
        }
    }
    Ok(())
}

// ========================
// Tasks
// ========================

pub async fn tasks(ctx: &Session, project_id: String, command: TaskCommands) -> Result<()> {
    let project_id = EntityId::from(project_id);
    let projects = ctx.projects();
    let store = ctx.tasks(&project_id);

    tokio::try_join!(
        projects.fetch_all_cancellable(&ctx.shutdown),
        store.fetch_all_cancellable(&ctx.shutdown),
    )?;
    ensure_loaded(store.collection()).await?;
    if projects.get(&project_id).await.is_none() {
        warn!("Project {} is not in the project list", project_id);
    }

    let summary = match command {
        TaskCommands::List => {
            console::print_tasks(&store.tasks().await);
            return Ok(());
        }
        TaskCommands::Add { title, assignee } => {
            let mut draft = TaskDraft::new(title, project_id.clone());
            if let Some(member) = assignee {
                draft = draft.assigned_to(EntityId::from(member));
            }
            store.create(draft).await?.project
        }
        TaskCommands::Toggle { task_id } => {
            store.toggle_status(&EntityId::from(task_id)).await?.project
        }
        TaskCommands::Rename { task_id, title } => {
            let patch = TaskPatch {
                title: Some(title),
                ..Default::default()
            };
            store.update(&EntityId::from(task_id), patch).await?.project
        }
        TaskCommands::Assign { task_id, member } => {
            let patch = TaskPatch {
                assignee_id: Some(member.map(EntityId::from)),
                ..Default::default()
            };
            store.update(&EntityId::from(task_id), patch).await?.project
        }
        TaskCommands::Delete { task_id } => store.delete(&EntityId::from(task_id)).await?,
    };

    relay_summary(&projects, summary).await;
    sync_progress(&projects, &store).await;
    console::print_tasks(&store.tasks().await);
    Ok(())
}

async fn relay_summary(projects: &ProjectStore, summary: Option<ProjectSummaryUpdate>) {
    match summary {
        Some(update) => {
            if !projects.hydrate(&update).await {
                debug!("No loaded project to hydrate for {}", update.id);
            }
        }
        None => debug!("Server sent no project summary"),
    }
}

/// Keep the parent project's progress in step with its tasks
async fn sync_progress(projects: &ProjectStore, tasks: &TaskStore) {
    if projects.get(tasks.project_id()).await.is_none() {
        return;
    }
    let current = tasks.tasks().await;
    if let Err(err) = projects
        .sync_progress_from_tasks(tasks.project_id(), &current)
        .await
    {
        warn!("Could not sync progress of {}: {}", tasks.project_id(), err);
    }
}

// ========================
// Team
// ========================

pub async fn team(ctx: &Session, command: TeamCommands) -> Result<()> {
    let store = ctx.team();
    store.fetch_all_cancellable(&ctx.shutdown).await?;
    ensure_loaded(store.collection()).await?;

    match command {
        TeamCommands::List => {}
        TeamCommands::Add {
            name,
            role,
            email,
            avatar,
            capacity,
        } => {
            let mut draft = TeamMemberDraft::new(name, role, email);
            draft.avatar = avatar;
            if let Some(capacity) = capacity {
                draft.capacity = capacity;
            }
            store.create(draft).await?;
        }
        TeamCommands::Update {
            id,
            name,
            role,
            email,
            avatar,
            capacity,
        } => {
            let patch = TeamMemberPatch {
                name,
                role,
                email,
                avatar: avatar.map(|a| Some(a).filter(|a| !a.is_empty())),
                capacity,
            };
            store.update(&EntityId::from(id), patch).await?;
        }
        TeamCommands::Remove { id } => {
            store.delete(&EntityId::from(id)).await?;
        }
    }

    console::print_team(&store.workloads().await);
    Ok(())
}

// ========================
// Items
// ========================

pub async fn items(ctx: &Session, command: ItemCommands) -> Result<()> {
    let store = ctx.items();

    if let ItemCommands::Show { id } = &command {
        let item = store.fetch_one(&EntityId::from(id.as_str())).await?;
        console::print_items(&[item]);
        return Ok(());
    }

    store.fetch_all_cancellable(&ctx.shutdown).await?;
    ensure_loaded(store.collection()).await?;

    match command {
        ItemCommands::List | ItemCommands::Show { .. } => {}
        ItemCommands::Stats => {
            console::print_item_stats(&store.stats().await);
            return Ok(());
        }
        ItemCommands::Create {
            name,
            category,
            price,
            quantity,
            description,
            status,
        } => {
            let draft = ItemDraft {
                name,
                description,
                category,
                status: status.map(Into::into).unwrap_or(ItemStatus::Active),
                price,
                quantity,
            };
            store.create(draft).await?;
        }
        ItemCommands::Update {
            id,
            name,
            category,
            price,
            quantity,
            description,
            status,
        } => {
            let patch = ItemPatch {
                name,
                description: description.map(|d| Some(d).filter(|d| !d.is_empty())),
                category,
                status: status.map(Into::into),
                price,
                quantity,
            };
            store.update(&EntityId::from(id), patch).await?;
        }
        ItemCommands::Delete { id } => {
            store.delete(&EntityId::from(id)).await?;
        }
    }

    console::print_items(&store.items().await);
    Ok(())
}
