//! Terminal output

use studioboard_proto::{Item, ItemStats, Project, Task, TaskStatus, TeamMember, Workload};
use studioboard_store::{Notification, NotificationLevel, Notifier};

/// Prints notifications as they arrive
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let line = render_notification(&notification);
        match notification.level {
            NotificationLevel::Error => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }
}

fn render_notification(notification: &Notification) -> String {
    let marker = match notification.level {
        NotificationLevel::Success => "✓",
        NotificationLevel::Error => "✗",
        NotificationLevel::Info => "•",
    };
    // The process exits once the command settles, so undo actions are not offered
    format!("{} {}", marker, notification.message)
}

pub fn print_projects(projects: &[Project]) {
    if projects.is_empty() {
        println!("No projects yet");
        return;
    }
    println!(
        "{:<26} {:<28} {:<12} {:>5}  {:<18} {:>7}",
        "ID", "NAME", "STATUS", "DONE", "STUDIO", "TASKS"
    );
    for project in projects {
        println!(
            "{:<26} {:<28} {:<12} {:>5}  {:<18} {:>3}/{:<3}",
            project.id,
            truncate(&project.name, 28),
            project.status,
            project.progress.to_string(),
            truncate(&project.studio, 18),
            project.task_summary.completed(),
            project.task_summary.total()
        );
    }
}

pub fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks yet");
        return;
    }
    for task in tasks {
        let check = if task.status == TaskStatus::Complete {
            "[x]"
        } else {
            "[ ]"
        };
        let assignee = task
            .assignee
            .as_ref()
            .map(|m| m.name().unwrap_or(m.id().as_str()).to_string())
            .unwrap_or_default();
        println!(
            "{} {:<26} {:<36} {:<12} {}",
            check,
            task.id,
            truncate(&task.title, 36),
            task.status,
            assignee
        );
    }
}

pub fn print_team(workloads: &[(TeamMember, Workload)]) {
    if workloads.is_empty() {
        println!("No team members yet");
        return;
    }
    for (member, load) in workloads {
        println!(
            "{:<26} {:<22} {:<20} {:>2}/{:<2} {:>4}%  {}",
            member.id,
            truncate(&member.name, 22),
            truncate(&member.role, 20),
            load.assigned,
            load.capacity,
            load.percent,
            load.band
        );
    }
}

pub fn print_items(items: &[Item]) {
    if items.is_empty() {
        println!("No items yet");
        return;
    }
    for item in items {
        println!(
            "{:<26} {:<28} {:<16} {:<9} {:>10.2} x {:<5}",
            item.id,
            truncate(&item.name, 28),
            truncate(&item.category, 16),
            item.status.as_str(),
            item.price,
            item.quantity
        );
    }
}

pub fn print_item_stats(stats: &ItemStats) {
    println!("Items:          {}", stats.total);
    println!("Active:         {}", stats.active);
    println!("Total quantity: {}", stats.total_quantity);
    println!("Total value:    {:.2}", stats.total_value);
    if !stats.by_category.is_empty() {
        println!("By category:");
        for (category, count) in &stats.by_category {
            println!("  {:<20} {}", category, count);
        }
    }
    if !stats.by_status.is_empty() {
        println!("By status:");
        for (status, count) in &stats.by_status {
            println!("  {:<20} {}", status.as_str(), count);
        }
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use studioboard_store::UndoHandle;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Villa", 10), "Villa");
        assert_eq!(truncate("Seaside Villa", 8), "Seaside…");
    }

    #[test]
    fn test_render_never_advertises_undo() {
        let plain = Notification::error("Failed to delete project");
        assert_eq!(render_notification(&plain), "✗ Failed to delete project");

        let undoable =
            Notification::success("Project deleted").with_undo(UndoHandle::new(|| async {}));
        assert!(undoable.undo.is_some());
        assert_eq!(render_notification(&undoable), "✓ Project deleted");
    }
}
