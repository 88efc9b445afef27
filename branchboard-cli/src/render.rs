//! Terminal rendering with comfy-table

use branchboard::{Lane, Status, Task, Version};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

const ID_WIDTH: usize = 10;
const TITLE_WIDTH: usize = 40;

/// Create a table sized to the terminal, or 120 columns when not on a TTY
pub fn new_table() -> Table {
    let width = crossterm::terminal::size().map(|(w, _)| w).unwrap_or(120);

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_width(width);
    table
}

/// Truncate to `max` characters, appending "..." when cut
pub fn truncate_str(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Leading characters of a task id, enough to pass back as a prefix
pub fn short_id(task: &Task) -> String {
    task.id.as_str().chars().take(ID_WIDTH).collect()
}

/// The board grid: one row per lane, one column per status
pub fn board(lanes: &[Lane]) -> String {
    let mut table = new_table();
    let mut header = vec![Cell::new("Version")];
    header.extend(Status::ALL.iter().map(|s| Cell::new(s.label())));
    table.set_header(header);

    for lane in lanes {
        let mut row = vec![Cell::new(format!(
            "{}\n({})",
            lane.version.label, lane.version.key
        ))];
        for status in Status::ALL {
            let bucket = lane.bucket(status);
            let cell = if lane.collapsed {
                format!("{} task(s)", bucket.len())
            } else {
                bucket
                    .iter()
                    .map(|t| format!("{} {}", short_id(t), truncate_str(&t.title, TITLE_WIDTH)))
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            row.push(Cell::new(cell));
        }
        table.add_row(row);
    }
    table.to_string()
}

pub fn tasks(tasks: &[Task]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "ID", "Title", "Status", "Version", "Priority", "Order",
    ]);
    for task in tasks {
        table.add_row(vec![
            task.id.to_string(),
            truncate_str(&task.title, TITLE_WIDTH),
            task.status.to_string(),
            task.version_id.to_string(),
            task.priority.to_string(),
            task.sort_order.map(|o| o.to_string()).unwrap_or_default(),
        ]);
    }
    table.to_string()
}

pub fn task(task: &Task) -> String {
    let mut lines = vec![
        format!("id:       {}", task.id),
        format!("title:    {}", task.title),
        format!("status:   {}", task.status),
        format!("version:  {}", task.version_id),
        format!("priority: {}", task.priority),
    ];
    if let Some(order) = task.sort_order {
        lines.push(format!("order:    {}", order));
    }
    if !task.description.is_empty() {
        lines.push(String::new());
        lines.push(task.description.clone());
    }
    lines.join("\n")
}

pub fn versions(versions: &[Version]) -> String {
    let mut table = new_table();
    table.set_header(vec!["Key", "Label", "Origin", "Hidden"]);
    for version in versions {
        let origin = if version.is_builtin() {
            "built-in"
        } else {
            "custom"
        };
        table.add_row(vec![
            version.key.to_string(),
            version.label.clone(),
            origin.to_string(),
            if version.hidden { "yes" } else { "" }.to_string(),
        ]);
    }
    table.to_string()
}
