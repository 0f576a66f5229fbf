use ansi_term::{Colour, Style};
use clap::ValueEnum;

use crate::{
    tasks::{
        entities::{Priority, TaskId, TaskRecord},
        stats::{StatsSnapshot, TagUsage},
    },
    utils::time::format_duration,
};

const SHORT_ID_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFilter {
    All,
    Pending,
    Completed,
}

impl ListFilter {
    fn accepts(&self, task: &TaskRecord) -> bool {
        match self {
            ListFilter::All => true,
            ListFilter::Pending => !task.completed,
            ListFilter::Completed => task.completed,
        }
    }
}

/// Enough of the id to type it back in.
pub fn short_id(id: TaskId) -> String {
    id.to_string()[..SHORT_ID_LEN].to_string()
}

fn priority_style(priority: Priority) -> Style {
    match priority {
        Priority::High => Colour::Red.bold(),
        Priority::Medium => Colour::Yellow.normal(),
        Priority::Low => Colour::Green.normal(),
    }
}

pub fn format_task_line(task: &TaskRecord, colored: bool) -> String {
    let status = match (task.completed, task.timer_running) {
        (true, _) => "[x]",
        (false, true) => "[>]",
        (false, false) => "[ ]",
    };
    let priority = format!("{:<6}", task.priority.to_string());
    let priority = if colored {
        priority_style(task.priority).paint(priority).to_string()
    } else {
        priority
    };
    let tags = if task.tags.is_empty() {
        String::new()
    } else {
        format!(
            "\t#{}",
            task.tags.iter().cloned().collect::<Vec<_>>().join(" #")
        )
    };
    format!(
        "{}\t{status}\t{priority}\t{}\t{}{tags}",
        short_id(task.id),
        format_duration(task.time_spent()),
        task.text,
    )
}

pub fn print_tasks(tasks: &[TaskRecord], filter: ListFilter) {
    let mut shown = 0;
    for task in tasks.iter().filter(|task| filter.accepts(task)) {
        println!("{}", format_task_line(task, true));
        shown += 1;
    }
    if shown == 0 {
        println!("No tasks");
    }
}

pub fn format_stats_line(label: &str, stats: &StatsSnapshot) -> String {
    let rate = stats
        .completion_rate()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{label}\ttotal {}\tpending {}\tcompleted {}\t{rate}",
        stats.total, stats.pending, stats.completed
    )
}

pub fn print_stats(daily: &StatsSnapshot, monthly: &StatsSnapshot, tracked: chrono::Duration) {
    println!("{}", format_stats_line("Today", daily));
    println!("{}", format_stats_line("30 days", monthly));
    println!("Tracked\t{}", format_duration(tracked));
}

pub fn print_tags(usages: &[TagUsage]) {
    if usages.is_empty() {
        println!("No tagged tasks");
    }
    for usage in usages {
        println!(
            "{}\t{}\t{}",
            usage.tag,
            usage.tasks,
            format_duration(usage.time_spent)
        );
    }
}
