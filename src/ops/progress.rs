use crate::model::task::{Task, TaskStatus};

/// Leaf tally for a subtree or project, for "3/7 done" style summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeafCounts {
    pub done: usize,
    pub total: usize,
}

/// Completion percentage of a single task.
///
/// A leaf is all-or-nothing: 100 when completed, 0 otherwise. A parent
/// ignores its own status and reports the rounded mean of its children,
/// so every level of nesting carries equal weight one level up.
pub fn task_progress(task: &Task) -> u8 {
    if task.subtasks.is_empty() {
        return match task.status {
            TaskStatus::Completed => 100,
            TaskStatus::Pending => 0,
        };
    }
    mean_progress(&task.subtasks)
}

/// Completion percentage of a whole project: the rounded mean over its
/// root tasks. A project with no tasks reports 0.
pub fn project_progress(tasks: &[Task]) -> u8 {
    if tasks.is_empty() {
        return 0;
    }
    mean_progress(tasks)
}

fn mean_progress(tasks: &[Task]) -> u8 {
    let sum: u32 = tasks.iter().map(|t| task_progress(t) as u32).sum();
    // .round() on a non-negative value rounds halves up, so 50.5 -> 51.
    (sum as f64 / tasks.len() as f64).round() as u8
}

/// Count completed and total leaves under a set of tasks. Parents are
/// containers and never counted themselves.
pub fn leaf_counts(tasks: &[Task]) -> LeafCounts {
    let mut counts = LeafCounts::default();
    count_into(tasks, &mut counts);
    counts
}

fn count_into(tasks: &[Task], counts: &mut LeafCounts) {
    for task in tasks {
        if task.subtasks.is_empty() {
            counts.total += 1;
            if task.status == TaskStatus::Completed {
                counts.done += 1;
            }
        } else {
            count_into(&task.subtasks, counts);
        }
    }
}
