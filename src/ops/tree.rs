use uuid::Uuid;

use crate::model::task::Task;

/// Where a dragged task lands relative to the drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPosition {
    /// Sibling immediately before the target.
    Before,
    /// Sibling immediately after the target.
    After,
    /// Last child of the target.
    Inside,
}

/// A task removed from a forest, together with where it came from so the
/// removal can be undone exactly.
#[derive(Debug)]
pub struct Detached {
    pub task: Task,
    /// `None` means the task was a root.
    pub parent: Option<Uuid>,
    /// Index among its former siblings.
    pub index: usize,
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Find a task by id anywhere in the forest (depth-first, parents before
/// children). Ids are unique per board, so the first match is the match.
pub fn find_task(forest: &[Task], id: Uuid) -> Option<&Task> {
    for task in forest {
        if task.id == id {
            return Some(task);
        }
        if let Some(found) = find_task(&task.subtasks, id) {
            return Some(found);
        }
    }
    None
}

/// Visit every task in the forest, parents before children.
pub fn for_each_task(forest: &[Task], f: &mut dyn FnMut(&Task)) {
    for task in forest {
        f(task);
        for_each_task(&task.subtasks, f);
    }
}

// ---------------------------------------------------------------------------
// Targeted mutation
// ---------------------------------------------------------------------------

/// Replace the task with the given id by `transform(task)`, rebuilding the
/// ancestor path and moving everything else through untouched. An id that
/// is nowhere in the forest leaves it unchanged. The transform must keep
/// the node's id.
pub fn update_task(
    forest: Vec<Task>,
    target: Uuid,
    transform: impl FnOnce(Task) -> Task,
) -> Vec<Task> {
    let mut transform = Some(transform);
    update_in(forest, target, &mut transform)
}

fn update_in<F: FnOnce(Task) -> Task>(
    forest: Vec<Task>,
    target: Uuid,
    transform: &mut Option<F>,
) -> Vec<Task> {
    forest
        .into_iter()
        .map(|mut task| {
            if transform.is_none() {
                return task;
            }
            if task.id == target {
                if let Some(f) = transform.take() {
                    return f(task);
                }
                return task;
            }
            task.subtasks = update_in(std::mem::take(&mut task.subtasks), target, transform);
            task
        })
        .collect()
}

/// Append `new_task` to the end of `parent`'s subtasks and unfold the
/// parent. If the parent is missing the forest comes back unchanged and
/// the new task is discarded. Root-level insertion is a plain push on the
/// forest and does not go through here.
pub fn insert_child(forest: Vec<Task>, parent: Uuid, new_task: Task) -> Vec<Task> {
    update_task(forest, parent, move |mut p| {
        p.subtasks.push(new_task);
        p.expanded = true;
        p
    })
}

// ---------------------------------------------------------------------------
// Removal and relocation
// ---------------------------------------------------------------------------

/// Remove the task with the given id, discarding its entire subtree.
/// Every other node is unaffected; a missing id is a no-op.
pub fn remove_task(forest: Vec<Task>, target: Uuid) -> Vec<Task> {
    detach(forest, target).0
}

/// Remove the task with the given id but keep it, along with its original
/// position, so it can be re-inserted elsewhere or put back.
pub fn detach(forest: Vec<Task>, target: Uuid) -> (Vec<Task>, Option<Detached>) {
    detach_in(forest, target, None)
}

fn detach_in(
    forest: Vec<Task>,
    target: Uuid,
    parent: Option<Uuid>,
) -> (Vec<Task>, Option<Detached>) {
    let mut found: Option<Detached> = None;
    let mut out = Vec::with_capacity(forest.len());
    for mut task in forest {
        if found.is_some() {
            out.push(task);
            continue;
        }
        if task.id == target {
            // out.len() is the original sibling index: nothing before
            // this point has been removed.
            found = Some(Detached {
                index: out.len(),
                parent,
                task,
            });
            continue;
        }
        let id = task.id;
        let (subtasks, nested) = detach_in(std::mem::take(&mut task.subtasks), target, Some(id));
        task.subtasks = subtasks;
        if nested.is_some() {
            found = nested;
        }
        out.push(task);
    }
    (out, found)
}

/// Move `dragged` (with its whole subtree) next to or into `target`.
///
/// The move is all-or-nothing: dropping a task on itself, a missing
/// `dragged`, or a `target` that cannot be reached once `dragged` is out
/// of the forest (which covers targets inside the dragged subtree) all
/// return the forest unchanged.
pub fn relocate(
    forest: Vec<Task>,
    dragged: Uuid,
    target: Uuid,
    position: DropPosition,
) -> Vec<Task> {
    if dragged == target {
        return forest;
    }
    let (forest, detached) = detach(forest, dragged);
    let Some(Detached {
        task,
        parent,
        index,
    }) = detached
    else {
        return forest;
    };

    let (forest, leftover) = place_relative(forest, target, task, position);
    match leftover {
        None => forest,
        // Target was missing (or rode along inside the dragged subtree):
        // put the detachment back exactly where it was.
        Some(task) => reattach(
            forest,
            Detached {
                task,
                parent,
                index,
            },
        ),
    }
}

/// Try to place `node` relative to `target`; hand the node back if the
/// target is nowhere in the forest.
fn place_relative(
    forest: Vec<Task>,
    target: Uuid,
    node: Task,
    position: DropPosition,
) -> (Vec<Task>, Option<Task>) {
    let mut slot = Some(node);
    let forest = match position {
        DropPosition::Inside => place_inside(forest, target, &mut slot),
        DropPosition::Before => place_beside(forest, target, &mut slot, false),
        DropPosition::After => place_beside(forest, target, &mut slot, true),
    };
    (forest, slot)
}

fn place_inside(forest: Vec<Task>, target: Uuid, slot: &mut Option<Task>) -> Vec<Task> {
    forest
        .into_iter()
        .map(|mut task| {
            if slot.is_none() {
                return task;
            }
            if task.id == target {
                if let Some(node) = slot.take() {
                    task.subtasks.push(node);
                    task.expanded = true;
                }
                return task;
            }
            task.subtasks = place_inside(std::mem::take(&mut task.subtasks), target, slot);
            task
        })
        .collect()
}

fn place_beside(forest: Vec<Task>, target: Uuid, slot: &mut Option<Task>, after: bool) -> Vec<Task> {
    if slot.is_some()
        && let Some(pos) = forest.iter().position(|t| t.id == target)
    {
        let mut forest = forest;
        if let Some(node) = slot.take() {
            let at = if after { pos + 1 } else { pos };
            forest.insert(at, node);
        }
        return forest;
    }
    forest
        .into_iter()
        .map(|mut task| {
            if slot.is_none() {
                return task;
            }
            task.subtasks = place_beside(std::mem::take(&mut task.subtasks), target, slot, after);
            task
        })
        .collect()
}

/// Put a detached task back at its recorded position. Only called right
/// after `detach`, so the recorded parent is still present (detaching
/// removed one of its children, not the parent itself).
fn reattach(forest: Vec<Task>, detached: Detached) -> Vec<Task> {
    let Detached {
        task,
        parent,
        index,
    } = detached;
    match parent {
        None => {
            let mut forest = forest;
            let at = index.min(forest.len());
            forest.insert(at, task);
            forest
        }
        Some(pid) => update_task(forest, pid, move |mut p| {
            let at = index.min(p.subtasks.len());
            p.subtasks.insert(at, task);
            p
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn leaf(title: &str) -> Task {
        Task::new(title.to_string(), Uuid::new_v4())
    }

    fn branch(title: &str, subtasks: Vec<Task>) -> Task {
        let mut task = leaf(title);
        task.subtasks = subtasks;
        task
    }

    /// `[a, b(c, d(e)), f]`: returns the forest and the ids of a..f.
    fn sample_forest() -> (Vec<Task>, [Uuid; 6]) {
        let a = leaf("a");
        let c = leaf("c");
        let e = leaf("e");
        let d = branch("d", vec![e.clone()]);
        let b = branch("b", vec![c.clone(), d.clone()]);
        let f = leaf("f");
        let ids = [a.id, b.id, c.id, d.id, e.id, f.id];
        (vec![a, b, f], ids)
    }

    fn titles(forest: &[Task]) -> Vec<&str> {
        forest.iter().map(|t| t.title.as_str()).collect()
    }

    // --- find / walk ---

    #[test]
    fn test_find_task_reaches_nested_nodes() {
        let (forest, [_, _, _, _, e, _]) = sample_forest();
        assert_eq!(find_task(&forest, e).map(|t| t.title.as_str()), Some("e"));
        assert!(find_task(&forest, Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_for_each_task_visits_parents_before_children() {
        let (forest, _) = sample_forest();
        let mut seen = Vec::new();
        for_each_task(&forest, &mut |t| seen.push(t.title.clone()));
        assert_eq!(seen, vec!["a", "b", "c", "d", "e", "f"]);
    }

    // --- update_task ---

    #[test]
    fn test_update_task_edits_a_nested_node() {
        let (forest, [_, _, _, _, e, _]) = sample_forest();
        let forest = update_task(forest, e, |mut t| {
            t.title = "edited".to_string();
            t
        });
        assert_eq!(find_task(&forest, e).map(|t| t.title.as_str()), Some("edited"));
    }

    #[test]
    fn test_update_task_missing_id_is_identity() {
        let (forest, _) = sample_forest();
        let before = forest.clone();
        let after = update_task(forest, Uuid::new_v4(), |mut t| {
            t.title = "never".to_string();
            t
        });
        assert_eq!(before, after);
    }

    // --- insert_child ---

    #[test]
    fn test_insert_child_appends_and_unfolds_parent() {
        let (forest, [_, b, ..]) = sample_forest();
        let forest = update_task(forest, b, |mut t| {
            t.expanded = false;
            t
        });
        let new = leaf("new");
        let new_id = new.id;
        let forest = insert_child(forest, b, new);

        let parent = find_task(&forest, b).unwrap();
        assert!(parent.expanded);
        assert_eq!(parent.subtasks.last().map(|t| t.id), Some(new_id));
        assert_eq!(parent.subtasks.len(), 3);
    }

    #[test]
    fn test_insert_child_missing_parent_is_identity() {
        let (forest, _) = sample_forest();
        let before = forest.clone();
        let after = insert_child(forest, Uuid::new_v4(), leaf("orphan"));
        assert_eq!(before, after);
    }

    // --- remove_task ---

    #[test]
    fn test_remove_task_drops_whole_subtree() {
        let (forest, [_, b, c, d, e, _]) = sample_forest();
        let forest = remove_task(forest, d);

        let mut remaining = Vec::new();
        for_each_task(&forest, &mut |t| remaining.push(t.id));
        assert!(!remaining.contains(&d));
        assert!(!remaining.contains(&e));
        // b lost exactly one child
        assert_eq!(find_task(&forest, b).unwrap().subtasks.len(), 1);
        assert!(remaining.contains(&c));
    }

    #[test]
    fn test_remove_task_at_root_level() {
        let (forest, [a, ..]) = sample_forest();
        let forest = remove_task(forest, a);
        assert_eq!(titles(&forest), vec!["b", "f"]);
    }

    #[test]
    fn test_remove_task_missing_id_is_identity() {
        let (forest, _) = sample_forest();
        let before = forest.clone();
        assert_eq!(before, remove_task(forest, Uuid::new_v4()));
    }

    // --- detach ---

    #[test]
    fn test_detach_records_parent_and_index() {
        let (forest, [_, b, _, d, _, _]) = sample_forest();
        let (_, detached) = detach(forest, d);
        let detached = detached.unwrap();
        assert_eq!(detached.task.id, d);
        assert_eq!(detached.parent, Some(b));
        assert_eq!(detached.index, 1);
    }

    #[test]
    fn test_detach_root_task_has_no_parent() {
        let (forest, [_, _, _, _, _, f]) = sample_forest();
        let (rest, detached) = detach(forest, f);
        let detached = detached.unwrap();
        assert_eq!(detached.parent, None);
        assert_eq!(detached.index, 2);
        assert_eq!(titles(&rest), vec!["a", "b"]);
    }

    // --- relocate ---

    #[test]
    fn test_relocate_after_then_before_restores_sibling_order() {
        let (forest, [a, _, _, _, _, f]) = sample_forest();
        let before = forest.clone();
        let forest = relocate(forest, a, f, DropPosition::After);
        assert_eq!(titles(&forest), vec!["b", "f", "a"]);
        let forest = relocate(forest, a, f, DropPosition::Before);
        // a is back in front of f; b order differs from the original
        // only if the move touched it, which it did not
        assert_eq!(titles(&forest), vec!["b", "a", "f"]);
        let forest = relocate(forest, a, before[1].id, DropPosition::Before);
        assert_eq!(titles(&forest), titles(&before));
    }

    #[test]
    fn test_relocate_inside_appends_as_last_child_and_unfolds() {
        let (forest, [a, b, ..]) = sample_forest();
        let forest = update_task(forest, b, |mut t| {
            t.expanded = false;
            t
        });
        let forest = relocate(forest, a, b, DropPosition::Inside);
        let target = find_task(&forest, b).unwrap();
        assert!(target.expanded);
        assert_eq!(target.subtasks.last().map(|t| t.id), Some(a));
        assert_eq!(titles(&forest), vec!["b", "f"]);
    }

    #[test]
    fn test_relocate_across_parents() {
        let (forest, [_, b, c, d, _, _]) = sample_forest();
        // c moves from under b to inside d (its former sibling)
        let forest = relocate(forest, c, d, DropPosition::Inside);
        let b_node = find_task(&forest, b).unwrap();
        assert_eq!(b_node.subtasks.len(), 1);
        let d_node = find_task(&forest, d).unwrap();
        assert_eq!(d_node.subtasks.len(), 2);
        assert_eq!(d_node.subtasks.last().map(|t| t.id), Some(c));
    }

    #[test]
    fn test_relocate_onto_itself_is_identity() {
        let (forest, [a, ..]) = sample_forest();
        let before = forest.clone();
        assert_eq!(before, relocate(forest, a, a, DropPosition::After));
    }

    #[test]
    fn test_relocate_into_own_subtree_is_identity() {
        let (forest, [_, b, _, _, e, _]) = sample_forest();
        let before = forest.clone();
        // e is a grandchild of b; moving b inside e would make a cycle
        let after = relocate(forest, b, e, DropPosition::Inside);
        assert_eq!(before, after);
    }

    #[test]
    fn test_relocate_missing_dragged_is_identity() {
        let (forest, [_, _, _, _, _, f]) = sample_forest();
        let before = forest.clone();
        assert_eq!(
            before,
            relocate(forest, Uuid::new_v4(), f, DropPosition::Before)
        );
    }

    #[test]
    fn test_relocate_missing_target_rolls_back_exactly() {
        let (forest, [_, _, c, ..]) = sample_forest();
        let before = forest.clone();
        // c sits in the middle of b's children; a failed placement must
        // return it to that exact slot
        let after = relocate(forest, c, Uuid::new_v4(), DropPosition::After);
        assert_eq!(before, after);
    }
}
