//! Who may see and change what.

use crate::category::{self, Category, CategoryKey};
use crate::identity::Identity;
use crate::task::Task;

/// Admins and managers see every category; owners see their own; legacy
/// owner-less categories belong to the primary identity.
pub fn can_view_category(identity: &Identity, category: &Category) -> bool {
    if identity.category_admin || identity.is_manager() {
        return true;
    }
    match &category.owner {
        Some(owner) => owner == &identity.key,
        None => identity.is_primary(),
    }
}

/// Default categories are never deletable. Otherwise category admins may
/// delete anything and owners may delete their own.
pub fn can_delete_category(identity: &Identity, key: &CategoryKey, category: &Category) -> bool {
    if category::is_default_key(key) || identity.is_manager() {
        return false;
    }
    identity.category_admin || category.owner.as_deref() == Some(identity.key.as_str())
}

/// Members see tasks they are responsible for or collaborate on.
pub fn can_view_task(identity: &Identity, task: &Task) -> bool {
    if identity.is_privileged() {
        return true;
    }
    let me = identity.display_name.trim();
    task.responsible.trim().eq_ignore_ascii_case(me)
        || task
            .collaborators
            .iter()
            .any(|name| name.trim().eq_ignore_ascii_case(me))
}

/// Tasks are edited only inside the identity's own store; managers are
/// limited to feedback.
pub fn can_edit_task(identity: &Identity, task: &Task) -> bool {
    !identity.is_manager() && can_view_task(identity, task)
}

pub fn can_set_feedback(identity: &Identity) -> bool {
    identity.is_manager()
}

/// Whole-collection rewrites are off limits for managers.
pub fn can_write_collections(identity: &Identity) -> bool {
    !identity.is_manager()
}

/// A member who hands a task to someone else stays on it as a collaborator,
/// so the task never drops out of their own view.
pub fn keep_reachable(identity: &Identity, task: &mut Task) {
    if identity.is_privileged() || can_view_task(identity, task) {
        return;
    }
    task.collaborators.push(identity.display_name.clone());
}

pub fn visible_tasks(identity: &Identity, tasks: Vec<Task>) -> Vec<Task> {
    tasks
        .into_iter()
        .filter(|task| can_view_task(identity, task))
        .collect()
}
