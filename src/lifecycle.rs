use crate::model::{parse_clock_time, sort_for_display, DraftError, Task, TaskDraft};
use crate::reminder::{Clock, Notifier, ReminderScheduler, ScheduleOutcome, Scheduler};
use crate::store::TaskStore;
use tracing::{debug, info, warn};

/// Entry point for every task mutation. Keeps each task's reminder in step
/// with the stored task. The task list is the source of truth: reminder
/// failures are logged and never fail the mutation.
pub struct TaskLifecycle<S, N, C> {
    store: TaskStore,
    reminders: ReminderScheduler<S, N, C>,
}

impl<S: Scheduler, N: Notifier, C: Clock> TaskLifecycle<S, N, C> {
    pub fn new(store: TaskStore, reminders: ReminderScheduler<S, N, C>) -> Self {
        TaskLifecycle { store, reminders }
    }

    #[cfg(test)]
    pub fn reminders(&self) -> &ReminderScheduler<S, N, C> {
        &self.reminders
    }

    pub fn reminders_mut(&mut self) -> &mut ReminderScheduler<S, N, C> {
        &mut self.reminders
    }

    pub fn tasks(&mut self) -> Vec<Task> {
        self.load()
    }

    /// Tasks in display order.
    pub fn sorted_tasks(&mut self) -> Vec<Task> {
        let mut tasks = self.load();
        sort_for_display(&mut tasks);
        tasks
    }

    /// Validate and store a new task, then schedule its reminder. A draft
    /// with missing fields changes nothing.
    pub fn create(&mut self, draft: TaskDraft) -> Result<Task, DraftError> {
        draft.validate()?;

        let mut tasks = self.load();
        let notification_id = self.next_notification_id(&tasks);
        let task = draft.into_task(notification_id)?;
        let start = task.start_time.as_deref().and_then(parse_clock_time);
        let end = parse_clock_time(&task.deadline_time);
        if let (Some(start), Some(end)) = (start, end) {
            if start >= end {
                warn!(title = %task.title, %start, %end, "task starts after it ends");
            }
        }

        info!(title = %task.title, id = task.notification_id, "adding task");
        tasks.push(task.clone());
        self.store.save(&tasks);
        self.schedule(&task);
        Ok(task)
    }

    /// Mark `task` as completed. Its pending reminder is cancelled.
    pub fn complete(&mut self, task: &Task) -> Option<Task> {
        let mut completed = task.clone();
        completed.is_completed = true;
        if self.update(task, completed.clone()) {
            Some(completed)
        } else {
            None
        }
    }

    /// Replace `old` with `new` and move the reminder over. Returns false if
    /// `old` is not in the store.
    pub fn update(&mut self, old: &Task, new: Task) -> bool {
        let mut tasks = self.load();
        let index = match position_of(&tasks, old) {
            Some(index) => index,
            None => {
                debug!(id = old.notification_id, "no task to update");
                return false;
            }
        };

        self.cancel(old.notification_id);
        tasks[index] = new.clone();
        self.store.save(&tasks);
        if !new.is_completed {
            self.schedule(&new);
        }
        true
    }

    /// Cancel the reminder for `task` and drop it from the store.
    pub fn remove(&mut self, task: &Task) -> bool {
        let mut tasks = self.load();
        match position_of(&tasks, task) {
            Some(index) => {
                self.cancel(task.notification_id);
                let removed = tasks.remove(index);
                info!(title = %removed.title, id = removed.notification_id, "removing task");
                self.store.save(&tasks);
                true
            }
            None => false,
        }
    }

    pub fn remove_by_notification_id(&mut self, notification_id: i32) -> bool {
        let tasks = self.load();
        match tasks.iter().find(|t| t.notification_id == notification_id) {
            Some(task) => self.remove(task),
            None => {
                debug!(id = notification_id, "no task owns this notification");
                false
            }
        }
    }

    /// Cancel every reminder and empty the store.
    pub fn clear_all(&mut self) {
        let tasks = self.load();
        for task in &tasks {
            self.cancel(task.notification_id);
        }
        info!(count = tasks.len(), "clearing all tasks");
        self.store.save(&[]);
    }

    /// Load the stored list. Tasks saved without a notification id, or
    /// sharing one with an earlier task, get a fresh id and the list is
    /// saved back.
    fn load(&mut self) -> Vec<Task> {
        let mut tasks = self.store.load();
        let mut reassigned = 0;
        for index in 0..tasks.len() {
            let id = tasks[index].notification_id;
            if id != 0 && !id_in_use(&tasks[..index], id) {
                continue;
            }
            let fresh = self.next_notification_id(&tasks);
            debug!(title = %tasks[index].title, old = id, new = fresh, "assigning notification id");
            tasks[index].notification_id = fresh;
            reassigned += 1;
        }
        if reassigned > 0 {
            info!(count = reassigned, "gave stored tasks unique notification ids");
            self.store.save(&tasks);
        }
        tasks
    }

    fn schedule(&mut self, task: &Task) {
        match self.reminders.schedule(task) {
            Ok(ScheduleOutcome::Scheduled(at)) => {
                debug!(id = task.notification_id, %at, "reminder set")
            }
            Ok(outcome) => debug!(id = task.notification_id, ?outcome, "no reminder set"),
            Err(e) => warn!("{:#}", anyhow::Error::new(e)),
        }
    }

    fn cancel(&mut self, notification_id: i32) {
        if let Err(e) = self.reminders.cancel(notification_id) {
            warn!("{:#}", anyhow::Error::new(e));
        }
    }

    /// Derived from the clock, then bumped until it is unused and non-zero.
    fn next_notification_id(&self, tasks: &[Task]) -> i32 {
        let millis = self.reminders.clock().now().and_utc().timestamp_millis();
        let mut id = millis.rem_euclid(i64::from(i32::MAX)) as i32;
        while id == 0 || id_in_use(tasks, id) {
            id = if id == i32::MAX { 1 } else { id + 1 };
        }
        id
    }
}

/// Where `task` sits in `tasks`, matched on its notification id together
/// with its title and deadline date.
fn position_of(tasks: &[Task], task: &Task) -> Option<usize> {
    tasks.iter().position(|t| {
        t.notification_id == task.notification_id
            && t.title == task.title
            && t.deadline_date == task.deadline_date
    })
}

fn id_in_use(tasks: &[Task], notification_id: i32) -> bool {
    tasks.iter().any(|t| t.notification_id == notification_id)
}
