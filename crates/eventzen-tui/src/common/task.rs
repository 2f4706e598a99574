use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

/// Monotonic task id generator. Every async attempt gets a fresh id so the
/// reducer can tell the latest attempt from superseded ones.
#[derive(Debug, Default)]
pub struct TaskSeq {
    next: u64,
}

impl TaskSeq {
    pub fn next_id(&mut self) -> TaskId {
        let id = TaskId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    DetectLocation,
    SignIn,
    SignOut,
}

#[derive(Debug, Clone)]
pub struct TaskStarted {
    pub id: TaskId,
    pub cancel: Option<CancellationToken>,
}

#[derive(Debug)]
pub struct TaskCompleted<E> {
    pub id: TaskId,
    pub result: E,
}

/// Task lifecycle state (stored in `ShellState`, mutated only by the reducer).
#[derive(Debug, Default, Clone)]
pub struct TaskState {
    pub active: Option<TaskId>,
    pub cancel: Option<CancellationToken>,
}

impl TaskState {
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Records a newly started attempt. An older attempt still in flight is
    /// superseded: it is cancelled and its completion no longer matches `active`.
    pub fn on_started(&mut self, started: &TaskStarted) {
        if let Some(previous) = self.cancel.take() {
            previous.cancel();
        }
        self.active = Some(started.id);
        self.cancel = started.cancel.clone();
    }

    /// Clears the state if `id` is the active attempt. Returns false for stale ids.
    pub fn finish_if_active(&mut self, id: TaskId) -> bool {
        let ok = self.active == Some(id);
        if ok {
            self.clear();
        }
        ok
    }

    pub fn clear(&mut self) {
        self.active = None;
        self.cancel = None;
    }
}

#[derive(Debug, Default, Clone)]
pub struct Tasks {
    pub detect_location: TaskState,
    pub sign_in: TaskState,
    pub sign_out: TaskState,
}

impl Tasks {
    pub fn state(&self, kind: TaskKind) -> &TaskState {
        match kind {
            TaskKind::DetectLocation => &self.detect_location,
            TaskKind::SignIn => &self.sign_in,
            TaskKind::SignOut => &self.sign_out,
        }
    }

    pub fn state_mut(&mut self, kind: TaskKind) -> &mut TaskState {
        match kind {
            TaskKind::DetectLocation => &mut self.detect_location,
            TaskKind::SignIn => &mut self.sign_in,
            TaskKind::SignOut => &mut self.sign_out,
        }
    }

    pub fn is_any_running(&self) -> bool {
        self.detect_location.is_running() || self.sign_in.is_running() || self.sign_out.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(id: TaskId) -> TaskStarted {
        TaskStarted { id, cancel: None }
    }

    #[test]
    fn test_task_seq_is_monotonic() {
        let mut seq = TaskSeq::default();
        assert_eq!(seq.next_id(), TaskId(0));
        assert_eq!(seq.next_id(), TaskId(1));
        assert_eq!(seq.next_id(), TaskId(2));
    }

    #[test]
    fn test_newer_start_supersedes_older() {
        let mut seq = TaskSeq::default();
        let first = seq.next_id();
        let second = seq.next_id();

        let mut state = TaskState::default();
        state.on_started(&started(first));
        state.on_started(&started(second));

        assert!(!state.finish_if_active(first));
        assert!(state.is_running());
        assert!(state.finish_if_active(second));
        assert!(!state.is_running());
    }

    #[test]
    fn test_newer_start_cancels_older_token() {
        let older = CancellationToken::new();
        let newer = CancellationToken::new();
        let mut state = TaskState::default();
        state.on_started(&TaskStarted {
            id: TaskId(1),
            cancel: Some(older.clone()),
        });
        state.on_started(&TaskStarted {
            id: TaskId(2),
            cancel: Some(newer.clone()),
        });

        assert!(older.is_cancelled());
        assert!(!newer.is_cancelled());
    }

    #[test]
    fn test_clear_drops_cancel_token() {
        let token = CancellationToken::new();
        let mut state = TaskState::default();
        state.on_started(&TaskStarted {
            id: TaskId(7),
            cancel: Some(token),
        });
        assert!(state.cancel.is_some());
        state.clear();
        assert!(state.cancel.is_none());
        assert!(!state.is_running());
    }
}
