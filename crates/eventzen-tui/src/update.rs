//! Shell reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, info};

use crate::common::TaskKind;
use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::nav::Focus;
use crate::overlays::{self, AlertState, LoginState, Overlay};
use crate::search::SearchAction;
use crate::state::{AppState, ShellState};
use crate::{auth, location, nav, search};

/// The main reducer function.
///
/// Takes the current state and an event, mutates state, and returns effects
/// for the runtime to execute.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    let effects = match event {
        UiEvent::Tick => {
            if app.shell.tasks.is_any_running() {
                app.shell.spinner_frame = app.shell.spinner_frame.wrapping_add(1);
            }
            vec![]
        }
        UiEvent::Terminal(Event::Key(key)) if key.kind == KeyEventKind::Press => {
            handle_key(app, key)
        }
        UiEvent::Terminal(Event::Paste(text)) => {
            handle_paste(app, &text);
            vec![]
        }
        UiEvent::Terminal(_) => vec![],
        UiEvent::TaskStarted { kind, started } => {
            app.shell.tasks.state_mut(kind).on_started(&started);
            vec![]
        }
        UiEvent::TaskCompleted { kind, completed } => {
            if app.shell.tasks.state_mut(kind).finish_if_active(completed.id) {
                update(app, *completed.result)
            } else {
                debug!(?kind, id = completed.id.0, "discarding stale task result");
                vec![]
            }
        }
        UiEvent::LocationResolved(result) => {
            location::handle_location_result(&mut app.shell.location, result);
            vec![]
        }
        UiEvent::SignInFinished { method, result } => {
            match auth::handle_sign_in_result(&mut app.shell.auth, method, result) {
                auth::LoginOverlayAction::Close => {
                    if matches!(app.overlay, Some(Overlay::Login(_))) {
                        app.overlay = None;
                    }
                }
                auth::LoginOverlayAction::ShowError(message) => {
                    if let Some(login) = app.overlay.as_mut().and_then(Overlay::as_login_mut) {
                        login.error = Some(message);
                    }
                }
            }
            vec![]
        }
        UiEvent::SignedOut(result) => {
            auth::handle_signed_out(result);
            vec![]
        }
    };

    prepare_effects(&mut app.shell, effects)
}

/// Assigns task ids to spawning effects and resolves cancel tokens.
///
/// Cancelling clears the task state, so a result that still arrives for the
/// cancelled attempt is treated as stale.
fn prepare_effects(shell: &mut ShellState, effects: Vec<UiEffect>) -> Vec<UiEffect> {
    effects
        .into_iter()
        .map(|effect| match effect {
            UiEffect::DetectLocation { task: None } => UiEffect::DetectLocation {
                task: Some(shell.task_seq.next_id()),
            },
            UiEffect::SignIn { task: None, method } => UiEffect::SignIn {
                task: Some(shell.task_seq.next_id()),
                method,
            },
            UiEffect::SignOut { task: None } => UiEffect::SignOut {
                task: Some(shell.task_seq.next_id()),
            },
            UiEffect::CancelTask { kind, token: None } => {
                let state = shell.tasks.state_mut(kind);
                let token = state.cancel.clone();
                if state.is_running() {
                    debug!(?kind, "cancelling task");
                }
                state.clear();
                UiEffect::CancelTask { kind, token }
            }
            other => other,
        })
        .collect()
}

fn apply_overlay_update(app: &mut AppState, update: overlays::OverlayUpdate) -> Vec<UiEffect> {
    match update.transition {
        overlays::OverlayTransition::Stay => {}
        overlays::OverlayTransition::Close => app.overlay = None,
    }
    update.effects
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        return vec![UiEffect::Quit];
    }

    if let Some(overlay) = app.overlay.as_mut() {
        let update = overlay.handle_key(&app.shell, key);
        return apply_overlay_update(app, update);
    }

    handle_main_key(app, key)
}

fn handle_paste(app: &mut AppState, text: &str) {
    let text = text.trim_end_matches(['\r', '\n']);
    match app.overlay.as_mut() {
        Some(Overlay::Login(login)) => login.paste(text),
        Some(Overlay::Alert(_)) => {}
        None if app.shell.focus == Focus::Search => app.shell.search.query.push_str(text),
        None => {}
    }
}

fn handle_main_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let shell = &mut app.shell;
    match key.code {
        KeyCode::Tab => {
            shell.focus = shell.focus.next();
            return vec![];
        }
        KeyCode::BackTab => {
            shell.focus = shell.focus.prev();
            return vec![];
        }
        _ => {}
    }

    if shell.focus == Focus::Search {
        if let SearchAction::Submit(message) = search::handle_search_key(&mut shell.search, key) {
            info!(query = %shell.search.query, "search triggered");
            app.overlay = Some(Overlay::Alert(AlertState::new("Search", message)));
        }
        return vec![];
    }

    match key.code {
        KeyCode::Char('q') => vec![UiEffect::Quit],
        KeyCode::Right => {
            shell.focus = shell.focus.next();
            vec![]
        }
        KeyCode::Left => {
            shell.focus = shell.focus.prev();
            vec![]
        }
        KeyCode::Enter | KeyCode::Char(' ') => activate(app),
        _ => vec![],
    }
}

fn activate(app: &mut AppState) -> Vec<UiEffect> {
    match app.shell.focus {
        Focus::Account => {
            if app.shell.auth.is_signed_in() {
                auth::begin_logout(&mut app.shell.auth)
            } else {
                app.overlay = Some(Overlay::Login(LoginState::open()));
                vec![]
            }
        }
        Focus::DetectLocation => vec![UiEffect::DetectLocation { task: None }],
        focus @ (Focus::Search | Focus::Category(_) | Focus::GiftCards | Focus::Offers) => {
            nav::activate_static(focus);
            vec![]
        }
    }
}

#[cfg(test)]
mod tests {
    use eventzen_core::identity::{FederatedProvider, SessionUser, SignInMethod};
    use eventzen_core::location::{DetectedLocation, LocationFailure};
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::common::{TaskCompleted, TaskId, TaskStarted};

    fn press(app: &mut AppState, code: KeyCode) -> Vec<UiEffect> {
        update(
            app,
            UiEvent::Terminal(Event::Key(KeyEvent::new(code, KeyModifiers::NONE))),
        )
    }

    fn type_text(app: &mut AppState, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn start(app: &mut AppState, kind: TaskKind, id: TaskId, cancel: Option<CancellationToken>) {
        update(
            app,
            UiEvent::TaskStarted {
                kind,
                started: TaskStarted { id, cancel },
            },
        );
    }

    fn complete(app: &mut AppState, kind: TaskKind, id: TaskId, event: UiEvent) -> Vec<UiEffect> {
        update(
            app,
            UiEvent::TaskCompleted {
                kind,
                completed: TaskCompleted {
                    id,
                    result: Box::new(event),
                },
            },
        )
    }

    fn detect_task(effects: &[UiEffect]) -> TaskId {
        match effects {
            [UiEffect::DetectLocation { task: Some(id) }] => *id,
            other => panic!("expected DetectLocation, got {other:?}"),
        }
    }

    fn sign_in_task(effects: &[UiEffect]) -> TaskId {
        match effects {
            [UiEffect::SignIn { task: Some(id), .. }] => *id,
            other => panic!("expected SignIn, got {other:?}"),
        }
    }

    fn springfield() -> DetectedLocation {
        DetectedLocation {
            city: "Springfield".into(),
            state: Some("IL".into()),
            country: Some("US".into()),
        }
    }

    fn ada() -> SessionUser {
        SessionUser {
            uid: "uid-ada".into(),
            email: Some("ada@example.com".into()),
            display_name: Some("Ada".into()),
            provider: "google.com".into(),
        }
    }

    fn focus_on(app: &mut AppState, target: Focus) {
        while app.shell.focus != target {
            press(app, KeyCode::Tab);
        }
    }

    #[test]
    fn test_search_shows_acknowledgment_and_changes_nothing_else() {
        let mut app = AppState::new();
        app.shell.location.error = Some("Unable to retrieve location.".into());
        type_text(&mut app, "concerts");

        let effects = press(&mut app, KeyCode::Enter);
        assert!(effects.is_empty());
        match &app.overlay {
            Some(Overlay::Alert(alert)) => {
                assert_eq!(alert.message, "You searched for: concerts");
            }
            other => panic!("expected alert, got {other:?}"),
        }
        assert_eq!(app.shell.search.query, "concerts");
        assert_eq!(app.shell.focus, Focus::Search);
        assert!(app.shell.location.detected.is_none());
        assert_eq!(
            app.shell.location.error.as_deref(),
            Some("Unable to retrieve location.")
        );
        assert!(app.shell.auth.user.is_none());
        assert!(!app.shell.tasks.is_any_running());

        press(&mut app, KeyCode::Enter);
        assert!(app.overlay.is_none());
    }

    #[test]
    fn test_q_types_into_search_but_quits_elsewhere() {
        let mut app = AppState::new();
        assert!(press(&mut app, KeyCode::Char('q')).is_empty());
        assert_eq!(app.shell.search.query, "q");

        press(&mut app, KeyCode::Tab);
        let effects = press(&mut app, KeyCode::Char('q'));
        assert!(matches!(effects.as_slice(), [UiEffect::Quit]));
    }

    #[test]
    fn test_ctrl_c_always_quits() {
        let mut app = AppState::new();
        app.overlay = Some(Overlay::Login(LoginState::open()));
        let effects = update(
            &mut app,
            UiEvent::Terminal(Event::Key(KeyEvent::new(
                KeyCode::Char('c'),
                KeyModifiers::CONTROL,
            ))),
        );
        assert!(matches!(effects.as_slice(), [UiEffect::Quit]));
    }

    #[test]
    fn test_detect_location_success_sets_location() {
        let mut app = AppState::new();
        app.shell.location.error = Some("Unable to retrieve your location.".into());
        focus_on(&mut app, Focus::DetectLocation);

        let id = detect_task(&press(&mut app, KeyCode::Enter));
        start(&mut app, TaskKind::DetectLocation, id, None);
        assert!(app.shell.tasks.state(TaskKind::DetectLocation).is_running());

        complete(
            &mut app,
            TaskKind::DetectLocation,
            id,
            UiEvent::LocationResolved(Ok(springfield())),
        );
        assert_eq!(app.shell.location.detected, Some(springfield()));
        assert!(app.shell.location.error.is_none());
        assert!(!app.shell.tasks.state(TaskKind::DetectLocation).is_running());
    }

    #[test]
    fn test_detect_location_empty_result_sets_error() {
        let mut app = AppState::new();
        focus_on(&mut app, Focus::DetectLocation);
        let id = detect_task(&press(&mut app, KeyCode::Enter));
        start(&mut app, TaskKind::DetectLocation, id, None);
        complete(
            &mut app,
            TaskKind::DetectLocation,
            id,
            UiEvent::LocationResolved(Err(LocationFailure::NoResults)),
        );
        assert!(app.shell.location.detected.is_none());
        assert_eq!(
            app.shell.location.error.as_deref(),
            Some("Unable to retrieve city and state.")
        );
    }

    #[test]
    fn test_stale_location_result_is_discarded() {
        let mut app = AppState::new();
        focus_on(&mut app, Focus::DetectLocation);

        let first = detect_task(&press(&mut app, KeyCode::Enter));
        start(&mut app, TaskKind::DetectLocation, first, None);
        let second = detect_task(&press(&mut app, KeyCode::Enter));
        start(&mut app, TaskKind::DetectLocation, second, None);
        assert_ne!(first, second);

        complete(
            &mut app,
            TaskKind::DetectLocation,
            first,
            UiEvent::LocationResolved(Ok(springfield())),
        );
        assert!(app.shell.location.detected.is_none());
        assert!(app.shell.tasks.state(TaskKind::DetectLocation).is_running());

        complete(
            &mut app,
            TaskKind::DetectLocation,
            second,
            UiEvent::LocationResolved(Err(LocationFailure::Geocoding)),
        );
        assert!(app.shell.location.detected.is_none());
        assert_eq!(
            app.shell.location.error.as_deref(),
            Some("Unable to retrieve location.")
        );
    }

    #[test]
    fn test_federated_login_then_logout() {
        let mut app = AppState::new();
        focus_on(&mut app, Focus::Account);
        assert!(press(&mut app, KeyCode::Enter).is_empty());
        assert!(matches!(app.overlay, Some(Overlay::Login(_))));

        let effects = press(&mut app, KeyCode::Enter);
        assert!(matches!(
            effects.as_slice(),
            [UiEffect::SignIn {
                method: SignInMethod::Federated(FederatedProvider::Google),
                ..
            }]
        ));
        let id = sign_in_task(&effects);
        start(&mut app, TaskKind::SignIn, id, Some(CancellationToken::new()));
        complete(
            &mut app,
            TaskKind::SignIn,
            id,
            UiEvent::SignInFinished {
                method: "Google",
                result: Ok(ada()),
            },
        );
        assert_eq!(app.shell.auth.user, Some(ada()));
        assert!(app.overlay.is_none());

        let effects = press(&mut app, KeyCode::Enter);
        assert!(app.shell.auth.user.is_none());
        assert!(matches!(
            effects.as_slice(),
            [UiEffect::SignOut { task: Some(_) }]
        ));
    }

    #[test]
    fn test_sign_in_failure_is_shown_in_dialog() {
        let mut app = AppState::new();
        app.overlay = Some(Overlay::Login(LoginState::open()));
        let id = sign_in_task(&press(&mut app, KeyCode::Enter));
        start(&mut app, TaskKind::SignIn, id, None);
        complete(
            &mut app,
            TaskKind::SignIn,
            id,
            UiEvent::SignInFinished {
                method: "Google",
                result: Err("Sign-in failed: OPERATION_NOT_ALLOWED".into()),
            },
        );
        match &app.overlay {
            Some(Overlay::Login(login)) => assert_eq!(
                login.error.as_deref(),
                Some("Sign-in failed: OPERATION_NOT_ALLOWED")
            ),
            other => panic!("expected login dialog, got {other:?}"),
        }
        assert!(app.shell.auth.user.is_none());
    }

    #[test]
    fn test_dismissing_dialog_discards_credentials_draft() {
        let mut app = AppState::new();
        app.overlay = Some(Overlay::Login(LoginState::open()));
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "ada@example.com");
        match &app.overlay {
            Some(Overlay::Login(login)) => assert_eq!(login.email, "ada@example.com"),
            other => panic!("expected login dialog, got {other:?}"),
        }

        press(&mut app, KeyCode::Esc);
        assert!(app.overlay.is_none());

        focus_on(&mut app, Focus::Account);
        press(&mut app, KeyCode::Enter);
        match &app.overlay {
            Some(Overlay::Login(login)) => {
                assert!(login.email.is_empty());
                assert!(login.password.is_empty());
            }
            other => panic!("expected login dialog, got {other:?}"),
        }
    }

    #[test]
    fn test_closing_dialog_cancels_pending_sign_in() {
        let mut app = AppState::new();
        app.overlay = Some(Overlay::Login(LoginState::open()));
        let id = sign_in_task(&press(&mut app, KeyCode::Enter));
        let token = CancellationToken::new();
        start(&mut app, TaskKind::SignIn, id, Some(token.clone()));

        let effects = press(&mut app, KeyCode::Esc);
        match effects.as_slice() {
            [UiEffect::CancelTask {
                kind: TaskKind::SignIn,
                token: Some(cancel),
            }] => {
                cancel.cancel();
            }
            other => panic!("expected CancelTask, got {other:?}"),
        }
        assert!(token.is_cancelled());
        assert!(!app.shell.tasks.state(TaskKind::SignIn).is_running());

        complete(
            &mut app,
            TaskKind::SignIn,
            id,
            UiEvent::SignInFinished {
                method: "Google",
                result: Ok(ada()),
            },
        );
        assert!(app.shell.auth.user.is_none());
    }

    #[test]
    fn test_repeated_sign_in_leaves_no_attempt_running_after_close() {
        let mut app = AppState::new();
        app.overlay = Some(Overlay::Login(LoginState::open()));
        let first_id = sign_in_task(&press(&mut app, KeyCode::Enter));
        let first = CancellationToken::new();
        start(&mut app, TaskKind::SignIn, first_id, Some(first.clone()));

        assert!(press(&mut app, KeyCode::Enter).is_empty());

        let second_id = TaskId(first_id.0 + 1);
        let second = CancellationToken::new();
        start(&mut app, TaskKind::SignIn, second_id, Some(second.clone()));
        assert!(first.is_cancelled());

        match press(&mut app, KeyCode::Esc).as_slice() {
            [UiEffect::CancelTask {
                token: Some(cancel),
                ..
            }] => cancel.cancel(),
            other => panic!("expected CancelTask, got {other:?}"),
        }
        assert!(first.is_cancelled());
        assert!(second.is_cancelled());
    }

    #[test]
    fn test_paste_goes_to_focused_field() {
        let mut app = AppState::new();
        update(&mut app, UiEvent::Terminal(Event::Paste("live music\n".into())));
        assert_eq!(app.shell.search.query, "live music");

        app.overlay = Some(Overlay::Login(LoginState::open()));
        update(&mut app, UiEvent::Terminal(Event::Paste("ignored".into())));
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        update(&mut app, UiEvent::Terminal(Event::Paste("ada@example.com".into())));
        match &app.overlay {
            Some(Overlay::Login(login)) => assert_eq!(login.email, "ada@example.com"),
            other => panic!("expected login dialog, got {other:?}"),
        }
        assert_eq!(app.shell.search.query, "live music");
    }

    #[test]
    fn test_tick_advances_spinner_only_while_busy() {
        let mut app = AppState::new();
        update(&mut app, UiEvent::Tick);
        assert_eq!(app.shell.spinner_frame, 0);

        start(&mut app, TaskKind::DetectLocation, TaskId(0), None);
        update(&mut app, UiEvent::Tick);
        assert_eq!(app.shell.spinner_frame, 1);
    }

    #[test]
    fn test_sign_out_failure_keeps_session_cleared() {
        let mut app = AppState::new();
        app.shell.auth.user = Some(ada());
        focus_on(&mut app, Focus::Account);
        let effects = press(&mut app, KeyCode::Enter);
        let id = match effects.as_slice() {
            [UiEffect::SignOut { task: Some(id) }] => *id,
            other => panic!("expected SignOut, got {other:?}"),
        };
        start(&mut app, TaskKind::SignOut, id, None);
        complete(
            &mut app,
            TaskKind::SignOut,
            id,
            UiEvent::SignedOut(Err("network down".into())),
        );
        assert!(app.shell.auth.user.is_none());
    }
}
