//! Form state and the pure transition function driving it.
//!
//! [`update`] never touches the network or the terminal. Anything slow comes
//! back out as an [`Effect`]; the runtime performs it and feeds the result in
//! as another [`Msg`].
use crate::activity::ActivityLine;
use crate::input::TextInput;
use crate::styles;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crosspost_common::{CrosspostError, NetworkKind, ProfileSummary, Session};
use crosspost_social::{BroadcastReport, ProfileOutcome, Registration};
use ratatui::style::Style;

const BRAILLE_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const MAX_ACTIVITY: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Kind,
    Instance,
    Username,
    Key,
    Register,
    Compose,
    Send,
}

impl Focus {
    const ORDER: [Focus; 7] = [
        Focus::Kind,
        Focus::Instance,
        Focus::Username,
        Focus::Key,
        Focus::Register,
        Focus::Compose,
        Focus::Send,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// What the accounts pane shows for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileRow {
    Loaded(ProfileSummary),
    Failed {
        kind: NetworkKind,
        instance: String,
        message: String,
    },
}

pub enum Msg {
    Key(KeyEvent),
    Registered(Result<Session, CrosspostError>),
    ProfilesLoaded(Vec<ProfileOutcome>),
    Broadcasted(BroadcastReport),
    InputError(String),
    Resize,
    Tick,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Register(Registration),
    FetchProfiles,
    Broadcast(String),
    Quit,
}

pub struct Model {
    pub kind: NetworkKind,
    pub instance: TextInput,
    pub username: TextInput,
    pub key: TextInput,
    pub compose: TextInput,
    pub focus: Focus,

    pub sessions: Vec<Session>,
    pub profiles: Vec<ProfileRow>,
    pub activity: Vec<ActivityLine>,

    pub busy: u32,
    spin_idx: usize,
    dirty: bool,
}

impl Model {
    pub fn new(sessions: Vec<Session>) -> Self {
        let mut model = Self {
            kind: NetworkKind::Mastodon,
            instance: TextInput::default(),
            username: TextInput::default(),
            key: TextInput::default(),
            compose: TextInput::default(),
            focus: Focus::Kind,
            sessions,
            profiles: Vec::new(),
            activity: Vec::new(),
            busy: 0,
            spin_idx: 0,
            dirty: true,
        };
        model.log(
            format!("{} account(s) loaded.", model.sessions.len()),
            styles::system(),
        );
        model
    }

    /// Effects to run once the runtime is up.
    pub fn init(&mut self) -> Vec<Effect> {
        self.refresh_profiles()
    }

    pub fn spinner(&self) -> &'static str {
        if self.busy > 0 {
            BRAILLE_FRAMES[self.spin_idx % BRAILLE_FRAMES.len()]
        } else {
            " "
        }
    }

    /// True once after every visible change.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    fn log<S: Into<String>>(&mut self, text: S, style: Style) {
        self.activity.push(ActivityLine::new(text.into(), style));
        if self.activity.len() > MAX_ACTIVITY {
            let excess = self.activity.len() - MAX_ACTIVITY;
            self.activity.drain(..excess);
        }
        self.dirty = true;
    }

    fn set_busy(&mut self, on: bool) {
        if on {
            self.busy = self.busy.saturating_add(1)
        } else {
            self.busy = self.busy.saturating_sub(1)
        }
        self.dirty = true;
    }

    fn focused_input(&mut self) -> Option<&mut TextInput> {
        match self.focus {
            Focus::Instance => Some(&mut self.instance),
            Focus::Username => Some(&mut self.username),
            Focus::Key => Some(&mut self.key),
            Focus::Compose => Some(&mut self.compose),
            _ => None,
        }
    }

    fn submit_registration(&mut self) -> Vec<Effect> {
        let registration = Registration::new(
            self.kind,
            self.instance.as_str(),
            self.username.as_str(),
            self.key.as_str(),
        );
        if let Err(e) = registration.validate() {
            self.log(format!("× {e}"), styles::error());
            return Vec::new();
        }
        self.log(
            format!(
                "Registering {} account on {}…",
                registration.kind, registration.instance
            ),
            styles::system(),
        );
        self.set_busy(true);
        vec![Effect::Register(registration)]
    }

    fn submit_post(&mut self) -> Vec<Effect> {
        if self.compose.is_blank() {
            return Vec::new();
        }
        if self.sessions.is_empty() {
            self.log("× No accounts registered yet.", styles::error());
            return Vec::new();
        }
        let text = self.compose.take();
        self.dirty = true;
        self.log(
            format!("Posting to {} account(s)…", self.sessions.len()),
            styles::system(),
        );
        self.set_busy(true);
        vec![Effect::Broadcast(text)]
    }

    fn refresh_profiles(&mut self) -> Vec<Effect> {
        if self.sessions.is_empty() {
            return Vec::new();
        }
        self.set_busy(true);
        vec![Effect::FetchProfiles]
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let posting = matches!(self.focus, Focus::Compose | Focus::Send);

        match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') if ctrl => return vec![Effect::Quit],
            KeyCode::Char('r') if ctrl => return self.refresh_profiles(),
            KeyCode::Char('s') if ctrl => return self.submit_post(),
            // Most terminals deliver Ctrl+Enter as Ctrl+J.
            KeyCode::Enter | KeyCode::Char('j') if ctrl && posting => return self.submit_post(),
            KeyCode::Tab => {
                self.focus = self.focus.next();
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
            }
            KeyCode::Enter => match self.focus {
                Focus::Compose => self.compose.insert_char('\n'),
                Focus::Send => return self.submit_post(),
                _ => return self.submit_registration(),
            },
            KeyCode::Char(' ') if self.focus == Focus::Register => {
                return self.submit_registration();
            }
            KeyCode::Char(' ') if self.focus == Focus::Send => return self.submit_post(),
            KeyCode::Left | KeyCode::Up if self.focus == Focus::Kind => {
                self.kind = self.kind.next();
            }
            KeyCode::Right | KeyCode::Down | KeyCode::Char(' ') if self.focus == Focus::Kind => {
                self.kind = self.kind.next();
            }
            code => {
                let Some(input) = self.focused_input() else {
                    return Vec::new();
                };
                match code {
                    KeyCode::Left => input.left(),
                    KeyCode::Right => input.right(),
                    KeyCode::Home => input.home(),
                    KeyCode::End => input.end(),
                    KeyCode::Backspace => input.backspace(),
                    KeyCode::Delete => input.delete(),
                    KeyCode::Esc => input.clear(),
                    KeyCode::Char(ch) if !ctrl => input.insert_char(ch),
                    _ => return Vec::new(),
                }
            }
        }
        self.dirty = true;
        Vec::new()
    }

    fn on_registered(&mut self, result: Result<Session, CrosspostError>) -> Vec<Effect> {
        self.set_busy(false);
        match result {
            Ok(session) => {
                self.log(
                    format!("✓ Registered {} ({})", session.handle(), session.kind),
                    styles::success(),
                );
                self.sessions.push(session);
                self.username.clear();
                self.key.clear();
                self.refresh_profiles()
            }
            Err(e) => {
                self.log(format!("× Registration failed: {e}"), styles::error());
                Vec::new()
            }
        }
    }

    fn on_profiles(&mut self, outcomes: Vec<ProfileOutcome>) {
        self.set_busy(false);
        let mut failures = Vec::new();
        self.profiles = outcomes
            .into_iter()
            .map(|outcome| match outcome.result {
                Ok(summary) => ProfileRow::Loaded(summary),
                Err(e) => {
                    failures.push(format!(
                        "× Profile lookup failed for {} ({}): {e}",
                        outcome.instance, outcome.kind
                    ));
                    ProfileRow::Failed {
                        kind: outcome.kind,
                        instance: outcome.instance,
                        message: e.to_string(),
                    }
                }
            })
            .collect();
        for line in failures {
            self.log(line, styles::error());
        }
        self.dirty = true;
    }

    fn on_broadcast(&mut self, report: BroadcastReport) {
        self.set_busy(false);
        for outcome in &report.outcomes {
            match &outcome.result {
                Ok(receipt) => {
                    let at = receipt.url.as_deref().unwrap_or(&receipt.id);
                    self.log(
                        format!("✓ {} ({}): {at}", outcome.handle(), outcome.kind),
                        styles::success(),
                    );
                }
                Err(e) => self.log(
                    format!("× {} ({}): {e}", outcome.handle(), outcome.kind),
                    styles::error(),
                ),
            }
        }
        let ok = report.succeeded().count();
        self.log(
            format!("Posted to {ok} of {} account(s).", report.outcomes.len()),
            if report.is_complete_success() {
                styles::success()
            } else {
                styles::label()
            },
        );
    }
}

/// Apply one message and return the work it asks for.
pub fn update(model: &mut Model, msg: Msg) -> Vec<Effect> {
    match msg {
        Msg::Key(key) => model.handle_key(key),
        Msg::Registered(result) => model.on_registered(result),
        Msg::ProfilesLoaded(outcomes) => {
            model.on_profiles(outcomes);
            Vec::new()
        }
        Msg::Broadcasted(report) => {
            model.on_broadcast(report);
            Vec::new()
        }
        Msg::InputError(e) => {
            model.log(format!("× Input: {e}"), styles::error());
            Vec::new()
        }
        Msg::Resize => {
            model.dirty = true;
            Vec::new()
        }
        Msg::Tick => {
            if model.busy > 0 {
                model.spin_idx = (model.spin_idx + 1) % BRAILLE_FRAMES.len();
                model.dirty = true;
            }
            Vec::new()
        }
    }
}
