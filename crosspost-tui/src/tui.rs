use crate::feeders::spawn_feeders;
use crate::model::{Effect, Model, Msg, update};
use crate::view;
use anyhow::Result;
use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
        supports_keyboard_enhancement,
    },
};
use crosspost_social::Gateway;
use crosspost_store::{KeyValueStorage, SessionStore};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// Raw mode plus alternate screen, undone on drop even if the loop bails out.
struct TerminalSession {
    term: Terminal<CrosstermBackend<Stdout>>,
    enhanced_keys: bool,
}

impl TerminalSession {
    fn enter() -> Result<Self> {
        let mut stdout = io::stdout();
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen)?;
        // Needed for Ctrl+Enter to arrive as its own key on terminals that support it.
        let enhanced_keys = matches!(supports_keyboard_enhancement(), Ok(true));
        if enhanced_keys {
            execute!(
                stdout,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
            )?;
        }
        let mut term = Terminal::new(CrosstermBackend::new(stdout))?;
        term.clear()?;
        Ok(Self {
            term,
            enhanced_keys,
        })
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        if self.enhanced_keys {
            let _ = execute!(stdout, PopKeyboardEnhancementFlags);
        }
        disable_raw_mode().ok();
        let _ = execute!(stdout, LeaveAlternateScreen);
        let _ = self.term.show_cursor();
    }
}

/// Performs effects off the UI loop and reports back through `tx`.
struct EffectRunner<S> {
    store: Arc<Mutex<SessionStore<S>>>,
    gateway: Gateway,
    tx: mpsc::Sender<Msg>,
}

impl<S: KeyValueStorage + 'static> EffectRunner<S> {
    /// Returns true when one of the effects asks to quit.
    fn run_all(&self, effects: Vec<Effect>) -> bool {
        for effect in effects {
            if effect == Effect::Quit {
                return true;
            }
            self.spawn(effect);
        }
        false
    }

    fn spawn(&self, effect: Effect) {
        let store = self.store.clone();
        let gateway = self.gateway.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let msg = match effect {
                Effect::Register(registration) => {
                    tracing::debug!(kind = %registration.kind, "tui.effect.register");
                    // Only the append takes the lock; the identity call can be slow.
                    let result = match gateway.register(&registration).await {
                        Ok(session) => {
                            store.lock().await.append(session.clone()).map(|()| session)
                        }
                        Err(e) => Err(e),
                    };
                    Msg::Registered(result)
                }
                Effect::FetchProfiles => {
                    let sessions = store.lock().await.sessions().to_vec();
                    tracing::debug!(accounts = sessions.len(), "tui.effect.fetch_profiles");
                    Msg::ProfilesLoaded(gateway.fetch_profiles(&sessions).await)
                }
                Effect::Broadcast(text) => {
                    let sessions = store.lock().await.sessions().to_vec();
                    tracing::debug!(accounts = sessions.len(), "tui.effect.broadcast");
                    Msg::Broadcasted(gateway.broadcast(&sessions, &text).await)
                }
                Effect::Quit => return,
            };
            if tx.send(msg).await.is_err() {
                tracing::debug!("tui.effect.result_dropped");
            }
        });
    }
}

/// Run the interactive form until the user quits.
///
/// The store is the source of truth for sessions; the model only mirrors it
/// for display.
pub async fn run_tui<S: KeyValueStorage + 'static>(
    store: SessionStore<S>,
    gateway: Gateway,
) -> Result<()> {
    let mut model = Model::new(store.sessions().to_vec());
    let (tx, mut rx) = mpsc::channel::<Msg>(256);
    let runner = EffectRunner {
        store: Arc::new(Mutex::new(store)),
        gateway,
        tx: tx.clone(),
    };

    let mut terminal = TerminalSession::enter()?;
    spawn_feeders(tx);
    tracing::info!(accounts = model.sessions.len(), "tui.start");

    let initial = model.init();
    let mut quit = runner.run_all(initial);
    while !quit {
        if model.take_dirty() {
            view::draw(&mut terminal.term, &model)?;
        }
        let Some(msg) = rx.recv().await else {
            break;
        };
        let effects = update(&mut model, msg);
        quit = runner.run_all(effects);
    }

    tracing::info!("tui.stop");
    Ok(())
}
