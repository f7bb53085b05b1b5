use crate::model::Msg;
use crossterm::event::{self, Event};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time;

const TICK_RATE: Duration = Duration::from_millis(80);
const INPUT_POLL: Duration = Duration::from_millis(100);

/// Start the terminal input reader and the spinner tick.
///
/// Both stop on their own once the receiving side of `tx` is dropped.
pub fn spawn_feeders(tx: mpsc::Sender<Msg>) {
    let tx_in = tx.clone();
    // One blocking thread for the whole session; polling lets it notice shutdown.
    tokio::task::spawn_blocking(move || {
        while !tx_in.is_closed() {
            match event::poll(INPUT_POLL) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    let _ = tx_in.blocking_send(Msg::InputError(e.to_string()));
                    break;
                }
            }
            let msg = match event::read() {
                Ok(Event::Key(key)) => Msg::Key(key),
                Ok(Event::Resize(..)) => Msg::Resize,
                Ok(_) => continue,
                Err(e) => Msg::InputError(e.to_string()),
            };
            if tx_in.blocking_send(msg).is_err() {
                break;
            }
        }
    });

    tokio::spawn(async move {
        let mut interval = time::interval(TICK_RATE);
        loop {
            interval.tick().await;
            if let Err(TrySendError::Closed(_)) = tx.try_send(Msg::Tick) {
                break;
            }
        }
    });
}
