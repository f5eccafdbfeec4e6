//! Terminal mine runner (default binary).
//!
//! Loads levels from `BOULDER_LEVELS_DIR`, renders with the framebuffer
//! renderer, and optionally serves the remote control adapter alongside the
//! keyboard.

use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use crossterm::event::{self, Event, KeyEventKind};
use log::{debug, info, warn};

use tui_boulder::adapter::{state_hash, Adapter, InboundPayload, StateHash};
use tui_boulder::core::{GameSnapshot, Session, SessionStatus};
use tui_boulder::input::{handle_key_event, should_quit, InputHandler};
use tui_boulder::level::LevelDirectory;
use tui_boulder::term::{AdapterStatusView, FrameBuffer, GameView, TerminalRenderer, Viewport};
use tui_boulder::types::TICK_MS;
use tui_boulder::{logging, GameConfig, JsonScoreStore};

type GameSession = Session<LevelDirectory, JsonScoreStore>;

fn main() -> Result<()> {
    let config = GameConfig::from_env();
    logging::init(config.log_path.as_deref(), config.log_level)?;

    let scores = match config.scores_path.as_ref() {
        Some(path) => JsonScoreStore::open(path)?,
        None => JsonScoreStore::in_memory(),
    };
    let levels = LevelDirectory::new(&config.levels_dir);
    info!(
        "{} levels in {}",
        levels.count(),
        config.levels_dir.display()
    );

    let mut session = Session::new(levels, scores, config.seed);
    session.start(config.start_level);
    if let SessionStatus::Failed(message) = session.status() {
        bail!("{}", message);
    }

    let mut adapter = match Adapter::start_from_env() {
        Ok(adapter) => adapter,
        Err(e) => {
            warn!("remote control unavailable: {:#}", e);
            None
        }
    };

    let mut term = TerminalRenderer::new();
    term.enter()?;

    let result = run(&mut term, &mut session, adapter.as_mut());

    // Always try to restore terminal state.
    let _ = term.exit();
    result
}

fn run(
    term: &mut TerminalRenderer,
    session: &mut GameSession,
    mut adapter: Option<&mut Adapter>,
) -> Result<()> {
    let view = GameView::default();
    let mut input_handler = InputHandler::new();
    let mut fb = FrameBuffer::new(0, 0);
    let mut snap = GameSnapshot::default();
    let mut last_broadcast: Option<StateHash> = None;

    let mut last_tick = Instant::now();
    let tick_duration = Duration::from_millis(TICK_MS as u64);

    loop {
        // Render.
        session.snapshot_into(&mut snap);
        let adapter_view = adapter.as_deref().map(|a| {
            let status = a.status();
            AdapterStatusView {
                enabled: true,
                client_count: status.client_count,
                controller_id: status.controller_id,
                streaming_count: status.streaming_count,
            }
        });
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        view.render_into(&snap, adapter_view.as_ref(), Viewport::new(w, h), &mut fb);
        term.draw_swap(&mut fb)?;

        // Input with timeout until next tick.
        let timeout = tick_duration
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => match key.kind {
                    KeyEventKind::Press => {
                        if should_quit(key) {
                            return Ok(());
                        }
                        if let Some(action) = input_handler.handle_key_press(key.code) {
                            session.apply_action(action);
                        } else if let Some(action) = handle_key_event(key) {
                            // Moves are owned by the input handler's repeat logic.
                            if action.direction().is_none() {
                                session.apply_action(action);
                            }
                        }
                    }
                    KeyEventKind::Repeat => {}
                    KeyEventKind::Release => {
                        input_handler.handle_key_release(key.code);
                    }
                },
                Event::Resize(..) => term.invalidate(),
                _ => {}
            }
        }

        // Remote commands.
        if let Some(adapter) = adapter.as_deref_mut() {
            while let Some(cmd) = adapter.try_recv() {
                match cmd.payload {
                    InboundPayload::Actions(actions) => {
                        let mut applied = 0u32;
                        for action in actions {
                            if session.apply_action(action) {
                                applied += 1;
                            }
                        }
                        adapter.ack(cmd.client_id, cmd.seq, applied);
                    }
                    InboundPayload::SnapshotRequest => {
                        session.snapshot_into(&mut snap);
                        adapter.observe_to(cmd.client_id, &snap);
                    }
                }
            }
        }

        // Tick.
        let elapsed = last_tick.elapsed();
        if elapsed >= tick_duration {
            last_tick = Instant::now();
            let elapsed_ms = elapsed.as_millis().min(u128::from(u32::MAX)) as u32;

            for action in input_handler.update(elapsed_ms) {
                session.apply_action(action);
            }
            session.advance(elapsed_ms);

            for event in session.take_events() {
                debug!("{} {:?} {}", event.topic, event.cell, event.value);
            }

            if let Some(adapter) = adapter.as_deref_mut() {
                session.snapshot_into(&mut snap);
                let hash = state_hash(&snap);
                if last_broadcast != Some(hash) {
                    adapter.broadcast(&snap);
                    last_broadcast = Some(hash);
                }
            }
        }

        if let SessionStatus::Failed(message) = session.status() {
            bail!("{}", message);
        }
    }
}
