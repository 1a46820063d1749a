use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossterm::terminal;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use padloop::audio::{self, ClipBuffer};
use padloop::session::Session;
use padloop::shared::{InputEvent, NUM_PADS, PadId};
use padloop::tui;

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let audio = audio::start_audio()?;
    let mut session = Session::new(audio.sender(), audio.sample_rate());

    // seed pads from any wavs sitting in a directory given on the cli
    if let Some(dir) = std::env::args().nth(1).map(PathBuf::from) {
        load_clips_from_dir(&mut session, &dir, audio.sample_rate());
    }

    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard;
    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = Duration::from_millis(16); // ~60fps
    let t0 = Instant::now();

    loop {
        let ds = session.display_state();
        term.draw(|frame| tui::view::render(frame, frame.area(), &ds))?;

        for event in tui::input::poll_input(tick_rate)? {
            if event == InputEvent::Quit {
                drop(term);
                return Ok(());
            }
            session.handle_input(event, t0.elapsed());
        }

        // a capture finished flushing out of the engine
        if let Some(rec) = audio.poll_completed_recording() {
            session.finish_recording(rec);
        }

        session.tick(t0.elapsed());
    }
}

fn load_clips_from_dir(session: &mut Session, dir: &Path, sample_rate: u32) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("cannot read {}: {e}", dir.display());
            return;
        }
    };

    let mut wavs: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
        })
        .collect();
    wavs.sort();

    for (slot, path) in wavs.into_iter().take(NUM_PADS).enumerate() {
        match ClipBuffer::load_wav(&path, sample_rate) {
            Ok(clip) => {
                if let Err(e) = session.install_clip(PadId(slot as u8), clip) {
                    log::warn!("could not install {}: {e}", path.display());
                }
            }
            Err(e) => log::warn!("failed to load {}: {e:#}", path.display()),
        }
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
