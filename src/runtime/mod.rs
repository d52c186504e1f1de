use std::env;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use tenband::audio::{PlaybackState, Player, PlayerEvent};
use tenband::config::Settings;
use tenband::dsp::BAND_CENTERS_HZ;
use tenband::library::{scan, track_label};

mod commands;
mod settings;

use commands::{CliCommand, HELP};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();

    let dir = env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| {
        env::current_dir().unwrap_or_else(|_| PathBuf::from("Music"))
    });

    let tracks = scan(&dir, &settings.library);
    info!("{} tracks in {}", tracks.len(), dir.display());

    let player = Player::open_default(&settings)?;
    spawn_event_printer(&player);

    if tracks.is_empty() {
        warn!("no audio files found in {}", dir.display());
    } else if let Err(e) = player.load_playlist(tracks) {
        warn!("could not load playlist: {e}");
    }
    if !settings.equalizer.gains.iter().all(|g| *g == 0.0) {
        println!("equalizer preset: {}", format_gains(&settings.equalizer.gains));
    }

    println!("type `help` for commands");
    let stdin = io::stdin();
    prompt()?;
    for line in stdin.lock().lines() {
        let line = line?;
        match commands::parse(&line, settings.controls.seek_seconds) {
            Ok(None) => {}
            Ok(Some(CliCommand::Quit)) => break,
            Ok(Some(cmd)) => dispatch(&player, &settings, cmd),
            Err(e) => println!("{e}"),
        }
        prompt()?;
    }

    player.dispose();
    Ok(())
}

fn prompt() -> io::Result<()> {
    print!("> ");
    io::stdout().flush()
}

/// Print notifications as they arrive. The thread ends with the player.
fn spawn_event_printer(player: &Player) {
    let events = player.subscribe();
    let playback = player.playback_handle();
    thread::spawn(move || {
        for event in events {
            match event {
                PlayerEvent::TrackChanged(index) => {
                    let path = playback
                        .lock()
                        .ok()
                        .and_then(|info| info.playlist.get(index).cloned());
                    if let Some(path) = path {
                        println!("\n▶ {}. {}", index + 1, track_label(&path));
                    }
                }
                PlayerEvent::PlaybackStateChanged(playing) => {
                    let state = playback.lock().ok().map(|info| info.state);
                    println!("\n{}", change_word(playing, state));
                }
                PlayerEvent::ErrorOccurred { message, kind } => {
                    println!("\n{kind:?} error: {message}");
                }
            }
        }
    });
}

fn dispatch(player: &Player, settings: &Settings, cmd: CliCommand) {
    let result = match cmd {
        CliCommand::Play => player.play(),
        CliCommand::PlayNumber(n) => match player.playlist().get(n - 1) {
            Some(path) => player.play_track(path),
            None => {
                println!("no track {n}");
                Ok(())
            }
        },
        CliCommand::Pause => player.pause(),
        CliCommand::Toggle => {
            if player.is_playing() {
                player.pause()
            } else {
                player.play()
            }
        }
        CliCommand::Stop => player.stop(),
        CliCommand::Next => player.next(),
        CliCommand::Previous => player.previous(),
        CliCommand::Seek(delta) => player.seek(delta),
        CliCommand::Random(flag) => {
            let enabled = flag.unwrap_or(!player.is_random());
            let result = player.set_random(enabled);
            println!("random {}", if enabled { "on" } else { "off" });
            result
        }
        CliCommand::Equalizer(gains) => player.set_equalizer(&gains),
        CliCommand::Status => {
            print_status(player);
            Ok(())
        }
        CliCommand::List => {
            print_list(player);
            Ok(())
        }
        CliCommand::Config => {
            match settings.to_toml() {
                Ok(text) => println!("{text}"),
                Err(e) => println!("cannot render settings: {e}"),
            }
            Ok(())
        }
        CliCommand::Help => {
            println!("{HELP}");
            Ok(())
        }
        CliCommand::Quit => Ok(()),
    };
    // The event printer has shown the failure already.
    if let Err(e) = result {
        debug!("command failed: {e}");
    }
}

fn print_status(player: &Player) {
    let state = state_word(player.state());
    let playlist = player.playlist();
    let now = player
        .current_index()
        .and_then(|i| playlist.get(i).map(|p| (i, p)))
        .map(|(i, p)| format!("{}. {}", i + 1, track_label(p)))
        .unwrap_or_else(|| "-".to_string());

    println!("{state}: {now}");
    println!(
        "  {} / {}   random {}",
        format_time(player.current_position()),
        format_time(player.total_duration()),
        if player.is_random() { "on" } else { "off" }
    );
    if let Some(gains) = player.equalizer() {
        println!("  eq {}", format_gains(&gains));
    }
}

fn state_word(state: PlaybackState) -> &'static str {
    match state {
        PlaybackState::Stopped => "stopped",
        PlaybackState::Loading => "loading",
        PlaybackState::Playing => "playing",
        PlaybackState::Paused => "paused",
    }
}

/// Word for a playing/not-playing flip. Leaving `Playing` can mean paused
/// or stopped, which only the snapshot knows.
fn change_word(playing: bool, state: Option<PlaybackState>) -> &'static str {
    match state {
        _ if playing => "playing",
        Some(PlaybackState::Playing) | None => "paused",
        Some(state) => state_word(state),
    }
}

fn print_list(player: &Player) {
    let current = player.current_index();
    for (i, path) in player.playlist().iter().enumerate() {
        let marker = if Some(i) == current { '*' } else { ' ' };
        println!("{marker}{:>4}. {}", i + 1, display_name(path));
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn format_time(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn format_gains(gains: &[f32]) -> String {
    gains
        .iter()
        .zip(BAND_CENTERS_HZ)
        .map(|(g, hz)| {
            if hz >= 1000.0 {
                format!("{}k:{g:+.1}", hz / 1000.0)
            } else {
                format!("{hz}:{g:+.1}")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
