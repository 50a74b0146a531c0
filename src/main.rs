use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use quicktune::playback::sync::DEFAULT_VOLUME;
use quicktune::server::{self, ServerState};
use quicktune::{
    AppError, ClockMedia, Config, FileStorage, GenerationFlow, PlaybackState,
    PlaybackSynchronizer, Store, TrackApi, TrackClient, TrackRef, format_time,
};

#[derive(Parser)]
#[command(name = "quicktune")]
#[command(about = "Pick a mood and genre, generate a track, and play it")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the mock track backend
    Serve {
        /// Port to listen on (defaults to QUICKTUNE_PORT or 3001)
        #[arg(long)]
        port: Option<u16>,
    },

    /// List the available moods
    Moods,

    /// List the available genres
    Genres,

    /// Check that the backend is up
    Health,

    /// Generate a track for a mood and genre
    Generate {
        /// Mood to generate for (prompted when omitted)
        #[arg(long)]
        mood: Option<String>,

        /// Genre to generate for (prompted when omitted)
        #[arg(long)]
        genre: Option<String>,

        /// Start playing the track once it is ready
        #[arg(long)]
        play: bool,
    },

    /// Play a recent or liked track (defaults to the most recent)
    Play {
        id: Option<u64>,

        /// Start at this fraction of the track (0.0 - 1.0)
        #[arg(long)]
        seek: Option<f64>,

        /// Playback volume (0.0 - 1.0)
        #[arg(long, default_value_t = DEFAULT_VOLUME)]
        volume: f32,
    },

    /// Show recently played and generated tracks
    Recent {
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },

    /// Forget recently played tracks
    ClearRecent,

    /// Show liked tracks
    Liked,

    /// Like or unlike a track
    Like { id: u64 },

    /// Toggle dark mode
    DarkMode,

    /// Save a track's audio file
    Download {
        id: u64,

        /// Directory to save into
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Print a shareable blurb for a track
    Share { id: u64 },
}

fn setup_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    let config = Config::from_env().context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve { port } => {
            serve(&config, port).await?;
        }
        Commands::Moods => {
            let client = TrackClient::from_config(&config)?;
            let moods = client.get_moods().await.context("Failed to fetch moods")?;
            print_choices("Moods", &moods, &open_store(&config));
        }
        Commands::Genres => {
            let client = TrackClient::from_config(&config)?;
            let genres = client.get_genres().await.context("Failed to fetch genres")?;
            print_choices("Genres", &genres, &open_store(&config));
        }
        Commands::Health => {
            health(&config).await?;
        }
        Commands::Generate { mood, genre, play } => {
            generate(&config, mood, genre, play).await?;
        }
        Commands::Play { id, seek, volume } => {
            let store = open_store(&config);
            let track = match id {
                Some(id) => find_track(&store, id)?,
                None => store
                    .snapshot()
                    .recent_tracks
                    .first()
                    .cloned()
                    .context("No recent tracks yet - generate one first")?,
            };
            play(store, track, seek, volume).await?;
        }
        Commands::Recent { limit } => {
            list_recent(&open_store(&config), limit);
        }
        Commands::ClearRecent => {
            let store = open_store(&config);
            store.clear_recent();
            println!("{}", "Recent tracks cleared".yellow());
        }
        Commands::Liked => {
            list_liked(&open_store(&config));
        }
        Commands::Like { id } => {
            let store = open_store(&config);
            let track = find_track(&store, id)?;
            store.toggle_like(Arc::clone(&track));
            if store.snapshot().is_liked(id) {
                println!("{} {}", "Liked".red(), track.title);
            } else {
                println!("{} {}", "Unliked".dimmed(), track.title);
            }
        }
        Commands::DarkMode => {
            let store = open_store(&config);
            store.toggle_dark_mode();
            let dark = store.snapshot().dark_mode;
            println!(
                "{}",
                accent(if dark { "Dark mode on" } else { "Dark mode off" }, dark)
            );
        }
        Commands::Download { id, dir } => {
            download(&config, id, &dir).await?;
        }
        Commands::Share { id } => {
            let store = open_store(&config);
            let track = find_track(&store, id)?;
            println!("{}", track.share_text());
            println!("{} - {}", track.title, track.url);
        }
    }

    Ok(())
}

fn open_store(config: &Config) -> Arc<Store> {
    Arc::new(Store::open(Box::new(FileStorage::new(
        config.storage_path.clone(),
    ))))
}

fn find_track(store: &Store, id: u64) -> Result<TrackRef> {
    store
        .snapshot()
        .find_track(id)
        .ok_or_else(|| AppError::NotFound(id.to_string()))
        .context("Only recent and liked tracks can be looked up")
}

fn accent(text: &str, dark: bool) -> ColoredString {
    if dark {
        text.magenta().bold()
    } else {
        text.blue().bold()
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.magenta} {msg}")
            .unwrap(),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

async fn serve(config: &Config, port: Option<u16>) -> Result<()> {
    let port = port.unwrap_or(config.server_port);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    server::serve(listener, ServerState::new(config.generate_delay)).await?;
    Ok(())
}

async fn health(config: &Config) -> Result<()> {
    let client = TrackClient::from_config(config)?;
    let status = client
        .health_check()
        .await
        .with_context(|| format!("Backend at {} is not reachable", client.base_url()))?;

    println!(
        "{} {} ({})",
        "Backend".cyan(),
        status.status.green(),
        status.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    );
    Ok(())
}

async fn generate(
    config: &Config,
    mood: Option<String>,
    genre: Option<String>,
    play_after: bool,
) -> Result<()> {
    let store = open_store(config);
    let dark = store.snapshot().dark_mode;
    let client = TrackClient::from_config(config)?;
    let mut flow = GenerationFlow::new(client, Arc::clone(&store));

    println!("{}", accent("Wubble QuickTune", dark));
    println!("{}", "=".repeat(50));

    let (mood, genre) = match (mood, genre) {
        (Some(mood), Some(genre)) => (mood, genre),
        (mood, genre) => {
            let options = flow
                .load_options()
                .await
                .context("Failed to fetch moods and genres")?;
            let mood = match mood {
                Some(mood) => mood,
                None => prompt_choice("What's your vibe?", &options.moods)?,
            };
            let genre = match genre {
                Some(genre) => genre,
                None => prompt_choice("Pick a genre", &options.genres)?,
            };
            (mood, genre)
        }
    };

    flow.select_mood(mood);
    flow.select_genre(genre);

    if !flow.can_generate() {
        bail!(AppError::SelectionIncomplete);
    }

    let pb = spinner("Crafting magic...");
    let result = flow.generate().await;
    pb.finish_and_clear();

    let track = result.context("Failed to generate track")?;

    println!("\n{}", "Your track is ready!".green());
    print_track(&track, store.snapshot().is_liked(track.id), dark);

    if play_after {
        play(store, track, None, DEFAULT_VOLUME).await?;
    }

    Ok(())
}

async fn play(store: Arc<Store>, track: TrackRef, seek: Option<f64>, volume: f32) -> Result<()> {
    let dark = store.snapshot().dark_mode;
    let mut player = PlaybackSynchronizer::new(ClockMedia::new(), Arc::clone(&store));
    player.set_volume(volume);
    player.attach(Arc::clone(&track));

    if let Some(fraction) = seek {
        if player.seek(fraction).is_none() {
            println!("{}", "Track length unknown; starting from the top".yellow());
        }
    }

    if player.play() != PlaybackState::Playing {
        println!("{}", "Playback could not start".red());
        return Ok(());
    }

    println!("{} {}", accent("Playing", dark), track.title);

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let total = format_time(track.duration);
    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(progress) = player.tick() {
                    pb.set_position(progress.percent.round() as u64);
                    pb.set_message(format!(
                        "{} / {} · vol {:.0}%",
                        format_time(progress.position),
                        total,
                        player.media().volume() * 100.0
                    ));
                }
                if player.state() == PlaybackState::Ended {
                    break;
                }
            }
            _ = &mut ctrl_c => {
                player.pause();
                break;
            }
        }
    }

    if player.state() == PlaybackState::Ended {
        pb.finish_with_message(format!("{} / {}", total, total));
    } else {
        pb.abandon_with_message(format!(
            "Paused at {}",
            format_time(player.media().position())
        ));
    }

    Ok(())
}

async fn download(config: &Config, id: u64, dir: &std::path::Path) -> Result<()> {
    let store = open_store(config);
    let track = find_track(&store, id)?;
    let client = TrackClient::from_config(config)?;

    let pb = spinner("Downloading...");
    let result = client.download(&track, dir).await;
    pb.finish_and_clear();

    let path = result.with_context(|| format!("Failed to download {}", track.title))?;
    println!("{} {}", "Saved".green(), path.display());
    Ok(())
}

fn prompt_choice(question: &str, choices: &[String]) -> Result<String> {
    if choices.is_empty() {
        bail!("The backend offered no choices for: {}", question);
    }

    println!("\n{}", question.yellow());
    for (i, choice) in choices.iter().enumerate() {
        println!("{:2}. {}", i + 1, choice);
    }

    loop {
        print!("Choose 1-{}: ", choices.len());
        io::stdout().flush()?;

        let mut answer = String::new();
        if io::stdin().read_line(&mut answer)? == 0 {
            bail!(AppError::SelectionIncomplete);
        }

        match answer.trim().parse::<usize>() {
            Ok(n) if (1..=choices.len()).contains(&n) => return Ok(choices[n - 1].clone()),
            _ => println!("{}", "Not a valid choice".red()),
        }
    }
}

fn print_choices(heading: &str, choices: &[String], store: &Store) {
    println!("{}", accent(heading, store.snapshot().dark_mode));
    for choice in choices {
        println!("  - {}", choice);
    }
}

fn print_track(track: &TrackRef, liked: bool, dark: bool) {
    let heart = if liked { " ♥".red() } else { "".normal() };
    println!("{}{}", accent(&track.title, dark), heart);
    println!(
        "  {} · {} · {}",
        track.mood.cyan(),
        track.genre.cyan(),
        format_time(track.duration)
    );
    println!(
        "  id {} · generated {}",
        track.id,
        track
            .generated_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
    );
}

fn list_recent(store: &Store, limit: usize) {
    let state = store.snapshot();
    println!("{}", accent("Recent Tracks", state.dark_mode));
    println!("{}", "=".repeat(50));

    if state.recent_tracks.is_empty() {
        println!("{}", "No recent tracks".yellow());
        return;
    }

    for track in state.recent_tracks.iter().take(limit) {
        print_track(track, state.is_liked(track.id), state.dark_mode);
    }

    if state.recent_tracks.len() > limit {
        println!(
            "\n{}",
            format!("{} more not shown", state.recent_tracks.len() - limit).dimmed()
        );
    }
}

fn list_liked(store: &Store) {
    let state = store.snapshot();
    println!("{}", accent("Liked Tracks", state.dark_mode));
    println!("{}", "=".repeat(50));

    if state.liked_tracks.is_empty() {
        println!("{}", "No liked tracks".yellow());
        return;
    }

    for track in &state.liked_tracks {
        print_track(track, true, state.dark_mode);
    }

    println!(
        "\n{}",
        format!("Total: {} liked", state.liked_tracks.len()).cyan()
    );
}
