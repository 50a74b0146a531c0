use std::collections::HashMap;

use chrono::Utc;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::models::Track;

pub const MOODS: [&str; 4] = ["Happy", "Sad", "Energetic", "Chill"];
pub const GENRES: [&str; 4] = ["Pop", "Lo-fi", "Cinematic", "EDM"];

/// Category served when a mood-genre pair has no samples.
pub const FALLBACK_KEY: &str = "happy-pop";

const SAMPLE_URL: &str = "https://www.learningcontainer.com/wp-content/uploads/2020/02/Kalimba.mp3";

#[derive(Debug, Clone)]
pub struct Sample {
    pub id: u64,
    pub title: &'static str,
    pub mood: &'static str,
    pub genre: &'static str,
    pub duration: f64,
    pub url: &'static str,
    pub preview: &'static str,
}

const fn sample(
    id: u64,
    title: &'static str,
    mood: &'static str,
    genre: &'static str,
    duration: f64,
) -> Sample {
    Sample {
        id,
        title,
        mood,
        genre,
        duration,
        url: SAMPLE_URL,
        preview: SAMPLE_URL,
    }
}

/// Fixed mapping from `mood-genre` key to pre-recorded samples.
pub struct Catalog {
    samples: HashMap<&'static str, Vec<Sample>>,
}

impl Default for Catalog {
    fn default() -> Self {
        let samples = HashMap::from([
            (
                "happy-pop",
                vec![
                    sample(1, "Sunny Day Vibes", "Happy", "Pop", 180.0),
                    sample(2, "Upbeat Energy", "Happy", "Pop", 165.0),
                ],
            ),
            (
                "sad-lofi",
                vec![sample(3, "Melancholy Nights", "Sad", "Lo-fi", 210.0)],
            ),
            (
                "energetic-edm",
                vec![sample(4, "Electric Rush", "Energetic", "EDM", 195.0)],
            ),
            (
                "chill-cinematic",
                vec![sample(5, "Peaceful Horizon", "Chill", "Cinematic", 240.0)],
            ),
        ]);

        Self { samples }
    }
}

pub fn category_key(mood: &str, genre: &str) -> String {
    format!("{}-{}", mood.to_lowercase(), genre.to_lowercase())
}

impl Catalog {
    pub fn samples(&self, key: &str) -> Option<&[Sample]> {
        self.samples.get(key).map(Vec::as_slice)
    }

    pub fn sample_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.samples.values().flatten().map(|s| s.id)
    }

    /// Picks a sample for the pair (or the fallback) and stamps a fresh identity.
    pub fn generate(&self, mood: &str, genre: &str) -> Option<Track> {
        let key = category_key(mood, genre);
        let candidates = self
            .samples(&key)
            .or_else(|| self.samples(FALLBACK_KEY))?;

        let mut rng = rand::thread_rng();
        let picked = candidates.choose(&mut rng)?;
        let now = Utc::now();

        Some(Track {
            id: now.timestamp_millis() as u64,
            title: format!("{} ({})", picked.title, rng.gen_range(0..100)),
            mood: picked.mood.to_string(),
            genre: picked.genre.to_string(),
            duration: picked.duration,
            url: picked.url.to_string(),
            preview: picked.preview.to_string(),
            generated_at: now,
        })
    }
}
