//! Mood labels, the completion marker parser and the dashboard summary.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Label used whenever a mood is missing or outside the closed set.
pub const FALLBACK_MOOD: &str = "neutral";

static MOOD_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)DETECTED_MOOD:\s*([A-Za-z0-9_]+)").expect("mood marker pattern is valid")
});

// Also matches a dangling marker with no word after it.
static MOOD_MARKER_STRIP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)DETECTED_MOOD:\s*[A-Za-z0-9_]*").expect("mood strip pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    Anxious,
    Joyful,
    Jealous,
    Calm,
    Excited,
    Lonely,
    #[default]
    Neutral,
}

impl Mood {
    pub const ALL: [Mood; 10] = [
        Mood::Happy,
        Mood::Sad,
        Mood::Angry,
        Mood::Anxious,
        Mood::Joyful,
        Mood::Jealous,
        Mood::Calm,
        Mood::Excited,
        Mood::Lonely,
        Mood::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Anxious => "anxious",
            Mood::Joyful => "joyful",
            Mood::Jealous => "jealous",
            Mood::Calm => "calm",
            Mood::Excited => "excited",
            Mood::Lonely => "lonely",
            Mood::Neutral => "neutral",
        }
    }

    /// Lenient conversion: anything outside the closed set becomes `Neutral`.
    pub fn from_label(label: &str) -> Mood {
        label.parse().unwrap_or(Mood::Neutral)
    }
}

impl Display for Mood {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown mood `{0}`")]
pub struct UnknownMood(pub String);

impl FromStr for Mood {
    type Err = UnknownMood;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_lowercase();
        Mood::ALL
            .into_iter()
            .find(|mood| mood.as_str() == label)
            .ok_or(UnknownMood(s.to_owned()))
    }
}

/// A completion split into the text shown to the user and the mood it carried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodExtraction {
    pub response: String,
    /// Lower-cased word after the first marker, not necessarily a known [`Mood`].
    pub detected_mood: String,
}

/// Pulls the `DETECTED_MOOD: <word>` marker out of a completion.
///
/// The first marker supplies the label. Every marker occurrence is removed from the
/// returned text, which is then trimmed. Without a marker the label is `neutral`.
pub fn extract_mood(completion: &str) -> MoodExtraction {
    let detected_mood = MOOD_MARKER
        .captures(completion)
        .and_then(|captures| captures.get(1))
        .map(|word| word.as_str().to_lowercase())
        .unwrap_or(FALLBACK_MOOD.to_owned());

    let response = MOOD_MARKER_STRIP
        .replace_all(completion, "")
        .trim()
        .to_owned();

    MoodExtraction {
        response,
        detected_mood,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoodStat {
    pub mood: Mood,
    pub count: usize,
    /// Share of the summarised window, rounded to a whole percent.
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoodSummary {
    pub current_mood: Mood,
    pub total: usize,
    pub trends: Vec<MoodStat>,
}

impl MoodSummary {
    /// Builds the dashboard view from moods ordered newest first.
    pub fn from_logs(moods: impl IntoIterator<Item = Mood>) -> MoodSummary {
        let mut trends: Vec<MoodStat> = Vec::new();
        let mut current_mood = None;
        let mut total = 0;

        for mood in moods {
            current_mood.get_or_insert(mood);
            total += 1;
            match trends.iter_mut().find(|stat| stat.mood == mood) {
                Some(stat) => stat.count += 1,
                None => trends.push(MoodStat {
                    mood,
                    count: 1,
                    percentage: 0,
                }),
            }
        }

        // stable: ties keep first-seen order
        trends.sort_by(|a, b| b.count.cmp(&a.count));
        for stat in &mut trends {
            stat.percentage = ((stat.count as f64 / total as f64) * 100.0).round() as u32;
        }

        MoodSummary {
            current_mood: current_mood.unwrap_or_default(),
            total,
            trends,
        }
    }
}
