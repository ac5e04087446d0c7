use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// One row of the prepared working set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    /// 1-based position in the working set (1 = most streamed).
    pub rank: usize,
    pub name: String,
    pub artists: String,
    pub streams: u64,
    pub spotify_playlists: u64,
    pub apple_playlists: u64,
    pub deezer_playlists: u64,
    pub danceability: f64,
    pub valence: f64,
    pub energy: f64,
    pub acousticness: f64,
    pub liveness: f64,
    pub speechiness: f64,
    pub key: Key,
    pub mode: Mode,
}

impl Track {
    pub fn feature(&self, feature: AudioFeature) -> f64 {
        match feature {
            AudioFeature::Danceability => self.danceability,
            AudioFeature::Valence => self.valence,
            AudioFeature::Energy => self.energy,
            AudioFeature::Acousticness => self.acousticness,
            AudioFeature::Liveness => self.liveness,
            AudioFeature::Speechiness => self.speechiness,
        }
    }

    pub fn playlists(&self, platform: Platform) -> u64 {
        match platform {
            Platform::Spotify => self.spotify_playlists,
            Platform::Apple => self.apple_playlists,
            Platform::Deezer => self.deezer_playlists,
        }
    }

    /// Value of any numeric column, as used by the range brush.
    pub fn value(&self, field: Field) -> f64 {
        match field {
            Field::Streams => self.streams as f64,
            Field::Playlists(p) => self.playlists(p) as f64,
            Field::Feature(f) => self.feature(f),
        }
    }
}

/// The six audio-feature percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AudioFeature {
    Danceability,
    Valence,
    Energy,
    Acousticness,
    Liveness,
    Speechiness,
}

impl AudioFeature {
    pub const ALL: [AudioFeature; 6] = [
        Self::Danceability,
        Self::Valence,
        Self::Energy,
        Self::Acousticness,
        Self::Liveness,
        Self::Speechiness,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Self::Danceability => "danceability_%",
            Self::Valence => "valence_%",
            Self::Energy => "energy_%",
            Self::Acousticness => "acousticness_%",
            Self::Liveness => "liveness_%",
            Self::Speechiness => "speechiness_%",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == column)
    }
}

impl Serialize for AudioFeature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.column())
    }
}

/// Streaming platforms with playlist-membership counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Platform {
    Spotify,
    Apple,
    Deezer,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Self::Spotify, Self::Apple, Self::Deezer];

    pub fn column(&self) -> &'static str {
        match self {
            Self::Spotify => "in_spotify_playlists",
            Self::Apple => "in_apple_playlists",
            Self::Deezer => "in_deezer_playlists",
        }
    }
}

impl Serialize for Platform {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.column())
    }
}

/// Any numeric column a chart can plot or the brush can restrict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Streams,
    Playlists(Platform),
    Feature(AudioFeature),
}

impl Field {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Streams => "streams",
            Self::Playlists(p) => p.column(),
            Self::Feature(f) => f.column(),
        }
    }

    /// Display title for the column: `energy_%` → `Energy %`.
    pub fn title(&self) -> String {
        column_title(self.column())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "streams" {
            return Ok(Self::Streams);
        }
        if let Some(p) = Platform::ALL.into_iter().find(|p| p.column() == s) {
            return Ok(Self::Playlists(p));
        }
        AudioFeature::from_column(s)
            .map(Self::Feature)
            .ok_or_else(|| format!("unknown numeric field: {s}"))
    }
}

impl Serialize for Field {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.column())
    }
}

/// Musical key, one of the twelve pitch classes (sharps spelling).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    C,
    CSharp,
    D,
    DSharp,
    E,
    F,
    FSharp,
    G,
    GSharp,
    A,
    ASharp,
    B,
}

impl Key {
    pub const ALL: [Key; 12] = [
        Self::C,
        Self::CSharp,
        Self::D,
        Self::DSharp,
        Self::E,
        Self::F,
        Self::FSharp,
        Self::G,
        Self::GSharp,
        Self::A,
        Self::ASharp,
        Self::B,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::C => "C",
            Self::CSharp => "C#",
            Self::D => "D",
            Self::DSharp => "D#",
            Self::E => "E",
            Self::F => "F",
            Self::FSharp => "F#",
            Self::G => "G",
            Self::GSharp => "G#",
            Self::A => "A",
            Self::ASharp => "A#",
            Self::B => "B",
        }
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.label() == s)
            .ok_or_else(|| format!("unknown key: {s}"))
    }
}

impl Serialize for Key {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Mode {
    Major,
    Minor,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Major => "Major",
            Self::Minor => "Minor",
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Major" => Ok(Self::Major),
            "Minor" => Ok(Self::Minor),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// Turn a dataset column name into a display title:
/// `in_spotify_playlists` → `In Spotify Playlists`.
pub fn column_title(column: &str) -> String {
    column
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    let rest: String = chars.as_str().to_lowercase();
                    format!("{}{}", first.to_uppercase(), rest)
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
