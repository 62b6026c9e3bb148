use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    Soccer,
    Basketball,
    Tennis,
    Volleyball,
    Badminton,
}

impl Activity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::Soccer => "soccer",
            Activity::Basketball => "basketball",
            Activity::Tennis => "tennis",
            Activity::Volleyball => "volleyball",
            Activity::Badminton => "badminton",
        }
    }

    /// Case-insensitive, so `?activity=Tennis` matches stored `tennis`.
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "soccer" => Some(Activity::Soccer),
            "basketball" => Some(Activity::Basketball),
            "tennis" => Some(Activity::Tennis),
            "volleyball" => Some(Activity::Volleyball),
            "badminton" => Some(Activity::Badminton),
            _ => None,
        }
    }
}

impl Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
