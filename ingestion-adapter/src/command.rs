use std::{collections::HashSet, fmt, str::FromStr};

use common::error::AppError;
use serde::{Deserialize, Serialize};

use crate::terms::Terms;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Medium {
    Flickr,
    Twitter,
    Rss,
    Web,
}

impl Medium {
    pub fn as_str(&self) -> &'static str {
        match self {
            Medium::Flickr => "flickr",
            Medium::Twitter => "twitter",
            Medium::Rss => "rss",
            Medium::Web => "web",
        }
    }
}

impl FromStr for Medium {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flickr" => Ok(Medium::Flickr),
            "twitter" => Ok(Medium::Twitter),
            "rss" => Ok(Medium::Rss),
            "web" => Ok(Medium::Web),
            other => Err(AppError::Validation(format!("unknown medium: {other}"))),
        }
    }
}

impl fmt::Display for Medium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Control {
    Pause,
    Resume,
    Stop,
}

/// Terminal reply to an inbound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Ack,
    Fail,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub media: HashSet<Medium>,
    #[serde(default)]
    pub terms: Option<Terms>,
    #[serde(default)]
    pub control: Option<Control>,
}

impl Command {
    pub fn search(media: impl IntoIterator<Item = Medium>, terms: Terms) -> Self {
        Self {
            media: media.into_iter().collect(),
            terms: Some(terms),
            control: None,
        }
    }

    pub fn control(media: impl IntoIterator<Item = Medium>, terms: Terms, control: Control) -> Self {
        Self {
            media: media.into_iter().collect(),
            terms: Some(terms),
            control: Some(control),
        }
    }
}
