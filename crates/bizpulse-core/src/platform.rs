//! Social platform codes as stored on `business_posts.platform`.

use serde::{Deserialize, Serialize};

/// Known platform codes with display names for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[serde(rename = "xhs")]
    Xiaohongshu,
    #[serde(rename = "dy")]
    Douyin,
    #[serde(rename = "wb")]
    Weibo,
    #[serde(rename = "dp")]
    Dianping,
}

impl Platform {
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "xhs" => Some(Self::Xiaohongshu),
            "dy" => Some(Self::Douyin),
            "wb" => Some(Self::Weibo),
            "dp" => Some(Self::Dianping),
            _ => None,
        }
    }

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Xiaohongshu => "xhs",
            Self::Douyin => "dy",
            Self::Weibo => "wb",
            Self::Dianping => "dp",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Xiaohongshu => "Xiaohongshu",
            Self::Douyin => "Douyin",
            Self::Weibo => "Weibo",
            Self::Dianping => "Dianping",
        }
    }
}

/// Maps a stored platform code to its display name.
///
/// Unknown codes pass through unchanged so newly ingested platforms are
/// visible before this mapping learns about them.
#[must_use]
pub fn display_name_for(code: &str) -> String {
    Platform::from_code(code).map_or_else(|| code.to_string(), |p| p.display_name().to_string())
}
