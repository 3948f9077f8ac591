//! Callback data grammar for the inline menu.
//!
//! ```text
//! back_main
//! edit_<route>
//! back_set|<route>
//! choose_src|<route>|<index>
//! replace_src|<route>|<index>|<channel>
//! ```

use std::fmt;

use crate::common::types::ChannelId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    Main,
    EditRoute(String),
    BackToRoute(String),
    ChooseSource { route: String, index: usize },
    ReplaceSource { route: String, index: usize, channel: ChannelId },
}

impl MenuAction {
    /// Parse button data. Returns `None` for anything off-grammar.
    pub fn parse(data: &str) -> Option<Self> {
        if data == "back_main" {
            return Some(Self::Main);
        }

        let mut parts = data.split('|');
        let head = parts.next()?;
        let action = match head {
            "back_set" => Self::BackToRoute(route_name(parts.next())?),
            "choose_src" => Self::ChooseSource {
                route: route_name(parts.next())?,
                index: parts.next()?.parse().ok()?,
            },
            "replace_src" => Self::ReplaceSource {
                route: route_name(parts.next())?,
                index: parts.next()?.parse().ok()?,
                channel: ChannelId(parts.next()?.parse().ok()?),
            },
            _ => {
                let route = head.strip_prefix("edit_")?;
                if route.is_empty() {
                    return None;
                }
                Self::EditRoute(route.to_string())
            }
        };

        // Trailing fields mean a malformed payload.
        if parts.next().is_some() {
            return None;
        }
        Some(action)
    }

    pub fn to_data(&self) -> String {
        self.to_string()
    }
}

fn route_name(part: Option<&str>) -> Option<String> {
    part.filter(|p| !p.is_empty()).map(String::from)
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => write!(f, "back_main"),
            Self::EditRoute(route) => write!(f, "edit_{}", route),
            Self::BackToRoute(route) => write!(f, "back_set|{}", route),
            Self::ChooseSource { route, index } => write!(f, "choose_src|{}|{}", route, index),
            Self::ReplaceSource {
                route,
                index,
                channel,
            } => write!(f, "replace_src|{}|{}|{}", route, index, channel),
        }
    }
}
