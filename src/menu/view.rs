//! Menu screens: text plus inline keyboard.

use crate::common::types::ChannelInfo;
use crate::platform::{InlineButton, Keyboard};
use crate::relay::routing::{Route, MAX_SOURCES_PER_ROUTE};

use super::actions::MenuAction;

const TITLE_LIMIT: usize = 30;

pub fn format_sources(route: &Route) -> String {
    let slots: Vec<String> = route
        .sources
        .iter()
        .map(|slot| match slot {
            Some(chat) => chat.to_string(),
            None => "empty".to_string(),
        })
        .collect();
    format!("[{}]", slots.join(", "))
}

pub fn main_text(routes: &[Route]) -> String {
    let mut text = String::from("📢 Source Groups Editor 📢\n\n");
    for route in routes {
        text.push_str(&format!("{}: {}\n", route.name, format_sources(route)));
    }
    text.push_str("\nUse the buttons below to edit the source groups.");
    text
}

pub fn main_keyboard(routes: &[Route]) -> Keyboard {
    routes
        .iter()
        .map(|route| {
            vec![InlineButton::new(
                format!("🔧 Edit {}", route.label),
                MenuAction::EditRoute(route.name.clone()).to_data(),
            )]
        })
        .collect()
}

pub fn route_text(route: &Route) -> String {
    format!(
        "🔄 Editing {} 🔄\nCurrent groups: {}\n\nChoose a group to replace or add a new one.",
        route.name,
        format_sources(route)
    )
}

pub fn route_keyboard(route: &Route) -> Keyboard {
    let mut rows: Keyboard = route
        .sources
        .iter()
        .enumerate()
        .map(|(index, slot)| {
            let shown = slot.map(|c| c.to_string()).unwrap_or_else(|| "empty".to_string());
            vec![InlineButton::new(
                format!("➕ Source {}: {}", index + 1, shown),
                choose(route, index),
            )]
        })
        .collect();

    if route.sources.is_empty() {
        rows.push(vec![InlineButton::new("➕ Add first group", choose(route, 0))]);
    } else if route.sources.len() < MAX_SOURCES_PER_ROUTE {
        rows.push(vec![InlineButton::new(
            "➕ Add source",
            choose(route, route.sources.len()),
        )]);
    }

    rows.push(vec![InlineButton::new("🔙 Back", MenuAction::Main.to_data())]);
    rows
}

fn choose(route: &Route, index: usize) -> String {
    MenuAction::ChooseSource {
        route: route.name.clone(),
        index,
    }
    .to_data()
}

pub fn picker_text(route: &str, index: usize) -> String {
    format!("📌 Select a new group/chat to place at index {} in {}.", index, route)
}

pub fn picker_keyboard(channels: &[ChannelInfo], route: &str, index: usize) -> Keyboard {
    let mut rows: Keyboard = channels
        .iter()
        .map(|channel| {
            vec![InlineButton::new(
                short_title(&channel.title),
                MenuAction::ReplaceSource {
                    route: route.to_string(),
                    index,
                    channel: channel.id,
                }
                .to_data(),
            )]
        })
        .collect();
    rows.push(vec![InlineButton::new(
        "🔙 Back",
        MenuAction::BackToRoute(route.to_string()).to_data(),
    )]);
    rows
}

/// Titles over 30 characters are cut and marked with "...".
pub fn short_title(title: &str) -> String {
    if title.chars().count() > TITLE_LIMIT {
        let cut: String = title.chars().take(TITLE_LIMIT).collect();
        format!("{}...", cut)
    } else {
        title.to_string()
    }
}

pub fn updated_text(route: &Route, routes: &[Route]) -> String {
    format!(
        "✅ Updated {}: {}\n\n{}",
        route.name,
        format_sources(route),
        main_text(routes)
    )
}
