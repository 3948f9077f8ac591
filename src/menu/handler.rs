//! Drives the inline menu from `/start` commands and button presses.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::common::messages::{CallbackPress, InboundMessage};
use crate::platform::{Keyboard, MenuSurface};
use crate::relay::RelayControl;

use super::actions::MenuAction;
use super::view;

pub struct MenuHandler {
    control: RelayControl,
    surface: Arc<dyn MenuSurface>,
    /// Empty means every private-chat user may edit.
    admins: Vec<i64>,
}

impl MenuHandler {
    pub fn new(control: RelayControl, surface: Arc<dyn MenuSurface>, admins: Vec<i64>) -> Self {
        Self {
            control,
            surface,
            admins,
        }
    }

    /// Whether `message` opens the menu: `/start` in a private chat.
    pub fn wants(&self, message: &InboundMessage) -> bool {
        message.is_private && message.is_command("/start")
    }

    fn is_authorized(&self, user: Option<i64>) -> bool {
        self.admins.is_empty() || user.map(|u| self.admins.contains(&u)).unwrap_or(false)
    }

    /// Answer `/start` with a fresh main menu.
    pub async fn open(&self, message: &InboundMessage) -> anyhow::Result<()> {
        if !self.is_authorized(message.sender_id) {
            info!(user = ?message.sender_id, "Menu request from unauthorized user ignored");
            return Ok(());
        }
        let routes = self.control.list_routes().await;
        self.surface
            .send_menu(
                message.chat_id,
                &view::main_text(&routes),
                &view::main_keyboard(&routes),
            )
            .await?;
        Ok(())
    }

    pub async fn handle_callback(&self, press: &CallbackPress) -> anyhow::Result<()> {
        if !self.is_authorized(Some(press.user_id)) {
            info!(user = press.user_id, "Menu press from unauthorized user ignored");
            self.surface
                .answer_callback(&press.id, Some("You are not allowed to edit routes."))
                .await?;
            return Ok(());
        }

        let Some((chat, message)) = press.message else {
            self.surface
                .answer_callback(&press.id, Some("This menu has expired. Send /start again."))
                .await?;
            return Ok(());
        };

        let Some(action) = MenuAction::parse(&press.data) else {
            debug!("Unrecognized menu data {:?}", press.data);
            self.surface
                .answer_callback(&press.id, Some("Unknown action."))
                .await?;
            return Ok(());
        };

        let (text, keyboard) = self.render(&action).await;
        self.surface.edit_menu(chat, message, &text, &keyboard).await?;
        self.surface.answer_callback(&press.id, None).await?;
        Ok(())
    }

    /// Apply `action` and build the screen to show next. Errors render in place.
    async fn render(&self, action: &MenuAction) -> (String, Keyboard) {
        match action {
            MenuAction::Main => {
                let routes = self.control.list_routes().await;
                (view::main_text(&routes), view::main_keyboard(&routes))
            }
            MenuAction::EditRoute(name) | MenuAction::BackToRoute(name) => {
                match self.control.get_route(name).await {
                    Ok(route) => (view::route_text(&route), view::route_keyboard(&route)),
                    Err(e) => self.error_screen(&e.to_string()).await,
                }
            }
            MenuAction::ChooseSource { route, index } => {
                if let Err(e) = self.control.get_route(route).await {
                    return self.error_screen(&e.to_string()).await;
                }
                match self.control.list_available_channels().await {
                    Ok(channels) => (
                        view::picker_text(route, *index),
                        view::picker_keyboard(&channels, route, *index),
                    ),
                    Err(e) => self.error_screen(&e.to_string()).await,
                }
            }
            MenuAction::ReplaceSource {
                route,
                index,
                channel,
            } => match self.control.set_source_at(route, *index, *channel).await {
                Ok(updated) => {
                    let routes = self.control.list_routes().await;
                    (view::updated_text(&updated, &routes), view::main_keyboard(&routes))
                }
                Err(e) => {
                    warn!(route = %route, "Source update rejected: {}", e);
                    self.error_screen(&e.to_string()).await
                }
            },
        }
    }

    async fn error_screen(&self, error: &str) -> (String, Keyboard) {
        let routes = self.control.list_routes().await;
        (
            format!("⚠️ {}\n\n{}", error, view::main_text(&routes)),
            view::main_keyboard(&routes),
        )
    }
}
