//! Edit Info dialog: name, description, and the subscription URL of
//! remote profiles.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use tui_input::{Input, InputRequest};

use switchyard_core::{ProfilePatch, ProfileRecord, Translator};

use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Name,
    Description,
    Url,
}

impl EditField {
    fn label_key(self) -> &'static str {
        match self {
            Self::Name => "edit.name",
            Self::Description => "edit.description",
            Self::Url => "edit.url",
        }
    }
}

/// Result of feeding a key to the dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Still editing.
    Pending,
    Cancelled,
    Save(ProfilePatch),
}

pub struct EditDialog {
    is_remote: bool,
    original: ProfileRecord,
    name: Input,
    description: Input,
    url: Input,
    field: EditField,
    error: Option<String>,
    translator: Arc<dyn Translator>,
}

impl EditDialog {
    pub fn new(profile: &ProfileRecord, translator: Arc<dyn Translator>) -> Self {
        Self {
            is_remote: profile.is_remote(),
            original: profile.clone(),
            name: Input::new(profile.name.clone()),
            description: Input::new(profile.description.clone()),
            url: Input::new(profile.url.clone().unwrap_or_default()),
            field: EditField::Name,
            error: None,
            translator,
        }
    }

    #[cfg(test)]
    pub fn field(&self) -> EditField {
        self.field
    }

    #[cfg(test)]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn fields(&self) -> &'static [EditField] {
        if self.is_remote {
            &[EditField::Name, EditField::Description, EditField::Url]
        } else {
            &[EditField::Name, EditField::Description]
        }
    }

    fn step_field(&mut self, forward: bool) {
        let fields = self.fields();
        let pos = fields.iter().position(|&f| f == self.field).unwrap_or(0);
        let next = if forward {
            (pos + 1) % fields.len()
        } else {
            (pos + fields.len() - 1) % fields.len()
        };
        if let Some(&field) = fields.get(next) {
            self.field = field;
        }
    }

    fn input(&self, field: EditField) -> &Input {
        match field {
            EditField::Name => &self.name,
            EditField::Description => &self.description,
            EditField::Url => &self.url,
        }
    }

    fn active_input_mut(&mut self) -> &mut Input {
        match self.field {
            EditField::Name => &mut self.name,
            EditField::Description => &mut self.description,
            EditField::Url => &mut self.url,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditOutcome {
        let request = match (key.modifiers, key.code) {
            (_, KeyCode::Esc) => return EditOutcome::Cancelled,
            (_, KeyCode::Enter) => {
                return match self.build_patch() {
                    Ok(patch) => EditOutcome::Save(patch),
                    Err(message) => {
                        self.error = Some(message);
                        EditOutcome::Pending
                    }
                };
            }
            (_, KeyCode::Tab | KeyCode::Down) => {
                self.step_field(true);
                return EditOutcome::Pending;
            }
            (_, KeyCode::BackTab | KeyCode::Up) => {
                self.step_field(false);
                return EditOutcome::Pending;
            }
            (KeyModifiers::CONTROL, KeyCode::Char('u')) => InputRequest::DeleteLine,
            (KeyModifiers::CONTROL, KeyCode::Char('w')) => InputRequest::DeletePrevWord,
            (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
                InputRequest::InsertChar(c)
            }
            (_, KeyCode::Backspace) => InputRequest::DeletePrevChar,
            (_, KeyCode::Delete) => InputRequest::DeleteNextChar,
            (_, KeyCode::Left) => InputRequest::GoToPrevChar,
            (_, KeyCode::Right) => InputRequest::GoToNextChar,
            (_, KeyCode::Home) => InputRequest::GoToStart,
            (_, KeyCode::End) => InputRequest::GoToEnd,
            _ => return EditOutcome::Pending,
        };
        if self.active_input_mut().handle(request).is_some() {
            self.error = None;
        }
        EditOutcome::Pending
    }

    /// Patch carrying only the fields that changed. The URL must parse.
    pub fn build_patch(&self) -> Result<ProfilePatch, String> {
        let name = self.name.value().trim();
        let description = self.description.value().trim();
        let url = self.url.value().trim();

        let mut patch = ProfilePatch::default();
        if name != self.original.name {
            patch.name = Some(name.to_owned());
        }
        if description != self.original.description {
            patch.description = Some(description.to_owned());
        }
        if self.is_remote && Some(url) != self.original.url.as_deref() {
            if let Err(e) = url.parse::<url::Url>() {
                let reason = e.to_string();
                return Err(self
                    .translator
                    .translate("edit.invalid_url", &[("reason", &reason)]));
            }
            patch.url = Some(url.to_owned());
        }
        Ok(patch)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let tr = &*self.translator;
        let fields = self.fields();
        #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
        let height = (fields.len() as u16) * 2 + 5;
        let width = 64u16.min(area.width.saturating_sub(4));
        let height = height.min(area.height.saturating_sub(2));
        let x = area.width.saturating_sub(width) / 2;
        let y = area.height.saturating_sub(height) / 2;
        let dialog_area = Rect::new(area.x + x, area.y + y, width, height);

        frame.render_widget(Clear, dialog_area);
        let block = Block::default()
            .title(format!(" {} ", tr.translate("edit.title", &[])))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(dialog_area);
        frame.render_widget(block, dialog_area);

        let mut constraints: Vec<Constraint> = fields.iter().map(|_| Constraint::Length(2)).collect();
        constraints.push(Constraint::Length(1));
        constraints.push(Constraint::Min(1));
        let rows = Layout::vertical(constraints).split(inner);

        for (i, &field) in fields.iter().enumerate() {
            let Some(&row) = rows.get(i) else { continue };
            self.render_field(frame, row, field);
        }

        if let Some(&status_row) = rows.get(fields.len()) {
            let status = match &self.error {
                Some(err) => Line::from(Span::styled(
                    format!(" {err}"),
                    Style::default().fg(theme::ERROR_RED),
                )),
                None => Line::from(Span::styled(
                    format!(" {}", tr.translate("edit.hint", &[])),
                    theme::key_hint(),
                )),
            };
            frame.render_widget(Paragraph::new(status), status_row);
        }
    }

    fn render_field(&self, frame: &mut Frame, row: Rect, field: EditField) {
        let focused = field == self.field;
        let label_style = if focused {
            theme::key_hint_key()
        } else {
            theme::text_dim()
        };
        let label = Line::from(Span::styled(
            format!(" {}", self.translator.translate(field.label_key(), &[])),
            label_style,
        ));
        frame.render_widget(Paragraph::new(label), Rect { height: 1, ..row });

        let value_row = Rect {
            x: row.x + 1,
            y: row.y + 1,
            width: row.width.saturating_sub(2),
            height: 1,
        };
        let input = self.input(field);
        let width = usize::from(value_row.width.max(1));
        let scroll = input.visual_scroll(width);
        #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
        let scroll_u16 = scroll as u16;
        let value_style = if focused {
            Style::default().fg(theme::NEON_CYAN)
        } else {
            theme::text()
        };
        frame.render_widget(
            Paragraph::new(input.value())
                .style(value_style)
                .scroll((0, scroll_u16)),
            value_row,
        );

        if focused {
            #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
            let cursor = input.visual_cursor().saturating_sub(scroll) as u16;
            frame.set_cursor_position((value_row.x + cursor, value_row.y));
        }
    }
}
