use crate::app::Effect;
use crate::order::{Field, FieldErrors, OrderPayload, PriceTable};
use crate::ui::ToastLevel;
use crate::widgets::Widget;
use crate::widgets::form::{
    draw_form, format_number, parse_number, ConfirmAction, FieldKind, FormState, OPTIONS_VISIBLE,
};
use crossterm::event::KeyCode;
use ratatui::crossterm::event as rt_event;
use ratatui::prelude::*;
use std::collections::HashMap;
use tui_textarea::TextArea;

pub struct FormWidget {
    pub form: FormState,
    prices: PriceTable,
    ta_map: HashMap<Field, TextArea<'static>>,
}

impl FormWidget {
    pub fn new(form: FormState, prices: PriceTable) -> Self {
        let mut ta_map: HashMap<Field, TextArea<'static>> = HashMap::new();
        for f in &form.fields {
            if let FieldKind::TextArea = f.kind {
                ta_map.insert(f.field, editor_for(&f.label, &f.value));
            }
        }
        Self {
            form,
            prices,
            ta_map,
        }
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    fn editing_textarea(&self) -> Option<Field> {
        if !self.form.editing {
            return None;
        }
        let fld = self.form.fields.get(self.form.selected)?;
        matches!(fld.kind, FieldKind::TextArea).then_some(fld.field)
    }

    pub fn is_editing_textarea(&self) -> bool {
        self.editing_textarea().is_some()
    }

    fn route_to_textarea(&mut self, key: KeyCode) -> bool {
        let Some(field) = self.editing_textarea() else {
            return false;
        };
        let Some(code) = to_textarea_key(key) else {
            return true;
        };
        if let Some(ta) = self.ta_map.get_mut(&field) {
            let _ = ta.input(rt_event::KeyEvent::new(code, rt_event::KeyModifiers::NONE));
        }
        true
    }

    pub fn commit_textarea(&mut self) -> bool {
        let Some(field) = self.editing_textarea() else {
            return false;
        };
        let sel = self.form.selected;
        if let Some(ta) = self.ta_map.get(&field) {
            self.form.fields[sel].value = ta.lines().join("\n");
        }
        self.form.editing = false;
        self.form.message = None;
        self.form.validate_field_inline(sel, &self.prices);
        self.form.compute_dirty();
        true
    }

    fn after_edit(&mut self, idx: usize) {
        let is_category = self
            .form
            .fields
            .get(idx)
            .map(|f| f.field == Field::Category)
            .unwrap_or(false);
        if is_category {
            self.form.apply_category_change(&self.prices);
        }
        self.form.validate_field_inline(idx, &self.prices);
        self.form.compute_dirty();
    }

    /// Full validation; on success the form moves to the submitting state
    /// and the payload is handed out as an effect.
    pub fn submit(&mut self) -> Vec<Effect> {
        self.form.editing = false;
        self.form.confirm = None;
        match OrderPayload::build(&self.form.values(), &self.prices) {
            Ok(payload) => {
                self.form.apply_errors(&FieldErrors::default());
                self.form.disabled = true;
                self.form.message = Some("Submitting...".into());
                vec![Effect::SubmitOrder { payload }]
            }
            Err(errs) => {
                for (field, err) in errs.iter() {
                    tracing::debug!(field = field.key(), error = %err, "field failed validation");
                }
                self.form.apply_errors(&errs);
                vec![Effect::ShowToast {
                    text: format!("{} field(s) need attention", errs.len()),
                    level: ToastLevel::Error,
                    seconds: 3,
                }]
            }
        }
    }

    /// Sink answered: reset on success, stay editable with the error otherwise.
    pub fn finish_submit(&mut self, outcome: &Result<String, String>) {
        self.form.disabled = false;
        match outcome {
            Ok(receipt) => {
                self.form.reset_to_initial();
                self.form.selected = 0;
                self.form.message = Some(format!("Order accepted: {receipt}"));
            }
            Err(e) => {
                self.form.message = Some(format!("Submission failed: {e}"));
            }
        }
    }
}

impl Widget for FormWidget {
    fn render(&mut self, f: &mut Frame, area: Rect, focused: bool, tick: u64) {
        // the overlay editor draws its own cursor
        let cursor_on = tick % 2 == 0 && !self.is_editing_textarea();
        draw_form(f, area, &mut self.form, focused, cursor_on);
        if let Some(field) = self.editing_textarea() {
            if let Some(ta) = self.ta_map.get_mut(&field) {
                let rect = centered_rect(80, 60, area);
                f.render_widget(ratatui::widgets::Clear, rect);
                f.render_widget(&*ta, rect);
            }
        }
    }

    fn on_key(&mut self, key: KeyCode) -> Vec<Effect> {
        let mut effects: Vec<Effect> = Vec::new();
        if self.form.disabled {
            return effects;
        }
        if key == KeyCode::Esc {
            // Close confirmation or leave editing without further changes
            if self.form.confirm.is_some() {
                self.form.confirm = None;
                self.form.message = None;
            } else if self.form.editing {
                self.form.editing = false;
                self.form.message = None;
            }
            return effects;
        }
        if self.route_to_textarea(key) {
            return effects;
        }
        let sel = self.form.selected;
        match key {
            KeyCode::Up | KeyCode::BackTab => {
                if self.form.editing && key == KeyCode::Up {
                    if let Some(fld) = self.form.fields.get_mut(sel) {
                        match &mut fld.kind {
                            FieldKind::Number { minimum, step } => {
                                fld.value = step_number(&fld.value, *minimum, *step, 1.0);
                                self.after_edit(sel);
                            }
                            FieldKind::Select { cursor, offset, .. }
                            | FieldKind::MultiSelect { cursor, offset, .. } => {
                                if *cursor > 0 {
                                    *cursor -= 1;
                                }
                                if *cursor < *offset {
                                    *offset = *cursor;
                                }
                            }
                            _ => {}
                        }
                    }
                } else {
                    self.leave_editing();
                    self.drop_confirm();
                    if self.form.selected > 0 {
                        self.form.selected -= 1;
                    }
                }
            }
            KeyCode::Down | KeyCode::Tab => {
                if self.form.editing && key == KeyCode::Down {
                    if let Some(fld) = self.form.fields.get_mut(sel) {
                        match &mut fld.kind {
                            FieldKind::Number { minimum, step } => {
                                fld.value = step_number(&fld.value, *minimum, *step, -1.0);
                                self.after_edit(sel);
                            }
                            FieldKind::Select {
                                cursor,
                                options,
                                offset,
                                ..
                            }
                            | FieldKind::MultiSelect {
                                cursor,
                                options,
                                offset,
                                ..
                            } => {
                                if *cursor + 1 < options.len() {
                                    *cursor += 1;
                                }
                                if *cursor >= *offset + OPTIONS_VISIBLE {
                                    *offset = *cursor + 1 - OPTIONS_VISIBLE;
                                }
                            }
                            _ => {}
                        }
                    }
                } else {
                    self.leave_editing();
                    self.drop_confirm();
                    if self.form.selected < self.form.reset_idx() {
                        self.form.selected += 1;
                    }
                }
            }
            KeyCode::Left | KeyCode::Right => {
                let forward = key == KeyCode::Right;
                if sel >= self.form.fields.len() {
                    // move between buttons: Submit <-> Reset
                    self.drop_confirm();
                    self.form.selected = if forward {
                        self.form.reset_idx()
                    } else {
                        self.form.submit_idx()
                    };
                } else if self.form.editing {
                    if let Some(fld) = self.form.fields.get_mut(sel) {
                        if let FieldKind::Select {
                            cursor, selected, ..
                        } = &mut fld.kind
                        {
                            *selected = *cursor;
                            self.form.editing = false;
                            self.after_edit(sel);
                        }
                    }
                } else if let Some(fld) = self.form.fields.get_mut(sel) {
                    // quick change for Radio/Select when browsing
                    match &mut fld.kind {
                        FieldKind::Radio {
                            options, selected, ..
                        }
                        | FieldKind::Select {
                            options, selected, ..
                        } => {
                            if !options.is_empty() {
                                *selected = cycle(*selected, options.len(), forward);
                                self.after_edit(sel);
                            }
                        }
                        _ => {}
                    }
                }
            }
            KeyCode::Enter => {
                if sel == self.form.submit_idx() {
                    effects.extend(self.submit());
                } else if sel == self.form.reset_idx() {
                    if self.form.dirty {
                        // two-step confirm
                        if self.form.confirm == Some(ConfirmAction::Reset) {
                            self.form.reset_to_initial();
                            tracing::info!("form reset to seed defaults");
                            effects.push(Effect::ShowToast {
                                text: "Reset".into(),
                                level: ToastLevel::Info,
                                seconds: 2,
                            });
                        } else {
                            self.form.confirm = Some(ConfirmAction::Reset);
                            self.form.message =
                                Some("Press Enter to confirm Reset • Esc to cancel".into());
                        }
                    } else {
                        self.form.message = Some("Nothing to reset".into());
                    }
                } else {
                    self.enter_on_field(sel);
                }
            }
            KeyCode::Backspace => {
                if self.form.editing {
                    if let Some(fld) = self.form.fields.get_mut(sel) {
                        if matches!(fld.kind, FieldKind::Text | FieldKind::Number { .. }) {
                            fld.value.pop();
                            self.after_edit(sel);
                        }
                    }
                }
            }
            KeyCode::Char(c) => {
                if let Some(fld) = self.form.fields.get_mut(sel) {
                    match &mut fld.kind {
                        FieldKind::Text if self.form.editing => {
                            fld.value.push(c);
                            self.after_edit(sel);
                        }
                        FieldKind::Number { .. } if self.form.editing => {
                            if c.is_ascii_digit() || (c == '.' && !fld.value.contains('.')) {
                                fld.value.push(c);
                                self.after_edit(sel);
                            }
                        }
                        FieldKind::MultiSelect {
                            cursor, selected, ..
                        } if c == ' ' => {
                            if let Some(slot) = selected.get_mut(*cursor) {
                                *slot = !*slot;
                                // show the options list while toggling
                                self.form.editing = true;
                                self.after_edit(sel);
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        effects
    }
}

impl FormWidget {
    // A pending confirmation only applies to the button it was armed on.
    fn drop_confirm(&mut self) {
        if self.form.confirm.take().is_some() {
            self.form.message = None;
        }
    }

    fn leave_editing(&mut self) {
        if self.form.editing {
            self.form.editing = false;
            let sel = self.form.selected;
            self.form.validate_field_inline(sel, &self.prices);
        }
    }

    fn enter_on_field(&mut self, sel: usize) {
        let editing = self.form.editing;
        let Some(fld) = self.form.fields.get_mut(sel) else {
            return;
        };
        match &mut fld.kind {
            FieldKind::Text | FieldKind::Number { .. } => {
                self.form.editing = !editing;
                if editing {
                    self.form.validate_field_inline(sel, &self.prices);
                }
            }
            FieldKind::TextArea => {
                // Enter editing, initialize the editor with the current text
                let editor = editor_for(&fld.label, &fld.value);
                self.ta_map.insert(fld.field, editor);
                self.form.editing = true;
            }
            FieldKind::Radio {
                options, selected, ..
            } => {
                if !options.is_empty() {
                    *selected = cycle(*selected, options.len(), true);
                    self.after_edit(sel);
                }
            }
            FieldKind::Select {
                cursor, selected, ..
            } => {
                if editing {
                    *selected = *cursor;
                    self.form.editing = false;
                    self.after_edit(sel);
                } else {
                    *cursor = *selected;
                    self.form.editing = true;
                }
            }
            FieldKind::MultiSelect {
                cursor, selected, ..
            } => {
                if editing {
                    if let Some(slot) = selected.get_mut(*cursor) {
                        *slot = !*slot;
                        self.after_edit(sel);
                    }
                } else {
                    // first Enter opens the list; do not toggle yet
                    self.form.editing = true;
                }
            }
            FieldKind::Derived { .. } => {
                self.form.message = Some(format!(
                    "{} is derived from the category",
                    fld.label
                ));
            }
        }
    }
}

fn editor_for(label: &str, text: &str) -> TextArea<'static> {
    let mut ta = TextArea::default();
    if !text.is_empty() {
        ta.insert_str(text);
    }
    ta.set_block(
        ratatui::widgets::Block::default()
            .borders(ratatui::widgets::Borders::ALL)
            .title(format!("Editing: {label} — Ctrl+S Save • Esc Cancel")),
    );
    ta
}

fn to_textarea_key(key: KeyCode) -> Option<rt_event::KeyCode> {
    Some(match key {
        KeyCode::Up => rt_event::KeyCode::Up,
        KeyCode::Down => rt_event::KeyCode::Down,
        KeyCode::Left => rt_event::KeyCode::Left,
        KeyCode::Right => rt_event::KeyCode::Right,
        KeyCode::Home => rt_event::KeyCode::Home,
        KeyCode::End => rt_event::KeyCode::End,
        KeyCode::Enter => rt_event::KeyCode::Enter,
        KeyCode::Backspace => rt_event::KeyCode::Backspace,
        KeyCode::Delete => rt_event::KeyCode::Delete,
        KeyCode::Char(c) => rt_event::KeyCode::Char(c),
        _ => return None,
    })
}

fn cycle(cur: usize, len: usize, forward: bool) -> usize {
    if forward {
        if cur + 1 < len {
            cur + 1
        } else {
            0
        }
    } else if cur == 0 {
        len.saturating_sub(1)
    } else {
        cur - 1
    }
}

fn step_number(raw: &str, minimum: f64, step: f64, dir: f64) -> String {
    let cur = parse_number(raw);
    let base = if cur.is_finite() { cur } else { minimum };
    let mut next = base + step * dir;
    // snap to the step grid to avoid drift
    next = (next / step).round() * step;
    if next < minimum {
        next = minimum;
    }
    format_number(next)
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(area);
    let h = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(v[1]);
    h[1]
}
