use crate::order::schema::{self, Field, ORDER_SCHEMA};
use crate::order::{
    format_amount, Delivery, DeliveryTime, FieldErrors, OrderFormValues, PriceTable, Restriction,
};
use crate::widgets::chrome::panel_block;
use ratatui::prelude::*;
use ratatui::widgets::*;

#[derive(Clone, Debug)]
pub enum FieldKind {
    Text,
    // Multi-line text, edited in the overlay editor
    TextArea,
    // Decimal input; Up/Down step by `step`, never below `minimum`
    Number {
        minimum: f64,
        step: f64,
    },
    // Inline radio group; Left/Right cycle
    Radio {
        options: Vec<String>,
        values: Vec<String>,
        selected: usize,
    },
    Select {
        options: Vec<String>,
        values: Vec<String>,
        cursor: usize,
        selected: usize,
        offset: usize,
    },
    MultiSelect {
        options: Vec<String>,
        values: Vec<String>,
        cursor: usize,
        selected: Vec<bool>,
        offset: usize,
    },
    // Read-only value computed from other fields
    Derived {
        amount: f64,
    },
}

pub const OPTIONS_VISIBLE: usize = 8;
pub const NONE_LABEL: &str = "(none)";

#[derive(Clone, Debug)]
pub struct FormField {
    pub field: Field,
    pub label: String,
    pub required: bool,
    pub kind: FieldKind,
    // Raw text for Text/TextArea/Number kinds
    pub value: String,
    pub error: Option<String>,
    // Lines shown for a TextArea when not editing
    pub textarea_max_lines: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfirmAction {
    Reset,
}

#[derive(Clone, Debug)]
pub struct FormState {
    pub title: String,
    pub fields: Vec<FormField>,
    pub selected: usize,
    pub editing: bool,
    pub message: Option<String>,
    pub disabled: bool,
    pub dirty: bool,
    pub initial: OrderFormValues,
    pub confirm: Option<ConfirmAction>,
}

fn choice_kind(labels: Vec<String>, values: Vec<String>, radio: bool) -> FieldKind {
    if radio {
        FieldKind::Radio {
            options: labels,
            values,
            selected: 0,
        }
    } else {
        FieldKind::Select {
            options: labels,
            values,
            cursor: 0,
            selected: 0,
            offset: 0,
        }
    }
}

fn kind_for(field: Field, prices: &PriceTable) -> FieldKind {
    match field {
        Field::Username | Field::Tel | Field::Email => FieldKind::Text,
        Field::Message => FieldKind::TextArea,
        Field::Weight => FieldKind::Number {
            minimum: 0.1,
            step: 0.1,
        },
        Field::PricePerKg => FieldKind::Derived { amount: 0.0 },
        Field::Delivery => choice_kind(
            Delivery::ALL.iter().map(|d| d.label().to_string()).collect(),
            Delivery::ALL.iter().map(|d| d.as_str().to_string()).collect(),
            true,
        ),
        Field::DeliveryTime => {
            let mut labels = vec![NONE_LABEL.to_string()];
            let mut values = vec![String::new()];
            for t in DeliveryTime::ALL {
                labels.push(t.label().to_string());
                values.push(t.as_str().to_string());
            }
            choice_kind(labels, values, false)
        }
        Field::Category => {
            let mut labels = vec![NONE_LABEL.to_string()];
            let mut values = vec![String::new()];
            for e in prices.entries() {
                labels.push(format!("{} ({}/kg)", e.name, format_amount(e.price_per_kg)));
                values.push(e.name.clone());
            }
            choice_kind(labels, values, false)
        }
        Field::Restrictions => {
            let n = Restriction::ALL.len();
            FieldKind::MultiSelect {
                options: Restriction::ALL.iter().map(|r| r.label().to_string()).collect(),
                values: Restriction::ALL.iter().map(|r| r.as_str().to_string()).collect(),
                cursor: 0,
                selected: vec![false; n],
                offset: 0,
            }
        }
    }
}

/// Decimal rendering without trailing zeros (`1`, `2.5`, `0.1`).
pub fn format_number(v: f64) -> String {
    let mut s = format!("{v:.6}");
    while s.contains('.') && s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    if s.is_empty() || s == "-0" {
        s = "0".into();
    }
    s
}

/// Unparseable or empty input becomes NaN, which the schema reports.
pub fn parse_number(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(f64::NAN)
}

impl FormState {
    /// One widget per schema field, seeded with the default values.
    pub fn for_order(title: impl Into<String>, prices: &PriceTable) -> Self {
        let fields = ORDER_SCHEMA
            .iter()
            .map(|entry| FormField {
                field: entry.field,
                label: entry.field.label().to_string(),
                required: schema::is_required(entry.field),
                kind: kind_for(entry.field, prices),
                value: String::new(),
                error: None,
                textarea_max_lines: (entry.field == Field::Message).then_some(3),
            })
            .collect();
        let seed = OrderFormValues::seed();
        let mut form = Self {
            title: title.into(),
            fields,
            selected: 0,
            editing: false,
            message: None,
            disabled: false,
            dirty: false,
            initial: seed.clone(),
            confirm: None,
        };
        form.load_values(&seed);
        form.dirty = false;
        form
    }

    pub fn field_index(&self, field: Field) -> Option<usize> {
        self.fields.iter().position(|f| f.field == field)
    }

    pub fn submit_idx(&self) -> usize {
        self.fields.len()
    }

    pub fn reset_idx(&self) -> usize {
        self.fields.len() + 1
    }

    /// Pushes a full value set into the widgets.
    pub fn load_values(&mut self, values: &OrderFormValues) {
        for fld in &mut self.fields {
            match &mut fld.kind {
                FieldKind::Text | FieldKind::TextArea => {
                    fld.value = text_of(values, fld.field).to_string();
                }
                FieldKind::Number { .. } => {
                    let n = if fld.field == Field::Weight {
                        values.weight
                    } else {
                        values.price_per_kg
                    };
                    fld.value = if n.is_finite() {
                        format_number(n)
                    } else {
                        String::new()
                    };
                }
                FieldKind::Radio {
                    values: keys,
                    selected,
                    ..
                } => {
                    let want = text_of(values, fld.field);
                    *selected = keys.iter().position(|k| k == want).unwrap_or(0);
                }
                FieldKind::Select {
                    values: keys,
                    selected,
                    cursor,
                    offset,
                    ..
                } => {
                    let want = text_of(values, fld.field);
                    *selected = keys.iter().position(|k| k == want).unwrap_or(0);
                    *cursor = *selected;
                    *offset = 0;
                }
                FieldKind::MultiSelect {
                    values: keys,
                    selected,
                    cursor,
                    offset,
                    ..
                } => {
                    for (i, k) in keys.iter().enumerate() {
                        if let Some(slot) = selected.get_mut(i) {
                            *slot = values.restrictions.iter().any(|r| r == k);
                        }
                    }
                    *cursor = 0;
                    *offset = 0;
                }
                FieldKind::Derived { amount } => {
                    *amount = values.price_per_kg;
                }
            }
            fld.error = None;
        }
        self.compute_dirty();
    }

    /// Reads the widgets back into a value set.
    pub fn values(&self) -> OrderFormValues {
        let mut v = OrderFormValues::seed();
        for fld in &self.fields {
            match &fld.kind {
                FieldKind::Text | FieldKind::TextArea => {
                    let s = fld.value.clone();
                    match fld.field {
                        Field::Username => v.username = s,
                        Field::Tel => v.tel = s,
                        Field::Email => v.email = s,
                        Field::Message => v.message = s,
                        _ => {}
                    }
                }
                FieldKind::Number { .. } => {
                    if fld.field == Field::Weight {
                        v.weight = parse_number(&fld.value);
                    }
                }
                FieldKind::Radio {
                    values, selected, ..
                }
                | FieldKind::Select {
                    values, selected, ..
                } => {
                    let s = values.get(*selected).cloned().unwrap_or_default();
                    match fld.field {
                        Field::Delivery => v.delivery = s,
                        Field::DeliveryTime => v.delivery_time = s,
                        Field::Category => v.category = s,
                        _ => {}
                    }
                }
                FieldKind::MultiSelect {
                    values, selected, ..
                } => {
                    v.restrictions = values
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *selected.get(*i).unwrap_or(&false))
                        .map(|(_, s)| s.clone())
                        .collect();
                }
                FieldKind::Derived { amount } => {
                    v.price_per_kg = *amount;
                }
            }
        }
        v
    }

    /// Category change event: re-derives the price per kg from the table.
    pub fn apply_category_change(&mut self, prices: &PriceTable) {
        let category = self.values().category;
        let price = prices.price_for_category(&category);
        if let Some(idx) = self.field_index(Field::PricePerKg) {
            if let FieldKind::Derived { amount } = &mut self.fields[idx].kind {
                *amount = price;
            }
            // keep an already shown price error in step with the new value
            if self.fields[idx].error.is_some() {
                self.validate_field_inline(idx, prices);
            }
        }
    }

    /// Re-evaluates one field after an edit.
    pub fn validate_field_inline(&mut self, idx: usize, prices: &PriceTable) {
        let values = self.values();
        if let Some(fld) = self.fields.get_mut(idx) {
            fld.error = schema::validate_field(fld.field, &values, prices)
                .err()
                .map(|e| e.to_string());
        }
    }

    pub fn apply_errors(&mut self, errs: &FieldErrors) {
        for fld in &mut self.fields {
            fld.error = errs.get(fld.field).map(|e| e.to_string());
        }
        if errs.is_empty() {
            self.message = None;
        } else {
            self.message = Some("Please fix the highlighted errors".into());
            // jump to the first failing field
            if let Some(first) = self.fields.iter().position(|f| f.error.is_some()) {
                self.selected = first;
            }
        }
    }

    /// Full-form check; marks every failing field.
    pub fn validate_form(&mut self, prices: &PriceTable) -> bool {
        match schema::validate(&self.values(), prices) {
            Ok(()) => {
                self.apply_errors(&FieldErrors::default());
                true
            }
            Err(errs) => {
                self.apply_errors(&errs);
                false
            }
        }
    }

    pub fn compute_dirty(&mut self) -> bool {
        self.dirty = self.values() != self.initial;
        self.dirty
    }

    pub fn reset_to_initial(&mut self) {
        let seed = self.initial.clone();
        self.load_values(&seed);
        self.editing = false;
        self.confirm = None;
        self.message = Some("Reset to defaults".into());
    }
}

fn text_of(values: &OrderFormValues, field: Field) -> &str {
    match field {
        Field::Username => &values.username,
        Field::Tel => &values.tel,
        Field::Email => &values.email,
        Field::Message => &values.message,
        Field::Delivery => &values.delivery,
        Field::DeliveryTime => &values.delivery_time,
        Field::Category => &values.category,
        _ => "",
    }
}

fn value_style(form: &FormState, i: usize) -> Style {
    if i == form.selected {
        if form.editing {
            crate::theme::text_editing_bold()
        } else {
            crate::theme::text_active_bold()
        }
    } else {
        Style::default()
    }
}

pub fn draw_form(
    f: &mut Frame,
    area: Rect,
    form: &mut FormState,
    highlight: bool,
    cursor_on: bool,
) {
    let mut lines: Vec<Line> = Vec::new();
    for (i, fld) in form.fields.iter().enumerate() {
        let sel = if i == form.selected { '›' } else { ' ' };
        let req = if fld.required { " *" } else { "" };
        let style = value_style(form, i);
        match &fld.kind {
            FieldKind::Text | FieldKind::Number { .. } => {
                let mut val = fld.value.clone();
                if form.editing && i == form.selected && cursor_on {
                    val.push('▏');
                }
                lines.push(Line::from(vec![
                    Span::raw(format!("{sel} {}{req}: ", fld.label)),
                    Span::styled(val, style),
                ]));
            }
            FieldKind::TextArea => {
                let count = fld.value.chars().count();
                lines.push(Line::from(vec![
                    Span::raw(format!("{sel} {}{req}: ", fld.label)),
                    Span::styled(format!("({count}/200)"), crate::theme::text_muted()),
                ]));
                let mut body_lines: Vec<String> = if fld.value.is_empty() {
                    vec![String::new()]
                } else {
                    fld.value.lines().map(|l| l.to_string()).collect()
                };
                // the overlay editor covers this while editing
                let total = body_lines.len();
                let maxl = fld.textarea_max_lines.unwrap_or(total);
                body_lines.truncate(maxl);
                for bl in body_lines {
                    lines.push(Line::from(vec![
                        Span::raw("  "),
                        Span::styled(bl, style),
                    ]));
                }
                if total > maxl {
                    let more = total - maxl;
                    lines.push(Line::from(Span::styled(
                        format!(
                            "  … ({} more line{})",
                            more,
                            if more == 1 { "" } else { "s" }
                        ),
                        crate::theme::text_muted(),
                    )));
                }
            }
            FieldKind::Radio {
                options, selected, ..
            } => {
                let mut spans = vec![Span::raw(format!("{sel} {}{req}: ", fld.label))];
                for (oi, opt) in options.iter().enumerate() {
                    let mark = if oi == *selected { "(•)" } else { "( )" };
                    let st = if oi == *selected {
                        style
                    } else {
                        crate::theme::text_muted()
                    };
                    spans.push(Span::styled(format!("{mark} {opt}  "), st));
                }
                lines.push(Line::from(spans));
            }
            FieldKind::Select {
                options,
                cursor,
                selected,
                offset,
                ..
            } => {
                let summary = options
                    .get(*selected)
                    .cloned()
                    .unwrap_or_else(|| NONE_LABEL.into());
                lines.push(Line::from(vec![
                    Span::raw(format!("{sel} {}{req}: ", fld.label)),
                    Span::styled(summary, style),
                ]));
                if form.editing && i == form.selected {
                    let start = (*offset).min(options.len());
                    let end = (start + OPTIONS_VISIBLE).min(options.len());
                    for (oi, opt) in options.iter().enumerate().take(end).skip(start) {
                        let mark = if oi == *selected { "(•)" } else { "( )" };
                        let cur = if oi == *cursor { '›' } else { ' ' };
                        let st = if oi == *cursor {
                            crate::theme::list_cursor_style()
                        } else {
                            crate::theme::text_muted()
                        };
                        lines.push(Line::from(vec![Span::styled(
                            format!("  {cur} {mark} {opt}"),
                            st,
                        )]));
                    }
                }
            }
            FieldKind::MultiSelect {
                options,
                cursor,
                selected,
                offset,
                ..
            } => {
                let picked: Vec<&str> = options
                    .iter()
                    .enumerate()
                    .filter(|(oi, _)| *selected.get(*oi).unwrap_or(&false))
                    .map(|(_, o)| o.as_str())
                    .collect();
                let summary = if picked.is_empty() {
                    NONE_LABEL.to_string()
                } else {
                    picked.join(", ")
                };
                lines.push(Line::from(vec![
                    Span::raw(format!("{sel} {}{req}: ", fld.label)),
                    Span::styled(summary, style),
                ]));
                if form.editing && i == form.selected {
                    let start = (*offset).min(options.len());
                    let end = (start + OPTIONS_VISIBLE).min(options.len());
                    for (oi, opt) in options.iter().enumerate().take(end).skip(start) {
                        let chk = if *selected.get(oi).unwrap_or(&false) {
                            "[x]"
                        } else {
                            "[ ]"
                        };
                        let cur = if oi == *cursor { '›' } else { ' ' };
                        let st = if oi == *cursor {
                            crate::theme::list_cursor_style()
                        } else {
                            crate::theme::text_muted()
                        };
                        lines.push(Line::from(vec![Span::styled(
                            format!("  {cur} {chk} {opt}"),
                            st,
                        )]));
                    }
                }
            }
            FieldKind::Derived { amount } => {
                lines.push(Line::from(vec![
                    Span::raw(format!("{sel} {}{req}: ", fld.label)),
                    Span::styled(format_amount(*amount), crate::theme::text_muted()),
                    Span::styled("  (from category)", crate::theme::text_muted()),
                ]));
            }
        }
        if let Some(err) = &fld.error {
            lines.push(Line::from(Span::styled(
                format!("  ! {err}"),
                crate::theme::text_error(),
            )));
        }
    }
    // Buttons: Submit | Reset
    if !form.fields.is_empty() {
        lines.push(Line::from(""));
    }
    let can_submit = !form.disabled;
    let can_reset = form.dirty && !form.disabled;
    let mut submit_style = if can_submit {
        crate::theme::text_active_bold()
    } else {
        crate::theme::text_muted()
    };
    let mut reset_style = if can_reset {
        Style::default().fg(crate::theme::ACTIVE)
    } else {
        crate::theme::text_muted()
    };
    if form.selected == form.submit_idx() {
        submit_style = crate::theme::list_cursor_style();
    }
    if form.selected == form.reset_idx() {
        reset_style = crate::theme::list_cursor_style();
    }
    lines.push(Line::from(vec![
        Span::styled("  [ Submit ]  ", submit_style),
        Span::styled("Reset", reset_style),
    ]));
    if let Some(msg) = &form.message {
        lines.push(Line::from(Span::styled(
            msg.clone(),
            crate::theme::text_muted(),
        )));
    }
    let title = if form.editing {
        format!("{} — editing", form.title)
    } else {
        form.title.clone()
    };
    let block = panel_block(&title, highlight);
    let p = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    pub(crate) fn set_text(form: &mut FormState, field: Field, text: &str) {
        let idx = form.field_index(field).unwrap();
        form.fields[idx].value = text.to_string();
    }

    pub(crate) fn choose(form: &mut FormState, field: Field, key: &str) {
        let idx = form.field_index(field).unwrap();
        match &mut form.fields[idx].kind {
            FieldKind::Radio {
                values, selected, ..
            }
            | FieldKind::Select {
                values, selected, ..
            } => {
                *selected = values.iter().position(|v| v == key).unwrap();
            }
            _ => panic!("{field:?} is not a choice"),
        }
    }

    pub(crate) fn fill_valid(form: &mut FormState, prices: &PriceTable) {
        set_text(form, Field::Username, "Ann");
        set_text(form, Field::Tel, "12345");
        set_text(form, Field::Email, "a@b.com");
        choose(form, Field::Delivery, "pickup");
        choose(form, Field::DeliveryTime, "morning");
        set_text(form, Field::Weight, "2");
        choose(form, Field::Category, "Temu");
        form.apply_category_change(prices);
    }

    fn render(form: &mut FormState, w: u16, h: u16) -> Vec<String> {
        let backend = TestBackend::new(w, h);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| {
                let area = f.area();
                draw_form(f, area, form, true, false);
            })
            .unwrap();
        let buf = terminal.backend().buffer().clone();
        let mut out = Vec::new();
        for y in 0..buf.area.height {
            let mut line = String::new();
            for x in 0..buf.area.width {
                line.push_str(buf[(x, y)].symbol());
            }
            out.push(line.trim_end().to_string());
        }
        out
    }

    #[test]
    fn fields_follow_schema_order() {
        let form = FormState::for_order("Order", &PriceTable::default());
        let order: Vec<Field> = form.fields.iter().map(|f| f.field).collect();
        let schema_order: Vec<Field> = ORDER_SCHEMA.iter().map(|r| r.field).collect();
        assert_eq!(order, schema_order);
        assert!(!form.dirty);
        assert_eq!(form.values(), OrderFormValues::seed());
    }

    #[test]
    fn category_change_updates_derived_price() {
        let prices = PriceTable::default();
        let mut form = FormState::for_order("Order", &prices);
        for (cat, price) in [("Amazon cat A", 20.0), ("Aliexpress", 35.0), ("Temu", 50.0)] {
            choose(&mut form, Field::Category, cat);
            form.apply_category_change(&prices);
            assert_eq!(form.values().price_per_kg, price);
        }
        choose(&mut form, Field::Category, "");
        form.apply_category_change(&prices);
        assert_eq!(form.values().price_per_kg, 0.0);
    }

    #[test]
    fn validate_form_marks_failing_fields() {
        let prices = PriceTable::default();
        let mut form = FormState::for_order("Order", &prices);
        fill_valid(&mut form, &prices);
        set_text(&mut form, Field::Username, "A");
        set_text(&mut form, Field::Weight, "0");
        assert!(!form.validate_form(&prices));
        let uidx = form.field_index(Field::Username).unwrap();
        let widx = form.field_index(Field::Weight).unwrap();
        assert_eq!(
            form.fields[uidx].error.as_deref(),
            Some("Must be at least 2 characters")
        );
        assert_eq!(form.fields[widx].error.as_deref(), Some("Must be at least 0.1"));
        assert_eq!(form.selected, uidx);
        assert_eq!(
            form.message.as_deref(),
            Some("Please fix the highlighted errors")
        );
        set_text(&mut form, Field::Username, "Ann");
        set_text(&mut form, Field::Weight, "2");
        assert!(form.validate_form(&prices));
        assert!(form.fields.iter().all(|f| f.error.is_none()));
    }

    #[test]
    fn unparseable_weight_is_reported() {
        let prices = PriceTable::default();
        let mut form = FormState::for_order("Order", &prices);
        fill_valid(&mut form, &prices);
        set_text(&mut form, Field::Weight, "abc");
        let widx = form.field_index(Field::Weight).unwrap();
        form.validate_field_inline(widx, &prices);
        assert_eq!(form.fields[widx].error.as_deref(), Some("Must be a number"));
    }

    #[test]
    fn reset_restores_seed_and_clears_errors() {
        let prices = PriceTable::default();
        let mut form = FormState::for_order("Order", &prices);
        fill_valid(&mut form, &prices);
        set_text(&mut form, Field::Tel, "12");
        form.validate_form(&prices);
        assert!(form.compute_dirty());
        form.reset_to_initial();
        assert_eq!(form.values(), OrderFormValues::seed());
        assert!(!form.dirty);
        assert!(form.fields.iter().all(|f| f.error.is_none()));
    }

    #[test]
    fn restrictions_round_trip_through_widgets() {
        let prices = PriceTable::default();
        let mut form = FormState::for_order("Order", &prices);
        let mut v = OrderFormValues::seed();
        v.restrictions = vec!["nut-free".into(), "vegan".into()];
        form.load_values(&v);
        // widget order follows the option list, not the input order
        assert_eq!(
            form.values().restrictions,
            vec!["vegan".to_string(), "nut-free".to_string()]
        );
        assert!(form.dirty);
    }

    #[test]
    fn format_number_trims_zeros() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert!(parse_number("").is_nan());
        assert_eq!(parse_number(" 2.5 "), 2.5);
    }

    #[test]
    fn renders_inline_errors_and_buttons() {
        let prices = PriceTable::default();
        let mut form = FormState::for_order("Order", &prices);
        form.validate_form(&prices);
        let lines = render(&mut form, 70, 40);
        let text = lines.join("\n");
        assert!(text.contains("Name *:"));
        assert!(text.contains("! This field is required"));
        assert!(text.contains("(•) Pickup"));
        assert!(text.contains("Price per kg *: 0.00"));
        assert!(text.contains("[ Submit ]"));
        assert!(text.contains("Please fix the highlighted errors"));
    }

    #[test]
    fn select_editor_lists_categories() {
        let prices = PriceTable::default();
        let mut form = FormState::for_order("Order", &prices);
        form.selected = form.field_index(Field::Category).unwrap();
        form.editing = true;
        let text = render(&mut form, 70, 40).join("\n");
        assert!(text.contains("Order — editing"));
        assert!(text.contains("Temu (50.00/kg)"));
        assert!(text.contains("Amazon cat A (20.00/kg)"));
    }
}
