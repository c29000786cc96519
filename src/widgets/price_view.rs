use crate::order::{format_amount, total_price, Delivery, OrderFormValues, PriceTable};
use crate::widgets::chrome::panel_block;
use crate::widgets::form::format_number;
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};

/// Summary lines for the price pane. The total is recomputed from the
/// live values on every draw.
pub fn price_lines(values: &OrderFormValues, prices: &PriceTable) -> Vec<(String, String)> {
    let category = if values.category.is_empty() {
        "(none)".to_string()
    } else if prices.price_of(&values.category).is_none() {
        format!("{} (unknown)", values.category)
    } else {
        values.category.clone()
    };
    let weight = if values.weight.is_finite() {
        format_number(values.weight)
    } else {
        "—".to_string()
    };
    let total = if values.weight.is_finite() {
        format_amount(total_price(values.weight, values.price_per_kg))
    } else {
        "—".to_string()
    };
    let delivery = values
        .delivery
        .parse::<Delivery>()
        .map(|d| d.label().to_string())
        .unwrap_or_else(|_| values.delivery.clone());
    vec![
        ("Category".into(), category),
        ("Price per kg".into(), format_amount(values.price_per_kg)),
        ("Weight (kg)".into(), weight),
        ("Delivery".into(), delivery),
        ("Total".into(), total),
    ]
}

pub fn draw_price(
    f: &mut Frame,
    area: Rect,
    values: &OrderFormValues,
    prices: &PriceTable,
    focused: bool,
) {
    let rows = price_lines(values, prices);
    let mut lines: Vec<Line> = Vec::new();
    let last = rows.len().saturating_sub(1);
    for (i, (label, value)) in rows.into_iter().enumerate() {
        if i == last {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled(format!("{label}: "), crate::theme::text_active_bold()),
                Span::styled(value, crate::theme::text_editing_bold()),
            ]));
        } else {
            lines.push(Line::from(vec![
                Span::styled(format!("{label}: "), crate::theme::text_muted()),
                Span::raw(value),
            ]));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Rates per kg:",
        crate::theme::text_muted(),
    )));
    for entry in prices.entries() {
        let marker = if entry.name == values.category { "›" } else { " " };
        lines.push(Line::from(format!(
            "{marker} {}  {}",
            entry.name,
            format_amount(entry.price_per_kg)
        )));
    }
    let block = panel_block("Price", focused);
    let p = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(p, area);
}
