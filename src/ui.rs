use crate::app::{update, AppMsg, Effect};
use crate::model::{load_config, validate_app_config, AppConfig};
use crate::order::PriceTable;
use crate::services::sink::{sink_from_config, OrderSink};
use crate::services::submitter::{spawn_submit, SubmitMsg};
use crate::widgets::form::FormState;
use crate::widgets::form_widget::FormWidget;
use crate::widgets::price_view::draw_price;
use crate::widgets::status_bar::draw_footer;
use crate::widgets::Widget;
use anyhow::{anyhow, Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

pub(crate) struct AppState {
    pub(crate) config: AppConfig,
    pub(crate) form: FormWidget,
    pub(crate) tick: u64,
    pub(crate) submitting: bool,
    pub(crate) submitted: u64,
    pub(crate) toast: Option<Toast>,
    pub(crate) status_text: Option<String>,
    pub(crate) last_error: Option<String>,
    pub(crate) should_quit: bool,
    sink: Arc<dyn OrderSink>,
    tx: Sender<SubmitMsg>,
    rx: Receiver<SubmitMsg>,
}

impl AppState {
    pub(crate) fn new(config: AppConfig, prices: PriceTable) -> Self {
        let sink = sink_from_config(&config);
        Self::with_sink(config, prices, sink)
    }

    pub(crate) fn with_sink(config: AppConfig, prices: PriceTable, sink: Arc<dyn OrderSink>) -> Self {
        let form = FormState::for_order(config.title.clone(), &prices);
        let (tx, rx) = mpsc::channel::<SubmitMsg>();
        Self {
            config,
            form: FormWidget::new(form, prices),
            tick: 0,
            submitting: false,
            submitted: 0,
            toast: None,
            status_text: None,
            last_error: None,
            should_quit: false,
            sink,
            tx,
            rx,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

pub struct Toast {
    pub text: String,
    pub level: ToastLevel,
    pub expires_at_tick: u64,
}

pub(crate) fn run_effects(state: &mut AppState, effects: Vec<Effect>) {
    for eff in effects {
        match eff {
            Effect::SubmitOrder { payload } => {
                tracing::info!(
                    category = %payload.category,
                    total = %payload.total_price,
                    "submitting order"
                );
                state.submitting = true;
                state.status_text = Some("Submitting order".into());
                spawn_submit(state.sink.clone(), payload, state.tx.clone());
            }
            Effect::ShowToast {
                text,
                level,
                seconds,
            } => {
                let ticks = seconds.saturating_mul(5); // ~200ms tick
                let exp = state.tick.saturating_add(ticks);
                state.toast = Some(Toast {
                    text,
                    level,
                    expires_at_tick: exp,
                });
            }
            Effect::Quit => {
                state.should_quit = true;
            }
        }
    }
}

/// Drains finished submissions from the worker channel.
pub(crate) fn pump_submissions(state: &mut AppState) {
    let drained: Vec<SubmitMsg> = state.rx.try_iter().collect();
    for msg in drained {
        let effects = update(state, AppMsg::Submitted {
            outcome: msg.outcome,
        });
        run_effects(state, effects);
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes"))
        .unwrap_or(false)
}

/// Global subscriber. The UI owns the terminal, so logs go to the configured
/// file, to stderr when headless, or nowhere.
fn init_tracing(cfg: &AppConfig, headless: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let res = if let Some(path) = &cfg.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {path}"))?;
        builder
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .try_init()
    } else if headless {
        builder.with_writer(std::io::stderr).try_init()
    } else {
        builder.with_writer(std::io::sink).try_init()
    };
    res.map_err(|e| anyhow!("installing log subscriber: {e}"))
}

pub fn run() -> Result<()> {
    let headless = env_flag("ORDER_FORM_HEADLESS");
    let (cfg, origin): (AppConfig, Option<PathBuf>) = load_config()?;
    init_tracing(&cfg, headless)?;
    match &origin {
        Some(p) => tracing::info!(path = %p.display(), "config loaded"),
        None => tracing::info!("no config file found, using built-in defaults"),
    }
    let prices = validate_app_config(&cfg).map_err(|e| anyhow!(e))?;
    let mut state = AppState::new(cfg, prices);

    if headless {
        let headless_ticks: u64 = std::env::var("ORDER_FORM_TICKS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);
        return run_headless(&mut state, headless_ticks, env_flag("ORDER_FORM_SMOKE_SUMMARY"));
    }

    // Setup terminal (interactive)
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let res = run_interactive(&mut terminal, &mut state);
    // Restore
    disable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    res
}

fn run_headless(state: &mut AppState, ticks: u64, summary: bool) -> Result<()> {
    let backend = ratatui::backend::TestBackend::new(100, 32);
    let mut terminal = Terminal::new(backend)?;
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();
    for _ in 0..ticks {
        terminal.draw(|f| ui(f, state))?;
        pump_submissions(state);
        if last_tick.elapsed() >= tick_rate {
            state.tick = state.tick.wrapping_add(1);
            last_tick = Instant::now();
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    if summary {
        let values = state.form.form.values();
        let valid = crate::order::schema::validate(&values, state.form.prices()).is_ok();
        let total = crate::order::format_amount(crate::order::total_price(
            values.weight,
            values.price_per_kg,
        ));
        let summary = serde_json::json!({
            "ok": state.last_error.is_none(),
            "title": state.config.title,
            "fields": state.form.form.fields.len(),
            "categories": state.form.prices().entries().len(),
            "valid": valid,
            "total": total,
            "submitted": state.submitted,
        });
        println!("{summary}");
    }
    Ok(())
}

fn run_interactive<B: Backend>(terminal: &mut Terminal<B>, state: &mut AppState) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();
    while !state.should_quit {
        terminal.draw(|f| ui(f, state))?;
        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_millis(0));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                let msg = if key.modifiers.contains(KeyModifiers::CONTROL) {
                    match key.code {
                        KeyCode::Char('c') => {
                            state.should_quit = true;
                            None
                        }
                        KeyCode::Char('s') => Some(AppMsg::CommitEditor),
                        _ => None,
                    }
                } else {
                    Some(AppMsg::Key(key.code))
                };
                if let Some(msg) = msg {
                    let effects = update(state, msg);
                    run_effects(state, effects);
                }
            }
        }
        pump_submissions(state);
        if last_tick.elapsed() >= tick_rate {
            state.tick = state.tick.wrapping_add(1);
            last_tick = Instant::now();
        }
    }
    Ok(())
}

fn help_text(state: &AppState) -> &'static str {
    let form = &state.form.form;
    if state.submitting {
        "Submitting..."
    } else if state.form.is_editing_textarea() {
        "Ctrl+S Save • Esc Cancel"
    } else if form.confirm.is_some() {
        "Enter Confirm • Esc Cancel"
    } else if form.editing {
        "Enter Done • ↑/↓ Change • Space Toggle • Esc Back"
    } else {
        "↑/↓ Move • Enter Edit • ←/→ Change • Space Toggle • q Quit"
    }
}

pub(crate) fn ui(f: &mut Frame, state: &mut AppState) {
    // Clear expired toast
    if let Some(t) = &state.toast {
        if state.tick >= t.expires_at_tick {
            state.toast = None;
        }
    }
    let screen = f.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(screen);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(rows[0]);
    let tick = state.tick;
    state.form.render(f, cols[0], !state.submitting, tick);
    let values = state.form.form.values();
    draw_price(f, cols[1], &values, state.form.prices(), false);
    let help = help_text(state);
    draw_footer(f, rows[1], state, help);
    if state.submitting {
        // dim the form while the sink is busy
        let dim = Block::default().style(Style::default().add_modifier(Modifier::DIM));
        f.render_widget(dim, cols[0]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderPayload;
    use ratatui::backend::TestBackend;

    struct Refusing;

    impl OrderSink for Refusing {
        fn submit(&self, _payload: &OrderPayload) -> Result<String> {
            Err(anyhow!("intake closed"))
        }
    }

    fn screen_text(state: &mut AppState) -> String {
        let mut term = Terminal::new(TestBackend::new(110, 36)).unwrap();
        term.draw(|f| ui(f, state)).unwrap();
        let buf = term.backend().buffer().clone();
        let mut text = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                text.push_str(buf[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    fn wait_for_submission(state: &mut AppState) {
        for _ in 0..250 {
            pump_submissions(state);
            if !state.submitting {
                return;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        panic!("submission did not finish");
    }

    #[test]
    fn renders_form_price_and_footer() {
        let mut st = AppState::new(AppConfig::default(), PriceTable::default());
        let text = screen_text(&mut st);
        assert!(text.contains("Name *:"));
        assert!(text.contains("Total: 0.00"));
        assert!(text.contains("q Quit"));
    }

    #[test]
    fn toast_expires_after_its_ticks() {
        let mut st = AppState::new(AppConfig::default(), PriceTable::default());
        run_effects(
            &mut st,
            vec![Effect::ShowToast {
                text: "hello".into(),
                level: ToastLevel::Info,
                seconds: 1,
            }],
        );
        assert!(screen_text(&mut st).contains("[INFO] hello"));
        st.tick = 5;
        let _ = screen_text(&mut st);
        assert!(st.toast.is_none());
    }

    #[test]
    fn valid_submit_round_trips_through_worker() {
        let mut st = AppState::new(AppConfig::default(), PriceTable::default());
        let prices = st.form.prices().clone();
        crate::widgets::form::tests::fill_valid(&mut st.form.form, &prices);
        st.form.form.selected = st.form.form.submit_idx();
        let effects = update(&mut st, AppMsg::Key(KeyCode::Enter));
        run_effects(&mut st, effects);
        assert!(st.submitting);
        assert!(st.form.form.disabled);
        wait_for_submission(&mut st);
        assert_eq!(st.submitted, 1);
        assert!(!st.form.form.disabled);
        assert_eq!(st.form.form.values(), crate::order::OrderFormValues::seed());
        assert_eq!(st.toast.as_ref().map(|t| t.level), Some(ToastLevel::Success));
    }

    #[test]
    fn failed_submit_keeps_form_editable() {
        let mut st = AppState::with_sink(
            AppConfig::default(),
            PriceTable::default(),
            Arc::new(Refusing),
        );
        let prices = st.form.prices().clone();
        crate::widgets::form::tests::fill_valid(&mut st.form.form, &prices);
        let effects = st.form.submit();
        run_effects(&mut st, effects);
        wait_for_submission(&mut st);
        assert_eq!(st.submitted, 0);
        assert_eq!(st.last_error.as_deref(), Some("intake closed"));
        assert_eq!(st.form.form.values().username, "Ann");
        assert_eq!(st.toast.as_ref().map(|t| t.level), Some(ToastLevel::Error));
    }
}
