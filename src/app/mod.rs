use crate::order::OrderPayload;
use crate::ui::{AppState, ToastLevel};
use crate::widgets::Widget;
use crossterm::event::KeyCode;

pub enum AppMsg {
    Key(KeyCode),
    /// Ctrl+S: save the open message editor.
    CommitEditor,
    Submitted {
        outcome: Result<String, String>,
    },
}

#[allow(clippy::large_enum_variant)]
pub enum Effect {
    SubmitOrder {
        payload: OrderPayload,
    },
    ShowToast {
        text: String,
        level: ToastLevel,
        seconds: u64,
    },
    Quit,
}

pub fn update(state: &mut AppState, msg: AppMsg) -> Vec<Effect> {
    use AppMsg::*;
    let mut effects: Vec<Effect> = Vec::new();
    match msg {
        Key(code) => {
            // q quits only while browsing; inside an editor it is text
            let browsing = !state.form.form.editing && state.form.form.confirm.is_none();
            if browsing && matches!(code, KeyCode::Char('q') | KeyCode::Char('Q')) {
                effects.push(Effect::Quit);
                return effects;
            }
            effects.extend(state.form.on_key(code));
        }
        CommitEditor => {
            if state.form.commit_textarea() {
                effects.push(Effect::ShowToast {
                    text: "Message saved".into(),
                    level: ToastLevel::Info,
                    seconds: 2,
                });
            }
        }
        Submitted { outcome } => {
            state.submitting = false;
            state.status_text = None;
            match &outcome {
                Ok(receipt) => {
                    tracing::info!(receipt = %receipt, "order accepted");
                    state.submitted += 1;
                    state.last_error = None;
                    effects.push(Effect::ShowToast {
                        text: format!("Order submitted: {receipt}"),
                        level: ToastLevel::Success,
                        seconds: 3,
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "order submission failed");
                    state.last_error = Some(e.clone());
                    effects.push(Effect::ShowToast {
                        text: format!("Submission failed: {e}"),
                        level: ToastLevel::Error,
                        seconds: 4,
                    });
                }
            }
            state.form.finish_submit(&outcome);
        }
    }
    effects
}
