//! Common dialog patterns.

use serde_json::json;

use super::definition::DialogOptions;
use crate::router::{Handler, RouteTest};

/// Create a one-shot announcement that lets the pipeline keep going.
#[must_use]
pub fn announcement_dialog<I, S>(messages: I) -> DialogOptions
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    DialogOptions::new(messages).cascade(true)
}

/// Create a dialog asking a free-form question.
#[must_use]
pub fn question_dialog(question: &str, on_answer: impl Handler + 'static) -> DialogOptions {
    DialogOptions::new([question]).on_response(on_answer)
}

/// Create a yes/no confirmation dialog.
///
/// The final message carries `["Yes", "No"]` actions for clients that
/// render quick replies.
#[must_use]
pub fn confirm_dialog(question: &str, on_answer: impl Handler + 'static) -> DialogOptions {
    DialogOptions::new([question])
        .actions(json!(["Yes", "No"]))
        .on_response(on_answer)
}

/// Create a menu dialog offering `choices` as actions.
#[must_use]
pub fn menu_dialog<I, S>(prompt: &str, choices: I, on_choice: impl Handler + 'static) -> DialogOptions
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let choices: Vec<String> = choices.into_iter().map(Into::into).collect();
    DialogOptions::new([prompt])
        .actions(json!(choices))
        .on_response(on_choice)
}

/// Create a help dialog triggered by common help keywords.
#[must_use]
pub fn help_dialog<I, S>(messages: I) -> DialogOptions
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    DialogOptions::new(messages).trigger(RouteTest::keywords(["help", "support"]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlowError;
    use crate::router::{Flow, handler_fn};

    fn noop() -> impl Handler {
        handler_fn(|_ctx, _event| Box::pin(async { Ok::<_, FlowError>(Flow::Halt) }))
    }

    #[test]
    fn confirm_has_actions() {
        let options = confirm_dialog("Proceed?", noop());
        assert_eq!(options.messages, vec!["Proceed?"]);
        assert_eq!(options.actions, Some(json!(["Yes", "No"])));
        assert!(options.on_response.is_some());
    }

    #[test]
    fn menu_lists_choices() {
        let options = menu_dialog("Pick one", ["tea", "coffee"], noop());
        assert_eq!(options.actions, Some(json!(["tea", "coffee"])));
    }

    #[test]
    fn announcement_cascades() {
        let options = announcement_dialog(["Maintenance tonight."]);
        assert!(options.config.cascade);
        assert!(options.on_response.is_none());
    }

    #[test]
    fn help_triggers_on_keywords() {
        let options = help_dialog(["Here's what I can do."]);
        assert!(matches!(options.trigger, RouteTest::Keywords(ref k) if k.len() == 2));
    }
}
