//! Inline keyboard construction

use crate::rules::RULES;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Prompt sent together with the rules menu
pub const RULES_PROMPT: &str = "Click one of these rules";

/// Arrange `buttons` into rows of `n_cols`, with optional header and footer rows.
///
/// `n_cols == 0` is treated as a single column.
#[must_use]
pub fn build_menu(
    buttons: Vec<InlineKeyboardButton>,
    n_cols: usize,
    header_buttons: Option<Vec<InlineKeyboardButton>>,
    footer_buttons: Option<Vec<InlineKeyboardButton>>,
) -> Vec<Vec<InlineKeyboardButton>> {
    let mut menu: Vec<Vec<InlineKeyboardButton>> = header_buttons.into_iter().collect();
    menu.extend(buttons.chunks(n_cols.max(1)).map(<[_]>::to_vec));
    menu.extend(footer_buttons);
    menu
}

/// Single-column keyboard with one callback button per known rule.
///
/// # Examples
///
/// ```
/// use waf_alert_bot::bot::menu::rules_keyboard;
///
/// let keyboard = rules_keyboard();
/// assert_eq!(keyboard.inline_keyboard.len(), 7);
/// ```
#[must_use]
pub fn rules_keyboard() -> InlineKeyboardMarkup {
    let buttons = RULES
        .iter()
        .map(|rule| InlineKeyboardButton::callback(*rule, *rule))
        .collect();
    InlineKeyboardMarkup::new(build_menu(buttons, 1, None, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn button(label: &str) -> InlineKeyboardButton {
        InlineKeyboardButton::callback(label, label)
    }

    fn labels(menu: &[Vec<InlineKeyboardButton>]) -> Vec<Vec<String>> {
        menu.iter()
            .map(|row| row.iter().map(|b| b.text.clone()).collect())
            .collect()
    }

    #[test]
    fn test_rules_keyboard_one_button_per_row_in_order() {
        let keyboard = rules_keyboard();
        assert_eq!(keyboard.inline_keyboard.len(), RULES.len());
        for (row, rule) in keyboard.inline_keyboard.iter().zip(RULES) {
            assert_eq!(row.len(), 1);
            assert_eq!(row[0].text, rule);
            assert!(matches!(
                &row[0].kind,
                InlineKeyboardButtonKind::CallbackData(data) if data == rule
            ));
        }
    }

    #[test]
    fn test_build_menu_columns() {
        let buttons = ["a", "b", "c", "d", "e"].map(button).to_vec();
        let menu = build_menu(buttons, 2, None, None);
        assert_eq!(labels(&menu), vec![vec!["a", "b"], vec!["c", "d"], vec!["e"]]);
    }

    #[test]
    fn test_build_menu_header_and_footer() {
        let menu = build_menu(
            vec![button("a"), button("b")],
            1,
            Some(vec![button("top")]),
            Some(vec![button("back")]),
        );
        assert_eq!(
            labels(&menu),
            vec![vec!["top"], vec!["a"], vec!["b"], vec!["back"]]
        );
    }

    #[test]
    fn test_build_menu_zero_columns() {
        let menu = build_menu(vec![button("a"), button("b")], 0, None, None);
        assert_eq!(menu.len(), 2);
    }
}
