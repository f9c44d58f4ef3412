/// Inline keyboard (buttons) attached to a bot message. One button per row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub buttons: Vec<InlineButton>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }
}

impl InlineKeyboard {
    pub fn new(buttons: Vec<InlineButton>) -> Self {
        Self { buttons }
    }

    /// Labels longer than `max_label_len` chars are cut and suffixed with `...`.
    pub fn one_per_row<'a>(
        items: impl IntoIterator<Item = (&'a str, String)>,
        max_label_len: usize,
    ) -> Self {
        let buttons = items
            .into_iter()
            .map(|(label, callback_data)| {
                let label = if label.chars().count() > max_label_len {
                    format!("{}...", label.chars().take(max_label_len).collect::<String>())
                } else {
                    label.to_string()
                };
                InlineButton {
                    label,
                    callback_data,
                }
            })
            .collect();
        Self { buttons }
    }

    pub fn callback_data(&self) -> Vec<&str> {
        self.buttons
            .iter()
            .map(|b| b.callback_data.as_str())
            .collect()
    }
}
