use std::borrow::Cow;

use unicode_normalization::UnicodeNormalization;

/// Unicode normalization form applied to extracted text before matching.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum,
)]
pub enum UnicodeForm {
    Nfc,
    Nfd,
    #[default]
    Nfkc,
    Nfkd,
}

impl UnicodeForm {
    pub fn normalize(self, text: &str) -> String {
        match self {
            UnicodeForm::Nfc => text.nfc().collect(),
            UnicodeForm::Nfd => text.nfd().collect(),
            UnicodeForm::Nfkc => text.nfkc().collect(),
            UnicodeForm::Nfkd => text.nfkd().collect(),
        }
    }
}

/// Normalize `text` when a form is configured, borrowing it otherwise.
pub fn maybe_normalize(text: &str, form: Option<UnicodeForm>) -> Cow<'_, str> {
    match form {
        Some(form) => Cow::Owned(form.normalize(text)),
        None => Cow::Borrowed(text),
    }
}
