//! Post form: binding, validation and redisplay.

use serde::Deserialize;

use crate::db::models::{Group, PostView};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Submitted post fields. Anything else in the payload (an `author`, say) is ignored.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: Option<String>,
}

/// A form that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPost {
    pub text: String,
    pub group_id: Option<i64>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors {
    pub text: Option<&'static str>,
    pub group: Option<&'static str>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.group.is_none()
    }
}

impl PostForm {
    /// Initial values for editing an existing post.
    pub fn from_post(post: &PostView) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id().map(|id| id.to_string()),
        }
    }

    fn group_value(&self) -> Option<&str> {
        self.group.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Check the form against the groups that currently exist.
    pub fn validate(&self, groups: &[Group]) -> Result<ValidPost, FormErrors> {
        let mut errors = FormErrors::default();

        let text = self.text.trim();
        if text.is_empty() {
            errors.text = Some(REQUIRED);
        }

        let group_id = match self.group_value() {
            None => None,
            Some(raw) => {
                let found = raw
                    .parse::<i64>()
                    .ok()
                    .filter(|id| groups.iter().any(|g| g.id == *id));
                if found.is_none() {
                    errors.group = Some(INVALID_CHOICE);
                }
                found
            }
        };

        if errors.is_empty() {
            Ok(ValidPost {
                text: text.to_string(),
                group_id,
            })
        } else {
            Err(errors)
        }
    }
}

/// An option of the group `<select>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupChoice {
    pub id: i64,
    pub title: String,
    pub selected: bool,
}

/// Everything the post form template renders.
#[derive(Debug, Clone)]
pub struct PostFormView {
    pub text: String,
    pub errors: FormErrors,
    pub groups: Vec<GroupChoice>,
    pub no_group_selected: bool,
}

impl PostFormView {
    pub fn new(form: &PostForm, groups: &[Group], errors: FormErrors) -> Self {
        let selected = form.group_value();
        let groups: Vec<GroupChoice> = groups
            .iter()
            .map(|g| GroupChoice {
                id: g.id,
                title: g.title.clone(),
                selected: selected == Some(g.id.to_string().as_str()),
            })
            .collect();
        let no_group_selected = !groups.iter().any(|g| g.selected);

        Self {
            text: form.text.clone(),
            errors,
            groups,
            no_group_selected,
        }
    }

    pub fn blank(groups: &[Group]) -> Self {
        Self::new(&PostForm::default(), groups, FormErrors::default())
    }
}
