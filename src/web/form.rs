//! HTML form building blocks for the dashboard and login pages.

use super::session::CSRF_FIELD;
use maud::{Markup, html};

/// Accumulates form controls and wraps them in a `<form method="post">`.
#[derive(Default)]
pub struct Form {
    controls: Vec<Markup>,
}

impl Form {
    /// Every form starts with the hidden CSRF field.
    pub fn new(csrf: &str) -> Self {
        Self::default().push(html! {
            input type="hidden" name=(CSRF_FIELD) value=(csrf);
        })
    }

    fn push(mut self, control: Markup) -> Self {
        self.controls.push(control);
        self
    }

    pub fn text(self, label: &str, name: &str, value: &str) -> Self {
        self.input("text", label, name, value)
    }

    pub fn password(self, label: &str, name: &str) -> Self {
        self.input("password", label, name, "")
    }

    pub fn date(self, label: &str, name: &str, value: &str) -> Self {
        self.input("date", label, name, value)
    }

    fn input(self, kind: &str, label: &str, name: &str, value: &str) -> Self {
        self.push(html! {
            label for=(name) { (label) }
            input type=(kind) id=(name) name=(name) value=(value);
        })
    }

    pub fn textarea(self, label: &str, name: &str, value: &str, rows: u16) -> Self {
        self.push(html! {
            label for=(name) { (label) }
            textarea id=(name) name=(name) rows=(rows) { (value) }
        })
    }

    /// Submits `on` when ticked, nothing otherwise.
    pub fn checkbox(self, label: &str, name: &str, checked: bool) -> Self {
        self.push(html! {
            label {
                input type="checkbox" name=(name) checked[checked];
                " "
                span class="inline" { (label) }
            }
        })
    }

    pub fn finish(self, action: &str, submit: &str) -> Markup {
        html! {
            form method="post" action=(action) {
                @for control in &self.controls {
                    (control)
                }
                button type="submit" { (submit) }
            }
        }
    }
}
